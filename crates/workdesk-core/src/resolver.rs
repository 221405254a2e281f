//! Access decisions over a user's loaded permission and branch rows.
//!
//! A [`PermissionSet`] is built once from fetched rows and never mutated;
//! refetching builds a new one. Every query is fail-closed: a key with no
//! row, an unknown row type, or an empty set all resolve to `false`.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::permissions::{
    Action, BranchAccess, ModuleKey, PageAction, PermissionRow, PermissionType, module_for_path,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    grants: HashMap<(PermissionType, String), bool>,
    branches: HashSet<String>,
}

impl PermissionSet {
    /// The set every query answers `false` for.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a set from fetched rows. When the same `(type, key)` appears
    /// twice the first row wins; rows with an unrecognised type are dropped.
    pub fn from_rows<P, B>(permissions: P, branch_access: B) -> Self
    where
        P: IntoIterator<Item = PermissionRow>,
        B: IntoIterator<Item = BranchAccess>,
    {
        let mut grants = HashMap::new();
        for row in permissions {
            let Ok(permission_type) = row.permission_type.parse::<PermissionType>() else {
                debug!(
                    permission_type = %row.permission_type,
                    permission_key = %row.permission_key,
                    "Dropping permission row with unknown type"
                );
                continue;
            };
            grants
                .entry((permission_type, row.permission_key))
                .or_insert(row.granted);
        }

        let branches = branch_access
            .into_iter()
            .map(|access| access.branch_id)
            .collect();

        Self { grants, branches }
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty() && self.branches.is_empty()
    }

    /// Number of distinct `(type, key)` rows held.
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    fn lookup(&self, permission_type: PermissionType, key: &str) -> Option<bool> {
        self.grants
            .get(&(permission_type, key.to_string()))
            .copied()
    }

    /// True only if an exact `(type, key)` row exists and is granted.
    pub fn has_permission(&self, permission_type: PermissionType, key: &str) -> bool {
        self.lookup(permission_type, key).unwrap_or(false)
    }

    /// An explicit `page_access` row for `path` decides, whether granted or
    /// denied. Without one, the path's module must grant `view`.
    pub fn has_page_access(&self, path: &str) -> bool {
        match self.lookup(PermissionType::PageAccess, path) {
            Some(granted) => granted,
            None => self.has_page_action(module_for_path(path), Action::View),
        }
    }

    pub fn has_feature_access(&self, feature: &str) -> bool {
        self.has_permission(PermissionType::FeatureAccess, feature)
    }

    pub fn has_page_action(&self, module: ModuleKey, action: Action) -> bool {
        self.has_permission(
            PermissionType::PageAction,
            &PageAction::new(module, action).to_string(),
        )
    }

    pub fn accessible_branches(&self) -> HashSet<String> {
        self.branches.clone()
    }

    pub fn can_access_branch(&self, branch_id: &str) -> bool {
        self.branches.contains(branch_id)
    }

    /// Rows back out in the remote shape, sorted for stable output.
    pub fn rows(&self) -> Vec<PermissionRow> {
        let mut rows: Vec<PermissionRow> = self
            .grants
            .iter()
            .map(|((permission_type, key), granted)| {
                PermissionRow::new(*permission_type, key.clone(), *granted)
            })
            .collect();
        rows.sort_by(|a, b| {
            (&a.permission_type, &a.permission_key).cmp(&(&b.permission_type, &b.permission_key))
        });
        rows
    }

    pub fn branch_rows(&self) -> Vec<BranchAccess> {
        let mut ids: Vec<&String> = self.branches.iter().collect();
        ids.sort();
        ids.into_iter().map(|id| BranchAccess::new(id.clone())).collect()
    }
}
