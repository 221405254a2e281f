//! Permission row types and the typed module/action vocabulary.
//!
//! Rows arrive from the remote store as `(permission_type, permission_key,
//! granted)` triples. `page_action` keys have the form `"<module>:<action>"`;
//! [`PageAction`] is the typed form of that pair so call sites never build
//! those strings by hand.
//!
//! # Example
//!
//! ```ignore
//! use workdesk_core::permissions::{Action, ModuleKey, PageAction};
//!
//! let key = PageAction::new(ModuleKey::Employees, Action::View);
//! assert_eq!(key.to_string(), "employees:view");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of grant a permission row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermissionType {
    /// Explicit access to a route path, keyed by the path itself.
    PageAccess,
    /// An action within a module, keyed by `"<module>:<action>"`.
    PageAction,
    /// A named feature toggle.
    FeatureAccess,
}

impl PermissionType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PermissionType::PageAccess => "page_access",
            PermissionType::PageAction => "page_action",
            PermissionType::FeatureAccess => "feature_access",
        }
    }
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionType {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page_access" => Ok(PermissionType::PageAccess),
            "page_action" => Ok(PermissionType::PageAction),
            "feature_access" => Ok(PermissionType::FeatureAccess),
            other => Err(UnknownKey(other.to_string())),
        }
    }
}

/// Error returned when a string does not name a known permission type,
/// module, or action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key: {0}")]
pub struct UnknownKey(pub String);

/// Groups related routes for permission purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKey {
    Dashboard,
    Employees,
    Documents,
    Leave,
    Compliance,
    Recruitment,
    Signatures,
    Reports,
    Branches,
    Users,
    Settings,
}

impl ModuleKey {
    pub const ALL: [ModuleKey; 11] = [
        ModuleKey::Dashboard,
        ModuleKey::Employees,
        ModuleKey::Documents,
        ModuleKey::Leave,
        ModuleKey::Compliance,
        ModuleKey::Recruitment,
        ModuleKey::Signatures,
        ModuleKey::Reports,
        ModuleKey::Branches,
        ModuleKey::Users,
        ModuleKey::Settings,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ModuleKey::Dashboard => "dashboard",
            ModuleKey::Employees => "employees",
            ModuleKey::Documents => "documents",
            ModuleKey::Leave => "leave",
            ModuleKey::Compliance => "compliance",
            ModuleKey::Recruitment => "recruitment",
            ModuleKey::Signatures => "signatures",
            ModuleKey::Reports => "reports",
            ModuleKey::Branches => "branches",
            ModuleKey::Users => "users",
            ModuleKey::Settings => "settings",
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleKey::ALL
            .into_iter()
            .find(|module| module.as_str() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Action performed within a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Approve,
    Export,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Approve,
        Action::Export,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Approve => "approve",
            Action::Export => "export",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// A `(module, action)` pair, the typed form of a `page_action` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageAction {
    pub module: ModuleKey,
    pub action: Action,
}

impl PageAction {
    pub const fn new(module: ModuleKey, action: Action) -> Self {
        Self { module, action }
    }

    pub const fn view(module: ModuleKey) -> Self {
        Self::new(module, Action::View)
    }
}

impl fmt::Display for PageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.action)
    }
}

impl FromStr for PageAction {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, action) = s.split_once(':').ok_or_else(|| UnknownKey(s.to_string()))?;
        Ok(Self::new(module.parse()?, action.parse()?))
    }
}

/// One access grant or denial for a user, as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PermissionRow {
    pub permission_type: String,
    pub permission_key: String,
    pub granted: bool,
}

impl PermissionRow {
    pub fn new(
        permission_type: PermissionType,
        permission_key: impl Into<String>,
        granted: bool,
    ) -> Self {
        Self {
            permission_type: permission_type.as_str().to_string(),
            permission_key: permission_key.into(),
            granted,
        }
    }

    pub fn page_action(page_action: PageAction, granted: bool) -> Self {
        Self::new(PermissionType::PageAction, page_action.to_string(), granted)
    }

    pub fn page_access(path: impl Into<String>, granted: bool) -> Self {
        Self::new(PermissionType::PageAccess, path, granted)
    }

    pub fn feature_access(feature: impl Into<String>, granted: bool) -> Self {
        Self::new(PermissionType::FeatureAccess, feature, granted)
    }
}

/// Association of a user to a branch, used to scope visible data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct BranchAccess {
    pub branch_id: String,
}

impl BranchAccess {
    pub fn new(branch_id: impl Into<String>) -> Self {
        Self {
            branch_id: branch_id.into(),
        }
    }
}

/// Module used when a path has no entry in [`PATH_MODULES`].
pub const DEFAULT_MODULE: ModuleKey = ModuleKey::Dashboard;

/// Route path to module key. Matching is exact.
pub const PATH_MODULES: &[(&str, ModuleKey)] = &[
    ("/", ModuleKey::Dashboard),
    ("/dashboard", ModuleKey::Dashboard),
    ("/employees", ModuleKey::Employees),
    ("/documents", ModuleKey::Documents),
    ("/leave", ModuleKey::Leave),
    ("/compliance", ModuleKey::Compliance),
    ("/applications", ModuleKey::Recruitment),
    ("/signatures", ModuleKey::Signatures),
    ("/reports", ModuleKey::Reports),
    ("/branches", ModuleKey::Branches),
    ("/users", ModuleKey::Users),
    ("/settings", ModuleKey::Settings),
];

/// Resolves the module for a route path, falling back to [`DEFAULT_MODULE`].
pub fn module_for_path(path: &str) -> ModuleKey {
    PATH_MODULES
        .iter()
        .find(|(candidate, _)| *candidate == path)
        .map(|(_, module)| *module)
        .unwrap_or(DEFAULT_MODULE)
}
