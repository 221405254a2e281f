use serde::Serialize;
use utoipa::ToSchema;
use workdesk_core::{Action, ModuleKey, module_for_path};

use crate::access::PermissionSnapshot;

/// What the signed-in user may do on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageView {
    pub page: String,
    pub module: ModuleKey,
    /// Actions granted on the page's module, in declaration order.
    pub actions: Vec<Action>,
    /// Branches whose records the page may show, sorted.
    pub branches: Vec<String>,
}

impl PageView {
    pub fn new(page: impl Into<String>, snapshot: &PermissionSnapshot) -> Self {
        let page = page.into();
        let module = module_for_path(&page);
        let actions = Action::ALL
            .into_iter()
            .filter(|action| snapshot.has_page_action(module, *action))
            .collect();
        let mut branches: Vec<String> = snapshot.accessible_branches().into_iter().collect();
        branches.sort();

        Self {
            page,
            module,
            actions,
            branches,
        }
    }
}
