//! Route guard decisions.
//!
//! [`evaluate`] is a pure function of the authentication state, the current
//! permission snapshot, and what the route requires. Checks run in a fixed
//! order and the first one that applies decides:
//!
//! 1. authentication still loading → [`GuardOutcome::Loading`]
//! 2. no user → [`GuardOutcome::Unauthenticated`]
//! 3. permissions still loading → [`GuardOutcome::Loading`]
//! 4. restricted role in an elevated-only area → [`GuardOutcome::RoleRejected`]
//! 5. permission fetch failed, not an administrator → [`GuardOutcome::PermissionError`]
//! 6. required page not accessible, not an administrator → [`GuardOutcome::AccessDenied`]
//! 7. otherwise → [`GuardOutcome::Allowed`]

use workdesk_auth::{Principal, UserRole};

use super::store::PermissionSnapshot;

/// What the authentication provider currently knows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<Principal>,
    pub loading: bool,
}

impl AuthState {
    pub fn signed_in(user: Principal) -> Self {
        Self {
            user: Some(user),
            loading: false,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn loading() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

/// What a guarded route demands of the principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardRequirement {
    /// Page identifier checked with `has_page_access`.
    pub required_page: Option<String>,
    /// Area reserved for non-restricted roles.
    pub elevated_only: bool,
}

impl GuardRequirement {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn page(path: impl Into<String>) -> Self {
        Self {
            required_page: Some(path.into()),
            elevated_only: false,
        }
    }

    pub fn elevated(mut self) -> Self {
        self.elevated_only = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Loading,
    Unauthenticated { return_to: String },
    RoleRejected { role: UserRole },
    PermissionError { message: String },
    AccessDenied { page: String },
    Allowed,
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardOutcome::Allowed)
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            GuardOutcome::Loading => "loading",
            GuardOutcome::Unauthenticated { .. } => "unauthenticated",
            GuardOutcome::RoleRejected { .. } => "role_rejected",
            GuardOutcome::PermissionError { .. } => "permission_error",
            GuardOutcome::AccessDenied { .. } => "access_denied",
            GuardOutcome::Allowed => "allowed",
        }
    }
}

/// Decides whether `location` may be rendered.
pub fn evaluate(
    auth: &AuthState,
    permissions: &PermissionSnapshot,
    requirement: &GuardRequirement,
    location: &str,
) -> GuardOutcome {
    if auth.loading {
        return GuardOutcome::Loading;
    }

    let Some(user) = auth.user.as_ref() else {
        return GuardOutcome::Unauthenticated {
            return_to: location.to_string(),
        };
    };

    if permissions.loading() {
        return GuardOutcome::Loading;
    }

    if requirement.elevated_only {
        if let Some(role) = user.role.filter(|role| role.is_restricted()) {
            return GuardOutcome::RoleRejected { role };
        }
    }

    let is_admin = user.is_administrator();

    if let Some(message) = permissions.error.as_ref() {
        if !is_admin {
            return GuardOutcome::PermissionError {
                message: message.clone(),
            };
        }
    }

    if let Some(page) = requirement.required_page.as_ref() {
        if !is_admin && !permissions.has_page_access(page) {
            return GuardOutcome::AccessDenied { page: page.clone() };
        }
    }

    GuardOutcome::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::retry::FetchState;
    use uuid::Uuid;
    use workdesk_core::{ModuleKey, PageAction, PermissionRow, PermissionSet};

    fn principal(role: Option<UserRole>) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    fn loaded(rows: Vec<PermissionRow>) -> PermissionSnapshot {
        PermissionSnapshot::loaded(PermissionSet::from_rows(rows, Vec::new()))
    }

    fn errored() -> PermissionSnapshot {
        PermissionSnapshot::failed(
            FetchState::Failed {
                attempts: 4,
                error: "timeout".to_string(),
            },
            "timeout",
        )
    }

    fn all_the_rows() -> Vec<PermissionRow> {
        ModuleKey::ALL
            .into_iter()
            .map(|module| PermissionRow::page_action(PageAction::view(module), true))
            .collect()
    }

    #[test]
    fn test_auth_loading_decides_nothing() {
        let outcome = evaluate(
            &AuthState::loading(),
            &loaded(all_the_rows()),
            &GuardRequirement::page("/employees"),
            "/employees",
        );
        assert_eq!(outcome, GuardOutcome::Loading);
    }

    #[test]
    fn test_permissions_loading_decides_nothing() {
        let outcome = evaluate(
            &AuthState::signed_in(principal(Some(UserRole::Admin))),
            &PermissionSnapshot::default(),
            &GuardRequirement::none(),
            "/",
        );
        assert_eq!(outcome, GuardOutcome::Loading);
    }

    #[test]
    fn test_no_user_redirects_with_location() {
        let outcome = evaluate(
            &AuthState::signed_out(),
            &PermissionSnapshot::default(),
            &GuardRequirement::page("/leave"),
            "/leave?tab=pending",
        );
        assert_eq!(
            outcome,
            GuardOutcome::Unauthenticated {
                return_to: "/leave?tab=pending".to_string()
            }
        );
    }

    #[test]
    fn test_employee_rejected_from_elevated_area_despite_grants() {
        let outcome = evaluate(
            &AuthState::signed_in(principal(Some(UserRole::Employee))),
            &loaded(all_the_rows()),
            &GuardRequirement::page("/settings").elevated(),
            "/settings",
        );
        assert_eq!(
            outcome,
            GuardOutcome::RoleRejected {
                role: UserRole::Employee
            }
        );
    }

    #[test]
    fn test_role_rejection_precedes_fetch_error() {
        let outcome = evaluate(
            &AuthState::signed_in(principal(Some(UserRole::Employee))),
            &errored(),
            &GuardRequirement::none().elevated(),
            "/admin",
        );
        assert_eq!(outcome.kind(), "role_rejected");
    }

    #[test]
    fn test_employee_allowed_outside_elevated_area() {
        let outcome = evaluate(
            &AuthState::signed_in(principal(Some(UserRole::Employee))),
            &loaded(vec![PermissionRow::page_action(
                PageAction::view(ModuleKey::Leave),
                true,
            )]),
            &GuardRequirement::page("/leave"),
            "/leave",
        );
        assert!(outcome.is_allowed());
    }

    #[test]
    fn test_fetch_error_blocks_non_admin() {
        let outcome = evaluate(
            &AuthState::signed_in(principal(Some(UserRole::Manager))),
            &errored(),
            &GuardRequirement::none(),
            "/",
        );
        assert_eq!(
            outcome,
            GuardOutcome::PermissionError {
                message: "timeout".to_string()
            }
        );
    }

    #[test]
    fn test_admin_renders_despite_fetch_error() {
        let outcome = evaluate(
            &AuthState::signed_in(principal(Some(UserRole::Admin))),
            &errored(),
            &GuardRequirement::page("/employees"),
            "/employees",
        );
        assert_eq!(outcome, GuardOutcome::Allowed);
    }

    #[test]
    fn test_admin_bypasses_page_access() {
        let outcome = evaluate(
            &AuthState::signed_in(principal(Some(UserRole::Admin))),
            &loaded(vec![PermissionRow::page_access("/settings", false)]),
            &GuardRequirement::page("/settings").elevated(),
            "/settings",
        );
        assert_eq!(outcome, GuardOutcome::Allowed);
    }

    #[test]
    fn test_missing_page_access_denies() {
        let outcome = evaluate(
            &AuthState::signed_in(principal(Some(UserRole::HrManager))),
            &loaded(vec![PermissionRow::page_action(
                PageAction::view(ModuleKey::Employees),
                true,
            )]),
            &GuardRequirement::page("/settings"),
            "/settings",
        );
        assert_eq!(
            outcome,
            GuardOutcome::AccessDenied {
                page: "/settings".to_string()
            }
        );
    }

    #[test]
    fn test_page_access_via_module_view() {
        let outcome = evaluate(
            &AuthState::signed_in(principal(Some(UserRole::HrManager))),
            &loaded(vec![PermissionRow::page_action(
                PageAction::view(ModuleKey::Employees),
                true,
            )]),
            &GuardRequirement::page("/employees"),
            "/employees",
        );
        assert!(outcome.is_allowed());
    }

    #[test]
    fn test_no_role_claim_goes_through_permission_checks() {
        let user = principal(None);
        let outcome = evaluate(
            &AuthState::signed_in(user.clone()),
            &loaded(Vec::new()),
            &GuardRequirement::page("/reports").elevated(),
            "/reports",
        );
        assert_eq!(outcome.kind(), "access_denied");

        let outcome = evaluate(
            &AuthState::signed_in(user),
            &loaded(Vec::new()),
            &GuardRequirement::none(),
            "/",
        );
        assert!(outcome.is_allowed());
    }
}
