//! Role claims and the authenticated principal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use workdesk_core::AppError;

use crate::claims::Claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    HrManager,
    Manager,
    Employee,
}

impl UserRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::HrManager => "hr_manager",
            UserRole::Manager => "manager",
            UserRole::Employee => "employee",
        }
    }

    /// Administrators bypass page-access and fetch-error checks.
    pub const fn is_administrator(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Restricted roles are denied elevated-only areas outright.
    pub const fn is_restricted(&self) -> bool {
        matches!(self, UserRole::Employee)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "hr_manager" => Ok(UserRole::HrManager),
            "manager" => Ok(UserRole::Manager),
            "employee" => Ok(UserRole::Employee),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// The authenticated user as the access layer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    /// `None` when the token has no role claim or an unrecognised one.
    pub role: Option<UserRole>,
}

impl Principal {
    pub fn is_administrator(&self) -> bool {
        self.role.is_some_and(|role| role.is_administrator())
    }

    pub fn is_restricted(&self) -> bool {
        self.role.is_some_and(|role| role.is_restricted())
    }
}

impl TryFrom<Claims> for Principal {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))?;
        let role = claims.role.as_deref().and_then(|raw| raw.parse().ok());

        Ok(Self {
            user_id,
            email: claims.email,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Option<&str>) -> Claims {
        Claims {
            sub: "00000000-0000-0000-0000-000000000001".to_string(),
            email: "test@example.com".to_string(),
            role: role.map(str::to_string),
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_role_round_trip() {
        for role in [
            UserRole::Admin,
            UserRole::HrManager,
            UserRole::Manager,
            UserRole::Employee,
        ] {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_only_admin_is_administrator() {
        assert!(UserRole::Admin.is_administrator());
        assert!(!UserRole::HrManager.is_administrator());
        assert!(!UserRole::Manager.is_administrator());
        assert!(!UserRole::Employee.is_administrator());
    }

    #[test]
    fn test_only_employee_is_restricted() {
        assert!(UserRole::Employee.is_restricted());
        assert!(!UserRole::Admin.is_restricted());
        assert!(!UserRole::Manager.is_restricted());
    }

    #[test]
    fn test_principal_from_claims() {
        let principal = Principal::try_from(claims(Some("admin"))).unwrap();
        assert_eq!(principal.user_id, Uuid::from_u128(1));
        assert_eq!(principal.role, Some(UserRole::Admin));
        assert!(principal.is_administrator());
    }

    #[test]
    fn test_unknown_role_claim_is_none() {
        let principal = Principal::try_from(claims(Some("owner"))).unwrap();
        assert_eq!(principal.role, None);
        assert!(!principal.is_administrator());
        assert!(!principal.is_restricted());
    }

    #[test]
    fn test_invalid_subject_is_rejected() {
        let mut bad = claims(None);
        bad.sub = "not-a-uuid".to_string();
        let err = Principal::try_from(bad).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }
}
