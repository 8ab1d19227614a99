use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Identity carried by a verified bearer credential.
///
/// Rebuilt on every request from the token claims. At least one id is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantIdentity {
    pub user_id: Option<i64>,
    pub organization_id: Option<i64>,
}

impl TenantIdentity {
    pub fn new(user_id: Option<i64>, organization_id: Option<i64>) -> Result<Self, AppError> {
        if user_id.is_none() && organization_id.is_none() {
            return Err(AppError::Unauthorized(
                "Unauthorized: Invalid token data".to_string(),
            ));
        }
        Ok(Self {
            user_id,
            organization_id,
        })
    }

    pub fn require_org(&self) -> Result<i64, AppError> {
        self.organization_id.ok_or_else(|| {
            AppError::Unauthorized("Unauthorized: Invalid token data".to_string())
        })
    }

    pub fn require_user(&self) -> Result<i64, AppError> {
        self.user_id.ok_or_else(|| {
            AppError::Unauthorized("Unauthorized: Invalid token data".to_string())
        })
    }
}
