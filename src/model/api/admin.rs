use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::db::admin::{hash_password, NewAdmin};

/// Credentials presented when logging in or creating an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl TryFrom<AdminCredentials> for NewAdmin {
    type Error = Error;

    /// Hash the password, rejecting empty credentials.
    fn try_from(credentials: AdminCredentials) -> Result<Self, Self::Error> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(Error::BadRequest(
                "Admin username and password must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            username: credentials.username,
            password_hash: hash_password(&credentials.password)?,
        })
    }
}
