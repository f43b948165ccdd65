use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Login and registration body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub passhash: String,
}

impl Credentials {
    /// Parse a JSON body. Content type is not checked.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(body).map_err(|e| ApiError::bad_request(e.to_string()))
    }
}
