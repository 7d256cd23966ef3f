use serde::{Deserialize, Serialize};

/// Claims carried by identity-provider bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // provider user id
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
}

/// Resolved from the bearer token by the Axum extractor in `middleware::auth`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}
