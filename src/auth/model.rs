use serde::{Deserialize, Serialize};

/// JWT claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user's id.
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
    /// Always "access"; other token types are rejected at validation.
    pub token_type: String,
}
