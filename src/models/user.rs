//! Authenticated actors and their roles

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Role granted to a configured user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May add, modify and remove catalog entries
    Curator,
    /// May browse the catalog, borrow and return books
    Member,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Curator => write!(f, "curator"),
            Role::Member => write!(f, "member"),
        }
    }
}

/// Proof that the caller holds the curator role.
///
/// Only obtainable through [`UserClaims::require_curator`]; curator-only
/// collection operations take it as an argument.
#[derive(Debug, Clone)]
pub struct Curator {
    username: String,
}

impl Curator {
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_curator(&self) -> bool {
        self.role == Role::Curator
    }

    /// Require curator privileges
    pub fn require_curator(&self) -> Result<Curator, AppError> {
        if self.is_curator() {
            Ok(Curator {
                username: self.sub.clone(),
            })
        } else {
            Err(AppError::Authorization("Curator privileges required".to_string()))
        }
    }
}
