use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Professor,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Professor => "professor",
            UserRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(UserRole::Student),
            "professor" => Ok(UserRole::Professor),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: Uuid, role: UserRole, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            role,
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Identity and role of the caller, resolved once per request from the
/// bearer token and passed explicitly to handlers and workflow functions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub role: UserRole,
    pub token_id: Uuid,
}

impl RequestContext {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role, token_id: Uuid::now_v7() }
    }

    /// Professors and admins manage attendance and certificates.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Professor | UserRole::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<Claims> for RequestContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            token_id: claims.jti,
        }
    }
}

/// HS256 secret used to verify bearer tokens, shared through router state.
#[derive(Clone)]
pub struct JwtSecret(pub Arc<str>);

impl JwtSecret {
    pub fn new(secret: impl AsRef<str>) -> Self {
        Self(Arc::from(secret.as_ref()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Sign a token for `user_id`. Used by operator tooling and tests; end-user
    /// tokens are issued by the identity provider with the same secret.
    pub fn issue(&self, user_id: Uuid, role: UserRole, duration_secs: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims::new(user_id, role, duration_secs);
        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.as_bytes()))
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtSecret(..)")
    }
}
