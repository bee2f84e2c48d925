//! Session identity, signup and login DTOs.

use serde::{Deserialize, Serialize};

/// Server-assigned user identifier.
pub type UserId = u64;

/// Role carried in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May create and delete groups and sees every group.
    Admin,
    /// Regular member.
    User,
    /// Any role this client does not know about. Treated as non-admin.
    #[serde(other)]
    Other,
}

impl Role {
    /// Whether admin-only operations should be offered.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Accepts the roles an account can be created with.
impl std::str::FromStr for Role {
    type Err = crate::ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(crate::ProtocolError::UnknownValue { kind: "role", value: s.to_owned() }),
        }
    }
}

/// Response of `GET /auth/me`.
///
/// Resolved once per view load; used to decide which messages are ours and to
/// gate admin-only commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Authenticated user.
    pub user_id: UserId,
    /// Role of that user.
    pub role: Role,
}

/// Body of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Plaintext password, sent over the configured transport.
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent calls.
    pub access_token: String,
    /// Role of the logged-in user.
    pub role: Role,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Body of `POST /auth/signup`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Display name.
    pub name: String,
    /// Account email, unique per backend.
    pub email: String,
    /// Plaintext password, sent over the configured transport.
    pub password: String,
    /// Requested role.
    pub role: Role,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Response of `POST /auth/signup`. No token: the new account logs in
/// separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupResponse {
    /// Confirmation text from the server.
    pub message: String,
    /// Role the account was created with.
    pub role: Role,
}
