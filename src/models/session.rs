use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The number of random bytes backing a session id (256 bits of entropy).
const SESSION_ID_BYTES: usize = 32;

/// An unguessable session identifier, generated server-side only.
///
/// Encoded as URL-safe base64 of 32 bytes from the OS CSPRNG, so collisions
/// between independently generated ids are cryptographically negligible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random session id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        OsRng.fill_bytes(&mut bytes);

        Self(general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Returns the string form of the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents one authenticated browser session.
///
/// A record exists in the session store if and only if a user successfully
/// authenticated and has not since logged out or expired. Fields are
/// immutable after creation.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// The unguessable identifier referenced by the client's cookie.
    pub session_id: SessionId,
    /// The ID of the user this session belongs to.
    pub user_id: i32,
    /// The display name resolved at login time.
    pub username: String,
    /// The timestamp when the session was created, used for expiry.
    pub created_at: DateTime<Utc>,
}

/// The identity the auth gate attaches to a request on success.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The ID of the authenticated user.
    pub id: i32,
    /// The session the request was authenticated under.
    pub session_id: SessionId,
}
