use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::session::SessionId;

/// The name of the cookie carrying the credential token.
pub const AUTH_COOKIE: &str = "authToken";

/// The structured payload behind the cookie value.
///
/// Carries the session id and nothing else: the client can read and replay
/// the cookie unmodified, so everything beyond the unguessable reference is
/// resolved server-side through the session store.
#[derive(Serialize, Deserialize)]
struct TokenPayload {
    #[serde(rename = "sessionId")]
    session_id: SessionId,
}

/// Encodes a session id into the opaque cookie value.
pub fn encode(session_id: &SessionId) -> Result<String> {
    let payload = sonic_rs::to_string(&TokenPayload {
        session_id: session_id.clone(),
    })
    .map_err(|e| AppError::Internal(format!("Token serialization failed: {}", e)))?;

    Ok(general_purpose::STANDARD.encode(payload))
}

/// Decodes a raw cookie value back into a session id.
///
/// Malformed input (bad base64, not JSON, missing field) is an expected,
/// recoverable case and simply yields `None`.
pub fn decode(raw: &str) -> Option<SessionId> {
    let bytes = general_purpose::STANDARD.decode(raw).ok()?;
    let payload: TokenPayload = sonic_rs::from_slice(&bytes).ok()?;
    Some(payload.session_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_resolves_the_same_id() {
        let session_id = SessionId::generate();
        let token = encode(&session_id).unwrap();
        assert_eq!(decode(&token), Some(session_id));
    }

    #[test]
    fn decode_rejects_garbage_without_panicking() {
        assert!(decode("").is_none());
        assert!(decode("not base64 at all!!").is_none());
        // Valid base64, but not JSON.
        assert!(decode(&general_purpose::STANDARD.encode("hello")).is_none());
        // Valid JSON, but no sessionId field.
        assert!(decode(&general_purpose::STANDARD.encode(r#"{"user":"admin"}"#)).is_none());
    }

    #[test]
    fn token_exposes_only_the_session_id() {
        let session_id = SessionId::generate();
        let token = encode(&session_id).unwrap();

        let decoded = general_purpose::STANDARD.decode(token).unwrap();
        let text = String::from_utf8(decoded).unwrap();
        assert_eq!(
            text,
            format!(r#"{{"sessionId":"{}"}}"#, session_id.as_str())
        );
    }
}
