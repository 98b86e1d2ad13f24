use anyhow::{anyhow, Result};
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cache::token::Token;

#[derive(Debug, Deserialize)]
pub struct JwtClaims {
    pub exp: i64,
}

/// Turn an access token plus the optional `expires_in` of the response into a
/// cached token.
///
/// Expiry comes from `expires_in` when the service sent a positive value,
/// otherwise from the `exp` claim when the token is a JWT. A token with no
/// usable expiry is treated as already due, so it is refreshed on the next
/// request.
pub fn token_from_access_token(access_token: String, expires_in: Option<i64>, now_unix_ts: i64) -> Token {
    if let Some(expires_in) = expires_in.filter(|s| *s > 0) {
        return Token::new(access_token, now_unix_ts.saturating_add(expires_in));
    }

    match decode_jwt_from_string(&access_token) {
        Ok(claims) => {
            debug!(expires_at = claims.exp, "expiry taken from jwt claims");
            Token::new(access_token, claims.exp)
        }
        Err(e) => {
            warn!(error = %e, "token response carries no usable expiry, token will be refreshed on next request");
            Token::new(access_token, now_unix_ts)
        }
    }
}

fn decode_jwt_from_string(token_string: &str) -> Result<JwtClaims> {
    let parts: Vec<&str> = token_string.split('.').collect();
    if parts.len() != 3 {
        return Err(anyhow!("invalid JWT format, expected 3 parts got {}", parts.len()));
    }

    let payload = parts[1].trim_end_matches('=');
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| anyhow!("base64 decode error: {}", e))?;

    serde_json::from_slice::<JwtClaims>(&decoded)
        .map_err(|e| anyhow!("invalid JWT payload: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::token::Expiry;

    const NOW: i64 = 1_700_000_000;

    fn jwt_with_exp(exp: i64) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = engine.encode(format!(r#"{{"sub":"c1","exp":{}}}"#, exp));
        format!("{}.{}.sig", header, payload)
    }

    #[test]
    fn expires_in_wins() {
        let token = token_from_access_token(jwt_with_exp(NOW + 10), Some(3600), NOW);
        assert_eq!(token.expiry, Expiry::At(NOW + 3600));
    }

    #[test]
    fn huge_expires_in_saturates() {
        let token = token_from_access_token("abc".into(), Some(i64::MAX), NOW);
        assert_eq!(token.expiry, Expiry::At(i64::MAX));
        assert!(!token.needs_refresh_at(std::time::Duration::from_secs(60), NOW));
    }

    #[test]
    fn falls_back_to_jwt_exp() {
        let token = token_from_access_token(jwt_with_exp(NOW + 900), None, NOW);
        assert_eq!(token.expiry, Expiry::At(NOW + 900));

        let token = token_from_access_token(jwt_with_exp(NOW + 900), Some(0), NOW);
        assert_eq!(token.expiry, Expiry::At(NOW + 900));
    }

    #[test]
    fn opaque_token_without_expiry_is_due_immediately() {
        let token = token_from_access_token("opaque".into(), None, NOW);
        assert_eq!(token.expiry, Expiry::At(NOW));
        assert!(token.needs_refresh_at(std::time::Duration::from_secs(60), NOW));
    }

    #[test]
    fn rejects_malformed_jwt() {
        assert!(decode_jwt_from_string("a.b").is_err());
        assert!(decode_jwt_from_string("a.!!!.c").is_err());
    }
}
