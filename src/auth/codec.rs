//! Token codec for the values the frontend hands us as a "session token".
//!
//! The same field may hold a raw backend JWT (first sign-in), a JSON object
//! produced by `encode` (claims without a `session_token`), or an opaque
//! string. Nothing here verifies signatures: trust is deferred to the backend,
//! the payload is only read for `exp` and the user claims.

use base64ct::{Base64Url, Base64UrlUnpadded, Encoding};
use serde_json::{Map, Value};

/// Claim under which the raw token is kept next to its decoded claims.
pub const SESSION_TOKEN_CLAIM: &str = "session_token";

pub type Claims = Map<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub struct Jwt {
    pub header: Claims,
    pub claims: Claims,
    pub signature: String,
    pub raw: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Opaque(String),
    Jwt(Jwt),
    Encoded(Claims),
}

impl Token {
    /// Decoded claims merged with the raw token under `session_token`.
    /// Opaque tokens only carry the raw value.
    #[must_use]
    pub fn claims(&self) -> Claims {
        match self {
            Token::Opaque(raw) => {
                let mut claims = Claims::new();
                claims.insert(SESSION_TOKEN_CLAIM.to_string(), Value::from(raw.as_str()));
                claims
            }
            Token::Jwt(jwt) => {
                let mut claims = jwt.claims.clone();
                claims.insert(
                    SESSION_TOKEN_CLAIM.to_string(),
                    Value::from(jwt.raw.as_str()),
                );
                claims
            }
            Token::Encoded(claims) => claims.clone(),
        }
    }

    /// The bearer value to forward to the backend, if there is one.
    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        match self {
            Token::Opaque(raw) => Some(raw),
            Token::Jwt(jwt) => Some(&jwt.raw),
            Token::Encoded(claims) => claims.get(SESSION_TOKEN_CLAIM).and_then(Value::as_str),
        }
    }

    /// The `exp` claim in unix seconds.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        let claims = match self {
            Token::Opaque(_) => return None,
            Token::Jwt(jwt) => &jwt.claims,
            Token::Encoded(claims) => claims,
        };
        claims.get("exp").and_then(|exp| {
            exp.as_i64().or_else(|| {
                // Out-of-range floats would saturate; treat them as missing.
                exp.as_f64()
                    .filter(|value| value.is_finite())
                    .filter(|value| (i64::MIN as f64..i64::MAX as f64).contains(value))
                    .map(|value| value as i64)
            })
        })
    }
}

/// Decode a token, falling through the known shapes in order.
///
/// Returns `None` only for empty input; every other value decodes to at least
/// `Token::Opaque`. The input is taken as-is, callers trim if they need to.
#[must_use]
pub fn parse(raw: &str) -> Option<Token> {
    if raw.is_empty() {
        return None;
    }

    if let Some(claims) = parse_object(raw) {
        if claims.contains_key(SESSION_TOKEN_CLAIM) {
            return Some(Token::Encoded(claims));
        }
    }

    if let Some(jwt) = parse_jwt(raw) {
        return Some(Token::Jwt(jwt));
    }

    if let Some(claims) = parse_object(raw) {
        return Some(Token::Encoded(claims));
    }

    Some(Token::Opaque(raw.to_string()))
}

/// Encode claims back into the value stored by the frontend.
///
/// Claims carrying a string `session_token` encode to that string, so a
/// decode/encode cycle hands back the original backend token.
#[must_use]
pub fn encode(claims: &Claims) -> Option<String> {
    if let Some(token) = claims.get(SESSION_TOKEN_CLAIM) {
        return token.as_str().map(ToString::to_string);
    }
    serde_json::to_string(claims).ok()
}

fn parse_object(value: &str) -> Option<Claims> {
    if !value.starts_with('{') {
        return None;
    }
    match serde_json::from_str::<Value>(value) {
        Ok(Value::Object(claims)) => Some(claims),
        _ => None,
    }
}

fn parse_jwt(value: &str) -> Option<Jwt> {
    let mut parts = value.split('.');
    let header_b64 = parts.next()?;
    let claims_b64 = parts.next()?;
    let signature = parts.next()?;
    if parts.next().is_some() || header_b64.is_empty() || claims_b64.is_empty() {
        return None;
    }

    let claims = b64d_object(claims_b64)?;
    // The header is informational only; a token with a broken header still
    // carries usable claims.
    let header = b64d_object(header_b64).unwrap_or_default();

    Some(Jwt {
        header,
        claims,
        signature: signature.to_string(),
        raw: value.to_string(),
    })
}

fn b64d_object(segment: &str) -> Option<Claims> {
    let bytes = Base64UrlUnpadded::decode_vec(segment)
        .or_else(|_| Base64Url::decode_vec(segment))
        .ok()?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Some(claims),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Build an unsigned JWT around `claims`.
    pub(crate) fn jwt_with(claims: &Value) -> String {
        let header = json!({ "alg": "HS256", "typ": "JWT" });
        format!(
            "{}.{}.signature",
            Base64UrlUnpadded::encode_string(header.to_string().as_bytes()),
            Base64UrlUnpadded::encode_string(claims.to_string().as_bytes())
        )
    }

    #[test]
    fn opaque_values_are_returned_unchanged() {
        for raw in ["plain-token", "a.b", "one.two.three.four", "01HZX3J9", "=="] {
            assert_eq!(parse(raw), Some(Token::Opaque(raw.to_string())), "{raw}");
        }
    }

    #[test]
    fn empty_input_decodes_to_nothing() {
        assert_eq!(parse(""), None);
    }

    #[test]
    fn surrounding_whitespace_is_not_stripped() {
        assert_eq!(parse("   "), Some(Token::Opaque("   ".to_string())));

        let object = r#" {"exp": 42}"#;
        assert_eq!(parse(object), Some(Token::Opaque(object.to_string())));

        let padded = format!(" {} ", jwt_with(&json!({ "sub": "u" })));
        let token = parse(&padded).unwrap();
        assert_eq!(token.session_token(), Some(padded.as_str()));
        assert_eq!(token.claims()["sub"], json!("u"));
    }

    #[test]
    fn out_of_range_exp_is_ignored() {
        let token = parse(&jwt_with(&json!({ "exp": -1e300 }))).unwrap();
        assert_eq!(token.expires_at(), None);

        let token = parse(&jwt_with(&json!({ "exp": 1e300 }))).unwrap();
        assert_eq!(token.expires_at(), None);

        let token = parse(&jwt_with(&json!({ "exp": 1_700_000_000.5 }))).unwrap();
        assert_eq!(token.expires_at(), Some(1_700_000_000));
    }

    #[test]
    fn undecodable_jwt_payload_falls_back_to_opaque() {
        let token = parse("abc.def.ghi");
        assert_eq!(token, Some(Token::Opaque("abc.def.ghi".to_string())));
        assert_eq!(
            token.as_ref().and_then(Token::session_token),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn jwt_claims_are_merged_with_raw_token() {
        let raw = jwt_with(&json!({ "sub": "user-1", "exp": 1_700_000_000 }));
        let token = parse(&raw).unwrap();

        assert!(matches!(token, Token::Jwt(_)));
        assert_eq!(token.expires_at(), Some(1_700_000_000));
        let claims = token.claims();
        assert_eq!(claims["session_token"], json!(raw));
        assert_eq!(claims["sub"], json!("user-1"));
    }

    #[test]
    fn padded_payload_is_accepted() {
        let claims = json!({ "sub": "u" }).to_string();
        let raw = format!(
            "{}.{}.sig",
            Base64Url::encode_string(b"{}"),
            Base64Url::encode_string(claims.as_bytes())
        );
        let token = parse(&raw).unwrap();
        assert_eq!(token.claims()["sub"], json!("u"));
    }

    #[test]
    fn json_object_with_session_token_is_used_directly() {
        let raw = json!({ "session_token": "abc", "name": "Ada" }).to_string();
        let token = parse(&raw).unwrap();
        assert_eq!(token.session_token(), Some("abc"));
        assert_eq!(token.claims()["name"], json!("Ada"));
    }

    #[test]
    fn json_object_without_session_token_is_encoded() {
        let token = parse(r#"{"exp": 42}"#).unwrap();
        assert!(matches!(token, Token::Encoded(_)));
        assert_eq!(token.expires_at(), Some(42));
        assert_eq!(token.session_token(), None);
    }

    #[test]
    fn broken_json_is_opaque() {
        let token = parse("{not json").unwrap();
        assert_eq!(token, Token::Opaque("{not json".to_string()));
    }

    #[test]
    fn encode_returns_session_token_and_decode_restores_claims() {
        let original = json!({ "sub": "user-9", "email": "a@b.dev", "exp": 1_800_000_000 });
        let raw = jwt_with(&original);

        let mut claims = original.as_object().cloned().unwrap();
        claims.insert(SESSION_TOKEN_CLAIM.to_string(), json!(raw));

        let encoded = encode(&claims).unwrap();
        assert_eq!(encoded, raw);

        let decoded = parse(&encoded).unwrap().claims();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn encode_without_session_token_serializes_json() {
        let claims = json!({ "exp": 7 }).as_object().cloned().unwrap();
        let encoded = encode(&claims).unwrap();
        assert_eq!(parse(&encoded).unwrap().claims(), claims);
    }
}
