use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::warn;

use super::{
    claims::{Claims, TokenKind},
    jwt::JwtKeys,
};
use crate::error::ApiError;

/// Pull the bearer token out of the `Authorization` header. The value
/// must be exactly two space-separated parts with the literal scheme
/// `Bearer`; anything else reads as no token at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Some(token),
        _ => None,
    }
}

/// Verify the bearer access token on a request. Every failure is
/// normalized to an `Unauthorized` with a human-readable reason; raw
/// library errors never reach callers.
pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<Claims, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::unauthorized("No authorization token provided"))?;
    let claims = keys
        .verify(token)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;
    if claims.kind != TokenKind::Access {
        return Err(ApiError::unauthorized("Invalid token type"));
    }
    Ok(claims)
}

/// Extracts the verified access-token claims for protected handlers. The
/// rejection is the exact `ApiError` that `authenticate` produced, so a
/// 401 from here is indistinguishable from calling it by hand.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let claims = authenticate(&parts.headers, &keys).map_err(|e| {
            warn!(error = %e, "request authentication failed");
            e
        })?;
        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_parses_strictly() {
        assert_eq!(
            bearer_token(&headers_with_auth("Bearer abc123")),
            Some("abc123")
        );
        assert_eq!(bearer_token(&headers_with_auth("Bearer")), None);
        assert_eq!(bearer_token(&headers_with_auth("abc123")), None);
        assert_eq!(bearer_token(&headers_with_auth("Basic abc123")), None);
        assert_eq!(bearer_token(&headers_with_auth("bearer abc123")), None);
        assert_eq!(bearer_token(&headers_with_auth("Bearer a b")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn authenticate_requires_a_token() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let err = authenticate(&HeaderMap::new(), &keys).unwrap_err();
        assert_eq!(err.to_string(), "No authorization token provided");
    }

    #[test]
    fn authenticate_accepts_access_tokens_only() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user_id = Uuid::new_v4();

        let access = keys.sign_access(user_id, "a@b.com").expect("sign");
        let claims = authenticate(&headers_with_auth(&format!("Bearer {access}")), &keys)
            .expect("access token authenticates");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "a@b.com");

        // a validly signed refresh token is still the wrong kind here
        let refresh = keys.sign_refresh(user_id, "a@b.com").expect("sign");
        let err = authenticate(&headers_with_auth(&format!("Bearer {refresh}")), &keys)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid token type");
    }

    #[test]
    fn authenticate_surfaces_codec_reasons() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let err = authenticate(&headers_with_auth("Bearer not-a-jwt"), &keys).unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[test]
    fn authenticate_reports_expiry_distinctly() {
        let keys = JwtKeys::from_ref(&AppState::fake());
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            user_id: Uuid::new_v4(),
            email: "a@b.com".into(),
            kind: TokenKind::Access,
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize,
        };
        let stale =
            jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &keys.encoding)
                .unwrap();
        let err = authenticate(&headers_with_auth(&format!("Bearer {stale}")), &keys).unwrap_err();
        assert_eq!(err.to_string(), "Token expired");
    }
}
