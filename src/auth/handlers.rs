use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::TokenKind,
        cookie::{clear_refresh_cookie, refresh_cookie, refresh_token_from_headers},
        dto::{
            AuthResponse, LoginRequest, LogoutResponse, PublicUser, RefreshResponse, SignupRequest,
        },
        jwt::{decode_insecure, JwtKeys},
        password::{hash_password, is_valid_email, validate_password, verify_password},
        repo_types::User,
    },
    error::{method_not_allowed, ApiError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup).fallback(method_not_allowed))
        .route("/auth/login", post(login).fallback(method_not_allowed))
        .route("/auth/refresh", post(refresh).fallback(method_not_allowed))
        .route("/auth/logout", post(logout).fallback(method_not_allowed))
}

fn set_cookie(cookie: Cookie<'static>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie.to_string().parse().unwrap());
    headers
}

/// Presence check shared by signup and login. Missing and empty fields
/// produce the same message.
fn credentials(
    email: Option<String>,
    password: Option<String>,
) -> Result<(String, String), ApiError> {
    match (email, password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => Ok((e, p)),
        _ => Err(ApiError::validation("Email and password are required")),
    }
}

fn bad_json(_: JsonRejection) -> ApiError {
    ApiError::validation("Invalid JSON in request body")
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload.map_err(bad_json)?;
    let (email, password) = credentials(payload.email, payload.password)?;
    let email = email.trim().to_lowercase();

    if !is_valid_email(&email) {
        warn!(email = %email, "signup with invalid email");
        return Err(ApiError::validation("Invalid email format"));
    }

    let violations = validate_password(&password);
    if !violations.is_empty() {
        warn!("signup password rejected by policy");
        return Err(ApiError::validation(violations.join(", ")));
    }

    match User::find_by_email(&state.db, &email).await {
        Ok(Some(_)) => {
            warn!(email = %email, "signup for existing email");
            return Err(ApiError::UserExists);
        }
        Ok(None) => {}
        Err(e) => return Err(ApiError::server("Failed to create user", e)),
    }

    let hash = hash_password(&password).map_err(|e| ApiError::server("Failed to create user", e))?;
    let user = User::create(&state.db, &email, &hash)
        .await
        .map_err(|e| ApiError::server("Failed to create user", e))?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys
        .sign_access(user.id, &user.email)
        .map_err(|e| ApiError::server("Failed to create user", e))?;
    let refresh_token = keys
        .sign_refresh(user.id, &user.email)
        .map_err(|e| ApiError::server("Failed to create user", e))?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok((
        StatusCode::CREATED,
        set_cookie(refresh_cookie(
            &refresh_token,
            keys.refresh_ttl,
            state.config.environment.is_production(),
        )),
        Json(AuthResponse {
            success: true,
            user: PublicUser {
                id: user.id,
                email: user.email,
                last_login_at: None,
            },
            access_token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload.map_err(bad_json)?;
    let (email, password) = credentials(payload.email, payload.password)?;
    let email = email.trim().to_lowercase();

    let user = match User::find_by_email(&state.db, &email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login for unknown email");
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => return Err(ApiError::server("Login failed", e)),
    };

    if !user.is_active {
        warn!(user_id = %user.id, "login to deactivated account");
        return Err(ApiError::unauthorized("Account is deactivated"));
    }

    let ok = verify_password(&password, &user.password_hash)
        .map_err(|e| ApiError::server("Login failed", e))?;
    if !ok {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    User::update_last_login(&state.db, user.id)
        .await
        .map_err(|e| ApiError::server("Login failed", e))?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys
        .sign_access(user.id, &user.email)
        .map_err(|e| ApiError::server("Login failed", e))?;
    let refresh_token = keys
        .sign_refresh(user.id, &user.email)
        .map_err(|e| ApiError::server("Login failed", e))?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        set_cookie(refresh_cookie(
            &refresh_token,
            keys.refresh_ttl,
            state.config.environment.is_production(),
        )),
        Json(AuthResponse {
            success: true,
            user: PublicUser {
                id: user.id,
                email: user.email,
                // the login before this one, read prior to the stamp above
                last_login_at: user.last_login_at,
            },
            access_token,
        }),
    ))
}

/// Rotate the token pair from the refresh cookie alone. No user lookup:
/// the verified payload is trusted as-is, and the previous refresh token
/// stays valid until its natural expiry.
#[instrument(skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<RefreshResponse>), ApiError> {
    let keys = JwtKeys::from_ref(&state);

    let token = refresh_token_from_headers(&headers)
        .ok_or_else(|| ApiError::unauthorized("No refresh token provided"))?;

    let claims = keys.verify(&token).map_err(|e| {
        if let Some(stale) = decode_insecure(&token) {
            warn!(user_id = %stale.user_id, error = %e, "refresh token rejected");
        }
        ApiError::unauthorized(e.to_string())
    })?;

    if claims.kind != TokenKind::Refresh {
        warn!(user_id = %claims.user_id, "access token presented for refresh");
        return Err(ApiError::unauthorized("Invalid token type"));
    }

    let access_token = keys
        .sign_access(claims.user_id, &claims.email)
        .map_err(|e| ApiError::server("Failed to refresh token", e))?;
    let refresh_token = keys
        .sign_refresh(claims.user_id, &claims.email)
        .map_err(|e| ApiError::server("Failed to refresh token", e))?;

    info!(user_id = %claims.user_id, "token pair rotated");
    Ok((
        set_cookie(refresh_cookie(
            &refresh_token,
            keys.refresh_ttl,
            state.config.environment.is_production(),
        )),
        Json(RefreshResponse {
            success: true,
            access_token,
        }),
    ))
}

/// Logout never fails: there is no server-side session to destroy, only a
/// cookie to clear.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<LogoutResponse>) {
    info!("user logged out");
    (
        set_cookie(clear_refresh_cookie(
            state.config.environment.is_production(),
        )),
        Json(LogoutResponse {
            success: true,
            message: "Logged out successfully",
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, state::AppState};
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn send(req: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
        let app = build_app(AppState::fake());
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, json)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn test_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    #[tokio::test]
    async fn signup_requires_email_and_password() {
        let (status, _, body) = send(post_json("/api/auth/signup", r#"{"email":"a@b.com"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Email and password are required");

        // empty strings count as missing
        let (status, _, body) = send(post_json(
            "/api/auth/signup",
            r#"{"email":"","password":""}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Email and password are required");
    }

    #[tokio::test]
    async fn signup_rejects_malformed_email_and_weak_password() {
        let (status, _, body) = send(post_json(
            "/api/auth/signup",
            r#"{"email":"not-an-email","password":"validpass1"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid email format");

        let (status, _, body) = send(post_json(
            "/api/auth/signup",
            r#"{"email":"a@b.com","password":"short"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Password must be at least 8 characters long, Password must contain at least one number"
        );
    }

    #[tokio::test]
    async fn malformed_json_body_is_a_validation_error() {
        let (status, _, body) = send(post_json("/api/auth/login", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid JSON in request body");
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let (status, _, body) =
            send(post_json("/api/auth/login", r#"{"password":"validpass1"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Email and password are required");
    }

    #[tokio::test]
    async fn refresh_without_cookie_is_unauthorized() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/refresh")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert_eq!(body["error"]["message"], "No refresh token provided");
    }

    #[tokio::test]
    async fn refresh_rotates_the_pair() {
        let keys = test_keys();
        let user_id = Uuid::new_v4();
        let refresh = keys.sign_refresh(user_id, "a@b.com").unwrap();

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/refresh")
            .header(header::COOKIE, format!("refreshToken={refresh}"))
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        // body carries a fresh, valid access token and nothing else
        let access = body["accessToken"].as_str().unwrap();
        let claims = keys.verify(access).unwrap();
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.user_id, user_id);
        assert!(body.get("user").is_none());

        // and the cookie holds a new refresh token
        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("refreshToken="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Strict"));
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let keys = test_keys();
        let access = keys.sign_access(Uuid::new_v4(), "a@b.com").unwrap();

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/refresh")
            .header(header::COOKIE, format!("refreshToken={access}"))
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Invalid token type");
    }

    #[tokio::test]
    async fn refresh_reports_expiry_distinctly() {
        let keys = test_keys();
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let claims = crate::auth::claims::Claims {
            user_id: Uuid::new_v4(),
            email: "a@b.com".into(),
            kind: TokenKind::Refresh,
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize,
        };
        let stale =
            jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &keys.encoding)
                .unwrap();

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/refresh")
            .header(header::COOKIE, format!("refreshToken={stale}"))
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Token expired");
    }

    #[tokio::test]
    async fn logout_always_succeeds_and_clears_the_cookie() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/logout")
            .header(header::COOKIE, "refreshToken=whatever-even-invalid")
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Logged out successfully");

        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("refreshToken="));
        assert!(set_cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn wrong_method_is_405_before_auth() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/auth/login")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");
    }
}
