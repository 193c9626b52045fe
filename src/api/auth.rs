use axum::{
    Form,
    extract::{Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState};
use crate::db::NewUser;

/// The single session key recognized as the acting identity.
pub const CURR_USER_KEY: &str = "curr_user";

/// One-shot flash message, consumed by the next render of the home page.
pub const FLASH_KEY: &str = "flash";

/// Request-scoped acting identity, inserted by the gate middleware.
///
/// Handlers take this as an `Extension` so identity is always explicit,
/// never read from ambient state.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i32);

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authorization gate for user-scoped routes.
///
/// Two states: anonymous requests are turned away uniformly with an
/// "Access unauthorized." flash and a redirect to the home page, whatever
/// the target resource or method was. Authenticated requests proceed with
/// their identity attached; being logged in is the only requirement, there
/// is no ownership check on the target.
pub async fn require_user(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Ok(Some(user_id)) = session.get::<i32>(CURR_USER_KEY).await {
        request.extensions_mut().insert(CurrentUser(user_id));
        return Ok(next.run(request).await);
    }

    session
        .insert(FLASH_KEY, "Access unauthorized.")
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    Ok(Redirect::to("/").into_response())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
/// Safe default view; renders and consumes any pending flash message.
pub async fn home(session: Session) -> Result<Html<String>, ApiError> {
    let flash: Option<String> = session
        .remove(FLASH_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    let flash_html = flash.map_or_else(String::new, |msg| {
        format!("<p class=\"flash\">{}</p>", html_escape::encode_text(&msg))
    });

    Ok(Html(format!(
        "<html><body>{flash_html}<h1>Warbler</h1></body></html>"
    )))
}

/// POST /signup
/// Create an account and log the new user in. Uniqueness is not pre-checked;
/// a duplicate username/email comes back from the commit as a conflict.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<SignupRequest>,
) -> Result<Response, ApiError> {
    let user = state
        .users
        .signup(NewUser {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            image_url: payload.image_url,
        })
        .await?;

    session
        .insert(CURR_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    Ok(Redirect::to("/").into_response())
}

/// POST /login
/// Authenticate and establish the session identity. A failed login is an
/// expected outcome, rendered as a 401 with "Invalid credentials."
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<LoginRequest>,
) -> Result<Response, ApiError> {
    let Some(user) = state
        .users
        .authenticate(&payload.username, &payload.password)
        .await?
    else {
        return Err(ApiError::Unauthorized("Invalid credentials.".to_string()));
    };

    session
        .insert(CURR_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Redirect::to("/").into_response())
}

/// POST /logout
/// Invalidate the current session.
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    Redirect::to("/")
}
