use axum::{
    Extension,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, AppState};
use crate::db::{Message, User};

// ============================================================================
// Handlers
// ============================================================================

/// GET /users/{id}
/// Profile detail: any authenticated viewer may see any profile.
pub async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(_viewer): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Html<String>, ApiError> {
    let user = state.users.get_user(id).await?;
    let messages = state.messages.for_user(id).await?;

    Ok(Html(render_profile(&user, &messages)))
}

/// GET /users/{id}/following
pub async fn following(
    State(state): State<Arc<AppState>>,
    Extension(_viewer): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Html<String>, ApiError> {
    let user = state.users.get_user(id).await?;
    let listed = state.users.following(id).await?;

    Ok(Html(render_user_list("Following", &user, &listed)))
}

/// GET /users/{id}/followers
pub async fn followers(
    State(state): State<Arc<AppState>>,
    Extension(_viewer): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Html<String>, ApiError> {
    let user = state.users.get_user(id).await?;
    let listed = state.users.followers(id).await?;

    Ok(Html(render_user_list("Followers", &user, &listed)))
}

/// POST /users/follow/{id}
/// The acting user follows the target; redirects to their following view.
pub async fn follow(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(viewer_id)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state.users.follow(viewer_id, id).await?;

    Ok(Redirect::to(&format!("/users/{viewer_id}/following")).into_response())
}

/// POST /users/stop-following/{id}
pub async fn stop_following(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(viewer_id)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state.users.unfollow(viewer_id, id).await?;

    Ok(Redirect::to(&format!("/users/{viewer_id}/following")).into_response())
}

// ============================================================================
// Rendering
// ============================================================================

fn user_card(user: &User) -> String {
    let bio = user
        .bio
        .as_deref()
        .map_or_else(String::new, |b| {
            format!("<p class=\"bio\">{}</p>", html_escape::encode_text(b))
        });

    format!(
        "<div class=\"user-card\"><a href=\"/users/{}\">@{}</a>{}</div>",
        user.id,
        html_escape::encode_text(&user.username),
        bio
    )
}

fn render_profile(user: &User, messages: &[Message]) -> String {
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", html_escape::encode_text(&m.text)))
        .collect();

    format!(
        "<html><body>{}<ul class=\"messages\">{}</ul></body></html>",
        user_card(user),
        items
    )
}

fn render_user_list(title: &str, user: &User, listed: &[User]) -> String {
    let cards: String = listed.iter().map(|u| user_card(u)).collect();

    format!(
        "<html><body><h1>{} of @{}</h1>{}</body></html>",
        title,
        html_escape::encode_text(&user.username),
        cards
    )
}
