use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, AppState};

#[derive(Deserialize)]
pub struct NewMessageRequest {
    pub text: String,
}

/// POST /messages/new
/// Create a message owned by the acting user, then redirect to their profile.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(viewer_id)): Extension<CurrentUser>,
    Form(payload): Form<NewMessageRequest>,
) -> Result<Response, ApiError> {
    state.messages.create(viewer_id, &payload.text).await?;

    Ok(Redirect::to(&format!("/users/{viewer_id}")).into_response())
}
