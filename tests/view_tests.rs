use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use warbler::api::AppState;
use warbler::config::Config;
use warbler::db::NewUser;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let state = warbler::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    (warbler::api::router(state.clone()), state)
}

/// Seed the two mutually-following users the view scenarios start from.
async fn seed_users(state: &Arc<AppState>) -> (i32, i32) {
    let u1 = state
        .users
        .signup(NewUser {
            username: "testuser".to_string(),
            email: "test@test.com".to_string(),
            password: "testuser".to_string(),
            image_url: None,
        })
        .await
        .unwrap();
    state
        .users
        .update_bio(u1.id, Some("Test user bio"))
        .await
        .unwrap();

    let u2 = state
        .users
        .signup(NewUser {
            username: "testuser2".to_string(),
            email: "test2@test.com".to_string(),
            password: "testuser2".to_string(),
            image_url: None,
        })
        .await
        .unwrap();
    state
        .users
        .update_bio(u2.id, Some("User Two bio"))
        .await
        .unwrap();

    state.users.follow(u1.id, u2.id).await.unwrap();
    state.users.follow(u2.id, u1.id).await.unwrap();

    (u1.id, u2.id)
}

/// Log in over HTTP and return the session cookie to replay on later requests.
async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!(
                    "username={username}&password={password}"
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    session_cookie(response.headers())
}

fn session_cookie(headers: &axum::http::HeaderMap) -> String {
    headers
        .get(header::SET_COOKIE)
        .expect("response should set a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn get_with_cookie(app: &Router, uri: &str, cookie: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn post_with_cookie(app: &Router, uri: &str, cookie: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Anonymous request to a gated route, then follow the redirect home to
/// observe the denial message, carrying the session cookie like a browser.
async fn assert_denied(app: &Router, method: &str, uri: &str) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

    let cookie = session_cookie(response.headers());
    let home = get_with_cookie(app, "/", &cookie).await;
    assert_eq!(home.status(), StatusCode::OK);

    let html = body_text(home).await;
    assert!(html.contains("Access unauthorized"));
}

#[tokio::test]
async fn user_page_shows_bio_for_any_authenticated_viewer() {
    let (app, state) = spawn_app().await;
    let (u1, u2) = seed_users(&state).await;

    let cookie = login(&app, "testuser", "testuser").await;

    // own profile
    let response = get_with_cookie(&app, &format!("/users/{u1}"), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Test user bio"));

    // someone else's profile
    let response = get_with_cookie(&app, &format!("/users/{u2}"), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("User Two bio"));
}

#[tokio::test]
async fn user_page_requires_authentication() {
    let (app, state) = spawn_app().await;
    let (u1, _) = seed_users(&state).await;

    assert_denied(&app, "GET", &format!("/users/{u1}")).await;
}

#[tokio::test]
async fn following_page_lists_followed_users_bios() {
    let (app, state) = spawn_app().await;
    let (u1, u2) = seed_users(&state).await;

    let cookie = login(&app, "testuser", "testuser").await;

    let response = get_with_cookie(&app, &format!("/users/{u1}/following"), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("User Two bio"));

    // another user's following page is just as visible
    let response = get_with_cookie(&app, &format!("/users/{u2}/following"), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Test user bio"));
}

#[tokio::test]
async fn following_page_requires_authentication() {
    let (app, state) = spawn_app().await;
    let (u1, _) = seed_users(&state).await;

    assert_denied(&app, "GET", &format!("/users/{u1}/following")).await;
}

#[tokio::test]
async fn followers_page_lists_follower_bios() {
    let (app, state) = spawn_app().await;
    let (u1, u2) = seed_users(&state).await;

    let cookie = login(&app, "testuser", "testuser").await;

    let response = get_with_cookie(&app, &format!("/users/{u1}/followers"), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("User Two bio"));

    let response = get_with_cookie(&app, &format!("/users/{u2}/followers"), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Test user bio"));
}

#[tokio::test]
async fn followers_page_requires_authentication() {
    let (app, state) = spawn_app().await;
    let (u1, _) = seed_users(&state).await;

    assert_denied(&app, "GET", &format!("/users/{u1}/followers")).await;
}

#[tokio::test]
async fn stop_following_removes_target_from_following_view() {
    let (app, state) = spawn_app().await;
    let (u1, u2) = seed_users(&state).await;

    let cookie = login(&app, "testuser", "testuser").await;

    let response = post_with_cookie(&app, &format!("/users/stop-following/{u2}"), &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        &format!("/users/{u1}/following")
    );

    let response = get_with_cookie(&app, &format!("/users/{u1}/following"), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!body_text(response).await.contains("User Two bio"));
}

#[tokio::test]
async fn stop_following_requires_authentication() {
    let (app, state) = spawn_app().await;
    let (_, u2) = seed_users(&state).await;

    assert_denied(&app, "POST", &format!("/users/stop-following/{u2}")).await;
}

#[tokio::test]
async fn follow_adds_target_to_following_view() {
    let (app, state) = spawn_app().await;
    let (u1, _) = seed_users(&state).await;

    let u3 = state
        .users
        .signup(NewUser {
            username: "testuser3".to_string(),
            email: "test3@test.com".to_string(),
            password: "testuser3".to_string(),
            image_url: None,
        })
        .await
        .unwrap();
    state
        .users
        .update_bio(u3.id, Some("The new user bio"))
        .await
        .unwrap();

    let cookie = login(&app, "testuser", "testuser").await;

    let response = post_with_cookie(&app, &format!("/users/follow/{}", u3.id), &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = get_with_cookie(&app, &format!("/users/{u1}/following"), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("The new user bio"));
}

#[tokio::test]
async fn follow_requires_authentication() {
    let (app, state) = spawn_app().await;
    let (_, u2) = seed_users(&state).await;

    assert_denied(&app, "POST", &format!("/users/follow/{u2}")).await;
}

#[tokio::test]
async fn login_with_bad_credentials_is_rejected() {
    let (app, state) = spawn_app().await;
    seed_users(&state).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=testuser&password=wrong"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("Invalid credentials."));
}

#[tokio::test]
async fn signup_logs_the_new_user_in() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/signup")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "username=brandnew&email=new@test.com&password=brandnewpw",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(response.headers());

    // the fresh session passes the gate
    let response = get_with_cookie(&app, "/users/1", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("brandnew"));
}

#[tokio::test]
async fn duplicate_signup_over_http_conflicts() {
    let (app, state) = spawn_app().await;
    seed_users(&state).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/signup")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "username=testuser&email=test@test.com&password=whatever",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn new_message_shows_up_on_profile() {
    let (app, state) = spawn_app().await;
    let (u1, _) = seed_users(&state).await;

    let cookie = login(&app, "testuser", "testuser").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/messages/new")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("text=Hello+Warbler"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        &format!("/users/{u1}")
    );

    let response = get_with_cookie(&app, &format!("/users/{u1}"), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Hello Warbler"));
}
