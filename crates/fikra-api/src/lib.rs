pub mod auth;
pub mod comments;
pub mod error;
pub mod i18n;
pub mod ideas;
pub mod middleware;
pub mod uploads;
pub mod views;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::auth::AppState;

/// All page and form routes. Static image serving is mounted by the binary.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(ideas::index).post(ideas::submit_idea))
        .route("/delete_idea/{id}", post(ideas::delete_idea_handler))
        .route("/vote/{id}", post(ideas::vote))
        .route("/downvote/{id}", post(ideas::downvote_handler))
        .route("/idea/{id}", get(comments::idea_detail).post(comments::post_comment))
        .route("/set_lang/{lang}", get(i18n::set_lang))
        .route("/register", get(auth::register_form).post(auth::register_submit))
        .route("/login", get(auth::login_form).post(auth::login_submit))
        .route("/logout", get(auth::logout_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
