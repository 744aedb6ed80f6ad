use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use fikra_db::Database;
use fikra_types::api::CommentForm;
use fikra_types::models::Comment;

use crate::auth::AppState;
use crate::error::{AppError, AppResult};
use crate::i18n::Message;
use crate::ideas::get_idea;
use crate::middleware::Session;
use crate::views::{self, PageContext};

/// Comments on one idea, oldest first.
pub fn list_comments(db: &Database, idea_id: i64) -> AppResult<Vec<Comment>> {
    Ok(db.get_comments(idea_id)?.into_iter().map(Comment::from).collect())
}

/// Stores a trimmed comment written by the session user.
pub fn add_comment(db: &Database, session: &Session, idea_id: i64, content: &str) -> AppResult<i64> {
    let idea = get_idea(db, idea_id)?;
    let user = session.user().ok_or(AppError::AuthRequired)?;

    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::EmptyContent);
    }

    Ok(db.insert_comment(idea.id, user.id, content)?)
}

// -- Handlers --

/// GET /idea/{id}
pub async fn idea_detail(
    State(state): State<AppState>,
    mut session: Session,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let idea = match get_idea(&state.db, id) {
        Ok(idea) => idea,
        Err(AppError::NotFound(_)) => {
            return Ok(session
                .redirect_with_flash(&state.keys, Message::IdeaNotFound, "/")?
                .into_response());
        }
        Err(e) => return Err(e),
    };
    let comments = list_comments(&state.db, id)?;

    let ctx = PageContext::from_session(&mut session);
    let page = Html(views::idea_page(&ctx, &idea, &comments));
    Ok((session.commit(&state.keys)?, page).into_response())
}

/// POST /idea/{id}
pub async fn post_comment(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> AppResult<(CookieJar, Redirect)> {
    let back = format!("/idea/{id}");
    match add_comment(&state.db, &session, id, &form.content) {
        Ok(_) => session.redirect_with_flash(&state.keys, Message::CommentAdded, &back),
        Err(AppError::NotFound(_)) => {
            session.redirect_with_flash(&state.keys, Message::IdeaNotFound, "/")
        }
        Err(AppError::AuthRequired) => {
            session.redirect_with_flash(&state.keys, Message::LoginToComment, "/login")
        }
        Err(AppError::EmptyContent) => {
            session.redirect_with_flash(&state.keys, Message::CommentEmpty, &back)
        }
        Err(e) => Err(e),
    }
}
