use axum::{
    extract::{Multipart, Path, State},
    response::{Html, Redirect},
};
use axum_extra::extract::CookieJar;
use bytes::Bytes;
use tracing::{info, warn};

use fikra_db::Database;
use fikra_types::models::{Idea, Role};

use crate::auth::{AppState, AppStateInner};
use crate::error::{AppError, AppResult};
use crate::i18n::Message;
use crate::middleware::Session;
use crate::views::{self, PageContext};

/// Fields of the "new idea" form.
#[derive(Debug, Default)]
pub struct NewIdea {
    pub title: String,
    pub description: String,
    pub category: String,
    pub image: Option<ImageUpload>,
}

#[derive(Debug)]
pub struct ImageUpload {
    /// Name as sent by the browser.
    pub file_name: String,
    pub data: Bytes,
}

/// Every idea, newest first.
pub fn list_ideas(db: &Database) -> AppResult<Vec<Idea>> {
    Ok(db.list_ideas()?.into_iter().map(Idea::from).collect())
}

pub fn get_idea(db: &Database, id: i64) -> AppResult<Idea> {
    db.get_idea(id)?
        .map(Idea::from)
        .ok_or_else(|| AppError::NotFound(format!("idea {id}")))
}

/// Stores the optional image, then inserts the idea owned by the session user.
pub async fn create_idea(state: &AppStateInner, session: &Session, idea: NewIdea) -> AppResult<i64> {
    let user = session.user().ok_or(AppError::AuthRequired)?;

    let image = match &idea.image {
        Some(upload) => state.uploads.save(&upload.file_name, &upload.data).await?,
        None => None,
    };

    let id = state.db.insert_idea(
        &idea.title,
        &idea.description,
        &idea.category,
        image.as_deref(),
        user.id,
    )?;

    info!("Idea {} created by {}", id, user.username);
    Ok(id)
}

/// Removes an idea, its comments and its image. Only the submitter or an
/// admin may do this.
pub async fn delete_idea(state: &AppStateInner, session: &Session, id: i64) -> AppResult<()> {
    let idea = get_idea(&state.db, id)?;

    let allowed = session
        .user()
        .is_some_and(|user| user.id == idea.submitter_id || user.role == Role::Admin);
    if !allowed {
        return Err(AppError::Unauthorized);
    }

    if let Some(image) = &idea.image {
        if let Err(e) = state.uploads.delete_file(image).await {
            warn!("Could not remove image {} of idea {}: {}", image, id, e);
        }
    }

    if !state.db.delete_idea(id)? {
        return Err(AppError::NotFound(format!("idea {id}")));
    }

    info!("Idea {} deleted", id);
    Ok(())
}

/// Adds one upvote. Anyone may vote, any number of times.
pub fn upvote(db: &Database, id: i64) -> AppResult<()> {
    if db.increment_votes(id)? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("idea {id}")))
    }
}

/// Adds one downvote. Anyone may vote, any number of times.
pub fn downvote(db: &Database, id: i64) -> AppResult<()> {
    if db.increment_downvotes(id)? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("idea {id}")))
    }
}

/// Reads the multipart body of the submission form. `title`, `description`
/// and `category` are required; `image` is optional and ignored when the
/// browser sent no filename.
pub async fn read_idea_form(mut multipart: Multipart) -> AppResult<NewIdea> {
    let mut title = None;
    let mut description = None;
    let mut category = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "title" => title = Some(field.text().await?),
            "description" => description = Some(field.text().await?),
            "category" => category = Some(field.text().await?),
            "image" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await?;
                if !file_name.is_empty() {
                    image = Some(ImageUpload { file_name, data });
                }
            }
            _ => {}
        }
    }

    let missing = |field: &str| AppError::BadRequest(format!("missing form field: {field}"));
    Ok(NewIdea {
        title: title.ok_or_else(|| missing("title"))?,
        description: description.ok_or_else(|| missing("description"))?,
        category: category.ok_or_else(|| missing("category"))?,
        image,
    })
}

// -- Handlers --

/// GET /
pub async fn index(
    State(state): State<AppState>,
    mut session: Session,
) -> AppResult<(CookieJar, Html<String>)> {
    let ideas = list_ideas(&state.db)?;
    let ctx = PageContext::from_session(&mut session);
    Ok((session.commit(&state.keys)?, Html(views::index_page(&ctx, &ideas))))
}

/// POST /
pub async fn submit_idea(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> AppResult<(CookieJar, Redirect)> {
    if session.user().is_none() {
        return session.redirect_with_flash(&state.keys, Message::LoginRequired, "/login");
    }

    let form = read_idea_form(multipart).await?;
    create_idea(&state, &session, form).await?;
    session.redirect_with_flash(&state.keys, Message::IdeaAdded, "/")
}

/// POST /delete_idea/{id}
pub async fn delete_idea_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> AppResult<(CookieJar, Redirect)> {
    match delete_idea(&state, &session, id).await {
        Ok(()) => session.redirect_with_flash(&state.keys, Message::IdeaDeleted, "/"),
        Err(AppError::NotFound(_)) => {
            session.redirect_with_flash(&state.keys, Message::IdeaNotFound, "/")
        }
        Err(AppError::Unauthorized) => {
            session.redirect_with_flash(&state.keys, Message::NotAuthorized, "/")
        }
        Err(e) => Err(e),
    }
}

/// POST /vote/{id}
pub async fn vote(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> AppResult<(CookieJar, Redirect)> {
    counted(&state, session, upvote(&state.db, id))
}

/// POST /downvote/{id}
pub async fn downvote_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> AppResult<(CookieJar, Redirect)> {
    counted(&state, session, downvote(&state.db, id))
}

/// Votes go back to the list silently; only a missing idea gets a banner.
fn counted(
    state: &AppStateInner,
    session: Session,
    outcome: AppResult<()>,
) -> AppResult<(CookieJar, Redirect)> {
    match outcome {
        Ok(()) => Ok((session.commit(&state.keys)?, Redirect::to("/"))),
        Err(AppError::NotFound(_)) => {
            session.redirect_with_flash(&state.keys, Message::IdeaNotFound, "/")
        }
        Err(e) => Err(e),
    }
}
