use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{
    Form,
    extract::State,
    response::{Html, Redirect},
};
use axum_extra::extract::CookieJar;
use tracing::info;

use fikra_db::Database;
use fikra_types::api::{LoginForm, RegisterForm};
use fikra_types::models::{Role, User};

use crate::error::{AppError, AppResult};
use crate::i18n::Message;
use crate::middleware::{Session, SessionKeys};
use crate::uploads::Uploads;
use crate::views::{self, PageContext};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub keys: SessionKeys,
    pub uploads: Uploads,
    pub max_upload_bytes: usize,
}

/// Creates a submitter account. Fails with `Conflict` if the name is taken.
pub fn register(db: &Database, username: &str, password: &str) -> AppResult<i64> {
    if db.get_user_by_username(username)?.is_some() {
        return Err(AppError::Conflict(format!("username {username} is taken")));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    // A concurrent registration can still win between the check and here.
    let user_id = db
        .create_user(username, &password_hash)?
        .ok_or_else(|| AppError::Conflict(format!("username {username} is taken")))?;
    info!("Registered user {} ({})", username, user_id);
    Ok(user_id)
}

/// Checks the credentials and, on success, records the user in the session.
/// Unknown users and wrong passwords fail the same way.
pub fn login(db: &Database, session: &mut Session, username: &str, password: &str) -> AppResult<User> {
    let user = db
        .get_user_by_username(username)?
        .ok_or(AppError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&user.password)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)?;

    let role: Role = user.role.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let user = User {
        id: user.id,
        username: user.username,
        role,
    };
    session.log_in(&user);
    Ok(user)
}

pub fn logout(session: &mut Session) {
    session.clear();
}

// -- Handlers --

/// GET /register
pub async fn register_form(
    State(state): State<AppState>,
    mut session: Session,
) -> AppResult<(CookieJar, Html<String>)> {
    let ctx = PageContext::from_session(&mut session);
    Ok((session.commit(&state.keys)?, Html(views::register_page(&ctx))))
}

/// POST /register
pub async fn register_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<(CookieJar, Redirect)> {
    match register(&state.db, &form.username, &form.password) {
        Ok(_) => session.redirect_with_flash(&state.keys, Message::Registered, "/login"),
        Err(AppError::Conflict(_)) => {
            session.redirect_with_flash(&state.keys, Message::UsernameExists, "/register")
        }
        Err(e) => Err(e),
    }
}

/// GET /login
pub async fn login_form(
    State(state): State<AppState>,
    mut session: Session,
) -> AppResult<(CookieJar, Html<String>)> {
    let ctx = PageContext::from_session(&mut session);
    Ok((session.commit(&state.keys)?, Html(views::login_page(&ctx))))
}

/// POST /login
pub async fn login_submit(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<(CookieJar, Redirect)> {
    match login(&state.db, &mut session, &form.username, &form.password) {
        Ok(_) => session.redirect_with_flash(&state.keys, Message::LoggedIn, "/"),
        Err(AppError::InvalidCredentials) => {
            session.redirect_with_flash(&state.keys, Message::InvalidCredentials, "/login")
        }
        Err(e) => Err(e),
    }
}

/// GET /logout. The banner uses the language chosen before the reset.
pub async fn logout_handler(
    State(state): State<AppState>,
    mut session: Session,
) -> AppResult<(CookieJar, Redirect)> {
    let farewell = Message::LoggedOut.text(session.lang());
    logout(&mut session);
    session.push_flash(farewell);
    Ok((session.commit(&state.keys)?, Redirect::to("/login")))
}
