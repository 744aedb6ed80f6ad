use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use fikra_types::api::SessionClaims;
use fikra_types::models::{Lang, User};

use crate::auth::AppState;
use crate::error::AppError;
use crate::i18n::Message;

pub const SESSION_COOKIE: &str = "fikra_session";

/// Signing material for the session cookie.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_days: u32,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_days: u32) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_days,
        }
    }

    /// Expiry timestamp for a cookie signed now.
    fn expires_at(&self) -> Result<usize, AppError> {
        let exp = chrono::Duration::try_days(i64::from(self.ttl_days))
            .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| anyhow::anyhow!("session lifetime of {} days is out of range", self.ttl_days))?;
        Ok(exp.timestamp() as usize)
    }
}

/// Per-request session context, read from the signed cookie.
///
/// A missing, expired or tampered cookie yields an empty session. Handlers
/// that change the session hand it back through [`Session::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    claims: SessionClaims,
}

impl Session {
    pub fn decode(token: &str, keys: &SessionKeys) -> Self {
        match decode::<SessionClaims>(token, &keys.decoding, &Validation::default()) {
            Ok(data) => Self {
                claims: data.claims,
            },
            Err(e) => {
                debug!("Discarding session cookie: {}", e);
                Self::default()
            }
        }
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<User> {
        match (&self.claims.uid, &self.claims.username) {
            (Some(id), Some(username)) => Some(User {
                id: *id,
                username: username.clone(),
                role: self.claims.role.unwrap_or_default(),
            }),
            _ => None,
        }
    }

    pub fn lang(&self) -> Lang {
        self.claims.lang
    }

    /// Stores a recognized language code. Unknown codes are ignored.
    pub fn set_language(&mut self, code: &str) -> bool {
        match Lang::from_code(code) {
            Some(lang) => {
                self.claims.lang = lang;
                true
            }
            None => false,
        }
    }

    pub fn log_in(&mut self, user: &User) {
        self.claims.uid = Some(user.id);
        self.claims.username = Some(user.username.clone());
        self.claims.role = Some(user.role);
    }

    /// Forgets everything: identity, language and pending flashes.
    pub fn clear(&mut self) {
        self.claims = SessionClaims::default();
    }

    /// Queues a banner for the next rendered page, in the current language.
    pub fn flash(&mut self, message: Message) {
        self.push_flash(message.text(self.lang()));
    }

    pub fn push_flash(&mut self, text: impl Into<String>) {
        self.claims.flashes.push(text.into());
    }

    pub fn take_flashes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.claims.flashes)
    }

    /// Signs the session into a fresh cookie.
    pub fn commit(mut self, keys: &SessionKeys) -> Result<CookieJar, AppError> {
        self.claims.exp = keys.expires_at()?;
        let token = encode(&Header::default(), &self.claims, &keys.encoding)?;

        let cookie = Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);

        Ok(CookieJar::new().add(cookie))
    }

    /// Flashes `message` and redirects to `to`, carrying the updated cookie.
    pub fn redirect_with_flash(
        mut self,
        keys: &SessionKeys,
        message: Message,
        to: &str,
    ) -> Result<(CookieJar, Redirect), AppError> {
        self.flash(message);
        Ok((self.commit(keys)?, Redirect::to(to)))
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(jar
            .get(SESSION_COOKIE)
            .map(|cookie| Session::decode(cookie.value(), &state.keys))
            .unwrap_or_default())
    }
}
