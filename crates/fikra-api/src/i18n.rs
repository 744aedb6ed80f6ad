//! Arabic/English message table.
//!
//! Every user-facing string is a [`Message`] key. A key resolves to an
//! `(arabic, english)` pair and the session language picks one side.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, header},
    response::Redirect,
};
use axum_extra::extract::CookieJar;

use fikra_types::models::Lang;

use crate::auth::AppState;
use crate::error::AppError;
use crate::middleware::Session;

/// Returns `en_text` when the language is English, `ar_text` otherwise.
pub fn translate<'a>(lang: Lang, ar_text: &'a str, en_text: &'a str) -> &'a str {
    match lang {
        Lang::En => en_text,
        Lang::Ar => ar_text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    // Flash messages
    LoginRequired,
    IdeaAdded,
    NotAuthorized,
    IdeaDeleted,
    IdeaNotFound,
    UsernameExists,
    Registered,
    LoggedIn,
    InvalidCredentials,
    LoggedOut,
    LoginToComment,
    CommentAdded,
    CommentEmpty,

    // Page labels
    SiteTitle,
    Home,
    Login,
    Logout,
    Register,
    Username,
    Password,
    Title,
    Description,
    Category,
    Image,
    Submit,
    NewIdea,
    Ideas,
    NoIdeas,
    Comments,
    NoComments,
    AddComment,
    Upvote,
    Downvote,
    Delete,
    Details,
    SubmittedBy,
    Welcome,
}

impl Message {
    /// The `(arabic, english)` pair for this key.
    pub fn pair(self) -> (&'static str, &'static str) {
        match self {
            Message::LoginRequired => ("يجب تسجيل الدخول", "Login required"),
            Message::IdeaAdded => ("تمت إضافة الفكرة!", "Idea added!"),
            Message::NotAuthorized => ("غير مصرح لك", "Not authorized"),
            Message::IdeaDeleted => ("تم حذف الفكرة!", "Idea deleted!"),
            Message::IdeaNotFound => ("الفكرة غير موجودة", "Idea not found"),
            Message::UsernameExists => ("اسم المستخدم موجود", "Username exists"),
            Message::Registered => ("تم التسجيل! يرجى تسجيل الدخول", "Registered! Please login"),
            Message::LoggedIn => ("تم تسجيل الدخول!", "Logged in!"),
            Message::InvalidCredentials => ("بيانات الدخول غير صحيحة", "Invalid credentials"),
            Message::LoggedOut => ("تم تسجيل الخروج", "Logged out"),
            Message::LoginToComment => ("يجب تسجيل الدخول للتعليق", "Login to comment"),
            Message::CommentAdded => ("تم إضافة التعليق!", "Comment added!"),
            Message::CommentEmpty => ("التعليق فارغ!", "Comment is empty!"),

            Message::SiteTitle => ("منصة الأفكار", "Ideas Platform"),
            Message::Home => ("الرئيسية", "Home"),
            Message::Login => ("تسجيل الدخول", "Login"),
            Message::Logout => ("تسجيل الخروج", "Logout"),
            Message::Register => ("التسجيل", "Register"),
            Message::Username => ("اسم المستخدم", "Username"),
            Message::Password => ("كلمة المرور", "Password"),
            Message::Title => ("العنوان", "Title"),
            Message::Description => ("الوصف", "Description"),
            Message::Category => ("التصنيف", "Category"),
            Message::Image => ("صورة", "Image"),
            Message::Submit => ("إرسال", "Submit"),
            Message::NewIdea => ("فكرة جديدة", "New idea"),
            Message::Ideas => ("الأفكار", "Ideas"),
            Message::NoIdeas => ("لا توجد أفكار بعد", "No ideas yet"),
            Message::Comments => ("التعليقات", "Comments"),
            Message::NoComments => ("لا توجد تعليقات", "No comments"),
            Message::AddComment => ("أضف تعليقاً", "Add a comment"),
            Message::Upvote => ("تأييد", "Upvote"),
            Message::Downvote => ("معارضة", "Downvote"),
            Message::Delete => ("حذف", "Delete"),
            Message::Details => ("التفاصيل", "Details"),
            Message::SubmittedBy => ("بواسطة", "By"),
            Message::Welcome => ("مرحباً", "Welcome"),
        }
    }

    pub fn text(self, lang: Lang) -> &'static str {
        let (ar, en) = self.pair();
        translate(lang, ar, en)
    }
}

/// GET /set_lang/{lang}: remembers a recognized language and sends the
/// visitor back where they came from.
pub async fn set_lang(
    State(state): State<AppState>,
    mut session: Session,
    Path(lang): Path<String>,
    headers: HeaderMap,
) -> Result<(CookieJar, Redirect), AppError> {
    session.set_language(&lang);

    let back = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("/")
        .to_string();

    Ok((session.commit(&state.keys)?, Redirect::to(&back)))
}
