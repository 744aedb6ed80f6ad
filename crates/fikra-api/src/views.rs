//! HTML pages. Plain string building; every dynamic value goes through
//! [`escape`] (or `urlencoding::encode` inside URLs).

use std::fmt::Write;

use fikra_types::models::{Comment, Idea, Lang, Role, User};

use crate::i18n::Message;
use crate::middleware::Session;

/// What every page needs from the session.
pub struct PageContext {
    pub lang: Lang,
    pub user: Option<User>,
    pub flashes: Vec<String>,
}

impl PageContext {
    /// Reads the session and consumes its pending flashes.
    pub fn from_session(session: &mut Session) -> Self {
        Self {
            lang: session.lang(),
            user: session.user(),
            flashes: session.take_flashes(),
        }
    }

    fn t(&self, message: Message) -> &'static str {
        message.text(self.lang)
    }

    fn can_delete(&self, idea: &Idea) -> bool {
        self.user
            .as_ref()
            .is_some_and(|u| u.id == idea.submitter_id || u.role == Role::Admin)
    }
}

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(ctx: &PageContext, title: &str, body: &str) -> String {
    let dir = if ctx.lang.is_rtl() { "rtl" } else { "ltr" };

    let nav_user = match &ctx.user {
        Some(user) => format!(
            r#"<span>{} {}</span> <a href="/logout">{}</a>"#,
            ctx.t(Message::Welcome),
            escape(&user.username),
            ctx.t(Message::Logout),
        ),
        None => format!(
            r#"<a href="/login">{}</a> <a href="/register">{}</a>"#,
            ctx.t(Message::Login),
            ctx.t(Message::Register),
        ),
    };

    let mut flashes = String::new();
    for text in &ctx.flashes {
        let _ = write!(flashes, r#"<div class="flash">{}</div>"#, escape(text));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}" dir="{dir}">
<head>
<meta charset="utf-8">
<title>{title} - {site}</title>
</head>
<body>
<nav><a href="/">{home}</a> {nav_user} <a href="/set_lang/ar">العربية</a> <a href="/set_lang/en">English</a></nav>
{flashes}
<main>
{body}
</main>
</body>
</html>"#,
        lang = ctx.lang.code(),
        title = escape(title),
        site = ctx.t(Message::SiteTitle),
        home = ctx.t(Message::Home),
    )
}

fn vote_forms(ctx: &PageContext, idea: &Idea) -> String {
    let mut out = format!(
        r#"<form method="post" action="/vote/{id}"><button>{up} ({votes})</button></form>
<form method="post" action="/downvote/{id}"><button>{down} ({downvotes})</button></form>"#,
        id = idea.id,
        up = ctx.t(Message::Upvote),
        votes = idea.votes,
        down = ctx.t(Message::Downvote),
        downvotes = idea.downvotes,
    );
    if ctx.can_delete(idea) {
        let _ = write!(
            out,
            r#"
<form method="post" action="/delete_idea/{}"><button>{}</button></form>"#,
            idea.id,
            ctx.t(Message::Delete),
        );
    }
    out
}

fn image_tag(idea: &Idea) -> String {
    match &idea.image {
        Some(name) => format!(
            r#"<img src="/static/images/{}" alt="{}">"#,
            urlencoding::encode(name),
            escape(&idea.title)
        ),
        None => String::new(),
    }
}

pub fn index_page(ctx: &PageContext, ideas: &[Idea]) -> String {
    let mut body = String::new();

    if ctx.user.is_some() {
        let _ = write!(
            body,
            r#"<h2>{new_idea}</h2>
<form method="post" action="/" enctype="multipart/form-data">
<label>{title} <input name="title" required></label>
<label>{description} <textarea name="description"></textarea></label>
<label>{category} <input name="category"></label>
<label>{image} <input type="file" name="image" accept="image/*"></label>
<button>{submit}</button>
</form>
"#,
            new_idea = ctx.t(Message::NewIdea),
            title = ctx.t(Message::Title),
            description = ctx.t(Message::Description),
            category = ctx.t(Message::Category),
            image = ctx.t(Message::Image),
            submit = ctx.t(Message::Submit),
        );
    }

    let _ = writeln!(body, "<h2>{}</h2>", ctx.t(Message::Ideas));
    if ideas.is_empty() {
        let _ = writeln!(body, "<p>{}</p>", ctx.t(Message::NoIdeas));
    }

    for idea in ideas {
        let _ = write!(
            body,
            r#"<article class="idea">
<h3><a href="/idea/{id}">{title}</a></h3>
<p class="category">{category}</p>
<p>{description}</p>
{image}
<p>{by} {submitter}</p>
{votes}
<a href="/idea/{id}">{details}</a>
</article>
"#,
            id = idea.id,
            title = escape(&idea.title),
            category = escape(&idea.category),
            description = escape(&idea.description),
            image = image_tag(idea),
            by = ctx.t(Message::SubmittedBy),
            submitter = escape(&idea.submitter_username),
            votes = vote_forms(ctx, idea),
            details = ctx.t(Message::Details),
        );
    }

    layout(ctx, ctx.t(Message::Ideas), &body)
}

pub fn idea_page(ctx: &PageContext, idea: &Idea, comments: &[Comment]) -> String {
    let mut body = format!(
        r#"<article class="idea">
<h2>{title}</h2>
<p class="category">{category}</p>
<p>{description}</p>
{image}
<p>{by} {submitter}</p>
{votes}
</article>
<h3>{comments_label}</h3>
"#,
        title = escape(&idea.title),
        category = escape(&idea.category),
        description = escape(&idea.description),
        image = image_tag(idea),
        by = ctx.t(Message::SubmittedBy),
        submitter = escape(&idea.submitter_username),
        votes = vote_forms(ctx, idea),
        comments_label = ctx.t(Message::Comments),
    );

    if comments.is_empty() {
        let _ = writeln!(body, "<p>{}</p>", ctx.t(Message::NoComments));
    }
    for comment in comments {
        let _ = writeln!(
            body,
            r#"<div class="comment"><strong>{}</strong>: {}</div>"#,
            escape(&comment.author_username),
            escape(&comment.content),
        );
    }

    if ctx.user.is_some() {
        let _ = write!(
            body,
            r#"<form method="post" action="/idea/{}">
<label>{} <textarea name="content"></textarea></label>
<button>{}</button>
</form>
"#,
            idea.id,
            ctx.t(Message::AddComment),
            ctx.t(Message::Submit),
        );
    }

    layout(ctx, &idea.title, &body)
}

fn credentials_form(ctx: &PageContext, action: &str, heading: Message) -> String {
    format!(
        r#"<h2>{heading}</h2>
<form method="post" action="{action}">
<label>{username} <input name="username" required></label>
<label>{password} <input type="password" name="password" required></label>
<button>{heading}</button>
</form>"#,
        heading = ctx.t(heading),
        username = ctx.t(Message::Username),
        password = ctx.t(Message::Password),
    )
}

pub fn login_page(ctx: &PageContext) -> String {
    layout(ctx, ctx.t(Message::Login), &credentials_form(ctx, "/login", Message::Login))
}

pub fn register_page(ctx: &PageContext) -> String {
    layout(
        ctx,
        ctx.t(Message::Register),
        &credentials_form(ctx, "/register", Message::Register),
    )
}
