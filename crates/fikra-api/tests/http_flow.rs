//! End-to-end form flows through the router.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use fikra_api::auth::{AppState, AppStateInner};
use fikra_api::middleware::{SESSION_COOKIE, SessionKeys};
use fikra_api::uploads::Uploads;
use fikra_db::Database;

const BOUNDARY: &str = "fikra-test-boundary";

/// A browser stand-in that keeps the session cookie between requests.
struct Browser {
    app: Router,
    cookie: Option<String>,
}

impl Browser {
    fn new(state: AppState) -> Self {
        Self {
            app: fikra_api::router(state),
            cookie: None,
        }
    }

    async fn send(&mut self, mut req: Request<Body>) -> Response<Body> {
        if let Some(cookie) = &self.cookie {
            req.headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        let res = self.app.clone().oneshot(req).await.unwrap();

        for value in res.headers().get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap().to_string();
            if pair.starts_with(SESSION_COOKIE) {
                self.cookie = Some(pair);
            }
        }
        res
    }

    async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_form(&mut self, uri: &str, body: &str) -> Response<Body> {
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    async fn post_multipart(&mut self, uri: &str, body: Vec<u8>) -> Response<Body> {
        let req = Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    async fn page(&mut self, uri: &str) -> String {
        let res = self.get(uri).await;
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}

async fn test_state(dir: &std::path::Path, max_upload_bytes: usize) -> AppState {
    Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        keys: SessionKeys::new("integration-secret", 1),
        uploads: Uploads::new(dir.join("images")).await.unwrap(),
        max_upload_bytes,
    })
}

fn location(res: &Response<Body>) -> &str {
    res.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

fn idea_form(title: &str, image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [("title", title), ("description", "desc"), ("category", "tech")] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn logged_in(state: &AppState, name: &str) -> Browser {
    let mut browser = Browser::new(state.clone());
    let res = browser
        .post_form("/register", &format!("username={name}&password=pw1"))
        .await;
    assert_eq!(location(&res), "/login");
    let res = browser
        .post_form("/login", &format!("username={name}&password=pw1"))
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    browser
}

#[tokio::test]
async fn submit_vote_and_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), 1024 * 1024).await;
    let mut alice = logged_in(&state, "alice").await;

    // Login banner is waiting on the next page, in Arabic by default.
    let home = alice.page("/").await;
    assert!(home.contains("تم تسجيل الدخول!"));

    let res = alice
        .post_multipart("/", idea_form("Idea A", Some(("shot.png", &b"\x89PNG"[..]))))
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");

    let home = alice.page("/").await;
    assert!(home.contains("تمت إضافة الفكرة!"));
    assert!(home.contains("Idea A"));
    assert!(home.contains("/static/images/shot.png"));
    assert!(tmp.path().join("images/shot.png").exists());

    let id = state.db.list_ideas().unwrap()[0].id;

    // Voting needs no session.
    let mut stranger = Browser::new(state.clone());
    for _ in 0..2 {
        let res = stranger.post_form(&format!("/vote/{id}"), "").await;
        assert_eq!(location(&res), "/");
    }
    stranger.post_form(&format!("/downvote/{id}"), "").await;
    let stored = state.db.get_idea(id).unwrap().unwrap();
    assert_eq!((stored.votes, stored.downvotes), (2, 1));

    let res = alice.post_form(&format!("/delete_idea/{id}"), "").await;
    assert_eq!(location(&res), "/");
    let home = alice.page("/").await;
    assert!(home.contains("تم حذف الفكرة!"));
    assert!(!home.contains("Idea A"));
    assert!(!tmp.path().join("images/shot.png").exists());
}

#[tokio::test]
async fn anonymous_submission_is_sent_to_login() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), 1024 * 1024).await;
    let mut visitor = Browser::new(state.clone());

    let res = visitor.post_multipart("/", idea_form("Sneaky", None)).await;
    assert_eq!(location(&res), "/login");
    assert!(visitor.page("/login").await.contains("يجب تسجيل الدخول"));
    assert!(state.db.list_ideas().unwrap().is_empty());
}

#[tokio::test]
async fn strangers_cannot_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), 1024 * 1024).await;
    let mut alice = logged_in(&state, "alice").await;
    alice.post_multipart("/", idea_form("Mine", None)).await;
    let id = state.db.list_ideas().unwrap()[0].id;

    let mut bob = logged_in(&state, "bob").await;
    bob.get("/set_lang/en").await;
    let res = bob.post_form(&format!("/delete_idea/{id}"), "").await;
    assert_eq!(location(&res), "/");
    assert!(bob.page("/").await.contains("Not authorized"));
    assert!(state.db.get_idea(id).unwrap().is_some());

    alice.post_form(&format!("/delete_idea/{id}"), "").await;
    let res = alice.post_form(&format!("/delete_idea/{id}"), "").await;
    assert_eq!(location(&res), "/");
    assert!(alice.page("/").await.contains("الفكرة غير موجودة"));
}

#[tokio::test]
async fn comments_are_trimmed_and_blank_ones_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), 1024 * 1024).await;
    let mut alice = logged_in(&state, "alice").await;
    alice.post_multipart("/", idea_form("Talk", None)).await;
    let id = state.db.list_ideas().unwrap()[0].id;
    let detail = format!("/idea/{id}");

    let res = alice.post_form(&detail, "content=+++").await;
    assert_eq!(location(&res), detail);
    assert!(alice.page(&detail).await.contains("التعليق فارغ!"));
    assert_eq!(state.db.count_comments(id).unwrap(), 0);

    alice.post_form(&detail, "content=++hello++").await;
    let page = alice.page(&detail).await;
    assert!(page.contains("تم إضافة التعليق!"));
    assert_eq!(state.db.get_comments(id).unwrap()[0].content, "hello");

    let mut visitor = Browser::new(state.clone());
    let res = visitor.post_form(&detail, "content=hi").await;
    assert_eq!(location(&res), "/login");
    assert!(visitor.page("/login").await.contains("يجب تسجيل الدخول للتعليق"));
}

#[tokio::test]
async fn unknown_language_keeps_arabic() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), 1024 * 1024).await;
    let mut visitor = Browser::new(state);

    let req = Request::get("/set_lang/fr")
        .header(header::REFERER, "/login")
        .body(Body::empty())
        .unwrap();
    let res = visitor.send(req).await;
    assert_eq!(location(&res), "/login");

    visitor.post_form("/login", "username=ghost&password=x").await;
    let page = visitor.page("/login").await;
    assert!(page.contains("بيانات الدخول غير صحيحة"));
    assert!(page.contains(r#"dir="rtl""#));
}

#[tokio::test]
async fn english_session_and_logout() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), 1024 * 1024).await;
    let mut alice = logged_in(&state, "alice").await;

    let res = alice.get("/set_lang/en").await;
    assert_eq!(location(&res), "/");
    let home = alice.page("/").await;
    assert!(home.contains(r#"dir="ltr""#));
    assert!(home.contains("New idea"));

    let res = alice.get("/logout").await;
    assert_eq!(location(&res), "/login");
    let page = alice.page("/login").await;
    // Farewell in the old language, page itself back to Arabic.
    assert!(page.contains("Logged out"));
    assert!(page.contains(r#"dir="rtl""#));
}

#[tokio::test]
async fn duplicate_registration_is_flashed() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), 1024 * 1024).await;
    let mut browser = Browser::new(state.clone());

    browser.post_form("/register", "username=alice&password=pw1").await;
    let res = browser.post_form("/register", "username=alice&password=pw2").await;
    assert_eq!(location(&res), "/register");
    assert!(browser.page("/register").await.contains("اسم المستخدم موجود"));
}

#[tokio::test]
async fn missing_ideas_redirect_home() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), 1024 * 1024).await;
    let mut visitor = Browser::new(state);

    let res = visitor.post_form("/vote/41", "").await;
    assert_eq!(location(&res), "/");
    let res = visitor.get("/idea/41").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(visitor.page("/").await.contains("الفكرة غير موجودة"));
}

#[tokio::test]
async fn forged_cookie_is_anonymous() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), 1024 * 1024).await;
    let mut visitor = Browser::new(state.clone());
    visitor.cookie = Some(format!("{SESSION_COOKIE}=not.a.token"));

    let res = visitor.post_multipart("/", idea_form("Forged", None)).await;
    assert_eq!(location(&res), "/login");
    assert!(state.db.list_ideas().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), 2048).await;
    let mut alice = logged_in(&state, "alice").await;

    let big = vec![b'x'; 4096];
    let res = alice
        .post_multipart("/", idea_form("Huge", Some(("big.png", big.as_slice()))))
        .await;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(state.db.list_ideas().unwrap().is_empty());
}
