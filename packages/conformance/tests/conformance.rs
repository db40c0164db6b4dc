//! End-to-end conformance tests for the DevTalk server.
//!
//! Each test spawns an ephemeral in-process server (real TCP, real HTTP) via
//! [`devtalk_conformance::spawn_server`] and drives it with a cookie-keeping
//! `reqwest` client that does not follow redirects, so every `302` and its
//! `Location` can be asserted directly.
//!
//! # Coverage
//!
//! | Test | Area |
//! |------|------|
//! | `join_then_login_greets_user` | local signup and login |
//! | `duplicate_join_redirects_with_exist` | signup conflict |
//! | `invalid_join_redirects_with_invalid` | signup validation |
//! | `login_unknown_email_sets_notice` | login failure notice |
//! | `login_wrong_password_sets_notice` | login failure notice |
//! | `logged_in_user_is_bounced_from_join` | guest-only pages |
//! | `logout_ends_session` | logout |
//! | `anonymous_write_returns_401` | login-gated JSON routes |
//! | `post_hashtags_are_searchable` | posting and hashtag search |
//! | `blank_hashtag_search_redirects_home` | hashtag search |
//! | `overlong_post_is_rejected` | content validation |
//! | `upload_image_is_served_back` | image upload and static serving |
//! | `upload_without_img_field_is_400` | image upload |
//! | `only_author_may_delete_post` | post ownership |
//! | `author_updates_post_content` | post edit |
//! | `follow_shows_on_profile_and_unfollow_removes_it` | follow graph |
//! | `remove_follower_drops_reverse_edge` | follow graph |
//! | `kakao_login_round_trip` | OAuth |
//! | `kakao_login_with_bad_code_reports_failure` | OAuth failure |
//! | `kakao_callback_without_state_cookie_fails` | OAuth CSRF state |
//! | `unconfigured_provider_is_404` | OAuth |
//! | `unknown_route_renders_error_page` | 404 page |
//! | `openapi_document_is_served` | API docs |

use devtalk::Provider;
use devtalk_conformance::{browser, spawn_server, FAKE_NICK, FAKE_SNS_ID, GRANTED_CODE};
use devtalk_server::Storage;
use reqwest::StatusCode;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const PASSWORD: &str = "correct-horse";

fn location(resp: &reqwest::Response) -> String {
    resp.headers()["location"].to_str().unwrap().to_string()
}

async fn join(base: &str, client: &reqwest::Client, email: &str, nick: &str) -> reqwest::Response {
    client
        .post(format!("{base}/auth/join"))
        .form(&[("email", email), ("nick", nick), ("password", PASSWORD)])
        .send()
        .await
        .unwrap()
}

async fn login(base: &str, client: &reqwest::Client, email: &str, password: &str) -> reqwest::Response {
    client
        .post(format!("{base}/auth/login"))
        .form(&[("email", email), ("password", password)])
        .send()
        .await
        .unwrap()
}

/// A client holding a fresh session for a newly joined user.
async fn member(base: &str, email: &str, nick: &str) -> reqwest::Client {
    let client = browser();
    assert_eq!(join(base, &client, email, nick).await.status(), StatusCode::FOUND);
    let resp = login(base, &client, email, PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    client
}

async fn write_post(base: &str, client: &reqwest::Client, content: &str) -> reqwest::Response {
    client
        .post(format!("{base}/post"))
        .form(&[("content", content)])
        .send()
        .await
        .unwrap()
}

async fn page(base: &str, client: &reqwest::Client, path: &str) -> (StatusCode, String) {
    let resp = client.get(format!("{base}{path}")).send().await.unwrap();
    let status = resp.status();
    (status, resp.text().await.unwrap())
}

// ---------------------------------------------------------------------------
// Local accounts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn join_then_login_greets_user() {
    let (base, storage) = spawn_server().await;
    let client = browser();

    let resp = join(&base, &client, "alice@example.com", "alice").await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    // Signing up does not log in.
    let (_, body) = page(&base, &client, "/").await;
    assert!(!body.contains("안녕하세요!"));

    let resp = login(&base, &client, "alice@example.com", PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let (status, body) = page(&base, &client, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("안녕하세요! alice님"), "{body}");

    let stored = storage
        .find_local_user("alice@example.com")
        .await
        .unwrap()
        .expect("user stored");
    assert_eq!(stored.provider, Provider::Local);
    let hash = stored.password.expect("password hash stored");
    assert_ne!(hash, PASSWORD);
}

#[tokio::test]
async fn duplicate_join_redirects_with_exist() {
    let (base, _) = spawn_server().await;
    let client = browser();
    join(&base, &client, "dup@example.com", "first").await;

    let resp = join(&base, &client, "dup@example.com", "second").await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/join?error=exist");

    let (_, body) = page(&base, &client, "/join?error=exist").await;
    assert!(body.contains("이미 가입된 이메일입니다."));
}

#[tokio::test]
async fn invalid_join_redirects_with_invalid() {
    let (base, _) = spawn_server().await;
    let client = browser();

    let resp = client
        .post(format!("{base}/auth/join"))
        .form(&[("email", "not-an-email"), ("nick", "x"), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/join?error=invalid");
}

#[tokio::test]
async fn login_unknown_email_sets_notice() {
    let (base, _) = spawn_server().await;
    let client = browser();

    let resp = login(&base, &client, "ghost@example.com", PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/?loginError="));

    let target = location(&resp);
    let (_, body) = page(&base, &client, &target).await;
    assert!(body.contains("가입되지 않은 회원입니다."), "{body}");
}

#[tokio::test]
async fn login_wrong_password_sets_notice() {
    let (base, _) = spawn_server().await;
    let client = browser();
    join(&base, &client, "bob@example.com", "bob").await;

    let resp = login(&base, &client, "bob@example.com", "wrong-password").await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let target = location(&resp);
    assert!(target.starts_with("/?loginError="));
    let (_, body) = page(&base, &client, &target).await;
    assert!(body.contains("비밀번호가 일치하지 않습니다."), "{body}");
    assert!(!body.contains("안녕하세요! bob님"));
}

#[tokio::test]
async fn logged_in_user_is_bounced_from_join() {
    let (base, _) = spawn_server().await;
    let client = member(&base, "carol@example.com", "carol").await;

    let resp = client.get(format!("{base}/join")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/?error="));

    let resp = login(&base, &client, "carol@example.com", PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/?error="));
}

#[tokio::test]
async fn logout_ends_session() {
    let (base, _) = spawn_server().await;
    let client = member(&base, "dave@example.com", "dave").await;

    let resp = client.get(format!("{base}/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let resp = write_post(&base, &client, "after logout").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // A second logout has no session to end.
    let resp = client.post(format!("{base}/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_write_returns_401() {
    let (base, _) = spawn_server().await;
    let client = browser();

    let resp = write_post(&base, &client, "hello").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "로그인 필요" }));

    let resp = client
        .delete(format!("{base}/post/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(format!("{base}/user/1/follow"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = page(&base, &client, "/profile").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Posts and hashtags
// ---------------------------------------------------------------------------

#[tokio::test]
async fn post_hashtags_are_searchable() {
    let (base, storage) = spawn_server().await;
    let client = member(&base, "erin@example.com", "erin").await;

    let resp = write_post(&base, &client, "learning #Rust with #axum today").await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    write_post(&base, &client, "nothing tagged here").await;

    assert!(storage.find_hashtag("rust").await.unwrap().is_some());
    assert!(storage.find_hashtag("axum").await.unwrap().is_some());

    let (status, body) = page(&base, &client, "/hashtag?hashtag=rust").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("learning #Rust with #axum today"));
    assert!(!body.contains("nothing tagged here"));

    // Case and a leading '#' do not matter; anonymous visitors may search.
    let (status, body) = page(&base, &browser(), "/hashtag?hashtag=%23RUST").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("learning #Rust with #axum today"));

    let (status, body) = page(&base, &client, "/hashtag?hashtag=python").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("learning #Rust"));

    // The main timeline lists both posts.
    let (_, body) = page(&base, &client, "/").await;
    assert!(body.contains("nothing tagged here"));
    assert!(body.contains("learning #Rust with #axum today"));
}

#[tokio::test]
async fn blank_hashtag_search_redirects_home() {
    let (base, _) = spawn_server().await;
    let resp = browser()
        .get(format!("{base}/hashtag?hashtag=%20"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
async fn overlong_post_is_rejected() {
    let (base, storage) = spawn_server().await;
    let client = member(&base, "frank@example.com", "frank").await;

    let resp = write_post(&base, &client, &"가".repeat(141)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = write_post(&base, &client, "").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(storage.list_posts().await.unwrap().is_empty());
}

#[tokio::test]
async fn upload_image_is_served_back() {
    let (base, _) = spawn_server().await;
    let client = member(&base, "gina@example.com", "gina").await;
    let bytes = b"\x89PNG\r\n\x1a\nconformance".to_vec();

    let part = reqwest::multipart::Part::bytes(bytes.clone())
        .file_name("cat.png")
        .mime_str("image/png")
        .unwrap();
    let resp = client
        .post(format!("{base}/post/img"))
        .multipart(reqwest::multipart::Form::new().part("img", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/img/cat"), "{url}");
    assert!(url.ends_with(".png"), "{url}");

    let served = client.get(format!("{base}{url}")).send().await.unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.bytes().await.unwrap().to_vec(), bytes);

    // The returned path is what the post form submits.
    let resp = client
        .post(format!("{base}/post"))
        .form(&[("content", "my cat"), ("url", url.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    let (_, page_body) = page(&base, &client, "/").await;
    assert!(page_body.contains("my cat"));
}

#[tokio::test]
async fn upload_without_img_field_is_400() {
    let (base, _) = spawn_server().await;
    let client = member(&base, "hana@example.com", "hana").await;

    let part = reqwest::multipart::Part::bytes(b"data".to_vec()).file_name("cat.png");
    let resp = client
        .post(format!("{base}/post/img"))
        .multipart(reqwest::multipart::Form::new().part("image", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_author_may_delete_post() {
    let (base, storage) = spawn_server().await;
    let author = member(&base, "ian@example.com", "ian").await;
    let other = member(&base, "jade@example.com", "jade").await;

    write_post(&base, &author, "mine, not yours").await;
    let id = storage.list_posts().await.unwrap()[0].post.id;

    let resp = other
        .delete(format!("{base}/post/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "권한이 없습니다" }));

    let resp = author
        .delete(format!("{base}/post/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "삭제되었습니다" }));
    assert!(storage.get_post(id).await.unwrap().is_none());

    let resp = author
        .delete(format!("{base}/post/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn author_updates_post_content() {
    let (base, storage) = spawn_server().await;
    let author = member(&base, "kim@example.com", "kim").await;
    let other = member(&base, "lee@example.com", "lee").await;

    write_post(&base, &author, "first draft").await;
    let id = storage.list_posts().await.unwrap()[0].post.id;

    let resp = other
        .put(format!("{base}/post/{id}"))
        .json(&json!({ "content": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = author
        .put(format!("{base}/post/{id}"))
        .json(&json!({ "content": "final draft" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "수정되었습니다");
    assert_eq!(body["post"]["content"], "final draft");
    assert_eq!(body["post"]["id"], id);

    let resp = author
        .put(format!("{base}/post/{id}"))
        .json(&json!({ "content": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let stored = storage.get_post(id).await.unwrap().unwrap();
    assert_eq!(stored.content, "final draft");
}

// ---------------------------------------------------------------------------
// Follows
// ---------------------------------------------------------------------------

#[tokio::test]
async fn follow_shows_on_profile_and_unfollow_removes_it() {
    let (base, storage) = spawn_server().await;
    let _mina = member(&base, "mina@example.com", "mina").await;
    let noah = member(&base, "noah@example.com", "noah").await;
    let mina_id = storage
        .find_local_user("mina@example.com")
        .await
        .unwrap()
        .unwrap()
        .id;
    let noah_id = storage
        .find_local_user("noah@example.com")
        .await
        .unwrap()
        .unwrap()
        .id;

    let resp = noah
        .post(format!("{base}/user/{mina_id}/follow"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "success");

    let followers = storage.list_followers(mina_id).await.unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].id, noah_id);

    let (status, body) = page(&base, &noah, "/profile").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("mina"), "{body}");

    let resp = noah
        .delete(format!("{base}/user/{mina_id}/following"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "팔로우를 취소했습니다." }));
    assert!(storage.list_followers(mina_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn remove_follower_drops_reverse_edge() {
    let (base, storage) = spawn_server().await;
    let olga = member(&base, "olga@example.com", "olga").await;
    let paul = member(&base, "paul@example.com", "paul").await;
    let olga_id = storage
        .find_local_user("olga@example.com")
        .await
        .unwrap()
        .unwrap()
        .id;
    let paul_id = storage
        .find_local_user("paul@example.com")
        .await
        .unwrap()
        .unwrap()
        .id;

    paul.post(format!("{base}/user/{olga_id}/follow"))
        .send()
        .await
        .unwrap();

    let resp = olga
        .delete(format!("{base}/user/{paul_id}/follower"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "팔로워가 제거되었습니다" }));
    assert!(storage.list_followings(paul_id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// OAuth
// ---------------------------------------------------------------------------

/// Start a Kakao login and return the `state` the server issued.
async fn start_kakao(base: &str, client: &reqwest::Client) -> String {
    let resp = client.get(format!("{base}/auth/kakao")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = reqwest::Url::parse(&location(&resp)).unwrap();
    assert_eq!(target.host_str(), Some("kauth.invalid"));
    target
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("state parameter")
}

#[tokio::test]
async fn kakao_login_round_trip() {
    let (base, storage) = spawn_server().await;
    let client = browser();

    let state = start_kakao(&base, &client).await;
    let resp = client
        .get(format!("{base}/auth/kakao/callback"))
        .query(&[("code", GRANTED_CODE), ("state", state.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    let (_, body) = page(&base, &client, "/").await;
    assert!(body.contains(&format!("안녕하세요! {FAKE_NICK}님")), "{body}");

    let user = storage
        .find_sns_user(Provider::Kakao, FAKE_SNS_ID)
        .await
        .unwrap()
        .expect("sns user created");
    assert_eq!(user.nick, FAKE_NICK);
    assert!(user.password.is_none());

    // Logging in again reuses the account.
    let again = browser();
    let state = start_kakao(&base, &again).await;
    again
        .get(format!("{base}/auth/kakao/callback"))
        .query(&[("code", GRANTED_CODE), ("state", state.as_str())])
        .send()
        .await
        .unwrap();
    let same = storage
        .find_sns_user(Provider::Kakao, FAKE_SNS_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(same.id, user.id);
}

#[tokio::test]
async fn kakao_login_with_bad_code_reports_failure() {
    let (base, storage) = spawn_server().await;
    let client = browser();

    let state = start_kakao(&base, &client).await;
    let resp = client
        .get(format!("{base}/auth/kakao/callback"))
        .query(&[("code", "revoked"), ("state", state.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = location(&resp);
    assert!(target.starts_with("/?error="), "{target}");

    let (_, body) = page(&base, &client, &target).await;
    assert!(body.contains("카카오로그인 실패"), "{body}");
    assert!(storage
        .find_sns_user(Provider::Kakao, FAKE_SNS_ID)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn kakao_callback_without_state_cookie_fails() {
    let (base, _) = spawn_server().await;

    let resp = browser()
        .get(format!("{base}/auth/kakao/callback"))
        .query(&[("code", GRANTED_CODE), ("state", "forged")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/?error="));
}

#[tokio::test]
async fn unconfigured_provider_is_404() {
    let (base, _) = spawn_server().await;
    let (status, body) = page(&base, &browser(), "/auth/naver").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("404"));

    let (status, _) = page(&base, &browser(), "/auth/myspace").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Misc
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_renders_error_page() {
    let (base, _) = spawn_server().await;
    let resp = browser()
        .get(format!("{base}/does-not-exist"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let body = resp.text().await.unwrap();
    assert!(body.contains("라우터가 없습니다."), "{body}");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (base, _) = spawn_server().await;
    let resp = browser()
        .get(format!("{base}/api-docs/openapi.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: Value = resp.json().await.unwrap();
    assert_eq!(doc["info"]["title"], "DevTalk API");
    assert!(doc["paths"]["/post/{id}"]["delete"].is_object());
}
