mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use common::{config, harness, harness_with, session, COURSES_BODY, TOKEN_BODY};
use coursekit_core::auth::{CredentialStore, LoginMode};
use coursekit_core::models::{Profile, RegistrationUser};
use coursekit_core::Config;
use mockito::{Matcher, Server};
use serde_json::json;

const PROFILE_BODY: &str = r#"{
    "profiles": [{"id": 7, "first_name": "Ada", "last_name": "Lovelace", "is_guest": true}],
    "users": []
}"#;

#[tokio::test]
async fn empty_id_list_sends_sentinel() {
    let mut server = Server::new_async().await;
    let courses = server
        .mock("GET", "/api/courses")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("ids[]".into(), "0".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"courses": []}"#)
        .create_async()
        .await;

    let h = harness(&server, Some(session("access-1", Some(Utc::now()))));
    let response = h.api.courses(1, &[]).await.expect("courses");

    assert!(response.courses.is_empty());
    courses.assert_async().await;
}

#[tokio::test]
async fn password_login_stores_session() {
    let mut server = Server::new_async().await;
    let basic = format!("Basic {}", STANDARD.encode("pw-client:pw-secret"));
    let token = server
        .mock("POST", "/oauth2/token/")
        .match_header("authorization", basic.as_str())
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("grant_type=password".into()),
            Matcher::Regex("username=ada%40example.org".into()),
            Matcher::Regex("password=hunter2".into()),
        ]))
        .with_status(200)
        .with_body(TOKEN_BODY)
        .create_async()
        .await;

    let h = harness(&server, None);
    h.context
        .store_profile(&Profile {
            id: 7,
            is_guest: true,
            ..Profile::default()
        })
        .unwrap();

    let stored = h
        .api
        .auth_with_login_password("ada@example.org", "hunter2")
        .await
        .expect("login");

    token.assert_async().await;
    assert_eq!(stored.access_token, "access-2");
    assert_eq!(stored.login_mode(), LoginMode::Password);
    assert_eq!(h.api.session().await.unwrap(), Some(stored));
    assert!(h.context.profile().unwrap().is_none());
}

#[tokio::test]
async fn code_login_uses_social_client() {
    let mut server = Server::new_async().await;
    let basic = format!("Basic {}", STANDARD.encode("social-client:social-secret"));
    let token = server
        .mock("POST", "/oauth2/token/")
        .match_header("authorization", basic.as_str())
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("grant_type=authorization_code".into()),
            Matcher::Regex("code=abc123".into()),
        ]))
        .with_status(200)
        .with_body(TOKEN_BODY)
        .create_async()
        .await;

    let h = harness(&server, None);
    let stored = h.api.auth_with_code("abc123").await.expect("login");

    token.assert_async().await;
    assert!(stored.is_social_login);
    assert_eq!(
        h.context.store().last_login_mode().unwrap(),
        LoginMode::Social
    );
}

#[tokio::test]
async fn rejected_login_surfaces_error() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/oauth2/token/")
        .with_status(401)
        .create_async()
        .await;

    let h = harness(&server, None);
    let result = h.api.auth_with_login_password("ada", "wrong").await;

    assert!(result.unwrap_err().is_unauthorized());
    assert!(h.api.session().await.unwrap().is_none());
}

#[tokio::test]
async fn anonymous_requests_bootstrap_cookies_once() {
    let mut server = Server::new_async().await;
    let bootstrap = server
        .mock("GET", "/")
        .match_query(Matcher::UrlEncoded("lang".into(), "en".into()))
        .with_status(200)
        .with_header("set-cookie", "sessionid=abc; csrftoken=xyz")
        .expect(1)
        .create_async()
        .await;
    let profile = server
        .mock("GET", "/api/stepics/1")
        .match_header("cookie", "sessionid=abc; csrftoken=xyz")
        .match_header("x-csrftoken", "xyz")
        .with_status(200)
        .with_body(PROFILE_BODY)
        .expect(1)
        .create_async()
        .await;
    let courses = server
        .mock("GET", "/api/courses")
        .match_query(Matcher::Any)
        .match_header("cookie", "sessionid=abc; csrftoken=xyz")
        .match_header("x-csrftoken", "xyz")
        .match_header("referer", server.url().as_str())
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(COURSES_BODY)
        .expect(2)
        .create_async()
        .await;

    let h = harness(&server, None);
    h.api.enrolled_courses(1).await.expect("first request");
    h.api.enrolled_courses(2).await.expect("second request");

    bootstrap.assert_async().await;
    profile.assert_async().await;
    courses.assert_async().await;
    assert_eq!(h.context.profile().unwrap().map(|p| p.id), Some(7));
}

#[tokio::test]
async fn missing_csrf_cookie_is_reported() {
    let mut server = Server::new_async().await;
    let _bootstrap = server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("set-cookie", "sessionid=abc; Path=/; HttpOnly")
        .create_async()
        .await;
    let _profile = server
        .mock("GET", "/api/stepics/1")
        .with_status(200)
        .with_body(PROFILE_BODY)
        .create_async()
        .await;
    let courses = server
        .mock("GET", "/api/courses")
        .match_query(Matcher::Any)
        .match_header("cookie", "sessionid=abc")
        .with_status(200)
        .with_body(COURSES_BODY)
        .create_async()
        .await;

    let h = harness(&server, None);
    h.api.enrolled_courses(1).await.expect("request");

    courses.assert_async().await;
    assert!(h
        .diagnostics
        .has_event(coursekit_core::auth::collaborators::events::COOKIE_WAS_EMPTY));
}

#[tokio::test]
async fn password_reminder_carries_csrf_in_query() {
    let mut server = Server::new_async().await;
    let _bootstrap = server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("set-cookie", "sessionid=abc; csrftoken=xyz")
        .create_async()
        .await;
    let reset = server
        .mock("POST", "/accounts/password/reset/")
        .match_query(Matcher::UrlEncoded(
            "csrfmiddlewaretoken".into(),
            "xyz".into(),
        ))
        .match_header("cookie", "csrftoken=xyz; sessionid=abc")
        .match_header("x-csrftoken", "xyz")
        .match_body(Matcher::Regex("email=ada%40example.org".into()))
        .with_status(200)
        .create_async()
        .await;

    let h = harness(&server, None);
    h.api
        .remind_password("ada@example.org")
        .await
        .expect("reminder sent");

    reset.assert_async().await;
}

#[tokio::test]
async fn user_profile_is_cached() {
    let mut server = Server::new_async().await;
    let _profile = server
        .mock("GET", "/api/stepics/1")
        .match_header("authorization", "Bearer access-1")
        .with_status(200)
        .with_body(PROFILE_BODY)
        .create_async()
        .await;
    let certificates = server
        .mock("GET", "/api/certificates")
        .match_query(Matcher::UrlEncoded("user".into(), "7".into()))
        .with_status(200)
        .with_body(r#"{"certificates": []}"#)
        .create_async()
        .await;

    let h = harness(&server, Some(session("access-1", Some(Utc::now()))));
    let profile = h.api.user_profile().await.expect("profile").expect("present");
    assert_eq!(profile.display_name(), "Ada Lovelace");

    h.api.certificates().await.expect("certificates");
    certificates.assert_async().await;
}

#[tokio::test]
async fn not_found_maps_to_error() {
    let mut server = Server::new_async().await;
    let _missing = server
        .mock("GET", "/api/last-steps/9")
        .with_status(404)
        .with_body("missing")
        .create_async()
        .await;

    let h = harness(&server, Some(session("access-1", Some(Utc::now()))));
    let result = h.api.last_step("9").await;

    assert!(matches!(
        result,
        Err(coursekit_core::ApiError::NotFound(body)) if body == "missing"
    ));
}

#[tokio::test]
async fn sign_up_posts_user_with_cookies() {
    let mut server = Server::new_async().await;
    let _bootstrap = server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("set-cookie", "sessionid=abc; csrftoken=xyz")
        .create_async()
        .await;
    let users = server
        .mock("POST", "/api/users")
        .match_header("cookie", "sessionid=abc; csrftoken=xyz")
        .match_header("x-csrftoken", "xyz")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::PartialJson(json!({
            "user": {"email": "ada@example.org", "first_name": "Ada"}
        })))
        .with_status(201)
        .with_body(r#"{"users": []}"#)
        .expect(1)
        .create_async()
        .await;

    let h = harness(&server, None);
    let user = RegistrationUser {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.org".to_string(),
        password: "hunter2".to_string(),
    };
    h.api.sign_up(&user).await.expect("account created");

    users.assert_async().await;
    assert!(h.api.session().await.unwrap().is_none());
}

#[tokio::test]
async fn feedback_goes_to_help_desk() {
    let mut server = Server::new_async().await;
    let desk = server
        .mock("POST", "/desk/requests/embedded/create/")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("email=ada%40example.org".into()),
            Matcher::Regex(r"description=line\+one%3Cbr%3Eline\+two%3Cbr%3E%3Cbr%3E".into()),
            Matcher::Regex("set_tags=".into()),
        ]))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let h = harness_with(
        Config {
            feedback_host: format!("{}/desk", server.url()),
            ..config(&server)
        },
        Some(session("access-1", Some(Utc::now()))),
    );
    h.api
        .send_feedback("ada@example.org", "line one\nline two")
        .await
        .expect("feedback sent");

    desk.assert_async().await;
}

#[tokio::test]
async fn bootstrap_cookies_survive_landing_redirect() {
    let mut server = Server::new_async().await;
    let mut landing = Server::new_async().await;
    let bootstrap = server
        .mock("GET", "/")
        .match_query(Matcher::UrlEncoded("lang".into(), "en".into()))
        .with_status(302)
        .with_header("location", &format!("{}/welcome", landing.url()))
        .expect(1)
        .create_async()
        .await;
    let welcome = landing
        .mock("GET", "/welcome")
        .with_status(200)
        .with_header("set-cookie", "sessionid=abc; csrftoken=xyz")
        .expect(1)
        .create_async()
        .await;
    let _profile = server
        .mock("GET", "/api/stepics/1")
        .match_header("cookie", "sessionid=abc; csrftoken=xyz")
        .with_status(200)
        .with_body(PROFILE_BODY)
        .create_async()
        .await;
    let courses = server
        .mock("GET", "/api/courses")
        .match_query(Matcher::Any)
        .match_header("cookie", "sessionid=abc; csrftoken=xyz")
        .match_header("x-csrftoken", "xyz")
        .with_status(200)
        .with_body(COURSES_BODY)
        .expect(2)
        .create_async()
        .await;

    let h = harness(&server, None);
    h.api.enrolled_courses(1).await.expect("first request");
    h.api.enrolled_courses(2).await.expect("second request");

    bootstrap.assert_async().await;
    welcome.assert_async().await;
    courses.assert_async().await;
}
