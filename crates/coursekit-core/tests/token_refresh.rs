mod common;

use chrono::{Duration, Utc};
use common::{harness, session, COURSES_BODY, TOKEN_BODY};
use coursekit_core::auth::collaborators::events;
use coursekit_core::auth::SESSION_EXPIRED_NOTICE;
use mockito::{Matcher, Server};

fn courses_query() -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("enrolled".into(), "true".into()),
        Matcher::UrlEncoded("page".into(), "1".into()),
    ])
}

#[tokio::test]
async fn fresh_token_is_sent_without_refresh() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/oauth2/token/")
        .expect(0)
        .create_async()
        .await;
    let courses = server
        .mock("GET", "/api/courses")
        .match_query(courses_query())
        .match_header("authorization", "Bearer access-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(COURSES_BODY)
        .create_async()
        .await;

    let h = harness(&server, Some(session("access-1", Some(Utc::now()))));
    let response = h.api.enrolled_courses(1).await.expect("courses");

    assert_eq!(response.courses.len(), 1);
    assert!(response.courses[0].is_enrolled());
    token.assert_async().await;
    courses.assert_async().await;
}

#[tokio::test]
async fn unknown_issue_time_forces_refresh() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/oauth2/token/")
        .match_header("authorization", Matcher::Regex("^Basic ".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("grant_type=refresh_token".into()),
            Matcher::Regex("refresh_token=refresh-1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOKEN_BODY)
        .expect(1)
        .create_async()
        .await;
    let courses = server
        .mock("GET", "/api/courses")
        .match_query(courses_query())
        .match_header("authorization", "Bearer access-2")
        .with_status(200)
        .with_body(COURSES_BODY)
        .create_async()
        .await;

    let h = harness(&server, Some(session("access-1", None)));
    h.api.enrolled_courses(1).await.expect("courses");

    token.assert_async().await;
    courses.assert_async().await;

    let stored = h.api.session().await.unwrap().expect("session kept");
    assert_eq!(stored.access_token, "access-2");
    assert_eq!(stored.refresh_token, "refresh-2");
    assert!(stored.issued_at.is_some());
    assert!(!stored.is_stale());
}

#[tokio::test]
async fn token_inside_refresh_margin_is_refreshed() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/oauth2/token/")
        .with_status(200)
        .with_body(TOKEN_BODY)
        .expect(1)
        .create_async()
        .await;
    let _courses = server
        .mock("GET", "/api/courses")
        .match_query(courses_query())
        .match_header("authorization", "Bearer access-2")
        .with_status(200)
        .with_body(COURSES_BODY)
        .create_async()
        .await;

    // 36000s token issued 35960s ago: 40s left, inside the 50s margin.
    let issued_at = Utc::now() - Duration::seconds(35960);
    let h = harness(&server, Some(session("access-1", Some(issued_at))));
    h.api.enrolled_courses(1).await.expect("courses");

    token.assert_async().await;
}

#[tokio::test]
async fn concurrent_requests_share_one_refresh() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/oauth2/token/")
        .with_status(200)
        .with_body(TOKEN_BODY)
        .expect(1)
        .create_async()
        .await;
    let courses = server
        .mock("GET", "/api/courses")
        .match_query(courses_query())
        .match_header("authorization", "Bearer access-2")
        .with_status(200)
        .with_body(COURSES_BODY)
        .expect(8)
        .create_async()
        .await;

    let h = harness(&server, Some(session("access-1", None)));
    let requests = (0..8).map(|_| h.api.enrolled_courses(1));
    let results = futures::future::join_all(requests).await;

    assert!(results.iter().all(|r| r.is_ok()));
    token.assert_async().await;
    courses.assert_async().await;
}

#[tokio::test]
async fn rejected_refresh_token_logs_out_once() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/oauth2/token/")
        .with_status(401)
        .with_body(r#"{"error": "invalid_grant"}"#)
        .expect(1)
        .create_async()
        .await;
    let courses = server
        .mock("GET", "/api/courses")
        .match_query(courses_query())
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(COURSES_BODY)
        .create_async()
        .await;

    let h = harness(&server, Some(session("access-1", None)));
    h.api.enrolled_courses(1).await.expect("request still sent");

    token.assert_async().await;
    courses.assert_async().await;
    assert_eq!(h.logout.sign_outs(), 1);
    assert_eq!(
        *h.logout.notices.lock(),
        vec![SESSION_EXPIRED_NOTICE.to_string()]
    );
    assert!(h.api.session().await.unwrap().is_none());
    assert!(h.diagnostics.has_error(events::FAIL_REFRESH_TOKEN_ONLINE));
    assert!(h.diagnostics.has_event(events::UPDATE_TOKEN_FAILED));
}

#[tokio::test]
async fn concurrent_requests_share_one_rejected_refresh() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/oauth2/token/")
        .with_status(401)
        .with_body(r#"{"error": "invalid_grant"}"#)
        .expect(1)
        .create_async()
        .await;
    // Requests that start after the logout take the anonymous path.
    let _bootstrap = server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_status(200)
        .create_async()
        .await;
    let courses = server
        .mock("GET", "/api/courses")
        .match_query(courses_query())
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(COURSES_BODY)
        .expect(8)
        .create_async()
        .await;

    let h = harness(&server, Some(session("access-1", None)));
    let requests = (0..8).map(|_| h.api.enrolled_courses(1));
    let results = futures::future::join_all(requests).await;

    assert!(results.iter().all(|r| r.is_ok()));
    token.assert_async().await;
    courses.assert_async().await;
    assert_eq!(h.logout.sign_outs(), 1);
    assert_eq!(h.logout.notices.lock().len(), 1);
    assert!(h.api.session().await.unwrap().is_none());
}

#[tokio::test]
async fn server_error_on_refresh_keeps_session() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/oauth2/token/")
        .with_status(500)
        .with_body("upstream unavailable")
        .create_async()
        .await;
    let courses = server
        .mock("GET", "/api/courses")
        .match_query(courses_query())
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(COURSES_BODY)
        .create_async()
        .await;

    let h = harness(&server, Some(session("access-1", None)));
    h.api.enrolled_courses(1).await.expect("request still sent");

    courses.assert_async().await;
    assert_eq!(h.logout.sign_outs(), 0);
    assert!(h.api.session().await.unwrap().is_some());
    assert!(h.diagnostics.has_error(events::FAIL_REFRESH_TOKEN_ONLINE));
}

#[tokio::test]
async fn undecodable_token_response_is_reported() {
    let mut server = Server::new_async().await;
    let courses = server
        .mock("GET", "/api/courses")
        .match_query(courses_query())
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(COURSES_BODY)
        .create_async()
        .await;

    let _token = server
        .mock("POST", "/oauth2/token/")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let h = harness(&server, Some(session("access-1", None)));
    h.api.enrolled_courses(1).await.expect("request still sent");

    courses.assert_async().await;
    assert_eq!(h.logout.sign_outs(), 0);
    assert!(h.diagnostics.has_event(events::UPDATE_TOKEN_FAILED));
}
