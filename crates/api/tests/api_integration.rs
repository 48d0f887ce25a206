//! API integration tests.
//!
//! These drive the full router against a recording mock of the remote API.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use axum_extra::extract::cookie::Cookie;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;
use webui_api::{AppState, app};
use webui_common::Config;
use webui_remote::mock::{MockMastodonApi, Operation, RemoteCall};
use webui_remote::{Status, TimelinePage};

const SESSION_COOKIES: &str = "access_token=tok; server=https://example.social";

fn create_test_app(mock: &Arc<MockMastodonApi>) -> Router {
    let state = AppState::new(&Config::default(), mock.clone());
    app(state)
}

fn status(id: &str) -> Status {
    Status {
        id: id.to_string(),
        content: format!("<p>status {id}</p>"),
        ..Status::default()
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &Response) -> Vec<Cookie<'static>> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| Cookie::parse_encoded(value.to_str().unwrap().to_string()).unwrap())
        .collect()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn json_post(uri: &str, cookies: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn submit_instance(app: &Router, instance: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!("instance={instance}")))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let mock = Arc::new(MockMastodonApi::new());
    let response = create_test_app(&mock)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_home_without_session_or_instance_needs_instance() {
    let mock = Arc::new(MockMastodonApi::new());
    let response = create_test_app(&mock)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "state": "need_instance" }));
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_submit_instance_redirects_to_authorization() {
    let mock = Arc::new(MockMastodonApi::new());
    let app = create_test_app(&mock);

    let response = submit_instance(&app, "example.social").await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let url = Url::parse(&location(&response)).unwrap();
    assert_eq!(url.origin().ascii_serialization(), "https://example.social");
    assert_eq!(url.path(), "/oauth/authorize");
    let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(params.contains(&("client_id".into(), "client-1-example.social".into())));
    assert!(params.contains(&("response_type".into(), "code".into())));
    assert!(params.contains(&(
        "redirect_uri".into(),
        "http://localhost:8080/callback".into()
    )));

    let state = params.iter().find(|(k, _)| k == "state").unwrap().1.clone();
    let cookies = set_cookies(&response);
    let pending = cookies.iter().find(|c| c.name() == "oauth_state").unwrap();
    assert_eq!(pending.value(), state);
    assert!(cookies.iter().all(|c| c.name() != "access_token"));

    assert_eq!(mock.count(Operation::RegisterApp), 1);
}

#[tokio::test]
async fn test_registration_is_reused_per_instance() {
    let mock = Arc::new(MockMastodonApi::new());
    let app = create_test_app(&mock);

    submit_instance(&app, "example.social").await;
    let response = submit_instance(&app, "https://example.social/").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(mock.count(Operation::RegisterApp), 1);
}

#[tokio::test]
async fn test_invalid_instance_is_rejected() {
    let mock = Arc::new(MockMastodonApi::new());
    let response = submit_instance(&create_test_app(&mock), "ftp%3A%2F%2Fexample.social").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_INSTANCE");
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_registration_failure_is_server_error() {
    let mock = Arc::new(MockMastodonApi::new());
    mock.fail(Operation::RegisterApp);

    let response = submit_instance(&create_test_app(&mock), "example.social").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"]["code"], "REGISTRATION_ERROR");
}

#[tokio::test]
async fn test_callback_sets_session_cookies() {
    let mock = Arc::new(MockMastodonApi::new());
    let app = create_test_app(&mock);

    let started = submit_instance(&app, "example.social").await;
    let nonce = set_cookies(&started)
        .into_iter()
        .find(|c| c.name() == "oauth_state")
        .unwrap()
        .value()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/callback?code=abc&state={nonce}"))
                .header(header::COOKIE, format!("oauth_state={nonce}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    let cookies = set_cookies(&response);
    let token = cookies.iter().find(|c| c.name() == "access_token").unwrap();
    let server = cookies.iter().find(|c| c.name() == "server").unwrap();
    assert_eq!(token.value(), "token-abc");
    assert_eq!(server.value(), "https://example.social");
    for cookie in [token, server] {
        assert_eq!(cookie.path(), Some("/"));
        let max_age = cookie.max_age().unwrap().whole_seconds();
        assert!((24 * 3600 - 60..=24 * 3600).contains(&max_age));
    }

    let pending = cookies.iter().find(|c| c.name() == "oauth_state").unwrap();
    assert_eq!(pending.value(), "");

    let calls = mock.calls();
    assert!(calls.contains(&RemoteCall::ExchangeCode {
        instance: "https://example.social".to_string(),
        client_id: "client-1-example.social".to_string(),
        redirect_uri: "http://localhost:8080/callback".to_string(),
        code: "abc".to_string(),
    }));
}

#[tokio::test]
async fn test_callback_is_single_use() {
    let mock = Arc::new(MockMastodonApi::new());
    let app = create_test_app(&mock);

    let started = submit_instance(&app, "example.social").await;
    let nonce = set_cookies(&started)
        .into_iter()
        .find(|c| c.name() == "oauth_state")
        .unwrap()
        .value()
        .to_string();

    let callback = || {
        Request::builder()
            .uri(format!("/callback?code=abc&state={nonce}"))
            .header(header::COOKIE, format!("oauth_state={nonce}"))
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(callback()).await.unwrap();
    assert_eq!(first.status(), StatusCode::FOUND);

    let replay = app.clone().oneshot(callback()).await.unwrap();
    assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
    assert_eq!(mock.count(Operation::ExchangeCode), 1);
}

#[tokio::test]
async fn test_callback_without_code_is_rejected() {
    let mock = Arc::new(MockMastodonApi::new());
    let app = create_test_app(&mock);
    let started = submit_instance(&app, "example.social").await;
    let nonce = set_cookies(&started)
        .into_iter()
        .find(|c| c.name() == "oauth_state")
        .unwrap()
        .value()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/callback?state={nonce}"))
                .header(header::COOKIE, format!("oauth_state={nonce}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await["error"]["code"], "MISSING_CODE");
    assert_eq!(mock.count(Operation::ExchangeCode), 0);

    // The nonce is still good for a proper callback.
    let retry = app
        .oneshot(
            Request::builder()
                .uri(format!("/callback?code=abc&state={nonce}"))
                .header(header::COOKIE, format!("oauth_state={nonce}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(retry.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_callback_without_pending_authorization_is_rejected() {
    let mock = Arc::new(MockMastodonApi::new());

    let response = create_test_app(&mock)
        .oneshot(
            Request::builder()
                .uri("/callback?code=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "NO_PENDING_AUTHORIZATION"
    );
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_callback_with_denied_authorization() {
    let mock = Arc::new(MockMastodonApi::new());

    let response = create_test_app(&mock)
        .oneshot(
            Request::builder()
                .uri("/callback?error=access_denied")
                .header(header::COOKIE, "oauth_state=stale")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().all(|c| c.name() != "access_token"));
    let pending = cookies.iter().find(|c| c.name() == "oauth_state").unwrap();
    assert_eq!(pending.value(), "");
    assert_eq!(pending.max_age().unwrap().whole_seconds(), 0);
}

#[tokio::test]
async fn test_failed_exchange_sets_no_session() {
    let mock = Arc::new(MockMastodonApi::new());
    mock.fail(Operation::ExchangeCode);
    let app = create_test_app(&mock);

    let started = submit_instance(&app, "example.social").await;
    let nonce = set_cookies(&started)
        .into_iter()
        .find(|c| c.name() == "oauth_state")
        .unwrap()
        .value()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/callback?code=abc&state={nonce}"))
                .header(header::COOKIE, format!("oauth_state={nonce}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().all(|c| c.name() != "access_token"));
    let pending = cookies.iter().find(|c| c.name() == "oauth_state").unwrap();
    assert_eq!(pending.value(), "");
}

#[tokio::test]
async fn test_home_with_session_returns_timeline() {
    let mock = Arc::new(
        MockMastodonApi::new().with_timeline(vec![status("3"), status("2"), status("1")]),
    );

    let response = create_test_app(&mock)
        .oneshot(
            Request::builder()
                .uri("/?max_id=9&limit=3")
                .header(header::COOKIE, SESSION_COOKIES)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["server"], "https://example.social");
    let ids: Vec<&str> = body["statuses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["3", "2", "1"]);
    assert_eq!(body["next"], "1");
    assert_eq!(body["prev"], "3");

    assert_eq!(
        mock.calls(),
        vec![RemoteCall::HomeTimeline {
            instance: "https://example.social".to_string(),
            access_token: "tok".to_string(),
            page: TimelinePage {
                max_id: Some("9".to_string()),
                limit: Some(3),
                ..TimelinePage::default()
            },
        }]
    );
}

#[tokio::test]
async fn test_actions_require_session() {
    let mock = Arc::new(MockMastodonApi::new());
    let app = create_test_app(&mock);

    for (uri, body) in [
        ("/reply", r#"{"id":"1","replyText":"hi"}"#),
        ("/boost", r#"{"id":"1"}"#),
        ("/favourite", r#"{"id":"1"}"#),
    ] {
        let response = app.clone().oneshot(json_post(uri, None, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }

    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_boost() {
    let mock = Arc::new(MockMastodonApi::new());

    let response = create_test_app(&mock)
        .oneshot(json_post("/boost", Some(SESSION_COOKIES), r#"{"id":"42"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "id": "42" }));
    assert_eq!(
        mock.calls(),
        vec![RemoteCall::Reblog {
            instance: "https://example.social".to_string(),
            access_token: "tok".to_string(),
            status_id: "42".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_favourite() {
    let mock = Arc::new(MockMastodonApi::new());

    let response = create_test_app(&mock)
        .oneshot(json_post("/favourite", Some(SESSION_COOKIES), r#"{"id":"42"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "id": "42" }));
    assert_eq!(mock.count(Operation::Favourite), 1);
}

#[tokio::test]
async fn test_reply() {
    let mock = Arc::new(MockMastodonApi::new());

    let response = create_test_app(&mock)
        .oneshot(json_post(
            "/reply",
            Some(SESSION_COOKIES),
            r#"{"id":"7","replyText":"@alice hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "id": "reply-to-7" }));
    match &mock.calls()[..] {
        [RemoteCall::PostStatus { status, .. }] => {
            assert_eq!(status.status, "@alice hello");
            assert_eq!(status.in_reply_to_id.as_deref(), Some("7"));
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[tokio::test]
async fn test_remote_failure_is_server_error() {
    let mock = Arc::new(MockMastodonApi::new());
    mock.fail(Operation::Reblog);

    let response = create_test_app(&mock)
        .oneshot(json_post("/boost", Some(SESSION_COOKIES), r#"{"id":"42"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"]["code"], "REMOTE_ERROR");
}

#[tokio::test]
async fn test_malformed_body_is_rejected_without_remote_call() {
    let mock = Arc::new(MockMastodonApi::new());
    let app = create_test_app(&mock);

    for (uri, body) in [
        ("/boost", "{not json"),
        ("/boost", r#"{"id":""}"#),
        ("/reply", r#"{"id":"7"}"#),
        ("/reply", r#"{"id":"7","replyText":""}"#),
    ] {
        let response = app
            .clone()
            .oneshot(json_post(uri, Some(SESSION_COOKIES), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri} {body}");
    }

    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let mock = Arc::new(MockMastodonApi::new());

    let response = create_test_app(&mock)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header(header::COOKIE, SESSION_COOKIES)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    let cookies = set_cookies(&response);
    for name in ["access_token", "server"] {
        let cookie = cookies.iter().find(|c| c.name() == name).unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age().unwrap().whole_seconds(), 0);
    }
}
