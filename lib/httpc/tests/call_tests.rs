//! Integration tests for `Call` against a wiremock server.

use std::path::PathBuf;
use std::time::Duration;

use assert2::let_assert;
use bytes::Bytes;
use httpc::{
    BytesAttachment, Call, CancellationToken, Error, FileAttachment, HyperClient, Method,
    Resolver, Response, TextDecoder,
};
use serde::{Deserialize, Serialize};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string, header, method, path, query_param},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
}

#[derive(Debug, Serialize)]
struct Profile {
    name: String,
    age: u32,
    scores: Vec<u32>,
}

/// `Profile` as seen by a server decoding the form.
#[derive(Debug, PartialEq, Deserialize)]
struct ReceivedProfile {
    name: String,
    age: String,
    scores: Vec<String>,
}

/// Error type produced by a custom error handler.
#[derive(Debug)]
struct Problem(String);

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "problem: {}", self.0)
    }
}

impl std::error::Error for Problem {}

fn jane() -> Profile {
    Profile {
        name: "Jane Doe".to_string(),
        age: 25,
        scores: vec![100, 90, 80],
    }
}

fn client() -> HyperClient {
    HyperClient::new()
}

async fn single_request(server: &MockServer) -> wiremock::Request {
    let mut requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    requests.remove(0)
}

fn header_value<'a>(request: &'a wiremock::Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|value| value.to_str().ok())
}

// ============================================================================
// Decoding
// ============================================================================

#[tokio::test]
async fn test_get_decodes_json() {
    let mock_server = MockServer::start().await;
    let user = User {
        id: 1,
        name: "Alice".to_string(),
    };

    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&user))
        .mount(&mock_server)
        .await;

    let decoded: User = Call::json()
        .client(client())
        .get(&format!("{}/users/1", mock_server.uri()))
        .await
        .expect("user");

    assert_eq!(decoded, user);
}

#[tokio::test]
async fn test_decoder_receives_exact_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/vnd.custom; version=2")
                .set_body_bytes(b"\x00\x01payload".to_vec()),
        )
        .mount(&mock_server)
        .await;

    let body = Call::<Bytes>::new()
        .client(client())
        .decoder(
            "application/vnd.custom",
            |body: &Bytes| -> httpc::Result<Bytes> { Ok(body.clone()) },
        )
        .get(&format!("{}/raw", mock_server.uri()))
        .await
        .expect("body");

    assert_eq!(body.as_ref(), b"\x00\x01payload");
}

#[tokio::test]
async fn test_missing_decoder_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/csv; charset=utf-8")
                .set_body_string("id,name"),
        )
        .mount(&mock_server)
        .await;

    let result: httpc::Result<User> = Call::json()
        .client(client())
        .get(&mock_server.uri())
        .await;

    let_assert!(Err(Error::NoAvailableDecoder { content_type }) = result);
    assert_eq!(content_type, "text/csv");
}

#[tokio::test]
async fn test_empty_array_is_a_value() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<User>::new()))
        .mount(&mock_server)
        .await;

    let users: Vec<User> = Call::json()
        .client(client())
        .get(&mock_server.uri())
        .await
        .expect("empty list decodes");

    assert!(users.is_empty());
}

// ============================================================================
// Error handling
// ============================================================================

#[tokio::test]
async fn test_default_error_handler_keeps_status_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/999"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("Content-Type", "application/json")
                .set_body_string(r#"{"error":"not found"}"#),
        )
        .mount(&mock_server)
        .await;

    let result: httpc::Result<User> = Call::json()
        .client(client())
        .get(&format!("{}/users/999", mock_server.uri()))
        .await;

    let_assert!(Err(err) = result);
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "HTTP error 404: Not Found");
    assert_eq!(
        err.body().map(Bytes::as_ref),
        Some(br#"{"error":"not found"}"#.as_slice())
    );

    // the cached body can be read again and decoded
    #[derive(Debug, Deserialize)]
    struct ApiError {
        error: String,
    }
    let api_error: ApiError = err.decode_body().expect("http error").expect("json");
    assert_eq!(api_error.error, "not found");
}

#[tokio::test]
async fn test_content_type_error_handler() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(
            ResponseTemplate::new(422)
                .insert_header("Content-Type", "application/problem+json")
                .set_body_string("quantity must be positive"),
        )
        .mount(&mock_server)
        .await;

    let result: httpc::Result<User> = Call::json()
        .client(client())
        .error_handler("application/problem+json", |response: &Response| {
            Error::api(Problem(
                String::from_utf8_lossy(response.body()).into_owned(),
            ))
        })
        .post(&format!("{}/orders", mock_server.uri()), &[("quantity", -1)])
        .await;

    let_assert!(Err(Error::Api(inner)) = result);
    assert_eq!(inner.to_string(), "problem: quantity must be positive");
}

#[tokio::test]
async fn test_only_200_is_success_by_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(User {
            id: 7,
            name: "Bob".to_string(),
        }))
        .mount(&mock_server)
        .await;

    let url = mock_server.uri();
    let strict: httpc::Result<User> = Call::json()
        .client(client())
        .post_json(&url, &User {
            id: 0,
            name: "Bob".to_string(),
        })
        .await;
    let_assert!(Err(Error::Http { status: 201, .. }) = strict);

    let relaxed: User = Call::json()
        .client(client())
        .success_when(|status| (200..300).contains(&status))
        .post_json(&url, &User {
            id: 0,
            name: "Bob".to_string(),
        })
        .await
        .expect("201 accepted");
    assert_eq!(relaxed.id, 7);
}

#[tokio::test]
async fn test_custom_default_error_handler() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let result = Call::text()
        .client(client())
        .default_error_handler(|response: &Response| {
            Error::connection(format!("upstream down ({})", response.status()))
        })
        .get(&mock_server.uri())
        .await;

    let_assert!(Err(Error::Connection(message)) = result);
    assert_eq!(message, "upstream down (503)");
}

// ============================================================================
// Request building
// ============================================================================

#[tokio::test]
async fn test_query_from_url_and_params_are_merged() {
    let mock_server = MockServer::start().await;

    #[derive(Serialize)]
    struct Params {
        b: u32,
    }

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("a", "1"))
        .and(query_param("b", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let body = Call::text()
        .client(client())
        .get_with(&format!("{}/search?a=1", mock_server.uri()), &Params { b: 2 })
        .await
        .expect("both parameters sent");

    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_form_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/profiles"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(header("Cache-Control", "no-cache"))
        .and(body_string("name=Jane+Doe&age=25&scores=100&scores=90&scores=80"))
        .respond_with(ResponseTemplate::new(200).set_body_string("created"))
        .mount(&mock_server)
        .await;

    Call::text()
        .client(client())
        .post(&format!("{}/profiles", mock_server.uri()), &jane())
        .await
        .expect("form accepted");

    let request = single_request(&mock_server).await;
    assert_eq!(header_value(&request, "content-length"), Some("51"));

    let received: ReceivedProfile = httpc::from_form(&request.body).expect("server side decode");
    assert_eq!(
        received,
        ReceivedProfile {
            name: "Jane Doe".to_string(),
            age: "25".to_string(),
            scores: vec!["100".to_string(), "90".to_string(), "80".to_string()],
        }
    );
}

#[tokio::test]
async fn test_post_json() {
    let mock_server = MockServer::start().await;
    let input = User {
        id: 0,
        name: "Bob".to_string(),
    };

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(&input))
        .respond_with(ResponseTemplate::new(200).set_body_json(User {
            id: 42,
            name: "Bob".to_string(),
        }))
        .mount(&mock_server)
        .await;

    let created: User = Call::json()
        .client(client())
        .post_json(&format!("{}/users", mock_server.uri()), &input)
        .await
        .expect("created");

    assert_eq!(created.id, 42);
}

#[tokio::test]
async fn test_post_with_json_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(serde_json::json!({"name": "Jane Doe", "age": 25, "scores": [100, 90, 80]})))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    Call::text()
        .client(client())
        .content_type("application/json")
        .post(&mock_server.uri(), &jane())
        .await
        .expect("json body");
}

#[tokio::test]
async fn test_unknown_content_type_has_no_encoder() {
    let mock_server = MockServer::start().await;

    let result = Call::text()
        .client(client())
        .content_type("application/xml")
        .post(&mock_server.uri(), &jane())
        .await;

    let_assert!(Err(Error::NoAvailableEncoder { content_type }) = result);
    assert_eq!(content_type, "application/xml");
    // nothing was sent
    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_multipart_upload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .mount(&mock_server)
        .await;

    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.txt");
    let attachments = vec![
        BytesAttachment::new("data1", "data1.txt", "hello").boxed(),
        FileAttachment::open("data2", &fixture)
            .expect("fixture")
            .boxed(),
    ];

    #[derive(Serialize)]
    struct Meta {
        owner: &'static str,
    }

    let stored = Call::text()
        .client(client())
        .post_multipart(
            &format!("{}/upload", mock_server.uri()),
            &Meta { owner: "jane" },
            attachments,
        )
        .await
        .expect("upload");
    assert_eq!(stored, "stored");

    let request = single_request(&mock_server).await;
    let content_type = header_value(&request, "content-type").expect("content type");
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")
        .expect("multipart content type");

    let body = String::from_utf8(request.body.clone()).expect("text body");
    let parts: Vec<&str> = body
        .split(&format!("--{boundary}"))
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "--")
        .collect();

    assert_eq!(parts.len(), 3);
    assert!(parts.first().is_some_and(|part| {
        part.starts_with("Content-Disposition: form-data; name=\"owner\"") && part.ends_with("jane")
    }));

    let files: Vec<&&str> = parts.iter().filter(|part| part.contains("filename=")).collect();
    assert_eq!(files.len(), 2);
    assert!(files.first().is_some_and(|part| {
        part.contains("name=\"data1\"; filename=\"data1.txt\"") && part.ends_with("hello")
    }));
    assert!(files.get(1).is_some_and(|part| {
        part.contains("name=\"data2\"; filename=\"sample.txt\"")
            && part.ends_with("Hello from a file attachment.")
    }));
}

#[tokio::test]
async fn test_multipart_without_attachments_is_a_form() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string("name=Jane+Doe&age=25&scores=100&scores=90&scores=80"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    Call::text()
        .client(client())
        .post_multipart(&mock_server.uri(), &jane(), Vec::new())
        .await
        .expect("form fallback");
}

#[tokio::test]
async fn test_basic_auth_only_with_both_parts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    Call::text()
        .client(client())
        .basic_auth("user", "pass")
        .get(&mock_server.uri())
        .await
        .expect("with credentials");
    Call::text()
        .client(client())
        .basic_auth("user", "")
        .get(&mock_server.uri())
        .await
        .expect("without password");

    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests.first().and_then(|r| header_value(r, "authorization")),
        Some("Basic dXNlcjpwYXNz")
    );
    assert_eq!(requests.get(1).and_then(|r| header_value(r, "authorization")), None);
}

#[tokio::test]
async fn test_connection_header_follows_keep_alive() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    Call::text()
        .client(client())
        .get(&mock_server.uri())
        .await
        .expect("default");
    Call::text()
        .client(client())
        .keep_alive(true)
        .get(&mock_server.uri())
        .await
        .expect("keep-alive");

    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.first().and_then(|r| header_value(r, "connection")), Some("close"));
    assert_ne!(requests.get(1).and_then(|r| header_value(r, "connection")), Some("close"));
    assert_eq!(requests.first().and_then(|r| header_value(r, "cache-control")), None);
}

#[tokio::test]
async fn test_send_uses_configured_method() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/users/1"))
        .and(header("Cache-Control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_string("deleted"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = Call::text()
        .client(client())
        .method(Method::DELETE)
        .send(&format!("{}/users/1", mock_server.uri()))
        .await
        .expect("deleted");

    assert_eq!(body, "deleted");
}

#[tokio::test]
async fn test_fetch_defers_decoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/plain")
                .insert_header("X-Request-Id", "abc")
                .set_body_string("hello"),
        )
        .mount(&mock_server)
        .await;

    let result = Call::with_resolver(Resolver::<String>::new().with_decoder("text/*", TextDecoder))
        .client(client())
        .fetch(&mock_server.uri())
        .await
        .expect("success");

    assert_eq!(result.status(), 200);
    assert_eq!(
        result.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("abc")
    );
    assert_eq!(result.decode().expect("first"), "hello");
    assert_eq!(result.decode().expect("again"), "hello");
}

// ============================================================================
// Cancellation and deadline
// ============================================================================

#[tokio::test]
async fn test_deadline_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let result = Call::text()
        .client(client())
        .deadline(Duration::from_millis(100))
        .get(&mock_server.uri())
        .await;

    let_assert!(Err(err) = result);
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_cancellation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = Call::text()
        .client(client())
        .cancel_on(token)
        .get(&mock_server.uri())
        .await;

    let_assert!(Err(err) = result);
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_invalid_configuration_sends_nothing() {
    let mock_server = MockServer::start().await;

    let result = Call::text()
        .client(client())
        .header("X-Bad", "line\nbreak")
        .get(&mock_server.uri())
        .await;

    assert!(matches!(result, Err(Error::InvalidRequest(_))));
    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_shared_default_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&mock_server)
        .await;

    let body = Call::text()
        .get(&format!("{}/ping", mock_server.uri()))
        .await
        .expect("pong");

    assert_eq!(body, "pong");
}
