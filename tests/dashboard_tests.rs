use prompt_dashboard::auth::IDENTITY_HEADER;
use prompt_dashboard::config::Config;
use prompt_dashboard::routes;
use prompt_dashboard::services::relay::CODE_INSTRUCTION;
use prompt_dashboard::state::AppState;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(config: Config) -> Router {
    routes::app(AppState::shared(config).unwrap())
}

fn with_openai(server: &MockServer) -> Config {
    Config {
        openai_api_key: Some("sk-test".to_string()),
        openai_base_url: server.uri(),
        ..Config::default()
    }
}

fn form_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            b' ' => "+".to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        builder = builder.header(IDENTITY_HEADER, user);
    }
    builder.body(Body::empty()).unwrap()
}

fn submit(uri: &str, prompt: &str, history: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .header(IDENTITY_HEADER, "user_1")
        .body(Body::from(format!(
            "prompt={}&history={}",
            form_encode(prompt),
            form_encode(history)
        )))
        .unwrap()
}

async fn read_html(response: axum::response::Response) -> (StatusCode, String) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

#[tokio::test]
async fn pages_require_identity() {
    let app = app(Config::default());
    for uri in ["/code", "/conversation", "/settings"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn fresh_code_page_is_empty() {
    let response = app(Config::default())
        .oneshot(get("/code", Some("user_1")))
        .await
        .unwrap();
    let (status, html) = read_html(response).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Code Generation"));
    assert!(html.contains("No conversation started."));
    assert!(html.contains(r#"name="history" value="[]""#));
}

#[tokio::test]
async fn code_submission_appends_prompt_and_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("```js\nconst reverse = s => [...s].reverse().join('');\n```")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = app(with_openai(&server))
        .oneshot(submit("/code", "Write a function that reverses a string", "[]"))
        .await
        .unwrap();
    let (status, html) = read_html(response).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!html.contains("No conversation started."));
    assert!(!html.contains("Something went wrong."));
    assert!(html.contains(r#"<code class="language-js">"#));
    assert!(html.contains(r#"name="prompt" value="""#));

    // newest first: the reply is rendered above the prompt
    let reply_at = html.find("message-bot").unwrap();
    let prompt_at = html.find("Write a function that reverses a string</p>").unwrap();
    assert!(reply_at < prompt_at);

    let requests = server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["messages"][0]["content"], CODE_INSTRUCTION);
    assert_eq!(sent["messages"][1]["content"], "Write a function that reverses a string");
    assert_eq!(sent["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn conversation_submission_sends_existing_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("About 3.14.")))
        .mount(&server)
        .await;

    let history = json!([
        { "role": "user", "content": "What is pi?" },
        { "role": "assistant", "content": "A constant." }
    ]);
    let response = app(with_openai(&server))
        .oneshot(submit("/conversation", "Roughly?", &history.to_string()))
        .await
        .unwrap();
    let (status, html) = read_html(response).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("About 3.14."));
    assert!(html.contains("A constant."));

    let requests = server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        sent["messages"],
        json!([
            { "role": "user", "content": "What is pi?" },
            { "role": "assistant", "content": "A constant." },
            { "role": "user", "content": "Roughly?" }
        ])
    );
}

#[tokio::test]
async fn failed_submission_keeps_history_and_shows_toast() {
    // no OpenAI key configured
    let response = app(Config::default())
        .oneshot(submit("/code", "Write a function that reverses a string", "[]"))
        .await
        .unwrap();
    let (status, html) = read_html(response).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Something went wrong."));
    assert!(html.contains("No conversation started."));
    assert!(html.contains(r#"name="history" value="[]""#));
    // the typed prompt is offered again
    assert!(html.contains(r#"name="prompt" value="Write a function that reverses a string""#));
}

#[tokio::test]
async fn served_chat_pages_lock_the_form_while_submitting() {
    let app = app(Config::default());
    for uri in ["/code", "/conversation"] {
        let response = app.clone().oneshot(get(uri, Some("user_1"))).await.unwrap();
        let (status, html) = read_html(response).await;

        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(html.contains(r#"onsubmit="return lockPromptForm(this)""#), "{uri}");
        assert!(html.contains("<script>"), "{uri}");
        assert!(html.contains("function lockPromptForm(form)"), "{uri}");
        assert!(html.contains(r#".disabled = true"#), "{uri}");
        assert!(html.contains(r#"<div class="loader" id="loader" hidden>"#), "{uri}");
    }
}

#[tokio::test]
async fn empty_prompt_shows_form_error_without_calling_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(with_openai(&server))
        .oneshot(submit("/code", "   ", "[]"))
        .await
        .unwrap();
    let (status, html) = read_html(response).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Prompt is required."));
}

#[tokio::test]
async fn malformed_history_is_rejected() {
    let response = app(Config::default())
        .oneshot(submit("/code", "hi", "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn settings_page_shows_subscription_link() {
    let config = Config {
        subscription_url: "https://billing.example.com/portal".to_string(),
        ..Config::default()
    };
    let response = app(config).oneshot(get("/settings", Some("user_1"))).await.unwrap();
    let (status, html) = read_html(response).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("You are currently on a pro plan."));
    assert!(html.contains("https://billing.example.com/portal"));
    assert!(html.contains("Manage Subscription"));
}

#[tokio::test]
async fn health_root_and_assets() {
    let app = app(Config::default());

    let (status, text) = read_html(app.clone().oneshot(get("/health", None)).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "OK");

    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()["location"], "/code");

    let response = app.oneshot(get("/dashboard.css", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
