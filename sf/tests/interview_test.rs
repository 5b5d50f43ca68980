//! End-to-end interview tests against a mocked Gemini endpoint
//!
//! Drives the controller through the real Gemini client, gateway and sink.

use std::time::Duration;

use serde_json::{Value, json};
use specforge::config::{LlmConfig, SinkConfig};
use specforge::domain::{ExperienceLevel, Phase, Role};
use specforge::gateway::ModelGateway;
use specforge::interview::{FINISH_FAILURE_REPLY, InterviewController, TURN_FAILURE_REPLY, View};
use specforge::llm::create_client;
use specforge::prompts::PromptLoader;
use specforge::sink::SessionSink;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";
const KEY_ENV: &str = "SPECFORGE_IT_API_KEY";

fn reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 4 }
    })
}

fn document_json() -> String {
    json!({
        "title": "Plant Pal",
        "summary": "Keeps houseplants alive.",
        "problemStatement": "Renters forget to water plants.",
        "targetUsers": ["Busy renters"],
        "valueProposition": "Healthy plants with no effort.",
        "keyFeatures": ["Watering reminders", "Plant photo log"],
        "userStories": ["As a renter, I want reminders, so that my plants survive"],
        "constraintsAndNotes": ["Mobile first"]
    })
    .to_string()
}

fn llm_config(server: &MockServer) -> LlmConfig {
    // SAFETY: every test sets the same value; nothing removes it
    unsafe { std::env::set_var(KEY_ENV, "it-secret") };
    LlmConfig {
        api_key_env: KEY_ENV.to_string(),
        base_url: server.uri(),
        timeout_ms: 5_000,
        ..Default::default()
    }
}

fn controller(server: &MockServer, sink_endpoint: Option<String>) -> InterviewController {
    let config = llm_config(server);
    let llm = create_client(&config).expect("gemini client");
    let gateway = ModelGateway::new(llm, PromptLoader::embedded_only(), &config);
    let sink = SessionSink::from_config(&SinkConfig {
        endpoint: sink_endpoint,
    });
    InterviewController::new(gateway, sink)
}

fn body_json(req: &Request) -> Value {
    serde_json::from_slice(&req.body).expect("json body")
}

async fn mount_interview(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("Begin the interview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("Hi! What problem does your app solve?")))
        .up_to_n_times(1)
        .with_priority(2)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("Got it. Tell me more.")))
        .mount(server)
        .await;
}

async fn wait_for_requests(server: &MockServer, url_path: &str, count: usize) -> Vec<Request> {
    for _ in 0..50 {
        let matching: Vec<Request> = server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == url_path)
            .collect();
        if matching.len() >= count {
            return matching;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {} requests to {}", count, url_path);
}

#[tokio::test]
async fn test_full_interview_to_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("responseSchema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(&document_json())))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_interview(&server).await;

    let mut ctl = controller(&server, None);
    ctl.start("u-42", "u42@example.com", "plant watering app", ExperienceLevel::Beginner, None)
        .await
        .unwrap();
    assert_eq!(ctl.session().messages()[0].text, "Hi! What problem does your app solve?");

    for answer in ["Plants die", "Renters", "Reminders"] {
        ctl.send(answer).await.unwrap();
    }
    assert_eq!(ctl.phase(), Phase::Users);

    let doc = ctl.finish().await.unwrap().cloned().expect("document");
    assert_eq!(doc.title, "Plant Pal");
    assert_eq!(doc.key_features.len(), 2);
    assert_eq!(ctl.view(), View::Document);

    let requests = server.received_requests().await.unwrap();
    let kickoff = body_json(&requests[0]);
    assert!(
        kickoff["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("encouraging, educational, and guiding")
    );
    assert_eq!(kickoff["generationConfig"]["temperature"].as_f64().map(|t| (t * 10.0).round()), Some(7.0));

    // each turn resends the whole conversation, kickoff included
    let last_turn = body_json(&requests[3]);
    let contents = last_turn["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 7);
    assert!(contents[0]["parts"][0]["text"].as_str().unwrap().contains("Begin the interview"));
    assert!(contents[1]["parts"][0]["text"].as_str().unwrap().contains("What problem"));
    assert!(contents[6]["parts"][0]["text"].as_str().unwrap().starts_with("Reminders\n[SYSTEM_NOTE:"));

    let doc_request = body_json(&requests[4]);
    assert!(doc_request.get("systemInstruction").is_none());
    assert_eq!(doc_request["generationConfig"]["responseMimeType"], "application/json");
    let prompt = doc_request["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("USER: Renters"));
    assert!(prompt.contains("plant watering app"));
}

#[tokio::test]
async fn test_service_outage_keeps_conversation_going() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let mut ctl = controller(&server, None);
    ctl.start("u1", "e@x.io", "idea", ExperienceLevel::Expert, None).await.unwrap();
    ctl.send("hello?").await.unwrap();

    let msgs = ctl.session().messages();
    assert_eq!(msgs.len(), 3);
    assert_eq!(msgs[1].role, Role::User);
    assert_eq!(msgs[2].text, TURN_FAILURE_REPLY);
    assert_eq!(ctl.view(), View::Interview);

    // no retries: one request per action
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_document_returns_to_interview() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("responseSchema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("{\"title\": ")))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_interview(&server).await;

    let mut ctl = controller(&server, None);
    ctl.start("u1", "e@x.io", "idea", ExperienceLevel::Intermediate, None)
        .await
        .unwrap();
    ctl.send("answer").await.unwrap();
    let before = ctl.session().messages().len();

    assert!(ctl.finish().await.unwrap().is_none());
    assert_eq!(ctl.view(), View::Interview);
    assert_eq!(ctl.session().messages().len(), before + 1);
    assert_eq!(ctl.session().messages().last().unwrap().text, FINISH_FAILURE_REPLY);
}

#[tokio::test]
async fn test_sink_receives_start_and_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_string_contains("responseSchema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(&document_json())))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_interview(&server).await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let mut ctl = controller(&server, Some(format!("{}/sessions", server.uri())));
    ctl.start("u7", "u7@example.com", "recipe app", ExperienceLevel::Expert, None)
        .await
        .unwrap();
    ctl.finish().await.unwrap();

    let posts = wait_for_requests(&server, "/sessions", 2).await;
    let bodies: Vec<Value> = posts.iter().map(body_json).collect();
    let start = bodies.iter().find(|b| b.get("initialIdea").is_some()).expect("start payload");
    assert_eq!(start["userId"], "u7");
    assert_eq!(start["experienceLevel"], "expert");
    assert!(start["timestamp"].is_string());

    let result = bodies.iter().find(|b| b.get("generatedSpec").is_some()).expect("result payload");
    assert_eq!(result["generatedSpec"]["title"], "Plant Pal");
}

#[tokio::test]
async fn test_sink_failure_is_invisible() {
    let server = MockServer::start().await;
    mount_interview(&server).await;

    // nothing listens on port 9 locally; delivery fails and is only logged
    let mut ctl = controller(&server, Some("http://127.0.0.1:9/sessions".to_string()));
    ctl.start("u1", "e@x.io", "idea", ExperienceLevel::Beginner, None).await.unwrap();

    assert_eq!(ctl.view(), View::Interview);
    assert_eq!(ctl.session().messages().len(), 1);
}
