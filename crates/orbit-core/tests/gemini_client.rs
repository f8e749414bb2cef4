mod common;

use std::time::Duration;

use common::{Scripted, ScriptedUpstream, TEST_BASE_URL, TEST_KEY, gemini, ok_text};
use orbit_common::GenerationConfig;
use orbit_core::{GenerateError, UpstreamTransportErrorKind};
use serde_json::json;

const REJECTED_SYSTEM_INSTRUCTION: &str = r#"{"error":{"code":400,"message":"Invalid JSON payload received. Unknown name \"systemInstruction\": Cannot find field.","status":"INVALID_ARGUMENT"}}"#;

fn config(system_prompt: Option<&str>) -> GenerationConfig {
    GenerationConfig::new(
        Some(TEST_KEY.to_string()),
        Some("gemini-1.5-pro".to_string()),
        system_prompt.map(str::to_string),
    )
}

#[tokio::test]
async fn primary_call_sends_system_instruction() {
    let upstream = ScriptedUpstream::new(vec![ok_text("Hi there")]);
    let client = gemini(upstream.clone());

    let reply = client
        .generate("Hello", &config(Some("You are Orbit.")))
        .await
        .unwrap();
    assert_eq!(reply.text, "Hi there");
    assert!(reply.used_system_prompt);
    assert!(!reply.used_fallback);

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url,
        format!("{TEST_BASE_URL}/models/gemini-1.5-pro:generateContent?key={TEST_KEY}")
    );
    assert_eq!(
        upstream.request_bodies()[0],
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }],
            "systemInstruction": { "parts": [{ "text": "You are Orbit." }] }
        })
    );
}

#[tokio::test]
async fn rejected_system_instruction_retries_once_inline() {
    let upstream = ScriptedUpstream::new(vec![
        Scripted::Respond(400, REJECTED_SYSTEM_INSTRUCTION.to_string()),
        ok_text("Fallback reply"),
    ]);
    let client = gemini(upstream.clone());

    let reply = client
        .generate("Hello", &config(Some("You are Orbit.")))
        .await
        .unwrap();
    assert_eq!(reply.text, "Fallback reply");
    assert!(reply.used_system_prompt);
    assert!(reply.used_fallback);

    let bodies = upstream.request_bodies();
    assert_eq!(bodies.len(), 2);
    assert_eq!(
        bodies[1],
        json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "You are Orbit." }] },
                { "role": "user", "parts": [{ "text": "Hello" }] }
            ]
        })
    );
}

#[tokio::test]
async fn other_bad_requests_are_not_retried() {
    let upstream = ScriptedUpstream::new(vec![Scripted::Respond(
        400,
        r#"{"error":{"message":"API key not valid"}}"#.to_string(),
    )]);
    let client = gemini(upstream.clone());

    let err = client
        .generate("Hello", &config(Some("You are Orbit.")))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GenerateError::Upstream {
            status: 400,
            body: r#"{"error":{"message":"API key not valid"}}"#.to_string(),
            fallback: false,
        }
    );
    assert_eq!(upstream.requests().len(), 1);
}

#[tokio::test]
async fn no_retry_without_system_prompt() {
    let upstream = ScriptedUpstream::new(vec![Scripted::Respond(
        400,
        REJECTED_SYSTEM_INSTRUCTION.to_string(),
    )]);
    let client = gemini(upstream.clone());

    let err = client.generate("Hello", &config(None)).await.unwrap_err();
    assert!(matches!(err, GenerateError::Upstream { status: 400, fallback: false, .. }));
    assert_eq!(upstream.requests().len(), 1);
    assert!(upstream.request_bodies()[0].get("systemInstruction").is_none());
}

#[tokio::test]
async fn failed_fallback_is_flagged() {
    let upstream = ScriptedUpstream::new(vec![
        Scripted::Respond(400, REJECTED_SYSTEM_INSTRUCTION.to_string()),
        Scripted::Respond(503, "overloaded".to_string()),
    ]);
    let client = gemini(upstream.clone());

    let err = client
        .generate("Hello", &config(Some("You are Orbit.")))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GenerateError::Upstream {
            status: 503,
            body: "overloaded".to_string(),
            fallback: true,
        }
    );
    assert_eq!(upstream.requests().len(), 2);
}

#[tokio::test]
async fn error_body_is_cut_to_excerpt() {
    let upstream = ScriptedUpstream::new(vec![Scripted::Respond(500, "x".repeat(2_000))]);
    let client = gemini(upstream);

    match client.generate("Hello", &config(None)).await {
        Err(GenerateError::Upstream { status, body, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(body.chars().count(), 500);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn hung_upstream_times_out_at_deadline() {
    let upstream = ScriptedUpstream::new(vec![Scripted::Hang]);
    let client = gemini(upstream);

    let started = tokio::time::Instant::now();
    let err = client.generate("Hello", &config(None)).await.unwrap_err();
    assert_eq!(err, GenerateError::Timeout(Duration::from_secs(25)));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(25));
    assert!(elapsed < Duration::from_secs(26));
}

#[tokio::test(start_paused = true)]
async fn fallback_call_has_its_own_deadline() {
    let upstream = ScriptedUpstream::new(vec![
        Scripted::Respond(400, REJECTED_SYSTEM_INSTRUCTION.to_string()),
        Scripted::Hang,
    ]);
    let client = gemini(upstream.clone());

    let err = client
        .generate("Hello", &config(Some("You are Orbit.")))
        .await
        .unwrap_err();
    assert_eq!(err, GenerateError::Timeout(Duration::from_secs(25)));
    assert_eq!(upstream.requests().len(), 2);
}

#[tokio::test]
async fn transport_failures_surface_their_message() {
    let upstream = ScriptedUpstream::new(vec![Scripted::Fail(
        UpstreamTransportErrorKind::Connect,
        "connection refused".to_string(),
    )]);
    let client = gemini(upstream);

    let err = client.generate("Hello", &config(None)).await.unwrap_err();
    assert_eq!(
        err,
        GenerateError::Transport {
            kind: UpstreamTransportErrorKind::Connect,
            message: "connection refused".to_string(),
        }
    );
}

#[tokio::test]
async fn transport_timeout_maps_to_timeout() {
    let upstream = ScriptedUpstream::new(vec![Scripted::Fail(
        UpstreamTransportErrorKind::Timeout,
        "operation timed out".to_string(),
    )]);
    let client = gemini(upstream);

    let err = client.generate("Hello", &config(None)).await.unwrap_err();
    assert!(matches!(err, GenerateError::Timeout(_)));
}

#[tokio::test]
async fn model_and_key_are_url_encoded() {
    let upstream = ScriptedUpstream::new(vec![ok_text("ok")]);
    let client = gemini(upstream.clone());
    let config = GenerationConfig::new(
        Some("key with/slash".to_string()),
        Some("tuned models/x".to_string()),
        None,
    );

    client.generate("Hello", &config).await.unwrap();
    assert_eq!(
        upstream.requests()[0].url,
        format!("{TEST_BASE_URL}/models/tuned%20models%2Fx:generateContent?key=key%20with%2Fslash")
    );
}

#[tokio::test]
async fn default_model_applies_when_unset() {
    let upstream = ScriptedUpstream::new(vec![ok_text("ok")]);
    let client = gemini(upstream.clone());
    let config = GenerationConfig::new(Some(TEST_KEY.to_string()), None, None);

    let reply = client.generate("Hello", &config).await.unwrap();
    assert!(!reply.used_system_prompt);
    assert!(upstream.requests()[0].url.contains("/models/gemini-test:generateContent"));
}

#[tokio::test]
async fn empty_candidates_read_as_no_content() {
    let upstream = ScriptedUpstream::new(vec![Scripted::Respond(200, "{}".to_string())]);
    let client = gemini(upstream);

    let reply = client.generate("Hello", &config(None)).await.unwrap();
    assert_eq!(reply.text, "(no content)");
}

#[tokio::test]
async fn candidate_cut_at_max_tokens_reads_as_no_content() {
    let upstream = ScriptedUpstream::new(vec![Scripted::Respond(
        200,
        r#"{"candidates":[{"content":{"role":"model"},"finishReason":"MAX_TOKENS","index":0}]}"#
            .to_string(),
    )]);
    let client = gemini(upstream);

    let reply = client.generate("Hello", &config(None)).await.unwrap();
    assert_eq!(reply.text, "(no content)");
}

#[tokio::test]
async fn null_candidates_read_as_no_content() {
    let upstream =
        ScriptedUpstream::new(vec![Scripted::Respond(200, r#"{"candidates":null}"#.to_string())]);
    let client = gemini(upstream);

    let reply = client.generate("Hello", &config(None)).await.unwrap();
    assert_eq!(reply.text, "(no content)");
}

#[tokio::test]
async fn non_json_success_body_is_a_decode_error() {
    let upstream = ScriptedUpstream::new(vec![Scripted::Respond(200, "<html>".to_string())]);
    let client = gemini(upstream);

    let err = client.generate("Hello", &config(None)).await.unwrap_err();
    assert!(matches!(err, GenerateError::Decode(_)));
}

#[tokio::test]
async fn missing_key_never_calls_upstream() {
    let upstream = ScriptedUpstream::new(vec![]);
    let client = gemini(upstream.clone());

    let err = client
        .generate("Hello", &GenerationConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err, GenerateError::MissingApiKey);
    assert!(upstream.requests().is_empty());
}
