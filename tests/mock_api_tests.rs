//! Mock API tests for the Gemini translator
//!
//! These tests run the client and the batch pipeline against a local wiremock
//! server instead of the real endpoint.

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use subtrans::config::Config;
use subtrans::error::{ProtocolError, SubtransError};
use subtrans::pipeline::{translate_file, PipelineConfig};
use subtrans::subtitle::{srt, SubtitleEntry};
use subtrans::translate::{
    BatchOrchestrator, GeminiTranslator, RunOutcome, TranslationSettings, Translator,
};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/models/gemini-2.0-flash:generateContent";

fn gemini_body(inner: &str) -> Value {
    json!({
        "candidates": [{ "content": { "parts": [{ "text": inner }], "role": "model" } }]
    })
}

fn translations_for(pairs: &[(u32, &str)]) -> String {
    let items: Vec<Value> = pairs
        .iter()
        .map(|(i, t)| json!({ "index": i, "text": t }))
        .collect();
    json!({ "translations": items }).to_string()
}

fn settings() -> TranslationSettings {
    TranslationSettings {
        source_lang: "en".to_string(),
        target_lang: "ko".to_string(),
        preserve_formatting: true,
    }
}

fn two_cues() -> Vec<SubtitleEntry> {
    vec![
        SubtitleEntry::new(1, Duration::from_secs(1), Duration::from_secs(2), "Hello."),
        SubtitleEntry::new(2, Duration::from_secs(3), Duration::from_secs(4), "Goodbye."),
    ]
}

fn translator(server: &MockServer) -> GeminiTranslator {
    GeminiTranslator::new("test-key".to_string()).with_base_url(server.uri())
}

// ============================================================================
// Gemini client
// ============================================================================

mod client_tests {
    use super::*;

    #[tokio::test]
    async fn test_translate_batch_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": { "topK": 40, "candidateCount": 1 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(
                &translations_for(&[(1, "안녕."), (2, "잘 가.")]),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let result = translator(&server)
            .translate_batch(&two_cues(), &settings())
            .await
            .unwrap();

        assert_eq!(result[&1], "안녕.");
        assert_eq!(result[&2], "잘 가.");
    }

    #[tokio::test]
    async fn test_prompt_is_sent_in_contents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(
                &translations_for(&[(1, "a"), (2, "b")]),
            )))
            .mount(&server)
            .await;

        translator(&server)
            .translate_batch(&two_cues(), &settings())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains(r#"{"index":1,"text":"Hello."}"#));
        assert!(prompt.contains("ko (Korean)"));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .expect(1)
            .mount(&server)
            .await;

        let err = translator(&server)
            .with_retries(3)
            .translate_batch(&two_cues(), &settings())
            .await
            .unwrap_err();

        match err {
            SubtransError::RemoteCallFailed { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_without_retries_fails_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let err = translator(&server)
            .translate_batch(&two_cues(), &settings())
            .await
            .unwrap_err();

        assert!(matches!(err, SubtransError::RemoteCallFailed { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_retried_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(
                &translations_for(&[(1, "a"), (2, "b")]),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let result = translator(&server)
            .with_retries(1)
            .translate_batch(&two_cues(), &settings())
            .await
            .unwrap();

        assert_eq!(result[&2], "b");
    }

    #[tokio::test]
    async fn test_protocol_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let err = translator(&server)
            .translate_batch(&two_cues(), &settings())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubtransError::Protocol(ProtocolError::NoCandidates { .. })
        ));
    }

    #[tokio::test]
    async fn test_fenced_model_output() {
        let server = MockServer::start().await;
        let fenced = format!("```json\n{}\n```", translations_for(&[(1, "hola")]));
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(&fenced)))
            .mount(&server)
            .await;

        let result = translator(&server)
            .translate_batch(&two_cues(), &settings())
            .await
            .unwrap();

        assert_eq!(result[&1], "hola");
        assert_eq!(result[&2], "");
    }
}

// ============================================================================
// Orchestrator against the mock endpoint
// ============================================================================

mod orchestrator_tests {
    use super::*;

    #[tokio::test]
    async fn test_two_cue_scenario_with_auto_save() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(
                &translations_for(&[(1, " 안녕. "), (2, "잘 가.")]),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let save = dir.path().join("movie.ko.srt");
        let orchestrator = BatchOrchestrator::new(Box::new(translator(&server)))
            .with_auto_save(Some(save.clone()));

        let mut entries = two_cues();
        let outcome = orchestrator
            .run(&mut entries, &settings(), &AtomicBool::new(false))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Completed {
                translated: 2,
                total: 2,
                batches: 1
            }
        );
        assert_eq!(entries[0].translated_text.as_deref(), Some("안녕."));
        assert_eq!(entries[1].translated_text.as_deref(), Some("잘 가."));
        assert_eq!(
            fs::read_to_string(&save).unwrap(),
            "1\n00:00:01,000 --> 00:00:02,000\n안녕.\n\n2\n00:00:03,000 --> 00:00:04,000\n잘 가.\n"
        );
    }

    #[tokio::test]
    async fn test_remote_failure_ends_run() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .expect(1)
            .mount(&server)
            .await;

        let orchestrator = BatchOrchestrator::new(Box::new(translator(&server)));
        let mut entries = two_cues();
        let err = orchestrator
            .run(&mut entries, &settings(), &AtomicBool::new(false))
            .await
            .unwrap_err();

        assert!(matches!(err, SubtransError::RemoteCallFailed { status: 429, .. }));
        assert!(entries.iter().all(|e| e.translated_text.is_none()));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let orchestrator = BatchOrchestrator::new(Box::new(translator(&server)));
        let mut entries = two_cues();
        let outcome = orchestrator
            .run(&mut entries, &settings(), &AtomicBool::new(true))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Cancelled {
                processed: 0,
                total: 2,
                batches: 0
            }
        );
        assert!(!outcome.any_batch_sent());
    }
}

// ============================================================================
// Full pipeline
// ============================================================================

mod pipeline_tests {
    use super::*;

    fn write_source(dir: &Path, cues: u32) -> std::path::PathBuf {
        let content = (1..=cues)
            .map(|i| format!("{i}\n00:00:{i:02},000 --> 00:00:{i:02},500\nLine {i}\n"))
            .collect::<Vec<_>>()
            .join("\n");
        let input = dir.join("movie.srt");
        fs::write(&input, content).unwrap();
        input
    }

    fn config_for(server: &MockServer) -> Config {
        Config {
            gemini_api_key: Some("test-key".to_string()),
            api_base: server.uri(),
            ..Config::default()
        }
    }

    fn quiet() -> PipelineConfig {
        PipelineConfig {
            settings: settings(),
            show_progress: false,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_translate_file_then_resume_is_idempotent() {
        let pairs: Vec<(u32, String)> = (1..=10).map(|i| (i, format!("줄 {i}"))).collect();
        let borrowed: Vec<(u32, &str)> = pairs.iter().map(|(i, t)| (*i, t.as_str())).collect();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(gemini_body(&translations_for(&borrowed))),
            )
            .expect(2)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = write_source(dir.path(), 10);
        let config = config_for(&server);

        let first = translate_file(&input, None, &config, quiet()).await.unwrap();
        assert_eq!(first.output_path, dir.path().join("movie.ko.srt"));
        assert_eq!(
            first.outcome,
            RunOutcome::Completed {
                translated: 10,
                total: 10,
                batches: 2
            }
        );

        let saved = srt::parse_file(&first.output_path).unwrap();
        assert_eq!(saved.len(), 10);
        assert_eq!(saved[9].source_text, "줄 10");
        assert_eq!(saved[9].end, Duration::from_millis(10_500));

        let second = translate_file(&input, None, &config, quiet()).await.unwrap();
        assert_eq!(second.outcome, RunOutcome::NothingToDo);
        assert_eq!(second.stats.resumed_entries, 10);
    }

    #[tokio::test]
    async fn test_fresh_run_ignores_earlier_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(
                &translations_for(&[(1, "새 번역")]),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = write_source(dir.path(), 1);
        fs::write(
            dir.path().join("movie.ko.srt"),
            "1\n00:00:01,000 --> 00:00:01,500\n옛 번역\n",
        )
        .unwrap();

        let pipeline = PipelineConfig {
            resume: false,
            ..quiet()
        };
        let result = translate_file(&input, None, &config_for(&server), pipeline)
            .await
            .unwrap();

        assert!(result.resume.is_none());
        assert_eq!(result.entries[0].translated_text.as_deref(), Some("새 번역"));
    }

    #[tokio::test]
    async fn test_explicit_output_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(
                &translations_for(&[(1, "하나"), (2, "둘")]),
            )))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = write_source(dir.path(), 2);
        let output = dir.path().join("custom.srt");

        let pipeline = PipelineConfig {
            auto_save: false,
            ..quiet()
        };
        let result = translate_file(&input, Some(&output), &config_for(&server), pipeline)
            .await
            .unwrap();

        assert_eq!(result.output_path, output);
        assert!(!dir.path().join("movie.ko.srt").exists());
        let saved = srt::parse_file(&output).unwrap();
        assert_eq!(saved[1].source_text, "둘");
    }
}
