use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tempfile::TempDir;

use dubber::config::TtsConfig;
use dubber::speech::{GoogleTts, Language, Synthesizer};
use dubber::DubbingError;

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn spawn_provider(status: StatusCode) -> (SocketAddr, Seen) {
    let seen: Seen = Arc::default();

    let app = Router::new()
        .route("/translate_tts", get(
            |State((seen, status)): State<(Seen, StatusCode)>, Query(params): Query<HashMap<String, String>>| async move {
                let idx = params.get("idx").cloned().unwrap_or_default();
                seen.lock().unwrap().push(params);
                if status.is_success() {
                    (status, format!("mp3-{}|", idx))
                } else {
                    (status, "quota exceeded".to_string())
                }
            },
        ))
        .with_state((seen.clone(), status));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, seen)
}

fn provider_config(addr: SocketAddr, max_chunk_chars: usize) -> TtsConfig {
    TtsConfig {
        base_url: format!("http://{}/", addr),
        slow: false,
        max_chunk_chars,
    }
}

#[tokio::test]
async fn test_chunks_are_requested_in_order_and_concatenated() {
    let (addr, seen) = spawn_provider(StatusCode::OK).await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("ai_voice.mp3");

    let tts = GoogleTts::new(&provider_config(addr, 30)).unwrap();
    let written = tts
        .synthesize("Bonjour tout le monde. Comment allez-vous?", Language::French, &output)
        .await
        .unwrap();

    assert_eq!(written, output);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "mp3-0|mp3-1|");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0]["tl"], "fr");
    assert_eq!(seen[0]["client"], "tw-ob");
    assert_eq!(seen[0]["q"], "Bonjour tout le monde.");
    assert_eq!(seen[1]["q"], "Comment allez-vous?");
    assert_eq!(seen[1]["total"], "2");
}

#[tokio::test]
async fn test_provider_error_is_a_synthesis_failure() {
    let (addr, _) = spawn_provider(StatusCode::TOO_MANY_REQUESTS).await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("ai_voice.mp3");

    let tts = GoogleTts::new(&provider_config(addr, 100)).unwrap();
    let err = tts.synthesize("Hello there", Language::English, &output).await.unwrap_err();

    match err {
        DubbingError::Synthesis { message } => assert!(message.contains("429")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.exists());
}

#[tokio::test]
async fn test_unreachable_provider_is_a_synthesis_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let dir = TempDir::new().unwrap();

    let tts = GoogleTts::new(&provider_config(addr, 100)).unwrap();
    let err = tts.synthesize("Hola", Language::Spanish, &dir.path().join("v.mp3")).await.unwrap_err();

    assert!(matches!(err, DubbingError::Synthesis { .. }));
}
