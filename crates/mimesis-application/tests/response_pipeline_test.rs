mod common;

use common::{key, Harness};
use mimesis_core::config::AppConfig;
use mimesis_core::error::PersonaError;
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_respond_records_exchange() {
    let h = Harness::new();
    h.create("Alice").await;

    let answer = h
        .app
        .pipeline
        .respond(&key("Alice"), "Where do you live?", None)
        .await
        .unwrap();
    assert_eq!(answer, "I heard: Where do you live?");

    let stored = h.app.personas.load(&key("Alice")).await.unwrap();
    assert_eq!(stored.chat_history.len(), 1);
    assert_eq!(stored.chat_history[0].query, "Where do you live?");
    assert_eq!(stored.chat_history[0].answer, answer);
    assert_eq!(stored.revision, 2);
}

#[tokio::test]
async fn test_prompt_carries_context_and_history() {
    let h = Harness::new();
    h.create("Alice").await;
    let pipeline = &h.app.pipeline;

    pipeline.respond(&key("Alice"), "Hello", None).await.unwrap();
    pipeline
        .respond(&key("Alice"), "Do you have a dog?", None)
        .await
        .unwrap();

    let request = h.chat.last_request();
    assert!(request.system_prompt.contains("You are Alice."));
    assert!(request.system_prompt.contains("My dog is named Biscuit."));
    assert_eq!(request.question, "Do you have a dog?");
    assert_eq!(request.history.len(), 1);
    assert_eq!(request.history[0].query, "Hello");
    assert_eq!(request.model, "gpt-3.5-turbo");
    assert_eq!(request.temperature, 0.2);
}

#[tokio::test]
async fn test_model_override_is_per_call() {
    let h = Harness::new();
    h.create("Alice").await;

    h.app
        .pipeline
        .respond(&key("Alice"), "Hi", Some("gpt-4o"))
        .await
        .unwrap();

    assert_eq!(h.chat.last_request().model, "gpt-4o");
    let stored = h.app.personas.load(&key("Alice")).await.unwrap();
    assert_eq!(stored.model.model, "gpt-3.5-turbo");
}

#[tokio::test]
async fn test_generation_failure_persists_nothing() {
    let h = Harness::new();
    h.create("Alice").await;
    let before = h.app.personas.load(&key("Alice")).await.unwrap();
    h.chat.fail.store(true, Ordering::SeqCst);

    let err = h
        .app
        .pipeline
        .respond(&key("Alice"), "Hello?", None)
        .await
        .unwrap_err();

    assert!(matches!(err, PersonaError::GenerationFailed(_)));
    assert!(err.is_retryable());
    assert_eq!(h.app.personas.load(&key("Alice")).await.unwrap(), before);
}

#[tokio::test]
async fn test_unknown_persona_is_not_found() {
    let h = Harness::new();

    let err = h
        .app
        .pipeline
        .respond(&key("Nobody"), "Hello?", None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(h.chat.calls.load(Ordering::SeqCst), 0);

    let err = h.app.pipeline.respond_latest("Nobody", "Hello?").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_respond_creates_version_from_existing_dataset() {
    let h = Harness::new();
    h.app
        .personas
        .append_to_dataset("Alice", "I keep the lighthouse.\n")
        .await
        .unwrap();

    h.app
        .pipeline
        .respond(&key("Alice"), "What do you do?", None)
        .await
        .unwrap();

    assert_eq!(h.datasets.calls.load(Ordering::SeqCst), 0);
    let stored = h.app.personas.load(&key("Alice")).await.unwrap();
    assert_eq!(stored.background, "I keep the lighthouse.\n");
    assert_eq!(stored.chat_history.len(), 1);
}

#[tokio::test]
async fn test_history_summarized_after_threshold() {
    let h = Harness::new();
    h.create("Alice").await;
    let k = key("Alice");

    for i in 1..=3 {
        h.app
            .pipeline
            .respond(&k, &format!("Question {i}"), None)
            .await
            .unwrap();
    }
    assert_eq!(h.app.personas.load(&k).await.unwrap().chat_history.len(), 3);
    assert_eq!(h.summarizer.calls.load(Ordering::SeqCst), 0);

    h.app.pipeline.respond(&k, "Question 4", None).await.unwrap();

    let stored = h.app.personas.load(&k).await.unwrap();
    assert!(stored.chat_history.is_empty());
    assert!(stored.background.ends_with("\nSummary of 4 exchanges."));
    assert_eq!(h.summarizer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_summarization_failure_keeps_answer() {
    let h = Harness::new();
    h.create("Alice").await;
    let k = key("Alice");
    h.summarizer.fail.store(true, Ordering::SeqCst);

    for i in 1..=4 {
        h.app
            .pipeline
            .respond(&k, &format!("Question {i}"), None)
            .await
            .unwrap();
    }
    assert_eq!(h.app.personas.load(&k).await.unwrap().chat_history.len(), 4);

    h.summarizer.fail.store(false, Ordering::SeqCst);
    h.app.pipeline.respond(&k, "Question 5", None).await.unwrap();

    let stored = h.app.personas.load(&k).await.unwrap();
    assert!(stored.chat_history.is_empty());
    assert!(stored.background.ends_with("Summary of 5 exchanges."));
}

#[tokio::test]
async fn test_alias_filter_applies_to_answer_and_history() {
    let mut config = AppConfig::default();
    config.aliases = BTreeMap::from([("Alice Smith".to_string(), "Ms. Lamp".to_string())]);
    let h = Harness::with_config(config);
    h.create("Alice").await;
    h.chat.set_answer("I am Alice Smith, and Alice Smith keeps the light.");

    let answer = h
        .app
        .pipeline
        .respond(&key("Alice"), "Who are you?", None)
        .await
        .unwrap();

    assert_eq!(answer, "I am Ms. Lamp, and Ms. Lamp keeps the light.");
    let stored = h.app.personas.load(&key("Alice")).await.unwrap();
    assert_eq!(stored.chat_history[0].answer, answer);
}

#[tokio::test]
async fn test_concurrent_responses_keep_both_exchanges() {
    let h = Harness::new();
    h.create("Alice").await;
    let k = key("Alice");

    let (first, second) = tokio::join!(
        h.app.pipeline.respond(&k, "First?", None),
        h.app.pipeline.respond(&k, "Second?", None),
    );
    first.unwrap();
    second.unwrap();

    let stored = h.app.personas.load(&k).await.unwrap();
    let mut queries: Vec<&str> = stored.chat_history.iter().map(|e| e.query.as_str()).collect();
    queries.sort();
    assert_eq!(queries, vec!["First?", "Second?"]);
    assert_eq!(stored.revision, 3);
}

#[tokio::test]
async fn test_respond_latest_uses_newest_version() {
    let h = Harness::new();
    h.create("Alice").await;
    let later = mimesis_core::persona::VersionKey::new("Alice", "2024-06-01").unwrap();
    h.app.personas.ensure(&later, None, None).await.unwrap();

    h.app.pipeline.respond_latest("Alice", "Hi").await.unwrap();

    assert_eq!(h.app.personas.load(&later).await.unwrap().chat_history.len(), 1);
    assert!(h.app.personas.load(&key("Alice")).await.unwrap().chat_history.is_empty());
}
