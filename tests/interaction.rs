//! Interaction pipeline integration tests
//!
//! Exercise the orchestration stages against port doubles; no network, no
//! audio hardware.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use hisho_gateway::db::{SessionRepo, SessionStore, StoredRole};
use hisho_gateway::persona::{EMPTY_INPUT_PROMPT, GREETING};
use hisho_gateway::{
    InteractionRequest, Role, SecretaryTools, TodoList, Turn,
};

mod common;
use common::{
    build_handler, setup_test_db, EchoAgent, FailingAgent, FailingSynthesizer, FailingTranscriber,
    FixedTranscriber, ListTodoAgent, StubSynthesizer, TEST_SESSION_KEY,
};

fn audio_request(transcript: Vec<Turn>) -> InteractionRequest {
    InteractionRequest {
        audio: Some(PathBuf::from("/nonexistent/mic.webm")),
        text: None,
        voice: hisho_gateway::VoiceId::Alloy,
        transcript,
    }
}

#[tokio::test]
async fn transcription_failure_stops_before_the_agent() {
    let pool = setup_test_db();
    let agent = Arc::new(EchoAgent::default());
    let handler = build_handler(
        Arc::new(FailingTranscriber),
        Arc::new(StubSynthesizer),
        Arc::clone(&agent) as Arc<dyn hisho_gateway::AgentRunner>,
        &pool,
        TodoList::new(),
    );

    let prior = vec![Turn::assistant(GREETING)];
    let outcome = handler.handle(audio_request(prior.clone())).await;

    // Exactly one new turn, assistant role, no user turn, no audio
    assert_eq!(outcome.transcript.len(), prior.len() + 1);
    let added = outcome.transcript.last().unwrap();
    assert_eq!(added.role, Role::Assistant);
    assert!(added.content.contains("文字起こしエラー"));
    assert!(!outcome.transcript.iter().skip(prior.len()).any(|t| t.role == Role::User));
    assert!(outcome.audio.is_none());

    // The agent was never invoked
    assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_input_yields_a_reprompt_and_no_audio() {
    let pool = setup_test_db();
    let handler = build_handler(
        Arc::new(FixedTranscriber(String::new())),
        Arc::new(StubSynthesizer),
        Arc::new(EchoAgent::default()),
        &pool,
        TodoList::new(),
    );

    // Whitespace-only text, no audio
    let outcome = handler
        .handle(InteractionRequest {
            audio: None,
            text: Some("   ".to_string()),
            ..InteractionRequest::default()
        })
        .await;

    assert_eq!(outcome.transcript.len(), 1);
    assert_eq!(outcome.transcript[0].content, EMPTY_INPUT_PROMPT);
    assert!(outcome.audio.is_none());
}

#[tokio::test]
async fn empty_transcription_also_reprompts() {
    let pool = setup_test_db();
    let agent = Arc::new(EchoAgent::default());
    let handler = build_handler(
        Arc::new(FixedTranscriber("  ".to_string())),
        Arc::new(StubSynthesizer),
        Arc::clone(&agent) as Arc<dyn hisho_gateway::AgentRunner>,
        &pool,
        TodoList::new(),
    );

    let outcome = handler.handle(audio_request(Vec::new())).await;

    assert_eq!(outcome.transcript.len(), 1);
    assert_eq!(outcome.transcript[0].content, EMPTY_INPUT_PROMPT);
    assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn listing_reply_derives_from_actual_todo_contents() {
    let pool = setup_test_db();
    let todos = TodoList::new();
    todos.add("牛乳を買う".to_string());
    todos.add("資料送付をリマインド".to_string());

    let handler = build_handler(
        Arc::new(FixedTranscriber("タスクを一覧して".to_string())),
        Arc::new(StubSynthesizer),
        Arc::new(ListTodoAgent {
            tools: SecretaryTools::new(todos.clone()),
        }),
        &pool,
        todos,
    );

    let outcome = handler.handle(audio_request(Vec::new())).await;

    assert_eq!(outcome.transcript[0], Turn::user("タスクを一覧して"));
    let reply = &outcome.transcript[1];
    assert_eq!(reply.role, Role::Assistant);
    assert!(reply.content.contains("牛乳を買う"));
    assert!(reply.content.contains("資料送付をリマインド"));
}

#[tokio::test]
async fn synthesis_failure_keeps_the_textual_reply() {
    let pool = setup_test_db();
    let handler = build_handler(
        Arc::new(FixedTranscriber(String::new())),
        Arc::new(FailingSynthesizer),
        Arc::new(EchoAgent::default()),
        &pool,
        TodoList::new(),
    );

    let outcome = handler
        .handle(InteractionRequest {
            text: Some("おはよう".to_string()),
            ..InteractionRequest::default()
        })
        .await;

    // user turn + reply turn + synthesis error turn
    assert_eq!(outcome.transcript.len(), 3);
    assert_eq!(outcome.transcript[0], Turn::user("おはよう"));
    assert!(outcome.transcript[1].content.contains("おはよう"));
    assert!(outcome.transcript[2].content.contains("音声合成に失敗しました"));
    assert!(outcome.audio.is_none());
}

#[tokio::test]
async fn agent_failure_is_apologized_and_still_synthesized() {
    let pool = setup_test_db();
    let handler = build_handler(
        Arc::new(FixedTranscriber(String::new())),
        Arc::new(StubSynthesizer),
        Arc::new(FailingAgent),
        &pool,
        TodoList::new(),
    );

    let outcome = handler
        .handle(InteractionRequest {
            text: Some("何か教えて".to_string()),
            ..InteractionRequest::default()
        })
        .await;

    assert_eq!(outcome.transcript.len(), 2);
    let reply = &outcome.transcript[1];
    assert!(reply.content.contains("回答生成でエラーが発生しました"));
    assert!(reply.content.contains("model unavailable"));

    // The apology itself was synthesized
    let audio = outcome.audio.expect("apology audio");
    assert!(audio.exists());
}

#[tokio::test]
async fn successful_interaction_appends_both_turns_and_audio() {
    let pool = setup_test_db();
    let handler = build_handler(
        Arc::new(FixedTranscriber(String::new())),
        Arc::new(StubSynthesizer),
        Arc::new(EchoAgent::default()),
        &pool,
        TodoList::new(),
    );

    let prior = vec![Turn::assistant(GREETING)];
    let outcome = handler
        .handle(InteractionRequest {
            text: Some("午後3時に会議".to_string()),
            transcript: prior,
            ..InteractionRequest::default()
        })
        .await;

    assert_eq!(outcome.transcript.len(), 3);
    assert_eq!(outcome.transcript[1], Turn::user("午後3時に会議"));
    assert_eq!(outcome.transcript[2].role, Role::Assistant);

    let audio = outcome.audio.expect("reply audio");
    assert!(audio.exists());
}

#[tokio::test]
async fn reset_restores_greeting_todos_and_session() {
    let pool = setup_test_db();
    let todos = TodoList::new();
    todos.add("残タスク".to_string());

    // Seed session history
    let repo = SessionRepo::new(pool.clone());
    repo.append(TEST_SESSION_KEY, StoredRole::User, "昨日の件")
        .unwrap();
    repo.append(TEST_SESSION_KEY, StoredRole::Assistant, "承知しました。")
        .unwrap();

    let handler = build_handler(
        Arc::new(FailingTranscriber),
        Arc::new(FailingSynthesizer),
        Arc::new(FailingAgent),
        &pool,
        todos.clone(),
    );

    let outcome = handler.reset();

    assert_eq!(outcome.transcript, vec![Turn::assistant(GREETING)]);
    assert!(outcome.audio.is_none());
    assert!(todos.is_empty());
    assert!(repo.history(TEST_SESSION_KEY, 10).unwrap().is_empty());
}
