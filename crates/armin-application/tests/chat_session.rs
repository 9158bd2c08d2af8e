mod common;

use std::sync::Arc;

use tokio::sync::mpsc;

use armin_application::capability::explanation_prompt;
use armin_application::{ChatSession, Notifier, SendPhase};
use armin_core::attachment::{FileInput, ingest_file};
use armin_core::error::ArminError;
use armin_core::notification::{Notification, NotificationLevel};
use armin_core::persona::{TEACHER_MATH_ID, find_persona};

use common::*;

fn session() -> (
    Arc<ScriptedBackend>,
    Arc<ChatSession>,
    mpsc::UnboundedReceiver<Notification>,
) {
    let backend = Arc::new(ScriptedBackend::default());
    let (notifier, notifications) = Notifier::channel();
    let session = Arc::new(ChatSession::new(
        backend.clone(),
        persona(),
        settings(),
        notifier,
    ));
    (backend, session, notifications)
}

async fn exchange(backend: &ScriptedBackend, session: &ChatSession, question: &str, answer: &str) {
    backend.script_stream(vec![text(answer)]);
    let outcome = session
        .send_message(question, Vec::new(), None)
        .await
        .unwrap();
    assert_eq!(outcome.phase, SendPhase::Idle);
}

#[tokio::test]
async fn test_edit_truncates_and_replays() {
    let (backend, session, _notifications) = session();
    exchange(&backend, &session, "q1", "a1").await;
    exchange(&backend, &session, "q2", "a2").await;
    exchange(&backend, &session, "q3", "a3").await;

    let before = session.messages().await;
    assert_eq!(before.len(), 6);
    let k = 2;
    let edited_id = before[k].id.clone();

    backend.script_stream(vec![text("a2 again")]);
    session.edit_message(&edited_id, "q2 edited").await.unwrap();

    let after = session.messages().await;
    assert_eq!(after.len(), k + 2);
    assert_eq!(after[k].content, "q2 edited");
    assert_eq!(after[k + 1].content, "a2 again");
    for discarded in &before[k..] {
        assert!(after.iter().all(|m| m.id != discarded.id));
    }

    let replay = backend.chat_calls().pop().unwrap();
    assert_eq!(replay.body.contents.len(), 3);
}

#[tokio::test]
async fn test_edit_keeps_original_attachments() {
    let (backend, session, _notifications) = session();
    let notes = ingest_file(FileInput::new("notes.txt", "text/plain", b"hello".to_vec())).unwrap();

    backend.script_stream(vec![text("read it")]);
    session
        .send_message("summarize", vec![notes.clone()], None)
        .await
        .unwrap();
    let first_id = session.messages().await[0].id.clone();

    backend.script_stream(vec![text("short version")]);
    session.edit_message(&first_id, "summarize briefly").await.unwrap();

    let after = session.messages().await;
    assert_eq!(after.len(), 2);
    assert_eq!(after[0].attachments, vec![notes]);
}

#[tokio::test]
async fn test_edit_rejects_model_and_unknown_messages() {
    let (backend, session, mut notifications) = session();
    exchange(&backend, &session, "q", "a").await;
    let model_id = session.messages().await[1].id.clone();

    assert!(matches!(
        session.edit_message(&model_id, "x").await,
        Err(ArminError::InvalidInput(_))
    ));
    assert!(matches!(
        session.edit_message("missing", "x").await,
        Err(ArminError::MessageNotFound(_))
    ));
    assert_eq!(session.messages().await.len(), 2);

    let received = drain(&mut notifications);
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|n| n.level == NotificationLevel::Error));
}

#[tokio::test]
async fn test_step_explanation_is_fetched_once() {
    let (backend, session, _notifications) = session();
    exchange(&backend, &session, "2+2?", "4").await;
    let answer_id = session.messages().await[1].id.clone();

    backend.push_text_reply("1. Take two\n2. Add two");
    let steps = session.request_step_explanation(&answer_id).await.unwrap();
    assert_eq!(steps, "1. Take two\n2. Add two");

    let calls = backend.generate_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(first_prompt(&calls[0]), explanation_prompt("2+2?", "4"));
    let value = serde_json::to_value(&calls[0].body).unwrap();
    assert_eq!(
        value["systemInstruction"]["parts"][0]["text"],
        persona().system_prompt.as_str()
    );

    let again = session.request_step_explanation(&answer_id).await.unwrap();
    assert_eq!(again, steps);
    assert_eq!(backend.generate_calls().len(), 1);
    assert_eq!(
        session.message(&answer_id).await.unwrap().steps.as_deref(),
        Some("1. Take two\n2. Add two")
    );
}

#[tokio::test]
async fn test_step_explanation_without_question_uses_context() {
    let (backend, session, _notifications) = session();
    let image = ingest_file(FileInput::new("graph.png", "image/png", vec![7])).unwrap();
    backend.script_stream(vec![text("a parabola")]);
    session.send_message("", vec![image], None).await.unwrap();
    let answer_id = session.messages().await[1].id.clone();

    backend.push_text_reply("because");
    session.request_step_explanation(&answer_id).await.unwrap();

    let prompt = first_prompt(&backend.generate_calls()[0]);
    assert!(prompt.starts_with("Question: Context\n"));
}

#[tokio::test]
async fn test_step_explanation_failure_is_notified() {
    let (backend, session, mut notifications) = session();
    exchange(&backend, &session, "why?", "because").await;
    let answer_id = session.messages().await[1].id.clone();
    let user_id = session.messages().await[0].id.clone();

    backend.push_reply(Err(ArminError::transport(Some(500), "backend down")));
    let err = session
        .request_step_explanation(&answer_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ArminError::SecondaryCallFailed { .. }));
    assert!(session.message(&answer_id).await.unwrap().steps.is_none());

    let received = drain(&mut notifications);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].level, NotificationLevel::Error);

    assert!(matches!(
        session.request_step_explanation(&user_id).await,
        Err(ArminError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_select_persona_resets_conversation() {
    let (backend, session, _notifications) = session();
    exchange(&backend, &session, "hi", "hello").await;

    let math = find_persona(TEACHER_MATH_ID).unwrap();
    session.select_persona(math.clone()).await;
    assert!(session.messages().await.is_empty());
    assert_eq!(session.persona().await.id, TEACHER_MATH_ID);

    exchange(&backend, &session, "integral?", "x^2/2").await;
    let call = backend.chat_calls().pop().unwrap();
    let value = serde_json::to_value(&call.body).unwrap();
    assert_eq!(
        value["systemInstruction"]["parts"][0]["text"],
        math.system_prompt.as_str()
    );
    assert_eq!(call.body.contents.len(), 1);
}

#[tokio::test]
async fn test_persona_switch_during_stream_cancels_send() {
    let (backend, session, _notifications) = session();
    let feed = backend.open_stream();
    let mut events = session.subscribe();

    let running = session.clone();
    let send = tokio::spawn(async move { running.send_message("long", Vec::new(), None).await });
    wait_for_started(&mut events).await;

    session
        .select_persona(find_persona(TEACHER_MATH_ID).unwrap())
        .await;
    let _ = feed.send(text("late"));

    let outcome = send.await.unwrap().unwrap();
    assert_eq!(outcome.phase, SendPhase::Cancelled);
    assert!(session.messages().await.is_empty());
    assert!(!session.is_sending());
}

#[tokio::test]
async fn test_stop_without_active_send() {
    let (_backend, session, _notifications) = session();
    assert!(!session.stop_active_send());
}

#[tokio::test]
async fn test_side_panel_failures_are_notified() {
    let (backend, session, mut notifications) = session();
    backend.push_text_reply("only words");

    let err = session.generate_image("a lighthouse").await.unwrap_err();
    assert!(matches!(err, ArminError::ImageGenerationFailed(_)));
    assert_eq!(
        first_prompt(&backend.generate_calls()[0]),
        "a lighthouse . photorealistic, 8k, cinematic, educational"
    );

    let pdf = FileInput::new("scan.pdf", "application/pdf", vec![1]);
    let err = session.analyze_image(&pdf, "").await.unwrap_err();
    assert!(matches!(err, ArminError::InvalidInput(_)));

    assert_eq!(drain(&mut notifications).len(), 2);
}

#[tokio::test]
async fn test_analyze_files_uses_persona_prompt() {
    let (backend, session, _notifications) = session();
    backend.push_text_reply("two columns");
    let csv = FileInput::new("data.csv", "text/csv", b"a,b".to_vec());

    let analysis = session.analyze_files(&[csv], "").await.unwrap();
    assert_eq!(analysis, "two columns");

    let call = &backend.generate_calls()[0];
    let value = serde_json::to_value(&call.body).unwrap();
    assert_eq!(
        value["systemInstruction"]["parts"][0]["text"],
        persona().system_prompt.as_str()
    );
}
