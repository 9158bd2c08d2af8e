#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{broadcast, mpsc};

use armin_application::ChatEvent;
use armin_core::config::AppSettings;
use armin_core::error::{ArminError, Result};
use armin_core::notification::Notification;
use armin_core::persona::{Persona, default_persona};
use armin_core::session::GeneratedImage;
use armin_interaction::{BackendRequest, ChunkStream, GenerativeBackend, ModelReply, StreamChunk};

pub const TEST_KEY: &str = "test-key";
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

pub type ChunkSender = mpsc::UnboundedSender<Result<StreamChunk>>;

enum ScriptedStream {
    Channel(mpsc::UnboundedReceiver<Result<StreamChunk>>),
    Fail(ArminError),
    Hang,
}

/// Backend double whose streams are fed through channels by the test.
#[derive(Default)]
pub struct ScriptedBackend {
    streams: Mutex<VecDeque<ScriptedStream>>,
    replies: Mutex<VecDeque<Result<ModelReply>>>,
    chat_requests: Mutex<Vec<BackendRequest>>,
    generate_requests: Mutex<Vec<BackendRequest>>,
}

impl ScriptedBackend {
    /// Queues a stream for the next `stream_chat` call and returns its feed.
    /// The stream ends when the sender is dropped.
    pub fn open_stream(&self) -> ChunkSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.streams
            .lock()
            .unwrap()
            .push_back(ScriptedStream::Channel(rx));
        tx
    }

    /// Queues a stream that yields `items` and then completes.
    pub fn script_stream(&self, items: Vec<Result<StreamChunk>>) {
        let tx = self.open_stream();
        for item in items {
            tx.send(item).unwrap();
        }
    }

    /// Makes the next `stream_chat` call fail before streaming.
    pub fn fail_stream(&self, err: ArminError) {
        self.streams
            .lock()
            .unwrap()
            .push_back(ScriptedStream::Fail(err));
    }

    /// Makes the next `stream_chat` call never return.
    pub fn hang_stream(&self) {
        self.streams.lock().unwrap().push_back(ScriptedStream::Hang);
    }

    pub fn push_reply(&self, reply: Result<ModelReply>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn push_text_reply(&self, text: &str) {
        self.push_reply(Ok(ModelReply {
            text: text.to_string(),
            ..ModelReply::default()
        }));
    }

    pub fn push_image_reply(&self, image: GeneratedImage) {
        self.push_reply(Ok(ModelReply {
            images: vec![image],
            ..ModelReply::default()
        }));
    }

    pub fn chat_calls(&self) -> Vec<BackendRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub fn generate_calls(&self) -> Vec<BackendRequest> {
        self.generate_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn stream_chat(&self, request: BackendRequest) -> Result<ChunkStream> {
        self.chat_requests.lock().unwrap().push(request);
        let next = self.streams.lock().unwrap().pop_front();
        match next {
            Some(ScriptedStream::Channel(rx)) => Ok(futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed()),
            Some(ScriptedStream::Fail(err)) => Err(err),
            Some(ScriptedStream::Hang) => std::future::pending().await,
            None => Ok(futures::stream::empty().boxed()),
        }
    }

    async fn generate(&self, request: BackendRequest) -> Result<ModelReply> {
        self.generate_requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(ModelReply::default()))
    }
}

pub fn settings() -> AppSettings {
    AppSettings::default().with_api_key(TEST_KEY)
}

pub fn persona() -> Persona {
    default_persona()
}

pub fn text(delta: &str) -> Result<StreamChunk> {
    Ok(StreamChunk::text(delta))
}

/// Text of the first part of the first content of a request body.
pub fn first_prompt(request: &BackendRequest) -> String {
    let value = serde_json::to_value(&request.body).unwrap();
    value["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

pub async fn next_event(events: &mut broadcast::Receiver<ChatEvent>) -> ChatEvent {
    tokio::time::timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for a chat event")
        .expect("event channel closed")
}

/// Waits for the next send to start and returns its model message id.
pub async fn wait_for_started(events: &mut broadcast::Receiver<ChatEvent>) -> String {
    loop {
        if let ChatEvent::SendStarted { message_id } = next_event(events).await {
            return message_id;
        }
    }
}

pub async fn wait_for_deltas(events: &mut broadcast::Receiver<ChatEvent>, count: usize) {
    let mut seen = 0;
    while seen < count {
        if let ChatEvent::TextDelta { .. } = next_event(events).await {
            seen += 1;
        }
    }
}

/// Polls `condition` until it holds, failing the test after the event timeout.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(EVENT_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub fn drain(notifications: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(notification) = notifications.try_recv() {
        out.push(notification);
    }
    out
}
