//! Streaming send orchestration.
//!
//! A send walks `Idle -> Sending -> Streaming -> Finalizing` and ends in
//! `Idle`, `Cancelled` or `Errored`. Only one send runs at a time; a second
//! one is rejected here rather than by callers. Text deltas are written into
//! the pending model message in delivery order, the first image directive of
//! the reply triggers one image call, and the message is finalized exactly
//! once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use tokio::sync::{RwLock, broadcast, watch};
use tokio_util::sync::CancellationToken;

use armin_core::attachment::Attachment;
use armin_core::config::AppSettings;
use armin_core::directive::extract_image_directive;
use armin_core::error::{ArminError, Result};
use armin_core::persona::Persona;
use armin_core::session::{CitationSet, Conversation, FinalFields, Message};
use armin_interaction::{BackendRequest, GenerativeBackend, build_chat_request};

use crate::capability::CapabilityService;
use crate::notifier::Notifier;

const EVENT_CAPACITY: usize = 256;

/// Lifecycle of the current (or last) send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPhase {
    Idle,
    Sending,
    Streaming,
    Finalizing,
    Cancelled,
    Errored,
}

impl SendPhase {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SendPhase::Sending | SendPhase::Streaming | SendPhase::Finalizing
        )
    }
}

/// Input of a send.
#[derive(Debug, Clone, Default)]
pub struct SendRequest {
    pub text: String,
    pub attachments: Vec<Attachment>,
    /// Replaces the conversation before the new user message is appended.
    pub history_override: Option<Vec<Message>>,
}

impl SendRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history_override = Some(history);
        self
    }
}

/// How a send that got as far as creating its model message ended.
#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    /// Id of the model message created for this send.
    pub message_id: String,
    /// `Idle`, `Cancelled` or `Errored`.
    pub phase: SendPhase,
    /// Transport failure that ended the send, if any.
    pub error: Option<ArminError>,
    /// Whether the reply contained an image directive.
    pub image_requested: bool,
}

/// Progress events for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    SendStarted { message_id: String },
    TextDelta { message_id: String, text: String },
    ImageRequested { message_id: String, description: String },
    SendEnded { message_id: String, phase: SendPhase },
}

struct ActiveSend {
    token: CancellationToken,
}

enum StreamEnd {
    Completed,
    Cancelled,
    Failed(ArminError),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the single-flight slot however a send ends.
///
/// If the send future is dropped mid-stream the pending message is finalized
/// with what it has, so no message stays `streaming` forever.
struct SendGuard {
    slot: Arc<Mutex<Option<ActiveSend>>>,
    conversation: Arc<RwLock<Conversation>>,
    phase: Arc<watch::Sender<SendPhase>>,
    pending_id: Option<String>,
}

impl Drop for SendGuard {
    fn drop(&mut self) {
        let still_active = self.phase.borrow().is_active();
        if still_active {
            self.phase.send_replace(SendPhase::Cancelled);
        }

        let Some(id) = self.pending_id.take() else {
            *lock(&self.slot) = None;
            return;
        };
        if let Ok(mut conversation) = self.conversation.try_write() {
            conversation.finalize(&id, FinalFields::default());
            drop(conversation);
            *lock(&self.slot) = None;
            return;
        }

        // Someone is reading the conversation. The slot stays taken until the
        // pending message is finalized, so no new send sees it streaming.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let slot = self.slot.clone();
                let conversation = self.conversation.clone();
                handle.spawn(async move {
                    conversation
                        .write()
                        .await
                        .finalize(&id, FinalFields::default());
                    *lock(&slot) = None;
                    tracing::debug!(message_id = %id, "[Orchestrator] Abandoned send finalized");
                });
            }
            Err(_) => {
                tracing::warn!(message_id = %id, "[Orchestrator] No runtime to finalize abandoned send");
                *lock(&self.slot) = None;
            }
        }
    }
}

pub struct ChatOrchestrator {
    backend: Arc<dyn GenerativeBackend>,
    capabilities: CapabilityService,
    conversation: Arc<RwLock<Conversation>>,
    notifier: Notifier,
    events: broadcast::Sender<ChatEvent>,
    phase: Arc<watch::Sender<SendPhase>>,
    active: Arc<Mutex<Option<ActiveSend>>>,
}

impl ChatOrchestrator {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        conversation: Arc<RwLock<Conversation>>,
        notifier: Notifier,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (phase, _) = watch::channel(SendPhase::Idle);
        Self {
            capabilities: CapabilityService::new(backend.clone()),
            backend,
            conversation,
            notifier,
            events,
            phase: Arc::new(phase),
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn conversation(&self) -> Arc<RwLock<Conversation>> {
        self.conversation.clone()
    }

    pub fn capabilities(&self) -> &CapabilityService {
        &self.capabilities
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    pub fn watch_phase(&self) -> watch::Receiver<SendPhase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> SendPhase {
        *self.phase.borrow()
    }

    /// True while a send holds the single-flight slot.
    pub fn is_sending(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// Requests cancellation of the in-flight send.
    ///
    /// Returns false when nothing is being sent.
    pub fn stop(&self) -> bool {
        let active = lock(&self.active);
        match active.as_ref() {
            Some(send) => {
                send.token.cancel();
                tracing::info!("[Orchestrator] Stop requested");
                true
            }
            None => false,
        }
    }

    fn set_phase(&self, phase: SendPhase) {
        self.phase.send_replace(phase);
    }

    fn emit(&self, event: ChatEvent) {
        // No subscribers is fine; conversation state stays authoritative.
        let _ = self.events.send(event);
    }

    /// Sends a user turn and streams the reply into the conversation.
    ///
    /// Returns `Err` only when the send was refused before any message was
    /// added (empty input, another send in flight, no credential, invalid
    /// replay history). Transport failures after that are reported in the
    /// outcome and on the notification channel.
    pub async fn send(
        &self,
        request: SendRequest,
        persona: &Persona,
        settings: &AppSettings,
    ) -> Result<SendOutcome> {
        if request.text.trim().is_empty() && request.attachments.is_empty() {
            let err = ArminError::invalid_input("message text or at least one attachment is required");
            self.notifier.report(&err);
            return Err(err);
        }

        let token = CancellationToken::new();
        let rejected = {
            let mut active = lock(&self.active);
            if active.is_some() {
                true
            } else {
                *active = Some(ActiveSend {
                    token: token.clone(),
                });
                false
            }
        };
        if rejected {
            tracing::warn!("[Orchestrator] Send rejected: another send is in flight");
            self.notifier
                .warning(ArminError::SendAlreadyInProgress.user_message());
            return Err(ArminError::SendAlreadyInProgress);
        }

        let mut guard = SendGuard {
            slot: self.active.clone(),
            conversation: self.conversation.clone(),
            phase: self.phase.clone(),
            pending_id: None,
        };

        if !settings.has_credential() {
            tracing::warn!("[Orchestrator] Send refused: no API key configured");
            self.set_phase(SendPhase::Errored);
            self.notifier.report(&ArminError::MissingCredential);
            return Err(ArminError::MissingCredential);
        }

        self.set_phase(SendPhase::Sending);
        let (message_id, snapshot) = match self.prepare_turn(request).await {
            Ok(prepared) => prepared,
            Err(err) => {
                self.set_phase(SendPhase::Errored);
                self.notifier.report(&err);
                return Err(err);
            }
        };
        guard.pending_id = Some(message_id.clone());

        self.set_phase(SendPhase::Streaming);
        self.emit(ChatEvent::SendStarted {
            message_id: message_id.clone(),
        });
        tracing::info!(
            message_id = %message_id,
            persona = %persona.id,
            model = %settings.effective_model(),
            "[Orchestrator] Streaming reply"
        );

        let body = build_chat_request(&snapshot, &persona.system_prompt, settings);
        let backend_request =
            BackendRequest::new(settings.effective_model(), settings.api_key.trim(), body);

        let mut text = String::new();
        let mut citations = CitationSet::new();
        let end = self
            .stream_reply(backend_request, &token, &message_id, &mut text, &mut citations)
            .await;

        let outcome = match end {
            StreamEnd::Completed => self.complete(&message_id, &text, citations, settings).await,
            StreamEnd::Cancelled => {
                tracing::info!(message_id = %message_id, "[Orchestrator] Send cancelled");
                self.conversation.write().await.finalize(
                    &message_id,
                    FinalFields::completed(citations.into_vec(), Vec::new()),
                );
                self.set_phase(SendPhase::Cancelled);
                SendOutcome {
                    message_id: message_id.clone(),
                    phase: SendPhase::Cancelled,
                    error: None,
                    image_requested: false,
                }
            }
            StreamEnd::Failed(err) => {
                tracing::error!(message_id = %message_id, "[Orchestrator] Stream failed: {}", err);
                self.conversation
                    .write()
                    .await
                    .finalize(&message_id, FinalFields::errored(err.user_message()));
                self.notifier.report(&err);
                self.set_phase(SendPhase::Errored);
                SendOutcome {
                    message_id: message_id.clone(),
                    phase: SendPhase::Errored,
                    error: Some(err),
                    image_requested: false,
                }
            }
        };

        // Already finalized above. Free the slot before announcing the end so
        // listeners can send again.
        guard.pending_id = None;
        drop(guard);
        self.emit(ChatEvent::SendEnded {
            message_id,
            phase: outcome.phase,
        });
        Ok(outcome)
    }

    /// Applies the replay history, appends the user message and the pending
    /// model message. Returns the pending id and the history to send.
    async fn prepare_turn(&self, request: SendRequest) -> Result<(String, Vec<Message>)> {
        let mut conversation = self.conversation.write().await;
        if let Some(history) = request.history_override {
            conversation.replace_messages(history)?;
        }
        // Checked before the user message goes in so a refusal changes nothing.
        if conversation.streaming_message().is_some() {
            return Err(ArminError::SendAlreadyInProgress);
        }
        conversation.append(Message::user(request.text, request.attachments))?;
        let snapshot = conversation.messages().to_vec();

        let pending = Message::pending_model();
        let message_id = pending.id.clone();
        conversation.append(pending)?;
        Ok((message_id, snapshot))
    }

    async fn stream_reply(
        &self,
        request: BackendRequest,
        token: &CancellationToken,
        message_id: &str,
        text: &mut String,
        citations: &mut CitationSet,
    ) -> StreamEnd {
        let started = tokio::select! {
            biased;
            _ = token.cancelled() => return StreamEnd::Cancelled,
            started = self.backend.stream_chat(request) => started,
        };
        let mut stream = match started {
            Ok(stream) => stream,
            Err(err) => return StreamEnd::Failed(err),
        };

        loop {
            let item = tokio::select! {
                biased;
                _ = token.cancelled() => return StreamEnd::Cancelled,
                item = stream.next() => item,
            };

            let chunk = match item {
                None => return StreamEnd::Completed,
                Some(Err(err)) => return StreamEnd::Failed(err),
                Some(Ok(chunk)) => chunk,
            };
            if token.is_cancelled() {
                return StreamEnd::Cancelled;
            }

            citations.extend(chunk.citations);
            let Some(delta) = chunk.text.filter(|delta| !delta.is_empty()) else {
                continue;
            };
            let applied = self
                .conversation
                .write()
                .await
                .update_streaming_content(message_id, &delta);
            if !applied {
                // The conversation was reset underneath us (persona switch).
                tracing::debug!(message_id = %message_id, "[Orchestrator] Pending message gone, stopping");
                return StreamEnd::Cancelled;
            }
            text.push_str(&delta);
            self.emit(ChatEvent::TextDelta {
                message_id: message_id.to_string(),
                text: delta,
            });
        }
    }

    async fn complete(
        &self,
        message_id: &str,
        text: &str,
        citations: CitationSet,
        settings: &AppSettings,
    ) -> SendOutcome {
        self.set_phase(SendPhase::Finalizing);
        let mut fields = FinalFields::completed(citations.into_vec(), Vec::new());

        let directive = extract_image_directive(text);
        let image_requested = directive.is_some();
        if let Some(description) = directive {
            self.emit(ChatEvent::ImageRequested {
                message_id: message_id.to_string(),
                description: description.clone(),
            });
            match self.capabilities.generate_image(&description, settings).await {
                Ok(image) => fields.images.push(image),
                Err(err) => {
                    tracing::warn!(message_id = %message_id, "[Orchestrator] Image generation failed: {}", err);
                    fields.image_error = true;
                    self.notifier.report(&err);
                }
            }
        }

        self.conversation.write().await.finalize(message_id, fields);
        self.set_phase(SendPhase::Idle);
        tracing::info!(message_id = %message_id, "[Orchestrator] Reply finalized");
        SendOutcome {
            message_id: message_id.to_string(),
            phase: SendPhase::Idle,
            error: None,
            image_requested,
        }
    }
}
