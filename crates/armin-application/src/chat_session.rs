//! The inbound surface used by the presentation layer.
//!
//! `ChatSession` owns the active persona, the current settings and the
//! conversation, and turns user intents (send, edit, stop, show steps, switch
//! persona, side panels) into orchestrator and capability calls.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use armin_core::attachment::{Attachment, FileInput};
use armin_core::config::AppSettings;
use armin_core::error::{ArminError, Result};
use armin_core::persona::Persona;
use armin_core::session::{Conversation, GeneratedImage, Message};
use armin_interaction::GenerativeBackend;

use crate::capability::CapabilityService;
use crate::notifier::Notifier;
use crate::orchestrator::{ChatEvent, ChatOrchestrator, SendOutcome, SendPhase, SendRequest};

/// Question used for a step explanation when the answer has no predecessor.
const FALLBACK_QUESTION: &str = "Context";

enum ExplanationInputs {
    Cached(String),
    Ask { question: String, answer: String },
}

pub struct ChatSession {
    orchestrator: ChatOrchestrator,
    conversation: Arc<RwLock<Conversation>>,
    persona: RwLock<Persona>,
    settings: RwLock<AppSettings>,
    notifier: Notifier,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        persona: Persona,
        settings: AppSettings,
        notifier: Notifier,
    ) -> Self {
        let conversation = Arc::new(RwLock::new(Conversation::new(persona.id.clone())));
        let orchestrator = ChatOrchestrator::new(backend, conversation.clone(), notifier.clone());
        Self {
            orchestrator,
            conversation,
            persona: RwLock::new(persona),
            settings: RwLock::new(settings.normalized()),
            notifier,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.orchestrator.subscribe()
    }

    pub fn phase(&self) -> SendPhase {
        self.orchestrator.phase()
    }

    pub fn is_sending(&self) -> bool {
        self.orchestrator.is_sending()
    }

    pub fn capabilities(&self) -> &CapabilityService {
        self.orchestrator.capabilities()
    }

    pub async fn persona(&self) -> Persona {
        self.persona.read().await.clone()
    }

    pub async fn settings(&self) -> AppSettings {
        self.settings.read().await.clone()
    }

    /// Replaces the settings used by subsequent calls.
    ///
    /// A send already in flight keeps the settings it started with.
    pub async fn update_settings(&self, settings: AppSettings) {
        *self.settings.write().await = settings.normalized();
    }

    /// Copy of the current message log.
    pub async fn messages(&self) -> Vec<Message> {
        self.conversation.read().await.messages().to_vec()
    }

    pub async fn message(&self, id: &str) -> Option<Message> {
        self.conversation.read().await.get(id).cloned()
    }

    pub async fn send_message(
        &self,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
        history_override: Option<Vec<Message>>,
    ) -> Result<SendOutcome> {
        let mut request = SendRequest::new(text).with_attachments(attachments);
        request.history_override = history_override;

        let persona = self.persona().await;
        let settings = self.settings().await;
        self.orchestrator.send(request, &persona, &settings).await
    }

    /// Re-asks from an earlier user message with new text.
    ///
    /// Everything from that message on is discarded and a new send starts
    /// with the edited text and the original message's attachments.
    pub async fn edit_message(&self, message_id: &str, new_text: impl Into<String>) -> Result<SendOutcome> {
        let (prefix, attachments) = self
            .edit_prefix(message_id)
            .await
            .inspect_err(|err| self.notifier.report(err))?;

        tracing::info!(message_id = %message_id, kept = prefix.len(), "[ChatSession] Replaying from edited message");
        self.send_message(new_text, attachments, Some(prefix)).await
    }

    /// History kept by an edit and the attachments of the edited message.
    async fn edit_prefix(&self, message_id: &str) -> Result<(Vec<Message>, Vec<Attachment>)> {
        let conversation = self.conversation.read().await;
        let index = conversation
            .position(message_id)
            .ok_or_else(|| ArminError::MessageNotFound(message_id.to_string()))?;
        let original = &conversation.messages()[index];
        if !original.is_user() {
            return Err(ArminError::invalid_input("only user messages can be edited"));
        }
        Ok((conversation.truncate_before(index), original.attachments.clone()))
    }

    /// Stops the in-flight send. Returns false when nothing was running.
    pub fn stop_active_send(&self) -> bool {
        self.orchestrator.stop()
    }

    /// Fetches and stores a step-by-step explanation for a model answer.
    ///
    /// Messages that already have steps are returned as-is without a call.
    pub async fn request_step_explanation(&self, message_id: &str) -> Result<String> {
        let (question, answer) = match self
            .explanation_inputs(message_id)
            .await
            .inspect_err(|err| self.notifier.report(err))?
        {
            ExplanationInputs::Cached(steps) => return Ok(steps),
            ExplanationInputs::Ask { question, answer } => (question, answer),
        };

        let settings = self.settings().await;
        let system_prompt = self.persona.read().await.system_prompt.clone();
        let steps = self
            .capabilities()
            .explain_steps(&question, &answer, &system_prompt, &settings)
            .await
            .inspect_err(|err| self.notifier.report(err))?;

        self.conversation
            .write()
            .await
            .set_steps(message_id, steps.clone())
            .inspect_err(|err| self.notifier.report(err))?;
        Ok(steps)
    }

    async fn explanation_inputs(&self, message_id: &str) -> Result<ExplanationInputs> {
        let conversation = self.conversation.read().await;
        let message = conversation
            .get(message_id)
            .ok_or_else(|| ArminError::MessageNotFound(message_id.to_string()))?;
        if !message.is_model() || message.streaming {
            return Err(ArminError::invalid_input(
                "steps are only available for finished model answers",
            ));
        }
        if let Some(steps) = &message.steps {
            return Ok(ExplanationInputs::Cached(steps.clone()));
        }
        let question = conversation
            .previous(message_id)
            .map(|m| m.content.clone())
            .filter(|content| !content.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_QUESTION.to_string());
        Ok(ExplanationInputs::Ask {
            question,
            answer: message.content.clone(),
        })
    }

    /// Switches persona, stopping any send and clearing the conversation.
    pub async fn select_persona(&self, persona: Persona) {
        if self.orchestrator.stop() {
            tracing::info!("[ChatSession] Stopped active send for persona switch");
        }
        tracing::info!(persona = %persona.id, "[ChatSession] Persona selected");
        self.conversation.write().await.reset(persona.id.clone());
        *self.persona.write().await = persona;
    }

    // ============================================================================
    // Side panels
    // ============================================================================

    pub async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        let settings = self.settings().await;
        self.capabilities()
            .generate_image_content(prompt, &settings)
            .await
            .inspect_err(|err| self.notifier.report(err))
    }

    /// Analyzes files with the active persona's system prompt.
    pub async fn analyze_files(&self, files: &[FileInput], prompt: &str) -> Result<String> {
        let settings = self.settings().await;
        let system_prompt = self.persona.read().await.system_prompt.clone();
        self.capabilities()
            .analyze_files(files, prompt, &system_prompt, &settings)
            .await
            .inspect_err(|err| self.notifier.report(err))
    }

    pub async fn analyze_image(&self, file: &FileInput, prompt: &str) -> Result<String> {
        let settings = self.settings().await;
        self.capabilities()
            .analyze_image(file, prompt, &settings)
            .await
            .inspect_err(|err| self.notifier.report(err))
    }
}
