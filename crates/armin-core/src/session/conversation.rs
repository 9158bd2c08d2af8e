//! The ordered message log of the active persona.
//!
//! Insertion order is the only ordering guarantee; no operation here
//! reorders messages. At most one message is `streaming` at any time.

use serde::{Deserialize, Serialize};

use super::message::{FinalFields, Message};
use crate::error::{ArminError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    persona_id: String,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(persona_id: impl Into<String>) -> Self {
        Self {
            persona_id: persona_id.into(),
            messages: Vec::new(),
        }
    }

    pub fn persona_id(&self) -> &str {
        &self.persona_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }

    /// The message currently receiving streamed content, if any.
    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.streaming)
    }

    /// Message immediately before the given one.
    pub fn previous(&self, id: &str) -> Option<&Message> {
        let index = self.position(id)?;
        index.checked_sub(1).and_then(|i| self.messages.get(i))
    }

    /// Appends a message at the end of the log.
    ///
    /// Rejects a second streaming message and user messages carrying
    /// model-only fields.
    pub fn append(&mut self, message: Message) -> Result<()> {
        if message.is_user()
            && (message.streaming
                || !message.sources.is_empty()
                || !message.images.is_empty()
                || message.steps.is_some())
        {
            return Err(ArminError::invalid_input(
                "user messages cannot carry sources, images, steps or a streaming marker",
            ));
        }
        if message.streaming && self.streaming_message().is_some() {
            return Err(ArminError::SendAlreadyInProgress);
        }
        self.messages.push(message);
        Ok(())
    }

    /// Appends `delta` to a streaming message.
    ///
    /// Returns false (and changes nothing) when the id is unknown or the
    /// message is already finalized.
    pub fn update_streaming_content(&mut self, id: &str, delta: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) if message.streaming => {
                message.content.push_str(delta);
                true
            }
            _ => false,
        }
    }

    /// Applies terminal fields and clears `streaming`.
    ///
    /// Finalizing an unknown or already-finalized message is a no-op that
    /// returns false.
    pub fn finalize(&mut self, id: &str, fields: FinalFields) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        if !message.streaming {
            return false;
        }
        if let Some(content) = fields.content {
            message.content = content;
        }
        message.sources = fields.sources;
        message.images = fields.images;
        message.errored = fields.errored;
        message.image_error = fields.image_error;
        message.streaming = false;
        true
    }

    /// Copy of the messages strictly before `index`.
    ///
    /// An index past the end yields the whole log.
    pub fn truncate_before(&self, index: usize) -> Vec<Message> {
        let end = index.min(self.messages.len());
        self.messages[..end].to_vec()
    }

    /// Replaces the log with a replay prefix, discarding everything else.
    pub fn replace_messages(&mut self, messages: Vec<Message>) -> Result<()> {
        if messages.iter().any(|m| m.streaming) {
            return Err(ArminError::invalid_input(
                "replayed history cannot contain a streaming message",
            ));
        }
        self.messages = messages;
        Ok(())
    }

    /// Stores a step-by-step explanation on a finalized model message.
    pub fn set_steps(&mut self, id: &str, steps: impl Into<String>) -> Result<()> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| ArminError::MessageNotFound(id.to_string()))?;
        if !message.is_model() || message.streaming {
            return Err(ArminError::invalid_input(
                "steps can only be attached to finalized model messages",
            ));
        }
        message.steps = Some(steps.into());
        Ok(())
    }

    /// Clears the log and switches to another persona.
    pub fn reset(&mut self, persona_id: impl Into<String>) {
        self.persona_id = persona_id.into();
        self.messages.clear();
    }
}
