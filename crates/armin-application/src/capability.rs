//! One-shot secondary calls: image generation, file and image analysis, and
//! step-by-step explanation.
//!
//! Each call validates its own input, is a single round trip, and never
//! touches conversation state. Results go straight back to the caller.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};

use armin_core::attachment::FileInput;
use armin_core::config::{AppSettings, IMAGE_MODEL, VISION_MODEL};
use armin_core::error::{ArminError, Result};
use armin_core::session::GeneratedImage;
use armin_interaction::wire::{GenerateContentRequest, Part};
use armin_interaction::{BackendRequest, GenerativeBackend, ModelReply};

/// Style suffix appended by the standalone image panel.
pub const IMAGE_STYLE_SUFFIX: &str = " . photorealistic, 8k, cinematic, educational";

const DEFAULT_IMAGE_PROMPT: &str = "Describe this image.";
const NO_ANALYSIS: &str = "No analysis received.";
const NO_DESCRIPTION: &str = "No description received.";
const NO_EXPLANATION: &str = "No explanation available.";

/// Default prompt for a file analysis without user instructions.
pub fn default_analysis_prompt(file_count: usize) -> String {
    format!("Please analyze these {file_count} files and extract the key information.")
}

/// Prompt for the "explain the reasoning" follow-up.
pub fn explanation_prompt(question: &str, answer: &str) -> String {
    format!("Question: {question}\nYour Answer: {answer}\n\nExplain the logic step-by-step in detail.")
}

fn sent_inline(file: &FileInput) -> bool {
    file.is_image() || file.mime_type == "application/pdf"
}

fn file_part(file: &FileInput) -> Part {
    if sent_inline(file) {
        Part::inline(&file.mime_type, STANDARD.encode(&file.bytes))
    } else {
        let text = String::from_utf8_lossy(&file.bytes);
        Part::text(format!(
            "\n--- File: {} ---\n{}\n--- End File ---\n",
            file.name, text
        ))
    }
}

fn or_fallback(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

/// Secondary capability calls sharing the orchestrator's backend.
#[derive(Clone)]
pub struct CapabilityService {
    backend: Arc<dyn GenerativeBackend>,
}

impl CapabilityService {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    fn credential(settings: &AppSettings) -> Result<&str> {
        if settings.has_credential() {
            Ok(settings.api_key.trim())
        } else {
            Err(ArminError::MissingCredential)
        }
    }

    async fn call(
        &self,
        operation: &str,
        model: &str,
        api_key: &str,
        body: GenerateContentRequest,
    ) -> Result<ModelReply> {
        tracing::debug!("[Capability] {} via {}", operation, model);
        self.backend
            .generate(BackendRequest::new(model, api_key, body))
            .await
            .map_err(|err| {
                tracing::warn!("[Capability] {} failed: {}", operation, err);
                ArminError::secondary(operation, err.user_message())
            })
    }

    /// Generates an image from `prompt` with the image model.
    ///
    /// A reply without any inline image is a failure.
    pub async fn generate_image(&self, prompt: &str, settings: &AppSettings) -> Result<GeneratedImage> {
        if prompt.trim().is_empty() {
            return Err(ArminError::invalid_input("image prompt must not be empty"));
        }
        let api_key = Self::credential(settings)?;
        tracing::info!("[Capability] Generating image");

        let body = GenerateContentRequest::single_turn(vec![Part::text(prompt)]);
        let reply = self
            .backend
            .generate(BackendRequest::new(IMAGE_MODEL, api_key, body))
            .await
            .map_err(|err| ArminError::ImageGenerationFailed(err.user_message()))?;

        reply.images.into_iter().next().ok_or_else(|| {
            ArminError::ImageGenerationFailed(
                "No image was generated; the model returned text.".to_string(),
            )
        })
    }

    /// Standalone image panel variant: adds the house style to the prompt.
    pub async fn generate_image_content(
        &self,
        prompt: &str,
        settings: &AppSettings,
    ) -> Result<GeneratedImage> {
        if prompt.trim().is_empty() {
            return Err(ArminError::invalid_input("image prompt must not be empty"));
        }
        self.generate_image(&format!("{prompt}{IMAGE_STYLE_SUFFIX}"), settings)
            .await
    }

    /// Analyzes one or more files with the configured chat model.
    ///
    /// Images and PDFs travel as inline data, everything else is decoded and
    /// framed as text.
    pub async fn analyze_files(
        &self,
        files: &[FileInput],
        prompt: &str,
        system_instruction: &str,
        settings: &AppSettings,
    ) -> Result<String> {
        if files.is_empty() {
            return Err(ArminError::invalid_input("select at least one file to analyze"));
        }
        let api_key = Self::credential(settings)?;

        let prompt = if prompt.trim().is_empty() {
            default_analysis_prompt(files.len())
        } else {
            prompt.to_string()
        };

        let mut parts = Vec::with_capacity(files.len() + 1);
        parts.push(Part::text(prompt));
        parts.extend(files.iter().map(file_part));

        let body =
            GenerateContentRequest::single_turn(parts).with_system_instruction(system_instruction);
        let reply = self
            .call("File analysis", settings.effective_model(), api_key, body)
            .await?;
        Ok(or_fallback(reply.text, NO_ANALYSIS))
    }

    /// Describes a single image with the vision model.
    pub async fn analyze_image(
        &self,
        file: &FileInput,
        prompt: &str,
        settings: &AppSettings,
    ) -> Result<String> {
        if !file.is_image() {
            return Err(ArminError::invalid_input(format!(
                "{} is not an image ({})",
                file.name, file.mime_type
            )));
        }
        let api_key = Self::credential(settings)?;

        let prompt = if prompt.trim().is_empty() {
            DEFAULT_IMAGE_PROMPT
        } else {
            prompt
        };
        let body = GenerateContentRequest::single_turn(vec![
            Part::inline(&file.mime_type, STANDARD.encode(&file.bytes)),
            Part::text(prompt),
        ]);
        let reply = self
            .call("Image analysis", VISION_MODEL, api_key, body)
            .await?;
        Ok(or_fallback(reply.text, NO_DESCRIPTION))
    }

    /// Asks the model to explain how it arrived at `answer`.
    ///
    /// `system_instruction` is the persona prompt of the answer, so the
    /// explanation comes back in the same voice and language.
    pub async fn explain_steps(
        &self,
        question: &str,
        answer: &str,
        system_instruction: &str,
        settings: &AppSettings,
    ) -> Result<String> {
        let api_key = Self::credential(settings)?;
        let body =
            GenerateContentRequest::single_turn(vec![Part::text(explanation_prompt(question, answer))])
                .with_system_instruction(system_instruction);
        let reply = self
            .call("Step explanation", settings.effective_model(), api_key, body)
            .await?;
        Ok(or_fallback(reply.text, NO_EXPLANATION))
    }
}
