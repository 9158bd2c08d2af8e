//! Gemini REST payloads.
//!
//! Only the fields this client reads or writes are modelled; unknown
//! response fields are ignored.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// A single user turn made of `parts`.
    pub fn single_turn(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content::new("user", parts)],
            system_instruction: None,
            tools: Vec::new(),
            generation_config: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        let instruction = instruction.into();
        if !instruction.trim().is_empty() {
            self.system_instruction = Some(Content::system(instruction));
        }
        self
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            role: role.into(),
            parts,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new("system", vec![Part::text(text)])
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineDataPayload {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineDataPayload {
    pub mime_type: String,
    pub data: String,
}

/// Tool declaration. Only web search grounding is offered.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_search: GoogleSearch,
}

impl Tool {
    pub fn google_search() -> Self {
        Self {
            google_search: GoogleSearch {},
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GoogleSearch {}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<ContentResponse>,
    pub grounding_metadata: Option<GroundingMetadata>,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ContentResponse {
    #[serde(default)]
    pub parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PartResponse {
    pub text: Option<String>,
    pub inline_data: Option<InlineDataPayload>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize, Debug)]
pub struct GroundingChunk {
    pub web: Option<WebChunk>,
}

#[derive(Deserialize, Debug)]
pub struct WebChunk {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ErrorWrapper {
    pub error: ErrorBody,
}

#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub status: Option<String>,
}
