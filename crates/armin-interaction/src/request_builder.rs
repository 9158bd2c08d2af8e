//! Maps conversation state into a Gemini request.
//!
//! Building is pure: the same messages and settings always produce the same
//! request, and nothing here performs I/O or fails.

use armin_core::attachment::{Attachment, AttachmentPayload};
use armin_core::config::AppSettings;
use armin_core::session::Message;

use crate::wire::{Content, GenerateContentRequest, GenerationConfig, Part, Tool};

/// Frames an inlined text attachment so the model can tell files apart.
pub fn frame_text_attachment(name: &str, content: &str) -> String {
    format!("\n--- FILE: {name} ---\n{content}\n--- END FILE ---\n")
}

fn attachment_part(attachment: &Attachment) -> Part {
    match &attachment.payload {
        AttachmentPayload::Text(text) => Part::text(frame_text_attachment(&attachment.name, text)),
        AttachmentPayload::Binary(data) => Part::inline(&attachment.mime_type, data),
    }
}

/// Parts for one message: its text (if any), then each attachment in order.
pub fn message_parts(message: &Message) -> Vec<Part> {
    let mut parts = Vec::with_capacity(message.attachments.len() + 1);
    if !message.content.is_empty() {
        parts.push(Part::text(&message.content));
    }
    parts.extend(message.attachments.iter().map(attachment_part));
    parts
}

/// Builds the streaming chat request for `messages`.
///
/// Messages still streaming, errored model replies and messages without any
/// part are left out; the service rejects empty turns and an error banner is
/// not something the model said.
pub fn build_chat_request(
    messages: &[Message],
    system_prompt: &str,
    settings: &AppSettings,
) -> GenerateContentRequest {
    let contents = messages
        .iter()
        .filter(|m| !m.streaming && !(m.is_model() && m.errored))
        .filter_map(|m| {
            let parts = message_parts(m);
            (!parts.is_empty()).then(|| Content::new(m.role.as_str(), parts))
        })
        .collect();

    let tools = if settings.enable_search {
        vec![Tool::google_search()]
    } else {
        Vec::new()
    };

    GenerateContentRequest {
        contents,
        system_instruction: (!system_prompt.is_empty()).then(|| Content::system(system_prompt)),
        tools,
        generation_config: Some(GenerationConfig {
            temperature: settings.temperature,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armin_core::attachment::{FileInput, ingest_file};
    use armin_core::session::FinalFields;
    use serde_json::json;

    fn settings(search: bool) -> AppSettings {
        AppSettings {
            enable_search: search,
            temperature: 0.5,
            ..AppSettings::default()
        }
    }

    #[test]
    fn test_roles_and_parts_in_order() {
        let text = ingest_file(FileInput::new("a.csv", "text/csv", b"x,y".to_vec())).unwrap();
        let image = ingest_file(FileInput::new("p.png", "image/png", vec![1, 2, 3])).unwrap();
        let messages = vec![
            Message::user("look", vec![text, image]),
            Message::model("seen"),
        ];

        let request = build_chat_request(&messages, "be nice", &settings(false));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value["contents"],
            json!([
                {
                    "role": "user",
                    "parts": [
                        {"text": "look"},
                        {"text": "\n--- FILE: a.csv ---\nx,y\n--- END FILE ---\n"},
                        {"inlineData": {"mimeType": "image/png", "data": "AQID"}}
                    ]
                },
                {"role": "model", "parts": [{"text": "seen"}]}
            ])
        );
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be nice");
        assert_eq!(value["generationConfig"]["temperature"], json!(0.5));
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_search_tool_toggle() {
        let messages = vec![Message::user("q", vec![])];
        let request = build_chat_request(&messages, "", &settings(true));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tools"], json!([{"googleSearch": {}}]));
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_attachment_only_message_has_no_text_part() {
        let image = ingest_file(FileInput::new("p.png", "image/png", vec![0])).unwrap();
        let parts = message_parts(&Message::user("", vec![image]));
        assert_eq!(parts.len(), 1);
        assert!(matches!(parts[0], Part::InlineData { .. }));
    }

    #[test]
    fn test_streaming_and_errored_messages_skipped() {
        let mut conv = armin_core::session::Conversation::new("p");
        conv.append(Message::user("first", vec![])).unwrap();
        let failed = Message::pending_model();
        let failed_id = failed.id.clone();
        conv.append(failed).unwrap();
        conv.finalize(&failed_id, FinalFields::errored("quota"));
        conv.append(Message::user("again", vec![])).unwrap();
        conv.append(Message::pending_model()).unwrap();

        let request = build_chat_request(conv.messages(), "sys", &settings(false));
        assert_eq!(request.contents.len(), 2);
        assert!(request.contents.iter().all(|c| c.role == "user"));
    }

    #[test]
    fn test_building_is_deterministic() {
        let messages = vec![Message::user("same", vec![])];
        let a = build_chat_request(&messages, "p", &settings(true));
        let b = build_chat_request(&messages, "p", &settings(true));
        assert_eq!(a, b);
    }
}
