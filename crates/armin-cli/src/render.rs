//! Terminal output for messages, events and notifications.

use std::io::Write;

use colored::Colorize;

use armin_application::{ChatEvent, SendPhase};
use armin_core::config::AppSettings;
use armin_core::notification::{Notification, NotificationLevel};
use armin_core::persona::Persona;
use armin_core::session::{Message, MessageRole};

pub fn notification(notification: &Notification) {
    let line = match notification.level {
        NotificationLevel::Error => format!("✗ {}", notification.message).red(),
        NotificationLevel::Warning => format!("! {}", notification.message).yellow(),
        NotificationLevel::Success => format!("✓ {}", notification.message).green(),
        NotificationLevel::Info => notification.message.bright_black(),
    };
    eprintln!("{}", line);
}

pub fn banner(persona: &Persona, settings: &AppSettings) {
    println!("{}", "=== Armin AI ===".bright_magenta().bold());
    println!(
        "{}",
        format!("{} {} · {}", persona.theme.icon, persona.name, settings.effective_model())
            .bright_magenta()
    );
    println!(
        "{}",
        "Type a message, /help for commands, or /quit to exit.".bright_black()
    );
    if !settings.has_credential() {
        println!(
            "{}",
            "No API key configured: set ARMIN_API_KEY or run /settings key <api-key>.".yellow()
        );
    }
    println!();
}

pub fn help() {
    let rows = [
        ("<text>", "send a message (with queued attachments)"),
        ("/attach <path>...", "queue files for the next message; no paths lists the queue"),
        ("/edit <n> <text>", "rewrite message n and ask again from there"),
        ("/steps <n>", "step-by-step explanation of answer n"),
        ("/stop", "stop the reply in progress (or press Ctrl-C)"),
        ("/persona <id>", "switch persona and start over"),
        ("/personas", "list personas"),
        ("/image <prompt>", "generate an image"),
        ("/analyze <path>... [-- prompt]", "analyze files"),
        ("/vision <path> [prompt]", "describe an image"),
        ("/settings [name value]", "show or change settings"),
        ("/history", "show the conversation"),
        ("/quit", "exit"),
    ];
    for (usage, about) in rows {
        println!("  {:<32} {}", usage.bright_cyan(), about.bright_black());
    }
}

pub fn personas(personas: &[Persona], current_id: &str) {
    for persona in personas {
        let marker = if persona.id == current_id { "*" } else { " " };
        println!(
            "{} {} {:<16} {}",
            marker.bright_green(),
            persona.theme.icon,
            persona.id.bright_cyan(),
            persona.name
        );
        println!("    {}", persona.description.bright_black());
    }
}

pub fn settings(settings: &AppSettings, env_credential: bool) {
    let key_state = match (settings.has_credential(), env_credential) {
        (true, true) => "set (environment)",
        (true, false) => "set",
        (false, _) => "not set",
    };
    println!("  {:<12} {}", "model", settings.effective_model());
    println!("  {:<12} {:.1}", "temperature", settings.temperature);
    println!(
        "  {:<12} {}",
        "search",
        if settings.enable_search { "on" } else { "off" }
    );
    println!("  {:<12} {}", "api key", key_state);
}

pub fn history(messages: &[Message], persona: &Persona) {
    if messages.is_empty() {
        println!("{}", "(no messages yet)".bright_black());
        return;
    }
    for (index, message) in messages.iter().enumerate() {
        message_entry(index + 1, message, persona);
    }
}

fn message_entry(number: usize, message: &Message, persona: &Persona) {
    let header = match message.role {
        MessageRole::User => format!("[{number}] You").green(),
        MessageRole::Model => format!("[{number}] {} {}", persona.theme.icon, persona.name).bright_magenta(),
    };
    println!("{}", header);

    for attachment in &message.attachments {
        println!(
            "    {}",
            format!("📎 {} ({} bytes)", attachment.name, attachment.size).bright_black()
        );
    }
    for line in message.content.lines() {
        if message.errored {
            println!("    {}", line.red());
        } else {
            println!("    {}", line);
        }
    }
    if message.streaming {
        println!("    {}", "(streaming…)".bright_black());
    }
    sources_and_images(message);
    if message.steps.is_some() {
        println!("    {}", format!("(steps available: /steps {number})").bright_black());
    }
}

/// Citations, generated images and image failures under a model message.
pub fn sources_and_images(message: &Message) {
    for source in &message.sources {
        println!(
            "    {} {} {}",
            "↳".bright_black(),
            source.title.cyan(),
            source.uri.bright_black()
        );
    }
    for image in &message.images {
        println!(
            "    {}",
            format!("🖼  {} image ({} base64 chars)", image.mime_type, image.data.len()).bright_black()
        );
    }
    if message.image_error {
        println!("    {}", "Image generation failed.".yellow());
    }
}

pub fn model_text(text: &str) {
    for line in text.lines() {
        println!("{}", line.bright_blue());
    }
}

/// Prints a streaming reply as its events arrive.
pub struct StreamPrinter {
    label: String,
    started: bool,
    ended: Option<SendPhase>,
}

impl StreamPrinter {
    pub fn new(persona: &Persona) -> Self {
        Self {
            label: format!("{} {}", persona.theme.icon, persona.name),
            started: false,
            ended: None,
        }
    }

    pub fn handle(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::SendStarted { .. } => {
                self.started = true;
                println!("{}", self.label.bright_magenta());
            }
            ChatEvent::TextDelta { text, .. } => {
                print!("{}", text.bright_blue());
                let _ = std::io::stdout().flush();
            }
            ChatEvent::ImageRequested { description, .. } => {
                println!();
                println!("{}", format!("Generating image: {description}").bright_black());
            }
            ChatEvent::SendEnded { phase, .. } => {
                self.ended = Some(phase);
            }
        }
    }

    /// Closes the streamed block. Returns the phase the send ended in.
    pub fn finish(self) -> Option<SendPhase> {
        if self.started {
            println!();
            if self.ended == Some(SendPhase::Cancelled) {
                println!("{}", "(stopped)".yellow());
            }
        }
        self.ended
    }
}
