//! The interactive loop: reads lines, dispatches commands and streams
//! replies to the terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

use armin_application::{ChatSession, SendOutcome, SendPhase};
use armin_core::attachment::{Attachment, FileInput, ingest_file};
use armin_core::config::AppSettings;
use armin_core::error::ArminError;
use armin_core::notification::Notification;
use armin_core::persona::{find_persona, get_default_presets};
use armin_core::session::GeneratedImage;
use armin_infrastructure::{FileLoader, SettingsService};

use crate::commands::{self, Command, SettingChange};
use crate::helper::ArminHelper;
use crate::render::{self, StreamPrinter};

pub struct Repl {
    session: Arc<ChatSession>,
    settings_service: SettingsService,
    notifications: mpsc::UnboundedReceiver<Notification>,
    loader: FileLoader,
    pending: Vec<Attachment>,
    output_dir: PathBuf,
}

enum Flow {
    Continue,
    Quit,
}

/// What a streamed send is asked to do.
enum SendKind {
    New {
        text: String,
        attachments: Vec<Attachment>,
    },
    Edit {
        message_id: String,
        text: String,
    },
}

impl Repl {
    pub fn new(
        session: Arc<ChatSession>,
        settings_service: SettingsService,
        notifications: mpsc::UnboundedReceiver<Notification>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            session,
            settings_service,
            notifications,
            loader: FileLoader::new(),
            pending: Vec::new(),
            output_dir,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut rl: Editor<ArminHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(ArminHelper::new()));

        render::banner(&self.session.persona().await, &self.session.settings().await);

        loop {
            let readline = rl.readline(">> ");

            match readline {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    let flow = match commands::parse(trimmed) {
                        Ok(command) => self.dispatch(command).await,
                        Err(usage) => {
                            println!("{}", usage.yellow());
                            Flow::Continue
                        }
                    };
                    if let Flow::Quit = flow {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("{}", format!("Error: {:?}", err).red());
                    break;
                }
            }
        }

        self.session.stop_active_send();
        println!("{}", "Goodbye!".bright_green());
        Ok(())
    }

    /// Prints queued notifications and returns how many there were.
    fn flush_notifications(&mut self) -> usize {
        let mut shown = 0;
        while let Ok(notification) = self.notifications.try_recv() {
            render::notification(&notification);
            shown += 1;
        }
        shown
    }

    async fn dispatch(&mut self, command: Command) -> Flow {
        let result = match command {
            Command::Send(text) => {
                let attachments = std::mem::take(&mut self.pending);
                self.stream(SendKind::New { text, attachments }).await
            }
            Command::Attach(paths) => self.attach(&paths).await,
            Command::Edit { number, text } => match self.message_id(number).await {
                Ok(message_id) => self.stream(SendKind::Edit { message_id, text }).await,
                Err(err) => Err(err),
            },
            Command::Steps(number) => self.steps(number).await,
            Command::Stop => {
                if !self.session.stop_active_send() {
                    println!("{}", "Nothing to stop.".bright_black());
                }
                Ok(())
            }
            Command::Persona(id) => self.switch_persona(&id).await,
            Command::Personas => {
                let current = self.session.persona().await;
                render::personas(&get_default_presets(), &current.id);
                Ok(())
            }
            Command::Image(prompt) => self.image(&prompt).await,
            Command::Analyze { paths, prompt } => self.analyze(&paths, &prompt).await,
            Command::Vision { path, prompt } => self.vision(&path, &prompt).await,
            Command::Settings(change) => self.settings(change).await,
            Command::History => {
                let persona = self.session.persona().await;
                render::history(&self.session.messages().await, &persona);
                Ok(())
            }
            Command::Help => {
                render::help();
                Ok(())
            }
            Command::Quit => return Flow::Quit,
        };

        let shown = self.flush_notifications();
        if let Err(err) = result {
            tracing::debug!("[Repl] Command failed: {}", err);
            // Failures the session already reported arrive as notifications.
            if shown == 0 {
                println!("{}", err.user_message().red());
            }
        }
        Flow::Continue
    }

    /// Runs a send in the background, printing its events until it ends.
    /// Ctrl-C stops the reply without leaving the REPL.
    async fn stream(&self, kind: SendKind) -> armin_core::Result<()> {
        let persona = self.session.persona().await;
        let mut events = self.session.subscribe();
        let session = Arc::clone(&self.session);
        let mut task = tokio::spawn(async move {
            match kind {
                SendKind::New { text, attachments } => {
                    session.send_message(text, attachments, None).await
                }
                SendKind::Edit { message_id, text } => session.edit_message(&message_id, text).await,
            }
        });

        let mut printer = StreamPrinter::new(&persona);
        let joined = loop {
            tokio::select! {
                joined = &mut task => break joined,
                event = events.recv() => match event {
                    Ok(event) => printer.handle(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("[Repl] Dropped {} stream events", skipped);
                    }
                    Err(RecvError::Closed) => break (&mut task).await,
                },
                _ = tokio::signal::ctrl_c() => {
                    self.session.stop_active_send();
                }
            }
        };
        while let Ok(event) = events.try_recv() {
            printer.handle(event);
        }
        printer.finish();

        let outcome = joined.map_err(|err| ArminError::internal(err.to_string()))??;
        self.after_send(&outcome).await
    }

    async fn after_send(&self, outcome: &SendOutcome) -> armin_core::Result<()> {
        if outcome.phase == SendPhase::Errored {
            return Ok(());
        }
        if let Some(message) = self.session.message(&outcome.message_id).await {
            render::sources_and_images(&message);
            for image in &message.images {
                self.save_image(image).await?;
            }
        }
        Ok(())
    }

    async fn message_id(&self, number: usize) -> armin_core::Result<String> {
        let messages = self.session.messages().await;
        messages
            .get(number - 1)
            .map(|message| message.id.clone())
            .ok_or_else(|| {
                ArminError::invalid_input(format!(
                    "no message {number} (the conversation has {})",
                    messages.len()
                ))
            })
    }

    async fn load_files(&self, paths: &[PathBuf]) -> Vec<FileInput> {
        let mut files = Vec::new();
        for (path, result) in paths.iter().zip(self.loader.load_all(paths).await) {
            match result {
                Ok(file) => files.push(file),
                Err(err) => println!(
                    "{}",
                    format!("{}: {}", path.display(), err.user_message()).red()
                ),
            }
        }
        files
    }

    async fn attach(&mut self, paths: &[PathBuf]) -> armin_core::Result<()> {
        if paths.is_empty() {
            if self.pending.is_empty() {
                println!("{}", "No attachments queued.".bright_black());
            }
            for attachment in &self.pending {
                println!("  📎 {} ({})", attachment.name, attachment.mime_type);
            }
            return Ok(());
        }

        for file in self.load_files(paths).await {
            let name = file.name.clone();
            match ingest_file(file) {
                Ok(attachment) => {
                    println!(
                        "{}",
                        format!("📎 {} queued ({} bytes)", attachment.name, attachment.size).green()
                    );
                    self.pending.push(attachment);
                }
                Err(err) => println!("{}", format!("{name}: {}", err.user_message()).red()),
            }
        }
        Ok(())
    }

    async fn steps(&self, number: usize) -> armin_core::Result<()> {
        let message_id = self.message_id(number).await?;
        let steps = self.session.request_step_explanation(&message_id).await?;
        render::model_text(&steps);
        Ok(())
    }

    async fn switch_persona(&mut self, id: &str) -> armin_core::Result<()> {
        let persona = find_persona(id).ok_or_else(|| {
            ArminError::invalid_input(format!("unknown persona '{id}', try /personas"))
        })?;
        self.session.select_persona(persona.clone()).await;
        println!(
            "{}",
            format!("{} {} · new conversation", persona.theme.icon, persona.name).bright_magenta()
        );
        Ok(())
    }

    async fn image(&self, prompt: &str) -> armin_core::Result<()> {
        println!("{}", "Generating image…".bright_black());
        let image = self.session.generate_image(prompt).await?;
        self.save_image(&image).await
    }

    async fn analyze(&self, paths: &[PathBuf], prompt: &str) -> armin_core::Result<()> {
        let files = self.load_files(paths).await;
        if files.is_empty() {
            return Ok(());
        }
        let analysis = self.session.analyze_files(&files, prompt).await?;
        render::model_text(&analysis);
        Ok(())
    }

    async fn vision(&self, path: &Path, prompt: &str) -> armin_core::Result<()> {
        let file = self.loader.load(path).await?;
        let description = self.session.analyze_image(&file, prompt).await?;
        render::model_text(&description);
        Ok(())
    }

    async fn settings(&self, change: Option<SettingChange>) -> armin_core::Result<()> {
        let Some(change) = change else {
            render::settings(
                &self.session.settings().await,
                self.settings_service.has_env_credential(),
            );
            return Ok(());
        };

        let mut stored = self.settings_service.load().await?;
        apply_change(&mut stored, &change);
        self.settings_service.save(&stored).await?;

        let mut current = self.session.settings().await;
        apply_change(&mut current, &change);
        self.session.update_settings(current).await;
        println!("{}", "Settings saved.".green());
        render::settings(
            &self.session.settings().await,
            self.settings_service.has_env_credential(),
        );
        Ok(())
    }

    async fn save_image(&self, image: &GeneratedImage) -> armin_core::Result<()> {
        let bytes = STANDARD
            .decode(&image.data)
            .map_err(|err| ArminError::decode(format!("image data: {err}")))?;
        let file_name = format!(
            "armin-{}.{}",
            chrono::Local::now().format("%Y%m%d-%H%M%S%3f"),
            image_extension(&image.mime_type)
        );
        let path = self.output_dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        println!("{}", format!("Image saved to {}", path.display()).green());
        Ok(())
    }
}

fn apply_change(settings: &mut AppSettings, change: &SettingChange) {
    match change {
        SettingChange::Model(model) => settings.model = model.clone(),
        SettingChange::Temperature(temperature) => settings.temperature = *temperature,
        SettingChange::Search(enabled) => settings.enable_search = *enabled,
        SettingChange::ApiKey(key) => settings.api_key = key.clone(),
    }
}

fn image_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_change() {
        let mut settings = AppSettings::default();
        apply_change(&mut settings, &SettingChange::Search(false));
        apply_change(&mut settings, &SettingChange::Temperature(1.2));
        apply_change(&mut settings, &SettingChange::ApiKey("k".to_string()));
        assert!(!settings.enable_search);
        assert_eq!(settings.temperature, 1.2);
        assert!(settings.has_credential());
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("image/png"), "png");
        assert_eq!(image_extension("image/jpeg"), "jpg");
        assert_eq!(image_extension("application/octet-stream"), "bin");
    }
}
