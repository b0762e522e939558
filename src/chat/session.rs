//! Core chat session management.
//!
//! A `ChatSession` is one invocation of the tool: it bootstraps the
//! installation, resolves the active conversation, runs a single completion
//! cycle or auxiliary command, and persists the result.

use serde::Serialize;

use crate::Error;
use crate::chat::commands::ChatCommand;
use crate::chat::config::{Config, Layout, new_conversation_id};
use crate::chat::conversation::Conversation;
use crate::chat::editor::ContentSource;
use crate::chat::picker::ModelSelector;
use crate::completion::Completion;
use crate::error::Result;
use crate::observability::{CHAT_RESETS, CHAT_TURNS};
use crate::render::Renderer;
use crate::types::{KnownModel, Message, Model};

/// Collaborators a command may need besides the session itself.
pub struct Interaction<'a> {
    /// Produces the assistant reply; only commands that send a message need one.
    pub completion: Option<&'a dyn Completion>,
    /// Produces the user message for `--edit`.
    pub content: &'a mut dyn ContentSource,
    /// Picks a model for the `model` command.
    pub selector: &'a mut dyn ModelSelector,
    /// Receives streamed text and command output.
    pub renderer: &'a mut dyn Renderer,
}

/// One run of the tool against an installation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    layout: Layout,
    config: Config,
}

impl ChatSession {
    /// Ensures the installation exists and loads its config.
    ///
    /// On first run the config is created with a fresh conversation id and
    /// the default model.
    ///
    /// # Errors
    ///
    /// `Io` when the directories or the config cannot be written, `Corrupt`
    /// when an existing config does not parse.
    pub fn bootstrap(layout: Layout) -> Result<Self> {
        layout.ensure()?;
        let path = layout.config_path();
        let config = match Config::load(&path) {
            Ok(config) => config,
            Err(Error::NotFound { .. }) => {
                let config = Config::fresh()?;
                config.create(&path)?;
                tracing::info!(path = %path.display(), conversation = %config.active_conversation_id, "created config");
                config
            }
            Err(err) => return Err(err),
        };
        Ok(Self { layout, config })
    }

    /// The persisted config as currently loaded.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The installation layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Returns the active conversation, creating its file if it has none yet.
    pub fn resolve_conversation(&self) -> Result<Conversation> {
        let dir = self.layout.conversations_dir();
        let id = &self.config.active_conversation_id;
        if Conversation::exists(&dir, id) {
            Conversation::read(&dir, id)
        } else {
            let conversation = Conversation::new(id.clone());
            conversation.create(&dir)?;
            tracing::debug!(conversation = %id, "started conversation");
            Ok(conversation)
        }
    }

    /// Runs one completion cycle with `content` as the user message.
    ///
    /// This method:
    /// 1. Resolves the active conversation
    /// 2. Appends the user message
    /// 3. Asks `completion` for the reply with the full history
    /// 4. Appends the reply and persists the conversation
    ///
    /// Returns the conversation as persisted.
    ///
    /// # Errors
    ///
    /// Any failure aborts the cycle; nothing is persisted past the failure.
    pub async fn send(
        &self,
        content: String,
        completion: &dyn Completion,
        renderer: &mut dyn Renderer,
    ) -> Result<Conversation> {
        let dir = self.layout.conversations_dir();
        let mut conversation = self.resolve_conversation()?;

        conversation.push(Message::user(content));
        let reply = completion
            .complete(&self.config.model, conversation.messages(), renderer)
            .await?;
        conversation.push(reply);

        conversation.update(&dir)?;
        CHAT_TURNS.click();
        tracing::debug!(
            conversation = %conversation.id(),
            messages = conversation.len(),
            "conversation updated"
        );
        Ok(conversation)
    }

    /// Points the config at a new, never-used conversation id.
    ///
    /// Conversation files are left untouched. Returns the new id.
    pub fn reset(&mut self) -> Result<&str> {
        let previous = self.config.active_conversation_id.clone();
        let mut id = new_conversation_id()?;
        while id == previous {
            id = new_conversation_id()?;
        }
        self.config.active_conversation_id = id;
        self.config.save(self.layout.config_path())?;
        CHAT_RESETS.click();
        tracing::debug!(previous = %previous, current = %self.config.active_conversation_id, "reset conversation");
        Ok(&self.config.active_conversation_id)
    }

    /// Persists `model` as the model for future completions.
    pub fn change_model(&mut self, model: Model) -> Result<()> {
        self.config.model = model;
        self.config.save(self.layout.config_path())
    }

    /// The config as indented JSON.
    pub fn show_config(&self) -> Result<String> {
        to_pretty_json(&self.config)
    }

    /// The active conversation record as indented JSON.
    ///
    /// # Errors
    ///
    /// `NotFound` when the active conversation was never created.
    pub fn show_conversation(&self) -> Result<String> {
        let dir = self.layout.conversations_dir();
        let conversation = Conversation::read(&dir, &self.config.active_conversation_id)?;
        to_pretty_json(&conversation.to_file(&dir))
    }

    /// Runs a parsed command to completion.
    pub async fn execute(&mut self, command: ChatCommand, io: Interaction<'_>) -> Result<()> {
        match command {
            ChatCommand::Send(content) => {
                let completion = require_completion(io.completion)?;
                self.send(content, completion, io.renderer).await?;
            }
            ChatCommand::Edit => {
                let completion = require_completion(io.completion)?;
                let content = io.content.acquire_content()?;
                self.send(content, completion, io.renderer).await?;
            }
            ChatCommand::Reset => {
                self.reset()?;
            }
            ChatCommand::Model => {
                let model = io.selector.select_model(&KnownModel::ALL, &self.config.model)?;
                self.change_model(model)?;
            }
            ChatCommand::ShowConfig => {
                let json = self.show_config()?;
                io.renderer.print_info(&json);
            }
            ChatCommand::ShowConversation => {
                let json = self.show_conversation()?;
                io.renderer.print_info(&json);
            }
            ChatCommand::Invalid(message) => {
                return Err(Error::validation(message, None));
            }
        }
        Ok(())
    }
}

fn require_completion(completion: Option<&dyn Completion>) -> Result<&dyn Completion> {
    completion.ok_or_else(|| Error::validation("no completion backend configured", None))
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| Error::serialization("failed to encode record", Some(Box::new(err))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{MOCK_REPLY, MockCompletion};
    use crate::render::BufferRenderer;

    fn session(dir: &tempfile::TempDir) -> ChatSession {
        ChatSession::bootstrap(Layout::new(dir.path())).unwrap()
    }

    #[test]
    fn bootstrap_creates_layout_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);

        assert!(session.layout().conversations_dir().is_dir());
        assert!(session.layout().drafts_dir().is_dir());
        assert_eq!(
            Config::load(session.layout().config_path()).unwrap(),
            *session.config()
        );
        assert_eq!(session.config().model, Model::default());
    }

    #[test]
    fn bootstrap_reuses_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        let first = session(&dir);
        let second = session(&dir);
        assert_eq!(first.config(), second.config());
    }

    #[test]
    fn bootstrap_rejects_corrupt_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "[]").unwrap();

        let err = ChatSession::bootstrap(Layout::new(dir.path())).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn resolve_creates_then_reads() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);
        let id = session.config().active_conversation_id.clone();

        let created = session.resolve_conversation().unwrap();
        assert!(created.is_empty());
        assert!(Conversation::exists(session.layout().conversations_dir(), &id));

        let read = session.resolve_conversation().unwrap();
        assert_eq!(read, created);
    }

    #[tokio::test]
    async fn send_appends_user_then_assistant() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);
        let mut renderer = BufferRenderer::new();

        let conversation = session
            .send("hello".to_string(), &MockCompletion::default(), &mut renderer)
            .await
            .unwrap();

        assert_eq!(
            conversation.messages(),
            &[Message::user("hello"), Message::assistant(MOCK_REPLY)]
        );
    }

    #[test]
    fn reset_changes_id_and_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        let before = session.config().active_conversation_id.clone();
        let conversation = session.resolve_conversation().unwrap();
        let path = Conversation::path(session.layout().conversations_dir(), &before);
        let contents = std::fs::read(&path).unwrap();

        let after = session.reset().unwrap().to_string();

        assert_ne!(before, after);
        assert_eq!(
            Config::load(session.layout().config_path())
                .unwrap()
                .active_conversation_id,
            after
        );
        assert_eq!(std::fs::read(&path).unwrap(), contents);
        assert_eq!(
            Conversation::read(session.layout().conversations_dir(), &before).unwrap(),
            conversation
        );
    }

    #[test]
    fn change_model_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);

        session
            .change_model(Model::Known(KnownModel::Gpt35Turbo))
            .unwrap();

        let reloaded = ChatSession::bootstrap(Layout::new(dir.path())).unwrap();
        assert_eq!(reloaded.config().model, Model::Known(KnownModel::Gpt35Turbo));
    }

    #[test]
    fn show_conversation_before_creation_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);

        let err = session.show_conversation().unwrap_err();

        assert!(err.is_not_found());
        let expected = Conversation::path(
            session.layout().conversations_dir(),
            &session.config().active_conversation_id,
        );
        assert_eq!(err.path(), Some(expected.as_path()));
    }

    #[test]
    fn show_config_is_indented_json() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir);

        let json = session.show_config().unwrap();

        assert!(json.contains("\n  \"sessionId\""));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["model"], "gpt-4o");
    }

    #[tokio::test]
    async fn send_without_completion_is_rejected_before_editing() {
        struct Untouchable;

        impl ContentSource for Untouchable {
            fn acquire_content(&mut self) -> Result<String> {
                panic!("editor must not open without a completion backend");
            }
        }

        struct NoSelection;

        impl ModelSelector for NoSelection {
            fn select_model(&mut self, _: &[KnownModel], _: &Model) -> Result<Model> {
                panic!("selector must not run");
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        let mut renderer = BufferRenderer::new();

        for command in [ChatCommand::Edit, ChatCommand::Send("hi".to_string())] {
            let err = session
                .execute(
                    command,
                    Interaction {
                        completion: None,
                        content: &mut Untouchable,
                        selector: &mut NoSelection,
                        renderer: &mut renderer,
                    },
                )
                .await
                .unwrap_err();
            assert!(err.is_validation());
        }

        session
            .execute(
                ChatCommand::Reset,
                Interaction {
                    completion: None,
                    content: &mut Untouchable,
                    selector: &mut NoSelection,
                    renderer: &mut renderer,
                },
            )
            .await
            .unwrap();
    }
}
