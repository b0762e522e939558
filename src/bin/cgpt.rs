//! Command-line chat with GPT models.
//!
//! Each invocation sends one message to the active conversation and streams
//! the reply, or runs one of the auxiliary commands.
//!
//! # Usage
//!
//! ```bash
//! # Send a message
//! cgpt how do I reverse a list in rust
//!
//! # Compose the message in $EDITOR
//! cgpt -e
//!
//! # Start a new conversation, pick a model, inspect state
//! cgpt reset
//! cgpt model
//! cgpt show config
//! cgpt show chat
//! ```

use std::io;

use arrrg::CommandLine;
use tracing_subscriber::EnvFilter;

use cgpt::chat::{
    CgptArgs, CgptConfig, ChatCommand, ChatSession, ExternalEditor, Interaction, PromptSelector,
    parse_command, usage,
};
use cgpt::{Completion, OpenAi, PlainTextRenderer, Renderer, StreamingCompletion};

const USAGE: &str = "cgpt [OPTIONS] <MESSAGE>...|reset|model|show config|show chat";

/// Main entry point for the cgpt application.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // arrrg only knows long options; accept the short spelling of --edit.
    let argv: Vec<String> = std::env::args()
        .skip(1)
        .map(|arg| if arg == "-e" { "--edit".to_string() } else { arg })
        .collect();
    let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
    let (args, words) = CgptArgs::from_arguments_relaxed(USAGE, &argv);

    let mut renderer = PlainTextRenderer::with_color(!args.no_color);
    if let Err(err) = run(args, words, &mut renderer).await {
        tracing::error!(error = %err, "cgpt failed");
        renderer.print_error(&err.to_string());
        if err.is_validation() {
            renderer.print_info(usage());
        }
        std::process::exit(1);
    }
}

async fn run(args: CgptArgs, words: Vec<String>, renderer: &mut dyn Renderer) -> cgpt::Result<()> {
    let config = CgptConfig::from_args(args)?;
    let command = parse_command(config.edit, &words);
    tracing::debug!(?command, home = %config.layout.home().display(), "starting");

    let mut session = ChatSession::bootstrap(config.layout.clone())?;

    // Only commands that talk to the model need an API key.
    let completion = match command {
        ChatCommand::Send(_) | ChatCommand::Edit => Some(StreamingCompletion::new(
            OpenAi::with_options(None, config.base_url.clone(), None)?,
        )),
        _ => None,
    };
    let mut editor = ExternalEditor::from_env(config.layout.drafts_dir());
    let mut selector = PromptSelector::new();

    session
        .execute(
            command,
            Interaction {
                completion: completion.as_ref().map(|c| c as &dyn Completion),
                content: &mut editor,
                selector: &mut selector,
                renderer,
            },
        )
        .await
}
