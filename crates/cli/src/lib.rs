pub mod commands;

use clap::{Parser, Subcommand};
use labbot_core::config::LoadOptions;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "labbot",
    about = "Lab support chatbot CLI",
    long_about = "Ask the lab support chatbot questions, chat interactively, or inspect configuration.",
    after_help = "Examples:\n  labbot ask \"What courses do you offer?\"\n  labbot chat\n  labbot config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a labbot.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer a single question and exit")]
    Ask {
        #[arg(help = "Question to send to the chatbot")]
        message: String,
        #[arg(long, help = "Emit machine-readable JSON output including the reply route")]
        json: bool,
    },
    #[command(about = "Start an interactive chat session (exit, quit or bye to leave)")]
    Chat,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config.clone(),
            ..LoadOptions::default()
        }
    }
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let result = match cli.command {
        Command::Ask { message, json } => commands::ask::run(options, &message, json).await,
        Command::Chat => commands::chat::run(options).await,
        Command::Config => commands::config::run(options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
