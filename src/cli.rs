use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "docchat",
    about = "Conversational question answering over your own documents"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add documents to a user's index
    Ingest(IngestArgs),
    /// Ask a single question against a user's documents
    Ask(AskArgs),
    /// Interactive chat session against a user's documents
    Chat(ChatArgs),
    /// Delete all stored data for a user
    DeleteUser(DeleteUserArgs),
    /// Show known users and their indexed files
    Status(StatusArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Ingest --

#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// User the documents belong to
    #[arg(short, long)]
    pub user: String,

    /// Document files to add (PDF or plain text)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

// -- Ask --

#[derive(Debug, Parser)]
pub struct AskArgs {
    /// User whose documents to query
    #[arg(short, long)]
    pub user: String,

    /// The question to answer
    pub question: String,

    /// Also print the source citations
    #[arg(long)]
    pub sources: bool,
}

// -- Chat --

#[derive(Debug, Parser)]
pub struct ChatArgs {
    /// User whose documents to query
    #[arg(short, long)]
    pub user: String,

    /// Print source citations after each answer
    #[arg(long)]
    pub sources: bool,
}

// -- Delete user --

#[derive(Debug, Parser)]
pub struct DeleteUserArgs {
    /// User whose data to delete
    pub user: String,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "docchat",
            &mut std::io::stdout(),
        );
    }
}
