use std::{io::Write, path::PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{AskArgs, ChatArgs, Cli, Command, IngestArgs, StatusArgs};
use docchat::{
    ChatService, DataDir, EmbeddingIndex, IncomingFile, OpenAiClient, Result,
    SessionRegistry, UserId,
    manifest::{self, ManifestState},
};

type Service = ChatService<EmbeddingIndex<OpenAiClient>, OpenAiClient, OpenAiClient>;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("DOCCHAT_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;

    match cli.command {
        Command::Ingest(args) => cmd_ingest(data_dir, &args),
        Command::Ask(args) => cmd_ask(data_dir, &args),
        Command::Chat(args) => cmd_chat(data_dir, &args),
        Command::DeleteUser(args) => cmd_delete(data_dir, &args.user),
        Command::Status(args) => cmd_status(&data_dir, &args),
        Command::Completions(args) => {
            args.generate();
            Ok(())
        }
    }
}

fn service(data_dir: DataDir) -> Result<Service> {
    let client = OpenAiClient::from_env()?;
    Ok(ChatService::new(
        SessionRegistry::new(data_dir),
        EmbeddingIndex::new(client.clone()),
        client.clone(),
        client,
    ))
}

fn read_incoming(paths: &[PathBuf]) -> Result<Vec<IncomingFile>> {
    paths
        .iter()
        .map(|path| {
            let content = std::fs::read(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            Ok(IncomingFile::new(name, content))
        })
        .collect()
}

fn cmd_ingest(data_dir: DataDir, args: &IngestArgs) -> Result<()> {
    let mut svc = service(data_dir)?;
    let status = svc.process_files(&args.user, &read_incoming(&args.files)?)?;
    println!("{status}");
    Ok(())
}

fn cmd_ask(data_dir: DataDir, args: &AskArgs) -> Result<()> {
    let mut svc = service(data_dir)?;

    // Bind a session to the user's existing index; fails for a user with
    // no ingested documents.
    svc.process_files(&args.user, &[])?;

    let output = svc.ask(&args.user, &args.question)?;
    println!("{}", output.answer);
    if args.sources {
        println!();
        println!("{}", output.citations);
    }
    Ok(())
}

fn cmd_chat(data_dir: DataDir, args: &ChatArgs) -> Result<()> {
    let mut svc = service(data_dir)?;
    svc.process_files(&args.user, &[])?;

    eprintln!(
        "Chatting over documents of '{}'. /clear resets the conversation, \
         /quit exits.",
        args.user
    );

    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        line.clear();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let question = line.trim();
        match question {
            "" => {}
            "/quit" | "/exit" => break,
            "/clear" => {
                svc.clear_conversation(&args.user)?;
                println!("Conversation cleared.");
            }
            _ => {
                let output = svc.ask(&args.user, question)?;
                println!("{}", output.answer);
                if args.sources {
                    println!();
                    println!("{}", output.citations);
                }
            }
        }
    }
    Ok(())
}

fn cmd_delete(data_dir: DataDir, user: &str) -> Result<()> {
    // No session exists in a fresh process, so no active-user guard here.
    let registry = SessionRegistry::new(data_dir);
    let workspace = registry.resolve(user)?;

    if workspace.delete(None)? {
        println!("Deleted all data for user '{}'.", workspace.user());
    } else {
        println!("No data found for user '{}'.", workspace.user());
    }
    Ok(())
}

fn cmd_status(data_dir: &DataDir, args: &StatusArgs) -> Result<()> {
    let users = data_dir.list_users()?;

    if args.json {
        print!("[");
        for (i, name) in users.iter().enumerate() {
            if i > 0 {
                print!(",");
            }
            let user = UserId::new(name)?;
            let (state, files) = match manifest::inspect(data_dir, &user)? {
                ManifestState::NewUser => ("empty", 0),
                ManifestState::Intact(names) => ("ready", names.len()),
                ManifestState::Corrupted(names) => {
                    ("needs-repair", names.len())
                }
            };
            let entry = serde_json::json!({
                "user": name,
                "state": state,
                "files": files,
            });
            print!("{entry}");
        }
        println!("]");
    } else if users.is_empty() {
        println!("No users found.");
    } else {
        println!("Data directory: {}", data_dir.root().display());
        for name in &users {
            let user = UserId::new(name)?;
            match manifest::inspect(data_dir, &user)? {
                ManifestState::NewUser => {
                    println!("  {name}: no documents");
                }
                ManifestState::Intact(names) => {
                    println!("  {name}: {} files", names.len());
                }
                ManifestState::Corrupted(names) => {
                    println!(
                        "  {name}: {} files (manifest needs repair)",
                        names.len()
                    );
                }
            }
        }
    }
    Ok(())
}
