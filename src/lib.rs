//! docchat - conversational question answering over per-user document sets.
//!
//! Each user owns a workspace on disk: uploaded documents, a manifest of
//! indexed file names, and a persisted vector index. Questions are answered
//! through a conversational retrieval pipeline: rewrite the follow-up into
//! a standalone query using the chat history, retrieve the most relevant
//! text segments, and generate an answer grounded in them.
//!
//! # Quick start
//!
//! ```no_run
//! use docchat::{
//!     ChatService, DataDir, EmbeddingIndex, IncomingFile, OpenAiClient,
//!     SessionRegistry,
//! };
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let client = OpenAiClient::from_env().unwrap();
//! let mut service = ChatService::new(
//!     SessionRegistry::new(data_dir),
//!     EmbeddingIndex::new(client.clone()),
//!     client.clone(),
//!     client,
//! );
//!
//! let files = vec![IncomingFile::new(
//!     "notes.txt",
//!     b"Rust guarantees memory safety without garbage collection.".to_vec(),
//! )];
//! println!("{}", service.process_files("alice", &files).unwrap());
//!
//! let output = service.ask("alice", "what does Rust guarantee?").unwrap();
//! println!("{}", output.answer);
//! ```

pub mod answerer;
pub mod chunking;
pub mod data_dir;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod manifest;
pub mod openai;
pub mod registry;
pub mod retrieval;
pub mod service;
pub mod session;
pub mod store;
pub mod user_id;
pub mod workspace;

pub use answerer::ConversationalAnswerer;
pub use data_dir::DataDir;
pub use embedding::Embedder;
pub use error::{Error, Result};
pub use index::{DocumentIndex, EmbeddingIndex};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use registry::SessionRegistry;
pub use service::{AskOutput, ChatService};
pub use session::ConversationSession;
pub use store::SegmentStore;
pub use user_id::UserId;
pub use workspace::{IncomingFile, UserWorkspace};
