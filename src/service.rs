//! The operations the UI layer calls: process files, ask, clear the
//! conversation, delete a user. Wires the registry, the index, and the
//! answerer together and turns outcomes into status messages.

use crate::{
    answerer::ConversationalAnswerer,
    embedding::Embedder,
    error::{Error, Result},
    index::DocumentIndex,
    registry::SessionRegistry,
    session::{self, ConversationSession},
    store::SegmentStore,
    workspace::IncomingFile,
};

/// Everything one `ask` call hands back to the UI.
#[derive(Debug, Clone)]
pub struct AskOutput {
    pub answer: String,
    pub rewritten_question: String,
    /// Human-readable chat transcript including this turn.
    pub history: String,
    /// Human-readable citation view for the retrieved segments.
    pub citations: String,
}

pub struct ChatService<I, A, E> {
    registry: SessionRegistry,
    index: I,
    answerer: A,
    embedder: E,
}

impl<I, A, E> ChatService<I, A, E>
where
    I: DocumentIndex<Handle = SegmentStore>,
    A: ConversationalAnswerer,
    E: Embedder,
{
    pub fn new(
        registry: SessionRegistry,
        index: I,
        answerer: A,
        embedder: E,
    ) -> Self {
        Self {
            registry,
            index,
            answerer,
            embedder,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Ingest files for the user, build or extend their index, and bind
    /// a fresh session to it. Returns a status message; per-file
    /// duplicate rejections are reported in it, never abort the batch.
    pub fn process_files(
        &mut self,
        user: &str,
        files: &[IncomingFile],
    ) -> Result<String> {
        let workspace = self.registry.resolve(user)?;
        let user_id = workspace.user().clone();

        // A live session keeps the persisted database open; drop it so
        // ingest and the index rebind can reopen or rebuild the store.
        self.registry.remove(&user_id);

        let outcome = workspace.ingest(files, &self.index)?;
        let handle = workspace.resolve_index(&self.index, &outcome)?;

        self.registry
            .set_active_session(user_id.clone(), ConversationSession::new(handle));

        let mut status = if outcome.existed_before {
            "Files have been processed.".to_string()
        } else {
            format!(
                "Created index for user '{user_id}' with {} files.",
                outcome.accepted.len()
            )
        };
        for rejection in &outcome.rejected {
            status.push('\n');
            status.push_str(rejection);
        }
        Ok(status)
    }

    /// Answer a question with the user's session.
    ///
    /// Fails with [`Error::SessionNotReady`] unless `process_files` has
    /// succeeded for this user since startup.
    pub fn ask(&mut self, user: &str, question: &str) -> Result<AskOutput> {
        let user_id = self.registry.resolve(user)?.user().clone();
        let session = self
            .registry
            .session_mut(&user_id)
            .ok_or(Error::SessionNotReady)?;

        let result = session.ask(&self.answerer, &self.embedder, question)?;

        Ok(AskOutput {
            answer: result.answer,
            rewritten_question: result.rewritten_question,
            history: session::format_history(&result.history),
            citations: session::format_citations(&result.citations),
        })
    }

    /// Clear the user's chat history, keeping their index bound. A user
    /// without a session is a silent no-op.
    pub fn clear_conversation(&mut self, user: &str) -> Result<()> {
        let user_id = self.registry.resolve(user)?.user().clone();
        if let Some(session) = self.registry.session_mut(&user_id) {
            session.reset();
        }
        Ok(())
    }

    /// Wipe all state for the user. Refused while they hold the active
    /// session; the registry entry is dropped only after the on-disk
    /// delete succeeded.
    pub fn delete_user(&mut self, user: &str) -> Result<String> {
        let workspace = self.registry.resolve(user)?;
        let user_id = workspace.user().clone();

        if workspace.delete(self.registry.active_user())? {
            self.registry.remove(&user_id);
            Ok(format!("Deleted all data for user '{user_id}'."))
        } else {
            Ok(format!("No data found for user '{user_id}'."))
        }
    }
}
