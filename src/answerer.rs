use crate::{error::Result, session::ChatTurn, store::SegmentRecord};

/// The language-model collaborator behind a conversation session.
///
/// `rewrite_question` turns a follow-up into a standalone query using the
/// chat history; `answer` generates a reply conditioned on the retrieved
/// segments and the history. Retrieval itself happens between the two, in
/// [`crate::session::ConversationSession::ask`].
pub trait ConversationalAnswerer {
    fn rewrite_question(
        &self,
        history: &[ChatTurn],
        question: &str,
    ) -> Result<String>;

    fn answer(
        &self,
        question: &str,
        context: &[SegmentRecord],
        history: &[ChatTurn],
    ) -> Result<String>;
}
