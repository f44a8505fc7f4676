//! One active conversational QA session per user: a chat history bound to
//! a persisted index, plus the ask pipeline (rewrite, retrieve, answer).

use crate::{
    answerer::ConversationalAnswerer,
    embedding::Embedder,
    error::Result,
    retrieval::{self, RetrievalOptions},
    store::SegmentStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Display tag used in chat transcripts.
    pub fn tag(self) -> &'static str {
        match self {
            Role::User => "Human",
            Role::Assistant => "AI",
        }
    }
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// A retrieved segment exposed for the citation view.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub text: String,
    pub source: String,
    pub page: usize,
    pub total_pages: usize,
    pub score: f32,
}

/// What one `ask` call returns.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer: String,
    /// The standalone query the retrieval actually ran on.
    pub rewritten_question: String,
    pub citations: Vec<Citation>,
    /// Chat history after this turn, chronological.
    pub history: Vec<ChatTurn>,
}

/// A conversational session bound to one user's persisted index.
///
/// The history is append-only within the session; `reset` clears it while
/// keeping the index binding. Replaced wholesale when the index changes.
pub struct ConversationSession {
    store: SegmentStore,
    history: Vec<ChatTurn>,
    options: RetrievalOptions,
}

impl ConversationSession {
    pub fn new(store: SegmentStore) -> Self {
        Self::with_options(store, RetrievalOptions::default())
    }

    pub fn with_options(
        store: SegmentStore,
        options: RetrievalOptions,
    ) -> Self {
        Self {
            store,
            history: Vec::new(),
            options,
        }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Answer a question against the bound index.
    ///
    /// Rewrites the question into a standalone query using the history,
    /// retrieves the top-k segments for it, asks the answerer, and appends
    /// the (question, answer) pair to the history.
    pub fn ask<A, E>(
        &mut self,
        answerer: &A,
        embedder: &E,
        question: &str,
    ) -> Result<AnswerResult>
    where
        A: ConversationalAnswerer,
        E: Embedder,
    {
        let rewritten = answerer.rewrite_question(&self.history, question)?;
        tracing::debug!(question, rewritten, "running retrieval");

        let query = embedder.embed_query(&rewritten)?;
        let candidates = self.store.all_embeddings()?;
        let hits = retrieval::select(&query, &candidates, self.options);

        let mut context = Vec::with_capacity(hits.len());
        let mut citations = Vec::with_capacity(hits.len());
        for hit in &hits {
            if let Some(record) = self.store.segment(hit.id)? {
                citations.push(Citation {
                    text: record.text.clone(),
                    source: record.source.clone(),
                    page: record.page,
                    total_pages: record.total_pages,
                    score: hit.score,
                });
                context.push(record);
            }
        }

        let answer = answerer.answer(&rewritten, &context, &self.history)?;

        self.history.push(ChatTurn {
            role: Role::User,
            content: question.to_string(),
        });
        self.history.push(ChatTurn {
            role: Role::Assistant,
            content: answer.clone(),
        });

        Ok(AnswerResult {
            answer,
            rewritten_question: rewritten,
            citations,
            history: self.history.clone(),
        })
    }

    /// Clear the chat history, keeping the bound index.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// Render chat history as `Role: content` lines, chronological.
pub fn format_history(history: &[ChatTurn]) -> String {
    let mut out = String::from("Chat history:\n\n");
    for turn in history {
        out.push_str(turn.role.tag());
        out.push_str(": ");
        out.push_str(&turn.content);
        out.push('\n');
    }
    out
}

/// Render citations with their segment text, source file, and page
/// position.
pub fn format_citations(citations: &[Citation]) -> String {
    let divider = "----------------------------------------\n";
    let mut out = String::from("Sources:\n\n");
    for citation in citations {
        out.push_str(&citation.text);
        out.push('\n');
        out.push_str(divider);
        out.push_str(&format!("Source file: {}\n", citation.source));
        out.push_str(divider);
        out.push_str(&format!(
            "Page: {}/{}\n\n",
            citation.page, citation.total_pages
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        answerer::test_util::EchoAnswerer,
        embedding::test_util::HashEmbedder,
        store::SegmentRecord,
    };

    fn store_with(texts: &[(&str, &str)]) -> (tempfile::TempDir, SegmentStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = SegmentStore::create(&tmp.path().join("chroma")).unwrap();
        let entries: Vec<_> = texts
            .iter()
            .map(|(text, source)| {
                (
                    SegmentRecord {
                        text: text.to_string(),
                        source: source.to_string(),
                        page: 1,
                        total_pages: 3,
                    },
                    HashEmbedder::vector(text),
                )
            })
            .collect();
        store.add(&entries).unwrap();
        (tmp, store)
    }

    #[test]
    fn ask_appends_one_turn_pair() {
        let (_tmp, store) = store_with(&[
            ("rust ownership keeps memory safe", "rust.pdf"),
            ("sourdough needs a healthy starter", "bread.pdf"),
        ]);
        let mut session = ConversationSession::new(store);

        let result = session
            .ask(&EchoAnswerer, &HashEmbedder, "what about rust ownership?")
            .unwrap();

        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].role, Role::User);
        assert_eq!(
            session.history()[0].content,
            "what about rust ownership?"
        );
        assert_eq!(session.history()[1].role, Role::Assistant);
        assert_eq!(result.history, session.history());

        session
            .ask(&EchoAnswerer, &HashEmbedder, "and memory?")
            .unwrap();
        assert_eq!(session.history().len(), 4);
    }

    #[test]
    fn first_question_is_not_rewritten() {
        let (_tmp, store) = store_with(&[("alpha beta", "a.pdf")]);
        let mut session = ConversationSession::new(store);

        let first = session
            .ask(&EchoAnswerer, &HashEmbedder, "alpha?")
            .unwrap();
        assert_eq!(first.rewritten_question, "alpha?");

        let second = session
            .ask(&EchoAnswerer, &HashEmbedder, "beta?")
            .unwrap();
        assert_eq!(second.rewritten_question, "standalone: beta?");
    }

    #[test]
    fn citations_carry_page_position() {
        let (_tmp, store) =
            store_with(&[("rust ownership keeps memory safe", "rust.pdf")]);
        let mut session = ConversationSession::new(store);

        let result = session
            .ask(&EchoAnswerer, &HashEmbedder, "rust ownership?")
            .unwrap();

        assert!(!result.citations.is_empty());
        let citation = &result.citations[0];
        assert_eq!(citation.source, "rust.pdf");
        assert_eq!(citation.page, 1);
        assert_eq!(citation.total_pages, 3);
    }

    #[test]
    fn retrieval_prefers_relevant_segments() {
        let (_tmp, store) = store_with(&[
            ("rust ownership keeps memory safe", "rust.pdf"),
            ("sourdough needs a healthy starter", "bread.pdf"),
        ]);
        let mut session = ConversationSession::with_options(
            store,
            RetrievalOptions {
                top_k: 1,
                ..Default::default()
            },
        );

        let result = session
            .ask(&EchoAnswerer, &HashEmbedder, "rust ownership memory")
            .unwrap();

        assert_eq!(result.citations.len(), 1);
        assert_eq!(result.citations[0].source, "rust.pdf");
    }

    #[test]
    fn reset_clears_history_keeps_index() {
        let (_tmp, store) = store_with(&[("alpha beta", "a.pdf")]);
        let mut session = ConversationSession::new(store);

        session.ask(&EchoAnswerer, &HashEmbedder, "alpha?").unwrap();
        assert_eq!(session.history().len(), 2);

        session.reset();
        assert!(session.history().is_empty());

        // The bound index still answers.
        let result = session
            .ask(&EchoAnswerer, &HashEmbedder, "beta?")
            .unwrap();
        assert_eq!(result.rewritten_question, "beta?");
        assert!(!result.citations.is_empty());
    }

    #[test]
    fn history_formatting() {
        let history = vec![
            ChatTurn {
                role: Role::User,
                content: "q1".into(),
            },
            ChatTurn {
                role: Role::Assistant,
                content: "a1".into(),
            },
        ];
        let text = format_history(&history);
        assert!(text.contains("Human: q1"));
        assert!(text.contains("AI: a1"));
    }

    #[test]
    fn citation_formatting() {
        let citations = vec![Citation {
            text: "segment text".into(),
            source: "a.pdf".into(),
            page: 2,
            total_pages: 9,
            score: 0.5,
        }];
        let text = format_citations(&citations);
        assert!(text.contains("segment text"));
        assert!(text.contains("Source file: a.pdf"));
        assert!(text.contains("Page: 2/9"));
    }
}
