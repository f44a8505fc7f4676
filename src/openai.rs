//! OpenAI-compatible HTTP provider implementing both collaborator seams:
//! [`Embedder`] via the embeddings endpoint and [`ConversationalAnswerer`]
//! via chat completions.

use std::time::Duration;

use serde_json::{Value, json};

use crate::{
    answerer::ConversationalAnswerer,
    embedding::Embedder,
    error::{Error, Result},
    session::{ChatTurn, Role},
    store::SegmentRecord,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const REQUEST_TIMEOUT_SECS: u64 = 120;

const CONDENSE_PROMPT: &str = "Given the following conversation and a \
follow up question, rephrase the follow up question to be a standalone \
question, in its original language. Return only the question.";

const ANSWER_PROMPT: &str = "Use the following pieces of context to answer \
the question at the end. If you don't know the answer, just say that you \
don't know, don't try to make up an answer.";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
}

impl OpenAiConfig {
    /// Read provider configuration from the environment:
    /// `DOCCHAT_API_KEY` (falling back to `OPENAI_API_KEY`),
    /// `DOCCHAT_API_BASE`, `DOCCHAT_MODEL`, `DOCCHAT_EMBEDDING_MODEL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("DOCCHAT_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                Error::Config(
                    "DOCCHAT_API_KEY or OPENAI_API_KEY must be set".into(),
                )
            })?;

        Ok(Self {
            api_key,
            base_url: std::env::var("DOCCHAT_API_BASE")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            chat_model: std::env::var("DOCCHAT_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: std::env::var("DOCCHAT_EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
        })
    }
}

#[derive(Clone)]
pub struct OpenAiClient {
    agent: ureq::Agent,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .timeout_write(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build();
        Self { agent, config }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(OpenAiConfig::from_env()?))
    }

    fn post(&self, endpoint: &str, payload: Value) -> Result<Value> {
        let url = format!("{}/{endpoint}", self.config.base_url);

        let response = self
            .agent
            .post(&url)
            .set("content-type", "application/json")
            .set(
                "authorization",
                &format!("Bearer {}", self.config.api_key),
            )
            .send_json(payload);

        match response {
            Ok(resp) => resp.into_json().map_err(|e| {
                Error::Index(format!("malformed response from {endpoint}: {e}"))
            }),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(Error::Index(format!(
                    "{endpoint} returned {code}: {body}"
                )))
            }
            Err(ureq::Error::Transport(err)) => {
                Err(Error::Index(format!("{endpoint} transport error: {err}")))
            }
        }
    }

    /// One chat completion at temperature 0, returning the message text.
    fn chat(&self, messages: Vec<Value>) -> Result<String> {
        let body = self.post(
            "chat/completions",
            json!({
                "model": self.config.chat_model,
                "temperature": 0,
                "messages": messages,
            }),
        )?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| {
                Error::Index("chat completion had no message content".into())
            })
    }
}

fn history_transcript(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.tag(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Embedder for OpenAiClient {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = self.post(
            "embeddings",
            json!({
                "model": self.config.embedding_model,
                "input": texts,
            }),
        )?;

        let data = body["data"].as_array().ok_or_else(|| {
            Error::Index("embeddings response had no data array".into())
        })?;
        if data.len() != texts.len() {
            return Err(Error::Index(format!(
                "embeddings response count mismatch: sent {}, got {}",
                texts.len(),
                data.len()
            )));
        }

        data.iter()
            .map(|item| {
                item["embedding"]
                    .as_array()
                    .map(|values| {
                        values
                            .iter()
                            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                            .collect()
                    })
                    .ok_or_else(|| {
                        Error::Index(
                            "embeddings entry missing vector".into(),
                        )
                    })
            })
            .collect()
    }
}

impl ConversationalAnswerer for OpenAiClient {
    fn rewrite_question(
        &self,
        history: &[ChatTurn],
        question: &str,
    ) -> Result<String> {
        // The first question of a session needs no reformulation.
        if history.is_empty() {
            return Ok(question.to_string());
        }

        self.chat(vec![
            json!({"role": "system", "content": CONDENSE_PROMPT}),
            json!({
                "role": "user",
                "content": format!(
                    "Chat history:\n{}\n\nFollow up question: {question}",
                    history_transcript(history)
                ),
            }),
        ])
    }

    fn answer(
        &self,
        question: &str,
        context: &[SegmentRecord],
        history: &[ChatTurn],
    ) -> Result<String> {
        let context_block = context
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut messages =
            vec![json!({"role": "system", "content": ANSWER_PROMPT})];
        for turn in history {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(json!({"role": role, "content": turn.content}));
        }
        messages.push(json!({
            "role": "user",
            "content": format!("{context_block}\n\nQuestion: {question}"),
        }));

        self.chat(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = OpenAiConfig {
            api_key: "k".into(),
            base_url: DEFAULT_BASE_URL.into(),
            chat_model: DEFAULT_CHAT_MODEL.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.into(),
        };
        let client = OpenAiClient::new(config);
        assert_eq!(client.config.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn transcript_formats_roles() {
        let history = vec![
            ChatTurn {
                role: Role::User,
                content: "hi".into(),
            },
            ChatTurn {
                role: Role::Assistant,
                content: "hello".into(),
            },
        ];
        assert_eq!(history_transcript(&history), "Human: hi\nAI: hello");
    }
}
