use crate::error::Result;

/// Turns text into fixed-dimension vectors.
///
/// Implemented over HTTP by [`crate::openai::OpenAiClient`]; tests use a
/// deterministic in-process embedder.
pub trait Embedder {
    /// Embed a batch of texts, one vector per input, in input order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(std::slice::from_ref(&text.to_string()))?;
        Ok(vectors.pop().unwrap_or_default())
    }
}
