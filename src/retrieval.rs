//! Segment selection over stored embeddings: pure cosine similarity or
//! maximal-marginal-relevance (MMR), which trades a little relevance for
//! diversity among the returned segments.

/// Default number of segments handed to the answerer.
pub const DEFAULT_TOP_K: usize = 4;

/// Relevance/diversity balance for MMR. 1.0 degenerates to pure similarity.
const MMR_LAMBDA: f32 = 0.5;

/// How many similarity candidates MMR considers before selecting.
const MMR_POOL_FACTOR: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalStrategy {
    /// Top-k by cosine similarity.
    Similarity,
    /// Diversity-aware selection.
    #[default]
    Mmr,
}

#[derive(Debug, Clone, Copy)]
pub struct RetrievalOptions {
    pub top_k: usize,
    pub strategy: RetrievalStrategy,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            strategy: RetrievalStrategy::default(),
        }
    }
}

/// A selected segment id with its query similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub id: u64,
    pub score: f32,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Pick the segments to answer from.
pub fn select(
    query: &[f32],
    candidates: &[(u64, Vec<f32>)],
    options: RetrievalOptions,
) -> Vec<Hit> {
    if candidates.is_empty() || options.top_k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(Hit, &[f32])> = candidates
        .iter()
        .map(|(id, embedding)| {
            (
                Hit {
                    id: *id,
                    score: cosine_similarity(query, embedding),
                },
                embedding.as_slice(),
            )
        })
        .collect();
    scored.sort_by(|a, b| {
        b.0.score
            .partial_cmp(&a.0.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    match options.strategy {
        RetrievalStrategy::Similarity => scored
            .into_iter()
            .take(options.top_k)
            .map(|(hit, _)| hit)
            .collect(),
        RetrievalStrategy::Mmr => mmr_select(&scored, options.top_k),
    }
}

/// Greedy MMR over a similarity-ranked candidate pool.
///
/// Each round picks the candidate maximizing
/// `lambda * sim(query) - (1 - lambda) * max sim(already selected)`.
fn mmr_select(ranked: &[(Hit, &[f32])], top_k: usize) -> Vec<Hit> {
    let pool = &ranked[..ranked
        .len()
        .min(top_k.saturating_mul(MMR_POOL_FACTOR).max(top_k))];

    let mut selected: Vec<(Hit, &[f32])> = Vec::with_capacity(top_k);
    let mut remaining: Vec<(Hit, &[f32])> = pool.to_vec();

    while selected.len() < top_k && !remaining.is_empty() {
        let (best_idx, _) = remaining
            .iter()
            .enumerate()
            .map(|(i, (hit, embedding))| {
                let redundancy = selected
                    .iter()
                    .map(|(_, sel)| cosine_similarity(embedding, sel))
                    .fold(0.0f32, f32::max);
                let mmr = MMR_LAMBDA * hit.score
                    - (1.0 - MMR_LAMBDA) * redundancy;
                (i, mmr)
            })
            .max_by(|a, b| {
                a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("remaining is non-empty");

        selected.push(remaining.swap_remove(best_idx));
    }

    selected.into_iter().map(|(hit, _)| hit).collect()
}
