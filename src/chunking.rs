//! Splitting extracted page text into overlapping segments for embedding.
//!
//! Two fixed policies: Latin-script text uses 1000-character segments with
//! 150 characters of overlap; logographic text (Chinese, Japanese, Korean)
//! uses 500/70, reflecting the higher information density per character.
//! Boundaries are not sentence-aware.

/// Default segment length in characters for Latin-script text.
pub const SEGMENT_CHARS: usize = 1000;

/// Default overlap between adjacent segments in characters.
pub const OVERLAP_CHARS: usize = 150;

/// Segment length for logographic text.
pub const LOGOGRAPHIC_SEGMENT_CHARS: usize = 500;

/// Overlap for logographic text.
pub const LOGOGRAPHIC_OVERLAP_CHARS: usize = 70;

/// Fraction of non-whitespace characters that must be CJK for a document
/// to be chunked with the logographic policy.
const LOGOGRAPHIC_THRESHOLD: f32 = 0.3;

/// Splitting policy selected per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPolicy {
    Latin,
    Logographic,
}

impl SplitPolicy {
    /// Pick a policy by looking at the character mix of the document.
    ///
    /// # Examples
    ///
    /// ```
    /// use docchat::chunking::SplitPolicy;
    ///
    /// assert_eq!(SplitPolicy::detect("plain English text"), SplitPolicy::Latin);
    /// assert_eq!(SplitPolicy::detect("这是一段中文文本"), SplitPolicy::Logographic);
    /// ```
    pub fn detect(text: &str) -> Self {
        let mut total = 0usize;
        let mut cjk = 0usize;
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            total += 1;
            if is_cjk(c) {
                cjk += 1;
            }
        }

        if total > 0 && (cjk as f32 / total as f32) > LOGOGRAPHIC_THRESHOLD {
            SplitPolicy::Logographic
        } else {
            SplitPolicy::Latin
        }
    }

    pub fn segment_chars(self) -> usize {
        match self {
            SplitPolicy::Latin => SEGMENT_CHARS,
            SplitPolicy::Logographic => LOGOGRAPHIC_SEGMENT_CHARS,
        }
    }

    pub fn overlap_chars(self) -> usize {
        match self {
            SplitPolicy::Latin => OVERLAP_CHARS,
            SplitPolicy::Logographic => LOGOGRAPHIC_OVERLAP_CHARS,
        }
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'      // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}'    // Extension A
        | '\u{3040}'..='\u{30FF}'    // Hiragana + Katakana
        | '\u{AC00}'..='\u{D7AF}'    // Hangul syllables
        | '\u{F900}'..='\u{FAFF}'    // Compatibility ideographs
    )
}

/// Split text into overlapping segments under the given policy.
///
/// Character-windowed, UTF-8 safe. Latin segments prefer to end at a
/// whitespace boundary near the window edge; logographic segments cut at
/// the exact window edge. Text shorter than one window comes back whole.
pub fn split_text(text: &str, policy: SplitPolicy) -> Vec<String> {
    let size = policy.segment_chars();
    let overlap = policy.overlap_chars();

    let char_count = text.chars().count();
    if char_count <= size {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![text.to_string()]
        };
    }

    // char index -> byte offset, with a sentinel for the end of text.
    let byte_at: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .collect();

    let step = size.saturating_sub(overlap).max(1);
    let mut segments = Vec::new();
    let mut start = 0usize;

    while start < char_count {
        let window_end = (start + size).min(char_count);
        let end = if window_end < char_count && policy == SplitPolicy::Latin {
            snap_to_whitespace(text, &byte_at, start, window_end)
        } else {
            window_end
        };

        let piece = &text[byte_at[start]..byte_at[end]];
        if !piece.trim().is_empty() {
            segments.push(piece.to_string());
        }

        if window_end == char_count {
            break;
        }
        start += step;
    }

    segments
}

/// How far back from the window edge the whitespace search may reach.
/// Must stay under the overlap so the next window always re-covers
/// whatever the snap cut off.
const BOUNDARY_LOOKBACK_CHARS: usize = 100;

/// Search backwards from the window edge for the last whitespace character,
/// so Latin segments do not split words. Looks back at most
/// [`BOUNDARY_LOOKBACK_CHARS`]; a window edge deep inside an unbroken run
/// gets a hard cut instead.
fn snap_to_whitespace(
    text: &str,
    byte_at: &[usize],
    start: usize,
    window_end: usize,
) -> usize {
    let search_start = window_end
        .saturating_sub(BOUNDARY_LOOKBACK_CHARS)
        .max(start);
    let region = &text[byte_at[search_start]..byte_at[window_end]];
    match region.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
        Some((byte_off, _)) => {
            let cut = byte_at[search_start] + byte_off;
            // Translate the byte offset back into a char index.
            byte_at[search_start..=window_end]
                .iter()
                .position(|&b| b > cut)
                .map(|p| search_start + p)
                .unwrap_or(window_end)
        }
        None => window_end,
    }
}
