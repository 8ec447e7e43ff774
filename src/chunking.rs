//! Sentence-boundary chunking for long documents.
//!
//! Long text is split into chunks of roughly `target_size` characters built
//! from whole sentences. Adjacent chunks share a tail of whole words
//! (~`overlap_size` characters) so a passage that falls on a chunk boundary
//! is still retrievable from either side.
//!
//! Sizes are measured in characters, not bytes, so multi-byte text is sized
//! consistently and never cut mid-character.

/// Default chunk size in characters.
pub const DEFAULT_TARGET_SIZE: usize = 2000;

/// Default overlap between adjacent chunks in characters.
pub const DEFAULT_OVERLAP_SIZE: usize = 300;

/// Chunks shorter than this are dropped as noise.
pub const MIN_CHUNK_CHARS: usize = 50;

/// Chunking parameters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Target chunk size in characters. A soft limit: a single sentence
    /// longer than this is kept whole rather than split mid-sentence.
    pub target_size: usize,
    /// Approximate overlap carried into the next chunk, in characters.
    pub overlap_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            overlap_size: DEFAULT_OVERLAP_SIZE,
        }
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split text into sentences on `.`, `!`, or `?` followed by whitespace.
///
/// Terminators stay attached to their sentence; the whitespace between
/// sentences is consumed. A terminator glued to more text (`0.8g`) is not a
/// boundary. Text after the last terminator is returned as a final sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start: Option<usize> = None;
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];

        if start.is_none() {
            if !c.is_whitespace() {
                start = Some(offset);
            }
            i += 1;
            continue;
        }

        if is_terminator(c) {
            // Walk to the end of the terminator run.
            let mut j = i + 1;
            while j < chars.len() && is_terminator(chars[j].1) {
                j += 1;
            }

            if j >= chars.len() || chars[j].1.is_whitespace() {
                let end = chars.get(j).map_or(text.len(), |&(o, _)| o);
                if let Some(s) = start.take() {
                    sentences.push(&text[s..end]);
                }
                i = j;
                continue;
            }

            // Terminator followed by more text: not a boundary.
            i = j;
            continue;
        }

        i += 1;
    }

    if let Some(s) = start {
        let tail = text[s..].trim_end();
        if !tail.is_empty() {
            sentences.push(tail);
        }
    }

    sentences
}

/// Split `text` into overlapping chunks of whole sentences.
///
/// Sentences are accumulated greedily until the next one would push the
/// chunk past `target_size`; the chunk is then closed and the next one is
/// seeded with the trailing words of the previous chunk. Chunks shorter
/// than [`MIN_CHUNK_CHARS`] are dropped. Output order follows input order,
/// and identical input always produces identical output.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in split_sentences(text) {
        let sentence_chars = sentence.chars().count();

        if !current.is_empty()
            && current_chars + sentence_chars > config.target_size
        {
            let overlap = trailing_words(&current, config.overlap_size);
            chunks.push(std::mem::take(&mut current));

            if overlap.is_empty() {
                current = sentence.to_string();
            } else {
                current = format!("{overlap} {sentence}");
            }
            current_chars = current.chars().count();
        } else if current.is_empty() {
            current = sentence.to_string();
            current_chars = sentence_chars;
        } else {
            current.push(' ');
            current.push_str(sentence);
            current_chars += sentence_chars + 1;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks.retain(|chunk| chunk.chars().count() >= MIN_CHUNK_CHARS);
    chunks
}

/// The trailing whole words of `text` totalling at most `max_chars`
/// characters, joining spaces included. Never cuts mid-word; a first word
/// already longer than the budget yields an empty overlap.
fn trailing_words(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let mut taken = 0;
    let mut chars = 0;

    for word in words.iter().rev() {
        let word_chars = word.chars().count();
        let cost = if taken == 0 { word_chars } else { word_chars + 1 };
        if chars + cost > max_chars {
            break;
        }
        chars += cost;
        taken += 1;
    }

    words[words.len() - taken..].join(" ")
}
