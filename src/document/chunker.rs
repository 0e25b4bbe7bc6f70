//! Sentence-aware fixed-size chunking with overlap.
//!
//! Text is split into sentences, then sentences are packed greedily into
//! windows of at most `chunk_size` characters. Each window after the first
//! starts with the trailing sentences of the previous one that fit in
//! `chunk_overlap` characters.

use regex::Regex;

/// Configuration for chunking. Sizes are counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

impl From<&crate::config::ChunkingSettings> for ChunkingConfig {
    fn from(settings: &crate::config::ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

/// Splits text into overlapping sentence windows.
pub struct SentenceChunker {
    config: ChunkingConfig,
    whitespace: Regex,
}

impl SentenceChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            // chunk_size of 0 would never make progress
            config: ChunkingConfig {
                chunk_size: config.chunk_size.max(1),
                chunk_overlap: config.chunk_overlap,
            },
            whitespace: Regex::new(r"\s+").expect("Invalid regex"),
        }
    }

    /// Split text into chunks no longer than `chunk_size` characters.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let normalized = self.whitespace.replace_all(text.trim(), " ");

        let sentences: Vec<String> = split_sentences(&normalized)
            .into_iter()
            .flat_map(|s| split_oversized(&s, self.config.chunk_size))
            .collect();

        self.pack(&sentences)
    }

    fn pack(&self, sentences: &[String]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut i = 0;

        while i < sentences.len() {
            let mut window: Vec<&str> = Vec::new();
            let mut window_len = 0;

            for sentence in &sentences[i..] {
                let addition = char_len(sentence) + usize::from(!window.is_empty());
                if window_len + addition > size && !window.is_empty() {
                    break;
                }
                window.push(sentence);
                window_len += addition;
            }

            chunks.push(window.join(" "));

            if i + window.len() >= sentences.len() {
                break;
            }

            let mut carried = 0;
            let mut carried_len = 0;
            if overlap > 0 {
                for (k, sentence) in window.iter().enumerate().rev() {
                    let separator = usize::from(k + 1 < window.len());
                    let len = char_len(sentence) + separator;
                    if carried_len + len > overlap {
                        break;
                    }
                    carried_len += len;
                    carried += 1;
                }
            }

            i = (i + window.len() - carried).max(i + 1);
        }

        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split normalized text at sentence terminators followed by a space and an
/// uppercase letter. Short capitalized abbreviations ("Dr.") and dotted ones
/// ("e.g.") do not end a sentence.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;

    for i in 0..chars.len() {
        let c = chars[i];
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let next_is_space = chars.get(i + 1).is_some_and(|n| n.is_whitespace());
        let then_upper = chars.get(i + 2).is_some_and(|n| n.is_uppercase());
        if !(next_is_space && then_upper) {
            continue;
        }
        if c == '.' && is_abbreviation(&chars[start..=i]) {
            continue;
        }

        push_trimmed(&mut sentences, &chars[start..=i]);
        start = i + 1;
    }

    if start < chars.len() {
        push_trimmed(&mut sentences, &chars[start..]);
    }

    sentences
}

fn push_trimmed(out: &mut Vec<String>, chars: &[char]) {
    let s: String = chars.iter().collect();
    let s = s.trim();
    if !s.is_empty() {
        out.push(s.to_string());
    }
}

/// `chars` ends with the period under consideration.
fn is_abbreviation(chars: &[char]) -> bool {
    let n = chars.len();
    // "e.g." / "i.e."
    if n >= 4 && chars[n - 3] == '.' && chars[n - 2].is_alphanumeric() && chars[n - 4].is_alphanumeric()
    {
        return true;
    }
    // "Dr." / "Mr." as a whole word
    if n >= 3 && chars[n - 3].is_uppercase() && chars[n - 2].is_lowercase() {
        return n == 3 || !chars[n - 4].is_alphanumeric();
    }
    false
}

/// Break a sentence longer than `max` characters on word boundaries, and
/// single words longer than `max` on character boundaries.
fn split_oversized(sentence: &str, max: usize) -> Vec<String> {
    if char_len(sentence) <= max {
        return vec![sentence.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in sentence.split(' ').filter(|w| !w.is_empty()) {
        let word_len = char_len(word);

        if word_len > max {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let word_chars: Vec<char> = word.chars().collect();
            for part in word_chars.chunks(max) {
                pieces.push(part.iter().collect());
            }
            continue;
        }

        let addition = word_len + usize::from(!current.is_empty());
        if current_len + addition > max {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}
