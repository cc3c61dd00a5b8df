//! Whitespace/chunk tokenizer producing fixed-length model input.
//!
//! Words are split on whitespace. Long words are cut into fixed-size
//! chunks, continuation chunks carry a `##` prefix. The sequence is
//! wrapped in `[CLS]`/`[SEP]` and padded (or truncated) to the maximum
//! length so every [`EncodingResult`] has the same shape.

use serde::Serialize;

use crate::offset::{byte_to_char, char_len};
use crate::vocabulary::Vocabulary;

pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";
pub const CONTINUATION_PREFIX: &str = "##";

/// Default number of positions in an encoding.
pub const DEFAULT_MAX_LENGTH: usize = 128;

/// Words longer than this many characters are chunked.
const LONG_WORD_THRESHOLD: usize = 10;
/// Characters per chunk of a long word.
const CHUNK_SIZE: usize = 6;

// BERT-style ids used when the vocabulary lacks the special token.
const FALLBACK_UNK_ID: i64 = 100;
const FALLBACK_CLS_ID: i64 = 101;
const FALLBACK_SEP_ID: i64 = 102;
const FALLBACK_PAD_ID: i64 = 0;

/// Returns `true` for `[CLS]`, `[SEP]` and `[PAD]`.
pub fn is_marker_token(token: &str) -> bool {
    matches!(token, CLS_TOKEN | SEP_TOKEN | PAD_TOKEN)
}

/// Tokenized model input. All four vectors have the same length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodingResult {
    pub tokens: Vec<String>,
    pub ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    /// Character span `(start, end)` of each token in the input.
    pub char_spans: Vec<(usize, usize)>,
}

impl EncodingResult {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: Vocabulary,
    max_length: usize,
    lowercase: bool,
}

impl Tokenizer {
    pub fn new(vocab: Vocabulary) -> Self {
        Self {
            vocab,
            max_length: DEFAULT_MAX_LENGTH,
            lowercase: false,
        }
    }

    /// Sets the encoding length. Values below 2 are raised to 2 so the
    /// start and end markers always fit.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length.max(2);
        self
    }

    /// Lowercases sub-tokens before the vocabulary lookup.
    #[must_use]
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn encode(&self, text: &str) -> EncodingResult {
        let text_len = char_len(text);
        let mut pieces: Vec<(String, (usize, usize))> = vec![(CLS_TOKEN.to_string(), (0, 0))];

        let mut cursor = 0;
        for word in text.split_whitespace() {
            // Forward search from the previous match; repeated words may
            // land on an earlier occurrence if whitespace is unusual.
            let byte_start = text[cursor..]
                .find(word)
                .map_or(cursor, |found| cursor + found);
            cursor = byte_start + word.len();

            let word_start = byte_to_char(text, byte_start);
            pieces.extend(split_word(word, word_start));
        }

        pieces.push((SEP_TOKEN.to_string(), (text_len, text_len)));

        if pieces.len() > self.max_length {
            pieces.truncate(self.max_length);
            if let Some(last) = pieces.last_mut() {
                *last = (SEP_TOKEN.to_string(), (text_len, text_len));
            }
        }

        let mut encoding = EncodingResult {
            tokens: Vec::with_capacity(self.max_length),
            ids: Vec::with_capacity(self.max_length),
            attention_mask: Vec::with_capacity(self.max_length),
            char_spans: Vec::with_capacity(self.max_length),
        };
        for (token, span) in pieces {
            encoding.ids.push(self.token_id(&token));
            encoding.tokens.push(token);
            encoding.attention_mask.push(1);
            encoding.char_spans.push(span);
        }

        let pad_id = self.special_id(PAD_TOKEN, FALLBACK_PAD_ID);
        while encoding.tokens.len() < self.max_length {
            encoding.tokens.push(PAD_TOKEN.to_string());
            encoding.ids.push(pad_id);
            encoding.attention_mask.push(0);
            encoding.char_spans.push((0, 0));
        }

        encoding
    }

    fn token_id(&self, token: &str) -> i64 {
        match token {
            CLS_TOKEN => self.special_id(CLS_TOKEN, FALLBACK_CLS_ID),
            SEP_TOKEN => self.special_id(SEP_TOKEN, FALLBACK_SEP_ID),
            _ => {
                let lookup = if self.lowercase {
                    self.vocab.get(&token.to_lowercase())
                } else {
                    self.vocab.get(token)
                };
                lookup.unwrap_or_else(|| self.special_id(UNK_TOKEN, FALLBACK_UNK_ID))
            }
        }
    }

    fn special_id(&self, token: &str, fallback: i64) -> i64 {
        self.vocab.get(token).unwrap_or(fallback)
    }
}

/// Splits one word into sub-tokens with absolute character spans.
fn split_word(word: &str, word_start: usize) -> Vec<(String, (usize, usize))> {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() <= LONG_WORD_THRESHOLD {
        return vec![(word.to_string(), (word_start, word_start + chars.len()))];
    }

    chars
        .chunks(CHUNK_SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            let start = word_start + i * CHUNK_SIZE;
            let body: String = chunk.iter().collect();
            let token = if i == 0 {
                body
            } else {
                format!("{CONTINUATION_PREFIX}{body}")
            };
            (token, (start, start + chunk.len()))
        })
        .collect()
}
