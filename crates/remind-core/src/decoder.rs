//! BIO span decoding.
//!
//! Turns per-token label predictions into contiguous entity spans. A
//! `B-<KIND>` label opens a span, following `I-<KIND>` labels of the same
//! kind extend it. An `I-` label with no open span is outside any entity.

use crate::entity::Entity;
use crate::offset::{char_len, slice_chars};
use crate::tokenizer::is_marker_token;
use crate::vocabulary::LabelSet;

const BEGIN_PREFIX: &str = "B-";
const INSIDE_PREFIX: &str = "I-";

/// Index of the largest value in each row. Empty rows map to 0.
pub fn argmax_rows(logits: &[Vec<f32>]) -> Vec<usize> {
    logits
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold(None::<(usize, f32)>, |best, (idx, &value)| match best {
                    Some((_, best_value)) if best_value >= value => best,
                    _ => Some((idx, value)),
                })
                .map_or(0, |(idx, _)| idx)
        })
        .collect()
}

/// Decodes entity spans from token predictions.
///
/// `tokens`, `predicted` and `char_spans` are parallel; missing entries
/// at the tail are ignored. Prediction indices outside `labels` count as
/// outside any entity.
pub fn decode(
    tokens: &[String],
    predicted: &[usize],
    labels: &LabelSet,
    char_spans: &[(usize, usize)],
    text: &str,
) -> Vec<Entity> {
    let len = tokens.len().min(predicted.len()).min(char_spans.len());
    let text_len = char_len(text);
    let label_at = |i: usize| labels.get(predicted[i]).unwrap_or("O");

    let mut entities = Vec::new();
    let mut i = 0;
    while i < len {
        if is_marker_token(&tokens[i]) {
            i += 1;
            continue;
        }

        let Some(kind) = label_at(i).strip_prefix(BEGIN_PREFIX) else {
            i += 1;
            continue;
        };

        let inside = format!("{INSIDE_PREFIX}{kind}");
        let first = i;
        let mut last = i;
        i += 1;
        while i < len && !is_marker_token(&tokens[i]) && label_at(i) == inside {
            last = i;
            i += 1;
        }

        let start = char_spans[first].0.min(text_len);
        let end = char_spans[last].1.min(text_len);
        if start >= end {
            tracing::debug!(kind, start, end, "dropping empty span");
            continue;
        }

        entities.push(Entity::new(kind, start, end, slice_chars(text, start, end)));
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelSet {
        LabelSet::new(
            ["O", "B-DATE", "I-DATE", "B-TIME", "I-TIME"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn argmax_picks_first_maximum() {
        let logits = vec![vec![0.1, 0.9, 0.2], vec![0.5, 0.5, 0.1], vec![]];
        assert_eq!(argmax_rows(&logits), vec![1, 0, 0]);
    }

    #[test]
    fn decodes_date_and_time_spans() {
        let text = "завтра о 15:30";
        let toks = tokens(&["[CLS]", "завтра", "о", "15:30", "[SEP]", "[PAD]"]);
        let spans = [(0, 0), (0, 6), (7, 8), (9, 14), (14, 14), (0, 0)];
        let predicted = [0, 1, 3, 4, 0, 0];

        let entities = decode(&toks, &predicted, &labels(), &spans, text);
        assert_eq!(
            entities,
            vec![
                Entity::new("DATE", 0, 6, "завтра"),
                Entity::new("TIME", 7, 14, "о 15:30"),
            ]
        );
    }

    #[test]
    fn stray_inside_label_is_outside() {
        let text = "о 15";
        let toks = tokens(&["[CLS]", "о", "15", "[SEP]"]);
        let spans = [(0, 0), (0, 1), (2, 4), (4, 4)];
        let predicted = [0, 4, 4, 0];
        assert!(decode(&toks, &predicted, &labels(), &spans, text).is_empty());
    }

    #[test]
    fn inside_label_of_other_kind_ends_span() {
        let text = "завтра 15";
        let toks = tokens(&["[CLS]", "завтра", "15", "[SEP]"]);
        let spans = [(0, 0), (0, 6), (7, 9), (9, 9)];
        let predicted = [0, 1, 4, 0];
        let entities = decode(&toks, &predicted, &labels(), &spans, text);
        assert_eq!(entities, vec![Entity::new("DATE", 0, 6, "завтра")]);
    }

    #[test]
    fn spans_are_clamped_and_empty_spans_dropped() {
        let text = "abc";
        let toks = tokens(&["[CLS]", "x", "y", "[SEP]"]);
        let spans = [(0, 0), (1, 10), (5, 9), (3, 3)];
        let predicted = [1, 1, 3, 1];
        let entities = decode(&toks, &predicted, &labels(), &spans, text);
        assert_eq!(entities, vec![Entity::new("DATE", 1, 3, "bc")]);
        for entity in &entities {
            assert!(entity.start <= entity.end && entity.end <= text.len());
        }
    }

    #[test]
    fn out_of_range_prediction_is_outside() {
        let toks = tokens(&["[CLS]", "x", "[SEP]"]);
        let spans = [(0, 0), (0, 1), (1, 1)];
        assert!(decode(&toks, &[0, 42, 0], &labels(), &spans, "x").is_empty());
    }
}
