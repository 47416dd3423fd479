//! Answer-key comparison and scoring.
//!
//! An item counts toward `total` when either side (key or detection) has an
//! answer; it counts toward `score` when both sides agree. Items absent on
//! both sides are excluded from both counts. A length mismatch between key
//! and detections is a hard error — never silently truncated or padded.

use serde::{Deserialize, Serialize};

use crate::layout::CHOICE_LABELS;

/// Ordered per-item choice labels; `None` marks an unkeyed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey {
    entries: Vec<Option<char>>,
}

impl AnswerKey {
    pub fn new(entries: Vec<Option<char>>) -> Self {
        Self { entries }
    }

    /// Parse the compact string form: one label per item, `-` for unkeyed.
    /// `"AB-D"` keys items 1, 2, and 4.
    pub fn parse(s: &str) -> Result<Self, ScoreError> {
        let mut entries = Vec::with_capacity(s.len());
        for (i, c) in s.chars().enumerate() {
            let c = c.to_ascii_uppercase();
            if c == '-' {
                entries.push(None);
            } else if CHOICE_LABELS.contains(&c) {
                entries.push(Some(c));
            } else {
                return Err(ScoreError::InvalidLabel { item: i + 1, got: c });
            }
        }
        Ok(Self { entries })
    }

    /// Compact string form, inverse of [`AnswerKey::parse`].
    pub fn to_compact(&self) -> String {
        self.entries.iter().map(|e| e.unwrap_or('-')).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Option<char>] {
        &self.entries
    }
}

impl From<Vec<Option<char>>> for AnswerKey {
    fn from(entries: Vec<Option<char>>) -> Self {
        Self::new(entries)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// Detections and key disagree on item count; scoring refuses to guess.
    LengthMismatch { expected: usize, got: usize },
    /// Key text contains a character outside `A..F` / `-`.
    InvalidLabel { item: usize, got: char },
}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthMismatch { expected, got } => write!(
                f,
                "answer key has {} items but {} were detected",
                expected, got
            ),
            Self::InvalidLabel { item, got } => {
                write!(f, "invalid choice label '{}' at item {}", got, item)
            }
        }
    }
}

impl std::error::Error for ScoreError {}

/// One row of the per-item breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// 1-based item number.
    pub item: usize,
    #[serde(with = "mark")]
    pub detected: Option<char>,
    #[serde(with = "mark")]
    pub correct: Option<char>,
    pub is_correct: bool,
}

/// Deterministic comparison of one detection sequence against one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: usize,
    pub total: usize,
    pub per_item: Vec<ItemOutcome>,
}

impl ScoreResult {
    /// Rounded percent score; 0 when no items were attempted or keyed.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.score as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// Score detections against the key.
///
/// Output covers every item in order and is never partial; on length
/// mismatch no result is produced at all.
pub fn score(detected: &[Option<char>], key: &AnswerKey) -> Result<ScoreResult, ScoreError> {
    if detected.len() != key.len() {
        return Err(ScoreError::LengthMismatch {
            expected: key.len(),
            got: detected.len(),
        });
    }

    let mut per_item = Vec::with_capacity(key.len());
    let mut correct_count = 0;
    let mut total = 0;

    for (i, (d, k)) in detected.iter().zip(key.entries()).enumerate() {
        let is_correct = matches!((d, k), (Some(d), Some(k)) if d == k);
        if d.is_some() || k.is_some() {
            total += 1;
            if is_correct {
                correct_count += 1;
            }
        }
        per_item.push(ItemOutcome {
            item: i + 1,
            detected: *d,
            correct: *k,
            is_correct,
        });
    }

    Ok(ScoreResult {
        score: correct_count,
        total,
        per_item,
    })
}

/// Serialize a choice mark as its letter, with `"-"` for absent — the form
/// result exports display.
mod mark {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<char>, ser: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(c) => c.to_string().serialize(ser),
            None => "-".serialize(ser),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<char>, D::Error> {
        let s = String::deserialize(de)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some('-'), None) => Ok(None),
            (Some(c), None) => Ok(Some(c)),
            _ => Err(serde::de::Error::custom(format!(
                "expected a single mark character, got '{}'",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_the_reference_example() {
        // numItems=4, key A B C D, detected A B <absent> D.
        let key = AnswerKey::parse("ABCD").expect("valid key");
        let detected = vec![Some('A'), Some('B'), None, Some('D')];
        let result = score(&detected, &key).expect("scored");

        assert_eq!(result.score, 3);
        assert_eq!(result.total, 4);
        assert_eq!(result.per_item.len(), 4);
        assert_eq!(
            result.per_item[2],
            ItemOutcome {
                item: 3,
                detected: None,
                correct: Some('C'),
                is_correct: false,
            }
        );
        assert!(result.per_item[3].is_correct);
        assert_eq!(result.percentage(), 75);
    }

    #[test]
    fn length_mismatch_is_a_hard_error() {
        let key = AnswerKey::new(vec![Some('A'); 50]);
        let detected = vec![Some('A'); 40];
        assert_eq!(
            score(&detected, &key),
            Err(ScoreError::LengthMismatch {
                expected: 50,
                got: 40
            })
        );
    }

    #[test]
    fn absent_on_both_sides_counts_nowhere() {
        let key = AnswerKey::parse("A--B").expect("valid key");
        let detected = vec![Some('A'), None, Some('C'), None];
        let result = score(&detected, &key).expect("scored");

        // Item 2: absent/absent, excluded. Item 3: detected but unkeyed,
        // attempted. Item 4: keyed but undetected, attempted.
        assert_eq!(result.total, 3);
        assert_eq!(result.score, 1);
        assert!(!result.per_item[1].is_correct);
        assert_eq!(result.per_item[1].detected, None);
        assert_eq!(result.per_item[1].correct, None);
    }

    #[test]
    fn score_never_exceeds_total_or_item_count() {
        let key = AnswerKey::parse("ABABAB").expect("valid key");
        let detected = vec![Some('A'), Some('B'), Some('B'), Some('A'), None, Some('B')];
        let result = score(&detected, &key).expect("scored");
        assert!(result.score <= result.total);
        assert!(result.total <= key.len());
        assert_eq!(result.per_item.len(), key.len());
    }

    #[test]
    fn breakdown_preserves_item_order() {
        let key = AnswerKey::parse("CBAD").expect("valid key");
        let detected = vec![Some('C'), Some('A'), Some('A'), Some('D')];
        let result = score(&detected, &key).expect("scored");
        let items: Vec<usize> = result.per_item.iter().map(|o| o.item).collect();
        assert_eq!(items, vec![1, 2, 3, 4]);
    }

    #[test]
    fn key_parsing_round_trips_and_validates() {
        let key = AnswerKey::parse("ab-D").expect("valid key");
        assert_eq!(
            key.entries(),
            &[Some('A'), Some('B'), None, Some('D')]
        );
        assert_eq!(key.to_compact(), "AB-D");

        assert_eq!(
            AnswerKey::parse("AXB"),
            Err(ScoreError::InvalidLabel { item: 2, got: 'X' })
        );
    }

    #[test]
    fn item_outcome_serializes_marks_as_letters_or_dash() {
        let outcome = ItemOutcome {
            item: 3,
            detected: None,
            correct: Some('C'),
            is_correct: false,
        };
        let json = serde_json::to_string(&outcome).expect("serialize");
        assert!(json.contains(r#""detected":"-""#));
        assert!(json.contains(r#""correct":"C""#));

        let back: ItemOutcome = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, outcome);
    }

    #[test]
    fn percentage_handles_empty_total() {
        let result = ScoreResult {
            score: 0,
            total: 0,
            per_item: Vec::new(),
        };
        assert_eq!(result.percentage(), 0);
    }
}
