//! Timed caption groups carried by caption overlays.
//!
//! All times are milliseconds relative to the owning overlay's `from`, so a
//! caption overlay can be moved along the timeline without touching them.
//! Splitting is the one edit that has to rewrite them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionWord {
    pub word: String,
    pub start_ms: f64,
    pub end_ms: f64,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

fn full_confidence() -> f32 { 1.0 }

impl CaptionWord {
    pub fn new(word: impl Into<String>, start_ms: f64, end_ms: f64) -> Self {
        Self { word: word.into(), start_ms, end_ms, confidence: 1.0 }
    }

    pub fn duration_ms(&self) -> f64 { self.end_ms - self.start_ms }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub text: String,
    pub start_ms: f64,
    pub end_ms: f64,
    pub words: Vec<CaptionWord>,
}

impl Caption {
    /// Build a caption whose text and bounds come from its words.
    pub fn from_words(words: Vec<CaptionWord>) -> Self {
        let start_ms = words.first().map(|w| w.start_ms).unwrap_or(0.0);
        let end_ms = words.iter().map(|w| w.end_ms).fold(start_ms, f64::max);
        Self { text: join_words(&words), start_ms, end_ms, words }
    }
}

pub(crate) fn join_words(words: &[CaptionWord]) -> String {
    words.iter().map(|w| w.word.as_str()).collect::<Vec<_>>().join(" ")
}

/// Divide caption groups at `split_ms`.
///
/// A word belongs to the half it starts in. Words kept on the left have their
/// end clamped to the boundary; words moved right are shifted so the boundary
/// becomes zero. A zero-length word sitting exactly on the boundary is
/// dropped; zero-length words elsewhere are kept. A caption that ends up with
/// no words is dropped too. Caption text is rebuilt from the
/// surviving words.
pub fn split_captions(captions: &[Caption], split_ms: f64) -> (Vec<Caption>, Vec<Caption>) {
    let mut left = Vec::new();
    let mut right = Vec::new();

    for caption in captions {
        let head: Vec<CaptionWord> = caption
            .words
            .iter()
            .filter(|w| w.start_ms < split_ms)
            .map(|w| CaptionWord { end_ms: w.end_ms.min(split_ms), ..w.clone() })
            .collect();

        let tail: Vec<CaptionWord> = caption
            .words
            .iter()
            .filter(|w| w.start_ms >= split_ms && !collapses_at(w, split_ms))
            .map(|w| CaptionWord { start_ms: w.start_ms - split_ms, end_ms: w.end_ms - split_ms, ..w.clone() })
            .collect();

        if !head.is_empty() {
            left.push(Caption {
                text: join_words(&head),
                start_ms: caption.start_ms,
                end_ms: caption.end_ms.min(split_ms),
                words: head,
            });
        }
        if !tail.is_empty() {
            right.push(Caption {
                text: join_words(&tail),
                start_ms: (caption.start_ms - split_ms).max(0.0),
                end_ms: caption.end_ms - split_ms,
                words: tail,
            });
        }
    }

    (left, right)
}

/// True for a word with no duration that starts on the cut.
pub fn collapses_at(word: &CaptionWord, split_ms: f64) -> bool {
    word.start_ms == split_ms && word.duration_ms() <= 0.0
}
