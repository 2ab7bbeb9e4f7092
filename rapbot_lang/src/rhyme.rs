// Position-weighted, end-aligned phonetic similarity ("rhyme distance").
//
// Two mora sequences are compared from their ends: rhyme lives in the tail
// of a line. Each aligned position has its own (consonant, vowel) weight,
// so the final mora can count for much more than the fourth-from-last.
// The table is itself end-aligned: when fewer positions are compared than
// the table has cells, the *last* cells are used.
//
// The score is normalized against the full weight budget, not just the
// positions actually compared. A two-mora phrase can therefore never reach
// 1.0 against a four-cell table even if both morae match; longer rhyming
// tails score higher. Positions holding `Mora::DUMMY` on either side add
// nothing but still occupy their slot.

use serde::{Deserialize, Serialize};

use crate::mora::Mora;
use crate::morph::Phrase;

/// Weight of one aligned position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct MoraWeight {
    pub consonant: f64,
    pub vowel: f64,
}

impl MoraWeight {
    pub const fn new(consonant: f64, vowel: f64) -> Self {
        MoraWeight { consonant, vowel }
    }
}

impl From<(f64, f64)> for MoraWeight {
    fn from((consonant, vowel): (f64, f64)) -> Self {
        MoraWeight { consonant, vowel }
    }
}

impl From<MoraWeight> for (f64, f64) {
    fn from(w: MoraWeight) -> Self {
        (w.consonant, w.vowel)
    }
}

/// Why a weight table was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightError {
    #[error("weight table is empty")]
    Empty,
    #[error("weight at position {index} is negative or not finite: ({consonant}, {vowel})")]
    InvalidCell {
        index: usize,
        consonant: f64,
        vowel: f64,
    },
    #[error("weights sum to zero")]
    ZeroTotal,
}

/// A validated weight table with its precomputed total.
#[derive(Debug, Clone, PartialEq)]
pub struct MoraeWeight {
    cells: Vec<MoraWeight>,
    total: f64,
}

impl MoraeWeight {
    /// Build a table. Cells are ordered from the farthest-from-end position
    /// to the final position.
    pub fn new(cells: Vec<MoraWeight>) -> Result<Self, WeightError> {
        if cells.is_empty() {
            return Err(WeightError::Empty);
        }
        for (index, cell) in cells.iter().enumerate() {
            let ok = |v: f64| v.is_finite() && v >= 0.0;
            if !ok(cell.consonant) || !ok(cell.vowel) {
                return Err(WeightError::InvalidCell {
                    index,
                    consonant: cell.consonant,
                    vowel: cell.vowel,
                });
            }
        }
        let total: f64 = cells.iter().map(|c| c.consonant + c.vowel).sum();
        if total <= 0.0 {
            return Err(WeightError::ZeroTotal);
        }
        Ok(MoraeWeight { cells, total })
    }

    pub fn cells(&self) -> &[MoraWeight] {
        &self.cells
    }

    /// Sum of every consonant and vowel weight.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Similarity of two mora sequences in `[0, 1]`.
    pub fn similarity(&self, a: &[Mora], b: &[Mora]) -> f64 {
        let k = self.cells.len().min(a.len()).min(b.len());
        if k == 0 {
            return 0.0;
        }

        let weights = &self.cells[self.cells.len() - k..];
        let a = &a[a.len() - k..];
        let b = &b[b.len() - k..];

        let mut sum = 0.0;
        for ((w, x), y) in weights.iter().zip(a).zip(b) {
            if x.is_dummy() || y.is_dummy() {
                continue;
            }
            if x.consonant == y.consonant {
                sum += w.consonant;
            }
            if x.vowel == y.vowel {
                sum += w.vowel;
            }
        }
        sum / self.total
    }

    /// Rhyme distance between two phrases, scored on their phrase-final morae.
    pub fn distance(&self, a: &Phrase, b: &Phrase) -> f64 {
        self.similarity(&a.morae(), &b.morae())
    }
}
