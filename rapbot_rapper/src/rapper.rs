// Lyric assembler.
//
// A lyric is built line by line from a stream of candidate phrases. The
// first candidate pulled becomes the seed line as-is. Every following line
// must:
// - pass the tail grammar filter (`grammar.rs`),
// - have at least one mora to rhyme with,
// - score at least `threshold` against the previous accepted line,
// - end in a different character than the previous line.
//
// Each line has `try_budget` pulls. Every pull spends one, whether or not
// the candidate was well-formed. When a line's budget runs out the whole
// lyric is thrown away and `assemble` starts over from a fresh seed; there
// is no backtracking to earlier lines.
//
// The candidate source is a plain `FnMut() -> Option<Phrase>`, so the
// pipeline can feed it from a blocking queue and tests from a `Vec`.
// `None` means the source is closed and assembly stops.

use serde::{Deserialize, Serialize};
use tracing::debug;

use rapbot_lang::{Lyric, MoraWeight, MoraeWeight, Phrase, WeightError};

use crate::grammar::tail_rejection;

/// Assembler tuning. Weights run from the farthest-from-end position to
/// the final mora.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RapperParams {
    pub weights: Vec<MoraWeight>,
    /// Minimum rhyme distance to the previous line, in `[0, 1]`.
    pub threshold: f64,
    /// Candidate pulls allowed per line.
    pub try_budget: usize,
    /// One assembler runs per entry; each entry is that assembler's line count.
    pub line_counts: Vec<usize>,
}

impl Default for RapperParams {
    fn default() -> Self {
        RapperParams {
            weights: vec![
                MoraWeight::new(5.0, 10.0),
                MoraWeight::new(5.0, 15.0),
                MoraWeight::new(10.0, 20.0),
                MoraWeight::new(20.0, 50.0),
            ],
            threshold: 0.8,
            try_budget: 100,
            line_counts: vec![2, 3, 3, 4, 4],
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RapperError {
    #[error("invalid rhyme weights: {0}")]
    Weights(#[from] WeightError),
    #[error("rhyme threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),
    #[error("per-line try budget must be positive")]
    ZeroTryBudget,
    #[error("at least one lyric line count is required")]
    NoLineCounts,
    #[error("lyric line counts must be positive")]
    ZeroLineCount,
}

/// Why `try_assemble` gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("candidate source closed")]
    SourceClosed,
    /// `line` is the zero-based index of the line that could not be filled.
    #[error("try budget exhausted on line {line}")]
    BudgetExhausted { line: usize },
}

#[derive(Debug, Clone)]
pub struct Rapper {
    weights: MoraeWeight,
    threshold: f64,
    try_budget: usize,
}

impl Rapper {
    pub fn new(params: &RapperParams) -> Result<Self, RapperError> {
        let weights = MoraeWeight::new(params.weights.clone())?;
        if !(0.0..=1.0).contains(&params.threshold) {
            return Err(RapperError::InvalidThreshold(params.threshold));
        }
        if params.try_budget == 0 {
            return Err(RapperError::ZeroTryBudget);
        }
        if params.line_counts.is_empty() {
            return Err(RapperError::NoLineCounts);
        }
        if params.line_counts.contains(&0) {
            return Err(RapperError::ZeroLineCount);
        }
        Ok(Rapper {
            weights,
            threshold: params.threshold,
            try_budget: params.try_budget,
        })
    }

    pub fn weights(&self) -> &MoraeWeight {
        &self.weights
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Rhyme distance between two lines.
    pub fn distance(&self, a: &Phrase, b: &Phrase) -> f64 {
        self.weights.distance(a, b)
    }

    /// Whether `candidate` may follow `previous` in a lyric.
    pub fn is_appendable(&self, previous: &Phrase, candidate: &Phrase) -> bool {
        if self.distance(previous, candidate) < self.threshold {
            return false;
        }
        matches!(
            (previous.last_char(), candidate.last_char()),
            (Some(a), Some(b)) if a != b
        )
    }

    /// Make one attempt at a `lines`-line lyric.
    pub fn try_assemble<F>(&self, lines: usize, mut next: F) -> Result<Lyric, AssemblyError>
    where
        F: FnMut() -> Option<Phrase>,
    {
        let seed = next().ok_or(AssemblyError::SourceClosed)?;
        let mut accepted = vec![seed];

        while accepted.len() < lines {
            let line = accepted.len();
            let previous = &accepted[line - 1];
            let mut found = None;

            for _ in 0..self.try_budget {
                let candidate = next().ok_or(AssemblyError::SourceClosed)?;
                if let Some(reason) = tail_rejection(&candidate) {
                    debug!(line, ?reason, candidate = %candidate, "rejected unfinished line");
                    continue;
                }
                if candidate.morae().is_empty() {
                    debug!(line, candidate = %candidate, "rejected unpronounceable line");
                    continue;
                }
                if self.is_appendable(previous, &candidate) {
                    found = Some(candidate);
                    break;
                }
            }

            match found {
                Some(candidate) => accepted.push(candidate),
                None => return Err(AssemblyError::BudgetExhausted { line }),
            }
        }
        Ok(Lyric::new(accepted))
    }

    /// Keep attempting until a lyric is finished. `None` once the source closes.
    pub fn assemble<F>(&self, lines: usize, mut next: F) -> Option<Lyric>
    where
        F: FnMut() -> Option<Phrase>,
    {
        loop {
            match self.try_assemble(lines, &mut next) {
                Ok(lyric) => return Some(lyric),
                Err(AssemblyError::SourceClosed) => return None,
                Err(AssemblyError::BudgetExhausted { line }) => {
                    debug!(lines, line, "lyric abandoned, restarting from a new seed");
                }
            }
        }
    }
}
