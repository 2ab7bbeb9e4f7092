// Japanese lexical units and rhyme scoring for rapbot.
//
// Everything the generator knows about language lives here; the Markov
// model, the lyric assembler, and the pipeline only see these types.
//
// Architecture:
// - `morph.rs`: `Morph` (one tokenizer output row), `Token` (morph or
//   sequence sentinel), `Phrase` (one candidate line), `Lyric` (accepted lines)
// - `mora.rs`: katakana-to-mora decomposition table
// - `rhyme.rs`: `MoraeWeight`, the position-weighted end-aligned similarity
// - `mecab.rs`: reader for MeCab/IPADIC output, one `Vec<Morph>` per sentence
//
// Morphological analysis itself is external. This crate consumes already
// tokenized text and never shells out to a tokenizer.

pub mod mecab;
pub mod mora;
pub mod morph;
pub mod rhyme;

// Re-export key types at crate root for convenience.
pub use mecab::{MecabError, MecabSentences, parse_mecab_str};
pub use mora::{Mora, decompose};
pub use morph::{Lyric, Morph, Phrase, Token};
pub use rhyme::{MoraWeight, MoraeWeight, WeightError};
