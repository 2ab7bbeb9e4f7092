// Lyric assembly for rapbot.
//
// Turns a stream of generated candidate phrases into finished, rhyming,
// multi-line lyrics, and keeps recent lyrics around for replies.
//
// Architecture:
// - `grammar.rs`: rejects lines whose final morph leaves the clause open
// - `rapper.rs`: `Rapper`, the rhyme-constrained assembler, and its params
// - `history.rs`: `LyricHistory`, bounded store with best-rhyme lookup
//
// Nothing here blocks or spawns threads except through the candidate
// source closure the caller passes in.

pub mod grammar;
pub mod history;
pub mod rapper;

pub use grammar::{TailRejection, is_well_formed};
pub use history::LyricHistory;
pub use rapper::{AssemblyError, Rapper, RapperError, RapperParams};
