// Online n-gram Markov model for rapbot.
//
// Learns from a never-ending stream of tokenized sentences while keeping
// memory bounded, and generates candidate phrases by random walk.
//
// Architecture:
// - `chain.rs`: `Chain`, the n-gram trie with uniform continuation sampling
// - `model.rs`: `OnlineMarkov`, one active chain plus a FIFO window of
//   retired chains behind a reader/writer lock
// - `gate.rs`: `ReadyGate`, the one-shot readiness signal
//
// No thread is spawned here. The pipeline crate owns the learner and the
// generation workers and shares one `OnlineMarkov` between them.

pub mod chain;
pub mod gate;
pub mod model;

pub use chain::Chain;
pub use gate::{GateClosed, ReadyGate};
pub use model::{GenerateError, MAX_NGRAM, MarkovParams, OnlineMarkov, ParamsError};
