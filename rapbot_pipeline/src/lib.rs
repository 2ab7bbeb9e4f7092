// rapbot_pipeline: the running rap bot.
//
// Wires the language, model, and assembler crates into a concurrent
// pipeline: sentences in, rhyming lyrics out. The surrounding application
// (feed client, CLI) talks to it only through `PipelineHandle`.
//
// Module overview:
// - `config.rs`:  `RapbotConfig`, the JSON-loaded tuning for every stage.
// - `queue.rs`:   `BoundedQueue`, the blocking, closeable hand-off between
//                 stages; its bound is the pipeline's backpressure.
// - `buffer.rs`:  `LyricBuffer`, freshness-first store of finished lyrics.
// - `workers.rs`: generation worker pool feeding the candidate queue.
// - `server.rs`:  `start_pipeline` and `PipelineHandle`: spawns the learner,
//                 workers, and assemblers, and stops them all.
//
// The `rapbot` binary (`main.rs`) learns a MeCab-format corpus and prints
// lyrics and replies.

pub mod buffer;
pub mod config;
pub mod queue;
pub mod server;
pub mod workers;

pub use config::{ConfigError, RapbotConfig};
pub use server::{PipelineError, PipelineHandle, start_pipeline};
