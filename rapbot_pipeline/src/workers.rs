// Generation worker pool.
//
// Each worker parks on the model's readiness gate, then loops forever:
// pick the next target length from `phrase_lengths` (workers start at
// different offsets so the mix of lengths stays even), call
// `OnlineMarkov::generate`, and push any phrase into the candidate queue.
// Failed generations are dropped; the worker simply tries again.
//
// The candidate queue is bounded, so a worker blocks on push once the
// assemblers fall behind. Every blocking point (gate, push) is released by
// the pipeline's stop sequence: closing the model's gate and the queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};

use rapbot_lang::Phrase;
use rapbot_markov::OnlineMarkov;

use crate::config::GenerationConfig;
use crate::queue::BoundedQueue;

/// Spawn `config.worker_count()` generation workers.
pub fn spawn_generators(
    model: &Arc<OnlineMarkov>,
    candidates: &Arc<BoundedQueue<Phrase>>,
    config: &GenerationConfig,
    keep_running: &Arc<AtomicBool>,
) -> std::io::Result<Vec<JoinHandle<()>>> {
    (0..config.worker_count())
        .map(|id| {
            let worker = Worker {
                id,
                model: Arc::clone(model),
                candidates: Arc::clone(candidates),
                lengths: config.phrase_lengths.clone(),
                max_tries: config.max_tries,
                keep_running: Arc::clone(keep_running),
            };
            thread::Builder::new()
                .name(format!("rapbot-gen-{id}"))
                .spawn(move || worker.run())
        })
        .collect()
}

struct Worker {
    id: usize,
    model: Arc<OnlineMarkov>,
    candidates: Arc<BoundedQueue<Phrase>>,
    lengths: Vec<usize>,
    max_tries: usize,
    keep_running: Arc<AtomicBool>,
}

impl Worker {
    fn run(self) {
        if self.model.wait_ready().is_err() {
            debug!(worker = self.id, "stopped before the model was ready");
            return;
        }
        debug!(worker = self.id, "generation worker started");

        let mut rng = rand::rng();
        let mut produced: u64 = 0;
        for &target_len in self.lengths.iter().cycle().skip(self.id) {
            if !self.keep_running.load(Ordering::SeqCst) {
                break;
            }
            match self.model.generate(target_len, self.max_tries, &mut rng) {
                Ok(phrase) => {
                    if self.candidates.push(phrase).is_err() {
                        break;
                    }
                    produced += 1;
                }
                Err(e) => trace!(worker = self.id, error = %e, "no candidate"),
            }
        }
        debug!(worker = self.id, produced, "generation worker stopped");
    }
}
