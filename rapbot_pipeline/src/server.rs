// Pipeline wiring: learner, generation workers, assemblers, buffer, history.
//
// Architecture: thread-per-stage, connected by bounded queues.
//
// - **Learner thread** (exactly one): pops tokenized sentences from the
//   sentence queue and calls `OnlineMarkov::learn`. Being the only caller
//   of `learn` is what makes the model single-writer.
// - **Generation workers** (`workers.rs`): wait for readiness, then fill
//   the candidate queue with generated phrases.
// - **Assembler threads** (one per entry in `rapper.line_counts`): pull
//   candidates through `Rapper::assemble` and push finished lyrics into
//   the `LyricBuffer`. Lyrics the buffer evicts move into the
//   `LyricHistory`, where replies can still find them.
//
// The caller drives the pipeline through `PipelineHandle`: feeding
// sentences, taking fresh lyrics, and asking for replies.
//
// Shutdown: `stop` clears the `keep_running` flag, closes the readiness
// gate and every queue (which wakes every blocked thread), and joins all
// threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use rapbot_lang::{Lyric, Morph, Phrase, Token};
use rapbot_markov::OnlineMarkov;
use rapbot_rapper::{LyricHistory, Rapper};

use crate::buffer::LyricBuffer;
use crate::config::{ConfigError, RapbotConfig};
use crate::queue::{BoundedQueue, TryPushError};
use crate::workers::spawn_generators;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn pipeline thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Handle returned by `start_pipeline` to feed and drain the running pipeline.
pub struct PipelineHandle {
    model: Arc<OnlineMarkov>,
    rapper: Rapper,
    sentences: Arc<BoundedQueue<Vec<Token>>>,
    candidates: Arc<BoundedQueue<Phrase>>,
    buffer: Arc<LyricBuffer>,
    history: Arc<LyricHistory>,
    keep_running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

/// Validate `config` and start every pipeline thread.
pub fn start_pipeline(config: RapbotConfig) -> Result<PipelineHandle, PipelineError> {
    config.validate()?;
    let model = Arc::new(OnlineMarkov::new(config.markov.clone()).map_err(ConfigError::from)?);
    let rapper = Rapper::new(&config.rapper).map_err(ConfigError::from)?;

    let sentences = Arc::new(BoundedQueue::new(config.sentence_queue_capacity));
    let candidates = Arc::new(BoundedQueue::new(config.generation.queue_capacity));
    let buffer = Arc::new(LyricBuffer::new(config.buffer_depth));
    let history = Arc::new(LyricHistory::new(config.history_capacity));
    let keep_running = Arc::new(AtomicBool::new(true));

    let mut threads = Vec::new();

    let learner = {
        let model = Arc::clone(&model);
        let sentences = Arc::clone(&sentences);
        let keep_running = Arc::clone(&keep_running);
        thread::Builder::new()
            .name("rapbot-learn".into())
            .spawn(move || run_learner(&model, &sentences, &keep_running))?
    };
    threads.push(learner);

    threads.extend(spawn_generators(
        &model,
        &candidates,
        &config.generation,
        &keep_running,
    )?);

    for (i, &lines) in config.rapper.line_counts.iter().enumerate() {
        let rapper = rapper.clone();
        let candidates = Arc::clone(&candidates);
        let buffer = Arc::clone(&buffer);
        let history = Arc::clone(&history);
        let keep_running = Arc::clone(&keep_running);
        let assembler = thread::Builder::new()
            .name(format!("rapbot-rap-{i}"))
            .spawn(move || {
                run_assembler(&rapper, lines, &candidates, &buffer, &history, &keep_running)
            })?;
        threads.push(assembler);
    }

    info!(
        threads = threads.len(),
        ngram = config.markov.ngram,
        generations = config.markov.generations,
        "pipeline started"
    );

    Ok(PipelineHandle {
        model,
        rapper,
        sentences,
        candidates,
        buffer,
        history,
        keep_running,
        threads,
    })
}

fn run_learner(
    model: &OnlineMarkov,
    sentences: &BoundedQueue<Vec<Token>>,
    keep_running: &AtomicBool,
) {
    let mut learned: u64 = 0;
    while keep_running.load(Ordering::SeqCst) {
        let Some(sentence) = sentences.pop() else {
            break;
        };
        if model.learn(&sentence) > 0 {
            learned += 1;
        }
    }
    debug!(learned, "learner stopped");
}

fn run_assembler(
    rapper: &Rapper,
    lines: usize,
    candidates: &BoundedQueue<Phrase>,
    buffer: &LyricBuffer,
    history: &LyricHistory,
    keep_running: &AtomicBool,
) {
    let next = || {
        if keep_running.load(Ordering::SeqCst) {
            candidates.pop()
        } else {
            None
        }
    };
    while let Some(lyric) = rapper.assemble(lines, &next) {
        info!(lines, lyric = %lyric.to_string().replace('\n', " / "), "lyric assembled");
        if let Some(evicted) = buffer.push(lyric) {
            history.push(evicted);
        }
    }
    debug!(lines, "assembler stopped");
}

impl PipelineHandle {
    /// Queue a tokenized sentence for learning, blocking while the queue
    /// is full. Returns `false` if the pipeline is stopping.
    pub fn learn_sentence(&self, sentence: Vec<Morph>) -> bool {
        self.sentences.push(into_tokens(sentence)).is_ok()
    }

    /// Queue a sentence for learning without blocking. The sentence is
    /// dropped (and `false` returned) when the queue is full.
    pub fn offer_sentence(&self, sentence: Vec<Morph>) -> bool {
        match self.sentences.try_push(into_tokens(sentence)) {
            Ok(()) => true,
            Err(TryPushError::Full(_)) => {
                debug!("sentence queue full, dropping sentence");
                false
            }
            Err(TryPushError::Closed(_)) => false,
        }
    }

    /// Freshest lyric, blocking until one is assembled.
    pub fn next_lyric(&self) -> Option<Lyric> {
        self.buffer.take()
    }

    pub fn next_lyric_timeout(&self, timeout: Duration) -> Option<Lyric> {
        self.buffer.take_timeout(timeout)
    }

    /// A lyric answering `seed`: the stored lyric that rhymes best with it,
    /// or else the freshest buffered lyric. Never blocks.
    pub fn reply(&self, seed: &Phrase) -> Option<Lyric> {
        self.history
            .most_rhyme_compatible(seed, self.rapper.weights())
            .or_else(|| self.buffer.try_take())
    }

    /// Rhyme distance between two phrases under the configured weights.
    pub fn distance(&self, a: &Phrase, b: &Phrase) -> f64 {
        self.rapper.distance(a, b)
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_ready()
    }

    /// `true` once the model is ready; `false` on timeout.
    pub fn wait_ready_timeout(&self, timeout: Duration) -> bool {
        self.model.wait_ready_timeout(timeout).unwrap_or(false)
    }

    /// Signal every stage to stop and wait for all threads to exit.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        self.model.close();
        self.sentences.close();
        self.candidates.close();
        self.buffer.close();
        let panicked = join_all(self.threads);
        info!(panicked, "pipeline stopped");
    }
}

/// Join every thread, logging each one that panicked. Returns how many did.
fn join_all(threads: Vec<JoinHandle<()>>) -> usize {
    let mut panicked = 0;
    for handle in threads {
        let name = handle.thread().name().unwrap_or("unnamed").to_owned();
        if handle.join().is_err() {
            warn!(thread = %name, "pipeline thread panicked");
            panicked += 1;
        }
    }
    panicked
}

fn into_tokens(sentence: Vec<Morph>) -> Vec<Token> {
    sentence.into_iter().map(Token::from).collect()
}
