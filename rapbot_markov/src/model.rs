// Online Markov model with a sliding window of generations.
//
// The model learns forever in bounded memory. New n-grams go into one
// mutable "active" chain. When the active chain has taken
// `generation_capacity` insertions it is sealed: moved to the back of the
// retired window (dropping the oldest retired chain if the window already
// holds `generations` chains) and replaced by a fresh empty chain.
//
// Generation queries every live chain (active plus retired) at every step
// and picks uniformly among the chains that had a continuation. Retired
// generations therefore keep contributing vocabulary after the active
// chain moves on.
//
// Readiness: the gate fires the first time the retired window is full and
// never un-fires, even as generations rotate out.
//
// Concurrency: one `RwLock` guards all live chains. `learn` takes the write
// lock and must be called from a single writer (the pipeline funnels all
// learning through one thread). `generate` takes the read lock for the
// whole call, so any number of workers generate concurrently and never
// observe a chain mid-insert or mid-seal.

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rapbot_lang::{Phrase, Token};

use crate::chain::Chain;
use crate::gate::{GateClosed, ReadyGate};

/// Largest accepted n-gram order.
pub const MAX_NGRAM: usize = 16;

/// Model sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkovParams {
    /// N-gram order. Contexts are `ngram - 1` tokens long.
    pub ngram: usize,
    /// Insertions per generation before the active chain is sealed.
    pub generation_capacity: usize,
    /// Number of retired generations kept.
    pub generations: usize,
}

impl Default for MarkovParams {
    fn default() -> Self {
        MarkovParams {
            ngram: 3,
            generation_capacity: 10_000,
            generations: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    #[error("n-gram order must be at least 2, got {0}")]
    NgramTooSmall(usize),
    #[error("n-gram order must be at most {max}, got {0}", max = MAX_NGRAM)]
    NgramTooLarge(usize),
    #[error("generation capacity must be positive")]
    ZeroCapacity,
    #[error("generation window must hold at least one generation")]
    ZeroGenerations,
}

impl MarkovParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.ngram < 2 {
            return Err(ParamsError::NgramTooSmall(self.ngram));
        }
        if self.ngram > MAX_NGRAM {
            return Err(ParamsError::NgramTooLarge(self.ngram));
        }
        if self.generation_capacity == 0 {
            return Err(ParamsError::ZeroCapacity);
        }
        if self.generations == 0 {
            return Err(ParamsError::ZeroGenerations);
        }
        Ok(())
    }
}

/// Why `generate` produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("no live generation continues the context after {produced} words")]
    DeadEnd { produced: usize },
    #[error("no non-empty phrase after {tries} tries")]
    Exhausted { tries: usize },
}

#[derive(Debug, Default)]
struct Stores {
    active: Chain,
    retired: VecDeque<Chain>,
}

impl Stores {
    fn live(&self) -> impl Iterator<Item = &Chain> {
        std::iter::once(&self.active).chain(self.retired.iter())
    }
}

#[derive(Debug)]
pub struct OnlineMarkov {
    params: MarkovParams,
    gate: ReadyGate,
    stores: RwLock<Stores>,
}

impl OnlineMarkov {
    pub fn new(params: MarkovParams) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(OnlineMarkov {
            stores: RwLock::new(Stores {
                active: Chain::new(),
                retired: VecDeque::new(),
            }),
            params,
            gate: ReadyGate::new(),
        })
    }

    pub fn params(&self) -> &MarkovParams {
        &self.params
    }

    /// Learn one sentence. Returns the number of n-grams inserted.
    ///
    /// Sentinels in `sentence` are ignored; the words are re-framed with
    /// `ngram - 1` begin sentinels and one end sentinel, so a sentence of
    /// `w` words inserts `w + 1` n-grams. A sentence with no words is a
    /// no-op. Callers must serialize calls to `learn`.
    pub fn learn(&self, sentence: &[Token]) -> usize {
        let context_len = self.params.ngram - 1;
        let words = sentence.iter().filter(|t| !t.is_sentinel());
        let mut framed: Vec<Token> = Vec::with_capacity(sentence.len() + context_len + 1);
        framed.extend(std::iter::repeat_n(Token::Begin, context_len));
        framed.extend(words.cloned());
        if framed.len() == context_len {
            return 0;
        }
        framed.push(Token::End);

        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        let mut inserted = 0;
        for window in framed.windows(self.params.ngram) {
            stores.active.insert(window);
            inserted += 1;
        }

        if stores.active.insertions() >= self.params.generation_capacity {
            self.seal(&mut stores);
        }
        inserted
    }

    fn seal(&self, stores: &mut Stores) {
        let sealed = std::mem::take(&mut stores.active);
        let insertions = sealed.insertions();
        let evicted = if stores.retired.len() >= self.params.generations {
            stores.retired.pop_front().is_some()
        } else {
            false
        };
        stores.retired.push_back(sealed);
        info!(
            insertions,
            evicted,
            retired = stores.retired.len(),
            "sealed markov generation"
        );

        if stores.retired.len() == self.params.generations && self.gate.fire() {
            info!(generations = self.params.generations, "markov model ready");
        }
    }

    /// Generate a phrase of at most `target_len` words.
    ///
    /// Each attempt walks from the begin context until `target_len` words
    /// are produced or an end sentinel is drawn. An attempt that draws the
    /// end sentinel before any word is discarded and retried, up to
    /// `max_tries` attempts. A context no live generation can continue
    /// fails the call immediately.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        target_len: usize,
        max_tries: usize,
        rng: &mut R,
    ) -> Result<Phrase, GenerateError> {
        let context_len = self.params.ngram - 1;
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);

        for _ in 0..max_tries {
            let mut tokens: Vec<Token> = vec![Token::Begin; context_len];
            let mut words = Vec::new();

            while words.len() < target_len {
                let context = &tokens[tokens.len() - context_len..];
                let candidates: Vec<&Token> = stores
                    .live()
                    .filter_map(|chain| chain.sample_next(context, &mut *rng))
                    .collect();
                if candidates.is_empty() {
                    debug!(produced = words.len(), "generation dead end");
                    return Err(GenerateError::DeadEnd {
                        produced: words.len(),
                    });
                }

                let pick = candidates[rng.random_range(0..candidates.len())];
                let Some(morph) = pick.as_word() else {
                    break;
                };
                words.push(Arc::clone(morph));
                tokens.push(pick.clone());
            }

            if !words.is_empty() {
                return Ok(Phrase::new(words));
            }
        }
        Err(GenerateError::Exhausted { tries: max_tries })
    }

    /// Whether the retired window has ever been full.
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Block until the model is ready, or until `close` is called.
    pub fn wait_ready(&self) -> Result<(), GateClosed> {
        self.gate.wait()
    }

    /// `Ok(false)` if the model is still not ready after `timeout`.
    pub fn wait_ready_timeout(&self, timeout: Duration) -> Result<bool, GateClosed> {
        self.gate.wait_timeout(timeout)
    }

    /// Release every thread blocked in `wait_ready`.
    pub fn close(&self) {
        self.gate.close();
    }

    pub fn retired_len(&self) -> usize {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .retired
            .len()
    }

    /// Insertions into the current active chain.
    pub fn active_insertions(&self) -> usize {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .insertions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rapbot_lang::Morph;
    use std::thread;

    fn word(s: &str) -> Token {
        Token::word(Morph {
            surface: s.into(),
            ..Default::default()
        })
    }

    fn sentence(words: &[&str]) -> Vec<Token> {
        words.iter().map(|w| word(w)).collect()
    }

    fn model(ngram: usize, generation_capacity: usize, generations: usize) -> OnlineMarkov {
        OnlineMarkov::new(MarkovParams {
            ngram,
            generation_capacity,
            generations,
        })
        .unwrap()
    }

    #[test]
    fn params_are_validated() {
        let p = |ngram, generation_capacity, generations| MarkovParams {
            ngram,
            generation_capacity,
            generations,
        };
        assert_eq!(p(1, 1, 1).validate(), Err(ParamsError::NgramTooSmall(1)));
        assert_eq!(
            p(usize::MAX, 1, 1).validate(),
            Err(ParamsError::NgramTooLarge(usize::MAX))
        );
        assert!(p(MAX_NGRAM, 1, 1).validate().is_ok());
        assert_eq!(p(2, 0, 1).validate(), Err(ParamsError::ZeroCapacity));
        assert_eq!(p(2, 1, 0).validate(), Err(ParamsError::ZeroGenerations));
        assert!(MarkovParams::default().validate().is_ok());
        assert!(OnlineMarkov::new(p(0, 1, 1)).is_err());
    }

    #[test]
    fn params_from_partial_json() {
        let p: MarkovParams = serde_json::from_str(r#"{"ngram": 2}"#).unwrap();
        assert_eq!(p.ngram, 2);
        assert_eq!(p.generations, MarkovParams::default().generations);
        assert!(serde_json::from_str::<MarkovParams>(r#"{"order": 2}"#).is_err());
    }

    #[test]
    fn sentence_of_w_words_inserts_w_plus_one() {
        let m = model(3, 1000, 2);
        assert_eq!(m.learn(&sentence(&["a", "b", "c"])), 4);
        assert_eq!(m.active_insertions(), 4);
    }

    #[test]
    fn supplied_sentinels_are_reframed() {
        let m = model(2, 1000, 2);
        let framed = [Token::Begin, word("a"), Token::End];
        assert_eq!(m.learn(&framed), 2);
        assert_eq!(m.learn(&[Token::Begin, Token::End]), 0);
        assert_eq!(m.learn(&[]), 0);
        assert_eq!(m.active_insertions(), 2);
    }

    #[test]
    fn ready_after_window_fills() {
        // One word per sentence = two n-grams, so capacity 2 seals every call.
        let (capacity, window) = (2, 3);
        let m = model(2, capacity, window);
        for i in 0..window {
            assert!(!m.is_ready(), "ready too early at generation {i}");
            m.learn(&sentence(&[&format!("w{i}")]));
        }
        assert!(m.is_ready());
        assert_eq!(m.retired_len(), window);
        assert_eq!(m.active_insertions(), 0);

        for i in 0..5 {
            m.learn(&sentence(&[&format!("x{i}")]));
        }
        assert!(m.is_ready());
        assert_eq!(m.retired_len(), window);
    }

    #[test]
    fn seal_check_runs_once_per_learn() {
        let m = model(2, 2, 4);
        m.learn(&sentence(&["a", "b", "c", "d"]));
        assert_eq!(m.retired_len(), 1);
        assert_eq!(m.active_insertions(), 0);
    }

    #[test]
    fn empty_model_cannot_generate() {
        let m = model(3, 10, 2);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            m.generate(5, 10, &mut rng),
            Err(GenerateError::DeadEnd { produced: 0 })
        );
        assert_eq!(
            m.generate(5, 0, &mut rng),
            Err(GenerateError::Exhausted { tries: 0 })
        );
    }

    #[test]
    fn generates_from_retired_generations() {
        let m = model(3, 1, 1);
        m.learn(&sentence(&["a", "b", "c"]));
        assert!(m.is_ready());
        assert_eq!(m.active_insertions(), 0);

        let mut rng = StdRng::seed_from_u64(3);
        let phrase = m.generate(10, 5, &mut rng).unwrap();
        assert_eq!(phrase.surface(), "abc");

        let short = m.generate(2, 5, &mut rng).unwrap();
        assert_eq!(short.surface(), "ab");
    }

    #[test]
    fn oldest_generation_is_forgotten() {
        let m = model(2, 1, 1);
        m.learn(&sentence(&["old"]));
        m.learn(&sentence(&["new"]));
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            assert_eq!(m.generate(3, 1, &mut rng).unwrap().surface(), "new");
        }
    }

    #[test]
    fn active_and_retired_both_contribute() {
        let m = model(2, 3, 1);
        m.learn(&sentence(&["x"]));
        m.learn(&sentence(&["y"]));
        assert_eq!(m.retired_len(), 1);
        m.learn(&sentence(&["z"]));
        assert_eq!(m.active_insertions(), 2);

        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(m.generate(1, 1, &mut rng).unwrap().surface());
        }
        assert!(
            seen.contains("x") || seen.contains("y"),
            "retired generation unused: {seen:?}"
        );
        assert!(seen.contains("z"), "active generation unused: {seen:?}");
    }

    #[test]
    fn end_before_any_word_exhausts_tries() {
        let m = model(2, 100, 1);
        m.stores
            .write()
            .unwrap()
            .active
            .insert(&[Token::Begin, Token::End]);
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(
            m.generate(4, 3, &mut rng),
            Err(GenerateError::Exhausted { tries: 3 })
        );
    }

    #[test]
    fn waiters_wake_when_ready() {
        let m = Arc::new(model(2, 2, 1));
        let waiter = {
            let m = Arc::clone(&m);
            thread::spawn(move || m.wait_ready())
        };
        m.learn(&sentence(&["a"]));
        assert_eq!(waiter.join().unwrap(), Ok(()));
    }

    #[test]
    fn close_releases_unready_waiters() {
        let m = Arc::new(model(2, 100, 1));
        let waiter = {
            let m = Arc::clone(&m);
            thread::spawn(move || m.wait_ready())
        };
        m.close();
        assert_eq!(waiter.join().unwrap(), Err(GateClosed));
        assert_eq!(m.wait_ready_timeout(Duration::from_millis(1)), Err(GateClosed));
    }

    #[test]
    fn huge_sizes_do_not_preallocate() {
        let m = model(2, 1, usize::MAX);
        m.learn(&sentence(&["a", "b"]));
        assert_eq!(m.retired_len(), 1);
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(m.generate(usize::MAX, 1, &mut rng).unwrap().surface(), "ab");
    }

    #[test]
    fn generation_sees_only_whole_sentences_while_learning() {
        // Each sentence seals a generation, so readers race both inserts
        // and seals. Every sentence is a repeated word, and with bigrams a
        // phrase can only mix words through a chain caught mid-update.
        let m = Arc::new(model(2, 3, 2));
        m.learn(&sentence(&["seed", "seed"]));
        let vocabulary: Vec<String> = (0..200).map(|i| format!("w{i}")).collect();

        let readers: Vec<_> = (0..4)
            .map(|r| {
                let m = Arc::clone(&m);
                thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(r);
                    let mut produced = 0;
                    for _ in 0..2000 {
                        if let Ok(phrase) = m.generate(4, 3, &mut rng) {
                            produced += 1;
                            let first = phrase.morphs()[0].surface.clone();
                            assert!(first == "seed" || first.starts_with('w'), "{phrase}");
                            assert!(
                                phrase.morphs().iter().all(|w| w.surface == first),
                                "mixed phrase {phrase}"
                            );
                        }
                    }
                    produced
                })
            })
            .collect();

        for w in &vocabulary {
            assert_eq!(m.learn(&sentence(&[w.as_str(), w.as_str()])), 3);
        }
        let produced: usize = readers.into_iter().map(|r| r.join().unwrap()).sum();
        assert!(produced > 0);
        assert_eq!(m.retired_len(), 2);
    }
}
