// N-gram trie ("chain store").
//
// A `Chain` records n-grams as paths of `Token`s through nested maps. The
// first n−1 tokens of an n-gram form the context path; the last token is
// recorded as a child of the context's final node, with an empty map under
// it marking the terminal level. Sampling walks a context path and picks
// uniformly among the recorded continuations (duplicates are not
// weighted; a continuation seen once and one seen a thousand times are
// equally likely). Each node keeps its continuations in insertion order
// next to the map, so sampling is an index rather than a map walk.
//
// Chains never delete. The online model seals a full chain and later
// drops it wholesale (see `model.rs`).

use rand::Rng;
use rustc_hash::FxHashMap;

use rapbot_lang::Token;

#[derive(Debug, Default)]
struct Node {
    children: FxHashMap<Token, Node>,
    keys: Vec<Token>,
}

impl Node {
    fn child_mut(&mut self, token: &Token) -> &mut Node {
        if !self.children.contains_key(token) {
            self.keys.push(token.clone());
        }
        self.children.entry(token.clone()).or_default()
    }
}

/// One generation's worth of learned n-grams.
#[derive(Debug, Default)]
pub struct Chain {
    root: Node,
    insertions: usize,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one n-gram. Every call counts toward `insertions`, including
    /// n-grams already present.
    pub fn insert(&mut self, ngram: &[Token]) {
        if ngram.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for token in ngram {
            node = node.child_mut(token);
        }
        self.insertions += 1;
    }

    /// Pick a continuation of `context` uniformly at random.
    ///
    /// Returns `None` if any step of the context path is missing, or if the
    /// path ends at a terminal node.
    pub fn sample_next<R: Rng + ?Sized>(&self, context: &[Token], rng: &mut R) -> Option<&Token> {
        let mut node = &self.root;
        for token in context {
            node = node.children.get(token)?;
        }
        if node.keys.is_empty() {
            return None;
        }
        node.keys.get(rng.random_range(0..node.keys.len()))
    }

    /// Number of `insert` calls so far.
    pub fn insertions(&self) -> usize {
        self.insertions
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}
