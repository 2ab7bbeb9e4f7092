// Bounded store of finished lyrics, used to answer replies.
//
// Lyrics are kept newest-last in a `VecDeque`; pushing past capacity drops
// the oldest. A reply seed is matched against each stored lyric's first
// line and the best-rhyming lyric is handed out (and removed, so the same
// lyric is never used twice). Ties go to the newest lyric.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use rapbot_lang::{Lyric, MoraeWeight, Phrase};

#[derive(Debug)]
pub struct LyricHistory {
    capacity: usize,
    lyrics: Mutex<VecDeque<Lyric>>,
}

impl LyricHistory {
    pub fn new(capacity: usize) -> Self {
        LyricHistory {
            capacity,
            lyrics: Mutex::new(VecDeque::new()),
        }
    }

    /// Store a lyric as the newest entry. Returns the entry evicted to make
    /// room, if any.
    pub fn push(&self, lyric: Lyric) -> Option<Lyric> {
        let mut lyrics = self.lyrics.lock().unwrap_or_else(PoisonError::into_inner);
        lyrics.push_back(lyric);
        if lyrics.len() > self.capacity {
            lyrics.pop_front()
        } else {
            None
        }
    }

    /// Remove and return the most recently pushed lyric.
    pub fn pop_newest(&self) -> Option<Lyric> {
        self.lyrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_back()
    }

    /// Remove and return the lyric whose first line rhymes best with `seed`.
    pub fn most_rhyme_compatible(&self, seed: &Phrase, weights: &MoraeWeight) -> Option<Lyric> {
        let seed_morae = seed.morae();
        let mut lyrics = self.lyrics.lock().unwrap_or_else(PoisonError::into_inner);

        let mut best: Option<(usize, f64)> = None;
        for (i, lyric) in lyrics.iter().enumerate().rev() {
            let score = lyric
                .first_line()
                .map_or(0.0, |first| weights.similarity(&seed_morae, &first.morae()));
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        lyrics.remove(best?.0)
    }

    pub fn len(&self) -> usize {
        self.lyrics.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
