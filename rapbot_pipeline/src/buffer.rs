// Freshness-first lyric buffer between the assemblers and the consumer.
//
// Assemblers produce lyrics in bursts and the consumer (posting, replies)
// takes them in bursts of its own. The buffer is a bounded deque:
// - `push` stores the lyric as the newest entry. Past `depth` entries the
//   oldest is evicted and returned, so a stale lyric never sits here
//   forever; the pipeline moves evicted lyrics into the history.
// - `take` blocks while the buffer is empty and always hands out the
//   newest entry.
//
// `close` wakes blocked takers, which then drain whatever is left.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rapbot_lang::Lyric;

struct State {
    lyrics: VecDeque<Lyric>,
    closed: bool,
}

pub struct LyricBuffer {
    depth: usize,
    state: Mutex<State>,
    available: Condvar,
}

impl LyricBuffer {
    /// `depth` is clamped to at least 1.
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        LyricBuffer {
            depth,
            state: Mutex::new(State {
                lyrics: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `lyric` as the newest entry; returns the oldest entry if the
    /// buffer overflowed.
    pub fn push(&self, lyric: Lyric) -> Option<Lyric> {
        let mut state = self.lock();
        state.lyrics.push_back(lyric);
        let evicted = if state.lyrics.len() > self.depth {
            state.lyrics.pop_front()
        } else {
            None
        };
        self.available.notify_one();
        evicted
    }

    /// Newest lyric, blocking while empty. `None` once closed and drained.
    pub fn take(&self) -> Option<Lyric> {
        let state = self.lock();
        let mut state = self
            .available
            .wait_while(state, |s| !s.closed && s.lyrics.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        state.lyrics.pop_back()
    }

    /// Like `take`, but gives up after `timeout`.
    pub fn take_timeout(&self, timeout: Duration) -> Option<Lyric> {
        let state = self.lock();
        let (mut state, _) = self
            .available
            .wait_timeout_while(state, timeout, |s| !s.closed && s.lyrics.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        state.lyrics.pop_back()
    }

    /// Newest lyric if one is buffered right now.
    pub fn try_take(&self) -> Option<Lyric> {
        self.lock().lyrics.pop_back()
    }

    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn len(&self) -> usize {
        self.lock().lyrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapbot_lang::{Morph, Phrase};
    use std::sync::Arc;
    use std::thread;

    fn lyric(text: &str) -> Lyric {
        let line: Phrase = vec![Morph {
            surface: text.into(),
            ..Default::default()
        }]
        .into_iter()
        .collect();
        Lyric::new(vec![line])
    }

    #[test]
    fn newest_is_taken_first() {
        let buffer = LyricBuffer::new(3);
        buffer.push(lyric("a"));
        buffer.push(lyric("b"));
        assert_eq!(buffer.take(), Some(lyric("b")));
        assert_eq!(buffer.try_take(), Some(lyric("a")));
        assert_eq!(buffer.try_take(), None);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let buffer = LyricBuffer::new(2);
        assert_eq!(buffer.push(lyric("a")), None);
        assert_eq!(buffer.push(lyric("b")), None);
        assert_eq!(buffer.push(lyric("c")), Some(lyric("a")));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.take(), Some(lyric("c")));
        assert_eq!(buffer.take(), Some(lyric("b")));
    }

    #[test]
    fn take_blocks_until_push() {
        let buffer = Arc::new(LyricBuffer::new(2));
        let taker = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.take())
        };
        thread::sleep(Duration::from_millis(20));
        buffer.push(lyric("late"));
        assert_eq!(taker.join().unwrap(), Some(lyric("late")));
    }

    #[test]
    fn close_releases_takers() {
        let buffer = Arc::new(LyricBuffer::new(2));
        let taker = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.take())
        };
        thread::sleep(Duration::from_millis(20));
        buffer.close();
        assert_eq!(taker.join().unwrap(), None);
    }

    #[test]
    fn take_timeout_on_empty() {
        let buffer = LyricBuffer::new(1);
        assert_eq!(buffer.take_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn huge_depth_is_not_preallocated() {
        let buffer = LyricBuffer::new(usize::MAX);
        assert_eq!(buffer.push(lyric("a")), None);
        assert_eq!(buffer.depth(), usize::MAX);
        assert_eq!(buffer.try_take(), Some(lyric("a")));
    }
}
