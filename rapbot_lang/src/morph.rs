// Lexical units and the sequences built from them.
//
// The type hierarchy is:
// - `Morph`: one morpheme exactly as the external tokenizer produced it
//   (surface + the nine IPADIC feature columns). Immutable, compared and
//   hashed by every field, so it can key the Markov chain directly.
// - `Token`: a `Morph` or one of the two sequence-boundary sentinels. The
//   sentinels are separate enum variants, so they compare equal only to
//   themselves and can never collide with a real morph.
// - `Phrase`: an ordered run of morphs; one generated candidate line.
// - `Lyric`: an ordered set of accepted phrases; one finished output.
//
// Morphs are shared behind `Arc` once they enter the model: the chain, the
// generated phrases, and the lyrics all point at the same allocation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::mora::{self, Mora};

/// A morpheme with its part-of-speech and phonetic attributes.
///
/// Field order follows the IPADIC feature columns. Missing columns (unknown
/// words often lack reading and pronunciation) are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Morph {
    pub surface: String,
    /// Part of speech (品詞), e.g. "名詞", "助詞".
    pub pos: String,
    /// Part-of-speech sub-tags (品詞細分類1-3).
    pub pos_detail1: String,
    pub pos_detail2: String,
    pub pos_detail3: String,
    /// Conjugation type (活用型), e.g. "五段・ラ行特殊".
    pub conjugation_type: String,
    /// Conjugation form (活用形), e.g. "連用形".
    pub conjugation_form: String,
    /// Dictionary / inflection base form (原形).
    pub base_form: String,
    /// Reading in katakana.
    pub reading: String,
    /// Pronunciation in katakana. Rhyme scoring reads this field.
    pub pronunciation: String,
}

impl Morph {
    /// Morae of this morph's pronunciation, or `None` if undecomposable.
    pub fn morae(&self) -> Option<Vec<Mora>> {
        mora::decompose(&self.pronunciation)
    }
}

impl fmt::Display for Morph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?} {} {} {} {} {} {} {} {} {}]",
            self.surface,
            self.pos,
            self.pos_detail1,
            self.pos_detail2,
            self.pos_detail3,
            self.conjugation_type,
            self.conjugation_form,
            self.base_form,
            self.reading,
            self.pronunciation,
        )
    }
}

/// A chain key: a morph or a sequence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// Start-of-sequence sentinel.
    Begin,
    /// End-of-sequence sentinel.
    End,
    Word(Arc<Morph>),
}

impl Token {
    pub fn word(morph: Morph) -> Self {
        Token::Word(Arc::new(morph))
    }

    /// The wrapped morph, or `None` for a sentinel.
    pub fn as_word(&self) -> Option<&Arc<Morph>> {
        match self {
            Token::Word(m) => Some(m),
            Token::Begin | Token::End => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Token::Word(_))
    }
}

impl From<Morph> for Token {
    fn from(morph: Morph) -> Self {
        Token::word(morph)
    }
}

impl From<Arc<Morph>> for Token {
    fn from(morph: Arc<Morph>) -> Self {
        Token::Word(morph)
    }
}

/// One line of text as a sequence of morphs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Phrase(Vec<Arc<Morph>>);

impl Phrase {
    pub fn new(morphs: Vec<Arc<Morph>>) -> Self {
        Phrase(morphs)
    }

    pub fn morphs(&self) -> &[Arc<Morph>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The final morph, which grammar filters inspect.
    pub fn last(&self) -> Option<&Morph> {
        self.0.last().map(Arc::as_ref)
    }

    /// Concatenated surface text.
    pub fn surface(&self) -> String {
        self.0.iter().map(|m| m.surface.as_str()).collect()
    }

    /// Concatenated pronunciation, or `None` if any morph lacks one.
    pub fn pronunciation(&self) -> Option<String> {
        if self.0.iter().any(|m| m.pronunciation.is_empty()) {
            return None;
        }
        Some(self.0.iter().map(|m| m.pronunciation.as_str()).collect())
    }

    /// Whether every morph decomposes into morae.
    pub fn is_pronounceable(&self) -> bool {
        self.0.iter().all(|m| m.morae().is_some())
    }

    /// Morae of the whole phrase, tolerant of unreadable morphs.
    ///
    /// A morph with an empty pronunciation contributes one `Mora::DUMMY` so
    /// alignment from the phrase end is preserved; a morph whose non-empty
    /// pronunciation cannot be decomposed contributes nothing. An empty
    /// result means the phrase has no usable phonetics at all.
    pub fn morae(&self) -> Vec<Mora> {
        let mut out = Vec::with_capacity(self.0.len() * 2);
        for morph in &self.0 {
            match morph.morae() {
                Some(morae) => out.extend(morae),
                None if morph.pronunciation.is_empty() => out.push(Mora::DUMMY),
                None => {}
            }
        }
        out
    }

    /// Final character of the surface text.
    pub fn last_char(&self) -> Option<char> {
        self.0.iter().rev().find_map(|m| m.surface.chars().next_back())
    }
}

impl FromIterator<Arc<Morph>> for Phrase {
    fn from_iter<I: IntoIterator<Item = Arc<Morph>>>(iter: I) -> Self {
        Phrase(iter.into_iter().collect())
    }
}

impl FromIterator<Morph> for Phrase {
    fn from_iter<I: IntoIterator<Item = Morph>>(iter: I) -> Self {
        Phrase(iter.into_iter().map(Arc::new).collect())
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for morph in &self.0 {
            f.write_str(&morph.surface)?;
        }
        Ok(())
    }
}

/// A finished multi-line lyric. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lyric {
    lines: Vec<Phrase>,
}

impl Lyric {
    pub fn new(lines: Vec<Phrase>) -> Self {
        Lyric { lines }
    }

    pub fn lines(&self) -> &[Phrase] {
        &self.lines
    }

    pub fn first_line(&self) -> Option<&Phrase> {
        self.lines.first()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Newline-joined surface text, ready to post.
impl fmt::Display for Lyric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}
