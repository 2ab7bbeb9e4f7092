// Reader for MeCab's default (IPADIC) output format.
//
// Each token line is `surface<TAB>f0,f1,...,f8`, where the nine feature
// columns are part of speech, three sub-tags, conjugation type, conjugation
// form, base form, reading, and pronunciation. A line consisting of `EOS`
// ends a sentence. Unknown words often carry only the first seven columns;
// the missing ones become empty strings. Feature values can be quoted
// when they contain commas (`"," ,記号,...`), so splitting is quote-aware.
//
// `MecabSentences` wraps any `BufRead` and yields one `Vec<Morph>` per
// sentence, which is what the learner feeds into the Markov model. Blank
// lines are ignored, and an `EOS` with no preceding tokens yields nothing.

use std::io::BufRead;

use crate::morph::Morph;

/// Sentence terminator line.
pub const EOS: &str = "EOS";

#[derive(Debug, thiserror::Error)]
pub enum MecabError {
    #[error("failed to read tokenizer output: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line_no}: expected `surface<TAB>features`, got {content:?}")]
    MalformedLine { line_no: usize, content: String },
}

/// One parsed output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MecabLine {
    Morph(Morph),
    Eos,
    Blank,
}

/// Parse a single output line. `line_no` is only used for error messages.
pub fn parse_line(line: &str, line_no: usize) -> Result<MecabLine, MecabError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(MecabLine::Blank);
    }
    if line == EOS {
        return Ok(MecabLine::Eos);
    }

    let Some((surface, features)) = line.split_once('\t') else {
        return Err(MecabError::MalformedLine {
            line_no,
            content: line.to_string(),
        });
    };

    let mut cols = split_features(features).into_iter();
    let mut next = || cols.next().unwrap_or_default();
    Ok(MecabLine::Morph(Morph {
        surface: surface.to_string(),
        pos: next(),
        pos_detail1: next(),
        pos_detail2: next(),
        pos_detail3: next(),
        conjugation_type: next(),
        conjugation_form: next(),
        base_form: next(),
        reading: next(),
        pronunciation: next(),
    }))
}

/// Split a feature column list on commas, honoring double quotes.
/// A doubled quote inside a quoted field is a literal quote.
fn split_features(features: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(9);
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = features.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => out.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    out.push(field);
    out
}

/// Iterator over sentences in a MeCab output stream.
pub struct MecabSentences<R> {
    reader: R,
    line_no: usize,
    buf: String,
    done: bool,
}

impl<R: BufRead> MecabSentences<R> {
    pub fn new(reader: R) -> Self {
        MecabSentences {
            reader,
            line_no: 0,
            buf: String::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for MecabSentences<R> {
    type Item = Result<Vec<Morph>, MecabError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut sentence = Vec::new();
        loop {
            self.buf.clear();
            let read = match self.reader.read_line(&mut self.buf) {
                Ok(n) => n,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            if read == 0 {
                self.done = true;
                // A trailing sentence without EOS still counts.
                return (!sentence.is_empty()).then_some(Ok(sentence));
            }
            self.line_no += 1;

            match parse_line(&self.buf, self.line_no) {
                Ok(MecabLine::Morph(m)) => sentence.push(m),
                Ok(MecabLine::Eos) if !sentence.is_empty() => return Some(Ok(sentence)),
                Ok(MecabLine::Eos | MecabLine::Blank) => {}
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Parse a complete MeCab output string into sentences.
pub fn parse_mecab_str(text: &str) -> Result<Vec<Vec<Morph>>, MecabError> {
    MecabSentences::new(text.as_bytes()).collect()
}
