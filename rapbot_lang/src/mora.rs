// Mora decomposition of katakana pronunciation strings.
//
// A mora is the (consonant, vowel) pair that rhyme scoring compares. The
// tokenizer hands us a katakana pronunciation per morph (e.g. "オハヨー");
// `decompose` turns it into morae by longest match against a fixed table:
// two-character digraphs (キャ, ティ, ...) are tried before single kana, and
// the long-vowel mark ー repeats the vowel of the preceding mora.
//
// Special units:
// - ン (moraic nasal) and ッ (geminate) get marker strings ("*n", "*xtu")
//   for both halves so they only ever match themselves.
// - `Mora::DUMMY` stands in for a morph whose pronunciation is empty. It
//   keeps alignment length intact and is skipped by the scorer
//   (see `rhyme.rs`).
//
// Decomposition is all-or-nothing per string: any character that is neither
// in the table nor a long-vowel mark after a mora makes the whole string
// undecomposable.

use std::fmt;

/// The long-vowel mark. Extends the previous mora's vowel.
pub const LONG_VOWEL_MARK: char = 'ー';

/// One phonetic unit: an optional consonant and a vowel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mora {
    /// Consonant part. Empty for a pure vowel.
    pub consonant: &'static str,
    /// Vowel part.
    pub vowel: &'static str,
}

impl Mora {
    /// Placeholder for a unit that could not be read.
    pub const DUMMY: Mora = Mora::new("*", "*");

    pub const fn new(consonant: &'static str, vowel: &'static str) -> Self {
        Mora { consonant, vowel }
    }

    pub fn is_dummy(&self) -> bool {
        *self == Mora::DUMMY
    }
}

impl fmt::Display for Mora {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.consonant, self.vowel)
    }
}

/// Look up a single kana or a two-kana digraph.
pub fn lookup(kana: &str) -> Option<Mora> {
    let mora = match kana {
        "ア" => Mora::new("", "a"),
        "イ" => Mora::new("", "i"),
        "ウ" => Mora::new("", "u"),
        "エ" => Mora::new("", "e"),
        "オ" => Mora::new("", "o"),
        "カ" => Mora::new("k", "a"),
        "キ" => Mora::new("k", "i"),
        "ク" => Mora::new("k", "u"),
        "ケ" => Mora::new("k", "e"),
        "コ" => Mora::new("k", "o"),
        "サ" => Mora::new("s", "a"),
        "シ" => Mora::new("sh", "i"),
        "ス" => Mora::new("s", "u"),
        "セ" => Mora::new("s", "e"),
        "ソ" => Mora::new("s", "o"),
        "タ" => Mora::new("t", "a"),
        "チ" => Mora::new("ch", "i"),
        "ツ" => Mora::new("ts", "u"),
        "テ" => Mora::new("t", "e"),
        "ト" => Mora::new("t", "o"),
        "ナ" => Mora::new("n", "a"),
        "ニ" => Mora::new("n", "i"),
        "ヌ" => Mora::new("n", "u"),
        "ネ" => Mora::new("n", "e"),
        "ノ" => Mora::new("n", "o"),
        "ハ" => Mora::new("h", "a"),
        "ヒ" => Mora::new("h", "i"),
        "フ" => Mora::new("f", "u"),
        "ヘ" => Mora::new("h", "e"),
        "ホ" => Mora::new("h", "o"),
        "マ" => Mora::new("m", "a"),
        "ミ" => Mora::new("m", "i"),
        "ム" => Mora::new("m", "u"),
        "メ" => Mora::new("m", "e"),
        "モ" => Mora::new("m", "o"),
        "ヤ" => Mora::new("y", "a"),
        "ユ" => Mora::new("y", "u"),
        "ヨ" => Mora::new("y", "o"),
        "ラ" => Mora::new("r", "a"),
        "リ" => Mora::new("r", "i"),
        "ル" => Mora::new("r", "u"),
        "レ" => Mora::new("r", "e"),
        "ロ" => Mora::new("r", "o"),
        "ワ" => Mora::new("w", "a"),
        "ヲ" => Mora::new("", "o"),
        "ン" => Mora::new("*n", "*n"),
        "ガ" => Mora::new("g", "a"),
        "ギ" => Mora::new("g", "i"),
        "グ" => Mora::new("g", "u"),
        "ゲ" => Mora::new("g", "e"),
        "ゴ" => Mora::new("g", "o"),
        "ザ" => Mora::new("z", "a"),
        "ジ" => Mora::new("j", "i"),
        "ズ" => Mora::new("z", "u"),
        "ゼ" => Mora::new("z", "e"),
        "ゾ" => Mora::new("z", "o"),
        "ダ" => Mora::new("d", "a"),
        "ヂ" => Mora::new("j", "i"),
        "ヅ" => Mora::new("z", "u"),
        "デ" => Mora::new("d", "e"),
        "ド" => Mora::new("d", "o"),
        "バ" => Mora::new("b", "a"),
        "ビ" => Mora::new("b", "i"),
        "ブ" => Mora::new("b", "u"),
        "ベ" => Mora::new("b", "e"),
        "ボ" => Mora::new("b", "o"),
        "パ" => Mora::new("p", "a"),
        "ピ" => Mora::new("p", "i"),
        "プ" => Mora::new("p", "u"),
        "ペ" => Mora::new("p", "e"),
        "ポ" => Mora::new("p", "o"),
        "キャ" => Mora::new("ky", "a"),
        "キュ" => Mora::new("ky", "u"),
        "キョ" => Mora::new("ky", "o"),
        "シャ" => Mora::new("sh", "a"),
        "シュ" => Mora::new("sh", "u"),
        "ショ" => Mora::new("sh", "o"),
        "チャ" => Mora::new("ch", "a"),
        "チュ" => Mora::new("ch", "u"),
        "チョ" => Mora::new("ch", "o"),
        "ニャ" => Mora::new("ny", "a"),
        "ニュ" => Mora::new("ny", "u"),
        "ニョ" => Mora::new("ny", "o"),
        "ヒャ" => Mora::new("hy", "a"),
        "ヒュ" => Mora::new("hy", "u"),
        "ヒョ" => Mora::new("hy", "o"),
        "ミャ" => Mora::new("my", "a"),
        "ミュ" => Mora::new("my", "u"),
        "ミョ" => Mora::new("my", "o"),
        "リャ" => Mora::new("ry", "a"),
        "リュ" => Mora::new("ry", "u"),
        "リョ" => Mora::new("ry", "o"),
        "ギャ" => Mora::new("gy", "a"),
        "ギュ" => Mora::new("gy", "u"),
        "ギョ" => Mora::new("gy", "o"),
        "ジャ" => Mora::new("j", "a"),
        "ジュ" => Mora::new("j", "u"),
        "ジョ" => Mora::new("j", "o"),
        "ビャ" => Mora::new("by", "a"),
        "ビュ" => Mora::new("by", "u"),
        "ビョ" => Mora::new("by", "o"),
        "ピャ" => Mora::new("py", "a"),
        "ピュ" => Mora::new("py", "u"),
        "ピョ" => Mora::new("py", "o"),
        "ファ" => Mora::new("f", "a"),
        "フィ" => Mora::new("f", "i"),
        "フェ" => Mora::new("f", "e"),
        "フォ" => Mora::new("f", "o"),
        "フュ" => Mora::new("fy", "u"),
        "ウィ" => Mora::new("w", "i"),
        "ウェ" => Mora::new("w", "e"),
        "ウォ" => Mora::new("w", "o"),
        "ヴァ" => Mora::new("v", "a"),
        "ヴィ" => Mora::new("v", "i"),
        "ヴェ" => Mora::new("v", "e"),
        "ヴォ" => Mora::new("v", "o"),
        "ツァ" => Mora::new("ts", "a"),
        "ツィ" => Mora::new("ts", "i"),
        "ツェ" => Mora::new("ts", "e"),
        "ツォ" => Mora::new("ts", "o"),
        "チェ" => Mora::new("ch", "e"),
        "シェ" => Mora::new("sh", "e"),
        "ジェ" => Mora::new("j", "e"),
        "ティ" => Mora::new("t", "i"),
        "ディ" => Mora::new("d", "i"),
        "デュ" => Mora::new("d", "u"),
        "トゥ" => Mora::new("t", "u"),
        "ッ" => Mora::new("*xtu", "*xtu"),
        _ => return None,
    };
    Some(mora)
}

/// Split a pronunciation into the slices each mora was read from.
///
/// Every returned slice is non-empty and the slices concatenate back to
/// the input. Returns `None` under the same conditions as `decompose`.
pub fn split_units(pronunciation: &str) -> Option<Vec<(&str, Mora)>> {
    let mut units = Vec::with_capacity(pronunciation.len() / 3);
    let mut rest = pronunciation;

    while let Some(first) = rest.chars().next() {
        let first_len = first.len_utf8();

        // Digraphs win over single kana.
        if let Some(second) = rest[first_len..].chars().next() {
            let pair_len = first_len + second.len_utf8();
            if let Some(mora) = lookup(&rest[..pair_len]) {
                units.push((&rest[..pair_len], mora));
                rest = &rest[pair_len..];
                continue;
            }
        }

        if let Some(mora) = lookup(&rest[..first_len]) {
            units.push((&rest[..first_len], mora));
        } else if first == LONG_VOWEL_MARK {
            let (_, prev) = units.last()?;
            let extended = Mora::new("", prev.vowel);
            units.push((&rest[..first_len], extended));
        } else {
            return None;
        }
        rest = &rest[first_len..];
    }

    if units.is_empty() { None } else { Some(units) }
}

/// Decompose a katakana pronunciation into morae.
///
/// Returns `None` if any character cannot be read or if the string yields
/// no morae at all (including the empty string).
pub fn decompose(pronunciation: &str) -> Option<Vec<Mora>> {
    split_units(pronunciation).map(|units| units.into_iter().map(|(_, m)| m).collect())
}
