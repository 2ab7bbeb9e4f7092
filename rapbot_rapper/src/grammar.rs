// Tail grammar filter for candidate lines.
//
// A generated phrase is cut at an arbitrary word count, so it often stops
// mid-clause. Lines are judged only by their final morph: incomplete
// conjugations (「なかっ」, 「ござい」, 「い(ない)」), a trailing particle
// (「〇〇の」), or an honorific name suffix (「〇〇さん」) make a line read
// as unfinished and it is rejected.

use rapbot_lang::{Morph, Phrase};

/// Conjugation forms that leave a clause open.
const INCOMPLETE_FORMS: &[&str] = &["連用タ接続", "連用形", "未然形"];

const PARTICLE: &str = "助詞";
const SUFFIX: &str = "接尾";
const PERSON_NAME: &str = "人名";

/// Why a line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailRejection {
    Empty,
    IncompleteConjugation,
    Particle,
    NameSuffix,
}

/// The reason `phrase` reads as unfinished, if any.
pub fn tail_rejection(phrase: &Phrase) -> Option<TailRejection> {
    let Some(last) = phrase.last() else {
        return Some(TailRejection::Empty);
    };
    morph_rejection(last)
}

fn morph_rejection(last: &Morph) -> Option<TailRejection> {
    if INCOMPLETE_FORMS.contains(&last.conjugation_form.as_str()) {
        Some(TailRejection::IncompleteConjugation)
    } else if last.pos == PARTICLE {
        Some(TailRejection::Particle)
    } else if last.pos_detail1 == SUFFIX && last.pos_detail2 == PERSON_NAME {
        Some(TailRejection::NameSuffix)
    } else {
        None
    }
}

pub fn is_well_formed(phrase: &Phrase) -> bool {
    tail_rejection(phrase).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noun(surface: &str) -> Morph {
        Morph {
            surface: surface.into(),
            pos: "名詞".into(),
            pos_detail1: "一般".into(),
            ..Default::default()
        }
    }

    fn phrase(morphs: Vec<Morph>) -> Phrase {
        morphs.into_iter().collect()
    }

    #[test]
    fn noun_ending_is_fine() {
        assert!(is_well_formed(&phrase(vec![noun("猫"), noun("漢字")])));
    }

    #[test]
    fn empty_phrase_is_rejected() {
        assert_eq!(tail_rejection(&Phrase::default()), Some(TailRejection::Empty));
    }

    #[test]
    fn incomplete_conjugations_are_rejected() {
        for form in INCOMPLETE_FORMS {
            let verb = Morph {
                surface: "なかっ".into(),
                pos: "助動詞".into(),
                conjugation_form: (*form).into(),
                ..Default::default()
            };
            assert_eq!(
                tail_rejection(&phrase(vec![noun("猫"), verb])),
                Some(TailRejection::IncompleteConjugation),
                "{form}"
            );
        }
        let finished = Morph {
            surface: "た".into(),
            pos: "助動詞".into(),
            conjugation_form: "基本形".into(),
            ..Default::default()
        };
        assert!(is_well_formed(&phrase(vec![finished])));
    }

    #[test]
    fn trailing_particle_is_rejected() {
        let no = Morph {
            surface: "の".into(),
            pos: "助詞".into(),
            pos_detail1: "連体化".into(),
            ..Default::default()
        };
        assert_eq!(
            tail_rejection(&phrase(vec![noun("猫"), no])),
            Some(TailRejection::Particle)
        );
    }

    #[test]
    fn only_person_name_suffix_is_rejected() {
        let san = Morph {
            surface: "さん".into(),
            pos: "名詞".into(),
            pos_detail1: "接尾".into(),
            pos_detail2: "人名".into(),
            ..Default::default()
        };
        assert_eq!(
            tail_rejection(&phrase(vec![noun("田中"), san])),
            Some(TailRejection::NameSuffix)
        );

        let teki = Morph {
            surface: "的".into(),
            pos: "名詞".into(),
            pos_detail1: "接尾".into(),
            pos_detail2: "形容動詞語幹".into(),
            ..Default::default()
        };
        assert!(is_well_formed(&phrase(vec![noun("劇"), teki])));
    }
}
