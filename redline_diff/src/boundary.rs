use std::ops::Range;

use crate::model::{AtomKind, Locale};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Space,
    Word,
    Ideograph,
    Punct,
}

/// Split run text into word, punctuation, and whitespace pieces.
///
/// Pieces cover the input exactly and in order.
pub(crate) fn split_text(text: &str, locale: Locale) -> Vec<(AtomKind, Range<usize>)> {
    let chars = text.char_indices().collect::<Vec<_>>();
    let mut pieces = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        let (start, c) = chars[i];
        let class = classify(c, locale);
        let mut j = i + 1;

        match class {
            CharClass::Ideograph => {}
            CharClass::Space | CharClass::Punct => {
                while j < chars.len() && classify(chars[j].1, locale) == class {
                    j += 1;
                }
            }
            CharClass::Word => loop {
                while j < chars.len() && classify(chars[j].1, locale) == CharClass::Word {
                    j += 1;
                }
                if locale != Locale::Simple
                    && j + 1 < chars.len()
                    && is_joiner(chars[j].1)
                    && classify(chars[j + 1].1, locale) == CharClass::Word
                {
                    j += 2;
                } else {
                    break;
                }
            },
        }

        let end = chars.get(j).map_or(text.len(), |(idx, _)| *idx);
        let kind = match class {
            CharClass::Space => AtomKind::Whitespace,
            CharClass::Word | CharClass::Ideograph => AtomKind::Word,
            CharClass::Punct => AtomKind::Punctuation,
        };
        pieces.push((kind, start..end));
        i = j;
    }

    pieces
}

fn classify(c: char, locale: Locale) -> CharClass {
    if c.is_whitespace() {
        CharClass::Space
    } else if locale == Locale::Cjk && is_cjk(c) {
        CharClass::Ideograph
    } else if c.is_alphanumeric() {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

fn is_joiner(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '-')
}

fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x3040..=0x30FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xF900..=0xFAFF
            | 0x20000..=0x2FA1F
    )
}
