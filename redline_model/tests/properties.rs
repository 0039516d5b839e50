use proptest::prelude::*;
use redline_model::{parse_plain, render_plain};

const WORDS: &[&str] = &["alpha", "beta", "gamma", "delta", "x", "42", "don't", "e-mail"];

#[derive(Debug, Clone)]
enum Line {
    Paragraph(Vec<(&'static str, bool)>),
    Row(Vec<&'static str>),
    SectionBreak,
}

fn line_strategy(width: usize) -> impl Strategy<Value = Line> {
    prop_oneof![
        4 => prop::collection::vec((prop::sample::select(WORDS), any::<bool>()), 0..5)
            .prop_map(Line::Paragraph),
        2 => prop::collection::vec(prop::sample::select(WORDS), width..=width).prop_map(Line::Row),
        1 => Just(Line::SectionBreak),
    ]
}

/// Plain-text documents whose table rows all share one width, so adjacent
/// rows always form a well-formed table.
fn text_strategy() -> impl Strategy<Value = String> {
    (1usize..4)
        .prop_flat_map(|width| prop::collection::vec(line_strategy(width), 0..8))
        .prop_map(|lines| lines.iter().map(render_line).collect())
}

fn render_line(line: &Line) -> String {
    let mut out = match line {
        Line::Paragraph(words) => words
            .iter()
            .map(|(word, bold)| {
                if *bold {
                    format!("**{word}**")
                } else {
                    (*word).to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
        Line::Row(cells) => format!("| {} |", cells.join(" | ")),
        Line::SectionBreak => "\u{c}".to_string(),
    };
    out.push('\n');
    out
}

proptest! {
    #[test]
    fn plain_text_renders_back_exactly(input in text_strategy()) {
        let doc = parse_plain(&input).expect("generated text parses");
        prop_assert_eq!(render_plain(&doc), input);
    }

    #[test]
    fn resolving_a_revision_free_document_changes_nothing(input in text_strategy()) {
        let doc = parse_plain(&input).expect("generated text parses");
        prop_assert!(!doc.has_revisions());

        let canonical = doc.canonicalize();
        prop_assert_eq!(doc.accept_all_revisions().canonicalize(), canonical.clone());
        prop_assert_eq!(doc.reject_all_revisions().canonicalize(), canonical.clone());
        prop_assert_eq!(canonical.canonicalize(), canonical);
    }
}
