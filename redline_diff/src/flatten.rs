use redline_model::{
    Block, BlockPath, Change, Document, Inline, ObjectRun, Paragraph, ParagraphProps, Run,
    RunFormat, SectionProps,
};

use crate::boundary::split_text;
use crate::model::{Atom, AtomKind, AtomPayload, Locale, StructuralPath, derive_atom_key};

const PARAGRAPH_END_TEXT: &str = "\n";
const SECTION_BREAK_TEXT: &str = "\u{c}";

/// Flatten a document into its ordered atom sequence.
///
/// Every paragraph ends with a `ParagraphEnd` atom, section breaks produce a
/// single `SectionBreak` atom and tables contribute the atoms of their cells.
/// Tracked content is read in its accepted form.
pub fn flatten(doc: &Document, locale: Locale) -> Vec<Atom> {
    let mut out = Vec::new();

    for (path, block) in doc.walk() {
        match block {
            Block::Paragraph(paragraph) => flatten_paragraph(paragraph, &path, locale, &mut out),
            Block::SectionBreak(section) => {
                let depth = path.table_depth();
                out.push(Atom {
                    kind: AtomKind::SectionBreak,
                    key: derive_atom_key(
                        AtomKind::SectionBreak,
                        depth,
                        &section_fingerprint(&section.props),
                        SECTION_BREAK_TEXT,
                    ),
                    text: SECTION_BREAK_TEXT.to_string(),
                    depth,
                    payload: AtomPayload::SectionBreak(section.props.clone()),
                    path: StructuralPath {
                        blocks: path,
                        run: 0,
                        offset: 0,
                    },
                });
            }
            Block::Table(_) => {}
        }
    }

    out
}

fn flatten_paragraph(
    paragraph: &Paragraph,
    path: &BlockPath,
    locale: Locale,
    out: &mut Vec<Atom>,
) {
    let depth = path.table_depth();
    let mut run_idx = 0usize;

    for inline in &paragraph.content {
        let (runs, accepted) = match inline {
            Inline::Run(run) => (std::slice::from_ref(run), true),
            Inline::Tracked(group) => (
                group.runs.as_slice(),
                !matches!(group.tracked.change, Change::Deleted),
            ),
        };
        for run in runs {
            if accepted {
                flatten_run(run, path, run_idx, depth, locale, out);
            }
            run_idx += 1;
        }
    }

    let deleted_mark = matches!(
        paragraph.mark.as_ref().map(|mark| &mark.change),
        Some(Change::Deleted)
    );
    if !deleted_mark {
        out.push(Atom {
            kind: AtomKind::ParagraphEnd,
            key: derive_atom_key(
                AtomKind::ParagraphEnd,
                depth,
                &paragraph_fingerprint(&paragraph.props),
                PARAGRAPH_END_TEXT,
            ),
            text: PARAGRAPH_END_TEXT.to_string(),
            depth,
            payload: AtomPayload::ParagraphEnd(paragraph.props.clone()),
            path: StructuralPath {
                blocks: path.clone(),
                run: run_idx,
                offset: 0,
            },
        });
    }
}

fn flatten_run(
    run: &Run,
    path: &BlockPath,
    run_idx: usize,
    depth: usize,
    locale: Locale,
    out: &mut Vec<Atom>,
) {
    match run {
        Run::Text(text) => {
            let fingerprint = format_fingerprint(&text.format);
            for (kind, range) in split_text(&text.text, locale) {
                let piece = &text.text[range.clone()];
                out.push(Atom {
                    kind,
                    key: derive_atom_key(kind, depth, &fingerprint, piece),
                    text: piece.to_string(),
                    depth,
                    payload: AtomPayload::Text {
                        format: text.format.clone(),
                    },
                    path: StructuralPath {
                        blocks: path.clone(),
                        run: run_idx,
                        offset: range.start,
                    },
                });
            }
        }
        Run::Object(object) => {
            let view = run.text_view();
            out.push(Atom {
                kind: AtomKind::Object,
                key: derive_atom_key(AtomKind::Object, depth, &object_fingerprint(object), view),
                text: view.to_string(),
                depth,
                payload: AtomPayload::Object(object.clone()),
                path: StructuralPath {
                    blocks: path.clone(),
                    run: run_idx,
                    offset: 0,
                },
            });
        }
    }
}

fn format_fingerprint(format: &RunFormat) -> String {
    format!(
        "b={}|i={}|u={}|s={}|font={}|size={}|color={}",
        format.bold,
        format.italic,
        format.underline,
        format.strike,
        format.font.as_deref().unwrap_or(""),
        format.size.map(|size| size.to_string()).unwrap_or_default(),
        format.color.as_deref().unwrap_or(""),
    )
}

fn paragraph_fingerprint(props: &ParagraphProps) -> String {
    format!(
        "style={}|align={:?}|num={}",
        props.style.as_deref().unwrap_or(""),
        props.alignment,
        props
            .numbering
            .map(|numbering| format!("{}.{}", numbering.id, numbering.level))
            .unwrap_or_default(),
    )
}

fn object_fingerprint(object: &ObjectRun) -> String {
    format!("obj={:?}|token={}", object.kind, object.token)
}

fn section_fingerprint(props: &SectionProps) -> String {
    format!("kind={:?}|orient={:?}", props.kind, props.orientation)
}
