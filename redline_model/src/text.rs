//! Plain-text boundary format.
//!
//! One paragraph per line, `**bold**` spans, `| a | b |` table rows (adjacent
//! rows form one table) and a line holding a single form feed for a section
//! break. Rendering is exact for inputs that end with a newline.

use crate::{
    Block, Cell, Change, ChangeKind, Document, Inline, ModelError, Paragraph, Row, Run,
    SectionBreak, Table, Tracked,
};

const SECTION_BREAK_LINE: &str = "\u{c}";

/// Parse the plain-text format into a validated document.
pub fn parse_plain(input: &str) -> Result<Document, ModelError> {
    let mut doc = Document::default();
    let mut rows: Vec<Row> = Vec::new();

    for line in input.lines() {
        if let Some(cells) = table_cells(line) {
            rows.push(Row::new(
                cells
                    .into_iter()
                    .map(|text| Cell::new(vec![Block::Paragraph(parse_inline(text))]))
                    .collect(),
            ));
            continue;
        }

        flush_table(&mut doc, &mut rows);
        if line == SECTION_BREAK_LINE {
            doc.blocks.push(Block::SectionBreak(SectionBreak::default()));
        } else {
            doc.blocks.push(Block::Paragraph(parse_inline(line)));
        }
    }
    flush_table(&mut doc, &mut rows);

    doc.validate()?;
    Ok(doc)
}

/// Render a document in the plain-text format.
///
/// Revision markers are not represented; a document carrying revisions is
/// rendered in its accepted form.
pub fn render_plain(doc: &Document) -> String {
    let accepted;
    let doc = if doc.has_revisions() {
        accepted = doc.accept_all_revisions();
        &accepted
    } else {
        doc
    };

    let mut out = String::new();
    render_blocks(&doc.blocks, &mut out, false);
    out
}

/// Render a merged document with inline revision annotations:
/// `{+inserted+}`, `[-deleted-]`, `{~reformatted~}`, and `+|` / `-|` row prefixes.
pub fn render_redline(doc: &Document) -> String {
    let mut out = String::new();
    render_blocks(&doc.blocks, &mut out, true);
    out
}

fn table_cells(line: &str) -> Option<Vec<&str>> {
    let trimmed = line.trim_end();
    if trimmed.len() < 2 || !trimmed.starts_with('|') || !trimmed.ends_with('|') {
        return None;
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    Some(inner.split('|').map(str::trim).collect())
}

fn flush_table(doc: &mut Document, rows: &mut Vec<Row>) {
    if !rows.is_empty() {
        doc.blocks.push(Block::Table(Table::new(std::mem::take(rows))));
    }
}

fn parse_inline(text: &str) -> Paragraph {
    let runs = text
        .split("**")
        .enumerate()
        .filter(|(_, segment)| !segment.is_empty())
        .map(|(idx, segment)| {
            if idx % 2 == 1 {
                Run::formatted(segment, crate::RunFormat::bold())
            } else {
                Run::text(segment)
            }
        })
        .collect();
    Paragraph::new(runs)
}

fn render_blocks(blocks: &[Block], out: &mut String, annotate: bool) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => {
                render_paragraph(paragraph, out, annotate);
                out.push('\n');
            }
            Block::Table(table) => {
                for row in &table.rows {
                    if annotate {
                        match row.revision.as_ref().map(|rev| rev.kind) {
                            Some(ChangeKind::Inserted) => out.push('+'),
                            Some(ChangeKind::Deleted) => out.push('-'),
                            None => {}
                        }
                    }
                    out.push('|');
                    for cell in &row.cells {
                        out.push(' ');
                        render_cell(cell, out, annotate);
                        out.push_str(" |");
                    }
                    out.push('\n');
                }
            }
            Block::SectionBreak(section) => {
                match (annotate, section.revision.as_ref().map(|rev| rev.kind)) {
                    (true, Some(ChangeKind::Inserted)) => out.push_str("{+\u{c}+}"),
                    (true, Some(ChangeKind::Deleted)) => out.push_str("[-\u{c}-]"),
                    _ => out.push_str(SECTION_BREAK_LINE),
                }
                out.push('\n');
            }
        }
    }
}

fn render_cell(cell: &Cell, out: &mut String, annotate: bool) {
    let mut first = true;
    render_cell_blocks(&cell.blocks, out, annotate, &mut first);
}

// Cells render on one line: paragraphs are joined by a space and nested
// tables contribute their paragraph text only.
fn render_cell_blocks(blocks: &[Block], out: &mut String, annotate: bool, first: &mut bool) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => {
                if !*first {
                    out.push(' ');
                }
                *first = false;
                render_paragraph(paragraph, out, annotate);
            }
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| &row.cells) {
                    render_cell_blocks(&cell.blocks, out, annotate, first);
                }
            }
            Block::SectionBreak(_) => {}
        }
    }
}

fn render_paragraph(paragraph: &Paragraph, out: &mut String, annotate: bool) {
    for inline in &paragraph.content {
        match inline {
            Inline::Run(run) => render_run(run, out),
            Inline::Tracked(group) => {
                let (open, close) = if annotate {
                    delimiters(&group.tracked.change)
                } else {
                    ("", "")
                };
                out.push_str(open);
                for run in &group.runs {
                    render_run(run, out);
                }
                out.push_str(close);
            }
        }
    }

    if annotate && let Some(Tracked { change, .. }) = &paragraph.mark {
        let (open, close) = delimiters(change);
        out.push_str(open);
        out.push('\u{b6}');
        out.push_str(close);
    }
}

fn delimiters<F>(change: &Change<F>) -> (&'static str, &'static str) {
    match change {
        Change::Inserted => ("{+", "+}"),
        Change::Deleted => ("[-", "-]"),
        Change::Formatted { .. } => ("{~", "~}"),
    }
}

fn render_run(run: &Run, out: &mut String) {
    match run {
        Run::Text(text) if text.format.bold && !text.text.is_empty() => {
            out.push_str("**");
            out.push_str(&text.text);
            out.push_str("**");
        }
        _ => out.push_str(run.text_view()),
    }
}
