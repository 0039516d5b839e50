use redline_model::{Block, BlockPath, Cell, Document, Inline, RevisionKind, RevisionMark, Row};

use crate::model::{Revision, RevisionScope};

/// Collect the revisions of a merged document in document order.
///
/// Adjacent markers with the same kind, author and scope are reported as
/// one revision; unrevised content in between keeps them apart.
pub fn extract(doc: &Document) -> Vec<Revision> {
    let mut collector = Collector::default();

    for (path, block) in doc.walk() {
        match block {
            Block::Paragraph(paragraph) => {
                for inline in &paragraph.content {
                    match inline {
                        Inline::Run(_) => collector.gap(),
                        Inline::Tracked(group) => collector.marker(
                            group.tracked.change.kind(),
                            RevisionScope::Inline,
                            &group.tracked.mark,
                            &group.runs.iter().map(|run| run.text_view()).collect::<String>(),
                            &path,
                        ),
                    }
                }
                match &paragraph.mark {
                    Some(tracked) => collector.marker(
                        tracked.change.kind(),
                        RevisionScope::Inline,
                        &tracked.mark,
                        "\n",
                        &path,
                    ),
                    None => collector.gap(),
                }
            }
            Block::Table(table) => {
                for (row_idx, row) in table.rows.iter().enumerate() {
                    match &row.revision {
                        Some(revision) => {
                            let mut row_path = path.clone();
                            row_path.0.push(row_idx);
                            collector.marker(
                                revision.kind.into(),
                                RevisionScope::Row,
                                &revision.mark,
                                &row_text(row),
                                &row_path,
                            );
                        }
                        None => collector.gap(),
                    }
                }
                collector.gap();
            }
            Block::SectionBreak(section) => match &section.revision {
                Some(revision) => collector.marker(
                    revision.kind.into(),
                    RevisionScope::SectionBreak,
                    &revision.mark,
                    "\u{c}",
                    &path,
                ),
                None => collector.gap(),
            },
        }
    }

    collector.finish()
}

#[derive(Default)]
struct Collector {
    done: Vec<Revision>,
    open: Option<Revision>,
}

impl Collector {
    fn marker(
        &mut self,
        kind: RevisionKind,
        scope: RevisionScope,
        mark: &RevisionMark,
        text: &str,
        path: &BlockPath,
    ) {
        if let Some(open) = &mut self.open
            && open.kind == kind
            && open.scope == scope
            && open.author == mark.author
        {
            if scope == RevisionScope::Row {
                open.text.push('\n');
            }
            open.text.push_str(text);
            return;
        }

        self.gap();
        self.open = Some(Revision {
            id: mark.id,
            kind,
            scope,
            author: mark.author.clone(),
            date: mark.date,
            text: text.to_string(),
            path: path.clone(),
        });
    }

    fn gap(&mut self) {
        if let Some(open) = self.open.take() {
            self.done.push(open);
        }
    }

    fn finish(mut self) -> Vec<Revision> {
        self.gap();
        self.done
    }
}

fn row_text(row: &Row) -> String {
    row.cells.iter().map(cell_text).collect::<Vec<_>>().join("\t")
}

fn cell_text(cell: &Cell) -> String {
    let mut parts = Vec::new();
    collect_text(&cell.blocks, &mut parts);
    parts.join(" ")
}

fn collect_text(blocks: &[Block], parts: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => parts.push(paragraph.text()),
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| &row.cells) {
                    collect_text(&cell.blocks, parts);
                }
            }
            Block::SectionBreak(_) => {}
        }
    }
}
