use crate::{
    Block, Cell, Change, ChangeKind, Document, Inline, Paragraph, Row, Run, SectionBreak, Table,
    TextRun, TrackedRuns,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Accept,
    Reject,
}

impl Document {
    /// Build the document as it reads with every revision accepted.
    ///
    /// A deleted paragraph mark joins its paragraph with the following
    /// paragraph of the same container; the following paragraph keeps its
    /// properties.
    pub fn accept_all_revisions(&self) -> Document {
        self.resolve(Resolution::Accept)
    }

    /// Build the document as it read before any revision was made.
    pub fn reject_all_revisions(&self) -> Document {
        self.resolve(Resolution::Reject)
    }

    /// Drop empty text runs and merge adjacent text runs with equal formatting.
    pub fn canonicalize(&self) -> Document {
        Document {
            metadata: self.metadata.clone(),
            blocks: canonical_blocks(&self.blocks),
        }
    }

    fn resolve(&self, resolution: Resolution) -> Document {
        Document {
            metadata: self.metadata.clone(),
            blocks: resolve_blocks(&self.blocks, resolution),
        }
    }
}

fn resolve_blocks(blocks: &[Block], resolution: Resolution) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    let mut carry: Option<Paragraph> = None;

    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => {
                let (mut resolved, joins_next) = resolve_paragraph(paragraph, resolution);
                if let Some(previous) = carry.take() {
                    let mut content = previous.content;
                    content.append(&mut resolved.content);
                    resolved.content = content;
                }
                if joins_next {
                    carry = Some(resolved);
                } else {
                    out.push(Block::Paragraph(resolved));
                }
            }
            // Blocks that disappear do not stop a joining paragraph.
            Block::Table(table) => {
                if let Some(table) = resolve_table(table, resolution) {
                    flush_carry(&mut out, carry.take());
                    out.push(Block::Table(table));
                }
            }
            Block::SectionBreak(section) => {
                if survives(section.revision.as_ref().map(|rev| rev.kind), resolution) {
                    flush_carry(&mut out, carry.take());
                    out.push(Block::SectionBreak(SectionBreak {
                        props: section.props.clone(),
                        revision: None,
                    }));
                }
            }
        }
    }

    flush_carry(&mut out, carry);
    out
}

// A joining paragraph with nothing to join keeps its content; an empty one
// disappears with its mark.
fn flush_carry(out: &mut Vec<Block>, carry: Option<Paragraph>) {
    if let Some(paragraph) = carry
        && !paragraph.content.is_empty()
    {
        out.push(Block::Paragraph(paragraph));
    }
}

fn survives(kind: Option<ChangeKind>, resolution: Resolution) -> bool {
    !matches!(
        (kind, resolution),
        (Some(ChangeKind::Inserted), Resolution::Reject)
            | (Some(ChangeKind::Deleted), Resolution::Accept)
    )
}

/// Returns the resolved paragraph and whether its mark disappeared.
fn resolve_paragraph(paragraph: &Paragraph, resolution: Resolution) -> (Paragraph, bool) {
    let mut content = Vec::with_capacity(paragraph.content.len());
    for inline in &paragraph.content {
        match inline {
            Inline::Run(run) => content.push(Inline::Run(run.clone())),
            Inline::Tracked(group) => match (&group.tracked.change, resolution) {
                (Change::Inserted, Resolution::Accept)
                | (Change::Deleted, Resolution::Reject)
                | (Change::Formatted { .. }, Resolution::Accept) => {
                    content.extend(group.runs.iter().cloned().map(Inline::Run));
                }
                (Change::Inserted, Resolution::Reject) | (Change::Deleted, Resolution::Accept) => {}
                (Change::Formatted { previous }, Resolution::Reject) => {
                    content.extend(group.runs.iter().map(|run| {
                        Inline::Run(match run {
                            Run::Text(text) => Run::Text(TextRun {
                                text: text.text.clone(),
                                format: previous.clone(),
                            }),
                            Run::Object(_) => run.clone(),
                        })
                    }));
                }
            },
        }
    }

    let (props, joins_next) = match (paragraph.mark.as_ref().map(|m| &m.change), resolution) {
        (None, _) => (paragraph.props.clone(), false),
        (Some(Change::Inserted), Resolution::Accept) => (paragraph.props.clone(), false),
        (Some(Change::Inserted), Resolution::Reject) => (paragraph.props.clone(), true),
        (Some(Change::Deleted), Resolution::Accept) => (paragraph.props.clone(), true),
        (Some(Change::Deleted), Resolution::Reject) => (paragraph.props.clone(), false),
        (Some(Change::Formatted { .. }), Resolution::Accept) => (paragraph.props.clone(), false),
        (Some(Change::Formatted { previous }), Resolution::Reject) => (previous.clone(), false),
    };

    (
        Paragraph {
            props,
            content,
            mark: None,
        },
        joins_next,
    )
}

fn resolve_table(table: &Table, resolution: Resolution) -> Option<Table> {
    let rows = table
        .rows
        .iter()
        .filter(|row| survives(row.revision.as_ref().map(|rev| rev.kind), resolution))
        .map(|row| Row {
            props: row.props.clone(),
            cells: row
                .cells
                .iter()
                .map(|cell| Cell {
                    props: cell.props.clone(),
                    blocks: non_empty(resolve_blocks(&cell.blocks, resolution)),
                })
                .collect(),
            revision: None,
        })
        .collect::<Vec<_>>();

    if rows.is_empty() {
        return None;
    }

    Some(Table {
        props: table.props.clone(),
        grid: table.grid.clone(),
        rows,
    })
}

fn non_empty(blocks: Vec<Block>) -> Vec<Block> {
    if blocks.is_empty() {
        vec![Block::Paragraph(Paragraph::default())]
    } else {
        blocks
    }
}

fn canonical_blocks(blocks: &[Block]) -> Vec<Block> {
    blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph(paragraph) => Block::Paragraph(Paragraph {
                props: paragraph.props.clone(),
                content: canonical_content(&paragraph.content),
                mark: paragraph.mark.clone(),
            }),
            Block::Table(table) => Block::Table(Table {
                props: table.props.clone(),
                grid: table.grid.clone(),
                rows: table
                    .rows
                    .iter()
                    .map(|row| Row {
                        props: row.props.clone(),
                        cells: row
                            .cells
                            .iter()
                            .map(|cell| Cell {
                                props: cell.props.clone(),
                                blocks: canonical_blocks(&cell.blocks),
                            })
                            .collect(),
                        revision: row.revision.clone(),
                    })
                    .collect(),
            }),
            Block::SectionBreak(section) => Block::SectionBreak(section.clone()),
        })
        .collect()
}

fn canonical_content(content: &[Inline]) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(content.len());
    for inline in content {
        match inline {
            Inline::Run(run) => {
                if let Some(Inline::Run(previous)) = out.last_mut()
                    && merge_into(previous, run)
                {
                    continue;
                }
                if !is_empty_text(run) {
                    out.push(Inline::Run(run.clone()));
                }
            }
            Inline::Tracked(group) => {
                let runs = canonical_runs(&group.runs);
                if !runs.is_empty() {
                    out.push(Inline::Tracked(TrackedRuns {
                        tracked: group.tracked.clone(),
                        runs,
                    }));
                }
            }
        }
    }
    out
}

fn canonical_runs(runs: &[Run]) -> Vec<Run> {
    let mut out: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs {
        if let Some(previous) = out.last_mut()
            && merge_into(previous, run)
        {
            continue;
        }
        if !is_empty_text(run) {
            out.push(run.clone());
        }
    }
    out
}

fn is_empty_text(run: &Run) -> bool {
    matches!(run, Run::Text(text) if text.text.is_empty())
}

fn merge_into(previous: &mut Run, next: &Run) -> bool {
    match (previous, next) {
        (_, Run::Text(next)) if next.text.is_empty() => true,
        (Run::Text(previous), Run::Text(next)) if previous.format == next.format => {
            previous.text.push_str(&next.text);
            true
        }
        _ => false,
    }
}
