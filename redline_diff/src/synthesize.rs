use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Range;

use redline_model::{
    Block, BlockPath, BlockRevision, Cell, Change, ChangeKind, Document, Inline, Paragraph,
    ParagraphProps, RevisionMark, Row, Run, RunFormat, SectionBreak, SectionProps, Table, TextRun,
    Tracked, TrackedRuns,
};
use tracing::warn;

use crate::error::CompareError;
use crate::model::{Atom, AtomKind, AtomPayload, EditOp, Finding, FindingLevel, RevisionStamp};

/// Finding code recorded when a table or row is replaced as a whole.
pub const STRUCTURE_REPLACED: &str = "structure_replaced";

/// Result of [`synthesize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub merged: Document,
    pub findings: Vec<Finding>,
}

#[derive(Debug, thiserror::Error)]
enum SynthesisError {
    /// Local merge failure; the caller replaces the structure as a whole.
    #[error("unresolvable structure: {0}")]
    UnresolvableStructure(String),
    #[error("{0}")]
    Inconsistent(String),
}

fn inconsistent(message: impl Into<String>) -> SynthesisError {
    SynthesisError::Inconsistent(message.into())
}

/// One position of the merged stream.
#[derive(Debug, Clone, Copy)]
enum Entry<'a> {
    Equal { a: &'a Atom, b: &'a Atom },
    Formatted { a: &'a Atom, b: &'a Atom },
    Deleted(&'a Atom),
    Inserted(&'a Atom),
}

impl<'a> Entry<'a> {
    fn a_side(&self) -> Option<&'a Atom> {
        match *self {
            Entry::Equal { a, .. } | Entry::Formatted { a, .. } | Entry::Deleted(a) => Some(a),
            Entry::Inserted(_) => None,
        }
    }

    fn b_side(&self) -> Option<&'a Atom> {
        match *self {
            Entry::Equal { b, .. } | Entry::Formatted { b, .. } | Entry::Inserted(b) => Some(b),
            Entry::Deleted(_) => None,
        }
    }

    /// The atom whose content ends up in the merged tree.
    fn atom(&self) -> &'a Atom {
        match *self {
            Entry::Equal { b, .. } | Entry::Formatted { b, .. } | Entry::Inserted(b) => b,
            Entry::Deleted(a) => a,
        }
    }

    fn depth(&self) -> usize {
        self.atom().depth
    }

    /// Index of the enclosing structure at `level`/`part` on each side.
    fn slot(&self, level: usize, part: usize) -> Result<Slot, SynthesisError> {
        let side = |atom: Option<&Atom>| match atom {
            None => Ok(None),
            Some(atom) => atom.index_at(level, part).map(Some).ok_or_else(|| {
                inconsistent(format!(
                    "atom at {} has no structure index at depth {level}",
                    atom.path.blocks
                ))
            }),
        };
        Ok((side(self.a_side())?, side(self.b_side())?))
    }

    /// Position of the enclosing structure, for diagnostics.
    fn structure_path(&self, level: usize, part: usize) -> BlockPath {
        let atom = self.a_side().unwrap_or_else(|| self.atom());
        let end = (level * 3 + part + 1).min(atom.path.blocks.0.len());
        BlockPath(atom.path.blocks.0[..end].to_vec())
    }
}

type Slot = (Option<usize>, Option<usize>);

/// Rebuild one merged document from both inputs and the edit script between
/// their atom sequences.
///
/// The modified document's structure is the merge base. Content only in the
/// original is spliced back as deletions, content only in the modified
/// document is marked as insertions, and text that only changed formatting is
/// marked as a format change.
pub fn synthesize(
    original: &Document,
    modified: &Document,
    atoms_a: &[Atom],
    atoms_b: &[Atom],
    edits: &[EditOp],
    stamp: &RevisionStamp,
) -> Result<Synthesis, CompareError> {
    let invariant = |err: SynthesisError| CompareError::InvariantViolation(err.to_string());

    let entries = build_entries(atoms_a, atoms_b, edits).map_err(invariant)?;
    let mut synth = Synth {
        stamp,
        next_id: 1,
        findings: Vec::new(),
    };
    let blocks = synth
        .merge_container(&entries, 0, &original.blocks, &modified.blocks)
        .map_err(invariant)?;

    Ok(Synthesis {
        merged: Document {
            metadata: modified.metadata.clone(),
            blocks,
        },
        findings: synth.findings,
    })
}

fn build_entries<'a>(
    atoms_a: &'a [Atom],
    atoms_b: &'a [Atom],
    edits: &[EditOp],
) -> Result<Vec<Entry<'a>>, SynthesisError> {
    let range_of = |atoms: &'a [Atom], start: usize, len: usize| {
        atoms
            .get(start..start + len)
            .ok_or_else(|| inconsistent(format!("edit range {start}+{len} out of bounds")))
    };

    let mut entries = Vec::with_capacity(atoms_a.len().max(atoms_b.len()));
    let mut idx = 0usize;
    while idx < edits.len() {
        match edits[idx] {
            EditOp::Copy {
                a_start,
                b_start,
                len,
            } => {
                let left = range_of(atoms_a, a_start, len)?;
                let right = range_of(atoms_b, b_start, len)?;
                entries.extend(left.iter().zip(right).map(|(a, b)| paired(a, b)));
            }
            EditOp::Delete { a_start, len } => {
                let deleted = range_of(atoms_a, a_start, len)?;
                let inserted = match edits.get(idx + 1) {
                    Some(EditOp::Insert { b_start, len }) => {
                        idx += 1;
                        range_of(atoms_b, *b_start, *len)?
                    }
                    _ => &[],
                };
                pair_changed(deleted, inserted, &mut entries);
            }
            EditOp::Insert { b_start, len } => {
                let inserted = range_of(atoms_b, b_start, len)?;
                entries.extend(inserted.iter().map(Entry::Inserted));
            }
        }
        idx += 1;
    }

    Ok(entries)
}

fn paired<'a>(a: &'a Atom, b: &'a Atom) -> Entry<'a> {
    if a.key == b.key {
        Entry::Equal { a, b }
    } else {
        Entry::Formatted { a, b }
    }
}

/// Same content on both sides, possibly with different formatting.
fn pairable(a: &Atom, b: &Atom) -> bool {
    a.key == b.key
        || (a.kind == b.kind
            && a.depth == b.depth
            && a.text == b.text
            && matches!(
                a.kind,
                AtomKind::Word
                    | AtomKind::Punctuation
                    | AtomKind::Whitespace
                    | AtomKind::ParagraphEnd
            ))
}

/// Turn a delete/insert pair into entries; text-equal atoms at either end
/// become equal or format-change entries.
fn pair_changed<'a>(deleted: &'a [Atom], inserted: &'a [Atom], out: &mut Vec<Entry<'a>>) {
    let common = deleted.len().min(inserted.len());
    let prefix = (0..common)
        .take_while(|&k| pairable(&deleted[k], &inserted[k]))
        .count();
    let suffix = (0..common - prefix)
        .take_while(|&k| {
            pairable(
                &deleted[deleted.len() - 1 - k],
                &inserted[inserted.len() - 1 - k],
            )
        })
        .count();

    out.extend(
        deleted[..prefix]
            .iter()
            .zip(&inserted[..prefix])
            .map(|(a, b)| paired(a, b)),
    );
    out.extend(
        deleted[prefix..deleted.len() - suffix]
            .iter()
            .map(Entry::Deleted),
    );
    out.extend(
        inserted[prefix..inserted.len() - suffix]
            .iter()
            .map(Entry::Inserted),
    );
    out.extend(
        deleted[deleted.len() - suffix..]
            .iter()
            .zip(&inserted[inserted.len() - suffix..])
            .map(|(a, b)| paired(a, b)),
    );
}

struct Synth<'s> {
    stamp: &'s RevisionStamp,
    next_id: u32,
    findings: Vec<Finding>,
}

impl Synth<'_> {
    fn next_mark(&mut self) -> RevisionMark {
        let id = self.next_id;
        self.next_id += 1;
        RevisionMark {
            id,
            author: self.stamp.author.clone(),
            date: self.stamp.date,
        }
    }

    fn replaced(&mut self, what: &str, path: BlockPath, reason: &str) {
        warn!(%path, reason, "{what} replaced as a whole");
        self.findings.push(Finding {
            code: STRUCTURE_REPLACED.to_string(),
            level: FindingLevel::Warning,
            message: format!("{what} at {path} replaced as a whole: {reason}"),
            path: Some(path),
        });
    }

    /// Merge the entries of one container (document body or table cell) at
    /// table depth `level`.
    fn merge_container(
        &mut self,
        entries: &[Entry<'_>],
        level: usize,
        a_blocks: &[Block],
        b_blocks: &[Block],
    ) -> Result<Vec<Block>, SynthesisError> {
        let slots = entries
            .iter()
            .map(|entry| {
                if entry.depth() == level {
                    Ok((None, None))
                } else {
                    entry.slot(level, 0)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let plan = PairPlan::new(&slots);

        let mut blocks = Vec::new();
        let mut paragraph = ParagraphBuilder::default();
        let mut emitted_a = HashSet::new();
        let mut emitted_b = HashSet::new();
        let mut idx = 0usize;

        while idx < entries.len() {
            let entry = entries[idx];
            if entry.depth() == level {
                match entry.atom().kind {
                    AtomKind::ParagraphEnd => {
                        blocks.push(Block::Paragraph(paragraph.finish(entry, self)?));
                    }
                    AtomKind::SectionBreak => blocks.extend(self.section_break(entry)?),
                    _ => paragraph.push(entry, self)?,
                }
                idx += 1;
                continue;
            }

            let (a_idx, b_idx) = slots[idx];
            if let Some(pair) = plan.clean_pair(a_idx, b_idx) {
                let a_table = table_at(a_blocks, pair.a)?;
                let b_table = table_at(b_blocks, pair.b)?;
                match self.merge_table(&entries[pair.range.clone()], level, a_table, b_table) {
                    Ok(table) => blocks.push(Block::Table(table)),
                    Err(SynthesisError::UnresolvableStructure(reason)) => {
                        self.replaced("table", entry.structure_path(level, 0), &reason);
                        blocks.push(Block::Table(self.whole_table(a_table, ChangeKind::Deleted)));
                        blocks.push(Block::Table(
                            self.whole_table(b_table, ChangeKind::Inserted),
                        ));
                    }
                    Err(err) => return Err(err),
                }
                emitted_a.insert(pair.a);
                emitted_b.insert(pair.b);
                idx = pair.range.end;
                continue;
            }

            // Tables without a one-to-one counterpart are replaced as a whole,
            // each at the position its first atom reached in the stream.
            if let Some(a_idx) = a_idx
                && emitted_a.insert(a_idx)
            {
                if plan.partnered_a.contains(&a_idx) {
                    self.replaced(
                        "table",
                        entry.structure_path(level, 0),
                        "content is shared with more than one table",
                    );
                }
                let table = table_at(a_blocks, a_idx)?;
                blocks.push(Block::Table(self.whole_table(table, ChangeKind::Deleted)));
            }
            if let Some(b_idx) = b_idx
                && emitted_b.insert(b_idx)
            {
                let table = table_at(b_blocks, b_idx)?;
                blocks.push(Block::Table(self.whole_table(table, ChangeKind::Inserted)));
            }
            idx += 1;
        }

        if let Some(orphan) = paragraph.finish_open() {
            blocks.push(Block::Paragraph(orphan));
        }
        Ok(blocks)
    }

    fn merge_table(
        &mut self,
        entries: &[Entry<'_>],
        level: usize,
        a_table: &Table,
        b_table: &Table,
    ) -> Result<Table, SynthesisError> {
        if a_table.grid.len() != b_table.grid.len() {
            return Err(SynthesisError::UnresolvableStructure(format!(
                "column count changed from {} to {}",
                a_table.grid.len(),
                b_table.grid.len()
            )));
        }
        if a_table.props != b_table.props {
            return Err(SynthesisError::UnresolvableStructure(
                "table properties changed".to_string(),
            ));
        }

        let slots = entries
            .iter()
            .map(|entry| entry.slot(level, 1))
            .collect::<Result<Vec<_>, _>>()?;
        let plan = PairPlan::new(&slots);

        let mut rows = Vec::new();
        let mut emitted_a = HashSet::new();
        let mut emitted_b = HashSet::new();
        let mut idx = 0usize;

        while idx < entries.len() {
            let entry = entries[idx];
            let (a_idx, b_idx) = slots[idx];

            if let Some(pair) = plan.clean_pair(a_idx, b_idx) {
                let a_row = row_at(a_table, pair.a)?;
                let b_row = row_at(b_table, pair.b)?;
                match self.merge_row(&entries[pair.range.clone()], level, a_row, b_row) {
                    Ok(row) => rows.push(row),
                    Err(SynthesisError::UnresolvableStructure(reason)) => {
                        self.replaced("row", entry.structure_path(level, 1), &reason);
                        rows.push(self.whole_row(a_row, ChangeKind::Deleted));
                        rows.push(self.whole_row(b_row, ChangeKind::Inserted));
                    }
                    Err(err) => return Err(err),
                }
                emitted_a.insert(pair.a);
                emitted_b.insert(pair.b);
                idx = pair.range.end;
                continue;
            }

            if let Some(a_idx) = a_idx
                && emitted_a.insert(a_idx)
            {
                if plan.partnered_a.contains(&a_idx) {
                    self.replaced(
                        "row",
                        entry.structure_path(level, 1),
                        "content is shared with more than one row",
                    );
                }
                let row = row_at(a_table, a_idx)?;
                rows.push(self.whole_row(row, ChangeKind::Deleted));
            }
            if let Some(b_idx) = b_idx
                && emitted_b.insert(b_idx)
            {
                let row = row_at(b_table, b_idx)?;
                rows.push(self.whole_row(row, ChangeKind::Inserted));
            }
            idx += 1;
        }

        Ok(Table {
            props: b_table.props.clone(),
            grid: b_table.grid.clone(),
            rows,
        })
    }

    fn merge_row(
        &mut self,
        entries: &[Entry<'_>],
        level: usize,
        a_row: &Row,
        b_row: &Row,
    ) -> Result<Row, SynthesisError> {
        if a_row.cells.len() != b_row.cells.len() {
            return Err(SynthesisError::UnresolvableStructure(format!(
                "cell count changed from {} to {}",
                a_row.cells.len(),
                b_row.cells.len()
            )));
        }
        if a_row.props != b_row.props
            || a_row
                .cells
                .iter()
                .zip(&b_row.cells)
                .any(|(a, b)| a.props != b.props)
        {
            return Err(SynthesisError::UnresolvableStructure(
                "row or cell properties changed".to_string(),
            ));
        }

        let mut per_cell: Vec<Vec<Entry<'_>>> = vec![Vec::new(); b_row.cells.len()];
        for entry in entries {
            let cell = match entry.slot(level, 2)? {
                (Some(a), Some(b)) if a != b => {
                    return Err(SynthesisError::UnresolvableStructure(
                        "content moved between cells".to_string(),
                    ));
                }
                (_, Some(cell)) | (Some(cell), None) => cell,
                (None, None) => return Err(inconsistent("entry without a cell")),
            };
            per_cell
                .get_mut(cell)
                .ok_or_else(|| inconsistent(format!("cell {cell} out of range")))?
                .push(*entry);
        }

        let mut cells = Vec::with_capacity(per_cell.len());
        for ((cell_entries, a_cell), b_cell) in per_cell.iter().zip(&a_row.cells).zip(&b_row.cells)
        {
            let mut blocks =
                self.merge_container(cell_entries, level + 1, &a_cell.blocks, &b_cell.blocks)?;
            if blocks.is_empty() {
                blocks.push(Block::Paragraph(Paragraph::default()));
            }
            cells.push(Cell {
                props: b_cell.props.clone(),
                blocks,
            });
        }

        Ok(Row {
            props: b_row.props.clone(),
            cells,
            revision: None,
        })
    }

    fn whole_table(&mut self, table: &Table, kind: ChangeKind) -> Table {
        let revision = BlockRevision {
            mark: self.next_mark(),
            kind,
        };
        Table {
            props: table.props.clone(),
            grid: table.grid.clone(),
            rows: table
                .rows
                .iter()
                .map(|row| Row {
                    revision: Some(revision.clone()),
                    ..row.clone()
                })
                .collect(),
        }
    }

    fn whole_row(&mut self, row: &Row, kind: ChangeKind) -> Row {
        Row {
            revision: Some(BlockRevision {
                mark: self.next_mark(),
                kind,
            }),
            ..row.clone()
        }
    }

    fn section_break(&mut self, entry: Entry<'_>) -> Result<Vec<Block>, SynthesisError> {
        let mut revised = |atom: &Atom, kind: Option<ChangeKind>| -> Result<Block, SynthesisError> {
            Ok(Block::SectionBreak(SectionBreak {
                props: section_props(atom)?,
                revision: kind.map(|kind| BlockRevision {
                    mark: self.next_mark(),
                    kind,
                }),
            }))
        };

        Ok(match entry {
            Entry::Equal { b, .. } => vec![revised(b, None)?],
            Entry::Inserted(b) => vec![revised(b, Some(ChangeKind::Inserted))?],
            Entry::Deleted(a) => vec![revised(a, Some(ChangeKind::Deleted))?],
            Entry::Formatted { a, b } => vec![
                revised(a, Some(ChangeKind::Deleted))?,
                revised(b, Some(ChangeKind::Inserted))?,
            ],
        })
    }
}

/// Content of the paragraph being rebuilt, up to its paragraph mark.
#[derive(Default)]
struct ParagraphBuilder<'a> {
    content: Vec<Inline>,
    /// Side, block path and run index of the last piece.
    last_source: Option<(bool, &'a [usize], usize)>,
}

impl<'a> ParagraphBuilder<'a> {
    fn push(&mut self, entry: Entry<'a>, synth: &mut Synth<'_>) -> Result<(), SynthesisError> {
        let (atom, change) = match entry {
            Entry::Equal { b, .. } => (b, None),
            Entry::Formatted { a, b } => (
                b,
                Some(Change::Formatted {
                    previous: text_format(a)?,
                }),
            ),
            Entry::Inserted(b) => (b, Some(Change::Inserted)),
            Entry::Deleted(a) => (a, Some(Change::Deleted)),
        };
        let run = atom_run(atom)?;
        let source = (
            entry.b_side().is_some(),
            atom.path.blocks.0.as_slice(),
            atom.path.run,
        );
        let same_source = self.last_source == Some(source) && matches!(run, Run::Text(_));
        self.last_source = Some(source);

        match change {
            None => {
                if same_source
                    && let Some(Inline::Run(Run::Text(previous))) = self.content.last_mut()
                {
                    previous.text.push_str(&atom.text);
                    return Ok(());
                }
                self.content.push(Inline::Run(run));
            }
            Some(change) => {
                if let Some(Inline::Tracked(group)) = self.content.last_mut()
                    && group.tracked.change == change
                {
                    if same_source && let Some(Run::Text(previous)) = group.runs.last_mut() {
                        previous.text.push_str(&atom.text);
                    } else {
                        group.runs.push(run);
                    }
                    return Ok(());
                }
                self.content.push(Inline::Tracked(TrackedRuns {
                    tracked: Tracked {
                        mark: synth.next_mark(),
                        change,
                    },
                    runs: vec![run],
                }));
            }
        }
        Ok(())
    }

    /// Close the paragraph with the mark carried by `entry`.
    fn finish(
        &mut self,
        entry: Entry<'a>,
        synth: &mut Synth<'_>,
    ) -> Result<Paragraph, SynthesisError> {
        let (props, change) = match entry {
            Entry::Equal { b, .. } => (paragraph_props(b)?, None),
            Entry::Inserted(b) => (paragraph_props(b)?, Some(Change::Inserted)),
            Entry::Deleted(a) => (paragraph_props(a)?, Some(Change::Deleted)),
            Entry::Formatted { a, b } => (
                paragraph_props(b)?,
                Some(Change::Formatted {
                    previous: paragraph_props(a)?,
                }),
            ),
        };
        self.last_source = None;

        Ok(Paragraph {
            props,
            content: std::mem::take(&mut self.content),
            mark: change.map(|change| Tracked {
                mark: synth.next_mark(),
                change,
            }),
        })
    }

    /// Content left without a paragraph mark at the end of a container.
    fn finish_open(self) -> Option<Paragraph> {
        if self.content.is_empty() {
            return None;
        }
        Some(Paragraph {
            props: ParagraphProps::default(),
            content: self.content,
            mark: None,
        })
    }
}

/// One-to-one pairing of tables (or rows) between both sides of a stream.
#[derive(Debug, Default)]
struct PairPlan {
    clean: Vec<CleanPair>,
    by_a: HashMap<usize, usize>,
    by_b: HashMap<usize, usize>,
    /// Original-side structures sharing content with some modified-side structure.
    partnered_a: HashSet<usize>,
}

#[derive(Debug, Clone)]
struct CleanPair {
    a: usize,
    b: usize,
    /// Entries of the pair; contiguous and touching no other structure.
    range: Range<usize>,
}

impl PairPlan {
    fn new(slots: &[Slot]) -> Self {
        let mut partners_a: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        let mut partners_b: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        let mut bounds_a: HashMap<usize, (usize, usize)> = HashMap::new();
        let mut bounds_b: HashMap<usize, (usize, usize)> = HashMap::new();

        for (pos, &(a, b)) in slots.iter().enumerate() {
            if let Some(a) = a {
                bounds_a.entry(a).or_insert((pos, pos)).1 = pos;
            }
            if let Some(b) = b {
                bounds_b.entry(b).or_insert((pos, pos)).1 = pos;
            }
            if let (Some(a), Some(b)) = (a, b) {
                partners_a.entry(a).or_default().insert(b);
                partners_b.entry(b).or_default().insert(a);
            }
        }

        let mut plan = PairPlan {
            partnered_a: partners_a.keys().copied().collect(),
            ..PairPlan::default()
        };

        for (&a, partners) in &partners_a {
            let Some(&b) = partners.first() else {
                continue;
            };
            if partners.len() != 1 || partners_b.get(&b).is_none_or(|back| back.len() != 1) {
                continue;
            }
            let (Some(&(a_first, a_last)), Some(&(b_first, b_last))) =
                (bounds_a.get(&a), bounds_b.get(&b))
            else {
                continue;
            };
            let range = a_first.min(b_first)..a_last.max(b_last) + 1;
            let contiguous = slots[range.clone()].iter().all(|&(x, y)| {
                (x.is_some() || y.is_some())
                    && x.is_none_or(|x| x == a)
                    && y.is_none_or(|y| y == b)
            });
            if contiguous {
                plan.by_a.insert(a, plan.clean.len());
                plan.by_b.insert(b, plan.clean.len());
                plan.clean.push(CleanPair { a, b, range });
            }
        }

        plan
    }

    fn clean_pair(&self, a: Option<usize>, b: Option<usize>) -> Option<&CleanPair> {
        a.and_then(|a| self.by_a.get(&a))
            .or_else(|| b.and_then(|b| self.by_b.get(&b)))
            .map(|&idx| &self.clean[idx])
    }
}

fn table_at(blocks: &[Block], idx: usize) -> Result<&Table, SynthesisError> {
    match blocks.get(idx) {
        Some(Block::Table(table)) => Ok(table),
        _ => Err(inconsistent(format!("no table at block {idx}"))),
    }
}

fn row_at(table: &Table, idx: usize) -> Result<&Row, SynthesisError> {
    table
        .rows
        .get(idx)
        .ok_or_else(|| inconsistent(format!("no row {idx} in table")))
}

fn atom_run(atom: &Atom) -> Result<Run, SynthesisError> {
    match &atom.payload {
        AtomPayload::Text { format } => Ok(Run::Text(TextRun {
            text: atom.text.clone(),
            format: format.clone(),
        })),
        AtomPayload::Object(object) => Ok(Run::Object(object.clone())),
        AtomPayload::ParagraphEnd(_) | AtomPayload::SectionBreak(_) => Err(inconsistent(format!(
            "{:?} atom at {} inside paragraph content",
            atom.kind, atom.path.blocks
        ))),
    }
}

fn text_format(atom: &Atom) -> Result<RunFormat, SynthesisError> {
    match &atom.payload {
        AtomPayload::Text { format } => Ok(format.clone()),
        _ => Err(inconsistent(format!(
            "format change on non-text atom at {}",
            atom.path.blocks
        ))),
    }
}

fn paragraph_props(atom: &Atom) -> Result<ParagraphProps, SynthesisError> {
    match &atom.payload {
        AtomPayload::ParagraphEnd(props) => Ok(props.clone()),
        _ => Err(inconsistent(format!(
            "expected a paragraph mark at {}",
            atom.path.blocks
        ))),
    }
}

fn section_props(atom: &Atom) -> Result<SectionProps, SynthesisError> {
    match &atom.payload {
        AtomPayload::SectionBreak(props) => Ok(props.clone()),
        _ => Err(inconsistent(format!(
            "expected a section break at {}",
            atom.path.blocks
        ))),
    }
}
