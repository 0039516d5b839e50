//! Structural document model for redline comparisons.
//!
//! This crate provides:
//! - a closed tree model (`Document`, `Block`, `Paragraph`, `Table`, `Run`)
//! - revision markers (`Tracked`, `BlockRevision`) carried by merged documents
//! - boundary loaders and serializers (`load_json`, `save_json`, `parse_plain`)
//! - revision acceptance and rejection (`Document::accept_all_revisions`)
//!
//! Documents are never mutated once loaded; every transformation in this
//! workspace builds a new tree.
//!
//! # Example
//!
//! ```rust
//! use redline_model::{parse_plain, render_plain};
//!
//! let input = "The **cat** sat.\n| a | b |\n";
//! let doc = parse_plain(input).expect("valid document");
//! assert_eq!(render_plain(&doc), input);
//! ```

mod error;
mod revisions;
mod text;
mod validate;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::ModelError;
pub use text::{parse_plain, render_plain, render_redline};
pub use validate::MAX_TABLE_DEPTH;

/// Column width used by constructors that do not receive an explicit grid.
pub const DEFAULT_COLUMN_WIDTH: u32 = 2000;

/// Positional chain locating a block: `[block, row, cell, block, row, cell, block, ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockPath(pub Vec<usize>);

impl BlockPath {
    /// Number of tables enclosing the addressed block.
    pub fn table_depth(&self) -> usize {
        self.0.len().saturating_sub(1) / 3
    }
}

impl fmt::Display for BlockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for idx in &self.0 {
            write!(f, "/{idx}")?;
        }
        Ok(())
    }
}

/// Document metadata supplied by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

/// Root of a structural tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub metadata: DocumentMetadata,
    pub blocks: Vec<Block>,
}

/// Block-level content node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    SectionBreak(SectionBreak),
}

/// Paragraph with inline content and an optional tracked paragraph mark.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub props: ParagraphProps,
    #[serde(default)]
    pub content: Vec<Inline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark: Option<Tracked<ParagraphProps>>,
}

/// Paragraph-level formatting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub alignment: Alignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbering: Option<Numbering>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Start,
    Center,
    End,
    Justify,
}

/// List membership of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Numbering {
    pub id: u32,
    pub level: u8,
}

/// Inline node: a plain run or a group of runs under one revision marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inline {
    Run(Run),
    Tracked(TrackedRuns),
}

/// Runs sharing a single revision marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedRuns {
    pub tracked: Tracked<RunFormat>,
    pub runs: Vec<Run>,
}

/// Inline content node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Run {
    Text(TextRun),
    Object(ObjectRun),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub format: RunFormat,
}

/// Atomic non-text content identified by an opaque token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRun {
    pub kind: ObjectKind,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Image,
    Field,
    Break,
    Tab,
    Other,
}

/// Character formatting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Size in half-points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl RunFormat {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::default()
        }
    }
}

/// Table with a column grid and rows of cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub props: TableProps,
    /// Column widths in twentieths of a point.
    pub grid: Vec<u32>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub props: RowProps,
    pub cells: Vec<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<BlockRevision>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RowProps {
    pub header: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub props: CellProps,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CellProps {
    /// Number of grid columns spanned by the cell.
    pub grid_span: u32,
}

impl Default for CellProps {
    fn default() -> Self {
        Self { grid_span: 1 }
    }
}

/// Section boundary carried as its own block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionBreak {
    #[serde(default)]
    pub props: SectionProps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<BlockRevision>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionProps {
    pub kind: SectionKind,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    #[default]
    NextPage,
    Continuous,
    EvenPage,
    OddPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Attribution shared by every revision marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMark {
    pub id: u32,
    pub author: String,
    pub date: DateTime<Utc>,
}

/// Kind of a revision as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionKind {
    Insertion,
    Deletion,
    FormatChange,
}

/// Change recorded on content whose formatting type is `F`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change<F> {
    Inserted,
    Deleted,
    Formatted { previous: F },
}

impl<F> Change<F> {
    pub fn kind(&self) -> RevisionKind {
        match self {
            Change::Inserted => RevisionKind::Insertion,
            Change::Deleted => RevisionKind::Deletion,
            Change::Formatted { .. } => RevisionKind::FormatChange,
        }
    }
}

/// Revision marker attached to inline content or a paragraph mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracked<F> {
    pub mark: RevisionMark,
    pub change: Change<F>,
}

/// Whole-structure change (table rows and section breaks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Deleted,
}

impl From<ChangeKind> for RevisionKind {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Inserted => RevisionKind::Insertion,
            ChangeKind::Deleted => RevisionKind::Deletion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRevision {
    pub mark: RevisionMark,
    pub kind: ChangeKind,
}

impl Document {
    /// Create an empty document with caller-supplied metadata.
    pub fn new(metadata: DocumentMetadata) -> Self {
        Self {
            metadata,
            blocks: Vec::new(),
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            metadata: DocumentMetadata::default(),
            blocks,
        }
    }

    /// Depth-first, document-order traversal over every block, including
    /// blocks nested in table cells. The iterator is cheap to clone, and
    /// calling `walk` again restarts it.
    pub fn walk(&self) -> BlockWalk<'_> {
        BlockWalk {
            stack: vec![(Vec::new(), self.blocks.iter().enumerate())],
        }
    }

    /// Text of every paragraph, one line per paragraph, in document order.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for (_, block) in self.walk() {
            if let Block::Paragraph(paragraph) = block {
                out.push_str(&paragraph.text());
                out.push('\n');
            }
        }
        out
    }

    /// Whether any revision marker is present anywhere in the tree.
    pub fn has_revisions(&self) -> bool {
        self.walk().any(|(_, block)| match block {
            Block::Paragraph(paragraph) => {
                paragraph.mark.is_some()
                    || paragraph
                        .content
                        .iter()
                        .any(|inline| matches!(inline, Inline::Tracked(_)))
            }
            Block::Table(table) => table.rows.iter().any(|row| row.revision.is_some()),
            Block::SectionBreak(section) => section.revision.is_some(),
        })
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_redline(self))
    }
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self::with_props(ParagraphProps::default(), runs)
    }

    pub fn with_props(props: ParagraphProps, runs: Vec<Run>) -> Self {
        Self {
            props,
            content: runs.into_iter().map(Inline::Run).collect(),
            mark: None,
        }
    }

    /// Paragraph holding a single unformatted text run (no run when empty).
    pub fn plain(text: &str) -> Self {
        if text.is_empty() {
            Self::new(Vec::new())
        } else {
            Self::new(vec![Run::text(text)])
        }
    }

    pub fn props(&self) -> &ParagraphProps {
        &self.props
    }

    /// Every run in content order, including runs under revision markers.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().flat_map(|inline| match inline {
            Inline::Run(run) => std::slice::from_ref(run).iter(),
            Inline::Tracked(group) => group.runs.iter(),
        })
    }

    /// Concatenated text of every run, tracked or not.
    pub fn text(&self) -> String {
        self.runs().map(Run::text_view).collect()
    }
}

impl Run {
    pub fn text(text: &str) -> Self {
        Self::formatted(text, RunFormat::default())
    }

    pub fn formatted(text: &str, format: RunFormat) -> Self {
        Run::Text(TextRun {
            text: text.to_string(),
            format,
        })
    }

    pub fn object(kind: ObjectKind, token: &str) -> Self {
        Run::Object(ObjectRun {
            kind,
            token: token.to_string(),
        })
    }

    /// Character formatting, when the run carries any.
    pub fn format(&self) -> Option<&RunFormat> {
        match self {
            Run::Text(run) => Some(&run.format),
            Run::Object(_) => None,
        }
    }

    /// Text used when the run is shown as plain text.
    pub fn text_view(&self) -> &str {
        match self {
            Run::Text(run) => &run.text,
            Run::Object(object) => match object.kind {
                ObjectKind::Tab => "\t",
                ObjectKind::Break => "\u{b}",
                ObjectKind::Image | ObjectKind::Field | ObjectKind::Other => "\u{fffc}",
            },
        }
    }
}

impl Table {
    /// Table whose grid has one default-width column per cell of the first row.
    pub fn new(rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(|row| row.cells.iter().map(|cell| cell.props.grid_span as usize).sum())
            .unwrap_or(0);
        Self {
            props: TableProps::default(),
            grid: vec![DEFAULT_COLUMN_WIDTH; columns],
            rows,
        }
    }
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            props: RowProps::default(),
            cells,
            revision: None,
        }
    }
}

impl Cell {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            props: CellProps::default(),
            blocks,
        }
    }

    /// Cell holding one plain paragraph.
    pub fn plain(text: &str) -> Self {
        Self::new(vec![Block::Paragraph(Paragraph::plain(text))])
    }
}

/// Iterator returned by [`Document::walk`].
#[derive(Debug, Clone)]
pub struct BlockWalk<'a> {
    stack: Vec<(Vec<usize>, std::iter::Enumerate<std::slice::Iter<'a, Block>>)>,
}

impl<'a> Iterator for BlockWalk<'a> {
    type Item = (BlockPath, &'a Block);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, blocks) = self.stack.last_mut()?;
            let Some((idx, block)) = blocks.next() else {
                self.stack.pop();
                continue;
            };
            let mut path = prefix.clone();
            path.push(idx);

            if let Block::Table(table) = block {
                // Reverse push keeps row 0 / cell 0 on top of the stack.
                for (row_idx, row) in table.rows.iter().enumerate().rev() {
                    for (cell_idx, cell) in row.cells.iter().enumerate().rev() {
                        let mut cell_prefix = path.clone();
                        cell_prefix.push(row_idx);
                        cell_prefix.push(cell_idx);
                        self.stack.push((cell_prefix, cell.blocks.iter().enumerate()));
                    }
                }
            }

            return Some((BlockPath(path), block));
        }
    }
}

/// Decode a JSON-encoded document and check its structural invariants.
pub fn load_json(bytes: &[u8]) -> Result<Document, ModelError> {
    let doc: Document = serde_json::from_slice(bytes)?;
    doc.validate()?;
    Ok(doc)
}

/// Encode a document as pretty-printed JSON.
pub fn save_json(doc: &Document) -> Result<Vec<u8>, ModelError> {
    Ok(serde_json::to_vec_pretty(doc)?)
}
