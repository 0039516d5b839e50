use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use redline_model::{
    BlockPath, Document, ObjectRun, ParagraphProps, RevisionKind, RunFormat, SectionProps,
};
use serde::{Deserialize, Serialize};

/// Word-boundary policy used by the flattener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    /// Apostrophes and hyphens between letters stay inside the word.
    #[default]
    Default,
    /// Every non-alphanumeric character ends a word.
    Simple,
    /// As `Default`, with every CJK ideograph or kana as its own word.
    Cjk,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "default" => Ok(Locale::Default),
            "simple" => Ok(Locale::Simple),
            "cjk" => Ok(Locale::Cjk),
            other => Err(format!(
                "unknown locale `{other}` (expected default, simple or cjk)"
            )),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Locale::Default => "default",
            Locale::Simple => "simple",
            Locale::Cjk => "cjk",
        })
    }
}

/// Category of a comparable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomKind {
    Word,
    Punctuation,
    Whitespace,
    Object,
    ParagraphEnd,
    SectionBreak,
}

/// Position an atom was read from: the containing block, the run index
/// within the paragraph, and the byte offset within the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StructuralPath {
    pub blocks: BlockPath,
    pub run: usize,
    pub offset: usize,
}

/// Formatting carried by an atom, enough to rebuild the node it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomPayload {
    Text { format: RunFormat },
    Object(ObjectRun),
    ParagraphEnd(ParagraphProps),
    SectionBreak(SectionProps),
}

/// Smallest comparable unit of document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub kind: AtomKind,
    /// Hash of kind, table depth, text and formatting fingerprint.
    pub key: u64,
    pub text: String,
    /// Number of tables enclosing the atom.
    pub depth: usize,
    pub payload: AtomPayload,
    pub path: StructuralPath,
}

impl Atom {
    /// Index of the enclosing structure at table depth `level`:
    /// block (`part == 0`), row (`1`) or cell (`2`).
    pub(crate) fn index_at(&self, level: usize, part: usize) -> Option<usize> {
        self.path.blocks.0.get(level * 3 + part).copied()
    }
}

/// Derive an atom key from its kind, depth, formatting fingerprint, and text.
pub fn derive_atom_key(kind: AtomKind, depth: usize, fingerprint: &str, text: &str) -> u64 {
    let canonical = format!("k={kind:?}|d={depth}|f={fingerprint}|t={text}");
    xxhash_rust::xxh3::xxh3_64(canonical.as_bytes())
}

/// Edit script operation over two atom sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditOp {
    Copy {
        a_start: usize,
        b_start: usize,
        len: usize,
    },
    Delete {
        a_start: usize,
        len: usize,
    },
    Insert {
        b_start: usize,
        len: usize,
    },
}

impl EditOp {
    pub fn len(&self) -> usize {
        match *self {
            EditOp::Copy { len, .. } | EditOp::Delete { len, .. } | EditOp::Insert { len, .. } => {
                len
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The same operation seen from the other direction (B to A).
    pub fn mirrored(&self) -> EditOp {
        match *self {
            EditOp::Copy {
                a_start,
                b_start,
                len,
            } => EditOp::Copy {
                a_start: b_start,
                b_start: a_start,
                len,
            },
            EditOp::Delete { a_start, len } => EditOp::Insert {
                b_start: a_start,
                len,
            },
            EditOp::Insert { b_start, len } => EditOp::Delete {
                a_start: b_start,
                len,
            },
        }
    }

    /// Join `next` onto `self` when both are the same kind and contiguous.
    pub(crate) fn merge(&self, next: &EditOp) -> Option<EditOp> {
        match (*self, *next) {
            (
                EditOp::Copy {
                    a_start,
                    b_start,
                    len,
                },
                EditOp::Copy {
                    a_start: next_a,
                    b_start: next_b,
                    len: next_len,
                },
            ) if a_start + len == next_a && b_start + len == next_b => Some(EditOp::Copy {
                a_start,
                b_start,
                len: len + next_len,
            }),
            (
                EditOp::Delete { a_start, len },
                EditOp::Delete {
                    a_start: next_a,
                    len: next_len,
                },
            ) if a_start + len == next_a => Some(EditOp::Delete {
                a_start,
                len: len + next_len,
            }),
            (
                EditOp::Insert { b_start, len },
                EditOp::Insert {
                    b_start: next_b,
                    len: next_len,
                },
            ) if b_start + len == next_b => Some(EditOp::Insert {
                b_start,
                len: len + next_len,
            }),
            _ => None,
        }
    }
}

/// Options for [`crate::diff_atoms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffOptions {
    /// Matches shorter than this many atoms are not used as anchors.
    pub detail_threshold: usize,
    /// Diff independent gaps on the rayon pool.
    pub parallel: bool,
}

/// Author and timestamp stamped on every revision marker of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionStamp {
    pub author: String,
    pub date: DateTime<Utc>,
}

/// Scope of an extracted revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionScope {
    Inline,
    Row,
    SectionBreak,
}

/// One discrete change read back from a merged document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    pub id: u32,
    pub kind: RevisionKind,
    pub scope: RevisionScope,
    pub author: String,
    pub date: DateTime<Utc>,
    pub text: String,
    pub path: BlockPath,
}

/// Warning/info emitted when the synthesizer had to trade precision for correctness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub code: String,
    pub level: FindingLevel,
    pub message: String,
    pub path: Option<BlockPath>,
}

/// Severity level for a [`Finding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingLevel {
    Warning,
    Info,
}

/// Aggregate counters for a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CompareStats {
    pub original_atoms: usize,
    pub modified_atoms: usize,
    pub copied_atoms: usize,
    pub deleted_atoms: usize,
    pub inserted_atoms: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub format_changes: usize,
}

/// Top-level comparison output contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub has_changes: bool,
    pub merged: Document,
    pub revisions: Vec<Revision>,
    pub edits: Vec<EditOp>,
    pub stats: CompareStats,
    pub findings: Vec<Finding>,
}
