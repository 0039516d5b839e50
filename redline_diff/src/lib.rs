//! Comparison and revision synthesis for `redline_model::Document`.
//!
//! This crate flattens documents into atoms, computes a deterministic edit
//! script between them, and rebuilds one merged document in which every
//! difference is a tracked revision attributed to a configured author.
//!
//! Primary entrypoints:
//! - [`compare`]
//! - [`compare_batch`]
//! - [`format_markdown_report`]
//!
//! The stages are public as well: [`flatten`], [`diff_atoms`],
//! [`synthesize`] and [`extract`].
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use redline_diff::{CompareSettings, compare};
//! use redline_model::parse_plain;
//!
//! let original = parse_plain("The cat sat.\n").unwrap();
//! let modified = parse_plain("The dog sat.\n").unwrap();
//! let settings = CompareSettings::new("Reviewer")
//!     .with_date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
//!
//! let comparison = compare(&original, &modified, &settings).unwrap();
//! assert!(comparison.has_changes);
//! assert_eq!(comparison.revisions.len(), 2);
//! ```

mod boundary;
mod engine;
mod error;
mod extract;
mod flatten;
mod model;
mod report;
mod settings;
mod synthesize;

use std::borrow::Cow;

use chrono::Utc;
use rayon::prelude::*;
use redline_model::{Document, RevisionKind};
use tracing::{debug, info};

pub use engine::{diff_atoms, verify_partition};
pub use error::CompareError;
pub use extract::extract;
pub use flatten::flatten;
pub use model::{
    Atom, AtomKind, AtomPayload, CompareStats, Comparison, DiffOptions, EditOp, Finding,
    FindingLevel, Locale, Revision, RevisionScope, RevisionStamp, StructuralPath,
    derive_atom_key,
};
pub use report::format_markdown_report;
pub use settings::{CompareSettings, DEFAULT_AUTHOR, SettingsFile};
pub use synthesize::{STRUCTURE_REPLACED, Synthesis, synthesize};

/// Finding code recorded when an input already carried revisions.
pub const INPUT_REVISIONS_ACCEPTED: &str = "input_revisions_accepted";

/// Compare two documents and build the merged redline document.
///
/// Revisions already present in either input are accepted first. The result
/// is either complete or an error; no partial output is returned.
pub fn compare(
    original: &Document,
    modified: &Document,
    settings: &CompareSettings,
) -> Result<Comparison, CompareError> {
    settings.validate()?;
    original.validate()?;
    modified.validate()?;

    let mut findings = Vec::new();
    let original = accepted(original, "original", &mut findings);
    let modified = accepted(modified, "modified", &mut findings);

    let atoms_a = flatten(&original, settings.locale);
    let atoms_b = flatten(&modified, settings.locale);
    debug!(
        original = atoms_a.len(),
        modified = atoms_b.len(),
        "flattened documents"
    );

    let edits = diff_atoms(&atoms_a, &atoms_b, &settings.diff_options());
    verify_partition(&edits, atoms_a.len(), atoms_b.len())?;
    debug!(edits = edits.len(), "computed edit script");

    let stamp = RevisionStamp {
        author: settings.author.clone(),
        date: settings.date.unwrap_or_else(Utc::now),
    };
    let synthesis = synthesize(&original, &modified, &atoms_a, &atoms_b, &edits, &stamp)?;
    synthesis.merged.validate().map_err(|err| {
        CompareError::InvariantViolation(format!("merged document is malformed: {err}"))
    })?;
    findings.extend(synthesis.findings);

    let revisions = extract(&synthesis.merged);
    let stats = build_stats(&edits, &revisions, atoms_a.len(), atoms_b.len());
    info!(
        insertions = stats.insertions,
        deletions = stats.deletions,
        format_changes = stats.format_changes,
        findings = findings.len(),
        "comparison complete"
    );

    Ok(Comparison {
        has_changes: !revisions.is_empty(),
        merged: synthesis.merged,
        revisions,
        edits,
        stats,
        findings,
    })
}

/// Compare independent document pairs on the rayon pool.
///
/// Results are returned in input order.
pub fn compare_batch(
    pairs: &[(Document, Document)],
    settings: &CompareSettings,
) -> Vec<Result<Comparison, CompareError>> {
    pairs
        .par_iter()
        .map(|(original, modified)| compare(original, modified, settings))
        .collect()
}

fn accepted<'d>(
    doc: &'d Document,
    label: &str,
    findings: &mut Vec<Finding>,
) -> Cow<'d, Document> {
    if !doc.has_revisions() {
        return Cow::Borrowed(doc);
    }
    debug!(document = label, "accepting existing revisions");
    findings.push(Finding {
        code: INPUT_REVISIONS_ACCEPTED.to_string(),
        level: FindingLevel::Info,
        message: format!("revisions already present in the {label} document were accepted"),
        path: None,
    });
    Cow::Owned(doc.accept_all_revisions())
}

fn build_stats(
    edits: &[EditOp],
    revisions: &[Revision],
    original_atoms: usize,
    modified_atoms: usize,
) -> CompareStats {
    let mut stats = CompareStats {
        original_atoms,
        modified_atoms,
        ..CompareStats::default()
    };

    for edit in edits {
        match edit {
            EditOp::Copy { len, .. } => stats.copied_atoms += len,
            EditOp::Delete { len, .. } => stats.deleted_atoms += len,
            EditOp::Insert { len, .. } => stats.inserted_atoms += len,
        }
    }
    for revision in revisions {
        match revision.kind {
            RevisionKind::Insertion => stats.insertions += 1,
            RevisionKind::Deletion => stats.deletions += 1,
            RevisionKind::FormatChange => stats.format_changes += 1,
        }
    }

    stats
}

#[cfg(test)]
mod tests;
