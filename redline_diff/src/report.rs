use redline_model::RevisionKind;

use crate::model::{Comparison, Revision, RevisionScope};

/// Format a markdown-oriented human report from a comparison result.
pub fn format_markdown_report(
    comparison: &Comparison,
    left_label: &str,
    right_label: &str,
) -> String {
    let stats = &comparison.stats;
    let mut out = String::new();
    out.push_str("# Redline Report\n\n");
    out.push_str(&format!("- Original: `{left_label}`\n"));
    out.push_str(&format!("- Modified: `{right_label}`\n\n"));

    out.push_str("## Stats\n\n");
    out.push_str(&format!(
        "- Atoms: {} original, {} modified\n",
        stats.original_atoms, stats.modified_atoms
    ));
    out.push_str(&format!(
        "- Edit script: {} copied, {} deleted, {} inserted\n",
        stats.copied_atoms, stats.deleted_atoms, stats.inserted_atoms
    ));
    out.push_str(&format!(
        "- Revisions: {} insertion(s), {} deletion(s), {} format change(s)\n\n",
        stats.insertions, stats.deletions, stats.format_changes
    ));

    out.push_str("## Revisions\n\n");
    if comparison.revisions.is_empty() {
        out.push_str("No changes detected.\n");
    } else {
        for (idx, revision) in comparison.revisions.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", idx + 1, describe_revision(revision)));
        }
    }

    if !comparison.findings.is_empty() {
        out.push_str("\n## Findings\n\n");
        for finding in &comparison.findings {
            out.push_str(&format!(
                "- {:?} [{}]: {}\n",
                finding.level, finding.code, finding.message
            ));
        }
    }

    out
}

fn describe_revision(revision: &Revision) -> String {
    let kind = match revision.kind {
        RevisionKind::Insertion => "Insertion",
        RevisionKind::Deletion => "Deletion",
        RevisionKind::FormatChange => "Format change",
    };
    let scope = match revision.scope {
        RevisionScope::Inline => "",
        RevisionScope::Row => " (row)",
        RevisionScope::SectionBreak => " (section break)",
    };
    format!(
        "{kind}{scope} by {} at {}: \"{}\"",
        revision.author,
        revision.path,
        preview(&revision.text)
    )
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 60;
    let escaped = text
        .chars()
        .flat_map(|c| match c {
            '\n' => vec!['\u{b6}'],
            '\t' => vec![' '],
            '"' => vec!['\\', '"'],
            other => vec![other],
        })
        .collect::<String>();
    if escaped.chars().count() > MAX_CHARS {
        let cut = escaped.chars().take(MAX_CHARS).collect::<String>();
        format!("{cut}...")
    } else {
        escaped
    }
}
