use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use redline_diff::{CompareSettings, Locale, compare};
use redline_model::{RevisionKind, parse_plain};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Fixture {
    name: String,
    original: String,
    modified: String,
    #[serde(default)]
    detail_threshold: usize,
    #[serde(default)]
    locale: Locale,
    expected: Expected,
}

#[derive(Debug, Deserialize)]
struct Expected {
    has_changes: bool,
    revision_kinds: Vec<RevisionKind>,
    #[serde(default)]
    revision_texts: Option<Vec<String>>,
    #[serde(default)]
    finding_codes: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
    let fixtures_dir = repo_root.join("fixtures");

    let mut entries = fs::read_dir(&fixtures_dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.path());

    let mut checked = 0usize;
    for entry in entries {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let raw = fs::read_to_string(&path)?;
        let fixture: Fixture = serde_json::from_str(&raw)?;

        let original = parse_plain(&fixture.original)?;
        let modified = parse_plain(&fixture.modified)?;
        let settings = CompareSettings::new("Fixture")
            .with_detail_threshold(fixture.detail_threshold)
            .with_locale(fixture.locale)
            .with_date(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                    .single()
                    .ok_or("invalid fixture date")?,
            );
        let comparison = compare(&original, &modified, &settings)?;

        if comparison.has_changes != fixture.expected.has_changes {
            return Err(format!(
                "fixture {}: has_changes mismatch: expected {}, got {}",
                fixture.name, fixture.expected.has_changes, comparison.has_changes
            )
            .into());
        }

        let kinds = comparison
            .revisions
            .iter()
            .map(|revision| revision.kind)
            .collect::<Vec<_>>();
        if kinds != fixture.expected.revision_kinds {
            return Err(format!(
                "fixture {}: revision_kinds mismatch: expected {:?}, got {:?}",
                fixture.name, fixture.expected.revision_kinds, kinds
            )
            .into());
        }

        if let Some(expected_texts) = &fixture.expected.revision_texts {
            let texts = comparison
                .revisions
                .iter()
                .map(|revision| revision.text.clone())
                .collect::<Vec<_>>();
            if &texts != expected_texts {
                return Err(format!(
                    "fixture {}: revision_texts mismatch: expected {:?}, got {:?}",
                    fixture.name, expected_texts, texts
                )
                .into());
            }
        }

        let finding_codes = comparison
            .findings
            .iter()
            .map(|f| f.code.clone())
            .collect::<Vec<_>>();
        if finding_codes != fixture.expected.finding_codes {
            return Err(format!(
                "fixture {}: finding_codes mismatch: expected {:?}, got {:?}",
                fixture.name, fixture.expected.finding_codes, finding_codes
            )
            .into());
        }

        if comparison.merged.accept_all_revisions().canonicalize() != modified.canonicalize() {
            return Err(format!(
                "fixture {}: accepting revisions does not give the modified document",
                fixture.name
            )
            .into());
        }
        if comparison.merged.reject_all_revisions().canonicalize() != original.canonicalize() {
            return Err(format!(
                "fixture {}: rejecting revisions does not give the original document",
                fixture.name
            )
            .into());
        }

        checked += 1;
    }

    println!("replayed {checked} fixture(s)");
    Ok(())
}
