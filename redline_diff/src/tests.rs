use chrono::{TimeZone, Utc};
use redline_model::{
    Block, Cell, Document, ObjectKind, Paragraph, RevisionKind, Row, Run, RunFormat, Table,
    parse_plain,
};

use crate::boundary::split_text;
use crate::engine::normalize_ops;
use super::{
    AtomKind, CompareError, CompareSettings, DiffOptions, EditOp, INPUT_REVISIONS_ACCEPTED,
    Locale, RevisionScope, STRUCTURE_REPLACED, SettingsFile, compare, compare_batch, diff_atoms,
    flatten, verify_partition,
};

fn doc(text: &str) -> Document {
    parse_plain(text).expect("valid plain text")
}

fn settings() -> CompareSettings {
    CompareSettings::new("Reviewer").with_date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
}

fn pieces(text: &str, locale: Locale) -> Vec<&str> {
    split_text(text, locale)
        .into_iter()
        .map(|(_, range)| &text[range])
        .collect()
}

fn kinds(comparison: &super::Comparison) -> Vec<(RevisionKind, &str)> {
    comparison
        .revisions
        .iter()
        .map(|revision| (revision.kind, revision.text.as_str()))
        .collect()
}

fn assert_round_trips(original: &Document, modified: &Document) {
    let comparison = compare(original, modified, &settings()).expect("compare");
    assert_eq!(
        comparison.merged.accept_all_revisions().canonicalize(),
        modified.canonicalize()
    );
    assert_eq!(
        comparison.merged.reject_all_revisions().canonicalize(),
        original.canonicalize()
    );
}

#[test]
fn default_locale_keeps_contractions_and_hyphenated_words() {
    assert_eq!(
        pieces("don't re-run it...", Locale::Default),
        vec!["don't", " ", "re-run", " ", "it", "..."]
    );
}

#[test]
fn simple_locale_splits_on_every_joiner() {
    assert_eq!(
        pieces("don't re-run", Locale::Simple),
        vec!["don", "'", "t", " ", "re", "-", "run"]
    );
}

#[test]
fn cjk_locale_splits_each_ideograph() {
    assert_eq!(
        pieces("日本語 text", Locale::Cjk),
        vec!["日", "本", "語", " ", "text"]
    );
    assert_eq!(pieces("日本語", Locale::Default), vec!["日本語"]);
}

#[test]
fn split_pieces_cover_the_input() {
    let text = "  a, b;\tc--d ";
    let split = split_text(text, Locale::Default);
    let joined = split
        .iter()
        .map(|(_, range)| &text[range.clone()])
        .collect::<String>();
    assert_eq!(joined, text);
    assert_eq!(
        split.iter().take(3).map(|(kind, _)| *kind).collect::<Vec<_>>(),
        vec![AtomKind::Whitespace, AtomKind::Word, AtomKind::Punctuation]
    );
}

#[test]
fn flatten_ends_every_paragraph_with_a_mark() {
    let atoms = flatten(&doc("Hi there\n\n"), Locale::Default);
    let texts = atoms.iter().map(|atom| atom.text.as_str()).collect::<Vec<_>>();
    assert_eq!(texts, vec!["Hi", " ", "there", "\n", "\n"]);
    assert_eq!(atoms[3].kind, AtomKind::ParagraphEnd);
    assert_eq!(atoms[4].path.blocks.0, vec![1]);
}

#[test]
fn flatten_keys_depend_on_format_and_depth() {
    let plain = flatten(&doc("word\n"), Locale::Default);
    let bold = flatten(&doc("**word**\n"), Locale::Default);
    let cell = flatten(&doc("| word |\n"), Locale::Default);

    assert_eq!(plain[0].text, bold[0].text);
    assert_ne!(plain[0].key, bold[0].key);
    assert_eq!(cell[0].depth, 1);
    assert_ne!(plain[0].key, cell[0].key);
    assert_eq!(cell[0].path.blocks.0, vec![0, 0, 0, 0]);
}

#[test]
fn flatten_emits_objects_and_section_breaks() {
    let mut original = doc("a\n\u{c}\nb\n");
    original.blocks[0] = Block::Paragraph(Paragraph::new(vec![
        Run::text("a "),
        Run::object(ObjectKind::Image, "img1"),
    ]));
    let atoms = flatten(&original, Locale::Default);
    let atom_kinds = atoms.iter().map(|atom| atom.kind).collect::<Vec<_>>();
    assert_eq!(
        atom_kinds,
        vec![
            AtomKind::Word,
            AtomKind::Whitespace,
            AtomKind::Object,
            AtomKind::ParagraphEnd,
            AtomKind::SectionBreak,
            AtomKind::Word,
            AtomKind::ParagraphEnd,
        ]
    );
    assert_eq!(atoms[2].path.run, 1);
}

#[test]
fn diff_uses_anchors_at_or_above_the_threshold() {
    let a = flatten(&doc("a b c\n"), Locale::Default);
    let b = flatten(&doc("x b y\n"), Locale::Default);

    let detailed = diff_atoms(&a, &b, &DiffOptions::default());
    assert_eq!(
        detailed,
        vec![
            EditOp::Delete { a_start: 0, len: 1 },
            EditOp::Insert { b_start: 0, len: 1 },
            EditOp::Copy {
                a_start: 1,
                b_start: 1,
                len: 3
            },
            EditOp::Delete { a_start: 4, len: 1 },
            EditOp::Insert { b_start: 4, len: 1 },
            EditOp::Copy {
                a_start: 5,
                b_start: 5,
                len: 1
            },
        ]
    );

    let coarse = diff_atoms(
        &a,
        &b,
        &DiffOptions {
            detail_threshold: 4,
            parallel: false,
        },
    );
    assert_eq!(
        coarse,
        vec![
            EditOp::Delete { a_start: 0, len: 6 },
            EditOp::Insert { b_start: 0, len: 6 },
        ]
    );
}

#[test]
fn unchanged_paragraphs_are_copied_whole() {
    let a = flatten(&doc("same one\nold\nsame two\n"), Locale::Default);
    let b = flatten(&doc("same one\nnew\nsame two\n"), Locale::Default);

    let ops = diff_atoms(&a, &b, &DiffOptions::default());
    assert_eq!(
        ops,
        vec![
            EditOp::Copy {
                a_start: 0,
                b_start: 0,
                len: 4
            },
            EditOp::Delete { a_start: 4, len: 1 },
            EditOp::Insert { b_start: 4, len: 1 },
            EditOp::Copy {
                a_start: 5,
                b_start: 5,
                len: 5
            },
        ]
    );
    verify_partition(&ops, a.len(), b.len()).expect("partition");
}

#[test]
fn parallel_gaps_produce_the_same_script() {
    let a = flatten(&doc("one two\nthree four\nfive six\n"), Locale::Default);
    let b = flatten(&doc("one 2\nthree 4\nfive 6\n"), Locale::Default);

    let serial = diff_atoms(&a, &b, &DiffOptions::default());
    let parallel = diff_atoms(
        &a,
        &b,
        &DiffOptions {
            detail_threshold: 0,
            parallel: true,
        },
    );
    assert_eq!(serial, parallel);
}

#[test]
fn reversed_diff_mirrors_the_forward_script() {
    let a = flatten(&doc("The cat sat.\nkept\n"), Locale::Default);
    let b = flatten(&doc("The dog sat down.\nkept\n"), Locale::Default);

    let forward = diff_atoms(&a, &b, &DiffOptions::default());
    let backward = diff_atoms(&b, &a, &DiffOptions::default());
    assert_eq!(
        normalize_ops(forward.iter().map(EditOp::mirrored)),
        backward
    );
}

#[test]
fn normalize_orders_deletes_before_inserts_and_merges() {
    let ops = normalize_ops(vec![
        EditOp::Insert { b_start: 0, len: 1 },
        EditOp::Delete { a_start: 0, len: 2 },
        EditOp::Insert { b_start: 1, len: 1 },
        EditOp::Copy {
            a_start: 2,
            b_start: 2,
            len: 1,
        },
        EditOp::Copy {
            a_start: 3,
            b_start: 3,
            len: 0,
        },
        EditOp::Copy {
            a_start: 3,
            b_start: 3,
            len: 2,
        },
    ]);
    assert_eq!(
        ops,
        vec![
            EditOp::Delete { a_start: 0, len: 2 },
            EditOp::Insert { b_start: 0, len: 2 },
            EditOp::Copy {
                a_start: 2,
                b_start: 2,
                len: 3
            },
        ]
    );
}

#[test]
fn verify_partition_rejects_gaps_and_overlaps() {
    let short = [EditOp::Copy {
        a_start: 0,
        b_start: 0,
        len: 2,
    }];
    assert!(matches!(
        verify_partition(&short, 3, 2),
        Err(CompareError::InvariantViolation(_))
    ));

    let skipped = [EditOp::Delete { a_start: 1, len: 1 }];
    assert!(matches!(
        verify_partition(&skipped, 2, 0),
        Err(CompareError::InvariantViolation(_))
    ));

    let empty = [EditOp::Insert { b_start: 0, len: 0 }];
    assert!(verify_partition(&empty, 0, 0).is_err());
    assert!(verify_partition(&[], 0, 0).is_ok());
}

#[test]
fn word_replacement_yields_deletion_then_insertion() {
    let comparison = compare(&doc("The cat sat.\n"), &doc("The dog sat.\n"), &settings())
        .expect("compare");

    assert!(comparison.has_changes);
    assert_eq!(
        kinds(&comparison),
        vec![(RevisionKind::Deletion, "cat"), (RevisionKind::Insertion, "dog")]
    );
    assert_eq!(comparison.revisions[0].id, 1);
    assert_eq!(comparison.revisions[1].id, 2);
    assert!(comparison.revisions.iter().all(|rev| rev.author == "Reviewer"));
    assert_eq!(comparison.merged.to_string(), "The [-cat-]{+dog+} sat.\n");
    assert_eq!(comparison.stats.deletions, 1);
    assert_eq!(comparison.stats.insertions, 1);
}

#[test]
fn formatting_only_change_is_a_format_change() {
    let comparison =
        compare(&doc("**Hello**\n"), &doc("Hello\n"), &settings()).expect("compare");

    assert_eq!(kinds(&comparison), vec![(RevisionKind::FormatChange, "Hello")]);
    assert_round_trips(&doc("**Hello**\n"), &doc("Hello\n"));
}

#[test]
fn identical_documents_have_no_revisions() {
    let original = doc("Title\n\n| a | b |\n\u{c}\nclosing words\n");
    let comparison = compare(&original, &original, &settings()).expect("compare");

    assert!(!comparison.has_changes);
    assert!(comparison.revisions.is_empty());
    assert!(comparison.findings.is_empty());
    assert_eq!(comparison.merged, original);
    assert_eq!(
        comparison.edits,
        vec![EditOp::Copy {
            a_start: 0,
            b_start: 0,
            len: comparison.stats.original_atoms
        }]
    );
}

#[test]
fn deleted_paragraph_is_one_revision() {
    let original = doc("keep\ngone away\n");
    let modified = doc("keep\n");
    let comparison = compare(&original, &modified, &settings()).expect("compare");

    assert_eq!(
        kinds(&comparison),
        vec![(RevisionKind::Deletion, "gone away\n")]
    );
    assert_round_trips(&original, &modified);
}

#[test]
fn split_and_joined_paragraphs_round_trip() {
    assert_round_trips(&doc("x y\n"), &doc("x\ny\n"));
    assert_round_trips(&doc("x\ny\n"), &doc("x y\n"));
}

#[test]
fn added_row_is_a_row_insertion() {
    let original = doc("| a | b |\n| c | d |\n");
    let modified = doc("| a | b |\n| c | d |\n| e | f |\n");
    let comparison = compare(&original, &modified, &settings()).expect("compare");

    assert_eq!(comparison.revisions.len(), 1);
    let revision = &comparison.revisions[0];
    assert_eq!(revision.kind, RevisionKind::Insertion);
    assert_eq!(revision.scope, RevisionScope::Row);
    assert_eq!(revision.text, "e\tf");
    assert_eq!(revision.path.0, vec![0, 2]);
    assert_round_trips(&original, &modified);
}

#[test]
fn cell_edit_stays_inline() {
    let original = doc("| a | b |\n| c | d |\n");
    let modified = doc("| a | b |\n| c | x |\n");
    let comparison = compare(&original, &modified, &settings()).expect("compare");

    assert_eq!(
        kinds(&comparison),
        vec![(RevisionKind::Deletion, "d"), (RevisionKind::Insertion, "x")]
    );
    assert!(
        comparison
            .revisions
            .iter()
            .all(|rev| rev.scope == RevisionScope::Inline)
    );
    assert_round_trips(&original, &modified);
}

#[test]
fn column_change_replaces_the_table() {
    let original = doc("| a | b |\n");
    let modified = doc("| a | b | c |\n");
    let comparison = compare(&original, &modified, &settings()).expect("compare");

    assert_eq!(comparison.findings.len(), 1);
    assert_eq!(comparison.findings[0].code, STRUCTURE_REPLACED);
    assert_eq!(
        kinds(&comparison),
        vec![
            (RevisionKind::Deletion, "a\tb"),
            (RevisionKind::Insertion, "a\tb\tc")
        ]
    );
    assert_round_trips(&original, &modified);
}

#[test]
fn nested_table_edits_reach_the_inner_cell() {
    let nested = |text: &str| {
        Document::from_blocks(vec![Block::Table(Table::new(vec![Row::new(vec![
            Cell::new(vec![
                Block::Paragraph(Paragraph::plain("outer")),
                Block::Table(Table::new(vec![Row::new(vec![Cell::plain(text)])])),
            ]),
        ])]))])
    };
    let original = nested("old");
    let modified = nested("new");
    let comparison = compare(&original, &modified, &settings()).expect("compare");

    assert_eq!(
        kinds(&comparison),
        vec![(RevisionKind::Deletion, "old"), (RevisionKind::Insertion, "new")]
    );
    assert_eq!(comparison.revisions[0].path.0, vec![0, 0, 0, 1, 0, 0, 0]);
    assert!(comparison.findings.is_empty());
    assert_round_trips(&original, &modified);
}

#[test]
fn replaced_objects_are_not_format_changes() {
    let with_image = |token: &str| {
        Document::from_blocks(vec![Block::Paragraph(Paragraph::new(vec![
            Run::text("see "),
            Run::object(ObjectKind::Image, token),
        ]))])
    };
    let comparison = compare(&with_image("img1"), &with_image("img2"), &settings())
        .expect("compare");

    assert_eq!(
        kinds(&comparison),
        vec![
            (RevisionKind::Deletion, "\u{fffc}"),
            (RevisionKind::Insertion, "\u{fffc}")
        ]
    );
}

#[test]
fn formatting_change_inside_a_sentence() {
    let original = Document::from_blocks(vec![Block::Paragraph(Paragraph::new(vec![
        Run::text("a "),
        Run::formatted("big", RunFormat::bold()),
        Run::text(" deal"),
    ]))]);
    let modified = doc("a big deal\n");
    let comparison = compare(&original, &modified, &settings()).expect("compare");

    assert_eq!(kinds(&comparison), vec![(RevisionKind::FormatChange, "big")]);
    assert_round_trips(&original, &modified);
}

#[test]
fn italic_change_is_credited_to_the_chosen_author() {
    let original = doc("a big deal\n");
    let modified = Document::from_blocks(vec![Block::Paragraph(Paragraph::new(vec![
        Run::text("a "),
        Run::formatted("big", RunFormat::italic()),
        Run::text(" deal"),
    ]))]);
    let comparison =
        compare(&original, &modified, &settings().with_author("Editor")).expect("compare");

    assert_eq!(kinds(&comparison), vec![(RevisionKind::FormatChange, "big")]);
    assert_eq!(comparison.revisions[0].author, "Editor");
    assert_round_trips(&original, &modified);
}

#[test]
fn moved_paragraph_keeps_the_longest_block_run() {
    let a = flatten(&doc("p1\np2\np3\np4\n"), Locale::Default);
    let b = flatten(&doc("p2\np3\np4\np1\n"), Locale::Default);

    let ops = diff_atoms(&a, &b, &DiffOptions::default());
    assert_eq!(
        ops,
        vec![
            EditOp::Delete { a_start: 0, len: 2 },
            EditOp::Copy {
                a_start: 2,
                b_start: 0,
                len: 6
            },
            EditOp::Insert { b_start: 6, len: 2 },
        ]
    );
}

#[test]
fn section_break_removal_is_tracked() {
    let original = doc("one\n\u{c}\ntwo\n");
    let modified = doc("one\ntwo\n");
    let comparison = compare(&original, &modified, &settings()).expect("compare");

    assert_eq!(comparison.revisions.len(), 1);
    assert_eq!(comparison.revisions[0].scope, RevisionScope::SectionBreak);
    assert_eq!(comparison.revisions[0].kind, RevisionKind::Deletion);
    assert_round_trips(&original, &modified);
}

#[test]
fn existing_revisions_are_accepted_first() {
    let first = compare(&doc("The cat sat.\n"), &doc("The dog sat.\n"), &settings())
        .expect("compare");
    let comparison = compare(&doc("The dog sat.\n"), &first.merged, &settings())
        .expect("compare");

    assert!(!comparison.has_changes);
    assert_eq!(comparison.findings.len(), 1);
    assert_eq!(comparison.findings[0].code, INPUT_REVISIONS_ACCEPTED);
}

#[test]
fn empty_author_is_rejected() {
    let err = compare(
        &doc("a\n"),
        &doc("b\n"),
        &CompareSettings::new("  "),
    )
    .expect_err("empty author");
    assert!(matches!(err, CompareError::InvalidConfiguration(_)));
}

#[test]
fn ragged_table_is_malformed() {
    let mut ragged = Table::new(vec![
        Row::new(vec![Cell::plain("a"), Cell::plain("b")]),
        Row::new(vec![Cell::plain("c")]),
    ]);
    ragged.grid = vec![1000, 1000];
    let broken = Document::from_blocks(vec![Block::Table(ragged)]);

    let err = compare(&broken, &doc("a\n"), &settings()).expect_err("malformed");
    assert!(matches!(err, CompareError::MalformedDocument(_)));
}

#[test]
fn batch_results_keep_input_order() {
    let pairs = vec![
        (doc("a\n"), doc("b\n")),
        (doc("same\n"), doc("same\n")),
    ];
    let results = compare_batch(&pairs, &settings());

    assert_eq!(results.len(), 2);
    assert!(results[0].as_ref().expect("first").has_changes);
    assert!(!results[1].as_ref().expect("second").has_changes);
}

#[test]
fn settings_file_overrides_base_values() {
    let file = SettingsFile::from_toml_str(
        "author = \"Ann\"\ndetail_threshold = 3\nlocale = \"cjk\"\nparallel = true\n",
    )
    .expect("parse settings");
    let applied = file.apply(CompareSettings::default()).expect("apply");

    assert_eq!(applied.author, "Ann");
    assert_eq!(applied.detail_threshold, 3);
    assert_eq!(applied.locale, Locale::Cjk);
    assert!(applied.parallel);
}

#[test]
fn settings_file_rejects_bad_values() {
    let negative = SettingsFile::from_toml_str("detail_threshold = -1\n").expect("parse");
    assert!(matches!(
        negative.apply(CompareSettings::default()),
        Err(CompareError::InvalidConfiguration(_))
    ));

    assert!(SettingsFile::from_toml_str("colour = \"red\"\n").is_err());
    assert!(SettingsFile::from_toml_str("locale = \"klingon\"\n").is_err());

    let blank = SettingsFile::from_toml_str("author = \"\"\n").expect("parse");
    assert!(blank.apply(CompareSettings::default()).is_err());
}

#[test]
fn locale_parses_from_cli_names() {
    assert_eq!("simple".parse::<Locale>(), Ok(Locale::Simple));
    assert!("other".parse::<Locale>().is_err());
    assert_eq!(Locale::Cjk.to_string(), "cjk");
}
