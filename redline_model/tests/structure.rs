use redline_model::{
    Block, BlockPath, Cell, CellProps, Document, DocumentMetadata, MAX_TABLE_DEPTH, ModelError,
    Numbering, Paragraph, ParagraphProps, Row, Run, RunFormat, Table, load_json, parse_plain,
    save_json,
};

fn nested_tables(depth: usize) -> Document {
    let mut block = Block::Paragraph(Paragraph::plain("core"));
    for _ in 0..depth {
        block = Block::Table(Table::new(vec![Row::new(vec![Cell::new(vec![block])])]));
    }
    Document::from_blocks(vec![block])
}

#[test]
fn walk_visits_blocks_in_document_order() {
    let doc = parse_plain("before\n| a | b |\n| c | d |\nafter\n").expect("parse");

    let paths = doc
        .walk()
        .map(|(path, _)| path.0)
        .collect::<Vec<_>>();
    assert_eq!(
        paths,
        vec![
            vec![0],
            vec![1],
            vec![1, 0, 0, 0],
            vec![1, 0, 1, 0],
            vec![1, 1, 0, 0],
            vec![1, 1, 1, 0],
            vec![2],
        ]
    );
}

#[test]
fn walk_is_restartable_and_cloneable() {
    let doc = parse_plain("one\ntwo\n").expect("parse");

    let mut walk = doc.walk();
    let first = walk.next().map(|(path, _)| path);
    let rest = walk.clone().count();
    assert_eq!(first, Some(BlockPath(vec![0])));
    assert_eq!(rest, 1);
    assert_eq!(walk.count(), 1);
    assert_eq!(doc.walk().count(), 2);
}

#[test]
fn block_path_reports_table_depth() {
    assert_eq!(BlockPath(vec![3]).table_depth(), 0);
    assert_eq!(BlockPath(vec![3, 0, 1, 0]).table_depth(), 1);
    assert_eq!(BlockPath(vec![3, 0, 1, 2, 1, 0, 0]).table_depth(), 2);
}

#[test]
fn accepts_nesting_up_to_the_limit() {
    assert!(nested_tables(MAX_TABLE_DEPTH).validate().is_ok());
}

#[test]
fn rejects_nesting_beyond_the_limit() {
    let err = nested_tables(MAX_TABLE_DEPTH + 1)
        .validate()
        .expect_err("too deep");
    assert!(matches!(err, ModelError::MalformedDocument { .. }));
}

#[test]
fn grid_spans_must_cover_the_grid() {
    let mut wide = Cell::plain("wide");
    wide.props = CellProps { grid_span: 2 };
    let table = Table {
        props: Default::default(),
        grid: vec![1000, 1000],
        rows: vec![
            Row::new(vec![wide]),
            Row::new(vec![Cell::plain("a"), Cell::plain("b")]),
        ],
    };
    assert!(Document::from_blocks(vec![Block::Table(table.clone())]).validate().is_ok());

    let mut broken = table;
    broken.rows[1].cells.pop();
    let err = Document::from_blocks(vec![Block::Table(broken)])
        .validate()
        .expect_err("short row");
    assert!(err.to_string().contains("/0/1"));
}

#[test]
fn cells_need_at_least_one_block() {
    let table = Table::new(vec![Row::new(vec![Cell::new(Vec::new())])]);
    let err = Document::from_blocks(vec![Block::Table(table)])
        .validate()
        .expect_err("empty cell");
    assert!(err.to_string().contains("holds no blocks"));
}

#[test]
fn numbering_level_is_bounded() {
    let props = ParagraphProps {
        numbering: Some(Numbering { id: 1, level: 9 }),
        ..ParagraphProps::default()
    };
    let doc = Document::from_blocks(vec![Block::Paragraph(Paragraph::with_props(
        props,
        vec![Run::text("item")],
    ))]);
    assert!(doc.validate().is_err());
}

#[test]
fn load_json_rejects_garbage_and_malformed_trees() {
    assert!(matches!(
        load_json(b"not json"),
        Err(ModelError::Decode(_))
    ));

    let json = r#"{"blocks":[{"table":{"grid":[1000],"rows":[]}}]}"#;
    assert!(matches!(
        load_json(json.as_bytes()),
        Err(ModelError::MalformedDocument { .. })
    ));
}

#[test]
fn load_json_fills_formatting_defaults() {
    let json = r#"{"blocks":[{"paragraph":{"content":[{"run":{"type":"text","text":"Hi","format":{"bold":true}}}]}}]}"#;
    let doc = load_json(json.as_bytes()).expect("load");

    let Block::Paragraph(paragraph) = &doc.blocks[0] else {
        panic!("expected a paragraph");
    };
    assert_eq!(paragraph.text(), "Hi");
    assert_eq!(
        paragraph.runs().next().and_then(Run::format),
        Some(&RunFormat::bold())
    );
}

#[test]
fn plain_text_lists_paragraphs_in_order() {
    let doc = parse_plain("a\n| b | c |\nd\n").expect("parse");
    assert_eq!(doc.plain_text(), "a\nb\nc\nd\n");
}

#[test]
fn new_document_keeps_metadata_through_json() {
    let doc = Document::new(DocumentMetadata {
        source_name: Some("memo.txt".to_string()),
    });
    doc.validate().expect("empty document is well-formed");
    assert_eq!(doc.plain_text(), "");
    assert!(!doc.has_revisions());

    let bytes = save_json(&doc).expect("save");
    let loaded = load_json(&bytes).expect("load");
    assert_eq!(loaded.metadata.source_name.as_deref(), Some("memo.txt"));
    assert!(loaded.blocks.is_empty());
}
