use std::fs;
use std::path::Path;

use redline_model::{load_json, parse_plain, render_plain, save_json};

#[test]
fn round_trip_all_testdata_files() {
    let dir = Path::new("testdata");
    for entry in fs::read_dir(dir).expect("read testdata") {
        let entry = entry.expect("dir entry");
        let path = entry.path();
        if path.is_file() {
            let input = fs::read_to_string(&path).expect("read sample");
            let doc = parse_plain(&input).expect("parse sample");
            assert_eq!(
                render_plain(&doc),
                input,
                "round-trip mismatch for {}",
                path.display()
            );

            let json = save_json(&doc).expect("encode sample");
            let decoded = load_json(&json).expect("decode sample");
            assert_eq!(decoded, doc, "json mismatch for {}", path.display());
        }
    }
}
