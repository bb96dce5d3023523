use std::fs::File;
use std::io::Write;

use dro_config::{ScriptRow, load_write_script};
use rstest::rstest;
use tempfile::tempdir;

fn write_csv(body: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("writes.csv");
    let mut f = File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    (dir, path)
}

#[rstest]
fn loads_rows_in_order() {
    let (_dir, path) = write_csv("tick,attribute,value\n10,numerator,2\n10, set_position ,0\n40,reverse,1\n");
    let rows = load_write_script(&path).unwrap();
    assert_eq!(
        rows,
        vec![
            ScriptRow {
                tick: 10,
                attribute: "numerator".into(),
                value: "2".into()
            },
            ScriptRow {
                tick: 10,
                attribute: "set_position".into(),
                value: "0".into()
            },
            ScriptRow {
                tick: 40,
                attribute: "reverse".into(),
                value: "1".into()
            },
        ]
    );
}

#[rstest]
fn header_only_is_empty_script() {
    let (_dir, path) = write_csv("tick,attribute,value\n");
    assert!(load_write_script(&path).unwrap().is_empty());
}

#[rstest]
#[case("when,attribute,value\n1,numerator,2\n", "must have headers")]
#[case("tick,attribute,value\n5,numerator,2\n3,denominator,4\n", "non-decreasing")]
#[case("tick,attribute,value\nsoon,numerator,2\n", "invalid CSV row 2")]
#[case("tick,attribute,value\n1,,2\n", "empty attribute")]
fn rejects_bad_scripts(#[case] body: &str, #[case] expected: &str) {
    let (_dir, path) = write_csv(body);
    let err = load_write_script(&path).unwrap_err();
    assert!(format!("{err}").contains(expected), "got '{err}'");
}

#[rstest]
fn missing_file_names_the_path() {
    let err = load_write_script(std::path::Path::new("/nonexistent/writes.csv")).unwrap_err();
    assert!(format!("{err}").contains("open write script"));
}
