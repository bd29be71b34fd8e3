//! Tests for source resources and their output modes.

use std::io::Read;

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

const SOURCE: &str = "f = def_(lambda: [a, b])\n";
const FORMATTED: &str = "f = def_(lambda: [\n    a,\n    b\n])\n";

struct SourceFile {
    _dir: TempDir,
    path: Utf8PathBuf,
}

#[fixture]
fn source_file() -> SourceFile {
    let dir = TempDir::new().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("module.py")).expect("utf-8 temp path");
    fs::write(&path, SOURCE).expect("write source");
    SourceFile { _dir: dir, path }
}

fn written(resource: &Resource, code: &str) -> String {
    let mut out = Vec::new();
    resource
        .write_formatted_code(code, &mut out)
        .expect("write formatted code");
    String::from_utf8(out).expect("utf-8 output")
}

#[test]
fn stdin_resource_reports_changes() {
    let resource = Resource::from_stdin(SOURCE.as_bytes(), OutputMode::Print).expect("read stdin");
    assert_eq!(resource.origin(), &Origin::Stdin);
    assert_eq!(resource.name(), "<stdin>");
    assert!(resource.is_changed(FORMATTED));
    assert!(!resource.is_changed(SOURCE));
}

#[test]
fn backend_output_is_read_back() {
    let mut resource = Resource::from_stdin(SOURCE.as_bytes(), OutputMode::Print).expect("read stdin");
    resource.set_backend_output(b"x = 1\ny = 2\n".to_vec());

    let mut stream = resource.backend_output_stream();
    let mut first = String::new();
    stream.read_line(&mut first).expect("first line");
    assert_eq!(first, "x = 1\n");
    let mut rest = String::new();
    stream.read_to_string(&mut rest).expect("rest");
    assert_eq!(rest, "y = 2\n");
}

#[test]
fn rejects_non_utf8_input() {
    let err = Resource::from_stdin(&b"\xff\xfe"[..], OutputMode::Print).expect_err("bad bytes");
    assert!(matches!(err, FmtError::Decode { .. }));
    assert!(err.to_string().starts_with("<stdin> is not valid UTF-8"));
}

#[test]
fn missing_file_is_a_read_error() {
    let err = Resource::from_file(Utf8Path::new("/nonexistent/lambdex/module.py"), OutputMode::Print)
        .expect_err("missing file");
    assert!(matches!(err, FmtError::Read { .. }));
}

#[rstest]
#[case::print(OutputMode::Print, FORMATTED)]
#[case::quiet(OutputMode::Quiet, "")]
fn writes_code_by_mode(#[case] mode: OutputMode, #[case] expected: &str) {
    let resource = Resource::from_stdin(SOURCE.as_bytes(), mode).expect("read stdin");
    assert_eq!(written(&resource, FORMATTED), expected);
}

#[rstest]
fn diff_names_both_sides(source_file: SourceFile) {
    let resource = Resource::from_file(&source_file.path, OutputMode::Diff).expect("read file");
    let diff = written(&resource, FORMATTED);
    assert!(diff.contains(&format!("--- {} (original)", source_file.path)));
    assert!(diff.contains(&format!("+++ {} (reformatted)", source_file.path)));
    assert!(diff.contains("-f = def_(lambda: [a, b])\n"));
    assert!(diff.contains("+    a,\n"));
}

#[rstest]
fn diff_is_empty_without_changes(source_file: SourceFile) {
    let resource = Resource::from_file(&source_file.path, OutputMode::Diff).expect("read file");
    assert_eq!(written(&resource, SOURCE), "");
}

#[rstest]
fn in_place_rewrites_changed_file(source_file: SourceFile) {
    let resource = Resource::from_file(&source_file.path, OutputMode::InPlace).expect("read file");
    assert_eq!(written(&resource, FORMATTED), "");
    assert_eq!(fs::read_to_string(&source_file.path).expect("reread"), FORMATTED);
}

#[rstest]
fn in_place_leaves_unchanged_file_alone(source_file: SourceFile) {
    let before = fs::metadata(&source_file.path)
        .and_then(|meta| meta.modified())
        .expect("mtime");
    let resource = Resource::from_file(&source_file.path, OutputMode::InPlace).expect("read file");
    assert_eq!(written(&resource, SOURCE), "");
    let after = fs::metadata(&source_file.path)
        .and_then(|meta| meta.modified())
        .expect("mtime");
    assert_eq!(before, after);
}
