//! Integration tests for the `lxfmt` binary entry point.
//!
//! Covers stdin formatting, the output modes over real files, and the exit
//! codes of usage errors and failing backends.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

const SOURCE: &str = "f = def_(lambda x: [if_[x] [print(x)].else_ [pass_], x])\n";
const FORMATTED: &str = "\
f = def_(lambda x: [
    if_[x] [
        print(x)
    ].else_ [
        pass_
    ],
    x
])
";

fn write_source(dir: &TempDir, name: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, SOURCE).expect("write source");
    path.to_str().expect("utf-8 temp path").to_owned()
}

#[test]
fn formats_stdin() {
    let mut command = cargo_bin_cmd!("lxfmt");
    command.write_stdin(SOURCE);
    command.assert().success().stdout(FORMATTED);
}

#[test]
fn diff_reports_changes_with_exit_code_one() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_source(&dir, "m.py");
    let mut command = cargo_bin_cmd!("lxfmt");
    command.args(["--diff", path.as_str()]);
    command
        .assert()
        .code(1)
        .stdout(contains(format!("--- {path} (original)")))
        .stdout(contains("+    ].else_ ["));
}

#[test]
fn in_place_rewrites_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_source(&dir, "m.py");
    let mut command = cargo_bin_cmd!("lxfmt");
    command.args(["-i", path.as_str()]);
    command.assert().success().stdout("");
    assert_eq!(fs::read_to_string(&path).expect("reread"), FORMATTED);
}

#[test]
fn parallel_files_print_in_order() {
    let dir = TempDir::new().expect("temp dir");
    let first = write_source(&dir, "a.py");
    let second = write_source(&dir, "b.py");
    let mut command = cargo_bin_cmd!("lxfmt");
    command.args(["-p", first.as_str(), second.as_str()]);
    command
        .assert()
        .success()
        .stdout(format!("{FORMATTED}{FORMATTED}"));
}

#[test]
fn in_place_with_stdin_is_rejected() {
    let mut command = cargo_bin_cmd!("lxfmt");
    command.arg("--in-place");
    command
        .assert()
        .code(2)
        .stderr(contains("cannot use --in-place or --diff flags"));
}

#[test]
fn exclusive_flags_are_rejected() {
    let mut command = cargo_bin_cmd!("lxfmt");
    command.args(["--in-place", "--quiet", "m.py"]);
    command.assert().code(2).stderr(contains("cannot be used with"));
}

#[test]
fn missing_backend_fails_the_job() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_source(&dir, "m.py");
    let mut command = cargo_bin_cmd!("lxfmt");
    command.args(["--adapter", "black", path.as_str()]);
    command.env("PATH", dir.path());
    command
        .assert()
        .code(2)
        .stderr(contains("failed to spawn backend `black`"));
}

#[cfg(unix)]
#[test]
fn failing_backend_is_logged_and_output_still_checked() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().expect("temp dir");
    let path = write_source(&dir, "m.py");
    let script = dir.path().join("black");
    fs::write(&script, "#!/bin/sh\ncat\nexit 1\n").expect("write backend");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod backend");

    let search_path = std::env::join_paths(
        std::iter::once(dir.path().to_path_buf())
            .chain(std::env::split_paths(&std::env::var_os("PATH").unwrap_or_default())),
    )
    .expect("join PATH");

    let mut command = cargo_bin_cmd!("lxfmt");
    command.args(["--adapter", "black", "--quiet", path.as_str()]);
    command.env("PATH", search_path);
    command
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("backend exits unexpectedly"));
}
