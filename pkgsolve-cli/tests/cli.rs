//! Integration tests for the `pkgsolve` CLI.

use std::io::Write;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::NamedTempFile;

const INDEX: &str = r#"{
    "numpy-1.7.1-py27_0.tar.bz2": {"name": "numpy", "version": "1.7.1", "build": "py27_0", "build_number": 0, "depends": ["python 2.7*"]},
    "numpy-1.7.1-py33_0.tar.bz2": {"name": "numpy", "version": "1.7.1", "build": "py33_0", "build_number": 0, "depends": ["python 3.3*"]},
    "python-2.7.5-0.tar.bz2": {"name": "python", "version": "2.7.5", "build": "0", "build_number": 0},
    "python-3.3.2-0.tar.bz2": {"name": "python", "version": "3.3.2", "build": "0", "build_number": 0}
}"#;

fn index_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp index file");
    file.write_all(INDEX.as_bytes()).expect("failed to write temp index file");
    file
}

#[test]
fn solve_prints_the_resolved_filenames() {
    let index = index_file();

    let mut cmd = Command::cargo_bin("pkgsolve").unwrap();
    cmd.arg("solve").arg(index.path()).arg("numpy");

    cmd.assert()
        .success()
        .stdout(contains("numpy-1.7.1-py27_0.tar.bz2"))
        .stdout(contains("python-2.7.5-0.tar.bz2"));
}

#[test]
fn solve_honors_a_narrowing_spec() {
    let index = index_file();

    let mut cmd = Command::cargo_bin("pkgsolve").unwrap();
    cmd.arg("solve").arg(index.path()).arg("numpy").arg("python 3.3*");

    cmd.assert()
        .success()
        .stdout(contains("numpy-1.7.1-py33_0.tar.bz2"))
        .stdout(contains("python-3.3.2-0.tar.bz2"));
}

#[test]
fn solve_fails_on_unsatisfiable_requirements() {
    let index = index_file();

    let mut cmd = Command::cargo_bin("pkgsolve").unwrap();
    cmd.arg("solve").arg(index.path()).arg("python >=2.7,<2.8").arg("python 3.3*");

    cmd.assert().failure().stderr(contains("failed to solve dependencies"));
}

#[test]
fn solve_fails_on_unknown_package() {
    let index = index_file();

    let mut cmd = Command::cargo_bin("pkgsolve").unwrap();
    cmd.arg("solve").arg(index.path()).arg("ghostpkg");

    cmd.assert().failure().stderr(contains("no packages found"));
}

#[test]
fn find_matches_lists_every_candidate() {
    let index = index_file();

    let mut cmd = Command::cargo_bin("pkgsolve").unwrap();
    cmd.arg("find-matches").arg(index.path()).arg("numpy");

    cmd.assert()
        .success()
        .stdout(contains("numpy-1.7.1-py27_0.tar.bz2"))
        .stdout(contains("numpy-1.7.1-py33_0.tar.bz2"));
}

#[test]
fn solve_fails_on_missing_index_file() {
    let mut cmd = Command::cargo_bin("pkgsolve").unwrap();
    cmd.arg("solve").arg("/no/such/index.json").arg("numpy");

    cmd.assert().failure().stderr(contains("failed to read"));
}
