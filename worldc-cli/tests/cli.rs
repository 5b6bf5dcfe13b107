use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn worldc() -> Command {
    Command::cargo_bin("worldc").expect("binary exists")
}

#[test]
fn compiles_to_stdout() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("add.wc");
    fs::write(&input, "int add(int a, int b) { return a + b; }").expect("write input");

    worldc()
        .arg("compile")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "function add(a: number, b: number): number {",
        ));
}

#[test]
fn writes_project_to_out_dir() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("game.wc");
    fs::write(&input, "int x = 1.5;").expect("write input");
    let out = dir.path().join("out");

    worldc()
        .arg("compile")
        .arg(&input)
        .args(["--target", "ts", "--target", "as", "--source-map"])
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("worldc.manifest.json"));

    let code = fs::read_to_string(out.join("assembly").join("game.ts")).expect("read code");
    assert!(code.contains("<i32>1.5"));
    assert!(out.join("game.ts.map").exists());
    assert!(out.join("tsconfig.json").exists());
    assert!(out.join("asconfig.json").exists());
    assert!(out.join("package.json").exists());
}

#[test]
fn empty_source_fails() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("empty.wc");
    fs::write(&input, "").expect("write input");

    worldc()
        .arg("compile")
        .arg(&input)
        .arg("--json")
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"code\": \"EMPTY_TOKENS\""));
}

#[test]
fn check_reports_semantic_errors() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("bad.wc");
    fs::write(&input, "int f() { return y; }").expect("write input");

    worldc()
        .arg("check")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "bad.wc:1:18: error[SEMANTIC_ERROR]: undefined identifier `y`",
        ));
}

#[test]
fn check_accepts_valid_source() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("ok.wc");
    fs::write(&input, "edict int x = 5;").expect("write input");

    worldc()
        .arg("check")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok (0 warning(s))"));
}

#[test]
fn dumps_tokens() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("x.wc");
    fs::write(&input, "edict int x = 5;").expect("write input");

    worldc()
        .arg("tokens")
        .arg(&input)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("1:1\tEdict\t\"edict\"")
                .and(predicate::str::contains("1:15\tIntegerLiteral\t\"5\""))
                .and(predicate::str::contains("Eof")),
        );
}

#[test]
fn missing_file_is_reported() {
    worldc()
        .arg("ast")
        .arg("does-not-exist.wc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn rejects_unknown_target() {
    worldc()
        .args(["compile", "x.wc", "--target", "wasm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'wasm'"));
}

#[test]
fn verbose_logs_each_command() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("add.wc");
    fs::write(&input, "int add(int a, int b) { return a + b; }").expect("write input");

    worldc()
        .arg("--verbose")
        .arg("compile")
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("compiling add.wc to"));

    worldc()
        .args(["check", "--verbose"])
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("0 error(s), 0 warning(s)"));
}
