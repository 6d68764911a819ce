/*
 * end_to_end.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end tests for the koura command-line renderer.
 */

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Write `content` to `name` inside `dir`, returning the full path.
fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

fn run_koura(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_koura"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run koura")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout should be UTF-8")
}

#[test]
fn test_render_with_json_context() {
    let dir = TempDir::new().unwrap();
    let template = write_file(
        dir.path(),
        "greeting.template",
        "{% for name in names %}Hello {{name|capitalize}}\n{% endfor %}",
    );
    let context = write_file(dir.path(), "context.json", r#"{"names": ["alice", "bob"]}"#);

    let output = run_koura(&[
        template.to_str().unwrap(),
        "--context",
        context.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "koura failed: {:?}", output);
    assert_eq!(stdout_of(&output), "Hello ALICE\nHello BOB\n");
}

#[test]
fn test_render_with_yaml_context_and_defines() {
    let dir = TempDir::new().unwrap();
    let template = write_file(
        dir.path(),
        "page.template",
        "{{ site.title }} by {{ author }} ({{ year }})",
    );
    let context = write_file(
        dir.path(),
        "context.yaml",
        "site:\n  title: Notes\nauthor: nobody\n",
    );

    let output = run_koura(&[
        template.to_str().unwrap(),
        "-c",
        context.to_str().unwrap(),
        "-D",
        "author=Ana",
        "-D",
        "year=2025",
    ]);

    assert!(output.status.success(), "koura failed: {:?}", output);
    assert_eq!(stdout_of(&output), "Notes by Ana (2025)");
}

#[test]
fn test_render_to_output_file() {
    let dir = TempDir::new().unwrap();
    let template = write_file(dir.path(), "t.template", "Hello {{what}}");
    let out_path = dir.path().join("out.txt");

    let output = run_koura(&[
        template.to_str().unwrap(),
        "-D",
        "what=world",
        "-o",
        out_path.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "koura failed: {:?}", output);
    assert_eq!(stdout_of(&output), "");
    assert_eq!(fs::read_to_string(&out_path).unwrap(), "Hello world");
}

#[test]
fn test_render_error_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let template = write_file(dir.path(), "bad.template", "Hello {{ nobody }}");

    let output = run_koura(&[template.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown name: nobody"), "stderr: {}", stderr);
}

#[test]
fn test_max_depth_flag() {
    let dir = TempDir::new().unwrap();
    let template = write_file(
        dir.path(),
        "deep.template",
        "{% if x %}{% if x %}deep{% endif %}{% endif %}",
    );

    let output = run_koura(&[template.to_str().unwrap(), "-D", "x=1", "--max-depth", "1"]);
    assert!(!output.status.success());

    let output = run_koura(&[template.to_str().unwrap(), "-D", "x=1", "--max-depth", "2"]);
    assert!(output.status.success(), "koura failed: {:?}", output);
    assert_eq!(stdout_of(&output), "deep");
}
