//! CLI smoke tests against the built binary.

use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn run(config_dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rendition-keys"))
        .arg("--config")
        .arg(config_dir.path())
        .args(args)
        .output()
        .expect("failed to run rendition-keys")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn sized_prints_storage_path() {
    let tmp = TempDir::new().unwrap();
    let output = run(
        &tmp,
        &["sized", "photos/cat.jpg", "--width", "400", "--height", "300", "--key", "crop"],
    );
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "__sized__/photos/cat-crop-400x300-70.jpg");
}

#[test]
fn filtered_prints_storage_path() {
    let tmp = TempDir::new().unwrap();
    let output = run(&tmp, &["filtered", "photos/cat.png", "--key", "invert"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "photos/__filtered__/cat__invert__.png");
}

#[test]
fn urls_prints_json_for_named_set() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[rendition_key_sets]\n\
         headshot = [[\"full\", \"url\"], [\"small\", \"thumbnail__10x10\"]]\n",
    )
    .unwrap();
    let output = run(&tmp, &["urls", "cat.jpg", "--set", "headshot"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["full"], "/media/cat.jpg");
    assert_eq!(json["small"], "/media/__sized__/cat-thumbnail-10x10-70.jpg");
}

#[test]
fn urls_with_unknown_set_fails() {
    let tmp = TempDir::new().unwrap();
    let output = run(&tmp, &["urls", "cat.jpg", "--set", "missing"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing"));
}

#[test]
fn check_fails_on_broken_set() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[rendition_key_sets]\ngood = [[\"full\", \"url\"]]\nbroken = [[\"x\", \"crop_400\"]]\n",
    )
    .unwrap();
    let output = run(&tmp, &["check"]);
    assert!(!output.status.success());
    let out = stdout(&output);
    assert!(out.contains("good (1 rendition)"));
    assert!(out.contains("rendition_key_sets.broken"));
}

#[test]
fn gen_config_output_parses() {
    let tmp = TempDir::new().unwrap();
    let output = run(&tmp, &["gen-config"]);
    assert!(output.status.success());
    let _: toml::Value = toml::from_str(&stdout(&output)).unwrap();
}
