//! Runs the `sprig` binary against style sheets in a scratch project.

use std::path::Path;
use std::process::{Command, Output};

fn sprig(project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sprig"))
        .current_dir(project)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("main.css"),
        r#"
.logo { background: url(i/logo.png) no-repeat 0 0; }
.icon { background-image: url(i/icon.gif); }
"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("photo.css"),
        ".photo { background-image: url(i/photo.svg); }",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("bad.css"),
        ".x { background: url(i/x.png) 1px 2px 3px; }",
    )
    .unwrap();
    dir
}

#[test]
fn scan_lists_images_and_reuses_cache() {
    let dir = project();

    let first = sprig(dir.path(), &["scan", "main.css"]);
    assert_eq!(first.status.code(), Some(0));
    let text = stdout(&first);
    assert!(text.contains("2 image(s) to assemble"), "{text}");
    assert!(text.contains("logo.png"));
    assert!(!text.contains("(cached)"));
    assert!(dir.path().join(".sprig-cache").is_dir());

    let second = sprig(dir.path(), &["scan", "main.css"]);
    assert_eq!(second.status.code(), Some(0));
    assert!(stdout(&second).contains("(cached)"));
}

#[test]
fn validation_failure_exits_with_one() {
    let dir = project();
    let output = sprig(dir.path(), &["scan", "main.css", "bad.css"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("E202"), "{stderr}");
}

#[test]
fn skipped_image_warns_and_exits_with_zero() {
    let dir = project();
    let output = sprig(dir.path(), &["scan", "photo.css", "--color", "never"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("0 image(s) to assemble"));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("warning[W301]"), "{stderr}");
    assert!(stderr.contains("photo.svg"), "{stderr}");
}

#[test]
fn ignore_flag_and_json_report() {
    let dir = project();
    let output = sprig(
        dir.path(),
        &["scan", "main.css", "--ignore", "i/icon.gif", "--format", "json", "--no-cache"],
    );
    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files = report.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["failed"], false);
    assert_eq!(files[0]["images"].as_array().unwrap().len(), 1);
    assert!(!dir.path().join(".sprig-cache").exists());
}

#[test]
fn config_file_settings_apply() {
    let dir = project();
    std::fs::write(
        dir.path().join("sprig.toml"),
        "[cache]\nroot = \"build/cache\"\n\n[sprite]\nignore = [\"i/logo.png\"]\n",
    )
    .unwrap();

    let output = sprig(dir.path(), &["scan", "main.css"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("1 image(s) to assemble"));
    assert!(dir.path().join("build/cache").is_dir());
}

#[test]
fn clean_removes_cache() {
    let dir = project();
    sprig(dir.path(), &["scan", "main.css"]);
    assert!(dir.path().join(".sprig-cache").is_dir());

    let output = sprig(dir.path(), &["clean"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(!dir.path().join(".sprig-cache").exists());

    let again = sprig(dir.path(), &["clean"]);
    assert_eq!(again.status.code(), Some(0));
}
