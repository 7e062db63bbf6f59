//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("kobopress")
}

/// A command whose config reads and writes stay inside `dir`.
fn cmd_with_config(dir: &TempDir) -> assert_cmd::Command {
    let mut command = cmd();
    command.env("KOBOPRESS_CONFIG_DIR", dir.path());
    command
}

const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Saved Article</title></head>
<body>
  <article data-testid="twitter-article">
    <h1 data-testid="twitter-article-title">Field Notes</h1>
    <a href="/janedoe" role="link">Jane Doe</a>
    <time datetime="2026-01-15T10:30:00.000Z">Jan 15</time>
    <div data-contents="true">
      <div data-block="true"><p>A paragraph long enough to count as real article
      content for the extraction heuristics, padded with several more words so
      the candidate clears the plausibility threshold comfortably.</p></div>
    </div>
  </article>
</body>
</html>"#;

#[test]
fn test_cli_help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_cli_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kobopress"));
}

#[test]
fn test_cli_convert_file_input() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("article.html");
    let output = tmp.path().join("out.kepub.epub");
    std::fs::write(&input, ARTICLE_HTML).unwrap();

    cmd_with_config(&tmp)
        .args([
            "convert",
            input.to_str().unwrap(),
            "--no-upload",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Conversion complete"));

    assert!(output.exists());
    let data = std::fs::read(&output).unwrap();
    // Zip magic, then the uncompressed mimetype entry near the front.
    assert_eq!(&data[..2], b"PK");
    assert!(data.windows(20).any(|w| w == b"application/epub+zip"));
}

#[test]
fn test_cli_convert_verbose_prints_steps() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("article.html");
    std::fs::write(&input, ARTICLE_HTML).unwrap();

    cmd_with_config(&tmp)
        .current_dir(tmp.path())
        .args(["convert", input.to_str().unwrap(), "--no-upload", "--verbose"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Kobopress"))
        .stderr(predicate::str::contains("Extracting content"));
}

#[test]
fn test_cli_convert_rejects_non_article_url() {
    let tmp = TempDir::new().unwrap();
    cmd_with_config(&tmp)
        .args(["convert", "https://example.com/blog/post", "--no-upload"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("X Article URL"));
}

#[test]
fn test_cli_convert_stdin_requires_url() {
    let tmp = TempDir::new().unwrap();
    cmd_with_config(&tmp)
        .args(["convert", "-", "--no-upload"])
        .write_stdin(ARTICLE_HTML)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--url"));
}

#[test]
fn test_cli_convert_missing_file() {
    let tmp = TempDir::new().unwrap();
    cmd_with_config(&tmp)
        .args(["convert", "nonexistent.html", "--no-upload"])
        .assert()
        .failure();
}

#[test]
fn test_cli_config_set_get_roundtrip() {
    let tmp = TempDir::new().unwrap();

    cmd_with_config(&tmp)
        .args(["config", "set", "no-upload", "true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set no-upload = true"));

    cmd_with_config(&tmp)
        .args(["config", "get", "no-upload"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no-upload: true"));
}

#[test]
fn test_cli_config_list_and_reset() {
    let tmp = TempDir::new().unwrap();

    cmd_with_config(&tmp)
        .args(["config", "set", "cookie", "auth_token=abc"])
        .assert()
        .success();

    cmd_with_config(&tmp)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cookie: auth_token=abc"));

    cmd_with_config(&tmp).args(["config", "reset"]).assert().success();

    cmd_with_config(&tmp)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No defaults configured."));
}

#[test]
fn test_cli_config_rejects_unknown_key() {
    let tmp = TempDir::new().unwrap();
    cmd_with_config(&tmp)
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Valid keys: output, no-upload, verbose, cookie"));
}

#[test]
fn test_cli_config_rejects_non_boolean_value() {
    let tmp = TempDir::new().unwrap();
    cmd_with_config(&tmp)
        .args(["config", "set", "verbose", "yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected \"true\" or \"false\""));
}

#[test]
fn test_cli_status_unconfigured() {
    let tmp = TempDir::new().unwrap();
    cmd_with_config(&tmp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dropbox: "))
        .stdout(predicate::str::contains("Not configured"));
}

#[test]
fn test_cli_completions_bash() {
    cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kobopress"));
}
