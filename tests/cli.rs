use std::path::Path;
use std::process::{Command, Output};

use httpmock::MockServer;
use serde_json::Value;
use tempfile::TempDir;

/// Runs the binary with a scratch HOME and none of the service env vars,
/// so no user config leaks into the test.
fn run_cmd(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_paperboy"))
        .args(args)
        .env("HOME", home)
        .env("RUST_LOG", "warn")
        .env_remove("PORT")
        .env_remove("TEMPLATES_DIR")
        .env_remove("GOTENBERG_URL")
        .env_remove("PDF_BACKEND")
        .env_remove("CHROME_PATH")
        .output()
        .expect("run paperboy")
}

fn parse_json(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("output should be valid JSON")
}

fn fixture() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let templates = dir.path().join("templates");
    std::fs::create_dir(&templates).unwrap();
    std::fs::write(
        templates.join("receipt.html"),
        "<h1>{{ shop }}</h1>{% for line in lines %}<p>{{ line }}</p>{% endfor %}",
    )
    .unwrap();
    std::fs::write(templates.join("blank.html"), "<p>blank</p>").unwrap();
    dir
}

#[test]
fn templates_lists_names_as_json() {
    let dir = fixture();
    let templates = dir.path().join("templates");

    let output = run_cmd(
        dir.path(),
        &["templates", "--templates-dir", templates.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(0));
    let json = parse_json(&output.stdout);
    assert_eq!(
        json,
        serde_json::json!([{"name": "blank.html"}, {"name": "receipt.html"}])
    );
}

#[test]
fn render_html_to_stdout_with_yaml_data() {
    let dir = fixture();
    let templates = dir.path().join("templates");
    let data = dir.path().join("data.yaml");
    std::fs::write(&data, "shop: Corner Store\nlines:\n  - milk\n  - bread\n").unwrap();

    let output = run_cmd(
        dir.path(),
        &[
            "render",
            "--template",
            "receipt.html",
            "--data",
            data.to_str().unwrap(),
            "--html",
            "--templates-dir",
            templates.to_str().unwrap(),
        ],
    );

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "<h1>Corner Store</h1><p>milk</p><p>bread</p>"
    );
}

#[test]
fn render_html_to_file_prints_status() {
    let dir = fixture();
    let templates = dir.path().join("templates");
    let out = dir.path().join("blank.out.html");

    let output = run_cmd(
        dir.path(),
        &[
            "render",
            "-t",
            "blank.html",
            "--html",
            "--templates-dir",
            templates.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ],
    );

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "<p>blank</p>");
    let status = parse_json(&output.stdout);
    assert_eq!(status["mode"], "render");
    assert_eq!(status["format"], "html");
    assert_eq!(status["bytes"], 12);
}

#[test]
fn render_pdf_through_gotenberg() {
    let dir = fixture();
    let templates = dir.path().join("templates");
    let out = dir.path().join("blank.pdf");
    let options = dir.path().join("options.json");
    std::fs::write(&options, r#"{"landscape": true}"#).unwrap();

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/forms/chromium/convert/html");
        then.status(200).body("%PDF-1.7\n%cli\n");
    });

    let output = run_cmd(
        dir.path(),
        &[
            "render",
            "--template",
            "blank.html",
            "--options",
            options.to_str().unwrap(),
            "--templates-dir",
            templates.to_str().unwrap(),
            "--backend",
            "gotenberg",
            "--gotenberg-url",
            &server.base_url(),
            "--output",
            out.to_str().unwrap(),
        ],
    );

    assert_eq!(output.status.code(), Some(0), "{:?}", output);
    assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF-"));
    assert_eq!(parse_json(&output.stdout)["format"], "pdf");
    mock.assert();
}

#[test]
fn missing_template_exits_2_with_error_json() {
    let dir = fixture();
    let templates = dir.path().join("templates");

    let output = run_cmd(
        dir.path(),
        &[
            "render",
            "--template",
            "ghost.html",
            "--html",
            "--templates-dir",
            templates.to_str().unwrap(),
        ],
    );

    assert_eq!(output.status.code(), Some(2));
    let json = parse_json(&output.stdout);
    assert_eq!(json["mode"], "error");
    assert_eq!(json["error"]["category"], "template");
    assert_eq!(json["message"], "Template with name ghost.html not found");
}

#[test]
fn invalid_options_fail_before_contacting_backend() {
    let dir = fixture();
    let templates = dir.path().join("templates");
    let options = dir.path().join("options.json");
    std::fs::write(&options, r#"{"paperWidth": 0}"#).unwrap();

    let output = run_cmd(
        dir.path(),
        &[
            "render",
            "--template",
            "blank.html",
            "--options",
            options.to_str().unwrap(),
            "--templates-dir",
            templates.to_str().unwrap(),
            "--gotenberg-url",
            "http://127.0.0.1:9",
        ],
    );

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(parse_json(&output.stdout)["error"]["category"], "options");
}

#[test]
fn missing_config_file_exits_2() {
    let dir = fixture();

    let output = run_cmd(
        dir.path(),
        &["--config", "/definitely/missing/paperboy.toml", "templates"],
    );

    assert_eq!(output.status.code(), Some(2));
    let json = parse_json(&output.stdout);
    assert_eq!(json["error"]["category"], "config");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("Failed to read config"));
}

#[test]
fn config_file_supplies_templates_dir() {
    let dir = fixture();
    let config = dir.path().join("paperboy.toml");
    std::fs::write(
        &config,
        format!(
            "[templates]\ndir = {:?}\n",
            dir.path().join("templates").to_str().unwrap()
        ),
    )
    .unwrap();

    let output = run_cmd(
        dir.path(),
        &["--config", config.to_str().unwrap(), "templates"],
    );

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(parse_json(&output.stdout).as_array().unwrap().len(), 2);
}
