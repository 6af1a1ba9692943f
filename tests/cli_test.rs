//! Binary tests for the action entry point

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::Command as StdCommand;
use std::thread;
use tempfile::TempDir;

const INPUT_VARIABLES: &[&str] = &[
    "GITHUB_TOKEN",
    "GITHUB_API_URL",
    "GITHUB_REPOSITORY_OWNER",
    "GITHUB_REPOSITORY",
    "GITHUB_WORKSPACE",
    "INPUT_REPO_ROOT",
    "INPUT_ACTIONS",
    "INPUT_ACTIONS_PATHS",
    "INPUT_DOCKERFILES",
    "INPUT_KUBERNETES",
    "INPUT_DOCKER_COMPOSE",
    "INPUT_OPEN_PR",
    "INPUT_FAIL_ON_UNPINNED",
    "INPUT_DRY_RUN",
    "INPUT_ACTIONS_EXCLUDE",
    "INPUT_ACTIONS_EXCLUDE_BRANCHES",
    "INPUT_IMAGES_EXCLUDE",
    "INPUT_IMAGES_EXCLUDE_TAGS",
    "INPUT_HOSTING_BACKEND",
    "INPUT_LOG_FORMAT",
    "RUST_LOG",
];

#[allow(deprecated)]
fn get_cmd() -> Command {
    let mut cmd = Command::cargo_bin("frizbee-action").unwrap();
    // Runs inside GitHub Actions must not pick up the runner's own context
    for name in INPUT_VARIABLES {
        cmd.env_remove(name);
    }
    cmd
}

fn init_git_repo(root: &Path) {
    StdCommand::new("git")
        .args(["init", "--initial-branch=main"])
        .current_dir(root)
        .output()
        .unwrap();
}

/// Answer every request on a local port with `body` as JSON
fn serve_json(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{}", address)
}

#[test]
fn test_missing_repository_is_an_initialization_error() {
    get_cmd()
        .env("GITHUB_REPOSITORY_OWNER", "stacklok")
        .assert()
        .code(4)
        .stdout(predicate::str::contains("Error initializing action"))
        .stdout(predicate::str::contains("GITHUB_REPOSITORY"));
}

#[test]
fn test_conflicting_actions_inputs() {
    get_cmd()
        .env("GITHUB_REPOSITORY_OWNER", "stacklok")
        .env("GITHUB_REPOSITORY", "stacklok/demo")
        .env("INPUT_ACTIONS", ".github/workflows")
        .env("INPUT_ACTIONS_PATHS", r#"["ci"]"#)
        .assert()
        .code(4)
        .stdout(predicate::str::contains(
            "cannot set both INPUT_ACTIONS and INPUT_ACTIONS_PATHS",
        ));
}

#[test]
fn test_root_must_be_a_repository() {
    let temp_dir = TempDir::new().unwrap();

    get_cmd()
        .env("GITHUB_REPOSITORY_OWNER", "stacklok")
        .env("GITHUB_REPOSITORY", "stacklok/demo")
        .env("INPUT_REPO_ROOT", temp_dir.path())
        .assert()
        .code(4)
        .stdout(predicate::str::contains("is not a git repository"));
}

#[test]
fn test_empty_workflows_directory_is_a_no_op() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    init_git_repo(root);
    fs::create_dir_all(root.join(".github/workflows")).unwrap();

    get_cmd()
        .env("GITHUB_REPOSITORY_OWNER", "stacklok")
        .env("GITHUB_REPOSITORY", "stacklok/demo")
        .env("INPUT_REPO_ROOT", root)
        .env("INPUT_OPEN_PR", "true")
        .env("INPUT_FAIL_ON_UNPINNED", "true")
        .env("GITHUB_TOKEN", "unused")
        .assert()
        .success()
        .stdout(predicate::str::contains("No files were processed"));
}

#[test]
fn test_local_actions_need_no_pinning() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    init_git_repo(root);
    fs::create_dir_all(root.join(".github/workflows")).unwrap();
    let workflow = "on: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: ./.github/actions/setup\n";
    fs::write(root.join(".github/workflows/ci.yml"), workflow).unwrap();

    get_cmd()
        .env("GITHUB_REPOSITORY_OWNER", "stacklok")
        .env("GITHUB_REPOSITORY", "stacklok/demo")
        .env("INPUT_REPO_ROOT", root)
        .env("INPUT_FAIL_ON_UNPINNED", "true")
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed the following files:"))
        .stdout(predicate::str::contains(".github/workflows/ci.yml"));

    assert_eq!(
        fs::read_to_string(root.join(".github/workflows/ci.yml")).unwrap(),
        workflow
    );
}

#[test]
fn test_unpinned_actions_fail_the_run() {
    let api_url = serve_json(
        r#"{"ref":"refs/tags/v4","object":{"sha":"11bd71901bbe5b1630ceea73d27597364c9af683","type":"commit"}}"#,
    );

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    init_git_repo(root);
    fs::create_dir_all(root.join(".github/workflows")).unwrap();
    let workflow = "on: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: actions/checkout@v4\n";
    fs::write(root.join(".github/workflows/ci.yml"), workflow).unwrap();

    get_cmd()
        .env("GITHUB_REPOSITORY_OWNER", "stacklok")
        .env("GITHUB_REPOSITORY", "stacklok/demo")
        .env("GITHUB_API_URL", &api_url)
        .env("INPUT_REPO_ROOT", root)
        .env("INPUT_FAIL_ON_UNPINNED", "true")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Modified the following files:"))
        .stdout(predicate::str::contains(
            "Unpinned actions or container images found",
        ))
        .stdout(predicate::str::contains("Error running action").not());

    // Without a pull request to open the tree is left as it was
    assert_eq!(
        fs::read_to_string(root.join(".github/workflows/ci.yml")).unwrap(),
        workflow
    );
}

#[test]
fn test_missing_scan_path_is_a_runtime_error() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    init_git_repo(root);

    get_cmd()
        .env("GITHUB_REPOSITORY_OWNER", "stacklok")
        .env("GITHUB_REPOSITORY", "stacklok/demo")
        .env("INPUT_REPO_ROOT", root)
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Error running action"));
}

#[test]
fn test_help_lists_inputs() {
    get_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("INPUT_OPEN_PR"));
}
