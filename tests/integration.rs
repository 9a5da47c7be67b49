/// Integration test suite: drives the compiled `go-delta` binary as a subprocess.
///
/// `CARGO_BIN_EXE_go-delta` is set by Cargo during `cargo test` to the binary for the
/// current profile. Every run gets a scrubbed environment (no CI variables, no GOROOT)
/// so results do not depend on where the suite is executed.
///
/// The end-to-end tests build a throwaway GOPATH with a git repository inside it and
/// are skipped when `git` is not on PATH.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_go-delta"))
}

const CI_VARS: &[&str] = &[
    "TRAVIS_PULL_REQUEST",
    "TRAVIS_COMMIT_RANGE",
    "CI_MERGE_REQUEST_DIFF_BASE_SHA",
    "CI_COMMIT_SHA",
];

fn base_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(binary());
    cmd.args(args)
        .current_dir(dir)
        .env_remove("GOROOT")
        .env_remove("GOPATH")
        .env_remove("GOOS")
        .env_remove("GOARCH")
        .env_remove("RUST_LOG");
    for var in CI_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Run go-delta in `dir` with `stdin` piped in.
fn run_with(mut cmd: Command, stdin: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to invoke go-delta binary");
    // Early failures exit before reading stdin; a broken pipe here is expected then.
    let _ = child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes());
    child.wait_with_output().expect("failed to wait for go-delta")
}

fn run(dir: &Path, args: &[&str], stdin: &str) -> Output {
    run_with(base_command(dir, args), stdin)
}

fn stdout_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

fn stderr_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn go_available() -> bool {
    Command::new("go")
        .args(["env", "GOROOT"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let out = Command::new("git")
        .args([
            "-c",
            "user.name=go-delta",
            "-c",
            "user.email=go-delta@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        out.status.success(),
        "git {:?} failed\nstderr: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A temporary GOPATH holding one git repository.
struct Workspace {
    _tmp: tempfile::TempDir,
    gopath: PathBuf,
    repo: PathBuf,
}

const PACKAGES: &str = "example.com/repo/tool\nexample.com/repo/app\n\nexample.com/repo/lib\n";

/// Create `example.com/repo` inside a fresh GOPATH and commit it:
///
/// - `app` imports `lib`
/// - `lib` imports `internal/util`
/// - `tool` imports nothing
fn workspace() -> Workspace {
    let tmp = tempfile::tempdir().unwrap();
    let gopath = tmp.path().canonicalize().unwrap();
    let repo = gopath.join("src/example.com/repo");

    write(
        &repo.join("app/main.go"),
        "package main\n\nimport \"example.com/repo/lib\"\n\nfunc main() { lib.Hello() }\n",
    );
    write(
        &repo.join("lib/lib.go"),
        "package lib\n\nimport \"example.com/repo/internal/util\"\n\nfunc Hello() string { return util.Name }\n",
    );
    write(
        &repo.join("internal/util/util.go"),
        "package util\n\nconst Name = \"util\"\n",
    );
    write(&repo.join("tool/tool.go"), "package tool\n\nfunc Run() {}\n");
    write(&repo.join("db/schema.sql"), "create table t (id int);\n");

    git(&repo, &["init", "-q"]);
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "-q", "-m", "initial"]);

    Workspace {
        _tmp: tmp,
        gopath,
        repo,
    }
}

fn commit_change(repo: &Path, file: &str, contents: &str) {
    write(&repo.join(file), contents);
    git(repo, &["add", "."]);
    git(repo, &["commit", "-q", "-m", "change"]);
}

fn affected(out: &Output) -> Vec<String> {
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout_of(out)).expect("--json output is not valid JSON");
    parsed["affected"]
        .as_array()
        .expect("JSON missing 'affected' array")
        .iter()
        .map(|v| v.as_str().unwrap().to_owned())
        .collect()
}

// ---------------------------------------------------------------------------
// Process contract
// ---------------------------------------------------------------------------

/// Outside a repository root the exit status is 2.
#[test]
fn test_not_a_repository_exits_2() {
    let tmp = tempfile::tempdir().unwrap();
    let out = run(tmp.path(), &[], "example.com/a\n");
    assert_eq!(out.status.code(), Some(2), "stderr: {}", stderr_of(&out));
    assert!(
        stderr_of(&out).contains("not a git repository root"),
        "stderr: {}",
        stderr_of(&out)
    );
}

/// A malformed config file is fatal.
#[test]
fn test_config_parse_error_exits_1() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir(tmp.path().join(".git")).unwrap();
    fs::write(tmp.path().join(".go-delta.toml"), "[deps\n").unwrap();

    let out = run(tmp.path(), &[], "example.com/a\n");
    assert_eq!(out.status.code(), Some(1));
    assert!(
        stderr_of(&out).contains("error parsing config"),
        "stderr: {}",
        stderr_of(&out)
    );
}

/// Unknown flags exit 1.
#[test]
fn test_bad_argument_exits_1() {
    let tmp = tempfile::tempdir().unwrap();
    let out = run(tmp.path(), &["--no-such-flag"], "");
    assert_eq!(out.status.code(), Some(1));
}

/// Without a commit range every input package is echoed back, sorted.
#[test]
fn test_no_range_prints_sorted_packages() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir(tmp.path().join(".git")).unwrap();

    let out = run(tmp.path(), &[], "example.com/b\n\nexample.com/a\n");
    assert!(out.status.success(), "stderr: {}", stderr_of(&out));
    assert_eq!(stdout_of(&out), "example.com/a\nexample.com/b\n");
}

/// `--json` without a commit range has no `affected` field.
#[test]
fn test_no_range_json() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir(tmp.path().join(".git")).unwrap();

    let out = run(tmp.path(), &["--json"], "example.com/b\nexample.com/a\n");
    assert!(out.status.success(), "stderr: {}", stderr_of(&out));
    let parsed: serde_json::Value = serde_json::from_str(&stdout_of(&out)).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!({"packages": ["example.com/a", "example.com/b"]})
    );
}

// ---------------------------------------------------------------------------
// End to end over a real git repository
// ---------------------------------------------------------------------------

/// A change deep in the import chain dirties everything above it.
#[test]
fn test_transitive_change() {
    if !git_available() {
        return;
    }
    let ws = workspace();
    commit_change(
        &ws.repo,
        "internal/util/util.go",
        "package util\n\nconst Name = \"changed\"\n",
    );

    let gopath = ws.gopath.to_str().unwrap();
    let out = run(
        &ws.repo,
        &["--from", "HEAD~1", "--to", "HEAD", "--gopath", gopath, "--json"],
        PACKAGES,
    );
    assert!(out.status.success(), "stderr: {}", stderr_of(&out));
    assert_eq!(
        affected(&out),
        vec![
            "example.com/repo/app",
            "example.com/repo/internal/util",
            "example.com/repo/lib"
        ]
    );
}

/// The plain output still lists every input package, whatever changed.
#[test]
fn test_plain_output_lists_all_packages() {
    if !git_available() {
        return;
    }
    let ws = workspace();
    commit_change(&ws.repo, "tool/tool.go", "package tool\n\nfunc Run() { }\n");

    let gopath = ws.gopath.to_str().unwrap();
    let out = run(&ws.repo, &["-f", "HEAD~1", "-t", "HEAD", "--gopath", gopath], PACKAGES);
    assert!(out.status.success(), "stderr: {}", stderr_of(&out));
    assert_eq!(
        stdout_of(&out),
        "example.com/repo/app\nexample.com/repo/lib\nexample.com/repo/tool\n"
    );
}

/// A non-Go file listed in the config dirties the packages its pattern selects.
#[test]
fn test_explicit_dependency() {
    if !git_available() {
        return;
    }
    let ws = workspace();
    write(
        &ws.repo.join(".go-delta.toml"),
        "[deps]\n\"db/schema.sql\" = \"./tool/...\"\n",
    );
    commit_change(&ws.repo, "db/schema.sql", "create table t (id bigint);\n");

    let gopath = ws.gopath.to_str().unwrap();
    let out = run(
        &ws.repo,
        &["--from", "HEAD~1", "--to", "HEAD", "--gopath", gopath, "--json"],
        PACKAGES,
    );
    assert!(out.status.success(), "stderr: {}", stderr_of(&out));
    assert_eq!(affected(&out), vec!["example.com/repo/tool"]);
}

/// The commit range can come from the CI environment.
#[test]
fn test_travis_range() {
    if !git_available() {
        return;
    }
    let ws = workspace();
    commit_change(&ws.repo, "lib/extra.go", "package lib\n\nfunc Extra() {}\n");

    let gopath = ws.gopath.to_str().unwrap();
    let mut cmd = base_command(&ws.repo, &["--gopath", gopath, "--json"]);
    cmd.env("TRAVIS_PULL_REQUEST", "42")
        .env("TRAVIS_COMMIT_RANGE", "HEAD~1...HEAD");
    let out = run_with(cmd, PACKAGES);
    assert!(out.status.success(), "stderr: {}", stderr_of(&out));
    assert_eq!(
        affected(&out),
        vec!["example.com/repo/app", "example.com/repo/lib"]
    );
}

/// An import that resolves nowhere fails the run with the package chain in the message.
#[test]
fn test_unresolvable_import_exits_1() {
    if !git_available() {
        return;
    }
    let ws = workspace();
    commit_change(
        &ws.repo,
        "tool/tool.go",
        "package tool\n\nimport \"example.com/missing\"\n\nfunc Run() { missing.X() }\n",
    );

    let gopath = ws.gopath.to_str().unwrap();
    let out = run(
        &ws.repo,
        &["--from", "HEAD~1", "--to", "HEAD", "--gopath", gopath],
        PACKAGES,
    );
    assert_eq!(out.status.code(), Some(1));
    let stderr = stderr_of(&out);
    assert!(
        stderr.contains("could not build dependency tree for example.com/repo/tool"),
        "stderr: {}",
        stderr
    );
}

/// A bad revision surfaces git's failure.
#[test]
fn test_bad_revision_exits_1() {
    if !git_available() {
        return;
    }
    let ws = workspace();
    let gopath = ws.gopath.to_str().unwrap();
    let out = run(
        &ws.repo,
        &["--from", "no-such-rev", "--to", "HEAD", "--gopath", gopath],
        PACKAGES,
    );
    assert_eq!(out.status.code(), Some(1));
    assert!(
        stderr_of(&out).contains("could not determine modified files"),
        "stderr: {}",
        stderr_of(&out)
    );
}

/// Without GOROOT the standard library is found through the installed go tool.
#[test]
fn test_standard_library_without_goroot() {
    if !git_available() || !go_available() {
        return;
    }
    let ws = workspace();
    commit_change(
        &ws.repo,
        "tool/tool.go",
        "package tool\n\nimport \"fmt\"\n\nfunc Run() { fmt.Println() }\n",
    );

    let gopath = ws.gopath.to_str().unwrap();
    let out = run(
        &ws.repo,
        &["--from", "HEAD~1", "--to", "HEAD", "--gopath", gopath, "--json"],
        PACKAGES,
    );
    assert!(out.status.success(), "stderr: {}", stderr_of(&out));
    assert_eq!(affected(&out), vec!["example.com/repo/tool"]);
}

/// Files for another platform do not take part in the graph.
#[test]
fn test_other_platform_files_ignored() {
    if !git_available() {
        return;
    }
    let ws = workspace();
    write(
        &ws.repo.join("tool/tool_windows.go"),
        "package tool\n\nimport \"golang.org/x/sys/windows\"\n",
    );
    commit_change(
        &ws.repo,
        "tool/tool_plan9.go",
        "package tool\n\nimport \"example.com/plan9only\"\n",
    );

    let gopath = ws.gopath.to_str().unwrap();
    let out = run(
        &ws.repo,
        &[
            "--from", "HEAD~1", "--to", "HEAD", "--gopath", gopath, "--goos", "linux", "--goarch",
            "amd64", "--json",
        ],
        PACKAGES,
    );
    assert!(out.status.success(), "stderr: {}", stderr_of(&out));
    assert_eq!(affected(&out), vec!["example.com/repo/tool"]);
}
