use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::tempdir;

fn run_apply(root: &Path, patch: &str, extra_args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_patchmark"));
    command.arg("apply").arg("--root").arg(root);
    for argument in extra_args {
        command.arg(argument);
    }
    command.stdin(Stdio::piped());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command.spawn().expect("failed to spawn patchmark binary");
    child
        .stdin
        .as_mut()
        .expect("stdin should be available")
        .write_all(patch.as_bytes())
        .expect("stdin write should succeed");
    child
        .wait_with_output()
        .expect("failed to read process output")
}

fn json_output(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_error_response(output: &Output, expected_type: &str, message_substring: &str) {
    assert!(!output.status.success(), "command should fail");
    let response = json_output(output);
    assert_eq!(response["error"]["type"], expected_type);
    let message = response["error"]["message"]
        .as_str()
        .expect("error message should be a string");
    assert!(
        message.contains(message_substring),
        "message should contain '{message_substring}', got '{message}'"
    );
}

#[test]
fn modify_with_context_rewrites_the_file() {
    let workspace = tempdir().expect("tempdir");
    fs::write(workspace.path().join("hello.txt"), "Hello\nWorld\n").expect("fixture write");

    let patch = "*** Begin Patch\n\
                 *** Update File: hello.txt\n\
                 --- a/hello.txt\n\
                 +++ b/hello.txt\n\
                 @@ -1,2 +1,2 @@\n\
                 -Hello\n\
                 +Hello there\n\
                 \x20World\n\
                 *** End Patch\n";
    let output = run_apply(workspace.path(), patch, &[]);
    assert_success(&output);

    let response = json_output(&output);
    assert_eq!(response["transaction"], "applied");
    assert_eq!(response["summary"]["files_changed"], 1);

    let contents = fs::read_to_string(workspace.path().join("hello.txt")).expect("read");
    assert_eq!(contents, "Hello there\nWorld\n");
}

#[test]
fn add_creates_a_new_file() {
    let workspace = tempdir().expect("tempdir");

    let patch = "*** Begin Patch\n\
                 *** Add File: greet.txt\n\
                 @@\n\
                 +Hello\n\
                 +World\n\
                 *** End Patch\n";
    let output = run_apply(workspace.path(), patch, &[]);
    assert_success(&output);

    let contents = fs::read_to_string(workspace.path().join("greet.txt")).expect("read");
    assert_eq!(contents, "Hello\nWorld\n");
}

#[test]
fn delete_removes_the_file() {
    let workspace = tempdir().expect("tempdir");
    fs::write(workspace.path().join("obsolete.txt"), "Goodbye\nWorld\n").expect("fixture write");

    let patch = "*** Begin Patch\n\
                 --- a/obsolete.txt\n\
                 +++ /dev/null\n\
                 @@ -1,2 +0,0 @@\n\
                 -Goodbye\n\
                 -World\n\
                 *** End Patch\n";
    let output = run_apply(workspace.path(), patch, &[]);
    assert_success(&output);
    assert!(!workspace.path().join("obsolete.txt").exists());
}

#[cfg(unix)]
#[test]
fn rename_with_edit_inherits_source_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let workspace = tempdir().expect("tempdir");
    let source = workspace.path().join("foo.txt");
    fs::write(&source, "foo\n").expect("fixture write");
    fs::set_permissions(&source, fs::Permissions::from_mode(0o755)).expect("chmod");

    let patch = "*** Begin Patch\n\
                 --- a/foo.txt\n\
                 +++ b/bar.txt\n\
                 @@ -1,1 +1,1 @@\n\
                 -foo\n\
                 +bar\n\
                 *** End Patch\n";
    let output = run_apply(workspace.path(), patch, &[]);
    assert_success(&output);

    assert!(!source.exists());
    let dest = workspace.path().join("bar.txt");
    assert_eq!(fs::read_to_string(&dest).expect("read"), "bar\n");
    let mode = fs::metadata(&dest).expect("metadata").permissions().mode() & 0o7777;
    assert_eq!(mode, 0o755);
}

#[test]
fn header_line_number_disambiguates_repeated_runs() {
    let workspace = tempdir().expect("tempdir");
    fs::write(workspace.path().join("dup.txt"), "foo\nbar\nbaz\nbar\nqux").expect("fixture write");

    let patch = "*** Begin Patch\n\
                 --- a/dup.txt\n\
                 +++ b/dup.txt\n\
                 @@ -4,1 +4,1 @@\n\
                 -bar\n\
                 +BAR\n\
                 *** End Patch\n";
    let output = run_apply(workspace.path(), patch, &[]);
    assert_success(&output);

    let contents = fs::read_to_string(workspace.path().join("dup.txt")).expect("read");
    assert_eq!(contents, "foo\nbar\nbaz\nBAR\nqux");
}

#[test]
fn ambiguous_match_is_rejected_and_the_file_untouched() {
    let workspace = tempdir().expect("tempdir");
    let target = workspace.path().join("repeated.txt");
    let original = "beta\nbeta\nbeta\nbeta\nbeta\nbeta\n";
    fs::write(&target, original).expect("fixture write");

    let patch = "*** Begin Patch\n\
                 *** Update File: repeated.txt\n\
                 @@\n\
                 -beta\n\
                 +gamma\n\
                 *** End Patch\n";
    let output = run_apply(workspace.path(), patch, &[]);
    assert_error_response(&output, "validation_failed", "ambiguous hunk match");
    assert_eq!(fs::read_to_string(&target).expect("read"), original);
}

#[test]
fn dry_run_validates_without_writing() {
    let workspace = tempdir().expect("tempdir");
    fs::write(workspace.path().join("hello.txt"), "Hello\nWorld\n").expect("fixture write");

    let patch = "*** Begin Patch\n\
                 *** Update File: hello.txt\n\
                 @@\n\
                 -Hello\n\
                 +Hi\n\
                 \x20World\n\
                 *** End Patch\n";
    let output = run_apply(workspace.path(), patch, &["--dry-run"]);
    assert_success(&output);

    let response = json_output(&output);
    assert_eq!(response["transaction"], "dry_run");
    let contents = fs::read_to_string(workspace.path().join("hello.txt")).expect("read");
    assert_eq!(contents, "Hello\nWorld\n");
}

#[test]
fn verbose_output_lists_per_directive_results() {
    let workspace = tempdir().expect("tempdir");

    let patch = "*** Begin Patch\n\
                 *** Add File: one.txt\n\
                 @@\n\
                 +1\n\
                 *** Add File: two.txt\n\
                 @@\n\
                 +2\n\
                 *** End Patch\n";
    let output = run_apply(workspace.path(), patch, &["--verbose"]);
    assert_success(&output);

    let response = json_output(&output);
    let applied = response["applied"].as_array().expect("applied array");
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[0]["operation"], "add");
    assert_eq!(applied[0]["path"], "one.txt");
}

#[test]
fn context_tolerance_flag_recovers_drifted_context() {
    let workspace = tempdir().expect("tempdir");
    fs::write(workspace.path().join("code.txt"), "drifted\nkeep\ntail\n").expect("fixture write");

    let patch = "*** Begin Patch\n\
                 *** Update File: code.txt\n\
                 @@\n\
                 \x20stale\n\
                 -keep\n\
                 +KEEP\n\
                 *** End Patch\n";

    let strict = run_apply(workspace.path(), patch, &[]);
    assert_error_response(&strict, "validation_failed", "context mismatch");

    let tolerant = run_apply(workspace.path(), patch, &["--context-tolerance", "1"]);
    assert_success(&tolerant);
    let contents = fs::read_to_string(workspace.path().join("code.txt")).expect("read");
    assert_eq!(contents, "drifted\nKEEP\ntail\n");
}

#[test]
fn whitespace_flag_relaxes_line_comparison() {
    let workspace = tempdir().expect("tempdir");
    fs::write(workspace.path().join("indent.txt"), "    value\n").expect("fixture write");

    let patch = "*** Begin Patch\n\
                 *** Update File: indent.txt\n\
                 @@\n\
                 -value\n\
                 +replaced\n\
                 *** End Patch\n";

    let strict = run_apply(workspace.path(), patch, &[]);
    assert_error_response(&strict, "validation_failed", "context mismatch");

    let loose = run_apply(workspace.path(), patch, &["--whitespace", "ignore-all"]);
    assert_success(&loose);
    let contents = fs::read_to_string(workspace.path().join("indent.txt")).expect("read");
    assert_eq!(contents, "replaced\n");
}

#[test]
fn sandbox_rejects_paths_that_climb_out_of_the_root() {
    let outer = tempdir().expect("tempdir");
    let root = outer.path().join("root");
    fs::create_dir(&root).expect("mkdir");

    let patch = "*** Begin Patch\n\
                 *** Add File: ../escape.txt\n\
                 @@\n\
                 +payload\n\
                 *** End Patch\n";
    let output = run_apply(&root, patch, &["--sandbox"]);
    assert_error_response(&output, "io_error", "outside the sandbox");
    assert!(!outer.path().join("escape.txt").exists());
}

#[cfg(unix)]
#[test]
fn sandbox_rejects_paths_through_an_escaping_symlink() {
    let outer = tempdir().expect("tempdir");
    let root = outer.path().join("root");
    let elsewhere = outer.path().join("elsewhere");
    fs::create_dir(&root).expect("mkdir");
    fs::create_dir(&elsewhere).expect("mkdir");
    fs::write(elsewhere.join("target.txt"), "secret\n").expect("fixture write");
    std::os::unix::fs::symlink(&elsewhere, root.join("link")).expect("symlink");

    let patch = "*** Begin Patch\n\
                 *** Update File: link/target.txt\n\
                 @@\n\
                 -secret\n\
                 +leaked\n\
                 *** End Patch\n";
    let output = run_apply(&root, patch, &["--sandbox"]);
    assert_error_response(&output, "io_error", "outside the sandbox");
    assert_eq!(
        fs::read_to_string(elsewhere.join("target.txt")).expect("read"),
        "secret\n"
    );
}

#[test]
fn failure_mid_plan_keeps_earlier_directives() {
    let workspace = tempdir().expect("tempdir");
    fs::write(workspace.path().join("first.txt"), "alpha\n").expect("fixture write");

    let patch = "*** Begin Patch\n\
                 *** Update File: first.txt\n\
                 @@\n\
                 -alpha\n\
                 +ALPHA\n\
                 *** Update File: missing.txt\n\
                 @@\n\
                 -never\n\
                 +mind\n\
                 *** End Patch\n";
    let output = run_apply(workspace.path(), patch, &[]);
    assert_error_response(&output, "validation_failed", "does not exist");

    let contents = fs::read_to_string(workspace.path().join("first.txt")).expect("read");
    assert_eq!(contents, "ALPHA\n", "the first directive stays applied");
}
