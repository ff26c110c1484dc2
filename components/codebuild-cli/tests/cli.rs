//! Binary-level checks that stop before any AWS call is made.

use assert_cmd::Command;

fn codebuild() -> Command {
    let mut cmd = Command::cargo_bin("codebuild").unwrap();
    for name in [
        "COMPUTE_TYPE",
        "SERVICE_ROLE",
        "ROLE_ARN",
        "SOURCE_TYPE",
        "SOURCE_LOCATION",
        "SOURCE_VERSION",
        "FOLLOW",
        "WAIT",
    ] {
        cmd.env_remove(name);
    }
    cmd
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_lists_the_flags() {
    let output = codebuild().arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--env", "--follow", "--wait", "--source-version", "--role-arn"] {
        assert!(stdout.contains(flag), "missing {flag} in help:\n{stdout}");
    }
}

#[test]
fn missing_project_exits_with_usage_code() {
    let output = codebuild().output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("PROJECT"));
}

#[test]
fn unknown_source_type_exits_with_usage_code() {
    let output = codebuild()
        .args(["--source-type", "SVN", "demo"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("Unknown source type: SVN"));
}

#[test]
fn invalid_boolean_from_environment_exits_with_usage_code() {
    let output = codebuild().env("WAIT", "maybe").arg("demo").output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("WAIT"));
}
