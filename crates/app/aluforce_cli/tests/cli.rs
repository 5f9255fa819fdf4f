use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("aluforce_cli").unwrap();
    cmd.env("RUST_LOG", "error");
    cmd
}

#[test]
fn version_prints_name_and_version() {
    cli()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("aluforce_cli "));
}

#[test]
fn hash_password_reads_stdin() {
    cli()
        .args(["hash-password", "--cost", "4"])
        .write_stdin("segredo-forte\n")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\$2[aby]\$04\$.{53}\n$").unwrap())
        .stdout(predicate::str::contains("segredo-forte").not());
}

#[test]
fn hash_password_rejects_short_input() {
    cli()
        .args(["hash-password", "--cost", "4"])
        .write_stdin("abc\n")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

#[test]
fn unknown_status_is_rejected_before_touching_the_database() {
    cli()
        .args(["set-status", "--email", "a@aluforce.ind.br", "--status", "ferias"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown user status"));
}

#[test]
fn unknown_module_is_rejected() {
    cli()
        .args(["grant", "--email", "a@aluforce.ind.br", "--module", "estoque"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown module"));
}
