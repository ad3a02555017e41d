use assert_cmd::Command;

#[test]
fn dev_seed_keygen_is_deterministic() {
    let first = Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["--dev-seed", "42", "keygen"])
        .output()
        .expect("keygen output");
    assert!(first.status.success());

    let second = Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["--dev-seed", "42", "keygen"])
        .output()
        .expect("keygen output");
    assert!(second.status.success());

    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn dev_seed_keygen_differs_across_seeds() {
    let first = Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["--dev-seed", "1", "keygen"])
        .output()
        .expect("keygen output");
    let second = Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["--dev-seed", "2", "keygen"])
        .output()
        .expect("keygen output");

    assert_ne!(first.stdout, second.stdout);
}

#[test]
fn dev_seed_encrypt_output_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("message.txt");
    std::fs::write(&input, b"deterministic payload").unwrap();
    let out_a = dir.path().join("a.covert");
    let out_b = dir.path().join("b.covert");

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args([
            "--dev-seed",
            "7",
            "encrypt",
            input.to_str().unwrap(),
            "-o",
            out_a.to_str().unwrap(),
            "--wide-open",
        ])
        .assert()
        .success();

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args([
            "--dev-seed",
            "7",
            "encrypt",
            input.to_str().unwrap(),
            "-o",
            out_b.to_str().unwrap(),
            "--wide-open",
        ])
        .assert()
        .success();

    assert_eq!(std::fs::read(&out_a).unwrap(), std::fs::read(&out_b).unwrap());
}

#[test]
fn dev_seed_warns_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let keyfile = dir.path().join("out.sec");
    let output = Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["--dev-seed", "3", "keygen", "--out", keyfile.to_str().unwrap()])
        .output()
        .expect("keygen output");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.to_lowercase().contains("dev-seed"));
    assert!(stderr.to_lowercase().contains("deterministic"));
}

#[test]
fn no_subcommand_prints_help_and_exits_usage() {
    let output = Command::cargo_bin("covert").expect("binary exists").output().expect("help output");
    assert_eq!(output.status.code(), Some(64));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("covert"));
}
