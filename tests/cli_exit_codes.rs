use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

#[test]
fn keygen_succeeds() {
    Command::cargo_bin("covert")
        .expect("binary exists")
        .arg("keygen")
        .assert()
        .success();
}

#[test]
fn encrypt_wide_open_then_decrypt_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("message.txt");
    std::fs::write(&input, b"hello covert").unwrap();
    let container = dir.path().join("out.covert");
    let decoded = dir.path().join("decoded.txt");

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["encrypt", input.to_str().unwrap(), "-o", container.to_str().unwrap(), "--wide-open"])
        .assert()
        .success();

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["decrypt", container.to_str().unwrap(), "-o", decoded.to_str().unwrap(), "--wide-open"])
        .assert()
        .success();

    assert_eq!(std::fs::read(&decoded).unwrap(), b"hello covert");
}

#[test]
fn encrypt_without_recipients_or_wide_open_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("message.txt");
    std::fs::write(&input, b"hello").unwrap();
    let container = dir.path().join("out.covert");

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["encrypt", input.to_str().unwrap(), "-o", container.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no recipients"));
}

#[test]
fn decrypt_with_wrong_credential_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("message.txt");
    std::fs::write(&input, b"hello covert").unwrap();
    let container = dir.path().join("out.covert");
    let decoded = dir.path().join("decoded.txt");

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["encrypt", input.to_str().unwrap(), "-o", container.to_str().unwrap(), "--wide-open"])
        .assert()
        .success();

    let mut keygen = Command::cargo_bin("covert").expect("binary exists");
    let keyfile = dir.path().join("mallory.sec");
    keygen.args(["keygen", "--out", keyfile.to_str().unwrap()]).assert().success();

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["decrypt", container.to_str().unwrap(), "-o", decoded.to_str().unwrap(), "--key", keyfile.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn encrypt_decrypt_with_public_key_recipient() {
    let dir = tempfile::tempdir().unwrap();
    let keyfile = dir.path().join("bob.sec");
    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["keygen", "--out", keyfile.to_str().unwrap()])
        .assert()
        .success();
    let pubkey = std::fs::read_to_string(keyfile.with_extension("pub")).unwrap();
    let pubkey = pubkey.trim();

    let input = dir.path().join("secret.txt");
    std::fs::write(&input, b"for bob only").unwrap();
    let container = dir.path().join("out.covert");
    let decoded = dir.path().join("decoded.txt");

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["encrypt", input.to_str().unwrap(), "-o", container.to_str().unwrap(), "--to", pubkey])
        .assert()
        .success();

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["decrypt", container.to_str().unwrap(), "-o", decoded.to_str().unwrap(), "--key", keyfile.to_str().unwrap()])
        .assert()
        .success();

    assert_eq!(std::fs::read(&decoded).unwrap(), b"for bob only");
}

#[test]
fn sign_then_verify_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let signer_key = dir.path().join("signer.sec");
    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["keygen", "--out", signer_key.to_str().unwrap()])
        .assert()
        .success();
    let signer_pub = std::fs::read_to_string(signer_key.with_extension("pub")).unwrap();
    let signer_pub = signer_pub.trim();

    let input = dir.path().join("message.txt");
    std::fs::write(&input, b"signed message").unwrap();
    let container = dir.path().join("out.covert");

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["encrypt", input.to_str().unwrap(), "-o", container.to_str().unwrap(), "--wide-open"])
        .assert()
        .success();

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args([
            "sign",
            container.to_str().unwrap(),
            "--key",
            signer_key.to_str().unwrap(),
            "--wide-open",
        ])
        .assert()
        .success();

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["verify", container.to_str().unwrap(), "--signer", signer_pub, "--wide-open"])
        .assert()
        .success();
}

#[test]
fn decrypt_passphrase_reads_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("message.txt");
    std::fs::write(&input, b"hunter2 secrets").unwrap();
    let container = dir.path().join("out.covert");
    let decoded = dir.path().join("decoded.txt");

    let mut encrypt = Command::cargo_bin("covert").expect("binary exists");
    encrypt
        .args(["encrypt", input.to_str().unwrap(), "-o", container.to_str().unwrap(), "--passphrase"])
        .write_stdin("correct horse battery staple\ncorrect horse battery staple\n")
        .assert()
        .success();

    let mut decrypt = Command::cargo_bin("covert").expect("binary exists");
    decrypt
        .args(["decrypt", container.to_str().unwrap(), "-o", decoded.to_str().unwrap(), "--passphrase"])
        .write_stdin("correct horse battery staple\n")
        .assert()
        .success();

    assert_eq!(std::fs::read(&decoded).unwrap(), b"hunter2 secrets");
}

#[test]
fn armor_roundtrips_on_the_cli() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("message.txt");
    std::fs::write(&input, b"armored bytes").unwrap();
    let container = dir.path().join("out.txt");
    let decoded = dir.path().join("decoded.txt");

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["encrypt", input.to_str().unwrap(), "-o", container.to_str().unwrap(), "--wide-open", "--armor"])
        .assert()
        .success();

    let armored = std::fs::read_to_string(&container).unwrap();
    assert!(armored.is_ascii());

    Command::cargo_bin("covert")
        .expect("binary exists")
        .args(["decrypt", container.to_str().unwrap(), "-o", decoded.to_str().unwrap(), "--wide-open", "--armor"])
        .assert()
        .success();

    assert_eq!(std::fs::read(&decoded).unwrap(), b"armored bytes");
}

#[test]
fn short_passphrase_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("message.txt");
    std::fs::write(&input, b"hi").unwrap();
    let container = dir.path().join("out.covert");

    let mut cmd = Command::cargo_bin("covert").expect("binary exists");
    cmd.args(["encrypt", input.to_str().unwrap(), "-o", container.to_str().unwrap(), "--passphrase"])
        .write_stdin("short\nshort\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8 bytes"));
    let _ = std::io::stdout().flush();
}
