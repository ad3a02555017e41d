use crate::app::AppContext;
use crate::{cli, exit_codes, output};
use covert::Identity;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::process::ExitCode;

pub fn run(args: cli::KeygenArgs, mut ctx: AppContext) -> ExitCode {
    let identity = Identity::generate_with_rng(&mut *ctx.rng);
    let secret_hex = hex::encode(identity.secret_key());
    let public_hex = hex::encode(identity.public_key());

    if let Some(path) = &args.out {
        if let Err(error) = write_secret_file(path, &secret_hex) {
            eprintln!("Error: {error}");
            return ExitCode::from(exit_codes::EXIT_IO);
        }
        let pub_path = path.with_extension("pub");
        if let Err(error) = fs::write(&pub_path, format!("{public_hex}\n")) {
            eprintln!("Error: {error}");
            return ExitCode::from(exit_codes::EXIT_IO);
        }

        let meta = json!({
            "kind": "keygen",
            "secret_key_path": path.display().to_string(),
            "public_key_path": pub_path.display().to_string(),
            "public_key": public_hex,
        });
        output::print_value(public_hex, meta, &ctx.output_mode)
    } else {
        let meta = json!({
            "kind": "keygen",
            "secret_key": secret_hex,
            "public_key": public_hex,
        });
        println!("secret: {secret_hex}");
        output::print_value(format!("public: {public_hex}"), meta, &ctx.output_mode)
    }
}

#[cfg(unix)]
fn write_secret_file(path: &std::path::Path, secret_hex: &str) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)?;
    writeln!(file, "{secret_hex}")
}

#[cfg(not(unix))]
fn write_secret_file(path: &std::path::Path, secret_hex: &str) -> std::io::Result<()> {
    fs::write(path, format!("{secret_hex}\n"))
}
