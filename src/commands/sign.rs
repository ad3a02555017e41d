use crate::app::AppContext;
use crate::commands::{print_covert_error, read_identity_file};
use crate::{cli, exit_codes, output};
use covert::Credential;
use serde_json::json;
use std::fs;
use std::process::ExitCode;

pub fn run(args: cli::SignArgs, ctx: &AppContext) -> ExitCode {
    let mut credentials = Vec::new();
    if let Some(path) = &args.opening_key {
        match read_identity_file(path) {
            Ok(identity) => credentials.push(Credential::SecretKey(identity)),
            Err(error) => {
                eprintln!("Error: {error}");
                return ExitCode::from(exit_codes::EXIT_USAGE);
            }
        }
    }
    if args.wide_open {
        credentials.push(Credential::WideOpen);
    }
    if credentials.is_empty() {
        eprintln!("Error: --key-for-filehash or --wide-open is required to learn the file's filehash");
        return ExitCode::from(exit_codes::EXIT_USAGE);
    }

    let container = match fs::read(&args.file) {
        Ok(bytes) => bytes,
        Err(error) => {
            eprintln!("Error: reading {}: {error}", args.file.display());
            return ExitCode::from(exit_codes::EXIT_IO);
        }
    };

    let decrypted = match covert::decrypt(&container, &credentials) {
        Ok(decrypted) => decrypted,
        Err(error) => return print_covert_error(&error),
    };

    let signer = match read_identity_file(&args.key) {
        Ok(identity) => identity,
        Err(error) => {
            eprintln!("Error: {error}");
            return ExitCode::from(exit_codes::EXIT_USAGE);
        }
    };

    let (target_path, bytes) = if let Some(detached_path) = &args.detached {
        let detached = covert::signature::sign_detached(&decrypted.filehash, &signer);
        (detached_path.clone(), detached.to_vec())
    } else {
        let block = covert::signature::sign(&decrypted.filehash, &signer);
        let mut updated = container.clone();
        updated.extend_from_slice(&block);
        (args.file.clone(), updated)
    };

    if let Err(error) = fs::write(&target_path, &bytes) {
        eprintln!("Error: writing {}: {error}", target_path.display());
        return ExitCode::from(exit_codes::EXIT_IO);
    }

    let meta = json!({
        "kind": "sign",
        "file": args.file.display().to_string(),
        "target": target_path.display().to_string(),
        "detached": args.detached.is_some(),
        "signer_public_key": hex::encode(signer.public_key()),
    });
    output::print_value(format!("signed, wrote {}", target_path.display()), meta, &ctx.output_mode)
}
