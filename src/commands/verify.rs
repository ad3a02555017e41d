use crate::app::AppContext;
use crate::commands::{print_covert_error, read_identity_file};
use crate::{cli, exit_codes, output, prompt};
use covert::Credential;
use secrecy::ExposeSecret;
use serde_json::json;
use std::fs;
use std::process::ExitCode;

pub fn run(args: cli::VerifyArgs, ctx: &AppContext) -> ExitCode {
    let signer_pk = match super::parse_public_key(&args.signer) {
        Ok(key) => key,
        Err(error) => {
            eprintln!("Error: {error}");
            return ExitCode::from(exit_codes::EXIT_USAGE);
        }
    };

    let mut credentials = Vec::new();
    for path in &args.keys {
        match read_identity_file(path) {
            Ok(identity) => credentials.push(Credential::SecretKey(identity)),
            Err(error) => {
                eprintln!("Error: {error}");
                return ExitCode::from(exit_codes::EXIT_USAGE);
            }
        }
    }
    for _ in 0..args.passphrase {
        match prompt::prompt_passphrase("Passphrase: ") {
            Ok(pw) => credentials.push(Credential::passphrase(pw.expose_secret())),
            Err(error) => {
                eprintln!("Error: {error}");
                return exit_codes::exit_code_for_prompt_error(&error);
            }
        }
    }
    if args.wide_open {
        credentials.push(Credential::WideOpen);
    }

    let raw = match fs::read(&args.file) {
        Ok(bytes) => bytes,
        Err(error) => {
            eprintln!("Error: reading {}: {error}", args.file.display());
            return ExitCode::from(exit_codes::EXIT_IO);
        }
    };
    let container = if args.armor {
        let text = match String::from_utf8(raw) {
            Ok(text) => text,
            Err(_) => {
                eprintln!("Error: armored input is not valid UTF-8");
                return ExitCode::from(exit_codes::EXIT_USAGE);
            }
        };
        match covert::armor::decode(&text) {
            Ok(bytes) => bytes,
            Err(error) => {
                eprintln!("Error: invalid armor: {error}");
                return ExitCode::from(exit_codes::EXIT_USAGE);
            }
        }
    } else {
        raw
    };

    let decrypted = match covert::decrypt(&container, &credentials) {
        Ok(decrypted) => decrypted,
        Err(error) => return print_covert_error(&error),
    };

    let verified = if let Some(detached_path) = &args.detached {
        let detached_bytes = match fs::read(detached_path) {
            Ok(bytes) => bytes,
            Err(error) => {
                eprintln!("Error: reading {}: {error}", detached_path.display());
                return ExitCode::from(exit_codes::EXIT_IO);
            }
        };
        match <[u8; covert::signature::DETACHED_LEN]>::try_from(detached_bytes.as_slice()) {
            Ok(detached) => covert::signature::verify_detached(&detached, &signer_pk, &decrypted.filehash).is_ok(),
            Err(_) => false,
        }
    } else {
        match covert::signature_trailer(&container, &credentials) {
            Ok(trailer) => covert::verify_appended_signatures(trailer, &decrypted.filehash, &signer_pk),
            Err(_) => false,
        }
    };

    let meta = json!({
        "kind": "verify",
        "file": args.file.display().to_string(),
        "signer_public_key": args.signer,
        "valid": verified,
    });

    if !verified {
        eprintln!("Error: signature did not verify");
    }
    output::print_value(if verified { "valid signature" } else { "invalid signature" }.to_string(), meta, &ctx.output_mode);
    if verified { ExitCode::SUCCESS } else { ExitCode::from(exit_codes::EXIT_USAGE) }
}
