use crate::app::AppContext;
use crate::commands::{print_covert_error, read_identity_file, read_input, write_output};
use crate::{cli, exit_codes, output, prompt};
use covert::{Credential, Payload};
use secrecy::ExposeSecret;
use serde_json::json;
use std::process::ExitCode;

pub fn run(args: cli::DecryptArgs, ctx: &AppContext) -> ExitCode {
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

    let raw = match read_input(&args.input) {
        Ok(bytes) => bytes,
        Err(error) => {
            eprintln!("Error: reading {}: {error}", args.input.display());
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

    if let Some(signer_hex) = &args.verify_signer {
        let signer_pk = match super::parse_public_key(signer_hex) {
            Ok(key) => key,
            Err(error) => {
                eprintln!("Error: {error}");
                return ExitCode::from(exit_codes::EXIT_USAGE);
            }
        };
        let trailer = match covert::signature_trailer(&container, &credentials) {
            Ok(trailer) => trailer,
            Err(error) => return print_covert_error(&error),
        };
        if !covert::verify_appended_signatures(trailer, &decrypted.filehash, &signer_pk) {
            eprintln!("Error: no valid signature from the given signer");
            return ExitCode::from(exit_codes::EXIT_USAGE);
        }
    }

    let Some(first) = decrypted.entries.first() else {
        eprintln!("Error: container had no attachments");
        return ExitCode::from(exit_codes::EXIT_SOFTWARE);
    };
    let payload_bytes = match &first.payload {
        Payload::Fixed(bytes) => bytes.clone(),
        Payload::Streaming(chunks) => chunks.concat(),
    };

    if let Err(error) = write_output(&args.output, &payload_bytes) {
        eprintln!("Error: writing {}: {error}", args.output.display());
        return ExitCode::from(exit_codes::EXIT_IO);
    }

    let meta = json!({
        "kind": "decrypt",
        "input": args.input.display().to_string(),
        "output": args.output.display().to_string(),
        "attachments": decrypted.entries.len(),
        "filehash": hex::encode(decrypted.filehash),
        "bytes": payload_bytes.len(),
    });
    output::print_value(format!("wrote {} bytes to {}", payload_bytes.len(), args.output.display()), meta, &ctx.output_mode)
}
