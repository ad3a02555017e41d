use crate::app::AppContext;
use crate::commands::{print_covert_error, read_identity_file, read_input, write_output};
use crate::{cli, exit_codes, output, prompt};
use covert::{config, Attachment, EncryptOptions, Identity, Recipient};
use serde_json::json;
use std::process::ExitCode;

pub fn run(args: cli::EncryptArgs, mut ctx: AppContext) -> ExitCode {
    let mut recipients = Vec::new();
    for hex_str in &args.recipients {
        match super::parse_public_key(hex_str) {
            Ok(key) => recipients.push(Recipient::public_key(key)),
            Err(error) => {
                eprintln!("Error: {error}");
                return ExitCode::from(exit_codes::EXIT_USAGE);
            }
        }
    }
    for _ in 0..args.passphrase {
        let pw = match prompt::prompt_new_passphrase() {
            Ok(pw) => pw,
            Err(error) => {
                eprintln!("Error: {error}");
                return exit_codes::exit_code_for_prompt_error(&error);
            }
        };
        use secrecy::ExposeSecret;
        match Recipient::passphrase(pw.expose_secret()) {
            Ok(recipient) => recipients.push(recipient),
            Err(error) => return print_covert_error(&error),
        }
    }

    let bytes = match read_input(&args.input) {
        Ok(bytes) => bytes,
        Err(error) => {
            eprintln!("Error: reading {}: {error}", args.input.display());
            return ExitCode::from(exit_codes::EXIT_IO);
        }
    };

    let entry = if args.input == std::path::Path::new("-") {
        Attachment::message(bytes)
    } else {
        let name = args.input.file_name().and_then(|n| n.to_str()).unwrap_or("file");
        match Attachment::file(name, bytes, args.executable) {
            Ok(entry) => entry,
            Err(error) => return print_covert_error(&error),
        }
    };

    let pad_proportion = args.pad.unwrap_or_else(|| match config::load() {
        Ok(cfg) => cfg.default_pad,
        Err(_) => covert::container::archive::DEFAULT_PAD_PROPORTION,
    });
    let options = EncryptOptions { pad_proportion, decoys: args.decoys, wide_open: args.wide_open };

    let encrypted = match covert::encrypt_with_rng(&recipients, &[entry], &options, &mut *ctx.rng) {
        Ok(encrypted) => encrypted,
        Err(error) => return print_covert_error(&error),
    };
    let mut container = encrypted.bytes;

    let mut signers = Vec::new();
    for path in &args.sign {
        match read_identity_file(path) {
            Ok(identity) => signers.push(identity),
            Err(error) => {
                eprintln!("Error: {error}");
                return ExitCode::from(exit_codes::EXIT_USAGE);
            }
        }
    }
    if !signers.is_empty() {
        let refs: Vec<&Identity> = signers.iter().collect();
        covert::append_signatures(&mut container, &encrypted.filehash, &refs);
    }

    let out_bytes = if args.armor { covert::armor::encode(&container).into_bytes() } else { container };

    if let Err(error) = write_output(&args.output, &out_bytes) {
        eprintln!("Error: writing {}: {error}", args.output.display());
        return ExitCode::from(exit_codes::EXIT_IO);
    }

    let meta = json!({
        "kind": "encrypt",
        "input": args.input.display().to_string(),
        "output": args.output.display().to_string(),
        "recipients": recipients.len(),
        "signers": signers.len(),
        "wide_open": args.wide_open,
        "armor": args.armor,
        "bytes": out_bytes.len(),
    });
    output::print_value(format!("wrote {} bytes to {}", out_bytes.len(), args.output.display()), meta, &ctx.output_mode)
}
