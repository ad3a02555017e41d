mod decrypt;
mod encrypt;
mod keygen;
mod sign;
mod verify;

use crate::app::AppContext;
use crate::cli;
use covert::{CovertError, Identity};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

pub fn dispatch(command: cli::Commands, ctx: AppContext) -> ExitCode {
    match command {
        cli::Commands::Keygen(args) => keygen::run(args, ctx),
        cli::Commands::Encrypt(args) => encrypt::run(args, ctx),
        cli::Commands::Decrypt(args) => decrypt::run(args, &ctx),
        cli::Commands::Sign(args) => sign::run(args, &ctx),
        cli::Commands::Verify(args) => verify::run(args, &ctx),
    }
}

/// Decode a hex-encoded 32-byte public key from a CLI argument.
pub(crate) fn parse_public_key(hex_str: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(hex_str).map_err(|e| format!("invalid hex public key: {e}"))?;
    bytes.try_into().map_err(|v: Vec<u8>| format!("public key must be 32 bytes, got {}", v.len()))
}

/// Load an [`Identity`] from a file holding a hex-encoded 32-byte secret key.
pub(crate) fn read_identity_file(path: &Path) -> Result<Identity, String> {
    let contents = fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    let bytes = hex::decode(contents.trim()).map_err(|e| format!("invalid hex secret key in {}: {e}", path.display()))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|v: Vec<u8>| format!("secret key must be 32 bytes, got {} in {}", v.len(), path.display()))?;
    Ok(Identity::from_secret_bytes(bytes))
}

/// Read input bytes from a file path, or stdin when `path == "-"`.
pub(crate) fn read_input(path: &Path) -> std::io::Result<Vec<u8>> {
    if path == Path::new("-") {
        use std::io::Read;
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(path)
    }
}

/// Write output bytes to a file path, or stdout when `path == "-"`.
pub(crate) fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if path == Path::new("-") {
        use std::io::Write;
        std::io::stdout().write_all(bytes)
    } else {
        fs::write(path, bytes)
    }
}

pub(crate) fn print_covert_error(error: &CovertError) -> ExitCode {
    eprintln!("Error: {error}");
    crate::exit_codes::exit_code_for_covert_error(error)
}
