use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "covert",
    author,
    version,
    about = "File-and-message encryption that produces ciphertext indistinguishable from random bytes.",
    long_about = "Covert encrypts files and messages to passphrases and/or public keys. The \
resulting container is, by design, indistinguishable from random bytes to anyone who \
can't open it: no magic bytes, no version field, no recipient count leaked in the clear."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(long, global = true, help = "Emit a single JSON object instead of plain text.")]
    pub json: bool,

    #[arg(short, long, global = true, help = "Suppress non-essential output.")]
    pub quiet: bool,

    #[arg(
        long,
        global = true,
        help = "Replace the OS CSPRNG with a deterministic seed. NEVER use outside tests."
    )]
    pub dev_seed: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Generate a fresh X25519/XEd25519 identity.")]
    Keygen(KeygenArgs),

    #[command(about = "Encrypt a file or stdin to one or more recipients.")]
    Encrypt(EncryptArgs),

    #[command(about = "Decrypt a container, trying each supplied credential.")]
    Decrypt(DecryptArgs),

    #[command(about = "Sign a file's filehash and append or write a detached signature.")]
    Sign(SignArgs),

    #[command(about = "Verify an attached or detached signature.")]
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
pub struct KeygenArgs {
    #[arg(long, help = "Write the secret key to this path (hex, 0600) instead of stdout.")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct EncryptArgs {
    #[arg(help = "File to encrypt, or '-' for stdin.")]
    pub input: PathBuf,

    #[arg(short, long, help = "Output path for the container, or '-' for stdout.")]
    pub output: PathBuf,

    #[arg(long = "to", value_name = "HEX_PUBLIC_KEY", help = "A recipient public key (repeatable).")]
    pub recipients: Vec<String>,

    #[arg(long, help = "Prompt for a passphrase recipient (repeatable).", action = clap::ArgAction::Count)]
    pub passphrase: u8,

    #[arg(long, help = "No recipients: anyone holding the file can open it.")]
    pub wide_open: bool,

    #[arg(long, help = "Fraction of plaintext size to pad with (default from config, else 0.05).")]
    pub pad: Option<f64>,

    #[arg(long, default_value_t = 0, help = "Number of decoy auth slots to add.")]
    pub decoys: u8,

    #[arg(long, help = "Wrap the container in URL-safe base64 text.")]
    pub armor: bool,

    #[arg(long, value_name = "HEX_SECRET_KEY_FILE", help = "Sign the container with this identity (repeatable).")]
    pub sign: Vec<PathBuf>,

    #[arg(long, help = "Treat the attachment as executable (sets the archive's executable bit).")]
    pub executable: bool,
}

#[derive(Debug, Args)]
pub struct DecryptArgs {
    #[arg(help = "Container to decrypt, or '-' for stdin.")]
    pub input: PathBuf,

    #[arg(short, long, help = "Output path for the first attachment's bytes, or '-' for stdout.")]
    pub output: PathBuf,

    #[arg(long = "key", value_name = "HEX_SECRET_KEY_FILE", help = "A recipient secret key file (repeatable).")]
    pub keys: Vec<PathBuf>,

    #[arg(long, help = "Prompt for a passphrase credential (repeatable).", action = clap::ArgAction::Count)]
    pub passphrase: u8,

    #[arg(long, help = "Try the wide-open (zero) key.")]
    pub wide_open: bool,

    #[arg(long, help = "The input is ascii-armored text.")]
    pub armor: bool,

    #[arg(long, value_name = "HEX_PUBLIC_KEY", help = "Require and verify an appended signature from this signer.")]
    pub verify_signer: Option<String>,
}

#[derive(Debug, Args)]
pub struct SignArgs {
    #[arg(help = "Container whose filehash to sign.")]
    pub file: PathBuf,

    #[arg(long = "key", value_name = "HEX_SECRET_KEY_FILE", help = "Signer's secret key file.")]
    pub key: PathBuf,

    #[arg(long, help = "Write a standalone detached signature instead of appending to the file.")]
    pub detached: Option<PathBuf>,

    #[arg(long = "key-for-filehash", help = "Secret key or passphrase credential used to open the file first, to learn its filehash.")]
    pub opening_key: Option<PathBuf>,

    #[arg(long, help = "Open with the wide-open (zero) key to learn the filehash.")]
    pub wide_open: bool,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    #[arg(help = "Container whose appended signature(s) to verify.")]
    pub file: PathBuf,

    #[arg(long, value_name = "HEX_PUBLIC_KEY", help = "Signer's public key.")]
    pub signer: String,

    #[arg(long, help = "Verify a standalone detached signature file instead of an appended block.")]
    pub detached: Option<PathBuf>,

    #[arg(long = "key", value_name = "HEX_SECRET_KEY_FILE", help = "A recipient secret key file, to open the container and recompute its filehash.")]
    pub keys: Vec<PathBuf>,

    #[arg(long, help = "Prompt for a passphrase credential (repeatable).", action = clap::ArgAction::Count)]
    pub passphrase: u8,

    #[arg(long, help = "Try the wide-open (zero) key.")]
    pub wide_open: bool,

    #[arg(long, help = "The input is ascii-armored text.")]
    pub armor: bool,
}
