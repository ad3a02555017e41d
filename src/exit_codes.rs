use crate::prompt::PromptError;
use covert::CovertError;
use covert::config;
use std::process::ExitCode;

pub const EXIT_USAGE: u8 = 64;
pub const EXIT_IO: u8 = 2;
pub const EXIT_SOFTWARE: u8 = 1;

/// `AuthFail` maps to `EXIT_USAGE` deliberately: a wrong passphrase or key
/// is a usage problem, not a software bug, matching the teacher's
/// `AuthFailed => EXIT_USAGE` precedent in `exit_code_for_vault_error`.
pub fn exit_code_for_covert_error(error: &CovertError) -> ExitCode {
    use CovertError::*;

    match error {
        AuthFail | PasswordTooShort | NoRecipients | TooManyRecipients | ConflictingRecipients => {
            ExitCode::from(EXIT_USAGE)
        }
        FormatError(_) | UnsupportedVersion | Crypto(_) => ExitCode::from(EXIT_SOFTWARE),
        Io(_) => ExitCode::from(EXIT_IO),
    }
}

pub fn exit_code_for_config_error(error: &config::ConfigError) -> ExitCode {
    use config::ConfigError::*;

    match error {
        ConfigDirUnavailable | Io(_) => ExitCode::from(EXIT_IO),
        Parse(_) | Serialize(_) | UnsupportedSchemaVersion(_) => ExitCode::from(EXIT_SOFTWARE),
    }
}

pub fn exit_code_for_prompt_error(error: &PromptError) -> ExitCode {
    use PromptError::*;

    match error {
        Io(_) => ExitCode::from(EXIT_IO),
        Empty | Mismatch => ExitCode::from(EXIT_USAGE),
    }
}
