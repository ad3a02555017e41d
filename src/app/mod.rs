use crate::{cli, commands, exit_codes, output};
use clap::{ColorChoice, CommandFactory, FromArgMatches, error::ErrorKind as ClapErrorKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::IsTerminal;
use std::process::ExitCode;

pub(crate) struct AppContext {
    pub output_mode: output::OutputMode,
    pub rng: Box<dyn rand::RngCore>,
}

fn emit_dev_seed_warning(seed: u64) {
    eprintln!("WARNING: --dev-seed={seed} makes output deterministic and NOT cryptographically secure.");
    eprintln!("This is for tests only. Never use it to encrypt anything real.");
}

pub fn run() -> ExitCode {
    let cli = match parse_cli() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let output_mode = output::OutputMode {
        json: cli.json,
        quiet: cli.quiet,
    };

    let Some(command) = cli.command else {
        let mut cmd = configure_command_colors(cli::Cli::command());
        cmd.print_help().expect("help to be printed");
        println!();
        return ExitCode::from(exit_codes::EXIT_USAGE);
    };

    let rng: Box<dyn rand::RngCore> = match cli.dev_seed {
        Some(seed) => {
            emit_dev_seed_warning(seed);
            Box::new(StdRng::seed_from_u64(seed))
        }
        None => Box::new(rand::rngs::OsRng),
    };

    let ctx = AppContext { output_mode, rng };
    commands::dispatch(command, ctx)
}

fn parse_cli() -> Result<cli::Cli, ExitCode> {
    let cmd = configure_command_colors(cli::Cli::command());

    let matches = match cmd.try_get_matches() {
        Ok(matches) => matches,
        Err(err) => {
            let kind = err.kind();
            if matches!(kind, ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) {
                let _ = err.print();
                return Err(ExitCode::SUCCESS);
            }

            let _ = err.print();
            return Err(ExitCode::from(exit_codes::EXIT_USAGE));
        }
    };

    match cli::Cli::from_arg_matches(&matches) {
        Ok(cli) => Ok(cli),
        Err(err) => {
            let _ = err.print();
            Err(ExitCode::from(exit_codes::EXIT_USAGE))
        }
    }
}

fn configure_command_colors(mut cmd: clap::Command) -> clap::Command {
    let no_color = std::env::var_os("NO_COLOR").is_some();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let stderr_is_tty = std::io::stderr().is_terminal();

    if no_color || !(stdout_is_tty && stderr_is_tty) {
        cmd = cmd.color(ColorChoice::Never);
    }

    cmd
}
