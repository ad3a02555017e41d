//! Output envelope shared by every subcommand: plain text by default, or
//! one `{"value": ..., "meta": ...}` JSON object under `--json`. Mirrors
//! the teacher's `output::print_value` exactly, minus the clipboard path
//! (out of scope per spec.md's "terminal/graphical front-ends... out of
//! scope").

use serde_json::json;
use std::process::ExitCode;

pub struct OutputMode {
    pub json: bool,
    pub quiet: bool,
}

pub fn print_value(value: String, meta: serde_json::Value, output_mode: &OutputMode) -> ExitCode {
    if output_mode.json {
        let payload = json!({
            "value": value,
            "meta": meta,
        });
        println!("{payload}");
    } else if !output_mode.quiet || !value.is_empty() {
        println!("{value}");
    }

    ExitCode::SUCCESS
}
