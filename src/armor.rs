//! Ascii-armor: a thin, URL-safe base64 text wrapper around a container's
//! raw bytes (spec.md §6). Lives outside the core format proper — nothing
//! here participates in the indistinguishability property.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

const FENCE: &str = "```";

pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Wrap armored text in triple-backtick fences, for copy-to-clipboard use.
pub fn encode_fenced(bytes: &[u8]) -> String {
    format!("{FENCE}\n{}\n{FENCE}", encode(bytes))
}

/// Strip backtick fences and leading `>` quote marks, then decode.
///
/// Per spec.md §6 the decoder "MUST strip leading/trailing backtick fences
/// and leading `>` quote marks on each line before decoding" — tolerating
/// text pasted out of a quoted email or chat thread.
pub fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let cleaned: String = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != FENCE)
        .map(|line| line.trim_start_matches('>').trim_start())
        .collect::<Vec<_>>()
        .concat();
    URL_SAFE_NO_PAD.decode(cleaned.as_bytes())
}
