//! Archive layer: the MessagePack-framed inner container of index, file
//! payloads, and padding (spec.md §4.4).
//!
//! Grounded in `Cognoscan-fog-pack`'s use of `rmpv::Value` as a dynamic,
//! schema-loose MessagePack value — the archive index is exactly the
//! "tagged union plus unknown-key passthrough" shape spec.md §9 calls for,
//! which a `#[derive(Deserialize)]` struct cannot express.

use std::io::{Cursor, Read};

use rand::RngCore;
use rmpv::Value;
use unicode_normalization::UnicodeNormalization;

use crate::error::CovertError;

const PAD_BYTE: u8 = 0xC0;
pub const DEFAULT_PAD_PROPORTION: f64 = 0.05;

fn format_err(msg: impl Into<String>) -> CovertError {
    CovertError::FormatError(msg.into())
}

/// One payload, either fully known or streamed as a sequence of chunks.
pub enum Payload {
    Fixed(Vec<u8>),
    Streaming(Vec<Vec<u8>>),
}

impl Payload {
    fn byte_len(&self) -> Option<u64> {
        match self {
            Payload::Fixed(b) => Some(b.len() as u64),
            Payload::Streaming(_) => None,
        }
    }
}

/// One archive entry: the plaintext message (`name: None`) or an attached
/// file.
pub struct Attachment {
    pub name: Option<String>,
    pub executable: bool,
    pub extra_meta: Vec<(String, Value)>,
    pub payload: Payload,
}

impl Attachment {
    pub fn message(bytes: Vec<u8>) -> Self {
        Self {
            name: None,
            executable: false,
            extra_meta: Vec::new(),
            payload: Payload::Fixed(bytes),
        }
    }

    pub fn file(name: &str, bytes: Vec<u8>, executable: bool) -> Result<Self, CovertError> {
        Self::validate_name(name)?;
        Ok(Self {
            name: Some(name.nfkc().collect()),
            executable,
            extra_meta: Vec::new(),
            payload: Payload::Fixed(bytes),
        })
    }

    pub fn streaming_file(name: &str, chunks: Vec<Vec<u8>>, executable: bool) -> Result<Self, CovertError> {
        Self::validate_name(name)?;
        Ok(Self {
            name: Some(name.nfkc().collect()),
            executable,
            extra_meta: Vec::new(),
            payload: Payload::Streaming(chunks),
        })
    }

    fn validate_name(name: &str) -> Result<(), CovertError> {
        if name.contains('/') || name.contains('\\') {
            return Err(format_err("attachment name must not contain a path separator"));
        }
        Ok(())
    }
}

fn build_meta(executable: bool, extra: &[(String, Value)]) -> Value {
    let mut map = Vec::new();
    if executable {
        map.push((Value::from("x"), Value::from(true)));
    }
    for (k, v) in extra {
        map.push((Value::from(k.as_str()), v.clone()));
    }
    Value::Map(map)
}

fn parse_meta(value: &Value) -> Result<(bool, Vec<(String, Value)>), CovertError> {
    let map = value.as_map().ok_or_else(|| format_err("entry meta must be a map"))?;
    let mut executable = false;
    let mut extra = Vec::new();
    for (k, v) in map {
        let key = k.as_str().ok_or_else(|| format_err("meta key must be a string"))?;
        if key.chars().count() == 1 {
            match key {
                "x" => executable = v.as_bool().ok_or_else(|| format_err("meta key 'x' must be boolean"))?,
                other => return Err(format_err(format!("reserved meta key not recognized: {other}"))),
            }
        } else {
            extra.push((key.to_string(), v.clone()));
        }
    }
    Ok((executable, extra))
}

fn write_payload(out: &mut Vec<u8>, payload: &Payload) -> Result<(), CovertError> {
    match payload {
        Payload::Fixed(bytes) => out.extend_from_slice(bytes),
        Payload::Streaming(chunks) => {
            for chunk in chunks {
                rmpv::encode::write_value(out, &Value::from(chunk.len() as u64)).map_err(|e| format_err(e.to_string()))?;
                out.extend_from_slice(chunk);
            }
            rmpv::encode::write_value(out, &Value::from(0u64)).map_err(|e| format_err(e.to_string()))?;
        }
    }
    Ok(())
}

fn read_payload(cursor: &mut Cursor<&[u8]>, size: Option<u64>) -> Result<Payload, CovertError> {
    match size {
        Some(n) => {
            let mut buf = vec![0u8; n as usize];
            cursor.read_exact(&mut buf).map_err(|_| format_err("streaming chunk length exceeds remaining transport"))?;
            Ok(Payload::Fixed(buf))
        }
        None => {
            let mut chunks = Vec::new();
            loop {
                let len_value = rmpv::decode::read_value(cursor).map_err(|e| format_err(e.to_string()))?;
                let len = len_value.as_u64().ok_or_else(|| format_err("streaming chunk length must be a non-negative integer"))?;
                if len == 0 {
                    break;
                }
                let mut buf = vec![0u8; len as usize];
                cursor.read_exact(&mut buf).map_err(|_| format_err("streaming chunk length exceeds remaining transport"))?;
                chunks.push(buf);
            }
            Ok(Payload::Streaming(chunks))
        }
    }
}

/// Encode `entries` (message first by convention, then attachments) as the
/// inner archive stream, including trailing padding.
pub fn encode(entries: &[Attachment], pad_proportion: f64, rng: &mut dyn RngCore) -> Result<Vec<u8>, CovertError> {
    let mut out = Vec::new();

    if let [only] = entries {
        if only.name.is_none() && !only.executable && only.extra_meta.is_empty() {
            if let Payload::Fixed(bytes) = &only.payload {
                rmpv::encode::write_value(&mut out, &Value::from(bytes.len() as u64)).map_err(|e| format_err(e.to_string()))?;
                out.extend_from_slice(bytes);
                append_padding(&mut out, pad_proportion, rng);
                return Ok(out);
            }
        }
    }

    let mut index_entries = Vec::with_capacity(entries.len());
    for entry in entries {
        let size_value = match entry.payload.byte_len() {
            Some(n) => Value::from(n),
            None => Value::Nil,
        };
        let name_value = match &entry.name {
            Some(n) => Value::from(n.as_str()),
            None => Value::Nil,
        };
        let meta_value = build_meta(entry.executable, &entry.extra_meta);
        index_entries.push(Value::Array(vec![size_value, name_value, meta_value]));
    }
    let index = Value::Map(vec![(Value::from("f"), Value::Array(index_entries))]);
    rmpv::encode::write_value(&mut out, &index).map_err(|e| format_err(e.to_string()))?;

    for entry in entries {
        write_payload(&mut out, &entry.payload)?;
    }

    append_padding(&mut out, pad_proportion, rng);
    Ok(out)
}

fn append_padding(out: &mut Vec<u8>, pad_proportion: f64, rng: &mut dyn RngCore) {
    let total_pad = compute_padding(out.len(), pad_proportion, rng);
    out.resize(out.len() + total_pad, PAD_BYTE);
}

/// Padding sizing per spec.md §4.4: a floor (`fixed`) plus a log-scaled
/// random component (`random_pad`) with mean `p`.
fn compute_padding(s: usize, p: f64, rng: &mut dyn RngCore) -> usize {
    if p <= 0.0 {
        return 0;
    }
    let s = s as f64;
    let fixed = ((p * 500.0).floor() - s).max(0.0);

    let eff = 200.0 + 1e8 * (1.0 + 1e-8 * (s + fixed)).ln();
    let u1 = rng.next_u32() as f64;
    let u2 = rng.next_u32() as f64;
    let two_32 = 2f64.powi(32);
    let r = two_32.ln() - (u1 + u2 * 2f64.powi(-32) + 2f64.powi(-33)).ln();
    let random_pad = (r * p * eff).round().max(0.0);

    (fixed + random_pad) as usize
}

/// Decode an inner archive stream back into its entries.
pub fn decode(bytes: &[u8]) -> Result<Vec<Attachment>, CovertError> {
    let mut cursor = Cursor::new(bytes);
    let first = rmpv::decode::read_value(&mut cursor).map_err(|e| format_err(e.to_string()))?;

    match first {
        Value::Integer(_) => {
            let size = first.as_u64().ok_or_else(|| format_err("short-form size must be a non-negative integer"))?;
            let payload = read_payload(&mut cursor, Some(size))?;
            let Payload::Fixed(bytes) = payload else { unreachable!() };
            Ok(vec![Attachment::message(bytes)])
        }
        Value::Map(ref map) => {
            let mut files = None;
            for (k, v) in map {
                let key = k.as_str().ok_or_else(|| format_err("archive index key must be a string"))?;
                if key.chars().count() == 1 {
                    match key {
                        "f" => files = Some(v),
                        other => return Err(format_err(format!("reserved archive index key not recognized: {other}"))),
                    }
                }
            }
            let files = files.ok_or_else(|| format_err("archive index missing required key 'f'"))?;
            let files = files.as_array().ok_or_else(|| format_err("archive index 'f' must be an array"))?;

            let mut out = Vec::with_capacity(files.len());
            for entry in files {
                let fields = entry.as_array().ok_or_else(|| format_err("archive index entry must be an array"))?;
                if fields.len() != 3 {
                    return Err(format_err("archive index entry must have 3 fields"));
                }
                let size = fields[0].as_u64();
                let name = match &fields[1] {
                    Value::Nil => None,
                    Value::String(s) => Some(s.as_str().ok_or_else(|| format_err("attachment name must be valid UTF-8"))?.to_string()),
                    _ => return Err(format_err("attachment name must be a string or nil")),
                };
                if let Some(n) = &name {
                    if n.contains('/') || n.contains('\\') {
                        return Err(format_err("attachment name must not contain a path separator"));
                    }
                }
                let (executable, extra_meta) = parse_meta(&fields[2])?;
                let payload = read_payload(&mut cursor, size)?;
                out.push(Attachment {
                    name,
                    executable,
                    extra_meta,
                    payload,
                });
            }
            Ok(out)
        }
        _ => Err(format_err("archive stream must begin with an integer or a map")),
    }
}
