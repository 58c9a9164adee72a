//! SHA-256 digests and the canonical JSON they are taken over.

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::io::{self, Write};

/// Compute SHA256 hash of content as lower-case hex.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// First `len` hex characters of the SHA256 hash of `text`.
pub fn short_digest(text: &str, len: usize) -> String {
    let mut hash = compute_hash(text.as_bytes());
    hash.truncate(len);
    hash
}

/// Canonical JSON text of `value`.
///
/// Keys sorted at every depth, `", "` and `": "` separators, everything
/// outside printable ASCII escaped as `\uXXXX` (UTF-16 units), floats in
/// shortest round-trip form with an exponent below 1e-4 or from 1e16. This is
/// byte-for-byte what `json.dumps(value, sort_keys=True)` emits, so digests
/// agree with journals and seeds produced by the Python tooling.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let sorted = sort_keys(&serde_json::to_value(value)?);
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, CanonicalFormatter);
    sorted.serialize(&mut serializer)?;
    // The formatter only ever writes ASCII
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Copy of `value` with every object's keys in sorted order.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::with_capacity(map.len());
            for (key, item) in entries {
                sorted.insert(key.clone(), sort_keys(item));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_f64<W: ?Sized + Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                writer.write_all(&[ch as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Shortest round-trip decimal form of a finite float.
fn float_repr(value: f64) -> String {
    let sci = format!("{:e}", value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };

    if !(-4..16).contains(&exponent) {
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}{}e{}{:02}", sign, mantissa, exp_sign, exponent.abs());
    }

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        format!("{}0.{}{}", sign, zeros, digits)
    } else {
        let int_len = exponent as usize + 1;
        if digits.len() <= int_len {
            let zeros = "0".repeat(int_len - digits.len());
            format!("{}{}{}.0", sign, digits, zeros)
        } else {
            format!("{}{}.{}", sign, &digits[..int_len], &digits[int_len..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compute_hash() {
        let hash1 = compute_hash(b"hello");
        let hash2 = compute_hash(b"hello");
        let hash3 = compute_hash(b"world");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 64); // SHA256 = 32 bytes = 64 hex chars
        assert_eq!(
            hash1,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_short_digest() {
        assert_eq!(short_digest("hello", 12), "2cf24dba5fb0");
        assert_eq!(short_digest("hello", 100).len(), 64);
    }

    #[test]
    fn test_canonical_json_layout() {
        let value = json!({
            "b": [1, 2.5, 1e-7, 1e16, 0.0001, -0.0, 123456789.125, 1e22, true, null],
            "a": "θ é 😀\u{7f}\n\"/"
        });
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"a": "\u03b8 \u00e9 \ud83d\ude00\u007f\n\"/", "b": [1, 2.5, 1e-07, 1e+16, 0.0001, -0.0, 123456789.125, 1e+22, true, null]}"#
        );
    }

    #[test]
    fn test_canonical_json_of_string_list() {
        assert_eq!(
            canonical_json(&vec!["effect:Deny", "scope:eu"]).unwrap(),
            r#"["effect:Deny", "scope:eu"]"#
        );
        assert_eq!(canonical_json(&Vec::<String>::new()).unwrap(), "[]");
        assert_eq!(canonical_json(&json!({})).unwrap(), "{}");
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(0.0), "0.0");
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(0.57), "0.57");
        assert_eq!(float_repr(1e-5), "1e-05");
        assert_eq!(float_repr(1.5e-5), "1.5e-05");
        assert_eq!(float_repr(1e15), "1000000000000000.0");
        assert_eq!(float_repr(9999999999999998.0), "9999999999999998.0");
        assert_eq!(float_repr(1.5e16), "1.5e+16");
        assert_eq!(float_repr(5e-324), "5e-324");
        assert_eq!(float_repr(f64::MAX), "1.7976931348623157e+308");
    }
}
