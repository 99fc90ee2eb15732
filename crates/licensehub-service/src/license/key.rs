//! License key and synthetic order id generation.

use chrono::{DateTime, Utc};
use rand::RngCore;

/// Random bytes per key (160 bits).
pub const KEY_ENTROPY_BYTES: usize = 20;
/// Characters per key group.
const GROUP_LEN: usize = 8;

/// Generate a license key: `PREFIX-XXXXXXXX-XXXXXXXX-XXXXXXXX-XXXXXXXX`.
///
/// The body is 160 bits from the thread-local CSPRNG in base32.
pub fn generate_key(prefix: &str) -> String {
    let mut bytes = [0u8; KEY_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let encoded = base32_no_pad(&bytes);

    let groups: Vec<&str> = encoded
        .as_bytes()
        .chunks(GROUP_LEN)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();

    if prefix.is_empty() {
        groups.join("-")
    } else {
        format!("{prefix}-{}", groups.join("-"))
    }
}

/// Synthetic order id for licenses that were not paid for:
/// `PREFIX_yyyymmddHHMMSS_XXXXXXXX`.
pub fn synthetic_order_id(prefix: &str, now: DateTime<Utc>) -> String {
    let mut suffix = [0u8; 4];
    rand::rng().fill_bytes(&mut suffix);
    format!(
        "{prefix}_{}_{}",
        now.format("%Y%m%d%H%M%S"),
        hex::encode_upper(suffix)
    )
}

/// Shorten a key for logs: prefix plus the last four characters.
pub fn mask_key(key: &str) -> String {
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    match key.split_once('-') {
        Some((prefix, _)) => format!("{prefix}-…{tail}"),
        None => format!("…{tail}"),
    }
}

fn base32_no_pad(bytes: &[u8]) -> String {
    const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
    let mut output = String::with_capacity(bytes.len() * 8 / 5 + 1);
    let mut buffer = 0u32;
    let mut bits_left = 0u8;
    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits_left += 8;
        while bits_left >= 5 {
            let index = ((buffer >> (bits_left - 5)) & 0x1f) as usize;
            output.push(ALPHABET[index] as char);
            bits_left -= 5;
        }
    }
    if bits_left > 0 {
        let index = ((buffer << (5 - bits_left)) & 0x1f) as usize;
        output.push(ALPHABET[index] as char);
    }
    output
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_key_shape() {
        let key = generate_key("CC");
        let parts: Vec<&str> = key.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], "CC");
        assert!(parts[1..].iter().all(|p| p.len() == 8));
        assert!(
            parts[1..]
                .iter()
                .flat_map(|p| p.chars())
                .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
        );
    }

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<String> = (0..1000).map(|_| generate_key("CC")).collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_base32_known_vector() {
        assert_eq!(base32_no_pad(b"foobar"), "MZXW6YTBOI");
    }

    #[test]
    fn test_synthetic_order_id() {
        let now = DateTime::parse_from_rfc3339("2025-03-04T05:06:07Z")
            .unwrap()
            .with_timezone(&Utc);
        let id = synthetic_order_id("ADMIN", now);
        assert!(id.starts_with("ADMIN_20250304050607_"));
        let suffix = id.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("CC-ABCDEFGH-12345678"), "CC-…5678");
        assert_eq!(mask_key("XYZ9"), "…XYZ9");
    }
}
