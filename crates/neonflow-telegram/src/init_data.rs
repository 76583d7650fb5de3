use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitDataError {
    #[error("Missing init data or bot token")]
    MissingPayload,
    #[error("Missing hash")]
    MissingHash,
    #[error("Invalid hash")]
    SignatureMismatch,
}

/// Verify a Telegram WebApp init-data payload against the bot token.
///
/// The payload is a URL-encoded pair set carrying an HMAC-SHA256 `hash` over
/// the remaining pairs, canonicalized as `key=value` lines sorted by key bytes
/// and joined with newlines. The MAC key is the SHA-256 digest of the bot
/// token. Returns the verified pairs (minus `hash`) on success.
///
/// No expiry check happens here; `auth_date` stays in the returned map for
/// callers that want one.
pub fn validate_init_data(
    init_data: &str,
    bot_token: &str,
) -> Result<BTreeMap<String, String>, InitDataError> {
    if init_data.is_empty() || bot_token.is_empty() {
        return Err(InitDataError::MissingPayload);
    }

    let mut fields = parse_pairs(init_data);
    let hash = fields.remove("hash").ok_or(InitDataError::MissingHash)?;
    let received = hex::decode(&hash).map_err(|_| InitDataError::SignatureMismatch)?;

    // BTreeMap iteration gives the byte-ordered key sort.
    let data_check_string = fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");

    let secret_key = Sha256::digest(bot_token.as_bytes());
    let mut mac = HmacSha256::new_from_slice(&secret_key).expect("HMAC accepts any key length");
    mac.update(data_check_string.as_bytes());

    // Constant-time comparison.
    mac.verify_slice(&received)
        .map_err(|_| InitDataError::SignatureMismatch)?;

    Ok(fields)
}

fn parse_pairs(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

/// Query-string decoding: `+` is a space, then percent-decoding. Undecodable
/// input is kept as-is; the signature check rejects anything that does not
/// match what was signed.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
