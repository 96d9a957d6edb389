/// Opaque page cursors for large ordered result sets.
///
/// A cursor is a base64 token over `lastKey||total||pageSize`. Clients
/// must treat it as opaque — it is only ever passed back verbatim as a
/// continuation point, and the layout may change between deployments as
/// long as it stays self-consistent within one.
///
/// Timestamp keys are serialized as their millisecond-epoch decimal
/// representation so cursors stay comparable as plain strings.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::model::StoreError;

const CURSOR_DELIMITER: &str = "||";

/// A decoded continuation token.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    /// Key of the first value the next page should serve values after.
    pub last_key: String,
    /// Total result count, carried forward from the first page.
    pub total: usize,
    /// Page size the first page was served with.
    pub page_size: i32,
}

/// Encodes a continuation token. Pure and deterministic: identical inputs
/// always yield the identical token, so a client retrying with the same
/// cursor gets a stable continuation point.
pub fn encode_cursor(last_key: &str, page_size: i32, total: usize) -> String {
    let plain = format!(
        "{}{}{}{}{}",
        last_key, CURSOR_DELIMITER, total, CURSOR_DELIMITER, page_size
    );
    STANDARD.encode(plain.as_bytes())
}

/// Decodes an incoming token, rejecting anything that did not come from
/// `encode_cursor`. Callers validate incoming cursors with this before
/// feeding them to the retrieval layer.
pub fn decode_cursor(token: &str) -> Result<PageCursor, StoreError> {
    let bytes = STANDARD
        .decode(token.trim())
        .map_err(|_| StoreError::InvalidInput(format!("malformed page cursor: {}", token)))?;
    let plain = String::from_utf8(bytes)
        .map_err(|_| StoreError::InvalidInput(format!("malformed page cursor: {}", token)))?;

    let parts: Vec<&str> = plain.split(CURSOR_DELIMITER).collect();
    if parts.len() != 3 || parts[0].is_empty() {
        return Err(StoreError::InvalidInput(format!(
            "malformed page cursor: {}",
            token
        )));
    }

    let total = parts[1].parse::<usize>().map_err(|_| {
        StoreError::InvalidInput(format!("malformed page cursor total: {}", parts[1]))
    })?;
    let page_size = parts[2].parse::<i32>().map_err(|_| {
        StoreError::InvalidInput(format!("malformed page cursor size: {}", parts[2]))
    })?;

    Ok(PageCursor {
        last_key: parts[0].to_string(),
        total,
        page_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_deterministic() {
        let a = encode_cursor("1509654000000", 500, 1320);
        let b = encode_cursor("1509654000000", 500, 1320);
        assert_eq!(a, b, "identical inputs must yield identical tokens");
    }

    #[test]
    fn test_round_trip() {
        let token = encode_cursor("1509654000000", 500, 1320);
        let cursor = decode_cursor(&token).expect("token should decode");
        assert_eq!(cursor.last_key, "1509654000000");
        assert_eq!(cursor.total, 1320);
        assert_eq!(cursor.page_size, 500);
    }

    #[test]
    fn test_token_is_not_plaintext() {
        let token = encode_cursor("1509654000000", 500, 1320);
        assert!(!token.contains("1509654000000"), "key must not leak as plaintext");
        assert!(!token.contains("||"), "delimiter must not leak as plaintext");
    }

    #[test]
    fn test_distinct_keys_yield_distinct_tokens() {
        let a = encode_cursor("1509654000000", 500, 1320);
        let b = encode_cursor("1509654900000", 500, 1320);
        assert_ne!(a, b);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_cursor("not base64 at all!").is_err());
        // Valid base64 but not a cursor layout.
        let bogus = STANDARD.encode("just-one-field");
        assert!(decode_cursor(&bogus).is_err());
        // Right field count, non-numeric total.
        let bogus = STANDARD.encode("123||many||500");
        assert!(decode_cursor(&bogus).is_err());
    }

    #[test]
    fn test_decode_rejects_empty_key() {
        let bogus = STANDARD.encode("||10||500");
        assert!(decode_cursor(&bogus).is_err());
    }
}
