//! Shared-secret check guarding webhook registration.

use crate::WebhookError;

/// Authorizes `supplied` against the configured `expected` secret.
///
/// An empty `expected` is a configuration problem, not a mismatch; an empty
/// `supplied` never authorizes.
pub fn authorize(expected: &str, supplied: &str) -> Result<(), WebhookError> {
    if expected.is_empty() {
        return Err(WebhookError::Configuration(
            "shared registration secret is empty".to_string(),
        ));
    }
    if supplied.is_empty() || !constant_time_eq(expected, supplied) {
        return Err(WebhookError::Unauthorized);
    }
    Ok(())
}

fn constant_time_eq(left: &str, right: &str) -> bool {
    let left_bytes = left.as_bytes();
    let right_bytes = right.as_bytes();
    let mut diff = left_bytes.len() ^ right_bytes.len();
    let max_len = left_bytes.len().max(right_bytes.len());
    for index in 0..max_len {
        let l = left_bytes.get(index).copied().unwrap_or(0);
        let r = right_bytes.get(index).copied().unwrap_or(0);
        diff |= (l ^ r) as usize;
    }
    diff == 0
}
