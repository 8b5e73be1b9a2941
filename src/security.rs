// this_file: src/security.rs
//! Input-size guards for setup-fatal validation (§7.1).

use crate::error::{Error, Result};

/// Maximum allowed animation/override JSON input size (64MB).
pub const MAX_JSON_SIZE: usize = 64 * 1024 * 1024;

/// Validate JSON input size before parsing.
pub fn validate_json_size(json: &str) -> Result<()> {
    if json.len() > MAX_JSON_SIZE {
        return Err(Error::InvalidParameter(format!(
            "JSON input too large: {} bytes (max: {} bytes)",
            json.len(),
            MAX_JSON_SIZE
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_small_json() {
        assert!(validate_json_size(r#"{"test": "data"}"#).is_ok());
    }

    #[test]
    fn rejects_oversized_json() {
        let large = "x".repeat(MAX_JSON_SIZE + 1);
        assert!(validate_json_size(&large).is_err());
    }
}
