//! Archive-wide limits

/// Maximum length of a record label or field name, in characters
pub const MAX_LABEL_LENGTH: usize = 256;

/// Highest deflate (compression) level a record may request
pub const MAX_DEFLATE_LEVEL: u8 = 9;

/// Check a deflate level against the permitted range
pub fn is_valid_deflate(level: u8) -> bool {
    level <= MAX_DEFLATE_LEVEL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deflate_range() {
        assert!(is_valid_deflate(0));
        assert!(is_valid_deflate(9));
        assert!(!is_valid_deflate(10));
    }
}
