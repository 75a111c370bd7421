use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkdropError {
    #[error("Invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid object digest: {0}")]
    InvalidDigest(String),
}

pub type Result<T> = std::result::Result<T, LinkdropError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_object_id() {
        let err = LinkdropError::InvalidObjectId("0xzz".to_string());
        assert_eq!(err.to_string(), "Invalid object id: 0xzz");
    }

    #[test]
    fn test_error_display_invalid_address() {
        let err = LinkdropError::InvalidAddress("nope".to_string());
        assert_eq!(err.to_string(), "Invalid address: nope");
    }

    #[test]
    fn test_error_display_invalid_digest() {
        let err = LinkdropError::InvalidDigest("abc".to_string());
        assert_eq!(err.to_string(), "Invalid object digest: abc");
    }
}
