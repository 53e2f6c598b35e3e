use std::error::Error;
use std::fmt;

pub type Result<T> = std::result::Result<T, QuarryError>;

#[derive(Debug)]
pub enum QuarryError {
    IoError(std::io::Error),
    /// A reader ran out of bytes while decoding `what`.
    Underflow(String),
    /// The tree codec met an unknown type tag or an inconsistent structure.
    MalformedTree(String),
    /// A bit-packed write that does not fit the declared width (or index range).
    OutOfRange { value: u64, bits: u8 },
    /// A player action collaborator declined the mutation.
    ValidationRejected(String),
    ProtocolError(String),
    ConfigError(String),
    /// The transport is gone; nothing further can be sent.
    Closed,
}

impl QuarryError {
    /// Whether the error ends the connection it happened on.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            QuarryError::ValidationRejected(_) | QuarryError::OutOfRange { .. }
        )
    }

    pub fn underflow(what: impl Into<String>) -> Self {
        QuarryError::Underflow(what.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        QuarryError::ProtocolError(msg.into())
    }
}

impl fmt::Display for QuarryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuarryError::IoError(err) => write!(f, "IO error: {}", err),
            QuarryError::Underflow(what) => write!(f, "Underflow while reading {}", what),
            QuarryError::MalformedTree(msg) => write!(f, "Malformed tree: {}", msg),
            QuarryError::OutOfRange { value, bits } => {
                write!(f, "Value {} does not fit in {} bits", value, bits)
            }
            QuarryError::ValidationRejected(msg) => write!(f, "Rejected: {}", msg),
            QuarryError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            QuarryError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            QuarryError::Closed => write!(f, "Connection closed"),
        }
    }
}

impl Error for QuarryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            QuarryError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for QuarryError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => QuarryError::Underflow(err.to_string()),
            _ => QuarryError::IoError(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_fatal_classification() {
        assert!(QuarryError::underflow("VarInt").is_fatal());
        assert!(QuarryError::MalformedTree("tag 99".to_owned()).is_fatal());
        assert!(QuarryError::Closed.is_fatal());
        assert!(!QuarryError::ValidationRejected("bedrock".to_owned()).is_fatal());
        assert!(!QuarryError::OutOfRange { value: 16, bits: 4 }.is_fatal());
    }

    #[test]
    fn test_eof_maps_to_underflow() {
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        assert_matches!(QuarryError::from(eof), QuarryError::Underflow(_));

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "nope");
        assert_matches!(QuarryError::from(refused), QuarryError::IoError(_));
    }

    #[test]
    fn test_display() {
        let err = QuarryError::OutOfRange { value: 300, bits: 8 };
        assert_eq!(err.to_string(), "Value 300 does not fit in 8 bits");
    }
}
