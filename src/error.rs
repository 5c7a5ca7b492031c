//! Error types for the keygen library.
//!
//! Every failure the generator can hit is returned as a [`KeygenError`];
//! deciding how the process exits is left to the binary.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for keygen operations.
#[derive(Error, Debug)]
pub enum KeygenError {
    /// The host list was empty
    #[error("Missing required hosts parameters")]
    MissingHosts,

    /// RSA key generation failed
    #[error("Could not generate private key: {0}")]
    KeyGenerationError(String),

    /// The random source failed while drawing a serial number
    #[error("Could not generate serial number: {0}")]
    SerialNumberError(String),

    /// Certificate construction, signing or decoding failed
    #[error("Could not create certificate: {0}")]
    CertificateError(String),

    /// The certificate file could not be created or written
    #[error("Could not write to {}: {source}", path.display())]
    CertificateFileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The private key file could not be opened or written
    #[error("Failed to open {} for writing: {source}", path.display())]
    KeyFileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid input data
    #[error("Parse error: {0}")]
    ParseError(String),

    /// PEM encoding/decoding error
    #[error("PEM error: {0}")]
    PemError(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized Result type for keygen operations.
pub type Result<T> = std::result::Result<T, KeygenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KeygenError::CertificateError("test error".to_string());
        assert_eq!(err.to_string(), "Could not create certificate: test error");
    }

    #[test]
    fn test_missing_hosts_message() {
        assert_eq!(
            KeygenError::MissingHosts.to_string(),
            "Missing required hosts parameters"
        );
    }

    #[test]
    fn test_file_error_display_includes_path() {
        let err = KeygenError::CertificateFileError {
            path: PathBuf::from("out/cert.pem"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
        };
        let msg = err.to_string();
        assert!(msg.contains("out/cert.pem"));
        assert!(msg.contains("no such directory"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeygenError>();
    }
}
