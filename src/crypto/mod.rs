//! Cryptographic operations module.
//!
//! This module provides the RSA primitives the generator needs:
//!
//! - RSA key pair generation from the operating system's CSPRNG
//! - PKCS#1 v1.5 / SHA-256 signing and verification
//! - PKCS#1 private key serialization
//!
//! # Example
//!
//! ```rust,no_run
//! use keygen::crypto::keypair::generate_rsa_keypair;
//!
//! # fn example() -> keygen::error::Result<()> {
//! let keypair = generate_rsa_keypair(2048)?;
//! let signature = keypair.sign(b"message")?;
//! keypair.verify(b"message", &signature)?;
//! # Ok(())
//! # }
//! ```

pub mod keypair;

/// Encode DER bytes as an LF-terminated PEM block with the given tag.
pub fn encode_pem(tag: &str, contents: impl Into<Vec<u8>>) -> String {
    let block = pem::Pem::new(tag, contents);
    pem::encode_config(
        &block,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_pem_uses_lf() {
        let pem = encode_pem("CERTIFICATE", vec![0u8; 100]);
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(pem.ends_with("-----END CERTIFICATE-----\n"));
        assert!(!pem.contains('\r'));
    }

    #[test]
    fn test_encode_pem_wraps_at_64_columns() {
        let pem = encode_pem("TEST", vec![0xAB; 200]);
        for line in pem.lines().filter(|l| !l.starts_with("-----")) {
            assert!(line.len() <= 64);
        }
    }
}
