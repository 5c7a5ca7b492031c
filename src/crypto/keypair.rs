//! RSA key operations.
//!
//! This module provides functions for generating RSA keypairs and for the
//! PKCS#1 encodings used by the certificate and key files.

use crate::crypto::encode_pem;
use crate::error::{KeygenError, Result};
use der::Decode;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::EncodePublicKey;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use spki::SubjectPublicKeyInfoOwned;

/// PEM tag for PKCS#1 RSA private keys.
pub const RSA_PRIVATE_KEY_TAG: &str = "RSA PRIVATE KEY";

/// Smallest modulus size accepted for key generation.
pub const MIN_RSA_BITS: usize = 1024;

/// An RSA keypair consisting of a private key and its public half.
#[derive(Debug, Clone)]
pub struct Keypair {
    pub secret: RsaPrivateKey,
    pub public: RsaPublicKey,
}

impl Keypair {
    /// Create a new keypair from a private key.
    pub fn from_secret(secret: RsaPrivateKey) -> Self {
        let public = secret.to_public_key();
        Self { secret, public }
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public.n().bits()
    }

    /// Serialize the private key as PKCS#1 DER.
    pub fn to_pkcs1_der(&self) -> Result<Vec<u8>> {
        let document = self.secret.to_pkcs1_der().map_err(|e| {
            KeygenError::KeyGenerationError(format!("Failed to encode private key: {}", e))
        })?;
        Ok(document.as_bytes().to_vec())
    }

    /// Serialize the private key as an `RSA PRIVATE KEY` PEM block.
    pub fn to_pkcs1_pem(&self) -> Result<String> {
        Ok(encode_pem(RSA_PRIVATE_KEY_TAG, self.to_pkcs1_der()?))
    }

    /// The public key as an X.509 SubjectPublicKeyInfo.
    pub fn public_key_info(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let der = self.public.to_public_key_der().map_err(|e| {
            KeygenError::CertificateError(format!("Failed to encode public key: {}", e))
        })?;

        SubjectPublicKeyInfoOwned::from_der(der.as_bytes()).map_err(|e| {
            KeygenError::CertificateError(format!("Failed to decode public key info: {}", e))
        })
    }

    /// Sign a message with PKCS#1 v1.5 over SHA-256.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::<Sha256>::new(self.secret.clone());
        let signature = signing_key
            .try_sign(message)
            .map_err(|e| KeygenError::CertificateError(format!("Signing failed: {}", e)))?;
        Ok(signature.to_vec())
    }

    /// Verify a PKCS#1 v1.5 / SHA-256 signature.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        verify_pkcs1v15_sha256(&self.public, message, signature)
    }
}

/// Generate a new RSA keypair using the operating system's random source.
///
/// # Example
///
/// ```rust,no_run
/// use keygen::crypto::keypair::generate_rsa_keypair;
///
/// let keypair = generate_rsa_keypair(2048).unwrap();
/// assert_eq!(keypair.bits(), 2048);
/// ```
pub fn generate_rsa_keypair(bits: usize) -> Result<Keypair> {
    if bits < MIN_RSA_BITS {
        return Err(KeygenError::KeyGenerationError(format!(
            "{} bit keys are not supported, minimum is {}",
            bits, MIN_RSA_BITS
        )));
    }

    let secret = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| KeygenError::KeyGenerationError(e.to_string()))?;
    Ok(Keypair::from_secret(secret))
}

/// Import an RSA keypair from PKCS#1 DER.
pub fn import_rsa_from_pkcs1_der(bytes: &[u8]) -> Result<Keypair> {
    let secret = RsaPrivateKey::from_pkcs1_der(bytes)
        .map_err(|e| KeygenError::PemError(format!("Invalid RSA private key: {}", e)))?;
    Ok(Keypair::from_secret(secret))
}

/// Verify a PKCS#1 v1.5 / SHA-256 signature against a public key.
pub fn verify_pkcs1v15_sha256(
    public: &RsaPublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<()> {
    let verifying_key = VerifyingKey::<Sha256>::new(public.clone());
    let signature = Signature::try_from(signature)
        .map_err(|e| KeygenError::CertificateError(format!("Malformed signature: {}", e)))?;

    verifying_key.verify(message, &signature).map_err(|e| {
        KeygenError::CertificateError(format!("Signature verification failed: {}", e))
    })
}
