//! Loading generated artifacts back from PEM.
//!
//! Uses `rustls-pemfile`, so files that parse here are exactly the files a
//! rustls-based development server will accept.

use crate::crypto::keypair::{import_rsa_from_pkcs1_der, Keypair};
use crate::error::{KeygenError, Result};
use rustls_pemfile::Item;
use std::io::Cursor;

fn read_items(pem_str: &str) -> Result<Vec<Item>> {
    let mut cursor = Cursor::new(pem_str.as_bytes());
    let mut items = Vec::new();

    while let Some(item) = rustls_pemfile::read_one(&mut cursor)
        .map_err(|e| KeygenError::PemError(format!("Failed to read PEM: {:?}", e)))?
    {
        items.push(item);
    }

    Ok(items)
}

/// Load exactly one certificate, as DER, from a PEM string.
///
/// # Example
///
/// ```rust,no_run
/// use keygen::cert::loader::load_certificate_from_pem;
///
/// # fn example() -> keygen::error::Result<()> {
/// let pem = std::fs::read_to_string("cert.pem")?;
/// let der = load_certificate_from_pem(&pem)?;
/// # Ok(())
/// # }
/// ```
pub fn load_certificate_from_pem(pem_str: &str) -> Result<Vec<u8>> {
    let mut items = read_items(pem_str)?;

    match (items.pop(), items.is_empty()) {
        (Some(Item::X509Certificate(cert_der)), true) => Ok(cert_der.to_vec()),
        (Some(_), true) => Err(KeygenError::PemError(
            "PEM file does not contain a certificate".to_string(),
        )),
        (Some(_), false) => Err(KeygenError::PemError(
            "PEM file contains more than one block".to_string(),
        )),
        (None, _) => Err(KeygenError::PemError("Empty PEM file".to_string())),
    }
}

/// Load exactly one `RSA PRIVATE KEY` block from a PEM string.
pub fn load_rsa_private_key_from_pem(pem_str: &str) -> Result<Keypair> {
    let mut items = read_items(pem_str)?;

    match (items.pop(), items.is_empty()) {
        (Some(Item::Pkcs1Key(key_der)), true) => {
            import_rsa_from_pkcs1_der(key_der.secret_pkcs1_der())
        }
        (Some(_), true) => Err(KeygenError::PemError(
            "PEM file does not contain an RSA private key".to_string(),
        )),
        (Some(_), false) => Err(KeygenError::PemError(
            "PEM file contains more than one block".to_string(),
        )),
        (None, _) => Err(KeygenError::PemError("Empty PEM file".to_string())),
    }
}
