//! X.509 certificate signing using x509-cert.
//!
//! This module signs TBS certificates with an RSA key and converts the
//! result to and from PEM. It also checks that a certificate verifies
//! against its own public key.

use crate::crypto::encode_pem;
use crate::crypto::keypair::{verify_pkcs1v15_sha256, Keypair};
use crate::error::{KeygenError, Result};
use const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION;
use der::asn1::{AnyRef, BitString};
use der::Any;
use der::{Decode, Encode};
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use spki::AlgorithmIdentifierOwned;
use x509_cert::certificate::{Certificate, TbsCertificate};

/// PEM tag for X.509 certificates.
pub const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// sha256WithRSAEncryption, with the NULL parameters RFC 4055 requires.
pub fn sha256_with_rsa_algorithm() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: SHA_256_WITH_RSA_ENCRYPTION,
        parameters: Some(Any::from(AnyRef::NULL)),
    }
}

/// Sign a TBS certificate and wrap it into a full certificate.
///
/// # Example
///
/// ```rust,no_run
/// use keygen::cert::descriptor::CertificateDescriptor;
/// use keygen::config::{GeneratorConfig, HostList};
/// use keygen::crypto::keypair::generate_rsa_keypair;
///
/// # fn example() -> keygen::error::Result<()> {
/// let config = GeneratorConfig::default();
/// let keypair = generate_rsa_keypair(config.bits)?;
/// let hosts = HostList::parse(&config.hosts)?;
/// let descriptor = CertificateDescriptor::new(&config, hosts, std::time::SystemTime::now())?;
/// // `self_sign` calls `sign_tbs_certificate` internally.
/// let cert = descriptor.self_sign(&keypair)?;
/// # Ok(())
/// # }
/// ```
pub fn sign_tbs_certificate(tbs: TbsCertificate, keypair: &Keypair) -> Result<Certificate> {
    let tbs_der = tbs
        .to_der()
        .map_err(|e| KeygenError::CertificateError(format!("Failed to encode TBS: {}", e)))?;

    let signature_bytes = keypair.sign(&tbs_der)?;
    let signature = BitString::from_bytes(&signature_bytes).map_err(|e| {
        KeygenError::CertificateError(format!("Failed to create signature bitstring: {}", e))
    })?;

    Ok(Certificate {
        signature_algorithm: tbs.signature.clone(),
        tbs_certificate: tbs,
        signature,
    })
}

/// Encode a Certificate as DER.
pub fn cert_to_der(cert: &Certificate) -> Result<Vec<u8>> {
    cert.to_der()
        .map_err(|e| KeygenError::CertificateError(format!("Failed to encode certificate: {}", e)))
}

/// Convert a Certificate to PEM format.
pub fn cert_to_pem(cert: &Certificate) -> Result<String> {
    Ok(encode_pem(CERTIFICATE_TAG, cert_to_der(cert)?))
}

/// Load a Certificate from PEM format.
pub fn cert_from_pem(pem_str: &str) -> Result<Certificate> {
    let pem = pem::parse(pem_str)
        .map_err(|e| KeygenError::PemError(format!("Failed to parse PEM: {}", e)))?;

    if pem.tag() != CERTIFICATE_TAG {
        return Err(KeygenError::PemError(format!(
            "Expected CERTIFICATE, got {}",
            pem.tag()
        )));
    }

    Certificate::from_der(pem.contents()).map_err(|e| {
        KeygenError::CertificateError(format!("Failed to decode certificate: {}", e))
    })
}

/// Check that a certificate is self-issued and verifies against its own key.
///
/// # Example
///
/// ```rust,no_run
/// use keygen::cert::x509_signing::{cert_from_pem, verify_self_signed};
///
/// # fn example() -> keygen::error::Result<()> {
/// let pem = std::fs::read_to_string("cert.pem")?;
/// verify_self_signed(&cert_from_pem(&pem)?)?;
/// # Ok(())
/// # }
/// ```
pub fn verify_self_signed(cert: &Certificate) -> Result<()> {
    let tbs = &cert.tbs_certificate;

    if tbs.issuer != tbs.subject {
        return Err(KeygenError::CertificateError(format!(
            "Issuer {} does not match subject {}",
            tbs.issuer, tbs.subject
        )));
    }

    if cert.signature_algorithm.oid != SHA_256_WITH_RSA_ENCRYPTION {
        return Err(KeygenError::CertificateError(format!(
            "Unsupported signature algorithm {}",
            cert.signature_algorithm.oid
        )));
    }

    let spki_der = tbs.subject_public_key_info.to_der().map_err(|e| {
        KeygenError::CertificateError(format!("Failed to encode public key info: {}", e))
    })?;
    let public = RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| KeygenError::CertificateError(format!("Invalid RSA public key: {}", e)))?;

    let tbs_der = tbs
        .to_der()
        .map_err(|e| KeygenError::CertificateError(format!("Failed to encode TBS: {}", e)))?;
    let signature = cert.signature.as_bytes().ok_or_else(|| {
        KeygenError::CertificateError("Signature has unused bits".to_string())
    })?;

    verify_pkcs1v15_sha256(&public, &tbs_der, signature)
}
