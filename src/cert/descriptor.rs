//! The in-memory certificate template.
//!
//! A [`CertificateDescriptor`] collects everything that goes into the
//! certificate before it is signed, and is consumed by
//! [`CertificateDescriptor::self_sign`].

use crate::cert::builder::{
    basic_constraints_extension, create_organization_name, create_validity,
    generate_serial_number, key_usage_extension, server_auth_extension,
    subject_alt_name_extension,
};
use crate::cert::x509_signing::{sha256_with_rsa_algorithm, sign_tbs_certificate};
use crate::config::{GeneratorConfig, HostList};
use crate::crypto::keypair::Keypair;
use crate::error::Result;
use std::time::SystemTime;
use x509_cert::certificate::{Certificate, TbsCertificate, Version};
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Validity;

/// Template for a self-signed server certificate.
#[derive(Debug, Clone)]
pub struct CertificateDescriptor {
    pub organization: String,
    pub validity: Validity,
    pub serial_number: SerialNumber,
    pub hosts: HostList,
}

impl CertificateDescriptor {
    /// Populate a descriptor from the configuration, stamping it with `now`.
    pub fn new(config: &GeneratorConfig, hosts: HostList, now: SystemTime) -> Result<Self> {
        Ok(Self {
            organization: config.organization.clone(),
            validity: create_validity(now, config.expiration)?,
            serial_number: generate_serial_number()?,
            hosts,
        })
    }

    /// Sign the descriptor with `keypair`, using its own subject as issuer.
    pub fn self_sign(self, keypair: &Keypair) -> Result<Certificate> {
        let subject = create_organization_name(&self.organization)?;
        let issuer = subject.clone(); // Self-signed

        let mut extensions = vec![
            key_usage_extension()?,
            server_auth_extension()?,
            basic_constraints_extension()?,
        ];
        if let Some(san) = subject_alt_name_extension(&self.hosts)? {
            extensions.push(san);
        }

        let tbs = TbsCertificate {
            version: Version::V3,
            serial_number: self.serial_number,
            signature: sha256_with_rsa_algorithm(),
            issuer,
            validity: self.validity,
            subject,
            subject_public_key_info: keypair.public_key_info()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        };

        sign_tbs_certificate(tbs, keypair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::builder::organization_of;
    use crate::crypto::keypair::generate_rsa_keypair;
    use const_oid::db::rfc5280::{
        ID_CE_BASIC_CONSTRAINTS, ID_CE_EXT_KEY_USAGE, ID_CE_KEY_USAGE, ID_CE_SUBJECT_ALT_NAME,
    };
    use std::time::Duration;

    fn descriptor(config: &GeneratorConfig) -> CertificateDescriptor {
        let hosts = HostList::parse(&config.hosts).unwrap();
        CertificateDescriptor::new(config, hosts, SystemTime::now()).unwrap()
    }

    #[test]
    fn test_descriptor_defaults() {
        let config = GeneratorConfig::default();
        let desc = descriptor(&config);

        assert_eq!(desc.organization, "Acme Testing Corp");
        assert_eq!(desc.hosts.dns_names, vec!["localhost"]);
    }

    #[test]
    fn test_descriptor_validity_window() {
        let config = GeneratorConfig::default().expiration(Duration::from_secs(3600));
        let desc = descriptor(&config);

        let span = desc.validity.not_after.to_unix_duration()
            - desc.validity.not_before.to_unix_duration();
        assert_eq!(span, Duration::from_secs(3600));
    }

    #[test]
    fn test_self_sign_sets_issuer_and_subject() {
        let keypair = generate_rsa_keypair(1024).unwrap();
        let config = GeneratorConfig::default().organization("Test Org");
        let cert = descriptor(&config).self_sign(&keypair).unwrap();

        let tbs = &cert.tbs_certificate;
        assert_eq!(tbs.issuer, tbs.subject);
        assert_eq!(organization_of(&tbs.subject), Some("Test Org".to_string()));
        assert_eq!(tbs.version, Version::V3);
    }

    #[test]
    fn test_self_sign_extensions() {
        let keypair = generate_rsa_keypair(1024).unwrap();
        let cert = descriptor(&GeneratorConfig::default())
            .self_sign(&keypair)
            .unwrap();

        let ids: Vec<_> = cert
            .tbs_certificate
            .extensions
            .as_ref()
            .unwrap()
            .iter()
            .map(|ext| ext.extn_id)
            .collect();
        assert_eq!(
            ids,
            vec![
                ID_CE_KEY_USAGE,
                ID_CE_EXT_KEY_USAGE,
                ID_CE_BASIC_CONSTRAINTS,
                ID_CE_SUBJECT_ALT_NAME,
            ]
        );
    }

    #[test]
    fn test_self_sign_extension_criticality() {
        let keypair = generate_rsa_keypair(1024).unwrap();
        let cert = descriptor(&GeneratorConfig::default().hosts("127.0.0.1"))
            .self_sign(&keypair)
            .unwrap();

        let critical: Vec<bool> = cert
            .tbs_certificate
            .extensions
            .as_ref()
            .unwrap()
            .iter()
            .map(|ext| ext.critical)
            .collect();
        assert_eq!(critical, vec![true, false, true, false]);
    }

    #[test]
    fn test_self_sign_keeps_serial() {
        let keypair = generate_rsa_keypair(1024).unwrap();
        let desc = descriptor(&GeneratorConfig::default());
        let serial = desc.serial_number.clone();

        let cert = desc.self_sign(&keypair).unwrap();
        assert_eq!(cert.tbs_certificate.serial_number, serial);
    }
}
