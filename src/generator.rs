//! The certificate generator.
//!
//! Generation is a straight line: key pair, host list, descriptor,
//! signature, then the two files. Nothing here exits the process; every
//! failure comes back as a [`KeygenError`] for the caller to act on.

use crate::cert::descriptor::CertificateDescriptor;
use crate::cert::x509_signing::cert_to_pem;
use crate::config::{format_duration, GeneratorConfig, HostList};
use crate::crypto::keypair::{generate_rsa_keypair, Keypair};
use crate::error::{KeygenError, Result};
use crate::storage::output::{write_private_file, write_public_file};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use x509_cert::certificate::Certificate;

/// Everything produced by one run, before anything touches the disk.
#[derive(Debug, Clone)]
pub struct GeneratedArtifacts {
    pub keypair: Keypair,
    pub certificate: Certificate,
    pub hosts: HostList,
}

impl GeneratedArtifacts {
    /// Certificate serial number as lowercase hex.
    pub fn serial_hex(&self) -> String {
        hex::encode(self.certificate.tbs_certificate.serial_number.as_bytes())
    }
}

/// Paths written by [`generate_and_write`].
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub certificate_path: PathBuf,
    /// `None` when the key write failed and the config is not strict.
    pub key_path: Option<PathBuf>,
    pub artifacts: GeneratedArtifacts,
}

fn format_timestamp(since_epoch: Duration) -> String {
    chrono::DateTime::from_timestamp(since_epoch.as_secs() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Generate a key pair and a self-signed certificate for `config`.
///
/// The key pair is generated before the host list is checked, so an empty
/// host list still costs one key generation.
///
/// # Example
///
/// ```rust,no_run
/// use keygen::config::GeneratorConfig;
/// use keygen::generator::generate;
///
/// # fn example() -> keygen::error::Result<()> {
/// let config = GeneratorConfig::default().hosts("localhost,127.0.0.1");
/// let artifacts = generate(&config)?;
/// println!("serial {}", artifacts.serial_hex());
/// # Ok(())
/// # }
/// ```
pub fn generate(config: &GeneratorConfig) -> Result<GeneratedArtifacts> {
    let keypair = generate_rsa_keypair(config.bits)?;
    info!("Generated {} bit RSA key", keypair.bits());

    let hosts = HostList::parse(&config.hosts)?;
    info!(
        "Certificate covers DNS names {:?} and IP addresses {:?}",
        hosts.dns_names, hosts.ip_addresses
    );

    let descriptor = CertificateDescriptor::new(config, hosts.clone(), SystemTime::now())?;
    info!(
        "Certificate valid from {} until {} ({})",
        format_timestamp(descriptor.validity.not_before.to_unix_duration()),
        format_timestamp(descriptor.validity.not_after.to_unix_duration()),
        format_duration(config.expiration)
    );

    let certificate = descriptor.self_sign(&keypair)?;
    let artifacts = GeneratedArtifacts {
        keypair,
        certificate,
        hosts,
    };
    info!("Signed certificate with serial {}", artifacts.serial_hex());

    Ok(artifacts)
}

/// Write the certificate PEM to the configured certificate path.
pub fn write_certificate(
    config: &GeneratorConfig,
    artifacts: &GeneratedArtifacts,
) -> Result<PathBuf> {
    let pem = cert_to_pem(&artifacts.certificate)?;

    write_public_file(&config.cert_path, &pem).map_err(|source| {
        KeygenError::CertificateFileError {
            path: config.cert_path.clone(),
            source,
        }
    })?;

    Ok(config.cert_path.clone())
}

/// Write the private key PEM.
///
/// The destination follows [`GeneratorConfig::key_output_path`]. A failed
/// write is returned as an error only in strict mode; otherwise it is logged
/// and `Ok(None)` is returned.
pub fn write_private_key(
    config: &GeneratorConfig,
    artifacts: &GeneratedArtifacts,
) -> Result<Option<PathBuf>> {
    let path = config.key_output_path();
    if config.key_path_ignored() {
        warn!(
            "Ignoring key path {}, writing the private key to {} (pass --honor-key-path to use it)",
            config.key_path.display(),
            path.display()
        );
    }

    let pem = artifacts.keypair.to_pkcs1_pem()?;
    match write_private_file(path, &pem) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(source) => {
            let err = KeygenError::KeyFileError {
                path: path.to_path_buf(),
                source,
            };
            if config.strict {
                return Err(err);
            }
            error!("{}", err);
            Ok(None)
        }
    }
}

/// Run the whole generator: generate, then write both files.
///
/// A certificate already on disk is left in place if the key write fails.
pub fn generate_and_write(config: &GeneratorConfig) -> Result<GenerationReport> {
    let artifacts = generate(config)?;
    let certificate_path = write_certificate(config, &artifacts)?;
    let key_path = write_private_key(config, &artifacts)?;

    Ok(GenerationReport {
        certificate_path,
        key_path,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyPathPolicy;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> GeneratorConfig {
        GeneratorConfig::default()
            .bits(1024)
            .cert_path(temp_dir.path().join("cert.pem"))
            .key_path(temp_dir.path().join("key.pem"))
            .key_path_policy(KeyPathPolicy::Honor)
    }

    #[test]
    fn test_generate_missing_hosts() {
        let config = GeneratorConfig::default().bits(1024).hosts("");
        assert!(matches!(generate(&config), Err(KeygenError::MissingHosts)));
    }

    #[test]
    fn test_generate_invalid_bits() {
        let config = GeneratorConfig::default().bits(16);
        assert!(matches!(
            generate(&config),
            Err(KeygenError::KeyGenerationError(_))
        ));
    }

    #[test]
    fn test_generate_invalid_dns_name() {
        let config = GeneratorConfig::default().bits(1024).hosts("bücher.example");
        assert!(matches!(
            generate(&config),
            Err(KeygenError::CertificateError(_))
        ));
    }

    #[test]
    fn test_generate_serial_hex() {
        let artifacts = generate(&GeneratorConfig::default().bits(1024)).unwrap();
        let serial = artifacts.serial_hex();
        assert!(!serial.is_empty());
        assert!(serial.len() <= 42);
    }

    #[test]
    fn test_generate_and_write() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let report = generate_and_write(&config).unwrap();
        assert_eq!(report.certificate_path, config.cert_path);
        assert_eq!(report.key_path, Some(config.key_path.clone()));
        assert!(config.cert_path.exists());
        assert!(config.key_path.exists());
    }

    #[test]
    fn test_certificate_write_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let config =
            test_config(&temp_dir).cert_path(temp_dir.path().join("missing").join("cert.pem"));

        let result = generate_and_write(&config);
        assert!(matches!(
            result,
            Err(KeygenError::CertificateFileError { .. })
        ));
        assert!(!config.key_path.exists());
    }

    #[test]
    fn test_key_write_failure_lenient() {
        let temp_dir = TempDir::new().unwrap();
        let config =
            test_config(&temp_dir).key_path(temp_dir.path().join("missing").join("key.pem"));

        let report = generate_and_write(&config).unwrap();
        assert!(report.key_path.is_none());
        assert!(config.cert_path.exists());
    }

    #[test]
    fn test_key_write_failure_strict() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir)
            .key_path(temp_dir.path().join("missing").join("key.pem"))
            .strict(true);

        let result = generate_and_write(&config);
        assert!(matches!(result, Err(KeygenError::KeyFileError { .. })));
        // No rollback of the certificate.
        assert!(config.cert_path.exists());
    }
}
