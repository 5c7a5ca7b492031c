//! Certificate builder utilities.
//!
//! Small functions that produce the individual pieces of a TBS certificate:
//! the subject name, serial number, validity window and v3 extensions.

use crate::config::HostList;
use crate::error::{KeygenError, Result};
use const_oid::db::rfc5280::{
    ID_CE_BASIC_CONSTRAINTS, ID_CE_EXT_KEY_USAGE, ID_CE_KEY_USAGE, ID_CE_SUBJECT_ALT_NAME,
    ID_KP_SERVER_AUTH,
};
use const_oid::ObjectIdentifier;
use der::asn1::{
    GeneralizedTime, Ia5String, OctetString, SetOfVec, UintRef, UtcTime, Utf8StringRef,
};
use der::{Decode, Encode};
use rand::rngs::OsRng;
use rand::RngCore;
use std::time::{Duration, SystemTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    BasicConstraints, ExtendedKeyUsage, KeyUsage, KeyUsages, SubjectAltName,
};
use x509_cert::ext::Extension;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};

/// Width of a serial number in bytes; serials are drawn from [0, 2^160).
pub const SERIAL_NUMBER_BYTES: usize = 20;

/// Build a distinguished name holding a single organization attribute.
pub fn create_organization_name(organization: &str) -> Result<RdnSequence> {
    let org_attr = AttributeTypeAndValue {
        oid: const_oid::db::rfc4519::O,
        value: Utf8StringRef::new(organization)
            .map_err(|e| KeygenError::ParseError(format!("Invalid organization: {}", e)))?
            .into(),
    };

    let mut attr_set = SetOfVec::new();
    attr_set
        .insert_ordered(org_attr)
        .map_err(|e| KeygenError::CertificateError(format!("Failed to add attribute: {}", e)))?;

    Ok(RdnSequence(vec![RelativeDistinguishedName::from(attr_set)]))
}

/// The first organization attribute of a name, if any.
pub fn organization_of(name: &RdnSequence) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid == const_oid::db::rfc4519::O)
        .and_then(|atv| {
            Utf8StringRef::try_from(&atv.value)
                .ok()
                .map(|s| s.as_str().to_string())
        })
}

/// Draw a serial number uniformly from [0, 2^160).
///
/// All 160 bits are random, so the value may need 21 octets once a sign
/// byte is added. `SerialNumber::new` caps input at 20 octets, so the serial
/// is built by decoding an unsigned INTEGER, which allows the extra byte.
pub fn generate_serial_number() -> Result<SerialNumber> {
    let mut bytes = [0u8; SERIAL_NUMBER_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| KeygenError::SerialNumberError(e.to_string()))?;

    serial_number_from_bytes(&bytes)
}

/// Interpret big-endian bytes as a non-negative serial number.
pub fn serial_number_from_bytes(bytes: &[u8]) -> Result<SerialNumber> {
    let encoded = UintRef::new(bytes)
        .and_then(|uint| uint.to_der())
        .map_err(|e| KeygenError::SerialNumberError(e.to_string()))?;

    SerialNumber::from_der(&encoded).map_err(|e| {
        KeygenError::SerialNumberError(format!("Failed to create serial number: {}", e))
    })
}

/// Encode a validity bound: UTCTime through 2049, GeneralizedTime after.
pub fn validity_time(t: SystemTime) -> Result<Time> {
    if let Ok(utc) = UtcTime::from_system_time(t) {
        return Ok(Time::UtcTime(utc));
    }

    GeneralizedTime::from_system_time(t)
        .map(Time::GeneralTime)
        .map_err(|e| KeygenError::CertificateError(format!("Failed to create validity: {}", e)))
}

/// Validity window from `now` to `now + expiration`.
pub fn create_validity(now: SystemTime, expiration: Duration) -> Result<Validity> {
    let not_after = now.checked_add(expiration).ok_or_else(|| {
        KeygenError::CertificateError("Expiration is too far in the future".to_string())
    })?;

    Ok(Validity {
        not_before: validity_time(now)?,
        not_after: validity_time(not_after)?,
    })
}

fn extension<T: Encode>(
    extn_id: ObjectIdentifier,
    critical: bool,
    value: &T,
) -> Result<Extension> {
    let der = value.to_der().map_err(|e| {
        KeygenError::CertificateError(format!("Failed to encode extension {}: {}", extn_id, e))
    })?;

    Ok(Extension {
        extn_id,
        critical,
        extn_value: OctetString::new(der)
            .map_err(|e| KeygenError::CertificateError(e.to_string()))?,
    })
}

/// Critical KeyUsage with digitalSignature and keyEncipherment.
pub fn key_usage_extension() -> Result<Extension> {
    let usage = KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment);
    extension(ID_CE_KEY_USAGE, true, &usage)
}

/// ExtendedKeyUsage with serverAuth.
pub fn server_auth_extension() -> Result<Extension> {
    extension(
        ID_CE_EXT_KEY_USAGE,
        false,
        &ExtendedKeyUsage(vec![ID_KP_SERVER_AUTH]),
    )
}

/// Critical BasicConstraints marking a leaf (cA = false).
pub fn basic_constraints_extension() -> Result<Extension> {
    let constraints = BasicConstraints {
        ca: false,
        path_len_constraint: None,
    };
    extension(ID_CE_BASIC_CONSTRAINTS, true, &constraints)
}

/// SubjectAltName listing DNS names first, then IP addresses.
///
/// Returns `None` when the host list is empty.
pub fn subject_alt_name_extension(hosts: &HostList) -> Result<Option<Extension>> {
    if hosts.is_empty() {
        return Ok(None);
    }

    let mut names = Vec::with_capacity(hosts.dns_names.len() + hosts.ip_addresses.len());
    for dns in &hosts.dns_names {
        let ia5 = Ia5String::new(dns).map_err(|e| {
            KeygenError::CertificateError(format!("Invalid DNS name {:?}: {}", dns, e))
        })?;
        names.push(GeneralName::DnsName(ia5));
    }
    for ip in &hosts.ip_addresses {
        // IPv4-mapped IPv6 addresses are stored in their 4-byte form.
        let octets = match ip.to_canonical() {
            std::net::IpAddr::V4(v4) => v4.octets().to_vec(),
            std::net::IpAddr::V6(v6) => v6.octets().to_vec(),
        };
        names.push(GeneralName::IpAddress(
            OctetString::new(octets).map_err(|e| KeygenError::CertificateError(e.to_string()))?,
        ));
    }

    extension(ID_CE_SUBJECT_ALT_NAME, false, &SubjectAltName(names)).map(Some)
}
