//! Generator configuration.
//!
//! [`GeneratorConfig`] is the explicit value object handed to the generator.
//! The binary builds one from command-line flags; library users and tests
//! build one with [`GeneratorConfig::default`] and the fluent setters.

use crate::error::{KeygenError, Result};
use std::net::IpAddr;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Default comma-separated host list.
pub const DEFAULT_HOSTS: &str = "localhost";

/// Default validity period: 365 days.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Default RSA modulus size in bits.
pub const DEFAULT_BITS: usize = 2048;

/// Default subject organization.
pub const DEFAULT_ORGANIZATION: &str = "Acme Testing Corp";

/// Default certificate output path.
pub const DEFAULT_CERT_PATH: &str = "cert.pem";

/// Default private key output path.
pub const DEFAULT_KEY_PATH: &str = "key.pem";

/// Path the private key is written to under [`KeyPathPolicy::Legacy`].
pub const LEGACY_KEY_PATH: &str = "key.pem";

/// Where the private key file ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPathPolicy {
    /// Always write `key.pem` in the working directory, ignoring the
    /// configured key path.
    #[default]
    Legacy,
    /// Write to the configured key path.
    Honor,
}

/// Certificate generation configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Comma-separated DNS names and IP literals.
    pub hosts: String,
    pub expiration: Duration,
    pub bits: usize,
    pub organization: String,
    pub cert_path: PathBuf,
    /// Requested key path; only used under [`KeyPathPolicy::Honor`].
    pub key_path: PathBuf,
    pub key_path_policy: KeyPathPolicy,
    /// Treat a failed key-file write as fatal.
    pub strict: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            hosts: DEFAULT_HOSTS.to_string(),
            expiration: DEFAULT_EXPIRATION,
            bits: DEFAULT_BITS,
            organization: DEFAULT_ORGANIZATION.to_string(),
            cert_path: PathBuf::from(DEFAULT_CERT_PATH),
            key_path: PathBuf::from(DEFAULT_KEY_PATH),
            key_path_policy: KeyPathPolicy::default(),
            strict: false,
        }
    }
}

impl GeneratorConfig {
    /// Set the comma-separated host list
    pub fn hosts(mut self, hosts: impl Into<String>) -> Self {
        self.hosts = hosts.into();
        self
    }

    /// Set validity period
    pub fn expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Set key size
    pub fn bits(mut self, bits: usize) -> Self {
        self.bits = bits;
        self
    }

    /// Set organization
    pub fn organization(mut self, org: impl Into<String>) -> Self {
        self.organization = org.into();
        self
    }

    pub fn cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cert_path = path.into();
        self
    }

    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = path.into();
        self
    }

    pub fn key_path_policy(mut self, policy: KeyPathPolicy) -> Self {
        self.key_path_policy = policy;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The path the private key is actually written to.
    pub fn key_output_path(&self) -> &Path {
        match self.key_path_policy {
            KeyPathPolicy::Legacy => Path::new(LEGACY_KEY_PATH),
            KeyPathPolicy::Honor => &self.key_path,
        }
    }

    /// Whether the configured key path is being ignored.
    ///
    /// `.` components are dropped before comparing, so `./key.pem` names
    /// the same file as `key.pem`.
    pub fn key_path_ignored(&self) -> bool {
        without_cur_dir(self.key_output_path()) != without_cur_dir(&self.key_path)
    }
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Hosts covered by the certificate, partitioned by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostList {
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
}

impl HostList {
    /// Split a comma-separated host list into IP literals and DNS names.
    ///
    /// An entry is an IP address iff it parses as one; everything else is
    /// kept verbatim as a DNS name. Both lists keep input order.
    ///
    /// # Example
    ///
    /// ```
    /// use keygen::config::HostList;
    ///
    /// let hosts = HostList::parse("localhost,127.0.0.1,::1").unwrap();
    /// assert_eq!(hosts.dns_names, vec!["localhost".to_string()]);
    /// assert_eq!(hosts.ip_addresses.len(), 2);
    /// ```
    pub fn parse(hosts: &str) -> Result<Self> {
        if hosts.is_empty() {
            return Err(KeygenError::MissingHosts);
        }

        let mut list = HostList::default();
        for host in hosts.split(',') {
            match host.parse::<IpAddr>() {
                Ok(ip) => list.ip_addresses.push(ip),
                Err(_) => list.dns_names.push(host.to_string()),
            }
        }

        Ok(list)
    }

    pub fn is_empty(&self) -> bool {
        self.dns_names.is_empty() && self.ip_addresses.is_empty()
    }
}

const NANOS_PER_SECOND: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "\u{b5}s" | "\u{3bc}s" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(60 * NANOS_PER_SECOND),
        "h" => Some(60 * 60 * NANOS_PER_SECOND),
        _ => None,
    }
}

/// Parse a duration such as `8760h`, `1h30m` or `1.5h`.
///
/// The input is a sequence of decimal numbers with optional fractions, each
/// followed by one of `ns`, `us` (`µs`), `ms`, `s`, `m`, `h`. A bare `0` is
/// accepted; a sign is not.
///
/// # Example
///
/// ```
/// use keygen::config::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
/// ```
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || KeygenError::ParseError(format!("invalid duration {:?}", input));

    let mut s = input;
    if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    } else if s.starts_with('-') {
        return Err(KeygenError::ParseError(format!(
            "negative duration {:?} is not supported",
            input
        )));
    }

    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, rest) = s.split_at(int_len);

        let (frac_part, rest) = match rest.strip_prefix('.') {
            Some(after) => {
                let frac_len = after.bytes().take_while(u8::is_ascii_digit).count();
                after.split_at(frac_len)
            }
            None => ("", rest),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (unit, rest) = rest.split_at(unit_len);
        if unit.is_empty() {
            return Err(KeygenError::ParseError(format!(
                "missing unit in duration {:?}",
                input
            )));
        }
        let per_unit = unit_nanos(unit).ok_or_else(|| {
            KeygenError::ParseError(format!("unknown unit {:?} in duration {:?}", unit, input))
        })?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };

        // Digits past nanosecond precision of an hour cannot matter.
        let mut frac: u128 = 0;
        let mut scale: u128 = 1;
        for digit in frac_part.bytes() {
            if scale >= 1_000_000_000_000_000_000 {
                break;
            }
            frac = frac * 10 + u128::from(digit - b'0');
            scale *= 10;
        }

        total = whole
            .checked_mul(per_unit)
            .and_then(|v| v.checked_add(frac * per_unit / scale))
            .and_then(|v| v.checked_add(total))
            .ok_or_else(invalid)?;
        if total > i64::MAX as u128 {
            return Err(invalid());
        }

        s = rest;
    }

    Ok(Duration::from_nanos(total as u64))
}

fn format_fraction(value: u128, per: u128) -> String {
    let whole = value / per;
    let frac = value % per;
    if frac == 0 {
        return whole.to_string();
    }
    let width = per.to_string().len() - 1;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Format a duration in the unit-suffixed form `parse_duration` reads,
/// e.g. `8760h0m0s` or `1.5s`.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SECOND {
        let (unit, per) = if nanos < 1_000 {
            ("ns", 1)
        } else if nanos < 1_000_000 {
            ("\u{b5}s", 1_000)
        } else {
            ("ms", 1_000_000)
        };
        return format!("{}{}", format_fraction(nanos, per), unit);
    }

    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = format_fraction(
        u128::from(secs % 60) * NANOS_PER_SECOND + u128::from(duration.subsec_nanos()),
        NANOS_PER_SECOND,
    );

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
