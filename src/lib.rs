//! keygen: self-signed certificates for local TLS testing
//!
//! This library generates a fresh RSA key pair and a self-signed X.509
//! server certificate for a list of DNS names and IP addresses, and writes
//! both as PEM files. It is meant for development servers that need a
//! certificate without a certificate authority.
//!
//! # Architecture
//!
//! Generation is a single straight-line routine driven by an explicit
//! [`config::GeneratorConfig`]. Every step returns a `Result`; nothing in the
//! library exits the process, so the whole flow is testable in-process.
//!
//! # Example
//!
//! ```rust,no_run
//! use keygen::config::GeneratorConfig;
//! use keygen::generator::generate_and_write;
//! use keygen::error::Result;
//!
//! fn example() -> Result<()> {
//!     let config = GeneratorConfig::default().hosts("localhost,127.0.0.1");
//!     let report = generate_and_write(&config)?;
//!     println!("Certificate written to {}", report.certificate_path.display());
//!     Ok(())
//! }
//! ```

pub mod cert;
pub mod config;
pub mod crypto;
pub mod error;
pub mod generator;
pub mod storage;

// Re-export commonly used types
pub use config::{GeneratorConfig, HostList, KeyPathPolicy};
pub use error::{KeygenError, Result};
