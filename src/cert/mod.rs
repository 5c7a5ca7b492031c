//! Certificate generation module.
//!
//! This module builds, signs and reloads self-signed X.509 server certificates.

pub mod builder;
pub mod descriptor;
pub mod loader;
pub mod x509_signing;
