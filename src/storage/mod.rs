//! File storage module.
//!
//! This module writes the generated certificate and private key to disk.

pub mod output;
