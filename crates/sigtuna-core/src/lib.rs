#![forbid(unsafe_code)]

//! Core types for the Sigtuna SAML assertion library: the error taxonomy,
//! XML namespace constants, and algorithm URI constants.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
