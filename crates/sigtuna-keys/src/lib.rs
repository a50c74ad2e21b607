#![forbid(unsafe_code)]

//! Key material handling for the Sigtuna SAML assertion library.

pub mod key;
pub mod loader;

pub use key::{Key, KeyData, KeyUsage};
