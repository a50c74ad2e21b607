#![forbid(unsafe_code)]

//! XML Digital Signature engine for SAML assertions: enveloped signature
//! creation, reference-digest validation, and key-based verification.
//! The engine is stateless; every operation works over serialized XML
//! plus caller-supplied key material.

pub mod sign;
pub mod verify;

pub use sign::sign_assertion;
pub use verify::{read_signature, verify_reference, verify_signature, SignatureBlock};
