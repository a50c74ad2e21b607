#![forbid(unsafe_code)]

/// Errors produced by the Sigtuna SAML assertion library.
///
/// Every parse-time failure surfaces as a distinct variant so callers can
/// branch on the kind without matching message strings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported version: {0}")]
    UnsupportedVersion(String),

    #[error("missing ID attribute on SAML assertion")]
    MissingId,

    #[error("missing <saml:Issuer> in assertion")]
    MissingIssuer,

    #[error("authentication context constraint violated: {0}")]
    AuthnContextConstraint(String),

    #[error("reference validation failed: {0}")]
    ReferenceValidation(String),

    #[error("unable to validate signature: {0}")]
    SignatureValidation(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("malformed typed value: {0}")]
    Parse(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
