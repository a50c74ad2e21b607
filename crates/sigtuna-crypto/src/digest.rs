#![forbid(unsafe_code)]

//! Digest computation dispatched by algorithm URI.

use sha1::Digest as _;
use sigtuna_core::{algorithm, Error};

/// Compute a digest over `data` using the algorithm named by `uri`.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    match uri {
        algorithm::SHA1 => Ok(sha1::Sha1::digest(data).to_vec()),
        algorithm::SHA256 => Ok(sha2::Sha256::digest(data).to_vec()),
        algorithm::SHA384 => Ok(sha2::Sha384::digest(data).to_vec()),
        algorithm::SHA512 => Ok(sha2::Sha512::digest(data).to_vec()),
        _ => Err(Error::UnsupportedAlgorithm(format!("digest: {uri}"))),
    }
}
