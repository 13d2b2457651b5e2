//! OpenSSL public keys: a DER `SubjectPublicKeyInfo`, bare or inside a
//! `PUBLIC KEY` PEM block.

use std::borrow::Cow;

use x509_parser::prelude::*;

use crate::error::{ProbeError, ProbeResult};
use crate::filetype::ArtifactType;
use crate::pem;
use crate::probe::ProbeMatch;
use crate::source::ByteSource;

pub const PEM_LABEL: &str = "PUBLIC KEY";

/// What a successfully loaded public key looks like
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeySummary {
    /// Dotted algorithm OID
    pub algorithm: String,
    /// Key size in bits when the algorithm reports one
    pub bits: Option<usize>,
}

/// Fully parse a public key, PEM or DER
pub fn load(bytes: &[u8]) -> ProbeResult<PublicKeySummary> {
    let der: Cow<'_, [u8]> = match pem::decode(bytes) {
        Some(block) if block.label == PEM_LABEL => Cow::Owned(block.payload),
        Some(block) => {
            return Err(ProbeError::mismatch(format!(
                "PEM label {} is not {PEM_LABEL}",
                block.label
            )))
        }
        None => Cow::Borrowed(bytes),
    };

    let (rest, spki) = SubjectPublicKeyInfo::from_der(&der)
        .map_err(|e| ProbeError::mismatch(format!("SubjectPublicKeyInfo: {e:?}")))?;
    if !rest.is_empty() {
        return Err(ProbeError::mismatch(format!(
            "{} bytes after SubjectPublicKeyInfo",
            rest.len()
        )));
    }

    let key = spki
        .parsed()
        .map_err(|e| ProbeError::mismatch(format!("public key body: {e:?}")))?;
    let bits = match key.key_size() {
        0 => None,
        n => Some(n),
    };

    Ok(PublicKeySummary {
        algorithm: spki.algorithm.algorithm.to_id_string(),
        bits,
    })
}

pub fn probe(source: &ByteSource<'_>) -> ProbeResult<ProbeMatch> {
    let summary = load(source.as_bytes())?;
    let evidence = match summary.bits {
        Some(bits) => format!("SubjectPublicKeyInfo, {} {bits} bits", summary.algorithm),
        None => format!("SubjectPublicKeyInfo, {}", summary.algorithm),
    };
    Ok(ProbeMatch::new(ArtifactType::OpenSslPublicKey, evidence))
}
