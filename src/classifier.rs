//! The classification cascade.
//!
//! Probes run in a fixed order and the first one to match decides the
//! result. Earlier entries are the more specific formats: a PEM private key
//! followed by its certificate is reported as the key, and keystores come
//! last because their PKCS #12 check accepts any DER `SEQUENCE { INTEGER 3 ..}`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use base64::Engine;
use rayon::prelude::*;

use crate::error::DetectError;
use crate::filetype::{ArtifactType, ClassificationOutcome, KeyStoreVariant};
use crate::pem;
use crate::probe::{archive, csr, keystore, mspvk, openssl, pkcs8, publickey, x509};
use crate::probe::{ProbeFn, ProbeMatch};
use crate::source::ByteSource;

/// One named stage of the cascade
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub name: &'static str,
    pub run: ProbeFn,
}

/// Probe order; first match wins
pub const CASCADE: [Probe; 9] = [
    Probe { name: "archive", run: archive::probe },
    Probe { name: "pkcs8", run: pkcs8::probe },
    Probe { name: "ms-pvk", run: mspvk::probe },
    Probe { name: "openssl-private-key", run: openssl::probe },
    Probe { name: "openssl-public-key", run: publickey::probe },
    Probe { name: "certificate", run: x509::certificate_probe },
    Probe { name: "crl", run: x509::crl_probe },
    Probe { name: "csr", run: csr::probe },
    Probe { name: "keystore", run: keystore::probe },
];

/// Stateless entry point to the cascade; cheap to copy and share across threads
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatClassifier;

impl FormatClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Best-matching type, `Unknown` for empty or unrecognised input
    pub fn classify(&self, bytes: &[u8]) -> ArtifactType {
        if bytes.is_empty() {
            tracing::debug!("empty input, nothing to classify");
            return ArtifactType::Unknown;
        }
        self.examine_source(&ByteSource::new(bytes)).artifact_type
    }

    /// Classification with evidence; empty input is an error here
    pub fn examine(&self, bytes: &[u8]) -> Result<ClassificationOutcome, DetectError> {
        if bytes.is_empty() {
            return Err(DetectError::EmptyInput);
        }
        Ok(self.examine_source(&ByteSource::new(bytes)))
    }

    /// Read a file and classify it
    pub fn classify_path(
        &self,
        path: &Path,
        limit: Option<u64>,
    ) -> Result<ClassificationOutcome, DetectError> {
        let source = ByteSource::from_path(path, limit)?;
        if source.is_empty() {
            return Err(DetectError::EmptyInput);
        }
        Ok(self.examine_source(&source))
    }

    /// Classify many files in parallel, keeping input order
    pub fn classify_paths(
        &self,
        paths: &[PathBuf],
        limit: Option<u64>,
    ) -> Vec<Result<ClassificationOutcome, DetectError>> {
        paths
            .par_iter()
            .map(|path| self.classify_path(path, limit))
            .collect()
    }

    /// Run the cascade over an already materialised source
    pub fn examine_source(&self, source: &ByteSource<'_>) -> ClassificationOutcome {
        let _span = tracing::debug_span!("classify", bytes = source.len()).entered();

        let decoded = unwrap_base64(source);
        let target: &ByteSource<'_> = match &decoded {
            Some(decoded) => {
                tracing::debug!(decoded = decoded.len(), "input is Base64 text, classifying decoded bytes");
                decoded
            }
            None => source,
        };

        for probe in CASCADE {
            if let Some(found) = run_probe(probe, target) {
                let evidence = if decoded.is_some() {
                    format!("Base64 wrapped, {}", found.evidence)
                } else {
                    found.evidence
                };
                return ClassificationOutcome::new(found.artifact_type, evidence);
            }
        }

        tracing::debug!("no probe matched");
        ClassificationOutcome::unknown()
    }
}

/// Run one probe on its own view of the bytes. Errors and panics both mean
/// "not this format".
fn run_probe(probe: Probe, source: &ByteSource<'_>) -> Option<ProbeMatch> {
    let view = source.view();
    match catch_unwind(AssertUnwindSafe(|| (probe.run)(&view))) {
        Ok(Ok(found)) => {
            tracing::debug!(
                probe = probe.name,
                artifact = ?found.artifact_type,
                evidence = %found.evidence,
                "probe matched"
            );
            Some(found)
        }
        Ok(Err(reason)) => {
            tracing::trace!(probe = probe.name, %reason, "probe declined");
            None
        }
        Err(_) => {
            tracing::warn!(probe = probe.name, "probe panicked, treating as no match");
            None
        }
    }
}

/// Whole input is Base64 text (padding optional): hand the decoded bytes to the probes
fn unwrap_base64(source: &ByteSource<'_>) -> Option<ByteSource<'static>> {
    let text = std::str::from_utf8(source.as_bytes()).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    pem::LENIENT_BASE64
        .decode(text)
        .ok()
        .filter(|decoded| !decoded.is_empty())
        .map(ByteSource::owned)
}

/// Classify with the default classifier
pub fn classify(bytes: &[u8]) -> ArtifactType {
    FormatClassifier::new().classify(bytes)
}

/// Classify with evidence using the default classifier
pub fn examine(bytes: &[u8]) -> Result<ClassificationOutcome, DetectError> {
    FormatClassifier::new().examine(bytes)
}

/// Keystore format only, skipping every other probe
pub fn detect_keystore_type(bytes: &[u8]) -> Option<KeyStoreVariant> {
    keystore::detect(bytes)
}
