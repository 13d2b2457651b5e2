//! Per-format structural probes.
//!
//! Every probe has the same shape: it receives its own view of the input and
//! either returns a [`ProbeMatch`] or a [`ProbeError`] explaining why the
//! bytes are not its format. The classifier treats every error the same way.

pub mod archive;
pub mod csr;
pub mod keystore;
pub mod mspvk;
pub mod openssl;
pub mod pkcs8;
pub mod publickey;
pub mod x509;

use crate::error::ProbeResult;
use crate::filetype::{ArtifactType, EncryptionState};
use crate::source::ByteSource;

/// A positive verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeMatch {
    pub artifact_type: ArtifactType,
    /// Short description of what matched
    pub evidence: String,
}

impl ProbeMatch {
    pub fn new(artifact_type: ArtifactType, evidence: impl Into<String>) -> Self {
        Self {
            artifact_type,
            evidence: evidence.into(),
        }
    }
}

/// Entry point shared by every probe
pub type ProbeFn = fn(&ByteSource<'_>) -> ProbeResult<ProbeMatch>;

/// Encryption verdict plus what it was based on, used by the key probes
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyVerdict {
    pub state: EncryptionState,
    pub evidence: String,
}

impl KeyVerdict {
    pub fn encrypted(evidence: impl Into<String>) -> Self {
        Self {
            state: EncryptionState::Encrypted,
            evidence: evidence.into(),
        }
    }

    pub fn unencrypted(evidence: impl Into<String>) -> Self {
        Self {
            state: EncryptionState::Unencrypted,
            evidence: evidence.into(),
        }
    }

    /// Turn into a match for the given encrypted/unencrypted pair
    pub fn into_match(
        self,
        encrypted: ArtifactType,
        unencrypted: ArtifactType,
    ) -> Option<ProbeMatch> {
        self.state
            .select(encrypted, unencrypted)
            .map(|artifact_type| ProbeMatch::new(artifact_type, self.evidence))
    }
}

/// Collapse a verdict result into a plain encryption state
pub(crate) fn state_of(verdict: ProbeResult<KeyVerdict>) -> EncryptionState {
    verdict
        .map(|v| v.state)
        .unwrap_or(EncryptionState::NotThisFormat)
}
