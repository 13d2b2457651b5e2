//! The closed set of artifact kinds the classifier can report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Concrete artifact found in a byte buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    JksKeystore,
    JceksKeystore,
    Pkcs12Keystore,
    BksV1Keystore,
    BksKeystore,
    BcfksKeystore,
    UberKeystore,
    Certificate,
    Pkcs10Csr,
    SpkacCsr,
    Crl,
    EncryptedPkcs8Key,
    UnencryptedPkcs8Key,
    EncryptedLegacyPlatformKey,
    UnencryptedLegacyPlatformKey,
    EncryptedOpenSslKey,
    UnencryptedOpenSslKey,
    OpenSslPublicKey,
    SignedArchive,
    Unknown,
}

/// Coarse grouping used for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactCategory {
    Keystore,
    Certificate,
    Request,
    RevocationList,
    PrivateKey,
    PublicKey,
    Archive,
    Unknown,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 20] = [
        Self::JksKeystore,
        Self::JceksKeystore,
        Self::Pkcs12Keystore,
        Self::BksV1Keystore,
        Self::BksKeystore,
        Self::BcfksKeystore,
        Self::UberKeystore,
        Self::Certificate,
        Self::Pkcs10Csr,
        Self::SpkacCsr,
        Self::Crl,
        Self::EncryptedPkcs8Key,
        Self::UnencryptedPkcs8Key,
        Self::EncryptedLegacyPlatformKey,
        Self::UnencryptedLegacyPlatformKey,
        Self::EncryptedOpenSslKey,
        Self::UnencryptedOpenSslKey,
        Self::OpenSslPublicKey,
        Self::SignedArchive,
        Self::Unknown,
    ];

    /// Human-facing description
    pub fn friendly_name(&self) -> &'static str {
        match self {
            Self::JksKeystore => "JKS KeyStore",
            Self::JceksKeystore => "JCEKS KeyStore",
            Self::Pkcs12Keystore => "PKCS #12 KeyStore",
            Self::BksV1Keystore => "BKS-V1 KeyStore",
            Self::BksKeystore => "BKS KeyStore",
            Self::BcfksKeystore => "BCFKS KeyStore",
            Self::UberKeystore => "UBER KeyStore",
            Self::Certificate => "Certificate(s)",
            Self::Pkcs10Csr => "PKCS #10 CSR",
            Self::SpkacCsr => "SPKAC CSR",
            Self::Crl => "CRL",
            Self::EncryptedPkcs8Key => "Encrypted PKCS #8 Private Key",
            Self::UnencryptedPkcs8Key => "Unencrypted PKCS #8 Private Key",
            Self::EncryptedLegacyPlatformKey => "Encrypted MS PVK Private Key",
            Self::UnencryptedLegacyPlatformKey => "Unencrypted MS PVK Private Key",
            Self::EncryptedOpenSslKey => "Encrypted OpenSSL Private Key",
            Self::UnencryptedOpenSslKey => "Unencrypted OpenSSL Private Key",
            Self::OpenSslPublicKey => "OpenSSL Public Key",
            Self::SignedArchive => "JAR/ZIP Archive",
            Self::Unknown => "Unknown",
        }
    }

    pub fn category(&self) -> ArtifactCategory {
        match self {
            Self::JksKeystore
            | Self::JceksKeystore
            | Self::Pkcs12Keystore
            | Self::BksV1Keystore
            | Self::BksKeystore
            | Self::BcfksKeystore
            | Self::UberKeystore => ArtifactCategory::Keystore,
            Self::Certificate => ArtifactCategory::Certificate,
            Self::Pkcs10Csr | Self::SpkacCsr => ArtifactCategory::Request,
            Self::Crl => ArtifactCategory::RevocationList,
            Self::EncryptedPkcs8Key
            | Self::UnencryptedPkcs8Key
            | Self::EncryptedLegacyPlatformKey
            | Self::UnencryptedLegacyPlatformKey
            | Self::EncryptedOpenSslKey
            | Self::UnencryptedOpenSslKey => ArtifactCategory::PrivateKey,
            Self::OpenSslPublicKey => ArtifactCategory::PublicKey,
            Self::SignedArchive => ArtifactCategory::Archive,
            Self::Unknown => ArtifactCategory::Unknown,
        }
    }

    /// Keystore variant behind a keystore artifact
    pub fn keystore(&self) -> Option<KeyStoreVariant> {
        KeyStoreVariant::ALL
            .into_iter()
            .find(|variant| variant.artifact_type() == *self)
    }

    /// Private keys protected by a password
    pub fn is_encrypted(&self) -> bool {
        matches!(
            self,
            Self::EncryptedPkcs8Key | Self::EncryptedLegacyPlatformKey | Self::EncryptedOpenSslKey
        )
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.friendly_name())
    }
}

/// Keystore container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyStoreVariant {
    Jks,
    Jceks,
    Pkcs12,
    BksV1,
    Bks,
    Bcfks,
    Uber,
}

impl KeyStoreVariant {
    pub const ALL: [KeyStoreVariant; 7] = [
        Self::Jks,
        Self::Jceks,
        Self::Pkcs12,
        Self::BksV1,
        Self::Bks,
        Self::Bcfks,
        Self::Uber,
    ];

    /// Canonical format name as used by `KeyStore.getInstance`
    pub fn jce_name(&self) -> &'static str {
        match self {
            Self::Jks => "JKS",
            Self::Jceks => "JCEKS",
            Self::Pkcs12 => "PKCS12",
            Self::BksV1 => "BKS-V1",
            Self::Bks => "BKS",
            Self::Bcfks => "BCFKS",
            Self::Uber => "UBER",
        }
    }

    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            Self::Jks => ArtifactType::JksKeystore,
            Self::Jceks => ArtifactType::JceksKeystore,
            Self::Pkcs12 => ArtifactType::Pkcs12Keystore,
            Self::BksV1 => ArtifactType::BksV1Keystore,
            Self::Bks => ArtifactType::BksKeystore,
            Self::Bcfks => ArtifactType::BcfksKeystore,
            Self::Uber => ArtifactType::UberKeystore,
        }
    }

    /// Formats only the Bouncy Castle provider can open
    pub fn is_bouncy_castle(&self) -> bool {
        matches!(self, Self::BksV1 | Self::Bks | Self::Bcfks | Self::Uber)
    }

    /// Reverse lookup from the canonical name, case-insensitive
    pub fn resolve_jce(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.jce_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for KeyStoreVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.jce_name())
    }
}

/// Verdict of a private-key encoding probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionState {
    Encrypted,
    Unencrypted,
    NotThisFormat,
}

impl EncryptionState {
    /// Pick the artifact matching this state, `None` when not this format
    pub fn select(self, encrypted: ArtifactType, unencrypted: ArtifactType) -> Option<ArtifactType> {
        match self {
            Self::Encrypted => Some(encrypted),
            Self::Unencrypted => Some(unencrypted),
            Self::NotThisFormat => None,
        }
    }
}

/// Result of one classification with the probe's reasoning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationOutcome {
    pub artifact_type: ArtifactType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl ClassificationOutcome {
    pub fn new(artifact_type: ArtifactType, evidence: impl Into<String>) -> Self {
        Self {
            artifact_type,
            evidence: Some(evidence.into()),
        }
    }

    pub fn unknown() -> Self {
        Self {
            artifact_type: ArtifactType::Unknown,
            evidence: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keystore_round_trip() {
        for variant in KeyStoreVariant::ALL {
            assert_eq!(variant.artifact_type().keystore(), Some(variant));
            assert_eq!(KeyStoreVariant::resolve_jce(variant.jce_name()), Some(variant));
            assert_eq!(variant.artifact_type().category(), ArtifactCategory::Keystore);
        }
        assert_eq!(KeyStoreVariant::resolve_jce("pkcs12"), Some(KeyStoreVariant::Pkcs12));
        assert_eq!(KeyStoreVariant::resolve_jce("PKCS11"), None);
        assert_eq!(ArtifactType::Certificate.keystore(), None);
    }

    #[test]
    fn test_bouncy_castle_variants() {
        let bc: Vec<_> = KeyStoreVariant::ALL
            .into_iter()
            .filter(KeyStoreVariant::is_bouncy_castle)
            .collect();
        assert_eq!(
            bc,
            vec![
                KeyStoreVariant::BksV1,
                KeyStoreVariant::Bks,
                KeyStoreVariant::Bcfks,
                KeyStoreVariant::Uber
            ]
        );
    }

    #[test]
    fn test_encryption_state_select() {
        let pick = |state: EncryptionState| {
            state.select(ArtifactType::EncryptedPkcs8Key, ArtifactType::UnencryptedPkcs8Key)
        };
        assert_eq!(pick(EncryptionState::Encrypted), Some(ArtifactType::EncryptedPkcs8Key));
        assert_eq!(pick(EncryptionState::Unencrypted), Some(ArtifactType::UnencryptedPkcs8Key));
        assert_eq!(pick(EncryptionState::NotThisFormat), None);
    }

    #[test]
    fn test_every_type_has_a_name() {
        for artifact in ArtifactType::ALL {
            assert!(!artifact.friendly_name().is_empty());
        }
        assert_eq!(ArtifactType::ALL.iter().filter(|t| t.is_encrypted()).count(), 3);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&ClassificationOutcome::new(
            ArtifactType::BksV1Keystore,
            "marker",
        ))
        .unwrap();
        assert_eq!(json, r#"{"artifact_type":"bks_v1_keystore","evidence":"marker"}"#);

        let json = serde_json::to_string(&ClassificationOutcome::unknown()).unwrap();
        assert_eq!(json, r#"{"artifact_type":"unknown"}"#);
    }
}
