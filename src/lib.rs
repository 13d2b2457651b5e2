//! Keysniff Library
//!
//! Offline format detection for cryptographic files. Given nothing but the
//! bytes, works out which of a fixed set of artifact types they hold:
//! keystores, certificates, certificate requests, CRLs, private keys in
//! PKCS #8, PVK or OpenSSL encodings, public keys, and JAR archives.
//!
//! # Features
//!
//! - **Ordered Cascade**: Probes run in a fixed precedence order, first match wins
//! - **Never Fails on Bad Input**: Malformed, truncated or hostile bytes come back as `Unknown`
//! - **Bounded Parsing**: The ASN.1 reader refuses lengths past the buffer and deep nesting
//! - **Stateless**: Classify any number of buffers concurrently
//!
//! # Example
//!
//! ```
//! use keysniff::{classify, ArtifactType};
//!
//! let jks = [0xFE, 0xED, 0xFE, 0xED, 0x00, 0x00, 0x00, 0x02];
//! assert_eq!(classify(&jks), ArtifactType::JksKeystore);
//!
//! let spkac = b"SPKAC=AAAA\nCN=Test,O=Org,C=US";
//! assert_eq!(classify(spkac), ArtifactType::SpkacCsr);
//! ```

pub mod asn1;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod filetype;
pub mod pem;
pub mod probe;
pub mod source;

// Re-export commonly used types
pub use classifier::{classify, detect_keystore_type, examine, FormatClassifier};
pub use config::Config;
pub use error::{DetectError, ProbeError, SourceError};
pub use filetype::{
    ArtifactCategory, ArtifactType, ClassificationOutcome, EncryptionState, KeyStoreVariant,
};
pub use pem::{PemAttributes, PemBlock};
pub use source::ByteSource;
