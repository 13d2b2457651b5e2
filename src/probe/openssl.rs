//! OpenSSL "traditional" private keys: PKCS #1 RSA, DSA and SEC1 EC, either
//! PEM armoured (optionally with RFC 1421 encryption headers) or raw DER.

use crate::asn1;
use crate::error::{ProbeError, ProbeResult};
use crate::filetype::{ArtifactType, EncryptionState};
use crate::pem;
use crate::probe::{state_of, KeyVerdict, ProbeMatch};
use crate::source::ByteSource;

pub const RSA_PEM_LABEL: &str = "RSA PRIVATE KEY";
pub const DSA_PEM_LABEL: &str = "DSA PRIVATE KEY";
pub const EC_PEM_LABEL: &str = "EC PRIVATE KEY";

const PEM_LABELS: [&str; 3] = [RSA_PEM_LABEL, DSA_PEM_LABEL, EC_PEM_LABEL];

const PROC_TYPE_ATTR: &str = "Proc-Type";
const PROC_TYPE_ENCRYPTED: &str = "4,ENCRYPTED";
const DEK_INFO_ATTR: &str = "DEK-Info";

/// `ECPrivateKey` version
const EC_VERSION: i64 = 1;

/// Element counts of the all-INTEGER `RSAPrivateKey` and DSA key sequences
const RSA_FIELDS: usize = 9;
const DSA_FIELDS: usize = 6;

pub fn encryption_state(bytes: &[u8]) -> EncryptionState {
    state_of(inspect(bytes))
}

pub fn probe(source: &ByteSource<'_>) -> ProbeResult<ProbeMatch> {
    inspect(source.as_bytes())?
        .into_match(
            ArtifactType::EncryptedOpenSslKey,
            ArtifactType::UnencryptedOpenSslKey,
        )
        .ok_or_else(|| ProbeError::mismatch("not an OpenSSL private key"))
}

fn inspect(bytes: &[u8]) -> ProbeResult<KeyVerdict> {
    if let Some(block) = pem::decode(bytes) {
        if PEM_LABELS.contains(&block.label.as_str()) {
            let proc_type = block.attributes.get(PROC_TYPE_ATTR);
            let dek_info = block.attributes.get(DEK_INFO_ATTR);

            return Ok(match (proc_type, dek_info) {
                (Some(PROC_TYPE_ENCRYPTED), Some(dek)) => {
                    let cipher = dek.split(',').next().unwrap_or(dek);
                    KeyVerdict::encrypted(format!("PEM label {}, DEK-Info {cipher}", block.label))
                }
                _ => KeyVerdict::unencrypted(format!("PEM label {}", block.label)),
            });
        }
    }

    let value = asn1::parse(bytes)?;
    if !value.is_sequence() {
        return Err(ProbeError::mismatch(format!("outer value is {value}")));
    }

    let items = value.children();

    // ECPrivateKey ::= SEQUENCE { version 1, privateKey OCTET STRING,
    //                             parameters [0] OPTIONAL, publicKey [1] OPTIONAL }
    if (2..=4).contains(&items.len()) && items[0].integer_equals(EC_VERSION) {
        if items[1].is_octet_string() {
            return Ok(KeyVerdict::unencrypted("DER ECPrivateKey"));
        }
        return Err(ProbeError::mismatch("version 1 SEQUENCE without a private key OCTET STRING"));
    }

    if !items.iter().all(|item| item.is_integer()) {
        return Err(ProbeError::mismatch("SEQUENCE holds non-INTEGER elements"));
    }

    match items.len() {
        RSA_FIELDS => Ok(KeyVerdict::unencrypted("DER RSAPrivateKey")),
        DSA_FIELDS => Ok(KeyVerdict::unencrypted("DER DSA private key")),
        n => Err(ProbeError::mismatch(format!("SEQUENCE of {n} INTEGERs"))),
    }
}
