//! PKCS #8 private keys, plain (`PrivateKeyInfo`) or password protected
//! (`EncryptedPrivateKeyInfo`).

use crate::asn1::{self, AsnValue};
use crate::error::{ProbeError, ProbeResult};
use crate::filetype::{ArtifactType, EncryptionState};
use crate::pem;
use crate::probe::{state_of, KeyVerdict, ProbeMatch};
use crate::source::ByteSource;

pub const PEM_LABEL: &str = "PRIVATE KEY";
pub const ENCRYPTED_PEM_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// `PrivateKeyInfo` version; `OneAsymmetricKey` (version 1) is not accepted
const PRIVATE_KEY_INFO_VERSION: i64 = 0;

/// Whether `bytes` is a PKCS #8 key and, if so, whether it is encrypted
pub fn encryption_state(bytes: &[u8]) -> EncryptionState {
    state_of(inspect(bytes))
}

pub fn probe(source: &ByteSource<'_>) -> ProbeResult<ProbeMatch> {
    inspect(source.as_bytes())?
        .into_match(
            ArtifactType::EncryptedPkcs8Key,
            ArtifactType::UnencryptedPkcs8Key,
        )
        .ok_or_else(|| ProbeError::mismatch("not PKCS #8"))
}

fn inspect(bytes: &[u8]) -> ProbeResult<KeyVerdict> {
    if pem::is_pem_format(bytes) {
        if let Some(block) = pem::decode(bytes) {
            match block.label.as_str() {
                ENCRYPTED_PEM_LABEL => {
                    return Ok(KeyVerdict::encrypted(format!("PEM label {ENCRYPTED_PEM_LABEL}")))
                }
                PEM_LABEL => return Ok(KeyVerdict::unencrypted(format!("PEM label {PEM_LABEL}"))),
                _ => {}
            }
        }
    }

    let value = asn1::parse(bytes)?;
    if !value.is_sequence() {
        return Err(ProbeError::mismatch(format!("outer value is {value}")));
    }

    match value.children() {
        // PrivateKeyInfo ::= SEQUENCE { version 0, privateKeyAlgorithm, privateKey,
        //                               attributes [0] OPTIONAL }
        [version, algorithm, key, ..]
            if value.children().len() <= 4
                && version.integer_equals(PRIVATE_KEY_INFO_VERSION)
                && is_algorithm_identifier(algorithm)
                && key.is_octet_string() =>
        {
            Ok(KeyVerdict::unencrypted(format!(
                "PrivateKeyInfo with {}",
                asn1::describe_algorithm(&algorithm.children()[0])
            )))
        }
        // EncryptedPrivateKeyInfo ::= SEQUENCE { encryptionAlgorithm, encryptedData }
        [algorithm, data] if is_algorithm_identifier(algorithm) && data.is_octet_string() => {
            Ok(KeyVerdict::encrypted(format!(
                "EncryptedPrivateKeyInfo with {}",
                asn1::describe_algorithm(&algorithm.children()[0])
            )))
        }
        items => Err(ProbeError::mismatch(format!(
            "SEQUENCE of {} is neither PrivateKeyInfo nor EncryptedPrivateKeyInfo",
            items.len()
        ))),
    }
}

/// `AlgorithmIdentifier ::= SEQUENCE { algorithm OID, parameters ANY OPTIONAL }`
pub(crate) fn is_algorithm_identifier(value: &AsnValue<'_>) -> bool {
    value.is_sequence()
        && (1..=2).contains(&value.children().len())
        && value.children()[0].is_oid()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_OID: [u8; 11] = [
        0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01,
    ];

    fn seq(parts: &[&[u8]]) -> Vec<u8> {
        let content = parts.concat();
        let mut out = vec![0x30, content.len() as u8];
        out.extend(content);
        out
    }

    fn algorithm() -> Vec<u8> {
        seq(&[&RSA_OID, &[0x05, 0x00]])
    }

    #[test]
    fn test_pem_labels() {
        let plain = pem::PemBlock::new(PEM_LABEL, vec![1, 2, 3]).encode();
        assert_eq!(encryption_state(plain.as_bytes()), EncryptionState::Unencrypted);

        let encrypted = pem::PemBlock::new(ENCRYPTED_PEM_LABEL, vec![1, 2, 3]).encode();
        assert_eq!(encryption_state(encrypted.as_bytes()), EncryptionState::Encrypted);

        let other = pem::PemBlock::new("RSA PRIVATE KEY", vec![1, 2, 3]).encode();
        assert_eq!(encryption_state(other.as_bytes()), EncryptionState::NotThisFormat);
    }

    #[test]
    fn test_private_key_info() {
        let der = seq(&[&[0x02, 0x01, 0x00], &algorithm(), &[0x04, 0x02, 0xAA, 0xBB]]);
        assert_eq!(encryption_state(&der), EncryptionState::Unencrypted);

        let found = probe(&ByteSource::new(&der)).unwrap();
        assert_eq!(found.artifact_type, ArtifactType::UnencryptedPkcs8Key);
        assert!(found.evidence.contains("rsaEncryption"));

        // Version 2 is not a PrivateKeyInfo
        let v2 = seq(&[&[0x02, 0x01, 0x02], &algorithm(), &[0x04, 0x02, 0xAA, 0xBB]]);
        assert_eq!(encryption_state(&v2), EncryptionState::NotThisFormat);
    }

    #[test]
    fn test_one_asymmetric_key_is_not_accepted() {
        // SEQUENCE { INTEGER 1, AlgorithmIdentifier, OCTET STRING, [1] publicKey }
        let v1 = seq(&[
            &[0x02, 0x01, 0x01],
            &algorithm(),
            &[0x04, 0x02, 0xAA, 0xBB],
            &[0x81, 0x02, 0x00, 0x01],
        ]);
        assert_eq!(encryption_state(&v1), EncryptionState::NotThisFormat);
        assert!(probe(&ByteSource::new(&v1)).is_err());

        // The PEM label alone still decides for armoured keys
        let armoured = pem::PemBlock::new(PEM_LABEL, v1).encode();
        assert_eq!(encryption_state(armoured.as_bytes()), EncryptionState::Unencrypted);
    }

    #[test]
    fn test_encrypted_private_key_info() {
        let der = seq(&[&algorithm(), &[0x04, 0x03, 1, 2, 3]]);
        assert_eq!(encryption_state(&der), EncryptionState::Encrypted);

        // Algorithm identifier must open with an OID
        let bad = seq(&[&seq(&[&[0x02, 0x01, 0x00]]), &[0x04, 0x03, 1, 2, 3]]);
        assert_eq!(encryption_state(&bad), EncryptionState::NotThisFormat);
    }

    #[test]
    fn test_sec1_key_is_not_pkcs8() {
        // SEQUENCE { INTEGER 1, OCTET STRING, [0] { OID } }
        let sec1 = seq(&[
            &[0x02, 0x01, 0x01],
            &[0x04, 0x02, 0x01, 0x02],
            &[0xA0, 0x05, 0x06, 0x03, 0x2B, 0x65, 0x70],
        ]);
        assert_eq!(encryption_state(&sec1), EncryptionState::NotThisFormat);
    }

    #[test]
    fn test_garbage() {
        assert_eq!(encryption_state(b""), EncryptionState::NotThisFormat);
        assert_eq!(encryption_state(b"not a key"), EncryptionState::NotThisFormat);
    }
}
