//! Keystore container detection.
//!
//! JKS and JCEKS carry a magic number. BKS and UBER share a plain version
//! number and are told apart by [`bks_end_marker`]. PKCS #12 and BCFKS are
//! both DER and are recognised by the shape of their outer SEQUENCE.

use crate::asn1;
use crate::error::{ProbeError, ProbeResult};
use crate::filetype::KeyStoreVariant;
use crate::probe::ProbeMatch;
use crate::source::ByteSource;

pub const JKS_MAGIC: u32 = 0xFEED_FEED;
pub const JCEKS_MAGIC: u32 = 0xCECE_CECE;

/// PFX version field of a PKCS #12 file
const PFX_VERSION: i64 = 3;

/// Version numbers written by the Bouncy Castle BKS/UBER stores
const BKS_VERSION_1: u32 = 1;
const BKS_VERSIONS: [u32; 3] = [0, BKS_VERSION_1, 2];

/// Smallest BKS/UBER file: version, salt length, iteration count, end marker,
/// 20 byte MAC
const BKS_MIN_LENGTH: usize = 26;

/// Distance of the BKS end-of-store marker from the end of the file
const BKS_MARKER_FROM_END: usize = 21;

/// Keystore format of `bytes`, if any
pub fn detect(bytes: &[u8]) -> Option<KeyStoreVariant> {
    inspect(&ByteSource::new(bytes))
        .ok()
        .map(|(variant, _)| variant)
}

pub fn probe(source: &ByteSource<'_>) -> ProbeResult<ProbeMatch> {
    let (variant, evidence) = inspect(source)?;
    Ok(ProbeMatch::new(variant.artifact_type(), evidence))
}

fn inspect(source: &ByteSource<'_>) -> ProbeResult<(KeyStoreVariant, String)> {
    let magic = source
        .reader()
        .read_u32_be()
        .map_err(|_| ProbeError::mismatch("fewer than 4 bytes"))?;

    match magic {
        JKS_MAGIC => Ok((KeyStoreVariant::Jks, magic_evidence(source))),
        JCEKS_MAGIC => Ok((KeyStoreVariant::Jceks, magic_evidence(source))),
        version if BKS_VERSIONS.contains(&version) => bks_family(source, version),
        _ => pfx_shape(source.as_bytes()),
    }
}

fn magic_evidence(source: &ByteSource<'_>) -> String {
    format!("magic number {}", hex::encode(&source.as_bytes()[..4]))
}

/// BKS and UBER both start with the store version. BKS writes its entries in
/// clear and finishes with a zero end-of-store tag followed by a 20 byte
/// HMAC-SHA1, so the byte at `len - 21` is zero. UBER encrypts everything
/// after the header, which makes that byte zero only about once in 256.
///
/// Callers must have checked `bytes.len() >= BKS_MIN_LENGTH`.
pub fn bks_end_marker(source: &ByteSource<'_>) -> ProbeResult<u8> {
    let offset = source
        .len()
        .checked_sub(BKS_MARKER_FROM_END)
        .ok_or_else(|| ProbeError::mismatch("too short for a BKS end marker"))?;
    Ok(source.byte_at(offset)?)
}

fn bks_family(source: &ByteSource<'_>, version: u32) -> ProbeResult<(KeyStoreVariant, String)> {
    if source.len() < BKS_MIN_LENGTH {
        return Err(ProbeError::mismatch(format!(
            "version {version} store of {} bytes is below the {BKS_MIN_LENGTH} byte minimum",
            source.len()
        )));
    }

    let marker = bks_end_marker(source)?;
    let variant = match (marker, version) {
        (0, BKS_VERSION_1) => KeyStoreVariant::BksV1,
        (0, _) => KeyStoreVariant::Bks,
        _ => KeyStoreVariant::Uber,
    };

    Ok((
        variant,
        format!("store version {version}, byte 0x{marker:02x} at offset len-{BKS_MARKER_FROM_END}"),
    ))
}

/// PKCS #12 PFX: `SEQUENCE { INTEGER 3, authSafe, macData OPTIONAL }`.
/// BCFKS: `SEQUENCE { storeData SEQUENCE, integrityCheck }`.
fn pfx_shape(bytes: &[u8]) -> ProbeResult<(KeyStoreVariant, String)> {
    let value = asn1::parse(bytes)?;
    if !value.is_sequence() {
        return Err(ProbeError::mismatch(format!("outer value is {value}")));
    }

    let items = value.children();
    if !(2..=3).contains(&items.len()) {
        return Err(ProbeError::mismatch(format!(
            "outer SEQUENCE has {} elements",
            items.len()
        )));
    }

    let first = &items[0];
    if first.is_integer() {
        return match first.as_i64() {
            Some(PFX_VERSION) => Ok((
                KeyStoreVariant::Pkcs12,
                format!("PFX SEQUENCE of {} with version 3", items.len()),
            )),
            other => Err(ProbeError::mismatch(format!(
                "PFX version {other:?} is not 3"
            ))),
        };
    }

    if first.is_sequence() {
        return Ok((
            KeyStoreVariant::Bcfks,
            format!("SEQUENCE of {} opening with store data SEQUENCE", items.len()),
        ));
    }

    Err(ProbeError::mismatch(format!("outer SEQUENCE opens with {first}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bks_like(version: u32, marker: u8) -> Vec<u8> {
        let mut data = version.to_be_bytes().to_vec();
        data.extend_from_slice(&[0xAB; 40]);
        let len = data.len();
        data[len - BKS_MARKER_FROM_END] = marker;
        data
    }

    #[test]
    fn test_magic_numbers() {
        assert_eq!(detect(&[0xFE, 0xED, 0xFE, 0xED, 0, 0, 0, 2]), Some(KeyStoreVariant::Jks));
        assert_eq!(detect(&[0xCE, 0xCE, 0xCE, 0xCE, 0, 0, 0, 2]), Some(KeyStoreVariant::Jceks));
        assert_eq!(detect(&[0xFE, 0xED, 0xFE]), None);
        assert_eq!(detect(&[]), None);
    }

    #[test]
    fn test_bks_versus_uber() {
        assert_eq!(detect(&bks_like(2, 0x00)), Some(KeyStoreVariant::Bks));
        assert_eq!(detect(&bks_like(0, 0x00)), Some(KeyStoreVariant::Bks));
        assert_eq!(detect(&bks_like(1, 0x00)), Some(KeyStoreVariant::BksV1));
        assert_eq!(detect(&bks_like(2, 0x5C)), Some(KeyStoreVariant::Uber));
        assert_eq!(detect(&bks_like(1, 0x01)), Some(KeyStoreVariant::Uber));
    }

    #[test]
    fn test_bks_minimum_length() {
        let mut short = vec![0, 0, 0, 2];
        short.extend_from_slice(&[0u8; BKS_MIN_LENGTH - 5]);
        assert_eq!(detect(&short), None);

        let mut exact = vec![0, 0, 0, 2];
        exact.extend_from_slice(&[0u8; BKS_MIN_LENGTH - 4]);
        assert_eq!(detect(&exact), Some(KeyStoreVariant::Bks));
    }

    #[test]
    fn test_pfx_version() {
        // SEQUENCE { INTEGER 3, OCTET STRING, NULL }
        let pfx = [0x30, 0x08, 0x02, 0x01, 0x03, 0x04, 0x01, 0xAA, 0x05, 0x00];
        assert_eq!(detect(&pfx), Some(KeyStoreVariant::Pkcs12));

        let mut wrong = pfx;
        wrong[4] = 0x02;
        assert_eq!(detect(&wrong), None);

        // Trailing byte after an otherwise valid PFX
        let mut trailing = pfx.to_vec();
        trailing.push(0x00);
        assert_eq!(detect(&trailing), None);
    }

    #[test]
    fn test_bcfks_shape() {
        // SEQUENCE { SEQUENCE { INTEGER 0 }, OCTET STRING }
        let bcfks = [0x30, 0x08, 0x30, 0x03, 0x02, 0x01, 0x00, 0x04, 0x01, 0xAA];
        assert_eq!(detect(&bcfks), Some(KeyStoreVariant::Bcfks));

        // Four elements is neither PFX nor BCFKS
        let four = [
            0x30, 0x0B, 0x02, 0x01, 0x03, 0x04, 0x01, 0xAA, 0x05, 0x00, 0x04, 0x01, 0xBB,
        ];
        assert_eq!(detect(&four[..]), None);
    }

    #[test]
    fn test_evidence_mentions_marker() {
        let found = probe(&ByteSource::new(&bks_like(2, 0x00))).unwrap();
        assert!(found.evidence.contains("store version 2"));
        assert!(found.evidence.contains("0x00"));
    }
}
