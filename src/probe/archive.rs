//! JAR and ZIP archives, recognised by their leading record signature.

use crate::error::{ProbeError, ProbeResult};
use crate::filetype::ArtifactType;
use crate::probe::ProbeMatch;
use crate::source::ByteSource;

/// Local file header, empty archive, spanned archive, and lzip
const ARCHIVE_MAGIC_NUMBERS: [u32; 4] = [0x504B_0304, 0x504B_0506, 0x504B_0708, 0x4C5A_4950];

const MANIFEST_ENTRY: &[u8] = b"META-INF/MANIFEST.MF";

pub fn probe(source: &ByteSource<'_>) -> ProbeResult<ProbeMatch> {
    let magic = source.reader().read_u32_be()?;
    if !ARCHIVE_MAGIC_NUMBERS.contains(&magic) {
        return Err(ProbeError::mismatch(format!("magic 0x{magic:08x}")));
    }

    let signature = hex::encode(&source.as_bytes()[..4]);
    let evidence = if has_manifest(source.as_bytes()) {
        format!("archive signature {signature} with {}", String::from_utf8_lossy(MANIFEST_ENTRY))
    } else {
        format!("archive signature {signature}")
    };

    Ok(ProbeMatch::new(ArtifactType::SignedArchive, evidence))
}

fn has_manifest(data: &[u8]) -> bool {
    data.windows(MANIFEST_ENTRY.len())
        .any(|window| window == MANIFEST_ENTRY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_signatures() {
        for magic in ARCHIVE_MAGIC_NUMBERS {
            let data = magic.to_be_bytes();
            let found = probe(&ByteSource::new(&data)).unwrap();
            assert_eq!(found.artifact_type, ArtifactType::SignedArchive);
        }
        assert!(probe(&ByteSource::new(b"PK\x03")).is_err());
        assert!(probe(&ByteSource::new(b"PK\x01\x02")).is_err());
    }

    #[test]
    fn test_manifest_noted() {
        let mut data = b"PK\x03\x04".to_vec();
        data.extend_from_slice(b"....META-INF/MANIFEST.MF....");
        let found = probe(&ByteSource::new(&data)).unwrap();
        assert!(found.evidence.ends_with("META-INF/MANIFEST.MF"));
    }
}
