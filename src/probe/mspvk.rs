//! Microsoft PVK private key files.
//!
//! The header is six little-endian `u32` fields:
//! magic, reserved, key type, encrypted flag, salt length, key length.
//! Only the first four take part in detection.

use crate::error::{ProbeError, ProbeResult};
use crate::filetype::{ArtifactType, EncryptionState};
use crate::probe::{state_of, KeyVerdict, ProbeMatch};
use crate::source::ByteSource;

pub const PVK_MAGIC: u32 = 0xB0B5_F11E;

const RESERVED: u32 = 0;

const KEY_TYPE_EXCHANGE: u32 = 1;
const KEY_TYPE_SIGNATURE: u32 = 2;

const NOT_ENCRYPTED: u32 = 0;
const ENCRYPTED: u32 = 1;

pub fn encryption_state(bytes: &[u8]) -> EncryptionState {
    state_of(inspect(&ByteSource::new(bytes)))
}

pub fn probe(source: &ByteSource<'_>) -> ProbeResult<ProbeMatch> {
    inspect(source)?
        .into_match(
            ArtifactType::EncryptedLegacyPlatformKey,
            ArtifactType::UnencryptedLegacyPlatformKey,
        )
        .ok_or_else(|| ProbeError::mismatch("not a PVK key"))
}

fn inspect(source: &ByteSource<'_>) -> ProbeResult<KeyVerdict> {
    let mut reader = source.reader();

    let magic = reader.read_u32_le()?;
    if magic != PVK_MAGIC {
        return Err(ProbeError::mismatch(format!("magic 0x{magic:08x}")));
    }

    let reserved = reader.read_u32_le()?;
    if reserved != RESERVED {
        return Err(ProbeError::mismatch(format!("reserved field is {reserved}")));
    }

    let key_type = match reader.read_u32_le()? {
        KEY_TYPE_EXCHANGE => "key exchange",
        KEY_TYPE_SIGNATURE => "signature",
        other => return Err(ProbeError::mismatch(format!("key type {other}"))),
    };

    match reader.read_u32_le()? {
        NOT_ENCRYPTED => Ok(KeyVerdict::unencrypted(format!("PVK header, {key_type} key"))),
        ENCRYPTED => Ok(KeyVerdict::encrypted(format!(
            "PVK header, {key_type} key, password protected"
        ))),
        other => Err(ProbeError::mismatch(format!("encryption flag {other}"))),
    }
}
