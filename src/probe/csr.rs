//! Certificate signing requests: PKCS #10 (PEM or DER) and Netscape SPKAC.
//!
//! SPKAC requests are text files of `name=value` lines as produced for
//! `openssl ca -spkac`:
//!
//! ```text
//! SPKAC=MIIBQDCBqjCBnzANBgkqhkiG9w0BAQEFAAOBjQAwgYkCgYEA...
//! CN=Example Subject
//! O=Example
//! ```

use std::borrow::Cow;
use std::collections::HashMap;

use base64::Engine;
use thiserror::Error;
use x509_parser::prelude::*;

use crate::asn1;
use crate::error::{ProbeError, ProbeResult};
use crate::filetype::ArtifactType;
use crate::pem;
use crate::probe::ProbeMatch;
use crate::source::ByteSource;

const PKCS10_PEM_LABELS: [&str; 2] = ["CERTIFICATE REQUEST", "NEW CERTIFICATE REQUEST"];

pub const SPKAC_PROPERTY: &str = "SPKAC";

/// Distinguished name properties, in the order they are rendered
pub const SUBJECT_PROPERTIES: [&str; 6] = ["CN", "OU", "O", "L", "ST", "C"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpkacError {
    #[error("SPKAC is missing the required {0} property")]
    MissingProperty(String),

    #[error("malformed SPKAC: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkcs10Summary {
    pub subject: String,
}

/// A parsed SPKAC request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpkacRequest {
    /// Subject rendered as `CN=..,OU=..,...` in fixed order
    pub subject: String,
    /// Decoded `SignedPublicKeyAndChallenge`
    pub der: Vec<u8>,
    /// Challenge string, when the DER is well formed enough to hold one
    pub challenge: Option<String>,
}

/// Fully parse a PKCS #10 request. PEM input must carry a request label.
pub fn load_pkcs10(bytes: &[u8]) -> ProbeResult<Pkcs10Summary> {
    let der: Cow<'_, [u8]> = match pem::decode(bytes) {
        Some(block) if PKCS10_PEM_LABELS.contains(&block.label.as_str()) => {
            Cow::Owned(block.payload)
        }
        Some(block) => {
            return Err(ProbeError::mismatch(format!(
                "PEM label {} is not a certificate request",
                block.label
            )))
        }
        None => Cow::Borrowed(bytes),
    };

    let (rest, csr) = X509CertificationRequest::from_der(&der)
        .map_err(|e| ProbeError::mismatch(format!("CertificationRequest: {e:?}")))?;
    if !rest.is_empty() {
        return Err(ProbeError::mismatch(format!(
            "{} bytes after CertificationRequest",
            rest.len()
        )));
    }

    Ok(Pkcs10Summary {
        subject: csr.certification_request_info.subject.to_string(),
    })
}

/// Parse SPKAC property text
pub fn parse_spkac(bytes: &[u8]) -> Result<SpkacRequest, SpkacError> {
    let properties = read_properties(&String::from_utf8_lossy(bytes));

    let encoded = properties
        .get(SPKAC_PROPERTY)
        .ok_or_else(|| SpkacError::MissingProperty(SPKAC_PROPERTY.to_string()))?;

    let subject = SUBJECT_PROPERTIES
        .iter()
        .filter_map(|name| properties.get(*name).map(|value| format!("{name}={value}")))
        .collect::<Vec<_>>()
        .join(",");
    if subject.is_empty() {
        return Err(SpkacError::MissingProperty("subject".to_string()));
    }

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let der = pem::LENIENT_BASE64
        .decode(compact)
        .map_err(|e| SpkacError::Malformed(format!("SPKAC value is not Base64: {e}")))?;
    if der.is_empty() {
        return Err(SpkacError::Malformed("empty SPKAC value".to_string()));
    }

    let challenge = read_challenge(&der);
    Ok(SpkacRequest {
        subject,
        der,
        challenge,
    })
}

pub fn probe(source: &ByteSource<'_>) -> ProbeResult<ProbeMatch> {
    let pkcs10_reason = match load_pkcs10(source.as_bytes()) {
        Ok(summary) => {
            return Ok(ProbeMatch::new(
                ArtifactType::Pkcs10Csr,
                format!("PKCS #10 request for {}", summary.subject),
            ))
        }
        Err(e) => e,
    };

    match parse_spkac(source.as_bytes()) {
        Ok(request) => Ok(ProbeMatch::new(
            ArtifactType::SpkacCsr,
            format!("SPKAC request for {}", request.subject),
        )),
        Err(spkac_reason) => Err(ProbeError::mismatch(format!(
            "{pkcs10_reason}; {spkac_reason}"
        ))),
    }
}

/// `name=value` per line. A line lacking a name or a value (no `=`, `=x`,
/// `name=`) is appended verbatim to the previous property's value.
/// `\r`, `\n` and `\r\n` all end a line.
fn read_properties(text: &str) -> HashMap<String, String> {
    let mut properties = HashMap::new();
    let mut last: Option<String> = None;

    for line in text.split(['\r', '\n']).map(str::trim) {
        match line.split_once('=') {
            Some((name, value)) if !name.is_empty() && !value.is_empty() => {
                properties.insert(name.to_string(), value.to_string());
                last = Some(name.to_string());
            }
            _ => {
                if let Some(value) = last.as_ref().and_then(|name| properties.get_mut(name)) {
                    value.push_str(line);
                }
            }
        }
    }

    properties
}

/// `SignedPublicKeyAndChallenge ::= SEQUENCE { publicKeyAndChallenge
/// SEQUENCE { spki, challenge IA5String }, signatureAlgorithm, signature }`
fn read_challenge(der: &[u8]) -> Option<String> {
    let value = asn1::parse(der).ok()?;
    let key_and_challenge = value.children().first().filter(|v| v.is_sequence())?;
    key_and_challenge.children().get(1)?.as_ia5()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_spkac() {
        let request = parse_spkac(b"SPKAC=AAAA\nCN=Test,O=Org,C=US").unwrap();
        assert_eq!(request.subject, "CN=Test,O=Org,C=US");
        assert_eq!(request.der, vec![0, 0, 0]);
        assert_eq!(request.challenge, None);
    }

    #[test]
    fn test_subject_order_and_continuation() {
        let text = "C=GB\nSPKAC=AAAA\n  AAAA\nO=Example\nCN=Someone\n";
        let request = parse_spkac(text.as_bytes()).unwrap();
        assert_eq!(request.subject, "CN=Someone,O=Example,C=GB");
        assert_eq!(request.der.len(), 6);
    }

    #[test]
    fn test_incomplete_lines_join_previous_value() {
        let request = parse_spkac(b"SPKAC=AAAA\nCN=Test\nO=\n").unwrap();
        assert_eq!(request.subject, "CN=TestO=");

        // Lines before any property are dropped
        let request = parse_spkac(b"preamble\n=orphan\nSPKAC=AAAA\nCN=Test").unwrap();
        assert_eq!(request.subject, "CN=Test");
        assert_eq!(request.der, vec![0, 0, 0]);

        // A stray line after SPKAC lands in the Base64 value
        let err = parse_spkac(b"SPKAC=AAAA\nstray!\nCN=Test").unwrap_err();
        assert!(matches!(err, SpkacError::Malformed(_)));
    }

    #[test]
    fn test_carriage_return_line_endings() {
        let request = parse_spkac(b"SPKAC=AAAA\r\n AAAA\rCN=Test\r\n").unwrap();
        assert_eq!(request.subject, "CN=Test");
        assert_eq!(request.der.len(), 6);
    }

    #[test]
    fn test_missing_properties() {
        assert_eq!(
            parse_spkac(b"CN=Test").unwrap_err(),
            SpkacError::MissingProperty("SPKAC".to_string())
        );
        assert_eq!(
            parse_spkac(b"SPKAC=AAAA\nemail=a@example.com").unwrap_err(),
            SpkacError::MissingProperty("subject".to_string())
        );
    }

    #[test]
    fn test_malformed_value() {
        let err = parse_spkac(b"SPKAC=!!!!\nCN=Test").unwrap_err();
        assert!(matches!(err, SpkacError::Malformed(_)));
    }

    #[test]
    fn test_challenge_extraction() {
        // SEQUENCE { SEQUENCE { SEQUENCE {}, IA5String "hi" }, SEQUENCE {}, BIT STRING }
        let der = [
            0x30, 0x0D, 0x30, 0x06, 0x30, 0x00, 0x16, 0x02, b'h', b'i', 0x30, 0x00, 0x03, 0x01,
            0x00,
        ];
        assert_eq!(read_challenge(&der), Some("hi".to_string()));
    }

    #[test]
    fn test_pkcs10_rejects_other_pem() {
        let text = pem::PemBlock::new("CERTIFICATE", vec![0x30, 0x00]).encode();
        assert!(load_pkcs10(text.as_bytes()).is_err());
        assert!(load_pkcs10(b"").is_err());
    }

    #[test]
    fn test_probe_prefers_pkcs10_then_spkac() {
        let spkac = b"SPKAC=AAAA\nCN=Test";
        let found = probe(&ByteSource::new(spkac)).unwrap();
        assert_eq!(found.artifact_type, ArtifactType::SpkacCsr);

        let err = probe(&ByteSource::new(b"plain text")).unwrap_err();
        assert!(err.to_string().contains("SPKAC"));
    }
}
