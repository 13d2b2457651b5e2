//! X.509 certificates and certificate revocation lists.
//!
//! Certificates arrive in many wrappings: PEM (plain, OpenSSL trusted, or a
//! PKCS #7 bundle), unarmoured Base64, concatenated DER, a DER PKCS #7
//! `SignedData`, or a PkiPath `SEQUENCE OF Certificate`. All of them count
//! as long as at least one certificate parses.

use std::borrow::Cow;

use base64::Engine;
use x509_parser::oid_registry::OID_PKCS7_ID_SIGNED_DATA;
use x509_parser::prelude::*;

use crate::asn1::{self, AsnValue};
use crate::error::{ProbeError, ProbeResult};
use crate::filetype::ArtifactType;
use crate::pem;
use crate::probe::ProbeMatch;
use crate::source::ByteSource;

const CERTIFICATE_PEM_LABELS: [&str; 2] = ["CERTIFICATE", "X509 CERTIFICATE"];
const TRUSTED_CERTIFICATE_PEM_LABEL: &str = "TRUSTED CERTIFICATE";
const PKCS7_PEM_LABELS: [&str; 2] = ["PKCS7", "CMS"];
const CRL_PEM_LABEL: &str = "X509 CRL";


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
}

impl CertificateSummary {
    fn of(cert: &X509Certificate<'_>) -> Self {
        Self {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlSummary {
    pub issuer: String,
    pub revoked: usize,
}

/// Every certificate `bytes` carries, in any supported wrapping
pub fn load_certificates(bytes: &[u8]) -> ProbeResult<Vec<CertificateSummary>> {
    let from_pem = certificates_from_pem(bytes);
    if !from_pem.is_empty() {
        return Ok(from_pem);
    }

    if let Some(decoded) = unarmoured_base64(bytes) {
        if let Ok(certs) = certificates_from_der(&decoded) {
            return Ok(certs);
        }
    }

    certificates_from_der(bytes)
}

/// Parse one CRL, PEM or DER
pub fn load_crl(bytes: &[u8]) -> ProbeResult<CrlSummary> {
    if bytes.is_empty() {
        return Err(ProbeError::mismatch("no CRL data"));
    }

    let der: Cow<'_, [u8]> = match pem::decode(bytes) {
        Some(block) if block.label == CRL_PEM_LABEL => Cow::Owned(block.payload),
        Some(block) => {
            return Err(ProbeError::mismatch(format!(
                "PEM label {} is not {CRL_PEM_LABEL}",
                block.label
            )))
        }
        None => Cow::Borrowed(bytes),
    };

    let (rest, crl) = CertificateRevocationList::from_der(&der)
        .map_err(|e| ProbeError::mismatch(format!("CertificateList: {e:?}")))?;
    if !rest.is_empty() {
        return Err(ProbeError::mismatch(format!(
            "{} bytes after CertificateList",
            rest.len()
        )));
    }

    Ok(CrlSummary {
        issuer: crl.issuer().to_string(),
        revoked: crl.iter_revoked_certificates().count(),
    })
}

pub fn certificate_probe(source: &ByteSource<'_>) -> ProbeResult<ProbeMatch> {
    let certs = load_certificates(source.as_bytes())?;
    let evidence = match certs.as_slice() {
        [only] => format!("certificate for {}", only.subject),
        [first, ..] => format!("{} certificates, first for {}", certs.len(), first.subject),
        [] => return Err(ProbeError::mismatch("no certificates")),
    };
    Ok(ProbeMatch::new(ArtifactType::Certificate, evidence))
}

pub fn crl_probe(source: &ByteSource<'_>) -> ProbeResult<ProbeMatch> {
    let crl = load_crl(source.as_bytes())?;
    Ok(ProbeMatch::new(
        ArtifactType::Crl,
        format!("CRL from {} with {} revoked entries", crl.issuer, crl.revoked),
    ))
}

fn certificates_from_pem(bytes: &[u8]) -> Vec<CertificateSummary> {
    let mut certs = Vec::new();

    for block in pem::decode_all(bytes) {
        let label = block.label.as_str();
        if CERTIFICATE_PEM_LABELS.contains(&label) {
            if let Ok((_, cert)) = X509Certificate::from_der(&block.payload) {
                certs.push(CertificateSummary::of(&cert));
            }
        } else if label == TRUSTED_CERTIFICATE_PEM_LABEL {
            // Certificate followed by OpenSSL's trust settings
            if let Ok((_, cert)) = X509Certificate::from_der(&block.payload) {
                certs.push(CertificateSummary::of(&cert));
            }
        } else if PKCS7_PEM_LABELS.contains(&label) {
            if let Ok(mut bundle) = certificates_from_der(&block.payload) {
                certs.append(&mut bundle);
            }
        }
    }

    certs
}

/// Base64 text with no armour, line breaks allowed
fn unarmoured_base64(bytes: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(bytes).ok()?;
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    pem::LENIENT_BASE64.decode(compact).ok()
}

fn certificates_from_der(bytes: &[u8]) -> ProbeResult<Vec<CertificateSummary>> {
    if let Some(certs) = concatenated_certificates(bytes) {
        return Ok(certs);
    }

    let value = asn1::parse(bytes)?;
    if is_signed_data(&value) {
        return certificates_from_signed_data(&value);
    }
    certificates_from_pki_path(&value)
}

fn concatenated_certificates(bytes: &[u8]) -> Option<Vec<CertificateSummary>> {
    let mut certs = Vec::new();
    let mut rest = bytes;

    while !rest.is_empty() {
        let (remaining, cert) = X509Certificate::from_der(rest).ok()?;
        certs.push(CertificateSummary::of(&cert));
        rest = remaining;
    }

    (!certs.is_empty()).then_some(certs)
}

/// `ContentInfo ::= SEQUENCE { contentType signedData, content [0] EXPLICIT ANY }`
fn is_signed_data(value: &AsnValue<'_>) -> bool {
    value.is_sequence()
        && value
            .children()
            .first()
            .is_some_and(|oid| oid.oid_is(&OID_PKCS7_ID_SIGNED_DATA))
}

fn certificates_from_signed_data(content_info: &AsnValue<'_>) -> ProbeResult<Vec<CertificateSummary>> {
    let signed_data = content_info
        .children()
        .get(1)
        .filter(|content| content.is_context(0))
        .and_then(|content| content.children().first())
        .filter(|signed_data| signed_data.is_sequence())
        .ok_or_else(|| ProbeError::mismatch("PKCS #7 content is not SignedData"))?;

    // SignedData ::= SEQUENCE { version, digestAlgorithms, encapContentInfo,
    //                           certificates [0] IMPLICIT OPTIONAL, ... }
    let certificate_set = signed_data
        .children()
        .iter()
        .skip(3)
        .find(|item| item.is_context(0) && item.is_constructed())
        .ok_or_else(|| ProbeError::mismatch("PKCS #7 SignedData carries no certificates"))?;

    let mut certs = Vec::new();
    for choice in certificate_set.children().iter().filter(|c| c.is_sequence()) {
        let (_, cert) = X509Certificate::from_der(choice.raw())
            .map_err(|e| ProbeError::mismatch(format!("PKCS #7 certificate: {e:?}")))?;
        certs.push(CertificateSummary::of(&cert));
    }

    if certs.is_empty() {
        return Err(ProbeError::mismatch("PKCS #7 certificate set is empty"));
    }
    Ok(certs)
}

fn certificates_from_pki_path(value: &AsnValue<'_>) -> ProbeResult<Vec<CertificateSummary>> {
    if !value.is_sequence() || value.children().is_empty() {
        return Err(ProbeError::mismatch("not a certificate or certificate path"));
    }

    value
        .children()
        .iter()
        .map(|item| {
            X509Certificate::from_der(item.raw())
                .map(|(_, cert)| CertificateSummary::of(&cert))
                .map_err(|e| ProbeError::mismatch(format!("PkiPath element: {e:?}")))
        })
        .collect()
}
