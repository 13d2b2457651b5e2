//! Property tests for PEM handling and cascade robustness

use keysniff::classifier::CASCADE;
use keysniff::pem::{self, PemBlock};
use keysniff::{classify, detect_keystore_type, ArtifactType, ByteSource};
use proptest::prelude::*;

fn label() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9 ]{0,24}[A-Z0-9]".prop_filter("EC PARAMETERS is skipped by decode", |l| {
        l != pem::EC_PARAMETERS_LABEL
    })
}

/// Run every cascade stage straight, without the classifier's panic boundary, so a
/// panic inside one fails the test
fn run_cascade_unguarded(bytes: &[u8]) {
    let source = ByteSource::new(bytes);
    for stage in CASCADE {
        let _ = (stage.run)(&source);
    }
    let _ = detect_keystore_type(bytes);
    let _ = pem::decode_all(bytes);
}

fn attributes() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(
        ("[A-Za-z][A-Za-z-]{0,15}", "[!-~]([ -~]{0,30}[!-~])?"),
        0..4,
    )
}

proptest! {
    #[test]
    fn decode_inverts_encode(
        label in label(),
        payload in prop::collection::vec(any::<u8>(), 1..512),
        attrs in attributes(),
    ) {
        let mut block = PemBlock::new(label, payload);
        for (name, value) in attrs {
            block.attributes.insert(name, value);
        }

        let text = pem::encode(&block);
        prop_assert_eq!(pem::decode(text.as_bytes()), Some(block.clone()));
        prop_assert_eq!(pem::decode_all(text.as_bytes()), vec![block]);
    }

    #[test]
    fn mismatched_footer_is_rejected(
        begin in label(),
        end in label(),
        payload in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        prop_assume!(begin != end);
        let text = pem::encode(&PemBlock::new(begin.clone(), payload))
            .replace(&format!("-----END {begin}-----"), &format!("-----END {end}-----"));
        prop_assert_eq!(pem::decode(text.as_bytes()), None);
    }

    #[test]
    fn classify_is_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
        let first = classify(&bytes);
        prop_assert_eq!(first, classify(&bytes));
        if bytes.is_empty() {
            prop_assert_eq!(first, ArtifactType::Unknown);
        }
    }

    #[test]
    fn cascade_survives_random_bytes(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
        run_cascade_unguarded(&bytes);
    }

    #[test]
    fn cascade_survives_truncated_der(
        header in prop::sample::select(vec![0x30u8, 0x31, 0xA0, 0x04, 0x02, 0x06]),
        len_octets in 0u8..10,
        tail in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut bytes = vec![header, 0x80 | len_octets];
        bytes.extend(tail);
        run_cascade_unguarded(&bytes);
    }

    #[test]
    fn cascade_survives_keystore_prefixes(
        version in 0u32..3,
        tail in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut bytes = version.to_be_bytes().to_vec();
        bytes.extend(tail);
        run_cascade_unguarded(&bytes);
    }

    #[test]
    fn cascade_survives_damaged_pem(
        label in label(),
        payload in prop::collection::vec(any::<u8>(), 1..128),
        cut in any::<prop::sample::Index>(),
    ) {
        let text = pem::encode(&PemBlock::new(label, payload));
        let end = cut.index(text.len());
        run_cascade_unguarded(&text.as_bytes()[..end]);
    }
}
