#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::api::verify;
    use crate::errors::{ErrorKind, ResolveError};
    use crate::resolver::{SasResponse, KEYTYPE_CRYPTOSIGN, SAS_RESPONSE_BYTES};

    proptest! {
        #[test]
        fn test_short_response_is_truncated(
            body in prop::collection::vec(any::<u8>(), 0..(SAS_RESPONSE_BYTES - 1))
        ) {
            let mut payload = vec![KEYTYPE_CRYPTOSIGN];
            payload.extend_from_slice(&body);

            let truncated = matches!(
                SasResponse::parse(&payload, KEYTYPE_CRYPTOSIGN),
                Err(ResolveError::TruncatedResponse { .. })
            );
            prop_assert!(truncated);
        }

        #[test]
        fn test_foreign_key_type_is_unsupported(
            key_type in any::<u8>().prop_filter("not cryptosign", |k| *k != KEYTYPE_CRYPTOSIGN),
            body in prop::collection::vec(any::<u8>(), 0..200)
        ) {
            let mut payload = vec![key_type];
            payload.extend_from_slice(&body);

            let unsupported = matches!(
                SasResponse::parse(&payload, KEYTYPE_CRYPTOSIGN),
                Err(ResolveError::UnsupportedKeyType(k)) if k == key_type
            );
            prop_assert!(unsupported);
        }

        #[test]
        fn test_parse_ignores_trailing_bytes(
            sas in any::<[u8; 32]>(),
            sig in prop::collection::vec(any::<u8>(), 64),
            trailer in prop::collection::vec(any::<u8>(), 0..32)
        ) {
            let mut payload = vec![KEYTYPE_CRYPTOSIGN];
            payload.extend_from_slice(&sas);
            payload.extend_from_slice(&sig);
            payload.extend_from_slice(&trailer);

            let parsed = SasResponse::parse(&payload, KEYTYPE_CRYPTOSIGN).unwrap();
            prop_assert_eq!(parsed.sas_public, sas);
            prop_assert_eq!(parsed.signature.as_slice(), sig.as_slice());
        }

        #[test]
        fn test_verify_rejects_wrong_hex_lengths(
            sas_len in 0usize..80,
            sig_len in 0usize..160,
            message in any::<Vec<u8>>()
        ) {
            prop_assume!(sas_len != 64 || sig_len != 128);
            let sas = "a".repeat(sas_len);
            let sig = "b".repeat(sig_len);

            let err = verify(&sas, &sig, &message).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }
}
