#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;
    use proptest::prelude::*;

    use crate::codec::SignedMessage;
    use crate::signer::{sign, sign_block};
    use crate::verifier::{open_signed_block, verify};

    proptest! {
        #[test]
        fn test_sign_verify_round_trip(
            seed in any::<[u8; 32]>(),
            message in any::<Vec<u8>>()
        ) {
            let key = SigningKey::from_bytes(&seed);
            let public = key.verifying_key().to_bytes();

            let signed = sign(&seed, &message).unwrap();
            prop_assert_eq!(signed.message(), message.as_slice());
            prop_assert!(verify(&public, &message, signed.signature()).unwrap());
        }

        #[test]
        fn test_signature_bit_flip_rejected(
            seed in any::<[u8; 32]>(),
            message in any::<Vec<u8>>(),
            bit in 0usize..(64 * 8)
        ) {
            let public = SigningKey::from_bytes(&seed).verifying_key().to_bytes();
            let mut signature = sign(&seed, &message).unwrap().signature_bytes();
            signature[bit / 8] ^= 1 << (bit % 8);

            prop_assert!(!verify(&public, &message, &signature).unwrap());
        }

        #[test]
        fn test_message_bit_flip_rejected(
            seed in any::<[u8; 32]>(),
            message in prop::collection::vec(any::<u8>(), 1..256),
            bit in any::<prop::sample::Index>()
        ) {
            let public = SigningKey::from_bytes(&seed).verifying_key().to_bytes();
            let signature = sign(&seed, &message).unwrap().signature_bytes();

            let mut tampered = message.clone();
            let bit = bit.index(tampered.len() * 8);
            tampered[bit / 8] ^= 1 << (bit % 8);

            prop_assert!(!verify(&public, &tampered, &signature).unwrap());
        }

        #[test]
        fn test_signed_message_parse_inverts_new(
            message in any::<Vec<u8>>(),
            signature in any::<[u8; 32]>()
        ) {
            let mut sig = [0u8; 64];
            sig[..32].copy_from_slice(&signature);
            sig[32..].copy_from_slice(&signature);

            let signed = SignedMessage::new(&message, &sig);
            let parsed = SignedMessage::parse(signed.as_bytes()).unwrap();
            prop_assert_eq!(parsed, signed);
        }

        #[test]
        fn test_signed_block_binds_plaintext(
            seed in any::<[u8; 32]>(),
            plaintext in any::<[u8; 32]>()
        ) {
            let key = SigningKey::from_bytes(&seed);
            let block = sign_block(&key, &plaintext);
            let opened = open_signed_block(&block, &key.verifying_key().to_bytes()).unwrap();
            prop_assert_eq!(opened, &plaintext[..]);
        }
    }
}
