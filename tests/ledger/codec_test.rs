use coinmesh::identity::Keypair;
use coinmesh::ledger::{Coin, CodecError, EntryCodec, LedgerEntry, GENESIS_HASH};

fn sample_entry() -> LedgerEntry {
    let kp = Keypair::generate();
    LedgerEntry::sign(Coin::new("n1", "n2", "rent", -42), &GENESIS_HASH, &kp).unwrap()
}

#[test]
fn test_hex_and_base64_forms_decode() {
    let entry = sample_entry();

    let hex = EntryCodec::encode_hex(&entry).unwrap();
    let b64 = EntryCodec::encode_base64(&entry).unwrap();

    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(!b64.contains('='));
    assert_eq!(EntryCodec::decode_hex(&hex).unwrap(), entry);
    assert_eq!(EntryCodec::decode_base64(&b64).unwrap(), entry);
}

#[test]
fn test_decoded_entry_still_verifies() {
    let kp = Keypair::generate();
    let entry = LedgerEntry::sign(Coin::new("n1", "n2", "", 9), &GENESIS_HASH, &kp).unwrap();

    let decoded = EntryCodec::decode(&EntryCodec::encode(&entry).unwrap()).unwrap();

    assert!(decoded.links_to(&GENESIS_HASH));
    assert!(decoded.verify(&kp.public_key()));
}

#[test]
fn test_invalid_text_rejected() {
    assert!(matches!(
        EntryCodec::decode_hex("zz-not-hex"),
        Err(CodecError::InvalidHex(_))
    ));
    assert!(matches!(
        EntryCodec::decode_base64("!!!"),
        Err(CodecError::InvalidBase64(_))
    ));
    assert!(matches!(
        EntryCodec::decode(&[0xFF, 0xFF, 0xFF]),
        Err(CodecError::DecodeError(_))
    ));
}
