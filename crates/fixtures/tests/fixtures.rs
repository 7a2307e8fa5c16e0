use coins_core::{block::GENESIS_BLOCK_HASH_BE, hashes::MarkedDigest};
use coins_ecdsa::{EcBackend, Scalar};
use coins_fixtures::{block_from_hex, ec_adapters, safe_ec_adapter, FixtureError, Fixtures};

#[test]
fn it_loads_lines_in_order_skipping_blanks() {
    let fixtures = Fixtures::default();
    let raw = fixtures.data_file("two_blocks").unwrap();
    assert_eq!(raw.lines().count(), 3);

    let lines = fixtures.load_fixture_lines("two_blocks").unwrap();
    assert_eq!(lines.len(), 2);
    assert!(block_from_hex(&lines[0]).unwrap().is_genesis());
    assert!(!block_from_hex(&lines[1]).unwrap().is_genesis());
}

#[test]
fn it_parses_the_genesis_block() {
    let genesis = Fixtures::default().genesis_block().unwrap();
    assert!(genesis.is_genesis());
    assert_eq!(genesis.hash().to_be_hex(), GENESIS_BLOCK_HASH_BE);
    assert_eq!(genesis.txns.len(), 1);
    assert!(genesis.txns[0].is_coinbase());
    assert!(genesis.has_valid_merkle_root());
    assert_eq!(
        genesis.header.merkle_root.to_be_hex(),
        "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
    );
}

#[test]
fn it_chains_blocks_by_height() {
    let fixtures = Fixtures::default();
    let blocks = fixtures.blocks().unwrap();
    assert_eq!(blocks.len(), 2);

    let genesis = fixtures.block(0).unwrap();
    let first = fixtures.block(1).unwrap();
    assert_eq!(first.header.prev_hash, genesis.hash());
    assert_eq!(
        first.hash().to_be_hex(),
        "00000000839a8e6886ab5951d76f411475428afc90947ee320161bbf18eb6048"
    );
    assert!(first.has_valid_merkle_root());
}

#[test]
fn it_reports_missing_heights() {
    match Fixtures::default().block(2) {
        Err(FixtureError::MissingBlock { index, available }) => {
            assert_eq!(index, 2);
            assert_eq!(available, 2);
        }
        other => panic!("expected MissingBlock, got {:?}", other.map(|b| b.hash())),
    }
}

#[test]
fn it_provides_working_adapters() {
    let k = Scalar::from_u64(0xc0ffee);
    let digest = Fixtures::default().genesis_block().unwrap().hash().internal();
    let safe = safe_ec_adapter().unwrap();
    let pubkey = safe.derive_public_key(&k).unwrap();

    for adapter in ec_adapters().unwrap() {
        assert_eq!(adapter.derive_public_key(&k).unwrap(), pubkey);
        let sig = adapter.sign(&digest, &k).unwrap();
        assert!(safe.verify(&digest, &sig, &pubkey));
        let sig = adapter.sign_recoverable(&digest, &k).unwrap();
        assert_eq!(safe.recover(&digest, &sig).unwrap(), pubkey);
    }
}
