use kepler_consensus::{hash256_from_hex, hash256_to_hex, Hash256};
use kepler_primitives::block::{Block, BlockHeader};
use kepler_primitives::outpoint::OutPoint;
use kepler_primitives::script::{push_data, push_script_num, OP_CHECKSIG};
use kepler_primitives::transaction::{Transaction, TxIn, TxOut};

const GENESIS_COINBASE_HEX: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff1a04ffff001d01041258582f30352f32303139204e4f5449434941ffffffff0100f2052a01000000434104b8bbf7e36419f96fc99b7d9d04a62e8d9a28f6c8dc548e7b9b84b44c380693b76e730f28d18894bc05a0a72d5bb8e35221dc0d375f8552c9485995f60a94d23aac00000000";
const GENESIS_PUBKEY_HEX: &str = "04b8bbf7e36419f96fc99b7d9d04a62e8d9a28f6c8dc548e7b9b84b44c380693b76e730f28d18894bc05a0a72d5bb8e35221dc0d375f8552c9485995f60a94d23a";

fn seq_hash(start: u8) -> Hash256 {
    std::array::from_fn(|i| start.wrapping_add(i as u8))
}

fn push_hash_le(buffer: &mut Vec<u8>, start: u8) {
    for byte in 0u8..=0x1f {
        buffer.push(start.wrapping_add(byte));
    }
}

fn decode_hex(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("hex byte"))
        .collect()
}

fn genesis_coinbase() -> Transaction {
    let mut script_sig = Vec::new();
    push_script_num(&mut script_sig, 486_604_799);
    push_script_num(&mut script_sig, 4);
    push_data(&mut script_sig, b"XX/05/2019 NOTICIA");

    let mut script_pubkey = Vec::new();
    push_data(&mut script_pubkey, &decode_hex(GENESIS_PUBKEY_HEX));
    script_pubkey.push(OP_CHECKSIG);

    Transaction {
        version: 1,
        vin: vec![TxIn::coinbase(script_sig)],
        vout: vec![TxOut {
            value: 5_000_000_000,
            script_pubkey,
        }],
        lock_time: 0,
    }
}

#[test]
fn serialize_block_header_is_80_bytes() {
    let header = BlockHeader {
        version: 4 | (1 << 9),
        prev_block: seq_hash(0x00),
        merkle_root: seq_hash(0x20),
        time: 0x0102_0304,
        bits: 0x0a0b_0c0d,
        nonce: 0xdead_beef,
    };

    let encoded = header.consensus_encode();
    let mut expected = Vec::new();
    expected.extend_from_slice(&(4i32 | (1 << 9)).to_le_bytes());
    push_hash_le(&mut expected, 0x00);
    push_hash_le(&mut expected, 0x20);
    expected.extend_from_slice(&0x0102_0304u32.to_le_bytes());
    expected.extend_from_slice(&0x0a0b_0c0du32.to_le_bytes());
    expected.extend_from_slice(&0xdead_beefu32.to_le_bytes());

    assert_eq!(encoded.len(), 80);
    assert_eq!(encoded.to_vec(), expected);

    let decoded = BlockHeader::consensus_decode(&encoded).expect("decode header");
    assert_eq!(decoded, header);

    let mut long = expected.clone();
    long.push(0);
    assert!(BlockHeader::consensus_decode(&long).is_err());
}

#[test]
fn genesis_coinbase_matches_cpp() {
    let tx = genesis_coinbase();
    assert_eq!(tx.consensus_encode(), decode_hex(GENESIS_COINBASE_HEX));
    assert_eq!(
        hash256_to_hex(&tx.txid()),
        "b12d180972699070d6b043024f034254051ea8dec67278c63f491a3a53b3eb71"
    );

    let decoded =
        Transaction::consensus_decode(&decode_hex(GENESIS_COINBASE_HEX)).expect("decode coinbase");
    assert_eq!(decoded, tx);
    assert!(decoded.vin[0].prevout == OutPoint::null());
}

#[test]
fn mainnet_genesis_block_hash_matches_cpp() {
    let tx = genesis_coinbase();
    let header = BlockHeader {
        version: 1,
        prev_block: [0u8; 32],
        merkle_root: tx.txid(),
        time: 1_555_986_291,
        bits: 0x1e0f_fff0,
        nonce: 36_257_733,
    };
    let block = Block {
        header,
        transactions: vec![tx],
    };

    assert_eq!(block.merkle_root(), block.header.merkle_root);
    assert_eq!(
        block.hash(),
        hash256_from_hex("74ed490627766be4b602d4deb0bc7c96345984bcf718e4a6813cb6d8810684f2")
            .expect("hash hex")
    );

    let encoded = block.consensus_encode();
    let decoded = Block::consensus_decode(&encoded).expect("decode block");
    assert_eq!(decoded, block);
    assert_eq!(decoded.consensus_encode(), encoded);
}
