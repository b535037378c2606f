//! Transaction types and serialization.

use kepler_consensus::Hash256;

use crate::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use crate::hash::sha256d;
use crate::outpoint::OutPoint;

pub const SEQUENCE_FINAL: u32 = u32::MAX;

#[derive(Clone, Debug, PartialEq)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TxIn {
    pub fn coinbase(script_sig: Vec<u8>) -> Self {
        Self {
            prevout: OutPoint::null(),
            script_sig,
            sequence: SEQUENCE_FINAL,
        }
    }
}

impl Encodable for TxIn {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        self.prevout.consensus_encode(encoder);
        encoder.write_var_bytes(&self.script_sig);
        encoder.write_u32_le(self.sequence);
    }
}

impl Decodable for TxIn {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let prevout = OutPoint::consensus_decode(decoder)?;
        let script_sig = decoder.read_var_bytes()?;
        let sequence = decoder.read_u32_le()?;
        Ok(Self {
            prevout,
            script_sig,
            sequence,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TxOut {
    pub value: i64,
    pub script_pubkey: Vec<u8>,
}

impl Encodable for TxOut {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        encoder.write_i64_le(self.value);
        encoder.write_var_bytes(&self.script_pubkey);
    }
}

impl Decodable for TxOut {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let value = decoder.read_i64_le()?;
        let script_pubkey = decoder.read_var_bytes()?;
        Ok(Self {
            value,
            script_pubkey,
        })
    }
}

/// Legacy (pre-segwit) transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub version: i32,
    pub vin: Vec<TxIn>,
    pub vout: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].prevout.is_null()
    }

    pub fn consensus_encode(&self) -> Vec<u8> {
        crate::encoding::encode(self)
    }

    pub fn consensus_decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        crate::encoding::decode(bytes)
    }

    pub fn txid(&self) -> Hash256 {
        sha256d(&self.consensus_encode())
    }
}

impl Encodable for Transaction {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        encoder.write_i32_le(self.version);
        encoder.write_varint(self.vin.len() as u64);
        for input in &self.vin {
            input.consensus_encode(encoder);
        }
        encoder.write_varint(self.vout.len() as u64);
        for output in &self.vout {
            output.consensus_encode(encoder);
        }
        encoder.write_u32_le(self.lock_time);
    }
}

impl Decodable for Transaction {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let version = decoder.read_i32_le()?;
        let vin = read_vec(decoder)?;
        let vout = read_vec(decoder)?;
        let lock_time = decoder.read_u32_le()?;
        Ok(Self {
            version,
            vin,
            vout,
            lock_time,
        })
    }
}

fn read_vec<T: Decodable>(decoder: &mut Decoder) -> Result<Vec<T>, DecodeError> {
    let count = decoder.read_varint()?;
    let count = usize::try_from(count).map_err(|_| DecodeError::SizeTooLarge)?;
    // Each element needs at least one byte, so a count past the remaining input is bogus.
    let mut items = Vec::with_capacity(count.min(decoder.remaining()));
    for _ in 0..count {
        items.push(T::consensus_decode(decoder)?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction {
            version: 1,
            vin: vec![TxIn::coinbase(vec![0x51])],
            vout: vec![TxOut {
                value: 5_000_000_000,
                script_pubkey: vec![0x6a],
            }],
            lock_time: 0,
        }
    }

    #[test]
    fn coinbase_detection() {
        let tx = sample();
        assert!(tx.is_coinbase());

        let mut spend = tx.clone();
        spend.vin[0].prevout.index = 0;
        assert!(!spend.is_coinbase());
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = sample().consensus_encode();
        assert_eq!(Transaction::consensus_decode(&bytes), Ok(sample()));
        bytes.push(0);
        assert_eq!(
            Transaction::consensus_decode(&bytes),
            Err(DecodeError::TrailingBytes)
        );
    }

    #[test]
    fn truncated_input_count_is_eof() {
        let bytes = [0x01, 0x00, 0x00, 0x00, 0xfd, 0x00, 0x01];
        assert_eq!(
            Transaction::consensus_decode(&bytes),
            Err(DecodeError::UnexpectedEof)
        );
    }
}
