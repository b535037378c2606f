//! Core block/transaction types and consensus serialization.

pub mod block;
pub mod encoding;
pub mod hash;
pub mod merkle;
pub mod outpoint;
pub mod script;
pub mod transaction;

pub use block::{Block, BlockDecodeError, BlockHeader};
pub use encoding::DecodeError;
pub use hash::{sha256, sha256d};
pub use merkle::merkle_root;
pub use outpoint::OutPoint;
pub use transaction::{Transaction, TxIn, TxOut};
