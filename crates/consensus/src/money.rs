//! Monetary units.

pub type Amount = i64;

pub const COIN: Amount = 100_000_000;
