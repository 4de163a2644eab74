//! Decoded Bitcoin blocks and block headers.

use chrono::{DateTime, Utc};

use crate::bytes::ByteArray;
use crate::transaction::Transaction;

/// A decoded Bitcoin block header (80 bytes on disk).
///
/// All hashes are stored in display byte order, i.e. reversed from the raw
/// digest, so their hex form matches block explorers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BlockHeader {
    /// Block version, one of the known block versions.
    pub version: u32,
    /// Hash of the previous block.
    pub previous_block_hash: ByteArray,
    /// Merkle root of all transactions.
    pub merkle_root_hash: ByteArray,
    /// Block timestamp (Unix time).
    pub timestamp_unix: u32,
    /// Block timestamp as a calendar time.
    pub timestamp: DateTime<Utc>,
    /// Difficulty target in compact "bits" format.
    pub bits: u32,
    /// Nonce for proof of work.
    pub nonce: u32,
    /// Double SHA256 of the raw header.
    pub block_hash: ByteArray,
}

/// Convert a header timestamp to a calendar time.
pub fn unix_to_datetime(timestamp: u32) -> DateTime<Utc> {
    // Every u32 second count is in chrono's range
    DateTime::from_timestamp(i64::from(timestamp), 0).unwrap_or_default()
}

/// A block read from a blk file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Block {
    /// Name of the blk file the block was read from, e.g. `blk00042.dat`.
    pub file_name: String,
    /// Percentage of the source file consumed once this block was read.
    pub file_progress: u8,
    /// The block header.
    pub header: BlockHeader,
    /// Transactions in file order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(file_name: impl Into<String>, header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Block {
            file_name: file_name.into(),
            file_progress: 0,
            header,
            transactions,
        }
    }

    /// Display-order hash of this block.
    pub fn hash(&self) -> &ByteArray {
        &self.header.block_hash
    }

    /// Total number of inputs across all transactions.
    pub fn transaction_input_count(&self) -> usize {
        self.transactions.iter().map(|tx| tx.inputs.len()).sum()
    }

    /// Total number of outputs across all transactions.
    pub fn transaction_output_count(&self) -> usize {
        self.transactions.iter().map(|tx| tx.outputs.len()).sum()
    }
}
