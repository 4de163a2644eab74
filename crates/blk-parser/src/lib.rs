//! Streaming decoder for Bitcoin Core `blk?????.dat` block files.
//!
//! This crate provides:
//! - Discovery and validation of the blk file sequence, with resume support
//! - Block record framing (zero padding, magic, length prefix)
//! - Block, transaction, input, output and witness decoding
//! - SHA256 double-hashing of headers and transactions
//!
//! Blocks are produced lazily, one at a time, in on-disk order:
//!
//! ```no_run
//! use blk_parser::BlockchainParser;
//!
//! # fn main() -> Result<(), blk_parser::ParserError> {
//! for block in BlockchainParser::new("/home/user/.bitcoin/blocks")? {
//!     let block = block?;
//!     println!("{} {} txs", block.header.block_hash, block.transactions.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Orphaned blocks are yielded like any other; telling them apart is up to
//! the caller.

pub mod block;
pub mod bytes;
pub mod decoder;
pub mod error;
pub mod files;
pub mod hash;
pub mod network;
pub mod parser;
pub mod reader;
pub mod transaction;

pub use block::{Block, BlockHeader};
pub use bytes::ByteArray;
pub use decoder::decode_block;
pub use error::{ContentError, DecodeError, FileSetError, ParserError};
pub use files::{blockchain_file_name, resolve_blockchain_files};
pub use hash::double_sha256;
pub use network::{Network, ParserConfig, DEFAULT_BLOCK_MAGIC};
pub use parser::{BlockchainFile, BlockchainParser, Blocks};
pub use reader::{encode_varint, BlockReader};
pub use transaction::{Transaction, TransactionInput, TransactionOutput, Witness};
