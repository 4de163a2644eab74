//! Decoding of block payloads into headers and transactions.
//!
//! A payload is the byte range following the magic and length fields of a
//! blk file record: an 80-byte header, a compact-size transaction count and
//! the transactions. Hashes are computed over the exact raw byte ranges
//! consumed and stored in display (reversed) byte order.

use crate::block::{unix_to_datetime, Block, BlockHeader};
use crate::bytes::ByteArray;
use crate::error::{ContentError, DecodeError};
use crate::hash::{display_hash, double_sha256_parts, reverse_bytes};
use crate::network::{is_known_block_version, BLOCK_HEADER_SIZE};
use crate::reader::BlockReader;
use crate::transaction::{Transaction, TransactionInput, TransactionOutput, Witness};

/// Marker and flag following the version of a witness-serialized transaction.
const WITNESS_MARKER: [u8; 2] = [0x00, 0x01];

/// Decode a complete block payload read from `file_name`.
///
/// Fails without returning a partial block if any part of the payload is
/// malformed.
pub fn decode_block(file_name: &str, payload: &[u8]) -> Result<Block, DecodeError> {
    let mut reader = BlockReader::new(payload);
    let header = decode_header(&mut reader)?;

    let count = reader.read_varint_len()?;
    let mut transactions = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        transactions.push(decode_transaction(&mut reader)?);
    }

    if reader.remaining() > 0 {
        log::debug!(
            "Block {} in {} has {} trailing bytes",
            header.block_hash,
            file_name,
            reader.remaining()
        );
    }

    Ok(Block::new(file_name, header, transactions))
}

/// Decode the 80-byte block header at the reader's position.
///
/// An unknown version fails right after the 4 version bytes are read.
pub fn decode_header(reader: &mut BlockReader<'_>) -> Result<BlockHeader, DecodeError> {
    let start = reader.position();

    let version = reader.read_u32()?;
    if !is_known_block_version(version) {
        return Err(DecodeError::UnknownBlockVersion(version));
    }

    let previous_block_hash = read_hash(reader)?;
    let merkle_root_hash = read_hash(reader)?;
    let timestamp_unix = reader.read_u32()?;
    let bits = reader.read_u32()?;
    let nonce = reader.read_u32()?;

    let end = reader.position();
    let size = end - start;
    if size != BLOCK_HEADER_SIZE {
        return Err(ContentError::InvalidHeaderSize {
            expected: BLOCK_HEADER_SIZE,
            actual: size,
        }
        .into());
    }
    let block_hash = ByteArray::from(display_hash(reader.slice(start, end)?));

    Ok(BlockHeader {
        version,
        previous_block_hash,
        merkle_root_hash,
        timestamp_unix,
        timestamp: unix_to_datetime(timestamp_unix),
        bits,
        nonce,
        block_hash,
    })
}

/// Decode one transaction at the reader's position.
///
/// Both the legacy and the witness serialization are accepted. The hash
/// always covers the legacy serialization: for witness transactions the
/// marker, flag and witness stacks are left out.
pub fn decode_transaction(reader: &mut BlockReader<'_>) -> Result<Transaction, DecodeError> {
    let start = reader.position();
    let version = reader.read_u32()?;

    let has_witness = reader.remaining() >= 2 && reader.peek_bytes(2)? == &WITNESS_MARKER[..];
    if has_witness {
        reader.skip(WITNESS_MARKER.len())?;
    }
    let body_start = reader.position();

    let input_count = reader.read_varint_len()?;
    let mut inputs = Vec::with_capacity(input_count.min(reader.remaining()));
    for _ in 0..input_count {
        inputs.push(decode_input(reader)?);
    }

    let output_count = reader.read_varint_len()?;
    let mut outputs = Vec::with_capacity(output_count.min(reader.remaining()));
    for _ in 0..output_count {
        outputs.push(decode_output(reader)?);
    }
    let body_end = reader.position();

    let witnesses = if has_witness {
        let mut witnesses = Vec::with_capacity(inputs.len());
        for _ in 0..inputs.len() {
            witnesses.push(decode_witness(reader)?);
        }
        Some(witnesses)
    } else {
        None
    };

    let lock_time_start = reader.position();
    let lock_time = reader.read_u32()?;
    let end = reader.position();

    let digest = if has_witness {
        double_sha256_parts(&[
            reader.slice(start, start + 4)?,
            reader.slice(body_start, body_end)?,
            reader.slice(lock_time_start, end)?,
        ])
    } else {
        double_sha256_parts(&[reader.slice(start, end)?])
    };

    Ok(Transaction {
        version,
        lock_time,
        hash: ByteArray::from(reverse_bytes(&digest)),
        inputs,
        outputs,
        witnesses,
    })
}

fn decode_input(reader: &mut BlockReader<'_>) -> Result<TransactionInput, DecodeError> {
    let source_transaction_hash = read_hash(reader)?;
    let source_output_index = reader.read_u32()?;
    let script = ByteArray::new(reader.read_var_bytes()?);
    // Sequence number, unused
    reader.skip(4)?;

    Ok(TransactionInput {
        source_transaction_hash,
        source_output_index,
        script,
    })
}

fn decode_output(reader: &mut BlockReader<'_>) -> Result<TransactionOutput, DecodeError> {
    let value = reader.read_u64()?;
    let script = ByteArray::new(reader.read_var_bytes()?);
    Ok(TransactionOutput { value, script })
}

fn decode_witness(reader: &mut BlockReader<'_>) -> Result<Witness, DecodeError> {
    let count = reader.read_varint_len()?;
    let mut stack = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        stack.push(ByteArray::new(reader.read_var_bytes()?));
    }
    Ok(Witness { stack })
}

/// Read a raw 32-byte hash and store it in display order.
fn read_hash(reader: &mut BlockReader<'_>) -> Result<ByteArray, ContentError> {
    let raw: [u8; 32] = reader.read_array()?;
    Ok(ByteArray::from(reverse_bytes(&raw)))
}
