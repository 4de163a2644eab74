//! Decoded transactions, inputs, outputs and witness data.

use crate::bytes::ByteArray;
use crate::network::COINBASE_OUTPUT_INDEX;

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TransactionInput {
    /// Hash of the transaction holding the spent output (display order).
    pub source_transaction_hash: ByteArray,
    /// Index of the spent output; `0xFFFFFFFF` for coinbase inputs.
    pub source_output_index: u32,
    /// Raw input script, not parsed.
    pub script: ByteArray,
}

impl TransactionInput {
    /// Whether this input spends no previous output.
    pub fn is_coinbase(&self) -> bool {
        self.source_output_index == COINBASE_OUTPUT_INDEX
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TransactionOutput {
    /// Value in satoshis.
    pub value: u64,
    /// Raw output script, not parsed.
    pub script: ByteArray,
}

/// Witness stack of one input. Items are kept as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Witness {
    pub stack: Vec<ByteArray>,
}

impl Witness {
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// A decoded transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Transaction {
    pub version: u32,
    pub lock_time: u32,
    /// Transaction hash (display order) over the non-witness serialization.
    pub hash: ByteArray,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    /// One witness per input, present only for transactions serialized with
    /// the segwit marker.
    pub witnesses: Option<Vec<Witness>>,
}

impl Transaction {
    /// Whether this is a coinbase transaction: a single input spending no
    /// previous output.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    /// Sum of all output values, saturating on overflow.
    pub fn total_output_value(&self) -> u64 {
        self.outputs
            .iter()
            .fold(0u64, |total, output| total.saturating_add(output.value))
    }

    pub fn has_witness(&self) -> bool {
        self.witnesses.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(index: u32) -> TransactionInput {
        TransactionInput {
            source_transaction_hash: ByteArray::new(&[0u8; 32]),
            source_output_index: index,
            script: ByteArray::new(&[0x04, 0xff]),
        }
    }

    #[test]
    fn test_coinbase_detection() {
        assert!(input(0xFFFF_FFFF).is_coinbase());
        assert!(!input(0).is_coinbase());

        let tx = Transaction {
            version: 1,
            lock_time: 0,
            hash: ByteArray::new(&[0u8; 32]),
            inputs: vec![input(0xFFFF_FFFF)],
            outputs: Vec::new(),
            witnesses: None,
        };
        assert!(tx.is_coinbase());
        assert!(!tx.has_witness());

        let spend = Transaction { inputs: vec![input(1), input(0xFFFF_FFFF)], ..tx };
        assert!(!spend.is_coinbase());
    }

    #[test]
    fn test_total_output_value() {
        let tx = Transaction {
            version: 2,
            lock_time: 0,
            hash: ByteArray::new(&[0u8; 32]),
            inputs: Vec::new(),
            outputs: vec![
                TransactionOutput { value: 5_000_000_000, script: ByteArray::empty() },
                TransactionOutput { value: 1, script: ByteArray::empty() },
            ],
            witnesses: None,
        };
        assert_eq!(tx.total_output_value(), 5_000_000_001);

        let huge = Transaction {
            outputs: vec![
                TransactionOutput { value: u64::MAX, script: ByteArray::empty() },
                TransactionOutput { value: 1, script: ByteArray::empty() },
            ],
            ..tx
        };
        assert_eq!(huge.total_output_value(), u64::MAX);
    }
}
