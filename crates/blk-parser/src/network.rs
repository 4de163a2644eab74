//! Bitcoin network definitions, format constants and parser configuration.

use core::str::FromStr;

/// Bitcoin network type, as far as blk files are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Bitcoin mainnet
    #[default]
    Mainnet,
    /// Bitcoin testnet3
    Testnet3,
    /// Bitcoin testnet4
    Testnet4,
    /// Default signet
    Signet,
    /// Local regression test network
    Regtest,
}

impl Network {
    /// The magic value preceding every block record in this network's blk
    /// files, as read from disk in little-endian order.
    pub fn magic(&self) -> u32 {
        match self {
            Network::Mainnet => 0xD9B4_BEF9,
            Network::Testnet3 => 0x0709_110B,
            Network::Testnet4 => 0x283F_161C,
            Network::Signet => 0x40CF_030A,
            Network::Regtest => 0xDAB5_BFFA,
        }
    }

    /// Get network name as string.
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet3 => "testnet3",
            Network::Testnet4 => "testnet4",
            Network::Signet => "signet",
            Network::Regtest => "regtest",
        }
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(Network::Mainnet),
            "testnet3" | "testnet" | "test" => Ok(Network::Testnet3),
            "testnet4" => Ok(Network::Testnet4),
            "signet" => Ok(Network::Signet),
            "regtest" => Ok(Network::Regtest),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

impl core::fmt::Display for Network {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Returned when a network name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network: {0}")]
pub struct UnknownNetwork(pub String);

/// Magic value of mainnet block records.
pub const DEFAULT_BLOCK_MAGIC: u32 = 0xD9B4_BEF9;

/// Size of a block header in bytes.
pub const BLOCK_HEADER_SIZE: usize = 80;

/// Source output index marking a coinbase input.
pub const COINBASE_OUTPUT_INDEX: u32 = 0xFFFF_FFFF;

/// Block versions the decoder accepts.
///
/// Historical values observed on mainnet, including BIP9 versionbits and
/// miner-specific markers whose meaning is undocumented. Extend this table
/// when blocks with new versions show up.
pub const KNOWN_BLOCK_VERSIONS: &[u32] = &[
    1,
    2,
    3,
    4,
    0x0800_0004,
    0x2000_0000,
    0x2000_0001,
    0x2000_0002,
    0x2000_0004,
    0x2000_0007,
    0x3000_0000,
    0x3000_0001,
    0x3000_0007,
];

/// Whether `version` is in [`KNOWN_BLOCK_VERSIONS`].
pub fn is_known_block_version(version: u32) -> bool {
    KNOWN_BLOCK_VERSIONS.contains(&version)
}

/// Configuration shared by the block enumerator and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Expected magic value of every block record.
    pub magic: u32,
}

impl ParserConfig {
    /// Configuration for the blk files of `network`.
    pub fn for_network(network: Network) -> Self {
        ParserConfig { magic: network.magic() }
    }

    /// Override the expected block magic.
    pub fn with_magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig { magic: DEFAULT_BLOCK_MAGIC }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_matches_on_disk_bytes() {
        // Mainnet records start with f9 be b4 d9
        assert_eq!(Network::Mainnet.magic().to_le_bytes(), [0xf9, 0xbe, 0xb4, 0xd9]);
        assert_eq!(Network::Testnet3.magic().to_le_bytes(), [0x0b, 0x11, 0x09, 0x07]);
        assert_eq!(Network::Regtest.magic().to_le_bytes(), [0xfa, 0xbf, 0xb5, 0xda]);
        assert_eq!(Network::Mainnet.magic(), DEFAULT_BLOCK_MAGIC);
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("mainnet".parse(), Ok(Network::Mainnet));
        assert_eq!("MAINNET".parse(), Ok(Network::Mainnet));
        assert_eq!("testnet4".parse(), Ok(Network::Testnet4));
        assert_eq!(
            "invalid".parse::<Network>(),
            Err(UnknownNetwork("invalid".to_string()))
        );
    }

    #[test]
    fn test_known_block_versions() {
        assert!(is_known_block_version(1));
        assert!(is_known_block_version(4));
        assert!(is_known_block_version(0x2000_0000));
        assert!(is_known_block_version(0x3000_0007));
        assert!(!is_known_block_version(0));
        assert!(!is_known_block_version(0x1234_5678));
    }

    #[test]
    fn test_parser_config() {
        assert_eq!(ParserConfig::default().magic, 0xD9B4_BEF9);
        assert_eq!(ParserConfig::for_network(Network::Signet).magic, Network::Signet.magic());
        assert_eq!(ParserConfig::default().with_magic(0xDEAD_BEEF).magic, 0xDEAD_BEEF);
    }
}
