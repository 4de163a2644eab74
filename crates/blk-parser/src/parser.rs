//! Lazy enumeration of the blocks stored in a sequence of blk files.
//!
//! Each blk file is a series of records: optional zero padding, a 4-byte
//! magic, a 4-byte payload length and the block payload. Files are opened
//! one at a time and only the payload of the block being decoded is held in
//! memory.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::block::Block;
use crate::decoder::decode_block;
use crate::error::{ContentError, ParserError};
use crate::files::resolve_blockchain_files;
use crate::network::ParserConfig;
use crate::reader::skip_zero_bytes;

/// A named blk file stream.
pub struct BlockchainFile<R> {
    name: String,
    reader: R,
}

impl<R: BufRead + Seek> BlockchainFile<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        BlockchainFile {
            name: name.into(),
            reader,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl BlockchainFile<BufReader<File>> {
    /// Open the blk file at `path`.
    pub fn open(path: &Path) -> io::Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = File::open(path)?;
        Ok(BlockchainFile::new(name, BufReader::new(file)))
    }
}

type FileSource<R> = Box<dyn Iterator<Item = Result<BlockchainFile<R>, ParserError>>>;

/// Parser over an ordered set of blk files.
pub struct BlockchainParser<R> {
    files: FileSource<R>,
    config: ParserConfig,
}

impl BlockchainParser<BufReader<File>> {
    /// Parse every blk file in `dir`.
    ///
    /// The file set is validated here; files are opened lazily while
    /// iterating.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, ParserError> {
        let paths = resolve_blockchain_files(dir.as_ref(), None)?;
        Ok(Self::from_paths(paths))
    }

    /// Parse the blk files in `dir` starting at `first_file`, typically the
    /// last file processed by a previous run.
    pub fn resume_from(dir: impl AsRef<Path>, first_file: &str) -> Result<Self, ParserError> {
        let paths = resolve_blockchain_files(dir.as_ref(), Some(first_file))?;
        Ok(Self::from_paths(paths))
    }

    fn from_paths(paths: Vec<PathBuf>) -> Self {
        let files = paths
            .into_iter()
            .map(|path| BlockchainFile::open(&path).map_err(ParserError::from));
        BlockchainParser {
            files: Box::new(files),
            config: ParserConfig::default(),
        }
    }
}

impl<R: BufRead + Seek + 'static> BlockchainParser<R> {
    /// Parse already opened streams, in the order given.
    pub fn from_files<I>(files: I) -> Self
    where
        I: IntoIterator<Item = BlockchainFile<R>>,
        I::IntoIter: 'static,
    {
        BlockchainParser {
            files: Box::new(files.into_iter().map(Ok)),
            config: ParserConfig::default(),
        }
    }
}

impl<R: BufRead + Seek> BlockchainParser<R> {
    /// Use `config` instead of the mainnet defaults.
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Iterator over all blocks, in file order.
    pub fn blocks(self) -> Blocks<R> {
        Blocks {
            files: self.files,
            config: self.config,
            current: None,
            done: false,
        }
    }
}

impl<R: BufRead + Seek> IntoIterator for BlockchainParser<R> {
    type Item = Result<Block, ParserError>;
    type IntoIter = Blocks<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks()
    }
}

/// The blk file currently being read.
struct OpenFile<R> {
    file: BlockchainFile<R>,
    length: u64,
}

/// Iterator over the blocks of a [`BlockchainParser`].
///
/// Yields blocks in on-disk order. After an error no further items are
/// produced. Dropping the iterator closes the open file.
pub struct Blocks<R> {
    files: FileSource<R>,
    config: ParserConfig,
    current: Option<OpenFile<R>>,
    done: bool,
}

impl<R: BufRead + Seek> Blocks<R> {
    /// Name of the file currently being read, if any.
    pub fn current_file(&self) -> Option<&str> {
        self.current.as_ref().map(|open| open.file.name())
    }

    fn open_next(&mut self) -> Option<Result<(), ParserError>> {
        let mut file = match self.files.next()? {
            Ok(file) => file,
            Err(e) => return Some(Err(e)),
        };
        let length = match stream_length(&mut file.reader) {
            Ok(length) => length,
            Err(e) => return Some(Err(e.into())),
        };
        log::debug!("Parsing blockchain file {} ({} bytes)", file.name, length);
        self.current = Some(OpenFile { file, length });
        Some(Ok(()))
    }

    fn fail(&mut self, error: ParserError) -> Option<Result<Block, ParserError>> {
        self.done = true;
        self.current = None;
        Some(Err(error))
    }
}

impl<R: BufRead + Seek> Iterator for Blocks<R> {
    type Item = Result<Block, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if self.current.is_none() {
                match self.open_next() {
                    None => {
                        self.done = true;
                        return None;
                    }
                    Some(Err(e)) => return self.fail(e),
                    Some(Ok(())) => {}
                }
            }

            let open = self.current.as_mut()?;
            match read_block(open, self.config.magic) {
                Ok(Some(block)) => return Some(Ok(block)),
                Ok(None) => {
                    log::debug!("Finished blockchain file {}", open.file.name);
                    self.current = None;
                }
                Err(e) => return self.fail(e),
            }
        }
    }
}

/// Read the next block record of `open`, or `None` when the file holds no
/// further records.
fn read_block<R: BufRead + Seek>(open: &mut OpenFile<R>, magic: u32) -> Result<Option<Block>, ParserError> {
    let name = open.file.name.as_str();
    let reader = &mut open.file.reader;

    if reader.stream_position()? >= open.length || !skip_zero_bytes(reader)? {
        return Ok(None);
    }

    let found = read_u32_field(reader, name, open.length)?;
    if found != magic {
        return Err(ParserError::content(name, ContentError::MagicMismatch { expected: magic, found }));
    }

    let length = read_u32_field(reader, name, open.length)?;
    let mut payload = Vec::new();
    let read = reader.by_ref().take(u64::from(length)).read_to_end(&mut payload)?;
    if read as u64 != u64::from(length) {
        return Err(ParserError::content(
            name,
            ContentError::TruncatedRecord {
                expected: u64::from(length),
                available: read as u64,
            },
        ));
    }

    let mut block = decode_block(name, &payload).map_err(|e| ParserError::from_decode(name, e))?;
    let position = reader.stream_position()?;
    block.file_progress = progress(position, open.length);
    log::trace!("Decoded block {} from {} ({}%)", block.header.block_hash, name, block.file_progress);
    Ok(Some(block))
}

fn read_u32_field<R: Read + Seek>(reader: &mut R, name: &str, length: u64) -> Result<u32, ParserError> {
    match reader.read_u32::<LittleEndian>() {
        Ok(value) => Ok(value),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            let position = reader.stream_position()?;
            Err(ParserError::content(
                name,
                ContentError::TruncatedRecord {
                    expected: 4,
                    available: length.saturating_sub(position),
                },
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// Total length of `reader`, leaving its position unchanged.
fn stream_length<R: Seek>(reader: &mut R) -> io::Result<u64> {
    let position = reader.stream_position()?;
    let length = reader.seek(SeekFrom::End(0))?;
    if position != length {
        reader.seek(SeekFrom::Start(position))?;
    }
    Ok(length)
}

/// Percentage of a file of `length` bytes consumed at `position`.
fn progress(position: u64, length: u64) -> u8 {
    if length == 0 {
        return 100;
    }
    let percent = u128::from(position) * 100 / u128::from(length);
    percent.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_progress() {
        assert_eq!(progress(0, 1000), 0);
        assert_eq!(progress(500, 1000), 50);
        assert_eq!(progress(999, 1000), 99);
        assert_eq!(progress(1000, 1000), 100);
        assert_eq!(progress(0, 0), 100);
        assert_eq!(progress(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn test_stream_length_keeps_position() {
        let mut cursor = Cursor::new(vec![0u8; 64]);
        cursor.set_position(10);
        assert_eq!(stream_length(&mut cursor).unwrap(), 64);
        assert_eq!(cursor.position(), 10);
    }

    #[test]
    fn test_empty_and_padding_only_files() {
        let files = vec![
            BlockchainFile::new("blk00000.dat", Cursor::new(Vec::new())),
            BlockchainFile::new("blk00001.dat", Cursor::new(vec![0u8; 3000])),
        ];
        let mut blocks = BlockchainParser::from_files(files).blocks();
        assert!(blocks.next().is_none());
        assert!(blocks.next().is_none());
        assert!(blocks.current_file().is_none());
    }

    #[test]
    fn test_magic_mismatch() {
        let mut data = 0x0709_110Bu32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0u8; 4]);
        let files = vec![BlockchainFile::new("blk00000.dat", Cursor::new(data))];

        let mut blocks = BlockchainParser::from_files(files).blocks();
        match blocks.next() {
            Some(Err(ParserError::InvalidContent { file, error })) => {
                assert_eq!(file, "blk00000.dat");
                assert_eq!(
                    error,
                    ContentError::MagicMismatch { expected: 0xD9B4_BEF9, found: 0x0709_110B }
                );
            }
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(blocks.next().is_none());
    }

    #[test]
    fn test_configured_magic_is_used() {
        let data = 0x0709_110Bu32.to_le_bytes().to_vec();
        let files = vec![BlockchainFile::new("blk00000.dat", Cursor::new(data))];
        let config = ParserConfig::default().with_magic(0x0709_110B);

        let mut blocks = BlockchainParser::from_files(files).with_config(config).blocks();
        // The magic matches, so the failure is the missing length field
        assert!(matches!(
            blocks.next(),
            Some(Err(ParserError::InvalidContent {
                error: ContentError::TruncatedRecord { expected: 4, available: 0 },
                ..
            }))
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let mut data = 0xD9B4_BEF9u32.to_le_bytes().to_vec();
        data.extend_from_slice(&285u32.to_le_bytes());
        data.extend_from_slice(&[0x01; 100]);
        let files = vec![BlockchainFile::new("blk00003.dat", Cursor::new(data))];

        let mut blocks = BlockchainParser::from_files(files).blocks();
        assert!(matches!(
            blocks.next(),
            Some(Err(ParserError::InvalidContent {
                error: ContentError::TruncatedRecord { expected: 285, available: 100 },
                ..
            }))
        ));
        assert!(blocks.next().is_none());
    }
}
