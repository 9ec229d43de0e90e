//! Font file streams
//!
//! The shaping engine reads font data in fragments, possibly from several
//! threads at once. [`FontFileStream`] serializes the seek+read pair so a
//! fragment is never torn by a concurrent reader.

use std::io::{Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::source::{FontSource, FontSourceFactory, FontStream};
use crate::{Result, ShapingError};

/// 100 ns ticks between 1601-01-01 and 1970-01-01
const FILETIME_UNIX_EPOCH: u64 = 116_444_736_000_000_000;

/// Convert to 100 ns ticks since 1601-01-01 UTC
fn to_filetime(time: SystemTime) -> Option<u64> {
    let ticks = |d: Duration| -> Option<u64> {
        u64::try_from(d.as_nanos() / 100).ok()
    };
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => ticks(after)?.checked_add(FILETIME_UNIX_EPOCH),
        Err(before) => FILETIME_UNIX_EPOCH.checked_sub(ticks(before.duration())?),
    }
}

/// Random-access reader over one font file
pub struct FontFileStream {
    stream: Mutex<Box<dyn FontStream>>,
    length: u64,
    last_write_time: Option<u64>,
}

impl FontFileStream {
    /// Open `source` and cache its length and modification time
    pub fn new(source: &dyn FontSource) -> Result<Self> {
        let mut stream = source.open()?;
        let length = stream.seek(SeekFrom::End(0))?;
        let last_write_time = source.last_write_time().ok().and_then(to_filetime);

        Ok(Self { stream: Mutex::new(stream), length, last_write_time })
    }

    /// File length in bytes
    pub fn file_size(&self) -> u64 {
        self.length
    }

    /// Modification time in 100 ns ticks since 1601-01-01 UTC
    pub fn last_write_time(&self) -> Result<u64> {
        self.last_write_time.ok_or_else(|| {
            ShapingError::InvalidOperation("font source has no last write time".into())
        })
    }

    /// Read `size` bytes starting at `offset`
    pub fn read_fragment(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        let out_of_bounds =
            || ShapingError::FragmentOutOfBounds { offset, size, length: self.length };

        if size > i32::MAX as u64 || offset > i64::MAX as u64 {
            return Err(out_of_bounds());
        }
        let end = offset.checked_add(size).ok_or_else(out_of_bounds)?;
        if end > self.length {
            return Err(out_of_bounds());
        }

        // `size` fits in an i32, so the cast is lossless.
        let mut buffer = vec![0u8; size as usize];
        let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        stream.seek(SeekFrom::Start(offset))?;
        stream.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Read the whole file
    pub fn read_all(&self) -> Result<Vec<u8>> {
        self.read_fragment(0, self.length)
    }
}

impl std::fmt::Debug for FontFileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFileStream")
            .field("length", &self.length)
            .field("last_write_time", &self.last_write_time)
            .finish()
    }
}

/// Turns font file keys (URIs) into streams
#[derive(Clone)]
pub struct FontFileLoader {
    sources: Arc<dyn FontSourceFactory>,
}

impl FontFileLoader {
    pub fn new(sources: Arc<dyn FontSourceFactory>) -> Self {
        Self { sources }
    }

    pub fn create_stream_from_key(&self, key: &str) -> Result<FontFileStream> {
        if key.is_empty() {
            return Err(ShapingError::InvalidArgument("empty font file key".into()));
        }
        let source = self.sources.create(key)?;
        FontFileStream::new(source.as_ref())
    }

    /// Check that `key` resolves to an openable source
    pub fn test_openable(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(ShapingError::InvalidArgument("empty font file key".into()));
        }
        let source = self.sources.create(key)?;
        source
            .test_openable()
            .map_err(|e| ShapingError::FontSource(format!("{key}: {e}")))
    }
}

impl std::fmt::Debug for FontFileLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFileLoader").finish_non_exhaustive()
    }
}

/// An opened font file
#[derive(Debug, Clone)]
pub struct FontFile {
    uri: Arc<str>,
    stream: Arc<FontFileStream>,
}

impl FontFile {
    pub fn new(uri: &str, stream: FontFileStream) -> Self {
        Self { uri: uri.into(), stream: Arc::new(stream) }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn stream(&self) -> &FontFileStream {
        &self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::source::{DefaultFontSourceFactory, MemoryFontSource};

    fn stream(bytes: &[u8]) -> FontFileStream {
        let source = MemoryFontSource::new("memory://test", bytes.to_vec());
        FontFileStream::new(&source).unwrap()
    }

    #[test]
    fn test_read_fragment() {
        let stream = stream(b"0123456789");
        assert_eq!(stream.file_size(), 10);
        assert_eq!(stream.read_fragment(3, 4).unwrap(), b"3456");
        assert_eq!(stream.read_fragment(10, 0).unwrap(), b"");
        assert_eq!(stream.read_all().unwrap(), b"0123456789");
    }

    #[test]
    fn test_read_fragment_bounds() {
        let stream = stream(b"0123456789");
        assert!(matches!(
            stream.read_fragment(8, 3),
            Err(ShapingError::FragmentOutOfBounds { offset: 8, size: 3, length: 10 })
        ));
        assert!(matches!(
            stream.read_fragment(0, i32::MAX as u64 + 1),
            Err(ShapingError::FragmentOutOfBounds { .. })
        ));
        assert!(matches!(
            stream.read_fragment(i64::MAX as u64 + 1, 1),
            Err(ShapingError::FragmentOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_last_write_time_is_filetime() {
        let stream = stream(b"abc");
        let ticks = stream.last_write_time().unwrap();
        assert!(ticks > FILETIME_UNIX_EPOCH);
    }

    #[test]
    fn test_filetime_conversion() {
        assert_eq!(to_filetime(UNIX_EPOCH), Some(FILETIME_UNIX_EPOCH));
        assert_eq!(
            to_filetime(UNIX_EPOCH + Duration::from_secs(1)),
            Some(FILETIME_UNIX_EPOCH + 10_000_000)
        );
    }

    #[test]
    fn test_loader_rejects_empty_key() {
        let loader = FontFileLoader::new(Arc::new(DefaultFontSourceFactory::new()));
        assert!(matches!(
            loader.create_stream_from_key(""),
            Err(ShapingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_loader_memory_key() {
        let sources = Arc::new(DefaultFontSourceFactory::new());
        let uri = sources.register(b"font bytes".to_vec());
        let loader = FontFileLoader::new(sources);

        let stream = loader.create_stream_from_key(&uri).unwrap();
        assert_eq!(stream.file_size(), 10);
        assert!(loader.test_openable(&uri).is_ok());
        assert!(loader.test_openable("memory://missing").is_err());
    }

    #[test]
    fn test_concurrent_fragments() {
        let bytes: Vec<u8> = (0..=255).collect();
        let stream = Arc::new(stream(&bytes));

        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let stream = Arc::clone(&stream);
                std::thread::spawn(move || {
                    for i in 0..100u64 {
                        let offset = (t * 31 + i) % 250;
                        let fragment = stream.read_fragment(offset, 4).unwrap();
                        assert_eq!(fragment[0] as u64, offset);
                        assert_eq!(fragment[3] as u64, offset + 3);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
