//! Font sources
//!
//! A font source turns a URI into a readable, seekable byte stream. Local
//! files and in-memory buffers are supported out of the box; anything else
//! can be plugged in through [`FontSourceFactory`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use url::Url;

/// Byte stream over a font file
pub trait FontStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> FontStream for T {}

/// A font file location
pub trait FontSource: Send + Sync {
    fn uri(&self) -> &str;

    /// Fails when the source cannot be opened
    fn test_openable(&self) -> io::Result<()> {
        self.open().map(drop)
    }

    fn open(&self) -> io::Result<Box<dyn FontStream>>;

    /// Modification time of the underlying file
    fn last_write_time(&self) -> io::Result<SystemTime>;
}

/// Creates font sources from URIs
pub trait FontSourceFactory: Send + Sync {
    fn create(&self, uri: &str) -> io::Result<Arc<dyn FontSource>>;
}

/// Font file on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFontSource {
    uri: String,
    path: PathBuf,
}

impl LocalFontSource {
    /// Accepts a plain path or a `file://` URI
    pub fn new(uri: &str) -> io::Result<Self> {
        match Url::parse(uri) {
            Ok(url) if url.scheme() == "file" => Ok(Self { uri: uri.to_owned(), path: file_path(&url)? }),
            _ => Ok(Self { uri: uri.to_owned(), path: PathBuf::from(uri) }),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let uri = file_uri(&path).unwrap_or_else(|| path.display().to_string());
        Self { uri, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FontSource for LocalFontSource {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn open(&self) -> io::Result<Box<dyn FontStream>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn last_write_time(&self) -> io::Result<SystemTime> {
        std::fs::metadata(&self.path)?.modified()
    }
}

/// `file://` URI of an absolute path
pub fn file_uri(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(String::from)
}

/// Local path of a `file://` URL, percent-decoded. Only empty and
/// `localhost` hosts are local.
fn file_path(url: &Url) -> io::Result<PathBuf> {
    url.to_file_path().map_err(|()| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("not a local file URI: {url}"))
    })
}

/// Font data held in memory
#[derive(Debug, Clone)]
pub struct MemoryFontSource {
    uri: String,
    data: Arc<[u8]>,
    modified: SystemTime,
}

impl MemoryFontSource {
    pub fn new(uri: &str, data: impl Into<Arc<[u8]>>) -> Self {
        Self { uri: uri.to_owned(), data: data.into(), modified: SystemTime::now() }
    }

    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }
}

/// Cursor that shares the source buffer instead of copying it
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FontSource for MemoryFontSource {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn open(&self) -> io::Result<Box<dyn FontStream>> {
        Ok(Box::new(Cursor::new(SharedBytes(Arc::clone(&self.data)))))
    }

    fn last_write_time(&self) -> io::Result<SystemTime> {
        Ok(self.modified)
    }
}

/// Resolves `file://` URIs and plain paths to [`LocalFontSource`] and
/// `memory://` URIs to buffers registered with [`register`](Self::register).
#[derive(Default)]
pub struct DefaultFontSourceFactory {
    memory: Mutex<HashMap<String, MemoryFontSource>>,
    next_key: AtomicU64,
}

impl DefaultFontSourceFactory {
    pub const MEMORY_SCHEME: &'static str = "memory://";

    pub fn new() -> Self {
        Self::default()
    }

    /// Register in-memory font data, returning its `memory://` URI
    pub fn register(&self, data: impl Into<Arc<[u8]>>) -> String {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        let uri = format!("{}{key}", Self::MEMORY_SCHEME);
        self.register_as(&uri, data);
        uri
    }

    /// Register in-memory font data under a caller-chosen `memory://` URI
    pub fn register_as(&self, uri: &str, data: impl Into<Arc<[u8]>>) {
        let source = MemoryFontSource::new(uri, data);
        self.memory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri.to_owned(), source);
    }

    pub fn unregister(&self, uri: &str) -> bool {
        self.memory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(uri)
            .is_some()
    }
}

impl FontSourceFactory for DefaultFontSourceFactory {
    fn create(&self, uri: &str) -> io::Result<Arc<dyn FontSource>> {
        if uri.starts_with(Self::MEMORY_SCHEME) {
            let memory = self.memory.lock().unwrap_or_else(PoisonError::into_inner);
            return match memory.get(uri) {
                Some(source) => Ok(Arc::new(source.clone())),
                None => Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no font data registered for {uri}"),
                )),
            };
        }

        match Url::parse(uri) {
            Ok(url) if url.scheme() == "file" => {
                Ok(Arc::new(LocalFontSource { uri: uri.to_owned(), path: file_path(&url)? }))
            }
            // One-letter schemes are Windows drive letters.
            Ok(url) if url.scheme().len() > 1 => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported font URI scheme: {}", url.scheme()),
            )),
            _ => Ok(Arc::new(LocalFontSource::from_path(uri))),
        }
    }
}

impl std::fmt::Debug for DefaultFontSourceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered = self.memory.lock().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_struct("DefaultFontSourceFactory")
            .field("registered", &registered)
            .finish()
    }
}
