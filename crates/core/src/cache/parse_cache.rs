use crate::{
    error::{Error, Result},
    parser::{FileSyntax, RustParser},
};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Cache handle shared between a snapshot and the snapshots derived from it
pub type SharedParseCache = Arc<Mutex<ParseCache>>;

/// Extracted syntax keyed by the md5 hash of the file content.
///
/// Keying by content rather than path means a rebuilt snapshot only re-parses
/// the files an edit plan actually touched.
pub struct ParseCache {
    entries: LruCache<String, Arc<FileSyntax>>,
    parser: RustParser,
    hits: usize,
    misses: usize,
}

impl ParseCache {
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| Error::ConfigError("cache capacity must be non-zero".to_string()))?;
        Ok(Self {
            entries: LruCache::new(capacity),
            parser: RustParser::new()?,
            hits: 0,
            misses: 0,
        })
    }

    pub fn shared(capacity: usize) -> Result<SharedParseCache> {
        Ok(Arc::new(Mutex::new(Self::new(capacity)?)))
    }

    pub fn get_or_parse(&mut self, source: &str) -> Result<Arc<FileSyntax>> {
        let hash = content_hash(source);
        if let Some(syntax) = self.entries.get(&hash) {
            self.hits += 1;
            return Ok(Arc::clone(syntax));
        }

        self.misses += 1;
        let syntax = Arc::new(self.parser.extract(source)?);
        self.entries.put(hash, Arc::clone(&syntax));
        Ok(syntax)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn content_hash(source: &str) -> String {
    format!("{:x}", md5::compute(source.as_bytes()))
}
