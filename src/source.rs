//! Where OBO text comes from, how relative imports are resolved against it,
//! and the cache of documents already loaded by import.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::error::{OboError, Result};
use crate::model::SharedDocument;

lazy_static! {
    static ref URL_ISH: Regex = Regex::new(r"^(https?|file):").expect("static pattern");
}

/// True for locations that are already absolute URLs.
pub fn is_url_ish(location: &str) -> bool {
    URL_ISH.is_match(location)
}

// ------------- Source -------------
pub enum Source {
    Path(PathBuf),
    Url(Url),
    Reader(Box<dyn BufRead>),
}

impl Source {
    /// Picks a URL for `http:`, `https:` and `file:` locations, a path for
    /// everything else.
    pub fn from_location(location: &str) -> Result<Self> {
        if is_url_ish(location) {
            let url = Url::parse(location).map_err(|e| OboError::Io {
                location: location.to_owned(),
                source: io::Error::new(io::ErrorKind::InvalidInput, e),
            })?;
            Ok(Source::Url(url))
        } else {
            Ok(Source::Path(PathBuf::from(location)))
        }
    }
    /// Location used to resolve relative imports, if the source has one.
    pub fn location(&self) -> Option<Location> {
        match self {
            Source::Path(path) => Some(Location::File(path.clone())),
            Source::Url(url) => Some(Location::Url(url.clone())),
            Source::Reader(_) => None,
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Source::Path(path) => write!(f, "Path({})", path.display()),
            Source::Url(url) => write!(f, "Url({})", url),
            Source::Reader(_) => write!(f, "Reader"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Url(Url),
}

/// Resolves an import path against the location of the importing document.
/// URL-like paths and paths read without a known location are returned as
/// they are.
pub fn resolve_import(path: &str, location: Option<&Location>) -> String {
    if is_url_ish(path) {
        return path.to_owned();
    }
    match location {
        Some(Location::Url(base)) => match base.join(path) {
            Ok(url) => url.to_string(),
            Err(_) => path.to_owned(),
        },
        Some(Location::File(file)) => {
            let dir = file.parent().unwrap_or_else(|| Path::new(""));
            let joined = dir.join(path);
            let absolute = std::path::absolute(&joined).unwrap_or(joined);
            match Url::from_file_path(&absolute) {
                Ok(url) => url.to_string(),
                Err(_) => absolute.to_string_lossy().into_owned(),
            }
        }
        None => path.to_owned(),
    }
}

/// Absolute form of a location, as used for import cache keys.
pub fn location_key(location: &Location) -> String {
    match location {
        Location::Url(url) => url.to_string(),
        Location::File(path) => {
            let absolute = std::path::absolute(path).unwrap_or_else(|_| path.clone());
            match Url::from_file_path(&absolute) {
                Ok(url) => url.to_string(),
                Err(_) => absolute.to_string_lossy().into_owned(),
            }
        }
    }
}

// ------------- Providers -------------
/// Opens the bytes behind a path or URL. The default provider reads local
/// files only; network access is the business of a custom provider.
pub trait SourceProvider {
    fn open_path(&self, path: &Path) -> io::Result<Box<dyn BufRead>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
    fn open_url(&self, url: &Url) -> io::Result<Box<dyn BufRead>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FileProvider;

impl SourceProvider for FileProvider {
    fn open_url(&self, url: &Url) -> io::Result<Box<dyn BufRead>> {
        if url.scheme() == "file" {
            let path = url.to_file_path().map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("not a local file: {}", url))
            })?;
            return self.open_path(&path);
        }
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no provider registered for {} URLs", url.scheme()),
        ))
    }
}

// ------------- Import cache -------------
#[derive(Default)]
struct CacheState {
    documents: HashMap<String, SharedDocument>,
    in_flight: HashSet<String>,
}

/// Resolved import location to parsed document, shared by every parser
/// spawned while following imports of one top-level parse. Cloning shares
/// the same underlying map. Not meant for concurrent use.
#[derive(Clone, Default)]
pub struct ImportCache {
    state: Rc<RefCell<CacheState>>,
}

impl ImportCache {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, key: &str) -> Option<SharedDocument> {
        self.state.borrow().documents.get(key).cloned()
    }
    /// Stores a document, returning true if the key was new.
    pub fn insert(&self, key: impl Into<String>, doc: SharedDocument) -> bool {
        self.state.borrow_mut().documents.insert(key.into(), doc).is_none()
    }
    pub fn contains(&self, key: &str) -> bool {
        self.state.borrow().documents.contains_key(key)
    }
    pub fn len(&self) -> usize {
        self.state.borrow().documents.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Marks a location as being parsed. Returns false if it already is,
    /// which means the imports form a cycle.
    pub(crate) fn begin(&self, key: &str) -> bool {
        self.state.borrow_mut().in_flight.insert(key.to_owned())
    }
    pub(crate) fn finish(&self, key: &str) {
        self.state.borrow_mut().in_flight.remove(key);
    }
}

impl fmt::Debug for ImportCache {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ImportCache")
            .field("documents", &state.documents.keys().collect::<Vec<_>>())
            .field("in_flight", &state.in_flight)
            .finish()
    }
}
