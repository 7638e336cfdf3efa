//! Lazy byte-sequence producers: the `Literal`, `Generate` and `File`
//! value variants, and the `ByteSource` capability they all realize into.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;

use crate::datatype::{Datatype, SizeUnit};
use crate::error::FileAccessDenied;
use crate::escape;
use crate::settings::Settings;

/// A realized, indexable, sliceable byte sequence of known length.
///
/// Three concrete implementations exist: [`LiteralGenerator`],
/// [`RandomGenerator`] and [`FileGenerator`]. Only `RandomGenerator`
/// returns different bytes across repeated reads — that's intentional,
/// tests that need reproducibility call [`Value::freeze`] first.
pub trait ByteSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes `[a, b)`, with `b` clamped to `len()`.
    fn slice(&self, a: usize, b: usize) -> Vec<u8>;

    /// The full content, equivalent to `slice(0, len())`.
    fn all(&self) -> Vec<u8> {
        self.slice(0, self.len())
    }
}

/// Owns already-decoded literal bytes.
#[derive(Debug, Clone)]
pub struct LiteralGenerator(Arc<[u8]>);

impl LiteralGenerator {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> LiteralGenerator {
        LiteralGenerator(bytes.into())
    }
}

impl ByteSource for LiteralGenerator {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn slice(&self, a: usize, b: usize) -> Vec<u8> {
        let b = b.min(self.0.len());
        self.0[a..b].to_vec()
    }
}

/// Draws fresh bytes from a fixed charset on every access.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    datatype: Datatype,
    length: usize,
}

impl RandomGenerator {
    pub fn new(datatype: Datatype, length: usize) -> RandomGenerator {
        RandomGenerator { datatype, length }
    }
}

impl ByteSource for RandomGenerator {
    fn len(&self) -> usize {
        self.length
    }

    fn slice(&self, a: usize, b: usize) -> Vec<u8> {
        let b = b.min(self.length);
        if a >= b {
            return Vec::new();
        }
        let charset = self.datatype.charset();
        let mut rng = rand::thread_rng();
        (a..b)
            .map(|_| charset.nth(rng.gen_range(0..charset.len())))
            .collect()
    }
}

/// A scoped, read-only view of a file's contents.
///
/// The file is read in full at construction time (this crate has no
/// `mmap`-family dependency, see `DESIGN.md`) and released when the
/// generator is dropped.
#[derive(Debug, Clone)]
pub struct FileGenerator {
    path: PathBuf,
    data: Arc<[u8]>,
}

impl FileGenerator {
    /// Resolve `requested` against `settings.staticdir` and enforce the
    /// file-access policy described in `spec.md` §5, without reading the
    /// file's content: `staticdir` must be configured, the resolved path
    /// must stay within it unless `unconstrained_file_access` is set, and
    /// it must name a readable regular file. Returns the resolved path
    /// and its size, from `stat` metadata alone.
    ///
    /// Split out from `open` so [`Value::byte_len`] can satisfy the
    /// "length without materializing bytes" invariant for `File` values
    /// too, not just `Literal`/`Generate`.
    fn validate(requested: &str, settings: &Settings) -> Result<(PathBuf, u64), FileAccessDenied> {
        let staticdir = settings
            .staticdir
            .as_ref()
            .ok_or(FileAccessDenied::Disabled)?;
        let staticdir = fs::canonicalize(staticdir)
            .unwrap_or_else(|_| PathBuf::from(staticdir));

        let expanded = expand_tilde(requested);
        let joined = staticdir.join(expanded);
        let resolved = normalize(&joined);

        if !settings.unconstrained_file_access && !resolved.starts_with(&staticdir) {
            debug!("file path {:?} resolves outside staticdir {:?}", resolved, staticdir);
            return Err(FileAccessDenied::Outside(requested.to_string()));
        }

        let meta = fs::metadata(&resolved).map_err(|e| {
            FileAccessDenied::NotReadable(requested.to_string(), e)
        })?;
        if !meta.is_file() {
            return Err(FileAccessDenied::NotReadable(
                requested.to_string(),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        Ok((resolved, meta.len()))
    }

    /// Validate and read `path` in full, enforcing the same policy as
    /// [`FileGenerator::validate`].
    pub fn open(requested: &str, settings: &Settings) -> Result<FileGenerator, FileAccessDenied> {
        let (resolved, _) = FileGenerator::validate(requested, settings)?;
        let data = fs::read(&resolved).map_err(|e| {
            FileAccessDenied::NotReadable(requested.to_string(), e)
        })?;
        Ok(FileGenerator { path: resolved, data: data.into() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileGenerator {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn slice(&self, a: usize, b: usize) -> Vec<u8> {
        let b = b.min(self.data.len());
        self.data[a..b].to_vec()
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// A minimal `normpath(abspath(...))`: collapses `.` and `..` components
/// lexically, without touching the filesystem (the path may not exist
/// yet at the point we need to check containment).
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// A value token: one of `Literal`, `Generate` or `File`.
///
/// A `Value`'s length is always computable without materializing its
/// bytes (`spec.md` §3.1's core invariant); [`Value::byte_len`] never
/// reads random bytes and only touches file metadata, not file content.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Vec<u8>),
    Generate { size: u64, unit: SizeUnit, datatype: Datatype },
    File(String),
}

impl Value {
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Value {
        Value::Literal(bytes.into())
    }

    /// The length of this value's byte sequence, without materializing
    /// random bytes or reading a file's content (only its metadata).
    pub fn byte_len(&self, settings: &Settings) -> Result<u64, FileAccessDenied> {
        match *self {
            Value::Literal(ref bytes) => Ok(bytes.len() as u64),
            Value::Generate { size, unit, .. } => Ok(size * unit.multiplier()),
            Value::File(ref path) => Ok(FileGenerator::validate(path, settings)?.1),
        }
    }

    /// Realize this value into a [`ByteSource`]. For `File`, this is
    /// where the access policy is enforced and the file content read.
    pub fn get_generator(&self, settings: &Settings) -> Result<Box<dyn ByteSource>, FileAccessDenied> {
        match *self {
            Value::Literal(ref bytes) => {
                Ok(Box::new(LiteralGenerator::new(bytes.clone())))
            }
            Value::Generate { size, unit, datatype } => {
                let len = (size * unit.multiplier()) as usize;
                Ok(Box::new(RandomGenerator::new(datatype, len)))
            }
            Value::File(ref path) => {
                Ok(Box::new(FileGenerator::open(path, settings)?))
            }
        }
    }

    /// Fix any random content into a `Literal`, leaving `File` and
    /// already-`Literal` values untouched (a frozen message contains no
    /// `Generate` values, per `spec.md` invariant 10).
    pub fn freeze(&self, settings: &Settings) -> Result<Value, FileAccessDenied> {
        match *self {
            Value::Generate { .. } => {
                let bytes = self.get_generator(settings)?.all();
                Ok(Value::Literal(bytes))
            }
            ref other => Ok(other.clone()),
        }
    }

    /// A parseable specification for this value: `parse(v.spec())`
    /// yields a `Value` equal to `v`.
    pub fn spec(&self) -> String {
        match *self {
            Value::Literal(ref bytes) => format!("'{}'", escape::encode(bytes, b'\'')),
            Value::Generate { size, unit, datatype } => {
                let mut s = format!("@{}", size);
                if unit != SizeUnit::Bytes {
                    s.push(unit.letter());
                }
                if datatype != Datatype::Bytes {
                    s.push(',');
                    s.push_str(datatype.keyword().unwrap());
                }
                s
            }
            Value::File(ref path) => format!("<'{}'", escape::encode(path.as_bytes(), b'\'')),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.spec())
    }
}
