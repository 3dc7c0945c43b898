//! Label arrays and the `.npy` reader that produces them.
//!
//! Only what a label file needs is supported: NumPy format versions 1–3,
//! boolean / integer / float dtypes of either byte order, any shape.
//! Multi-dimensional arrays are flattened in storage order and a 0-d array
//! becomes a one-element sequence. Every read or parse failure surfaces as
//! [`Error::Acquisition`], so callers can fall back the same way they do
//! for a missing file.

use std::path::Path;

use crate::error::{Error, Result};

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Ordered sequence of ground-truth labels (0 = normal, 1 = abnormal).
///
/// Values are kept as read; nothing here checks that they are binary.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelArray {
    values: Vec<f64>,
}

impl LabelArray {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Read a `.npy` file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::acquisition(format!("read {}: {e}", path.display())))?;
        Self::from_npy_bytes(&bytes)
            .map_err(|e| Error::acquisition(format!("{}: {}", path.display(), reason_of(e))))
    }

    /// Parse an in-memory `.npy` payload.
    pub fn from_npy_bytes(bytes: &[u8]) -> Result<Self> {
        let header = parse_header(bytes)?;
        let width = header.dtype.width;
        let need = header
            .shape
            .iter()
            .try_fold(width, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| Error::acquisition("npy shape overflows"))?;
        let body = &bytes[header.data_offset..];
        if body.len() < need {
            return Err(Error::acquisition(format!(
                "npy data truncated: need {need} bytes, have {}",
                body.len()
            )));
        }
        let values = body[..need]
            .chunks_exact(width)
            .map(|chunk| header.dtype.decode(chunk))
            .collect();
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of entries equal to `1`.
    pub fn abnormal_count(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1.0).count()
    }
}

impl From<Vec<f64>> for LabelArray {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<&[u8]> for LabelArray {
    fn from(values: &[u8]) -> Self {
        Self::new(values.iter().map(|&v| f64::from(v)).collect())
    }
}

fn reason_of(e: Error) -> String {
    match e {
        Error::Acquisition { reason } => reason,
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Bool,
    Int,
    UInt,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dtype {
    kind: Kind,
    width: usize,
    big_endian: bool,
}

impl Dtype {
    fn parse(descr: &str) -> Result<Self> {
        let mut chars = descr.chars();
        let order = chars
            .next()
            .ok_or_else(|| Error::acquisition("npy descr is empty"))?;
        let big_endian = match order {
            '<' | '|' => false,
            '>' => true,
            '=' => cfg!(target_endian = "big"),
            _ => return Err(Error::acquisition(format!("npy descr {descr:?} has no byte order"))),
        };
        let kind = match chars.next() {
            Some('b') => Kind::Bool,
            Some('i') => Kind::Int,
            Some('u') => Kind::UInt,
            Some('f') => Kind::Float,
            _ => return Err(Error::acquisition(format!("unsupported npy dtype {descr:?}"))),
        };
        let width: usize = chars
            .as_str()
            .parse()
            .map_err(|_| Error::acquisition(format!("bad npy dtype width in {descr:?}")))?;
        let ok = match kind {
            Kind::Bool => width == 1,
            Kind::Int | Kind::UInt => matches!(width, 1 | 2 | 4 | 8),
            Kind::Float => matches!(width, 4 | 8),
        };
        if !ok {
            return Err(Error::acquisition(format!("unsupported npy dtype {descr:?}")));
        }
        Ok(Self {
            kind,
            width,
            big_endian,
        })
    }

    fn decode(&self, chunk: &[u8]) -> f64 {
        let big = self.big_endian;
        macro_rules! num {
            ($t:ty, $w:literal) => {{
                let mut raw = [0u8; $w];
                raw.copy_from_slice(chunk);
                if big {
                    <$t>::from_be_bytes(raw) as f64
                } else {
                    <$t>::from_le_bytes(raw) as f64
                }
            }};
        }
        match (self.kind, self.width) {
            (Kind::Bool, _) => f64::from(u8::from(chunk[0] != 0)),
            (Kind::Int, 1) => f64::from(chunk[0] as i8),
            (Kind::Int, 2) => num!(i16, 2),
            (Kind::Int, 4) => num!(i32, 4),
            (Kind::Int, _) => num!(i64, 8),
            (Kind::UInt, 1) => f64::from(chunk[0]),
            (Kind::UInt, 2) => num!(u16, 2),
            (Kind::UInt, 4) => num!(u32, 4),
            (Kind::UInt, _) => num!(u64, 8),
            (Kind::Float, 4) => num!(f32, 4),
            (Kind::Float, _) => num!(f64, 8),
        }
    }
}

#[derive(Debug)]
struct Header {
    dtype: Dtype,
    shape: Vec<usize>,
    data_offset: usize,
}

fn parse_header(bytes: &[u8]) -> Result<Header> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        let hint = if bytes.starts_with(b"PK\x03\x04") {
            " (looks like a zip archive)"
        } else {
            ""
        };
        return Err(Error::acquisition(format!("not an npy file{hint}")));
    }
    let major = bytes[6];
    let (header_len, start) = match major {
        1 => (usize::from(u16::from_le_bytes([bytes[8], bytes[9]])), 10usize),
        2 | 3 if bytes.len() >= 12 => (
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
            12,
        ),
        _ => return Err(Error::acquisition(format!("unsupported npy version {major}"))),
    };
    let end = start
        .checked_add(header_len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| Error::acquisition("npy header truncated"))?;
    let text = std::str::from_utf8(&bytes[start..end])
        .map_err(|_| Error::acquisition("npy header is not valid text"))?;

    let descr = quoted_value(text, "descr")?;
    let dtype = Dtype::parse(descr)?;
    let shape = shape_value(text)?;
    Ok(Header {
        dtype,
        shape,
        data_offset: end,
    })
}

fn value_after<'a>(text: &'a str, key: &str) -> Result<&'a str> {
    for quote in ['\'', '"'] {
        let needle = format!("{quote}{key}{quote}");
        if let Some(pos) = text.find(&needle) {
            let rest = text[pos + needle.len()..].trim_start();
            if let Some(rest) = rest.strip_prefix(':') {
                return Ok(rest.trim_start());
            }
        }
    }
    Err(Error::acquisition(format!("npy header has no {key:?} entry")))
}

fn quoted_value<'a>(text: &'a str, key: &str) -> Result<&'a str> {
    let rest = value_after(text, key)?;
    let quote = rest
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| Error::acquisition(format!("npy {key:?} is not a string")))?;
    let inner = &rest[1..];
    let close = inner
        .find(quote)
        .ok_or_else(|| Error::acquisition(format!("npy {key:?} is unterminated")))?;
    Ok(&inner[..close])
}

fn shape_value(text: &str) -> Result<Vec<usize>> {
    let rest = value_after(text, "shape")?;
    let inner = rest
        .strip_prefix('(')
        .and_then(|r| r.find(')').map(|close| &r[..close]))
        .ok_or_else(|| Error::acquisition("npy shape is not a tuple"))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| Error::acquisition(format!("bad npy shape entry {s:?}")))
        })
        .collect()
}

/// Wrap raw little-endian element bytes in a version-1 `.npy` header.
///
/// `shape` is the tuple text as NumPy writes it, e.g. `"(4,)"` or `"()"`.
#[doc(hidden)]
pub fn npy_v1_bytes(descr: &str, shape: &str, data: &[u8]) -> Vec<u8> {
    let mut header = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}");
    while (MAGIC.len() + 4 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');
    let mut out = Vec::with_capacity(MAGIC.len() + 4 + header.len() + data.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(data);
    out
}
