//! # ``NumPy`` ``.npy`` Matrix IO
//!
//! Writes version 1.0 files with ``'descr': '<f4'``; reads versions 1.0 to
//! 3.0 holding 2-d ``f4`` / ``f8`` data in either byte order and either
//! memory order. ``f8`` data is narrowed to ``f32``.

use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

use crate::{
    embeddings::EmbeddingMatrix,
    errors::{StanzaError, StanzaResult},
    io::write_file_atomic,
};

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Header + preamble length is padded to a multiple of this.
const NPY_ALIGN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Dtype {
    F4 { little: bool },
    F8 { little: bool },
}

impl Dtype {
    fn parse(descr: &str) -> StanzaResult<Self> {
        Ok(match descr {
            "<f4" => Dtype::F4 { little: true },
            ">f4" => Dtype::F4 { little: false },
            "<f8" => Dtype::F8 { little: true },
            ">f8" => Dtype::F8 { little: false },
            _ => {
                return Err(StanzaError::Parse(format!(
                    "unsupported npy dtype {descr:?}"
                )));
            }
        })
    }

    fn size(self) -> usize {
        match self {
            Dtype::F4 { .. } => 4,
            Dtype::F8 { .. } => 8,
        }
    }

    fn decode(
        self,
        bytes: &[u8],
    ) -> f32 {
        match self {
            Dtype::F4 { little } => {
                let b: [u8; 4] = [bytes[0], bytes[1], bytes[2], bytes[3]];
                if little {
                    f32::from_le_bytes(b)
                } else {
                    f32::from_be_bytes(b)
                }
            }
            Dtype::F8 { little } => {
                let mut b = [0u8; 8];
                b.copy_from_slice(&bytes[..8]);
                let v = if little {
                    f64::from_le_bytes(b)
                } else {
                    f64::from_be_bytes(b)
                };
                v as f32
            }
        }
    }
}

#[derive(Debug, PartialEq)]
struct NpyHeader {
    dtype: Dtype,
    fortran_order: bool,
    shape: (usize, usize),
}

/// The text following `'key':` in a header dict literal.
fn dict_value<'a>(
    header: &'a str,
    key: &str,
) -> StanzaResult<&'a str> {
    let pat = format!("'{key}':");
    header
        .find(&pat)
        .map(|pos| header[pos + pat.len()..].trim_start())
        .ok_or_else(|| StanzaError::Parse(format!("npy header missing {key:?}: {header}")))
}

fn parse_header(header: &str) -> StanzaResult<NpyHeader> {
    let descr = dict_value(header, "descr")?;
    let descr = descr
        .strip_prefix('\'')
        .and_then(|d| d.split('\'').next())
        .ok_or_else(|| StanzaError::Parse(format!("bad npy descr: {header}")))?;
    let dtype = Dtype::parse(descr)?;

    let fortran_order = dict_value(header, "fortran_order")?.starts_with("True");

    let shape = dict_value(header, "shape")?;
    let dims = shape
        .strip_prefix('(')
        .and_then(|s| s.split(')').next())
        .ok_or_else(|| StanzaError::Parse(format!("bad npy shape: {header}")))?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|e| StanzaError::Parse(format!("bad npy dim {s:?}: {e}")))
        })
        .collect::<StanzaResult<Vec<usize>>>()?;

    let shape = match dims.as_slice() {
        &[rows, dim] => (rows, dim),
        _ => {
            return Err(StanzaError::ShapeMismatch(format!(
                "expected a 2-d npy array, found shape {dims:?}"
            )));
        }
    };

    Ok(NpyHeader {
        dtype,
        fortran_order,
        shape,
    })
}

/// Write an [`EmbeddingMatrix`] as a version 1.0 ``.npy`` stream.
pub fn write_npy_matrix<W: Write>(
    matrix: &EmbeddingMatrix,
    writer: &mut W,
) -> StanzaResult<()> {
    let mut header = format!(
        "{{'descr': '<f4', 'fortran_order': False, 'shape': ({}, {}), }}",
        matrix.rows(),
        matrix.dim()
    );
    // magic + version + u16 length + header + '\n'
    let unpadded = NPY_MAGIC.len() + 2 + 2 + header.len() + 1;
    let padding = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
    header.extend(std::iter::repeat_n(' ', padding));
    header.push('\n');

    let header_len = u16::try_from(header.len())
        .map_err(|_| StanzaError::Parse("npy header too long".to_string()))?;

    writer.write_all(NPY_MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(header.as_bytes())?;

    let mut buf = Vec::with_capacity(matrix.as_slice().len() * 4);
    for x in matrix.as_slice() {
        buf.extend_from_slice(&x.to_le_bytes());
    }
    writer.write_all(&buf)?;
    Ok(())
}

/// Read exactly `len` bytes; the buffer only grows with bytes actually read.
fn read_up_to<R: Read>(
    reader: &mut R,
    len: usize,
    what: &str,
) -> StanzaResult<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(StanzaError::Parse(format!(
            "truncated npy {what}: expected {len} bytes, found {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Read an [`EmbeddingMatrix`] from a ``.npy`` stream.
pub fn read_npy_matrix<R: Read>(reader: &mut R) -> StanzaResult<EmbeddingMatrix> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if &magic != NPY_MAGIC {
        return Err(StanzaError::Parse("not an npy file".to_string()));
    }

    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    let header_len = match version[0] {
        1 => {
            let mut b = [0u8; 2];
            reader.read_exact(&mut b)?;
            u16::from_le_bytes(b) as usize
        }
        2 | 3 => {
            let mut b = [0u8; 4];
            reader.read_exact(&mut b)?;
            u32::from_le_bytes(b) as usize
        }
        v => {
            return Err(StanzaError::Parse(format!(
                "unsupported npy version {v}.{}",
                version[1]
            )));
        }
    };

    let header = read_up_to(reader, header_len, "header")?;
    let header = String::from_utf8_lossy(&header);
    let NpyHeader {
        dtype,
        fortran_order,
        shape: (rows, dim),
    } = parse_header(&header)?;

    let n = rows
        .checked_mul(dim)
        .ok_or_else(|| StanzaError::ShapeMismatch(format!("shape ({rows}, {dim}) overflows")))?;
    let len = n.checked_mul(dtype.size()).ok_or_else(|| {
        StanzaError::ShapeMismatch(format!("shape ({rows}, {dim}) overflows"))
    })?;
    let bytes = read_up_to(reader, len, "data")?;

    let values: Vec<f32> = bytes
        .chunks_exact(dtype.size())
        .map(|b| dtype.decode(b))
        .collect();

    let data = if fortran_order {
        let mut data = vec![0.0; n];
        for c in 0..dim {
            for r in 0..rows {
                data[r * dim + c] = values[c * rows + r];
            }
        }
        data
    } else {
        values
    };

    EmbeddingMatrix::new(rows, dim, data)
}

/// Save an [`EmbeddingMatrix`] to a ``.npy`` file, replacing it atomically.
pub fn save_npy_path<P: AsRef<Path>>(
    matrix: &EmbeddingMatrix,
    path: P,
) -> StanzaResult<()> {
    write_file_atomic(path, |w| write_npy_matrix(matrix, w))
}

/// Load an [`EmbeddingMatrix`] from a ``.npy`` file.
pub fn load_npy_path<P: AsRef<Path>>(path: P) -> StanzaResult<EmbeddingMatrix> {
    let mut reader = BufReader::new(File::open(path)?);
    read_npy_matrix(&mut reader)
}
