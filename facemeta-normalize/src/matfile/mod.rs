//! MATLAB Level-5 MAT-file reader
//!
//! Reads the subset of the format the face metadata archives use: numeric,
//! char, cell and struct arrays, optionally wrapped in zlib-compressed
//! (`miCOMPRESSED`) elements. v7.3 files are HDF5 containers and are rejected.

mod array;
mod element;

pub use array::{element_count, ArrayClass, CellArray, CharArray, Element, MatArray, NumericArray, StructArray};

use element::{
    decode_i32s, decode_numbers, ByteOrder, DataElement, ElementReader, MI_COMPRESSED, MI_INT32,
    MI_INT8, MI_MATRIX, MI_UINT32, MI_UTF8,
};
use flate2::read::ZlibDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const HEADER_LEN: usize = 128;
const FLAG_COMPLEX: u32 = 0x0800;
const FLAG_LOGICAL: u32 = 0x0200;
/// Deepest cell/struct nesting accepted
const MAX_DEPTH: usize = 32;
/// Smallest encoding of a nested element: a bare tag
const TAG_LEN: usize = 8;

/// MAT-file reader errors
#[derive(Debug, Error)]
pub enum MatError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a Level-5 MAT-file: {0}")]
    InvalidHeader(String),

    #[error("Unsupported MAT-file version: {0}")]
    UnsupportedVersion(String),

    #[error("Truncated data element at offset {offset} (needs {needed} bytes)")]
    Truncated { offset: usize, needed: usize },

    #[error("Expected {expected} at offset {offset}, found data type {found}")]
    UnexpectedElement {
        offset: usize,
        expected: &'static str,
        found: u32,
    },

    #[error("Malformed element at offset {offset}: {reason}")]
    Malformed { offset: usize, reason: String },

    #[error("Unsupported data type {0}")]
    UnsupportedDataType(u32),

    #[error("Failed to inflate compressed element at offset {offset}: {source}")]
    Inflate {
        offset: usize,
        #[source]
        source: std::io::Error,
    },
}

/// A parsed MAT-file: header text plus the named top-level variables
#[derive(Debug, Clone)]
pub struct MatFile {
    pub description: String,
    variables: Vec<(String, MatArray)>,
}

impl MatFile {
    /// Read and parse a MAT-file from disk
    pub fn open(path: &Path) -> Result<Self, MatError> {
        let bytes = std::fs::read(path).map_err(|source| MatError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parse a MAT-file held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MatError> {
        let (description, order) = parse_header(bytes)?;

        let mut variables = Vec::new();
        let mut reader = ElementReader::new(&bytes[HEADER_LEN..], order, HEADER_LEN);
        loop {
            let offset = reader.offset();
            let Some(element) = reader.next_element()? else {
                break;
            };
            match element.data_type {
                MI_MATRIX => variables.push(parse_matrix(element.data, order, offset + 8, 0)?),
                MI_COMPRESSED => {
                    let inflated = inflate(element.data, offset)?;
                    let mut inner = ElementReader::new(&inflated, order, 0);
                    while let Some(el) = inner.next_element()? {
                        if el.data_type == MI_MATRIX {
                            variables.push(parse_matrix(el.data, order, 0, 0)?);
                        }
                    }
                }
                other => debug!("Skipping top-level data element of type {} at {}", other, offset),
            }
        }

        Ok(Self {
            description,
            variables,
        })
    }

    /// Look up a top-level variable by name
    pub fn variable(&self, name: &str) -> Option<&MatArray> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, array)| array)
    }

    /// First top-level struct variable, with its name
    pub fn first_struct(&self) -> Option<(&str, &MatArray)> {
        self.variables
            .iter()
            .find(|(_, array)| matches!(array, MatArray::Struct(_)))
            .map(|(n, array)| (n.as_str(), array))
    }

}

/// Validate the 128-byte header and determine the byte order
fn parse_header(bytes: &[u8]) -> Result<(String, ByteOrder), MatError> {
    if bytes.len() < HEADER_LEN {
        return Err(MatError::InvalidHeader(format!(
            "file is {} bytes, shorter than the header",
            bytes.len()
        )));
    }

    let text = String::from_utf8_lossy(&bytes[..116])
        .trim_end_matches(&['\0', ' '][..])
        .to_string();

    if text.starts_with("MATLAB 7.3") {
        return Err(MatError::UnsupportedVersion(
            "v7.3 (HDF5) files are not supported; re-save with -v7".to_string(),
        ));
    }

    // Level 4 files start with a numeric type word, never with text
    if bytes[..4].contains(&0) {
        return Err(MatError::InvalidHeader("Level 4 MAT-file or binary data".to_string()));
    }

    let order = match &bytes[126..128] {
        b"IM" => ByteOrder::Little,
        b"MI" => ByteOrder::Big,
        other => {
            return Err(MatError::InvalidHeader(format!(
                "bad endian indicator {:?}",
                String::from_utf8_lossy(other)
            )))
        }
    };

    let version = order.u16([bytes[124], bytes[125]]);
    if version != 0x0100 {
        return Err(MatError::UnsupportedVersion(format!("header version 0x{:04x}", version)));
    }

    Ok((text, order))
}

fn inflate(data: &[u8], offset: usize) -> Result<Vec<u8>, MatError> {
    let mut out = Vec::with_capacity(data.len() * 4);
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|source| MatError::Inflate { offset, source })?;
    Ok(out)
}

/// Parse the payload of an `miMATRIX` element into its name and array
fn parse_matrix(
    data: &[u8],
    order: ByteOrder,
    base: usize,
    depth: usize,
) -> Result<(String, MatArray), MatError> {
    if depth > MAX_DEPTH {
        return Err(MatError::Malformed {
            offset: base,
            reason: format!("arrays nested deeper than {} levels", MAX_DEPTH),
        });
    }

    // Zero-length matrices appear as empty cells
    if data.is_empty() {
        return Ok((String::new(), MatArray::empty()));
    }

    let mut reader = ElementReader::new(data, order, base);

    let flags_el = reader.expect(MI_UINT32, "array flags")?;
    if flags_el.data.len() < 4 {
        return Err(MatError::Malformed {
            offset: base,
            reason: "array flags shorter than 4 bytes".to_string(),
        });
    }
    let flags = order.u32([flags_el.data[0], flags_el.data[1], flags_el.data[2], flags_el.data[3]]);
    let class = ArrayClass::from_code((flags & 0xFF) as u8);

    let dims_el = reader.expect(MI_INT32, "dimensions")?;
    let dims: Vec<usize> = decode_i32s(&dims_el, order)
        .into_iter()
        .map(|d| d.max(0) as usize)
        .collect();
    let count = element_count(&dims).ok_or_else(|| MatError::Malformed {
        offset: base,
        reason: format!("dimensions {:?} overflow", dims),
    })?;

    let name_el = reader.expect(MI_INT8, "array name")?;
    let name = String::from_utf8_lossy(name_el.data).into_owned();

    let array = match class {
        ArrayClass::Cell => {
            check_room(&reader, count, base, "cell")?;
            let mut cells = Vec::with_capacity(count);
            for _ in 0..count {
                let offset = reader.offset();
                let cell = reader.expect(MI_MATRIX, "cell element")?;
                cells.push(parse_matrix(cell.data, order, offset + 8, depth + 1)?.1);
            }
            MatArray::Cell(CellArray { dims, cells })
        }
        ArrayClass::Struct => parse_struct(&mut reader, dims, count, base, depth)?,
        ArrayClass::Char => {
            let el = reader.next_element()?;
            // Every character takes at least one byte of storage
            if count > el.map_or(0, |el| el.data.len()) {
                return Err(MatError::Malformed {
                    offset: base,
                    reason: format!("char array {:?} is larger than its data", dims),
                });
            }
            let chars = match el {
                Some(el) => decode_chars(&el, order)?,
                None => Vec::new(),
            };
            MatArray::Char(CharArray { dims, chars })
        }
        class if class.is_numeric() => {
            let values = match reader.next_element()? {
                Some(real) => decode_numbers(&real, order)?,
                None => Vec::new(),
            };
            if values.len() != count {
                return Err(MatError::Malformed {
                    offset: base,
                    reason: format!("{} values for dimensions {:?}", values.len(), dims),
                });
            }
            if flags & FLAG_COMPLEX != 0 {
                // Imaginary part is read past and dropped
                reader.next_element()?;
            }
            MatArray::Numeric(NumericArray {
                class,
                dims,
                logical: flags & FLAG_LOGICAL != 0,
                values,
            })
        }
        class => {
            debug!("Leaving {:?} array '{}' undecoded", class, name);
            MatArray::Unsupported { class, dims }
        }
    };

    Ok((name, array))
}

/// Fail unless `count` nested `miMATRIX` elements could fit in what is left
fn check_room(reader: &ElementReader<'_>, count: usize, base: usize, what: &str) -> Result<(), MatError> {
    let needed = count.checked_mul(TAG_LEN);
    if needed.map_or(true, |n| n > reader.remaining()) {
        return Err(MatError::Malformed {
            offset: base,
            reason: format!(
                "{} array claims {} elements but only {} bytes remain",
                what,
                count,
                reader.remaining()
            ),
        });
    }
    Ok(())
}

fn parse_struct(
    reader: &mut ElementReader<'_>,
    dims: Vec<usize>,
    count: usize,
    base: usize,
    depth: usize,
) -> Result<MatArray, MatError> {
    let order = reader.order();

    let len_el = reader.expect(MI_INT32, "field name length")?;
    let name_len = decode_i32s(&len_el, order).first().copied().unwrap_or(0).max(0) as usize;
    if name_len == 0 {
        return Err(MatError::Malformed {
            offset: base,
            reason: "struct field name length is zero".to_string(),
        });
    }

    let names_el = reader.expect(MI_INT8, "field names")?;
    let field_names: Vec<String> = names_el
        .data
        .chunks(name_len)
        .map(|chunk| {
            let end = chunk.iter().position(|&b| b == 0).unwrap_or(chunk.len());
            String::from_utf8_lossy(&chunk[..end]).into_owned()
        })
        .collect();

    // Field-less structs carry no per-element data
    if field_names.is_empty() {
        return Ok(MatArray::Struct(StructArray {
            dims,
            field_names,
            elements: Vec::new(),
        }));
    }

    let values = count.checked_mul(field_names.len()).ok_or_else(|| MatError::Malformed {
        offset: base,
        reason: format!("struct array {:?} overflows", dims),
    })?;
    check_room(reader, values, base, "struct")?;

    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        let mut fields = Vec::with_capacity(field_names.len());
        for _ in &field_names {
            let offset = reader.offset();
            let value = reader.expect(MI_MATRIX, "struct field")?;
            fields.push(parse_matrix(value.data, order, offset + 8, depth + 1)?.1);
        }
        elements.push(fields);
    }

    Ok(MatArray::Struct(StructArray {
        dims,
        field_names,
        elements,
    }))
}

/// Decode character data; storage may be UTF-8, UTF-16 or plain code points
fn decode_chars(element: &DataElement<'_>, order: ByteOrder) -> Result<Vec<char>, MatError> {
    if element.data_type == MI_UTF8 {
        return Ok(String::from_utf8_lossy(element.data).chars().collect());
    }

    let codes = decode_numbers(element, order)?;
    let units: Vec<u16> = codes.iter().map(|&c| c as u16).collect();
    if codes.iter().all(|&c| c <= u16::MAX as f64) {
        Ok(char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect())
    } else {
        Ok(codes
            .iter()
            .map(|&c| char::from_u32(c as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect())
    }
}
