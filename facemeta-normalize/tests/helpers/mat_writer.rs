//! MAT v5 Test Fixture Writer
//!
//! Builds little-endian Level-5 archives in memory: doubles, UTF-16 char
//! arrays, cells and 1x1 structs, optionally wrapped in zlib compression.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::Path;

const MI_INT8: u32 = 1;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

const CLASS_CELL: u32 = 1;
const CLASS_STRUCT: u32 = 2;
const CLASS_CHAR: u32 = 4;
const CLASS_DOUBLE: u32 = 6;

/// A MATLAB value to serialize
#[derive(Debug, Clone)]
pub enum MatValue {
    /// Double array with explicit dimensions (column-major values)
    Double { dims: Vec<usize>, values: Vec<f64> },
    /// 1xN char array
    Text(String),
    /// Cell array with explicit dimensions
    Cell { dims: Vec<usize>, cells: Vec<MatValue> },
    /// 1x1 struct
    Struct(Vec<(String, MatValue)>),
    /// Zero-length matrix element (an empty `[]`)
    Empty,
}

impl MatValue {
    pub fn scalar(v: f64) -> Self {
        MatValue::Double {
            dims: vec![1, 1],
            values: vec![v],
        }
    }

    pub fn row(values: &[f64]) -> Self {
        MatValue::Double {
            dims: vec![1, values.len()],
            values: values.to_vec(),
        }
    }

    pub fn text(s: &str) -> Self {
        MatValue::Text(s.to_string())
    }

    pub fn cell_row(cells: Vec<MatValue>) -> Self {
        MatValue::Cell {
            dims: vec![1, cells.len()],
            cells,
        }
    }
}

fn element(data_type: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len() + 8);
    out.extend_from_slice(&data_type.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    while out.len() % 8 != 0 {
        out.push(0);
    }
    out
}

fn array_header(class: u32, dims: &[usize], name: &str) -> Vec<u8> {
    let mut flags = Vec::new();
    flags.extend_from_slice(&class.to_le_bytes());
    flags.extend_from_slice(&0u32.to_le_bytes());

    let dim_bytes: Vec<u8> = dims
        .iter()
        .flat_map(|&d| (d as i32).to_le_bytes())
        .collect();

    let mut out = element(MI_UINT32, &flags);
    out.extend(element(MI_INT32, &dim_bytes));
    out.extend(element(MI_INT8, name.as_bytes()));
    out
}

/// Serialize one `miMATRIX` element
pub fn matrix(name: &str, value: &MatValue) -> Vec<u8> {
    let payload = match value {
        MatValue::Empty => Vec::new(),
        MatValue::Double { dims, values } => {
            let mut out = array_header(CLASS_DOUBLE, dims, name);
            let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            out.extend(element(MI_DOUBLE, &data));
            out
        }
        MatValue::Text(s) => {
            let units: Vec<u16> = s.encode_utf16().collect();
            let mut out = array_header(CLASS_CHAR, &[1, units.len()], name);
            let data: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
            out.extend(element(MI_UINT16, &data));
            out
        }
        MatValue::Cell { dims, cells } => {
            let mut out = array_header(CLASS_CELL, dims, name);
            for cell in cells {
                out.extend(matrix("", cell));
            }
            out
        }
        MatValue::Struct(fields) => {
            let mut out = array_header(CLASS_STRUCT, &[1, 1], name);
            let name_len = fields.iter().map(|(n, _)| n.len()).max().unwrap_or(0) + 1;
            out.extend(element(MI_INT32, &(name_len as i32).to_le_bytes()));

            let mut names = Vec::with_capacity(name_len * fields.len());
            for (field, _) in fields {
                let mut padded = field.as_bytes().to_vec();
                padded.resize(name_len, 0);
                names.extend(padded);
            }
            out.extend(element(MI_INT8, &names));

            for (_, field_value) in fields {
                out.extend(matrix("", field_value));
            }
            out
        }
    };
    element(MI_MATRIX, &payload)
}

/// A 1x1 cell whose content is a bare `miDOUBLE` instead of an `miMATRIX`
pub fn misplaced_cell(name: &str) -> Vec<u8> {
    let mut payload = array_header(CLASS_CELL, &[1, 1], name);
    payload.extend(element(MI_DOUBLE, &1.0f64.to_le_bytes()));
    element(MI_MATRIX, &payload)
}

/// Cells nested `depth` levels around a scalar
pub fn nested_cells(depth: usize) -> MatValue {
    (0..depth).fold(MatValue::scalar(1.0), |inner, _| MatValue::cell_row(vec![inner]))
}

fn header() -> Vec<u8> {
    let mut h = vec![b' '; 128];
    let text = b"MATLAB 5.0 MAT-file, Platform: GLNXA64, Created on: Thu Jan  4 10:00:00 2024";
    h[..text.len()].copy_from_slice(text);
    h[116..124].copy_from_slice(&[0; 8]);
    h[124..126].copy_from_slice(&0x0100u16.to_le_bytes());
    h[126..128].copy_from_slice(b"IM");
    h
}

/// Serialize a whole archive
pub fn mat_bytes(variables: &[(&str, MatValue)], compressed: bool) -> Vec<u8> {
    let mut out = header();
    for (name, value) in variables {
        let raw = matrix(name, value);
        if compressed {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&raw).unwrap();
            let zipped = encoder.finish().unwrap();
            out.extend_from_slice(&MI_COMPRESSED.to_le_bytes());
            out.extend_from_slice(&(zipped.len() as u32).to_le_bytes());
            out.extend(zipped);
        } else {
            out.extend(raw);
        }
    }
    out
}

/// Header followed by pre-serialized top-level elements
pub fn raw_archive(elements: &[Vec<u8>]) -> Vec<u8> {
    let mut out = header();
    for element in elements {
        out.extend_from_slice(element);
    }
    out
}

/// Write an archive to disk
pub fn write_mat(path: &Path, variables: &[(&str, MatValue)], compressed: bool) {
    std::fs::write(path, mat_bytes(variables, compressed)).unwrap();
}

/// One record in the shape the real archives store it
#[derive(Debug, Clone)]
pub struct FixtureRecord {
    pub dob: f64,
    pub photo_taken: f64,
    pub full_path: MatValue,
    pub gender: f64,
    pub name: MatValue,
    pub face_location: MatValue,
    pub face_score: f64,
    pub second_face_score: f64,
    pub celeb_id: f64,
}

impl FixtureRecord {
    /// A well-formed single-face record
    pub fn new(name: &str, path: &str, dob: f64, photo_taken: f64) -> Self {
        Self {
            dob,
            photo_taken,
            full_path: MatValue::text(path),
            gender: 1.0,
            name: MatValue::text(name),
            face_location: MatValue::row(&[111.29, 111.29, 252.67, 252.67]),
            face_score: 4.3,
            second_face_score: f64::NAN,
            celeb_id: 7.0,
        }
    }
}

/// Build the partition struct (`dob`, `photo_taken`, ... `celeb_id`)
pub fn partition_struct(records: &[FixtureRecord]) -> MatValue {
    let column = |f: fn(&FixtureRecord) -> f64| {
        MatValue::row(&records.iter().map(f).collect::<Vec<_>>())
    };
    let cells = |f: fn(&FixtureRecord) -> MatValue| {
        MatValue::cell_row(records.iter().map(f).collect())
    };

    MatValue::Struct(vec![
        ("dob".to_string(), column(|r| r.dob)),
        ("photo_taken".to_string(), column(|r| r.photo_taken)),
        ("full_path".to_string(), cells(|r| r.full_path.clone())),
        ("gender".to_string(), column(|r| r.gender)),
        ("name".to_string(), cells(|r| r.name.clone())),
        ("face_location".to_string(), cells(|r| r.face_location.clone())),
        ("face_score".to_string(), column(|r| r.face_score)),
        ("second_face_score".to_string(), column(|r| r.second_face_score)),
        (
            "celeb_names".to_string(),
            MatValue::cell_row(vec![MatValue::text("Fred Astaire"), MatValue::text("Ann Blyth")]),
        ),
        ("celeb_id".to_string(), column(|r| r.celeb_id)),
    ])
}

/// Write a partition archive holding one struct variable
pub fn write_partition(path: &Path, variable: &str, records: &[FixtureRecord], compressed: bool) {
    write_mat(path, &[(variable, partition_struct(records))], compressed);
}
