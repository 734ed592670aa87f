//! Decoded MATLAB arrays
//!
//! Arrays are stored column-major, as in the file. Numeric payloads are
//! widened to `f64` regardless of the storage class.

use std::fmt;

/// MATLAB array class (`mxCLASS`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayClass {
    Cell,
    Struct,
    Object,
    Char,
    Sparse,
    Double,
    Single,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Other(u8),
}

impl ArrayClass {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ArrayClass::Cell,
            2 => ArrayClass::Struct,
            3 => ArrayClass::Object,
            4 => ArrayClass::Char,
            5 => ArrayClass::Sparse,
            6 => ArrayClass::Double,
            7 => ArrayClass::Single,
            8 => ArrayClass::Int8,
            9 => ArrayClass::UInt8,
            10 => ArrayClass::Int16,
            11 => ArrayClass::UInt16,
            12 => ArrayClass::Int32,
            13 => ArrayClass::UInt32,
            14 => ArrayClass::Int64,
            15 => ArrayClass::UInt64,
            other => ArrayClass::Other(other),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ArrayClass::Double
                | ArrayClass::Single
                | ArrayClass::Int8
                | ArrayClass::UInt8
                | ArrayClass::Int16
                | ArrayClass::UInt16
                | ArrayClass::Int32
                | ArrayClass::UInt32
                | ArrayClass::Int64
                | ArrayClass::UInt64
        )
    }
}

/// Product of the dimensions, `None` on overflow
pub fn element_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Numeric (or logical) array, real part only
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    pub class: ArrayClass,
    pub dims: Vec<usize>,
    pub logical: bool,
    pub values: Vec<f64>,
}

/// Character array
#[derive(Debug, Clone, PartialEq)]
pub struct CharArray {
    pub dims: Vec<usize>,
    pub chars: Vec<char>,
}

impl CharArray {
    /// Rows of a 2-D char matrix, reassembled from column-major storage
    pub fn rows(&self) -> Vec<String> {
        let rows = self.dims.first().copied().unwrap_or(0);
        if rows == 0 || rows > self.chars.len() {
            return Vec::new();
        }
        let cols = self.chars.len() / rows;
        (0..rows)
            .map(|r| (0..cols).map(|c| self.chars[r + rows * c]).collect())
            .collect()
    }

    /// First row, trailing padding removed
    pub fn text(&self) -> Option<String> {
        let first = self.rows().into_iter().next()?;
        let trimmed = first.trim_end_matches(&['\0', ' '][..]).to_string();
        Some(trimmed)
    }
}

/// Cell array
#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    pub dims: Vec<usize>,
    pub cells: Vec<MatArray>,
}

/// Struct array; `elements[i][f]` is field `f` of element `i`
#[derive(Debug, Clone, PartialEq)]
pub struct StructArray {
    pub dims: Vec<usize>,
    pub field_names: Vec<String>,
    pub elements: Vec<Vec<MatArray>>,
}

impl StructArray {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names.iter().position(|f| f == name)
    }

    /// Field `name` of element `index`
    pub fn field(&self, index: usize, name: &str) -> Option<&MatArray> {
        let f = self.field_index(name)?;
        self.field_at(index, f)
    }

    /// Field by ordinal position of element `index`
    pub fn field_at(&self, index: usize, ordinal: usize) -> Option<&MatArray> {
        self.elements.get(index)?.get(ordinal)
    }
}

/// Any decoded array
#[derive(Debug, Clone, PartialEq)]
pub enum MatArray {
    Numeric(NumericArray),
    Char(CharArray),
    Cell(CellArray),
    Struct(StructArray),
    /// Sparse, object, function handle and other classes we do not decode
    Unsupported { class: ArrayClass, dims: Vec<usize> },
}

/// One element of an array, viewed without copying
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element<'a> {
    /// Element of a numeric array
    Scalar(f64),
    /// Element of a char array
    Char(char),
    /// Content of a cell
    Array(&'a MatArray),
}

impl MatArray {
    /// An empty 0x0 double, which is what a zero-length `miMATRIX` denotes
    pub fn empty() -> Self {
        MatArray::Numeric(NumericArray {
            class: ArrayClass::Double,
            dims: vec![0, 0],
            logical: false,
            values: Vec::new(),
        })
    }

    pub fn dims(&self) -> &[usize] {
        match self {
            MatArray::Numeric(a) => &a.dims,
            MatArray::Char(a) => &a.dims,
            MatArray::Cell(a) => &a.dims,
            MatArray::Struct(a) => &a.dims,
            MatArray::Unsupported { dims, .. } => dims,
        }
    }

    /// Number of elements (product of the dimensions, saturating)
    pub fn len(&self) -> usize {
        element_count(self.dims()).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at linear (column-major) index `i`
    ///
    /// Struct and unsupported arrays have no element view.
    pub fn element(&self, i: usize) -> Option<Element<'_>> {
        match self {
            MatArray::Numeric(a) => a.values.get(i).copied().map(Element::Scalar),
            MatArray::Char(a) => a.chars.get(i).copied().map(Element::Char),
            MatArray::Cell(a) => a.cells.get(i).map(Element::Array),
            MatArray::Struct(_) | MatArray::Unsupported { .. } => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructArray> {
        match self {
            MatArray::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Every number reachable through nested cells, in storage order
    ///
    /// Returns `None` if anything other than numeric data is found.
    pub fn flatten_numbers(&self) -> Option<Vec<f64>> {
        match self {
            MatArray::Numeric(a) => Some(a.values.clone()),
            MatArray::Cell(a) => {
                let mut out = Vec::new();
                for cell in &a.cells {
                    out.extend(cell.flatten_numbers()?);
                }
                Some(out)
            }
            _ => None,
        }
    }
}

impl fmt::Display for MatArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self
            .dims()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("x");
        let kind = match self {
            MatArray::Numeric(a) if a.logical => "logical".to_string(),
            MatArray::Numeric(a) => format!("{:?}", a.class).to_lowercase(),
            MatArray::Char(_) => "char".to_string(),
            MatArray::Cell(_) => "cell".to_string(),
            MatArray::Struct(_) => "struct".to_string(),
            MatArray::Unsupported { class, .. } => format!("{:?}", class).to_lowercase(),
        };
        write!(f, "[{} {}]", dims, kind)
    }
}
