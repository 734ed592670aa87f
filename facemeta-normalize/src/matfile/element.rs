//! Data element tags and raw numeric payloads
//!
//! Every piece of a Level-5 MAT file is a data element: an 8-byte tag (type,
//! byte count) followed by the payload, padded to an 8-byte boundary. Small
//! elements (payload <= 4 bytes) pack the tag into 4 bytes, with the byte
//! count in the upper 16 bits of the first word.

use super::MatError;

pub const MI_INT8: u32 = 1;
pub const MI_UINT8: u32 = 2;
pub const MI_INT16: u32 = 3;
pub const MI_UINT16: u32 = 4;
pub const MI_INT32: u32 = 5;
pub const MI_UINT32: u32 = 6;
pub const MI_SINGLE: u32 = 7;
pub const MI_DOUBLE: u32 = 9;
pub const MI_INT64: u32 = 12;
pub const MI_UINT64: u32 = 13;
pub const MI_MATRIX: u32 = 14;
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8: u32 = 16;
pub const MI_UTF16: u32 = 17;
pub const MI_UTF32: u32 = 18;

/// Byte order declared by the file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn u16(self, b: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes(b),
            ByteOrder::Big => u16::from_be_bytes(b),
        }
    }

    pub fn u32(self, b: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
        }
    }

    pub fn u64(self, b: [u8; 8]) -> u64 {
        match self {
            ByteOrder::Little => u64::from_le_bytes(b),
            ByteOrder::Big => u64::from_be_bytes(b),
        }
    }
}

/// One data element borrowed from a buffer
#[derive(Debug, Clone, Copy)]
pub struct DataElement<'a> {
    pub data_type: u32,
    pub data: &'a [u8],
}

/// Sequential reader over the data elements of a buffer
pub struct ElementReader<'a> {
    buf: &'a [u8],
    pos: usize,
    order: ByteOrder,
    /// Offset of `buf` within the file, for error messages
    base: usize,
}

impl<'a> ElementReader<'a> {
    pub fn new(buf: &'a [u8], order: ByteOrder, base: usize) -> Self {
        Self {
            buf,
            pos: 0,
            order,
            base,
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Offset (within the file, when known) of the next element
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Bytes left in the buffer
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Read the next element, or `None` at the end of the buffer
    pub fn next_element(&mut self) -> Result<Option<DataElement<'a>>, MatError> {
        // Trailing bytes shorter than a tag are padding
        if self.remaining() < 8 {
            self.pos = self.buf.len();
            return Ok(None);
        }

        let first = self.order.u32(self.take4(self.pos));
        let small_len = first >> 16;
        if small_len != 0 {
            let len = small_len as usize;
            if len > 4 {
                return Err(MatError::Malformed {
                    offset: self.offset(),
                    reason: format!("small data element claims {} bytes", len),
                });
            }
            let start = self.pos + 4;
            let element = DataElement {
                data_type: first & 0xFFFF,
                data: &self.buf[start..start + len],
            };
            self.pos += 8;
            return Ok(Some(element));
        }

        let data_type = first;
        let len = self.order.u32(self.take4(self.pos + 4)) as usize;
        let start = self.pos + 8;
        let end = start.checked_add(len).filter(|&e| e <= self.buf.len()).ok_or(
            MatError::Truncated {
                offset: self.offset(),
                needed: len,
            },
        )?;

        let element = DataElement {
            data_type,
            data: &self.buf[start..end],
        };

        // Compressed elements are not padded
        self.pos = if data_type == MI_COMPRESSED {
            end
        } else {
            start + ((len + 7) & !7)
        }
        .min(self.buf.len());

        Ok(Some(element))
    }

    /// Read the next element and require a data type
    pub fn expect(&mut self, data_type: u32, what: &'static str) -> Result<DataElement<'a>, MatError> {
        let offset = self.offset();
        match self.next_element()? {
            Some(element) if element.data_type == data_type => Ok(element),
            Some(element) => Err(MatError::UnexpectedElement {
                offset,
                expected: what,
                found: element.data_type,
            }),
            None => Err(MatError::Truncated { offset, needed: 8 }),
        }
    }

    fn take4(&self, at: usize) -> [u8; 4] {
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.buf[at..at + 4]);
        b
    }
}

/// Decode a numeric payload into `f64` values
///
/// MATLAB frequently stores a double array using a smaller integer type, so
/// the element type, not the array class, decides the width.
pub fn decode_numbers(element: &DataElement<'_>, order: ByteOrder) -> Result<Vec<f64>, MatError> {
    let data = element.data;
    let values = match element.data_type {
        MI_INT8 => data.iter().map(|&b| b as i8 as f64).collect(),
        MI_UINT8 | MI_UTF8 => data.iter().map(|&b| b as f64).collect(),
        MI_INT16 => chunks::<2>(data).map(|c| order.u16(c) as i16 as f64).collect(),
        MI_UINT16 | MI_UTF16 => chunks::<2>(data).map(|c| order.u16(c) as f64).collect(),
        MI_INT32 => chunks::<4>(data).map(|c| order.u32(c) as i32 as f64).collect(),
        MI_UINT32 | MI_UTF32 => chunks::<4>(data).map(|c| order.u32(c) as f64).collect(),
        MI_SINGLE => chunks::<4>(data)
            .map(|c| f32::from_bits(order.u32(c)) as f64)
            .collect(),
        MI_DOUBLE => chunks::<8>(data)
            .map(|c| f64::from_bits(order.u64(c)))
            .collect(),
        MI_INT64 => chunks::<8>(data).map(|c| order.u64(c) as i64 as f64).collect(),
        MI_UINT64 => chunks::<8>(data).map(|c| order.u64(c) as f64).collect(),
        other => return Err(MatError::UnsupportedDataType(other)),
    };
    Ok(values)
}

/// Decode an `miINT32` payload (dimensions, field name length)
pub fn decode_i32s(element: &DataElement<'_>, order: ByteOrder) -> Vec<i32> {
    chunks::<4>(element.data)
        .map(|c| order.u32(c) as i32)
        .collect()
}

fn chunks<const N: usize>(data: &[u8]) -> impl Iterator<Item = [u8; N]> + '_ {
    data.chunks_exact(N).map(|c| {
        let mut b = [0u8; N];
        b.copy_from_slice(c);
        b
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(data_type: u32, len: u32) -> Vec<u8> {
        let mut v = data_type.to_le_bytes().to_vec();
        v.extend_from_slice(&len.to_le_bytes());
        v
    }

    #[test]
    fn test_regular_element_is_padded() {
        let mut buf = tag(MI_INT8, 3);
        buf.extend_from_slice(b"abc\0\0\0\0\0");
        buf.extend(tag(MI_UINT8, 1));
        buf.extend_from_slice(&[7, 0, 0, 0, 0, 0, 0, 0]);

        let mut reader = ElementReader::new(&buf, ByteOrder::Little, 0);
        let first = reader.next_element().unwrap().unwrap();
        assert_eq!(first.data_type, MI_INT8);
        assert_eq!(first.data, b"abc");

        let second = reader.next_element().unwrap().unwrap();
        assert_eq!(second.data_type, MI_UINT8);
        assert_eq!(second.data, &[7]);

        assert!(reader.next_element().unwrap().is_none());
    }

    #[test]
    fn test_small_element() {
        // 4-byte miINT32 packed into the tag
        let mut buf = ((4u32 << 16) | MI_INT32).to_le_bytes().to_vec();
        buf.extend_from_slice(&32i32.to_le_bytes());

        let mut reader = ElementReader::new(&buf, ByteOrder::Little, 0);
        let element = reader.next_element().unwrap().unwrap();
        assert_eq!(element.data_type, MI_INT32);
        assert_eq!(decode_i32s(&element, ByteOrder::Little), vec![32]);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_element() {
        let mut buf = tag(MI_DOUBLE, 64);
        buf.extend_from_slice(&[0u8; 8]);

        let mut reader = ElementReader::new(&buf, ByteOrder::Little, 128);
        match reader.next_element() {
            Err(MatError::Truncated { offset, needed }) => {
                assert_eq!(offset, 128);
                assert_eq!(needed, 64);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_numbers_big_endian() {
        let data = 2009.5f64.to_bits().to_be_bytes();
        let element = DataElement {
            data_type: MI_DOUBLE,
            data: &data,
        };
        assert_eq!(decode_numbers(&element, ByteOrder::Big).unwrap(), vec![2009.5]);
    }

    #[test]
    fn test_decode_numbers_narrow_storage() {
        let data = [0xFFu8, 0x01];
        let element = DataElement {
            data_type: MI_INT8,
            data: &data,
        };
        assert_eq!(decode_numbers(&element, ByteOrder::Little).unwrap(), vec![-1.0, 1.0]);

        let data = 731965u32.to_le_bytes();
        let element = DataElement {
            data_type: MI_UINT32,
            data: &data,
        };
        assert_eq!(decode_numbers(&element, ByteOrder::Little).unwrap(), vec![731965.0]);
    }

    #[test]
    fn test_decode_numbers_rejects_matrix() {
        let element = DataElement {
            data_type: MI_MATRIX,
            data: &[],
        };
        assert!(matches!(
            decode_numbers(&element, ByteOrder::Little),
            Err(MatError::UnsupportedDataType(MI_MATRIX))
        ));
    }
}
