//! NPY binary format.
//!
//! ```text
//! \x93NUMPY <major> <minor> <header_len: u16 LE (v1) | u32 LE (v2, v3)>
//! {'descr': '<f8', 'fortran_order': False, 'shape': (3, 2), }   padded with ' ', ends in '\n'
//! <raw little-endian C-ordered data>
//! ```
//!
//! Written files are version 1.0 with the data offset aligned to 64 bytes, or
//! version 2.0 when the header does not fit a u16 length.

use lazy_static::lazy_static;
use regex::Regex;

use super::{element_count, ArrayData, DType, NdArray};
use crate::backend::error::CodecError;

const MAGIC: &[u8] = b"\x93NUMPY";
const ALIGN: usize = 64;

lazy_static! {
    static ref DESCR: Regex = Regex::new(r"'descr'\s*:\s*'([^']*)'").unwrap();
    static ref FORTRAN: Regex = Regex::new(r"'fortran_order'\s*:\s*(True|False)").unwrap();
    static ref SHAPE: Regex = Regex::new(r"'shape'\s*:\s*\(([^)]*)\)").unwrap();
}

fn descr(dtype: DType) -> &'static str {
    match dtype {
        DType::Bool => "|b1",
        DType::U8 => "|u1",
        DType::I32 => "<i4",
        DType::I64 => "<i8",
        DType::F32 => "<f4",
        DType::F64 => "<f8",
    }
}

fn parse_descr(descr: &str) -> Result<DType, CodecError> {
    match descr {
        "|b1" => Ok(DType::Bool),
        "|u1" | "<u1" => Ok(DType::U8),
        "<i4" => Ok(DType::I32),
        "<i8" => Ok(DType::I64),
        "<f4" => Ok(DType::F32),
        "<f8" => Ok(DType::F64),
        other if other.starts_with('>') => Err(CodecError::Unsupported(format!(
            "big-endian dtype '{}'",
            other
        ))),
        other => Err(CodecError::Unsupported(format!("dtype '{}'", other))),
    }
}

fn shape_literal(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [n] => format!("({},)", n),
        dims => {
            let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
            format!("({})", parts.join(", "))
        }
    }
}

/// Length of the padded header (dict, spaces, `\n`) after a length field of
/// `len_field` bytes, keeping the data offset a multiple of 64.
fn padded_header_len(dict_len: usize, len_field: usize) -> usize {
    let unpadded = MAGIC.len() + 2 + len_field + dict_len + 1;
    dict_len + (ALIGN - unpadded % ALIGN) % ALIGN + 1
}

/// Serialize an array as NPY version 1.0, or 2.0 when the header outgrows a u16.
pub fn encode_npy(array: &NdArray) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        descr(array.dtype()),
        shape_literal(array.shape())
    );

    let mut out = Vec::with_capacity(ALIGN + dict.len() + array.len() * array.dtype().size());
    out.extend_from_slice(MAGIC);

    let v1_len = padded_header_len(dict.len(), 2);
    let header_len = match u16::try_from(v1_len) {
        Ok(len) => {
            out.extend_from_slice(&[1, 0]);
            out.extend_from_slice(&len.to_le_bytes());
            v1_len
        }
        Err(_) => {
            // a shape literal past 4 GiB cannot be built in memory
            let len = padded_header_len(dict.len(), 4);
            out.extend_from_slice(&[2, 0]);
            out.extend_from_slice(&(len as u32).to_le_bytes());
            len
        }
    };

    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat(b' ').take(header_len - dict.len() - 1));
    out.push(b'\n');

    match array.data() {
        ArrayData::Bool(v) => out.extend(v.iter().map(|&b| u8::from(b))),
        ArrayData::U8(v) => out.extend_from_slice(v),
        ArrayData::I32(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        ArrayData::I64(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        ArrayData::F32(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
        ArrayData::F64(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_le_bytes())),
    }
    out
}

/// Parse NPY bytes (versions 1.0, 2.0 and 3.0).
pub fn decode_npy(bytes: &[u8]) -> Result<NdArray, CodecError> {
    if bytes.len() < MAGIC.len() + 2 || &bytes[..MAGIC.len()] != MAGIC {
        return Err(CodecError::Format("missing NPY magic".to_string()));
    }

    let major = bytes[MAGIC.len()];
    let (header_len, header_start): (usize, usize) = match major {
        1 => {
            let raw = bytes
                .get(8..10)
                .ok_or_else(|| CodecError::Format("truncated header length".to_string()))?;
            (usize::from(u16::from_le_bytes([raw[0], raw[1]])), 10)
        }
        2 | 3 => {
            let raw = bytes
                .get(8..12)
                .ok_or_else(|| CodecError::Format("truncated header length".to_string()))?;
            let len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
            (len as usize, 12)
        }
        v => return Err(CodecError::Unsupported(format!("NPY version {}", v))),
    };

    let header_end = header_start
        .checked_add(header_len)
        .ok_or_else(|| CodecError::Format("header length overflows".to_string()))?;
    let header = bytes
        .get(header_start..header_end)
        .ok_or_else(|| CodecError::Format("truncated header".to_string()))?;
    let header = std::str::from_utf8(header)
        .map_err(|e| CodecError::Format(format!("header is not text: {}", e)))?;

    let dtype = DESCR
        .captures(header)
        .map(|c| c[1].to_string())
        .ok_or_else(|| CodecError::Format("header has no 'descr'".to_string()))
        .and_then(|d| parse_descr(&d))?;

    let fortran = FORTRAN
        .captures(header)
        .map(|c| &c[1] == "True")
        .ok_or_else(|| CodecError::Format("header has no 'fortran_order'".to_string()))?;
    if fortran {
        return Err(CodecError::Unsupported("fortran_order arrays".to_string()));
    }

    let shape = SHAPE
        .captures(header)
        .ok_or_else(|| CodecError::Format("header has no 'shape'".to_string()))?[1]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| CodecError::Format(format!("bad shape dimension '{}'", s)))
        })
        .collect::<Result<Vec<usize>, _>>()?;

    let expected = element_count(&shape)
        .and_then(|count| count.checked_mul(dtype.size()))
        .ok_or_else(|| CodecError::Format(format!("shape {:?} is too large", shape)))?;
    let body = &bytes[header_end..];
    if body.len() < expected {
        return Err(CodecError::Format(format!(
            "expected {} data bytes, found {}",
            expected,
            body.len()
        )));
    }
    let body = &body[..expected];

    let data = match dtype {
        DType::Bool => ArrayData::Bool(body.iter().map(|&b| b != 0).collect()),
        DType::U8 => ArrayData::U8(body.to_vec()),
        DType::I32 => ArrayData::I32(
            body.chunks_exact(4)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        DType::I64 => ArrayData::I64(
            body.chunks_exact(8)
                .map(|c| i64::from_le_bytes(le_bytes8(c)))
                .collect(),
        ),
        DType::F32 => ArrayData::F32(
            body.chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        DType::F64 => ArrayData::F64(
            body.chunks_exact(8)
                .map(|c| f64::from_le_bytes(le_bytes8(c)))
                .collect(),
        ),
    };

    NdArray::from_data(shape, data).map_err(|e| CodecError::Format(e.to_string()))
}

fn le_bytes8(c: &[u8]) -> [u8; 8] {
    [c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_aligned() {
        let bytes = encode_npy(&NdArray::from_vec(vec![1.0f64, 2.0, 3.0]));
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!((10 + header_len) % 64, 0);
        assert_eq!(bytes[10 + header_len - 1], b'\n');
        assert_eq!(bytes.len(), 10 + header_len + 24);
    }

    #[test]
    fn test_header_literal() {
        let a = NdArray::new(vec![2, 3], vec![0i64; 6]).unwrap();
        let bytes = encode_npy(&a);
        let text = String::from_utf8_lossy(&bytes[10..80]);
        assert!(text.starts_with("{'descr': '<i8', 'fortran_order': False, 'shape': (2, 3), }"));
    }

    #[test]
    fn test_matrix_preserves_shape_and_dtype() {
        let a = NdArray::new(vec![2, 2], vec![1.5f32, -2.0, 0.0, 4.25]).unwrap();
        let back = decode_npy(&encode_npy(&a)).unwrap();
        assert_eq!(back, a);
        assert_eq!(back.shape(), &[2, 2]);
    }

    #[test]
    fn test_scalar_and_empty() {
        let scalar = NdArray::new(vec![], vec![3i32]).unwrap();
        assert_eq!(decode_npy(&encode_npy(&scalar)).unwrap(), scalar);

        let empty = NdArray::new(vec![0, 4], Vec::<f64>::new()).unwrap();
        assert_eq!(decode_npy(&encode_npy(&empty)).unwrap(), empty);
    }

    #[test]
    fn test_decodes_numpy_written_v1_header() {
        // np.save(f, np.array([[1]])) on a little-endian machine
        let dict = "{'descr': '<i8', 'fortran_order': False, 'shape': (1, 1), }";
        let mut header = dict.to_string();
        while (10 + header.len() + 1) % 64 != 0 {
            header.push(' ');
        }
        header.push('\n');

        let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&1i64.to_le_bytes());

        let a = decode_npy(&bytes).unwrap();
        assert_eq!(a.shape(), &[1, 1]);
        assert_eq!(a.as_slice::<i64>(), Some(&[1i64][..]));
    }

    #[test]
    fn test_decodes_v2_header() {
        let header = "{'descr': '|b1', 'fortran_order': False, 'shape': (2,), }\n";
        let mut bytes = b"\x93NUMPY\x02\x00".to_vec();
        bytes.extend_from_slice(&(header.len() as u32).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&[1, 0]);

        let a = decode_npy(&bytes).unwrap();
        assert_eq!(a.as_slice::<bool>(), Some(&[true, false][..]));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            decode_npy(b"not an array"),
            Err(CodecError::Format(_))
        ));
    }

    #[test]
    fn test_rejects_truncated_data() {
        let mut bytes = encode_npy(&NdArray::from_vec(vec![1.0f64, 2.0]));
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(decode_npy(&bytes), Err(CodecError::Format(_))));
    }

    #[test]
    fn test_rejects_fortran_and_big_endian() {
        let fortran = "{'descr': '<f8', 'fortran_order': True, 'shape': (1,), }\n";
        let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
        bytes.extend_from_slice(&(fortran.len() as u16).to_le_bytes());
        bytes.extend_from_slice(fortran.as_bytes());
        bytes.extend_from_slice(&0f64.to_le_bytes());
        assert!(matches!(decode_npy(&bytes), Err(CodecError::Unsupported(_))));

        let big = "{'descr': '>f8', 'fortran_order': False, 'shape': (1,), }\n";
        let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
        bytes.extend_from_slice(&(big.len() as u16).to_le_bytes());
        bytes.extend_from_slice(big.as_bytes());
        bytes.extend_from_slice(&0f64.to_be_bytes());
        assert!(matches!(decode_npy(&bytes), Err(CodecError::Unsupported(_))));
    }

    fn v1_bytes(dict: &str, body: &[u8]) -> Vec<u8> {
        let header = format!("{}\n", dict);
        let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn test_overflowing_shape_is_a_format_error() {
        let dims = format!("({}, 2)", usize::MAX);
        let dict = format!("{{'descr': '|u1', 'fortran_order': False, 'shape': {}, }}", dims);
        let err = decode_npy(&v1_bytes(&dict, &[])).unwrap_err();
        assert!(matches!(err, CodecError::Format(_)), "{err}");

        let dims = format!("({},)", usize::MAX / 2);
        let dict = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': {}, }}", dims);
        assert!(matches!(
            decode_npy(&v1_bytes(&dict, &[0; 8])),
            Err(CodecError::Format(_))
        ));
    }

    #[test]
    fn test_large_header_switches_to_v2() {
        let a = NdArray::new(vec![1; 22000], vec![7u8]).unwrap();
        let bytes = encode_npy(&a);
        assert_eq!(&bytes[6..8], &[2, 0]);

        let header_len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        assert!(header_len > usize::from(u16::MAX));
        assert_eq!((12 + header_len) % 64, 0);

        let back = decode_npy(&bytes).unwrap();
        assert_eq!(back.ndim(), 22000);
        assert_eq!(back, a);
    }
}
