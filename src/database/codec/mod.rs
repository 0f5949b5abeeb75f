
use thiserror::Error;

/// Current on-disk vector format
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 1 + 4;
const FLOAT_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("Embedding blob is {0} bytes, shorter than the 5-byte header")]
    Truncated(usize),
    #[error("Unsupported embedding format version {0}")]
    UnsupportedVersion(u8),
    #[error("Embedding blob declares {declared} values but carries {actual} bytes of data")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("Embedding of {0} values is too long to encode")]
    TooLong(usize),
}

/// Encode as `[version: u8][len: u32 LE][len x f32 LE]`
#[inline]
pub fn encode_embedding(embedding: &[f32]) -> Result<Vec<u8>, EncodingError> {
    let len = u32::try_from(embedding.len()).map_err(|_| EncodingError::TooLong(embedding.len()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + embedding.len() * FLOAT_LEN);
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&len.to_le_bytes());
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }

    Ok(bytes)
}

#[inline]
pub fn decode_embedding(bytes: &[u8]) -> Result<Vec<f32>, EncodingError> {
    let Some((&version, rest)) = bytes.split_first() else {
        return Err(EncodingError::Truncated(bytes.len()));
    };
    if version != FORMAT_VERSION {
        return Err(EncodingError::UnsupportedVersion(version));
    }
    let Some((len_bytes, data)) = rest.split_first_chunk::<4>() else {
        return Err(EncodingError::Truncated(bytes.len()));
    };

    let declared = u32::from_le_bytes(*len_bytes) as usize;
    if declared.checked_mul(FLOAT_LEN) != Some(data.len()) {
        return Err(EncodingError::LengthMismatch {
            declared,
            actual: data.len(),
        });
    }

    Ok(data
        .chunks_exact(FLOAT_LEN)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
