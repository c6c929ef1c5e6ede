use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("invalid character {byte:#04x} at offset {offset}")]
    InvalidCharacter { offset: usize, byte: u8 },
    #[error("invalid length ({0} symbols)")]
    InvalidLength(usize),
    #[error("malformed padding")]
    InvalidPadding,
}

impl From<base64::DecodeError> for EncodingError {
    fn from(e: base64::DecodeError) -> Self {
        match e {
            base64::DecodeError::InvalidByte(offset, byte)
            | base64::DecodeError::InvalidLastSymbol(offset, byte) => {
                Self::InvalidCharacter { offset, byte }
            }
            base64::DecodeError::InvalidLength(len) => Self::InvalidLength(len),
            base64::DecodeError::InvalidPadding => Self::InvalidPadding,
        }
    }
}

/// Encode bytes as unpadded base64url text.
pub fn encode(bytes: &[u8]) -> String {
    BASE64URL.encode(bytes)
}

/// Decode base64url text, padded or not.
pub fn decode(text: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(BASE64URL.decode(text)?)
}
