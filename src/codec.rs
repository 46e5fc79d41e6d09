//! Base64 decoding for PEM-style payloads stored in config values.

use crate::error::{ConfError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::{DecodeSliceError, Engine};

/// Decode a standard-alphabet base64 string into `out`.
///
/// Returns the number of bytes written. Input must be canonically padded: the
/// length is a multiple of four, `=` appears only at the very end, and unused
/// padding bits are zero. Bytes outside the alphabet (including any with the
/// high bit set) are rejected.
pub fn decode_base64(out: &mut [u8], input: &str) -> Result<usize> {
	STANDARD
		.decode_slice(input.as_bytes(), out)
		.map_err(|err| match err {
			DecodeSliceError::DecodeError(source) => ConfError::InvalidBase64 { source },
			DecodeSliceError::OutputSliceTooSmall => ConfError::BufferTooSmall {
				available: out.len(),
			},
		})
}

/// Decode a base64 string into a freshly allocated buffer.
pub fn decode_base64_to_vec(input: &str) -> Result<Vec<u8>> {
	let mut out = vec![0u8; input.len() / 4 * 3];
	let len = decode_base64(&mut out, input)?;
	out.truncate(len);
	Ok(out)
}
