use std::borrow::Cow;

use encoding_rs::{
    Encoding, BIG5, EUC_JP, EUC_KR, GB18030, GBK, ISO_2022_JP, REPLACEMENT,
    SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8,
};

/// Longest UTF-8 sequence.
pub const UTF8_MAX_CHAR_BYTES: usize = 4;
/// A surrogate pair.
pub const UTF16_MAX_CHAR_BYTES: usize = 4;
/// GB18030 four-byte sequences (GBK decodes as GB18030).
pub const GB18030_MAX_CHAR_BYTES: usize = 4;
/// EUC-JP three-byte JIS X 0212 sequences.
pub const EUC_JP_MAX_CHAR_BYTES: usize = 3;
/// Big5, Shift_JIS and EUC-KR.
pub const DOUBLE_BYTE_MAX_CHAR_BYTES: usize = 2;
pub const SINGLE_BYTE_MAX_CHAR_BYTES: usize = 1;

/// Decoding of text windows that were cut out of a byte stream
/// from the back.
///
/// A window always ends on a character boundary, but may begin
/// in the middle of a character. The reader retries a failed decode
/// with the first byte dropped, at most [`max_char_bytes`] times in total,
/// so the implementation must fail (rather than substitute) on a
/// truncated leading sequence.
///
/// [`max_char_bytes`]: BackwardDecoder::max_char_bytes
pub trait BackwardDecoder {
    /// Name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Largest number of bytes a single character may occupy.
    fn max_char_bytes(&self) -> usize;

    /// Whether windows can be decoded independently of the bytes
    /// preceding them. Encodings with shift states cannot, and neither
    /// can those where a trail byte may also start a character.
    fn supports_backward(&self) -> bool {
        true
    }

    /// Decode the whole window, returning `None` on any malformed
    /// or incomplete sequence.
    fn decode_strict<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>>;
}

impl BackwardDecoder for &'static Encoding {
    fn name(&self) -> &'static str {
        Encoding::name(*self)
    }

    fn max_char_bytes(&self) -> usize {
        max_char_bytes(*self)
    }

    fn supports_backward(&self) -> bool {
        // Trail bytes of the legacy CJK encodings are also valid lead or
        // single bytes, so a window cannot find its first boundary.
        *self == UTF_8
            || *self == UTF_16LE
            || *self == UTF_16BE
            || (*self != REPLACEMENT
                && max_char_bytes(*self) == SINGLE_BYTE_MAX_CHAR_BYTES)
    }

    fn decode_strict<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        (*self).decode_without_bom_handling_and_without_replacement(bytes)
    }
}

/// Maximum character width of an `encoding_rs` encoding.
pub fn max_char_bytes(encoding: &'static Encoding) -> usize {
    if encoding == UTF_8 {
        UTF8_MAX_CHAR_BYTES
    } else if encoding == UTF_16LE || encoding == UTF_16BE {
        UTF16_MAX_CHAR_BYTES
    } else if encoding == GB18030 || encoding == GBK {
        GB18030_MAX_CHAR_BYTES
    } else if encoding == EUC_JP || encoding == ISO_2022_JP {
        EUC_JP_MAX_CHAR_BYTES
    } else if encoding == BIG5 || encoding == SHIFT_JIS || encoding == EUC_KR
    {
        DOUBLE_BYTE_MAX_CHAR_BYTES
    } else {
        SINGLE_BYTE_MAX_CHAR_BYTES
    }
}
