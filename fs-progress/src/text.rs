use std::io::{self, BufRead, Read, Seek, SeekFrom};

use encoding_rs::{Decoder, DecoderResult, Encoding};

/// Streams the text of a byte source as UTF-8.
///
/// A byte order mark is removed. Malformed input surfaces as an
/// [`io::ErrorKind::InvalidData`] error once everything decoded before
/// it has been read.
pub struct TextReader<R> {
    inner: R,
    encoding: &'static Encoding,
    decoder: Decoder,
    decoded: Vec<u8>,
    pos: usize,
    // source bytes fed to the decoder since the last reset
    consumed: u64,
    malformed: Option<u64>,
    eof: bool,
}

impl<R: BufRead> TextReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoding,
            decoder: encoding.new_decoder_with_bom_removal(),
            decoded: Vec::new(),
            pos: 0,
            consumed: 0,
            malformed: None,
            eof: false,
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn decode_more(&mut self) -> io::Result<()> {
        let input = self.inner.fill_buf()?;
        let last = input.is_empty();

        let capacity = self
            .decoder
            .max_utf8_buffer_length_without_replacement(input.len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::OutOfMemory,
                    "decode buffer overflow",
                )
            })?;
        self.decoded.clear();
        self.decoded.resize(capacity, 0);
        self.pos = 0;

        let (result, read, written) = self
            .decoder
            .decode_to_utf8_without_replacement(input, &mut self.decoded, last);
        self.decoded.truncate(written);
        self.inner.consume(read);
        self.consumed += read as u64;

        match result {
            DecoderResult::InputEmpty => self.eof = last,
            DecoderResult::OutputFull => {}
            DecoderResult::Malformed(bad, after) => {
                let position =
                    self.consumed - u64::from(after) - u64::from(bad);
                log::debug!(
                    "text/{}: malformed input at byte {position}",
                    self.encoding.name()
                );
                self.malformed = Some(position);
            }
        }
        Ok(())
    }
}

impl<R: BufRead> BufRead for TextReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        while self.pos == self.decoded.len() && !self.eof {
            if let Some(position) = self.malformed {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Failed to decode {} text at byte {position}",
                        self.encoding.name()
                    ),
                ));
            }
            self.decode_more()?;
        }
        Ok(&self.decoded[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.decoded.len());
    }
}

impl<R: BufRead> Read for TextReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

/// Positions are offsets into the source bytes, not into the decoded
/// text, so only absolute seeks are meaningful.
impl<R: BufRead + Seek> Seek for TextReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if let SeekFrom::Current(_) = pos {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "relative seeks are not supported in text mode",
            ));
        }
        let position = self.inner.seek(pos)?;
        self.decoder = if position == 0 {
            self.encoding.new_decoder_with_bom_removal()
        } else {
            self.encoding.new_decoder_without_bom_handling()
        };
        self.decoded.clear();
        self.pos = 0;
        self.consumed = position;
        self.malformed = None;
        self.eof = false;
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, UTF_16LE, UTF_8, WINDOWS_1252};
    use rstest::rstest;
    use std::io::{BufReader, Cursor};

    fn text(
        bytes: &[u8],
        encoding: &'static Encoding,
        capacity: usize,
    ) -> io::Result<String> {
        let source =
            BufReader::with_capacity(capacity, Cursor::new(bytes.to_vec()));
        let mut out = String::new();
        TextReader::new(source, encoding).read_to_string(&mut out)?;
        Ok(out)
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(64)]
    fn utf8_survives_any_buffer(#[case] capacity: usize) {
        let sample = "naïve café\nпривет\n日本語\n🎉\n";
        assert_eq!(text(sample.as_bytes(), UTF_8, capacity).unwrap(), sample);
    }

    #[test]
    fn bom_is_removed() {
        let bytes = b"\xEF\xBB\xBFhello\n";
        assert_eq!(text(bytes, UTF_8, 8).unwrap(), "hello\n");
    }

    #[test]
    fn legacy_encodings_are_converted() {
        assert_eq!(text(b"caf\xE9\n", WINDOWS_1252, 2).unwrap(), "café\n");
        assert_eq!(text(b"\x93\xFA\x96\x7B", SHIFT_JIS, 1).unwrap(), "日本");

        let mut bytes = Vec::new();
        for unit in "abc".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(text(&bytes, UTF_16LE, 3).unwrap(), "abc");
    }

    #[test]
    fn lines_are_read_in_order() {
        let source = BufReader::new(Cursor::new(b"one\ntwo\nthree".to_vec()));
        let lines: Vec<String> = TextReader::new(source, UTF_8)
            .lines()
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn malformed_input_fails_after_the_good_prefix() {
        let source = BufReader::new(Cursor::new(b"good\n\xFFbad\n".to_vec()));
        let mut reader = TextReader::new(source, UTF_8);

        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "good\n");

        let err = reader.read_line(&mut String::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("byte 5"));
    }

    #[test]
    fn truncated_sequence_at_end_is_malformed() {
        let err = text(b"ok\xE6\x97", UTF_8, 4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn absolute_seek_restarts_decoding() {
        let source = BufReader::new(Cursor::new("αβγ\nδ".as_bytes().to_vec()));
        let mut reader = TextReader::new(source, UTF_8);
        let mut all = String::new();
        reader.read_to_string(&mut all).unwrap();

        assert_eq!(reader.seek(SeekFrom::Start(2)).unwrap(), 2);
        let mut tail = String::new();
        reader.read_to_string(&mut tail).unwrap();
        assert_eq!(tail, "βγ\nδ");

        let err = reader.seek(SeekFrom::Current(0)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
