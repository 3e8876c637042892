use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom};
use std::iter::FusedIterator;

use data_error::{ArkIoError, Result};
use encoding_rs::Encoding;

use crate::decode::BackwardDecoder;
use crate::options::ReverseOptions;

/// Lines of a seekable source, last line first.
///
/// The source is read backward in chunks of `buffer_size` bytes, so memory
/// use is bounded by the chunk size plus the longest line. Lines are
/// returned without their line terminator; a trailing `'\r'` is removed
/// as well.
///
/// The reader owns the source and releases it when dropped.
/// After the first error the iterator is exhausted.
pub struct ReverseLines<R, D = &'static Encoding> {
    source: R,
    decoder: D,
    allow_empty_lines: bool,
    buffer_size: u64,
    file_size: u64,
    /// Distance from the end of the source to the start of the last chunk.
    offset: u64,
    /// Leading fragment of the last chunk. It may still be continued by
    /// the bytes in front of it.
    pending: Option<String>,
    /// Complete lines of the last chunk, the next one at the back.
    ready: Vec<String>,
    chunk: Vec<u8>,
    failed: bool,
}

impl<R: Read + Seek, D: BackwardDecoder> ReverseLines<R, D> {
    /// Validate `options` and measure the source.
    ///
    /// Options are checked before the source is touched.
    pub fn new(mut source: R, options: ReverseOptions<D>) -> Result<Self> {
        options.validate()?;
        let file_size = source.seek(SeekFrom::End(0))?;
        log::debug!(
            "reverse/{}: {} bytes in chunks of {}",
            options.decoder.name(),
            file_size,
            options.buffer_size
        );

        Ok(Self {
            source,
            decoder: options.decoder,
            allow_empty_lines: options.allow_empty_lines,
            buffer_size: options.buffer_size as u64,
            file_size,
            offset: 0,
            pending: None,
            ready: Vec::new(),
            chunk: Vec::with_capacity(options.buffer_size),
            failed: false,
        })
    }

    /// Pull a single line, `Ok(None)` once the start of the source is reached.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.next() {
            Some(line) => line.map(Some),
            None => Ok(None),
        }
    }

    /// Size of the source in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Bytes in front of the cursor which are not read yet.
    pub fn remaining(&self) -> u64 {
        self.file_size - self.offset
    }

    /// Stop reading and release the source.
    pub fn close(self) {}

    /// Stop reading and hand the source back.
    /// Its position is left wherever the last chunk read ended.
    pub fn into_inner(self) -> R {
        self.source
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.ready.pop() {
                return Ok(Some(line));
            }
            if self.remaining() == 0 {
                // The first line of the source, or all of it
                // if it has no line breaks.
                let first = self.pending.take();
                return Ok(first.and_then(|line| self.keep(line)));
            }
            self.read_chunk()?;
        }
    }

    fn read_chunk(&mut self) -> Result<()> {
        let len = self.remaining().min(self.buffer_size) as usize;
        self.offset = (self.offset + self.buffer_size).min(self.file_size);
        let start = self.file_size - self.offset;

        let mut chunk = std::mem::take(&mut self.chunk);
        chunk.resize(len, 0);
        self.source.seek(SeekFrom::Start(start))?;
        self.source.read_exact(&mut chunk)?;

        let (skipped, text) = decode_backward(&self.decoder, &chunk, start)?;
        // Skipped bytes belong to a character which the next chunk reads whole.
        self.offset -= skipped as u64;
        let text = text.into_owned();
        self.chunk = chunk;

        self.split_chunk(&text);
        Ok(())
    }

    fn split_chunk(&mut self, text: &str) {
        let on_boundary = text.ends_with('\n');
        let mut fragments: Vec<String> =
            text.split('\n').map(str::to_owned).collect();
        if on_boundary {
            // Nothing follows the last break inside this chunk.
            fragments.pop();
        }

        let completed = match self.pending.take() {
            // The chunk ends where the pending segment begins,
            // so the segment is a whole line already.
            Some(pending) if on_boundary => Some(pending),
            Some(pending) => {
                if let Some(last) = fragments.last_mut() {
                    last.push_str(&pending);
                }
                None
            }
            None => None,
        };

        let mut fragments = fragments.into_iter();
        self.pending = fragments.next();
        for line in fragments {
            if let Some(line) = self.keep(line) {
                self.ready.push(line);
            }
        }
        if let Some(line) = completed.and_then(|line| self.keep(line)) {
            self.ready.push(line);
        }
    }

    fn keep(&self, mut line: String) -> Option<String> {
        if line.ends_with('\r') {
            line.pop();
        }
        if line.is_empty() && !self.allow_empty_lines {
            None
        } else {
            Some(line)
        }
    }
}

/// Decode a chunk whose first bytes may be the tail of a character.
///
/// Returns the number of leading bytes dropped and the decoded text.
/// A chunk starting at the beginning of the source cannot have a partial
/// character in front, so it gets a single attempt.
fn decode_backward<'a, D: BackwardDecoder>(
    decoder: &D,
    chunk: &'a [u8],
    start: u64,
) -> Result<(usize, Cow<'a, str>)> {
    let attempts = if start == 0 {
        1
    } else {
        decoder.max_char_bytes().min(chunk.len())
    };

    for skipped in 0..attempts {
        if let Some(text) = decoder.decode_strict(&chunk[skipped..]) {
            if skipped > 0 {
                log::debug!(
                    "reverse/{}: skipped {} leading bytes at {}",
                    decoder.name(),
                    skipped,
                    start
                );
            }
            return Ok((skipped, text));
        }
    }

    log::debug!(
        "reverse/{}: giving up after {} attempts at {}",
        decoder.name(),
        attempts,
        start
    );
    Err(ArkIoError::Decode {
        encoding: decoder.name(),
        position: start,
    })
}

impl<R: Read + Seek, D: BackwardDecoder> Iterator for ReverseLines<R, D> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_line() {
            Ok(line) => line.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl<R: Read + Seek, D: BackwardDecoder> FusedIterator for ReverseLines<R, D> {}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{
        BIG5, GB18030, GBK, SHIFT_JIS, UTF_16BE, UTF_16LE, WINDOWS_1252,
    };
    use rstest::rstest;
    use std::io::Cursor;

    fn collect_with(
        data: &[u8],
        options: ReverseOptions,
    ) -> Vec<String> {
        ReverseLines::new(Cursor::new(data.to_vec()), options)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn collect(data: &str, buffer_size: usize) -> Vec<String> {
        collect_with(
            data.as_bytes(),
            ReverseOptions::default().buffer_size(buffer_size),
        )
    }

    fn collect_all(data: &str, buffer_size: usize) -> Vec<String> {
        collect_with(
            data.as_bytes(),
            ReverseOptions::default()
                .buffer_size(buffer_size)
                .allow_empty_lines(true),
        )
    }

    fn utf16(text: &str, little_endian: bool) -> Vec<u8> {
        text.encode_utf16()
            .flat_map(|unit| {
                if little_endian {
                    unit.to_le_bytes()
                } else {
                    unit.to_be_bytes()
                }
            })
            .collect()
    }

    /// Panics on any I/O so tests can prove nothing was read.
    struct Untouchable;

    impl Read for Untouchable {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            panic!("source must not be read")
        }
    }

    impl Seek for Untouchable {
        fn seek(&mut self, _: SeekFrom) -> std::io::Result<u64> {
            panic!("source must not be sought")
        }
    }

    #[rstest]
    #[case(4)]
    #[case(5)]
    #[case(7)]
    #[case(16)]
    #[case(1024)]
    fn lines_come_out_last_first(#[case] buffer_size: usize) {
        assert_eq!(
            collect("first\nsecond\nthird\n", buffer_size),
            vec!["third", "second", "first"]
        );
    }

    #[rstest]
    #[case(4)]
    #[case(6)]
    #[case(1024)]
    fn missing_final_newline_keeps_the_last_line(#[case] buffer_size: usize) {
        assert_eq!(collect("a\nbb\nccc", buffer_size), vec!["ccc", "bb", "a"]);
    }

    #[test]
    fn single_line_without_breaks_is_returned_once() {
        assert_eq!(collect("lonely line", 4), vec!["lonely line"]);
        assert_eq!(collect("lonely line", 4096), vec!["lonely line"]);
    }

    #[test]
    fn empty_source_yields_nothing() {
        assert!(collect("", 4).is_empty());
        assert!(collect_all("", 4).is_empty());
    }

    #[rstest]
    #[case(4)]
    #[case(5)]
    #[case(1024)]
    fn blank_lines_follow_the_policy(#[case] buffer_size: usize) {
        let data = "a\n\n\nb\n";
        assert_eq!(collect(data, buffer_size), vec!["b", "a"]);
        assert_eq!(collect_all(data, buffer_size), vec!["b", "", "", "a"]);
    }

    #[rstest]
    #[case(4)]
    #[case(1024)]
    fn empty_first_line_follows_the_policy(#[case] buffer_size: usize) {
        assert_eq!(collect("\nx\n", buffer_size), vec!["x"]);
        assert_eq!(collect_all("\nx\n", buffer_size), vec!["x", ""]);
    }

    #[test]
    fn chunk_ending_on_a_line_break_flushes_pending_segment() {
        // a buffer of 3 splits "ab\ncd\n" exactly after the first break
        let data = "ab\ncd\n".as_bytes();
        let options = ReverseOptions::default()
            .encoding(WINDOWS_1252)
            .buffer_size(3);
        assert_eq!(collect_with(data, options), vec!["cd", "ab"]);
    }

    #[test]
    fn chunk_ending_inside_a_line_joins_pending_segment() {
        let options = ReverseOptions::default()
            .encoding(WINDOWS_1252)
            .buffer_size(2);
        assert_eq!(
            collect_with(b"abcd\nefgh\n", options),
            vec!["efgh", "abcd"]
        );
    }

    #[test]
    fn blank_line_on_a_chunk_boundary_is_kept_once() {
        let options = ReverseOptions::default()
            .encoding(WINDOWS_1252)
            .allow_empty_lines(true);
        for buffer_size in 1..8 {
            let lines = collect_with(
                b"x\n\ny\n",
                options.clone().buffer_size(buffer_size),
            );
            assert_eq!(lines, vec!["y", "", "x"], "buffer {}", buffer_size);
        }
    }

    #[rstest]
    #[case(4)]
    #[case(5)]
    #[case(6)]
    #[case(7)]
    #[case(8)]
    #[case(9)]
    #[case(13)]
    #[case(1024)]
    fn multibyte_characters_survive_chunk_splits(#[case] buffer_size: usize) {
        let data = "héllo wörld\n日本語のテキスト\n🎉 party 🎉\nplain\n";
        assert_eq!(
            collect(data, buffer_size),
            vec!["plain", "🎉 party 🎉", "日本語のテキスト", "héllo wörld"]
        );
    }

    #[rstest]
    #[case(4)]
    #[case(5)]
    #[case(6)]
    #[case(7)]
    #[case(10)]
    #[case(1024)]
    fn utf16_surrogates_survive_chunk_splits(#[case] buffer_size: usize) {
        let text = "alpha\nβeta\n😀 smile\n";
        for (encoding, little_endian) in [(UTF_16LE, true), (UTF_16BE, false)]
        {
            let options = ReverseOptions::default()
                .encoding(encoding)
                .buffer_size(buffer_size);
            assert_eq!(
                collect_with(&utf16(text, little_endian), options),
                vec!["😀 smile", "βeta", "alpha"]
            );
        }
    }

    #[test]
    fn single_byte_encoding_reads_byte_by_byte() {
        // "café\nnaïve\n" in windows-1252
        let data = b"caf\xe9\nna\xefve\n";
        let options = ReverseOptions::default()
            .encoding(WINDOWS_1252)
            .buffer_size(1);
        assert_eq!(collect_with(data, options), vec!["naïve", "café"]);
    }

    #[rstest]
    #[case(4)]
    #[case(5)]
    #[case(1024)]
    fn crlf_terminators_are_stripped(#[case] buffer_size: usize) {
        assert_eq!(collect("one\r\ntwo\r\n", buffer_size), vec!["two", "one"]);
    }

    #[test]
    fn undecodable_bytes_abort_after_emitted_lines() {
        let data = b"\xff\xff\xff\xff\xff\xff\nfine\nlast\n";
        let options = ReverseOptions::default().buffer_size(8);
        let mut lines =
            ReverseLines::new(Cursor::new(data.to_vec()), options).unwrap();

        assert_eq!(lines.next().unwrap().unwrap(), "last");
        let err = lines.next().unwrap().unwrap_err();
        assert!(matches!(err, ArkIoError::Decode { encoding: "UTF-8", .. }));
        assert!(lines.next().is_none());
    }

    #[test]
    fn malformed_start_of_source_is_not_skipped() {
        let mut lines = ReverseLines::new(
            Cursor::new(b"\xa9abc\n".to_vec()),
            ReverseOptions::default(),
        )
        .unwrap();
        let err = lines.next().unwrap().unwrap_err();
        assert!(matches!(err, ArkIoError::Decode { position: 0, .. }));
    }

    #[test]
    fn invalid_options_are_rejected_before_io() {
        let result = ReverseLines::new(
            Untouchable,
            ReverseOptions::default().buffer_size(2),
        );
        assert!(matches!(result, Err(ArkIoError::Config(_))));
    }

    #[rstest]
    #[case(SHIFT_JIS, "日本\n語\n")]
    #[case(BIG5, "中文字\n一\n")]
    #[case(GB18030, "€𝄞中\nx\n")]
    #[case(GBK, "中文\n字\n")]
    fn ambiguous_multibyte_sources_are_refused_at_every_buffer_size(
        #[case] encoding: &'static Encoding,
        #[case] text: &str,
    ) {
        let (bytes, _, unmappable) = encoding.encode(text);
        assert!(!unmappable);
        for buffer_size in 2..=8 {
            let options = ReverseOptions::default()
                .encoding(encoding)
                .buffer_size(buffer_size);
            let result =
                ReverseLines::new(Cursor::new(bytes.to_vec()), options);
            assert!(
                matches!(result, Err(ArkIoError::Config(_))),
                "buffer {}",
                buffer_size
            );
        }
    }

    #[test]
    fn read_line_pulls_one_line_at_a_time() {
        let mut lines = ReverseLines::new(
            Cursor::new(b"1\n2\n".to_vec()),
            ReverseOptions::default().buffer_size(4),
        )
        .unwrap();
        assert_eq!(lines.file_size(), 4);
        assert_eq!(lines.read_line().unwrap().as_deref(), Some("2"));
        assert_eq!(lines.read_line().unwrap().as_deref(), Some("1"));
        assert_eq!(lines.read_line().unwrap(), None);
        assert_eq!(lines.read_line().unwrap(), None);
        assert_eq!(lines.remaining(), 0);
    }

    #[test]
    fn early_stop_returns_the_source() {
        let mut lines = ReverseLines::new(
            Cursor::new(b"a\nb\nc\n".to_vec()),
            ReverseOptions::default().buffer_size(4),
        )
        .unwrap();
        assert_eq!(lines.next().unwrap().unwrap(), "c");
        let source = lines.into_inner();
        assert_eq!(source.into_inner(), b"a\nb\nc\n");
    }

    struct Ascii;

    impl BackwardDecoder for Ascii {
        fn name(&self) -> &'static str {
            "ascii"
        }

        fn max_char_bytes(&self) -> usize {
            1
        }

        fn decode_strict<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
            if bytes.is_ascii() {
                std::str::from_utf8(bytes).ok().map(Cow::Borrowed)
            } else {
                None
            }
        }
    }

    #[test]
    fn custom_decoders_plug_in() {
        let options = ReverseOptions::default().decoder(Ascii).buffer_size(1);
        let lines: Vec<String> =
            ReverseLines::new(Cursor::new(b"x\ny".to_vec()), options)
                .unwrap()
                .map(|line| line.unwrap())
                .collect();
        assert_eq!(lines, vec!["y", "x"]);

        let options = ReverseOptions::default().decoder(Ascii);
        let mut lines =
            ReverseLines::new(Cursor::new("é".as_bytes().to_vec()), options)
                .unwrap();
        assert!(matches!(
            lines.next(),
            Some(Err(ArkIoError::Decode { encoding: "ascii", .. }))
        ));
    }
}
