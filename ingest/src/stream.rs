use std::io::BufRead;

use anyhow::{bail, Result};
use wikiseek_core::SCANNER_BUFFER;

/// One framed `<page>…</page>` region of the dump, kept as raw bytes.
#[derive(Debug)]
pub struct PageBlock {
    /// Line number to pass back as `--resume` to re-ingest this page.
    pub start_line: u64,
    pub xml: Vec<u8>,
}

/// Streams framed pages out of a line-oriented reader.
///
/// Lines are numbered from 1. Lines before `resume` are read and discarded
/// without framing. A line containing `<page>` opens a frame recorded at
/// `line_num - 1`; every line of an open frame is buffered, newline included;
/// a line containing `</page>` closes and yields the frame. A line carrying
/// both tags yields a single-line frame.
pub struct PageFramer<R> {
    reader: R,
    resume: u64,
    line_num: u64,
    start_line: u64,
    in_page: bool,
    line: Vec<u8>,
    buffer: Vec<u8>,
}

impl<R: BufRead> PageFramer<R> {
    pub fn new(reader: R, resume: u64) -> Self {
        Self {
            reader,
            resume,
            line_num: 0,
            start_line: 0,
            in_page: false,
            line: Vec::new(),
            buffer: Vec::new(),
        }
    }

    /// Next framed page, or `Ok(None)` at end of stream.
    pub fn next_page(&mut self) -> Result<Option<PageBlock>> {
        loop {
            self.line.clear();
            let n = self.reader.read_until(b'\n', &mut self.line)?;
            if n == 0 {
                return Ok(None);
            }
            self.line_num += 1;
            if self.line.len() > SCANNER_BUFFER {
                bail!("line {} exceeds the scanner buffer", self.line_num);
            }
            if self.line_num < self.resume {
                continue;
            }

            if contains(&self.line, b"<page>") {
                self.start_line = self.line_num - 1;
                self.in_page = true;
            }
            if self.in_page {
                self.buffer.extend_from_slice(&self.line);
                if contains(&self.line, b"</page>") {
                    self.in_page = false;
                    let xml = std::mem::take(&mut self.buffer);
                    return Ok(Some(PageBlock {
                        start_line: self.start_line,
                        xml,
                    }));
                }
            }
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frames(input: &str, resume: u64) -> Vec<PageBlock> {
        let mut framer = PageFramer::new(Cursor::new(input.to_string()), resume);
        let mut out = Vec::new();
        while let Some(block) = framer.next_page().unwrap() {
            out.push(block);
        }
        out
    }

    #[test]
    fn frames_one_page_with_surrounding_junk() {
        let input = "junk\n<page>\n<title>A</title><ns>0</ns>\
                     <revision><text>hello world</text></revision>\n</page>\ntrailer\n";
        let blocks = frames(input, 0);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line, 1);
        let xml = String::from_utf8(blocks[0].xml.clone()).unwrap();
        assert!(xml.starts_with("<page>"));
        assert!(xml.trim_end().ends_with("</page>"));
        assert!(xml.contains("hello world"));
    }

    #[test]
    fn open_and_close_on_one_line() {
        let blocks = frames("noise\n<page><title>B</title></page>\nnoise\n", 0);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].xml, b"<page><title>B</title></page>\n");
    }

    #[test]
    fn frames_every_page_in_order() {
        let input = "<page>\n<title>One</title>\n</page>\n<page>\n<title>Two</title>\n</page>\n";
        let blocks = frames(input, 0);
        assert_eq!(blocks.len(), 2);
        assert!(contains(&blocks[0].xml, b"One"));
        assert!(contains(&blocks[1].xml, b"Two"));
        assert_eq!(blocks[0].start_line, 0);
        assert_eq!(blocks[1].start_line, 3);
    }

    #[test]
    fn resume_skips_pages_that_start_earlier() {
        let input = "<page>\n<title>One</title>\n</page>\n<page>\n<title>Two</title>\n</page>\n";
        // line 4 is the second <page>; everything before it is discarded
        let blocks = frames(input, 4);
        assert_eq!(blocks.len(), 1);
        assert!(contains(&blocks[0].xml, b"Two"));
        assert_eq!(blocks[0].start_line, 3);
    }

    #[test]
    fn resume_into_the_middle_of_a_page_drops_it() {
        let input = "<page>\n<title>One</title>\n</page>\n<page>\n<title>Two</title>\n</page>\n";
        let blocks = frames(input, 2);
        assert_eq!(blocks.len(), 1);
        assert!(contains(&blocks[0].xml, b"Two"));
    }

    #[test]
    fn stray_close_tag_outside_a_frame_is_ignored() {
        let blocks = frames("</page>\n<page>ok</page>\n", 0);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].xml, b"<page>ok</page>\n");
    }

    #[test]
    fn reads_through_a_bzip2_stream() {
        use bzip2::write::BzEncoder;
        use bzip2::Compression;
        use std::io::{BufReader, Write};

        let mut enc = BzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(b"<page>\n<title>Zipped</title>\n</page>\n").unwrap();
        let compressed = enc.finish().unwrap();

        let decoder = bzip2::bufread::MultiBzDecoder::new(Cursor::new(compressed));
        let mut framer = PageFramer::new(BufReader::new(decoder), 0);
        let block = framer.next_page().unwrap().unwrap();
        assert!(contains(&block.xml, b"Zipped"));
        assert!(framer.next_page().unwrap().is_none());
    }
}
