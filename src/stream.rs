//! Line-at-a-time character cursor the grammar reads from.

use std::borrow::Cow;
use std::io::BufRead;

use crate::error::{OboError, Result};

/// Holds the current line of the input and a byte position inside it.
/// `None` for the current line means the input is exhausted.
pub struct LineStream {
    reader: Box<dyn BufRead>,
    line: Option<String>,
    line_no: usize,
    pos: usize,
}

impl LineStream {
    pub fn new(reader: Box<dyn BufRead>) -> Result<Self> {
        let mut stream = Self {
            reader,
            line: None,
            line_no: 0,
            pos: 0,
        };
        stream.advance_line()?;
        Ok(stream)
    }

    /// Reads the next line, dropping its line terminator.
    pub fn advance_line(&mut self) -> Result<()> {
        let mut buffer = String::new();
        match self.reader.read_line(&mut buffer) {
            Ok(0) => {
                self.line = None;
            }
            Ok(_) => {
                if buffer.ends_with('\n') {
                    buffer.pop();
                    if buffer.ends_with('\r') {
                        buffer.pop();
                    }
                }
                self.line = Some(buffer);
                self.line_no += 1;
            }
            Err(e) => {
                return Err(OboError::parse_caused(
                    "Error reading from input.",
                    self.line_no,
                    self.line(),
                    e,
                ));
            }
        }
        self.pos = 0;
        Ok(())
    }

    /// The current raw line, empty once the input is exhausted.
    pub fn line(&self) -> &str {
        self.line.as_deref().unwrap_or("")
    }
    pub fn line_no(&self) -> usize {
        self.line_no
    }
    pub fn pos(&self) -> usize {
        self.pos
    }
    pub fn eof(&self) -> bool {
        self.line.is_none()
    }
    pub fn eol(&self) -> bool {
        match &self.line {
            Some(line) => self.pos >= line.len(),
            None => false,
        }
    }
    /// Unread remainder of the current line.
    pub fn rest(&self) -> &str {
        match &self.line {
            Some(line) if self.pos < line.len() => &line[self.pos..],
            _ => "",
        }
    }
    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }
    pub fn peek_char_is(&self, c: char) -> bool {
        self.peek_char() == Some(c)
    }
    /// Moves forward by a number of bytes, never past the end of the line.
    pub fn advance(&mut self, bytes: usize) {
        let len = self.line().len();
        self.pos = (self.pos + bytes).min(len);
    }
    /// Skips one character, whatever its width.
    pub fn advance_char(&mut self) {
        if let Some(c) = self.peek_char() {
            self.advance(c.len_utf8());
        }
    }
    /// Consumes `s` if the rest of the line starts with it. A rest made of
    /// whitespace only never matches.
    pub fn consume(&mut self, s: &str) -> bool {
        let rest = self.rest();
        if rest.trim().is_empty() {
            return false;
        }
        if rest.starts_with(s) {
            self.pos += s.len();
            return true;
        }
        false
    }
    /// Byte offset of `c` from the current position.
    pub fn index_of(&self, c: char) -> Option<usize> {
        if self.eof() {
            return None;
        }
        self.rest().find(c)
    }
    pub fn force_eol(&mut self) {
        self.pos = self.line().len();
    }

    /// Scans the rest of the line up to (not including) the first character
    /// in `delimiters` and consumes what was scanned. A backslash and the
    /// character after it are always taken together, so an escaped delimiter
    /// never terminates the scan. With `comma_needs_space`, a comma only
    /// terminates when a space follows it.
    pub fn scan_until(&mut self, delimiters: &str, comma_needs_space: bool) -> String {
        let rest = self.rest();
        let mut chars = rest.char_indices().peekable();
        let mut end = rest.len();
        let mut escaped = false;
        while let Some((i, c)) = chars.next() {
            if c == '\\' {
                escaped = true;
                chars.next();
                continue;
            }
            if delimiters.contains(c) {
                if comma_needs_space && c == ',' {
                    if matches!(chars.peek(), Some((_, ' '))) {
                        end = i;
                        break;
                    }
                } else {
                    end = i;
                    break;
                }
            }
        }
        let scanned = &rest[..end];
        let value = if escaped {
            unescape(scanned).into_owned()
        } else {
            scanned.to_owned()
        };
        self.advance(end);
        value
    }
}

/// Decodes backslash escapes: `\n` newline, `\W` space, `\t` tab, and any
/// other `\x` becomes `x`. A lone trailing backslash is dropped.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    let mut decoded = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => decoded.push('\n'),
            Some('W') => decoded.push(' '),
            Some('t') => decoded.push('\t'),
            Some(other) => decoded.push(other),
            None => {}
        }
    }
    Cow::Owned(decoded)
}
