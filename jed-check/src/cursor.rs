//! Byte cursor used by the fuse-map scan.
//!
//! Every read goes through [`Cursor::peek`], which returns `None` once the
//! cursor has run off the end of the content. That `None` is the only
//! end-of-stream signal the scan uses.

/// A saved cursor position. Only [`Cursor::rewind`] consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

impl Mark {
    /// Byte offset of the saved position.
    #[must_use]
    pub fn offset(self) -> usize {
        self.0
    }
}

/// Forward-moving read position over the file content.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(content: &'a str) -> Self {
        Self {
            text: content,
            bytes: content.as_bytes(),
            pos: 0,
        }
    }

    /// Current byte offset.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Byte under the cursor, or `None` at end of stream.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Character under the cursor, or `None` at end of stream.
    ///
    /// Only meaningful on a character boundary, which every ASCII marker
    /// leaves the cursor on.
    #[must_use]
    pub fn peek_char(&self) -> Option<char> {
        self.text.get(self.pos..)?.chars().next()
    }

    /// Move past the character under the cursor.
    pub fn advance_char(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    /// Number of characters between `start` and the cursor.
    #[must_use]
    pub fn chars_since(&self, start: usize) -> usize {
        self.text
            .get(start..self.pos)
            .map_or(0, |span| span.chars().count())
    }

    /// Move one byte forward. Never moves past end of stream.
    pub fn advance(&mut self) {
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
    }

    /// Whether the bytes immediately before the cursor are exactly `marker`.
    ///
    /// Positions before the start of the content never match, so a marker
    /// cannot be found "straddling" offset zero.
    #[must_use]
    pub fn preceded_by(&self, marker: &[u8]) -> bool {
        self.pos
            .checked_sub(marker.len())
            .and_then(|start| self.bytes.get(start..self.pos))
            .is_some_and(|window| window == marker)
    }

    /// Advance until `marker` sits immediately before the cursor.
    ///
    /// Returns `None` if end of stream is reached first. A marker that ends
    /// exactly at end of stream does not count: the cursor must still point
    /// at a byte.
    pub fn seek_past(&mut self, marker: &[u8]) -> Option<()> {
        loop {
            self.peek()?;
            if self.preceded_by(marker) {
                return Some(());
            }
            self.advance();
        }
    }

    /// Advance until `byte` is under the cursor. `None` at end of stream.
    pub fn seek_to(&mut self, byte: u8) -> Option<()> {
        loop {
            if self.peek()? == byte {
                return Some(());
            }
            self.advance();
        }
    }

    /// Consume bytes while `pred` holds and return how many were consumed.
    pub fn count_while(&mut self, mut pred: impl FnMut(u8) -> bool) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(&mut pred) {
            self.advance();
        }
        self.pos - start
    }

    /// Skip bytes while `pred` holds.
    pub fn skip_while(&mut self, pred: impl FnMut(u8) -> bool) {
        self.count_while(pred);
    }

    #[must_use]
    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    /// Jump back to a saved position.
    ///
    /// This is the only way the cursor ever moves backwards.
    pub fn rewind(&mut self, mark: Mark) {
        self.pos = mark.0;
    }
}
