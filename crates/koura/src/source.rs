/*
 * source.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Restartable cursor over template text.
//!
//! The interpreter reads the template strictly forward, except that a loop
//! captures a [`Position`] after its opening marker and seeks back to it for
//! every iteration.

/// An opaque, restorable offset into a [`Source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(usize);

/// A forward-reading, seekable character cursor.
#[derive(Debug, Clone)]
pub struct Source<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Source<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Capture the current position.
    pub fn position(&self) -> Position {
        Position(self.pos)
    }

    /// Return to a previously captured position.
    ///
    /// A position from another source is clamped to the nearest char
    /// boundary at or before it, and never past the end of this text.
    pub fn seek(&mut self, position: Position) {
        self.pos = self.floor_boundary(position.0);
    }

    fn floor_boundary(&self, mut pos: usize) -> usize {
        pos = pos.min(self.text.len());
        while !self.text.is_char_boundary(pos) {
            pos -= 1;
        }
        pos
    }

    /// Byte offset of the cursor, used in error reports.
    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// The unread remainder of the text.
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Consume `prefix` if the remaining text starts with it.
    pub fn eat(&mut self, prefix: &str) -> bool {
        if self.starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Consume up to the next `len` bytes, stopping short at a char boundary.
    pub fn take(&mut self, len: usize) -> &'a str {
        let start = self.pos;
        self.pos = self.floor_boundary(start.saturating_add(len));
        &self.text[start..self.pos]
    }

    /// Consume the longest run of characters matching `pred`.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    pub fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    /// Consume text up to (not including) the next `needle`.
    ///
    /// Returns `None` and leaves the cursor at the end of the text when the
    /// needle never appears.
    pub fn take_until(&mut self, needle: &str) -> Option<&'a str> {
        let rest = self.rest();
        match rest.find(needle) {
            Some(len) => {
                self.pos += len;
                Some(&rest[..len])
            }
            None => {
                self.pos = self.text.len();
                None
            }
        }
    }
}
