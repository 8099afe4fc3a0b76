/// A read-only view over one delivered chunk.
///
/// Tracks how far into the chunk the engine has read and the absolute
/// stream offset the chunk starts at, so errors can name the exact byte.
#[derive(Debug)]
pub(crate) struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: u64,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(data: &'a [u8], base: u64) -> Self {
        Self { data, pos: 0, base }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Bytes consumed from this chunk so far.
    pub(crate) fn consumed(&self) -> usize {
        self.pos
    }

    /// Absolute stream offset of the next unread byte.
    pub(crate) fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub(crate) fn advance(&mut self) {
        self.pos = (self.pos + 1).min(self.data.len());
    }

    /// Consume the longest prefix whose bytes satisfy `pred`.
    pub(crate) fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let data = self.data;
        let rest = &data[self.pos..];
        let len = rest.iter().position(|&b| !pred(b)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Consume up to `max` bytes.
    pub(crate) fn take_up_to(&mut self, max: u64) -> &'a [u8] {
        let data = self.data;
        let rest = &data[self.pos..];
        let len = usize::try_from(max).map_or(rest.len(), |m| m.min(rest.len()));
        self.pos += len;
        &rest[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_absolute() {
        let mut cursor = ByteCursor::new(b"ab", 10);
        assert_eq!(cursor.offset(), 10);
        cursor.advance();
        assert_eq!(cursor.offset(), 11);
        cursor.advance();
        assert!(cursor.is_empty());
        assert_eq!(cursor.consumed(), 2);
        assert_eq!(cursor.offset(), 12);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut cursor = ByteCursor::new(b"x", 0);
        assert_eq!(cursor.peek(), Some(b'x'));
        assert_eq!(cursor.consumed(), 0);
        cursor.advance();
        assert_eq!(cursor.peek(), None);
        cursor.advance();
        assert_eq!(cursor.consumed(), 1);
    }

    #[test]
    fn take_while_stops_at_first_mismatch() {
        let mut cursor = ByteCursor::new(b"abc def", 0);
        assert_eq!(cursor.take_while(|b| b != b' '), b"abc");
        assert_eq!(cursor.peek(), Some(b' '));
        cursor.advance();
        assert_eq!(cursor.take_while(|b| b != b' '), b"def");
        assert!(cursor.is_empty());
    }

    #[test]
    fn take_up_to_is_bounded_by_chunk() {
        let mut cursor = ByteCursor::new(b"hello", 0);
        assert_eq!(cursor.take_up_to(3), b"hel");
        assert_eq!(cursor.take_up_to(u64::MAX), b"lo");
        assert_eq!(cursor.take_up_to(4), b"");
    }
}
