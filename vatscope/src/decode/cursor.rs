//! Bounds-checked cursor over a byte buffer
//!
//! All wire-format reads go through this type so an undersized buffer turns
//! into a [`FormatError`] instead of a panic or an out-of-bounds slice.
//! Offsets reported in errors are absolute positions in the original trace
//! buffer, which is what you want when diagnosing a corrupt capture.

use crate::domain::FormatError;

/// Little-endian reader over a byte slice.
#[derive(Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    /// Absolute offset of `buf[0]` in the original trace buffer.
    base: usize,
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8], base: usize) -> Self {
        Self { buf, base, pos: 0 }
    }

    /// Absolute offset of the next unread byte.
    #[must_use]
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Take `n` raw bytes.
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < n {
            return Err(FormatError::UnexpectedEof {
                offset: self.position(),
                need: n - self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u16_le(&mut self) -> Result<u16, FormatError> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32_le(&mut self) -> Result<u32, FormatError> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u64_le(&mut self) -> Result<u64, FormatError> {
        let b = self.bytes(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    pub fn i64_le(&mut self) -> Result<i64, FormatError> {
        #[allow(clippy::cast_possible_wrap)]
        Ok(self.u64_le()? as i64)
    }

    /// Read a null-terminated byte string and advance past the terminator.
    ///
    /// The wire format carries no length prefix and makes no encoding
    /// promise, so invalid UTF-8 is replaced rather than rejected.
    pub fn cstr(&mut self) -> Result<String, FormatError> {
        let start = self.pos;
        let Some(nul) = self.buf[start..].iter().position(|&b| b == 0) else {
            return Err(FormatError::UnterminatedString { offset: self.base + start });
        };
        self.pos = start + nul + 1;
        Ok(String::from_utf8_lossy(&self.buf[start..start + nul]).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian() {
        let mut c = Cursor::new(&[0x01, 0x02, 0x03, 0x04, 0x05], 0);
        assert_eq!(c.u32_le().unwrap(), 0x0403_0201);
        assert_eq!(c.u8().unwrap(), 0x05);
        assert!(c.is_empty());
    }

    #[test]
    fn test_eof_reports_absolute_offset() {
        let mut c = Cursor::new(&[0xff; 3], 100);
        let err = c.u64_le().unwrap_err();
        match err {
            FormatError::UnexpectedEof { offset, need } => {
                assert_eq!(offset, 100);
                assert_eq!(need, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cstr_stops_at_terminator() {
        let mut c = Cursor::new(b"hello\0world\0", 0);
        assert_eq!(c.cstr().unwrap(), "hello");
        assert_eq!(c.cstr().unwrap(), "world");
        assert!(c.is_empty());
    }

    #[test]
    fn test_cstr_without_terminator_fails() {
        let mut c = Cursor::new(b"abc", 10);
        assert!(matches!(
            c.cstr(),
            Err(FormatError::UnterminatedString { offset: 10 })
        ));
    }
}
