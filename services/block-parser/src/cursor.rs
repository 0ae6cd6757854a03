use crate::error::{ParseError, Result};

/// A forward-only byte reader that names the field it was reading when
/// it ran out of bytes, so the parser can report exactly where a block
/// or transaction was truncated.
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Rewinds the cursor to a previously observed position. Used to
    /// "un-consume" a peeked byte that turned out not to be what the
    /// caller was probing for (e.g. the SegWit marker).
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8]> {
        let slice = self
            .bytes
            .get(self.pos..self.pos + n)
            .ok_or(ParseError::Truncated { field, offset: self.pos })?;
        self.pos += n;
        Ok(slice)
    }

    pub fn u32_le(&mut self, field: &'static str) -> Result<u32> {
        let bytes = self.take(4, field)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn i32_le(&mut self, field: &'static str) -> Result<i32> {
        let bytes = self.take(4, field)?;
        Ok(i32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn u64_le(&mut self, field: &'static str) -> Result<u64> {
        let bytes = self.take(8, field)?;
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn array32(&mut self, field: &'static str) -> Result<[u8; 32]> {
        let bytes = self.take(32, field)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Standard 0xFD/0xFE/0xFF-prefixed CompactSize varint.
    pub fn varint(&mut self, field: &'static str) -> Result<u64> {
        let (value, next) = bitcoin_utils::varint::read_varint(self.bytes, self.pos)
            .map_err(|_| ParseError::Truncated { field, offset: self.pos })?;
        self.pos = next;
        Ok(value)
    }

    pub fn varint_usize(&mut self, field: &'static str) -> Result<usize> {
        let value = self.varint(field)?;
        usize::try_from(value).map_err(|_| ParseError::VarIntOverflow { field, offset: self.pos })
    }
}
