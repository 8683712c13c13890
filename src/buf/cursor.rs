use crate::error::{Error, Result};
use crate::proto::{align_offset, Endianness, Type};

/// A bounds-checked read cursor over received wire data.
///
/// Alignment advances the position without touching the data; every load is
/// bounds-checked so that truncated input surfaces as
/// [`Error::BufferUnderflow`] instead of silent success or a panic.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    endianness: Endianness,
}

impl<'a> Cursor<'a> {
    /// Construct a cursor at the start of `data`.
    pub fn new(data: &'a [u8], endianness: Endianness) -> Self {
        Self {
            data,
            pos: 0,
            endianness,
        }
    }

    /// Construct a cursor positioned at `pos`.
    pub fn at(data: &'a [u8], pos: usize, endianness: Endianness) -> Self {
        Self {
            data,
            pos,
            endianness,
        }
    }

    /// Get the endianness of the cursor.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Current byte position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Test if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Round the position up to the next multiple of `alignment`.
    pub fn align_to(&mut self, alignment: usize) {
        self.pos = align_offset(self.pos, alignment);
    }

    /// Round the position up to the alignment of the given type.
    pub(crate) fn align_for(&mut self, ty: Type) {
        self.align_to(ty.alignment());
    }

    /// Skip `n` bytes.
    pub fn advance(&mut self, n: usize) -> Result<()> {
        self.check(n)?;
        self.pos += n;
        Ok(())
    }

    /// Load a single byte.
    pub fn load_u8(&mut self) -> Result<u8> {
        self.check(1)?;
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Load an unsigned integer of the given byte width in the cursor's
    /// endianness.
    ///
    /// The caller is responsible for alignment; signed and floating point
    /// values are reinterpreted from the returned bit pattern.
    pub fn load_uint(&mut self, width: usize) -> Result<u64> {
        self.check(width)?;
        let bytes = &self.data[self.pos..self.pos + width];
        self.pos += width;

        let mut value = 0u64;

        match self.endianness {
            Endianness::BIG => {
                for &b in bytes {
                    value = value << 8 | u64::from(b);
                }
            }
            _ => {
                for &b in bytes.iter().rev() {
                    value = value << 8 | u64::from(b);
                }
            }
        }

        Ok(value)
    }

    /// Load `len` bytes verbatim.
    pub fn load_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        self.check(len)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Load `len` bytes and skip a trailing NUL without validating its
    /// value, matching how strings and signatures sit on the wire.
    pub fn load_slice_nul(&mut self, len: usize) -> Result<&'a [u8]> {
        self.check(len + 1)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len + 1;
        Ok(bytes)
    }

    fn check(&self, requested: usize) -> Result<()> {
        if self.pos.checked_add(requested).map_or(true, |end| end > self.data.len()) {
            return Err(Error::BufferUnderflow {
                at: self.pos,
                requested,
                len: self.data.len(),
            });
        }

        Ok(())
    }
}
