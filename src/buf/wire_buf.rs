use crate::proto::{align_offset, Endianness, Type};

/// A reserved location in the buffer holding a `u32` that is written after
/// the data it describes, such as an array length prefix.
#[derive(Clone, Copy)]
pub(crate) struct LengthSlot(usize);

/// A growable write buffer producing D-Bus wire data.
///
/// The endianness is fixed at construction and applied to every integer
/// stored, including length prefixes. The buffer length doubles as the byte
/// counter that alignment is computed from, so a message must start at
/// offset zero of its buffer.
///
/// # Examples
///
/// ```
/// use dbus_wire::{Endianness, WireBuf};
///
/// let mut buf = WireBuf::new(Endianness::LITTLE);
/// buf.store_uint(42, 4);
///
/// assert_eq!(buf.as_slice(), &[0x2a, 0, 0, 0]);
/// ```
#[derive(Debug)]
pub struct WireBuf {
    data: Vec<u8>,
    endianness: Endianness,
}

impl WireBuf {
    /// Construct a new empty buffer with the given endianness.
    pub fn new(endianness: Endianness) -> Self {
        Self {
            data: Vec::new(),
            endianness,
        }
    }

    /// Get the endianness of the buffer.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Test if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Take the written bytes out of the buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Pad with zero bytes up to the next multiple of `alignment`.
    pub fn pad_to(&mut self, alignment: usize) {
        let aligned = align_offset(self.data.len(), alignment);
        self.data.resize(aligned, 0);
    }

    /// Pad to the alignment of the given type.
    pub(crate) fn pad_for(&mut self, ty: Type) {
        self.pad_to(ty.alignment());
    }

    /// Append a single byte.
    pub fn store_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Append an unsigned integer of the given byte width in the buffer's
    /// endianness.
    ///
    /// Signed and floating point values are stored through their raw bit
    /// patterns. The caller is responsible for alignment.
    pub fn store_uint(&mut self, value: u64, width: usize) {
        let mut value = value;

        match self.endianness {
            Endianness::BIG => {
                let at = self.data.len();
                self.data.resize(at + width, 0);

                for i in (0..width).rev() {
                    self.data[at + i] = (value & 0xff) as u8;
                    value >>= 8;
                }
            }
            _ => {
                for _ in 0..width {
                    self.data.push((value & 0xff) as u8);
                    value >>= 8;
                }
            }
        }
    }

    /// Append a slice verbatim.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Append a slice followed by a single NUL byte.
    pub fn extend_from_slice_nul(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.data.push(0);
    }

    /// Align to 4 and reserve a zeroed `u32` to be patched later with
    /// [`store_length_at`].
    ///
    /// [`store_length_at`]: Self::store_length_at
    pub(crate) fn alloc_length(&mut self) -> LengthSlot {
        self.pad_to(4);
        let at = self.data.len();
        self.data.resize(at + 4, 0);
        LengthSlot(at)
    }

    /// Patch a previously reserved length slot.
    pub(crate) fn store_length_at(&mut self, slot: LengthSlot, value: u32) {
        let LengthSlot(at) = slot;

        let bytes = match self.endianness {
            Endianness::BIG => value.to_be_bytes(),
            _ => value.to_le_bytes(),
        };

        self.data[at..at + 4].copy_from_slice(&bytes);
    }
}
