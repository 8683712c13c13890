use crate::error::{Error, Result};
use crate::proto::Endianness;

use super::{Cursor, WireBuf};

#[test]
fn store_little_endian() {
    let mut buf = WireBuf::new(Endianness::LITTLE);
    buf.store_uint(0x12345678, 4);
    assert_eq!(buf.as_slice(), &[0x78, 0x56, 0x34, 0x12]);
}

#[test]
fn store_big_endian() {
    let mut buf = WireBuf::new(Endianness::BIG);
    buf.store_uint(0x12345678, 4);
    assert_eq!(buf.as_slice(), &[0x12, 0x34, 0x56, 0x78]);
}

#[test]
fn padding_is_zeroed() {
    let mut buf = WireBuf::new(Endianness::LITTLE);
    buf.store_u8(0xff);
    buf.pad_to(4);
    buf.store_uint(1, 4);
    assert_eq!(buf.as_slice(), &[0xff, 0, 0, 0, 1, 0, 0, 0]);

    // Already aligned, no-op.
    buf.pad_to(8);
    assert_eq!(buf.len(), 8);
}

#[test]
fn length_slot_patched_in_buffer_endianness() {
    let mut buf = WireBuf::new(Endianness::BIG);
    buf.store_u8(0);
    let slot = buf.alloc_length();
    buf.extend_from_slice(b"xyz");
    buf.store_length_at(slot, 3);

    assert_eq!(buf.as_slice(), &[0, 0, 0, 0, 0, 0, 0, 3, b'x', b'y', b'z']);
}

#[test]
fn cursor_loads() -> Result<()> {
    let data = [0xff, 0, 0, 0, 0x2a, 0, 0, 0];
    let mut cursor = Cursor::new(&data, Endianness::LITTLE);

    assert_eq!(cursor.load_u8()?, 0xff);
    cursor.align_to(4);
    assert_eq!(cursor.load_uint(4)?, 42);
    assert!(cursor.is_empty());
    Ok(())
}

#[test]
fn cursor_underflow() {
    let data = [1, 2];
    let mut cursor = Cursor::new(&data, Endianness::LITTLE);

    assert_eq!(
        cursor.load_uint(4),
        Err(Error::BufferUnderflow {
            at: 0,
            requested: 4,
            len: 2,
        })
    );
}

#[test]
fn cursor_nul_skip() -> Result<()> {
    let data = [b'h', b'i', 0xaa];
    let mut cursor = Cursor::new(&data, Endianness::LITTLE);

    // The trailing byte is skipped without being validated.
    assert_eq!(cursor.load_slice_nul(2)?, b"hi");
    assert!(cursor.is_empty());
    Ok(())
}

#[test]
fn cursor_endianness_symmetry() -> Result<()> {
    for endianness in [Endianness::LITTLE, Endianness::BIG] {
        let mut buf = WireBuf::new(endianness);
        buf.store_uint(0xdead_beef_cafe_f00d, 8);

        let mut cursor = Cursor::new(buf.as_slice(), endianness);
        assert_eq!(cursor.load_uint(8)?, 0xdead_beef_cafe_f00d);
    }

    Ok(())
}
