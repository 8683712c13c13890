//! Wire buffers: the write side with alignment padding and patchable length
//! slots, and the bounds-checked read cursor.

pub use self::wire_buf::WireBuf;
mod wire_buf;

pub use self::cursor::Cursor;
mod cursor;

#[cfg(test)]
mod tests;
