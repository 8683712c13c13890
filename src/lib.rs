//! Marshalling and demarshalling of the D-Bus wire format.
//!
//! This crate turns typed values into the byte-exact binary representation
//! other D-Bus implementations expect, and wire bytes back into typed
//! values, driven by validated type signatures. On top of that sits the
//! [`Message`] envelope, which assembles header fields and a marshalled body
//! into complete wire images and splits received images back apart.
//!
//! Transport, authentication and bus routing live elsewhere; everything in
//! here is a synchronous transformation over byte buffers.
//!
//! # Examples
//!
//! ```
//! use dbus_wire::{Cursor, Endianness, Signature, Value, WireBuf};
//!
//! let signature = Signature::new(b"a{si}")?;
//!
//! let values = [Value::Dict(vec![
//!     (Value::Str(String::from("a")), Value::Int32(1)),
//!     (Value::Str(String::from("b")), Value::Int32(2)),
//! ])];
//!
//! let mut buf = WireBuf::new(Endianness::LITTLE);
//! let mut fds = Vec::new();
//! dbus_wire::marshal(signature, &values, &mut buf, &mut fds)?;
//!
//! let mut cursor = Cursor::new(buf.as_slice(), Endianness::LITTLE);
//! let extracted = dbus_wire::extract(signature, &mut cursor, &fds)?;
//!
//! assert_eq!(extracted, values);
//! # Ok::<_, dbus_wire::Error>(())
//! ```

#[macro_use]
mod macros;

#[doc(inline)]
pub use self::error::{Error, Result};
mod error;

#[doc(inline)]
pub use self::proto::{Endianness, Flags, HeaderField, MessageType};
pub mod proto;

#[doc(inline)]
pub use self::signature::{OwnedSignature, Signature, SignatureError, TypeNode};
pub mod signature;

pub use self::buf::{Cursor, WireBuf};
pub mod buf;

#[doc(inline)]
pub use self::value::{FileDescriptor, Value, Variant};
mod value;

pub use self::wire::{extract, marshal};
mod wire;

pub use self::message::{Message, MessageKind, SerialAllocator};
mod message;
