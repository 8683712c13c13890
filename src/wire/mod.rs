//! The value marshaller and extractor: recursive, signature-driven
//! transformations between [`Value`] trees and wire bytes.
//!
//! [`Value`]: crate::Value

pub(crate) use self::write::Marshaller;
mod write;

pub(crate) use self::read::Extractor;
mod read;

use crate::buf::{Cursor, WireBuf};
use crate::error::Result;
use crate::signature::Signature;
use crate::value::{FileDescriptor, Value};

/// Marshal a sequence of values described by `signature` into a fresh set of
/// wire bytes, collecting passed file descriptors into `fds`.
pub fn marshal(
    signature: &Signature,
    values: &[Value],
    buf: &mut WireBuf,
    fds: &mut Vec<FileDescriptor>,
) -> Result<()> {
    Marshaller::new(buf, fds).append(signature, values)
}

/// Extract the sequence of values described by `signature` from a cursor.
pub fn extract(
    signature: &Signature,
    cursor: &mut Cursor<'_>,
    fds: &[FileDescriptor],
) -> Result<Vec<Value>> {
    Extractor::new(fds).extract_all(signature, cursor)
}
