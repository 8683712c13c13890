use core::str::Utf8Error;

use thiserror::Error;

use crate::proto::{MAX_ARRAY_LENGTH, MAX_MESSAGE_LENGTH};
use crate::signature::SignatureError;

/// Result alias using an [`Error`] as the error type by default.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// An error raised by this crate.
///
/// All errors are deterministic functions of their input; nothing here is
/// transient or retryable. See the individual variants for which class of
/// caller bug or wire corruption each describes.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A malformed type signature.
    #[error("signature error")]
    Signature(#[from] SignatureError),

    /// Extraction encountered a signature character outside the known
    /// alphabet. Fatal for the message; indicates a protocol version
    /// mismatch or corrupt input.
    #[error("unknown type code `{}`", char::from(*.0))]
    UnknownTypeCode(u8),

    /// A runtime value cannot be marshalled as the type the signature
    /// demands at its position. Always a programming error on the sending
    /// side.
    #[error("cannot marshal {found} as type `{}`", char::from(*.expected))]
    Marshal {
        /// Variant name of the value that was supplied.
        found: &'static str,
        /// The signature character the value was matched against.
        expected: u8,
    },

    /// The number of values supplied does not match the number of complete
    /// types in the signature.
    #[error("argument count does not match signature")]
    ArgumentCountMismatch,

    /// A declared array length implies more elements than the hard cap
    /// allows. Treated as hostile input.
    #[error("array of {0} elements exceeds maximum of {MAX_ARRAY_LENGTH}")]
    ArrayTooLong(u64),

    /// A declared body length exceeds the maximum message size.
    #[error("body of length {0} is too long (max is {MAX_MESSAGE_LENGTH})")]
    BodyTooLong(u32),

    /// A declared header length exceeds the maximum message size.
    #[error("header of length {0} is too long (max is {MAX_MESSAGE_LENGTH})")]
    HeaderTooLong(u32),

    /// A read ran past the end of the wire buffer, i.e. truncated input.
    #[error("buffer underflow reading {requested} bytes at offset {at} of {len}")]
    BufferUnderflow {
        /// Offset the read started at.
        at: usize,
        /// Number of bytes requested.
        requested: usize,
        /// Length of the buffer.
        len: usize,
    },

    /// A file descriptor index pointing outside the message's descriptor
    /// table, indicating wire corruption.
    #[error("file descriptor index {0} out of range")]
    BadFileDescriptorIndex(u32),

    /// A string on the wire was not valid UTF-8.
    #[error("invalid UTF-8 in wire string")]
    Utf8(#[from] Utf8Error),

    /// The signature of a runtime value could not be inferred, such as for
    /// an empty untyped array inside a variant.
    #[error("cannot infer a signature for {0}")]
    CannotInferSignature(&'static str),

    /// A variant carried an embedded signature that is not exactly one
    /// complete type, such as an empty signature. Wire corruption or
    /// hostile input.
    #[error("variant signature must be a single complete type")]
    NotSingleCompleteType,

    /// The fixed message prefix was malformed: bad endianness tag, unknown
    /// message type or unsupported protocol version.
    #[error("invalid message prefix")]
    InvalidProtocol,

    /// A message carried a serial of zero.
    #[error("zero message serial")]
    ZeroSerial,

    /// A method return or error message without a `REPLY_SERIAL` header.
    #[error("missing required REPLY_SERIAL header")]
    MissingReplySerial,

    /// A method call or signal without a `PATH` header.
    #[error("missing required PATH header")]
    MissingPath,

    /// A method call or signal without a `MEMBER` header.
    #[error("missing required MEMBER header")]
    MissingMember,

    /// An error message without an `ERROR_NAME` header.
    #[error("missing required ERROR_NAME header")]
    MissingErrorName,

    /// A signal without an `INTERFACE` header.
    #[error("missing required INTERFACE header")]
    MissingInterface,
}
