use thiserror::Error;

/// Detailed errors raised when validation of a [`Signature`] fails.
///
/// [`Signature`]: crate::Signature
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignatureError {
    /// A character outside the signature alphabet.
    #[error("unknown type code `{}`", char::from(*.0))]
    UnknownTypeCode(u8),

    /// Signatures are limited to 255 bytes.
    #[error("signature too long")]
    SignatureTooLong,

    /// An `a` marker with no element type following it.
    #[error("missing array element type")]
    MissingArrayElementType,

    /// A `)` without a matching `(`.
    #[error("struct ended but not started")]
    StructEndedButNotStarted,

    /// A `(` without a matching `)`.
    #[error("struct started but not ended")]
    StructStartedButNotEnded,

    /// A struct with no member types, `()`.
    #[error("struct has no fields")]
    StructHasNoFields,

    /// A `}` without a matching `{`.
    #[error("dict entry ended but not started")]
    DictEndedButNotStarted,

    /// A `{` without a matching `}`.
    #[error("dict entry started but not ended")]
    DictStartedButNotEnded,

    /// A dict entry whose key is a container type.
    #[error("dict entry key must be a basic type")]
    DictKeyMustBeBasicType,

    /// A dict entry with only a key type, `{s}`.
    #[error("dict entry has only one field")]
    DictEntryHasOnlyOneField,

    /// A dict entry with more than a key and a value type.
    #[error("dict entry has too many fields")]
    DictEntryHasTooManyFields,

    /// A `{` somewhere other than directly following an array marker.
    #[error("dict entry not inside an array")]
    DictEntryNotInsideArray,

    /// Containers nested deeper than the protocol permits.
    #[error("exceeded maximum container recursion")]
    ExceededMaximumRecursion,
}
