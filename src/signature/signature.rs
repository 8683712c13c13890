use core::fmt;
use core::str::from_utf8_unchecked;

use super::{validate, Iter, OwnedSignature, SignatureError, TypeNode};

/// A validated D-Bus type signature.
///
/// A signature is a flat sequence of complete types over the D-Bus type
/// alphabet, at most 255 bytes long. This is the borrowed form; the owned
/// counterpart is [`OwnedSignature`].
///
/// # Examples
///
/// ```
/// use dbus_wire::Signature;
///
/// assert!(Signature::new(b"a{sv}").is_ok());
/// assert!(Signature::new(b"a{s").is_err());
/// ```
#[derive(Hash, PartialEq, Eq)]
#[repr(transparent)]
pub struct Signature([u8]);

impl Signature {
    /// The empty signature, denoting an empty body.
    pub const EMPTY: &'static Signature = unsafe { Signature::new_unchecked(b"") };

    /// A single byte, `y`.
    pub const BYTE: &'static Signature = unsafe { Signature::new_unchecked(b"y") };

    /// A boolean, `b`.
    pub const BOOLEAN: &'static Signature = unsafe { Signature::new_unchecked(b"b") };

    /// Signed 16-bit integer, `n`.
    pub const INT16: &'static Signature = unsafe { Signature::new_unchecked(b"n") };

    /// Unsigned 16-bit integer, `q`.
    pub const UINT16: &'static Signature = unsafe { Signature::new_unchecked(b"q") };

    /// Signed 32-bit integer, `i`.
    pub const INT32: &'static Signature = unsafe { Signature::new_unchecked(b"i") };

    /// Unsigned 32-bit integer, `u`.
    pub const UINT32: &'static Signature = unsafe { Signature::new_unchecked(b"u") };

    /// Signed 64-bit integer, `x`.
    pub const INT64: &'static Signature = unsafe { Signature::new_unchecked(b"x") };

    /// Unsigned 64-bit integer, `t`.
    pub const UINT64: &'static Signature = unsafe { Signature::new_unchecked(b"t") };

    /// IEEE 754 double precision floating point, `d`.
    pub const DOUBLE: &'static Signature = unsafe { Signature::new_unchecked(b"d") };

    /// A UTF-8 string, `s`.
    pub const STRING: &'static Signature = unsafe { Signature::new_unchecked(b"s") };

    /// An object path, `o`.
    pub const OBJECT_PATH: &'static Signature = unsafe { Signature::new_unchecked(b"o") };

    /// A signature, `g`.
    pub const SIGNATURE: &'static Signature = unsafe { Signature::new_unchecked(b"g") };

    /// A variant, `v`.
    pub const VARIANT: &'static Signature = unsafe { Signature::new_unchecked(b"v") };

    /// A file descriptor index, `h`.
    pub const UNIX_FD: &'static Signature = unsafe { Signature::new_unchecked(b"h") };

    /// Try to construct a new signature with validation.
    #[inline]
    pub fn new(signature: &[u8]) -> Result<&Signature, SignatureError> {
        validate(signature)?;

        // SAFETY: the byte slice has just been validated, and the type is
        // repr(transparent) over [u8].
        Ok(unsafe { Self::new_unchecked(signature) })
    }

    /// Construct a signature without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the bytes form a valid signature.
    pub(crate) const unsafe fn new_unchecked(signature: &[u8]) -> &Self {
        &*(signature as *const _ as *const Signature)
    }

    /// Get the signature as a string.
    pub fn as_str(&self) -> &str {
        // SAFETY: validation only admits ASCII bytes.
        unsafe { from_utf8_unchecked(&self.0) }
    }

    /// Get the signature as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the signature in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Test if the signature is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the complete top-level types of the signature, yielding
    /// the sub-signature spanned by each.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_wire::Signature;
    ///
    /// let sig = Signature::new(b"ia{sv}(xt)")?;
    /// let types = sig.iter().collect::<Vec<_>>();
    ///
    /// assert_eq!(types.len(), 3);
    /// assert_eq!(types[1].as_str(), "a{sv}");
    /// # Ok::<_, dbus_wire::SignatureError>(())
    /// ```
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }

    /// Parse the signature into structured type descriptors, one per
    /// complete top-level type.
    ///
    /// Cannot fail: a [`Signature`] is validated on construction.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_wire::{Signature, TypeNode};
    ///
    /// let sig = Signature::new(b"aai")?;
    ///
    /// assert!(matches!(sig.parse()[0], TypeNode::Array(..)));
    /// # Ok::<_, dbus_wire::SignatureError>(())
    /// ```
    pub fn parse(&self) -> Vec<TypeNode> {
        self.parse_n(usize::MAX).0
    }

    /// Parse at most `limit` complete types, returning the descriptors and
    /// the number of signature bytes consumed.
    pub fn parse_n(&self, limit: usize) -> (Vec<TypeNode>, usize) {
        TypeNode::parse_prefix(&self.0, limit)
    }

    /// Number of complete top-level types in the signature.
    pub fn arity(&self) -> usize {
        self.iter().count()
    }
}

impl fmt::Debug for Signature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Signature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<Signature> for Signature {
    #[inline]
    fn as_ref(&self) -> &Signature {
        self
    }
}

impl ToOwned for Signature {
    type Owned = OwnedSignature;

    #[inline]
    fn to_owned(&self) -> Self::Owned {
        // SAFETY: self is already validated.
        unsafe { OwnedSignature::from_slice_unchecked(&self.0) }
    }
}

impl PartialEq<str> for Signature {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<Signature> for str {
    #[inline]
    fn eq(&self, other: &Signature) -> bool {
        self == other.as_str()
    }
}
