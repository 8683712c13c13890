use core::fmt;
use core::ops::Deref;

use crate::proto::Type;

use super::{validate, Signature, SignatureError};

/// An owned D-Bus type signature.
///
/// Dereferences to [`Signature`].
///
/// # Examples
///
/// ```
/// use dbus_wire::{OwnedSignature, Signature};
///
/// let owned = OwnedSignature::new(b"a{sv}")?;
/// assert_eq!(&*owned, Signature::new(b"a{sv}")?);
/// # Ok::<_, dbus_wire::SignatureError>(())
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct OwnedSignature(Vec<u8>);

impl OwnedSignature {
    /// Construct a new empty signature.
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Try to construct a new signature with validation.
    pub fn new(signature: &[u8]) -> Result<Self, SignatureError> {
        validate(signature)?;
        Ok(Self(signature.to_vec()))
    }

    /// Construct from already-validated bytes.
    pub(crate) unsafe fn from_slice_unchecked(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Append a single type code.
    ///
    /// Used while inferring the signature of a runtime value. The buffer may
    /// be transiently incomplete (an open bracket without its close) but is
    /// only dereferenced once inference has produced a complete signature.
    pub(crate) fn push(&mut self, ty: Type) {
        self.0.push(ty.get());
    }
}

impl Deref for OwnedSignature {
    type Target = Signature;

    #[inline]
    fn deref(&self) -> &Self::Target {
        // SAFETY: construction and mutation preserve validity.
        unsafe { Signature::new_unchecked(&self.0) }
    }
}

impl AsRef<Signature> for OwnedSignature {
    #[inline]
    fn as_ref(&self) -> &Signature {
        self
    }
}

impl core::borrow::Borrow<Signature> for OwnedSignature {
    #[inline]
    fn borrow(&self) -> &Signature {
        self
    }
}

impl From<&Signature> for OwnedSignature {
    #[inline]
    fn from(signature: &Signature) -> Self {
        signature.to_owned()
    }
}

impl fmt::Debug for OwnedSignature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedSignature").field(&self.as_str()).finish()
    }
}

impl fmt::Display for OwnedSignature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<Signature> for OwnedSignature {
    #[inline]
    fn eq(&self, other: &Signature) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<OwnedSignature> for Signature {
    #[inline]
    fn eq(&self, other: &OwnedSignature) -> bool {
        self.as_bytes() == other.0
    }
}

impl PartialEq<OwnedSignature> for &Signature {
    #[inline]
    fn eq(&self, other: &OwnedSignature) -> bool {
        self.as_bytes() == other.0
    }
}

impl PartialEq<str> for OwnedSignature {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}
