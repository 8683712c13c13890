//! Type signatures and the structured type trees parsed from them.

pub use self::signature::Signature;
mod signature;

pub use self::owned_signature::OwnedSignature;
mod owned_signature;

pub use self::signature_error::SignatureError;
mod signature_error;

pub use self::iter::Iter;
mod iter;

pub use self::type_tree::TypeNode;
mod type_tree;

pub(crate) use self::validation::{complete_type_len, validate};
mod validation;

#[cfg(test)]
mod tests;
