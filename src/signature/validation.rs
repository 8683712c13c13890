use crate::proto::{Type, MAX_DEPTH, MAX_SIGNATURE_LENGTH};

use super::SignatureError;

/// Validate a full signature: a flat sequence of complete types.
///
/// The empty signature is valid and denotes an empty body.
pub(crate) fn validate(bytes: &[u8]) -> Result<(), SignatureError> {
    if bytes.len() > MAX_SIGNATURE_LENGTH {
        return Err(SignatureError::SignatureTooLong);
    }

    let mut n = 0;

    while n < bytes.len() {
        n = complete_type_len(bytes, n)?;
    }

    Ok(())
}

/// Find the end of the single complete type starting at `at`.
///
/// Returns the offset one past the type, so that `&bytes[at..end]` is the
/// full (possibly nested) span of the type. This is the one signature-walking
/// primitive in the crate: validation, the type-tree parser and the
/// zero-length-array skip in the marshaller and extractor all go through it.
pub(crate) fn complete_type_len(bytes: &[u8], at: usize) -> Result<usize, SignatureError> {
    one(bytes, at, 0, false)
}

fn one(bytes: &[u8], at: usize, depth: usize, in_array: bool) -> Result<usize, SignatureError> {
    let Some(&b) = bytes.get(at) else {
        return Err(SignatureError::MissingArrayElementType);
    };

    match Type::new(b) {
        Type::ARRAY => {
            if depth >= MAX_DEPTH {
                return Err(SignatureError::ExceededMaximumRecursion);
            }

            one(bytes, at + 1, depth + 1, true)
        }
        Type::OPEN_PAREN => {
            if depth >= MAX_DEPTH {
                return Err(SignatureError::ExceededMaximumRecursion);
            }

            let mut n = at + 1;

            if bytes.get(n) == Some(&Type::CLOSE_PAREN.get()) {
                return Err(SignatureError::StructHasNoFields);
            }

            loop {
                match bytes.get(n) {
                    None => return Err(SignatureError::StructStartedButNotEnded),
                    Some(&b) if b == Type::CLOSE_PAREN.get() => return Ok(n + 1),
                    Some(..) => {
                        n = one(bytes, n, depth + 1, false)?;
                    }
                }
            }
        }
        Type::OPEN_BRACE => {
            if !in_array {
                return Err(SignatureError::DictEntryNotInsideArray);
            }

            if depth >= MAX_DEPTH {
                return Err(SignatureError::ExceededMaximumRecursion);
            }

            let Some(&key) = bytes.get(at + 1) else {
                return Err(SignatureError::DictStartedButNotEnded);
            };

            if key == Type::CLOSE_BRACE.get() {
                return Err(SignatureError::DictEntryHasOnlyOneField);
            }

            if !Type::new(key).is_basic() {
                return Err(SignatureError::DictKeyMustBeBasicType);
            }

            if bytes.get(at + 2) == Some(&Type::CLOSE_BRACE.get()) {
                return Err(SignatureError::DictEntryHasOnlyOneField);
            }

            let n = one(bytes, at + 2, depth + 1, false)?;

            match bytes.get(n) {
                None => Err(SignatureError::DictStartedButNotEnded),
                Some(&b) if b == Type::CLOSE_BRACE.get() => Ok(n + 1),
                Some(..) => Err(SignatureError::DictEntryHasTooManyFields),
            }
        }
        Type::CLOSE_PAREN => Err(SignatureError::StructEndedButNotStarted),
        Type::CLOSE_BRACE => Err(SignatureError::DictEndedButNotStarted),
        t if t.is_basic() || matches!(t, Type::VARIANT) => Ok(at + 1),
        _ => Err(SignatureError::UnknownTypeCode(b)),
    }
}
