use super::{complete_type_len, Signature};

/// An iterator over the complete top-level types of a [`Signature`],
/// yielding the sub-signature spanned by each.
pub struct Iter<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Iter<'a> {
    #[inline]
    pub(super) fn new(signature: &'a Signature) -> Self {
        Self {
            bytes: signature.as_bytes(),
            at: 0,
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Signature;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at >= self.bytes.len() {
            return None;
        }

        // The parent signature is validated, so every complete type in it is
        // well-formed.
        let end = complete_type_len(self.bytes, self.at).ok()?;
        let span = &self.bytes[self.at..end];
        self.at = end;

        // SAFETY: a complete type of a valid signature is itself valid.
        Some(unsafe { Signature::new_unchecked(span) })
    }
}
