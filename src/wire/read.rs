use core::str::from_utf8;

use log::trace;

use crate::buf::Cursor;
use crate::error::{Error, Result};
use crate::proto::{Type, MAX_ARRAY_LENGTH};
use crate::signature::{complete_type_len, OwnedSignature, Signature};
use crate::value::{FileDescriptor, Value, Variant};

/// Recursive signature-driven value extractor.
///
/// Mirrors the marshaller's layout rules in reverse, advancing a signature
/// offset and the data cursor together past each complete value.
pub(crate) struct Extractor<'a> {
    fds: &'a [FileDescriptor],
}

impl<'a> Extractor<'a> {
    pub(crate) fn new(fds: &'a [FileDescriptor]) -> Self {
        Self { fds }
    }

    /// Extract one value per complete type in the signature.
    pub(crate) fn extract_all(
        &self,
        signature: &Signature,
        cursor: &mut Cursor<'_>,
    ) -> Result<Vec<Value>> {
        trace!("extracting `{signature}` at byte {}", cursor.pos());

        let sig = signature.as_bytes();
        let mut values = Vec::with_capacity(signature.arity());
        let mut at = 0;

        while at < sig.len() {
            values.push(self.extract_one(sig, &mut at, cursor, false)?);
        }

        Ok(values)
    }

    /// Extract the next value.
    ///
    /// On entry `at` points at the first character of a complete type; on
    /// return it points one past it. `contained` is set when extracting
    /// inside another container, which converts flat primitive arrays into
    /// generic sequences so nested code sees one consistent shape.
    fn extract_one(
        &self,
        sig: &[u8],
        at: &mut usize,
        cursor: &mut Cursor<'_>,
        contained: bool,
    ) -> Result<Value> {
        let ty = Type::new(sig[*at]);

        trace!("extracting type `{}` at byte {}", char::from(ty.get()), cursor.pos());

        cursor.align_for(ty);

        let value = match ty {
            Type::BYTE => {
                *at += 1;
                Value::Byte(cursor.load_u8()?)
            }
            Type::BOOLEAN => {
                *at += 1;
                // Equality to one, not non-zero: the narrow legacy contract
                // other implementations rely on.
                Value::Boolean(cursor.load_uint(4)? == 1)
            }
            Type::INT16 => {
                *at += 1;
                Value::Int16(cursor.load_uint(2)? as u16 as i16)
            }
            Type::UINT16 => {
                *at += 1;
                Value::UInt16(cursor.load_uint(2)? as u16)
            }
            Type::INT32 => {
                *at += 1;
                Value::Int32(cursor.load_uint(4)? as u32 as i32)
            }
            Type::UINT32 => {
                *at += 1;
                Value::UInt32(cursor.load_uint(4)? as u32)
            }
            Type::INT64 => {
                *at += 1;
                Value::Int64(cursor.load_uint(8)? as i64)
            }
            Type::UINT64 => {
                *at += 1;
                Value::UInt64(cursor.load_uint(8)?)
            }
            Type::DOUBLE => {
                *at += 1;
                Value::Double(f64::from_bits(cursor.load_uint(8)?))
            }
            Type::STRING => {
                *at += 1;
                Value::Str(self.load_string(cursor)?)
            }
            Type::OBJECT_PATH => {
                *at += 1;
                Value::ObjectPath(self.load_string(cursor)?)
            }
            Type::SIGNATURE => {
                *at += 1;
                Value::Signature(self.load_signature(cursor)?)
            }
            Type::UNIX_FD => {
                *at += 1;
                let index = cursor.load_uint(4)? as u32;

                let Some(fd) = self.fds.get(index as usize) else {
                    return Err(Error::BadFileDescriptorIndex(index));
                };

                Value::Fd(*fd)
            }
            Type::VARIANT => {
                *at += 1;
                // Self-describing: an embedded signature, then one value
                // extracted from a fresh signature cursor.
                let signature = self.load_signature(cursor)?;

                // An empty or multi-type signature would desynchronise the
                // recursion below.
                if signature.arity() != 1 {
                    return Err(Error::NotSingleCompleteType);
                }

                let mut inner = 0;
                let value = self.extract_one(signature.as_bytes(), &mut inner, cursor, false)?;
                Value::Variant(Box::new(Variant::with_signature(value, &signature)))
            }
            Type::ARRAY => self.extract_array(sig, at, cursor, contained)?,
            Type::OPEN_PAREN => {
                let mut n = *at + 1;
                let mut members = Vec::new();

                while sig[n] != Type::CLOSE_PAREN.get() {
                    members.push(self.extract_one(sig, &mut n, cursor, true)?);
                }

                *at = n + 1;
                Value::Struct(members)
            }
            Type::OPEN_BRACE => {
                // A dict entry reads as a two-member struct; the enclosing
                // array collects the run into a mapping.
                let mut n = *at + 1;
                let key = self.extract_one(sig, &mut n, cursor, true)?;
                let value = self.extract_one(sig, &mut n, cursor, true)?;
                *at = n + 1;
                Value::Struct(vec![key, value])
            }
            _ => return Err(Error::UnknownTypeCode(ty.get())),
        };

        Ok(value)
    }

    /// Extract an array value.
    ///
    /// `at` points at the `a` marker on entry. The byte length prefix is
    /// validated against the hard cap before anything is allocated, and the
    /// signature cursor advances past the full element type span even when
    /// the array is empty.
    fn extract_array(
        &self,
        sig: &[u8],
        at: &mut usize,
        cursor: &mut Cursor<'_>,
        contained: bool,
    ) -> Result<Value> {
        let size = cursor.load_uint(4)?;
        let end_sig = complete_type_len(sig, *at)?;
        let element = Type::new(sig[*at + 1]);

        cursor.align_for(element);

        let count = size / element.alignment() as u64;

        if count > u64::from(MAX_ARRAY_LENGTH) {
            return Err(Error::ArrayTooLong(count));
        }

        trace!("array of {size} bytes, element `{}`", char::from(element.get()));

        let end_data = cursor.pos() + size as usize;

        let value = if element.is_flat_scalar() {
            let flat = self.extract_flat(element, cursor, size as usize, count as usize)?;

            if contained {
                listify(flat)
            } else {
                flat
            }
        } else if element == Type::OPEN_BRACE {
            let mut entries = Vec::new();
            let entry_at = *at + 1;

            while cursor.pos() < end_data {
                cursor.align_for(Type::OPEN_BRACE);
                let mut n = entry_at + 1;
                let key = self.extract_one(sig, &mut n, cursor, true)?;
                let value = self.extract_one(sig, &mut n, cursor, true)?;
                dict_insert(&mut entries, key, value);
            }

            Value::Dict(entries)
        } else {
            let mut values = Vec::new();
            let element_at = *at + 1;

            while cursor.pos() < end_data {
                let mut n = element_at;
                values.push(self.extract_one(sig, &mut n, cursor, true)?);
            }

            Value::Array(values)
        };

        *at = end_sig;
        Ok(value)
    }

    /// Materialize an array of fixed-width numeric scalars as a flat native
    /// vector, the common fast path for byte and integer arrays.
    fn extract_flat(
        &self,
        element: Type,
        cursor: &mut Cursor<'_>,
        size: usize,
        count: usize,
    ) -> Result<Value> {
        let value = match element {
            Type::BYTE => Value::Bytes(cursor.load_slice(size)?.to_vec()),
            Type::BOOLEAN => {
                let mut values = Vec::with_capacity(count);

                for _ in 0..count {
                    values.push(cursor.load_uint(4)? == 1);
                }

                Value::BooleanArray(values)
            }
            Type::INT16 => {
                let mut values = Vec::with_capacity(count);

                for _ in 0..count {
                    values.push(cursor.load_uint(2)? as u16 as i16);
                }

                Value::Int16Array(values)
            }
            Type::INT32 => {
                let mut values = Vec::with_capacity(count);

                for _ in 0..count {
                    values.push(cursor.load_uint(4)? as u32 as i32);
                }

                Value::Int32Array(values)
            }
            Type::INT64 => {
                let mut values = Vec::with_capacity(count);

                for _ in 0..count {
                    values.push(cursor.load_uint(8)? as i64);
                }

                Value::Int64Array(values)
            }
            Type::DOUBLE => {
                let mut values = Vec::with_capacity(count);

                for _ in 0..count {
                    values.push(f64::from_bits(cursor.load_uint(8)?));
                }

                Value::DoubleArray(values)
            }
            _ => unreachable!("not a flat scalar element"),
        };

        Ok(value)
    }

    fn load_string(&self, cursor: &mut Cursor<'_>) -> Result<String> {
        let len = cursor.load_uint(4)? as usize;
        let bytes = cursor.load_slice_nul(len)?;
        Ok(from_utf8(bytes)?.to_owned())
    }

    fn load_signature(&self, cursor: &mut Cursor<'_>) -> Result<OwnedSignature> {
        let len = cursor.load_uint(1)? as usize;
        let bytes = cursor.load_slice_nul(len)?;
        Ok(OwnedSignature::new(bytes)?)
    }
}

/// Convert a flat primitive array into the generic sequence shape used for
/// nested containers.
fn listify(value: Value) -> Value {
    match value {
        Value::Bytes(values) => Value::Array(values.into_iter().map(Value::Byte).collect()),
        Value::BooleanArray(values) => {
            Value::Array(values.into_iter().map(Value::Boolean).collect())
        }
        Value::Int16Array(values) => Value::Array(values.into_iter().map(Value::Int16).collect()),
        Value::Int32Array(values) => Value::Array(values.into_iter().map(Value::Int32).collect()),
        Value::Int64Array(values) => Value::Array(values.into_iter().map(Value::Int64).collect()),
        Value::DoubleArray(values) => {
            Value::Array(values.into_iter().map(Value::Double).collect())
        }
        value => value,
    }
}

/// Insert preserving wire order; a duplicate key overwrites the existing
/// entry in place.
fn dict_insert(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    if let Some(entry) = entries.iter_mut().find(|(k, _)| *k == key) {
        entry.1 = value;
    } else {
        entries.push((key, value));
    }
}
