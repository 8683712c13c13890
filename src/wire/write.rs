use log::trace;

use crate::buf::WireBuf;
use crate::error::{Error, Result};
use crate::proto::Type;
use crate::signature::{complete_type_len, Signature};
use crate::value::{FileDescriptor, Value};

/// Recursive signature-driven value marshaller.
///
/// Walks a signature and a matching sequence of values together, appending
/// their wire encoding to the buffer. Padding is computed from the buffer
/// length, so the message must occupy the buffer from offset zero.
pub(crate) struct Marshaller<'a> {
    buf: &'a mut WireBuf,
    fds: &'a mut Vec<FileDescriptor>,
}

impl<'a> Marshaller<'a> {
    pub(crate) fn new(buf: &'a mut WireBuf, fds: &'a mut Vec<FileDescriptor>) -> Self {
        Self { buf, fds }
    }

    /// Append a series of values to the buffer.
    ///
    /// Each complete type in the signature consumes exactly one value; a
    /// surplus on either side is an argument count mismatch.
    pub(crate) fn append(&mut self, signature: &Signature, values: &[Value]) -> Result<()> {
        trace!("appending {} value(s) as `{signature}`", values.len());

        let sig = signature.as_bytes();
        let mut values = values.iter();
        let mut at = 0;

        while at < sig.len() {
            let Some(value) = values.next() else {
                return Err(Error::ArgumentCountMismatch);
            };

            at = self.append_one(sig, at, value)?;
        }

        if values.next().is_some() {
            return Err(Error::ArgumentCountMismatch);
        }

        Ok(())
    }

    /// Append one value according to the complete type starting at `at`,
    /// returning the signature offset one past that type.
    fn append_one(&mut self, sig: &[u8], at: usize, value: &Value) -> Result<usize> {
        let ty = Type::new(sig[at]);

        trace!("appending type `{}` at byte {}", char::from(ty.get()), self.buf.len());

        // Pad to the alignment of this type.
        self.buf.pad_for(ty);

        match ty {
            Type::BYTE => {
                let Value::Byte(b) = value else {
                    return Err(self.mismatch(value, ty));
                };

                self.buf.store_u8(*b);
                Ok(at + 1)
            }
            Type::BOOLEAN => {
                let Value::Boolean(b) = value else {
                    return Err(self.mismatch(value, ty));
                };

                self.buf.store_uint(u64::from(*b), 4);
                Ok(at + 1)
            }
            Type::INT16 => {
                let Value::Int16(n) = value else {
                    return Err(self.mismatch(value, ty));
                };

                self.buf.store_uint(*n as u64, 2);
                Ok(at + 1)
            }
            Type::UINT16 => {
                let Value::UInt16(n) = value else {
                    return Err(self.mismatch(value, ty));
                };

                self.buf.store_uint(u64::from(*n), 2);
                Ok(at + 1)
            }
            Type::INT32 => {
                let Value::Int32(n) = value else {
                    return Err(self.mismatch(value, ty));
                };

                self.buf.store_uint(*n as u64, 4);
                Ok(at + 1)
            }
            Type::UINT32 => {
                let Value::UInt32(n) = value else {
                    return Err(self.mismatch(value, ty));
                };

                self.buf.store_uint(u64::from(*n), 4);
                Ok(at + 1)
            }
            Type::INT64 => {
                let Value::Int64(n) = value else {
                    return Err(self.mismatch(value, ty));
                };

                self.buf.store_uint(*n as u64, 8);
                Ok(at + 1)
            }
            Type::UINT64 => {
                let Value::UInt64(n) = value else {
                    return Err(self.mismatch(value, ty));
                };

                self.buf.store_uint(*n, 8);
                Ok(at + 1)
            }
            Type::DOUBLE => {
                let Value::Double(d) = value else {
                    return Err(self.mismatch(value, ty));
                };

                self.buf.store_uint(d.to_bits(), 8);
                Ok(at + 1)
            }
            Type::STRING => {
                let Value::Str(s) = value else {
                    return Err(self.mismatch(value, ty));
                };

                self.store_string(s);
                Ok(at + 1)
            }
            Type::OBJECT_PATH => {
                // An object reference marshals through its path.
                let s = match value {
                    Value::ObjectPath(s) => s,
                    Value::Str(s) => s,
                    _ => return Err(self.mismatch(value, ty)),
                };

                self.store_string(s);
                Ok(at + 1)
            }
            Type::SIGNATURE => {
                let Value::Signature(s) = value else {
                    return Err(self.mismatch(value, ty));
                };

                self.buf.store_u8(s.len() as u8);
                self.buf.extend_from_slice_nul(s.as_bytes());
                Ok(at + 1)
            }
            Type::UNIX_FD => {
                let Value::Fd(fd) = value else {
                    return Err(self.mismatch(value, ty));
                };

                let index = match self.fds.iter().position(|f| f == fd) {
                    Some(index) => index,
                    None => {
                        self.fds.push(*fd);
                        self.fds.len() - 1
                    }
                };

                self.buf.store_uint(index as u64, 4);
                Ok(at + 1)
            }
            Type::VARIANT => {
                let Value::Variant(variant) = value else {
                    return Err(self.mismatch(value, ty));
                };

                // A variant is self-describing: its signature immediately
                // followed by the value marshalled under that signature.
                let signature = variant.signature();
                self.buf.store_u8(signature.len() as u8);
                self.buf.extend_from_slice_nul(signature.as_bytes());
                self.append(signature, core::slice::from_ref(variant.value()))?;
                Ok(at + 1)
            }
            Type::ARRAY => self.append_array(sig, at, value),
            Type::OPEN_PAREN => {
                let Value::Struct(members) = value else {
                    return Err(self.mismatch(value, ty));
                };

                let mut members = members.iter();
                let mut n = at + 1;

                while sig[n] != Type::CLOSE_PAREN.get() {
                    let Some(member) = members.next() else {
                        return Err(Error::ArgumentCountMismatch);
                    };

                    n = self.append_one(sig, n, member)?;
                }

                if members.next().is_some() {
                    return Err(Error::ArgumentCountMismatch);
                }

                Ok(n + 1)
            }
            Type::OPEN_BRACE => {
                // A single dict entry is exactly a two-member struct.
                let Value::Struct(members) = value else {
                    return Err(self.mismatch(value, ty));
                };

                let mut members = members.iter();
                let mut n = at + 1;

                while sig[n] != Type::CLOSE_BRACE.get() {
                    let Some(member) = members.next() else {
                        return Err(Error::ArgumentCountMismatch);
                    };

                    n = self.append_one(sig, n, member)?;
                }

                if members.next().is_some() {
                    return Err(Error::ArgumentCountMismatch);
                }

                Ok(n + 1)
            }
            _ => Err(Error::UnknownTypeCode(ty.get())),
        }
    }

    /// Append an array value, patching its length prefix once the elements
    /// are marshalled.
    ///
    /// The prefix counts the bytes from the end of the element padding to
    /// the end of the last element, not the padding itself. A zero-element
    /// array writes nothing but must still advance the signature cursor
    /// past the full element type span.
    fn append_array(&mut self, sig: &[u8], at: usize, value: &Value) -> Result<usize> {
        let element = Type::new(sig[at + 1]);

        let slot = self.buf.alloc_length();
        self.buf.pad_for(element);
        let start = self.buf.len();

        let end = match (value, element) {
            (Value::Bytes(bytes), Type::BYTE) => {
                self.buf.extend_from_slice(bytes);
                at + 2
            }
            (Value::Int16Array(values), Type::INT16) => {
                for &n in values {
                    self.buf.store_uint(n as u64, 2);
                }

                at + 2
            }
            (Value::Int32Array(values), Type::INT32) => {
                for &n in values {
                    self.buf.store_uint(n as u64, 4);
                }

                at + 2
            }
            (Value::Int64Array(values), Type::INT64) => {
                for &n in values {
                    self.buf.store_uint(n as u64, 8);
                }

                at + 2
            }
            (Value::BooleanArray(values), Type::BOOLEAN) => {
                for &b in values {
                    self.buf.store_uint(u64::from(b), 4);
                }

                at + 2
            }
            (Value::DoubleArray(values), Type::DOUBLE) => {
                for &d in values {
                    self.buf.store_uint(d.to_bits(), 8);
                }

                at + 2
            }
            (Value::Dict(entries), Type::OPEN_BRACE) => {
                if entries.is_empty() {
                    complete_type_len(sig, at)?
                } else {
                    let mut end = at + 1;

                    for (key, value) in entries {
                        // Dict entries are structs: 8-aligned, no prefix.
                        self.buf.pad_for(Type::OPEN_BRACE);
                        let n = self.append_one(sig, at + 2, key)?;
                        end = self.append_one(sig, n, value)? + 1;
                    }

                    end
                }
            }
            (Value::Array(values), _) => {
                if values.is_empty() {
                    complete_type_len(sig, at)?
                } else {
                    let mut end = at + 1;

                    for value in values {
                        end = self.append_one(sig, at + 1, value)?;
                    }

                    end
                }
            }
            _ => return Err(self.mismatch(value, Type::ARRAY)),
        };

        let written = self.buf.len() - start;
        trace!("array spans {start}..{} ({written} bytes)", self.buf.len());
        self.buf.store_length_at(slot, written as u32);
        Ok(end)
    }

    fn store_string(&mut self, s: &str) {
        // A u32 byte count (not char count), UTF-8 bytes, then a NUL which
        // is not included in the count.
        self.buf.store_uint(s.len() as u64, 4);
        self.buf.extend_from_slice_nul(s.as_bytes());
    }

    fn mismatch(&self, value: &Value, expected: Type) -> Error {
        Error::Marshal {
            found: value.type_name(),
            expected: expected.get(),
        }
    }
}
