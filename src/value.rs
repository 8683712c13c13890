use core::fmt;
use std::os::unix::io::RawFd;

use crate::error::{Error, Result};
use crate::proto::Type;
use crate::signature::{OwnedSignature, Signature};

/// A file descriptor passed alongside a message.
///
/// The wire representation of an `h` value is a `u32` index into the
/// message-scoped descriptor table, never the descriptor value itself. This
/// type does not own the underlying descriptor; lifecycle management belongs
/// to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDescriptor(RawFd);

impl FileDescriptor {
    /// Wrap a raw file descriptor.
    pub fn new(fd: RawFd) -> Self {
        Self(fd)
    }

    /// Get the raw file descriptor.
    pub fn raw(self) -> RawFd {
        self.0
    }
}

/// A demarshalled wire value.
///
/// The shape of a value always matches the signature that produced it.
/// Arrays of fixed-width numeric scalars are materialized as the flat
/// variants (`Bytes`, `Int32Array`, ...) when extracted at top level and as
/// generic [`Value::Array`] sequences when nested inside another container,
/// so signature-driven code sees one consistent container shape once nested.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// 8-bit unsigned integer, `y`.
    Byte(u8),
    /// Boolean, `b`. Encoded as a 4-byte 0/1 on the wire.
    Boolean(bool),
    /// 16-bit signed integer, `n`.
    Int16(i16),
    /// 16-bit unsigned integer, `q`.
    UInt16(u16),
    /// 32-bit signed integer, `i`.
    Int32(i32),
    /// 32-bit unsigned integer, `u`.
    UInt32(u32),
    /// 64-bit signed integer, `x`.
    Int64(i64),
    /// 64-bit unsigned integer, `t`.
    UInt64(u64),
    /// IEEE 754 double, `d`.
    Double(f64),
    /// UTF-8 string, `s`.
    Str(String),
    /// Object path, `o`.
    ObjectPath(String),
    /// Type signature, `g`.
    Signature(OwnedSignature),
    /// Generic ordered sequence, `a...`.
    Array(Vec<Value>),
    /// Flat byte array, `ay`.
    Bytes(Vec<u8>),
    /// Flat 16-bit integer array, `an`.
    Int16Array(Vec<i16>),
    /// Flat 32-bit integer array, `ai`.
    Int32Array(Vec<i32>),
    /// Flat 64-bit integer array, `ax`.
    Int64Array(Vec<i64>),
    /// Flat boolean array, `ab`.
    BooleanArray(Vec<bool>),
    /// Flat double array, `ad`.
    DoubleArray(Vec<f64>),
    /// Ordered heterogeneous tuple, `(...)`.
    Struct(Vec<Value>),
    /// Key-value mapping, `a{...}`. Wire order is preserved; duplicate keys
    /// are last-write-wins.
    Dict(Vec<(Value, Value)>),
    /// Self-describing boxed value, `v`.
    Variant(Box<Variant>),
    /// File descriptor, `h`.
    Fd(FileDescriptor),
}

impl Value {
    /// Variant name used in marshalling diagnostics.
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Value::Byte(..) => "Byte",
            Value::Boolean(..) => "Boolean",
            Value::Int16(..) => "Int16",
            Value::UInt16(..) => "UInt16",
            Value::Int32(..) => "Int32",
            Value::UInt32(..) => "UInt32",
            Value::Int64(..) => "Int64",
            Value::UInt64(..) => "UInt64",
            Value::Double(..) => "Double",
            Value::Str(..) => "Str",
            Value::ObjectPath(..) => "ObjectPath",
            Value::Signature(..) => "Signature",
            Value::Array(..) => "Array",
            Value::Bytes(..) => "Bytes",
            Value::Int16Array(..) => "Int16Array",
            Value::Int32Array(..) => "Int32Array",
            Value::Int64Array(..) => "Int64Array",
            Value::BooleanArray(..) => "BooleanArray",
            Value::DoubleArray(..) => "DoubleArray",
            Value::Struct(..) => "Struct",
            Value::Dict(..) => "Dict",
            Value::Variant(..) => "Variant",
            Value::Fd(..) => "Fd",
        }
    }

    /// Infer the signature describing this value.
    ///
    /// Used when boxing a value into a [`Variant`] without an explicit
    /// signature. Fails for empty generic containers, whose element type
    /// cannot be recovered from the value alone.
    pub fn signature(&self) -> Result<OwnedSignature> {
        let mut signature = OwnedSignature::empty();
        self.write_signature(&mut signature)?;
        Ok(signature)
    }

    fn write_signature(&self, out: &mut OwnedSignature) -> Result<()> {
        match self {
            Value::Byte(..) => out.push(Type::BYTE),
            Value::Boolean(..) => out.push(Type::BOOLEAN),
            Value::Int16(..) => out.push(Type::INT16),
            Value::UInt16(..) => out.push(Type::UINT16),
            Value::Int32(..) => out.push(Type::INT32),
            Value::UInt32(..) => out.push(Type::UINT32),
            Value::Int64(..) => out.push(Type::INT64),
            Value::UInt64(..) => out.push(Type::UINT64),
            Value::Double(..) => out.push(Type::DOUBLE),
            Value::Str(..) => out.push(Type::STRING),
            Value::ObjectPath(..) => out.push(Type::OBJECT_PATH),
            Value::Signature(..) => out.push(Type::SIGNATURE),
            Value::Fd(..) => out.push(Type::UNIX_FD),
            Value::Variant(..) => out.push(Type::VARIANT),
            Value::Bytes(..) => {
                out.push(Type::ARRAY);
                out.push(Type::BYTE);
            }
            Value::Int16Array(..) => {
                out.push(Type::ARRAY);
                out.push(Type::INT16);
            }
            Value::Int32Array(..) => {
                out.push(Type::ARRAY);
                out.push(Type::INT32);
            }
            Value::Int64Array(..) => {
                out.push(Type::ARRAY);
                out.push(Type::INT64);
            }
            Value::BooleanArray(..) => {
                out.push(Type::ARRAY);
                out.push(Type::BOOLEAN);
            }
            Value::DoubleArray(..) => {
                out.push(Type::ARRAY);
                out.push(Type::DOUBLE);
            }
            Value::Array(values) => {
                let Some(first) = values.first() else {
                    return Err(Error::CannotInferSignature("an empty array"));
                };

                out.push(Type::ARRAY);
                first.write_signature(out)?;
            }
            Value::Dict(entries) => {
                let Some((key, value)) = entries.first() else {
                    return Err(Error::CannotInferSignature("an empty dict"));
                };

                out.push(Type::ARRAY);
                out.push(Type::OPEN_BRACE);
                key.write_signature(out)?;
                value.write_signature(out)?;
                out.push(Type::CLOSE_BRACE);
            }
            Value::Struct(members) => {
                if members.is_empty() {
                    return Err(Error::CannotInferSignature("an empty struct"));
                }

                out.push(Type::OPEN_PAREN);

                for member in members {
                    member.write_signature(out)?;
                }

                out.push(Type::CLOSE_PAREN);
            }
        }

        Ok(())
    }
}

/// A self-describing boxed value: a signature plus the value matching it.
///
/// # Examples
///
/// ```
/// use dbus_wire::{Value, Variant};
///
/// let variant = Variant::new(Value::UInt32(7))?;
/// assert_eq!(variant.signature().as_str(), "u");
/// # Ok::<_, dbus_wire::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    signature: OwnedSignature,
    value: Value,
}

impl Variant {
    /// Box a value, inferring its signature from its runtime shape.
    pub fn new(value: Value) -> Result<Self> {
        let signature = value.signature()?;
        Ok(Self { signature, value })
    }

    /// Box a value under an explicit signature.
    ///
    /// Required for empty containers, whose signature cannot be inferred.
    pub fn with_signature(value: Value, signature: impl AsRef<Signature>) -> Self {
        Self {
            signature: signature.as_ref().to_owned(),
            value,
        }
    }

    /// The signature describing the boxed value.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The boxed value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Unbox the value.
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl fmt::Display for FileDescriptor {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fd({})", self.0)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    }
}

impl_from! {
    u8 => Byte,
    bool => Boolean,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f64 => Double,
    String => Str,
    &str => Str,
    Vec<u8> => Bytes,
    FileDescriptor => Fd,
}

impl From<Variant> for Value {
    #[inline]
    fn from(variant: Variant) -> Self {
        Value::Variant(Box::new(variant))
    }
}
