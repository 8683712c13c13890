//! Low level details of the D-Bus wire protocol.

/// The protocol major version spoken by this crate.
pub const PROTOCOL_VERSION: u8 = 1;

/// Maximum number of bytes a single marshalled array may occupy.
pub const MAX_ARRAY_LENGTH: u32 = 67108864;

/// Maximum number of bytes a complete message may occupy.
pub const MAX_MESSAGE_LENGTH: u32 = MAX_ARRAY_LENGTH * 2;

/// Maximum nesting depth of container types in a signature.
pub(crate) const MAX_DEPTH: usize = 32;

/// Maximum length in bytes of a signature.
pub(crate) const MAX_SIGNATURE_LENGTH: usize = 255;

raw_enum! {
    /// The endianness tag of a message.
    ///
    /// Fixed when the message is created and applied to every integer in the
    /// message, including the length prefixes of strings, arrays and
    /// signatures.
    #[repr(u8)]
    pub enum Endianness {
        /// Little endian, tagged `l` on the wire.
        LITTLE = b'l',
        /// Big endian, tagged `B` on the wire.
        BIG = b'B',
    }
}

impl Endianness {
    /// Endianness of the host.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::LITTLE;
    /// Endianness of the host.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::BIG;
}

raw_enum! {
    /// The type of a message.
    #[repr(u8)]
    pub enum MessageType {
        /// Method call. This message type may prompt a reply.
        METHOD_CALL = 1,
        /// Method reply with returned data.
        METHOD_RETURN = 2,
        /// Error reply. If the first argument exists and is a string, it is
        /// an error message.
        ERROR = 3,
        /// Signal emission.
        SIGNAL = 4,
    }
}

raw_set! {
    /// Flags inside of a D-Bus message.
    #[repr(u8)]
    pub enum Flags {
        /// An empty set of flags.
        EMPTY = 0,
        /// This message does not expect a method return or error reply, even
        /// if it is of a type that can have one.
        NO_REPLY_EXPECTED = 0x01,
        /// The bus must not launch an owner for the destination name in
        /// response to this message.
        NO_AUTO_START = 0x02,
        /// The caller is prepared to wait for interactive authorization of
        /// the call.
        ALLOW_INTERACTIVE_AUTHORIZATION = 0x04,
    }
}

raw_enum! {
    /// The field id of a message header entry.
    ///
    /// The header is an array of `(field-id, variant)` structs; ids outside
    /// this set must be ignored by conforming implementations.
    #[repr(u8)]
    pub enum HeaderField {
        /// The object to send a call to, or the object a signal is emitted
        /// from.
        PATH = 1,
        /// The interface to invoke a method call on, or that a signal is
        /// emitted from.
        INTERFACE = 2,
        /// The member, either the method name or signal name.
        MEMBER = 3,
        /// The name of the error that occurred, for errors.
        ERROR_NAME = 4,
        /// The serial number of the message this message is a reply to.
        REPLY_SERIAL = 5,
        /// The name of the connection this message is intended for.
        DESTINATION = 6,
        /// Unique name of the sending connection.
        SENDER = 7,
        /// The signature of the message body.
        SIGNATURE = 8,
        /// The number of unix file descriptors that accompany the message.
        UNIX_FDS = 9,
    }
}

raw_enum! {
    /// A single type code inside of a signature.
    #[repr(u8)]
    pub enum Type {
        /// Not a valid type code, used to terminate signatures.
        INVALID = b'\0',
        /// 8-bit unsigned integer.
        BYTE = b'y',
        /// Boolean value, 0 is FALSE and 1 is TRUE. Everything else is
        /// invalid.
        BOOLEAN = b'b',
        /// 16-bit signed integer.
        INT16 = b'n',
        /// 16-bit unsigned integer.
        UINT16 = b'q',
        /// 32-bit signed integer.
        INT32 = b'i',
        /// 32-bit unsigned integer.
        UINT32 = b'u',
        /// 64-bit signed integer.
        INT64 = b'x',
        /// 64-bit unsigned integer.
        UINT64 = b't',
        /// IEEE 754 double precision floating point.
        DOUBLE = b'd',
        /// UTF-8 string, length-prefixed and NUL terminated.
        STRING = b's',
        /// Name of an object instance.
        OBJECT_PATH = b'o',
        /// A type signature.
        SIGNATURE = b'g',
        /// Unsigned 32-bit index into the out-of-band file descriptor table.
        UNIX_FD = b'h',
        /// Array marker, immediately followed by the element type.
        ARRAY = b'a',
        /// Variant, a self-describing boxed value.
        VARIANT = b'v',
        /// Struct open marker.
        OPEN_PAREN = b'(',
        /// Struct close marker.
        CLOSE_PAREN = b')',
        /// Dict entry open marker, only valid as an array element.
        OPEN_BRACE = b'{',
        /// Dict entry close marker.
        CLOSE_BRACE = b'}',
    }
}

impl Type {
    /// Alignment in bytes of a value of this type.
    ///
    /// Compound openers align to 8 regardless of their first member. Arrays,
    /// strings and object paths align to their 32-bit length prefix.
    pub const fn alignment(self) -> usize {
        match self {
            Type::INT16 | Type::UINT16 => 2,
            Type::BOOLEAN
            | Type::INT32
            | Type::UINT32
            | Type::UNIX_FD
            | Type::STRING
            | Type::OBJECT_PATH
            | Type::ARRAY => 4,
            Type::INT64
            | Type::UINT64
            | Type::DOUBLE
            | Type::OPEN_PAREN
            | Type::CLOSE_PAREN
            | Type::OPEN_BRACE
            | Type::CLOSE_BRACE => 8,
            _ => 1,
        }
    }

    /// Whether this is a basic (non-container) type, which is the class
    /// permitted as a dict key.
    pub(crate) const fn is_basic(self) -> bool {
        matches!(
            self,
            Type::BYTE
                | Type::BOOLEAN
                | Type::INT16
                | Type::UINT16
                | Type::INT32
                | Type::UINT32
                | Type::INT64
                | Type::UINT64
                | Type::DOUBLE
                | Type::STRING
                | Type::OBJECT_PATH
                | Type::SIGNATURE
                | Type::UNIX_FD
        )
    }

    /// Whether a value of this type is a fixed-width numeric scalar which an
    /// array extraction may materialize as a flat native vector.
    pub(crate) const fn is_flat_scalar(self) -> bool {
        matches!(
            self,
            Type::BYTE | Type::BOOLEAN | Type::INT16 | Type::INT32 | Type::INT64 | Type::DOUBLE
        )
    }
}

/// Round `offset` up to the next multiple of `alignment`.
///
/// No-op when already aligned. `alignment` is always one of 1, 2, 4 or 8.
#[inline]
pub(crate) const fn align_offset(offset: usize, alignment: usize) -> usize {
    let rem = offset % alignment;

    if rem == 0 {
        offset
    } else {
        offset + (alignment - rem)
    }
}
