use std::num::NonZeroU32;
use std::sync::OnceLock;

use log::trace;

use crate::buf::{Cursor, WireBuf};
use crate::error::{Error, Result};
use crate::proto::{
    align_offset, Endianness, Flags, HeaderField, MessageType, MAX_MESSAGE_LENGTH,
    PROTOCOL_VERSION,
};
use crate::signature::{OwnedSignature, Signature};
use crate::value::{FileDescriptor, Value, Variant};
use crate::wire;

use super::MessageKind;

/// Signature of the header field array.
///
/// SAFETY: the signature is valid.
const HEADER_SIGNATURE: &Signature = unsafe { Signature::new_unchecked(b"a(yv)") };

/// A D-Bus message.
///
/// A message is either constructed locally through one of the kind
/// constructors and [`set_body`], or decoded from received wire bytes with
/// [`from_bytes`]. Either way it owns its body bytes and file descriptor
/// table exclusively.
///
/// A received body is not parsed up front; [`parameters`] extracts it on
/// first access and caches the result.
///
/// [`set_body`]: Self::set_body
/// [`from_bytes`]: Self::from_bytes
/// [`parameters`]: Self::parameters
///
/// # Examples
///
/// ```
/// use std::num::NonZeroU32;
///
/// use dbus_wire::{Message, Signature, Value};
///
/// let serial = NonZeroU32::new(1).unwrap();
///
/// let mut m = Message::method_call("/org/example/Thing", "Frobnicate", serial)
///     .with_destination("org.example");
///
/// m.set_body(Signature::new(b"su")?, &[
///     Value::Str(String::from("knob")),
///     Value::UInt32(7),
/// ])?;
///
/// let bytes = m.encode()?;
/// let m2 = Message::from_bytes(&bytes, Vec::new())?;
///
/// assert_eq!(m, m2);
/// assert_eq!(m2.parameters()?[1], Value::UInt32(7));
/// # Ok::<_, dbus_wire::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Message {
    /// The type of the message.
    kind: MessageKind,
    /// Serial of the message.
    serial: NonZeroU32,
    /// Flags in the message.
    flags: Flags,
    /// Endianness every integer in the message is written in.
    endianness: Endianness,
    /// The interface of the message.
    interface: Option<Box<str>>,
    /// The destination of the message.
    destination: Option<Box<str>>,
    /// The sender of the message.
    sender: Option<Box<str>>,
    /// Signature of the body.
    signature: OwnedSignature,
    /// Marshalled body bytes.
    body: Vec<u8>,
    /// File descriptors referenced by the body.
    fds: Vec<FileDescriptor>,
    /// Extracted body values, populated at most once.
    parameters: OnceLock<Vec<Value>>,
}

impl Message {
    fn new(kind: MessageKind, serial: NonZeroU32) -> Self {
        Self {
            kind,
            serial,
            flags: Flags::EMPTY,
            endianness: Endianness::NATIVE,
            interface: None,
            destination: None,
            sender: None,
            signature: OwnedSignature::empty(),
            body: Vec::new(),
            fds: Vec::new(),
            parameters: OnceLock::new(),
        }
    }

    /// Construct a method call message.
    pub fn method_call(
        path: impl Into<Box<str>>,
        member: impl Into<Box<str>>,
        serial: NonZeroU32,
    ) -> Self {
        Self::new(
            MessageKind::MethodCall {
                path: path.into(),
                member: member.into(),
            },
            serial,
        )
    }

    /// Construct a method return message replying to `reply_serial`.
    pub fn method_return(reply_serial: NonZeroU32, serial: NonZeroU32) -> Self {
        Self::new(MessageKind::MethodReturn { reply_serial }, serial)
    }

    /// Construct an error message replying to `reply_serial`.
    pub fn error(
        error_name: impl Into<Box<str>>,
        reply_serial: NonZeroU32,
        serial: NonZeroU32,
    ) -> Self {
        Self::new(
            MessageKind::Error {
                error_name: error_name.into(),
                reply_serial,
            },
            serial,
        )
    }

    /// Construct a signal message.
    ///
    /// Signals additionally require an interface; set one with
    /// [`with_interface`] before encoding.
    ///
    /// [`with_interface`]: Self::with_interface
    pub fn signal(
        path: impl Into<Box<str>>,
        member: impl Into<Box<str>>,
        serial: NonZeroU32,
    ) -> Self {
        Self::new(
            MessageKind::Signal {
                path: path.into(),
                member: member.into(),
            },
            serial,
        )
    }

    /// Get the kind of the message.
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// Get the serial of the message.
    pub fn serial(&self) -> NonZeroU32 {
        self.serial
    }

    /// Modify the serial of the message.
    #[must_use]
    pub fn with_serial(self, serial: NonZeroU32) -> Self {
        Self { serial, ..self }
    }

    /// Get the flags of the message.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Modify the flags of the message.
    #[must_use]
    pub fn with_flags(self, flags: Flags) -> Self {
        Self { flags, ..self }
    }

    /// Get the endianness of the message.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Modify the endianness the message is marshalled in.
    ///
    /// Must be set before [`set_body`], since the body bytes are produced in
    /// the endianness current at that point.
    ///
    /// [`set_body`]: Self::set_body
    #[must_use]
    pub fn with_endianness(self, endianness: Endianness) -> Self {
        Self { endianness, ..self }
    }

    /// Get the interface of the message.
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Modify the interface of the message.
    #[must_use]
    pub fn with_interface(self, interface: impl Into<Box<str>>) -> Self {
        Self {
            interface: Some(interface.into()),
            ..self
        }
    }

    /// Get the destination of the message.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Modify the destination of the message.
    #[must_use]
    pub fn with_destination(self, destination: impl Into<Box<str>>) -> Self {
        Self {
            destination: Some(destination.into()),
            ..self
        }
    }

    /// Get the sender of the message.
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    /// Modify the sender of the message.
    #[must_use]
    pub fn with_sender(self, sender: impl Into<Box<str>>) -> Self {
        Self {
            sender: Some(sender.into()),
            ..self
        }
    }

    /// Replace the sender of the message in place.
    ///
    /// Used when relaying a message that arrived without a sender stamp. The
    /// next [`encode`] call reassembles the wire image from the stored fields
    /// and body bytes, so the change needs no header patching.
    ///
    /// [`encode`]: Self::encode
    pub fn set_sender(&mut self, sender: impl Into<Box<str>>) {
        self.sender = Some(sender.into());
    }

    /// Get the signature of the body.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Get the marshalled body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Get the file descriptors referenced by the body.
    pub fn fds(&self) -> &[FileDescriptor] {
        &self.fds
    }

    /// Marshal `values` into the message body according to `signature`.
    ///
    /// Replaces any previous body, its signature and its file descriptor
    /// table.
    pub fn set_body(&mut self, signature: &Signature, values: &[Value]) -> Result<()> {
        let mut buf = WireBuf::new(self.endianness);
        let mut fds = Vec::new();

        wire::marshal(signature, values, &mut buf, &mut fds)?;

        self.signature = signature.to_owned();
        self.body = buf.into_vec();
        self.fds = fds;
        self.parameters = OnceLock::new();
        Ok(())
    }

    /// Get the values of the message body.
    ///
    /// The body is extracted according to the signature declared in the
    /// header on first call; the result is cached, so repeated access does
    /// not re-walk the body bytes.
    pub fn parameters(&self) -> Result<&[Value]> {
        if let Some(values) = self.parameters.get() {
            return Ok(values);
        }

        let mut cursor = Cursor::new(&self.body, self.endianness);
        let values = wire::extract(&self.signature, &mut cursor, &self.fds)?;

        // A concurrent caller may have extracted the same bytes in the
        // meantime; the first stored result wins and the duplicate is
        // dropped, which is deterministic since both saw identical input.
        Ok(self.parameters.get_or_init(|| values))
    }

    /// Get a header field of the message as a wire value, or `None` when the
    /// field is not present.
    pub fn header(&self, field: HeaderField) -> Option<Value> {
        match (field, &self.kind) {
            (HeaderField::PATH, MessageKind::MethodCall { path, .. })
            | (HeaderField::PATH, MessageKind::Signal { path, .. }) => {
                Some(Value::ObjectPath(path.to_string()))
            }
            (HeaderField::MEMBER, MessageKind::MethodCall { member, .. })
            | (HeaderField::MEMBER, MessageKind::Signal { member, .. }) => {
                Some(Value::Str(member.to_string()))
            }
            (HeaderField::ERROR_NAME, MessageKind::Error { error_name, .. }) => {
                Some(Value::Str(error_name.to_string()))
            }
            (HeaderField::REPLY_SERIAL, MessageKind::MethodReturn { reply_serial })
            | (HeaderField::REPLY_SERIAL, MessageKind::Error { reply_serial, .. }) => {
                Some(Value::UInt32(reply_serial.get()))
            }
            (HeaderField::INTERFACE, _) => {
                self.interface.as_deref().map(|s| Value::Str(s.to_owned()))
            }
            (HeaderField::DESTINATION, _) => {
                self.destination.as_deref().map(|s| Value::Str(s.to_owned()))
            }
            (HeaderField::SENDER, _) => {
                self.sender.as_deref().map(|s| Value::Str(s.to_owned()))
            }
            (HeaderField::SIGNATURE, _) => {
                (!self.signature.is_empty()).then(|| Value::Signature(self.signature.clone()))
            }
            (HeaderField::UNIX_FDS, _) => {
                (!self.fds.is_empty()).then(|| Value::UInt32(self.fds.len() as u32))
            }
            _ => None,
        }
    }

    /// Produce the complete wire image of the message.
    ///
    /// The fixed prefix, then the header field array, padding to 8, then the
    /// body bytes stored by [`set_body`].
    ///
    /// [`set_body`]: Self::set_body
    pub fn encode(&self) -> Result<Vec<u8>> {
        let Ok(body_length) = u32::try_from(self.body.len()) else {
            return Err(Error::BodyTooLong(u32::MAX));
        };

        if body_length > MAX_MESSAGE_LENGTH {
            return Err(Error::BodyTooLong(body_length));
        }

        trace!(
            "encoding {:?} serial {} with {body_length} body byte(s)",
            self.kind.message_type(),
            self.serial
        );

        let mut buf = WireBuf::new(self.endianness);
        buf.store_u8(self.endianness.get());
        buf.store_u8(self.kind.message_type().get());
        buf.store_u8(self.flags.get());
        buf.store_u8(PROTOCOL_VERSION);
        buf.store_uint(u64::from(body_length), 4);
        buf.store_uint(u64::from(self.serial.get()), 4);

        let fields = Value::Array(self.header_fields()?);
        // Header fields never carry descriptors, so the table stays empty.
        let mut fds = Vec::new();
        wire::marshal(HEADER_SIGNATURE, core::slice::from_ref(&fields), &mut buf, &mut fds)?;

        buf.pad_to(8);
        buf.extend_from_slice(&self.body);
        Ok(buf.into_vec())
    }

    /// The header fields as `(field-id, variant)` structs, kind-specific
    /// fields first.
    fn header_fields(&self) -> Result<Vec<Value>> {
        let mut fields = Vec::new();

        match &self.kind {
            MessageKind::MethodCall { path, member } => {
                fields.push(field(HeaderField::PATH, object_path(path)));
                fields.push(field(HeaderField::MEMBER, string(member)));
            }
            MessageKind::MethodReturn { reply_serial } => {
                fields.push(field(HeaderField::REPLY_SERIAL, serial(*reply_serial)));
            }
            MessageKind::Error {
                error_name,
                reply_serial,
            } => {
                fields.push(field(HeaderField::ERROR_NAME, string(error_name)));
                fields.push(field(HeaderField::REPLY_SERIAL, serial(*reply_serial)));
            }
            MessageKind::Signal { path, member } => {
                if self.interface.is_none() {
                    return Err(Error::MissingInterface);
                }

                fields.push(field(HeaderField::PATH, object_path(path)));
                fields.push(field(HeaderField::MEMBER, string(member)));
            }
        }

        if let Some(interface) = self.interface.as_deref() {
            fields.push(field(HeaderField::INTERFACE, string(interface)));
        }

        if let Some(destination) = self.destination.as_deref() {
            fields.push(field(HeaderField::DESTINATION, string(destination)));
        }

        if let Some(sender) = self.sender.as_deref() {
            fields.push(field(HeaderField::SENDER, string(sender)));
        }

        if !self.signature.is_empty() {
            let value = Value::Signature(self.signature.clone());
            fields.push(field(
                HeaderField::SIGNATURE,
                Variant::with_signature(value, Signature::SIGNATURE),
            ));
        }

        if !self.fds.is_empty() {
            let value = Value::UInt32(self.fds.len() as u32);
            fields.push(field(
                HeaderField::UNIX_FDS,
                Variant::with_signature(value, Signature::UINT32),
            ));
        }

        Ok(fields)
    }

    /// Decode a message from its already split wire segments.
    ///
    /// `prefix` is the first 16 bytes of the image (fixed prefix plus the
    /// header array length), `header` the header field array contents and
    /// `body` the raw body. All three are copied; header fields are
    /// extracted eagerly, the body is kept unparsed until [`parameters`].
    ///
    /// [`parameters`]: Self::parameters
    pub fn decode(
        prefix: &[u8],
        header: &[u8],
        body: &[u8],
        fds: Vec<FileDescriptor>,
    ) -> Result<Self> {
        let endianness = match prefix.first() {
            Some(&b'l') => Endianness::LITTLE,
            Some(&b'B') => Endianness::BIG,
            _ => return Err(Error::InvalidProtocol),
        };

        let mut cursor = Cursor::at(prefix, 1, endianness);
        let message_type = MessageType::new(cursor.load_u8()?);
        let flags = Flags::new(cursor.load_u8()?);

        if cursor.load_u8()? != PROTOCOL_VERSION {
            return Err(Error::InvalidProtocol);
        }

        let body_length = cursor.load_uint(4)? as u32;
        let serial = NonZeroU32::new(cursor.load_uint(4)? as u32).ok_or(Error::ZeroSerial)?;

        if body_length > MAX_MESSAGE_LENGTH {
            return Err(Error::BodyTooLong(body_length));
        }

        trace!("decoding {message_type:?} serial {serial} with {} header byte(s)", header.len());

        let mut path = None;
        let mut interface = None;
        let mut member = None;
        let mut error_name = None;
        let mut reply_serial = None;
        let mut destination = None;
        let mut sender = None;
        let mut signature = OwnedSignature::empty();

        let mut cursor = Cursor::new(header, endianness);

        while !cursor.is_empty() {
            // Each (field-id, variant) struct sits on an 8-byte boundary,
            // which the cursor shares with the full image since the header
            // starts at offset 16.
            cursor.align_to(8);

            let id = HeaderField::new(cursor.load_u8()?);
            let mut values = wire::extract(Signature::VARIANT, &mut cursor, &fds)?;

            let Some(Value::Variant(variant)) = values.pop() else {
                return Err(Error::InvalidProtocol);
            };

            // Unknown ids and unexpected payload types fall through; the
            // variant is already consumed so nothing further to skip.
            match (id, variant.into_value()) {
                (HeaderField::PATH, Value::ObjectPath(s)) => path = Some(s),
                (HeaderField::INTERFACE, Value::Str(s)) => interface = Some(s),
                (HeaderField::MEMBER, Value::Str(s)) => member = Some(s),
                (HeaderField::ERROR_NAME, Value::Str(s)) => error_name = Some(s),
                (HeaderField::REPLY_SERIAL, Value::UInt32(n)) => {
                    reply_serial = NonZeroU32::new(n);
                }
                (HeaderField::DESTINATION, Value::Str(s)) => destination = Some(s),
                (HeaderField::SENDER, Value::Str(s)) => sender = Some(s),
                (HeaderField::SIGNATURE, Value::Signature(s)) => signature = s,
                _ => {}
            }
        }

        let kind = match message_type {
            MessageType::METHOD_CALL => {
                let path = path.ok_or(Error::MissingPath)?;
                let member = member.ok_or(Error::MissingMember)?;

                MessageKind::MethodCall {
                    path: path.into(),
                    member: member.into(),
                }
            }
            MessageType::METHOD_RETURN => MessageKind::MethodReturn {
                reply_serial: reply_serial.ok_or(Error::MissingReplySerial)?,
            },
            MessageType::ERROR => MessageKind::Error {
                error_name: error_name.ok_or(Error::MissingErrorName)?.into(),
                reply_serial: reply_serial.ok_or(Error::MissingReplySerial)?,
            },
            MessageType::SIGNAL => {
                let path = path.ok_or(Error::MissingPath)?;
                let member = member.ok_or(Error::MissingMember)?;

                if interface.is_none() {
                    return Err(Error::MissingInterface);
                }

                MessageKind::Signal {
                    path: path.into(),
                    member: member.into(),
                }
            }
            _ => return Err(Error::InvalidProtocol),
        };

        Ok(Self {
            kind,
            serial,
            flags,
            endianness,
            interface: interface.map(String::into_boxed_str),
            destination: destination.map(String::into_boxed_str),
            sender: sender.map(String::into_boxed_str),
            signature,
            body: body.to_vec(),
            fds,
            parameters: OnceLock::new(),
        })
    }

    /// Decode a message from a complete wire image.
    ///
    /// Splits the image into its prefix, header array and body segments,
    /// validating the declared lengths against the hard message size limit
    /// before anything is copied.
    pub fn from_bytes(bytes: &[u8], fds: Vec<FileDescriptor>) -> Result<Self> {
        if bytes.len() < 16 {
            return Err(Error::BufferUnderflow {
                at: 0,
                requested: 16,
                len: bytes.len(),
            });
        }

        let endianness = match bytes[0] {
            b'l' => Endianness::LITTLE,
            b'B' => Endianness::BIG,
            _ => return Err(Error::InvalidProtocol),
        };

        let mut cursor = Cursor::at(bytes, 4, endianness);
        let body_length = cursor.load_uint(4)? as u32;
        cursor.advance(4)?;
        let header_length = cursor.load_uint(4)? as u32;

        if header_length > MAX_MESSAGE_LENGTH {
            return Err(Error::HeaderTooLong(header_length));
        }

        if body_length > MAX_MESSAGE_LENGTH {
            return Err(Error::BodyTooLong(body_length));
        }

        let header_end = 16 + header_length as usize;
        let body_start = align_offset(header_end, 8);

        let Some(header) = bytes.get(16..header_end) else {
            return Err(Error::BufferUnderflow {
                at: 16,
                requested: header_length as usize,
                len: bytes.len(),
            });
        };

        let Some(body) = bytes.get(body_start..body_start + body_length as usize) else {
            return Err(Error::BufferUnderflow {
                at: body_start,
                requested: body_length as usize,
                len: bytes.len(),
            });
        };

        Self::decode(&bytes[..16], header, body, fds)
    }
}

/// Equality over the message fields; the lazily extracted parameter cache
/// does not participate.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.serial == other.serial
            && self.flags == other.flags
            && self.endianness == other.endianness
            && self.interface == other.interface
            && self.destination == other.destination
            && self.sender == other.sender
            && self.signature == other.signature
            && self.body == other.body
            && self.fds == other.fds
    }
}

impl Eq for Message {}

fn field(id: HeaderField, variant: Variant) -> Value {
    Value::Struct(vec![
        Value::Byte(id.get()),
        Value::Variant(Box::new(variant)),
    ])
}

fn object_path(path: &str) -> Variant {
    Variant::with_signature(Value::ObjectPath(path.to_owned()), Signature::OBJECT_PATH)
}

fn string(s: &str) -> Variant {
    Variant::with_signature(Value::Str(s.to_owned()), Signature::STRING)
}

fn serial(serial: NonZeroU32) -> Variant {
    Variant::with_signature(Value::UInt32(serial.get()), Signature::UINT32)
}
