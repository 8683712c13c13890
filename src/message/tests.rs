use std::num::NonZeroU32;

use anyhow::Result;
use test_log::test;

use crate::buf::WireBuf;
use crate::error::Error;
use crate::proto::{Endianness, Flags, HeaderField};
use crate::signature::Signature;
use crate::value::{FileDescriptor, Value, Variant};
use crate::wire;

use super::{Message, MessageKind, SerialAllocator};

/// An empty method return, serial 2 replying to serial 1.
const LE_BLOB: [u8; 24] = [
    b'l', 2, 0, 1, // endianness, type, flags, version
    0, 0, 0, 0, // body length
    2, 0, 0, 0, // serial
    8, 0, 0, 0, // header array length
    5, 1, b'u', 0, // REPLY_SERIAL, variant signature "u"
    1, 0, 0, 0, // reply serial
];

const BE_BLOB: [u8; 24] = [
    b'B', 2, 0, 1, // endianness, type, flags, version
    0, 0, 0, 0, // body length
    0, 0, 0, 2, // serial
    0, 0, 0, 8, // header array length
    5, 1, b'u', 0, // REPLY_SERIAL, variant signature "u"
    0, 0, 0, 1, // reply serial
];

fn serial(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

#[test]
fn method_return_blobs() -> Result<()> {
    let m = Message::method_return(serial(1), serial(2));

    let le = m.clone().with_endianness(Endianness::LITTLE);
    assert_eq!(le.encode()?, LE_BLOB);
    assert_eq!(Message::from_bytes(&LE_BLOB, Vec::new())?, le);

    let be = m.with_endianness(Endianness::BIG);
    assert_eq!(be.encode()?, BE_BLOB);
    assert_eq!(Message::from_bytes(&BE_BLOB, Vec::new())?, be);
    Ok(())
}

#[test]
fn method_call_round_trip() -> Result<()> {
    for endianness in [Endianness::LITTLE, Endianness::BIG] {
        let mut m = Message::method_call("/org/example/Thing", "Frobnicate", serial(42))
            .with_endianness(endianness)
            .with_destination("org.example")
            .with_flags(Flags::NO_REPLY_EXPECTED);

        m.set_body(
            Signature::new(b"sai")?,
            &[
                Value::Str(String::from("knob")),
                Value::Int32Array(vec![1, 2, 3]),
            ],
        )?;

        let m2 = Message::from_bytes(&m.encode()?, Vec::new())?;
        assert_eq!(m2, m);

        assert_eq!(
            *m2.kind(),
            MessageKind::MethodCall {
                path: "/org/example/Thing".into(),
                member: "Frobnicate".into(),
            }
        );

        assert_eq!(m2.flags(), Flags::NO_REPLY_EXPECTED);
        assert_eq!(m2.destination(), Some("org.example"));
        assert_eq!(m2.signature(), Signature::new(b"sai")?);

        // The body is only extracted here, not during decoding.
        assert_eq!(
            m2.parameters()?,
            [
                Value::Str(String::from("knob")),
                Value::Int32Array(vec![1, 2, 3]),
            ]
        );

        // Second access hits the cache and agrees.
        assert_eq!(m2.parameters()?, m2.parameters()?);
    }

    Ok(())
}

#[test]
fn error_round_trip() -> Result<()> {
    let mut m = Message::error("org.example.Error.Failed", serial(42), serial(43))
        .with_sender(":1.7");

    m.set_body(
        Signature::new(b"s")?,
        &[Value::Str(String::from("it broke"))],
    )?;

    let m2 = Message::from_bytes(&m.encode()?, Vec::new())?;
    assert_eq!(m2, m);

    assert_eq!(
        *m2.kind(),
        MessageKind::Error {
            error_name: "org.example.Error.Failed".into(),
            reply_serial: serial(42),
        }
    );

    Ok(())
}

#[test]
fn signal_requires_interface() -> Result<()> {
    let m = Message::signal("/org/example/Thing", "Changed", serial(8));

    assert_eq!(m.encode(), Err(Error::MissingInterface));

    let m = m.with_interface("org.example.Thing");
    let m2 = Message::from_bytes(&m.encode()?, Vec::new())?;

    assert_eq!(m2, m);
    assert_eq!(m2.interface(), Some("org.example.Thing"));
    Ok(())
}

#[test]
fn sender_stamped_before_relay() -> Result<()> {
    let mut m = Message::from_bytes(&LE_BLOB, Vec::new())?;
    assert_eq!(m.sender(), None);

    m.set_sender(":1.14");

    let m2 = Message::from_bytes(&m.encode()?, Vec::new())?;
    assert_eq!(m2.sender(), Some(":1.14"));
    Ok(())
}

#[test]
fn header_view() -> Result<()> {
    let mut m = Message::method_call("/org/example/Thing", "Frobnicate", serial(1));

    assert_eq!(
        m.header(HeaderField::PATH),
        Some(Value::ObjectPath(String::from("/org/example/Thing")))
    );
    assert_eq!(
        m.header(HeaderField::MEMBER),
        Some(Value::Str(String::from("Frobnicate")))
    );
    assert_eq!(m.header(HeaderField::SIGNATURE), None);
    assert_eq!(m.header(HeaderField::REPLY_SERIAL), None);

    m.set_body(Signature::new(b"h")?, &[Value::Fd(FileDescriptor::new(3))])?;

    assert_eq!(
        m.header(HeaderField::SIGNATURE),
        Some(Value::Signature(Signature::new(b"h")?.to_owned()))
    );
    assert_eq!(m.header(HeaderField::UNIX_FDS), Some(Value::UInt32(1)));
    Ok(())
}

#[test]
fn body_descriptors_survive_round_trip() -> Result<()> {
    let fd = FileDescriptor::new(9);

    let mut m = Message::method_return(serial(1), serial(2));
    m.set_body(Signature::new(b"h")?, &[Value::Fd(fd)])?;
    assert_eq!(m.fds(), [fd]);

    let m2 = Message::from_bytes(&m.encode()?, m.fds().to_vec())?;
    assert_eq!(m2.parameters()?, [Value::Fd(fd)]);
    Ok(())
}

#[test]
fn unknown_header_field_skipped() -> Result<()> {
    // A header array with an unrecognized field id before the required
    // REPLY_SERIAL entry.
    let fields = Value::Array(vec![
        Value::Struct(vec![
            Value::Byte(200),
            Value::Variant(Box::new(Variant::new(Value::UInt32(7))?)),
        ]),
        Value::Struct(vec![
            Value::Byte(HeaderField::REPLY_SERIAL.get()),
            Value::Variant(Box::new(Variant::new(Value::UInt32(1))?)),
        ]),
    ]);

    let mut buf = WireBuf::new(Endianness::LITTLE);
    let mut fds = Vec::new();
    wire::marshal(
        Signature::new(b"a(yv)")?,
        core::slice::from_ref(&fields),
        &mut buf,
        &mut fds,
    )?;

    // Entries begin past the length prefix and its struct padding, which
    // keeps them on the same 8-byte grid as a real image.
    let header = &buf.as_slice()[8..];

    let prefix = [b'l', 2, 0, 1, 0, 0, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0];
    let m = Message::decode(&prefix, header, &[], Vec::new())?;

    assert_eq!(
        *m.kind(),
        MessageKind::MethodReturn {
            reply_serial: serial(1),
        }
    );

    Ok(())
}

#[test]
fn decode_rejects_malformed_prefix() {
    let mut blob = LE_BLOB;
    blob[0] = b'x';
    assert_eq!(
        Message::from_bytes(&blob, Vec::new()),
        Err(Error::InvalidProtocol)
    );

    let mut blob = LE_BLOB;
    blob[3] = 2;
    assert_eq!(
        Message::from_bytes(&blob, Vec::new()),
        Err(Error::InvalidProtocol)
    );

    // Message type outside the known set.
    let mut blob = LE_BLOB;
    blob[1] = 9;
    assert_eq!(
        Message::from_bytes(&blob, Vec::new()),
        Err(Error::InvalidProtocol)
    );

    // Serial zero is reserved.
    let mut blob = LE_BLOB;
    blob[8..12].copy_from_slice(&[0, 0, 0, 0]);
    assert_eq!(
        Message::from_bytes(&blob, Vec::new()),
        Err(Error::ZeroSerial)
    );
}

#[test]
fn decode_rejects_oversized_lengths() {
    // Declared body length past the message size cap.
    let mut blob = LE_BLOB;
    blob[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
    assert_eq!(
        Message::from_bytes(&blob, Vec::new()),
        Err(Error::BodyTooLong(u32::MAX))
    );

    // Declared header length past the message size cap.
    let mut blob = LE_BLOB;
    blob[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
    assert_eq!(
        Message::from_bytes(&blob, Vec::new()),
        Err(Error::HeaderTooLong(u32::MAX))
    );
}

#[test]
fn decode_rejects_truncation() {
    assert!(matches!(
        Message::from_bytes(&LE_BLOB[..10], Vec::new()),
        Err(Error::BufferUnderflow { .. })
    ));

    // Header length claims more bytes than the image holds.
    let mut blob = LE_BLOB;
    blob[12] = 100;
    assert!(matches!(
        Message::from_bytes(&blob, Vec::new()),
        Err(Error::BufferUnderflow { .. })
    ));
}

#[test]
fn method_return_requires_reply_serial() {
    let m = Message::method_return(serial(1), serial(2)).with_sender(":1.1");

    // Rewrite the REPLY_SERIAL field id to an unknown one, leaving only the
    // sender header recognizable.
    let mut bytes = m.encode().unwrap();
    bytes[16] = 250;

    assert_eq!(
        Message::from_bytes(&bytes, Vec::new()),
        Err(Error::MissingReplySerial)
    );
}

#[test]
fn serial_allocation_is_monotonic() {
    let serials = SerialAllocator::new();

    assert_eq!(serials.next().get(), 1);
    assert_eq!(serials.next().get(), 2);
    assert_eq!(serials.next().get(), 3);
}
