//! The message envelope: header fields, body buffer and serial numbers,
//! assembled into and split out of complete wire images.

pub use self::message::Message;
mod message;

pub use self::message_kind::MessageKind;
mod message_kind;

pub use self::serial::SerialAllocator;
mod serial;

#[cfg(test)]
mod tests;
