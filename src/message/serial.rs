use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

/// Allocator for outbound message serial numbers.
///
/// One allocator is owned by each connection. Two messages sent over the same
/// connection never share a serial, even when allocated from concurrent
/// threads; zero is never produced, wrapping past `u32::MAX` skips it.
///
/// # Examples
///
/// ```
/// use dbus_wire::SerialAllocator;
///
/// let serials = SerialAllocator::new();
/// assert_eq!(serials.next().get(), 1);
/// assert_eq!(serials.next().get(), 2);
/// ```
#[derive(Debug)]
pub struct SerialAllocator {
    next: AtomicU32,
}

impl SerialAllocator {
    /// Construct a new allocator starting at serial 1.
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Allocate the next serial.
    pub fn next(&self) -> NonZeroU32 {
        loop {
            if let Some(serial) = NonZeroU32::new(self.next.fetch_add(1, Ordering::Relaxed)) {
                return serial;
            }
        }
    }
}

impl Default for SerialAllocator {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::SerialAllocator;

    #[test]
    fn wrapping_skips_zero() {
        let serials = SerialAllocator {
            next: AtomicU32::new(u32::MAX),
        };

        assert_eq!(serials.next().get(), u32::MAX);
        assert_eq!(serials.next().get(), 1);
        assert_eq!(serials.next().get(), 2);
    }
}
