/// Declare a byte-backed protocol enum.
///
/// Wire bytes outside the declared set must be representable so that decoding
/// never loses information, which rules out a plain Rust `enum`. The declared
/// values become associated constants over a transparent newtype instead.
macro_rules! raw_enum {
    (
        $(#[doc = $doc:literal])*
        #[repr($repr:ty)]
        $vis:vis enum $name:ident {
            $(
                $(#[$($variant_meta:meta)*])*
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        $vis struct $name(pub(crate) $repr);

        impl $name {
            $(
                $(#[$($variant_meta)*])*
                $vis const $variant: Self = Self($value);
            )*

            /// Wrap a raw wire value.
            #[inline]
            pub(crate) const fn new(value: $repr) -> Self {
                Self(value)
            }

            /// Get the raw wire value.
            #[inline]
            pub(crate) const fn get(self) -> $repr {
                self.0
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match *self {
                    $(Self::$variant => f.write_str(stringify!($variant)),)*
                    _ => write!(f, "{}({:?})", stringify!($name), self.0),
                }
            }
        }
    }
}

/// Declare a byte-backed flag set with bit operations.
macro_rules! raw_set {
    (
        $(#[doc = $doc:literal])*
        #[repr($repr:ty)]
        $vis:vis enum $name:ident {
            $(
                $(#[$($variant_meta:meta)*])*
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Default, Clone, Copy, PartialEq, Eq)]
        #[repr(transparent)]
        $vis struct $name(pub(crate) $repr);

        impl $name {
            $(
                $(#[$($variant_meta)*])*
                $vis const $variant: Self = Self($value);
            )*

            #[inline]
            pub(crate) const fn new(value: $repr) -> Self {
                Self(value)
            }

            #[inline]
            pub(crate) const fn get(self) -> $repr {
                self.0
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;

            #[inline]
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = bool;

            #[inline]
            fn bitand(self, rhs: Self) -> bool {
                self.0 & rhs.0 != 0
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut f = f.debug_set();
                let mut bits = self.0;

                $(
                    if $value != 0 && bits & $value == $value {
                        f.entry(&format_args!("{}", stringify!($variant)));
                        bits &= !$value;
                    }
                )*

                if bits != 0 {
                    f.entry(&format_args!("{bits:#04x}"));
                }

                f.finish()
            }
        }
    }
}
