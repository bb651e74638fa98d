//! Validated UTF-8 string pairs shared by topic names and topic filters

/// Defines an owned string type, its borrowed `str` counterpart, and their errors.
///
/// Both constructors run `$is_valid`, so a value of either type always passed it.
macro_rules! validated_topic {
    (
        $(#[$owned_attr:meta])*
        owned $owned:ident;
        $(#[$ref_attr:meta])*
        borrowed $borrowed:ident;
        error $error:ident($message:tt);
        decode_error $decode_error:ident::$invalid:ident;
        valid if $is_valid:path;
    ) => {
        $(#[$owned_attr])*
        #[derive(Debug, Eq, PartialEq, Clone, Hash, Ord, PartialOrd)]
        pub struct $owned(String);

        impl $owned {
            pub fn new<S: Into<String>>(value: S) -> Result<$owned, $error> {
                let value = value.into();
                if $is_valid(&value) {
                    Ok($owned(value))
                } else {
                    Err($error(value))
                }
            }
        }

        impl From<$owned> for String {
            fn from(value: $owned) -> String {
                value.0
            }
        }

        impl ::std::ops::Deref for $owned {
            type Target = $borrowed;

            fn deref(&self) -> &$borrowed {
                // checked when `self` was built
                unsafe { $borrowed::new_unchecked(&self.0) }
            }
        }

        impl ::std::borrow::Borrow<$borrowed> for $owned {
            fn borrow(&self) -> &$borrowed {
                self
            }
        }

        impl $crate::Encodable for $owned {
            fn encode<W: ::std::io::Write>(&self, writer: &mut W) -> ::std::io::Result<()> {
                $crate::Encodable::encode(self.0.as_str(), writer)
            }

            fn encoded_length(&self) -> u32 {
                $crate::Encodable::encoded_length(self.0.as_str())
            }
        }

        impl $crate::Decodable for $owned {
            type Error = $decode_error;
            type Cond = ();

            fn decode_with<R: ::std::io::Read>(reader: &mut R, _rest: ()) -> Result<$owned, $decode_error> {
                let value = <String as $crate::Decodable>::decode(reader)?;
                Ok($owned::new(value)?)
            }
        }

        $(#[$ref_attr])*
        #[derive(Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
        #[repr(transparent)]
        pub struct $borrowed(str);

        impl $borrowed {
            pub fn new<S: AsRef<str> + ?Sized>(value: &S) -> Result<&$borrowed, $error> {
                let value = value.as_ref();
                if $is_valid(value) {
                    Ok(unsafe { $borrowed::new_unchecked(value) })
                } else {
                    Err($error(value.to_owned()))
                }
            }

            /// Wraps `value` without validating it
            ///
            /// # Safety
            ///
            /// `value` must be accepted by the checked constructor. Encoding an invalid value
            /// produces a packet the broker will reject.
            pub unsafe fn new_unchecked<S: AsRef<str> + ?Sized>(value: &S) -> &$borrowed {
                &*(value.as_ref() as *const str as *const $borrowed)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::std::ops::Deref for $borrowed {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl ToOwned for $borrowed {
            type Owned = $owned;

            fn to_owned(&self) -> $owned {
                $owned(self.0.to_owned())
            }
        }

        impl $crate::Encodable for $borrowed {
            fn encode<W: ::std::io::Write>(&self, writer: &mut W) -> ::std::io::Result<()> {
                $crate::Encodable::encode(&self.0, writer)
            }

            fn encoded_length(&self) -> u32 {
                $crate::Encodable::encoded_length(&self.0)
            }
        }

        #[derive(Debug, thiserror::Error)]
        #[error($message)]
        pub struct $error(pub String);

        #[derive(Debug, thiserror::Error)]
        #[error(transparent)]
        pub enum $decode_error {
            IoError(#[from] ::std::io::Error),
            $invalid(#[from] $error),
        }
    };
}

/// Longest string a two-byte length prefix can announce
pub const MAX_TOPIC_LENGTH: usize = 65535;
