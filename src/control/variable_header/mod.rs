//! Variable header fields

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{Decodable, Encodable};

pub use self::connack::{ConnackFlags, ConnectReturnCode};
pub use self::connect::{ConnectFlags, ProtocolLevel, ProtocolName};

mod connack;
mod connect;

/// Errors while decoding variable header
#[derive(Debug, thiserror::Error)]
pub enum VariableHeaderError {
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error("invalid reserved flags")]
    InvalidReservedFlag,
    #[error("invalid protocol name {0:?}")]
    InvalidProtocolName(String),
    #[error("invalid protocol level {0}")]
    InvalidProtocolLevel(u8),
}

macro_rules! u16_field {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Eq, PartialEq, Copy, Clone, Default)]
        pub struct $name(pub u16);

        impl Encodable for $name {
            fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
                writer.write_u16::<BigEndian>(self.0)
            }

            fn encoded_length(&self) -> u32 {
                2
            }
        }

        impl Decodable for $name {
            type Error = VariableHeaderError;
            type Cond = ();

            fn decode_with<R: Read>(reader: &mut R, _rest: ()) -> Result<$name, VariableHeaderError> {
                Ok($name(reader.read_u16::<BigEndian>()?))
            }
        }
    };
}

u16_field!(
    /// Keep alive interval in seconds, 0 turns it off
    KeepAlive
);

u16_field!(
    /// Pairs a request with its acknowledgements
    PacketIdentifier
);
