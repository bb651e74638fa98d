//! `CONNACK` variable header: acknowledge flags and return code

use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::control::variable_header::VariableHeaderError;
use crate::{Decodable, Encodable};

/// Flags in `CONNACK` packet. Bits 7-1 are reserved and must be 0.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Default)]
pub struct ConnackFlags {
    pub session_present: bool,
}

impl ConnackFlags {
    pub fn empty() -> ConnackFlags {
        ConnackFlags::default()
    }
}

impl Encodable for ConnackFlags {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(u8::from(self.session_present))
    }

    fn encoded_length(&self) -> u32 {
        1
    }
}

impl Decodable for ConnackFlags {
    type Error = VariableHeaderError;
    type Cond = ();

    fn decode_with<R: Read>(reader: &mut R, _rest: ()) -> Result<ConnackFlags, VariableHeaderError> {
        match reader.read_u8()? {
            0 => Ok(ConnackFlags { session_present: false }),
            1 => Ok(ConnackFlags { session_present: true }),
            _ => Err(VariableHeaderError::InvalidReservedFlag),
        }
    }
}

/// Return code for `CONNACK` packet
///
/// Codes above 5 are reserved by 3.1.1 and kept verbatim.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ConnectReturnCode {
    ConnectionAccepted,
    UnacceptableProtocolVersion,
    IdentifierRejected,
    ServiceUnavailable,
    BadUserNameOrPassword,
    NotAuthorized,
    Reserved(u8),
}

const DEFINED_CODES: [ConnectReturnCode; 6] = [
    ConnectReturnCode::ConnectionAccepted,
    ConnectReturnCode::UnacceptableProtocolVersion,
    ConnectReturnCode::IdentifierRejected,
    ConnectReturnCode::ServiceUnavailable,
    ConnectReturnCode::BadUserNameOrPassword,
    ConnectReturnCode::NotAuthorized,
];

impl ConnectReturnCode {
    pub fn is_accepted(self) -> bool {
        self == ConnectReturnCode::ConnectionAccepted
    }

    pub fn to_u8(self) -> u8 {
        match self {
            ConnectReturnCode::Reserved(code) => code,
            defined => DEFINED_CODES.iter().position(|c| *c == defined).unwrap_or(0) as u8,
        }
    }

    pub fn from_u8(code: u8) -> ConnectReturnCode {
        DEFINED_CODES
            .get(code as usize)
            .copied()
            .unwrap_or(ConnectReturnCode::Reserved(code))
    }
}

impl Encodable for ConnectReturnCode {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(self.to_u8())
    }

    fn encoded_length(&self) -> u32 {
        1
    }
}

impl Decodable for ConnectReturnCode {
    type Error = VariableHeaderError;
    type Cond = ();

    fn decode_with<R: Read>(reader: &mut R, _rest: ()) -> Result<ConnectReturnCode, VariableHeaderError> {
        Ok(ConnectReturnCode::from_u8(reader.read_u8()?))
    }
}
