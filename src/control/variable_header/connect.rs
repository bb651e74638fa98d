//! `CONNECT` variable header: protocol name, level and flags

use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::control::variable_header::VariableHeaderError;
use crate::{Decodable, Encodable};

pub const PROTOCOL_NAME: &str = "MQTT";
pub const PROTOCOL_LEVEL_3_1_1: u8 = 0x04;

/// Protocol name, `MQTT` for 3.1.1
///
/// ```plain
/// 7                          3                          0
/// +--------------------------+--------------------------+
/// | Length MSB (0)                                      |
/// | Length LSB (4)                                      |
/// | 'M' 'Q' 'T' 'T'                                     |
/// +--------------------------+--------------------------+
/// ```
#[derive(Debug, Eq, PartialEq, Copy, Clone, Default)]
pub struct ProtocolName;

impl ProtocolName {
    pub fn as_str(&self) -> &'static str {
        PROTOCOL_NAME
    }
}

impl Encodable for ProtocolName {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        PROTOCOL_NAME.encode(writer)
    }

    fn encoded_length(&self) -> u32 {
        PROTOCOL_NAME.encoded_length()
    }
}

impl Decodable for ProtocolName {
    type Error = VariableHeaderError;
    type Cond = ();

    fn decode_with<R: Read>(reader: &mut R, _rest: ()) -> Result<ProtocolName, VariableHeaderError> {
        let name = String::decode(reader)?;
        if name == PROTOCOL_NAME {
            Ok(ProtocolName)
        } else {
            Err(VariableHeaderError::InvalidProtocolName(name))
        }
    }
}

/// Protocol level. This client speaks 3.1.1 only.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ProtocolLevel {
    Version311,
}

impl ProtocolLevel {
    pub fn to_u8(self) -> u8 {
        match self {
            ProtocolLevel::Version311 => PROTOCOL_LEVEL_3_1_1,
        }
    }

    pub fn from_u8(level: u8) -> Option<ProtocolLevel> {
        match level {
            PROTOCOL_LEVEL_3_1_1 => Some(ProtocolLevel::Version311),
            _ => None,
        }
    }
}

impl Encodable for ProtocolLevel {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(self.to_u8())
    }

    fn encoded_length(&self) -> u32 {
        1
    }
}

impl Decodable for ProtocolLevel {
    type Error = VariableHeaderError;
    type Cond = ();

    fn decode_with<R: Read>(reader: &mut R, _rest: ()) -> Result<ProtocolLevel, VariableHeaderError> {
        let level = reader.read_u8()?;
        ProtocolLevel::from_u8(level).ok_or(VariableHeaderError::InvalidProtocolLevel(level))
    }
}

const USER_NAME: u8 = 0b1000_0000;
const PASSWORD: u8 = 0b0100_0000;
const WILL_RETAIN: u8 = 0b0010_0000;
const WILL_QOS: u8 = 0b0001_1000;
const WILL_FLAG: u8 = 0b0000_0100;
const CLEAN_SESSION: u8 = 0b0000_0010;
const RESERVED: u8 = 0b0000_0001;

/// Flags for `CONNECT` packet
///
/// The will, user name and password bits announce payload sections. Only set them when
/// the matching section is actually written, otherwise the broker will misparse the
/// packet. This client never writes those sections.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Default)]
pub struct ConnectFlags {
    pub user_name: bool,
    pub password: bool,
    pub will_retain: bool,
    pub will_qos: u8,
    pub will_flag: bool,
    pub clean_session: bool,
    pub reserved: bool,
}

impl ConnectFlags {
    pub fn empty() -> ConnectFlags {
        ConnectFlags::default()
    }

    pub fn to_u8(&self) -> u8 {
        let mut bits = (self.will_qos << 3) & WILL_QOS;
        for &(set, bit) in &[
            (self.user_name, USER_NAME),
            (self.password, PASSWORD),
            (self.will_retain, WILL_RETAIN),
            (self.will_flag, WILL_FLAG),
            (self.clean_session, CLEAN_SESSION),
            (self.reserved, RESERVED),
        ] {
            if set {
                bits |= bit;
            }
        }
        bits
    }

    pub fn from_u8(bits: u8) -> ConnectFlags {
        ConnectFlags {
            user_name: bits & USER_NAME != 0,
            password: bits & PASSWORD != 0,
            will_retain: bits & WILL_RETAIN != 0,
            will_qos: (bits & WILL_QOS) >> 3,
            will_flag: bits & WILL_FLAG != 0,
            clean_session: bits & CLEAN_SESSION != 0,
            reserved: bits & RESERVED != 0,
        }
    }

    /// Whether any bit announces a payload section beyond the client identifier
    pub fn announces_extra_payload(&self) -> bool {
        self.to_u8() & !(CLEAN_SESSION | RESERVED) != 0
    }
}

impl Encodable for ConnectFlags {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(self.to_u8())
    }

    fn encoded_length(&self) -> u32 {
        1
    }
}

impl Decodable for ConnectFlags {
    type Error = VariableHeaderError;
    type Cond = ();

    fn decode_with<R: Read>(reader: &mut R, _rest: ()) -> Result<ConnectFlags, VariableHeaderError> {
        let bits = reader.read_u8()?;
        if bits & RESERVED != 0 {
            return Err(VariableHeaderError::InvalidReservedFlag);
        }

        Ok(ConnectFlags::from_u8(bits))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    #[test]
    fn protocol_name_must_be_mqtt() {
        let mut buf = Vec::new();
        ProtocolName.encode(&mut buf).unwrap();
        assert_eq!(&buf[..], b"\x00\x04MQTT");

        assert!(matches!(
            ProtocolName::decode(&mut Cursor::new(&b"\x00\x06MQIsdp"[..])),
            Err(VariableHeaderError::InvalidProtocolName(ref name)) if name == "MQIsdp"
        ));
    }

    #[test]
    fn protocol_level() {
        assert_eq!(ProtocolLevel::Version311.to_u8(), 4);
        assert!(matches!(
            ProtocolLevel::decode(&mut Cursor::new(&b"\x05"[..])),
            Err(VariableHeaderError::InvalidProtocolLevel(5))
        ));
    }

    #[test]
    fn clean_session_bit() {
        let mut flags = ConnectFlags::empty();
        flags.clean_session = true;
        assert_eq!(flags.to_u8(), 0b0000_0010);
        assert!(!flags.announces_extra_payload());
        assert_eq!(ConnectFlags::from_u8(0b0000_0010), flags);
    }

    #[test]
    fn payload_bits() {
        let flags = ConnectFlags::from_u8(0b1100_0000);
        assert!(flags.user_name);
        assert!(flags.password);
        assert!(flags.announces_extra_payload());

        let flags = ConnectFlags::from_u8(0b0001_0000);
        assert_eq!(flags.will_qos, 2);
        assert!(flags.announces_extra_payload());
    }

    #[test]
    fn reserved_bit_rejected_on_decode() {
        assert!(matches!(
            ConnectFlags::decode(&mut Cursor::new(&b"\x03"[..])),
            Err(VariableHeaderError::InvalidReservedFlag)
        ));
    }
}
