//! CONNECT

use std::io::Read;

use crate::control::variable_header::{ConnectFlags, KeepAlive, ProtocolLevel, ProtocolName};
use crate::control::{ControlType, FixedHeader, PacketType};
use crate::packet::{DecodablePacket, PacketError};
use crate::Decodable;

/// `CONNECT` packet
///
/// The payload carries the client identifier only. Will, user name and password sections
/// are never written, so their flag bits must stay clear.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ConnectPacket {
    fixed_header: FixedHeader,
    protocol_name: ProtocolName,

    protocol_level: ProtocolLevel,
    flags: ConnectFlags,
    keep_alive: KeepAlive,

    client_identifier: String,
}

encodable_packet!(ConnectPacket(protocol_name, protocol_level, flags, keep_alive, client_identifier));

impl ConnectPacket {
    pub fn new<C>(client_identifier: C) -> ConnectPacket
    where
        C: Into<String>,
    {
        let mut pk = ConnectPacket {
            fixed_header: FixedHeader::new(PacketType::with_default(ControlType::Connect), 0),
            protocol_name: ProtocolName,
            protocol_level: ProtocolLevel::Version311,
            flags: ConnectFlags::empty(),
            keep_alive: KeepAlive(0),
            client_identifier: client_identifier.into(),
        };

        pk.fix_header_remaining_len();
        pk
    }

    pub fn set_keep_alive(&mut self, keep_alive: u16) {
        self.keep_alive = KeepAlive(keep_alive);
    }

    pub fn set_flags(&mut self, flags: ConnectFlags) {
        self.flags = flags;
    }

    pub fn set_clean_session(&mut self, clean_session: bool) {
        self.flags.clean_session = clean_session;
    }

    pub fn set_client_identifier<I: Into<String>>(&mut self, id: I) {
        self.client_identifier = id.into();
        self.fix_header_remaining_len();
    }

    pub fn client_identifier(&self) -> &str {
        &self.client_identifier[..]
    }

    pub fn protocol_name(&self) -> &str {
        self.protocol_name.as_str()
    }

    pub fn protocol_level(&self) -> ProtocolLevel {
        self.protocol_level
    }

    pub fn flags(&self) -> ConnectFlags {
        self.flags
    }

    pub fn keep_alive(&self) -> u16 {
        self.keep_alive.0
    }

    pub fn clean_session(&self) -> bool {
        self.flags.clean_session
    }
}

impl DecodablePacket for ConnectPacket {
    fn decode_packet<R: Read>(reader: &mut R, fixed_header: FixedHeader) -> Result<Self, PacketError> {
        let protocol_name: ProtocolName = Decodable::decode(reader)?;
        let protocol_level: ProtocolLevel = Decodable::decode(reader)?;
        let flags: ConnectFlags = Decodable::decode(reader)?;
        let keep_alive: KeepAlive = Decodable::decode(reader)?;
        let client_identifier = String::decode(reader)?;

        Ok(ConnectPacket {
            fixed_header,
            protocol_name,
            protocol_level,
            flags,
            keep_alive,
            client_identifier,
        })
    }
}
