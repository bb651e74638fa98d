//! Packet type, the first byte of every control packet

/// Packet type
///
/// The control type occupies the high nibble, the flags the low nibble.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct PacketType {
    pub control_type: ControlType,
    pub flags: u8,
}

#[repr(u8)]
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ControlType {
    /// Client request to connect to Server
    Connect                         = value::CONNECT,

    /// Connect acknowledgment
    ConnectAcknowledgement          = value::CONNACK,

    /// Publish message
    Publish                         = value::PUBLISH,

    /// Publish acknowledgment
    PublishAcknowledgement          = value::PUBACK,

    /// Publish received (assured delivery part 1)
    PublishReceived                 = value::PUBREC,

    /// Publish release (assured delivery part 2)
    PublishRelease                  = value::PUBREL,

    /// Publish complete (assured delivery part 3)
    PublishComplete                 = value::PUBCOMP,

    /// Client subscribe request
    Subscribe                       = value::SUBSCRIBE,

    /// Subscribe acknowledgment
    SubscribeAcknowledgement        = value::SUBACK,

    /// Unsubscribe request
    Unsubscribe                     = value::UNSUBSCRIBE,

    /// Unsubscribe acknowledgment
    UnsubscribeAcknowledgement      = value::UNSUBACK,

    /// PING request
    PingRequest                     = value::PINGREQ,

    /// PING response
    PingResponse                    = value::PINGRESP,

    /// Client is disconnecting
    Disconnect                      = value::DISCONNECT,
}

impl ControlType {
    /// The flags nibble every packet of this type must carry.
    ///
    /// `PUBLISH` has no fixed flags, its nibble holds DUP, QoS and RETAIN.
    #[inline]
    fn default_flags(self) -> Option<u8> {
        match self {
            ControlType::Publish => None,
            ControlType::PublishRelease | ControlType::Subscribe | ControlType::Unsubscribe => Some(0x02),
            _ => Some(0x00),
        }
    }
}

impl PacketType {
    /// Creates a packet type. Returns error if `flags` is not allowed for `t`.
    #[inline]
    pub fn new(t: ControlType, flags: u8) -> Result<PacketType, PacketTypeError> {
        let flags = flags & 0x0F;
        match t.default_flags() {
            Some(fixed) if fixed != flags => Err(PacketTypeError::InvalidFlag(t, flags)),
            _ => Ok(PacketType { control_type: t, flags }),
        }
    }

    /// Creates a packet type with the flags defined for `t` (0 for `PUBLISH`).
    #[inline]
    pub fn with_default(t: ControlType) -> PacketType {
        PacketType {
            control_type: t,
            flags: t.default_flags().unwrap_or(0),
        }
    }

    pub fn to_u8(&self) -> u8 {
        (self.control_type as u8) << 4 | (self.flags & 0x0F)
    }

    pub fn from_u8(val: u8) -> Result<PacketType, PacketTypeError> {
        let type_val = val >> 4;
        let flags = val & 0x0F;

        let control_type = match type_val {
            value::CONNECT => ControlType::Connect,
            value::CONNACK => ControlType::ConnectAcknowledgement,

            value::PUBLISH => ControlType::Publish,
            value::PUBACK => ControlType::PublishAcknowledgement,
            value::PUBREC => ControlType::PublishReceived,
            value::PUBREL => ControlType::PublishRelease,
            value::PUBCOMP => ControlType::PublishComplete,

            value::SUBSCRIBE => ControlType::Subscribe,
            value::SUBACK => ControlType::SubscribeAcknowledgement,

            value::UNSUBSCRIBE => ControlType::Unsubscribe,
            value::UNSUBACK => ControlType::UnsubscribeAcknowledgement,

            value::PINGREQ => ControlType::PingRequest,
            value::PINGRESP => ControlType::PingResponse,

            value::DISCONNECT => ControlType::Disconnect,

            // 0 and 15 are the only values left in a nibble
            _ => return Err(PacketTypeError::ReservedType(type_val, flags)),
        };

        PacketType::new(control_type, flags)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PacketTypeError {
    #[error("reserved type {0:?} ({1:#X})")]
    ReservedType(u8, u8),
    #[error("invalid flag for {0:?} ({1:#X})")]
    InvalidFlag(ControlType, u8),
}

mod value {
    pub const CONNECT: u8 = 1;
    pub const CONNACK: u8 = 2;
    pub const PUBLISH: u8 = 3;
    pub const PUBACK: u8 = 4;
    pub const PUBREC: u8 = 5;
    pub const PUBREL: u8 = 6;
    pub const PUBCOMP: u8 = 7;
    pub const SUBSCRIBE: u8 = 8;
    pub const SUBACK: u8 = 9;
    pub const UNSUBSCRIBE: u8 = 10;
    pub const UNSUBACK: u8 = 11;
    pub const PINGREQ: u8 = 12;
    pub const PINGRESP: u8 = 13;
    pub const DISCONNECT: u8 = 14;
}
