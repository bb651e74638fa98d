//! Control packets and their wire encoding

use std::io::{self, Read, Write};

use crate::control::fixed_header::FixedHeaderError;
use crate::control::variable_header::VariableHeaderError;
use crate::control::ControlType;
use crate::control::FixedHeader;
use crate::topic_filter::{TopicFilterDecodeError, TopicFilterError};
use crate::topic_name::{TopicNameDecodeError, TopicNameError};
use crate::{Decodable, Encodable};

macro_rules! encodable_packet {
    ($typ:ident($($field:ident),* $(,)?)) => {
        impl $crate::packet::EncodablePacket for $typ {
            fn fixed_header(&self) -> &$crate::control::fixed_header::FixedHeader {
                &self.fixed_header
            }

            #[allow(unused)]
            fn encode_packet<W: ::std::io::Write>(&self, writer: &mut W) -> ::std::io::Result<()> {
                $($crate::encodable::Encodable::encode(&self.$field, writer)?;)*
                Ok(())
            }

            fn encoded_packet_length(&self) -> u32 {
                $($crate::encodable::Encodable::encoded_length(&self.$field) +)*
                    0
            }
        }

        impl $typ {
            #[allow(unused)]
            #[inline(always)]
            fn fix_header_remaining_len(&mut self) {
                self.fixed_header.remaining_length = $crate::packet::EncodablePacket::encoded_packet_length(self);
            }
        }
    };
}

macro_rules! identifier_packet {
    ($(#[$attr:meta])* $typ:ident => $control:ident) => {
        $(#[$attr])*
        #[derive(Debug, Eq, PartialEq, Clone)]
        pub struct $typ {
            fixed_header: $crate::control::FixedHeader,
            packet_identifier: $crate::control::variable_header::PacketIdentifier,
        }

        encodable_packet!($typ(packet_identifier));

        impl $typ {
            pub fn new(pkid: u16) -> $typ {
                $typ {
                    fixed_header: $crate::control::FixedHeader::new(
                        $crate::control::PacketType::with_default($crate::control::ControlType::$control),
                        2,
                    ),
                    packet_identifier: $crate::control::variable_header::PacketIdentifier(pkid),
                }
            }

            pub fn packet_identifier(&self) -> u16 {
                self.packet_identifier.0
            }

            pub fn set_packet_identifier(&mut self, pkid: u16) {
                self.packet_identifier.0 = pkid;
            }
        }

        impl $crate::packet::DecodablePacket for $typ {
            fn decode_packet<R: ::std::io::Read>(
                reader: &mut R,
                fixed_header: $crate::control::FixedHeader,
            ) -> Result<Self, $crate::packet::PacketError> {
                let packet_identifier: $crate::control::variable_header::PacketIdentifier =
                    $crate::Decodable::decode(reader)?;
                Ok($typ {
                    fixed_header,
                    packet_identifier,
                })
            }
        }
    };
}

macro_rules! empty_packet {
    ($(#[$attr:meta])* $typ:ident => $control:ident) => {
        $(#[$attr])*
        #[derive(Debug, Eq, PartialEq, Clone)]
        pub struct $typ {
            fixed_header: $crate::control::FixedHeader,
        }

        encodable_packet!($typ());

        impl $typ {
            pub fn new() -> $typ {
                $typ {
                    fixed_header: $crate::control::FixedHeader::new(
                        $crate::control::PacketType::with_default($crate::control::ControlType::$control),
                        0,
                    ),
                }
            }
        }

        impl Default for $typ {
            fn default() -> $typ {
                $typ::new()
            }
        }

        impl $crate::packet::DecodablePacket for $typ {
            fn decode_packet<R: ::std::io::Read>(
                _reader: &mut R,
                fixed_header: $crate::control::FixedHeader,
            ) -> Result<Self, $crate::packet::PacketError> {
                Ok($typ { fixed_header })
            }
        }
    };
}

pub use self::connack::ConnackPacket;
pub use self::connect::ConnectPacket;
pub use self::disconnect::DisconnectPacket;
pub use self::pingreq::PingreqPacket;
pub use self::pingresp::PingrespPacket;
pub use self::puback::PubackPacket;
pub use self::pubcomp::PubcompPacket;
pub use self::publish::{PublishPacket, PublishPacketRef};
pub use self::pubrec::PubrecPacket;
pub use self::pubrel::PubrelPacket;
pub use self::suback::{SubackPacket, SubscribeReturnCode};
pub use self::subscribe::SubscribePacket;
pub use self::unsuback::UnsubackPacket;
pub use self::unsubscribe::UnsubscribePacket;

#[macro_use]
mod entries;

pub mod connack;
pub mod connect;
pub mod disconnect;
pub mod pingreq;
pub mod pingresp;
pub mod puback;
pub mod pubcomp;
pub mod publish;
pub mod pubrec;
pub mod pubrel;
pub mod suback;
pub mod subscribe;
pub mod unsuback;
pub mod unsubscribe;

/// A whole control packet: fixed header followed by variable header and payload.
///
/// Every packet type gets [`Encodable`] through this trait. Field types such as
/// `Vec<u8>` or `String` do not, so they cannot be written to a stream by mistake as if
/// they were packets.
pub trait EncodablePacket {
    fn fixed_header(&self) -> &FixedHeader;

    /// Writes everything after the fixed header
    fn encode_packet<W: Write>(&self, _writer: &mut W) -> io::Result<()> {
        Ok(())
    }

    /// Bytes written by `encode_packet`, which is the remaining length
    fn encoded_packet_length(&self) -> u32 {
        0
    }
}

impl<T: EncodablePacket> Encodable for T {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.fixed_header().encode(writer)?;
        self.encode_packet(writer)
    }

    fn encoded_length(&self) -> u32 {
        self.fixed_header().encoded_length() + self.encoded_packet_length()
    }
}

pub trait DecodablePacket: EncodablePacket + Sized {
    /// Reads the body of a packet whose fixed header is already known.
    ///
    /// `reader` is limited to `fixed_header.remaining_length` bytes.
    fn decode_packet<R: Read>(reader: &mut R, fixed_header: FixedHeader) -> Result<Self, PacketError>;
}

impl<T: DecodablePacket> Decodable for T {
    type Error = PacketError;
    type Cond = Option<FixedHeader>;

    fn decode_with<R: Read>(reader: &mut R, fixed_header: Option<FixedHeader>) -> Result<Self, PacketError> {
        let fixed_header = match fixed_header {
            Some(header) => header,
            None => FixedHeader::decode(reader)?,
        };

        let mut body = reader.take(u64::from(fixed_header.remaining_length));
        T::decode_packet(&mut body, fixed_header)
    }
}

/// Errors while decoding a packet
#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error(transparent)]
    FixedHeaderError(#[from] FixedHeaderError),
    #[error(transparent)]
    VariableHeaderError(#[from] VariableHeaderError),
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error(transparent)]
    TopicNameError(#[from] TopicNameError),
    #[error(transparent)]
    TopicFilterError(#[from] TopicFilterError),
    #[error("invalid QoS level ({0})")]
    InvalidQualityOfService(u8),
    #[error("invalid subscribe return code ({0:#X})")]
    InvalidSubscribeReturnCode(u8),
    #[error("remaining length {remaining_length} is shorter than the {required} bytes it must hold")]
    RemainingLengthTooShort { remaining_length: u32, required: u32 },
    #[error("body holds {available} bytes, remaining length announces {remaining_length}")]
    TruncatedBody { remaining_length: u32, available: usize },
    #[error("unexpected packet type {0:?}")]
    UnexpectedPacketType(ControlType),
}

impl From<TopicNameDecodeError> for PacketError {
    fn from(err: TopicNameDecodeError) -> PacketError {
        match err {
            TopicNameDecodeError::IoError(err) => PacketError::IoError(err),
            TopicNameDecodeError::InvalidTopicName(err) => PacketError::TopicNameError(err),
        }
    }
}

impl From<TopicFilterDecodeError> for PacketError {
    fn from(err: TopicFilterDecodeError) -> PacketError {
        match err {
            TopicFilterDecodeError::IoError(err) => PacketError::IoError(err),
            TopicFilterDecodeError::InvalidTopicFilter(err) => PacketError::TopicFilterError(err),
        }
    }
}

macro_rules! variable_packet {
    ($($packet:ident => $control:ident,)+) => {
        /// Any control packet
        #[derive(Debug, Eq, PartialEq, Clone)]
        pub enum VariablePacket {
            $($packet($packet),)+
        }

        $(
            impl From<$packet> for VariablePacket {
                fn from(packet: $packet) -> VariablePacket {
                    VariablePacket::$packet(packet)
                }
            }
        )+

        impl VariablePacket {
            /// Decodes the body that follows `fixed_header`, dispatching on its control type
            pub fn decode_body<R: Read>(reader: &mut R, fixed_header: FixedHeader) -> Result<VariablePacket, PacketError> {
                Ok(match fixed_header.packet_type.control_type {
                    $(ControlType::$control => VariablePacket::$packet($packet::decode_packet(reader, fixed_header)?),)+
                })
            }
        }

        impl EncodablePacket for VariablePacket {
            fn fixed_header(&self) -> &FixedHeader {
                match self {
                    $(VariablePacket::$packet(packet) => packet.fixed_header(),)+
                }
            }

            fn encode_packet<W: Write>(&self, writer: &mut W) -> io::Result<()> {
                match self {
                    $(VariablePacket::$packet(packet) => packet.encode_packet(writer),)+
                }
            }

            fn encoded_packet_length(&self) -> u32 {
                match self {
                    $(VariablePacket::$packet(packet) => packet.encoded_packet_length(),)+
                }
            }
        }
    };
}

variable_packet! {
    ConnectPacket => Connect,
    ConnackPacket => ConnectAcknowledgement,
    PublishPacket => Publish,
    PubackPacket => PublishAcknowledgement,
    PubrecPacket => PublishReceived,
    PubrelPacket => PublishRelease,
    PubcompPacket => PublishComplete,
    SubscribePacket => Subscribe,
    SubackPacket => SubscribeAcknowledgement,
    UnsubscribePacket => Unsubscribe,
    UnsubackPacket => UnsubscribeAcknowledgement,
    PingreqPacket => PingRequest,
    PingrespPacket => PingResponse,
    DisconnectPacket => Disconnect,
}

impl VariablePacket {
    pub fn new<P: Into<VariablePacket>>(packet: P) -> VariablePacket {
        packet.into()
    }

    pub fn control_type(&self) -> ControlType {
        self.fixed_header().packet_type.control_type
    }
}

impl Decodable for VariablePacket {
    type Error = VariablePacketError;
    type Cond = Option<FixedHeader>;

    fn decode_with<R: Read>(reader: &mut R, fixed_header: Option<FixedHeader>) -> Result<VariablePacket, VariablePacketError> {
        let fixed_header = match fixed_header {
            Some(header) => header,
            None => match FixedHeader::decode(reader) {
                Ok(header) => header,
                Err(FixedHeaderError::ReservedType(code, remaining_length)) => {
                    // skip the body so the stream stays aligned on the next packet
                    let mut body = Vec::with_capacity(remaining_length as usize);
                    reader.take(u64::from(remaining_length)).read_to_end(&mut body)?;
                    return Err(VariablePacketError::ReservedPacket(code, body));
                }
                Err(err) => return Err(err.into()),
            },
        };

        let mut body = reader.take(u64::from(fixed_header.remaining_length));
        Ok(VariablePacket::decode_body(&mut body, fixed_header)?)
    }
}

/// Errors while decoding any packet
#[derive(Debug, thiserror::Error)]
pub enum VariablePacketError {
    #[error(transparent)]
    FixedHeaderError(#[from] FixedHeaderError),
    #[error("reserved packet type ({0}) with {} body bytes", .1.len())]
    ReservedPacket(u8, Vec<u8>),
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error(transparent)]
    PacketError(#[from] PacketError),
}

#[cfg(feature = "tokio-codec")]
mod framed {
    use bytes::{BufMut, BytesMut};
    use tokio_util::codec::{Decoder, Encoder};

    use super::*;
    use crate::frame::split_frame;

    fn decode_frame(src: &mut BytesMut) -> Result<Option<VariablePacket>, VariablePacketError> {
        match split_frame(src)? {
            Some((fixed_header, body)) => Ok(Some(VariablePacket::decode_body(&mut &body[..], fixed_header)?)),
            None => Ok(None),
        }
    }

    fn encode_frame<P: EncodablePacket>(packet: P, dst: &mut BytesMut) -> io::Result<()> {
        dst.reserve(packet.encoded_length() as usize);
        packet.encode(&mut dst.writer())
    }

    /// Reads `VariablePacket`s off a byte stream
    #[derive(Debug, Default, Clone, Copy)]
    pub struct MqttDecoder;

    /// Writes any packet to a byte stream
    #[derive(Debug, Default, Clone, Copy)]
    pub struct MqttEncoder;

    /// Both directions, for `Framed`
    #[derive(Debug, Default, Clone, Copy)]
    pub struct MqttCodec;

    impl Decoder for MqttDecoder {
        type Item = VariablePacket;
        type Error = VariablePacketError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<VariablePacket>, VariablePacketError> {
            decode_frame(src)
        }
    }

    impl Decoder for MqttCodec {
        type Item = VariablePacket;
        type Error = VariablePacketError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<VariablePacket>, VariablePacketError> {
            decode_frame(src)
        }
    }

    impl<P: EncodablePacket> Encoder<P> for MqttEncoder {
        type Error = io::Error;

        fn encode(&mut self, packet: P, dst: &mut BytesMut) -> io::Result<()> {
            encode_frame(packet, dst)
        }
    }

    impl<P: EncodablePacket> Encoder<P> for MqttCodec {
        type Error = io::Error;

        fn encode(&mut self, packet: P, dst: &mut BytesMut) -> io::Result<()> {
            encode_frame(packet, dst)
        }
    }
}

#[cfg(feature = "tokio-codec")]
pub use self::framed::{MqttCodec, MqttDecoder, MqttEncoder};
