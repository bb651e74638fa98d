//! Payloads made of repeated entries: `SUBSCRIBE`, `SUBACK` and `UNSUBSCRIBE`

use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::packet::suback::SubscribeReturnCode;
use crate::packet::PacketError;
use crate::qos::QualityOfService;
use crate::topic_filter::TopicFilter;
use crate::{Decodable, Encodable};

/// Bytes left of `remaining_length` once `consumed` have been read
pub(crate) fn remaining_after(remaining_length: u32, consumed: u32) -> Result<u32, PacketError> {
    remaining_length
        .checked_sub(consumed)
        .ok_or(PacketError::RemainingLengthTooShort {
            remaining_length,
            required: consumed,
        })
}

/// One element of a list payload
pub trait Entry: Sized {
    fn encode_entry<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    fn entry_length(&self) -> u32;

    fn decode_entry<R: Read>(reader: &mut R) -> Result<Self, PacketError>;
}

/// Topic filter with its requested QoS
impl Entry for (TopicFilter, QualityOfService) {
    fn encode_entry<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.0.encode(writer)?;
        writer.write_u8(self.1 as u8)
    }

    fn entry_length(&self) -> u32 {
        self.0.encoded_length() + 1
    }

    fn decode_entry<R: Read>(reader: &mut R) -> Result<Self, PacketError> {
        let filter = TopicFilter::decode(reader)?;
        let level = reader.read_u8()?;
        let qos = QualityOfService::from_u8(level).ok_or(PacketError::InvalidQualityOfService(level))?;
        Ok((filter, qos))
    }
}

impl Entry for TopicFilter {
    fn encode_entry<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.encode(writer)
    }

    fn entry_length(&self) -> u32 {
        self.encoded_length()
    }

    fn decode_entry<R: Read>(reader: &mut R) -> Result<Self, PacketError> {
        Ok(TopicFilter::decode(reader)?)
    }
}

impl Entry for SubscribeReturnCode {
    fn encode_entry<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(*self as u8)
    }

    fn entry_length(&self) -> u32 {
        1
    }

    fn decode_entry<R: Read>(reader: &mut R) -> Result<Self, PacketError> {
        let code = reader.read_u8()?;
        SubscribeReturnCode::from_u8(code).ok_or(PacketError::InvalidSubscribeReturnCode(code))
    }
}

/// Entries filling the rest of a packet body
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Entries<E>(pub Vec<E>);

impl<E: Entry> Encodable for Entries<E> {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.0.iter().try_for_each(|entry| entry.encode_entry(writer))
    }

    fn encoded_length(&self) -> u32 {
        self.0.iter().map(Entry::entry_length).sum()
    }
}

impl<E: Entry> Decodable for Entries<E> {
    type Error = PacketError;
    /// Payload length in bytes
    type Cond = u32;

    fn decode_with<R: Read>(reader: &mut R, mut payload_len: u32) -> Result<Entries<E>, PacketError> {
        let mut entries = Vec::new();
        while payload_len > 0 {
            let entry = E::decode_entry(reader)?;
            payload_len = remaining_after(payload_len, entry.entry_length())?;
            entries.push(entry);
        }
        Ok(Entries(entries))
    }
}

macro_rules! list_packet {
    ($(#[$attr:meta])* $typ:ident($entry:ty) => $control:ident) => {
        $(#[$attr])*
        #[derive(Debug, Eq, PartialEq, Clone)]
        pub struct $typ {
            fixed_header: $crate::control::FixedHeader,
            packet_identifier: $crate::control::variable_header::PacketIdentifier,
            payload: $crate::packet::entries::Entries<$entry>,
        }

        encodable_packet!($typ(packet_identifier, payload));

        impl $typ {
            pub fn new(pkid: u16, subscribes: Vec<$entry>) -> $typ {
                let mut pk = $typ {
                    fixed_header: $crate::control::FixedHeader::new(
                        $crate::control::PacketType::with_default($crate::control::ControlType::$control),
                        0,
                    ),
                    packet_identifier: $crate::control::variable_header::PacketIdentifier(pkid),
                    payload: $crate::packet::entries::Entries(subscribes),
                };
                pk.fix_header_remaining_len();
                pk
            }

            pub fn packet_identifier(&self) -> u16 {
                self.packet_identifier.0
            }

            pub fn set_packet_identifier(&mut self, pkid: u16) {
                self.packet_identifier.0 = pkid;
            }

            pub fn subscribes(&self) -> &[$entry] {
                &self.payload.0
            }
        }

        impl $crate::packet::DecodablePacket for $typ {
            fn decode_packet<R: ::std::io::Read>(
                reader: &mut R,
                fixed_header: $crate::control::FixedHeader,
            ) -> Result<Self, $crate::packet::PacketError> {
                let packet_identifier: $crate::control::variable_header::PacketIdentifier =
                    $crate::Decodable::decode(reader)?;
                let payload_len = $crate::packet::entries::remaining_after(
                    fixed_header.remaining_length,
                    $crate::Encodable::encoded_length(&packet_identifier),
                )?;
                let payload: $crate::packet::entries::Entries<$entry> =
                    $crate::Decodable::decode_with(reader, payload_len)?;
                Ok($typ {
                    fixed_header,
                    packet_identifier,
                    payload,
                })
            }
        }
    };
}
