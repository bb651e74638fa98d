//! Byte-level encoders and decoders for the packets a client exchanges
//!
//! Every encoder returns the complete packet, fixed header included, ready to hand to a
//! `Transport`. Decoders never read past the bytes they are given.

use std::io::Cursor;

use crate::config::ConnectionParameters;
use crate::control::fixed_header::MAX_REMAINING_LENGTH;
use crate::control::{ControlType, FixedHeader, PacketType};
use crate::error::ValidationError;
use crate::packet::*;
use crate::qos::{QoSWithPacketIdentifier, QualityOfService};
use crate::topic_filter::TopicFilterRef;
use crate::topic_name::TopicNameRef;
use crate::{Decodable, Encodable};

/// A `PUBLISH` received from the broker
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InboundMessage {
    pub qos: QualityOfService,
    /// `None` for QoS 0
    pub packet_id: Option<u16>,
    pub topic: String,
    pub payload: Vec<u8>,
    pub dup: bool,
    pub retain: bool,
}

impl InboundMessage {
    pub fn qos_with_identifier(&self) -> QoSWithPacketIdentifier {
        QoSWithPacketIdentifier::new(self.qos, self.packet_id.unwrap_or(0))
    }
}

impl From<PublishPacket> for InboundMessage {
    fn from(packet: PublishPacket) -> InboundMessage {
        let qos = packet.qos();
        let dup = packet.dup();
        let retain = packet.retain();
        let (topic, payload) = packet.into_parts();

        InboundMessage {
            qos: qos.into(),
            packet_id: qos.packet_identifier(),
            topic: topic.into(),
            payload,
            dup,
            retain,
        }
    }
}

fn to_bytes<P: EncodablePacket>(packet: &P) -> Result<Vec<u8>, ValidationError> {
    let remaining_length = packet.encoded_packet_length();
    if remaining_length > MAX_REMAINING_LENGTH {
        return Err(ValidationError::PacketTooLarge(remaining_length as usize));
    }

    let mut buf = Vec::with_capacity(packet.encoded_length() as usize);
    packet.encode(&mut buf).map_err(ValidationError::Encoding)?;
    Ok(buf)
}

/// Type and flags byte followed by the variable-length remaining length
pub fn encode_fixed_header(
    control_type: ControlType,
    flags: u8,
    remaining_length: u32,
) -> Result<Vec<u8>, ValidationError> {
    if remaining_length > MAX_REMAINING_LENGTH {
        return Err(ValidationError::PacketTooLarge(remaining_length as usize));
    }

    let header = FixedHeader::new(PacketType::new(control_type, flags)?, remaining_length);
    let mut buf = Vec::with_capacity(header.encoded_length() as usize);
    header.encode(&mut buf).map_err(ValidationError::Encoding)?;
    Ok(buf)
}

/// `CONNECT` carrying the client identifier as its only payload section
pub fn encode_connect(params: &ConnectionParameters) -> Result<Vec<u8>, ValidationError> {
    params.validate()?;

    let mut packet = ConnectPacket::new(params.client_identifier());
    packet.set_flags(params.flags());
    packet.set_keep_alive(params.keep_alive_secs());
    to_bytes(&packet)
}

pub fn encode_publish(
    topic: &TopicNameRef,
    payload: &[u8],
    retain: bool,
    dup: bool,
    qos: QoSWithPacketIdentifier,
) -> Result<Vec<u8>, ValidationError> {
    if payload.len() > MAX_REMAINING_LENGTH as usize {
        return Err(ValidationError::PacketTooLarge(payload.len()));
    }

    let mut packet = PublishPacketRef::new(topic, qos, payload);
    packet.set_retain(retain);
    packet.set_dup(dup);
    to_bytes(&packet)
}

/// `SUBSCRIBE` for a single filter
pub fn encode_subscribe(
    filter: &TopicFilterRef,
    qos: QualityOfService,
    packet_id: u16,
) -> Result<Vec<u8>, ValidationError> {
    to_bytes(&SubscribePacket::new(packet_id, vec![(filter.to_owned(), qos)]))
}

/// `UNSUBSCRIBE` for a single filter
pub fn encode_unsubscribe(filter: &TopicFilterRef, packet_id: u16) -> Result<Vec<u8>, ValidationError> {
    to_bytes(&UnsubscribePacket::new(packet_id, vec![filter.to_owned()]))
}

pub fn encode_puback(packet_id: u16) -> Result<Vec<u8>, ValidationError> {
    to_bytes(&PubackPacket::new(packet_id))
}

pub fn encode_pubrec(packet_id: u16) -> Result<Vec<u8>, ValidationError> {
    to_bytes(&PubrecPacket::new(packet_id))
}

pub fn encode_pubrel(packet_id: u16) -> Result<Vec<u8>, ValidationError> {
    to_bytes(&PubrelPacket::new(packet_id))
}

pub fn encode_pubcomp(packet_id: u16) -> Result<Vec<u8>, ValidationError> {
    to_bytes(&PubcompPacket::new(packet_id))
}

pub fn encode_pingreq() -> Result<Vec<u8>, ValidationError> {
    to_bytes(&PingreqPacket::new())
}

pub fn encode_disconnect() -> Result<Vec<u8>, ValidationError> {
    to_bytes(&DisconnectPacket::new())
}

/// Parses the fixed header at the start of `data`.
///
/// Returns the header and the number of bytes it occupies.
pub fn decode_fixed_header(data: &[u8]) -> Result<(FixedHeader, usize), PacketError> {
    let mut cursor = Cursor::new(data);
    let header = FixedHeader::decode(&mut cursor)?;
    Ok((header, cursor.position() as usize))
}

/// Parses a `PUBLISH` body, everything after the fixed header.
pub fn decode_publish(body: &[u8], fixed_header: FixedHeader) -> Result<InboundMessage, PacketError> {
    if fixed_header.packet_type.control_type != ControlType::Publish {
        return Err(PacketError::UnexpectedPacketType(fixed_header.packet_type.control_type));
    }

    if body.len() < fixed_header.remaining_length as usize {
        return Err(PacketError::TruncatedBody {
            remaining_length: fixed_header.remaining_length,
            available: body.len(),
        });
    }

    let packet = PublishPacket::decode_with(&mut &body[..], Some(fixed_header))?;
    Ok(packet.into())
}
