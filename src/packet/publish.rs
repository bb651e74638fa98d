//! PUBLISH

use std::io::{self, Read, Write};

use crate::control::variable_header::PacketIdentifier;
use crate::control::{ControlType, FixedHeader, PacketType};
use crate::packet::entries::remaining_after;
use crate::packet::{DecodablePacket, EncodablePacket, PacketError};
use crate::qos::{QoSWithPacketIdentifier, QualityOfService};
use crate::topic_name::{TopicName, TopicNameRef};
use crate::{Decodable, Encodable};

const DUP_FLAG: u8 = 0x08;
const QOS_MASK: u8 = 0x06;
const RETAIN_FLAG: u8 = 0x01;

#[inline]
fn split_qos(qos: QoSWithPacketIdentifier) -> (u8, Option<PacketIdentifier>) {
    match qos {
        QoSWithPacketIdentifier::AtMostOnce => (0, None),
        QoSWithPacketIdentifier::AtLeastOnce(pkid) => (1, Some(PacketIdentifier(pkid))),
        QoSWithPacketIdentifier::ExactlyOnce(pkid) => (2, Some(PacketIdentifier(pkid))),
    }
}

fn set_flag(header: &mut FixedHeader, mask: u8, on: bool) {
    if on {
        header.packet_type.flags |= mask;
    } else {
        header.packet_type.flags &= !mask;
    }
}

/// `PUBLISH` packet
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct PublishPacket {
    fixed_header: FixedHeader,
    topic_name: TopicName,
    packet_identifier: Option<PacketIdentifier>,
    payload: Vec<u8>,
}

encodable_packet!(PublishPacket(topic_name, packet_identifier, payload));

impl PublishPacket {
    pub fn new<P: Into<Vec<u8>>>(topic_name: TopicName, qos: QoSWithPacketIdentifier, payload: P) -> PublishPacket {
        let mut pk = PublishPacket {
            fixed_header: FixedHeader::new(PacketType::with_default(ControlType::Publish), 0),
            topic_name,
            packet_identifier: None,
            payload: payload.into(),
        };
        pk.set_qos(qos);
        pk
    }

    pub fn set_dup(&mut self, dup: bool) {
        set_flag(&mut self.fixed_header, DUP_FLAG, dup);
    }

    pub fn dup(&self) -> bool {
        self.fixed_header.packet_type.flags & DUP_FLAG != 0
    }

    pub fn set_qos(&mut self, qos: QoSWithPacketIdentifier) {
        let (level, pkid) = split_qos(qos);
        set_flag(&mut self.fixed_header, QOS_MASK, false);
        self.fixed_header.packet_type.flags |= level << 1;
        self.packet_identifier = pkid;
        self.fix_header_remaining_len();
    }

    pub fn qos(&self) -> QoSWithPacketIdentifier {
        match self.packet_identifier {
            None => QoSWithPacketIdentifier::AtMostOnce,
            Some(pkid) => match (self.fixed_header.packet_type.flags & QOS_MASK) >> 1 {
                1 => QoSWithPacketIdentifier::AtLeastOnce(pkid.0),
                _ => QoSWithPacketIdentifier::ExactlyOnce(pkid.0),
            },
        }
    }

    pub fn set_retain(&mut self, retain: bool) {
        set_flag(&mut self.fixed_header, RETAIN_FLAG, retain);
    }

    pub fn retain(&self) -> bool {
        self.fixed_header.packet_type.flags & RETAIN_FLAG != 0
    }

    pub fn set_topic_name(&mut self, topic_name: TopicName) {
        self.topic_name = topic_name;
        self.fix_header_remaining_len();
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name[..]
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn set_payload<P: Into<Vec<u8>>>(&mut self, payload: P) {
        self.payload = payload.into();
        self.fix_header_remaining_len();
    }

    /// Splits the packet into its topic name and payload
    pub fn into_parts(self) -> (TopicName, Vec<u8>) {
        (self.topic_name, self.payload)
    }
}

impl DecodablePacket for PublishPacket {
    fn decode_packet<R: Read>(reader: &mut R, fixed_header: FixedHeader) -> Result<Self, PacketError> {
        let level = (fixed_header.packet_type.flags & QOS_MASK) >> 1;
        let qos = QualityOfService::from_u8(level).ok_or(PacketError::InvalidQualityOfService(level))?;

        let topic_name = TopicName::decode(reader)?;

        let packet_identifier = if qos != QualityOfService::AtMostOnce {
            Some(PacketIdentifier::decode(reader)?)
        } else {
            None
        };

        let payload_len = remaining_after(
            fixed_header.remaining_length,
            topic_name.encoded_length() + packet_identifier.encoded_length(),
        )?;

        let payload = Vec::<u8>::decode_with(reader, Some(payload_len))?;

        Ok(PublishPacket {
            fixed_header,
            topic_name,
            packet_identifier,
            payload,
        })
    }
}

/// `PUBLISH` packet by reference, for encoding only
pub struct PublishPacketRef<'a> {
    fixed_header: FixedHeader,
    topic_name: &'a TopicNameRef,
    packet_identifier: Option<PacketIdentifier>,
    payload: &'a [u8],
}

impl<'a> PublishPacketRef<'a> {
    pub fn new(topic_name: &'a TopicNameRef, qos: QoSWithPacketIdentifier, payload: &'a [u8]) -> PublishPacketRef<'a> {
        let (level, pkid) = split_qos(qos);

        let mut pk = PublishPacketRef {
            fixed_header: FixedHeader::new(PacketType::with_default(ControlType::Publish), 0),
            topic_name,
            packet_identifier: pkid,
            payload,
        };
        pk.fixed_header.packet_type.flags |= level << 1;
        pk.fixed_header.remaining_length = pk.encoded_packet_length();
        pk
    }

    pub fn set_dup(&mut self, dup: bool) {
        set_flag(&mut self.fixed_header, DUP_FLAG, dup);
    }

    pub fn set_retain(&mut self, retain: bool) {
        set_flag(&mut self.fixed_header, RETAIN_FLAG, retain);
    }
}

impl EncodablePacket for PublishPacketRef<'_> {
    fn fixed_header(&self) -> &FixedHeader {
        &self.fixed_header
    }

    fn encode_packet<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.topic_name.encode(writer)?;
        self.packet_identifier.encode(writer)?;
        self.payload.encode(writer)
    }

    fn encoded_packet_length(&self) -> u32 {
        self.topic_name.encoded_length() + self.packet_identifier.encoded_length() + self.payload.encoded_length()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use crate::topic_name::TopicName;
    use crate::{Decodable, Encodable};

    #[test]
    fn test_publish_packet_basic() {
        let mut packet = PublishPacket::new(
            TopicName::new("a/b".to_owned()).unwrap(),
            QoSWithPacketIdentifier::ExactlyOnce(10),
            b"Hello world!".to_vec(),
        );
        packet.set_retain(true);
        packet.set_dup(true);

        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(buf[0], 0x3D);

        let mut decode_buf = Cursor::new(buf);
        let decoded = PublishPacket::decode(&mut decode_buf).unwrap();

        assert_eq!(packet, decoded);
        assert!(decoded.dup());
        assert!(decoded.retain());
        assert_eq!(decoded.qos(), QoSWithPacketIdentifier::ExactlyOnce(10));
    }

    #[test]
    fn test_publish_ref_matches_owned() {
        let topic = TopicName::new("tests/test2").unwrap();
        let owned = PublishPacket::new(topic.clone(), QoSWithPacketIdentifier::AtLeastOnce(1), b"msg2".to_vec());
        let borrowed = PublishPacketRef::new(&topic, QoSWithPacketIdentifier::AtLeastOnce(1), b"msg2");

        let mut owned_buf = Vec::new();
        owned.encode(&mut owned_buf).unwrap();
        let mut borrowed_buf = Vec::new();
        borrowed.encode(&mut borrowed_buf).unwrap();

        assert_eq!(owned_buf, borrowed_buf);
        assert_eq!(&owned_buf[..], b"\x32\x13\x00\x0btests/test2\x00\x01msg2");
    }

    #[test]
    fn test_publish_qos_downgrade_drops_identifier() {
        let mut packet = PublishPacket::new(
            TopicName::new("a/b").unwrap(),
            QoSWithPacketIdentifier::ExactlyOnce(3),
            b"x".to_vec(),
        );
        packet.set_qos(QoSWithPacketIdentifier::AtMostOnce);

        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf[..], b"\x30\x06\x00\x03a/bx");
    }

    #[test]
    fn test_publish_qos3_is_malformed() {
        let mut decode_buf = Cursor::new(&b"\x36\x06\x00\x01a\x00\x01x"[..]);
        assert!(matches!(
            PublishPacket::decode(&mut decode_buf),
            Err(PacketError::InvalidQualityOfService(3))
        ));
    }

    #[test]
    fn test_publish_topic_longer_than_remaining_length() {
        // remaining length 3 but the topic alone claims 5 bytes
        let mut decode_buf = Cursor::new(&b"\x30\x03\x00\x05abcdefgh"[..]);
        assert!(PublishPacket::decode(&mut decode_buf).is_err());
    }
}
