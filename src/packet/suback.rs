//! SUBACK

use std::cmp::Ordering;

use crate::qos::QualityOfService;

/// Subscribe code
#[repr(u8)]
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SubscribeReturnCode {
    MaximumQoSLevel0 = 0x00,
    MaximumQoSLevel1 = 0x01,
    MaximumQoSLevel2 = 0x02,
    Failure = 0x80,
}

impl SubscribeReturnCode {
    pub fn from_u8(code: u8) -> Option<SubscribeReturnCode> {
        match code {
            0x00 => Some(SubscribeReturnCode::MaximumQoSLevel0),
            0x01 => Some(SubscribeReturnCode::MaximumQoSLevel1),
            0x02 => Some(SubscribeReturnCode::MaximumQoSLevel2),
            0x80 => Some(SubscribeReturnCode::Failure),
            _ => None,
        }
    }

    /// The granted level, `None` for `Failure`
    pub fn granted_qos(self) -> Option<QualityOfService> {
        match self {
            SubscribeReturnCode::MaximumQoSLevel0 => Some(QualityOfService::AtMostOnce),
            SubscribeReturnCode::MaximumQoSLevel1 => Some(QualityOfService::AtLeastOnce),
            SubscribeReturnCode::MaximumQoSLevel2 => Some(QualityOfService::ExactlyOnce),
            SubscribeReturnCode::Failure => None,
        }
    }
}

impl PartialOrd for SubscribeReturnCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.granted_qos(), other.granted_qos()) {
            (Some(lhs), Some(rhs)) => Some(lhs.cmp(&rhs)),
            _ => None,
        }
    }
}

impl From<QualityOfService> for SubscribeReturnCode {
    fn from(qos: QualityOfService) -> Self {
        match qos {
            QualityOfService::AtMostOnce => SubscribeReturnCode::MaximumQoSLevel0,
            QualityOfService::AtLeastOnce => SubscribeReturnCode::MaximumQoSLevel1,
            QualityOfService::ExactlyOnce => SubscribeReturnCode::MaximumQoSLevel2,
        }
    }
}

list_packet! {
    /// `SUBACK` packet, one return code per requested filter
    SubackPacket(SubscribeReturnCode) => SubscribeAcknowledgement
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use crate::packet::PacketError;
    use crate::{Decodable, Encodable};

    #[test]
    fn test_suback_packet_encode() {
        let packet = SubackPacket::new(1, vec![SubscribeReturnCode::MaximumQoSLevel0]);

        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf[..], b"\x90\x03\x00\x01\x00");
    }

    #[test]
    fn test_suback_packet_decode_failure_code() {
        let packet = SubackPacket::decode(&mut Cursor::new(&b"\x90\x04\x00\x02\x01\x80"[..])).unwrap();

        assert_eq!(packet.packet_identifier(), 2);
        assert_eq!(
            packet.subscribes(),
            &[SubscribeReturnCode::MaximumQoSLevel1, SubscribeReturnCode::Failure][..]
        );
        assert_eq!(SubscribeReturnCode::Failure.granted_qos(), None);
    }

    #[test]
    fn test_suback_packet_invalid_code() {
        assert!(matches!(
            SubackPacket::decode(&mut Cursor::new(&b"\x90\x03\x00\x01\x03"[..])),
            Err(PacketError::InvalidSubscribeReturnCode(3))
        ));
    }

    #[test]
    fn test_subscribe_return_code_ordering() {
        assert!(SubscribeReturnCode::MaximumQoSLevel0 < SubscribeReturnCode::MaximumQoSLevel2);
        assert_eq!(
            SubscribeReturnCode::Failure.partial_cmp(&SubscribeReturnCode::MaximumQoSLevel0),
            None
        );
    }
}
