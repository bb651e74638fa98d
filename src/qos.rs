//! QoS (Quality of Services)

#[repr(u8)]
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub enum QualityOfService {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl QualityOfService {
    pub fn from_u8(level: u8) -> Option<QualityOfService> {
        match level {
            0 => Some(QualityOfService::AtMostOnce),
            1 => Some(QualityOfService::AtLeastOnce),
            2 => Some(QualityOfService::ExactlyOnce),
            _ => None,
        }
    }
}

impl From<QoSWithPacketIdentifier> for QualityOfService {
    fn from(qos: QoSWithPacketIdentifier) -> Self {
        match qos {
            QoSWithPacketIdentifier::AtMostOnce => QualityOfService::AtMostOnce,
            QoSWithPacketIdentifier::AtLeastOnce(_) => QualityOfService::AtLeastOnce,
            QoSWithPacketIdentifier::ExactlyOnce(_) => QualityOfService::ExactlyOnce,
        }
    }
}

/// QoS with identifier pairs
///
/// A packet identifier only travels with QoS 1 and QoS 2 publishes.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub enum QoSWithPacketIdentifier {
    AtMostOnce,
    AtLeastOnce(u16),
    ExactlyOnce(u16),
}

impl QoSWithPacketIdentifier {
    pub fn new(qos: QualityOfService, id: u16) -> QoSWithPacketIdentifier {
        match qos {
            QualityOfService::AtMostOnce => QoSWithPacketIdentifier::AtMostOnce,
            QualityOfService::AtLeastOnce => QoSWithPacketIdentifier::AtLeastOnce(id),
            QualityOfService::ExactlyOnce => QoSWithPacketIdentifier::ExactlyOnce(id),
        }
    }

    pub fn packet_identifier(&self) -> Option<u16> {
        match *self {
            QoSWithPacketIdentifier::AtMostOnce => None,
            QoSWithPacketIdentifier::AtLeastOnce(id) | QoSWithPacketIdentifier::ExactlyOnce(id) => Some(id),
        }
    }
}
