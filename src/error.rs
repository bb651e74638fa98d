//! Errors surfaced by a session

use std::io;

use crate::control::fixed_header::FixedHeaderError;
use crate::control::packet_type::PacketTypeError;
use crate::control::variable_header::ConnectReturnCode;
use crate::control::ControlType;
use crate::packet::PacketError;
use crate::topic_filter::TopicFilterError;
use crate::topic_name::TopicNameError;
use crate::QualityOfService;

/// Input rejected before any byte reaches the transport
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("host must not be empty")]
    EmptyHost,
    #[error("client identifier must be 1 to 23 bytes, got {0}")]
    ClientIdentifierLength(usize),
    #[error("connect flags {0:#04X} announce payload sections that are never sent")]
    UnsupportedConnectFlags(u8),
    #[error(transparent)]
    InvalidTopicName(#[from] TopicNameError),
    #[error(transparent)]
    InvalidTopicFilter(#[from] TopicFilterError),
    #[error(transparent)]
    InvalidFlags(#[from] PacketTypeError),
    #[error("packet body of {0} bytes exceeds the maximum remaining length")]
    PacketTooLarge(usize),
    #[error("failed to encode packet: {0}")]
    Encoding(#[source] io::Error),
}

/// A received packet that does not answer the request in flight
#[derive(Debug, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("expected {expected:?}, received {received:?}")]
    UnexpectedPacket { expected: ControlType, received: ControlType },
    #[error("{packet:?} must have remaining length {expected}, received {actual}")]
    RemainingLength {
        packet: ControlType,
        expected: u32,
        actual: u32,
    },
    #[error("{packet:?} echoed packet identifier {actual}, expected {expected}")]
    PacketIdentifier { packet: ControlType, expected: u16, actual: u16 },
    #[error("requested {requested:?}, broker granted {granted:#04X}")]
    GrantedQoS { requested: QualityOfService, granted: u8 },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Io(io::Error),
    #[error("transport timed out")]
    Timeout,
    #[error(transparent)]
    ProtocolViolation(#[from] ProtocolViolation),
    #[error("session is not connected")]
    NotConnected,
    #[error("malformed packet: {0}")]
    MalformedPacket(#[source] PacketError),
    #[error("connection rejected (session present: {session_present}, return code: {return_code:?})")]
    Rejected {
        session_present: bool,
        return_code: ConnectReturnCode,
    },
    #[error("session lock poisoned")]
    SessionPoisoned,
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> ClientError {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ClientError::Timeout,
            _ => ClientError::Io(err),
        }
    }
}

impl From<PacketError> for ClientError {
    fn from(err: PacketError) -> ClientError {
        ClientError::MalformedPacket(err)
    }
}

impl From<FixedHeaderError> for ClientError {
    fn from(err: FixedHeaderError) -> ClientError {
        ClientError::MalformedPacket(PacketError::FixedHeaderError(err))
    }
}

impl From<TopicNameError> for ClientError {
    fn from(err: TopicNameError) -> ClientError {
        ClientError::Validation(err.into())
    }
}

impl From<TopicFilterError> for ClientError {
    fn from(err: TopicFilterError) -> ClientError {
        ClientError::Validation(err.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timeouts_are_not_io_errors() {
        let err: ClientError = io::Error::new(io::ErrorKind::WouldBlock, "read timed out").into();
        assert!(matches!(err, ClientError::Timeout));

        let err: ClientError = io::Error::from(io::ErrorKind::TimedOut).into();
        assert!(matches!(err, ClientError::Timeout));

        let err: ClientError = io::Error::from(io::ErrorKind::ConnectionReset).into();
        assert!(matches!(err, ClientError::Io(ref e) if e.kind() == io::ErrorKind::ConnectionReset));
    }

    #[test]
    fn decode_io_errors_are_malformed() {
        let err: ClientError = PacketError::IoError(io::Error::from(io::ErrorKind::UnexpectedEof)).into();
        assert!(matches!(err, ClientError::MalformedPacket(_)));
    }
}
