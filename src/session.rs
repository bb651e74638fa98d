//! Client session: connection state, request/acknowledgement handshakes and delivery

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use crate::codec::{self, InboundMessage};
use crate::config::ConnectionParameters;
use crate::control::{ControlType, FixedHeader};
use crate::error::{ClientError, ProtocolViolation};
use crate::frame::FrameBuffer;
use crate::packet::*;
use crate::qos::{QoSWithPacketIdentifier, QualityOfService};
use crate::topic_filter::TopicFilterRef;
use crate::topic_name::TopicNameRef;
use crate::transport::{TcpTransport, Transport};

/// Upper bound for a single transport read
const MAX_READ_CHUNK: usize = 64 * 1024;

#[inline]
fn next_identifier(current: u16) -> u16 {
    if current == u16::MAX {
        1
    } else {
        current + 1
    }
}

/// Last identifiers handed out. 0 means none yet.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
struct Identifiers {
    publish: u16,
    subscribe: u16,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum State {
    Disconnected,
    Connected(Identifiers),
}

/// A connected MQTT client over `T`.
///
/// Every call runs its whole exchange, acknowledgements included, before returning. A call
/// that fails mid-exchange leaves the broker's view of the session unknown: reconnect.
#[derive(Debug)]
pub struct Session<T: Transport> {
    params: ConnectionParameters,
    transport: T,
    frames: FrameBuffer,
    state: State,
}

impl Session<TcpTransport> {
    /// Validates `params`, connects over TCP and runs the `CONNECT` handshake
    pub fn open(params: ConnectionParameters) -> Result<Session<TcpTransport>, ClientError> {
        params.validate()?;

        let transport = TcpTransport::connect(params.host(), params.port())?;
        transport.set_read_timeout(params.read_timeout_duration())?;
        transport.set_write_timeout(params.write_timeout_duration())?;

        Session::open_with(transport, params)
    }
}

impl<T: Transport> Session<T> {
    /// Runs the `CONNECT` handshake over an already established stream.
    ///
    /// The stream is closed if the handshake fails.
    pub fn open_with(transport: T, params: ConnectionParameters) -> Result<Session<T>, ClientError> {
        params.validate()?;

        let mut session = Session {
            params,
            transport,
            frames: FrameBuffer::new(),
            state: State::Disconnected,
        };

        match session.connect() {
            Ok(()) => Ok(session),
            Err(err) => {
                if let Err(close_err) = session.transport.close() {
                    debug!("closing transport after failed handshake: {}", close_err);
                }
                Err(err)
            }
        }
    }

    fn connect(&mut self) -> Result<(), ClientError> {
        let packet = codec::encode_connect(&self.params)?;
        self.send(ControlType::Connect, &packet)?;

        let connack: ConnackPacket = self.read_expected(ControlType::ConnectAcknowledgement, 2)?;
        let session_present = connack.connack_flags().session_present;
        let return_code = connack.connect_return_code();
        if session_present || !return_code.is_accepted() {
            return Err(ClientError::Rejected {
                session_present,
                return_code,
            });
        }

        debug!("session {:?} connected", self.params.client_identifier());
        self.state = State::Connected(Identifiers::default());
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, State::Connected(..))
    }

    pub fn parameters(&self) -> &ConnectionParameters {
        &self.params
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    /// Identifier the next QoS 1 or QoS 2 publish will carry
    pub fn next_publish_identifier(&self) -> Option<u16> {
        match self.state {
            State::Connected(ids) => Some(next_identifier(ids.publish)),
            State::Disconnected => None,
        }
    }

    /// Last identifier used by subscribe or unsubscribe, 0 if there was none
    pub fn current_subscribe_identifier(&self) -> Option<u16> {
        match self.state {
            State::Connected(ids) => Some(ids.subscribe),
            State::Disconnected => None,
        }
    }

    fn identifiers(&mut self) -> Result<&mut Identifiers, ClientError> {
        match self.state {
            State::Connected(ref mut ids) => Ok(ids),
            State::Disconnected => Err(ClientError::NotConnected),
        }
    }

    /// Publishes `payload` to `topic`, returning once the QoS exchange completes
    pub fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QualityOfService,
        retain: bool,
    ) -> Result<(), ClientError> {
        let pkid = next_identifier(self.identifiers()?.publish);
        let topic = TopicNameRef::new(topic)?;
        let packet = codec::encode_publish(topic, payload, retain, false, QoSWithPacketIdentifier::new(qos, pkid))?;

        if qos != QualityOfService::AtMostOnce {
            self.identifiers()?.publish = pkid;
            debug!("publish {:?} to {:?} with packet identifier {}", qos, &topic[..], pkid);
        }

        self.send(ControlType::Publish, &packet)?;

        match qos {
            QualityOfService::AtMostOnce => {}
            QualityOfService::AtLeastOnce => {
                let puback: PubackPacket = self.read_expected(ControlType::PublishAcknowledgement, 2)?;
                check_identifier(ControlType::PublishAcknowledgement, pkid, puback.packet_identifier())?;
            }
            QualityOfService::ExactlyOnce => {
                let pubrec: PubrecPacket = self.read_expected(ControlType::PublishReceived, 2)?;
                check_identifier(ControlType::PublishReceived, pkid, pubrec.packet_identifier())?;

                let pubrel = codec::encode_pubrel(pkid)?;
                self.send(ControlType::PublishRelease, &pubrel)?;

                let pubcomp: PubcompPacket = self.read_expected(ControlType::PublishComplete, 2)?;
                check_identifier(ControlType::PublishComplete, pkid, pubcomp.packet_identifier())?;
            }
        }

        Ok(())
    }

    /// Subscribes to `topic`. The broker must grant exactly `qos`.
    pub fn subscribe(&mut self, topic: &str, qos: QualityOfService) -> Result<(), ClientError> {
        let pkid = next_identifier(self.identifiers()?.subscribe);
        let filter = TopicFilterRef::new(topic)?;
        let packet = codec::encode_subscribe(filter, qos, pkid)?;

        self.identifiers()?.subscribe = pkid;
        debug!("subscribe to {:?} at {:?} with packet identifier {}", topic, qos, pkid);
        self.send(ControlType::Subscribe, &packet)?;

        let suback: SubackPacket = self.read_expected(ControlType::SubscribeAcknowledgement, 3)?;
        check_identifier(ControlType::SubscribeAcknowledgement, pkid, suback.packet_identifier())?;

        // remaining length 3 leaves room for exactly one return code
        let granted = suback
            .subscribes()
            .first()
            .copied()
            .unwrap_or(SubscribeReturnCode::Failure);
        if granted.granted_qos() != Some(qos) {
            return Err(ProtocolViolation::GrantedQoS {
                requested: qos,
                granted: granted as u8,
            }
            .into());
        }

        Ok(())
    }

    /// Unsubscribes from `topic`.
    ///
    /// The request reuses the identifier of the last subscribe, and any acknowledged
    /// identifier up to that value is accepted.
    pub fn unsubscribe(&mut self, topic: &str) -> Result<(), ClientError> {
        let current = self.identifiers()?.subscribe;
        let filter = TopicFilterRef::new(topic)?;
        // 0 is not a legal identifier
        let pkid = current.max(1);
        let packet = codec::encode_unsubscribe(filter, pkid)?;

        self.identifiers()?.subscribe = pkid;
        debug!("unsubscribe from {:?} with packet identifier {}", topic, pkid);
        self.send(ControlType::Unsubscribe, &packet)?;

        let unsuback: UnsubackPacket = self.read_expected(ControlType::UnsubscribeAcknowledgement, 2)?;
        let echoed = unsuback.packet_identifier();
        if echoed > pkid {
            return Err(ProtocolViolation::PacketIdentifier {
                packet: ControlType::UnsubscribeAcknowledgement,
                expected: pkid,
                actual: echoed,
            }
            .into());
        }
        if echoed != pkid {
            warn!("UNSUBACK echoed packet identifier {}, sent {}", echoed, pkid);
        }

        Ok(())
    }

    pub fn ping(&mut self) -> Result<(), ClientError> {
        self.identifiers()?;

        let packet = codec::encode_pingreq()?;
        self.send(ControlType::PingRequest, &packet)?;
        let _: PingrespPacket = self.read_expected(ControlType::PingResponse, 0)?;
        Ok(())
    }

    /// Blocks until the broker delivers a `PUBLISH`, then acknowledges it as its QoS requires
    pub fn receive(&mut self) -> Result<InboundMessage, ClientError> {
        self.identifiers()?;

        let (fixed_header, body) = self.read_frame()?;
        let received = fixed_header.packet_type.control_type;
        if received != ControlType::Publish {
            return Err(ProtocolViolation::UnexpectedPacket {
                expected: ControlType::Publish,
                received,
            }
            .into());
        }

        let message = codec::decode_publish(&body, fixed_header)?;
        trace!("received {:?}", message);

        match message.qos_with_identifier() {
            QoSWithPacketIdentifier::AtMostOnce => {}
            QoSWithPacketIdentifier::AtLeastOnce(pkid) => {
                let puback = codec::encode_puback(pkid)?;
                self.send(ControlType::PublishAcknowledgement, &puback)?;
            }
            QoSWithPacketIdentifier::ExactlyOnce(pkid) => {
                let pubrec = codec::encode_pubrec(pkid)?;
                self.send(ControlType::PublishReceived, &pubrec)?;

                let pubrel: PubrelPacket = self.read_expected(ControlType::PublishRelease, 2)?;
                check_identifier(ControlType::PublishRelease, pkid, pubrel.packet_identifier())?;

                let pubcomp = codec::encode_pubcomp(pkid)?;
                self.send(ControlType::PublishComplete, &pubcomp)?;
            }
        }

        Ok(message)
    }

    /// Sends `DISCONNECT`. The session counts as disconnected even if the send fails.
    ///
    /// The stream stays open until `teardown`.
    pub fn close(&mut self) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Ok(());
        }

        self.state = State::Disconnected;
        debug!("session {:?} disconnecting", self.params.client_identifier());

        let packet = codec::encode_disconnect()?;
        self.send(ControlType::Disconnect, &packet)
    }

    /// Releases the stream
    pub fn teardown(mut self) -> io::Result<()> {
        self.state = State::Disconnected;
        self.frames.clear();
        self.transport.close()
    }

    fn send(&mut self, control_type: ControlType, packet: &[u8]) -> Result<(), ClientError> {
        trace!("sending {:?} {:02x?}", control_type, packet);
        self.transport.write(packet)?;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<(FixedHeader, Bytes), ClientError> {
        loop {
            if let Some((fixed_header, body)) = self.frames.next_frame()? {
                trace!("received {:?} ({} bytes)", fixed_header, body.len());
                return Ok((fixed_header, body));
            }

            let wanted = self.frames.bytes_needed().clamp(1, MAX_READ_CHUNK);
            let chunk = self.transport.read(wanted)?;
            if chunk.is_empty() {
                return Err(ClientError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by broker",
                )));
            }
            self.frames.extend_from_slice(&chunk);
        }
    }

    /// Reads the next packet and checks its type and remaining length before decoding it
    fn read_expected<P: DecodablePacket + std::fmt::Debug>(&mut self, expected: ControlType, remaining_length: u32) -> Result<P, ClientError> {
        let (fixed_header, body) = self.read_frame()?;

        let received = fixed_header.packet_type.control_type;
        if received != expected {
            return Err(ProtocolViolation::UnexpectedPacket { expected, received }.into());
        }
        if fixed_header.remaining_length != remaining_length {
            return Err(ProtocolViolation::RemainingLength {
                packet: expected,
                expected: remaining_length,
                actual: fixed_header.remaining_length,
            }
            .into());
        }

        let packet = P::decode_packet(&mut &body[..], fixed_header)?;
        trace!("received {:?}", packet);
        Ok(packet)
    }
}

fn check_identifier(packet: ControlType, expected: u16, actual: u16) -> Result<(), ClientError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ProtocolViolation::PacketIdentifier {
            packet,
            expected,
            actual,
        }
        .into())
    }
}

/// A `Session` shared between threads.
///
/// Each call holds the lock for its whole exchange, so handshakes never interleave on the
/// stream.
#[derive(Debug)]
pub struct SharedSession<T: Transport> {
    inner: Arc<Mutex<Session<T>>>,
}

impl<T: Transport> Clone for SharedSession<T> {
    fn clone(&self) -> Self {
        SharedSession {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport> From<Session<T>> for SharedSession<T> {
    fn from(session: Session<T>) -> SharedSession<T> {
        SharedSession::new(session)
    }
}

impl<T: Transport> SharedSession<T> {
    pub fn new(session: Session<T>) -> SharedSession<T> {
        SharedSession {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Locks the session for a sequence of calls
    pub fn lock(&self) -> Result<MutexGuard<'_, Session<T>>, ClientError> {
        self.inner.lock().map_err(|_| ClientError::SessionPoisoned)
    }

    pub fn is_connected(&self) -> Result<bool, ClientError> {
        Ok(self.lock()?.is_connected())
    }

    pub fn publish(&self, topic: &str, payload: &[u8], qos: QualityOfService, retain: bool) -> Result<(), ClientError> {
        self.lock()?.publish(topic, payload, qos, retain)
    }

    pub fn subscribe(&self, topic: &str, qos: QualityOfService) -> Result<(), ClientError> {
        self.lock()?.subscribe(topic, qos)
    }

    pub fn unsubscribe(&self, topic: &str) -> Result<(), ClientError> {
        self.lock()?.unsubscribe(topic)
    }

    pub fn ping(&self) -> Result<(), ClientError> {
        self.lock()?.ping()
    }

    pub fn receive(&self) -> Result<InboundMessage, ClientError> {
        self.lock()?.receive()
    }

    pub fn close(&self) -> Result<(), ClientError> {
        self.lock()?.close()
    }

    /// Releases the stream if this is the last handle, otherwise hands the handle back
    pub fn teardown(self) -> Result<io::Result<()>, SharedSession<T>> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => match mutex.into_inner() {
                Ok(session) => Ok(session.teardown()),
                Err(poisoned) => Ok(poisoned.into_inner().teardown()),
            },
            Err(inner) => Err(SharedSession { inner }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::error::ValidationError;
    use crate::transport::mock::MockTransport;

    const CONNACK_ACCEPTED: &[u8] = b"\x20\x02\x00\x00";

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn params(client_id: &str) -> ConnectionParameters {
        ConnectionParameters::new("localhost", 1883, client_id)
    }

    fn connected(mock: &MockTransport) -> Session<MockTransport> {
        init_logger();
        mock.push_incoming(CONNACK_ACCEPTED);
        let session = Session::open_with(mock.clone(), params("this_is_a_test")).unwrap();
        assert_eq!(mock.written().len(), 1);
        session
    }

    /// Writes after the `CONNECT`
    fn sent_after_connect(mock: &MockTransport) -> Vec<Vec<u8>> {
        mock.written().into_iter().skip(1).collect()
    }

    #[test]
    fn client_identifier_is_validated_before_io() {
        init_logger();

        for len in [0usize, 24].iter() {
            let mock = MockTransport::new();
            let result = Session::open_with(mock.clone(), params(&"c".repeat(*len)));
            assert!(matches!(
                result,
                Err(ClientError::Validation(ValidationError::ClientIdentifierLength(_)))
            ));
            assert!(mock.written().is_empty());
            assert_eq!(mock.reads(), 0);
        }

        for len in [1usize, 23].iter() {
            let mock = MockTransport::new();
            mock.push_incoming(CONNACK_ACCEPTED);
            let session = Session::open_with(mock.clone(), params(&"c".repeat(*len))).unwrap();
            assert!(session.is_connected());
        }
    }

    #[test]
    fn connect_reads_exactly_the_connack() {
        init_logger();

        let mock = MockTransport::new();
        mock.push_incoming(CONNACK_ACCEPTED);
        mock.push_incoming(b"\xd0\x00");

        let session = Session::open_with(mock.clone(), params("this_is_a_test")).unwrap();
        assert_eq!(mock.pending_incoming(), 2);
        assert_eq!(session.next_publish_identifier(), Some(1));
        assert_eq!(session.current_subscribe_identifier(), Some(0));

        let mut expected = b"\x10\x1a\x00\x04MQTT\x04\x02\x00\x3c\x00\x0e".to_vec();
        expected.extend_from_slice(b"this_is_a_test");
        assert_eq!(mock.written(), vec![expected]);
    }

    #[test]
    fn connect_refused() {
        init_logger();

        let mock = MockTransport::new();
        mock.push_incoming(b"\x20\x02\x00\x05");
        let result = Session::open_with(mock.clone(), params("abc"));
        assert!(matches!(
            result,
            Err(ClientError::Rejected {
                session_present: false,
                return_code: crate::control::ConnectReturnCode::NotAuthorized
            })
        ));
        assert!(mock.is_closed());

        let mock = MockTransport::new();
        mock.push_incoming(b"\x20\x02\x01\x00");
        assert!(matches!(
            Session::open_with(mock.clone(), params("abc")),
            Err(ClientError::Rejected {
                session_present: true,
                ..
            })
        ));
        assert!(mock.is_closed());
    }

    #[test]
    fn connect_answered_with_other_packet() {
        init_logger();

        let mock = MockTransport::new();
        mock.push_incoming(b"\xd0\x00");
        assert!(matches!(
            Session::open_with(mock.clone(), params("abc")),
            Err(ClientError::ProtocolViolation(ProtocolViolation::UnexpectedPacket {
                expected: ControlType::ConnectAcknowledgement,
                received: ControlType::PingResponse,
            }))
        ));
        assert!(mock.is_closed());
    }

    #[test]
    fn connect_peer_closes() {
        init_logger();

        let mock = MockTransport::new();
        assert!(matches!(
            Session::open_with(mock.clone(), params("abc")),
            Err(ClientError::Io(ref err)) if err.kind() == io::ErrorKind::UnexpectedEof
        ));
        assert!(mock.is_closed());
    }

    #[test]
    fn publish_qos0_sends_without_waiting() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);
        let reads = mock.reads();

        session
            .publish("tests/test1", b"msg1", QualityOfService::AtMostOnce, false)
            .unwrap();

        assert_eq!(sent_after_connect(&mock), vec![b"\x30\x11\x00\x0btests/test1msg1".to_vec()]);
        assert_eq!(mock.reads(), reads);
        assert_eq!(session.next_publish_identifier(), Some(1));
    }

    #[test]
    fn publish_qos1_matching_puback() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x40\x02\x00\x01");
        session
            .publish("tests/test2", b"msg2", QualityOfService::AtLeastOnce, false)
            .unwrap();

        assert_eq!(
            sent_after_connect(&mock),
            vec![b"\x32\x13\x00\x0btests/test2\x00\x01msg2".to_vec()]
        );
        assert_eq!(session.next_publish_identifier(), Some(2));
    }

    #[test]
    fn publish_qos1_mismatched_puback() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x40\x02\x00\x02");
        let result = session.publish("tests/test2", b"msg2", QualityOfService::AtLeastOnce, false);
        assert!(matches!(
            result,
            Err(ClientError::ProtocolViolation(ProtocolViolation::PacketIdentifier {
                packet: ControlType::PublishAcknowledgement,
                expected: 1,
                actual: 2,
            }))
        ));
        assert!(session.is_connected());
    }

    #[test]
    fn publish_qos1_wrong_remaining_length() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x40\x03\x00\x01\x00");
        assert!(matches!(
            session.publish("a", b"", QualityOfService::AtLeastOnce, false),
            Err(ClientError::ProtocolViolation(ProtocolViolation::RemainingLength {
                expected: 2,
                actual: 3,
                ..
            }))
        ));
    }

    #[test]
    fn publish_qos2_full_exchange_in_order() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x50\x02\x00\x01");
        mock.push_incoming(b"\x70\x02\x00\x01");
        session
            .publish("a/b", b"x", QualityOfService::ExactlyOnce, true)
            .unwrap();

        assert_eq!(
            sent_after_connect(&mock),
            vec![b"\x35\x08\x00\x03a/b\x00\x01x".to_vec(), b"\x62\x02\x00\x01".to_vec()]
        );
        assert_eq!(mock.pending_incoming(), 0);
    }

    #[test]
    fn publish_qos2_broker_closes_after_pubrec() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x50\x02\x00\x01");
        let result = session.publish("a/b", b"x", QualityOfService::ExactlyOnce, false);
        assert!(matches!(
            result,
            Err(ClientError::Io(ref err)) if err.kind() == io::ErrorKind::UnexpectedEof
        ));

        // PUBREL went out before the stream ended
        assert_eq!(sent_after_connect(&mock).len(), 2);
    }

    #[test]
    fn publish_qos2_pubcomp_before_pubrec() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x70\x02\x00\x01");
        assert!(matches!(
            session.publish("a/b", b"x", QualityOfService::ExactlyOnce, false),
            Err(ClientError::ProtocolViolation(ProtocolViolation::UnexpectedPacket {
                expected: ControlType::PublishReceived,
                received: ControlType::PublishComplete,
            }))
        ));
    }

    #[test]
    fn publish_invalid_topic_consumes_nothing() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        assert!(matches!(
            session.publish("tests/#", b"", QualityOfService::AtLeastOnce, false),
            Err(ClientError::Validation(ValidationError::InvalidTopicName(_)))
        ));
        assert!(sent_after_connect(&mock).is_empty());
        assert_eq!(session.next_publish_identifier(), Some(1));
    }

    #[test]
    fn subscribe_identifiers_increase() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x90\x03\x00\x01\x00");
        session.subscribe("tests/test1", QualityOfService::AtMostOnce).unwrap();
        mock.push_incoming(b"\x90\x03\x00\x02\x01");
        session.subscribe("tests/+", QualityOfService::AtLeastOnce).unwrap();

        let sent = sent_after_connect(&mock);
        assert_eq!(sent.len(), 2);
        assert_eq!(&sent[0][2..4], b"\x00\x01");
        assert_eq!(&sent[1][2..4], b"\x00\x02");
        assert_eq!(session.current_subscribe_identifier(), Some(2));
    }

    #[test]
    fn subscribe_grant_must_match_request() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x90\x03\x00\x01\x00");
        assert!(matches!(
            session.subscribe("tests/test1", QualityOfService::AtLeastOnce),
            Err(ClientError::ProtocolViolation(ProtocolViolation::GrantedQoS {
                requested: QualityOfService::AtLeastOnce,
                granted: 0,
            }))
        ));

        mock.push_incoming(b"\x90\x03\x00\x02\x80");
        assert!(matches!(
            session.subscribe("tests/test1", QualityOfService::AtMostOnce),
            Err(ClientError::ProtocolViolation(ProtocolViolation::GrantedQoS { granted: 0x80, .. }))
        ));
    }

    #[test]
    fn unsubscribe_reuses_subscribe_identifier() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x90\x03\x00\x01\x00");
        session.subscribe("tests/test1", QualityOfService::AtMostOnce).unwrap();
        mock.push_incoming(b"\x90\x03\x00\x02\x00");
        session.subscribe("tests/test2", QualityOfService::AtMostOnce).unwrap();

        mock.push_incoming(b"\xb0\x02\x00\x02");
        session.unsubscribe("tests/test1").unwrap();

        let sent = sent_after_connect(&mock);
        assert_eq!(sent[2], b"\xa2\x0f\x00\x02\x00\x0btests/test1".to_vec());
        assert_eq!(session.current_subscribe_identifier(), Some(2));
    }

    #[test]
    fn unsubscribe_accepts_lower_identifier() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x90\x03\x00\x01\x00");
        session.subscribe("a", QualityOfService::AtMostOnce).unwrap();
        mock.push_incoming(b"\x90\x03\x00\x02\x00");
        session.subscribe("b", QualityOfService::AtMostOnce).unwrap();

        mock.push_incoming(b"\xb0\x02\x00\x01");
        session.unsubscribe("a").unwrap();

        mock.push_incoming(b"\xb0\x02\x00\x03");
        assert!(matches!(
            session.unsubscribe("b"),
            Err(ClientError::ProtocolViolation(ProtocolViolation::PacketIdentifier {
                expected: 2,
                actual: 3,
                ..
            }))
        ));
    }

    #[test]
    fn unsubscribe_without_subscribe_uses_one() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\xb0\x02\x00\x01");
        session.unsubscribe("a").unwrap();
        assert_eq!(&sent_after_connect(&mock)[0][2..4], b"\x00\x01");
        assert_eq!(session.current_subscribe_identifier(), Some(1));
    }

    #[test]
    fn ping_round_trip() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\xd0\x00");
        session.ping().unwrap();
        assert_eq!(sent_after_connect(&mock), vec![b"\xc0\x00".to_vec()]);

        mock.push_incoming(b"\xd0\x01\x00");
        assert!(matches!(
            session.ping(),
            Err(ClientError::ProtocolViolation(ProtocolViolation::RemainingLength { .. }))
        ));
    }

    #[test]
    fn operations_after_close_fail_without_io() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        session.close().unwrap();
        assert!(!session.is_connected());
        assert_eq!(sent_after_connect(&mock), vec![b"\xe0\x00".to_vec()]);
        assert!(!mock.is_closed());

        let writes = mock.written().len();
        let reads = mock.reads();

        assert!(matches!(
            session.publish("a", b"", QualityOfService::AtMostOnce, false),
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(
            session.subscribe("a", QualityOfService::AtMostOnce),
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(session.unsubscribe("a"), Err(ClientError::NotConnected)));
        assert!(matches!(session.ping(), Err(ClientError::NotConnected)));
        assert!(matches!(session.receive(), Err(ClientError::NotConnected)));
        // invalid input still reports the closed session first
        assert!(matches!(
            session.publish("#", b"", QualityOfService::AtMostOnce, false),
            Err(ClientError::NotConnected)
        ));
        assert_eq!(session.next_publish_identifier(), None);

        session.close().unwrap();
        assert_eq!(mock.written().len(), writes);
        assert_eq!(mock.reads(), reads);

        session.teardown().unwrap();
        assert!(mock.is_closed());
    }

    #[test]
    fn close_marks_disconnected_even_if_send_fails() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.fail_writes();
        assert!(matches!(session.close(), Err(ClientError::Io(_))));
        assert!(!session.is_connected());
    }

    #[test]
    fn short_reads_are_reassembled() {
        init_logger();

        let mock = MockTransport::chunked(1);
        mock.push_incoming(CONNACK_ACCEPTED);
        let mut session = Session::open_with(mock.clone(), params("abc")).unwrap();

        mock.push_incoming(b"\x50\x02\x00\x01\x70\x02\x00\x01");
        session
            .publish("a/b", b"payload", QualityOfService::ExactlyOnce, false)
            .unwrap();

        mock.push_incoming(b"\x30\x0d\x00\x0btests/test1");
        let message = session.receive().unwrap();
        assert_eq!(message.topic, "tests/test1");
        assert!(message.payload.is_empty());
    }

    #[test]
    fn receive_qos0_sends_nothing() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x30\x11\x00\x0btests/test1msg1");
        let message = session.receive().unwrap();

        assert_eq!(message.qos, QualityOfService::AtMostOnce);
        assert_eq!(message.packet_id, None);
        assert_eq!(message.topic, "tests/test1");
        assert_eq!(message.payload, b"msg1".to_vec());
        assert!(sent_after_connect(&mock).is_empty());
    }

    #[test]
    fn receive_qos1_acknowledges() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x32\x08\x00\x01a\x00\x2aabc");
        let message = session.receive().unwrap();

        assert_eq!(message.packet_id, Some(42));
        assert_eq!(message.payload, b"abc".to_vec());
        assert_eq!(sent_after_connect(&mock), vec![b"\x40\x02\x00\x2a".to_vec()]);
    }

    #[test]
    fn receive_qos2_completes_exchange() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x34\x05\x00\x01a\x00\x07");
        mock.push_incoming(b"\x62\x02\x00\x07");
        let message = session.receive().unwrap();

        assert_eq!(message.qos, QualityOfService::ExactlyOnce);
        assert_eq!(message.packet_id, Some(7));
        assert_eq!(
            sent_after_connect(&mock),
            vec![b"\x50\x02\x00\x07".to_vec(), b"\x70\x02\x00\x07".to_vec()]
        );
    }

    #[test]
    fn receive_qos2_mismatched_pubrel() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\x34\x05\x00\x01a\x00\x07");
        mock.push_incoming(b"\x62\x02\x00\x08");
        assert!(matches!(
            session.receive(),
            Err(ClientError::ProtocolViolation(ProtocolViolation::PacketIdentifier {
                packet: ControlType::PublishRelease,
                expected: 7,
                actual: 8,
            }))
        ));
        // PUBCOMP withheld
        assert_eq!(sent_after_connect(&mock).len(), 1);
    }

    #[test]
    fn receive_malformed_publish() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        // topic length runs past the declared remaining length
        mock.push_incoming(b"\x30\x04\x00\x09ab");
        assert!(matches!(session.receive(), Err(ClientError::MalformedPacket(_))));
    }

    #[test]
    fn receive_unexpected_packet() {
        let mock = MockTransport::new();
        let mut session = connected(&mock);

        mock.push_incoming(b"\xd0\x00");
        assert!(matches!(
            session.receive(),
            Err(ClientError::ProtocolViolation(ProtocolViolation::UnexpectedPacket {
                expected: ControlType::Publish,
                received: ControlType::PingResponse,
            }))
        ));
    }

    #[test]
    fn identifiers_wrap_to_one() {
        assert_eq!(next_identifier(0), 1);
        assert_eq!(next_identifier(1), 2);
        assert_eq!(next_identifier(u16::MAX), 1);

        let mock = MockTransport::new();
        let mut session = connected(&mock);
        if let State::Connected(ref mut ids) = session.state {
            ids.publish = u16::MAX;
        }

        mock.push_incoming(b"\x40\x02\x00\x01");
        session.publish("a", b"", QualityOfService::AtLeastOnce, false).unwrap();
        assert_eq!(session.next_publish_identifier(), Some(2));
    }

    #[test]
    fn shared_session_serializes_calls() {
        let mock = MockTransport::new();
        let session = SharedSession::new(connected(&mock));
        let other = session.clone();

        mock.push_incoming(b"\x40\x02\x00\x01");
        session.publish("a", b"1", QualityOfService::AtLeastOnce, false).unwrap();
        mock.push_incoming(b"\x40\x02\x00\x02");
        other.publish("a", b"2", QualityOfService::AtLeastOnce, false).unwrap();

        assert_eq!(session.lock().unwrap().next_publish_identifier(), Some(3));

        let session = match session.teardown() {
            Err(session) => session,
            Ok(_) => panic!("teardown with a second handle alive"),
        };
        drop(other);
        session.teardown().ok().unwrap().unwrap();
        assert!(mock.is_closed());
    }
}
