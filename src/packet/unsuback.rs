//! UNSUBACK

identifier_packet! {
    /// `UNSUBACK` packet
    UnsubackPacket => UnsubscribeAcknowledgement
}
