//! PUBACK

identifier_packet! {
    /// `PUBACK` packet, the QoS 1 acknowledgement
    PubackPacket => PublishAcknowledgement
}
