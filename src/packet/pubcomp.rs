//! PUBCOMP

identifier_packet! {
    /// `PUBCOMP` packet, closes the QoS 2 exchange
    PubcompPacket => PublishComplete
}
