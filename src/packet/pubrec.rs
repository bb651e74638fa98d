//! PUBREC

identifier_packet! {
    /// `PUBREC` packet, first answer of the QoS 2 exchange
    PubrecPacket => PublishReceived
}
