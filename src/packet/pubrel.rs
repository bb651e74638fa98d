//! PUBREL

identifier_packet! {
    /// `PUBREL` packet, carries the fixed flags `0b0010`
    PubrelPacket => PublishRelease
}
