//! PINGRESP

empty_packet! {
    /// `PINGRESP` packet
    PingrespPacket => PingResponse
}
