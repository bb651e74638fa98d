//! DISCONNECT

empty_packet! {
    /// `DISCONNECT` packet
    DisconnectPacket => Disconnect
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::Encodable;

    #[test]
    fn test_disconnect_packet_basic() {
        let mut buf = Vec::new();
        DisconnectPacket::new().encode(&mut buf).unwrap();
        assert_eq!(&buf[..], b"\xe0\x00");
    }
}
