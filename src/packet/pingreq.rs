//! PINGREQ

empty_packet! {
    /// `PINGREQ` packet
    PingreqPacket => PingRequest
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::Encodable;

    #[test]
    fn test_pingreq_packet_basic() {
        let mut buf = Vec::new();
        PingreqPacket::new().encode(&mut buf).unwrap();
        assert_eq!(&buf[..], b"\xc0\x00");
    }
}
