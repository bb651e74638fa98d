//! Packet reassembly over a byte stream

use bytes::{Buf, Bytes, BytesMut};

use crate::control::fixed_header::{scan_fixed_header, FixedHeaderError};
use crate::control::FixedHeader;

/// Accumulates received bytes until one whole control packet is available.
///
/// Reads may end anywhere inside a packet, or carry more than one. Bytes past the first
/// complete packet stay buffered for the next call.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    pub fn new() -> FrameBuffer {
        FrameBuffer::default()
    }

    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Bytes to request from the stream to make progress without reading past the
    /// packet being assembled. 0 when a whole packet is already buffered.
    pub fn bytes_needed(&self) -> usize {
        if self.buf.len() < 2 {
            return 2 - self.buf.len();
        }

        match scan_fixed_header(&self.buf[..]) {
            None => 1,
            Some(Err(..)) => 0,
            Some(Ok((remaining_length, header_len))) => {
                (header_len + remaining_length as usize).saturating_sub(self.buf.len())
            }
        }
    }

    /// Splits off the next complete packet, returning its fixed header and body.
    ///
    /// A packet whose fixed header does not parse is still consumed when its extent is
    /// known, so the error is reported once.
    pub fn next_frame(&mut self) -> Result<Option<(FixedHeader, Bytes)>, FixedHeaderError> {
        split_frame(&mut self.buf)
    }
}

/// Removes one whole packet from the front of `buf`, if one is there
pub fn split_frame(buf: &mut BytesMut) -> Result<Option<(FixedHeader, Bytes)>, FixedHeaderError> {
    if buf.len() < 2 {
        return Ok(None);
    }

    let (remaining_length, header_len) = match scan_fixed_header(&buf[..]) {
        None => return Ok(None),
        Some(scanned) => scanned?,
    };

    let frame_len = header_len + remaining_length as usize;
    if buf.len() < frame_len {
        buf.reserve(frame_len - buf.len());
        return Ok(None);
    }

    let type_byte = buf[0];
    let mut frame = buf.split_to(frame_len);
    frame.advance(header_len);
    let body = frame.freeze();

    Ok(Some((FixedHeader::from_type_byte(type_byte, remaining_length)?, body)))
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::control::ControlType;

    #[test]
    fn reassembles_byte_by_byte() {
        let packet = b"\x30\x0a\x00\x03a/bhello";
        let mut frames = FrameBuffer::new();

        for (i, byte) in packet.iter().enumerate() {
            assert!(frames.bytes_needed() > 0, "at byte {}", i);
            assert!(frames.next_frame().unwrap().is_none());
            frames.extend_from_slice(&[*byte]);
        }

        assert_eq!(frames.bytes_needed(), 0);
        let (header, body) = frames.next_frame().unwrap().unwrap();
        assert_eq!(header.packet_type.control_type, ControlType::Publish);
        assert_eq!(header.remaining_length, 10);
        assert_eq!(&body[..], b"\x00\x03a/bhello");
        assert!(frames.is_empty());
    }

    #[test]
    fn bytes_needed_never_overshoots() {
        let mut frames = FrameBuffer::new();
        assert_eq!(frames.bytes_needed(), 2);

        frames.extend_from_slice(b"\x30");
        assert_eq!(frames.bytes_needed(), 1);

        // continuation bit set, length incomplete
        frames.extend_from_slice(b"\xc1");
        assert_eq!(frames.bytes_needed(), 1);

        frames.extend_from_slice(b"\x02");
        assert_eq!(frames.bytes_needed(), 321);
    }

    #[test]
    fn keeps_surplus_for_next_frame() {
        let mut frames = FrameBuffer::new();
        frames.extend_from_slice(b"\x40\x02\x00\x01\xd0\x00\x50");

        let (first, body) = frames.next_frame().unwrap().unwrap();
        assert_eq!(first.packet_type.control_type, ControlType::PublishAcknowledgement);
        assert_eq!(&body[..], b"\x00\x01");

        let (second, body) = frames.next_frame().unwrap().unwrap();
        assert_eq!(second.packet_type.control_type, ControlType::PingResponse);
        assert!(body.is_empty());

        assert!(frames.next_frame().unwrap().is_none());
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn reserved_type_is_consumed() {
        let mut frames = FrameBuffer::new();
        frames.extend_from_slice(b"\xf0\x01\xaa\xd0\x00");

        assert!(matches!(frames.next_frame(), Err(FixedHeaderError::ReservedType(15, 1))));
        let (header, _) = frames.next_frame().unwrap().unwrap();
        assert_eq!(header.packet_type.control_type, ControlType::PingResponse);
    }

    #[test]
    fn malformed_remaining_length() {
        let mut frames = FrameBuffer::new();
        frames.extend_from_slice(b"\x30\xff\xff\xff\xff\x01");
        assert!(matches!(frames.next_frame(), Err(FixedHeaderError::MalformedRemainingLength)));
        assert_eq!(frames.bytes_needed(), 0);
    }
}
