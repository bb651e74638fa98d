//! Fixed header in MQTT

use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::control::packet_type::{PacketType, PacketTypeError};
use crate::{Decodable, Encodable};

/// Largest value the 4-byte variable length encoding can carry
pub const MAX_REMAINING_LENGTH: u32 = 0x0FFF_FFFF;

/// Fixed header for each MQTT control packet
///
/// Format:
///
/// ```plain
/// 7                          3                          0
/// +--------------------------+--------------------------+
/// | MQTT Control Packet Type | Flags for each type      |
/// +--------------------------+--------------------------+
/// | Remaining Length ...                                |
/// +-----------------------------------------------------+
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FixedHeader {
    /// Packet Type
    pub packet_type: PacketType,

    /// The Remaining Length is the number of bytes remaining within the current packet,
    /// including data in the variable header and the payload. The Remaining Length does
    /// not include the bytes used to encode the Remaining Length.
    pub remaining_length: u32,
}

impl FixedHeader {
    pub fn new(packet_type: PacketType, remaining_length: u32) -> FixedHeader {
        debug_assert!(remaining_length <= MAX_REMAINING_LENGTH);
        FixedHeader {
            packet_type,
            remaining_length,
        }
    }

    /// Interprets the first byte of a packet whose remaining length is already known
    pub(crate) fn from_type_byte(type_byte: u8, remaining_length: u32) -> Result<FixedHeader, FixedHeaderError> {
        match PacketType::from_u8(type_byte) {
            Ok(packet_type) => Ok(FixedHeader::new(packet_type, remaining_length)),
            Err(PacketTypeError::ReservedType(ty, _)) => Err(FixedHeaderError::ReservedType(ty, remaining_length)),
            Err(err) => Err(err.into()),
        }
    }
}

/// Folds the `index`th remaining length byte into `length`.
///
/// Returns `true` once the last byte has been seen.
fn accumulate_length(length: &mut u32, index: usize, byte: u8) -> Result<bool, FixedHeaderError> {
    if index >= 4 {
        return Err(FixedHeaderError::MalformedRemainingLength);
    }

    *length |= u32::from(byte & 0x7F) << (7 * index);
    Ok(byte & 0x80 == 0)
}

/// Bytes the variable length encoding of `remaining_length` takes
fn length_size(remaining_length: u32) -> u32 {
    let mut size = 1;
    let mut rest = remaining_length >> 7;
    while rest > 0 {
        size += 1;
        rest >>= 7;
    }
    size
}

/// Scans a fixed header at the start of `data` without interpreting the type byte.
///
/// Returns `None` if `data` ends before the remaining length is complete, otherwise the
/// remaining length and the number of bytes the fixed header occupies.
pub(crate) fn scan_fixed_header(data: &[u8]) -> Option<Result<(u32, usize), FixedHeaderError>> {
    let mut length = 0;
    for (index, &byte) in data.iter().skip(1).enumerate() {
        match accumulate_length(&mut length, index, byte) {
            Ok(true) => return Some(Ok((length, index + 2))),
            Ok(false) => {}
            Err(err) => return Some(Err(err)),
        }
    }
    None
}

impl Encodable for FixedHeader {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if self.remaining_length > MAX_REMAINING_LENGTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("remaining length {} exceeds {}", self.remaining_length, MAX_REMAINING_LENGTH),
            ));
        }

        writer.write_u8(self.packet_type.to_u8())?;

        let mut rest = self.remaining_length;
        for _ in 1..length_size(self.remaining_length) {
            writer.write_u8((rest & 0x7F) as u8 | 0x80)?;
            rest >>= 7;
        }
        writer.write_u8(rest as u8)
    }

    fn encoded_length(&self) -> u32 {
        1 + length_size(self.remaining_length)
    }
}

impl Decodable for FixedHeader {
    type Error = FixedHeaderError;
    type Cond = ();

    fn decode_with<R: Read>(reader: &mut R, _rest: ()) -> Result<FixedHeader, FixedHeaderError> {
        let type_byte = reader.read_u8()?;

        let mut length = 0;
        let mut index = 0;
        while !accumulate_length(&mut length, index, reader.read_u8()?)? {
            index += 1;
        }

        FixedHeader::from_type_byte(type_byte, length)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FixedHeaderError {
    #[error("malformed remaining length")]
    MalformedRemainingLength,
    #[error("reserved header ({0}, {1})")]
    ReservedType(u8, u32),
    #[error(transparent)]
    PacketTypeError(#[from] PacketTypeError),
    #[error(transparent)]
    IoError(#[from] io::Error),
}
