//! Control packets

pub use self::fixed_header::FixedHeader;
pub use self::packet_type::{ControlType, PacketType};
pub use self::variable_header::*;

pub mod fixed_header;
pub mod packet_type;
pub mod variable_header;
