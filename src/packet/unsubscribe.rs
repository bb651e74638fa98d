//! UNSUBSCRIBE

use crate::topic_filter::TopicFilter;

list_packet! {
    /// `UNSUBSCRIBE` packet
    UnsubscribePacket(TopicFilter) => Unsubscribe
}
