//! SUBSCRIBE

use crate::topic_filter::TopicFilter;
use crate::QualityOfService;

list_packet! {
    /// `SUBSCRIBE` packet, a list of topic filters with requested QoS
    SubscribePacket((TopicFilter, QualityOfService)) => Subscribe
}
