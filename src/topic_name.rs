//! Topic name, the destination of a `PUBLISH`

use crate::topic::MAX_TOPIC_LENGTH;

fn is_valid_topic_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_TOPIC_LENGTH && !name.contains(|c: char| c == '#' || c == '+')
}

validated_topic! {
    /// Non-empty topic without wildcards
    ///
    /// <http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718106>
    owned TopicName;
    /// Borrowed form of [`TopicName`]
    borrowed TopicNameRef;
    error TopicNameError("invalid topic name ({0})");
    decode_error TopicNameDecodeError::InvalidTopicName;
    valid if is_valid_topic_name;
}

impl TopicNameRef {
    /// Topics starting with `$` are reserved for broker internals
    pub fn is_server_specific(&self) -> bool {
        self.starts_with('$')
    }
}
