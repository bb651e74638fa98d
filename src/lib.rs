//! A blocking MQTT 3.1.1 client that runs every QoS handshake to completion before
//! returning.
//!
//! ```no_run
//! use mqtt_lockstep::{ConnectionParameters, QualityOfService, Session};
//!
//! # fn main() -> Result<(), mqtt_lockstep::ClientError> {
//! let params = ConnectionParameters::new("localhost", 1883, "this_is_a_test");
//! let mut session = Session::open(params)?;
//!
//! session.publish("tests/test1", b"msg1", QualityOfService::AtMostOnce, false)?;
//! session.subscribe("tests/test1", QualityOfService::AtMostOnce)?;
//! let message = session.receive()?;
//! println!("{} => {:?}", message.topic, message.payload);
//!
//! session.close()?;
//! session.teardown()?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub use self::codec::InboundMessage;
pub use self::config::ConnectionParameters;
pub use self::encodable::{Decodable, Encodable};
pub use self::error::{ClientError, ProtocolViolation, ValidationError};
pub use self::qos::{QoSWithPacketIdentifier, QualityOfService};
pub use self::session::{Session, SharedSession};
pub use self::topic_filter::{TopicFilter, TopicFilterRef};
pub use self::topic_name::{TopicName, TopicNameRef};
pub use self::transport::{TcpTransport, Transport};

#[macro_use]
mod topic;

pub mod codec;
pub mod config;
pub mod control;
pub mod encodable;
pub mod error;
pub mod frame;
pub mod packet;
pub mod qos;
pub mod session;
pub mod topic_filter;
pub mod topic_name;
pub mod transport;
