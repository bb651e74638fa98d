//! Connection parameters

use std::time::Duration;

use crate::control::variable_header::ConnectFlags;
use crate::error::ValidationError;

/// Longest client identifier every 3.1.1 broker must accept
pub const MAX_CLIENT_IDENTIFIER_LENGTH: usize = 23;

pub const DEFAULT_KEEP_ALIVE: u16 = 60;

/// Everything needed to open a session. Fixed once the session is open.
///
/// ```rust
/// use std::time::Duration;
/// use mqtt_lockstep::ConnectionParameters;
///
/// let params = ConnectionParameters::new("localhost", 1883, "this_is_a_test")
///     .keep_alive(30)
///     .read_timeout(Some(Duration::from_secs(5)));
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConnectionParameters {
    host: String,
    port: u16,
    client_identifier: String,
    flags: ConnectFlags,
    keep_alive: u16,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl ConnectionParameters {
    pub fn new<H, C>(host: H, port: u16, client_identifier: C) -> ConnectionParameters
    where
        H: Into<String>,
        C: Into<String>,
    {
        let mut flags = ConnectFlags::empty();
        flags.clean_session = true;

        ConnectionParameters {
            host: host.into(),
            port,
            client_identifier: client_identifier.into(),
            flags,
            keep_alive: DEFAULT_KEEP_ALIVE,
            read_timeout: None,
            write_timeout: None,
        }
    }

    pub fn clean_session(mut self, clean_session: bool) -> ConnectionParameters {
        self.flags.clean_session = clean_session;
        self
    }

    /// Keep-alive interval in seconds, 0 disables it
    pub fn keep_alive(mut self, secs: u16) -> ConnectionParameters {
        self.keep_alive = secs;
        self
    }

    /// Replaces every connect flag, clean session included
    pub fn connect_flags(mut self, flags: ConnectFlags) -> ConnectionParameters {
        self.flags = flags;
        self
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> ConnectionParameters {
        self.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Option<Duration>) -> ConnectionParameters {
        self.write_timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_identifier(&self) -> &str {
        &self.client_identifier
    }

    pub fn flags(&self) -> ConnectFlags {
        self.flags
    }

    pub fn keep_alive_secs(&self) -> u16 {
        self.keep_alive
    }

    pub fn read_timeout_duration(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn write_timeout_duration(&self) -> Option<Duration> {
        self.write_timeout
    }

    /// Checks the parameters without touching the network
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.is_empty() {
            return Err(ValidationError::EmptyHost);
        }

        let len = self.client_identifier.len();
        if len == 0 || len > MAX_CLIENT_IDENTIFIER_LENGTH {
            return Err(ValidationError::ClientIdentifierLength(len));
        }

        if self.flags.announces_extra_payload() || self.flags.reserved {
            return Err(ValidationError::UnsupportedConnectFlags(self.flags.to_u8()));
        }

        Ok(())
    }
}
