//! Byte stream a session runs over

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// A reliable, ordered byte stream
pub trait Transport {
    /// Writes all of `buf`
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Reads at most `max_len` bytes. May return fewer, an empty buffer means the peer closed.
    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>>;

    /// Releases the stream
    fn close(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).write(buf)
    }

    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        (**self).read(max_len)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// `Transport` over a `TcpStream`
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Resolves `host` and connects to the first address that accepts
    pub fn connect(host: &str, port: u16) -> io::Result<TcpTransport> {
        let stream = TcpStream::connect((host, port))?;
        stream.set_nodelay(true)?;
        debug!("connected to {}:{} ({:?})", host, port, stream.peer_addr().ok());
        Ok(TcpTransport { stream })
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_write_timeout(timeout)
    }

    pub fn get_ref(&self) -> &TcpStream {
        &self.stream
    }
}

impl From<TcpStream> for TcpTransport {
    fn from(stream: TcpStream) -> TcpTransport {
        TcpTransport { stream }
    }
}

impl Transport for TcpTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf)?;
        self.stream.flush()
    }

    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; max_len];
        let n = loop {
            match self.stream.read(&mut buf) {
                Ok(n) => break n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        };
        buf.truncate(n);
        Ok(buf)
    }

    fn close(&mut self) -> io::Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Err(ref err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}
