//! Byte transport under the framer.
//! - Transport: blocking read, non-blocking poll, write
//! - TcpTransport: socket-backed transport for server mode

use std::io::{self, Read, Write};
use std::net::TcpStream;

/// Outcome of a non-blocking read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// `n` bytes were copied into the buffer.
    Data(usize),
    /// Nothing available right now.
    Empty,
    /// The peer closed the stream.
    Closed,
}

/// Raw byte channel to the client.
pub trait Transport: Send {
    /// Block until at least one byte is available. `Ok(0)` means end of stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Read whatever is available without waiting.
    fn poll_read(&mut self, buf: &mut [u8]) -> io::Result<Poll>;

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// TCP-based transport. The socket flips between blocking and non-blocking
/// mode depending on which read is requested.
pub struct TcpTransport {
    stream: TcpStream,
    nonblocking: bool,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        stream.set_nonblocking(false)?;
        Ok(Self {
            stream,
            nonblocking: false,
        })
    }

    fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        if self.nonblocking != nonblocking {
            self.stream.set_nonblocking(nonblocking)?;
            self.nonblocking = nonblocking;
        }
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.set_nonblocking(false)?;
        loop {
            match self.stream.read(buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    fn poll_read(&mut self, buf: &mut [u8]) -> io::Result<Poll> {
        self.set_nonblocking(true)?;
        match self.stream.read(buf) {
            Ok(0) => Ok(Poll::Closed),
            Ok(n) => Ok(Poll::Data(n)),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(Poll::Empty)
            }
            Err(err) => Err(err),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.set_nonblocking(false)?;
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }
}
