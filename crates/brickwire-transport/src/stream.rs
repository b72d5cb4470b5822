use std::fmt;
use std::io::{self, ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use brickwire_codec::{decode_frame, hex, CodecError};

use crate::config::ConnectionConfig;
use crate::error::{Result, TransportError};
use crate::traits::{Connection, SequenceCounter};

/// Opens a fresh byte stream to the brick.
pub type Opener<T> = Box<dyn FnMut() -> io::Result<T> + Send>;

/// [`Connection`] over any blocking `Read + Write` stream.
///
/// Handles partial reads internally: replies are buffered until the length
/// prefix and the whole body have arrived.
pub struct StreamConnection<T> {
    opener: Opener<T>,
    stream: Option<T>,
    buf: BytesMut,
    config: ConnectionConfig,
    sequence: SequenceCounter,
}

impl<T: Read + Write + Send> StreamConnection<T> {
    /// A disconnected connection that calls `opener` on `connect`.
    pub fn new<F>(opener: F) -> Self
    where
        F: FnMut() -> io::Result<T> + Send + 'static,
    {
        Self::with_config(opener, ConnectionConfig::default())
    }

    pub fn with_config<F>(opener: F, config: ConnectionConfig) -> Self
    where
        F: FnMut() -> io::Result<T> + Send + 'static,
    {
        Self {
            opener: Box::new(opener),
            stream: None,
            buf: BytesMut::with_capacity(config.read_chunk_size),
            config,
            sequence: SequenceCounter::new(),
        }
    }

    /// Wrap a stream that is already open. It cannot be reopened after
    /// `disconnect`.
    pub fn from_stream(stream: T) -> Self {
        let mut connection = Self::new(|| {
            Err(io::Error::new(
                ErrorKind::Unsupported,
                "stream was supplied already open and cannot be reopened",
            ))
        });
        connection.stream = Some(stream);
        connection
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Borrow the underlying stream, if connected.
    pub fn get_ref(&self) -> Option<&T> {
        self.stream.as_ref()
    }

    /// Mutably borrow the underlying stream, if connected.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.stream.as_mut()
    }

    /// Consume the connection and return the stream, if connected.
    pub fn into_inner(self) -> Option<T> {
        self.stream
    }

    fn stream_mut(&mut self) -> Result<&mut T> {
        self.stream.as_mut().ok_or(TransportError::NotConnected)
    }
}

impl<T: Read + Write + Send> Connection for StreamConnection<T> {
    fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = (self.opener)()?;
        self.stream = Some(stream);
        self.buf.clear();
        debug!("connected");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            self.buf.clear();
            let flushed = stream.flush();
            drop(stream);
            debug!("disconnected");
            flushed?;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn next_sequence_number(&mut self) -> u16 {
        self.sequence.next_value()
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let stream = self.stream_mut()?;

        let mut offset = 0usize;
        while offset < frame.len() {
            match stream.write(&frame[offset..]) {
                Ok(0) => return Err(TransportError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match stream.flush() {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        debug!(len = frame.len(), "frame written");
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Bytes> {
        let max = self.config.max_reply_size;
        let mut chunk = vec![0u8; self.config.read_chunk_size.max(1)];

        loop {
            match decode_frame(&mut self.buf, max) {
                Ok(Some(body)) => {
                    debug!(len = body.len(), "frame read");
                    trace!(body = %hex(&body), "reply body");
                    return Ok(body);
                }
                Ok(None) => {}
                Err(CodecError::FrameTooLarge { size, max }) => {
                    self.buf.clear();
                    return Err(TransportError::ReplyTooLarge { size, max });
                }
                Err(err) => return Err(err.into()),
            }

            let stream = self.stream_mut()?;
            let read = match stream.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            };

            if read == 0 {
                return Err(TransportError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }
}

impl<T> fmt::Debug for StreamConnection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConnection")
            .field("connected", &self.stream.is_some())
            .field("buffered", &self.buf.len())
            .field("config", &self.config)
            .field("sequence", &self.sequence)
            .finish()
    }
}
