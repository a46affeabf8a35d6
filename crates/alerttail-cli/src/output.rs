//! Output sinks for alert records.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context as TaskContext, Poll};

use anyhow::{bail, Context, Result};
use tokio::io::AsyncWrite;
use tokio::net::{TcpStream, UdpSocket};

/// Boxed writer handed to the encoder.
pub type OutputWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Where alert records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    /// Appended to, created if missing.
    File(PathBuf),
    Tcp(String),
    /// One datagram per record.
    Udp(String),
}

impl FromStr for OutputTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == "-" {
            return Ok(Self::Stdout);
        }
        let Some((scheme, rest)) = s.split_once("://") else {
            bail!("Invalid output '{s}': expected file://, tcp:// or udp://");
        };
        if rest.is_empty() {
            bail!("Invalid output '{s}': missing path or address");
        }
        match scheme {
            "file" => Ok(Self::File(PathBuf::from(rest))),
            "tcp" => Ok(Self::Tcp(rest.to_string())),
            "udp" => Ok(Self::Udp(rest.to_string())),
            other => bail!("Unsupported output scheme '{other}'"),
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::File(path) => write!(f, "file://{}", path.display()),
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
            Self::Udp(addr) => write!(f, "udp://{addr}"),
        }
    }
}

impl OutputTarget {
    /// Open the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the peer cannot be
    /// reached.
    pub async fn open(&self) -> Result<OutputWriter> {
        let writer: OutputWriter = match self {
            Self::Stdout => Box::new(tokio::io::stdout()),
            Self::File(path) => Box::new(
                tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .with_context(|| format!("Failed to open output file: {}", path.display()))?,
            ),
            Self::Tcp(addr) => Box::new(
                TcpStream::connect(addr.as_str())
                    .await
                    .with_context(|| format!("Failed to connect to tcp://{addr}"))?,
            ),
            Self::Udp(addr) => Box::new(
                UdpSink::connect(addr)
                    .await
                    .with_context(|| format!("Failed to connect to udp://{addr}"))?,
            ),
        };
        tracing::debug!(output = %self, "Output opened");
        Ok(writer)
    }
}

/// Connected UDP socket as an `AsyncWrite`: each write is one datagram.
pub struct UdpSink {
    socket: UdpSocket,
}

impl UdpSink {
    /// Bind an ephemeral local port matching the peer's address family and
    /// connect it to `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if `addr` does not resolve or the socket cannot be
    /// bound or connected.
    pub async fn connect(addr: &str) -> io::Result<Self> {
        let peer = tokio::net::lookup_host(addr).await?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{addr} did not resolve"))
        })?;
        let local = if peer.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;
        Ok(Self { socket })
    }
}

impl AsyncWrite for UdpSink {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.socket.poll_send(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
