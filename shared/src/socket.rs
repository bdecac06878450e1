//! TCP tuning applied to both ends of a game connection

use socket2::SockRef;
use tokio::net::TcpStream;

/// Disables Nagle's algorithm and turns on keepalive probes
pub fn configure_stream(stream: &TcpStream) -> std::io::Result<()> {
    stream.set_nodelay(true)?;
    SockRef::from(stream).set_keepalive(true)
}
