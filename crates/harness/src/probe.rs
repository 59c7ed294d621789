//! TCP readiness probe

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::trace;

/// Checks whether a TCP endpoint accepts connections.
///
/// The answer is binary: refused, timed out, unreachable and unresolvable all
/// read as "not in use". Retrying is the caller's business.
#[derive(Debug, Clone, Copy)]
pub struct PortProbe {
    timeout: Duration,
}

impl Default for PortProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl PortProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True iff a connection to `host:port` is accepted within the timeout
    pub fn in_use(&self, host: &str, port: u16) -> bool {
        match (host, port).to_socket_addrs() {
            Ok(addrs) => self.connect_any(addrs),
            Err(e) => {
                trace!("Cannot resolve {}:{}: {}", host, port, e);
                false
            }
        }
    }

    /// Try each address in turn. The timeout bounds the whole call, not
    /// each address, so `localhost` resolving to `::1` and `127.0.0.1`
    /// still costs at most one timeout.
    fn connect_any(&self, addrs: impl IntoIterator<Item = SocketAddr>) -> bool {
        let deadline = Instant::now() + self.timeout;

        for addr in addrs {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                trace!("Probe timeout spent before trying {}", addr);
                break;
            }
            match TcpStream::connect_timeout(&addr, remaining) {
                // Dropping the stream closes the socket.
                Ok(_stream) => return true,
                Err(e) => trace!("Probe of {} failed: {}", addr, e),
            }
        }

        false
    }
}
