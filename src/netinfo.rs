//! Discovery of the address remote devices should post to.

use std::net::{IpAddr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::warn;

/// Learn the local-facing IP by "connecting" a UDP socket towards `probe`.
/// No datagram is sent; the kernel only picks a route and source address.
pub async fn local_ip(probe: &str) -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
    socket.connect(probe).await?;
    Ok(socket.local_addr()?.ip())
}

/// URL a device should use for `POST /log`. Falls back to the bound address
/// when route discovery fails (e.g. no network).
pub async fn ingest_endpoint(probe: &str, bound: SocketAddr) -> String {
    let ip = match local_ip(probe).await {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(_) => bound.ip(),
        Err(err) => {
            warn!(error = %err, probe, "could not determine local address");
            bound.ip()
        }
    };
    format!("http://{}/log", SocketAddr::new(ip, bound.port()))
}
