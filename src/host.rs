use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use once_cell::sync::Lazy;

/// Address used only to pick the outbound interface; nothing is sent to it.
const PROBE_ADDR: (Ipv4Addr, u16) = (Ipv4Addr::new(192, 0, 2, 1), 9);

static SERVER_IP: Lazy<String> = Lazy::new(|| detect_outbound_ip().unwrap_or_default());

/// IPv4 address of the interface this host uses for outbound traffic, or an
/// empty string when there is none. Detected once per process.
pub fn server_ip() -> &'static str {
    &SERVER_IP
}

fn detect_outbound_ip() -> Option<String> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(PROBE_ADDR).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip.to_string()),
        _ => None,
    }
}
