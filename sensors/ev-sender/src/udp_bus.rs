/// CAN-over-UDP gateway bus
/// Each frame becomes one 16-byte datagram in the SocketCAN `can_frame`
/// layout, so a stock gateway (or `candump`-style tooling behind one) can
/// put it on the wire unchanged:
///
/// ```text
/// 0..4   can_id  (u32, little-endian, standard 11-bit id)
/// 4      can_dlc (payload length, 0..=8)
/// 5..8   padding (zero)
/// 8..16  data    (zero-padded)
/// ```
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::time::Duration;

use ev_telemetry::frame::MAX_PAYLOAD;
use ev_telemetry::{BusError, CanBus};
use log::info;

pub const DATAGRAM_LEN: usize = 16;

pub struct UdpCanBus {
    socket: Option<UdpSocket>,
    gateway_addr: String,
    send_timeout: Duration,
}

impl UdpCanBus {
    pub fn new(gateway_addr: &str, send_timeout_ms: u64) -> Self {
        info!("UDP CAN bus created for gateway {}", gateway_addr);

        Self {
            socket: None,
            gateway_addr: gateway_addr.to_string(),
            send_timeout: Duration::from_millis(send_timeout_ms),
        }
    }

    /// Bind a local socket and connect it to the gateway
    pub fn init(&mut self) -> std::io::Result<()> {
        info!("Initializing UDP socket for {}", self.gateway_addr);

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(&self.gateway_addr)?;
        socket.set_write_timeout(Some(self.send_timeout))?;

        self.socket = Some(socket);
        info!("UDP CAN bus ready");

        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.socket.is_some()
    }
}

/// Pack one frame into the gateway datagram layout
pub fn encode_datagram(id: u16, data: &[u8]) -> Result<[u8; DATAGRAM_LEN], BusError> {
    if data.len() > MAX_PAYLOAD {
        return Err(BusError::PayloadTooLong(data.len()));
    }
    let mut buf = [0u8; DATAGRAM_LEN];
    buf[0..4].copy_from_slice(&(id as u32).to_le_bytes());
    buf[4] = data.len() as u8;
    buf[8..8 + data.len()].copy_from_slice(data);
    Ok(buf)
}

impl CanBus for UdpCanBus {
    fn send(&mut self, id: u16, data: &[u8]) -> Result<(), BusError> {
        let datagram = encode_datagram(id, data)?;
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| BusError::Io("UDP socket not initialized".to_string()))?;

        match socket.send(&datagram) {
            Ok(n) if n == DATAGRAM_LEN => Ok(()),
            Ok(n) => Err(BusError::Io(format!("short datagram write: {} bytes", n))),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(BusError::Timeout)
            }
            Err(e) => Err(BusError::Io(e.to_string())),
        }
    }
}
