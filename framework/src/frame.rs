/// CAN frames and the bus send primitive
///
/// The bus controller itself (wiring, bit timing, controller init) lives
/// outside this crate. All the pipeline needs is `send(id, bytes)` and a
/// success/failure answer.
use thiserror::Error;

/// Per-frame payload capacity of a classic CAN frame
pub const MAX_PAYLOAD: usize = 8;

/// Highest 11-bit standard identifier
pub const MAX_STANDARD_ID: u16 = 0x7FF;

/// One addressed unit of bus transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    id: u16,
    len: u8,
    data: [u8; MAX_PAYLOAD],
}

impl Frame {
    pub fn new(id: u16, payload: &[u8]) -> Result<Self, BusError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(BusError::PayloadTooLong(payload.len()));
        }
        let mut data = [0u8; MAX_PAYLOAD];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id,
            len: payload.len() as u8,
            data,
        })
    }

    // Callers pass chunks produced by `chunks(MAX_PAYLOAD)`
    pub(crate) fn from_chunk(id: u16, chunk: &[u8]) -> Self {
        let len = chunk.len().min(MAX_PAYLOAD);
        let mut data = [0u8; MAX_PAYLOAD];
        data[..len].copy_from_slice(&chunk[..len]);
        Self {
            id,
            len: len as u8,
            data,
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Bus-level send failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("arbitration lost")]
    ArbitrationLost,
    #[error("controller is bus-off")]
    BusOff,
    #[error("send timed out")]
    Timeout,
    #[error("payload of {0} bytes exceeds frame capacity")]
    PayloadTooLong(usize),
    #[error("bus i/o error: {0}")]
    Io(String),
}

/// Abstraction for the shared bus
/// Implementations: CAN controller drivers, UDP gateways, in-memory recorders
pub trait CanBus {
    /// Hand one frame to the bus. Implementations must not block
    /// indefinitely; a stalled link reports [`BusError::Timeout`].
    fn send(&mut self, id: u16, data: &[u8]) -> Result<(), BusError>;
}

impl<B: CanBus + ?Sized> CanBus for &mut B {
    fn send(&mut self, id: u16, data: &[u8]) -> Result<(), BusError> {
        (**self).send(id, data)
    }
}

/// In-memory bus that records every accepted frame
///
/// Failures can be scripted per identifier or for the next N sends, which
/// is enough to exercise retry and skip behaviour in tests and simulations.
#[derive(Debug, Default)]
pub struct RecordingBus {
    frames: Vec<Frame>,
    attempts: usize,
    fail_next: usize,
    fail_ids: Vec<u16>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` sends with `ArbitrationLost`
    pub fn fail_next(&mut self, count: usize) {
        self.fail_next = count;
    }

    /// Reject every send to `id` with `BusOff`
    pub fn fail_id(&mut self, id: u16) {
        self.fail_ids.push(id);
    }

    pub fn clear_failures(&mut self) {
        self.fail_next = 0;
        self.fail_ids.clear();
    }

    /// Frames accepted so far, in send order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Total send calls, including rejected ones
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Take the recorded frames, leaving the recorder empty
    pub fn drain(&mut self) -> Vec<Frame> {
        core::mem::take(&mut self.frames)
    }
}

impl CanBus for RecordingBus {
    fn send(&mut self, id: u16, data: &[u8]) -> Result<(), BusError> {
        self.attempts += 1;
        if self.fail_ids.contains(&id) {
            return Err(BusError::BusOff);
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(BusError::ArbitrationLost);
        }
        self.frames.push(Frame::new(id, data)?);
        Ok(())
    }
}
