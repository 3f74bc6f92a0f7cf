//! Feature vector fragmentation into CAN frames
//!
//! ## Wire layout
//!
//! ```text
//! feature k  ->  f32 bits, little-endian, 4 bytes
//! frame j    ->  features 2j and 2j+1 (8 bytes; last frame may be 4)
//!                sent with the domain's j-th identifier (ascending)
//! ```
//!
//! Chunk position is carried only by the identifier, so the receiver
//! concatenates payloads in identifier order and decodes 4-byte groups.
//!
//! A vector needs `4 * n` bytes; a domain can carry `8 * ids` bytes. When
//! that budget is exceeded the [`OverflowPolicy`] decides between refusing
//! the vector and sending a prefix that is explicitly marked truncated.

use log::warn;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::{Frame, MAX_PAYLOAD};
use crate::Domain;

pub const BYTES_PER_FEATURE: usize = 4;
pub const FEATURES_PER_FRAME: usize = MAX_PAYLOAD / BYTES_PER_FEATURE;

/// What to do when a vector does not fit the domain's identifier budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OverflowPolicy {
    /// Refuse with [`FragmentError::EncodingOverflow`]
    Reject,
    /// Send the leading features that fit and report the rest as dropped
    #[default]
    Truncate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    #[error("{domain} vector needs {needed_bytes} bytes but only {capacity_bytes} are provisioned")]
    EncodingOverflow {
        domain: Domain,
        needed_bytes: usize,
        capacity_bytes: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReassemblyError {
    #[error("payload length {0} is not a whole number of features")]
    PartialFeature(usize),
}

/// Ordered frames for one domain and one tick
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    domain: Domain,
    frames: Vec<Frame>,
    carried: usize,
    total: usize,
}

impl FrameSet {
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Frames in ascending identifier order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of features actually encoded
    pub fn carried_features(&self) -> usize {
        self.carried
    }

    /// Features left out because the budget was exhausted
    pub fn dropped_features(&self) -> usize {
        self.total - self.carried
    }

    pub fn is_truncated(&self) -> bool {
        self.carried < self.total
    }
}

/// Byte budget of an identifier list
pub fn capacity_bytes(ids: &[u16]) -> usize {
    ids.len() * MAX_PAYLOAD
}

/// Frames needed to carry `feature_count` features without truncation
pub fn frames_required(feature_count: usize) -> usize {
    feature_count.div_ceil(FEATURES_PER_FRAME)
}

/// Little-endian byte image of a feature vector
pub fn encode_features(features: &[f32]) -> Vec<u8> {
    features.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Split `features` into frames addressed by `ids`
///
/// `ids` must be ascending; the configuration layer guarantees this.
pub fn fragment(
    domain: Domain,
    features: &[f32],
    ids: &[u16],
    policy: OverflowPolicy,
) -> Result<FrameSet, FragmentError> {
    let needed_bytes = features.len() * BYTES_PER_FEATURE;
    let capacity = capacity_bytes(ids);

    let carried = if needed_bytes <= capacity {
        features.len()
    } else {
        match policy {
            OverflowPolicy::Reject => {
                return Err(FragmentError::EncodingOverflow {
                    domain,
                    needed_bytes,
                    capacity_bytes: capacity,
                })
            }
            OverflowPolicy::Truncate => {
                let fit = capacity / BYTES_PER_FEATURE;
                warn!(
                    "{} vector truncated: {} of {} features fit in {} frames",
                    domain,
                    fit,
                    features.len(),
                    ids.len()
                );
                fit
            }
        }
    };

    let bytes = encode_features(&features[..carried]);
    let frames = bytes
        .chunks(MAX_PAYLOAD)
        .zip(ids)
        .map(|(chunk, &id)| Frame::from_chunk(id, chunk))
        .collect();

    Ok(FrameSet {
        domain,
        frames,
        carried,
        total: features.len(),
    })
}

/// Rebuild a feature vector from one domain's frames
///
/// Frames may arrive in any order; payloads are joined in ascending
/// identifier order, matching how they were fragmented.
pub fn reassemble(frames: &[Frame]) -> Result<Vec<f32>, ReassemblyError> {
    let mut ordered: Vec<&Frame> = frames.iter().collect();
    ordered.sort_by_key(|f| f.id());

    let bytes: Vec<u8> = ordered
        .iter()
        .flat_map(|f| f.payload().iter().copied())
        .collect();

    if bytes.len() % BYTES_PER_FEATURE != 0 {
        return Err(ReassemblyError::PartialFeature(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(BYTES_PER_FEATURE)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
