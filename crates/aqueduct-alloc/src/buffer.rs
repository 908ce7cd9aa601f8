// SPDX-License-Identifier: Apache-2.0
//! Packed network buffers for the parallel allocation path.
//!
//! Geometry is serialized once into two flat byte buffers so worker
//! threads can share a single copy:
//!
//! - **Segments buffer**: header `{segment_count: u32, reserved: u32}`
//!   followed by one 36-byte record per segment,
//!   `{pipe_slot: u32, x0: f64, y0: f64, x1: f64, y1: f64}`,
//!   little-endian throughout. Records are deliberately unaligned
//!   (f64 at byte offset 4) so readers decode fields individually.
//! - **Nodes buffer**: header `{node_count: u32, reserved: u32}`
//!   followed by one 24-byte [`NodeRow`] per node.
//!
//! String ids stay out of the hot buffers; dense slots index side
//! tables carried next to them in [`PackedNetwork`].

use aqueduct_geom::{Point, Segment};
use aqueduct_model::{AssetId, Network};
use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::source::{AllocationSource, NetworkSource, NodeKind};

/// Bytes before the first record in either buffer.
pub const HEADER_BYTES: usize = 8;
/// Bytes per segment record.
pub const SEGMENT_RECORD_BYTES: usize = 36;
/// Bytes per node record.
pub const NODE_RECORD_BYTES: usize = std::mem::size_of::<NodeRow>();

const KIND_JUNCTION: u32 = 0;
const KIND_RESERVOIR: u32 = 1;
const KIND_TANK: u32 = 2;

/// Errors raised while validating packed buffers.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Buffer is shorter than its fixed header.
    #[error("{name} buffer too small: {size} bytes, minimum {minimum}")]
    TooSmall {
        /// Buffer name for diagnostics.
        name: &'static str,
        /// Actual buffer size.
        size: usize,
        /// Minimum required size.
        minimum: usize,
    },

    /// Header count does not fit the bytes that follow it.
    #[error("{name} buffer truncated: {count} records need {needed} bytes, {available} available")]
    Truncated {
        /// Buffer name.
        name: &'static str,
        /// Record count from the header.
        count: u32,
        /// Bytes the records require.
        needed: usize,
        /// Bytes actually present after the header.
        available: usize,
    },

    /// Record index past the header count.
    #[error("{name} record {index} out of bounds, buffer holds {count}")]
    RecordOutOfBounds {
        /// Buffer name.
        name: &'static str,
        /// Requested record index.
        index: u32,
        /// Number of records in the buffer.
        count: u32,
    },

    /// Segment record references a pipe slot past the side tables.
    #[error("segment {index} references pipe slot {slot}, side table holds {pipes}")]
    PipeSlotOutOfBounds {
        /// Segment record index.
        index: u32,
        /// Referenced pipe slot.
        slot: u32,
        /// Pipe side-table length.
        pipes: usize,
    },

    /// Pipe endpoint slot past the node buffer.
    #[error("pipe {slot} endpoint references node {node}, buffer holds {nodes}")]
    NodeSlotOutOfBounds {
        /// Pipe slot.
        slot: u32,
        /// Referenced node slot.
        node: u32,
        /// Node record count.
        nodes: u32,
    },

    /// Node record carries an unknown kind code.
    #[error("node {index} has invalid kind code {kind}")]
    InvalidNodeKind {
        /// Node record index.
        index: u32,
        /// The unrecognized code.
        kind: u32,
    },

    /// Side table length disagrees with the buffer headers.
    #[error("{name} side table has {actual} entries, buffers expect {expected}")]
    SideTableMismatch {
        /// Side table name.
        name: &'static str,
        /// Entries the buffer headers imply.
        expected: usize,
        /// Entries actually present.
        actual: usize,
    },
}

/// Fixed-width node record.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct NodeRow {
    /// X coordinate, meters.
    pub x: f64,
    /// Y coordinate, meters.
    pub y: f64,
    /// Role code: 0 junction, 1 reservoir, 2 tank.
    pub kind: u32,
    /// The record's own slot, for cross-checking.
    pub slot: u32,
}

const _: () = assert!(std::mem::size_of::<NodeRow>() == 24);

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_f64(bytes: &[u8], offset: usize) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    f64::from_le_bytes(raw)
}

fn checked_count(
    buffer: &[u8],
    record_bytes: usize,
    name: &'static str,
) -> Result<u32, BufferError> {
    if buffer.len() < HEADER_BYTES {
        return Err(BufferError::TooSmall {
            name,
            size: buffer.len(),
            minimum: HEADER_BYTES,
        });
    }
    let count = read_u32(buffer, 0);
    let needed = (count as usize).saturating_mul(record_bytes);
    let available = buffer.len() - HEADER_BYTES;
    if needed > available {
        return Err(BufferError::Truncated {
            name,
            count,
            needed,
            available,
        });
    }
    Ok(count)
}

/// Record count from a segments buffer header.
pub fn segment_count(buffer: &[u8]) -> Result<u32, BufferError> {
    checked_count(buffer, SEGMENT_RECORD_BYTES, "segments")
}

fn segment_offset(index: u32) -> usize {
    HEADER_BYTES + index as usize * SEGMENT_RECORD_BYTES
}

/// Decodes the geometry of segment record `index`.
pub fn segment_coordinates(buffer: &[u8], index: u32) -> Result<Segment, BufferError> {
    let count = segment_count(buffer)?;
    if index >= count {
        return Err(BufferError::RecordOutOfBounds {
            name: "segments",
            index,
            count,
        });
    }
    let offset = segment_offset(index);
    Ok(Segment {
        start: Point::new(read_f64(buffer, offset + 4), read_f64(buffer, offset + 12)),
        end: Point::new(read_f64(buffer, offset + 20), read_f64(buffer, offset + 28)),
    })
}

/// Decodes the owning pipe slot of segment record `index`.
pub fn segment_pipe_index(buffer: &[u8], index: u32) -> Result<u32, BufferError> {
    let count = segment_count(buffer)?;
    if index >= count {
        return Err(BufferError::RecordOutOfBounds {
            name: "segments",
            index,
            count,
        });
    }
    Ok(read_u32(buffer, segment_offset(index)))
}

fn pack_segments<S: AllocationSource>(source: &S) -> Vec<u8> {
    let count = source.segment_count();
    let mut out = Vec::with_capacity(HEADER_BYTES + count as usize * SEGMENT_RECORD_BYTES);
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    for slot in 0..count {
        let segment = source.segment(slot);
        out.extend_from_slice(&source.segment_pipe(slot).to_le_bytes());
        for value in [
            segment.start.x,
            segment.start.y,
            segment.end.x,
            segment.end.y,
        ] {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    out
}

fn pack_nodes<S: AllocationSource>(source: &S, node_count: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_BYTES + node_count as usize * NODE_RECORD_BYTES);
    out.extend_from_slice(&node_count.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    for slot in 0..node_count {
        let position = source.node_position(slot);
        let kind = match source.node_kind(slot) {
            NodeKind::Junction => KIND_JUNCTION,
            NodeKind::Reservoir => KIND_RESERVOIR,
            NodeKind::Tank => KIND_TANK,
        };
        let row = NodeRow {
            x: position.x,
            y: position.y,
            kind,
            slot,
        };
        out.extend_from_slice(bytemuck::bytes_of(&row));
    }
    out
}

/// A network snapshot serialized for cross-thread sharing: two flat
/// byte buffers plus the slot-to-id side tables the hot loop never
/// touches.
#[derive(Debug, Clone)]
pub struct PackedNetwork {
    /// Segments buffer.
    pub segments: Vec<u8>,
    /// Nodes buffer.
    pub nodes: Vec<u8>,
    /// Pipe slot to original id.
    pub pipe_ids: Vec<AssetId>,
    /// Pipe slot to diameter.
    pub pipe_diameters: Vec<f64>,
    /// Pipe slot to endpoint node slots.
    pub pipe_endpoints: Vec<(u32, u32)>,
    /// Node slot to original id.
    pub node_ids: Vec<AssetId>,
}

impl PackedNetwork {
    /// Serializes `network` into packed form.
    #[must_use]
    pub fn pack(network: &Network) -> Self {
        let source = NetworkSource::from_network(network);
        let mut pipe_ids = Vec::new();
        let mut pipe_diameters = Vec::new();
        let mut pipe_endpoints = Vec::new();
        for pipe in 0..source.pipe_count() {
            pipe_ids.push(source.pipe_id(pipe).clone());
            pipe_diameters.push(source.pipe_diameter(pipe));
            pipe_endpoints.push(source.pipe_endpoints(pipe));
        }
        let node_count = source.node_count();
        let mut node_ids = Vec::with_capacity(node_count as usize);
        for slot in 0..node_count {
            node_ids.push(source.node_id(slot).clone());
        }
        Self {
            segments: pack_segments(&source),
            nodes: pack_nodes(&source, node_count),
            pipe_ids,
            pipe_diameters,
            pipe_endpoints,
            node_ids,
        }
    }

    /// Validates the buffers and side tables, returning a read view
    /// whose accessors are infallible.
    pub fn source(&self) -> Result<PackedSource<'_>, BufferError> {
        let segments = segment_count(&self.segments)?;
        let nodes = checked_count(&self.nodes, NODE_RECORD_BYTES, "nodes")?;

        for (name, actual) in [
            ("pipe_ids", self.pipe_ids.len()),
            ("pipe_diameters", self.pipe_diameters.len()),
            ("pipe_endpoints", self.pipe_endpoints.len()),
        ] {
            if actual != self.pipe_ids.len() {
                return Err(BufferError::SideTableMismatch {
                    name,
                    expected: self.pipe_ids.len(),
                    actual,
                });
            }
        }
        if self.node_ids.len() != nodes as usize {
            return Err(BufferError::SideTableMismatch {
                name: "node_ids",
                expected: nodes as usize,
                actual: self.node_ids.len(),
            });
        }

        for index in 0..segments {
            let slot = read_u32(&self.segments, segment_offset(index));
            if slot as usize >= self.pipe_ids.len() {
                return Err(BufferError::PipeSlotOutOfBounds {
                    index,
                    slot,
                    pipes: self.pipe_ids.len(),
                });
            }
        }
        #[allow(clippy::cast_possible_truncation)]
        for (pipe, &(start, end)) in self.pipe_endpoints.iter().enumerate() {
            if start >= nodes || end >= nodes {
                return Err(BufferError::NodeSlotOutOfBounds {
                    slot: pipe as u32,
                    node: start.max(end),
                    nodes,
                });
            }
        }

        let mut node_rows = Vec::with_capacity(nodes as usize);
        for index in 0..nodes {
            let offset = HEADER_BYTES + index as usize * NODE_RECORD_BYTES;
            let row: NodeRow =
                bytemuck::pod_read_unaligned(&self.nodes[offset..offset + NODE_RECORD_BYTES]);
            if row.kind > KIND_TANK {
                return Err(BufferError::InvalidNodeKind {
                    index,
                    kind: row.kind,
                });
            }
            node_rows.push(row);
        }

        Ok(PackedSource {
            segments: &self.segments,
            segment_total: segments,
            pipe_ids: &self.pipe_ids,
            pipe_diameters: &self.pipe_diameters,
            pipe_endpoints: &self.pipe_endpoints,
            node_ids: &self.node_ids,
            node_rows,
        })
    }
}

/// Validated read view over a [`PackedNetwork`].
#[derive(Debug)]
pub struct PackedSource<'a> {
    segments: &'a [u8],
    segment_total: u32,
    pipe_ids: &'a [AssetId],
    pipe_diameters: &'a [f64],
    pipe_endpoints: &'a [(u32, u32)],
    node_ids: &'a [AssetId],
    node_rows: Vec<NodeRow>,
}

impl AllocationSource for PackedSource<'_> {
    fn segment_count(&self) -> u32 {
        self.segment_total
    }

    fn segment(&self, slot: u32) -> Segment {
        let offset = segment_offset(slot);
        Segment {
            start: Point::new(
                read_f64(self.segments, offset + 4),
                read_f64(self.segments, offset + 12),
            ),
            end: Point::new(
                read_f64(self.segments, offset + 20),
                read_f64(self.segments, offset + 28),
            ),
        }
    }

    fn segment_pipe(&self, slot: u32) -> u32 {
        read_u32(self.segments, segment_offset(slot))
    }

    fn pipe_diameter(&self, pipe: u32) -> f64 {
        self.pipe_diameters[pipe as usize]
    }

    fn pipe_id(&self, pipe: u32) -> &AssetId {
        &self.pipe_ids[pipe as usize]
    }

    fn pipe_endpoints(&self, pipe: u32) -> (u32, u32) {
        self.pipe_endpoints[pipe as usize]
    }

    fn node_kind(&self, slot: u32) -> NodeKind {
        match self.node_rows[slot as usize].kind {
            KIND_RESERVOIR => NodeKind::Reservoir,
            KIND_TANK => NodeKind::Tank,
            _ => NodeKind::Junction,
        }
    }

    fn node_position(&self, slot: u32) -> Point {
        let row = &self.node_rows[slot as usize];
        Point::new(row.x, row.y)
    }

    fn node_id(&self, slot: u32) -> &AssetId {
        &self.node_ids[slot as usize]
    }
}
