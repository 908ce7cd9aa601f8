// SPDX-License-Identifier: Apache-2.0
//! Network asset types.
//!
//! An [`Asset`] is one typed element of the network graph: a node
//! (junction, reservoir, tank) carrying a [`Point`], or a link (pipe, pump,
//! valve) carrying a [`LineString`] plus its endpoint connections.
//!
//! Assets are immutable value snapshots. Mutation clones the asset, edits
//! the clone, and swaps the map entry through a moment; an asset referenced
//! from undo history is never edited in place.
//!
//! Invariants
//! - A link's first/last vertex equals its start/end node's coordinate
//!   (spatial connectivity). Moment producers enforce this on every
//!   coordinate edit; the mutation engine assumes it.
//! - `length` on a link is derived from its vertices and recomputed by
//!   every vertex-editing constructor.

use aqueduct_curve::PumpDefinition;
use aqueduct_geom::{LineString, Point};

use crate::ident::AssetId;

/// The six concrete asset kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssetType {
    /// Demand node.
    Junction,
    /// Conveyance link between two nodes.
    Pipe,
    /// Head-adding link.
    Pump,
    /// Flow/pressure control link.
    Valve,
    /// Infinite-source node with fixed head.
    Reservoir,
    /// Storage node with level bounds.
    Tank,
}

impl AssetType {
    /// Prefix used when generating labels of this type.
    #[must_use]
    pub fn label_prefix(self) -> &'static str {
        match self {
            Self::Junction => "J",
            Self::Pipe => "P",
            Self::Pump => "PU",
            Self::Valve => "V",
            Self::Reservoir => "R",
            Self::Tank => "T",
        }
    }

    /// Whether assets of this type are links (carry connections).
    #[must_use]
    pub fn is_link(self) -> bool {
        matches!(self, Self::Pipe | Self::Pump | Self::Valve)
    }

    /// Whether assets of this type are nodes.
    #[must_use]
    pub fn is_node(self) -> bool {
        !self.is_link()
    }
}

/// Valve behavior kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValveKind {
    /// Pressure reducing valve.
    Prv,
    /// Pressure sustaining valve.
    Psv,
    /// Flow control valve.
    Fcv,
    /// Throttle control valve.
    Tcv,
}

/// A demand node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Junction {
    /// Stable identifier.
    pub id: AssetId,
    /// Human-readable label, unique among junctions at commit time.
    pub label: String,
    /// Node coordinate.
    pub position: Point,
    /// Ground elevation, meters.
    pub elevation: f64,
    /// Base demand at this node.
    pub base_demand: f64,
}

/// A conveyance link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pipe {
    /// Stable identifier.
    pub id: AssetId,
    /// Human-readable label, unique among pipes at commit time.
    pub label: String,
    /// Link geometry; endpoints coincide with the endpoint nodes.
    pub vertices: LineString,
    /// Start and end node ids.
    pub connections: (AssetId, AssetId),
    /// Internal diameter, millimeters.
    pub diameter: f64,
    /// Roughness coefficient.
    pub roughness: f64,
    /// Derived polyline length, meters. Recomputed on vertex edits.
    pub length: f64,
}

/// A head-adding link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pump {
    /// Stable identifier.
    pub id: AssetId,
    /// Human-readable label, unique among pumps at commit time.
    pub label: String,
    /// Link geometry; endpoints coincide with the endpoint nodes.
    pub vertices: LineString,
    /// Start and end node ids.
    pub connections: (AssetId, AssetId),
    /// Performance curve definition.
    pub definition: PumpDefinition,
    /// Derived polyline length, meters.
    pub length: f64,
}

/// A control link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Valve {
    /// Stable identifier.
    pub id: AssetId,
    /// Human-readable label, unique among valves at commit time.
    pub label: String,
    /// Link geometry; endpoints coincide with the endpoint nodes.
    pub vertices: LineString,
    /// Start and end node ids.
    pub connections: (AssetId, AssetId),
    /// Internal diameter, millimeters.
    pub diameter: f64,
    /// Valve behavior.
    pub kind: ValveKind,
    /// Derived polyline length, meters.
    pub length: f64,
}

/// An infinite source node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reservoir {
    /// Stable identifier.
    pub id: AssetId,
    /// Human-readable label, unique among reservoirs at commit time.
    pub label: String,
    /// Node coordinate.
    pub position: Point,
    /// Fixed hydraulic head, meters.
    pub head: f64,
}

/// A storage node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tank {
    /// Stable identifier.
    pub id: AssetId,
    /// Human-readable label, unique among tanks at commit time.
    pub label: String,
    /// Node coordinate.
    pub position: Point,
    /// Bottom elevation, meters.
    pub elevation: f64,
    /// Initial water level above the bottom, meters.
    pub initial_level: f64,
    /// Minimum level, meters.
    pub min_level: f64,
    /// Maximum level, meters.
    pub max_level: f64,
    /// Tank diameter, meters.
    pub diameter: f64,
}

/// A network asset: tagged union over the six concrete kinds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Asset {
    /// Demand node.
    Junction(Junction),
    /// Conveyance link.
    Pipe(Pipe),
    /// Head-adding link.
    Pump(Pump),
    /// Control link.
    Valve(Valve),
    /// Infinite source node.
    Reservoir(Reservoir),
    /// Storage node.
    Tank(Tank),
}

impl Asset {
    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> &AssetId {
        match self {
            Self::Junction(a) => &a.id,
            Self::Pipe(a) => &a.id,
            Self::Pump(a) => &a.id,
            Self::Valve(a) => &a.id,
            Self::Reservoir(a) => &a.id,
            Self::Tank(a) => &a.id,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Junction(a) => &a.label,
            Self::Pipe(a) => &a.label,
            Self::Pump(a) => &a.label,
            Self::Valve(a) => &a.label,
            Self::Reservoir(a) => &a.label,
            Self::Tank(a) => &a.label,
        }
    }

    /// The asset's kind tag.
    #[must_use]
    pub fn asset_type(&self) -> AssetType {
        match self {
            Self::Junction(_) => AssetType::Junction,
            Self::Pipe(_) => AssetType::Pipe,
            Self::Pump(_) => AssetType::Pump,
            Self::Valve(_) => AssetType::Valve,
            Self::Reservoir(_) => AssetType::Reservoir,
            Self::Tank(_) => AssetType::Tank,
        }
    }

    /// Whether the asset is a link.
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.asset_type().is_link()
    }

    /// Whether the asset is a node.
    #[must_use]
    pub fn is_node(&self) -> bool {
        self.asset_type().is_node()
    }

    /// Node coordinate, when the asset is a node.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Junction(a) => Some(a.position),
            Self::Reservoir(a) => Some(a.position),
            Self::Tank(a) => Some(a.position),
            Self::Pipe(_) | Self::Pump(_) | Self::Valve(_) => None,
        }
    }

    /// Link geometry, when the asset is a link.
    #[must_use]
    pub fn vertices(&self) -> Option<&LineString> {
        match self {
            Self::Pipe(a) => Some(&a.vertices),
            Self::Pump(a) => Some(&a.vertices),
            Self::Valve(a) => Some(&a.vertices),
            Self::Junction(_) | Self::Reservoir(_) | Self::Tank(_) => None,
        }
    }

    /// Endpoint node ids, when the asset is a link.
    #[must_use]
    pub fn connections(&self) -> Option<(&AssetId, &AssetId)> {
        match self {
            Self::Pipe(a) => Some((&a.connections.0, &a.connections.1)),
            Self::Pump(a) => Some((&a.connections.0, &a.connections.1)),
            Self::Valve(a) => Some((&a.connections.0, &a.connections.1)),
            Self::Junction(_) | Self::Reservoir(_) | Self::Tank(_) => None,
        }
    }

    /// Internal diameter, when the asset carries one (pipes and valves).
    #[must_use]
    pub fn diameter(&self) -> Option<f64> {
        match self {
            Self::Pipe(a) => Some(a.diameter),
            Self::Valve(a) => Some(a.diameter),
            Self::Junction(_) | Self::Pump(_) | Self::Reservoir(_) | Self::Tank(_) => None,
        }
    }

    /// Derived link length, when the asset is a link.
    #[must_use]
    pub fn length(&self) -> Option<f64> {
        match self {
            Self::Pipe(a) => Some(a.length),
            Self::Pump(a) => Some(a.length),
            Self::Valve(a) => Some(a.length),
            Self::Junction(_) | Self::Reservoir(_) | Self::Tank(_) => None,
        }
    }

    /// Returns a copy with the label replaced.
    #[must_use]
    pub fn with_label(&self, label: impl Into<String>) -> Self {
        let mut copy = self.clone();
        let label = label.into();
        match &mut copy {
            Self::Junction(a) => a.label = label,
            Self::Pipe(a) => a.label = label,
            Self::Pump(a) => a.label = label,
            Self::Valve(a) => a.label = label,
            Self::Reservoir(a) => a.label = label,
            Self::Tank(a) => a.label = label,
        }
        copy
    }

    /// Returns a copy of a node with its coordinate replaced.
    ///
    /// Links are returned unchanged; their geometry moves through
    /// [`with_vertices`](Self::with_vertices).
    #[must_use]
    pub fn with_position(&self, position: Point) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            Self::Junction(a) => a.position = position,
            Self::Reservoir(a) => a.position = position,
            Self::Tank(a) => a.position = position,
            Self::Pipe(_) | Self::Pump(_) | Self::Valve(_) => {}
        }
        copy
    }

    /// Returns a copy of a link with its geometry replaced and `length`
    /// recomputed. Nodes are returned unchanged.
    #[must_use]
    pub fn with_vertices(&self, vertices: LineString) -> Self {
        let mut copy = self.clone();
        let length = vertices.length();
        match &mut copy {
            Self::Pipe(a) => {
                a.vertices = vertices;
                a.length = length;
            }
            Self::Pump(a) => {
                a.vertices = vertices;
                a.length = length;
            }
            Self::Valve(a) => {
                a.vertices = vertices;
                a.length = length;
            }
            Self::Junction(_) | Self::Reservoir(_) | Self::Tank(_) => {}
        }
        copy
    }
}

impl Pipe {
    /// Creates a pipe; `length` is derived from `vertices`.
    #[must_use]
    pub fn new(
        id: AssetId,
        label: impl Into<String>,
        vertices: LineString,
        connections: (AssetId, AssetId),
        diameter: f64,
        roughness: f64,
    ) -> Self {
        let length = vertices.length();
        Self {
            id,
            label: label.into(),
            vertices,
            connections,
            diameter,
            roughness,
            length,
        }
    }
}

impl Pump {
    /// Creates a pump; `length` is derived from `vertices`.
    #[must_use]
    pub fn new(
        id: AssetId,
        label: impl Into<String>,
        vertices: LineString,
        connections: (AssetId, AssetId),
        definition: PumpDefinition,
    ) -> Self {
        let length = vertices.length();
        Self {
            id,
            label: label.into(),
            vertices,
            connections,
            definition,
            length,
        }
    }
}

impl Valve {
    /// Creates a valve; `length` is derived from `vertices`.
    #[must_use]
    pub fn new(
        id: AssetId,
        label: impl Into<String>,
        vertices: LineString,
        connections: (AssetId, AssetId),
        diameter: f64,
        kind: ValveKind,
    ) -> Self {
        let length = vertices.length();
        Self {
            id,
            label: label.into(),
            vertices,
            connections,
            diameter,
            kind,
            length,
        }
    }
}
