// SPDX-License-Identifier: Apache-2.0
//! Validated moment producers.
//!
//! The mutation engine assumes well-formed input; this module is the
//! boundary where user intent is checked *before* a moment exists. Every
//! producer validates against the current network state and returns
//! `Result<Moment, MomentError>` — once a moment is handed out, applying it
//! (and its reverse) cannot fail.

use aqueduct_geom::{LineString, Point};
use thiserror::Error;

use crate::asset::{Asset, AssetType, Junction, Pipe, Reservoir, Tank};
use crate::ident::AssetId;
use crate::moment::Moment;
use crate::network::Network;

/// Error produced when an intended change fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MomentError {
    /// The referenced asset id does not exist.
    #[error("unknown asset id: {0}")]
    UnknownAsset(AssetId),
    /// The referenced asset exists but is not a node.
    #[error("invalid node id: {0}")]
    NotANode(AssetId),
    /// The referenced asset exists but is not a pipe.
    #[error("invalid pipe id: {0}")]
    NotAPipe(AssetId),
    /// An asset with this id already exists.
    #[error("duplicate asset id: {0}")]
    DuplicateId(AssetId),
}

/// Builds a moment adding a junction at `position`.
///
/// The label is generated from the registry (`J{n}`, skipping taken
/// labels).
///
/// # Errors
///
/// [`MomentError::DuplicateId`] when `id` is already in use.
pub fn add_junction(
    network: &Network,
    id: AssetId,
    position: Point,
    elevation: f64,
    base_demand: f64,
) -> Result<Moment, MomentError> {
    if network.contains(&id) {
        return Err(MomentError::DuplicateId(id));
    }
    let label = network.labels().generate_for(AssetType::Junction);
    let junction = Junction {
        id,
        label,
        position,
        elevation,
        base_demand,
    };
    Ok(Moment::new("add junction").with_put_asset(Asset::Junction(junction)))
}

/// Builds a moment adding a reservoir at `position`.
///
/// # Errors
///
/// [`MomentError::DuplicateId`] when `id` is already in use.
pub fn add_reservoir(
    network: &Network,
    id: AssetId,
    position: Point,
    head: f64,
) -> Result<Moment, MomentError> {
    if network.contains(&id) {
        return Err(MomentError::DuplicateId(id));
    }
    let label = network.labels().generate_for(AssetType::Reservoir);
    let reservoir = Reservoir {
        id,
        label,
        position,
        head,
    };
    Ok(Moment::new("add reservoir").with_put_asset(Asset::Reservoir(reservoir)))
}

/// Builds a moment adding a tank at `position`.
///
/// # Errors
///
/// [`MomentError::DuplicateId`] when `id` is already in use.
#[allow(clippy::too_many_arguments)]
pub fn add_tank(
    network: &Network,
    id: AssetId,
    position: Point,
    elevation: f64,
    initial_level: f64,
    min_level: f64,
    max_level: f64,
    diameter: f64,
) -> Result<Moment, MomentError> {
    if network.contains(&id) {
        return Err(MomentError::DuplicateId(id));
    }
    let label = network.labels().generate_for(AssetType::Tank);
    let tank = Tank {
        id,
        label,
        position,
        elevation,
        initial_level,
        min_level,
        max_level,
        diameter,
    };
    Ok(Moment::new("add tank").with_put_asset(Asset::Tank(tank)))
}

/// Builds a moment adding a pipe between two existing nodes.
///
/// When `vertices` is supplied, its first and last vertex are snapped to
/// the endpoint node coordinates so the spatial connectivity invariant
/// holds; otherwise the pipe runs straight between the nodes.
///
/// # Errors
///
/// [`MomentError::DuplicateId`] when `id` is taken;
/// [`MomentError::UnknownAsset`]/[`MomentError::NotANode`] when an endpoint
/// is missing or is a link.
pub fn add_pipe(
    network: &Network,
    id: AssetId,
    start: AssetId,
    end: AssetId,
    vertices: Option<LineString>,
    diameter: f64,
    roughness: f64,
) -> Result<Moment, MomentError> {
    if network.contains(&id) {
        return Err(MomentError::DuplicateId(id));
    }
    let start_pos = node_position(network, &start)?;
    let end_pos = node_position(network, &end)?;
    let vertices = match vertices {
        Some(v) => v.with_first(start_pos).with_last(end_pos),
        None => LineString::straight(start_pos, end_pos),
    };
    let label = network.labels().generate_for(AssetType::Pipe);
    let pipe = Pipe::new(id, label, vertices, (start, end), diameter, roughness);
    Ok(Moment::new("add pipe").with_put_asset(Asset::Pipe(pipe)))
}

/// Builds a moment moving a node and dragging every incident link endpoint
/// with it, preserving the spatial connectivity invariant.
///
/// # Errors
///
/// [`MomentError::UnknownAsset`] when the node is missing;
/// [`MomentError::NotANode`] when the id names a link.
pub fn move_node(
    network: &Network,
    node_id: &AssetId,
    position: Point,
) -> Result<Moment, MomentError> {
    let node = network
        .asset(node_id)
        .ok_or_else(|| MomentError::UnknownAsset(node_id.clone()))?;
    if !node.is_node() {
        return Err(MomentError::NotANode(node_id.clone()));
    }

    let mut moment = Moment::new("move node").with_put_asset(node.with_position(position));
    // Deterministic link order keeps the produced moment stable.
    let mut incident: Vec<&AssetId> = network.links_at(node_id).collect();
    incident.sort();
    for link_id in incident {
        let Some(link) = network.asset(link_id) else {
            continue;
        };
        let (Some(vertices), Some((start, _))) = (link.vertices(), link.connections()) else {
            continue;
        };
        let mut updated = vertices.clone();
        if start == node_id {
            updated = updated.with_first(position);
        }
        // A self-loop moves both endpoints.
        if link.connections().is_some_and(|(_, e)| e == node_id) {
            updated = updated.with_last(position);
        }
        moment = moment.with_put_asset(link.with_vertices(updated));
    }
    Ok(moment)
}

/// Builds a moment deleting assets, expanded to keep the model consistent:
/// deleting a node cascades to its incident links, and deleting a pipe
/// disconnects the customer points allocated to it (as puts of
/// disconnected copies, so the reverse restores the connections).
///
/// Absent ids are permitted and pass through; the engine treats them as
/// no-ops.
pub fn delete_assets(network: &Network, ids: impl IntoIterator<Item = AssetId>) -> Moment {
    let mut to_delete: Vec<AssetId> = Vec::new();
    for id in ids {
        if to_delete.contains(&id) {
            continue;
        }
        if network.asset(&id).is_some_and(Asset::is_node) {
            let mut incident: Vec<AssetId> = network.links_at(&id).cloned().collect();
            incident.sort();
            for link in incident {
                if !to_delete.contains(&link) {
                    to_delete.push(link);
                }
            }
        }
        to_delete.push(id);
    }

    let mut moment = Moment::new("delete assets");
    for id in &to_delete {
        let is_pipe = network
            .asset(id)
            .is_some_and(|a| a.asset_type() == AssetType::Pipe);
        if is_pipe {
            for point in network.customer_points_for_pipe(id) {
                moment = moment.with_put_customer_point(point.disconnected());
            }
        }
    }
    moment.with_delete_assets(to_delete)
}

fn node_position(network: &Network, id: &AssetId) -> Result<Point, MomentError> {
    let asset = network
        .asset(id)
        .ok_or_else(|| MomentError::UnknownAsset(id.clone()))?;
    asset
        .position()
        .ok_or_else(|| MomentError::NotANode(id.clone()))
}
