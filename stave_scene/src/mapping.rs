// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Position mapping between scene nodes.
//!
//! [`map_between`] and friends work in logical space: a flowable's children are treated as
//! if the flowable were one infinitely long line. Use [`canvas_pos_of`] for positions after
//! line wrapping.

use std::collections::HashSet;

use stave_units::{Point, Unit};

use crate::{NodeId, NodeRole, Scene, SceneError};

/// The position of `dst` relative to `src`.
///
/// Common relationships (identity, siblings, direct parent or child) are answered without
/// walking the tree. Otherwise the lowest common ancestor is found through `src`'s ancestor
/// set.
pub fn map_between(scene: &Scene, src: NodeId, dst: NodeId) -> Result<Point, SceneError> {
    let src_node = scene.node(src)?;
    if src == dst {
        return Ok(Point::ORIGIN);
    }
    let dst_node = scene.node(dst)?;
    if src_node.parent.is_some() && src_node.parent == dst_node.parent {
        return Ok(dst_node.local.pos - src_node.local.pos);
    }
    if dst_node.parent == Some(src) {
        return Ok(dst_node.local.pos);
    }
    if src_node.parent == Some(dst) {
        return Ok(-src_node.local.pos);
    }

    let mut src_ancestors: HashSet<NodeId> = scene.ancestors(src)?.into_iter().collect();
    src_ancestors.insert(src);

    let mut dst_offset = Point::ORIGIN;
    let mut current = dst;
    let common = loop {
        if src_ancestors.contains(&current) {
            break current;
        }
        let node = scene.node(current)?;
        dst_offset += node.local.pos;
        current = node
            .parent
            .ok_or(SceneError::NoCommonAncestor { src, dst })?;
    };
    let src_offset = descendant_pos(scene, src, common)?;
    Ok(dst_offset - src_offset)
}

/// The x position of `dst` relative to `src`.
pub fn map_between_x(scene: &Scene, src: NodeId, dst: NodeId) -> Result<Unit, SceneError> {
    Ok(map_between(scene, src, dst)?.x)
}

/// The position of `descendant` relative to its ancestor `ancestor`.
///
/// Fails with [`SceneError::NotAnAncestor`] if `ancestor` is not on `descendant`'s ancestor
/// chain. A node is its own ancestor at the origin.
pub fn descendant_pos(
    scene: &Scene,
    descendant: NodeId,
    ancestor: NodeId,
) -> Result<Point, SceneError> {
    scene.node(ancestor)?;
    let mut pos = Point::ORIGIN;
    let mut current = descendant;
    while current != ancestor {
        let node = scene.node(current)?;
        pos += node.local.pos;
        current = node.parent.ok_or(SceneError::NotAnAncestor {
            node: descendant,
            ancestor,
        })?;
    }
    Ok(pos)
}

/// The x position of `descendant` relative to its ancestor `ancestor`.
pub fn descendant_pos_x(
    scene: &Scene,
    descendant: NodeId,
    ancestor: NodeId,
) -> Result<Unit, SceneError> {
    Ok(descendant_pos(scene, descendant, ancestor)?.x)
}

/// The canvas position of `id`.
///
/// Positions are summed upward until a flowable ancestor is reached, which then places
/// the accumulated flowable-space point on its laid-out lines. Without a flowable ancestor
/// the sum up to the root is the canvas position.
pub fn canvas_pos_of(scene: &Scene, id: NodeId) -> Result<Point, SceneError> {
    let mut pos = Point::ORIGIN;
    let mut current = id;
    loop {
        let node = scene.node(current)?;
        if current != id && node.role == NodeRole::Flowable {
            return scene.flowable(current)?.map_to_canvas(pos);
        }
        pos += node.local.pos;
        match node.parent {
            Some(parent) => current = parent,
            None => return Ok(pos),
        }
    }
}
