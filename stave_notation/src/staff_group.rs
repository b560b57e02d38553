// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fringe alignment across the staves of a system.
//!
//! Every staff computes its own fringe at the start of each line. Staves in one group
//! then share the widest fringe, so their staff lines start together and their clefs and
//! key signatures line up. Time signatures stay flush with the content.

use std::collections::HashMap;

use stave_scene::{Fragment, GlyphMetrics, MarginController, NewLine, NodeId, Scene};
use stave_units::{Point, Unit};

use crate::{FringeConfig, NotationError, Staff, StaffFringeLayout, isolated_fringe_layout};

/// Margin layer that [`StaffGroup::register_margin_controllers`] writes to.
pub const STAFF_FRINGE_LAYER: &str = "staff_fringe";

/// The drawable piece of a staff on one line, in canvas space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StaffSegment {
    /// Canvas position of the top line's left end.
    pub start: Point,
    /// Length of every line.
    pub length: Unit,
    /// Number of staff lines.
    pub line_count: u8,
    /// Distance between adjacent lines.
    pub line_spacing: Unit,
}

impl StaffSegment {
    /// The staff lines, top to bottom, in base units.
    pub fn lines(&self) -> Vec<kurbo::Line> {
        (0..self.line_count)
            .map(|i| {
                let left = self.start + Point::new(Unit::ZERO, self.line_spacing * f64::from(i));
                let right = left + Point::new(self.length, Unit::ZERO);
                kurbo::Line::new(left.to_kurbo(), right.to_kurbo())
            })
            .collect()
    }
}

/// A set of staves laid out as a system.
///
/// Fringe layouts are cached per staff and line until the scene is committed again or a
/// staff is changed through the group.
#[derive(Clone, Debug, Default)]
pub struct StaffGroup {
    staves: Vec<Staff>,
    fringe: FringeConfig,
    cache: HashMap<(NodeId, Option<usize>), StaffFringeLayout>,
    cache_epoch: u64,
}

impl StaffGroup {
    /// An empty group with the default fringe padding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style fringe padding.
    pub fn with_fringe_config(mut self, fringe: FringeConfig) -> Self {
        self.fringe = fringe;
        self.cache.clear();
        self
    }

    /// The fringe padding.
    pub fn fringe_config(&self) -> &FringeConfig {
        &self.fringe
    }

    /// Add a staff, returning its node.
    pub fn add_staff(&mut self, staff: Staff) -> NodeId {
        let node = staff.node();
        self.staves.push(staff);
        self.cache.clear();
        node
    }

    /// The staff with node `node`.
    pub fn staff(&self, node: NodeId) -> Option<&Staff> {
        self.staves.iter().find(|s| s.node() == node)
    }

    /// Mutable access to a staff, for adding staff objects.
    pub fn staff_mut(&mut self, node: NodeId) -> Option<&mut Staff> {
        self.cache.clear();
        self.staves.iter_mut().find(|s| s.node() == node)
    }

    /// Take a staff out of the group. Its scene node is left alone.
    pub fn remove_staff(&mut self, node: NodeId) -> Option<Staff> {
        let index = self.staves.iter().position(|s| s.node() == node)?;
        self.cache.clear();
        Some(self.staves.remove(index))
    }

    /// The staves in insertion order.
    pub fn staves(&self) -> &[Staff] {
        &self.staves
    }

    /// Forget every cached fringe layout.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// The aligned fringe layout of `staff` at the start of flowable line `line`.
    ///
    /// Staves whose extent covers the line's start share the widest fringe among them. A
    /// staff starting partway through the line keeps its isolated layout. Without a line,
    /// or for a staff outside any flowable, every staff of the group is aligned at its own
    /// start.
    pub fn fringe_layout_at(
        &mut self,
        scene: &Scene,
        staff: NodeId,
        line: Option<usize>,
        glyphs: &dyn GlyphMetrics,
    ) -> Result<StaffFringeLayout, NotationError> {
        if self.cache_epoch != scene.epoch() {
            self.cache.clear();
            self.cache_epoch = scene.epoch();
        }
        if let Some(hit) = self.cache.get(&(staff, line)) {
            return Ok(*hit);
        }

        let target = self.staff(staff).ok_or(NotationError::UnknownStaff(staff))?;
        let flowable = scene.flowable_of(staff)?;
        let line_start = match (flowable, line) {
            (Some(flowable), Some(index)) => Some((flowable, line_at(scene, flowable, index)?)),
            _ => None,
        };
        let Some((flowable, line_x)) = line_start else {
            let mut basis = Unit::ZERO;
            for other in &self.staves {
                let layout =
                    isolated_fringe_layout(scene, other, Unit::ZERO, glyphs, &self.fringe)?;
                basis = basis.min(layout.staff);
            }
            let own = isolated_fringe_layout(scene, target, Unit::ZERO, glyphs, &self.fringe)?;
            let layout = own.aligned_to(basis);
            self.cache.insert((staff, line), layout);
            return Ok(layout);
        };

        let target_x = scene.descendant_pos_x(staff, flowable)?;
        let own = isolated_fringe_layout(
            scene,
            target,
            (line_x - target_x).max(Unit::ZERO),
            glyphs,
            &self.fringe,
        )?;
        let layout = if covers(target_x, target.length(), line_x) {
            let basis = self.staff_basis(scene, flowable, line_x, glyphs)?;
            own.aligned_to(basis)
        } else {
            own
        };
        self.cache.insert((staff, line), layout);
        Ok(layout)
    }

    /// The leftmost isolated staff start among the group's staves in `flowable` that
    /// cover flowable x position `flowable_x`. Never positive.
    fn staff_basis(
        &self,
        scene: &Scene,
        flowable: NodeId,
        flowable_x: Unit,
        glyphs: &dyn GlyphMetrics,
    ) -> Result<Unit, NotationError> {
        let mut basis = Unit::ZERO;
        for staff in &self.staves {
            if scene.flowable_of(staff.node())? != Some(flowable) {
                continue;
            }
            let staff_x = scene.descendant_pos_x(staff.node(), flowable)?;
            if !covers(staff_x, staff.length(), flowable_x) {
                continue;
            }
            let layout =
                isolated_fringe_layout(scene, staff, flowable_x - staff_x, glyphs, &self.fringe)?;
            basis = basis.min(layout.staff);
        }
        Ok(basis)
    }

    /// Register the margins the group's fringes need on every flowable containing one of
    /// its staves.
    ///
    /// A margin controller is placed wherever a staff starts or a clef, key signature or
    /// time signature is placed. Controllers previously registered on
    /// [`STAFF_FRINGE_LAYER`] are replaced. Returns the number registered.
    pub fn register_margin_controllers(
        &self,
        scene: &mut Scene,
        glyphs: &dyn GlyphMetrics,
    ) -> Result<usize, NotationError> {
        let mut by_flowable: Vec<(NodeId, Vec<Unit>)> = Vec::new();
        for staff in &self.staves {
            let Some(flowable) = scene.flowable_of(staff.node())? else {
                continue;
            };
            let staff_x = scene.descendant_pos_x(staff.node(), flowable)?;
            let positions = std::iter::once(staff_x).chain(
                staff
                    .fringe_object_positions(scene)?
                    .into_iter()
                    .map(|x| staff_x + x),
            );
            match by_flowable.iter_mut().find(|(f, _)| *f == flowable) {
                Some((_, xs)) => xs.extend(positions),
                None => by_flowable.push((flowable, positions.collect())),
            }
        }

        let mut registered = 0;
        for (flowable, mut xs) in by_flowable {
            xs.sort_by(|a, b| a.base_value().total_cmp(&b.base_value()));
            xs.dedup();
            let mut controllers = Vec::with_capacity(xs.len());
            for x in xs {
                let basis = self.staff_basis(scene, flowable, x, glyphs)?;
                controllers.push(MarginController::new(x, -basis).with_layer(STAFF_FRINGE_LAYER));
            }
            scene.clear_margin_layer(flowable, STAFF_FRINGE_LAYER)?;
            for controller in controllers {
                scene.add_margin_controller(flowable, controller)?;
                registered += 1;
            }
        }
        tracing::debug!(registered, staves = self.staves.len(), "registered staff fringe margins");
        Ok(registered)
    }

    /// The staff lines to draw for one of `staff`'s render fragments.
    ///
    /// The segment starts where the aligned fringe begins, so clef and key signature sit
    /// on the staff lines.
    pub fn segment_for_fragment(
        &mut self,
        scene: &Scene,
        staff: NodeId,
        fragment: &Fragment,
        glyphs: &dyn GlyphMetrics,
    ) -> Result<StaffSegment, NotationError> {
        let fringe = self.fringe_layout_at(scene, staff, fragment.line(), glyphs)?;
        let target = self.staff(staff).ok_or(NotationError::UnknownStaff(staff))?;
        let (_, slice) = fragment.local_span();
        Ok(StaffSegment {
            start: fragment.start() + Point::new(fringe.staff, Unit::ZERO),
            length: slice - fringe.staff,
            line_count: target.line_count(),
            line_spacing: target.line_spacing(),
        })
    }

    /// Every segment of `staff`, in line order. The scene must be committed.
    pub fn segments(
        &mut self,
        scene: &Scene,
        staff: NodeId,
        glyphs: &dyn GlyphMetrics,
    ) -> Result<Vec<StaffSegment>, NotationError> {
        scene
            .fragments(staff)?
            .iter()
            .map(|fragment| self.segment_for_fragment(scene, staff, fragment, glyphs))
            .collect()
    }
}

fn covers(start: Unit, length: Unit, x: Unit) -> bool {
    start <= x && x < start + length
}

fn line_at(scene: &Scene, flowable: NodeId, index: usize) -> Result<Unit, NotationError> {
    let lines: &[NewLine] = scene.flowable(flowable)?.lines()?;
    lines
        .get(index)
        .map(|line| line.flowable_x)
        .ok_or(NotationError::NoSuchLine(index))
}
