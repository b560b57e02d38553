// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chords and rests, the members of beam groups.

use stave_scene::{LocalNode, NodeId, Scene};
use stave_units::{Point, Unit};

use crate::{BeamDirection, BeamHook, BeamSpec, Duration, NotationError, Staff};

/// A chord or rest on a staff: the unit beam groups are made of.
///
/// Notehead positions are staff-relative y values, growing downward from the top line.
/// A chord without noteheads is a rest.
#[derive(Clone, Debug)]
pub struct Chord {
    node: NodeId,
    duration: Duration,
    noteheads: Vec<Unit>,
    stem_direction: Option<BeamDirection>,
    stem_end: Option<Unit>,
    beam_break_depth: Option<u8>,
    beam_hook: Option<BeamHook>,
}

impl Chord {
    /// Insert a chord node on `staff` at staff x position `x`.
    pub fn insert(
        scene: &mut Scene,
        staff: &Staff,
        x: Unit,
        noteheads: impl IntoIterator<Item = Unit>,
        duration: Duration,
    ) -> Result<Self, NotationError> {
        let node = scene.insert(
            Some(staff.node()),
            LocalNode::at(Point::new(x, Unit::ZERO)),
        )?;
        Ok(Self {
            node,
            duration,
            noteheads: noteheads.into_iter().collect(),
            stem_direction: None,
            stem_end: None,
            beam_break_depth: None,
            beam_hook: None,
        })
    }

    /// Insert a rest on `staff` at staff x position `x`.
    pub fn rest(
        scene: &mut Scene,
        staff: &Staff,
        x: Unit,
        duration: Duration,
    ) -> Result<Self, NotationError> {
        Self::insert(scene, staff, x, [], duration)
    }

    /// Builder-style beam break depth: only this many beams continue to the next chord.
    pub fn with_beam_break_depth(mut self, depth: u8) -> Self {
        self.beam_break_depth = Some(depth);
        self
    }

    /// Builder-style hook hint, used when both neighbors share equally many beams.
    pub fn with_beam_hook(mut self, hook: BeamHook) -> Self {
        self.beam_hook = Some(hook);
        self
    }

    /// The chord's scene node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The chord's written duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Staff-relative y positions of the noteheads.
    pub fn noteheads(&self) -> &[Unit] {
        &self.noteheads
    }

    /// Whether the chord has no noteheads.
    pub fn is_rest(&self) -> bool {
        self.noteheads.is_empty()
    }

    /// The notehead nearest the top of the staff.
    pub fn highest_notehead(&self) -> Option<Unit> {
        self.noteheads.iter().copied().reduce(Unit::min)
    }

    /// The notehead nearest the bottom of the staff.
    pub fn lowest_notehead(&self) -> Option<Unit> {
        self.noteheads.iter().copied().reduce(Unit::max)
    }

    /// The notehead furthest from `center_y`. Ties go to the higher notehead.
    pub fn furthest_notehead(&self, center_y: Unit) -> Option<Unit> {
        let high = self.highest_notehead()?;
        let low = self.lowest_notehead()?;
        if (low - center_y).abs() > (center_y - high).abs() {
            Some(low)
        } else {
            Some(high)
        }
    }

    /// The notehead a beam in `direction` attaches above or below.
    pub(crate) fn beam_side_notehead(&self, direction: BeamDirection) -> Option<Unit> {
        match direction {
            BeamDirection::Up => self.highest_notehead(),
            BeamDirection::Down => self.lowest_notehead(),
        }
    }

    /// Stem direction, once set by a beam group.
    pub fn stem_direction(&self) -> Option<BeamDirection> {
        self.stem_direction
    }

    /// Staff-relative y position of the stem end, once set by a beam group.
    pub fn stem_end(&self) -> Option<Unit> {
        self.stem_end
    }

    pub(crate) fn set_stem(&mut self, direction: BeamDirection, end_y: Unit) {
        self.stem_direction = Some(direction);
        self.stem_end = Some(end_y);
    }

    /// The beam break depth, if any.
    pub fn beam_break_depth(&self) -> Option<u8> {
        self.beam_break_depth
    }

    /// This chord's position in a beam group.
    pub fn beam_spec(&self) -> BeamSpec {
        let mut spec = BeamSpec::new(self.duration.flag_count());
        spec.break_depth = self.beam_break_depth;
        spec.hook = self.beam_hook;
        spec
    }
}
