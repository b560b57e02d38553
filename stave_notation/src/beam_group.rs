// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The beam layout pre-pass.
//!
//! [`BeamGroup::layout`] picks a beam direction and a straight beam line for a run of
//! chords, points every stem at the line, and creates one spanner node per beam segment
//! as children of the staff node. Full beams end on their last chord's node, so they break
//! across lines like any other spanner. Hooks end relative to themselves.

use stave_scene::{LocalNode, NodeId, Scene, Spanner, SpannerEnd};
use stave_units::{Point, Unit};

use crate::{BeamHook, BeamPath, Chord, NotationError, Staff, resolve_beam_layout};

/// Which side of the noteheads beams and stems go.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BeamDirection {
    /// Stems up, beams above the noteheads.
    Up,
    /// Stems down, beams below the noteheads.
    Down,
}

impl BeamDirection {
    /// `+1.0` for [`BeamDirection::Up`], where inner beams sit further down the page.
    fn toward_noteheads(self) -> f64 {
        match self {
            Self::Up => 1.0,
            Self::Down => -1.0,
        }
    }
}

/// Beam geometry, in staff units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BeamConfig {
    /// Minimum distance from the beam-side notehead to the outermost beam.
    pub stem_clearance: f64,
    /// Thickness of one beam.
    pub beam_thickness: f64,
    /// Gap between stacked beams.
    pub beam_spacing: f64,
    /// Horizontal length of a hook.
    pub hook_length: f64,
    /// Forces a direction instead of deriving it from the noteheads.
    pub direction: Option<BeamDirection>,
}

impl BeamConfig {
    /// Builder-style direction override.
    pub const fn with_direction(mut self, direction: BeamDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    fn layer_height(&self) -> f64 {
        self.beam_thickness + self.beam_spacing
    }
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            stem_clearance: 3.5,
            beam_thickness: 0.5,
            beam_spacing: 0.25,
            hook_length: 1.25,
            direction: None,
        }
    }
}

/// A straight beam line in staff coordinates: `y = intercept + x * slope`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BeamLine {
    /// The side of the noteheads the line is on.
    pub direction: BeamDirection,
    /// Rise over run.
    pub slope: f64,
    /// The line's y at staff x zero.
    pub intercept: Unit,
}

impl BeamLine {
    /// The line's y at staff x position `x`.
    pub fn y_at(&self, x: Unit) -> Unit {
        self.intercept + x * self.slope
    }
}

/// Stems go up when the noteheads furthest from the staff center lie, on average, below it.
///
/// Rests are ignored. A group of rests, or one balanced on the center, goes down.
pub fn resolve_beam_direction(chords: &[Chord], center_y: Unit) -> BeamDirection {
    let furthest: Vec<Unit> = chords
        .iter()
        .filter_map(|chord| chord.furthest_notehead(center_y))
        .collect();
    if furthest.is_empty() {
        return BeamDirection::Down;
    }
    #[allow(
        clippy::cast_precision_loss,
        reason = "Beam groups are far smaller than 2^52 chords."
    )]
    let average = furthest.iter().copied().sum::<Unit>() / furthest.len() as f64;
    if average > center_y {
        BeamDirection::Up
    } else {
        BeamDirection::Down
    }
}

/// Fit the beam line for `chords`, given their staff x positions.
///
/// The slope runs between the beam-side noteheads of the first and last chord (the staff
/// center stands in for a rest). The line is then moved away from the noteheads until
/// every chord keeps the stem clearance plus room for its group's inner beams.
pub fn resolve_beam_line(
    staff: &Staff,
    chords: &[Chord],
    xs: &[Unit],
    direction: BeamDirection,
    config: &BeamConfig,
) -> Result<BeamLine, NotationError> {
    if chords.len() < 2 || xs.len() != chords.len() {
        return Err(NotationError::TooFewBeamMembers(chords.len().min(xs.len())));
    }
    let beam_side = |chord: &Chord| {
        chord
            .beam_side_notehead(direction)
            .unwrap_or_else(|| staff.center_y())
    };
    let last = chords.len() - 1;
    let (first_y, last_y) = (beam_side(&chords[0]), beam_side(&chords[last]));
    let dx = xs[last] - xs[0];
    let slope = if dx.is_zero() || first_y == last_y {
        0.0
    } else {
        (last_y - first_y) / dx
    };

    let max_flags = chords
        .iter()
        .map(|chord| chord.duration().flag_count())
        .max()
        .unwrap_or(1)
        .max(1);
    let clearance = staff.unit(config.stem_clearance)
        + staff.unit(config.layer_height()) * f64::from(max_flags - 1);

    let candidates = chords.iter().zip(xs).filter_map(|(chord, x)| {
        let y = chord.beam_side_notehead(direction)?;
        let beam_y = match direction {
            BeamDirection::Up => y - clearance,
            BeamDirection::Down => y + clearance,
        };
        Some(beam_y - *x * slope)
    });
    let intercept = match direction {
        BeamDirection::Up => candidates.reduce(Unit::min),
        BeamDirection::Down => candidates.reduce(Unit::max),
    };
    let intercept = intercept.unwrap_or_else(|| {
        let offset = match direction {
            BeamDirection::Up => -clearance,
            BeamDirection::Down => clearance,
        };
        staff.center_y() + offset - xs[0] * slope
    });

    Ok(BeamLine {
        direction,
        slope,
        intercept,
    })
}

/// One drawn beam segment and its spanner node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Beam {
    /// Which positions the segment joins, and at what depth.
    pub path: BeamPath,
    /// The spanner node drawing the segment, a child of the staff node.
    pub node: NodeId,
}

/// A laid-out beam group.
#[derive(Clone, Debug, PartialEq)]
pub struct BeamGroup {
    direction: BeamDirection,
    line: BeamLine,
    beams: Vec<Beam>,
}

impl BeamGroup {
    /// Lay out `chords` as one beam group on `staff`.
    ///
    /// Every chord must be a child of the staff node. On success each chord's stem points
    /// at the beam line, and one spanner node exists per beam segment. On failure no nodes
    /// are left behind and the chords are unchanged.
    pub fn layout(
        scene: &mut Scene,
        staff: &Staff,
        chords: &mut [Chord],
        config: &BeamConfig,
    ) -> Result<Self, NotationError> {
        let specs: Vec<_> = chords.iter().map(Chord::beam_spec).collect();
        let paths = resolve_beam_layout(&specs)?;
        let xs = chords
            .iter()
            .map(|chord| scene.descendant_pos_x(chord.node(), staff.node()))
            .collect::<Result<Vec<_>, _>>()?;

        let direction = config
            .direction
            .unwrap_or_else(|| resolve_beam_direction(chords, staff.center_y()));
        let line = resolve_beam_line(staff, chords, &xs, direction, config)?;

        let mut beams = Vec::with_capacity(paths.len());
        for path in paths {
            match insert_beam(scene, staff, chords, &xs, &line, config, path) {
                Ok(node) => beams.push(Beam { path, node }),
                Err(err) => {
                    for beam in &beams {
                        if let Err(cleanup) = scene.remove(beam.node) {
                            tracing::warn!(node = %beam.node, %cleanup, "could not remove beam node");
                        }
                    }
                    return Err(err);
                }
            }
        }

        for (chord, x) in chords.iter_mut().zip(&xs) {
            chord.set_stem(direction, line.y_at(*x));
        }
        tracing::debug!(
            chords = chords.len(),
            beams = beams.len(),
            ?direction,
            slope = line.slope,
            "laid out beam group"
        );
        Ok(Self {
            direction,
            line,
            beams,
        })
    }

    /// The side of the noteheads the beams are on.
    pub fn direction(&self) -> BeamDirection {
        self.direction
    }

    /// The outermost beam's line.
    pub fn line(&self) -> &BeamLine {
        &self.line
    }

    /// The drawn segments, ordered by depth and then left to right.
    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }

    /// Remove every beam node from the scene.
    pub fn remove(self, scene: &mut Scene) -> Result<(), NotationError> {
        for beam in self.beams {
            scene.remove(beam.node)?;
        }
        Ok(())
    }
}

fn insert_beam(
    scene: &mut Scene,
    staff: &Staff,
    chords: &[Chord],
    xs: &[Unit],
    line: &BeamLine,
    config: &BeamConfig,
    path: BeamPath,
) -> Result<NodeId, NotationError> {
    let depth_offset = staff.unit(config.layer_height())
        * (f64::from(path.depth - 1) * line.direction.toward_noteheads());
    let hook_length = staff.unit(config.hook_length);
    let (start_x, spanner) = match path.hook {
        None => {
            let end_y = line.y_at(xs[path.end]) + depth_offset;
            (
                xs[path.start],
                Spanner::ending_at(
                    Point::new(Unit::ZERO, end_y),
                    SpannerEnd::Node(chords[path.end].node()),
                ),
            )
        }
        Some(hook) => {
            let start_x = match hook {
                BeamHook::Left => xs[path.start] - hook_length,
                BeamHook::Right => xs[path.start],
            };
            (
                start_x,
                Spanner::ending_at(
                    Point::new(hook_length, hook_length * line.slope),
                    SpannerEnd::SelfNode,
                ),
            )
        }
    };
    let start = Point::new(start_x, line.y_at(start_x) + depth_offset);
    let node = scene.insert(Some(staff.node()), LocalNode::at(start))?;
    if let Err(err) = scene.set_spanner(node, spanner) {
        if let Err(cleanup) = scene.remove(node) {
            tracing::warn!(%node, %cleanup, "could not remove beam node");
        }
        return Err(err.into());
    }
    Ok(node)
}
