// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line-style pedal markings.

use kurbo::BezPath;
use stave_scene::{LocalNode, NodeId, Scene, Spanner, SpannerEnd};
use stave_units::{Point, Unit};

use crate::path::{line_to, move_to};
use crate::{NotationError, SpannerPath, Staff};

/// A pedal line: an opening crook, a horizontal line with optional half-lift notches, and
/// a closing crook.
///
/// The node's position is the top of the opening crook. The line runs one staff unit
/// below it, and half-lift notches rise back up to the node's height.
#[derive(Clone, Debug, PartialEq)]
pub struct PedalLine {
    node: NodeId,
    unit: Unit,
    half_lifts: Vec<Unit>,
}

impl PedalLine {
    /// Stroke thickness, in staff units.
    pub const THICKNESS: f64 = 0.16;

    /// Insert a pedal line from `pos` relative to `parent`, ending `end_x` right of
    /// `end_parent`.
    ///
    /// `half_lifts` are notch centers measured from the line's start. Each must end
    /// before the closing crook, leaving one staff unit of room; otherwise insertion fails
    /// with [`NotationError::InvalidHalfLift`] and no node is left behind.
    pub fn insert(
        scene: &mut Scene,
        staff: &Staff,
        parent: NodeId,
        pos: Point,
        end_parent: SpannerEnd,
        end_x: Unit,
        half_lifts: impl IntoIterator<Item = Unit>,
    ) -> Result<Self, NotationError> {
        let unit = staff.unit(1.0);
        let mut half_lifts: Vec<Unit> = half_lifts.into_iter().collect();
        half_lifts.sort_by(|a, b| a.base_value().total_cmp(&b.base_value()));

        let node = scene.insert(Some(parent), LocalNode::at(pos))?;
        let checked = scene
            .set_spanner(node, Spanner::horizontal(end_x, end_parent))
            .map_err(NotationError::from)
            .and_then(|()| {
                let limit = scene.spanner_x_length(node)? - unit;
                match half_lifts.iter().find(|x| **x >= limit) {
                    Some(x) => Err(NotationError::InvalidHalfLift(*x)),
                    None => Ok(()),
                }
            });
        if let Err(err) = checked {
            if let Err(cleanup) = scene.remove(node) {
                tracing::warn!(%node, %cleanup, "could not remove pedal line node");
            }
            return Err(err);
        }
        Ok(Self {
            node,
            unit,
            half_lifts,
        })
    }

    /// Half-lift notch centers from the line's start, left to right.
    pub fn half_lifts(&self) -> &[Unit] {
        &self.half_lifts
    }

    /// Stroke thickness.
    pub fn thickness(&self) -> Unit {
        self.unit * Self::THICKNESS
    }
}

impl SpannerPath for PedalLine {
    fn node(&self) -> NodeId {
        self.node
    }

    fn local_path(&self, scene: &Scene) -> Result<BezPath, NotationError> {
        let end_x = scene.spanner_x_length(self.node)?;
        let descent = self.unit;
        let notch = self.unit * 0.5;
        let mut path = BezPath::new();
        move_to(&mut path, Point::ORIGIN);
        line_to(&mut path, Point::new(Unit::ZERO, descent));
        for &x in &self.half_lifts {
            line_to(&mut path, Point::new(x - notch, descent));
            line_to(&mut path, Point::new(x, Unit::ZERO));
            line_to(&mut path, Point::new(x + notch, descent));
        }
        line_to(&mut path, Point::new(end_x, descent));
        line_to(&mut path, Point::new(end_x, Unit::ZERO));
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaffConfig;
    use crate::path::assert_path_close;
    use kurbo::PathEl;
    use stave_scene::FlowableConfig;

    fn k(x: f64, y: f64) -> kurbo::Point {
        Point::new(Unit::mm(x), Unit::mm(y)).to_kurbo()
    }

    fn setup() -> (Scene, Staff) {
        let mut scene = Scene::default();
        let flowable = scene
            .insert_flowable(None, Point::ORIGIN, FlowableConfig::new(Unit::mm(400.0), Unit::mm(20.0)))
            .unwrap();
        let config = StaffConfig::default().with_line_spacing(Unit::mm(2.0));
        let staff = Staff::insert(&mut scene, Some(flowable), Point::ORIGIN, Unit::mm(400.0), config)
            .unwrap();
        (scene, staff)
    }

    #[test]
    fn crooks_and_half_lifts() {
        let (mut scene, staff) = setup();
        let pedal = PedalLine::insert(
            &mut scene,
            &staff,
            staff.node(),
            Point::new(Unit::mm(10.0), Unit::mm(12.0)),
            SpannerEnd::SelfNode,
            Unit::mm(40.0),
            [Unit::mm(30.0), Unit::mm(10.0)],
        )
        .unwrap();
        assert_eq!(pedal.half_lifts(), [Unit::mm(10.0), Unit::mm(30.0)]);
        assert_path_close(
            &pedal.local_path(&scene).unwrap(),
            &[
                PathEl::MoveTo(k(0.0, 0.0)),
                PathEl::LineTo(k(0.0, 2.0)),
                PathEl::LineTo(k(9.0, 2.0)),
                PathEl::LineTo(k(10.0, 0.0)),
                PathEl::LineTo(k(11.0, 2.0)),
                PathEl::LineTo(k(29.0, 2.0)),
                PathEl::LineTo(k(30.0, 0.0)),
                PathEl::LineTo(k(31.0, 2.0)),
                PathEl::LineTo(k(40.0, 2.0)),
                PathEl::LineTo(k(40.0, 0.0)),
            ],
        );
    }

    #[test]
    fn half_lift_too_close_to_the_end_is_rejected() {
        let (mut scene, staff) = setup();
        let children = scene.children(staff.node()).unwrap().len();
        let result = PedalLine::insert(
            &mut scene,
            &staff,
            staff.node(),
            Point::ORIGIN,
            SpannerEnd::SelfNode,
            Unit::mm(40.0),
            [Unit::mm(39.0)],
        );
        assert_eq!(result, Err(NotationError::InvalidHalfLift(Unit::mm(39.0))));
        assert_eq!(scene.children(staff.node()).unwrap().len(), children);
    }

    #[test]
    fn pedal_across_a_break_keeps_each_crook_on_its_own_line() {
        let (mut scene, staff) = setup();
        let pedal = PedalLine::insert(
            &mut scene,
            &staff,
            staff.node(),
            Point::new(Unit::mm(120.0), Unit::mm(12.0)),
            SpannerEnd::SelfNode,
            Unit::mm(100.0),
            [Unit::mm(60.0)],
        )
        .unwrap();
        scene.commit().unwrap();
        let slices = pedal.slices(&scene).unwrap();
        assert_eq!(slices.len(), 2);
        // Line 0 clips after 50mm, before the notch; line 1 shows the rest.
        let (left, right) = slices[0].clip_x.unwrap();
        assert!((right - left - Unit::mm(50.0).base_value()).abs() < 1e-9);
        let (left, _) = slices[1].clip_x.unwrap();
        let PathEl::LineTo(notch) = slices[1].path.elements()[3] else {
            panic!("expected the notch peak");
        };
        assert!((notch.x - (left + Unit::mm(10.0).base_value())).abs() < 1e-9);
    }
}
