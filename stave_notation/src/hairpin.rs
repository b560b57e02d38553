// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Crescendo and diminuendo hairpins.

use kurbo::BezPath;
use stave_scene::{LocalNode, NodeId, Scene, Spanner, SpannerEnd};
use stave_units::{Point, Unit};

use crate::path::{line_to, move_to};
use crate::{NotationError, SpannerPath, Staff};

/// Which end of a hairpin is open.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HairpinKind {
    /// `<`: closed at the start, open at the end.
    Crescendo,
    /// `>`: open at the start, closed at the end.
    Diminuendo,
}

/// A hairpin spanner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hairpin {
    node: NodeId,
    kind: HairpinKind,
    width: Unit,
    thickness: Unit,
}

impl Hairpin {
    /// Stroke thickness, in staff units.
    pub const THICKNESS: f64 = 0.16;

    /// Insert a hairpin from `pos` relative to `parent` to `end_pos` relative to
    /// `end_parent`.
    ///
    /// `width` is the opening's full width and defaults to one staff unit.
    pub fn insert(
        scene: &mut Scene,
        staff: &Staff,
        parent: NodeId,
        pos: Point,
        end_parent: SpannerEnd,
        end_pos: Point,
        kind: HairpinKind,
        width: Option<Unit>,
    ) -> Result<Self, NotationError> {
        let node = scene.insert(Some(parent), LocalNode::at(pos))?;
        if let Err(err) = scene.set_spanner(node, Spanner::ending_at(end_pos, end_parent)) {
            if let Err(cleanup) = scene.remove(node) {
                tracing::warn!(%node, %cleanup, "could not remove hairpin node");
            }
            return Err(err.into());
        }
        Ok(Self {
            node,
            kind,
            width: width.unwrap_or_else(|| staff.unit(1.0)),
            thickness: staff.unit(Self::THICKNESS),
        })
    }

    /// Crescendo or diminuendo.
    pub fn kind(&self) -> HairpinKind {
        self.kind
    }

    /// Width of the open end.
    pub fn width(&self) -> Unit {
        self.width
    }

    /// Stroke thickness.
    pub fn thickness(&self) -> Unit {
        self.thickness
    }

    /// The two open-end corners and the joint between them, relative to the hairpin's
    /// start: `[first corner, joint, second corner]`.
    ///
    /// The corners lie half the width either side of the open end, on the line through it
    /// perpendicular to the hairpin's axis.
    pub fn points(&self, scene: &Scene) -> Result<[Point; 3], NotationError> {
        let end = scene.spanner_relative_end(self.node)?;
        let (joint, open) = match self.kind {
            HairpinKind::Crescendo => (Point::ORIGIN, end),
            HairpinKind::Diminuendo => (end, Point::ORIGIN),
        };
        let half = self.width / 2.0;
        let axis = open - joint;
        let offset = if axis.y.is_zero() {
            Point::new(Unit::ZERO, half)
        } else if axis.x.is_zero() {
            Point::new(half, Unit::ZERO)
        } else {
            let opening_slope = -(axis.x / axis.y);
            let dx = half / (1.0 + opening_slope * opening_slope).sqrt();
            Point::new(dx, dx * opening_slope)
        };
        Ok([open + offset, joint, open - offset])
    }
}

impl SpannerPath for Hairpin {
    fn node(&self) -> NodeId {
        self.node
    }

    fn local_path(&self, scene: &Scene) -> Result<BezPath, NotationError> {
        let [first, joint, last] = self.points(scene)?;
        let mut path = BezPath::new();
        move_to(&mut path, first);
        line_to(&mut path, joint);
        line_to(&mut path, last);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaffConfig;
    use stave_scene::FlowableConfig;

    fn mm(x: f64, y: f64) -> Point {
        Point::new(Unit::mm(x), Unit::mm(y))
    }

    /// A staff with a 1mm unit, an anchor at its origin and another at (10, 2).
    fn setup() -> (Scene, Staff, NodeId, NodeId) {
        let mut scene = Scene::default();
        let config = StaffConfig::default().with_line_spacing(Unit::mm(1.0));
        let staff = Staff::insert(&mut scene, None, Point::ORIGIN, Unit::mm(100.0), config).unwrap();
        let left = scene.insert(Some(staff.node()), LocalNode::default()).unwrap();
        let right = scene.insert(Some(staff.node()), LocalNode::at(mm(10.0, 2.0))).unwrap();
        (scene, staff, left, right)
    }

    fn hairpin(
        scene: &mut Scene,
        staff: &Staff,
        parent: NodeId,
        pos: Point,
        end_parent: SpannerEnd,
        end_pos: Point,
        kind: HairpinKind,
    ) -> Hairpin {
        Hairpin::insert(scene, staff, parent, pos, end_parent, end_pos, kind, Some(Unit::mm(2.0)))
            .unwrap()
    }

    #[test]
    fn horizontal_hairpins_open_vertically() {
        let (mut scene, staff, left, _) = setup();
        let cresc = hairpin(
            &mut scene,
            &staff,
            left,
            Point::ORIGIN,
            SpannerEnd::SelfNode,
            mm(10.0, 0.0),
            HairpinKind::Crescendo,
        );
        assert_eq!(
            cresc.points(&scene).unwrap(),
            [mm(10.0, 1.0), mm(0.0, 0.0), mm(10.0, -1.0)]
        );
        let dim = hairpin(
            &mut scene,
            &staff,
            left,
            Point::ORIGIN,
            SpannerEnd::SelfNode,
            mm(10.0, 0.0),
            HairpinKind::Diminuendo,
        );
        assert_eq!(
            dim.points(&scene).unwrap(),
            [mm(0.0, 1.0), mm(10.0, 0.0), mm(0.0, -1.0)]
        );
    }

    #[test]
    fn end_anchored_to_another_node() {
        let (mut scene, staff, left, right) = setup();
        let cresc = hairpin(
            &mut scene,
            &staff,
            left,
            mm(0.0, 2.0),
            SpannerEnd::Node(right),
            mm(1.0, 0.0),
            HairpinKind::Crescendo,
        );
        assert_eq!(
            cresc.points(&scene).unwrap(),
            [mm(11.0, 1.0), mm(0.0, 0.0), mm(11.0, -1.0)]
        );
    }

    #[test]
    fn diagonal_opening_is_perpendicular_to_the_axis() {
        let (mut scene, staff, left, _) = setup();
        for kind in [HairpinKind::Crescendo, HairpinKind::Diminuendo] {
            let pin = hairpin(
                &mut scene,
                &staff,
                left,
                Point::ORIGIN,
                SpannerEnd::SelfNode,
                mm(4.0, 4.0),
                kind,
            );
            let [first, joint, last] = pin.points(&scene).unwrap();
            assert_eq!(first.x, last.y);
            assert_eq!(first.y, last.x);
            let open = match kind {
                HairpinKind::Crescendo => mm(4.0, 4.0),
                HairpinKind::Diminuendo => Point::ORIGIN,
            };
            let expected_joint = match kind {
                HairpinKind::Crescendo => Point::ORIGIN,
                HairpinKind::Diminuendo => mm(4.0, 4.0),
            };
            assert_eq!(joint, expected_joint);
            // Each corner sits half the width from the open end's center.
            assert_eq!((first - open).hypot(), Unit::mm(1.0));
            assert_eq!((last - open).hypot(), Unit::mm(1.0));
        }
    }

    #[test]
    fn default_width_is_one_staff_unit() {
        let (mut scene, staff, left, _) = setup();
        let pin = Hairpin::insert(
            &mut scene,
            &staff,
            left,
            Point::ORIGIN,
            SpannerEnd::SelfNode,
            mm(10.0, 0.0),
            HairpinKind::Crescendo,
            None,
        )
        .unwrap();
        assert_eq!(pin.width(), Unit::mm(1.0));
        assert_eq!(pin.thickness(), Unit::mm(0.16));
        assert_eq!(pin.points(&scene).unwrap()[0], mm(10.0, 0.5));
    }

    #[test]
    fn long_hairpin_spans_three_lines() {
        let mut scene = Scene::default();
        let flowable = scene
            .insert_flowable(None, Point::ORIGIN, FlowableConfig::new(Unit::mm(500.0), Unit::mm(20.0)))
            .unwrap();
        let staff = Staff::insert(
            &mut scene,
            Some(flowable),
            Point::ORIGIN,
            Unit::mm(500.0),
            StaffConfig::default(),
        )
        .unwrap();
        let pin = Hairpin::insert(
            &mut scene,
            &staff,
            staff.node(),
            mm(100.0, 10.0),
            SpannerEnd::SelfNode,
            mm(300.0, 0.0),
            HairpinKind::Diminuendo,
            None,
        )
        .unwrap();
        scene.commit().unwrap();
        let slices = pin.slices(&scene).unwrap();
        assert_eq!(
            slices.iter().map(|s| s.line).collect::<Vec<_>>(),
            [Some(0), Some(1), Some(2)]
        );
        let widths: Vec<_> = slices
            .iter()
            .map(|s| s.clip_x.map(|(l, r)| r - l))
            .collect();
        assert!((widths[0].unwrap() - Unit::mm(70.0).base_value()).abs() < 1e-9);
        assert!((widths[1].unwrap() - Unit::mm(170.0).base_value()).abs() < 1e-9);
        assert!(widths[2].unwrap().is_infinite());
    }
}
