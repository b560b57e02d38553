// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing spanner paths across line breaks.
//!
//! Slurs, ties, hairpins and the line-style markings build one path in their node's local
//! space, starting at the node's position. Each render fragment then draws the whole path
//! translated so the fragment's local start lands on the fragment's canvas start, clipped
//! to the fragment's horizontal extent.

use kurbo::{Affine, BezPath, Vec2};
use stave_scene::{Fragment, NodeId, Scene};
use stave_units::Point;

use crate::NotationError;

/// A path to draw for one render fragment, in canvas base units.
#[derive(Clone, Debug, PartialEq)]
pub struct PathSlice {
    /// The line the fragment is on, if the node is in a flowable.
    pub line: Option<usize>,
    /// The node's full path, placed for this fragment.
    pub path: BezPath,
    /// Horizontal canvas range to clip to. `None` draws the whole path.
    ///
    /// The last piece of a broken path is only clipped on the left.
    pub clip_x: Option<(f64, f64)>,
}

impl PathSlice {
    /// Place `local`, a path relative to its node's start, for `fragment`.
    pub fn for_fragment(local: &BezPath, fragment: &Fragment) -> Self {
        let start = fragment.start();
        let (local_start_x, length) = fragment.local_span();
        let offset = Vec2::new(
            (start.x - local_start_x).base_value(),
            start.y.base_value(),
        );
        let path = Affine::translate(offset) * local.clone();
        let left = start.x.base_value();
        let clip_x = match fragment {
            Fragment::Complete { .. } => None,
            Fragment::BeforeBreak { .. } | Fragment::SpanningContinuation { .. } => {
                Some((left, left + length.base_value()))
            }
            Fragment::AfterBreak { .. } => Some((left, f64::INFINITY)),
        };
        Self {
            line: fragment.line(),
            path,
            clip_x,
        }
    }
}

/// A notation object drawn as a single path on a spanner node.
pub trait SpannerPath {
    /// The spanner node.
    fn node(&self) -> NodeId;

    /// The full path relative to the node's start, in base units.
    fn local_path(&self, scene: &Scene) -> Result<BezPath, NotationError>;

    /// One placed path per render fragment of the node. The scene must be committed if
    /// the node is in a flowable.
    fn slices(&self, scene: &Scene) -> Result<Vec<PathSlice>, NotationError> {
        let local = self.local_path(scene)?;
        Ok(scene
            .fragments(self.node())?
            .iter()
            .map(|fragment| PathSlice::for_fragment(&local, fragment))
            .collect())
    }
}

pub(crate) fn move_to(path: &mut BezPath, p: Point) {
    path.move_to(p.to_kurbo());
}

pub(crate) fn line_to(path: &mut BezPath, p: Point) {
    path.line_to(p.to_kurbo());
}

pub(crate) fn curve_to(path: &mut BezPath, c1: Point, c2: Point, end: Point) {
    path.curve_to(c1.to_kurbo(), c2.to_kurbo(), end.to_kurbo());
}

/// Compare path elements point by point, within a small tolerance.
#[cfg(test)]
pub(crate) fn assert_path_close(actual: &BezPath, expected: &[kurbo::PathEl]) {
    use kurbo::PathEl;
    let actual = actual.elements();
    assert_eq!(actual.len(), expected.len(), "{actual:?}");
    for (a, e) in actual.iter().zip(expected) {
        let pairs: Vec<(kurbo::Point, kurbo::Point)> = match (a, e) {
            (PathEl::MoveTo(a), PathEl::MoveTo(e)) | (PathEl::LineTo(a), PathEl::LineTo(e)) => {
                vec![(*a, *e)]
            }
            (PathEl::CurveTo(a1, a2, a3), PathEl::CurveTo(e1, e2, e3)) => {
                vec![(*a1, *e1), (*a2, *e2), (*a3, *e3)]
            }
            _ => panic!("element mismatch: {a:?} vs {e:?}"),
        };
        for (a, e) in pairs {
            assert!(a.distance(e) < 1e-6, "{a:?} != {e:?}");
        }
    }
}
