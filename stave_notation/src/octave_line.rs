// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Octave lines: an `8va`-style mark followed by a dashed line ending in a hook.
//!
//! The mark repeats at the start of every later line the octave line crosses, there in
//! parentheses. The line runs beneath those repeated marks, so sinks should draw marks
//! with an opaque background.

use kurbo::BezPath;
use stave_scene::{Fragment, GlyphMetrics, LocalNode, NodeId, Scene, Spanner, SpannerEnd};
use stave_units::{Point, Unit};

use crate::path::{line_to, move_to};
use crate::{NotationError, SpannerPath, Staff, VerticalDirection};

const PARENS: (&str, &str) = ("octaveParensLeft", "octaveParensRight");

/// Which octave transposition an [`OctaveLine`] marks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OctaveIndication {
    /// Two octaves up, `15ma`.
    QuindicesimaAlta,
    /// One octave up, `8va`.
    OttavaAlta,
    /// One octave down, `8vb`.
    OttavaBassa,
    /// Two octaves down, `15mb`.
    QuindicesimaBassa,
}

impl OctaveIndication {
    /// The glyph drawing the mark.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::QuindicesimaAlta => "quindicesimaAlta",
            Self::OttavaAlta => "ottavaAlta",
            Self::OttavaBassa => "ottavaBassaVb",
            Self::QuindicesimaBassa => "quindicesimaBassaMb",
        }
    }
}

/// The glyphs of one occurrence of the octave mark.
#[derive(Clone, Debug, PartialEq)]
pub struct OctaveMark {
    /// The line the mark is drawn on, if the octave line is in a flowable.
    pub line: Option<usize>,
    /// Canvas position of the first glyph's origin.
    pub pos: Point,
    /// Glyph names, left to right.
    pub glyphs: Vec<&'static str>,
}

/// A dashed octave line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OctaveLine {
    node: NodeId,
    indication: OctaveIndication,
    hook: VerticalDirection,
    unit: Unit,
    text_width: Unit,
    text_height: Unit,
}

impl OctaveLine {
    /// Dash stroke thickness, in staff units.
    pub const THICKNESS: f64 = 0.16;

    /// Hook length at the line's end, in staff units.
    pub const HOOK_LENGTH: f64 = 0.75;

    /// Insert an octave line from `pos` relative to `parent`, ending `end_x` right of
    /// `end_parent` and level with the start.
    ///
    /// `hook` is the direction of the end hook: down for lines above a staff. The
    /// indication and parenthesis glyphs must be known to `glyphs`.
    pub fn insert(
        scene: &mut Scene,
        staff: &Staff,
        parent: NodeId,
        pos: Point,
        end_parent: SpannerEnd,
        end_x: Unit,
        indication: OctaveIndication,
        hook: VerticalDirection,
        glyphs: &dyn GlyphMetrics,
    ) -> Result<Self, NotationError> {
        let text = glyphs.glyph_info(indication.glyph(), None)?;
        glyphs.glyph_info(PARENS.0, None)?;
        glyphs.glyph_info(PARENS.1, None)?;
        let node = scene.insert(Some(parent), LocalNode::at(pos))?;
        if let Err(err) = scene.set_spanner(node, Spanner::horizontal(end_x, end_parent)) {
            if let Err(cleanup) = scene.remove(node) {
                tracing::warn!(%node, %cleanup, "could not remove octave line node");
            }
            return Err(err.into());
        }
        Ok(Self {
            node,
            indication,
            hook,
            unit: staff.unit(1.0),
            text_width: text.bounding_rect.width,
            text_height: text.bounding_rect.height,
        })
    }

    /// The octave transposition marked.
    pub fn indication(&self) -> OctaveIndication {
        self.indication
    }

    /// Direction of the end hook.
    pub fn hook(&self) -> VerticalDirection {
        self.hook
    }

    /// Dash stroke thickness.
    pub fn thickness(&self) -> Unit {
        self.unit * Self::THICKNESS
    }

    /// One mark per render fragment: the plain indication where the line starts, and the
    /// parenthesized indication at the start of every later line.
    pub fn marks(&self, scene: &Scene) -> Result<Vec<OctaveMark>, NotationError> {
        let glyph = self.indication.glyph();
        Ok(scene
            .fragments(self.node)?
            .iter()
            .map(|fragment| {
                let glyphs = match fragment {
                    Fragment::Complete { .. } | Fragment::BeforeBreak { .. } => vec![glyph],
                    Fragment::SpanningContinuation { .. } | Fragment::AfterBreak { .. } => {
                        vec![PARENS.0, glyph, PARENS.1]
                    }
                };
                OctaveMark {
                    line: fragment.line(),
                    pos: fragment.start(),
                    glyphs,
                }
            })
            .collect())
    }
}

impl SpannerPath for OctaveLine {
    fn node(&self) -> NodeId {
        self.node
    }

    /// The dashed line, vertically centered on the mark and starting after it.
    fn local_path(&self, scene: &Scene) -> Result<BezPath, NotationError> {
        let end_x = scene.spanner_x_length(self.node)?;
        let y = -(self.text_height / 2.0);
        let hook_y = y + self.unit * (Self::HOOK_LENGTH * self.hook.sign());
        let mut path = BezPath::new();
        move_to(&mut path, Point::new(self.text_width, y));
        line_to(&mut path, Point::new(end_x, y));
        line_to(&mut path, Point::new(end_x, hook_y));
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaffConfig;
    use crate::path::assert_path_close;
    use kurbo::PathEl;
    use stave_scene::{FlowableConfig, GlyphInfo, GlyphTable, SceneError};
    use stave_units::UnitRect;

    fn mm(x: f64, y: f64) -> Point {
        Point::new(Unit::mm(x), Unit::mm(y))
    }

    fn glyph(width: f64, height: f64) -> GlyphInfo {
        GlyphInfo::new(
            UnitRect::new(Unit::ZERO, Unit::ZERO, Unit::mm(width), Unit::mm(height)),
            Unit::mm(width),
        )
    }

    fn glyphs() -> GlyphTable {
        GlyphTable::new("Test")
            .with_glyph("ottavaAlta", glyph(4.0, 3.0))
            .with_glyph("octaveParensLeft", glyph(1.0, 3.0))
            .with_glyph("octaveParensRight", glyph(1.0, 3.0))
    }

    /// A 400mm flowable holding a staff with a 2mm unit.
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
    fn dashed_line_follows_the_mark_and_hooks_toward_the_staff() {
        let (mut scene, staff) = setup();
        let line = OctaveLine::insert(
            &mut scene,
            &staff,
            staff.node(),
            mm(10.0, -6.0),
            SpannerEnd::SelfNode,
            Unit::mm(50.0),
            OctaveIndication::OttavaAlta,
            VerticalDirection::Down,
            &glyphs(),
        )
        .unwrap();
        assert_path_close(
            &line.local_path(&scene).unwrap(),
            &[
                PathEl::MoveTo(mm(4.0, -1.5).to_kurbo()),
                PathEl::LineTo(mm(50.0, -1.5).to_kurbo()),
                PathEl::LineTo(mm(50.0, 0.0).to_kurbo()),
            ],
        );
        assert_eq!(line.thickness(), Unit::mm(0.32));

        scene.commit().unwrap();
        let marks = line.marks(&scene).unwrap();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].glyphs, ["ottavaAlta"]);
        assert_eq!(marks[0].pos, mm(30.0, 14.0));
    }

    #[test]
    fn mark_repeats_in_parentheses_after_breaks() {
        let (mut scene, staff) = setup();
        let line = OctaveLine::insert(
            &mut scene,
            &staff,
            staff.node(),
            mm(150.0, -6.0),
            SpannerEnd::SelfNode,
            Unit::mm(220.0),
            OctaveIndication::OttavaAlta,
            VerticalDirection::Down,
            &glyphs(),
        )
        .unwrap();
        scene.commit().unwrap();
        let marks = line.marks(&scene).unwrap();
        let glyphs: Vec<_> = marks.iter().map(|m| m.glyphs.len()).collect();
        assert_eq!(glyphs, [1, 3, 3]);
        assert_eq!(marks[1].glyphs, ["octaveParensLeft", "ottavaAlta", "octaveParensRight"]);
        assert_eq!(marks[2].line, Some(2));
        assert_eq!(line.slices(&scene).unwrap().len(), 3);
    }

    #[test]
    fn unknown_indication_glyph_is_reported() {
        let (mut scene, staff) = setup();
        let children = scene.children(staff.node()).unwrap().len();
        let result = OctaveLine::insert(
            &mut scene,
            &staff,
            staff.node(),
            Point::ORIGIN,
            SpannerEnd::SelfNode,
            Unit::mm(50.0),
            OctaveIndication::QuindicesimaBassa,
            VerticalDirection::Up,
            &glyphs(),
        );
        assert!(matches!(
            result,
            Err(NotationError::Scene(SceneError::GlyphNotFound { .. }))
        ));
        assert_eq!(scene.children(staff.node()).unwrap().len(), children);
    }
}
