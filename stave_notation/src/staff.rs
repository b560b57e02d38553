// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Staves, their clef, key and time signature objects, and isolated fringe layout.

use stave_scene::{GlyphMetrics, LocalNode, NodeId, Scene};
use stave_units::{Point, Unit, UnitKind};

use crate::NotationError;

/// Line geometry of a staff.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StaffConfig {
    /// Number of staff lines.
    pub line_count: u8,
    /// Distance between adjacent lines. This is also the staff's unit.
    pub line_spacing: Unit,
}

impl StaffConfig {
    /// Builder-style line count.
    pub const fn with_line_count(mut self, line_count: u8) -> Self {
        self.line_count = line_count;
        self
    }

    /// Builder-style line spacing.
    pub const fn with_line_spacing(mut self, line_spacing: Unit) -> Self {
        self.line_spacing = line_spacing;
        self
    }
}

impl Default for StaffConfig {
    fn default() -> Self {
        Self {
            line_count: 5,
            line_spacing: Unit::mm(1.75),
        }
    }
}

/// A clef, drawn with a single glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clef {
    /// Glyph name, such as `gClef`.
    pub glyph: String,
}

impl Clef {
    /// A clef drawn with `glyph`.
    pub fn new(glyph: impl Into<String>) -> Self {
        Self {
            glyph: glyph.into(),
        }
    }
}

/// A key signature: `count` copies of an accidental glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySignature {
    /// Accidental glyph name, such as `accidentalSharp`.
    pub glyph: String,
    /// Number of accidentals. Zero for an open key.
    pub count: u8,
}

impl KeySignature {
    /// `count` accidentals drawn with `glyph`.
    pub fn new(glyph: impl Into<String>, count: u8) -> Self {
        Self {
            glyph: glyph.into(),
            count,
        }
    }
}

/// A time signature drawn as two stacked digit glyphs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeSignature {
    /// Glyph of the upper number.
    pub numerator_glyph: String,
    /// Glyph of the lower number.
    pub denominator_glyph: String,
}

impl TimeSignature {
    /// A time signature drawn with the given digit glyphs.
    pub fn new(numerator_glyph: impl Into<String>, denominator_glyph: impl Into<String>) -> Self {
        Self {
            numerator_glyph: numerator_glyph.into(),
            denominator_glyph: denominator_glyph.into(),
        }
    }
}

/// A staff: a scene node breakable over its length, plus the staff objects placed on it.
///
/// Staff objects are child nodes of the staff node. Their x positions are read back from
/// the scene, so moving them with [`Scene::set_x`] is reflected in fringe layout.
#[derive(Clone, Debug)]
pub struct Staff {
    node: NodeId,
    config: StaffConfig,
    length: Unit,
    unit_kind: UnitKind,
    clefs: Vec<(NodeId, Clef)>,
    key_signatures: Vec<(NodeId, KeySignature)>,
    time_signatures: Vec<(NodeId, TimeSignature)>,
}

impl Staff {
    /// Insert a staff node under `parent` (page 0 if `None`).
    ///
    /// Fails with [`NotationError::InvalidStaff`] for a staff without lines or with a
    /// non-positive line spacing.
    pub fn insert(
        scene: &mut Scene,
        parent: Option<NodeId>,
        pos: Point,
        length: Unit,
        config: StaffConfig,
    ) -> Result<Self, NotationError> {
        if config.line_count == 0 {
            return Err(NotationError::InvalidStaff("a staff needs at least one line"));
        }
        if config.line_spacing <= Unit::ZERO {
            return Err(NotationError::InvalidStaff("line spacing must be positive"));
        }
        let unit_kind = UnitKind::custom("StaffUnit", config.line_spacing.base_value())?;
        let node = scene.insert(parent, LocalNode::at(pos).with_breakable_length(length))?;
        Ok(Self {
            node,
            config,
            length,
            unit_kind,
            clefs: Vec::new(),
            key_signatures: Vec::new(),
            time_signatures: Vec::new(),
        })
    }

    /// The staff's scene node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Line geometry.
    pub fn config(&self) -> &StaffConfig {
        &self.config
    }

    /// Number of staff lines.
    pub fn line_count(&self) -> u8 {
        self.config.line_count
    }

    /// Distance between adjacent lines.
    pub fn line_spacing(&self) -> Unit {
        self.config.line_spacing
    }

    /// `value` staff units. One staff unit is the line spacing.
    pub fn unit(&self, value: f64) -> Unit {
        Unit::new(value, self.unit_kind)
    }

    /// Horizontal extent of the staff.
    pub fn length(&self) -> Unit {
        self.length
    }

    /// Change the staff's length, which is also its breakable length.
    pub fn set_length(&mut self, scene: &mut Scene, length: Unit) -> Result<(), NotationError> {
        scene.set_breakable_length(self.node, length)?;
        self.length = length;
        Ok(())
    }

    /// Distance from the top line to the bottom line. Zero for a one-line staff.
    pub fn height(&self) -> Unit {
        self.line_spacing() * f64::from(self.line_count() - 1)
    }

    /// The y position of the middle of the staff.
    pub fn center_y(&self) -> Unit {
        self.height() / 2.0
    }

    /// Whether `y` lies on or between the outer lines.
    pub fn y_inside_staff(&self, y: Unit) -> bool {
        Unit::ZERO <= y && y <= self.height()
    }

    /// Vertical extent of barlines: top to bottom line, or one line spacing above and
    /// below a one-line staff.
    pub fn barline_extent(&self) -> (Unit, Unit) {
        if self.line_count() == 1 {
            (-self.line_spacing(), self.line_spacing())
        } else {
            (Unit::ZERO, self.height())
        }
    }

    /// Place a clef at staff x position `x`.
    pub fn add_clef(&mut self, scene: &mut Scene, x: Unit, clef: Clef) -> Result<NodeId, NotationError> {
        let node = self.insert_object(scene, x)?;
        self.clefs.push((node, clef));
        Ok(node)
    }

    /// Place a key signature at staff x position `x`.
    pub fn add_key_signature(
        &mut self,
        scene: &mut Scene,
        x: Unit,
        key_signature: KeySignature,
    ) -> Result<NodeId, NotationError> {
        let node = self.insert_object(scene, x)?;
        self.key_signatures.push((node, key_signature));
        Ok(node)
    }

    /// Place a time signature at staff x position `x`.
    pub fn add_time_signature(
        &mut self,
        scene: &mut Scene,
        x: Unit,
        time_signature: TimeSignature,
    ) -> Result<NodeId, NotationError> {
        let node = self.insert_object(scene, x)?;
        self.time_signatures.push((node, time_signature));
        Ok(node)
    }

    fn insert_object(&self, scene: &mut Scene, x: Unit) -> Result<NodeId, NotationError> {
        Ok(scene.insert(Some(self.node), LocalNode::at(Point::new(x, Unit::ZERO)))?)
    }

    /// Clefs with their staff x positions, left to right.
    pub fn clefs<'a>(&'a self, scene: &Scene) -> Result<Vec<(Unit, &'a Clef)>, NotationError> {
        self.ordered(scene, &self.clefs)
    }

    /// Key signatures with their staff x positions, left to right.
    pub fn key_signatures<'a>(
        &'a self,
        scene: &Scene,
    ) -> Result<Vec<(Unit, &'a KeySignature)>, NotationError> {
        self.ordered(scene, &self.key_signatures)
    }

    /// Time signatures with their staff x positions, left to right.
    pub fn time_signatures<'a>(
        &'a self,
        scene: &Scene,
    ) -> Result<Vec<(Unit, &'a TimeSignature)>, NotationError> {
        self.ordered(scene, &self.time_signatures)
    }

    /// The clef in effect at staff x position `x`.
    pub fn active_clef_at<'a>(
        &'a self,
        scene: &Scene,
        x: Unit,
    ) -> Result<Option<(Unit, &'a Clef)>, NotationError> {
        Ok(active_at(self.clefs(scene)?, x))
    }

    /// The key signature in effect at staff x position `x`.
    pub fn active_key_signature_at<'a>(
        &'a self,
        scene: &Scene,
        x: Unit,
    ) -> Result<Option<(Unit, &'a KeySignature)>, NotationError> {
        Ok(active_at(self.key_signatures(scene)?, x))
    }

    /// The time signature in effect at staff x position `x`.
    pub fn active_time_signature_at<'a>(
        &'a self,
        scene: &Scene,
        x: Unit,
    ) -> Result<Option<(Unit, &'a TimeSignature)>, NotationError> {
        Ok(active_at(self.time_signatures(scene)?, x))
    }

    /// Staff x positions of every clef, key signature and time signature.
    pub fn fringe_object_positions(&self, scene: &Scene) -> Result<Vec<Unit>, NotationError> {
        let nodes = self
            .clefs
            .iter()
            .map(|(n, _)| *n)
            .chain(self.key_signatures.iter().map(|(n, _)| *n))
            .chain(self.time_signatures.iter().map(|(n, _)| *n));
        let mut out = Vec::new();
        for node in nodes {
            out.push(scene.descendant_pos_x(node, self.node)?);
        }
        out.sort_by(|a, b| a.base_value().total_cmp(&b.base_value()));
        Ok(out)
    }

    fn ordered<'a, T>(
        &self,
        scene: &Scene,
        objects: &'a [(NodeId, T)],
    ) -> Result<Vec<(Unit, &'a T)>, NotationError> {
        let mut out = Vec::with_capacity(objects.len());
        for (node, object) in objects {
            out.push((scene.descendant_pos_x(*node, self.node)?, object));
        }
        out.sort_by(|a, b| a.0.base_value().total_cmp(&b.0.base_value()));
        Ok(out)
    }
}

fn active_at<T>(ordered: Vec<(Unit, T)>, x: Unit) -> Option<(Unit, T)> {
    ordered.into_iter().take_while(|(pos, _)| *pos <= x).last()
}

/// Padding around fringe objects, in staff units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FringeConfig {
    /// Space between the fringe and the line's content.
    pub right_padding: f64,
    /// Space left of the clef.
    pub clef_left_padding: f64,
    /// Space left of the time signature.
    pub time_signature_left_padding: f64,
    /// Space left of the key signature.
    pub key_signature_left_padding: f64,
}

impl Default for FringeConfig {
    fn default() -> Self {
        Self {
            right_padding: 1.0,
            clef_left_padding: 0.5,
            time_signature_left_padding: 0.5,
            key_signature_left_padding: 0.5,
        }
    }
}

/// Where a staff's fringe objects sit at the start of a line.
///
/// Every field except `pos_x_in_staff` is an x offset from the start of the line's
/// content, so all are zero or negative.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StaffFringeLayout {
    /// Staff x position the line starts at.
    pub pos_x_in_staff: Unit,
    /// Where the staff lines start.
    pub staff: Unit,
    /// Where the clef is drawn.
    pub clef: Unit,
    /// Where the key signature is drawn.
    pub key_signature: Unit,
    /// Where the time signature is drawn.
    pub time_signature: Unit,
}

impl StaffFringeLayout {
    /// Total width the fringe needs left of the content.
    pub fn width(&self) -> Unit {
        -self.staff
    }

    /// Shift the staff start, clef and key signature left to `staff_basis`. Time
    /// signatures stay flush with the content.
    pub(crate) fn aligned_to(&self, staff_basis: Unit) -> Self {
        if self.staff == staff_basis {
            return *self;
        }
        let delta = staff_basis - self.staff;
        Self {
            pos_x_in_staff: self.pos_x_in_staff,
            staff: self.staff + delta,
            clef: self.clef + delta,
            key_signature: self.key_signature + delta,
            time_signature: self.time_signature,
        }
    }
}

/// The fringe layout `staff` would have at staff x position `pos_x_in_staff` if it were
/// alone in its system.
///
/// The fringe is built right to left from the content start: right padding, then the time
/// signature if one is placed exactly at `pos_x_in_staff`, then the key signature and clef
/// in effect there, each followed by its left padding. Glyph widths come from `glyphs`
/// and should already be scaled to the staff.
pub fn isolated_fringe_layout(
    scene: &Scene,
    staff: &Staff,
    pos_x_in_staff: Unit,
    glyphs: &dyn GlyphMetrics,
    config: &FringeConfig,
) -> Result<StaffFringeLayout, NotationError> {
    let mut x = -staff.unit(config.right_padding);

    let mut time_signature = x;
    if let Some((at, sig)) = staff.active_time_signature_at(scene, pos_x_in_staff)? {
        if at == pos_x_in_staff {
            let numerator = glyphs.glyph_info(&sig.numerator_glyph, None)?;
            let denominator = glyphs.glyph_info(&sig.denominator_glyph, None)?;
            x -= numerator
                .bounding_rect
                .width
                .max(denominator.bounding_rect.width);
            time_signature = x;
            x -= staff.unit(config.time_signature_left_padding);
        }
    }

    let mut key_signature = x;
    if let Some((_, key)) = staff.active_key_signature_at(scene, pos_x_in_staff)? {
        if key.count > 0 {
            let accidental = glyphs.glyph_info(&key.glyph, None)?;
            x -= accidental.advance_width * f64::from(key.count);
            key_signature = x;
            x -= staff.unit(config.key_signature_left_padding);
        }
    }

    let mut clef = x;
    if let Some((_, active)) = staff.active_clef_at(scene, pos_x_in_staff)? {
        let info = glyphs.glyph_info(&active.glyph, None)?;
        x -= info.bounding_rect.width;
        clef = x;
        x -= staff.unit(config.clef_left_padding);
    }

    Ok(StaffFringeLayout {
        pos_x_in_staff,
        staff: x,
        clef,
        key_signature,
        time_signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stave_scene::{GlyphInfo, GlyphTable};
    use stave_units::UnitRect;

    fn glyph(width: f64) -> GlyphInfo {
        GlyphInfo::new(
            UnitRect::new(Unit::ZERO, Unit::ZERO, Unit::mm(width), Unit::mm(4.0)),
            Unit::mm(width),
        )
    }

    fn test_glyphs() -> GlyphTable {
        GlyphTable::new("Test")
            .with_glyph("gClef", glyph(5.0))
            .with_glyph("fClef", glyph(4.0))
            .with_glyph("accidentalSharp", glyph(1.0))
            .with_glyph("timeSig4", glyph(2.0))
            .with_glyph("timeSig12", glyph(3.0))
    }

    fn staff(scene: &mut Scene) -> Staff {
        Staff::insert(
            scene,
            None,
            Point::ORIGIN,
            Unit::mm(200.0),
            StaffConfig::default().with_line_spacing(Unit::mm(2.0)),
        )
        .unwrap()
    }

    #[test]
    fn geometry() {
        let mut scene = Scene::default();
        let five = staff(&mut scene);
        assert_eq!(five.height(), Unit::mm(8.0));
        assert_eq!(five.center_y(), Unit::mm(4.0));
        assert_eq!(five.unit(1.5), Unit::mm(3.0));
        assert_eq!(five.unit(1.5).display_value(), 1.5);
        assert!(five.y_inside_staff(Unit::mm(8.0)));
        assert!(!five.y_inside_staff(Unit::mm(-0.5)));
        assert_eq!(five.barline_extent(), (Unit::ZERO, Unit::mm(8.0)));
        assert_eq!(scene.breakable_length(five.node()).unwrap(), Unit::mm(200.0));

        let one = Staff::insert(
            &mut scene,
            None,
            Point::ORIGIN,
            Unit::mm(50.0),
            StaffConfig::default().with_line_count(1),
        )
        .unwrap();
        assert!(one.height().is_zero());
        assert_eq!(one.barline_extent(), (Unit::mm(-1.75), Unit::mm(1.75)));
    }

    #[test]
    fn invalid_staff_configs() {
        let mut scene = Scene::default();
        let no_lines = StaffConfig::default().with_line_count(0);
        assert!(matches!(
            Staff::insert(&mut scene, None, Point::ORIGIN, Unit::mm(10.0), no_lines),
            Err(NotationError::InvalidStaff(_))
        ));
        let flat = StaffConfig::default().with_line_spacing(Unit::ZERO);
        assert!(Staff::insert(&mut scene, None, Point::ORIGIN, Unit::mm(10.0), flat).is_err());
    }

    #[test]
    fn active_objects_follow_staff_positions() {
        let mut scene = Scene::default();
        let mut staff = staff(&mut scene);
        staff.add_clef(&mut scene, Unit::mm(50.0), Clef::new("fClef")).unwrap();
        let first = staff.add_clef(&mut scene, Unit::ZERO, Clef::new("gClef")).unwrap();
        assert_eq!(staff.active_clef_at(&scene, Unit::mm(10.0)).unwrap().unwrap().1.glyph, "gClef");
        assert_eq!(staff.active_clef_at(&scene, Unit::mm(50.0)).unwrap().unwrap().1.glyph, "fClef");
        scene.set_x(first, Unit::mm(60.0)).unwrap();
        assert_eq!(staff.active_clef_at(&scene, Unit::mm(70.0)).unwrap().unwrap().1.glyph, "gClef");
        assert!(staff.active_clef_at(&scene, Unit::mm(10.0)).unwrap().is_none());
    }

    #[test]
    fn isolated_layout_at_staff_start() {
        let mut scene = Scene::default();
        let mut staff = staff(&mut scene);
        staff.add_clef(&mut scene, Unit::ZERO, Clef::new("gClef")).unwrap();
        staff
            .add_key_signature(&mut scene, Unit::ZERO, KeySignature::new("accidentalSharp", 3))
            .unwrap();
        staff
            .add_time_signature(&mut scene, Unit::ZERO, TimeSignature::new("timeSig12", "timeSig4"))
            .unwrap();
        let layout = isolated_fringe_layout(
            &scene,
            &staff,
            Unit::ZERO,
            &test_glyphs(),
            &FringeConfig::default(),
        )
        .unwrap();
        // Right padding 2mm, time signature 3mm, padding 1mm, key 3mm, padding 1mm,
        // clef 5mm, padding 1mm.
        assert_eq!(layout.time_signature, Unit::mm(-5.0));
        assert_eq!(layout.key_signature, Unit::mm(-9.0));
        assert_eq!(layout.clef, Unit::mm(-15.0));
        assert_eq!(layout.staff, Unit::mm(-16.0));
        assert_eq!(layout.width(), Unit::mm(16.0));
    }

    #[test]
    fn later_lines_skip_earlier_time_signatures() {
        let mut scene = Scene::default();
        let mut staff = staff(&mut scene);
        staff.add_clef(&mut scene, Unit::ZERO, Clef::new("gClef")).unwrap();
        staff
            .add_time_signature(&mut scene, Unit::ZERO, TimeSignature::new("timeSig4", "timeSig4"))
            .unwrap();
        let layout = isolated_fringe_layout(
            &scene,
            &staff,
            Unit::mm(80.0),
            &test_glyphs(),
            &FringeConfig::default(),
        )
        .unwrap();
        assert_eq!(layout.time_signature, Unit::mm(-2.0));
        assert_eq!(layout.key_signature, Unit::mm(-2.0));
        assert_eq!(layout.clef, Unit::mm(-7.0));
        assert_eq!(layout.staff, Unit::mm(-8.0));
    }

    #[test]
    fn missing_glyphs_are_reported() {
        let mut scene = Scene::default();
        let mut staff = staff(&mut scene);
        staff.add_clef(&mut scene, Unit::ZERO, Clef::new("cClef")).unwrap();
        let err = isolated_fringe_layout(
            &scene,
            &staff,
            Unit::ZERO,
            &test_glyphs(),
            &FringeConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            NotationError::Scene(stave_scene::SceneError::GlyphNotFound { .. })
        ));
    }

    #[test]
    fn alignment_keeps_time_signatures_flush() {
        let layout = StaffFringeLayout {
            pos_x_in_staff: Unit::ZERO,
            staff: Unit::mm(-8.0),
            clef: Unit::mm(-7.0),
            key_signature: Unit::mm(-2.0),
            time_signature: Unit::mm(-2.0),
        };
        let aligned = layout.aligned_to(Unit::mm(-12.0));
        assert_eq!(aligned.staff, Unit::mm(-12.0));
        assert_eq!(aligned.clef, Unit::mm(-11.0));
        assert_eq!(aligned.key_signature, Unit::mm(-6.0));
        assert_eq!(aligned.time_signature, Unit::mm(-2.0));
        assert_eq!(layout.aligned_to(Unit::mm(-8.0)), layout);
    }
}
