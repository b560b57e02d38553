// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engrave a two-staff system.
//!
//! Lays out a treble and bass staff across a long flowable, beams a run of eighths and
//! sixteenths that crosses a line break, slurs the run and adds a hairpin below it,
//! registers fringe margins, and renders through a sink that logs every fragment and
//! collects staff lines and beams into one path.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p stave_demos --example engrave_system`

use std::collections::HashSet;

use kurbo::{BezPath, Shape};
use stave_notation::{
    ArcConfig, BeamConfig, BeamGroup, Chord, Clef, Duration, Hairpin, HairpinKind, KeySignature,
    Slur, SpannerPath, Staff, StaffConfig, StaffGroup, TimeSignature,
};
use stave_scene::{
    FlowableConfig, GlyphInfo, GlyphMetrics, GlyphTable, NodeId, RenderContext, RenderSink, Scene,
    SpannerEnd,
};
use stave_units::{Point, Unit, UnitRect};
use tracing_subscriber::EnvFilter;

fn glyph(width: f64) -> GlyphInfo {
    GlyphInfo::new(
        UnitRect::new(Unit::ZERO, Unit::mm(-3.0), Unit::mm(width), Unit::mm(6.0)),
        Unit::mm(width),
    )
}

/// Rough Bravura proportions at a 1.75mm staff space.
fn glyphs() -> GlyphTable {
    GlyphTable::new("Bravura")
        .with_glyph("gClef", glyph(4.7))
        .with_glyph("fClef", glyph(4.4))
        .with_glyph("accidentalFlat", glyph(1.6))
        .with_glyph("timeSig3", glyph(2.5))
        .with_glyph("timeSig4", glyph(2.5))
}

struct LoggingSink<'a> {
    group: &'a mut StaffGroup,
    glyphs: &'a dyn GlyphMetrics,
    beams: HashSet<NodeId>,
    path: BezPath,
}

impl LoggingSink<'_> {
    fn draw(&mut self, ctx: &RenderContext<'_>) {
        if self.group.staff(ctx.node).is_some() {
            match self
                .group
                .segment_for_fragment(ctx.scene, ctx.node, ctx.fragment, self.glyphs)
            {
                Ok(segment) => {
                    for line in segment.lines() {
                        self.path.extend(line.path_elements(0.1));
                    }
                }
                Err(err) => tracing::warn!(%err, "staff segment failed"),
            }
        } else if self.beams.contains(&ctx.node) {
            self.path.extend(ctx.fragment.to_kurbo_line().path_elements(0.1));
        }
    }
}

impl RenderSink for LoggingSink<'_> {
    fn render_complete(&mut self, ctx: &RenderContext<'_>, pos: Point) {
        tracing::debug!(node = ?ctx.node, %pos, "complete");
        self.draw(ctx);
    }

    fn render_before_break(
        &mut self,
        ctx: &RenderContext<'_>,
        _local_start_x: Unit,
        start: Point,
        stop: Point,
        _dist_to_line_start: Unit,
    ) {
        tracing::debug!(node = ?ctx.node, %start, %stop, "before break");
        self.draw(ctx);
    }

    fn render_spanning_continuation(
        &mut self,
        ctx: &RenderContext<'_>,
        local_start_x: Unit,
        start: Point,
        stop: Point,
    ) {
        tracing::debug!(node = ?ctx.node, %local_start_x, %start, %stop, "continuation");
        self.draw(ctx);
    }

    fn render_after_break(&mut self, ctx: &RenderContext<'_>, local_start_x: Unit, start: Point) {
        tracing::debug!(node = ?ctx.node, %local_start_x, %start, "after break");
        self.draw(ctx);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut scene = Scene::default();
    let flowable = scene
        .insert_flowable(
            None,
            Point::ORIGIN,
            FlowableConfig::new(Unit::mm(400.0), Unit::mm(30.0)),
        )
        .unwrap();

    let mut treble = Staff::insert(
        &mut scene,
        Some(flowable),
        Point::ORIGIN,
        Unit::mm(400.0),
        StaffConfig::default(),
    )
    .unwrap();
    treble.add_clef(&mut scene, Unit::ZERO, Clef::new("gClef")).unwrap();
    treble
        .add_key_signature(&mut scene, Unit::ZERO, KeySignature::new("accidentalFlat", 2))
        .unwrap();
    treble
        .add_time_signature(&mut scene, Unit::ZERO, TimeSignature::new("timeSig3", "timeSig4"))
        .unwrap();

    let mut bass = Staff::insert(
        &mut scene,
        Some(flowable),
        Point::new(Unit::ZERO, Unit::mm(15.0)),
        Unit::mm(400.0),
        StaffConfig::default(),
    )
    .unwrap();
    bass.add_clef(&mut scene, Unit::ZERO, Clef::new("fClef")).unwrap();

    // Eighth, two sixteenths, eighth: the sixteenths share a secondary beam.
    let eighth = Duration::new(1, 8).unwrap();
    let sixteenth = Duration::new(1, 16).unwrap();
    let notes = [
        (140.0, 3.0, eighth),
        (146.0, 2.5, sixteenth),
        (152.0, 2.0, sixteenth),
        (158.0, 1.5, eighth),
    ];
    let mut chords: Vec<_> = notes
        .iter()
        .map(|&(x, y, duration)| {
            Chord::insert(&mut scene, &treble, Unit::mm(x), [treble.unit(y)], duration).unwrap()
        })
        .collect();
    let beams = BeamGroup::layout(&mut scene, &treble, &mut chords, &BeamConfig::default()).unwrap();
    println!(
        "beam direction {:?}, slope {:.3}, {} segments",
        beams.direction(),
        beams.line().slope,
        beams.beams().len()
    );
    for chord in &chords {
        println!("stem ends at {:?}", chord.stem_end().map(|y| y.display_value()));
    }

    let slur = Slur::insert(
        &mut scene,
        &treble,
        treble.node(),
        Point::new(Unit::mm(140.0), treble.unit(-1.0)),
        SpannerEnd::SelfNode,
        Point::new(Unit::mm(18.0), treble.unit(-2.5)),
        ArcConfig::default(),
    )
    .unwrap();
    let hairpin = Hairpin::insert(
        &mut scene,
        &treble,
        treble.node(),
        Point::new(Unit::mm(140.0), treble.unit(7.0)),
        SpannerEnd::SelfNode,
        Point::new(Unit::mm(20.0), Unit::ZERO),
        HairpinKind::Crescendo,
        None,
    )
    .unwrap();

    let mut group = StaffGroup::new();
    group.add_staff(treble);
    group.add_staff(bass);
    let glyphs = glyphs();
    let margins = group.register_margin_controllers(&mut scene, &glyphs).unwrap();
    println!("registered {margins} fringe margins");

    let mut sink = LoggingSink {
        group: &mut group,
        glyphs: &glyphs,
        beams: beams.beams().iter().map(|b| b.node).collect(),
        path: BezPath::new(),
    };
    let summary = scene.render(&mut sink).unwrap();
    for slice in slur.slices(&scene).unwrap().iter().chain(&hairpin.slices(&scene).unwrap()) {
        println!(
            "spanner slice on line {:?}, clip {:?}",
            slice.line, slice.clip_x
        );
        sink.path.extend(slice.path.iter());
    }
    println!(
        "{} lines over {} pages; path bounds {:?}",
        summary.lines,
        scene.page_count(),
        sink.path.bounding_box()
    );
}
