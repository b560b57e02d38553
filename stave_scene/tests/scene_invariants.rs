// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based invariants of mapping, flowable layout and render dispatch.
//!
//! 1. Mapping a node to itself is the origin, and mapping is antisymmetric.
//! 2. Flowable lines tile the flowable's length without gaps or overlap.
//! 3. Lines never run backwards across pages.
//! 4. Fragments of a node cover its breakable length exactly.

use proptest::prelude::*;
use stave_scene::{
    FlowableConfig, Fragment, LocalNode, MarginController, NodeFlags, NodeId, Paper, Scene,
    SceneConfig,
};
use stave_units::{Point, Unit};

// ── Helpers ─────────────────────────────────────────────────────────────

fn mm(x: f64, y: f64) -> Point {
    Point::new(Unit::mm(x), Unit::mm(y))
}

fn offset_strategy() -> impl Strategy<Value = (f64, f64)> {
    (-200.0..200.0_f64, -200.0..200.0_f64)
}

/// Builds a random tree under page 0 and returns every inserted node.
fn random_tree(scene: &mut Scene, shape: &[(usize, (f64, f64))]) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    for &(parent, (x, y)) in shape {
        let parent = if nodes.is_empty() {
            None
        } else {
            Some(nodes[parent % nodes.len()])
        };
        nodes.push(scene.insert(parent, LocalNode::at(mm(x, y))).unwrap());
    }
    nodes
}

fn tree_strategy() -> impl Strategy<Value = Vec<(usize, (f64, f64))>> {
    prop::collection::vec((any::<usize>(), offset_strategy()), 1..24)
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs().base_value() < 1e-6 && (a.y - b.y).abs().base_value() < 1e-6
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Mapping
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn mapping_is_antisymmetric(shape in tree_strategy(), i in any::<usize>(), j in any::<usize>()) {
        let mut scene = Scene::default();
        let nodes = random_tree(&mut scene, &shape);
        let a = nodes[i % nodes.len()];
        let b = nodes[j % nodes.len()];
        prop_assert_eq!(scene.map_to(a, a).unwrap(), Point::ORIGIN);
        let there = scene.map_to(a, b).unwrap();
        let back = scene.map_to(b, a).unwrap();
        prop_assert!(close(there, -back), "a->b {:?} but b->a {:?}", there, back);
        // Outside flowables, mapping agrees with canvas positions.
        let canvas = scene.canvas_pos(b).unwrap() - scene.canvas_pos(a).unwrap();
        prop_assert!(close(there, canvas), "mapped {:?} but canvas delta {:?}", there, canvas);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2 and 3. Flowable line layout
// ═════════════════════════════════════════════════════════════════════════

fn layout_strategy() -> impl Strategy<Value = (f64, f64, Vec<f64>, Vec<(f64, f64)>)> {
    (
        1.0..3000.0_f64,
        5.0..120.0_f64,
        prop::collection::vec(0.0..3000.0_f64, 0..12),
        prop::collection::vec((0.0..3000.0_f64, 0.0..60.0_f64), 0..4),
    )
}

proptest! {
    #[test]
    fn lines_tile_the_flowable((length, height, opps, margins) in layout_strategy()) {
        let mut scene = Scene::default();
        let flowable = scene
            .insert_flowable(None, Point::ORIGIN, FlowableConfig::new(Unit::mm(length), Unit::mm(height)))
            .unwrap();
        for x in opps {
            scene
                .insert(
                    Some(flowable),
                    LocalNode::at(mm(x, 0.0))
                        .with_flags(NodeFlags::VISIBLE | NodeFlags::BREAK_OPPORTUNITY),
                )
                .unwrap();
        }
        for (x, margin) in margins {
            scene
                .add_margin_controller(flowable, MarginController::new(Unit::mm(x), Unit::mm(margin)))
                .unwrap();
        }
        let summary = scene.commit().unwrap();
        let lines = scene.flowable(flowable).unwrap().lines().unwrap();
        prop_assert_eq!(summary.lines, lines.len());
        prop_assert_eq!(lines[0].flowable_x, Unit::ZERO);
        for pair in lines.windows(2) {
            prop_assert_eq!(pair[0].flowable_end_x(), pair[1].flowable_x);
            prop_assert!(pair[0].length > Unit::ZERO);
            prop_assert!(pair[0].page <= pair[1].page);
            if pair[0].page == pair[1].page {
                prop_assert!(pair[0].pos.y < pair[1].pos.y);
            }
        }
        let covered = scene.flowable(flowable).unwrap().covered_length().unwrap();
        prop_assert_eq!(covered, Unit::mm(length));
        prop_assert_eq!(scene.page_count(), lines.last().unwrap().page + 1);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Dispatch covers breakable lengths
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fragments_cover_breakable_length(start in 0.0..900.0_f64, span in 0.0..1500.0_f64) {
        prop_assume!(start + span < 2000.0);
        let mut scene = Scene::default();
        let flowable = scene
            .insert_flowable(None, Point::ORIGIN, FlowableConfig::new(Unit::mm(2000.0), Unit::mm(30.0)))
            .unwrap();
        let node = scene
            .insert(
                Some(flowable),
                LocalNode::at(mm(start, 4.0)).with_breakable_length(Unit::mm(span)),
            )
            .unwrap();
        scene.commit().unwrap();
        let fragments = scene.fragments(node).unwrap();
        let total: Unit = fragments.iter().map(|f| f.local_span().1).sum();
        prop_assert_eq!(total, Unit::mm(span));

        match fragments.as_slice() {
            [Fragment::Complete { .. }] => {}
            [Fragment::BeforeBreak { .. }, middle @ .., Fragment::AfterBreak { .. }] => {
                for fragment in middle {
                    let is_continuation = matches!(fragment, Fragment::SpanningContinuation { .. });
                    prop_assert!(is_continuation);
                }
                for pair in fragments.windows(2) {
                    prop_assert_eq!(pair[0].line().map(|l| l + 1), pair[1].line());
                }
            }
            other => prop_assert!(false, "unexpected fragment sequence {:?}", other),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Scenarios
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn long_flowable_on_letter_paper() {
    let mut scene = Scene::new(SceneConfig::default().with_paper(Paper::LETTER));
    let flowable = scene
        .insert_flowable(
            None,
            Point::ORIGIN,
            FlowableConfig::new(Unit::mm(2000.0), Unit::mm(30.0)).with_y_padding(Unit::mm(5.0)),
        )
        .unwrap();
    let summary = scene.commit().unwrap();
    let lines = scene.flowable(flowable).unwrap().lines().unwrap();
    assert_eq!(summary.lines, lines.len());
    assert!(lines.len() > 1, "a 2m flowable must wrap");
    assert_eq!(lines[0].flowable_x, Unit::ZERO);
    for pair in lines.windows(2) {
        assert!(pair[0].flowable_x < pair[1].flowable_x, "flowable x must increase");
        assert!(pair[0].page <= pair[1].page, "pages must not decrease");
    }
    assert_eq!(
        scene.flowable(flowable).unwrap().covered_length().unwrap(),
        Unit::mm(2000.0)
    );
}

#[test]
fn long_object_renders_once_per_line() {
    #[derive(Default)]
    struct Count {
        complete: usize,
        before: usize,
        continuation: usize,
        after: usize,
    }

    impl stave_scene::RenderSink for Count {
        fn render_complete(&mut self, _ctx: &stave_scene::RenderContext<'_>, _pos: Point) {
            self.complete += 1;
        }

        fn render_before_break(
            &mut self,
            _ctx: &stave_scene::RenderContext<'_>,
            _local_start_x: Unit,
            _start: Point,
            _stop: Point,
            _dist_to_line_start: Unit,
        ) {
            self.before += 1;
        }

        fn render_spanning_continuation(
            &mut self,
            _ctx: &stave_scene::RenderContext<'_>,
            _local_start_x: Unit,
            _start: Point,
            _stop: Point,
        ) {
            self.continuation += 1;
        }

        fn render_after_break(
            &mut self,
            _ctx: &stave_scene::RenderContext<'_>,
            _local_start_x: Unit,
            _start: Point,
        ) {
            self.after += 1;
        }
    }

    let mut scene = Scene::default();
    let flowable = scene
        .insert_flowable(
            None,
            Point::ORIGIN,
            FlowableConfig::new(Unit::mm(1000.0), Unit::mm(20.0)),
        )
        .unwrap();
    // 170mm lines; starting at 100mm and running 600mm ends on the fifth line.
    scene
        .insert(
            Some(flowable),
            LocalNode::at(mm(100.0, 0.0)).with_breakable_length(Unit::mm(600.0)),
        )
        .unwrap();
    let mut sink = Count::default();
    scene.render(&mut sink).unwrap();
    assert_eq!(sink.complete, 0);
    assert_eq!(sink.before, 1);
    assert_eq!(sink.continuation, 3);
    assert_eq!(sink.after, 1);
}
