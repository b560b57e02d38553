// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use stave_scene::{FlowableConfig, LocalNode, NodeId, Scene};
use stave_units::{Point, Unit};

/// A flowable `length` millimeters long with `count` evenly spaced objects, every tenth of
/// which spans 60mm.
fn build_scene(length: f64, count: usize) -> (Scene, NodeId, Vec<NodeId>) {
    let mut scene = Scene::default();
    let flowable = scene
        .insert_flowable(
            None,
            Point::ORIGIN,
            FlowableConfig::new(Unit::mm(length), Unit::mm(20.0)),
        )
        .unwrap();
    let step = length / count as f64;
    let mut nodes = Vec::with_capacity(count);
    for i in 0..count {
        let mut local = LocalNode::at(Point::new(Unit::mm(i as f64 * step), Unit::mm(2.0)));
        if i % 10 == 0 {
            local = local.with_breakable_length(Unit::mm(60.0).min(Unit::mm(length - i as f64 * step)));
        }
        nodes.push(scene.insert(Some(flowable), local).unwrap());
    }
    (scene, flowable, nodes)
}

fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("flowable_commit");
    for &(length, count) in &[(2_000.0, 200_usize), (20_000.0, 2_000), (100_000.0, 10_000)] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("len_{length}_nodes_{count}"), |b| {
            b.iter_batched(
                || build_scene(length, count).0,
                |mut scene| {
                    black_box(scene.commit().unwrap());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let (mut scene, flowable, nodes) = build_scene(20_000.0, 2_000);
    scene.commit().unwrap();
    let mut group = c.benchmark_group("flowable_queries");
    group.throughput(Throughput::Elements(nodes.len() as u64));
    group.bench_function("canvas_pos_all", |b| {
        b.iter(|| {
            for &node in &nodes {
                black_box(scene.canvas_pos(node).unwrap());
            }
        });
    });
    group.bench_function("map_to_flowable_all", |b| {
        b.iter(|| {
            for &node in &nodes {
                black_box(scene.map_to(flowable, node).unwrap());
            }
        });
    });
    group.bench_function("map_between_neighbors", |b| {
        b.iter(|| {
            for pair in nodes.windows(2) {
                black_box(scene.map_to(pair[0], pair[1]).unwrap());
            }
        });
    });
    group.bench_function("fragments_all", |b| {
        b.iter(|| {
            for &node in &nodes {
                black_box(scene.fragments(node).unwrap());
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_commit, bench_queries);
criterion_main!(benches);
