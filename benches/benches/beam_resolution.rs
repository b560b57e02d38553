// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use stave_notation::{
    BeamConfig, BeamGroup, BeamSpec, Chord, Duration, Staff, StaffConfig, resolve_beam_layout,
};
use stave_scene::Scene;
use stave_units::{Point, Unit};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn flags(&mut self) -> u8 {
        1 + (self.next_u64() % 4) as u8
    }
}

fn random_group(rng: &mut Rng, len: usize) -> Vec<BeamSpec> {
    (0..len)
        .map(|_| {
            let flags = rng.flags();
            let spec = BeamSpec::new(flags);
            if flags > 1 && rng.next_u64() % 4 == 0 {
                spec.with_break_depth(1)
            } else {
                spec
            }
        })
        .collect()
}

fn bench_resolution(c: &mut Criterion) {
    let mut rng = Rng::new(0x5eed_cafe);
    let groups: Vec<_> = (0..256).map(|i| random_group(&mut rng, 2 + i % 14)).collect();
    c.bench_function("resolve_beam_layout_256_groups", |b| {
        b.iter(|| {
            for group in &groups {
                black_box(resolve_beam_layout(group).unwrap());
            }
        });
    });
}

fn bench_layout(c: &mut Criterion) {
    let sixteenth = Duration::new(1, 16).unwrap();
    c.bench_function("beam_group_layout_8_chords", |b| {
        b.iter_batched(
            || {
                let mut scene = Scene::default();
                let staff = Staff::insert(
                    &mut scene,
                    None,
                    Point::ORIGIN,
                    Unit::mm(150.0),
                    StaffConfig::default(),
                )
                .unwrap();
                let chords: Vec<_> = (0..8_u8)
                    .map(|i| {
                        let y = staff.unit(1.0 + f64::from(i % 3) * 0.5);
                        Chord::insert(&mut scene, &staff, Unit::mm(10.0 + f64::from(i) * 8.0), [y], sixteenth)
                            .unwrap()
                    })
                    .collect();
                (scene, staff, chords)
            },
            |(mut scene, staff, mut chords)| {
                black_box(
                    BeamGroup::layout(&mut scene, &staff, &mut chords, &BeamConfig::default())
                        .unwrap(),
                );
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_resolution, bench_layout);
criterion_main!(benches);
