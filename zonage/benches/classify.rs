//! Benchmarks pour la jointure spatiale et le pipeline complet

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geo::{Coord, LineString, Point, Polygon};
use zonage::classify::{spatial_join, ZoneIndex};
use zonage::precedence::resolve;
use zonage::types::{NormalizeStats, ZonePolygon};
use zonage::{Commune, Pipeline, PostalCode, Zone, ZoneLevel, ZoneSet};

fn disk(center: (f64, f64), radius: f64, points: usize) -> Polygon {
    let mut coords: Vec<Coord> = (0..points)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / points as f64;
            Coord {
                x: center.0 + radius * angle.cos(),
                y: center.1 + radius * angle.sin(),
            }
        })
        .collect();
    coords.push(coords[0]);
    Polygon::new(LineString::new(coords), vec![])
}

/// Plusieurs disques par zone, répartis sur une grille
fn zone(level: ZoneLevel, radius: f64) -> Zone {
    let polygons = (0..16)
        .map(|i| ZonePolygon {
            id: i.to_string(),
            polygon: disk(
                (2.0 + f64::from(i % 4) * 1.5, 44.0 + f64::from(i / 4) * 1.5),
                radius,
                256,
            ),
        })
        .collect();
    Zone {
        level,
        tolerance: level.default_tolerance(),
        polygons,
        stats: NormalizeStats::default(),
    }
}

fn zones() -> ZoneSet {
    ZoneSet {
        zone1: zone(ZoneLevel::Zone1, 0.1),
        zone2: zone(ZoneLevel::Zone2, 0.3),
        zone3: zone(ZoneLevel::Zone3, 0.6),
    }
}

/// Communes pseudo-aléatoires (LCG) sur l'emprise des zones
fn communes(count: usize) -> Vec<Commune> {
    let mut state: u64 = 42;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..count)
        .map(|i| Commune {
            name: format!("Commune {}", i),
            postal_code: PostalCode::normalize(&format!("{:05}", i % 100_000)),
            location: Some(Point::new(1.0 + next() * 7.0, 43.0 + next() * 7.0)),
        })
        .collect()
}

fn bench_spatial_join(c: &mut Criterion) {
    let resolved = resolve(&zones());
    let index = ZoneIndex::build(&resolved.zone3);

    let mut group = c.benchmark_group("spatial_join");
    for count in [1_000usize, 35_000] {
        let communes = communes(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &communes, |b, communes| {
            b.iter(|| black_box(spatial_join(black_box(communes), &index)))
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let zones = zones();
    let communes = communes(35_000);

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);
    group.bench_function("resolve_classify_aggregate", |b| {
        b.iter(|| {
            let output = Pipeline::new(zones.clone(), communes.clone()).run();
            black_box(output)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_spatial_join, bench_pipeline);
criterion_main!(benches);
