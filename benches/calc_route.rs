//! Measure planning routes across a large map
//!
//! World is 512 by 512 cells with a scattering of cliffs
//!

use bevy_pathfinder_blocks_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Seeded map with roughly one cliff cell in ten
fn prepare_world(size: u32) -> GridWorld {
	let mut rng = StdRng::seed_from_u64(3);
	let mut terrain = TerrainMap::new(size, size);
	for y in 0..size {
		for x in 0..size {
			if rng.random_bool(0.1) {
				terrain.set_cell(&CellPos::new(x, y), TerrainCell::cliff());
			}
		}
	}
	// keep the corners used as endpoints open
	for cell in [CellPos::new(0, 0), CellPos::new(size - 1, size - 1), CellPos::new(60, 60)] {
		terrain.set_cell(&cell, TerrainCell::default());
	}
	let mut world = GridWorld::new(terrain);
	world
		.place_mover(
			MoverId::new(1),
			CellRect::from_cell(CellPos::new(0, 0)),
			MovementClass::Land,
			MoverStatus::Moving,
		)
		.unwrap();
	world
}

/// Plan a route and hop along it until the destination is reached
fn calc(pathfinder: &mut Pathfinder, world: &GridWorld, destination: CellPos) {
	let mut request = PathRequest::new(
		MoverId::new(1),
		MovementClass::Land,
		CellPos::new(0, 0),
		destination,
		0,
	);
	loop {
		let result = pathfinder.find_path(world, &mut request);
		if result != PathResult::Partial {
			break;
		}
		let Some(last) = request.get_fine_path().back().copied() else {
			break;
		};
		request.set_start(last);
	}
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let world = prepare_world(512);
	let mut pathfinder = Pathfinder::new(PathfinderConfig::default(), &world).unwrap();
	let mut group = c.benchmark_group("algorithm_use");
	group.significance_level(0.05).sample_size(50);
	group.bench_function("calc_route_local", |b| {
		b.iter(|| calc(&mut pathfinder, &world, black_box(CellPos::new(60, 60))))
	});
	group.bench_function("calc_route_across_map", |b| {
		b.iter(|| calc(&mut pathfinder, &world, black_box(CellPos::new(511, 511))))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
