//! Map builders shared by the integration tests
//!
#![allow(dead_code)]

use bevy_pathfinder_blocks_plugin::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Build a world from rows of terrain characters
pub fn ascii_world(rows: &[&str]) -> GridWorld {
	GridWorld::new(TerrainMap::from_ascii(rows).unwrap())
}

/// Seeded map of open ground scattered with cliffs, forest and slopes
pub fn random_terrain(seed: u64, width: u32, height: u32, cliff_chance: f64) -> TerrainMap {
	let mut rng = StdRng::seed_from_u64(seed);
	let mut map = TerrainMap::new(width, height);
	for y in 0..height {
		for x in 0..width {
			let terrain = if rng.random_bool(cliff_chance) {
				TerrainCell::cliff()
			} else {
				match rng.random_range(0..10) {
					0 | 1 => TerrainCell::ground(1, 3),
					2 => TerrainCell::ground(4, 0),
					_ => TerrainCell::default(),
				}
			};
			map.set_cell(&CellPos::new(x, y), terrain);
		}
	}
	map
}

/// Pick a seeded cell a land mover can stand on
pub fn random_open_cell(rng: &mut StdRng, world: &GridWorld) -> CellPos {
	let (width, height) = world.get_dimensions();
	loop {
		let cell = CellPos::new(rng.random_range(0..width), rng.random_range(0..height));
		let open = world
			.get_terrain(&cell)
			.is_some_and(|t| t.is_passable(MovementClass::Land));
		if open {
			return cell;
		}
	}
}

/// Register a single cell mover and create its request
pub fn spawn_request(
	world: &mut GridWorld,
	id: u64,
	class: MovementClass,
	start: CellPos,
	destination: CellPos,
	range: u32,
) -> PathRequest {
	let mover = MoverId::new(id);
	world
		.place_mover(mover, CellRect::from_cell(start), class, MoverStatus::Moving)
		.unwrap();
	PathRequest::new(mover, class, start, destination, range)
}

/// Total cost of walking `path` from `start` using the terrain costs of
/// `class`
pub fn terrain_cost_of(world: &GridWorld, class: MovementClass, start: CellPos, path: &[CellPos]) -> u32 {
	let mut previous = start;
	let mut total = 0;
	for cell in path {
		let diagonal = previous.get_x() != cell.get_x() && previous.get_y() != cell.get_y();
		let step = if diagonal { DIAGONAL_STEP } else { ORTHOGONAL_STEP };
		let cost = world
			.get_terrain(cell)
			.and_then(|t| t.get_terrain_cost(class))
			.unwrap();
		total += step * cost;
		previous = *cell;
	}
	total
}

/// Whether every step of `path` moves to one of the 8 neighbours
pub fn is_connected(start: CellPos, path: &[CellPos]) -> bool {
	let mut previous = start;
	for cell in path {
		if previous.chebyshev_distance(cell) != 1 {
			return false;
		}
		previous = *cell;
	}
	true
}
