//! Properties every client of a lockstep game relies on, checked over
//! seeded random maps
//!

mod common;

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use bevy_pathfinder_blocks_plugin::prelude::*;
use common::*;
use rand::{rngs::StdRng, SeedableRng};

/// Cheapest cost from `start` to every cell using the movement rules of the
/// cell level search: 8 neighbours, diagonals only between two open
/// corners, each step paying the cost of the cell entered
fn dijkstra(world: &GridWorld, start: CellPos) -> Vec<u32> {
	let (width, height) = world.get_dimensions();
	let index = |c: &CellPos| (c.get_y() * width + c.get_x()) as usize;
	let cost = |c: &CellPos| {
		world
			.get_terrain(c)
			.and_then(|t| t.get_terrain_cost(MovementClass::Land))
	};
	let dimensions = MapDimensions::new(width, height, DEFAULT_BLOCK_SIZE);
	let mut distance = vec![u32::MAX; (width * height) as usize];
	let mut heap = BinaryHeap::new();
	distance[index(&start)] = 0;
	heap.push(Reverse((0, index(&start))));
	while let Some(Reverse((d, i))) = heap.pop() {
		if d > distance[i] {
			continue;
		}
		let cell = CellPos::new(i as u32 % width, i as u32 / width);
		for ordinal in Ordinal::ALL {
			let Some(next) = dimensions.get_neighbour(&cell, ordinal) else {
				continue;
			};
			let Some(step_cost) = cost(&next) else {
				continue;
			};
			if let Some((a, b)) = ordinal.get_orthogonal_components() {
				let open = [a, b].into_iter().all(|o| {
					dimensions
						.get_neighbour(&cell, o)
						.is_some_and(|c| cost(&c).is_some())
				});
				if !open {
					continue;
				}
			}
			let candidate = d + ordinal.get_step_cost() * step_cost;
			let n = index(&next);
			if candidate < distance[n] {
				distance[n] = candidate;
				heap.push(Reverse((candidate, n)));
			}
		}
	}
	distance
}

#[test]
fn local_routes_are_optimal() {
	let config = PathfinderConfig {
		window_margin: 32,
		..Default::default()
	};
	for seed in 0..12 {
		let mut world = GridWorld::new(random_terrain(seed, 24, 24, 0.25));
		let mut rng = StdRng::seed_from_u64(seed + 1000);
		let start = random_open_cell(&mut rng, &world);
		let destination = random_open_cell(&mut rng, &world);
		if start == destination {
			continue;
		}
		let distances = dijkstra(&world, start);
		let mut request = spawn_request(&mut world, 1, MovementClass::Land, start, destination, 0);
		let mut pathfinder = Pathfinder::new(config.clone(), &world).unwrap();
		let result = pathfinder.find_path(&world, &mut request);
		let best = distances[(destination.get_y() * 24 + destination.get_x()) as usize];
		if best == u32::MAX {
			assert_eq!(PathResult::NoPath, result, "seed {}", seed);
			continue;
		}
		assert_eq!(PathResult::GoalReached, result, "seed {}", seed);
		let path: Vec<CellPos> = request.get_fine_path().iter().copied().collect();
		assert!(is_connected(start, &path));
		assert_eq!(Some(&destination), path.last());
		assert_eq!(
			best,
			terrain_cost_of(&world, MovementClass::Land, start, &path),
			"seed {}",
			seed
		);
	}
}

/// Run every request against a fresh pathfinder in the given order and
/// return the results indexed by mover
fn run_requests(terrain: &TerrainMap, orders: &[(CellPos, CellPos)], reverse: bool) -> Vec<(PathResult, Vec<CellPos>)> {
	let mut world = GridWorld::new(terrain.clone());
	let mut requests: Vec<PathRequest> = orders
		.iter()
		.enumerate()
		.map(|(i, (start, destination))| {
			spawn_request(&mut world, i as u64, MovementClass::Land, *start, *destination, 1)
		})
		.collect();
	let mut pathfinder = Pathfinder::new(PathfinderConfig::default(), &world).unwrap();
	let mut order: Vec<usize> = (0..requests.len()).collect();
	if reverse {
		order.reverse();
	}
	for i in order {
		pathfinder.find_path(&world, &mut requests[i]);
	}
	requests
		.iter()
		.map(|r| (r.get_result(), r.get_fine_path().iter().copied().collect()))
		.collect()
}

#[test]
fn results_do_not_depend_on_request_order() {
	for seed in 0..4 {
		let terrain = random_terrain(seed, 160, 64, 0.2);
		let world = GridWorld::new(terrain.clone());
		let mut rng = StdRng::seed_from_u64(seed + 50);
		let mut orders = Vec::new();
		let mut used = Vec::new();
		while orders.len() < 10 {
			let start = random_open_cell(&mut rng, &world);
			let destination = random_open_cell(&mut rng, &world);
			if used.contains(&start) {
				continue;
			}
			used.push(start);
			orders.push((start, destination));
		}
		let forward = run_requests(&terrain, &orders, false);
		let again = run_requests(&terrain, &orders, false);
		let backward = run_requests(&terrain, &orders, true);
		assert_eq!(forward, again, "seed {}", seed);
		assert_eq!(forward, backward, "seed {}", seed);
	}
}

#[test]
fn range_relaxation() {
	let mut terrain = TerrainMap::new(20, 20);
	// wall off the destination with a ring of cliffs
	for cell in CellRect::around(CellPos::new(10, 10), 1).iter() {
		if cell != CellPos::new(10, 10) {
			terrain.set_cell(&cell, TerrainCell::cliff());
		}
	}
	let mut world = GridWorld::new(terrain);
	let start = CellPos::new(2, 10);
	let destination = CellPos::new(10, 10);
	let mut request = spawn_request(&mut world, 1, MovementClass::Land, start, destination, 0);
	let mut pathfinder = Pathfinder::new(PathfinderConfig::default(), &world).unwrap();
	for range in [0, 1] {
		request.set_order(start, destination, range);
		assert_eq!(PathResult::NoPath, pathfinder.find_path(&world, &mut request), "range {}", range);
	}
	request.set_order(start, destination, 2);
	assert_eq!(PathResult::GoalReached, pathfinder.find_path(&world, &mut request));
	let last = *request.get_fine_path().back().unwrap();
	assert_eq!(2, last.chebyshev_distance(&destination));
	// stops at the first cell of the zone rather than walking to its middle
	assert_eq!(CellPos::new(8, 10), last);
}

#[test]
fn invalidation_stays_local() {
	let mut world = GridWorld::new(random_terrain(9, 48, 48, 0.1));
	let start = CellPos::new(0, 0);
	let destination = CellPos::new(10, 10);
	for cell in [start, destination] {
		world.set_terrain(cell, TerrainCell::default());
	}
	let mut request = spawn_request(&mut world, 1, MovementClass::Land, start, destination, 0);
	let mut pathfinder = Pathfinder::new(PathfinderConfig::default(), &world).unwrap();
	let first = pathfinder.find_path(&world, &mut request);
	let first_path = request.get_fine_path().clone();
	// far away edits outside of the search window
	for x in 36..44 {
		if let Some(rect) = world.set_terrain(CellPos::new(x, 40), TerrainCell::cliff()) {
			pathfinder.terrain_changed(&rect);
		}
	}
	let rect = world
		.place_mover(
			MoverId::new(7),
			CellRect::new(40, 30, 41, 31),
			MovementClass::Land,
			MoverStatus::Standing,
		)
		.unwrap();
	pathfinder.cells_occupied_status_changed(&rect);
	pathfinder.advance(&world);
	request.set_order(start, destination, 0);
	assert_eq!(first, pathfinder.find_path(&world, &mut request));
	assert_eq!(&first_path, request.get_fine_path());
}

#[test]
fn blocks_connect_only_across_open_borders() {
	for seed in 0..6 {
		let world = GridWorld::new(random_terrain(seed, 40, 36, 0.45));
		let config = PathfinderConfig {
			block_size: 8,
			..Default::default()
		};
		let pathfinder = Pathfinder::new(config, &world).unwrap();
		let dimensions = *pathfinder.get_dimensions();
		let grid = pathfinder.get_block_grids().get(MovementClass::Land).unwrap();
		let open = |c: CellPos| {
			world
				.get_terrain(&c)
				.is_some_and(|t| t.is_passable(MovementClass::Land))
		};
		for column in 0..dimensions.get_block_columns() {
			for row in 0..dimensions.get_block_rows() {
				let block = BlockID::new(column, row);
				let rect = dimensions.get_block_rect(&block).unwrap();
				let east = BlockID::new(column + 1, row);
				if dimensions.contains_block(&east) {
					let x = rect.get_max().get_x();
					let border = (rect.get_min().get_y()..=rect.get_max().get_y())
						.any(|y| open(CellPos::new(x, y)) && open(CellPos::new(x + 1, y)));
					let connected = grid.get_connection(&block, &east).is_some();
					assert_eq!(border, connected, "seed {} {:?} east", seed, block);
				}
				let south = BlockID::new(column, row + 1);
				if dimensions.contains_block(&south) {
					let y = rect.get_max().get_y();
					let border = (rect.get_min().get_x()..=rect.get_max().get_x())
						.any(|x| open(CellPos::new(x, y)) && open(CellPos::new(x, y + 1)));
					let connected = grid.get_connection(&block, &south).is_some();
					assert_eq!(border, connected, "seed {} {:?} south", seed, block);
				}
			}
		}
	}
}
