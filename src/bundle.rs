//! Bundle spawned once per map. It carries the [GridWorld] describing the
//! terrain and occupants of the map alongside the [Pathfinder] that routes
//! across it
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Components needed to route movers across one map
#[derive(Bundle)]
pub struct PathfinderBundle {
	/// Cached grids and search state
	pathfinder: Pathfinder,
	/// Terrain and occupants the pathfinder reads from
	world: GridWorld,
	/// Size of the map and its blocks
	map_dimensions: MapDimensions,
}

impl PathfinderBundle {
	/// Create a new instance of [PathfinderBundle] from a terrain map
	pub fn new(terrain: TerrainMap, config: PathfinderConfig) -> Result<Self, PathfinderError> {
		let world = GridWorld::new(terrain);
		let pathfinder = Pathfinder::new(config, &world)?;
		let map_dimensions = *pathfinder.get_dimensions();
		Ok(PathfinderBundle {
			pathfinder,
			world,
			map_dimensions,
		})
	}
	/// Create a new instance of [PathfinderBundle] where the terrain and the
	/// configuration are read from disk
	#[cfg(feature = "ron")]
	pub fn new_from_disk(terrain_path: &str, config_path: &str) -> Result<Self, PathfinderError> {
		let terrain = TerrainMap::from_ron(terrain_path)?;
		let config = PathfinderConfig::from_ron(config_path)?;
		PathfinderBundle::new(terrain, config)
	}
	/// Create a new instance of [PathfinderBundle] from a saved layout, the
	/// terrain must match the size recorded in the layout
	pub fn from_layout(
		layout: &PathfinderLayout,
		terrain: TerrainMap,
		config: PathfinderConfig,
	) -> Result<Self, PathfinderError> {
		let world = GridWorld::new(terrain);
		let pathfinder = Pathfinder::from_layout(layout, config, &world)?;
		let map_dimensions = *pathfinder.get_dimensions();
		Ok(PathfinderBundle {
			pathfinder,
			world,
			map_dimensions,
		})
	}
	pub fn get_pathfinder(&self) -> &Pathfinder {
		&self.pathfinder
	}
	pub fn get_world(&self) -> &GridWorld {
		&self.world
	}
}
