//! Tuning knobs of the pathfinder. Every client of a lockstep game must use
//! identical values, they are part of the simulation state
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Budgets and penalties used by the searches and the amortised
/// recomputation of dirty data
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Clone, Debug, PartialEq, Eq, Reflect)]
pub struct PathfinderConfig {
	/// Edge length of a block in cells
	pub block_size: u32,
	/// Largest distance (Chebyshev, in cells) the low-level search window
	/// may extend from the start cell
	pub max_window_cells: u32,
	/// Minimum number of cells the window extends beyond the start and
	/// destination
	pub window_margin: u32,
	/// Number of nodes a single low-level or flying search may expand
	/// before giving up with `OutOfRange`
	pub max_search_nodes: usize,
	/// Dirty cells recomputed per movement class on each `advance`
	pub cells_per_advance: usize,
	/// Dirty blocks recomputed per movement class on each `advance`
	pub blocks_per_advance: usize,
	/// Searches a single order may run before the mover is told to give up
	pub max_replans: u32,
	/// Consecutive blocked ticks after which a mover asks for a new path
	pub blocked_ticks_before_replan: u32,
	/// How far around an impassable destination to look for a substitute
	pub substitute_goal_radius: u32,
	/// Extra cost of every 45 degree turn made by an aircraft
	pub flight_turn_penalty: u32,
	/// Margin of the flying search window around the start and destination
	pub flight_margin: u32,
}

impl Default for PathfinderConfig {
	fn default() -> Self {
		PathfinderConfig {
			block_size: DEFAULT_BLOCK_SIZE,
			max_window_cells: 96,
			window_margin: 8,
			max_search_nodes: 16384,
			cells_per_advance: 4096,
			blocks_per_advance: 32,
			max_replans: 16,
			blocked_ticks_before_replan: 8,
			substitute_goal_radius: 8,
			flight_turn_penalty: 60,
			flight_margin: 16,
		}
	}
}

impl PathfinderConfig {
	/// Reject values that would make a search or the recomputation
	/// schedule unable to make progress
	pub fn validate(&self) -> Result<(), PathfinderError> {
		if self.block_size == 0 {
			return Err(PathfinderError::InvalidConfig(
				"block_size must be at least 1".to_string(),
			));
		}
		if self.max_window_cells < self.block_size {
			return Err(PathfinderError::InvalidConfig(format!(
				"max_window_cells ({}) must be at least block_size ({})",
				self.max_window_cells, self.block_size
			)));
		}
		if self.max_search_nodes == 0 {
			return Err(PathfinderError::InvalidConfig(
				"max_search_nodes must be at least 1".to_string(),
			));
		}
		if self.cells_per_advance == 0 || self.blocks_per_advance == 0 {
			return Err(PathfinderError::InvalidConfig(
				"advance budgets must be at least 1".to_string(),
			));
		}
		if self.blocked_ticks_before_replan == 0 {
			return Err(PathfinderError::InvalidConfig(
				"blocked_ticks_before_replan must be at least 1".to_string(),
			));
		}
		Ok(())
	}
	/// From a `ron` file generate the [PathfinderConfig], missing fields take
	/// their default value
	#[cfg(feature = "ron")]
	pub fn from_ron(path: &str) -> Result<Self, PathfinderError> {
		let file = std::fs::File::open(path)?;
		let config: PathfinderConfig = ron::de::from_reader(file)?;
		config.validate()?;
		Ok(config)
	}
}
