//! A* over a [BlockGrid]. Nodes are blocks and edges are the
//! [BlockConnection]s between them. The result is a corridor, the ordered
//! blocks a route should pass through, used to bound the low-level search
//! over long distances and to reject unreachable destinations without
//! paying for a cell level search
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Route across the block graph
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Corridor {
	/// Blocks from the start block to a goal block inclusive
	pub blocks: Vec<BlockID>,
	/// Centers of the blocks after the start block followed by the
	/// destination
	pub waypoints: Vec<CellPos>,
	/// Sum of the connection costs
	pub cost: u32,
	/// Revision of the grid the corridor was planned on
	pub revision: u64,
}

/// Reusable state of the block level A*
#[derive(Clone, Debug, Default)]
pub struct HighLevelSearch {
	/// Best known cost per block
	g: Vec<u32>,
	/// Parent of each block, `u32::MAX` for none
	parents: Vec<u32>,
	/// Whether each block has been expanded
	closed: Vec<bool>,
	/// Pending blocks
	open: OpenList,
}

impl HighLevelSearch {
	/// Create a new instance of [HighLevelSearch]
	pub fn new() -> Self {
		HighLevelSearch::default()
	}
	/// Plan a corridor from the block of `start` to any block touching the
	/// goal zone. [None] when the goal is unreachable across the block graph
	pub fn search(&mut self, grid: &BlockGrid, start: CellPos, zone: &GoalZone) -> Option<Corridor> {
		let dimensions = *grid.get_dimensions();
		let start_block = dimensions.get_block_of(&start)?;
		let start_index = dimensions.get_block_index(&start_block)?;
		let mut goal_blocks: Vec<BlockID> = dimensions
			.get_blocks_in_rect(&zone.get_rect())
			.into_iter()
			.filter(|b| grid.get_block(b).is_some_and(|d| d.get_center().is_some()))
			.collect();
		goal_blocks.sort();
		if goal_blocks.is_empty() {
			trace!("No block around {:?} has a center", zone.get_destination());
			return None;
		}
		// cover of the goal blocks, measuring to it never overestimates the
		// distance from a center to a goal center
		let mut goal_cover: Option<CellRect> = None;
		for block in goal_blocks.iter() {
			if let Some(rect) = dimensions.get_block_rect(block) {
				goal_cover = Some(goal_cover.map_or(rect, |c| c.union(&rect)));
			}
		}
		let goal_cover = goal_cover?;
		let heuristic = |block: &BlockID| -> u32 {
			if goal_blocks.binary_search(block).is_ok() {
				return 0;
			}
			let position = grid
				.get_block(block)
				.and_then(|d| d.get_center())
				.unwrap_or(start);
			let (dx, dy) = goal_cover.axis_distance(&position);
			octile_distance(dx, dy)
		};
		let count = dimensions.get_block_count();
		self.g.clear();
		self.g.resize(count, u32::MAX);
		self.parents.clear();
		self.parents.resize(count, u32::MAX);
		self.closed.clear();
		self.closed.resize(count, false);
		self.open.clear();
		self.g[start_index] = 0;
		self.open.push(heuristic(&start_block), start_index);
		let columns = dimensions.get_block_columns() as usize;
		let to_block = |index: usize| BlockID::new((index % columns) as u32, (index / columns) as u32);
		while let Some((_f, _seq, index)) = self.open.pop() {
			if self.closed[index] {
				continue;
			}
			self.closed[index] = true;
			let block = to_block(index);
			if goal_blocks.binary_search(&block).is_ok() {
				return Some(self.build_corridor(grid, index, zone, &to_block));
			}
			for (neighbour, connection) in grid.get_connections(&block) {
				let Some(n) = dimensions.get_block_index(&neighbour) else {
					continue;
				};
				if self.closed[n] {
					continue;
				}
				let tentative = self.g[index].saturating_add(connection.get_cost());
				if tentative < self.g[n] {
					self.g[n] = tentative;
					self.parents[n] = index as u32;
					self.open
						.push(tentative.saturating_add(heuristic(&neighbour)), n);
				}
			}
		}
		trace!(
			"Block graph has no route from {:?} to {:?}",
			start,
			zone.get_destination()
		);
		None
	}
	/// Walk back from the goal block to form the [Corridor]
	fn build_corridor(
		&self,
		grid: &BlockGrid,
		goal: usize,
		zone: &GoalZone,
		to_block: &impl Fn(usize) -> BlockID,
	) -> Corridor {
		let mut blocks = vec![to_block(goal)];
		let mut current = goal;
		while self.parents[current] != u32::MAX {
			current = self.parents[current] as usize;
			blocks.push(to_block(current));
		}
		blocks.reverse();
		let mut waypoints: Vec<CellPos> = blocks
			.iter()
			.skip(1)
			.filter_map(|b| grid.get_block(b).and_then(|d| d.get_center()))
			.collect();
		waypoints.push(zone.get_destination());
		Corridor {
			blocks,
			waypoints,
			cost: self.g[goal],
			revision: grid.get_revision(),
		}
	}
}
