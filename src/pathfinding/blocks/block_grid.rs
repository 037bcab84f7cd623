//! A [BlockGrid] summarises the map for one ground movement class. Each
//! block records a representative center, the cell nearest the middle of
//! the largest 4-connected passable region inside it, and the mean cost of
//! that region. Each pair of orthogonally adjacent blocks sharing at least
//! one passable pair of border cells is joined by a [BlockConnection].
//!
//! ```text
//!  ________________ ________________
//! |                |                |
//! |       C -------|------- C       |
//! |       |        |        |       |
//! |_______|________|________|_______|
//! |       |        |                |
//! |       C        |   ##########   |
//! |                |   #   C        |
//! |________________|___#____________|
//! ```
//!
//! Changes mark blocks dirty and [BlockGrid::resolve_dirty] recomputes a
//! bounded number of them at a time. Every recompute that moves a center or
//! makes or breaks a connection bumps the grid revision so routes planned
//! over the old layout can be detected as stale
//!

use std::collections::VecDeque;

use crate::prelude::*;
use bevy::prelude::*;

/// Multiplier applied to the straight line distance between two centers
/// when they are joined by a passable border but no route exists between
/// them inside the two blocks
pub const DETACHED_CENTER_PENALTY: u32 = 8;

/// Summary of a single block
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockData {
	/// Representative cell, [None] when no cell of the block is passable
	center: Option<CellPos>,
	/// Mean traversal cost of the largest region rounded up
	cost: u32,
	/// Number of cells in the largest region
	region_size: u32,
}

impl BlockData {
	/// Get the center
	pub fn get_center(&self) -> Option<CellPos> {
		self.center
	}
	/// Get the cost
	pub fn get_cost(&self) -> u32 {
		self.cost
	}
	/// Get the size of the largest region
	pub fn get_region_size(&self) -> u32 {
		self.region_size
	}
}

/// Undirected edge between two adjacent blocks
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockConnection {
	/// Cost of travelling from one center to the other
	cost: u32,
	/// Number of passable cell pairs across the shared border
	border_cells: u32,
}

impl BlockConnection {
	/// Get the cost
	pub fn get_cost(&self) -> u32 {
		self.cost
	}
	/// Get the number of passable border pairs
	pub fn get_border_cells(&self) -> u32 {
		self.border_cells
	}
}

/// Block level summary of the map for a single ground movement class
#[derive(Clone, Debug)]
pub struct BlockGrid {
	/// Size of the map
	dimensions: MapDimensions,
	/// Class served
	class: MovementClass,
	/// Block summaries in row-major block order
	blocks: Vec<BlockData>,
	/// Connection of each block to its eastern neighbour
	east: Vec<Option<BlockConnection>>,
	/// Connection of each block to its southern neighbour
	south: Vec<Option<BlockConnection>>,
	/// Indices of dirty blocks in marking order
	dirty: VecDeque<usize>,
	/// Whether a block is queued in `dirty`
	dirty_flags: Vec<bool>,
	/// Bumped whenever a center moves or a connection appears or vanishes
	revision: u64,
}

impl BlockGrid {
	/// Create a new instance of [BlockGrid] computing every block and
	/// connection
	pub fn new(
		dimensions: MapDimensions,
		class: MovementClass,
		cells: &mut CellStatusGrid,
		world: &dyn WorldView,
		search: &mut LowLevelSearch,
	) -> Self {
		let count = dimensions.get_block_count();
		let mut grid = BlockGrid {
			dimensions,
			class,
			blocks: vec![BlockData::default(); count],
			east: vec![None; count],
			south: vec![None; count],
			dirty: VecDeque::new(),
			dirty_flags: vec![false; count],
			revision: 0,
		};
		for index in 0..count {
			grid.blocks[index] = grid.compute_block(index, cells, world);
		}
		for index in 0..count {
			grid.recompute_connections(index, cells, world, search);
		}
		debug!(
			"Built {:?} block grid of {}x{} blocks",
			class,
			dimensions.get_block_columns(),
			dimensions.get_block_rows()
		);
		grid
	}
	/// Get the map dimensions
	pub fn get_dimensions(&self) -> &MapDimensions {
		&self.dimensions
	}
	/// Get the movement class
	pub fn get_class(&self) -> MovementClass {
		self.class
	}
	/// Get the revision
	pub fn get_revision(&self) -> u64 {
		self.revision
	}
	/// Number of blocks waiting to be recomputed
	pub fn get_dirty_count(&self) -> usize {
		self.dirty.len()
	}
	/// Whether a block is waiting to be recomputed
	pub fn is_dirty(&self, block: &BlockID) -> bool {
		self.dimensions
			.get_block_index(block)
			.is_some_and(|i| self.dirty_flags[i])
	}
	/// Get the summary of a block
	pub fn get_block(&self, block: &BlockID) -> Option<&BlockData> {
		self.dimensions
			.get_block_index(block)
			.map(|i| &self.blocks[i])
	}
	/// The connection between two blocks in either order, [None] if they are
	/// not adjacent or not connected
	pub fn get_connection(&self, a: &BlockID, b: &BlockID) -> Option<BlockConnection> {
		let (first, second) = if a <= b { (a, b) } else { (b, a) };
		let index = self.dimensions.get_block_index(first)?;
		self.dimensions.get_block_index(second)?;
		// BlockID orders by column then row
		if first.get_row() == second.get_row() && first.get_column() + 1 == second.get_column() {
			self.east[index]
		} else if first.get_column() == second.get_column() && first.get_row() + 1 == second.get_row() {
			self.south[index]
		} else {
			None
		}
	}
	/// Every connection of a block with the neighbour it leads to, in North,
	/// East, South, West order
	pub fn get_connections(&self, block: &BlockID) -> Vec<(BlockID, BlockConnection)> {
		self.dimensions
			.get_ordinal_and_ids_of_neighbouring_blocks(block)
			.into_iter()
			.filter_map(|(_, n)| self.get_connection(block, &n).map(|c| (n, c)))
			.collect()
	}
	/// Queue a block for recomputation. Returns `false` if it does not exist
	/// or was already queued
	pub fn mark_dirty(&mut self, block: &BlockID) -> bool {
		let Some(index) = self.dimensions.get_block_index(block) else {
			return false;
		};
		if self.dirty_flags[index] {
			return false;
		}
		self.dirty_flags[index] = true;
		self.dirty.push_back(index);
		true
	}
	/// Queue every block overlapping `rect`, returns how many were newly
	/// queued
	pub fn mark_rect_dirty(&mut self, rect: &CellRect) -> usize {
		self.dimensions
			.get_blocks_in_rect(rect)
			.iter()
			.filter(|b| self.mark_dirty(b))
			.count()
	}
	/// Recompute up to `budget` dirty blocks in marking order, then the
	/// connections of each of them. Returns how many blocks were recomputed
	pub fn resolve_dirty(
		&mut self,
		cells: &mut CellStatusGrid,
		world: &dyn WorldView,
		search: &mut LowLevelSearch,
		budget: usize,
	) -> usize {
		let mut recomputed = Vec::new();
		let mut changed = false;
		while recomputed.len() < budget {
			let Some(index) = self.dirty.pop_front() else {
				break;
			};
			if !self.dirty_flags[index] {
				continue;
			}
			self.dirty_flags[index] = false;
			let data = self.compute_block(index, cells, world);
			if data.center != self.blocks[index].center {
				changed = true;
			}
			self.blocks[index] = data;
			recomputed.push(index);
		}
		for index in recomputed.iter() {
			if self.recompute_connections(*index, cells, world, search) {
				changed = true;
			}
		}
		if changed {
			self.revision += 1;
			debug!(
				"{:?} block grid now at revision {}",
				self.class, self.revision
			);
		}
		recomputed.len()
	}
	/// [BlockID] of a row-major block index
	fn block_id(&self, index: usize) -> BlockID {
		let columns = self.dimensions.get_block_columns() as usize;
		BlockID::new((index % columns) as u32, (index / columns) as u32)
	}
	/// Find the largest 4-connected passable region of a block and derive
	/// its center and cost
	fn compute_block(
		&self,
		index: usize,
		cells: &mut CellStatusGrid,
		world: &dyn WorldView,
	) -> BlockData {
		let Some(rect) = self.dimensions.get_block_rect(&self.block_id(index)) else {
			return BlockData::default();
		};
		let width = rect.get_width() as usize;
		let height = rect.get_height() as usize;
		let area = rect.get_area();
		// 0 is unlabelled, u32::MAX is impassable
		let mut labels = vec![0u32; area];
		let mut costs = vec![0u32; area];
		for (i, cell) in rect.iter().enumerate() {
			match cells.resolve(&cell, world) {
				Some(status) if status.is_passable() => costs[i] = status.get_cost(),
				_ => labels[i] = u32::MAX,
			}
		}
		let mut best_label = 0;
		let mut best_size = 0;
		let mut next_label = 1;
		let mut stack = Vec::new();
		for seed in 0..area {
			if labels[seed] != 0 {
				continue;
			}
			let label = next_label;
			next_label += 1;
			labels[seed] = label;
			stack.push(seed);
			let mut size = 0;
			while let Some(i) = stack.pop() {
				size += 1;
				let (x, y) = (i % width, i / width);
				let mut visit = |n: usize| {
					if labels[n] == 0 {
						labels[n] = label;
						stack.push(n);
					}
				};
				if y > 0 {
					visit(i - width);
				}
				if x + 1 < width {
					visit(i + 1);
				}
				if y + 1 < height {
					visit(i + width);
				}
				if x > 0 {
					visit(i - 1);
				}
			}
			if size > best_size {
				best_size = size;
				best_label = label;
			}
		}
		if best_size == 0 {
			return BlockData::default();
		}
		// doubled coordinates keep the geometric center integral
		let center_x = width as i64 - 1;
		let center_y = height as i64 - 1;
		let mut center = 0;
		let mut nearest = i64::MAX;
		let mut total: u64 = 0;
		for i in 0..area {
			if labels[i] != best_label {
				continue;
			}
			total += costs[i] as u64;
			let dx = 2 * (i % width) as i64 - center_x;
			let dy = 2 * (i / width) as i64 - center_y;
			let distance = dx * dx + dy * dy;
			if distance < nearest {
				nearest = distance;
				center = i;
			}
		}
		let min = rect.get_min();
		BlockData {
			center: Some(CellPos::new(
				min.get_x() + (center % width) as u32,
				min.get_y() + (center / width) as u32,
			)),
			cost: total.div_ceil(best_size as u64) as u32,
			region_size: best_size as u32,
		}
	}
	/// Recompute the connections of a block to all of its neighbours,
	/// returns whether any connection appeared or vanished
	fn recompute_connections(
		&mut self,
		index: usize,
		cells: &mut CellStatusGrid,
		world: &dyn WorldView,
		search: &mut LowLevelSearch,
	) -> bool {
		let block = self.block_id(index);
		let mut changed = false;
		for (ordinal, neighbour) in self
			.dimensions
			.get_ordinal_and_ids_of_neighbouring_blocks(&block)
		{
			let (owner, other, direction) = match ordinal {
				Ordinal::East | Ordinal::South => (block, neighbour, ordinal),
				Ordinal::West => (neighbour, block, Ordinal::East),
				Ordinal::North => (neighbour, block, Ordinal::South),
				_ => continue,
			};
			let Some(owner_index) = self.dimensions.get_block_index(&owner) else {
				continue;
			};
			let connection = self.compute_connection(&owner, &other, direction, cells, world, search);
			let slot = if direction == Ordinal::East {
				&mut self.east[owner_index]
			} else {
				&mut self.south[owner_index]
			};
			if slot.is_some() != connection.is_some() {
				changed = true;
			}
			*slot = connection;
		}
		changed
	}
	/// Measure the connection from `owner` to the block `other` lying in
	/// `direction` (East or South) of it
	fn compute_connection(
		&self,
		owner: &BlockID,
		other: &BlockID,
		direction: Ordinal,
		cells: &mut CellStatusGrid,
		world: &dyn WorldView,
		search: &mut LowLevelSearch,
	) -> Option<BlockConnection> {
		let rect_a = self.dimensions.get_block_rect(owner)?;
		let rect_b = self.dimensions.get_block_rect(other)?;
		let min = rect_a.get_min();
		let max = rect_a.get_max();
		let pairs: Vec<(CellPos, CellPos)> = match direction {
			Ordinal::East => (min.get_y()..=max.get_y())
				.map(|y| {
					(
						CellPos::new(max.get_x(), y),
						CellPos::new(max.get_x() + 1, y),
					)
				})
				.collect(),
			Ordinal::South => (min.get_x()..=max.get_x())
				.map(|x| {
					(
						CellPos::new(x, max.get_y()),
						CellPos::new(x, max.get_y() + 1),
					)
				})
				.collect(),
			_ => return None,
		};
		let mut border_cells = 0;
		for (a, b) in pairs {
			let a_open = cells.resolve(&a, world).is_some_and(|s| s.is_passable());
			let b_open = cells.resolve(&b, world).is_some_and(|s| s.is_passable());
			if a_open && b_open {
				border_cells += 1;
			}
		}
		if border_cells == 0 {
			return None;
		}
		let from = self.get_block(owner)?.get_center()?;
		let to = self.get_block(other)?.get_center()?;
		let query = LocalQuery {
			start: from,
			destination: to,
			range: 0,
			strict: false,
			partial: false,
			allowed_blocks: None,
			bounds: Some(rect_a.union(&rect_b)),
		};
		let outcome = search.search(cells, world, &query);
		let cost = if outcome.is_success() {
			outcome.cost
		} else {
			from.octile_distance(&to)
				.saturating_mul(DETACHED_CENTER_PENALTY)
		};
		Some(BlockConnection { cost, border_cells })
	}
}

/// A [BlockGrid] for each ground movement class
#[derive(Clone, Debug)]
pub struct BlockGrids {
	/// Land then Water
	grids: [BlockGrid; 2],
}

impl BlockGrids {
	/// Create a new instance of [BlockGrids]
	pub fn new(
		dimensions: MapDimensions,
		cells: &mut CellStatusGrids,
		world: &dyn WorldView,
		search: &mut LowLevelSearch,
	) -> Self {
		BlockGrids {
			grids: [
				BlockGrid::new(
					dimensions,
					MovementClass::Land,
					cells.get_mut(MovementClass::Land),
					world,
					search,
				),
				BlockGrid::new(
					dimensions,
					MovementClass::Water,
					cells.get_mut(MovementClass::Water),
					world,
					search,
				),
			],
		}
	}
	/// Get the grid of a class, [None] for [MovementClass::Air]
	pub fn get(&self, class: MovementClass) -> Option<&BlockGrid> {
		match class {
			MovementClass::Land => Some(&self.grids[0]),
			MovementClass::Water => Some(&self.grids[1]),
			MovementClass::Air => None,
		}
	}
	/// Get a mutable reference to the grid of a class
	pub fn get_mut(&mut self, class: MovementClass) -> Option<&mut BlockGrid> {
		match class {
			MovementClass::Land => Some(&mut self.grids[0]),
			MovementClass::Water => Some(&mut self.grids[1]),
			MovementClass::Air => None,
		}
	}
	/// Queue the blocks overlapping `rect` in every grid
	pub fn mark_rect_dirty(&mut self, rect: &CellRect) -> usize {
		self.grids.iter_mut().map(|g| g.mark_rect_dirty(rect)).sum()
	}
}
