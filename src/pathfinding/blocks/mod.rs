//! A map is split into a series of fixed-size square blocks used by the
//! high-level search to route over long distances
//!
//! ```text
//!  block (0,0)      block (1,0)      block (2,0)
//!  ________________ ________________ ________
//! |                |                |        |
//! |       C        |        C       |    C   |
//! |________________|________________|________|
//! |                |                |        |
//! |       C        |      C         |    C   |
//! |________________|________________|________|
//! ```
//!
//! `C` marks the representative center of a block. Blocks along the right
//! and bottom edges of the map may be narrower than the block size when the
//! map dimensions are not an exact multiple of it
//!

pub mod block_grid;

use crate::prelude::*;
use bevy::prelude::*;

/// Unique ID of a block
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct BlockID((u32, u32));

impl BlockID {
	/// Create a new instance of [BlockID]
	pub fn new(column: u32, row: u32) -> Self {
		BlockID((column, row))
	}
	/// Get the block `(column, row)` tuple
	pub fn get(&self) -> (u32, u32) {
		self.0
	}
	/// Get the block column
	pub fn get_column(&self) -> u32 {
		self.0 .0
	}
	/// Get the block row
	pub fn get_row(&self) -> u32 {
		self.0 .1
	}
}

/// The dimensions of the world in cells and the size of the blocks laid
/// over it
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub struct MapDimensions {
	/// `(width, height)` of the world in cells
	size: (u32, u32),
	/// Edge length of a block in cells
	block_size: u32,
}

impl MapDimensions {
	/// Create a new instance of [MapDimensions]. A map needs at least one
	/// cell and blocks at least one cell across
	pub fn new(width: u32, height: u32, block_size: u32) -> Self {
		if width == 0 || height == 0 {
			panic!(
				"Map dimensions `({}, {})` must contain at least one cell",
				width, height
			);
		}
		if block_size == 0 {
			panic!("Block size cannot be zero");
		}
		MapDimensions {
			size: (width, height),
			block_size,
		}
	}
	/// Get the `(width, height)` in cells
	pub fn get_size(&self) -> (u32, u32) {
		self.size
	}
	/// Number of columns of cells
	pub fn get_width(&self) -> u32 {
		self.size.0
	}
	/// Number of rows of cells
	pub fn get_height(&self) -> u32 {
		self.size.1
	}
	/// Edge length of a block in cells
	pub fn get_block_size(&self) -> u32 {
		self.block_size
	}
	/// Total number of cells
	pub fn get_cell_count(&self) -> usize {
		self.get_width() as usize * self.get_height() as usize
	}
	/// The whole map as a [CellRect]
	pub fn get_rect(&self) -> CellRect {
		CellRect::new(0, 0, self.get_width() - 1, self.get_height() - 1)
	}
	/// Whether `cell` lies on the map
	pub fn contains(&self, cell: &CellPos) -> bool {
		cell.get_x() < self.get_width() && cell.get_y() < self.get_height()
	}
	/// Row-major index of a cell, [None] if it lies outside the map
	pub fn get_cell_index(&self, cell: &CellPos) -> Option<usize> {
		if self.contains(cell) {
			Some(cell.get_y() as usize * self.get_width() as usize + cell.get_x() as usize)
		} else {
			None
		}
	}
	/// Step from `cell` in the direction of `ordinal`, [None] if the step
	/// leaves the map
	pub fn get_neighbour(&self, cell: &CellPos, ordinal: Ordinal) -> Option<CellPos> {
		cell.step(ordinal).filter(|n| self.contains(n))
	}
	/// Number of block columns
	pub fn get_block_columns(&self) -> u32 {
		self.get_width().div_ceil(self.block_size)
	}
	/// Number of block rows
	pub fn get_block_rows(&self) -> u32 {
		self.get_height().div_ceil(self.block_size)
	}
	/// Total number of blocks
	pub fn get_block_count(&self) -> usize {
		self.get_block_columns() as usize * self.get_block_rows() as usize
	}
	/// Whether the block exists on this map
	pub fn contains_block(&self, block: &BlockID) -> bool {
		block.get_column() < self.get_block_columns() && block.get_row() < self.get_block_rows()
	}
	/// Row-major index of a block, [None] if it does not exist
	pub fn get_block_index(&self, block: &BlockID) -> Option<usize> {
		if self.contains_block(block) {
			Some(
				block.get_row() as usize * self.get_block_columns() as usize
					+ block.get_column() as usize,
			)
		} else {
			None
		}
	}
	/// The block containing `cell`, [None] if the cell lies outside the map
	pub fn get_block_of(&self, cell: &CellPos) -> Option<BlockID> {
		if self.contains(cell) {
			Some(BlockID::new(
				cell.get_x() / self.block_size,
				cell.get_y() / self.block_size,
			))
		} else {
			None
		}
	}
	/// The cells covered by a block, cropped to the map
	pub fn get_block_rect(&self, block: &BlockID) -> Option<CellRect> {
		if !self.contains_block(block) {
			return None;
		}
		let x = block.get_column() * self.block_size;
		let y = block.get_row() * self.block_size;
		CellRect::new(x, y, x + self.block_size - 1, y + self.block_size - 1).clamp_to(self)
	}
	/// Every block overlapping `rect`, in row-major order
	pub fn get_blocks_in_rect(&self, rect: &CellRect) -> Vec<BlockID> {
		let mut blocks = Vec::new();
		if let Some(clamped) = rect.clamp_to(self) {
			let min = clamped.get_min();
			let max = clamped.get_max();
			for row in min.get_y() / self.block_size..=max.get_y() / self.block_size {
				for column in min.get_x() / self.block_size..=max.get_x() / self.block_size {
					blocks.push(BlockID::new(column, row));
				}
			}
		}
		blocks
	}
	/// Based on a blocks `(column, row)` position find its orthogonal
	/// neighbours (up to 4) and the [Ordinal] pointing at each
	pub fn get_ordinal_and_ids_of_neighbouring_blocks(
		&self,
		block: &BlockID,
	) -> Vec<(Ordinal, BlockID)> {
		let mut neighbours = Vec::new();
		let column_limit = self.get_block_columns() - 1;
		let row_limit = self.get_block_rows() - 1;
		if block.get_row() > 0 {
			neighbours.push((
				Ordinal::North,
				BlockID::new(block.get_column(), block.get_row() - 1),
			));
		}
		if block.get_column() < column_limit {
			neighbours.push((
				Ordinal::East,
				BlockID::new(block.get_column() + 1, block.get_row()),
			));
		}
		if block.get_row() < row_limit {
			neighbours.push((
				Ordinal::South,
				BlockID::new(block.get_column(), block.get_row() + 1),
			));
		}
		if block.get_column() > 0 {
			neighbours.push((
				Ordinal::West,
				BlockID::new(block.get_column() - 1, block.get_row()),
			));
		}
		neighbours
	}
	/// Every block (up to 8) touching `block`, including diagonals
	pub fn get_all_neighbouring_blocks(&self, block: &BlockID) -> Vec<BlockID> {
		let mut neighbours = Vec::new();
		for ordinal in Ordinal::ALL {
			let (dx, dy) = ordinal.get_offset();
			let column = block.get_column().checked_add_signed(dx);
			let row = block.get_row().checked_add_signed(dy);
			if let (Some(column), Some(row)) = (column, row) {
				let id = BlockID::new(column, row);
				if self.contains_block(&id) {
					neighbours.push(id);
				}
			}
		}
		neighbours
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn valid_map_dimensions() {
		let dims = MapDimensions::new(40, 20, 16);
		assert_eq!(3, dims.get_block_columns());
		assert_eq!(2, dims.get_block_rows());
		assert_eq!(6, dims.get_block_count());
	}
	#[test]
	#[should_panic]
	fn zero_block_size() {
		MapDimensions::new(10, 10, 0);
	}
	#[test]
	#[should_panic]
	fn empty_map() {
		MapDimensions::new(0, 10, 4);
	}
	#[test]
	fn partial_block_rect() {
		let dims = MapDimensions::new(40, 20, 16);
		let result = dims.get_block_rect(&BlockID::new(2, 1)).unwrap();
		assert_eq!(CellRect::new(32, 16, 39, 19), result);
		assert_eq!(None, dims.get_block_rect(&BlockID::new(3, 0)));
	}
	#[test]
	fn block_of_cell() {
		let dims = MapDimensions::new(40, 20, 16);
		assert_eq!(Some(BlockID::new(1, 0)), dims.get_block_of(&CellPos::new(16, 15)));
		assert_eq!(None, dims.get_block_of(&CellPos::new(40, 0)));
	}
	#[test]
	fn blocks_in_rect() {
		let dims = MapDimensions::new(40, 40, 10);
		let result = dims.get_blocks_in_rect(&CellRect::new(9, 9, 10, 25));
		let actual = vec![
			BlockID::new(0, 0),
			BlockID::new(1, 0),
			BlockID::new(0, 1),
			BlockID::new(1, 1),
			BlockID::new(0, 2),
			BlockID::new(1, 2),
		];
		assert_eq!(actual, result);
	}
	#[test]
	fn block_neighbours_corner() {
		let dims = MapDimensions::new(30, 30, 10);
		let result = dims.get_ordinal_and_ids_of_neighbouring_blocks(&BlockID::new(0, 0));
		let actual = vec![
			(Ordinal::East, BlockID::new(1, 0)),
			(Ordinal::South, BlockID::new(0, 1)),
		];
		assert_eq!(actual, result);
	}
	#[test]
	fn block_neighbours_centre() {
		let dims = MapDimensions::new(30, 30, 10);
		let result = dims.get_ordinal_and_ids_of_neighbouring_blocks(&BlockID::new(1, 1));
		assert_eq!(4, result.len());
		assert_eq!(8, dims.get_all_neighbouring_blocks(&BlockID::new(1, 1)).len());
	}
	#[test]
	fn cell_index_out_of_bounds() {
		let dims = MapDimensions::new(5, 5, 5);
		assert_eq!(Some(7), dims.get_cell_index(&CellPos::new(2, 1)));
		assert_eq!(None, dims.get_cell_index(&CellPos::new(5, 1)));
	}
}
