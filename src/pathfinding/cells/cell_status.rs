//! Every movement class keeps a [CellStatusGrid] caching, per cell, whether
//! the class can enter it and what it costs to do so. The cost combines the
//! static terrain cost with a penalty for whatever currently occupies the
//! cell.
//!
//! Changes are never applied eagerly. A change marks cells dirty and a
//! dirty cell is only recomputed when a search touches it
//! ([CellStatusGrid::resolve]) or when the pathfinder spends its per tick
//! budget draining the dirty list ([CellStatusGrid::resolve_dirty])
//!

use std::collections::VecDeque;

use crate::prelude::*;
use bitflags::bitflags;

bitflags! {
	/// Passability, occupancy tier and bookkeeping of a cell
	#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
	#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
	pub struct CellStatusFlags: u16 {
		const PASSABLE = 1 << 0;
		const MOVING = 1 << 1;
		const MUST_SEARCH = 1 << 2;
		const WAITING = 1 << 3;
		const ENGAGING = 1 << 4;
		const RESERVED = 1 << 5;
		const STANDING = 1 << 6;
		/// The cached cost is stale and must be recomputed before use
		const DIRTY = 1 << 15;
	}
}

impl CellStatusFlags {
	/// The flag of an occupancy tier, [Occupancy::Free] has none
	pub fn from_occupancy(occupancy: Occupancy) -> Self {
		match occupancy {
			Occupancy::Free => CellStatusFlags::empty(),
			Occupancy::Moving => CellStatusFlags::MOVING,
			Occupancy::MustSearch => CellStatusFlags::MUST_SEARCH,
			Occupancy::Waiting => CellStatusFlags::WAITING,
			Occupancy::Engaging => CellStatusFlags::ENGAGING,
			Occupancy::Reserved => CellStatusFlags::RESERVED,
			Occupancy::Standing => CellStatusFlags::STANDING,
		}
	}
}

/// Cached view of a cell for one movement class
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellStatus {
	/// Passability and occupancy
	flags: CellStatusFlags,
	/// Traversal cost, at least `1` when passable and `0` otherwise
	cost: u32,
}

impl CellStatus {
	/// Derive the status of `cell` for `class` from the world
	pub fn compute(world: &dyn WorldView, cell: &CellPos, class: MovementClass) -> Self {
		let Some(terrain_cost) = world
			.get_terrain(cell)
			.and_then(|t| t.get_terrain_cost(class))
		else {
			return CellStatus::default();
		};
		let occupancy = world.get_occupancy(cell, class);
		CellStatus {
			flags: CellStatusFlags::PASSABLE | CellStatusFlags::from_occupancy(occupancy),
			cost: terrain_cost + occupancy.get_penalty(),
		}
	}
	/// Get the flags
	pub fn get_flags(&self) -> CellStatusFlags {
		self.flags
	}
	/// Get the traversal cost
	pub fn get_cost(&self) -> u32 {
		self.cost
	}
	/// Whether the class may enter the cell at all
	pub fn is_passable(&self) -> bool {
		self.flags.contains(CellStatusFlags::PASSABLE)
	}
	/// Whether a stationary unit sits in the cell
	pub fn is_standing(&self) -> bool {
		self.flags.contains(CellStatusFlags::STANDING)
	}
	/// Whether the cached values are stale
	pub fn is_dirty(&self) -> bool {
		self.flags.contains(CellStatusFlags::DIRTY)
	}
	/// The most expensive occupancy tier recorded in the flags
	pub fn get_occupancy(&self) -> Occupancy {
		Occupancy::ALL
			.iter()
			.rev()
			.copied()
			.find(|o| {
				let flag = CellStatusFlags::from_occupancy(*o);
				!flag.is_empty() && self.flags.contains(flag)
			})
			.unwrap_or(Occupancy::Free)
	}
}

/// Cached [CellStatus] of every cell of the map for a single movement class
#[derive(Clone, Debug)]
pub struct CellStatusGrid {
	/// Size of the map
	dimensions: MapDimensions,
	/// Class served by this grid
	class: MovementClass,
	/// Status of each cell in row-major order
	statuses: Vec<CellStatus>,
	/// Indices of dirty cells in the order they were marked, a cell appears
	/// at most once while its `DIRTY` flag is set
	dirty: VecDeque<usize>,
}

impl CellStatusGrid {
	/// Create a new instance of [CellStatusGrid] with every cell computed
	/// from the world
	pub fn new(dimensions: MapDimensions, class: MovementClass, world: &dyn WorldView) -> Self {
		let statuses = dimensions
			.get_rect()
			.iter()
			.map(|cell| CellStatus::compute(world, &cell, class))
			.collect();
		CellStatusGrid {
			dimensions,
			class,
			statuses,
			dirty: VecDeque::new(),
		}
	}
	/// Get the map dimensions
	pub fn get_dimensions(&self) -> &MapDimensions {
		&self.dimensions
	}
	/// Get the movement class
	pub fn get_class(&self) -> MovementClass {
		self.class
	}
	/// Number of cells waiting to be recomputed
	pub fn get_dirty_count(&self) -> usize {
		self.dirty.len()
	}
	/// Mark a single cell dirty. Returns `false` if the cell lies outside the
	/// map or was already dirty
	pub fn cell_changed(&mut self, cell: &CellPos) -> bool {
		match self.dimensions.get_cell_index(cell) {
			Some(i) => self.mark_index(i),
			None => false,
		}
	}
	/// Flag an index dirty and queue it
	fn mark_index(&mut self, index: usize) -> bool {
		let status = &mut self.statuses[index];
		if status.is_dirty() {
			return false;
		}
		status.flags.insert(CellStatusFlags::DIRTY);
		self.dirty.push_back(index);
		true
	}
	/// Mark every cell of `rect` dirty, the part of the rectangle outside the
	/// map is ignored. Returns how many cells were newly marked
	pub fn cells_occupied_status_changed(&mut self, rect: &CellRect) -> usize {
		let Some(rect) = rect.clamp_to(&self.dimensions) else {
			return 0;
		};
		let mut marked = 0;
		for cell in rect.iter() {
			if self.cell_changed(&cell) {
				marked += 1;
			}
		}
		marked
	}
	/// The up to date status of a cell, recomputing it first if dirty. [None]
	/// if the cell lies outside the map
	pub fn resolve(&mut self, cell: &CellPos, world: &dyn WorldView) -> Option<CellStatus> {
		let i = self.dimensions.get_cell_index(cell)?;
		if self.statuses[i].is_dirty() {
			self.statuses[i] = CellStatus::compute(world, cell, self.class);
		}
		Some(self.statuses[i])
	}
	/// Recompute up to `budget` dirty cells in the order they were marked.
	/// Cells already resolved by a search are dropped without counting
	/// against the budget. Returns how many cells were recomputed
	pub fn resolve_dirty(&mut self, world: &dyn WorldView, budget: usize) -> usize {
		let mut resolved = 0;
		while resolved < budget {
			let Some(i) = self.dirty.pop_front() else {
				break;
			};
			if !self.statuses[i].is_dirty() {
				continue;
			}
			let width = self.dimensions.get_width() as usize;
			let cell = CellPos::new((i % width) as u32, (i / width) as u32);
			self.statuses[i] = CellStatus::compute(world, &cell, self.class);
			resolved += 1;
		}
		resolved
	}
	/// The cached status of a cell without recomputing it, may be stale
	pub fn get_status(&self, cell: &CellPos) -> Option<CellStatus> {
		self.dimensions
			.get_cell_index(cell)
			.map(|i| self.statuses[i])
	}
}

/// One [CellStatusGrid] per [MovementClass]
#[derive(Clone, Debug)]
pub struct CellStatusGrids {
	/// Indexed by [MovementClass::index]
	grids: [CellStatusGrid; 3],
}

impl CellStatusGrids {
	/// Create a new instance of [CellStatusGrids]
	pub fn new(dimensions: MapDimensions, world: &dyn WorldView) -> Self {
		CellStatusGrids {
			grids: [
				CellStatusGrid::new(dimensions, MovementClass::Land, world),
				CellStatusGrid::new(dimensions, MovementClass::Water, world),
				CellStatusGrid::new(dimensions, MovementClass::Air, world),
			],
		}
	}
	/// Get a reference to the grid of a class
	pub fn get(&self, class: MovementClass) -> &CellStatusGrid {
		&self.grids[class.index()]
	}
	/// Get a mutable reference to the grid of a class
	pub fn get_mut(&mut self, class: MovementClass) -> &mut CellStatusGrid {
		&mut self.grids[class.index()]
	}
	/// Mark `rect` dirty in every grid
	pub fn cells_occupied_status_changed(&mut self, rect: &CellRect) -> usize {
		self.grids
			.iter_mut()
			.map(|g| g.cells_occupied_status_changed(rect))
			.sum()
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	fn world() -> GridWorld {
		GridWorld::new(TerrainMap::from_ascii(&["..#", ".f.", "~~~"]).unwrap())
	}
	#[test]
	fn initial_costs() {
		let world = world();
		let dims = MapDimensions::new(3, 3, 2);
		let grid = CellStatusGrid::new(dims, MovementClass::Land, &world);
		assert_eq!(1, grid.get_status(&CellPos::new(0, 0)).unwrap().get_cost());
		assert_eq!(4, grid.get_status(&CellPos::new(1, 1)).unwrap().get_cost());
		assert!(!grid.get_status(&CellPos::new(2, 0)).unwrap().is_passable());
		assert!(!grid.get_status(&CellPos::new(0, 2)).unwrap().is_passable());
	}
	#[test]
	fn marking_is_deduplicated() {
		let world = world();
		let dims = MapDimensions::new(3, 3, 2);
		let mut grid = CellStatusGrid::new(dims, MovementClass::Land, &world);
		assert_eq!(4, grid.cells_occupied_status_changed(&CellRect::new(0, 0, 1, 1)));
		assert_eq!(2, grid.cells_occupied_status_changed(&CellRect::new(1, 0, 2, 1)));
		assert_eq!(6, grid.get_dirty_count());
		assert!(!grid.cell_changed(&CellPos::new(3, 0)));
	}
	#[test]
	fn stale_until_resolved() {
		let mut world = world();
		let dims = MapDimensions::new(3, 3, 2);
		let mut grid = CellStatusGrid::new(dims, MovementClass::Land, &world);
		let cell = CellPos::new(0, 0);
		let dirty = world
			.place_mover(
				MoverId::new(1),
				CellRect::from_cell(cell),
				MovementClass::Land,
				MoverStatus::Standing,
			)
			.unwrap();
		grid.cells_occupied_status_changed(&dirty);
		assert_eq!(1, grid.get_status(&cell).unwrap().get_cost());
		let status = grid.resolve(&cell, &world).unwrap();
		assert!(status.is_standing());
		assert_eq!(1 + Occupancy::Standing.get_penalty(), status.get_cost());
		assert_eq!(Occupancy::Standing, status.get_occupancy());
		// already resolved so draining does no work
		assert_eq!(0, grid.resolve_dirty(&world, 10));
		assert_eq!(0, grid.get_dirty_count());
	}
	#[test]
	fn drain_respects_budget() {
		let world = world();
		let dims = MapDimensions::new(3, 3, 2);
		let mut grid = CellStatusGrid::new(dims, MovementClass::Water, &world);
		grid.cells_occupied_status_changed(&dims.get_rect());
		assert_eq!(4, grid.resolve_dirty(&world, 4));
		assert_eq!(5, grid.get_dirty_count());
		assert_eq!(5, grid.resolve_dirty(&world, 100));
		assert!(grid.get_status(&CellPos::new(1, 2)).unwrap().is_passable());
	}
	#[test]
	fn grids_per_class() {
		let world = world();
		let dims = MapDimensions::new(3, 3, 2);
		let grids = CellStatusGrids::new(dims, &world);
		let cliff = CellPos::new(2, 0);
		assert!(!grids.get(MovementClass::Land).get_status(&cliff).unwrap().is_passable());
		assert!(grids.get(MovementClass::Air).get_status(&cliff).unwrap().is_passable());
	}
}
