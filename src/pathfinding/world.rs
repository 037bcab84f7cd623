//! The pathfinder never owns the game state, it reads terrain and occupancy
//! through [WorldView]. Whoever implements the trait must report every
//! change to the cells it serves through
//! [crate::prelude::Pathfinder::cells_occupied_status_changed] or
//! [crate::prelude::Pathfinder::terrain_changed] otherwise cached costs go
//! stale.
//!
//! [GridWorld] is a ready-made implementation holding a [TerrainMap], the
//! footprint and status of every mover and any reserved cells. Each of its
//! mutators returns the rectangle of cells that changed so the caller can
//! forward it to the pathfinder
//!

use std::collections::BTreeMap;

use crate::prelude::*;
use bevy::prelude::*;

/// Read-only access to the state of the world the pathfinder routes across
pub trait WorldView {
	/// `(width, height)` of the map in cells
	fn get_dimensions(&self) -> (u32, u32);
	/// Static terrain of a cell, [None] outside the map
	fn get_terrain(&self, cell: &CellPos) -> Option<TerrainCell>;
	/// The most expensive occupancy tier present in a cell for movers of
	/// `class`
	fn get_occupancy(&self, cell: &CellPos, class: MovementClass) -> Occupancy;
	/// Cells covered by a mover, [None] once the mover no longer exists
	fn get_mover_footprint(&self, mover: MoverId) -> Option<CellRect>;
	/// Whether a mover still exists
	fn is_mover_alive(&self, mover: MoverId) -> bool {
		self.get_mover_footprint(mover).is_some()
	}
}

/// Registry entry of a single mover
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MoverRecord {
	/// Cells covered
	footprint: CellRect,
	/// Which occupancy layer the mover sits in
	class: MovementClass,
	/// Current movement state
	status: MoverStatus,
}

/// A self-contained [WorldView] for games and tests that do not keep their
/// own spatial index
#[derive(Component, Clone, Debug)]
pub struct GridWorld {
	/// Static terrain
	terrain: TerrainMap,
	/// Cached occupancy per movement class, row-major
	occupancy: [Vec<Occupancy>; 3],
	/// Number of reservations covering each cell per movement class
	reservations: [Vec<u16>; 3],
	/// Every live mover, ordered by id
	movers: BTreeMap<MoverId, MoverRecord>,
}

impl GridWorld {
	/// Create a new instance of [GridWorld] with no movers on it
	pub fn new(terrain: TerrainMap) -> Self {
		let (width, height) = terrain.get_size();
		let count = width as usize * height as usize;
		GridWorld {
			terrain,
			occupancy: [
				vec![Occupancy::Free; count],
				vec![Occupancy::Free; count],
				vec![Occupancy::Free; count],
			],
			reservations: [vec![0; count], vec![0; count], vec![0; count]],
			movers: BTreeMap::new(),
		}
	}
	/// Get a reference to the terrain
	pub fn get_terrain_map(&self) -> &TerrainMap {
		&self.terrain
	}
	/// Row-major index of a cell
	fn index(&self, cell: &CellPos) -> Option<usize> {
		let (width, height) = self.terrain.get_size();
		if cell.get_x() < width && cell.get_y() < height {
			Some(cell.get_y() as usize * width as usize + cell.get_x() as usize)
		} else {
			None
		}
	}
	/// Crop a rectangle to the map, [None] if nothing of it remains
	fn clamp(&self, rect: &CellRect) -> Option<CellRect> {
		let (width, height) = self.terrain.get_size();
		rect.intersection(&CellRect::new(0, 0, width - 1, height - 1))
	}
	/// Recompute the cached occupancy of every cell in `rect`
	fn refresh_occupancy(&mut self, rect: &CellRect) {
		let Some(rect) = self.clamp(rect) else {
			return;
		};
		for class in MovementClass::ALL {
			for cell in rect.iter() {
				if let Some(i) = self.index(&cell) {
					self.occupancy[class.index()][i] = if self.reservations[class.index()][i] > 0 {
						Occupancy::Reserved
					} else {
						Occupancy::Free
					};
				}
			}
		}
		for record in self.movers.values() {
			let Some(overlap) = record.footprint.intersection(&rect) else {
				continue;
			};
			let tier = Occupancy::from(record.status);
			for cell in overlap.iter() {
				let (width, _) = self.terrain.get_size();
				let i = cell.get_y() as usize * width as usize + cell.get_x() as usize;
				let current = &mut self.occupancy[record.class.index()][i];
				if tier > *current {
					*current = tier;
				}
			}
		}
	}
	/// Add a mover to the world. Returns the cells whose occupancy changed,
	/// or an error if the footprint does not lie fully on the map
	pub fn place_mover(
		&mut self,
		mover: MoverId,
		footprint: CellRect,
		class: MovementClass,
		status: MoverStatus,
	) -> Result<CellRect, PathfinderError> {
		self.check_on_map(&footprint)?;
		let mut dirty = footprint;
		if let Some(old) = self.movers.insert(
			mover,
			MoverRecord {
				footprint,
				class,
				status,
			},
		) {
			dirty = dirty.union(&old.footprint);
		}
		self.refresh_occupancy(&dirty);
		Ok(dirty)
	}
	/// Move a mover to a new footprint, returns the union of the old and new
	/// footprints. [None] if the mover does not exist
	pub fn move_mover(
		&mut self,
		mover: MoverId,
		footprint: CellRect,
	) -> Result<Option<CellRect>, PathfinderError> {
		self.check_on_map(&footprint)?;
		let Some(record) = self.movers.get_mut(&mover) else {
			return Ok(None);
		};
		let dirty = record.footprint.union(&footprint);
		record.footprint = footprint;
		self.refresh_occupancy(&dirty);
		Ok(Some(dirty))
	}
	/// Change the status of a mover, returns the previous status. [None] if
	/// the mover does not exist
	pub fn set_mover_status(&mut self, mover: MoverId, status: MoverStatus) -> Option<MoverStatus> {
		let record = self.movers.get_mut(&mover)?;
		let old = record.status;
		record.status = status;
		let footprint = record.footprint;
		self.refresh_occupancy(&footprint);
		Some(old)
	}
	/// Get the current status of a mover
	pub fn get_mover_status(&self, mover: MoverId) -> Option<MoverStatus> {
		self.movers.get(&mover).map(|r| r.status)
	}
	/// Get the movement class of a mover
	pub fn get_mover_class(&self, mover: MoverId) -> Option<MovementClass> {
		self.movers.get(&mover).map(|r| r.class)
	}
	/// Remove a mover, returns the footprint it vacated
	pub fn remove_mover(&mut self, mover: MoverId) -> Option<CellRect> {
		let record = self.movers.remove(&mover)?;
		self.refresh_occupancy(&record.footprint);
		Some(record.footprint)
	}
	/// Replace the terrain of a cell, returns the changed cell as a
	/// rectangle. [None] if the cell lies outside the map
	pub fn set_terrain(&mut self, cell: CellPos, terrain: TerrainCell) -> Option<CellRect> {
		if self.terrain.set_cell(&cell, terrain) {
			Some(CellRect::from_cell(cell))
		} else {
			None
		}
	}
	/// Reserve a rectangle of cells for `class`, e.g. a construction site.
	/// Returns the cells on the map that were affected
	pub fn reserve(&mut self, rect: &CellRect, class: MovementClass) -> Option<CellRect> {
		let rect = self.clamp(rect)?;
		for cell in rect.iter() {
			if let Some(i) = self.index(&cell) {
				let count = &mut self.reservations[class.index()][i];
				*count = count.saturating_add(1);
			}
		}
		self.refresh_occupancy(&rect);
		Some(rect)
	}
	/// Release a reservation previously made with [GridWorld::reserve]
	pub fn release(&mut self, rect: &CellRect, class: MovementClass) -> Option<CellRect> {
		let rect = self.clamp(rect)?;
		for cell in rect.iter() {
			if let Some(i) = self.index(&cell) {
				let count = &mut self.reservations[class.index()][i];
				*count = count.saturating_sub(1);
			}
		}
		self.refresh_occupancy(&rect);
		Some(rect)
	}
	/// Error unless every cell of `rect` lies on the map
	fn check_on_map(&self, rect: &CellRect) -> Result<(), PathfinderError> {
		let (width, height) = self.terrain.get_size();
		let max = rect.get_max();
		if max.get_x() >= width || max.get_y() >= height {
			return Err(PathfinderError::InvalidCoordinate {
				cell: max,
				width,
				height,
			});
		}
		Ok(())
	}
}

impl WorldView for GridWorld {
	fn get_dimensions(&self) -> (u32, u32) {
		self.terrain.get_size()
	}
	fn get_terrain(&self, cell: &CellPos) -> Option<TerrainCell> {
		self.terrain.get_cell(cell)
	}
	fn get_occupancy(&self, cell: &CellPos, class: MovementClass) -> Occupancy {
		self.index(cell)
			.map(|i| self.occupancy[class.index()][i])
			.unwrap_or_default()
	}
	fn get_mover_footprint(&self, mover: MoverId) -> Option<CellRect> {
		self.movers.get(&mover).map(|r| r.footprint)
	}
}
