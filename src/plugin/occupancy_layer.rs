//! Logic for handling changes to the world a [Pathfinder] routes across.
//! Gameplay code edits the [GridWorld] of a map (or asks these systems to)
//! and the matching cells and blocks are marked dirty so the next
//! [crate::plugin::OrderingSet::Advance] pass recomputes them
//!

use crate::prelude::*;
use bevy::prelude::*;

/// The occupancy of a rectangle of cells changed, e.g. a mover walked
/// between cells or a building was placed
#[derive(Event, Clone, Copy, Debug)]
pub struct EventCellsOccupiedStatusChanged {
	/// Cells affected
	rect: CellRect,
}

impl EventCellsOccupiedStatusChanged {
	/// Create a new instance of [EventCellsOccupiedStatusChanged]
	pub fn new(rect: CellRect) -> Self {
		EventCellsOccupiedStatusChanged { rect }
	}
	pub fn get_rect(&self) -> CellRect {
		self.rect
	}
}

/// Replace the terrain of a cell
#[derive(Event, Clone, Copy, Debug)]
pub struct EventTerrainChanged {
	/// Cell to edit
	cell: CellPos,
	/// The terrain the cell should be assigned
	terrain: TerrainCell,
}

impl EventTerrainChanged {
	/// Create a new instance of [EventTerrainChanged]
	pub fn new(cell: CellPos, terrain: TerrainCell) -> Self {
		EventTerrainChanged { cell, terrain }
	}
	pub fn get_cell(&self) -> CellPos {
		self.cell
	}
	pub fn get_terrain(&self) -> TerrainCell {
		self.terrain
	}
}

/// A mover switched between standing, moving, waiting and engaging
#[derive(Event, Clone, Copy, Debug)]
pub struct EventUnitMovingStatusChanged {
	/// Mover affected
	mover: MoverId,
	/// Its new status
	status: MoverStatus,
}

impl EventUnitMovingStatusChanged {
	/// Create a new instance of [EventUnitMovingStatusChanged]
	pub fn new(mover: MoverId, status: MoverStatus) -> Self {
		EventUnitMovingStatusChanged { mover, status }
	}
	pub fn get_mover(&self) -> MoverId {
		self.mover
	}
	pub fn get_status(&self) -> MoverStatus {
		self.status
	}
}

/// Read [EventCellsOccupiedStatusChanged] and mark the cells dirty
pub fn process_occupancy_changes(
	mut events: EventReader<EventCellsOccupiedStatusChanged>,
	mut query: Query<&mut Pathfinder>,
) {
	for event in events.read() {
		for mut pathfinder in query.iter_mut() {
			pathfinder.cells_occupied_status_changed(&event.get_rect());
		}
	}
}

/// Read [EventTerrainChanged], edit the [GridWorld] and mark the cell dirty
pub fn process_terrain_changes(
	mut events: EventReader<EventTerrainChanged>,
	mut query: Query<(&mut Pathfinder, &mut GridWorld)>,
) {
	for event in events.read() {
		for (mut pathfinder, mut world) in query.iter_mut() {
			match world.set_terrain(event.get_cell(), event.get_terrain()) {
				Some(rect) => {
					pathfinder.terrain_changed(&rect);
				}
				None => warn!(
					"Terrain edit of {:?} lies outside of the map",
					event.get_cell().get()
				),
			}
		}
	}
}

/// Read [EventUnitMovingStatusChanged], record the status in the
/// [GridWorld] and invalidate the footprint of the mover
pub fn process_status_changes(
	mut events: EventReader<EventUnitMovingStatusChanged>,
	mut query: Query<(&mut Pathfinder, &mut GridWorld)>,
) {
	for event in events.read() {
		for (mut pathfinder, mut world) in query.iter_mut() {
			let mover = event.get_mover();
			let status = event.get_status();
			match world.set_mover_status(mover, status) {
				Some(old) => pathfinder.unit_moving_status_changes(world.as_ref(), mover, old, status),
				None => warn!("Status {:?} sent for unknown mover {:?}", status, mover),
			}
		}
	}
}
