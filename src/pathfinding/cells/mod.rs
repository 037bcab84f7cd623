//! A map is made of cells, each addressed by an integer `(x, y)` position.
//! Movers of different [MovementClass] see the same cells differently so
//! every class keeps its own [cell_status::CellStatusGrid]
//!

pub mod cell_status;

use crate::prelude::*;
use bevy::prelude::*;

/// Position of a single cell, `x` grows towards the East and `y` towards the
/// South with `(0, 0)` in the top left corner of the map
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct CellPos((u32, u32));

impl CellPos {
	/// Create a new instance of [CellPos]
	pub fn new(x: u32, y: u32) -> Self {
		CellPos((x, y))
	}
	/// Get the `(x, y)` tuple
	pub fn get(&self) -> (u32, u32) {
		self.0
	}
	/// Get the column
	pub fn get_x(&self) -> u32 {
		self.0 .0
	}
	/// Get the row
	pub fn get_y(&self) -> u32 {
		self.0 .1
	}
	/// The cell one step away in the direction of `ordinal`, [None] if the
	/// step would leave the top or left edge of the map. Callers check the
	/// bottom and right edges against [MapDimensions]
	pub fn step(&self, ordinal: Ordinal) -> Option<CellPos> {
		let (dx, dy) = ordinal.get_offset();
		let x = self.get_x().checked_add_signed(dx)?;
		let y = self.get_y().checked_add_signed(dy)?;
		Some(CellPos::new(x, y))
	}
	/// Chebyshev (king move) distance between two cells
	pub fn chebyshev_distance(&self, other: &CellPos) -> u32 {
		self.get_x()
			.abs_diff(other.get_x())
			.max(self.get_y().abs_diff(other.get_y()))
	}
	/// Octile distance in step units between two cells
	pub fn octile_distance(&self, other: &CellPos) -> u32 {
		octile_distance(
			self.get_x().abs_diff(other.get_x()),
			self.get_y().abs_diff(other.get_y()),
		)
	}
	/// Squared euclidean distance in cells
	pub fn squared_distance(&self, other: &CellPos) -> u64 {
		let dx = self.get_x().abs_diff(other.get_x()) as u64;
		let dy = self.get_y().abs_diff(other.get_y()) as u64;
		dx * dx + dy * dy
	}
}

/// An inclusive rectangle of cells, `min` is the top left corner and `max`
/// the bottom right corner
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Reflect)]
pub struct CellRect {
	/// Top left corner
	min: CellPos,
	/// Bottom right corner
	max: CellPos,
}

impl CellRect {
	/// Create a [CellRect] from two opposite corners in any order
	pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
		CellRect {
			min: CellPos::new(x1.min(x2), y1.min(y2)),
			max: CellPos::new(x1.max(x2), y1.max(y2)),
		}
	}
	/// A rectangle covering a single cell
	pub fn from_cell(cell: CellPos) -> Self {
		CellRect {
			min: cell,
			max: cell,
		}
	}
	/// The smallest rectangle containing both cells
	pub fn spanning(a: CellPos, b: CellPos) -> Self {
		CellRect::new(a.get_x(), a.get_y(), b.get_x(), b.get_y())
	}
	/// Every cell within Chebyshev distance `radius` of `cell`, the top and
	/// left sides saturate at `0`
	pub fn around(cell: CellPos, radius: u32) -> Self {
		CellRect {
			min: CellPos::new(
				cell.get_x().saturating_sub(radius),
				cell.get_y().saturating_sub(radius),
			),
			max: CellPos::new(
				cell.get_x().saturating_add(radius),
				cell.get_y().saturating_add(radius),
			),
		}
	}
	/// Top left corner
	pub fn get_min(&self) -> CellPos {
		self.min
	}
	/// Bottom right corner
	pub fn get_max(&self) -> CellPos {
		self.max
	}
	/// Number of columns covered
	pub fn get_width(&self) -> u32 {
		self.max.get_x() - self.min.get_x() + 1
	}
	/// Number of rows covered
	pub fn get_height(&self) -> u32 {
		self.max.get_y() - self.min.get_y() + 1
	}
	/// Number of cells covered
	pub fn get_area(&self) -> usize {
		self.get_width() as usize * self.get_height() as usize
	}
	/// Whether `cell` sits inside the rectangle
	pub fn contains(&self, cell: &CellPos) -> bool {
		cell.get_x() >= self.min.get_x()
			&& cell.get_x() <= self.max.get_x()
			&& cell.get_y() >= self.min.get_y()
			&& cell.get_y() <= self.max.get_y()
	}
	/// Whether the two rectangles share at least one cell
	pub fn intersects(&self, other: &CellRect) -> bool {
		self.intersection(other).is_some()
	}
	/// The cells common to both rectangles
	pub fn intersection(&self, other: &CellRect) -> Option<CellRect> {
		let min_x = self.min.get_x().max(other.min.get_x());
		let min_y = self.min.get_y().max(other.min.get_y());
		let max_x = self.max.get_x().min(other.max.get_x());
		let max_y = self.max.get_y().min(other.max.get_y());
		if min_x > max_x || min_y > max_y {
			None
		} else {
			Some(CellRect::new(min_x, min_y, max_x, max_y))
		}
	}
	/// The smallest rectangle containing both
	pub fn union(&self, other: &CellRect) -> CellRect {
		CellRect::new(
			self.min.get_x().min(other.min.get_x()),
			self.min.get_y().min(other.min.get_y()),
			self.max.get_x().max(other.max.get_x()),
			self.max.get_y().max(other.max.get_y()),
		)
	}
	/// Expand every side by `margin` cells, saturating at `0`
	pub fn grow(&self, margin: u32) -> CellRect {
		CellRect::new(
			self.min.get_x().saturating_sub(margin),
			self.min.get_y().saturating_sub(margin),
			self.max.get_x().saturating_add(margin),
			self.max.get_y().saturating_add(margin),
		)
	}
	/// Crop the rectangle to the map, [None] if it lies entirely outside
	pub fn clamp_to(&self, map_dimensions: &MapDimensions) -> Option<CellRect> {
		self.intersection(&map_dimensions.get_rect())
	}
	/// The cell of the rectangle closest to `cell`
	pub fn nearest_cell(&self, cell: &CellPos) -> CellPos {
		CellPos::new(
			cell.get_x().clamp(self.min.get_x(), self.max.get_x()),
			cell.get_y().clamp(self.min.get_y(), self.max.get_y()),
		)
	}
	/// Per axis distance in cells from `cell` to the rectangle, `(0, 0)` if
	/// the cell is inside
	pub fn axis_distance(&self, cell: &CellPos) -> (u32, u32) {
		let nearest = self.nearest_cell(cell);
		(
			nearest.get_x().abs_diff(cell.get_x()),
			nearest.get_y().abs_diff(cell.get_y()),
		)
	}
	/// Iterate over the cells in row-major order
	pub fn iter(&self) -> impl Iterator<Item = CellPos> {
		let (min_x, max_x) = (self.min.get_x(), self.max.get_x());
		(self.min.get_y()..=self.max.get_y())
			.flat_map(move |y| (min_x..=max_x).map(move |x| CellPos::new(x, y)))
	}
}

/// A locomotion category with its own passability and cost rules
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub enum MovementClass {
	#[default]
	Land,
	Water,
	Air,
}

impl MovementClass {
	/// Every class in the fixed processing order
	pub const ALL: [MovementClass; 3] =
		[MovementClass::Land, MovementClass::Water, MovementClass::Air];
	/// Classes that path across the ground and use the block grids
	pub const GROUND: [MovementClass; 2] = [MovementClass::Land, MovementClass::Water];
	/// Dense index of the class
	pub fn index(&self) -> usize {
		match self {
			MovementClass::Land => 0,
			MovementClass::Water => 1,
			MovementClass::Air => 2,
		}
	}
	/// Whether the class is served by the flying search
	pub fn is_flying(&self) -> bool {
		*self == MovementClass::Air
	}
}

/// What currently occupies a cell from the point of view of one movement
/// class, ordered from cheapest to most expensive to path through
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub enum Occupancy {
	#[default]
	Free,
	/// A unit passing through
	Moving,
	/// A unit that is about to replan its route
	MustSearch,
	/// A unit waiting for the way ahead to clear
	Waiting,
	/// A unit fighting
	Engaging,
	/// Claimed by the simulation, e.g. a construction site or a destination
	Reserved,
	/// A stationary unit, treated as blocking unless no alternative exists
	Standing,
}

impl Occupancy {
	/// Every tier, cheapest first
	pub const ALL: [Occupancy; 7] = [
		Occupancy::Free,
		Occupancy::Moving,
		Occupancy::MustSearch,
		Occupancy::Waiting,
		Occupancy::Engaging,
		Occupancy::Reserved,
		Occupancy::Standing,
	];
	/// Extra traversal cost added on top of the terrain cost
	pub fn get_penalty(&self) -> u32 {
		match self {
			Occupancy::Free => 0,
			Occupancy::Moving => 2,
			Occupancy::MustSearch => 4,
			Occupancy::Waiting => 8,
			Occupancy::Engaging => 16,
			Occupancy::Reserved => 32,
			Occupancy::Standing => 200,
		}
	}
}

/// The movement state a mover reports whenever it changes, see
/// [crate::prelude::Pathfinder::unit_moving_status_changes]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub enum MoverStatus {
	#[default]
	Standing,
	Moving,
	MustSearch,
	Waiting,
	Engaging,
}

impl From<MoverStatus> for Occupancy {
	fn from(status: MoverStatus) -> Self {
		match status {
			MoverStatus::Standing => Occupancy::Standing,
			MoverStatus::Moving => Occupancy::Moving,
			MoverStatus::MustSearch => Occupancy::MustSearch,
			MoverStatus::Waiting => Occupancy::Waiting,
			MoverStatus::Engaging => Occupancy::Engaging,
		}
	}
}

/// Identity of a mover. Holding one does not keep the mover alive, its
/// liveness must be checked through [crate::prelude::WorldView] before use
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct MoverId(u64);

impl MoverId {
	/// Create a new instance of [MoverId]
	pub fn new(id: u64) -> Self {
		MoverId(id)
	}
	/// Get the raw id
	pub fn get(&self) -> u64 {
		self.0
	}
}
