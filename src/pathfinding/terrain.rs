//! The static terrain of a map. Every cell carries a slope cost, a
//! vegetation cost and a mask of which [MovementClass]es may enter it. These
//! values are derived once when a map is loaded and only change through
//! explicit terrain edits.
//!
//! An example of a small map written with [TerrainMap::from_ascii]:
//!
//! ```text
//! ..........
//! ..ff......
//! ..ff..##..
//! ......##..
//! ~~~~~~~~~~
//! ```
//!
//! Where `.` is flat ground, `f` is forest (vegetation cost), `^` is a steep
//! slope, `#` is a cliff no ground unit can cross and `~` is water
//!

use crate::prelude::*;
use bitflags::bitflags;

bitflags! {
	/// Which movement classes may enter a cell
	#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
	#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
	pub struct Passability: u8 {
		const LAND = 1 << 0;
		const WATER = 1 << 1;
		const AIR = 1 << 2;
	}
}

impl Passability {
	/// The flag of a single [MovementClass]
	pub fn of(class: MovementClass) -> Self {
		match class {
			MovementClass::Land => Passability::LAND,
			MovementClass::Water => Passability::WATER,
			MovementClass::Air => Passability::AIR,
		}
	}
}

/// Vegetation cost used by the `f` character of [TerrainMap::from_ascii]
const FOREST_VEGETATION: u8 = 3;
/// Slope cost used by the `^` character of [TerrainMap::from_ascii]
const STEEP_SLOPE: u8 = 4;

/// Static attributes of a single cell
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TerrainCell {
	/// Cost multiplier derived from the gradient of the ground, `1` is flat
	slope: u8,
	/// Extra cost of pushing through vegetation, `0` is clear ground
	vegetation: u8,
	/// Movement classes allowed to enter
	passable: Passability,
}

impl Default for TerrainCell {
	fn default() -> Self {
		TerrainCell::ground(1, 0)
	}
}

impl TerrainCell {
	/// Dry ground that land units and aircraft may cross. `slope` is clamped
	/// to at least `1`
	pub fn ground(slope: u8, vegetation: u8) -> Self {
		TerrainCell {
			slope: slope.max(1),
			vegetation,
			passable: Passability::LAND | Passability::AIR,
		}
	}
	/// Open water for ships and aircraft
	pub fn water() -> Self {
		TerrainCell {
			slope: 1,
			vegetation: 0,
			passable: Passability::WATER | Passability::AIR,
		}
	}
	/// A cliff or wall, only aircraft may cross
	pub fn cliff() -> Self {
		TerrainCell {
			slope: u8::MAX,
			vegetation: 0,
			passable: Passability::AIR,
		}
	}
	/// Shallow ground both land units and ships may enter
	pub fn shore() -> Self {
		TerrainCell {
			slope: 1,
			vegetation: 0,
			passable: Passability::all(),
		}
	}
	/// Get the slope cost
	pub fn get_slope(&self) -> u8 {
		self.slope
	}
	/// Get the vegetation cost
	pub fn get_vegetation(&self) -> u8 {
		self.vegetation
	}
	/// Get the passability mask
	pub fn get_passability(&self) -> Passability {
		self.passable
	}
	/// Whether `class` may enter the cell at all
	pub fn is_passable(&self, class: MovementClass) -> bool {
		self.passable.contains(Passability::of(class))
	}
	/// The static cost of entering the cell for a `class`, [None] when the
	/// cell is impassable for it. Only land units feel slopes and vegetation
	pub fn get_terrain_cost(&self, class: MovementClass) -> Option<u32> {
		if !self.is_passable(class) {
			return None;
		}
		match class {
			MovementClass::Land => Some((self.slope as u32 + self.vegetation as u32).max(1)),
			MovementClass::Water | MovementClass::Air => Some(1),
		}
	}
}

/// The terrain of a whole map stored in row-major order
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainMap {
	/// Number of columns
	width: u32,
	/// Number of rows
	height: u32,
	/// Cells in row-major order
	cells: Vec<TerrainCell>,
}

impl TerrainMap {
	/// Create a new instance of [TerrainMap] of flat open ground
	pub fn new(width: u32, height: u32) -> Self {
		if width == 0 || height == 0 {
			panic!(
				"Terrain dimensions `({}, {})` must contain at least one cell",
				width, height
			);
		}
		TerrainMap {
			width,
			height,
			cells: vec![TerrainCell::default(); width as usize * height as usize],
		}
	}
	/// Get the `(width, height)` in cells
	pub fn get_size(&self) -> (u32, u32) {
		(self.width, self.height)
	}
	/// Row-major index of a cell, [None] if outside the map
	fn index(&self, cell: &CellPos) -> Option<usize> {
		if cell.get_x() < self.width && cell.get_y() < self.height {
			Some(cell.get_y() as usize * self.width as usize + cell.get_x() as usize)
		} else {
			None
		}
	}
	/// Retrieve the terrain of a cell, [None] if outside the map
	pub fn get_cell(&self, cell: &CellPos) -> Option<TerrainCell> {
		self.index(cell).map(|i| self.cells[i])
	}
	/// Replace the terrain of a cell, returns `false` if the cell is outside
	/// the map
	pub fn set_cell(&mut self, cell: &CellPos, terrain: TerrainCell) -> bool {
		if let Some(i) = self.index(cell) {
			self.cells[i] = terrain;
			true
		} else {
			false
		}
	}
	/// Build a map from rows of characters, see the module documentation
	/// for the legend. Rows must all be the same length
	pub fn from_ascii(rows: &[&str]) -> Result<Self, PathfinderError> {
		let height = rows.len() as u32;
		let width = rows.first().map(|r| r.chars().count()).unwrap_or(0) as u32;
		if width == 0 || height == 0 {
			return Err(PathfinderError::MalformedTerrain(
				"an ascii map needs at least one cell".to_string(),
			));
		}
		let mut map = TerrainMap::new(width, height);
		for (y, row) in rows.iter().enumerate() {
			if row.chars().count() as u32 != width {
				return Err(PathfinderError::MalformedTerrain(format!(
					"row {} has {} cells, expected {}",
					y,
					row.chars().count(),
					width
				)));
			}
			for (x, c) in row.chars().enumerate() {
				let terrain = match c {
					'.' => TerrainCell::default(),
					'f' => TerrainCell::ground(1, FOREST_VEGETATION),
					'^' => TerrainCell::ground(STEEP_SLOPE, 0),
					'#' => TerrainCell::cliff(),
					'~' => TerrainCell::water(),
					'_' => TerrainCell::shore(),
					other => {
						return Err(PathfinderError::MalformedTerrain(format!(
							"unknown terrain character '{}' at ({}, {})",
							other, x, y
						)))
					}
				};
				map.set_cell(&CellPos::new(x as u32, y as u32), terrain);
			}
		}
		Ok(map)
	}
	/// From a `ron` file generate the [TerrainMap]
	#[cfg(feature = "ron")]
	pub fn from_ron(path: &str) -> Result<Self, PathfinderError> {
		let source = std::fs::read_to_string(path)?;
		TerrainMap::from_ron_str(&source)
	}
	/// Parse a [TerrainMap] from a `ron` string, the map must hold at least
	/// one cell and exactly `width * height` of them
	#[cfg(feature = "ron")]
	pub fn from_ron_str(source: &str) -> Result<Self, PathfinderError> {
		let map: TerrainMap = ron::de::from_str(source)?;
		if map.width == 0 || map.height == 0 {
			return Err(PathfinderError::MalformedTerrain(format!(
				"a {}x{} map has no cells",
				map.width, map.height
			)));
		}
		if map.cells.len() != map.width as usize * map.height as usize {
			return Err(PathfinderError::MalformedTerrain(format!(
				"{} cells stored for a {}x{} map",
				map.cells.len(),
				map.width,
				map.height
			)));
		}
		Ok(map)
	}
	/// From a CSV file of slope costs generate the [TerrainMap]. Each record
	/// is a row of the map, a value of `255` marks a cliff and `0` marks water
	#[cfg(feature = "csv")]
	pub fn from_csv(path: &str) -> Result<Self, PathfinderError> {
		let data = std::fs::File::open(path)?;
		let mut rdr = csv::ReaderBuilder::new()
			.has_headers(false)
			.from_reader(data);
		let mut rows: Vec<Vec<TerrainCell>> = Vec::new();
		for record in rdr.records() {
			let record = record?;
			let mut row = Vec::new();
			for value in record.iter() {
				let value: u8 = value.trim().parse().map_err(|_| {
					PathfinderError::MalformedTerrain(format!(
						"CSV expects u8 values, found '{}'",
						value
					))
				})?;
				let terrain = match value {
					0 => TerrainCell::water(),
					255 => TerrainCell::cliff(),
					slope => TerrainCell::ground(slope, 0),
				};
				row.push(terrain);
			}
			rows.push(row);
		}
		let width = rows.first().map(|r| r.len()).unwrap_or(0);
		if width == 0 || rows.iter().any(|r| r.len() != width) {
			return Err(PathfinderError::MalformedTerrain(
				"CSV rows must be non-empty and of equal length".to_string(),
			));
		}
		let height = rows.len();
		Ok(TerrainMap {
			width: width as u32,
			height: height as u32,
			cells: rows.into_iter().flatten().collect(),
		})
	}
	/// Create a [TerrainMap] from a greyscale heightmap where each pixel is
	/// the height of a cell. The slope cost of a cell grows with the largest
	/// height difference to its orthogonal neighbours, differences above
	/// `cliff_threshold` make the cell impassable for land units and pure
	/// black pixels are treated as water
	#[cfg(feature = "heightmap")]
	pub fn from_heightmap(path: &str, cliff_threshold: u8) -> Result<Self, PathfinderError> {
		use photon_rs::native::open_image;
		let img = open_image(path).map_err(|e| PathfinderError::Heightmap(e.to_string()))?;
		let width = img.get_width();
		let height = img.get_height();
		let raw_pixels = img.get_raw_pixels();
		// raw pixels come in sets of 4 (Red, Green, Blue, Alpha)
		let heights: Vec<u8> = raw_pixels
			.chunks(4)
			.map(|px| ((px[0] as u16 + px[1] as u16 + px[2] as u16) / 3) as u8)
			.collect();
		if heights.len() != width as usize * height as usize {
			return Err(PathfinderError::MalformedTerrain(format!(
				"heightmap holds {} pixels for a {}x{} image",
				heights.len(),
				width,
				height
			)));
		}
		let mut map = TerrainMap::new(width, height);
		for cell in CellRect::new(0, 0, width - 1, height - 1).iter() {
			let i = cell.get_y() as usize * width as usize + cell.get_x() as usize;
			let h = heights[i];
			if h == 0 {
				map.cells[i] = TerrainCell::water();
				continue;
			}
			let mut steepest = 0;
			for ordinal in Ordinal::ORTHOGONAL {
				if let Some(n) = cell.step(ordinal) {
					if n.get_x() < width && n.get_y() < height {
						let j = n.get_y() as usize * width as usize + n.get_x() as usize;
						steepest = steepest.max(h.abs_diff(heights[j]));
					}
				}
			}
			map.cells[i] = if steepest > cliff_threshold {
				TerrainCell::cliff()
			} else {
				TerrainCell::ground(1 + steepest / 8, 0)
			};
		}
		Ok(map)
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn land_cost_includes_slope_and_vegetation() {
		let cell = TerrainCell::ground(3, 2);
		assert_eq!(Some(5), cell.get_terrain_cost(MovementClass::Land));
		assert_eq!(None, cell.get_terrain_cost(MovementClass::Water));
		assert_eq!(Some(1), cell.get_terrain_cost(MovementClass::Air));
	}
	#[test]
	fn flat_slope_is_never_free() {
		let cell = TerrainCell::ground(0, 0);
		assert_eq!(Some(1), cell.get_terrain_cost(MovementClass::Land));
	}
	#[test]
	fn cliff_only_flyable() {
		let cell = TerrainCell::cliff();
		assert!(!cell.is_passable(MovementClass::Land));
		assert!(!cell.is_passable(MovementClass::Water));
		assert!(cell.is_passable(MovementClass::Air));
	}
	#[test]
	#[cfg(feature = "ron")]
	fn empty_ron_map_rejected() {
		let result = TerrainMap::from_ron_str("(width: 0, height: 0, cells: [])");
		assert!(matches!(result, Err(PathfinderError::MalformedTerrain(_))));
		let result = TerrainMap::from_ron_str("(width: 3, height: 0, cells: [])");
		assert!(matches!(result, Err(PathfinderError::MalformedTerrain(_))));
	}
	#[test]
	fn ascii_map() {
		let map = TerrainMap::from_ascii(&[".f#", "~_^"]).unwrap();
		assert_eq!((3, 2), map.get_size());
		assert_eq!(Some(TerrainCell::cliff()), map.get_cell(&CellPos::new(2, 0)));
		assert_eq!(Some(TerrainCell::water()), map.get_cell(&CellPos::new(0, 1)));
		assert_eq!(
			Some(4),
			map.get_cell(&CellPos::new(2, 1))
				.unwrap()
				.get_terrain_cost(MovementClass::Land)
		);
		assert_eq!(None, map.get_cell(&CellPos::new(3, 0)));
	}
	#[test]
	fn ascii_map_rejects_ragged_rows() {
		let result = TerrainMap::from_ascii(&["...", ".."]);
		assert!(matches!(result, Err(PathfinderError::MalformedTerrain(_))));
	}
	#[test]
	fn ascii_map_rejects_unknown_characters() {
		let result = TerrainMap::from_ascii(&[".x."]);
		assert!(result.is_err());
	}
	#[test]
	fn set_cell_out_of_bounds() {
		let mut map = TerrainMap::new(2, 2);
		assert!(!map.set_cell(&CellPos::new(2, 0), TerrainCell::cliff()));
		assert!(map.set_cell(&CellPos::new(1, 1), TerrainCell::cliff()));
	}
	#[test]
	#[cfg(feature = "ron")]
	fn terrain_round_trips_through_ron() {
		let map = TerrainMap::from_ascii(&[".#", "~f"]).unwrap();
		let text = ron::ser::to_string(&map).unwrap();
		let result: TerrainMap = ron::de::from_str(&text).unwrap();
		assert_eq!(map, result);
	}
}
