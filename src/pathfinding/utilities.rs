//! Useful structures and tools shared by the grids and the searches
//!

use bevy::prelude::*;

/// Default edge length (in cells) of the square blocks used by the
/// high-level search
pub const DEFAULT_BLOCK_SIZE: u32 = 16;
/// Cost of an orthogonal step across a cell with a traversal cost of `1`
pub const ORTHOGONAL_STEP: u32 = 100;
/// Cost of a diagonal step across a cell with a traversal cost of `1`,
/// `ORTHOGONAL_STEP * sqrt(2)` truncated so every client computes the same
/// value without floating point
pub const DIAGONAL_STEP: u32 = 141;

/// The 8 directions of movement across the grid. `y` grows towards the
/// South, `x` grows towards the East
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Reflect)]
pub enum Ordinal {
	North,
	East,
	South,
	West,
	NorthEast,
	SouthEast,
	SouthWest,
	NorthWest,
}

impl Ordinal {
	/// Neighbour enumeration order used by every search, orthogonals first.
	/// Changing this order changes the paths produced on every client
	pub const ALL: [Ordinal; 8] = [
		Ordinal::North,
		Ordinal::East,
		Ordinal::South,
		Ordinal::West,
		Ordinal::NorthEast,
		Ordinal::SouthEast,
		Ordinal::SouthWest,
		Ordinal::NorthWest,
	];
	/// The 4 orthogonal directions
	pub const ORTHOGONAL: [Ordinal; 4] =
		[Ordinal::North, Ordinal::East, Ordinal::South, Ordinal::West];
	/// Clockwise compass ordering starting from North, used for headings
	const COMPASS: [Ordinal; 8] = [
		Ordinal::North,
		Ordinal::NorthEast,
		Ordinal::East,
		Ordinal::SouthEast,
		Ordinal::South,
		Ordinal::SouthWest,
		Ordinal::West,
		Ordinal::NorthWest,
	];
	/// The `(dx, dy)` offset of a single step in this direction
	pub fn get_offset(&self) -> (i32, i32) {
		match self {
			Ordinal::North => (0, -1),
			Ordinal::East => (1, 0),
			Ordinal::South => (0, 1),
			Ordinal::West => (-1, 0),
			Ordinal::NorthEast => (1, -1),
			Ordinal::SouthEast => (1, 1),
			Ordinal::SouthWest => (-1, 1),
			Ordinal::NorthWest => (-1, -1),
		}
	}
	/// Find the [Ordinal] of a single step offset, [None] if the offset is
	/// not a unit step
	pub fn from_offset(offset: (i32, i32)) -> Option<Self> {
		match offset {
			(0, -1) => Some(Ordinal::North),
			(1, 0) => Some(Ordinal::East),
			(0, 1) => Some(Ordinal::South),
			(-1, 0) => Some(Ordinal::West),
			(1, -1) => Some(Ordinal::NorthEast),
			(1, 1) => Some(Ordinal::SouthEast),
			(-1, 1) => Some(Ordinal::SouthWest),
			(-1, -1) => Some(Ordinal::NorthWest),
			_ => None,
		}
	}
	/// Whether a step in this direction crosses a cell corner
	pub fn is_diagonal(&self) -> bool {
		matches!(
			self,
			Ordinal::NorthEast | Ordinal::SouthEast | Ordinal::SouthWest | Ordinal::NorthWest
		)
	}
	/// Geometric length of a step in this direction in step units
	pub fn get_step_cost(&self) -> u32 {
		if self.is_diagonal() {
			DIAGONAL_STEP
		} else {
			ORTHOGONAL_STEP
		}
	}
	/// The two orthogonal components of a diagonal step, used to forbid
	/// cutting across the corner of an obstacle
	pub fn get_orthogonal_components(&self) -> Option<(Ordinal, Ordinal)> {
		match self {
			Ordinal::NorthEast => Some((Ordinal::North, Ordinal::East)),
			Ordinal::SouthEast => Some((Ordinal::South, Ordinal::East)),
			Ordinal::SouthWest => Some((Ordinal::South, Ordinal::West)),
			Ordinal::NorthWest => Some((Ordinal::North, Ordinal::West)),
			_ => None,
		}
	}
	/// Returns the opposite [Ordinal] of the current
	pub fn inverse(&self) -> Ordinal {
		match self {
			Ordinal::North => Ordinal::South,
			Ordinal::East => Ordinal::West,
			Ordinal::South => Ordinal::North,
			Ordinal::West => Ordinal::East,
			Ordinal::NorthEast => Ordinal::SouthWest,
			Ordinal::SouthEast => Ordinal::NorthWest,
			Ordinal::SouthWest => Ordinal::NorthEast,
			Ordinal::NorthWest => Ordinal::SouthEast,
		}
	}
	/// Position of this direction on the clockwise compass, North is `0`
	pub fn get_compass_index(&self) -> usize {
		match self {
			Ordinal::North => 0,
			Ordinal::NorthEast => 1,
			Ordinal::East => 2,
			Ordinal::SouthEast => 3,
			Ordinal::South => 4,
			Ordinal::SouthWest => 5,
			Ordinal::West => 6,
			Ordinal::NorthWest => 7,
		}
	}
	/// Turn by 45 degrees, `clockwise` or anticlockwise
	pub fn rotate(&self, clockwise: bool) -> Ordinal {
		let index = self.get_compass_index();
		if clockwise {
			Self::COMPASS[(index + 1) % 8]
		} else {
			Self::COMPASS[(index + 7) % 8]
		}
	}
	/// Number of 45 degree turns needed to swing from `self` to `other`
	/// (`0..=4`)
	pub fn turns_to(&self, other: &Ordinal) -> u32 {
		let diff = self.get_compass_index().abs_diff(other.get_compass_index());
		diff.min(8 - diff) as u32
	}
	/// The compass direction that best approximates the bearing of `(dx,
	/// dy)`. A zero vector yields [None]
	pub fn from_bearing(dx: i64, dy: i64) -> Option<Ordinal> {
		if dx == 0 && dy == 0 {
			return None;
		}
		// compare against tan(22.5) ~= 5/12 using integers only
		let ax = dx.abs();
		let ay = dy.abs();
		let x_sign = dx.signum() as i32;
		let y_sign = dy.signum() as i32;
		if ay * 12 <= ax * 5 {
			Ordinal::from_offset((x_sign, 0))
		} else if ax * 12 <= ay * 5 {
			Ordinal::from_offset((0, y_sign))
		} else {
			Ordinal::from_offset((x_sign, y_sign))
		}
	}
}

/// Octile distance in step units between two points separated by `dx` and
/// `dy` cells. This is the exact cost of crossing open ground where every
/// cell costs `1`
pub fn octile_distance(dx: u32, dy: u32) -> u32 {
	let (short, long) = if dx < dy { (dx, dy) } else { (dy, dx) };
	DIAGONAL_STEP * short + ORTHOGONAL_STEP * (long - short)
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn offsets_round_trip_through_ordinals() {
		for ordinal in Ordinal::ALL {
			assert_eq!(Some(ordinal), Ordinal::from_offset(ordinal.get_offset()));
		}
		assert_eq!(None, Ordinal::from_offset((2, 0)));
	}
	#[test]
	fn inverse_cancels_offset() {
		for ordinal in Ordinal::ALL {
			let a = ordinal.get_offset();
			let b = ordinal.inverse().get_offset();
			assert_eq!((0, 0), (a.0 + b.0, a.1 + b.1));
		}
	}
	#[test]
	fn diagonal_components() {
		let result = Ordinal::NorthWest.get_orthogonal_components();
		assert_eq!(Some((Ordinal::North, Ordinal::West)), result);
		assert_eq!(None, Ordinal::East.get_orthogonal_components());
	}
	#[test]
	fn rotation_wraps_the_compass() {
		assert_eq!(Ordinal::NorthWest, Ordinal::North.rotate(false));
		assert_eq!(Ordinal::North, Ordinal::NorthWest.rotate(true));
		assert_eq!(Ordinal::SouthEast, Ordinal::East.rotate(true));
	}
	#[test]
	fn turn_counts() {
		assert_eq!(0, Ordinal::East.turns_to(&Ordinal::East));
		assert_eq!(1, Ordinal::North.turns_to(&Ordinal::NorthWest));
		assert_eq!(4, Ordinal::North.turns_to(&Ordinal::South));
		assert_eq!(3, Ordinal::NorthEast.turns_to(&Ordinal::South));
	}
	#[test]
	fn bearing_snaps_to_compass() {
		assert_eq!(Some(Ordinal::East), Ordinal::from_bearing(10, 1));
		assert_eq!(Some(Ordinal::SouthEast), Ordinal::from_bearing(5, 5));
		assert_eq!(Some(Ordinal::North), Ordinal::from_bearing(1, -9));
		assert_eq!(None, Ordinal::from_bearing(0, 0));
	}
	#[test]
	fn octile() {
		assert_eq!(19 * DIAGONAL_STEP, octile_distance(19, 19));
		assert_eq!(3 * DIAGONAL_STEP + 2 * ORTHOGONAL_STEP, octile_distance(5, 3));
		assert_eq!(0, octile_distance(0, 0));
	}
}
