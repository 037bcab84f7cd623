//! Errors raised while building or loading the pathfinder. Per-request
//! failures are never errors, they are reported through
//! [crate::prelude::PathResult] so one bad request cannot disturb the rest
//! of a simulation tick
//!

use crate::prelude::*;

/// Failures of construction, configuration and persistence
#[derive(Debug, thiserror::Error)]
pub enum PathfinderError {
	/// A cell outside of the map was supplied
	#[error("cell {cell:?} lies outside of the {width}x{height} map")]
	InvalidCoordinate {
		/// The offending cell
		cell: CellPos,
		/// Map width in cells
		width: u32,
		/// Map height in cells
		height: u32,
	},
	/// A saved layout does not describe the map it is being loaded against
	#[error("saved layout is {layout:?} cells but the world is {world:?} cells")]
	LayoutMismatch {
		/// `(width, height)` recorded in the layout
		layout: (u32, u32),
		/// `(width, height)` of the world
		world: (u32, u32),
	},
	/// A saved layout was written by an incompatible version
	#[error("unsupported layout version {0}")]
	UnsupportedLayoutVersion(u32),
	/// A configuration value is out of range
	#[error("invalid pathfinder configuration: {0}")]
	InvalidConfig(String),
	/// Terrain data could not be interpreted
	#[error("malformed terrain data: {0}")]
	MalformedTerrain(String),
	/// Reading or writing a file failed
	#[error(transparent)]
	Io(#[from] std::io::Error),
	/// A RON document could not be parsed
	#[cfg(feature = "ron")]
	#[error(transparent)]
	RonParse(#[from] ron::error::SpannedError),
	/// A value could not be written as RON
	#[cfg(feature = "ron")]
	#[error(transparent)]
	RonWrite(#[from] ron::Error),
	/// A CSV document could not be parsed
	#[cfg(feature = "csv")]
	#[error(transparent)]
	Csv(#[from] csv::Error),
	/// A heightmap image could not be opened
	#[cfg(feature = "heightmap")]
	#[error("failed to open heightmap: {0}")]
	Heightmap(String),
}
