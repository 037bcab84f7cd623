//! `use bevy_pathfinder_blocks_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::pathfinding::{
	blocks::{block_grid::*, *},
	cells::{cell_status::*, *},
	config::*,
	error::*,
	pathfinder::*,
	persistence::*,
	request::*,
	search::{flying::*, high_level::*, low_level::*, *},
	terrain::*,
	utilities::*,
	world::*,
};

#[doc(hidden)]
pub use crate::{
	bundle::*,
	plugin::{occupancy_layer::*, path_layer::*, *},
};
