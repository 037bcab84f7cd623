//! Human readable descriptions of cached cells and blocks for debugging a
//! stuck mover
//!

use crate::prelude::*;
use std::fmt::Write;

impl Pathfinder {
	/// Describe the cached status of `cell` for `class`
	pub fn describe_cell(&self, class: MovementClass, cell: &CellPos) -> String {
		let Some(status) = self.get_cell_grids().get(class).get_status(cell) else {
			return format!("cell {:?} is outside of the map", cell.get());
		};
		let mut out = format!("cell {:?} {:?}: ", cell.get(), class);
		if status.is_passable() {
			let _ = write!(out, "passable cost {}", status.get_cost());
		} else {
			out.push_str("impassable");
		}
		let _ = write!(
			out,
			", occupancy {:?}, flags {:?}",
			status.get_occupancy(),
			status.get_flags()
		);
		if status.is_dirty() {
			out.push_str(", awaiting recompute");
		}
		out
	}
	/// Describe the cached summary of `block` for `class` along with its
	/// connections
	pub fn describe_block(&self, class: MovementClass, block: &BlockID) -> String {
		let Some(grid) = self.get_block_grids().get(class) else {
			return format!("{:?} movers are not routed across blocks", class);
		};
		let Some(data) = grid.get_block(block) else {
			return format!("block {:?} is outside of the map", block.get());
		};
		let mut out = format!("block {:?} {:?}: ", block.get(), class);
		match data.get_center() {
			Some(center) => {
				let _ = write!(
					out,
					"center {:?} cost {} region {}",
					center.get(),
					data.get_cost(),
					data.get_region_size()
				);
			}
			None => out.push_str("no passable cell"),
		}
		if grid.is_dirty(block) {
			out.push_str(", awaiting recompute");
		}
		let _ = write!(out, ", revision {}", grid.get_revision());
		for (neighbour, connection) in grid.get_connections(block) {
			let _ = write!(
				out,
				"\n  -> {:?} cost {} across {} border cells",
				neighbour.get(),
				connection.get_cost(),
				connection.get_border_cells()
			);
		}
		out
	}
}
