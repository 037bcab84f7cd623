//! The searches run by the pathfinder share the pieces in this module: the
//! deterministic [OpenList], the [GoalZone] describing where a search may
//! stop, the [SearchWindow] bounding a cell level search and the
//! [LocalOutcome] they report.
//!
//! Every client of a lockstep game must expand nodes in exactly the same
//! order. Nodes are popped by lowest `f = g + h` and among equal `f` the
//! node pushed first wins, the push order being recorded by a sequence
//! number that increases monotonically over the lifetime of a search
//!

pub mod flying;
pub mod high_level;
pub mod low_level;

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::prelude::*;

/// How a search ended
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SearchOutcome {
	/// A cell of the goal zone was reached
	GoalReached,
	/// Every reachable cell was explored without finding the goal zone
	NoPath,
	/// The search window or the node budget stopped the search before it
	/// could decide
	OutOfRange,
}

/// Entry of the [OpenList]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenEntry {
	/// `g + h`
	f: u32,
	/// Push order
	seq: u64,
	/// Arena index of the node
	index: usize,
}

impl Ord for OpenEntry {
	fn cmp(&self, other: &Self) -> Ordering {
		// reversed so the max-heap pops the smallest f, then the oldest push
		other
			.f
			.cmp(&self.f)
			.then_with(|| other.seq.cmp(&self.seq))
	}
}

impl PartialOrd for OpenEntry {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Priority queue of nodes waiting to be expanded with a first-in tie break
#[derive(Clone, Debug, Default)]
pub struct OpenList {
	/// Pending entries, may contain stale duplicates of a node
	heap: BinaryHeap<OpenEntry>,
	/// Sequence number handed to the next push
	next_seq: u64,
}

impl OpenList {
	/// Create a new instance of [OpenList]
	pub fn new() -> Self {
		OpenList::default()
	}
	/// Empty the list and restart the sequence numbering, the allocation is
	/// kept for the next search
	pub fn clear(&mut self) {
		self.heap.clear();
		self.next_seq = 0;
	}
	/// Queue a node with priority `f`, returns the sequence number assigned
	pub fn push(&mut self, f: u32, index: usize) -> u64 {
		let seq = self.next_seq;
		self.next_seq += 1;
		self.heap.push(OpenEntry { f, seq, index });
		seq
	}
	/// Remove the entry with the lowest `f`, ties broken by earliest push.
	/// Returns `(f, seq, index)`
	pub fn pop(&mut self) -> Option<(u32, u64, usize)> {
		self.heap.pop().map(|e| (e.f, e.seq, e.index))
	}
	/// Whether nothing is queued
	pub fn is_empty(&self) -> bool {
		self.heap.is_empty()
	}
	/// Number of queued entries, stale ones included
	pub fn len(&self) -> usize {
		self.heap.len()
	}
}

/// The cells a search may stop at: everything within Chebyshev distance
/// `range` of the destination, cropped to the map
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoalZone {
	/// The requested destination
	destination: CellPos,
	/// Acceptance range
	range: u32,
	/// Cells of the zone on the map
	rect: CellRect,
}

impl GoalZone {
	/// Create a new instance of [GoalZone], [None] if the destination is off
	/// the map
	pub fn new(destination: CellPos, range: u32, dimensions: &MapDimensions) -> Option<Self> {
		if !dimensions.contains(&destination) {
			return None;
		}
		let rect = CellRect::around(destination, range).clamp_to(dimensions)?;
		Some(GoalZone {
			destination,
			range,
			rect,
		})
	}
	/// Get the destination
	pub fn get_destination(&self) -> CellPos {
		self.destination
	}
	/// Get the acceptance range
	pub fn get_range(&self) -> u32 {
		self.range
	}
	/// Get the cells of the zone
	pub fn get_rect(&self) -> CellRect {
		self.rect
	}
	/// Whether the cell satisfies the acceptance range
	pub fn contains(&self, cell: &CellPos) -> bool {
		self.rect.contains(cell)
	}
	/// Octile distance in step units from `cell` to the nearest cell of the
	/// zone. Never overestimates because every passable cell costs at
	/// least `1`
	pub fn heuristic(&self, cell: &CellPos) -> u32 {
		let (dx, dy) = self.rect.axis_distance(cell);
		octile_distance(dx, dy)
	}
}

/// A rectangle of cells a search is confined to, mapping each cell to a
/// dense local index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchWindow {
	/// Cells of the window
	rect: CellRect,
}

impl SearchWindow {
	/// The window around `start` and `zone` grown by `margin` plus a quarter
	/// of their separation, never reaching further than `max_extent` cells
	/// from the start and always cropped to the map
	pub fn around(
		start: CellPos,
		zone: &GoalZone,
		margin: u32,
		max_extent: u32,
		dimensions: &MapDimensions,
	) -> Option<Self> {
		let separation = start.chebyshev_distance(&zone.get_destination());
		let wanted = CellRect::from_cell(start)
			.union(&zone.get_rect())
			.grow(margin.saturating_add(separation / 4));
		let rect = wanted
			.intersection(&CellRect::around(start, max_extent))?
			.clamp_to(dimensions)?;
		Some(SearchWindow { rect })
	}
	/// A window covering exactly `rect` cropped to the map
	pub fn from_rect(rect: &CellRect, dimensions: &MapDimensions) -> Option<Self> {
		rect.clamp_to(dimensions).map(|rect| SearchWindow { rect })
	}
	/// Get the cells of the window
	pub fn get_rect(&self) -> CellRect {
		self.rect
	}
	/// Number of cells in the window
	pub fn get_area(&self) -> usize {
		self.rect.get_area()
	}
	/// Local index of a cell, [None] outside the window
	pub fn get_index(&self, cell: &CellPos) -> Option<usize> {
		if !self.rect.contains(cell) {
			return None;
		}
		let min = self.rect.get_min();
		Some(
			(cell.get_y() - min.get_y()) as usize * self.rect.get_width() as usize
				+ (cell.get_x() - min.get_x()) as usize,
		)
	}
	/// The cell at a local index
	pub fn get_cell(&self, index: usize) -> CellPos {
		let min = self.rect.get_min();
		let width = self.rect.get_width() as usize;
		CellPos::new(
			min.get_x() + (index % width) as u32,
			min.get_y() + (index / width) as u32,
		)
	}
}

/// The product of a cell level search
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalOutcome {
	/// How the search ended
	pub outcome: SearchOutcome,
	/// Cells to visit in order, the start is excluded and the last cell is
	/// the cell reached. When the search failed this holds the route to the
	/// closest node found if partial results were requested, otherwise it
	/// is empty
	pub waypoints: Vec<CellPos>,
	/// Total cost of the waypoints in step units
	pub cost: u32,
	/// Whether `waypoints` is a partial route of a failed search
	pub partial: bool,
	/// The cell used in place of an impassable destination
	pub substitute: Option<CellPos>,
	/// Number of nodes expanded
	pub expanded: usize,
}

impl LocalOutcome {
	/// An outcome with no route
	pub fn empty(outcome: SearchOutcome) -> Self {
		LocalOutcome {
			outcome,
			waypoints: Vec::new(),
			cost: 0,
			partial: false,
			substitute: None,
			expanded: 0,
		}
	}
	/// Whether the goal zone was reached
	pub fn is_success(&self) -> bool {
		self.outcome == SearchOutcome::GoalReached
	}
}

/// Walk a parent chain from `end` back to the root and return the cells in
/// travel order, the root excluded
pub(crate) fn trace_route(
	parents: &[u32],
	end: usize,
	to_cell: impl Fn(usize) -> CellPos,
) -> Vec<CellPos> {
	let mut route = Vec::new();
	let mut current = end;
	while parents[current] != u32::MAX {
		route.push(to_cell(current));
		current = parents[current] as usize;
	}
	route.reverse();
	route
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn open_list_pops_lowest_f() {
		let mut open = OpenList::new();
		open.push(30, 0);
		open.push(10, 1);
		open.push(20, 2);
		assert_eq!(Some((10, 1, 1)), open.pop());
		assert_eq!(Some((20, 2, 2)), open.pop());
		assert_eq!(Some((30, 0, 0)), open.pop());
		assert!(open.is_empty());
	}
	#[test]
	fn open_list_ties_favour_earliest_push() {
		let mut open = OpenList::new();
		for index in [7, 3, 9, 1] {
			open.push(50, index);
		}
		let result: Vec<usize> = std::iter::from_fn(|| open.pop().map(|e| e.2)).collect();
		assert_eq!(vec![7, 3, 9, 1], result);
	}
	#[test]
	fn clear_restarts_sequence() {
		let mut open = OpenList::new();
		open.push(1, 0);
		open.push(1, 0);
		open.clear();
		assert_eq!(0, open.push(1, 0));
		assert_eq!(1, open.len());
	}
	#[test]
	fn goal_zone_clamped_to_map() {
		let dims = MapDimensions::new(10, 10, 5);
		let zone = GoalZone::new(CellPos::new(9, 0), 2, &dims).unwrap();
		assert_eq!(CellRect::new(7, 0, 9, 2), zone.get_rect());
		assert_eq!(0, zone.heuristic(&CellPos::new(8, 1)));
		assert_eq!(5 * ORTHOGONAL_STEP, zone.heuristic(&CellPos::new(2, 0)));
		assert_eq!(None, GoalZone::new(CellPos::new(10, 0), 2, &dims));
	}
	#[test]
	fn window_limited_by_extent() {
		let dims = MapDimensions::new(200, 200, 16);
		let zone = GoalZone::new(CellPos::new(190, 10), 0, &dims).unwrap();
		let window = SearchWindow::around(CellPos::new(10, 10), &zone, 8, 50, &dims).unwrap();
		assert_eq!(CellRect::new(0, 0, 60, 60), window.get_rect());
	}
	#[test]
	fn window_indices() {
		let dims = MapDimensions::new(20, 20, 5);
		let window = SearchWindow::from_rect(&CellRect::new(4, 4, 7, 9), &dims).unwrap();
		let cell = CellPos::new(6, 5);
		let index = window.get_index(&cell).unwrap();
		assert_eq!(6, index);
		assert_eq!(cell, window.get_cell(index));
		assert_eq!(None, window.get_index(&CellPos::new(8, 5)));
	}
	#[test]
	fn route_from_parents() {
		let parents = vec![u32::MAX, 0, 1, 2];
		let route = trace_route(&parents, 3, |i| CellPos::new(i as u32, 0));
		assert_eq!(
			vec![CellPos::new(1, 0), CellPos::new(2, 0), CellPos::new(3, 0)],
			route
		);
	}
}
