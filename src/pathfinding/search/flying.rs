//! Aircraft ignore terrain but cannot turn on the spot. A flying search node
//! is a cell together with the [Ordinal] heading the aircraft entered it
//! with. From a node the aircraft may carry straight on or bank 45 degrees
//! either way, each bank costing `flight_turn_penalty` on top of the step
//! length.
//!
//! ```text
//!   heading East from X
//!
//!        . / .
//!        X - .
//!        . \ .
//! ```
//!
//! Only the map bounds and other aircraft are obstacles. Cells holding a
//! standing, reserved or engaging aircraft are closed, any other aircraft
//! makes a cell more expensive
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Inputs of a single flying search
#[derive(Clone, Copy, Debug)]
pub struct FlyingQuery {
	/// Cell the aircraft is in
	pub start: CellPos,
	/// Cell the aircraft wants to reach
	pub destination: CellPos,
	/// Acceptance range
	pub range: u32,
	/// Current heading of the aircraft, [None] when it may leave in any
	/// direction
	pub start_heading: Option<Ordinal>,
	/// On failure return the route to the closest node found
	pub partial: bool,
}

/// Number of headings per cell
const HEADINGS: usize = 8;

/// Reusable state of the flying search
#[derive(Clone, Debug)]
pub struct FlyingSearch {
	/// Window margin around the start and goal zone
	flight_margin: u32,
	/// Furthest the window may reach from the start
	max_window_cells: u32,
	/// Expansions allowed per search
	max_search_nodes: usize,
	/// Cost of a single 45 degree turn
	turn_penalty: u32,
	/// Best known cost per `(cell, heading)` state
	g: Vec<u32>,
	/// Parent state of each state, `u32::MAX` for none
	parents: Vec<u32>,
	/// Whether each state has been expanded
	closed: Vec<bool>,
	/// Pending states
	open: OpenList,
}

impl FlyingSearch {
	/// Create a new instance of [FlyingSearch]
	pub fn new(config: &PathfinderConfig) -> Self {
		FlyingSearch {
			flight_margin: config.flight_margin,
			max_window_cells: config.max_window_cells,
			max_search_nodes: config.max_search_nodes,
			turn_penalty: config.flight_turn_penalty,
			g: Vec::new(),
			parents: Vec::new(),
			closed: Vec::new(),
			open: OpenList::new(),
		}
	}
	/// Whether an aircraft may fly through a cell, returns its cost
	fn airspace_cost(grid: &mut CellStatusGrid, world: &dyn WorldView, cell: &CellPos) -> Option<u32> {
		let status = grid.resolve(cell, world)?;
		if !status.is_passable() {
			return None;
		}
		match status.get_occupancy() {
			Occupancy::Standing | Occupancy::Reserved | Occupancy::Engaging => None,
			_ => Some(status.get_cost()),
		}
	}
	/// Estimate of the remaining cost from a state, straight line distance
	/// plus the turns needed to face the goal beyond the first
	fn heuristic(&self, zone: &GoalZone, cell: &CellPos, heading: Ordinal) -> u32 {
		if zone.contains(cell) {
			return 0;
		}
		let target = zone.get_rect().nearest_cell(cell);
		let dx = target.get_x() as i64 - cell.get_x() as i64;
		let dy = target.get_y() as i64 - cell.get_y() as i64;
		let turns = Ordinal::from_bearing(dx, dy)
			.map(|bearing| heading.turns_to(&bearing).saturating_sub(1))
			.unwrap_or(0);
		zone.heuristic(cell) + self.turn_penalty * turns
	}
	/// Plan a route for an aircraft across the grid of [MovementClass::Air]
	pub fn search(
		&mut self,
		grid: &mut CellStatusGrid,
		world: &dyn WorldView,
		query: &FlyingQuery,
	) -> LocalOutcome {
		let dimensions = *grid.get_dimensions();
		let Some(zone) = GoalZone::new(query.destination, query.range, &dimensions) else {
			return LocalOutcome::empty(SearchOutcome::NoPath);
		};
		if !dimensions.contains(&query.start) {
			return LocalOutcome::empty(SearchOutcome::NoPath);
		}
		if zone.contains(&query.start) {
			return LocalOutcome::empty(SearchOutcome::GoalReached);
		}
		let Some(window) = SearchWindow::around(
			query.start,
			&zone,
			self.flight_margin,
			self.max_window_cells,
			&dimensions,
		) else {
			return LocalOutcome::empty(SearchOutcome::OutOfRange);
		};
		let Some(start) = window.get_index(&query.start) else {
			return LocalOutcome::empty(SearchOutcome::OutOfRange);
		};
		let states = window.get_area() * HEADINGS;
		self.g.clear();
		self.g.resize(states, u32::MAX);
		self.parents.clear();
		self.parents.resize(states, u32::MAX);
		self.closed.clear();
		self.closed.resize(states, false);
		self.open.clear();
		let initial: Vec<Ordinal> = match query.start_heading {
			Some(heading) => vec![heading],
			None => Ordinal::ALL.to_vec(),
		};
		for heading in initial {
			let state = start * HEADINGS + heading.get_compass_index();
			self.g[state] = 0;
			self.open
				.push(self.heuristic(&zone, &query.start, heading), state);
		}
		let mut clipped = false;
		let mut exhausted = false;
		let mut expanded = 0;
		// (h, g, seq, state) of the closed state nearest the goal
		let mut best: Option<(u32, u32, u64, usize)> = None;
		while let Some((_f, seq, state)) = self.open.pop() {
			if self.closed[state] {
				continue;
			}
			self.closed[state] = true;
			expanded += 1;
			let index = state / HEADINGS;
			let heading = COMPASS_ORDER[state % HEADINGS];
			let cell = window.get_cell(index);
			if zone.contains(&cell) {
				return LocalOutcome {
					outcome: SearchOutcome::GoalReached,
					waypoints: self.trace(state, &window),
					cost: self.g[state],
					partial: false,
					substitute: None,
					expanded,
				};
			}
			let candidate = (zone.heuristic(&cell), self.g[state], seq, state);
			if index != start
				&& best.is_none_or(|b| (candidate.0, candidate.1, candidate.2) < (b.0, b.1, b.2))
			{
				best = Some(candidate);
			}
			if expanded >= self.max_search_nodes {
				exhausted = true;
				break;
			}
			// straight on first, then banking anticlockwise and clockwise
			for (next, turns) in [
				(heading, 0),
				(heading.rotate(false), 1),
				(heading.rotate(true), 1),
			] {
				let Some(neighbour) = dimensions.get_neighbour(&cell, next) else {
					continue;
				};
				let Some(n) = window.get_index(&neighbour) else {
					clipped = true;
					continue;
				};
				let next_state = n * HEADINGS + next.get_compass_index();
				if self.closed[next_state] {
					continue;
				}
				let Some(cost) = Self::airspace_cost(grid, world, &neighbour) else {
					continue;
				};
				let step = next.get_step_cost() * cost + self.turn_penalty * turns;
				let tentative = self.g[state].saturating_add(step);
				if tentative < self.g[next_state] {
					self.g[next_state] = tentative;
					self.parents[next_state] = state as u32;
					let f = tentative.saturating_add(self.heuristic(&zone, &neighbour, next));
					self.open.push(f, next_state);
				}
			}
		}
		let outcome = if clipped || exhausted {
			SearchOutcome::OutOfRange
		} else {
			SearchOutcome::NoPath
		};
		trace!(
			"Flying search {:?} -> {:?} ended {:?} after {} expansions",
			query.start,
			query.destination,
			outcome,
			expanded
		);
		let mut result = LocalOutcome {
			expanded,
			..LocalOutcome::empty(outcome)
		};
		if query.partial {
			if let Some((_, g, _, state)) = best {
				result.waypoints = self.trace(state, &window);
				result.cost = g;
				result.partial = true;
			}
		}
		result
	}
	/// Cells visited on the way to `state`, the start excluded
	fn trace(&self, state: usize, window: &SearchWindow) -> Vec<CellPos> {
		trace_route(&self.parents, state, |s| window.get_cell(s / HEADINGS))
	}
}

/// Headings by compass index
const COMPASS_ORDER: [Ordinal; HEADINGS] = [
	Ordinal::North,
	Ordinal::NorthEast,
	Ordinal::East,
	Ordinal::SouthEast,
	Ordinal::South,
	Ordinal::SouthWest,
	Ordinal::West,
	Ordinal::NorthWest,
];
