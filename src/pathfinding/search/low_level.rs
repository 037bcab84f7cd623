//! Cell accurate A* confined to a [SearchWindow]. This produces the route a
//! mover actually follows.
//!
//! Each step moves to one of the 8 neighbouring cells. The cost of a step is
//! its geometric length ([ORTHOGONAL_STEP] or [DIAGONAL_STEP]) multiplied by
//! the traversal cost of the cell entered, and a diagonal step is only
//! allowed when both cells it cuts past are passable.
//!
//! The search state lives in buffers owned by [LowLevelSearch] that are
//! reused from one search to the next
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Inputs of a single low-level search
#[derive(Clone, Copy, Debug)]
pub struct LocalQuery<'a> {
	/// Cell the mover is in
	pub start: CellPos,
	/// Cell the mover wants to reach
	pub destination: CellPos,
	/// Any cell within this Chebyshev distance of the destination is good
	/// enough
	pub range: u32,
	/// Treat cells holding a standing unit as obstacles
	pub strict: bool,
	/// On failure return the route to the closest node found
	pub partial: bool,
	/// Only expand cells inside these blocks, must be sorted
	pub allowed_blocks: Option<&'a [BlockID]>,
	/// Search exactly this rectangle instead of a window sized from the
	/// start and destination
	pub bounds: Option<CellRect>,
}

impl<'a> LocalQuery<'a> {
	/// A strict full search with no corridor restriction
	pub fn new(start: CellPos, destination: CellPos, range: u32) -> Self {
		LocalQuery {
			start,
			destination,
			range,
			strict: true,
			partial: false,
			allowed_blocks: None,
			bounds: None,
		}
	}
}

/// Reusable state of the cell level A*
#[derive(Clone, Debug)]
pub struct LowLevelSearch {
	/// Cells the window grows beyond the start and goal zone
	window_margin: u32,
	/// Furthest the window may reach from the start
	max_window_cells: u32,
	/// Expansions allowed per search
	max_search_nodes: usize,
	/// Furthest from an impassable destination a substitute is looked for
	substitute_goal_radius: u32,
	/// Best known cost to reach each window cell
	g: Vec<u32>,
	/// Parent of each window cell, `u32::MAX` for none
	parents: Vec<u32>,
	/// Sequence number of the entry that closed each cell, `u64::MAX` while
	/// open
	closed: Vec<u64>,
	/// Blocks the current search may expand into, indexed by block index
	allowed: Vec<bool>,
	/// Window of the latest search
	window: Option<SearchWindow>,
	/// Pending nodes
	open: OpenList,
}

impl LowLevelSearch {
	/// Create a new instance of [LowLevelSearch]
	pub fn new(config: &PathfinderConfig) -> Self {
		LowLevelSearch {
			window_margin: config.window_margin,
			max_window_cells: config.max_window_cells,
			max_search_nodes: config.max_search_nodes,
			substitute_goal_radius: config.substitute_goal_radius,
			g: Vec::new(),
			parents: Vec::new(),
			closed: Vec::new(),
			allowed: Vec::new(),
			window: None,
			open: OpenList::new(),
		}
	}
	/// Find a route for the movement class of `grid`. Only cells the search
	/// touches are resolved against the world
	pub fn search(
		&mut self,
		grid: &mut CellStatusGrid,
		world: &dyn WorldView,
		query: &LocalQuery,
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
		if self.zone_has_passable_cell(grid, world, &zone) {
			return self.search_zone(grid, world, query, &zone, &dimensions);
		}
		let candidates = self.substitute_candidates(grid, world, &zone);
		let Some(&first) = candidates.first() else {
			return LocalOutcome::empty(SearchOutcome::NoPath);
		};
		let mut substitute = first;
		let mut outcome = self.search_substitute(grid, world, query, first, &dimensions);
		if outcome.outcome == SearchOutcome::NoPath {
			// an unclipped failure closed every cell reachable from the start
			let reachable = candidates
				.iter()
				.skip(1)
				.copied()
				.find(|cell| self.was_closed(cell));
			if let Some(cell) = reachable {
				substitute = cell;
				outcome = self.search_substitute(grid, world, query, cell, &dimensions);
			}
		}
		trace!(
			"Destination {:?} impassable, using substitute {:?}",
			query.destination,
			substitute
		);
		outcome.substitute = Some(substitute);
		outcome
	}
	/// Search towards a single substitute cell
	fn search_substitute(
		&mut self,
		grid: &mut CellStatusGrid,
		world: &dyn WorldView,
		query: &LocalQuery,
		cell: CellPos,
		dimensions: &MapDimensions,
	) -> LocalOutcome {
		match GoalZone::new(cell, 0, dimensions) {
			Some(zone) => self.search_zone(grid, world, query, &zone, dimensions),
			None => LocalOutcome::empty(SearchOutcome::NoPath),
		}
	}
	/// Run the A* towards `zone` inside the window of the query
	fn search_zone(
		&mut self,
		grid: &mut CellStatusGrid,
		world: &dyn WorldView,
		query: &LocalQuery,
		zone: &GoalZone,
		dimensions: &MapDimensions,
	) -> LocalOutcome {
		self.window = None;
		if zone.contains(&query.start) {
			return LocalOutcome::empty(SearchOutcome::GoalReached);
		}
		let window = match query.bounds {
			Some(bounds) => SearchWindow::from_rect(&bounds, dimensions),
			None => SearchWindow::around(
				query.start,
				zone,
				self.window_margin,
				self.max_window_cells,
				dimensions,
			),
		};
		let Some(window) = window.filter(|w| w.get_rect().contains(&query.start)) else {
			return LocalOutcome::empty(SearchOutcome::OutOfRange);
		};
		self.window = Some(window);
		self.prepare(&window, dimensions, query.allowed_blocks);
		self.run(grid, world, query, zone, &window, dimensions)
	}
	/// Whether the last search closed `cell`
	fn was_closed(&self, cell: &CellPos) -> bool {
		self.window
			.and_then(|w| w.get_index(cell))
			.is_some_and(|i| self.closed[i] != u64::MAX)
	}
	/// Whether at least one cell of the zone can be entered at all
	fn zone_has_passable_cell(
		&self,
		grid: &mut CellStatusGrid,
		world: &dyn WorldView,
		zone: &GoalZone,
	) -> bool {
		zone.get_rect()
			.iter()
			.any(|cell| grid.resolve(&cell, world).is_some_and(|s| s.is_passable()))
	}
	/// Passable cells around an impassable zone, nearest first. Cells are
	/// gathered in rings of increasing Chebyshev radius from the destination
	/// and each ring is visited in row-major order
	fn substitute_candidates(
		&self,
		grid: &mut CellStatusGrid,
		world: &dyn WorldView,
		zone: &GoalZone,
	) -> Vec<CellPos> {
		let destination = zone.get_destination();
		let dimensions = *grid.get_dimensions();
		let mut candidates = Vec::new();
		for radius in zone.get_range() + 1..=self.substitute_goal_radius.max(zone.get_range() + 1) {
			let Some(ring) = CellRect::around(destination, radius).clamp_to(&dimensions) else {
				continue;
			};
			for cell in ring.iter() {
				if cell.chebyshev_distance(&destination) != radius {
					continue;
				}
				if grid.resolve(&cell, world).is_some_and(|s| s.is_passable()) {
					candidates.push(cell);
				}
			}
		}
		candidates
	}
	/// Size the buffers to the window and reset them
	fn prepare(
		&mut self,
		window: &SearchWindow,
		dimensions: &MapDimensions,
		allowed_blocks: Option<&[BlockID]>,
	) {
		let area = window.get_area();
		self.g.clear();
		self.g.resize(area, u32::MAX);
		self.parents.clear();
		self.parents.resize(area, u32::MAX);
		self.closed.clear();
		self.closed.resize(area, u64::MAX);
		self.open.clear();
		self.allowed.clear();
		if let Some(blocks) = allowed_blocks {
			self.allowed.resize(dimensions.get_block_count(), false);
			for block in blocks {
				if let Some(i) = dimensions.get_block_index(block) {
					self.allowed[i] = true;
				}
			}
		}
	}
	/// Whether `cell` lies in an allowed block, always true when the search
	/// is not restricted
	fn is_allowed(&self, cell: &CellPos, dimensions: &MapDimensions) -> bool {
		if self.allowed.is_empty() {
			return true;
		}
		dimensions
			.get_block_of(cell)
			.and_then(|b| dimensions.get_block_index(&b))
			.is_some_and(|i| self.allowed[i])
	}
	/// Whether a neighbour may be stepped onto, returns its traversal cost
	fn enterable_cost(
		grid: &mut CellStatusGrid,
		world: &dyn WorldView,
		cell: &CellPos,
		strict: bool,
	) -> Option<u32> {
		let status = grid.resolve(cell, world)?;
		if !status.is_passable() || (strict && status.is_standing()) {
			None
		} else {
			Some(status.get_cost())
		}
	}
	/// The A* loop proper
	fn run(
		&mut self,
		grid: &mut CellStatusGrid,
		world: &dyn WorldView,
		query: &LocalQuery,
		zone: &GoalZone,
		window: &SearchWindow,
		dimensions: &MapDimensions,
	) -> LocalOutcome {
		let Some(start) = window.get_index(&query.start) else {
			return LocalOutcome::empty(SearchOutcome::OutOfRange);
		};
		self.g[start] = 0;
		self.open.push(zone.heuristic(&query.start), start);
		let mut clipped = false;
		let mut exhausted = false;
		let mut expanded = 0;
		// (h, g, seq, index) of the closed node nearest the goal
		let mut best: Option<(u32, u32, u64, usize)> = None;
		while let Some((_f, seq, index)) = self.open.pop() {
			if self.closed[index] != u64::MAX {
				continue;
			}
			self.closed[index] = seq;
			expanded += 1;
			let cell = window.get_cell(index);
			if zone.contains(&cell) {
				let waypoints = trace_route(&self.parents, index, |i| window.get_cell(i));
				return LocalOutcome {
					outcome: SearchOutcome::GoalReached,
					waypoints,
					cost: self.g[index],
					partial: false,
					substitute: None,
					expanded,
				};
			}
			let h = zone.heuristic(&cell);
			let candidate = (h, self.g[index], seq, index);
			if best.is_none_or(|b| (candidate.0, candidate.1, candidate.2) < (b.0, b.1, b.2)) {
				best = Some(candidate);
			}
			if expanded >= self.max_search_nodes {
				exhausted = true;
				break;
			}
			for ordinal in Ordinal::ALL {
				let Some(neighbour) = dimensions.get_neighbour(&cell, ordinal) else {
					continue;
				};
				let Some(n) = window.get_index(&neighbour) else {
					clipped = true;
					continue;
				};
				if !self.is_allowed(&neighbour, dimensions) {
					clipped = true;
					continue;
				}
				if self.closed[n] != u64::MAX {
					continue;
				}
				let Some(cost) = Self::enterable_cost(grid, world, &neighbour, query.strict) else {
					continue;
				};
				if let Some((a, b)) = ordinal.get_orthogonal_components() {
					let corner_a = dimensions.get_neighbour(&cell, a);
					let corner_b = dimensions.get_neighbour(&cell, b);
					let open_corners = [corner_a, corner_b].into_iter().all(|c| {
						c.is_some_and(|c| {
							c == query.start
								|| Self::enterable_cost(grid, world, &c, query.strict).is_some()
						})
					});
					if !open_corners {
						continue;
					}
				}
				let tentative = self.g[index].saturating_add(ordinal.get_step_cost() * cost);
				if tentative < self.g[n] {
					self.g[n] = tentative;
					self.parents[n] = index as u32;
					let f = tentative.saturating_add(zone.heuristic(&neighbour));
					self.open.push(f, n);
				}
			}
		}
		let outcome = if clipped || exhausted {
			SearchOutcome::OutOfRange
		} else {
			SearchOutcome::NoPath
		};
		trace!(
			"Low-level search {:?} -> {:?} ended {:?} after {} expansions",
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
			if let Some((_, g, _, index)) = best.filter(|b| b.3 != start) {
				result.waypoints = trace_route(&self.parents, index, |i| window.get_cell(i));
				result.cost = g;
				result.partial = true;
			}
		}
		result
	}
}
