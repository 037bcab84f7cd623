//! The [Pathfinder] owns every cached grid and the reusable search state.
//! Movers and the world talk to it through four operations:
//!
//! - [Pathfinder::find_path] plans or refreshes the route of a
//!   [PathRequest]
//! - [Pathfinder::advance] spends a bounded budget recomputing dirty cells
//!   and blocks, once per simulation tick
//! - [Pathfinder::cells_occupied_status_changed] invalidates a rectangle of
//!   cells whose occupancy changed
//! - [Pathfinder::unit_moving_status_changes] invalidates the cells of a
//!   mover that switched between standing, moving, waiting and engaging
//!
//! Ground routes are planned in two tiers. A corridor of blocks is found
//! first when the destination lies beyond a single search window, then a
//! cell accurate search runs towards the destination or, for long routes,
//! towards the furthest corridor center it can reach. Each cell search runs
//! strict first, treating standing units as walls, and only routes through
//! them when nothing else works
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Hierarchical pathfinder for every movement class of a map
#[derive(Component, Clone, Debug)]
pub struct Pathfinder {
	/// Budgets and penalties
	config: PathfinderConfig,
	/// Map and block geometry
	dimensions: MapDimensions,
	/// Cell caches per movement class
	cells: CellStatusGrids,
	/// Block summaries for the ground classes
	blocks: BlockGrids,
	/// Cell level search state
	low_level: LowLevelSearch,
	/// Block level search state
	high_level: HighLevelSearch,
	/// Aircraft search state
	flying: FlyingSearch,
}

impl Pathfinder {
	/// Create a new instance of [Pathfinder] with every grid computed from
	/// the current state of `world`
	pub fn new(config: PathfinderConfig, world: &dyn WorldView) -> Result<Self, PathfinderError> {
		config.validate()?;
		let (width, height) = world.get_dimensions();
		if width == 0 || height == 0 {
			return Err(PathfinderError::MalformedTerrain(format!(
				"world of {}x{} cells has nothing to route across",
				width, height
			)));
		}
		let dimensions = MapDimensions::new(width, height, config.block_size);
		let mut cells = CellStatusGrids::new(dimensions, world);
		let mut low_level = LowLevelSearch::new(&config);
		let blocks = BlockGrids::new(dimensions, &mut cells, world, &mut low_level);
		debug!(
			"Pathfinder initialised for a {}x{} map with {} blocks per class",
			width,
			height,
			dimensions.get_block_count()
		);
		Ok(Pathfinder {
			high_level: HighLevelSearch::new(),
			flying: FlyingSearch::new(&config),
			config,
			dimensions,
			cells,
			blocks,
			low_level,
		})
	}
	/// Get the configuration
	pub fn get_config(&self) -> &PathfinderConfig {
		&self.config
	}
	/// Get the map dimensions
	pub fn get_dimensions(&self) -> &MapDimensions {
		&self.dimensions
	}
	/// Get the cell caches
	pub fn get_cell_grids(&self) -> &CellStatusGrids {
		&self.cells
	}
	/// Get the block grids
	pub fn get_block_grids(&self) -> &BlockGrids {
		&self.blocks
	}
	/// Plan a route for `request` and write the outcome back into it. A
	/// failing request never disturbs the cached state used by others
	pub fn find_path(&mut self, world: &dyn WorldView, request: &mut PathRequest) -> PathResult {
		let mover = request.get_mover();
		if !world.is_mover_alive(mover) {
			warn!("Path requested for mover {:?} which no longer exists", mover);
			request.fail(PathResult::MoverGone);
			return PathResult::MoverGone;
		}
		let start = request.get_start();
		let destination = request.get_destination();
		if !self.dimensions.contains(&start) || !self.dimensions.contains(&destination) {
			error!(
				"Path request {:?} -> {:?} lies outside the {:?} map",
				start,
				destination,
				self.dimensions.get_size()
			);
			request.fail(PathResult::InvalidCoordinate);
			return PathResult::InvalidCoordinate;
		}
		request.restart_replans_if_moved();
		if request.get_replan_count() >= self.config.max_replans {
			warn!(
				"Mover {:?} replanned {} times without arriving, giving up",
				mover,
				request.get_replan_count()
			);
			request.fail(PathResult::GaveUp);
			return PathResult::GaveUp;
		}
		request.increment_replans();
		let result = if request.get_class().is_flying() {
			self.find_flying_path(world, request)
		} else {
			self.find_ground_path(world, request)
		};
		trace!(
			"Mover {:?} {:?} -> {:?} resolved as {:?}",
			mover,
			start,
			destination,
			result
		);
		result
	}
	/// Aircraft pipeline
	fn find_flying_path(&mut self, world: &dyn WorldView, request: &mut PathRequest) -> PathResult {
		let query = FlyingQuery {
			start: request.get_start(),
			destination: request.get_destination(),
			range: request.get_range(),
			start_heading: request.get_start_heading(),
			partial: request.get_need_path(),
		};
		let outcome = self
			.flying
			.search(self.cells.get_mut(MovementClass::Air), world, &query);
		let destination = request.get_destination();
		if !request.get_need_path() {
			let result = if outcome.is_success() {
				PathResult::Feasible
			} else {
				PathResult::from(outcome.outcome)
			};
			request.record(result, std::iter::empty(), [destination]);
			return result;
		}
		Self::write_back(request, outcome, false, vec![destination])
	}
	/// Ground and water pipeline
	fn find_ground_path(&mut self, world: &dyn WorldView, request: &mut PathRequest) -> PathResult {
		let class = request.get_class();
		let start = request.get_start();
		let destination = request.get_destination();
		let Some(zone) = GoalZone::new(destination, request.get_range(), &self.dimensions) else {
			request.fail(PathResult::InvalidCoordinate);
			return PathResult::InvalidCoordinate;
		};
		let (dx, dy) = zone.get_rect().axis_distance(&start);
		let fits_window =
			dx.max(dy).saturating_add(self.config.window_margin) <= self.config.max_window_cells;
		let mut corridor: Vec<BlockID> = Vec::new();
		if !fits_window || !request.get_need_path() {
			match self.refresh_corridor(request, &zone) {
				Some(blocks) => corridor = blocks,
				None => {
					request.fail(PathResult::NoPath);
					return PathResult::NoPath;
				}
			}
		}
		let Some(block_grid) = self.blocks.get(class) else {
			request.fail(PathResult::NoPath);
			return PathResult::NoPath;
		};
		let mut coarse: Vec<CellPos> = corridor
			.iter()
			.skip(1)
			.filter_map(|b| block_grid.get_block(b).and_then(|d| d.get_center()))
			.collect();
		coarse.push(destination);
		if !request.get_need_path() {
			request.record(PathResult::Feasible, std::iter::empty(), coarse);
			return PathResult::Feasible;
		}
		// pick the cell level goal and the blocks it may wander through
		let (target, range, intermediate, allowed) = if fits_window {
			(destination, request.get_range(), false, None)
		} else {
			let reach = self
				.config
				.max_window_cells
				.saturating_sub(self.config.window_margin);
			let mut chosen = corridor.len().saturating_sub(1).min(1);
			for (i, block) in corridor.iter().enumerate().skip(1) {
				let within = block_grid
					.get_block(block)
					.and_then(|d| d.get_center())
					.is_some_and(|c| c.chebyshev_distance(&start) <= reach);
				if within {
					chosen = i;
				} else {
					break;
				}
			}
			let mut allowed: Vec<BlockID> = Vec::new();
			for block in corridor.iter().take(chosen + 1) {
				allowed.push(*block);
				allowed.extend(self.dimensions.get_all_neighbouring_blocks(block));
			}
			allowed.sort();
			allowed.dedup();
			let is_last = chosen + 1 == corridor.len();
			let center = block_grid
				.get_block(&corridor[chosen])
				.and_then(|d| d.get_center());
			match center {
				Some(c) if !is_last => (c, 0, true, Some(allowed)),
				_ => (destination, request.get_range(), false, Some(allowed)),
			}
		};
		let grid = self.cells.get_mut(class);
		let mut query = LocalQuery {
			start,
			destination: target,
			range,
			strict: true,
			partial: false,
			allowed_blocks: allowed.as_deref(),
			bounds: None,
		};
		let mut outcome = self.low_level.search(grid, world, &query);
		if !outcome.is_success() {
			trace!("Strict search for {:?} failed, routing through standing units", request.get_mover());
			query.strict = false;
			query.partial = true;
			outcome = self.low_level.search(grid, world, &query);
		}
		if !outcome.is_success() {
			request.clear_corridor();
		}
		if let Some(substitute) = outcome.substitute {
			if let Some(last) = coarse.last_mut() {
				*last = substitute;
			}
		}
		Self::write_back(request, outcome, intermediate, coarse)
	}
	/// Return the corridor from the block of the start onwards, planning a
	/// new one when the stored corridor is missing, stale or bypassed
	fn refresh_corridor(&mut self, request: &mut PathRequest, zone: &GoalZone) -> Option<Vec<BlockID>> {
		let block_grid = self.blocks.get(request.get_class())?;
		let start = request.get_start();
		let start_block = self.dimensions.get_block_of(&start)?;
		let stored = request.get_corridor();
		let position = stored.iter().position(|b| *b == start_block);
		let fresh = !stored.is_empty() && request.get_corridor_revision() == block_grid.get_revision();
		if let (true, Some(position)) = (fresh, position) {
			return Some(stored[position..].to_vec());
		}
		debug!(
			"Planning corridor for mover {:?} from {:?} to {:?}",
			request.get_mover(),
			start,
			zone.get_destination()
		);
		match self.high_level.search(block_grid, start, zone) {
			Some(corridor) => {
				request.set_corridor(&corridor.blocks, corridor.revision);
				Some(corridor.blocks)
			}
			None => {
				request.clear_corridor();
				None
			}
		}
	}
	/// Translate a cell level outcome into the request
	fn write_back(
		request: &mut PathRequest,
		outcome: LocalOutcome,
		intermediate: bool,
		coarse: Vec<CellPos>,
	) -> PathResult {
		let result = match outcome.outcome {
			SearchOutcome::GoalReached if intermediate => PathResult::Partial,
			SearchOutcome::GoalReached => PathResult::GoalReached,
			SearchOutcome::OutOfRange if outcome.partial && !outcome.waypoints.is_empty() => {
				PathResult::Partial
			}
			other => PathResult::from(other),
		};
		if result.is_success() {
			request.record(result, outcome.waypoints, coarse);
		} else {
			request.fail(result);
		}
		result
	}
	/// Spend the per tick budget recomputing dirty cells and blocks of every
	/// class, Land first then Water then Air. Returns how many cells and
	/// blocks were recomputed
	pub fn advance(&mut self, world: &dyn WorldView) -> (usize, usize) {
		let mut cells_done = 0;
		let mut blocks_done = 0;
		for class in MovementClass::ALL {
			let grid = self.cells.get_mut(class);
			cells_done += grid.resolve_dirty(world, self.config.cells_per_advance);
			if let Some(block_grid) = self.blocks.get_mut(class) {
				blocks_done += block_grid.resolve_dirty(
					grid,
					world,
					&mut self.low_level,
					self.config.blocks_per_advance,
				);
			}
		}
		if cells_done > 0 || blocks_done > 0 {
			trace!(
				"Advance recomputed {} cells and {} blocks",
				cells_done,
				blocks_done
			);
		}
		(cells_done, blocks_done)
	}
	/// The occupancy of the cells in `rect` changed. Marks them dirty for
	/// every movement class along with the blocks containing them. Returns
	/// the number of cells newly marked
	pub fn cells_occupied_status_changed(&mut self, rect: &CellRect) -> usize {
		self.blocks.mark_rect_dirty(rect);
		self.cells.cells_occupied_status_changed(rect)
	}
	/// The terrain of the cells in `rect` was edited
	pub fn terrain_changed(&mut self, rect: &CellRect) -> usize {
		debug!("Terrain changed across {:?}", rect);
		self.cells_occupied_status_changed(rect)
	}
	/// A mover switched between movement states. Its footprint is
	/// invalidated so the cost tier seen by other movers follows
	pub fn unit_moving_status_changes(
		&mut self,
		world: &dyn WorldView,
		mover: MoverId,
		old: MoverStatus,
		new: MoverStatus,
	) {
		if old == new {
			return;
		}
		match world.get_mover_footprint(mover) {
			Some(footprint) => {
				self.cells_occupied_status_changed(&footprint);
			}
			None => warn!(
				"Status change {:?} -> {:?} for mover {:?} which no longer exists",
				old, new, mover
			),
		}
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	fn setup(rows: &[&str]) -> (GridWorld, Pathfinder) {
		let world = GridWorld::new(TerrainMap::from_ascii(rows).unwrap());
		let pathfinder = Pathfinder::new(PathfinderConfig::default(), &world).unwrap();
		(world, pathfinder)
	}
	fn spawn(world: &mut GridWorld, id: u64, cell: CellPos, class: MovementClass) -> MoverId {
		let mover = MoverId::new(id);
		world
			.place_mover(mover, CellRect::from_cell(cell), class, MoverStatus::Moving)
			.unwrap();
		mover
	}
	#[test]
	fn dead_mover_fails_safely() {
		let (world, mut pathfinder) = setup(&["....", "...."]);
		let mut request = PathRequest::new(
			MoverId::new(3),
			MovementClass::Land,
			CellPos::new(0, 0),
			CellPos::new(3, 1),
			0,
		);
		assert_eq!(PathResult::MoverGone, pathfinder.find_path(&world, &mut request));
		assert!(request.get_fine_path().is_empty());
	}
	#[test]
	fn invalid_coordinate() {
		let (mut world, mut pathfinder) = setup(&["....", "...."]);
		let mover = spawn(&mut world, 1, CellPos::new(0, 0), MovementClass::Land);
		let mut request = PathRequest::new(
			mover,
			MovementClass::Land,
			CellPos::new(0, 0),
			CellPos::new(4, 1),
			0,
		);
		assert_eq!(PathResult::InvalidCoordinate, pathfinder.find_path(&world, &mut request));
	}
	#[test]
	fn replan_cap_gives_up() {
		let (mut world, mut pathfinder) = setup(&["....", "...."]);
		let mover = spawn(&mut world, 1, CellPos::new(0, 0), MovementClass::Land);
		let mut request = PathRequest::new(
			mover,
			MovementClass::Land,
			CellPos::new(0, 0),
			CellPos::new(3, 1),
			0,
		);
		for _ in 0..pathfinder.get_config().max_replans {
			assert_eq!(PathResult::GoalReached, pathfinder.find_path(&world, &mut request));
		}
		assert_eq!(PathResult::GaveUp, pathfinder.find_path(&world, &mut request));
		assert!(request.get_fine_path().is_empty());
		assert!(request.is_finished());
	}
	#[test]
	fn feasibility_only() {
		let (mut world, mut pathfinder) = setup(&["........", "........"]);
		let mover = spawn(&mut world, 1, CellPos::new(0, 0), MovementClass::Land);
		let mut request = PathRequest::new(
			mover,
			MovementClass::Land,
			CellPos::new(0, 0),
			CellPos::new(7, 1),
			0,
		);
		request.set_need_path(false);
		assert_eq!(PathResult::Feasible, pathfinder.find_path(&world, &mut request));
		assert!(request.get_fine_path().is_empty());
		assert_eq!(Some(&CellPos::new(7, 1)), request.get_coarse_path().last());
	}
	#[test]
	fn ships_stay_on_water() {
		#[rustfmt::skip]
		let rows = [
			"~~~~~~",
			"~....~",
			"~~~~~~",
		];
		let (mut world, mut pathfinder) = setup(&rows);
		let mover = spawn(&mut world, 1, CellPos::new(0, 1), MovementClass::Water);
		let mut request = PathRequest::new(
			mover,
			MovementClass::Water,
			CellPos::new(0, 1),
			CellPos::new(5, 1),
			0,
		);
		assert_eq!(PathResult::GoalReached, pathfinder.find_path(&world, &mut request));
		let land = CellRect::new(1, 1, 4, 1);
		for cell in request.get_fine_path() {
			assert!(!land.contains(cell));
		}
		assert_eq!(Some(&CellPos::new(5, 1)), request.get_fine_path().back());
	}
	#[test]
	fn impassable_destination_uses_reachable_substitute() {
		#[rustfmt::skip]
		let rows = [
			".......",
			".#####.",
			".#.###.",
			".#####.",
			".#####.",
			".......",
		];
		let (mut world, mut pathfinder) = setup(&rows);
		let mover = spawn(&mut world, 1, CellPos::new(0, 0), MovementClass::Land);
		let mut request = PathRequest::new(
			mover,
			MovementClass::Land,
			CellPos::new(0, 0),
			CellPos::new(3, 3),
			0,
		);
		assert_eq!(PathResult::GoalReached, pathfinder.find_path(&world, &mut request));
		assert_eq!(Some(&CellPos::new(1, 5)), request.get_fine_path().back());
		assert_eq!(Some(&CellPos::new(1, 5)), request.get_coarse_path().last());
	}
	#[test]
	fn aircraft_use_the_flying_search() {
		let (mut world, mut pathfinder) = setup(&["..#..", "..#..", "..#.."]);
		let mover = spawn(&mut world, 1, CellPos::new(0, 1), MovementClass::Air);
		let mut request = PathRequest::new(
			mover,
			MovementClass::Air,
			CellPos::new(0, 1),
			CellPos::new(4, 1),
			0,
		);
		request.set_start_heading(Some(Ordinal::East));
		assert_eq!(PathResult::GoalReached, pathfinder.find_path(&world, &mut request));
		assert_eq!(4, request.get_fine_path().len());
	}
	#[test]
	fn unchanged_status_is_ignored() {
		let (mut world, mut pathfinder) = setup(&["....", "...."]);
		let mover = spawn(&mut world, 1, CellPos::new(1, 1), MovementClass::Land);
		pathfinder.unit_moving_status_changes(&world, mover, MoverStatus::Moving, MoverStatus::Moving);
		assert_eq!(0, pathfinder.get_cell_grids().get(MovementClass::Land).get_dirty_count());
		world.set_mover_status(mover, MoverStatus::Standing);
		pathfinder.unit_moving_status_changes(&world, mover, MoverStatus::Moving, MoverStatus::Standing);
		assert_eq!(1, pathfinder.get_cell_grids().get(MovementClass::Land).get_dirty_count());
		// a dead mover is only logged
		pathfinder.unit_moving_status_changes(
			&world,
			MoverId::new(99),
			MoverStatus::Moving,
			MoverStatus::Standing,
		);
	}
	#[test]
	fn advance_drains_dirty_lists() {
		let (world, mut pathfinder) = setup(&["........"; 8]);
		let rect = CellRect::new(0, 0, 7, 7);
		assert_eq!(3 * 64, pathfinder.cells_occupied_status_changed(&rect));
		let (cells, blocks) = pathfinder.advance(&world);
		assert_eq!(3 * 64, cells);
		assert_eq!(2, blocks);
		assert_eq!((0, 0), pathfinder.advance(&world));
	}
	#[test]
	fn invalid_config_rejected() {
		let world = GridWorld::new(TerrainMap::new(4, 4));
		let config = PathfinderConfig {
			cells_per_advance: 0,
			..Default::default()
		};
		assert!(Pathfinder::new(config, &world).is_err());
	}
}
