//! A [PathRequest] is the handle a mover keeps for its current move order.
//! It holds the inputs of the order, the routes produced by the pathfinder
//! and the bookkeeping used to detect a mover stuck behind an obstacle.
//!
//! A request is created once per mover and reused: issuing a new order
//! through [PathRequest::set_order] wipes the previous results but keeps the
//! allocations
//!

use std::collections::VecDeque;

use crate::prelude::*;
use bevy::prelude::*;

/// Outcome of the latest [crate::prelude::Pathfinder::find_path] call
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum PathResult {
	/// No search has run for the current order
	#[default]
	Pending,
	/// A route into the goal zone was found
	GoalReached,
	/// A route towards the goal was found but it stops short, the mover
	/// should follow it and ask again
	Partial,
	/// Only feasibility was requested and the goal is reachable across the
	/// block graph
	Feasible,
	/// The goal cannot be reached
	NoPath,
	/// The search was bounded before it could decide
	OutOfRange,
	/// The start or destination lies outside the map
	InvalidCoordinate,
	/// The mover no longer exists
	MoverGone,
	/// The mover has replanned too many times and must stop
	GaveUp,
}

impl PathResult {
	/// Whether the mover has a route to follow or a positive answer
	pub fn is_success(&self) -> bool {
		matches!(
			self,
			PathResult::GoalReached | PathResult::Partial | PathResult::Feasible
		)
	}
	/// Whether the mover should stop trying
	pub fn is_terminal_failure(&self) -> bool {
		matches!(
			self,
			PathResult::InvalidCoordinate | PathResult::MoverGone | PathResult::GaveUp
		)
	}
}

impl From<SearchOutcome> for PathResult {
	fn from(outcome: SearchOutcome) -> Self {
		match outcome {
			SearchOutcome::GoalReached => PathResult::GoalReached,
			SearchOutcome::NoPath => PathResult::NoPath,
			SearchOutcome::OutOfRange => PathResult::OutOfRange,
		}
	}
}

/// Per mover state of a move order
#[derive(Component, Clone, Debug, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct PathRequest {
	/// Mover served, it may die while the request is outstanding
	mover: MoverId,
	/// Cell the next search starts from
	start: CellPos,
	/// Cell the mover was ordered to
	destination: CellPos,
	/// Acceptance range around the destination
	range: u32,
	/// Movement class of the mover
	class: MovementClass,
	/// Heading of an aircraft when the search starts
	start_heading: Option<Ordinal>,
	/// Outcome of the latest search
	result: PathResult,
	/// Cells to walk through, the next one first
	fine_path: VecDeque<CellPos>,
	/// Block centers the route passes through followed by the destination
	coarse_path: Vec<CellPos>,
	/// Blocks of the planned corridor
	corridor: Vec<BlockID>,
	/// Revision of the block grid the corridor was planned on
	corridor_revision: u64,
	/// Compute a route, when `false` only feasibility is checked
	need_path: bool,
	/// Engage enemies met on the way
	move_attacking: bool,
	/// Decelerate when approaching the destination
	slow_down_at_destination: bool,
	/// Consecutive ticks the mover failed to advance
	blocked_ticks: u32,
	/// Searches run for the current order since the mover last moved
	replan_count: u32,
	/// Start cell of the searches counted by `replan_count`
	replan_origin: Option<CellPos>,
}

impl PathRequest {
	/// Create a new instance of [PathRequest] for a mover standing at
	/// `start` ordered to `destination`
	pub fn new(
		mover: MoverId,
		class: MovementClass,
		start: CellPos,
		destination: CellPos,
		range: u32,
	) -> Self {
		PathRequest {
			mover,
			start,
			destination,
			range,
			class,
			start_heading: None,
			result: PathResult::Pending,
			fine_path: VecDeque::new(),
			coarse_path: Vec::new(),
			corridor: Vec::new(),
			corridor_revision: 0,
			need_path: true,
			move_attacking: false,
			slow_down_at_destination: false,
			blocked_ticks: 0,
			replan_count: 0,
			replan_origin: None,
		}
	}
	/// Blank the request so it can carry a new order, allocations are kept
	pub fn reset(&mut self) {
		self.start_heading = None;
		self.result = PathResult::Pending;
		self.fine_path.clear();
		self.coarse_path.clear();
		self.corridor.clear();
		self.corridor_revision = 0;
		self.need_path = true;
		self.move_attacking = false;
		self.slow_down_at_destination = false;
		self.blocked_ticks = 0;
		self.replan_count = 0;
		self.replan_origin = None;
	}
	/// Replace the current order with a new one
	pub fn set_order(&mut self, start: CellPos, destination: CellPos, range: u32) {
		self.reset();
		self.start = start;
		self.destination = destination;
		self.range = range;
	}
	/// Move the start of the next search, e.g. after the mover advanced
	pub fn set_start(&mut self, start: CellPos) {
		self.start = start;
	}
	/// Get the mover
	pub fn get_mover(&self) -> MoverId {
		self.mover
	}
	/// Get the start
	pub fn get_start(&self) -> CellPos {
		self.start
	}
	/// Get the destination
	pub fn get_destination(&self) -> CellPos {
		self.destination
	}
	/// Get the acceptance range
	pub fn get_range(&self) -> u32 {
		self.range
	}
	/// Get the movement class
	pub fn get_class(&self) -> MovementClass {
		self.class
	}
	/// Get the heading an aircraft starts with
	pub fn get_start_heading(&self) -> Option<Ordinal> {
		self.start_heading
	}
	/// Set the heading an aircraft starts with
	pub fn set_start_heading(&mut self, heading: Option<Ordinal>) {
		self.start_heading = heading;
	}
	/// Get the latest result
	pub fn get_result(&self) -> PathResult {
		self.result
	}
	/// Get the fine path
	pub fn get_fine_path(&self) -> &VecDeque<CellPos> {
		&self.fine_path
	}
	/// Get the coarse path
	pub fn get_coarse_path(&self) -> &Vec<CellPos> {
		&self.coarse_path
	}
	/// Get the corridor
	pub fn get_corridor(&self) -> &Vec<BlockID> {
		&self.corridor
	}
	/// Get the revision of the block grid the corridor was planned on
	pub fn get_corridor_revision(&self) -> u64 {
		self.corridor_revision
	}
	/// Whether a route is wanted or only a feasibility check
	pub fn get_need_path(&self) -> bool {
		self.need_path
	}
	/// Request a route (`true`) or only a feasibility check (`false`)
	pub fn set_need_path(&mut self, need_path: bool) {
		self.need_path = need_path;
	}
	/// Whether the mover engages enemies on the way
	pub fn get_move_attacking(&self) -> bool {
		self.move_attacking
	}
	/// Set whether the mover engages enemies on the way
	pub fn set_move_attacking(&mut self, move_attacking: bool) {
		self.move_attacking = move_attacking;
	}
	/// Whether the mover decelerates near the destination
	pub fn get_slow_down_at_destination(&self) -> bool {
		self.slow_down_at_destination
	}
	/// Set whether the mover decelerates near the destination
	pub fn set_slow_down_at_destination(&mut self, slow_down: bool) {
		self.slow_down_at_destination = slow_down;
	}
	/// Get the consecutive blocked ticks
	pub fn get_blocked_ticks(&self) -> u32 {
		self.blocked_ticks
	}
	/// Get the number of searches run from the current start since the
	/// mover last changed cell
	pub fn get_replan_count(&self) -> u32 {
		self.replan_count
	}
	/// The next cell to walk to without consuming it
	pub fn peek_next_waypoint(&self) -> Option<CellPos> {
		self.fine_path.front().copied()
	}
	/// Consume the next cell to walk to
	pub fn pop_next_waypoint(&mut self) -> Option<CellPos> {
		self.fine_path.pop_front()
	}
	/// Record a tick in which the mover could not advance. Returns `true`
	/// once `threshold` consecutive ticks have been blocked, at which point
	/// the mover should ask for a new route
	pub fn register_blocked_tick(&mut self, threshold: u32) -> bool {
		self.blocked_ticks = self.blocked_ticks.saturating_add(1);
		self.blocked_ticks >= threshold
	}
	/// Record a tick in which the mover advanced
	pub fn register_progress(&mut self) {
		self.blocked_ticks = 0;
	}
	/// Whether the mover should ask for a new route: nothing was searched
	/// yet, the route ran out before the goal zone or the mover is blocked
	pub fn needs_replan(&self, blocked_ticks_before_replan: u32) -> bool {
		match self.result {
			PathResult::Pending => true,
			PathResult::Partial | PathResult::OutOfRange => self.fine_path.is_empty(),
			PathResult::GoalReached => {
				!self.fine_path.is_empty() && self.blocked_ticks >= blocked_ticks_before_replan
			}
			_ => false,
		}
	}
	/// Whether the order is over, either the goal was reached and walked or
	/// the mover must give up
	pub fn is_finished(&self) -> bool {
		match self.result {
			PathResult::GoalReached => self.fine_path.is_empty(),
			PathResult::Feasible | PathResult::NoPath => true,
			result => result.is_terminal_failure(),
		}
	}
	/// Write back the product of a search
	pub(crate) fn record(
		&mut self,
		result: PathResult,
		fine_path: impl IntoIterator<Item = CellPos>,
		coarse_path: impl IntoIterator<Item = CellPos>,
	) {
		self.result = result;
		self.fine_path.clear();
		self.fine_path.extend(fine_path);
		self.coarse_path.clear();
		self.coarse_path.extend(coarse_path);
		self.blocked_ticks = 0;
	}
	/// Record a failure that leaves the mover with nothing to follow
	pub(crate) fn fail(&mut self, result: PathResult) {
		self.record(result, std::iter::empty(), std::iter::empty());
	}
	/// Store a freshly planned corridor
	pub(crate) fn set_corridor(&mut self, blocks: &[BlockID], revision: u64) {
		self.corridor.clear();
		self.corridor.extend_from_slice(blocks);
		self.corridor_revision = revision;
	}
	/// Forget the corridor so the next search plans a new one
	pub(crate) fn clear_corridor(&mut self) {
		self.corridor.clear();
		self.corridor_revision = 0;
	}
	/// Restart the replan count when the search begins from a different
	/// cell than the previous one, only searches that failed to move the
	/// mover count towards the cap
	pub(crate) fn restart_replans_if_moved(&mut self) {
		if self.replan_origin != Some(self.start) {
			self.replan_origin = Some(self.start);
			self.replan_count = 0;
		}
	}
	/// Count a search against the replan cap
	pub(crate) fn increment_replans(&mut self) {
		self.replan_count = self.replan_count.saturating_add(1);
	}
}
