//! Logic relating to servicing [PathRequest]s. Requests are processed in
//! [MoverId] order whatever order the ECS stores them in so every client of
//! a lockstep game computes the same paths
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Published whenever a search ran for a [PathRequest]
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventPathResolved {
	/// Entity carrying the request
	entity: Entity,
	/// Mover the request belongs to
	mover: MoverId,
	/// Outcome of the search
	result: PathResult,
}

impl EventPathResolved {
	/// Create a new instance of [EventPathResolved]
	pub fn new(entity: Entity, mover: MoverId, result: PathResult) -> Self {
		EventPathResolved {
			entity,
			mover,
			result,
		}
	}
	pub fn get_entity(&self) -> Entity {
		self.entity
	}
	pub fn get_mover(&self) -> MoverId {
		self.mover
	}
	pub fn get_result(&self) -> PathResult {
		self.result
	}
}

/// Spend the per tick budget recomputing dirty cells and blocks
pub fn advance_pathfinders(mut query: Query<(&mut Pathfinder, &GridWorld)>) {
	for (mut pathfinder, world) in query.iter_mut() {
		pathfinder.advance(world);
	}
}

/// Run a search for every [PathRequest] that needs one, in [MoverId] order
pub fn service_path_requests(
	mut maps: Query<(&mut Pathfinder, &GridWorld)>,
	mut requests: Query<(Entity, &mut PathRequest)>,
	mut event_resolved: EventWriter<EventPathResolved>,
) {
	let Ok((mut pathfinder, world)) = maps.single_mut() else {
		return;
	};
	let threshold = pathfinder.get_config().blocked_ticks_before_replan;
	let mut pending: Vec<(MoverId, Entity)> = requests
		.iter()
		.filter(|(_, request)| request.needs_replan(threshold))
		.map(|(entity, request)| (request.get_mover(), entity))
		.collect();
	pending.sort();
	for (mover, entity) in pending {
		if let Ok((_, mut request)) = requests.get_mut(entity) {
			let result = pathfinder.find_path(world, &mut request);
			event_resolved.write(EventPathResolved::new(entity, mover, result));
		}
	}
}
