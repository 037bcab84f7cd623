//! Defines the Bevy [Plugin] for the block pathfinder. Everything runs in
//! [FixedUpdate] so the simulation advances in lockstep with the network
//! tick, invalidation first, then the amortised recomputation and finally
//! the searches
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod occupancy_layer;
pub mod path_layer;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	Invalidate,
	Advance,
	Search,
}

pub struct PathfinderPlugin;

impl Plugin for PathfinderPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<Ordinal>()
			.register_type::<MapDimensions>()
			.register_type::<BlockID>()
			.register_type::<CellPos>()
			.register_type::<CellRect>()
			.register_type::<MovementClass>()
			.register_type::<Occupancy>()
			.register_type::<MoverStatus>()
			.register_type::<MoverId>()
			.register_type::<PathResult>()
			.register_type::<PathRequest>()
			.register_type::<PathfinderConfig>()
			.register_type::<PathfinderLayout>()
			.add_event::<occupancy_layer::EventCellsOccupiedStatusChanged>()
			.add_event::<occupancy_layer::EventTerrainChanged>()
			.add_event::<occupancy_layer::EventUnitMovingStatusChanged>()
			.add_event::<path_layer::EventPathResolved>()
			.configure_sets(
				FixedUpdate,
				(
					OrderingSet::Invalidate,
					OrderingSet::Advance,
					OrderingSet::Search,
				)
					.chain(),
			)
			.add_systems(
				FixedUpdate,
				(
					(
						occupancy_layer::process_terrain_changes,
						occupancy_layer::process_status_changes,
						occupancy_layer::process_occupancy_changes,
					)
						.chain()
						.in_set(OrderingSet::Invalidate),
					path_layer::advance_pathfinders.in_set(OrderingSet::Advance),
					path_layer::service_path_requests.in_set(OrderingSet::Search),
				),
			);
	}
}
