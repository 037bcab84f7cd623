//! Drive the plugin systems through the fixed timestep schedule
//!

use bevy::prelude::*;
use bevy_pathfinder_blocks_plugin::prelude::*;

fn setup() -> (App, Entity) {
	let mut app = App::new();
	app.add_plugins(PathfinderPlugin);
	let bundle = PathfinderBundle::new(TerrainMap::new(24, 24), PathfinderConfig::default()).unwrap();
	let map = app.world_mut().spawn(bundle).id();
	(app, map)
}

fn spawn_mover(app: &mut App, map: Entity, id: u64, start: CellPos, destination: CellPos) -> Entity {
	let mover = MoverId::new(id);
	let rect = app
		.world_mut()
		.get_mut::<GridWorld>(map)
		.unwrap()
		.place_mover(mover, CellRect::from_cell(start), MovementClass::Land, MoverStatus::Moving)
		.unwrap();
	app.world_mut()
		.send_event(EventCellsOccupiedStatusChanged::new(rect));
	app.world_mut()
		.spawn(PathRequest::new(mover, MovementClass::Land, start, destination, 0))
		.id()
}

#[test]
fn requests_serviced_in_mover_order() {
	let (mut app, map) = setup();
	let second = spawn_mover(&mut app, map, 2, CellPos::new(20, 20), CellPos::new(3, 3));
	let first = spawn_mover(&mut app, map, 1, CellPos::new(0, 0), CellPos::new(23, 10));
	app.world_mut().run_schedule(FixedUpdate);
	let events = app.world().resource::<Events<EventPathResolved>>();
	let order: Vec<MoverId> = events
		.iter_current_update_events()
		.map(|e| e.get_mover())
		.collect();
	assert_eq!(vec![MoverId::new(1), MoverId::new(2)], order);
	for entity in [first, second] {
		let request = app.world().get::<PathRequest>(entity).unwrap();
		assert_eq!(PathResult::GoalReached, request.get_result());
		assert!(!request.get_fine_path().is_empty());
	}
	// nothing to replan on the next tick
	app.world_mut().run_schedule(FixedUpdate);
	let events = app.world().resource::<Events<EventPathResolved>>();
	assert_eq!(2, events.len());
}

#[test]
fn terrain_event_edits_world_and_caches() {
	let (mut app, map) = setup();
	let cell = CellPos::new(5, 5);
	app.world_mut()
		.send_event(EventTerrainChanged::new(cell, TerrainCell::cliff()));
	app.world_mut().run_schedule(FixedUpdate);
	let world = app.world().get::<GridWorld>(map).unwrap();
	assert_eq!(Some(TerrainCell::cliff()), world.get_terrain(&cell));
	let pathfinder = app.world().get::<Pathfinder>(map).unwrap();
	let status = pathfinder
		.get_cell_grids()
		.get(MovementClass::Land)
		.get_status(&cell)
		.unwrap();
	assert!(!status.is_passable());
	assert!(!status.is_dirty());
}

#[test]
fn status_event_marks_mover_standing() {
	let (mut app, map) = setup();
	let cell = CellPos::new(8, 8);
	spawn_mover(&mut app, map, 3, cell, cell);
	app.world_mut().run_schedule(FixedUpdate);
	app.world_mut()
		.send_event(EventUnitMovingStatusChanged::new(MoverId::new(3), MoverStatus::Standing));
	app.world_mut().run_schedule(FixedUpdate);
	let world = app.world().get::<GridWorld>(map).unwrap();
	assert_eq!(Some(MoverStatus::Standing), world.get_mover_status(MoverId::new(3)));
	let pathfinder = app.world().get::<Pathfinder>(map).unwrap();
	let status = pathfinder
		.get_cell_grids()
		.get(MovementClass::Land)
		.get_status(&cell)
		.unwrap();
	assert!(status.is_standing());
}
