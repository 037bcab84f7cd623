//! Deterministic pathfinding for a lockstep real-time strategy simulation.
//!
//! [Near Optimal Hierarchical Path-Finding](https://webdocs.cs.ualberta.ca/~mmueller/ps/hpastar.pdf)
//!
//! [Amit's A* Pages](https://theory.stanford.edu/~amitp/GameProgramming/)
//!
//! Every client of a networked game runs the same simulation, so given the
//! same world and the same requests in the same order each client must
//! produce byte-identical paths. Costs are integers, searches break ties by
//! insertion order and nothing iterates a hash-ordered collection.
//!
//! Definitions:
//!
//! * Cell - the unit of the map grid, addressed by an integer `(x, y)`
//! * Movement class - land, water or air. Each class sees the terrain
//! differently and keeps its own cached grids
//! * Cell status - cached passability, cost and occupancy of a cell for one
//! class, recomputed lazily when marked dirty
//! * Block - a fixed-size square of cells. Each block keeps a center cell,
//! an aggregate cost and connections to its four orthogonal neighbours
//! * Corridor - ordered blocks a long route passes through, planned over the
//! block graph before a cell accurate search runs along it
//! * Goal zone - the cells within Chebyshev range `R` of a destination, any
//! of which ends a search
//!
//! ```text
//!  _________________ _________________
//! |                 |                 |
//! |   S . .         |                 |
//! |        . .  C   |        C        |
//! |___________ . ___|_________________|
//! |             .   |                 |
//! |              .C |        C        |
//! |               . | . . . D         |
//! |________________.|.________________|
//! ```
//!
//! Movers ask the [pathfinder::Pathfinder] for a route with a
//! [request::PathRequest]. The pathfinder answers with a fine path of cells
//! to walk and a coarse path of block centers leading to the destination
//!

pub mod blocks;
pub mod cells;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pathfinder;
pub mod persistence;
pub mod request;
pub mod search;
pub mod terrain;
pub mod utilities;
pub mod world;
