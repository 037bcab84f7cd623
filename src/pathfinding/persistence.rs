//! Saving and restoring the shape of a [Pathfinder]. Only the layout is
//! persisted, the map size and block size along with a format version.
//! Cell and block caches are always rebuilt from the world on load so a
//! save can never disagree with the terrain it is loaded against
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Version written into every saved [PathfinderLayout]
pub const LAYOUT_VERSION: u32 = 1;

/// Persisted shape of a [Pathfinder]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub struct PathfinderLayout {
	/// Format version
	version: u32,
	/// Map width in cells
	width: u32,
	/// Map height in cells
	height: u32,
	/// Edge length of a block in cells
	block_size: u32,
}

impl PathfinderLayout {
	/// Create a new instance of [PathfinderLayout] at the current version
	pub fn new(width: u32, height: u32, block_size: u32) -> Self {
		PathfinderLayout {
			version: LAYOUT_VERSION,
			width,
			height,
			block_size,
		}
	}
	pub fn get_version(&self) -> u32 {
		self.version
	}
	pub fn get_width(&self) -> u32 {
		self.width
	}
	pub fn get_height(&self) -> u32 {
		self.height
	}
	pub fn get_block_size(&self) -> u32 {
		self.block_size
	}
	/// Serialise the layout as a `ron` string
	#[cfg(feature = "ron")]
	pub fn to_ron_string(&self) -> Result<String, PathfinderError> {
		Ok(ron::ser::to_string_pretty(
			self,
			ron::ser::PrettyConfig::default(),
		)?)
	}
	/// Parse a layout from a `ron` string
	#[cfg(feature = "ron")]
	pub fn from_ron_str(source: &str) -> Result<Self, PathfinderError> {
		Ok(ron::de::from_str(source)?)
	}
	/// Write the layout to a `ron` file
	#[cfg(feature = "ron")]
	pub fn save_ron(&self, path: &str) -> Result<(), PathfinderError> {
		std::fs::write(path, self.to_ron_string()?)?;
		Ok(())
	}
	/// Read a layout from a `ron` file
	#[cfg(feature = "ron")]
	pub fn load_ron(path: &str) -> Result<Self, PathfinderError> {
		let file = std::fs::File::open(path)?;
		Ok(ron::de::from_reader(file)?)
	}
}

impl Pathfinder {
	/// The layout describing this pathfinder
	pub fn get_layout(&self) -> PathfinderLayout {
		let dimensions = self.get_dimensions();
		PathfinderLayout::new(
			dimensions.get_width(),
			dimensions.get_height(),
			dimensions.get_block_size(),
		)
	}
	/// Rebuild a [Pathfinder] from a saved layout. The block size of the
	/// layout overrides the one in `config`
	pub fn from_layout(
		layout: &PathfinderLayout,
		config: PathfinderConfig,
		world: &dyn WorldView,
	) -> Result<Self, PathfinderError> {
		if layout.get_version() != LAYOUT_VERSION {
			error!("Refusing layout version {}", layout.get_version());
			return Err(PathfinderError::UnsupportedLayoutVersion(
				layout.get_version(),
			));
		}
		let size = (layout.get_width(), layout.get_height());
		if size != world.get_dimensions() {
			return Err(PathfinderError::LayoutMismatch {
				layout: size,
				world: world.get_dimensions(),
			});
		}
		let config = PathfinderConfig {
			block_size: layout.get_block_size(),
			..config
		};
		Pathfinder::new(config, world)
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	fn world() -> GridWorld {
		GridWorld::new(TerrainMap::new(40, 24))
	}
	#[test]
	fn layout_of_pathfinder() {
		let pathfinder = Pathfinder::new(PathfinderConfig::default(), &world()).unwrap();
		let layout = pathfinder.get_layout();
		assert_eq!(PathfinderLayout::new(40, 24, DEFAULT_BLOCK_SIZE), layout);
	}
	#[test]
	fn rebuild_uses_layout_block_size() {
		let layout = PathfinderLayout::new(40, 24, 8);
		let pathfinder =
			Pathfinder::from_layout(&layout, PathfinderConfig::default(), &world()).unwrap();
		assert_eq!(8, pathfinder.get_dimensions().get_block_size());
		assert_eq!(8, pathfinder.get_config().block_size);
	}
	#[test]
	fn mismatched_world_rejected() {
		let layout = PathfinderLayout::new(41, 24, 8);
		let result = Pathfinder::from_layout(&layout, PathfinderConfig::default(), &world());
		assert!(matches!(
			result,
			Err(PathfinderError::LayoutMismatch {
				layout: (41, 24),
				world: (40, 24)
			})
		));
	}
	#[test]
	fn future_version_rejected() {
		let mut layout = PathfinderLayout::new(40, 24, 8);
		layout.version = LAYOUT_VERSION + 1;
		let result = Pathfinder::from_layout(&layout, PathfinderConfig::default(), &world());
		assert!(matches!(
			result,
			Err(PathfinderError::UnsupportedLayoutVersion(2))
		));
	}
	#[test]
	#[cfg(feature = "ron")]
	fn ron_text_restores_layout() {
		let layout = PathfinderLayout::new(40, 24, 8);
		let text = layout.to_ron_string().unwrap();
		assert!(text.contains("block_size: 8"));
		assert_eq!(layout, PathfinderLayout::from_ron_str(&text).unwrap());
	}
}
