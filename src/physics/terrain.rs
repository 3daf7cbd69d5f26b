/// Terrain elevation seam. Real providers (tile caches, elevation
/// services) live outside the core and plug in through this trait.
pub trait TerrainProvider: Send {
    /// Terrain elevation at a world-frame x/z position, m MSL.
    fn elevation_at(&self, x: f64, z: f64) -> f64;
}

/// Uniform elevation everywhere. The default provider for tests and for
/// flying before a real elevation source connects.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain {
    pub elevation: f64,
}

impl FlatTerrain {
    pub fn new(elevation: f64) -> Self {
        Self { elevation }
    }
}

impl TerrainProvider for FlatTerrain {
    fn elevation_at(&self, _x: f64, _z: f64) -> f64 {
        self.elevation
    }
}
