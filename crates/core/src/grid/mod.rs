//! Forest grid and neighbourhood resolution

pub mod forest_grid;
pub mod neighborhood;

// Re-export main types
pub use forest_grid::ForestGrid;
pub use neighborhood::Neighborhood;
