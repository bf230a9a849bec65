pub mod munge;
pub mod regrid;
pub mod weights;

pub use munge::{munge, SliceType};
pub use regrid::{regrid, regrid_dense, regrid_sparse, RegridMethod};
pub use weights::{
    Corner, SourceIndex, WeightingMatrix, MISSING_INDEX_SENTINEL, TARGET_GRID_SHAPE,
};
