//! Build MOHID HDF5 forcing files for MIDOSS oil spill runs from
//! SalishSeaCast, HRDPS and WaveWatch3 model results.

pub mod config;
pub mod data_io;
pub mod error;
pub mod forcing;
pub mod grid;
pub mod run;
pub mod stats;
pub mod time_utils;

pub use error::{ForcingError, Result};
pub use run::{create_forcing, RunSummary};
pub use time_utils::*;
