//! Input and output plumbing: source datasets, daily file names and the
//! HDF5 forcing container.

pub mod paths;
pub mod source;
pub mod writer;

pub use paths::{ForcingSource, SalishSeaCastFile};
pub use source::{NetcdfSource, SourceDataset, SourceField};
pub use writer::{
    count_records, ContainerWriter, FieldMetadata, RecordOutcome, WriteSummary,
    DEFAULT_COMPRESSION_LEVEL,
};
