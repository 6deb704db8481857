pub mod aggregate;
pub mod chunking;
pub mod config;
pub mod entry;
pub mod error;
pub mod gather;
pub mod output_formats;
pub mod stubs;
pub mod transform;
pub mod tree;

pub use aggregate::{AggregateReport, AssembledOutput, Aggregator};
pub use config::{CompactionLevel, Config, ResolvedConfig};
pub use entry::{EntrySpec, LineRange, parse_entry};
pub use error::{AppError, Result};
pub use gather::{FileEntry, SelectedFile, SelectionOrigin, gather_files};
pub use output_formats::{ChunkFile, ChunkInfo, ContentBlock};
pub use tree::{DirTree, render_tree};
