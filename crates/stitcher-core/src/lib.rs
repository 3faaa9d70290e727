pub mod combine;
pub mod compare;
pub mod config;
pub mod enrich;
pub mod errors;
pub mod merge;
pub mod order;
pub mod pipeline;
pub mod reorder;
pub mod table;

pub use combine::{combine_folder, discover_csv_files, CombineOptions, CombineReport};
pub use compare::{compare_keys, KeyComparison, KeyCounts};
pub use config::PipelineConfig;
pub use enrich::{add_durations, EnrichReport, JoinColumns};
pub use errors::{Stage, StitchError};
pub use merge::{merge_in_name_order, MergeReport};
pub use order::{order_by_column, order_pair, OrderPairReport, OrderedFile};
pub use pipeline::{run, PersonLayout, PipelineReport};
pub use reorder::{reorder_to_match, ReorderReport};
pub use table::{OutputSummary, Table};
