//! ledger-gl — the Sales-to-GL pipeline: aggregation, region-aware
//! loyalty policy, rendering, hourly rollups, and the CSV/JSON tabular
//! import path that feeds the same renderer as the POS-driven path.

pub mod aggregator;
pub mod hourly;
pub mod import;
pub mod loyalty;
pub mod renderer;

pub use aggregator::aggregate;
pub use hourly::{aggregate_hourly, default_range_end, HourBucket, HourlyProfile};
pub use renderer::{file_names, render_csv, render_rows, render_tsv};
