// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod error;
pub mod input;
pub mod pipeline;

pub use error::{CliError, ErrorEnvelope, ErrorPayload};
pub use input::{CsvOptions, load_csv_dataset, read_csv_dataset};
pub use pipeline::{
    DatasetSummary, EstimatorSpec, PipelineReport, PipelineSpec, TreeReport, run_ncd,
    run_pipeline, run_pipeline_json,
};

/// CLI namespace.
pub fn crate_name() -> &'static str {
    let _ = (
        mcda_core::crate_name(),
        mcda_ncd::crate_name(),
        mcda_cluster::crate_name(),
        mcda_select::crate_name(),
        mcda_pareto::crate_name(),
    );
    "mcda-cli"
}
