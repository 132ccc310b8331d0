//! JSON fragment ingestion for Conceptgraph
//!
//! Turns a folder tree of heterogeneous JSON fragments into one graph:
//! - `loader`: ordered discovery of `<root>/<subject>/*.json` and tolerant reads
//! - `fragment`: shape classification (graph / entity / entity list)
//! - `pipeline`: the full rebuild with an end-of-run summary

pub mod fragment;
pub mod loader;
pub mod pipeline;

pub use fragment::{classify, Adapted, EntityFragment, Fragment, GraphFragment};
pub use loader::{
    display_name_from_slug, iter_subject_files, load_fragment, LoadOutcome, SubjectFile,
    SubjectFiles, DEFAULT_SKIP_FILES,
};
pub use pipeline::{build_graph, fold_payload, BuildOptions, BuildOutput, BuildReport};
