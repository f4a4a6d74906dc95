pub mod client;
pub mod decompress;
pub mod pipeline;
pub mod urls;

pub use client::{GkgSource, HttpSource};
pub use pipeline::{FetchJob, FetchOutcome, Fetcher};
