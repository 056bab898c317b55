pub mod atlas;
pub mod batch;
pub mod cli;
pub mod config;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod inputs;
pub mod normalize;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod submit;
pub mod table;
pub mod types;
pub mod util;
pub mod wait;
