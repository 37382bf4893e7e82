pub mod collection;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod reconciler;
pub mod schema;
pub mod store;
pub mod translation;
