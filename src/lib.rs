pub mod app;
pub mod config;
pub mod engine;
pub mod extractor;
pub mod generation;
pub mod network;
pub mod ops;
pub mod pipeline;
pub mod report;
pub mod rules;
