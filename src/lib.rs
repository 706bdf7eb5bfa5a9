//! Summit News - live news feed for a multi-day conference
//!
//! Pulls articles from many RSS feeds, keeps the ones relevant to the event,
//! tags each with a topic and conference day, and merges them with curated
//! stories into a single ranked feed served over HTTP.

pub mod aggregator;
pub mod cache;
pub mod calendar;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod merge;
pub mod model;
pub mod routes;
pub mod sources;
