//! End-to-end scenarios across bounds building, caching and selection

mod cache_scenarios;
mod fixtures;
