pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod mock;
pub mod model;
pub mod plugin;

use std::sync::Arc;

use crate::aggregator::{Aggregator, AggregatorSettings};
use crate::api::MaimemoClient;
use crate::config::Config;
use crate::error::NotepadResult;
use crate::plugin::Collector;

impl From<&Config> for AggregatorSettings {
    fn from(cfg: &Config) -> Self {
        AggregatorSettings {
            quiet_period: cfg.collector.quiet_period(),
            delimiter: cfg.collector.delimiter.clone(),
            page_limit: cfg.api.page_limit,
        }
    }
}

/// Builds a collector talking to the configured Maimemo endpoint.
pub fn build_collector(cfg: &Config) -> NotepadResult<Collector> {
    let client = Arc::new(MaimemoClient::new(&cfg.api)?);
    Ok(Collector::new(Aggregator::new(client, cfg.into())))
}
