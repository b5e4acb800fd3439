//! Entry point called by the translator host for every collected word.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregator::Aggregator;
use crate::config::CollectOptions;
use crate::error::NotepadResult;

#[derive(Debug, Default, Deserialize)]
pub struct PluginOptions {
    #[serde(default)]
    pub config: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionResponse {
    pub message: String,
}

pub struct Collector {
    aggregator: Aggregator,
}

impl Collector {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Host-facing call. `_target` is the translation target language and is
    /// not used.
    pub async fn collection(
        &self,
        source: &str,
        _target: &str,
        options: &PluginOptions,
    ) -> NotepadResult<CollectionResponse> {
        let opts = CollectOptions::from_host_config(&options.config)?;
        self.collect(source, &opts).await
    }

    pub async fn collect(&self, word: &str, opts: &CollectOptions) -> NotepadResult<CollectionResponse> {
        let outcome = self
            .aggregator
            .add_word(&opts.auth_token, &opts.notepad_title, word)
            .await?;
        let secs = self.aggregator.settings().quiet_period.as_secs_f64();
        Ok(CollectionResponse {
            message: format!(
                "\"{}\" added to {} ({} in total), {} pending, syncing after {}s of quiet",
                word.trim(),
                opts.notepad_title,
                outcome.total_words,
                outcome.pending,
                secs
            ),
        })
    }
}
