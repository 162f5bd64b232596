//! Final dataset assembly and output files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use pulse_core::defaults;
use pulse_core::{Dataset, DatasetMeta, Error, Mention, Result, WordCloudEntry};
use pulse_search::{word_cloud, SearchConfig};

use crate::cache::{merge_in_order, CacheDiff};

/// Global name the dashboard reads its feed from.
pub const DASHBOARD_GLOBAL: &str = "PULSE_DATA";

/// Run facts recorded in the dataset header.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub malformed: usize,
    pub duplicates: usize,
    /// Primary backend label: "local", "remote" or "none".
    pub llm_backend: String,
}

/// Everything the materializer writes.
#[derive(Debug, Clone)]
pub struct MaterializedOutput {
    pub dataset: Dataset,
    pub alerts: Vec<Mention>,
    pub word_cloud: Vec<WordCloudEntry>,
    /// Mentions classified during this run. Not persisted, so an unchanged
    /// re-run rewrites the same dataset.
    pub new_this_run: usize,
}

/// Merge carried-forward and newly committed mentions into the final
/// dataset and derive the alert and co-occurrence views.
///
/// Committed mentions replace their candidates by key; unenriched
/// candidates (search-only mode) are kept as they are.
pub fn materialize(
    diff: CacheDiff,
    committed: Vec<Mention>,
    summary: &RunSummary,
    generated_at: DateTime<Utc>,
    search: &SearchConfig,
) -> MaterializedOutput {
    let new_this_run = committed.len();
    let parts = diff
        .already_done
        .into_iter()
        .chain(diff.to_enrich)
        .chain(committed);
    let records = merge_in_order(&diff.order, parts);

    let mut meta = DatasetMeta::for_records(generated_at, &records);
    meta.malformed_dropped = Some(summary.malformed);
    meta.duplicates_dropped = Some(summary.duplicates);
    meta.llm_backend = Some(summary.llm_backend.clone());

    let mut by_topic: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_sentiment: BTreeMap<String, usize> = BTreeMap::new();
    for enrichment in records.iter().filter_map(|m| m.enrichment.as_ref()) {
        *by_topic.entry(enrichment.topic.to_string()).or_insert(0) += 1;
        *by_sentiment.entry(enrichment.llm_sentiment.to_string()).or_insert(0) += 1;
    }
    let alerts: Vec<Mention> = records.iter().filter(|m| m.is_critical()).cloned().collect();

    meta.by_topic = Some(by_topic);
    meta.by_sentiment = Some(by_sentiment);
    meta.critical_count = Some(alerts.len());

    let cloud = word_cloud(&records, search);

    info!(
        subsystem = "pipeline",
        component = "materializer",
        op = "materialize",
        record_count = records.len(),
        new_this_run,
        critical_count = alerts.len(),
        "Final dataset assembled"
    );

    MaterializedOutput {
        dataset: Dataset { meta, records },
        alerts,
        word_cloud: cloud,
        new_this_run,
    }
}

/// Dataset written before enrichment: normalized, scored, unenriched.
pub fn merged_dataset(
    records: Vec<Mention>,
    summary: &RunSummary,
    generated_at: DateTime<Utc>,
) -> Dataset {
    let mut meta = DatasetMeta::for_records(generated_at, &records);
    meta.malformed_dropped = Some(summary.malformed);
    meta.duplicates_dropped = Some(summary.duplicates);
    Dataset { meta, records }
}

/// Serialize `value` as indented JSON and atomically replace `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &bytes)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    let tmp = path.with_file_name(name);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "Output written");
    Ok(())
}

/// Script assigning the dataset to `window.PULSE_DATA`.
pub fn dashboard_script(dataset: &Dataset) -> Result<String> {
    let json = serde_json::to_string(dataset)?;
    Ok(format!(
        "// Auto-generated by pulse\nwindow.{} = {};\n",
        DASHBOARD_GLOBAL, json
    ))
}

/// Write the enriched dataset, alerts, word cloud and dashboard feed.
pub fn write_outputs(data_dir: &Path, output: &MaterializedOutput) -> Result<()> {
    if !data_dir.is_dir() {
        return Err(Error::Config(format!(
            "data directory {} does not exist",
            data_dir.display()
        )));
    }
    write_json(&data_dir.join(defaults::ENRICHED_FILE), &output.dataset)?;
    write_json(&data_dir.join(defaults::ALERTS_FILE), &output.alerts)?;
    write_json(&data_dir.join(defaults::WORD_CLOUD_FILE), &output.word_cloud)?;
    write_atomic(
        &data_dir.join(defaults::DASHBOARD_FILE),
        dashboard_script(&output.dataset)?.as_bytes(),
    )?;

    info!(
        subsystem = "pipeline",
        component = "materializer",
        op = "write",
        dir = %data_dir.display(),
        "Outputs written"
    );
    Ok(())
}
