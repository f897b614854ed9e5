use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tokio::task::JoinSet;

use vitrine_core::carousel::{probe, DefaultLoader, MediaLoader, Readiness};
use vitrine_core::AppConfig;

use super::resolve_items;

/// Used when the config leaves probes unbounded; a headless check has to end
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct ProbeRow {
    index: usize,
    source: String,
    label: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<(u32, u32)>,
}

impl ProbeRow {
    fn new(index: usize, source: String, label: String, readiness: &Readiness) -> Self {
        let (status, reason, dimensions) = match readiness {
            Readiness::Ready(image) => ("ready", None, Some((image.width(), image.height()))),
            Readiness::Failed(reason) => ("failed", Some(reason.clone()), None),
            Readiness::Pending => ("pending", None, None),
        };
        Self {
            index,
            source,
            label,
            status,
            reason,
            dimensions,
        }
    }
}

pub async fn run(
    config: &AppConfig,
    items: &[String],
    json: bool,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let items = resolve_items(config, items)?;
    if items.is_empty() {
        println!("No slides configured.");
        println!("\nAdd [[carousel.items]] to the config file or pass media on the command line:");
        println!("  vitrine probe <url-or-path>...");
        return Ok(());
    }

    let limit = timeout_secs
        .map(Duration::from_secs)
        .or_else(|| config.loader.probe_timeout())
        .unwrap_or(FALLBACK_TIMEOUT);
    let loader: Arc<dyn MediaLoader> = Arc::new(DefaultLoader::new(&config.loader)?);

    let mut probes = JoinSet::new();
    for (index, item) in items.iter().cloned().enumerate() {
        let loader = Arc::clone(&loader);
        probes.spawn(async move {
            // A probe that outlives the limit is still pending, not failed
            let readiness = tokio::time::timeout(limit, probe(loader.as_ref(), &item, None))
                .await
                .unwrap_or(Readiness::Pending);
            ProbeRow::new(index, item.source.to_string(), item.label(), &readiness)
        });
    }

    let mut rows = Vec::with_capacity(items.len());
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok(row) => rows.push(row),
            Err(e) => tracing::warn!("Probe task failed: {}", e),
        }
    }
    rows.sort_by_key(|row| row.index);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_table(&rows);
    }

    Ok(())
}

fn print_table(rows: &[ProbeRow]) {
    let ready = rows.iter().filter(|r| r.status == "ready").count();
    println!("Slides ({}/{} ready):\n", ready, rows.len());

    for row in rows {
        let detail = match (&row.reason, row.dimensions) {
            (Some(reason), _) => format!(" - {}", reason),
            (None, Some((w, h))) => format!(" - {}x{}", w, h),
            (None, None) => String::new(),
        };
        println!("  {:>2}. [{:<7}] {}{}", row.index + 1, row.status, row.label, detail);
        println!("      {}", row.source);
    }
}
