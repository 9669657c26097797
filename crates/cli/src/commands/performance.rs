//! Utilization report from `GET /performance`

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, EntityPerformance, PerformanceResponse};
use crate::output::{format_percent, print_info, OutputFormat};

#[derive(Tabled)]
struct PerformanceRow {
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Aliases")]
    aliases: String,
    #[tabled(rename = "Samples")]
    samples: usize,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
}

fn to_row(entity: &str, performance: &EntityPerformance) -> PerformanceRow {
    let latest = performance.stats.last();

    PerformanceRow {
        entity: entity.to_string(),
        aliases: performance.aliases.join(", "),
        samples: performance.stats.len(),
        cpu: format_percent(latest.and_then(|p| p.cpu)),
        memory: format_percent(latest.and_then(|p| p.memory)),
    }
}

/// Show latest CPU and memory utilization per entity
pub async fn show_performance(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: PerformanceResponse = client.get("performance").await?;
    let entities = response.into_entities();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entities)?),
        OutputFormat::Table => {
            if entities.is_empty() {
                print_info("No utilization data (is a metrics collector configured?)");
                return Ok(());
            }

            let rows: Vec<PerformanceRow> = entities
                .iter()
                .map(|(entity, performance)| to_row(entity, performance))
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
