//! Container listing, logs and lifecycle commands

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, Container};
use crate::output::{color_status, format_epoch, format_ports, print_success, print_warning, OutputFormat};

/// Row for containers table
#[derive(Tabled)]
struct ContainerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Ports")]
    ports: String,
    #[tabled(rename = "Created")]
    created: String,
}

/// List managed containers
pub async fn list_containers(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let containers: Vec<Container> = client.get("containers").await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&containers)?);
        }
        OutputFormat::Table => {
            if containers.is_empty() {
                print_warning("No managed containers found");
                return Ok(());
            }

            let rows: Vec<ContainerRow> = containers
                .iter()
                .map(|c| ContainerRow {
                    id: c.id_short.clone(),
                    name: c.name.clone(),
                    status: color_status(&c.status),
                    ports: format_ports(&c.ports),
                    created: format_epoch(c.start_time),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} containers", containers.len());
        }
    }

    Ok(())
}

fn logs_path(id: &str, since: Option<u64>, until: Option<u64>) -> String {
    let params: Vec<String> = [("since", since), ("until", until)]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| format!("{name}={v}")))
        .collect();

    if params.is_empty() {
        format!("containers/{id}/logs")
    } else {
        format!("containers/{id}/logs?{}", params.join("&"))
    }
}

/// Print the log lines of a container
pub async fn show_logs(
    client: &ApiClient,
    id: &str,
    since: Option<u64>,
    until: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let lines: Vec<String> = client.get(&logs_path(id, since, until)).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&lines)?),
        OutputFormat::Table => {
            for line in &lines {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

/// Send a lifecycle command (`start`, `stop`, `pause`, `resume`)
pub async fn run_command(client: &ApiClient, id: &str, command: &str) -> Result<()> {
    client
        .post_empty(&format!("containers/{id}/{command}/"))
        .await?;
    print_success(&format!("{command}: {id}"));
    Ok(())
}

/// Delete a stopped container
pub async fn delete_container(client: &ApiClient, id: &str) -> Result<()> {
    client.delete(&format!("containers/{id}/")).await?;
    print_success(&format!("Deleted {id}"));
    Ok(())
}
