use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use std::sync::Arc;
use std::time::Duration;

use estransport::{Client, PoolStats, Request, SelectorKind, TransportConfig};

use crate::cli::Cli;

/// Environment config overridden by command-line flags.
pub fn build_config(cli: &Cli) -> TransportConfig {
    let mut config = estransport::config::from_env();
    if !cli.url.is_empty() {
        config.urls.clone_from(&cli.url);
    }
    if cli.username.is_some() {
        config.username.clone_from(&cli.username);
        config.password.clone_from(&cli.password);
    }
    if cli.timeout.is_some() {
        config.request_timeout_secs = cli.timeout;
    }
    config.selector = match cli.selector.as_str() {
        "random" => SelectorKind::Random,
        _ => SelectorKind::RoundRobin,
    };
    config
}

pub async fn handle_nodes(config: TransportConfig, json: bool) -> Result<()> {
    let client = Client::new(config).context("Failed to build client")?;
    let count = client.discover_nodes().await.context("Discovery failed")?;

    let stats = client.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    print_stats(&stats);
    println!("\n{} routable nodes", count.to_string().green());
    Ok(())
}

pub async fn handle_request(
    config: TransportConfig,
    path: &str,
    method: &str,
    data: Option<String>,
    no_retry: bool,
    discover: bool,
) -> Result<()> {
    let client = Client::new(config).context("Failed to build client")?;
    if discover {
        if let Err(e) = client.discover_nodes().await {
            println!("{} {}", "Discovery failed, using seed URLs:".yellow(), e);
        }
    }

    let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method {method:?}"))?;
    let mut request = Request::new(method, path);
    if let Some(body) = data {
        request = request.with_body(body);
    }

    let response = if no_retry {
        client.perform(&request).await
    } else {
        client.perform_with_retry(&request).await
    }
    .context("Request failed")?;

    let status = response.status();
    let status_line = if status.is_success() {
        status.to_string().green()
    } else {
        status.to_string().red()
    };
    println!("{status_line}");

    let body = response.text().await.context("Failed to read response body")?;
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}

pub async fn handle_watch(mut config: TransportConfig, interval: u64, every: u64) -> Result<()> {
    config.discovery.enabled = true;
    config.discovery.on_start = true;
    config.discovery.interval_secs = interval;

    let client = Client::new(config).context("Failed to build client")?;
    println!(
        "{}",
        format!("Watching pool (discovery every {interval}s, Ctrl-C to stop)").cyan().bold()
    );

    let every = Duration::from_secs(every.max(1));
    loop {
        tokio::select! {
            () = tokio::time::sleep(every) => print_snapshot(&client),
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    client.shutdown().await;
    Ok(())
}

fn print_snapshot(client: &Arc<Client>) {
    println!();
    print_stats(&client.stats());
}

fn print_stats(stats: &PoolStats) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["URL", "Name", "Roles", "Status", "Failures", "Retry in"]);

    for conn in &stats.connections {
        let status = if conn.is_dead {
            Cell::new("Dead").fg(Color::Red)
        } else {
            Cell::new("Alive").fg(Color::Green)
        };
        let retry_in =
            conn.resurrect_in_secs.map_or_else(|| "-".to_string(), |secs| format!("{secs}s"));

        table.add_row(vec![
            Cell::new(&conn.url),
            Cell::new(conn.name.as_deref().unwrap_or("-")),
            Cell::new(if conn.roles.is_empty() { "-".to_string() } else { conn.roles.join(",") }),
            status,
            Cell::new(conn.failures),
            Cell::new(retry_in),
        ]);
    }

    println!("{table}");
    println!("{} alive, {} dead, {} total", stats.alive, stats.dead, stats.total);
}
