//! Config command - show the effective configuration

use anyhow::Result;
use colored::Colorize;
use serde_json::{Map, Value};

use fintrack_core::{Config, ConfigWarning};

use crate::output;

pub fn run(config: &Config, warnings: &[ConfigWarning], json: bool) -> Result<()> {
    if json {
        let settings: Map<String, Value> = config
            .entries()
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::String(value)))
            .collect();
        let body = serde_json::json!({
            "settings": settings,
            "warnings": warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("{}", "Effective Configuration".bold());
    let mut table = output::create_table();
    table.set_header(vec!["Setting", "Value"]);
    for (key, value) in config.entries() {
        table.add_row(vec![key.to_string(), value]);
    }
    println!("{}", table);

    if !warnings.is_empty() {
        println!();
        for warning in warnings {
            output::warning(&format!("Warning: {}", warning));
        }
    }

    Ok(())
}
