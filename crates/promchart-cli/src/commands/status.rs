//! Health and tools commands

use serde_json::Value;

use super::read_json;
use crate::OutputFormat;

pub async fn handle(api_url: &str, format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    // Unhealthy answers still carry a body worth showing
    let resp = client
        .get(format!("{}/health", api_url))
        .send()
        .await?
        .json::<Value>()
        .await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        _ => {
            println!("promchart Server Health");
            println!("=======================\n");

            let status = resp.get("status").and_then(|s| s.as_str()).unwrap_or("unknown");
            let mode = resp.get("mode").and_then(|m| m.as_str()).unwrap_or("unknown");
            println!("Status: {}", status);
            println!("Mode:   {}", mode);
        }
    }

    Ok(())
}

pub async fn handle_tools(api_url: &str, format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/tools", api_url)).send().await?;
    let body = read_json(resp).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            if let Some(tools) = body.get("tools").and_then(|t| t.as_array()) {
                println!("Available tools ({}):\n", tools.len());
                for tool in tools {
                    println!("{}", describe_tool(tool));
                }
            }
        }
    }

    Ok(())
}

/// One line per tool: name, parameters, description
fn describe_tool(tool: &Value) -> String {
    let name = tool.get("tool_name").and_then(Value::as_str).unwrap_or("?");
    let description = tool.get("description").and_then(Value::as_str).unwrap_or("");

    let params: Vec<String> = tool
        .get("parameters")
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .map(|(param, def)| {
                    let required = def.get("required").and_then(Value::as_bool).unwrap_or(false);
                    if required {
                        param.clone()
                    } else {
                        format!("{}?", param)
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    format!("  {}({})  {}", name, params.join(", "), description)
}
