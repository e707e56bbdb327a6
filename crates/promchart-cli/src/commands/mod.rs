//! Subcommand handlers

pub mod ask;
pub mod status;

use serde_json::Value;

/// Fail with the server's `error` message on a non-success status
async fn read_json(response: reqwest::Response) -> anyhow::Result<Value> {
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());
        anyhow::bail!("server returned {}: {}", status, message);
    }

    Ok(body)
}
