//! Server health check.

use anyhow::Result;

/// `rolodex status`
pub async fn check(server: &str) -> Result<()> {
    let base = server.trim_end_matches('/');
    let resp = reqwest::get(format!("{base}/version")).await?;
    if !resp.status().is_success() {
        anyhow::bail!("Server at {base} returned HTTP {}", resp.status());
    }
    let version: serde_json::Value = resp.json().await?;
    println!(
        "Server at {base} is up ({} {}).",
        version["name"].as_str().unwrap_or("?"),
        version["version"].as_str().unwrap_or("?")
    );
    Ok(())
}
