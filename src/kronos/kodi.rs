use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::time::Duration;

use crate::error::KronosError;
use crate::kronos::config::HostConfig;
use crate::kronos::host::Toast;

/// Minimal Kodi JSON-RPC client; only the GUI notification call is needed.
#[derive(Debug, Clone)]
pub struct KodiClient {
    url: String,
    username: Option<String>,
    password: Option<String>,
    timeout: Duration,
}

impl KodiClient {
    pub fn from_config(cfg: &HostConfig) -> Self {
        Self {
            url: cfg.jsonrpc_url.trim().to_string(),
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs.max(1)),
        }
    }

    pub fn show_notification(&self, toast: &Toast) -> Result<()> {
        let payload = notification_payload(toast);
        let client = Client::builder().timeout(self.timeout).build()?;
        let mut request = client.post(&self.url).json(&payload);
        if let Some(user) = &self.username {
            request = request.basic_auth(user, self.password.as_deref());
        }

        let response = request
            .send()
            .with_context(|| format!("failed to reach Kodi JSON-RPC at {}", self.url))?;
        let status = response.status();
        if !status.is_success() {
            return Err(KronosError::Notification(format!(
                "Kodi JSON-RPC returned HTTP {status}"
            ))
            .into());
        }
        let body: Value = response
            .json()
            .context("Kodi JSON-RPC response was not JSON")?;
        check_rpc_response(&body)
    }
}

pub fn notification_payload(toast: &Toast) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "GUI.ShowNotification",
        "params": {
            "title": toast.title,
            "message": toast.message,
            "image": toast.icon_path.display().to_string(),
            "displaytime": toast.display_time_ms,
        }
    })
}

fn check_rpc_response(body: &Value) -> Result<()> {
    if let Some(err) = body.get("error") {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let code = err.get("code").and_then(Value::as_i64).unwrap_or_default();
        return Err(KronosError::Notification(format!("code={code} {message}")).into());
    }
    Ok(())
}
