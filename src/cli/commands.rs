//! Command handlers: one gateway call per subcommand, rendered for the terminal

use super::app::{Cli, Commands};
use crate::api::models::{AuthStatus, CallerToken, GatewayResult, ItemUpdate};
use crate::gateway::Gateway;
use anyhow::{Context, Result};
use colored::Colorize;
use log::info;
use serde_json::Value;

pub async fn run_command(cli: Cli, gateway: &Gateway) -> Result<()> {
    let token = CallerToken::from(cli.token);
    let workspace = cli.workspace.as_deref();
    info!("Executing {:?}", cli.command);

    let output = match cli.command {
        Commands::ListItems { item_type } => {
            let result = gateway.list_items(&token, workspace, item_type.as_deref()).await;
            render(result, "listing items", Some("No items found in the workspace."))?
        }
        Commands::GetItem { item_id } => {
            let result = gateway.get_item(&token, workspace, &item_id).await;
            render(result, "getting item", Some("Item not found."))?
        }
        Commands::CreateItem {
            item_type,
            display_name,
            description,
        } => {
            let result = gateway
                .create_item(&token, workspace, &item_type, &display_name, description.as_deref())
                .await;
            render(result, "creating item", None)?
        }
        Commands::UpdateItem {
            item_id,
            display_name,
            description,
        } => {
            let updates = ItemUpdate {
                display_name,
                description,
            };
            if updates.is_empty() {
                anyhow::bail!("Nothing to update: pass --display-name and/or --description");
            }
            let result = gateway.update_item(&token, workspace, &item_id, &updates).await;
            render(result, "updating item", None)?
        }
        Commands::DeleteItem { item_id } => {
            let result = gateway.delete_item(&token, workspace, &item_id).await;
            render(result, "deleting item", None)?
        }
        Commands::ExecuteJob { item_id, parameters } => {
            let parameters = parameters.as_deref().map(parse_parameters).transpose()?;
            let result = gateway.execute_job(&token, workspace, &item_id, parameters).await;
            render(result, "executing job", None)?
        }
        Commands::GetJobStatus { job_id } => {
            let result = gateway.get_job_status(&token, workspace, &job_id).await;
            render(result, "getting job status", None)?
        }
        Commands::AuthStatus => format_auth_status(&gateway.auth_status().await),
    };

    println!("{}", output);
    Ok(())
}

/// Pretty JSON on success; `Error <action>: <message>` as the error otherwise
pub fn render(result: GatewayResult<Value>, action: &str, empty_message: Option<&str>) -> Result<String> {
    match result {
        GatewayResult::Success { data } => {
            if let Some(empty_message) = empty_message {
                if is_empty(&data) {
                    return Ok(empty_message.to_string());
                }
            }
            serde_json::to_string_pretty(&data).context("Failed to format response")
        }
        GatewayResult::Error { message } => Err(anyhow::anyhow!("Error {}: {}", action, message)),
    }
}

fn is_empty(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        // List endpoints wrap results in {"value": [...]}
        Value::Object(map) => map.get("value").and_then(Value::as_array).is_some_and(|items| items.is_empty()),
        _ => false,
    }
}

fn parse_parameters(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("Invalid --parameters JSON: {}", raw))
}

pub fn format_auth_status(status: &AuthStatus) -> String {
    let token_line = if status.has_valid_token {
        "✓ Valid token available".green().to_string()
    } else {
        "✗ No valid token (operations will be simulated)".yellow().to_string()
    };

    [
        "Fabric Gateway Authentication Status".bold().to_string(),
        "====================================".to_string(),
        format!("Auth Method: {}", status.auth_method),
        token_line,
        format!("Client ID: {}", status.client_id),
        format!("Tenant ID: {}", status.tenant_id),
        format!("Default Workspace: {}", status.default_workspace),
        format!("Token Expiry: {}", status.token_expiry),
    ]
    .join("\n")
}
