use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fabric-gateway")]
#[command(about = "Authenticated gateway for Microsoft Fabric workspace operations")]
pub struct Cli {
    /// Workspace id (defaults to FABRIC_DEFAULT_WORKSPACE_ID)
    #[arg(short, long, global = true)]
    pub workspace: Option<String>,
    /// Bearer token to use instead of the configured auth method
    #[arg(long, global = true)]
    pub token: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// List items in the workspace
    ListItems {
        /// Only list items of this type ("All" lists everything)
        #[arg(short = 't', long)]
        item_type: Option<String>,
    },
    /// Show a single item
    GetItem {
        item_id: String,
    },
    /// Create a new item
    CreateItem {
        /// Item type, e.g. Notebook or Lakehouse
        item_type: String,
        display_name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Update an item's display name or description
    UpdateItem {
        item_id: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an item
    DeleteItem {
        item_id: String,
    },
    /// Run a job (notebook, pipeline, ...) for an item
    ExecuteJob {
        item_id: String,
        /// Job parameters as a JSON object
        #[arg(short, long)]
        parameters: Option<String>,
    },
    /// Poll the status of a job instance
    GetJobStatus {
        job_id: String,
    },
    /// Show the current authentication status
    AuthStatus,
}
