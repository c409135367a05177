//! `sslinker provision`: one-click HTTPS for a local service

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use super::output;
use crate::artifact::DirectorySink;
use crate::client::SslinkerApi;
use crate::notify::Notifier;
use crate::workflow::ProvisioningWorkflow;

#[derive(Args)]
pub struct ProvisionArgs {
    /// Public host name or IP clients will use, e.g. app.lan
    pub host: String,

    /// Local origin to proxy to, e.g. 127.0.0.1:3000
    pub origin: String,

    /// Where to save the root CA certificate
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Output format (json, yaml, or table)
    #[arg(short, long, default_value = "table")]
    pub output: String,
}

pub async fn handle_provision(
    args: ProvisionArgs,
    api: Arc<dyn SslinkerApi>,
    notifier: Arc<dyn Notifier>,
    download_dir: PathBuf,
) -> Result<()> {
    let sink = Arc::new(DirectorySink::new(args.dir.unwrap_or(download_dir)));
    let workflow = ProvisioningWorkflow::new(api, notifier, sink);

    let run = workflow.run(&args.host, &args.origin).await?;
    if args.output == "table" {
        output::print_workflow_run(&run);
    } else {
        output::print_output(&run, &args.output)?;
    }

    if let Some(failure) = &run.failure {
        anyhow::bail!("Provisioning failed while {}: {}", failure.stage, failure.message);
    }
    Ok(())
}
