use std::path::Path;

use clap::Args;
use modreg_registry::{
    AnyStore, ProjectConfig, PublishOutcome, PublishRequest, Registry, ZipArchiver, publish,
};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Replace the release if this version was already published.
    #[arg(long)]
    pub overwrite: bool,
    /// Check for conflicts and report the labels without uploading.
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(
    registry: &Registry<AnyStore>,
    config: &ProjectConfig,
    work_directory: &Path,
    args: &PublishArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let module = config.require_module()?;
    let request = PublishRequest::new(&module.name, &module.version, work_directory)
        .with_overwrite(args.overwrite)
        .with_dry_run(args.dry_run);

    let outcome = publish(registry, &ZipArchiver::new(), &request).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => println!("{}", summary(&outcome)),
    }
    Ok(())
}

fn summary(outcome: &PublishOutcome) -> String {
    let labels = outcome.labels.join(", ");
    if outcome.dry_run {
        format!(
            "Dry run: {}@{} would be uploaded as {labels}",
            outcome.name, outcome.version
        )
    } else {
        format!(
            "Published {}@{} as {labels}",
            outcome.name, outcome.version
        )
    }
}
