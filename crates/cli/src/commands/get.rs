use clap::Args;
use modreg_core::LATEST;
use modreg_registry::{AnyStore, Registry, RegistryError};
use modreg_store::BlobStore;
use serde::Serialize;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Module name.
    pub name: String,
    /// A release name (like latest), a semver, or a semver component.
    /// Without `--exact` the label is looked up as given.
    pub version: Option<String>,
    /// Resolve a named version or semver component to the exact release.
    #[arg(long)]
    pub exact: bool,
}

/// A located module version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Located {
    pub name: String,
    pub version: String,
    pub url: String,
}

pub async fn run(
    registry: &Registry<AnyStore>,
    args: &GetArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let located = locate(registry, args).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&located)?),
        OutputFormat::Text => println!("{}", message(args, &located)),
    }
    Ok(())
}

/// Pick the version to look up and fetch its source URL.
pub async fn locate<S: BlobStore>(
    registry: &Registry<S>,
    args: &GetArgs,
) -> Result<Located, RegistryError> {
    let (version, url) = match &args.version {
        Some(version) if !args.exact => {
            let url = registry.get_source_url(&args.name, Some(version)).await?;
            (version.clone(), url)
        }
        Some(version) => registry.resolve(&args.name, version).await?,
        None => registry.resolve(&args.name, LATEST).await?,
    };
    Ok(Located {
        name: args.name.clone(),
        version,
        url,
    })
}

fn message(args: &GetArgs, located: &Located) -> String {
    let Located { version, url, .. } = located;
    match &args.version {
        Some(requested) if args.exact && requested != version => format!(
            "The input version is resolved to the exact version {version} and available at {url}"
        ),
        Some(requested) => format!("The release {requested} is found and available at {url}"),
        None => format!("The latest release {version} is found and available at {url}"),
    }
}
