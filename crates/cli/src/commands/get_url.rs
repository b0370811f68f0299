use clap::Args;
use modreg_registry::{AnyStore, Registry};

#[derive(Args, Debug)]
pub struct GetUrlArgs {
    /// Module name.
    pub name: String,
    /// Version label; defaults to the current release.
    pub version: Option<String>,
}

pub async fn run(registry: &Registry<AnyStore>, args: &GetUrlArgs) -> anyhow::Result<()> {
    let url = registry
        .get_source_url(&args.name, args.version.as_deref())
        .await?;
    println!("{url}");
    Ok(())
}
