use std::cmp::Ordering;

use clap::Args;
use modreg_registry::{AnyStore, Registry};
use serde::Serialize;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Module name. Without it, every module name is listed.
    pub name: Option<String>,
    /// Also print the source URL of each release.
    #[arg(long, requires = "name")]
    pub urls: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Row {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

pub async fn run(
    registry: &Registry<AnyStore>,
    args: &ListArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let rows = match &args.name {
        None => {
            let mut names: Vec<String> = registry
                .list(None)
                .await?
                .into_iter()
                .map(|item| item.name)
                .collect();
            names.sort();
            names
                .into_iter()
                .map(|name| Row {
                    name,
                    version: None,
                    url: None,
                })
                .collect::<Vec<_>>()
        }
        Some(name) => {
            let mut versions: Vec<String> = registry
                .list(Some(name))
                .await?
                .into_iter()
                .filter_map(|item| item.version)
                .collect();
            versions.sort_by(|a, b| newest_first(a, b));

            let mut urls = if args.urls {
                registry.source_urls(name, &versions).await?.into_iter()
            } else {
                Vec::new().into_iter()
            };
            versions
                .into_iter()
                .map(|version| Row {
                    name: name.clone(),
                    url: urls.next().map(|(_, url)| url),
                    version: Some(version),
                })
                .collect()
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => {
            for row in &rows {
                println!("{}", render(row));
            }
        }
    }
    Ok(())
}

fn render(row: &Row) -> String {
    match (&row.version, &row.url) {
        (Some(version), Some(url)) => format!("{version}\t{url}"),
        (Some(version), None) => version.clone(),
        (None, _) => row.name.clone(),
    }
}

/// Semver releases newest first, then other labels in lexical order.
fn newest_first(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(a), Ok(b)) => b.cmp(&a),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_sort_semver_descending_then_labels() {
        let mut versions = vec!["1.2.3", "beta", "10.0.0", "1.10.0", "alpha", "2.0.0"];
        versions.sort_by(|a, b| newest_first(a, b));
        assert_eq!(
            versions,
            ["10.0.0", "2.0.0", "1.10.0", "1.2.3", "alpha", "beta"]
        );
    }

    #[test]
    fn render_rows() {
        let module = Row {
            name: "vpc".into(),
            version: None,
            url: None,
        };
        assert_eq!(render(&module), "vpc");

        let release = Row {
            name: "vpc".into(),
            version: Some("1.0.0".into()),
            url: Some("memory://vpc/1.0.0/module.zip".into()),
        };
        assert_eq!(render(&release), "1.0.0\tmemory://vpc/1.0.0/module.zip");
    }

    #[test]
    fn json_omits_missing_fields() {
        let row = Row {
            name: "vpc".into(),
            version: Some("1.0.0".into()),
            url: None,
        };
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"name":"vpc","version":"1.0.0"}"#
        );
    }
}
