use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use section_core::{config::default_config_path, convert_batch, BatchOutput, ConvertOptions};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "sectionsmith", about = "Turn static HTML pages into theme sections")]
struct Cli {
    /// Options file (TOML); defaults to the user config directory
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory that receives sections/, templates/ and head-resources.html
    #[arg(long, default_value = "out")]
    out: PathBuf,
    /// Replace repeated product cards with a collection-driven loop
    #[arg(long)]
    featured_products: bool,
    /// HTML files to convert
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut options = load_options(cli.config.as_deref())?;
    if cli.featured_products {
        options.featured_products = true;
    }

    let mut documents = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let html = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        documents.push((html, source_name(path)));
    }

    let batch = convert_batch(&documents, &options)?;
    let written = write_outputs(&cli.out, &batch)?;
    for doc in &batch.documents {
        for change in &doc.changes {
            println!("{}: {change}", doc.section_file_name);
        }
        for warning in &doc.warnings {
            warn!(section = %doc.section_file_name, "{warning}");
        }
    }
    info!(files = written.len(), out = %cli.out.display(), "done");
    Ok(())
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// An explicit `--config` must exist; the default location is optional.
fn load_options(explicit: Option<&Path>) -> Result<ConvertOptions> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(ConvertOptions::default()),
        },
    };
    let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let options = toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    info!(config = %path.display(), "loaded options");
    Ok(options)
}

fn write_outputs(out: &Path, batch: &BatchOutput) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for doc in &batch.documents {
        written.push(write_file(out, &doc.section_file_name, &doc.liquid_content)?);
        written.push(write_file(out, &doc.template_file_name, &doc.json_template)?);
    }
    if !batch.head_content.is_empty() {
        written.push(write_file(out, "head-resources.html", &batch.head_content)?);
    }
    Ok(written)
}

fn write_file(out: &Path, relative: &str, contents: &str) -> Result<PathBuf> {
    let path = out.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_lands_in_theme_layout() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let docs = [(
            r#"<html><head><link href="https://fonts.googleapis.com/css2?family=Inter" rel="stylesheet"></head><body><h1>Hi</h1></body></html>"#,
            "About Us.html",
        )];
        let batch = convert_batch(&docs, &ConvertOptions::default()).expect("batch");
        let written = write_outputs(dir.path(), &batch).expect("write");
        assert_eq!(written.len(), 3);
        assert!(dir.path().join("sections/about-us.liquid").exists());
        assert!(dir.path().join("templates/page.about-us.json").exists());
        let head = fs::read_to_string(dir.path().join("head-resources.html")).expect("head");
        assert!(head.contains("family=Inter"));
    }

    #[test]
    fn options_parse_from_toml() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "featured_products = true\ninject_blocks = [\"faq_item\"]\n\n[[custom_patterns]]\ntype = \"perk\"\nselector = \".perk\"\n",
        )
        .expect("write");
        let options = load_options(Some(&path)).expect("options");
        assert!(options.featured_products);
        assert_eq!(options.inject_blocks, vec!["faq_item".to_string()]);
        assert_eq!(options.custom_patterns[0].min_instances, 2);
        assert_eq!(options.paragraph_min_chars, 10);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        assert!(load_options(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }

    #[test]
    fn source_name_keeps_file_name() {
        assert_eq!(source_name(Path::new("site/pages/About Us.html")), "About Us.html");
    }
}
