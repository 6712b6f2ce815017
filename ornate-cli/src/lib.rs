use anyhow::{bail, Context, Result};
use ornate_core::{ScopeChain, Value};
use ornate_dom::Document;
use ornate_renderer::{Config, Ornate};
use ornate_template::{Processor, TemplateSource, TreeBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings shared by the `render` and `tree` commands.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub scope: Option<PathBuf>,
    pub base_dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub config: Option<PathBuf>,
    pub debug: bool,
}

impl Options {
    /// Config file first, then flags. Without a base directory from either,
    /// includes resolve next to the template.
    pub fn resolve_config(&self, template: &Path) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config {
                base_dir: template
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
                ..Config::default()
            },
        };
        if let Some(dir) = &self.base_dir {
            config.base_dir = dir.clone();
        }
        if let Some(prefix) = &self.prefix {
            if prefix.is_empty() {
                bail!("--prefix must not be empty");
            }
            config.prefix = prefix.clone();
        }
        config.debug |= self.debug;
        Ok(config)
    }

    /// The scope file as a value; an empty object without one.
    pub fn load_scope(&self) -> Result<Value> {
        let Some(path) = &self.scope else {
            return Ok(Value::object());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scope {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in {}", path.display()))?;
        Ok(Value::from(json))
    }
}

fn read_template(template: &Path) -> Result<String> {
    fs::read_to_string(template)
        .with_context(|| format!("failed to read {}", template.display()))
}

/// Renders `template` against the scope and returns the resulting HTML.
/// Writes it to `out` as well when given.
pub async fn render_cmd(template: &Path, out: Option<&Path>, options: &Options) -> Result<String> {
    let config = options.resolve_config(template)?;
    let markup = read_template(template)?;
    let scope = options.load_scope()?;
    debug!(template = %template.display(), base_dir = %config.base_dir.display(), "rendering");

    let engine = Ornate::new(config);
    let document = Document::new();
    engine
        .mount(&document.body(), scope, Some(TemplateSource::Markup(markup)))
        .await
        .with_context(|| format!("failed to render {}", template.display()))?;

    let html = document.body().inner_html();
    if let Some(out) = out {
        fs::write(out, &html).with_context(|| format!("failed to write {}", out.display()))?;
    }
    Ok(html)
}

/// Outline of the structural tree for `template`. With a scope file the
/// tree is shown after directive processing.
pub fn tree_cmd(template: &Path, options: &Options) -> Result<String> {
    let config = options.resolve_config(template)?;
    let markup = read_template(template)?;
    let mut nodes = TreeBuilder::new(&config.prefix).build_markup(&markup);
    if options.scope.is_some() {
        let chain = ScopeChain::from_value(options.load_scope()?);
        nodes = Processor::new(&config.prefix).process_roots(nodes, &chain);
    }
    Ok(nodes.iter().map(|n| n.outline()).collect())
}
