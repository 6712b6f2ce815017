//! The mounting entry points: resolve a template, process it against a
//! scope, and render it into a container.

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use ornate_core::diagnostics::set_debug;
use ornate_core::{ScopeChain, Value, diagnostic};
use ornate_dom::{Document, DomNode};
use ornate_template::{
    FileFetcher, Fetcher, Node, Processor, TemplateCache, TemplateSource, TreeBuilder,
};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::Config;
use crate::error::MountError;
use crate::render::Renderer;
use crate::visibility::VisibilityTicker;

/// Property set on an include element once its template is mounted.
const LOADED: &str = "__ornate_loaded";

pub struct Ornate {
    config: Config,
    builder: RefCell<TreeBuilder>,
    cache: TemplateCache,
    fetcher: Box<dyn Fetcher>,
    processor: Processor,
    renderer: Renderer,
}

impl Ornate {
    /// An engine reading remote templates from `config.base_dir`.
    pub fn new(config: Config) -> Self {
        let fetcher = FileFetcher::new(config.base_dir.clone());
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: Config, fetcher: impl Fetcher + 'static) -> Self {
        if config.debug {
            set_debug(true);
        }
        let ticker = Rc::new(VisibilityTicker::new());
        Self {
            builder: RefCell::new(TreeBuilder::new(&config.prefix)),
            cache: TemplateCache::new(config.failure_policy),
            fetcher: Box::new(fetcher),
            processor: Processor::new(&config.prefix),
            renderer: Renderer::new(&config.prefix, ticker),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn ticker(&self) -> Rc<VisibilityTicker> {
        Rc::clone(self.renderer.ticker())
    }

    /// Starts the visibility ticker on the current `LocalSet`.
    pub fn spawn_ticker(&self) -> JoinHandle<()> {
        let ticker = self.ticker();
        let period = self.config.show_interval();
        tokio::task::spawn_local(async move { ticker.run(period).await })
    }

    /// The structural tree for `source`. Remote templates go through the
    /// cache; the returned tree is a private copy.
    pub async fn resolve(&self, source: &TemplateSource) -> Result<Vec<Node>, MountError> {
        match source {
            TemplateSource::Element(node) => Ok(self.builder.borrow_mut().build_element(node)),
            TemplateSource::Markup(markup) => Ok(self.builder.borrow_mut().build_markup(markup)),
            TemplateSource::Remote(id) => {
                let nodes = self
                    .cache
                    .load_with(id, self.fetcher.as_ref(), &self.builder)
                    .await?;
                Ok(nodes.as_ref().clone())
            }
        }
    }

    /// Replaces the content of `container` with `source` rendered against
    /// `scope`. Without a source the container's own content is the
    /// template. `scope` may be a single value or an array of frames.
    ///
    /// Include elements (`<orn-template src="...">`) in the output are
    /// mounted afterwards with the same scope, extended by the element's
    /// `shared` property when set.
    pub async fn mount(
        &self,
        container: &DomNode,
        scope: Value,
        source: Option<TemplateSource>,
    ) -> Result<Vec<DomNode>, MountError> {
        self.mount_chain(container, ScopeChain::from_value(scope), source)
            .await
    }

    /// Like [`mount`](Self::mount), for a container looked up by id.
    pub async fn mount_by_id(
        &self,
        document: &Document,
        id: &str,
        scope: Value,
        source: Option<TemplateSource>,
    ) -> Result<Vec<DomNode>, MountError> {
        let container = find_container(document, id)?;
        self.mount(&container, scope, source).await
    }

    /// Mounts without suspending. Remote templates must already be cached
    /// and includes are left alone.
    pub fn mount_sync(
        &self,
        container: &DomNode,
        scope: Value,
        source: Option<TemplateSource>,
    ) -> Result<Vec<DomNode>, MountError> {
        let nodes = match source {
            None => self.builder.borrow_mut().build_element(container),
            Some(TemplateSource::Element(node)) => self.builder.borrow_mut().build_element(&node),
            Some(TemplateSource::Markup(markup)) => self.builder.borrow_mut().build_markup(&markup),
            Some(TemplateSource::Remote(id)) => match self.cache.get(&id) {
                Some(nodes) => nodes.as_ref().clone(),
                None => return Err(MountError::NotLoaded(id)),
            },
        };
        Ok(self.render_into(container, nodes, &ScopeChain::from_value(scope)))
    }

    fn mount_chain<'a>(
        &'a self,
        container: &'a DomNode,
        chain: ScopeChain,
        source: Option<TemplateSource>,
    ) -> LocalBoxFuture<'a, Result<Vec<DomNode>, MountError>> {
        async move {
            let source = source.unwrap_or_else(|| TemplateSource::Element(container.clone()));
            debug!(?source, frames = chain.len(), "mounting template");
            let nodes = self.resolve(&source).await?;
            let rendered = self.render_into(container, nodes, &chain);
            self.mount_includes(container, &chain).await?;
            Ok(rendered)
        }
        .boxed_local()
    }

    fn render_into(&self, container: &DomNode, nodes: Vec<Node>, chain: &ScopeChain) -> Vec<DomNode> {
        container.clear_children();
        let resolved = self.processor.process_roots(nodes, chain);
        let rendered = self.renderer.render_all(&resolved, container);
        for style in self.builder.borrow_mut().take_styles() {
            container.append_child(&style);
        }
        rendered
    }

    async fn mount_includes(&self, container: &DomNode, chain: &ScopeChain) -> Result<(), MountError> {
        let tag = format!("{}template", self.config.prefix);
        for include in container.elements_by_tag(&tag) {
            if include.property(LOADED).is_some_and(|v| v.is_truthy()) {
                continue;
            }
            let Some(src) = include.attribute("src").filter(|s| !s.trim().is_empty()) else {
                diagnostic!(tag = %tag, "include without a src attribute");
                continue;
            };
            let mut frames = chain.frames().to_vec();
            if let Some(shared) = include.property("shared").filter(|v| !v.is_nullish()) {
                frames.push(shared);
            }
            self.mount_chain(
                &include,
                ScopeChain::from_frames(frames),
                Some(TemplateSource::detect(&src)),
            )
            .await?;
            include.set_property(LOADED, Value::Bool(true));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Ornate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ornate")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn find_container(document: &Document, id: &str) -> Result<DomNode, MountError> {
    document.get_element_by_id(id).ok_or_else(|| {
        diagnostic!(id, "container not found");
        MountError::ContainerNotFound(id.to_string())
    })
}
