//! Deduplicating store of remote templates.
//!
//! The first caller for an identifier marks it pending and runs the fetch;
//! concurrent callers wait on a `watch` channel until the entry settles and
//! then share the same parsed tree. Dropping the first caller's future
//! mid-fetch releases the pending mark so waiters can take over.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::builder::TreeBuilder;
use crate::error::{FetchError, LoadError};
use crate::fetch::Fetcher;
use crate::node::Node;

/// What happens to an identifier whose fetch failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Forget the failure; the next caller fetches again.
    #[default]
    Retry,
    /// Remember the failure and return it to every later caller.
    Sticky,
}

enum Entry {
    Pending(watch::Receiver<()>),
    Ready(Rc<Vec<Node>>),
    Failed(LoadError),
}

#[derive(Default)]
pub struct TemplateCache {
    entries: RefCell<HashMap<String, Entry>>,
    policy: FailurePolicy,
    fetches: Cell<usize>,
}

/// Clears a pending entry that was never settled. The sender drops with the
/// guard, which wakes every waiter.
struct PendingGuard<'a> {
    cache: &'a TemplateCache,
    id: &'a str,
    _notify: watch::Sender<()>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut entries = self.cache.entries.borrow_mut();
        if matches!(entries.get(self.id), Some(Entry::Pending(_))) {
            entries.remove(self.id);
        }
    }
}

impl TemplateCache {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Number of fetches issued so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    pub fn get(&self, id: &str) -> Option<Rc<Vec<Node>>> {
        match self.entries.borrow().get(id) {
            Some(Entry::Ready(nodes)) => Some(Rc::clone(nodes)),
            _ => None,
        }
    }

    pub fn insert(&self, id: &str, nodes: Vec<Node>) -> Rc<Vec<Node>> {
        let nodes = Rc::new(nodes);
        self.entries
            .borrow_mut()
            .insert(id.to_string(), Entry::Ready(Rc::clone(&nodes)));
        nodes
    }

    pub fn is_pending(&self, id: &str) -> bool {
        matches!(self.entries.borrow().get(id), Some(Entry::Pending(_)))
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Forgets settled entries. In-flight fetches are left alone.
    pub fn clear(&self) {
        self.entries
            .borrow_mut()
            .retain(|_, entry| matches!(entry, Entry::Pending(_)));
    }

    /// Returns the tree for `id`, running `fetch` only if no other caller
    /// has loaded or is loading it.
    pub async fn load<F, Fut>(&self, id: &str, fetch: F) -> Result<Rc<Vec<Node>>, LoadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Node>, FetchError>>,
    {
        loop {
            let waiting = match self.entries.borrow().get(id) {
                Some(Entry::Ready(nodes)) => {
                    trace!(id, "template cache hit");
                    return Ok(Rc::clone(nodes));
                }
                Some(Entry::Failed(err)) => return Err(err.clone()),
                Some(Entry::Pending(rx)) => Some(rx.clone()),
                None => None,
            };
            match waiting {
                Some(mut rx) => {
                    trace!(id, "waiting for in-flight template");
                    // Only ever errors: the sender is dropped once the entry settles.
                    let _ = rx.changed().await;
                }
                None => break,
            }
        }

        let (notify, rx) = watch::channel(());
        self.entries
            .borrow_mut()
            .insert(id.to_string(), Entry::Pending(rx));
        let _guard = PendingGuard {
            cache: self,
            id,
            _notify: notify,
        };
        self.fetches.set(self.fetches.get() + 1);
        debug!(id, "fetching template");

        match fetch().await {
            Ok(nodes) => Ok(self.insert(id, nodes)),
            Err(source) => {
                let err = LoadError::new(id, source);
                debug!(id, error = %err.source, policy = ?self.policy, "template fetch failed");
                match self.policy {
                    FailurePolicy::Sticky => {
                        self.entries
                            .borrow_mut()
                            .insert(id.to_string(), Entry::Failed(err.clone()));
                    }
                    FailurePolicy::Retry => {
                        self.entries.borrow_mut().remove(id);
                    }
                }
                Err(err)
            }
        }
    }

    /// Loads `id` through `fetcher`, building the markup with `builder`.
    pub async fn load_with(
        &self,
        id: &str,
        fetcher: &dyn Fetcher,
        builder: &RefCell<TreeBuilder>,
    ) -> Result<Rc<Vec<Node>>, LoadError> {
        self.load(id, || async {
            let markup = fetcher.fetch(id).await?;
            Ok(builder.borrow_mut().build_markup(&markup))
        })
        .await
    }
}

impl std::fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.borrow();
        let mut ids: Vec<&String> = entries.keys().collect();
        ids.sort();
        f.debug_struct("TemplateCache")
            .field("entries", &ids)
            .field("policy", &self.policy)
            .field("fetches", &self.fetches.get())
            .finish()
    }
}
