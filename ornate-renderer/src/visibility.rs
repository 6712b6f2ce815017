//! Periodic re-evaluation of `show` bindings.

use std::cell::RefCell;
use std::time::Duration;

use ornate_dom::DomNode;
use ornate_dom::node::WeakDomNode;
use tracing::trace;

/// Elements whose `show` binding is re-run on every tick. Elements are held
/// weakly; dropped ones fall off the list.
#[derive(Default)]
pub struct VisibilityTicker {
    watched: RefCell<Vec<WeakDomNode>>,
}

impl VisibilityTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, el: &DomNode) {
        self.watched.borrow_mut().push(el.downgrade());
    }

    /// Live registered elements.
    pub fn len(&self) -> usize {
        self.watched
            .borrow()
            .iter()
            .filter(|w| w.upgrade().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every live `show` binding once. Returns how many ran.
    pub fn tick(&self) -> usize {
        let live: Vec<DomNode> = {
            let mut watched = self.watched.borrow_mut();
            watched.retain(|w| w.upgrade().is_some());
            watched.iter().filter_map(WeakDomNode::upgrade).collect()
        };
        live.iter()
            .filter(|el| el.run_binding("show", None))
            .count()
    }

    /// Ticks forever at `period`. Meant for `spawn_local`.
    pub async fn run(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let ran = self.tick();
            trace!(ran, "visibility tick");
        }
    }
}

impl std::fmt::Debug for VisibilityTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityTicker")
            .field("watched", &self.len())
            .finish()
    }
}
