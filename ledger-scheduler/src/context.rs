//! Shared worker context (spec §4.8 "shared context `{locationConfigs,
//! …}`", §5 "replaced wholesale, never mutated in place").

use std::sync::Arc;

use arc_swap::ArcSwap;

use ledger_shared::Store;

/// Everything a processor needs that can change between job runs without
/// restarting the process: the current store fleet and the exports
/// output directory. Updated atomically via [`SharedContext::replace`];
/// readers never observe a partially-updated context.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub stores: Vec<Store>,
    pub exports_dir: String,
}

impl JobContext {
    pub fn new(stores: Vec<Store>, exports_dir: impl Into<String>) -> Self {
        Self {
            stores,
            exports_dir: exports_dir.into(),
        }
    }
}

/// Lock-free handle to the current [`JobContext`]. Cloning is cheap (an
/// `Arc` bump); every worker holds one of these rather than a reference
/// into a single owner.
#[derive(Clone)]
pub struct SharedContext(Arc<ArcSwap<JobContext>>);

impl SharedContext {
    pub fn new(initial: JobContext) -> Self {
        Self(Arc::new(ArcSwap::from_pointee(initial)))
    }

    pub fn load(&self) -> Arc<JobContext> {
        self.0.load_full()
    }

    /// Replace the whole context with a freshly built one. Never mutates
    /// the old value in place.
    pub fn replace(&self, next: JobContext) {
        self.0.store(Arc::new(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_swaps_atomically_and_old_readers_keep_their_snapshot() {
        let ctx = SharedContext::new(JobContext::new(vec![], "./exports"));
        let before = ctx.load();
        ctx.replace(JobContext::new(vec![], "./exports2"));
        let after = ctx.load();

        assert_eq!(before.exports_dir, "./exports");
        assert_eq!(after.exports_dir, "./exports2");
    }
}
