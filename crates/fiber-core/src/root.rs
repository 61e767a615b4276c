//! The scheduler context: two tree generations, the pending unit of work and
//! the deletion list for one host container.

use std::cell::RefCell;
use std::rc::Rc;

use crate::commit::{self, CommitStats};
use crate::config::WorkLoopConfig;
use crate::element::{Component, Element, ElementType, Props};
use crate::fiber::{Fiber, FiberId, FiberTree};
use crate::collections::HookSet;
use crate::hooks::{render_with_hooks, HookId, HookStore, RenderContext};
use crate::host::{Host, HostError, NodeId};
use crate::patch;
use crate::platform::{Deadline, Unbounded};
use crate::reconciler::reconcile_children;
use crate::runtime::{DefaultScheduler, Runtime, RuntimeHandle};
use crate::RenderError;

/// Outcome of one work-loop slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing was pending.
    Idle,
    /// The deadline ran out with units of work left.
    Yielded,
    /// The pending tree was finished and committed.
    Committed(CommitStats),
}

/// Renders element trees into one host container.
///
/// `FiberRoot` holds the committed tree (`current`), the tree under
/// construction (`wip`), the next unit of work and the deletion list. Work
/// only advances inside [`FiberRoot::work_loop`], which the host calls
/// whenever it has spare time.
pub struct FiberRoot<H: Host> {
    host: H,
    container: NodeId,
    tree: FiberTree,
    hooks: Rc<RefCell<HookStore>>,
    runtime: Runtime,
    config: WorkLoopConfig,
    current_root: Option<FiberId>,
    wip_root: Option<FiberId>,
    next_unit_of_work: Option<FiberId>,
    deletions: Vec<FiberId>,
    rerender_after_commit: bool,
    last_commit: Option<CommitStats>,
}

impl<H: Host> FiberRoot<H> {
    pub fn new(host: H, container: NodeId) -> Self {
        Self::with_runtime(host, container, Runtime::new(Rc::new(DefaultScheduler)))
    }

    pub fn with_runtime(host: H, container: NodeId, runtime: Runtime) -> Self {
        Self {
            host,
            container,
            tree: FiberTree::new(),
            hooks: Rc::new(RefCell::new(HookStore::default())),
            runtime,
            config: WorkLoopConfig::default(),
            current_root: None,
            wip_root: None,
            next_unit_of_work: None,
            deletions: Vec::new(),
            rerender_after_commit: false,
            last_commit: None,
        }
    }

    pub fn with_config(mut self, config: WorkLoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts a new top-level render of `element` into the container,
    /// diffed against whatever was last committed there. Any unfinished
    /// render is discarded.
    pub fn render(&mut self, element: Element) {
        let props = Rc::new(Props::new().child(element));
        let root = Fiber::root(self.container, props, self.current_root);
        self.begin(root);
        log::debug!("render requested into container {}", self.container);
    }

    fn begin(&mut self, root: Fiber) {
        if let Some(discarded) = self.wip_root {
            self.migrate_posted_updates(discarded);
        }
        let root = self.tree.insert(root);
        self.wip_root = Some(root);
        self.next_unit_of_work = Some(root);
        self.deletions.clear();
        self.collect_garbage();
        self.runtime.schedule();
    }

    /// Runs units of work until `deadline` is spent or the pending tree is
    /// complete, committing it in the latter case. Pending state updates are
    /// applied first. The host idle callback is re-armed on every call.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, RenderError> {
        let result = self.run_slice(deadline);
        self.runtime.set_needs_work(self.has_pending_work());
        self.runtime.request_idle_callback();
        result
    }

    fn run_slice(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, RenderError> {
        self.drain_state_updates();

        let mut units = 0;
        while let Some(fiber) = self.next_unit_of_work {
            match self.perform_unit_of_work(fiber) {
                Ok(next) => self.next_unit_of_work = next,
                Err(err) => {
                    log::error!("unit of work failed, abandoning pending tree: {err}");
                    self.abandon_work();
                    return Err(err.into());
                }
            }
            units += 1;
            if self
                .config
                .slice_exhausted(deadline.time_remaining(), units)
            {
                break;
            }
        }

        if self.next_unit_of_work.is_some() {
            log::trace!("yielding after {units} units");
            return Ok(WorkStatus::Yielded);
        }
        match self.wip_root {
            Some(root) => self.commit_root(root).map(WorkStatus::Committed),
            None => Ok(WorkStatus::Idle),
        }
    }

    /// Runs slices with an unbounded deadline until nothing is pending.
    /// Returns the stats of the last commit performed, if any.
    pub fn flush(&mut self) -> Result<Option<CommitStats>, RenderError> {
        let mut last = None;
        loop {
            match self.work_loop(&Unbounded)? {
                WorkStatus::Committed(stats) => last = Some(stats),
                WorkStatus::Yielded => {}
                WorkStatus::Idle => break,
            }
            if !self.has_pending_work() {
                break;
            }
        }
        Ok(last)
    }

    fn perform_unit_of_work(&mut self, fiber: FiberId) -> Result<Option<FiberId>, HostError> {
        let Some(current) = self.tree.get(fiber) else {
            return Ok(None);
        };
        log::trace!(
            "unit of work {fiber:?} {}",
            current
                .ty()
                .map_or_else(|| "root".to_owned(), ElementType::to_string)
        );
        match current.ty.clone() {
            Some(ElementType::Component(component)) => {
                self.update_function_component(fiber, component)
            }
            _ => self.update_host_component(fiber)?,
        }
        Ok(self.tree.next_unit(fiber))
    }

    fn update_function_component(&mut self, fiber: FiberId, component: Component) {
        let props = Rc::clone(&self.tree[fiber].props);
        let previous = self.tree[fiber]
            .alternate
            .and_then(|alternate| self.tree.get(alternate))
            .map(|alternate| alternate.hooks.clone())
            .unwrap_or_default();
        let context = RenderContext::new(
            component.name(),
            Rc::clone(&self.hooks),
            self.runtime.handle(),
            previous,
        );
        let (child, hooks) = render_with_hooks(context, || component.call(&props));
        self.tree[fiber].hooks = hooks;
        reconcile_children(&mut self.tree, &mut self.deletions, fiber, &[child]);
    }

    fn update_host_component(&mut self, fiber: FiberId) -> Result<(), HostError> {
        let props = Rc::clone(&self.tree[fiber].props);
        if self.tree[fiber].dom.is_none() {
            let tag = self.tree[fiber].ty.as_ref().and_then(ElementType::tag).map(str::to_owned);
            let dom = patch::create_node(&mut self.host, tag.as_deref(), &props)?;
            self.tree[fiber].dom = Some(dom);
        }
        reconcile_children(&mut self.tree, &mut self.deletions, fiber, props.children());
        Ok(())
    }

    fn commit_root(&mut self, root: FiberId) -> Result<CommitStats, RenderError> {
        let result = commit::commit_root(&mut self.host, &self.tree, root, &self.deletions);
        let stats = match result {
            Ok(stats) => stats,
            Err(err) => {
                log::error!("commit failed, host tree may be partially updated: {err}");
                self.abandon_work();
                return Err(err);
            }
        };
        log::debug!(
            "committed: {} placed, {} updated, {} unchanged, {} deleted",
            stats.placements,
            stats.updates,
            stats.unchanged,
            stats.deletions
        );
        self.current_root = Some(root);
        self.wip_root = None;
        self.deletions.clear();
        self.collect_garbage();
        self.tree.prune_alternates();
        self.last_commit = Some(stats);

        if std::mem::take(&mut self.rerender_after_commit) {
            self.schedule_from_current();
        }
        Ok(stats)
    }

    /// Moves posted state updates into their hook cells and, if any landed,
    /// restarts rendering from the committed root.
    ///
    /// Updates that only reach cells of components placed by the pending
    /// tree let it finish; the root re-renders right after its commit
    /// instead.
    fn drain_state_updates(&mut self) {
        let updates = self.runtime.take_state_updates();
        if updates.is_empty() {
            return;
        }
        let mut landed = Vec::new();
        {
            let mut store = self.hooks.borrow_mut();
            for update in updates {
                let hook = update.hook;
                if store.enqueue(hook, update.updater) {
                    landed.push(hook);
                } else {
                    log::debug!("dropping update for released hook {hook:?}");
                }
            }
        }
        if landed.is_empty() {
            return;
        }
        log::debug!("{} state updates queued", landed.len());
        if self.current_root.is_some() && !self.only_placed_cells(&landed) {
            self.schedule_from_current();
        } else {
            self.rerender_after_commit = true;
        }
    }

    /// Whether every hook in `hooks` belongs to a pending fiber with no
    /// committed counterpart.
    fn only_placed_cells(&self, hooks: &[HookId]) -> bool {
        let Some(wip) = self.wip_root else {
            return false;
        };
        let placed: HookSet = self
            .tree
            .mark([wip])
            .into_iter()
            .filter_map(|id| self.tree.get(id))
            .filter(|fiber| fiber.alternate.is_none())
            .flat_map(|fiber| fiber.hooks.iter().copied())
            .collect();
        hooks.iter().all(|hook| placed.contains(hook))
    }

    /// Builds a pending root anchored at the committed root. The top-level
    /// element of an unfinished render is kept, so a superseded `render`
    /// call still lands.
    fn schedule_from_current(&mut self) {
        let Some(current) = self.current_root else {
            return;
        };
        let pending = self.wip_root.and_then(|wip| self.tree.get(wip));
        let props = match pending {
            Some(wip) => Rc::clone(&wip.props),
            None => Rc::clone(&self.tree[current].props),
        };
        let dom = self.tree[current].dom.unwrap_or(self.container);
        self.begin(Fiber::root(dom, props, Some(current)));
    }

    /// Updates posted to cells of a pending tree that is about to be
    /// discarded move to the matching cell of the committed generation, so
    /// the restarted render still sees them.
    fn migrate_posted_updates(&mut self, discarded: FiberId) {
        let pending = self.tree.mark([discarded]);
        let mut store = self.hooks.borrow_mut();
        for id in pending {
            let fiber = &self.tree[id];
            let Some(alternate) = fiber.alternate.and_then(|alt| self.tree.get(alt)) else {
                continue;
            };
            for (&from, &to) in fiber.hooks.iter().zip(&alternate.hooks) {
                store.transfer(from, to);
            }
        }
    }

    fn abandon_work(&mut self) {
        self.wip_root = None;
        self.next_unit_of_work = None;
        self.deletions.clear();
        self.collect_garbage();
    }

    /// Releases fibers, and their hook cells, that no live root reaches.
    fn collect_garbage(&mut self) {
        let roots = self.current_root.into_iter().chain(self.wip_root);
        let keep = self.tree.mark(roots);
        let released = self.tree.sweep(&keep);
        if released.is_empty() {
            return;
        }
        let mut store = self.hooks.borrow_mut();
        for fiber in &released {
            for &hook in &fiber.hooks {
                store.release(hook);
            }
        }
        log::trace!("released {} fibers", released.len());
    }

    pub fn has_pending_work(&self) -> bool {
        self.next_unit_of_work.is_some()
            || self.wip_root.is_some()
            || self.runtime.has_state_updates()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn tree(&self) -> &FiberTree {
        &self.tree
    }

    pub fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    pub fn wip_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    pub fn next_unit_of_work(&self) -> Option<FiberId> {
        self.next_unit_of_work
    }

    pub fn deletions(&self) -> &[FiberId] {
        &self.deletions
    }

    pub fn last_commit(&self) -> Option<CommitStats> {
        self.last_commit
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn config(&self) -> &WorkLoopConfig {
        &self.config
    }

    /// Number of hook cells alive across all held generations.
    pub fn hook_cells(&self) -> usize {
        self.hooks.borrow().len()
    }
}

impl<H: Host + std::fmt::Debug> std::fmt::Debug for FiberRoot<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FiberRoot")
            .field("host", &self.host)
            .field("container", &self.container)
            .field("fibers", &self.tree.len())
            .field("current_root", &self.current_root)
            .field("wip_root", &self.wip_root)
            .field("next_unit_of_work", &self.next_unit_of_work)
            .field("deletions", &self.deletions.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/root_tests.rs"]
mod tests;
