use std::rc::Rc;

use fiber_core::{
    CommitStats, Element, FiberRoot, HostError, MemoryHost, Mutation, NodeId, RenderError,
    Runtime, WorkLoopConfig, WorkStatus,
};

use crate::deadline::{CountingScheduler, TestDeadline};

/// Headless harness for exercising fiber roots in tests.
///
/// `TestHarness` owns a [`FiberRoot`] rendering into a `MemoryHost`
/// container and a [`CountingScheduler`], and exposes helpers for stepping
/// the work loop slice by slice or pumping it until idle.
pub struct TestHarness {
    root: FiberRoot<MemoryHost>,
    scheduler: Rc<CountingScheduler>,
}

impl TestHarness {
    /// Create a harness whose container is a `<div>`.
    pub fn new() -> Self {
        Self::with_config(WorkLoopConfig::default())
    }

    pub fn with_config(config: WorkLoopConfig) -> Self {
        let (host, container) =
            MemoryHost::with_container("div").expect("`div` is a valid container tag");
        let scheduler = Rc::new(CountingScheduler::new());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            root: FiberRoot::with_runtime(host, container, runtime).with_config(config),
            scheduler,
        }
    }

    /// Render `element` into the container and pump until idle.
    pub fn set_content(&mut self, element: Element) -> Result<Option<CommitStats>, RenderError> {
        self.root.render(element);
        self.pump_until_idle()
    }

    /// Start a render without running any work.
    pub fn render(&mut self, element: Element) {
        self.root.render(element);
    }

    /// Run a single slice against `deadline`.
    pub fn slice(&mut self, deadline: &TestDeadline) -> Result<WorkStatus, RenderError> {
        deadline.reset();
        self.root.work_loop(deadline)
    }

    /// Drive the root until no render, unit of work or state update is
    /// pending. Returns the stats of the last commit, if any.
    pub fn pump_until_idle(&mut self) -> Result<Option<CommitStats>, RenderError> {
        self.root.flush()
    }

    /// Dispatch `kind` on `node` and pump. Returns how many listeners ran.
    pub fn dispatch(&mut self, node: NodeId, kind: &str) -> Result<usize, RenderError> {
        let ran = self.dispatch_only(node, kind)?;
        self.pump_until_idle()?;
        Ok(ran)
    }

    /// Dispatch `kind` on `node` without running any work.
    pub fn dispatch_only(&self, node: NodeId, kind: &str) -> Result<usize, HostError> {
        self.root.host().dispatch_event(node, kind)
    }

    pub fn click(&mut self, node: NodeId) -> Result<usize, RenderError> {
        self.dispatch(node, "click")
    }

    pub fn container(&self) -> NodeId {
        self.root.container()
    }

    pub fn host(&self) -> &MemoryHost {
        self.root.host()
    }

    pub fn root(&self) -> &FiberRoot<MemoryHost> {
        &self.root
    }

    /// Gain mutable access to the raw root for advanced scenarios.
    pub fn root_mut(&mut self) -> &mut FiberRoot<MemoryHost> {
        &mut self.root
    }

    pub fn idle_requests(&self) -> usize {
        self.scheduler.requests()
    }

    pub fn take_idle_requests(&self) -> usize {
        self.scheduler.take_requests()
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        self.root.host_mut().take_mutations()
    }

    /// Concatenated text below the container.
    pub fn text(&self) -> String {
        self.host().text_content(self.container())
    }

    pub fn dump_tree(&self) -> String {
        self.host().dump_tree(self.container())
    }

    /// Host elements with tag `tag` below the container, in document order.
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let host = self.host();
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = host.children(self.container()).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if host.tag(node) == Some(tag) {
                found.push(node);
            }
            stack.extend(host.children(node).iter().rev());
        }
        found
    }

    /// The single host element tagged `tag`.
    ///
    /// # Panics
    ///
    /// Panics unless exactly one such element exists.
    pub fn single_by_tag(&self, tag: &str) -> NodeId {
        match self.find_by_tag(tag).as_slice() {
            [node] => *node,
            nodes => panic!("expected one <{tag}>, found {}:\n{}", nodes.len(), self.dump_tree()),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `TestHarness`.
pub fn run_test_harness<R>(f: impl FnOnce(&mut TestHarness) -> R) -> R {
    let mut harness = TestHarness::new();
    f(&mut harness)
}
