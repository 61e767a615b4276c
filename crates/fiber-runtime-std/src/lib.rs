//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform
//! abstraction traits defined in `fiber-core`. Applications construct a
//! [`StdRuntime`], mount a [`fiber_core::FiberRoot`] with it and call
//! [`StdRuntime::tick`] whenever their event loop has spare time.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use fiber_core::{
    Deadline, FiberRoot, Host, IdleScheduler, NodeId, RenderError, Runtime, RuntimeHandle,
    WorkLoopConfig, WorkStatus,
};

type IdleWaker = Rc<dyn Fn() + 'static>;

/// Idle scheduler that records requests in a flag and optionally pokes the
/// embedder's event loop. It lives on the thread that owns the roots.
pub struct StdIdleScheduler {
    idle_requested: Cell<bool>,
    idle_waker: RefCell<Option<IdleWaker>>,
}

impl StdIdleScheduler {
    pub fn new() -> Self {
        Self {
            idle_requested: Cell::new(false),
            idle_waker: RefCell::new(None),
        }
    }

    /// Returns whether an idle callback has been requested since the last
    /// call.
    pub fn take_idle_request(&self) -> bool {
        self.idle_requested.replace(false)
    }

    /// Registers a waker invoked whenever an idle callback is requested.
    pub fn set_idle_waker(&self, waker: impl Fn() + 'static) {
        self.idle_waker.replace(Some(Rc::new(waker)));
    }

    pub fn clear_idle_waker(&self) {
        self.idle_waker.replace(None);
    }

    fn wake(&self) {
        // The waker may swap itself out while running.
        let waker = self.idle_waker.borrow().clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdIdleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdIdleScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdIdleScheduler")
            .field("idle_requested", &self.idle_requested.get())
            .field("has_waker", &self.idle_waker.borrow().is_some())
            .finish()
    }
}

impl IdleScheduler for StdIdleScheduler {
    fn request_idle_callback(&self) {
        self.idle_requested.set(true);
        self.wake();
    }
}

/// Deadline measured against [`Instant::now`] from the start of a slice.
#[derive(Debug, Clone, Copy)]
pub struct StdDeadline {
    start: Instant,
    budget: Duration,
}

impl StdDeadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl Deadline for StdDeadline {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}

/// Tuning for [`StdRuntime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdRuntimeConfig {
    /// Time handed to each work-loop slice.
    pub slice_budget: Duration,
    /// Passed through to every root mounted by the runtime.
    pub work_loop: WorkLoopConfig,
}

impl StdRuntimeConfig {
    pub const DEFAULT_SLICE_BUDGET: Duration = Duration::from_millis(5);

    pub fn with_slice_budget(mut self, budget: Duration) -> Self {
        self.slice_budget = budget;
        self
    }

    pub fn with_work_loop(mut self, work_loop: WorkLoopConfig) -> Self {
        self.work_loop = work_loop;
        self
    }
}

impl Default for StdRuntimeConfig {
    fn default() -> Self {
        Self {
            slice_budget: Self::DEFAULT_SLICE_BUDGET,
            work_loop: WorkLoopConfig::default(),
        }
    }
}

/// Convenience container bundling the standard scheduler with a
/// [`fiber_core::Runtime`].
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Rc<StdIdleScheduler>,
    runtime: Runtime,
    config: StdRuntimeConfig,
}

impl StdRuntime {
    pub fn new() -> Self {
        Self::with_config(StdRuntimeConfig::default())
    }

    pub fn with_config(config: StdRuntimeConfig) -> Self {
        let scheduler = Rc::new(StdIdleScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            scheduler,
            runtime,
            config,
        }
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Rc<StdIdleScheduler> {
        Rc::clone(&self.scheduler)
    }

    pub fn config(&self) -> &StdRuntimeConfig {
        &self.config
    }

    /// Returns whether an idle callback was requested since the last poll.
    pub fn take_idle_request(&self) -> bool {
        self.scheduler.take_idle_request()
    }

    pub fn set_idle_waker(&self, waker: impl Fn() + 'static) {
        self.scheduler.set_idle_waker(waker);
    }

    pub fn clear_idle_waker(&self) {
        self.scheduler.clear_idle_waker();
    }

    /// A fresh deadline for one slice.
    pub fn deadline(&self) -> StdDeadline {
        StdDeadline::new(self.config.slice_budget)
    }

    /// Creates a root over `host` that schedules through this runtime.
    pub fn mount<H: Host>(&self, host: H, container: NodeId) -> FiberRoot<H> {
        FiberRoot::with_runtime(host, container, self.runtime()).with_config(self.config.work_loop)
    }

    /// Performs one idle period: if an idle callback was requested, runs a
    /// single work-loop slice against a fresh deadline. Returns `None` when
    /// nothing was requested.
    pub fn tick<H: Host>(
        &self,
        root: &mut FiberRoot<H>,
    ) -> Result<Option<WorkStatus>, RenderError> {
        if !self.take_idle_request() {
            return Ok(None);
        }
        let deadline = self.deadline();
        let status = root.work_loop(&deadline)?;
        log::trace!(
            "idle slice finished with {:?} left: {status:?}",
            deadline.time_remaining()
        );
        Ok(Some(status))
    }

    /// Ticks until `root` has nothing pending. Returns how many commits
    /// happened.
    pub fn run_until_idle<H: Host>(&self, root: &mut FiberRoot<H>) -> Result<usize, RenderError> {
        let mut commits = 0;
        while root.has_pending_work() {
            match self.tick(root)? {
                Some(WorkStatus::Committed(_)) => commits += 1,
                Some(_) => {}
                // The embedder already consumed the request.
                None => self.scheduler.request_idle_callback(),
            }
        }
        Ok(commits)
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}
