use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::hooks::{HookId, Updater};
use crate::platform::IdleScheduler;

/// A state change posted by a [`crate::StateSetter`], waiting for the next
/// work-loop slice.
#[derive(Debug)]
pub(crate) struct StateUpdate {
    pub(crate) hook: HookId,
    pub(crate) updater: Updater,
}

struct RuntimeInner {
    scheduler: Rc<dyn IdleScheduler>,
    needs_work: Cell<bool>,
    state_updates: RefCell<VecDeque<StateUpdate>>,
}

impl RuntimeInner {
    fn new(scheduler: Rc<dyn IdleScheduler>) -> Self {
        Self {
            scheduler,
            needs_work: Cell::new(false),
            state_updates: RefCell::new(VecDeque::new()),
        }
    }

    fn schedule(&self) {
        self.needs_work.set(true);
        self.scheduler.request_idle_callback();
    }

    fn enqueue_state_update(&self, update: StateUpdate) {
        self.state_updates.borrow_mut().push_back(update);
        self.schedule();
    }

    fn take_state_updates(&self) -> Vec<StateUpdate> {
        self.state_updates.borrow_mut().drain(..).collect()
    }

    fn has_state_updates(&self) -> bool {
        !self.state_updates.borrow().is_empty()
    }
}

/// Owner of the scheduler seam and the single-consumer state-update queue.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Rc<dyn IdleScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    /// Marks work as pending and asks the host for an idle callback.
    pub fn schedule(&self) {
        self.inner.schedule();
    }

    /// Re-arms the host idle callback without claiming new work.
    pub(crate) fn request_idle_callback(&self) {
        self.inner.scheduler.request_idle_callback();
    }

    pub fn needs_work(&self) -> bool {
        self.inner.needs_work.get()
    }

    pub fn set_needs_work(&self, value: bool) {
        self.inner.needs_work.set(value);
    }

    pub fn has_state_updates(&self) -> bool {
        self.inner.has_state_updates()
    }

    pub(crate) fn take_state_updates(&self) -> Vec<StateUpdate> {
        self.inner.take_state_updates()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("needs_work", &self.needs_work())
            .field("state_updates", &self.inner.state_updates.borrow().len())
            .finish()
    }
}

/// Scheduler that ignores idle requests; the embedder drives the loop.
#[derive(Debug, Default)]
pub struct DefaultScheduler;

impl IdleScheduler for DefaultScheduler {
    fn request_idle_callback(&self) {}
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct TestScheduler {
    requests: Cell<usize>,
}

#[cfg(test)]
impl TestScheduler {
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

#[cfg(test)]
impl IdleScheduler for TestScheduler {
    fn request_idle_callback(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

/// Non-owning handle captured by state setters.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn schedule(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.schedule();
        }
    }

    pub(crate) fn enqueue_state_update(&self, update: StateUpdate) {
        match self.0.upgrade() {
            Some(inner) => inner.enqueue_state_update(update),
            None => log::debug!("runtime dropped; discarding update for {:?}", update.hook),
        }
    }

    pub fn has_state_updates(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_state_updates())
            .unwrap_or(false)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
