//! Hook state cells and the `use_state` primitive.
//!
//! Each component fiber owns an ordered list of [`HookId`]s. While a
//! component renders, its render context is installed on a thread-local
//! stack so [`use_state`] can find the previous generation's cell at the same
//! position, seed a new cell from it and replay the updaters queued there.
//!
//! Hooks are matched purely by call order: a component must call them
//! unconditionally and in the same order on every render.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::thread_local;

use slotmap::SlotMap;

use crate::runtime::{RuntimeHandle, StateUpdate};

slotmap::new_key_type! {
    pub struct HookId;
}

/// Type-erased `Box<dyn Fn(&T) -> T>`; shared so a queue can be replayed by
/// more than one render attempt.
#[derive(Clone)]
pub(crate) struct Updater(Rc<dyn Any>);

type UpdateFn<T> = Box<dyn Fn(&T) -> T>;

impl Updater {
    fn new<T: 'static>(update: impl Fn(&T) -> T + 'static) -> Self {
        let boxed: UpdateFn<T> = Box::new(update);
        Self(Rc::new(boxed))
    }

    fn apply<T: 'static>(&self, state: &T) -> Option<T> {
        self.0
            .downcast_ref::<UpdateFn<T>>()
            .map(|update| update(state))
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Updater")
    }
}

pub(crate) struct HookCell {
    state: Box<dyn Any>,
    queue: Vec<Updater>,
}

#[derive(Default)]
pub(crate) struct HookStore {
    cells: SlotMap<HookId, HookCell>,
}

impl HookStore {
    /// Appends `updater` to a live cell. Returns false when the cell has
    /// already been released.
    pub(crate) fn enqueue(&mut self, id: HookId, updater: Updater) -> bool {
        match self.cells.get_mut(id) {
            Some(cell) => {
                cell.queue.push(updater);
                true
            }
            None => false,
        }
    }

    /// Moves the queue of `from` onto the end of `to`'s queue.
    pub(crate) fn transfer(&mut self, from: HookId, to: HookId) {
        let Some(moved) = self.cells.get_mut(from).map(|cell| std::mem::take(&mut cell.queue))
        else {
            return;
        };
        if let Some(target) = self.cells.get_mut(to) {
            target.queue.extend(moved);
        }
    }

    pub(crate) fn release(&mut self, id: HookId) {
        self.cells.remove(id);
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    #[cfg(test)]
    pub(crate) fn queued(&self, id: HookId) -> usize {
        self.cells.get(id).map_or(0, |cell| cell.queue.len())
    }

    fn seed<T: Clone + 'static>(&self, id: HookId) -> Option<Result<(T, Vec<Updater>), ()>> {
        let cell = self.cells.get(id)?;
        Some(
            cell.state
                .downcast_ref::<T>()
                .map(|state| (state.clone(), cell.queue.clone()))
                .ok_or(()),
        )
    }

    fn insert<T: 'static>(&mut self, state: T) -> HookId {
        self.cells.insert(HookCell {
            state: Box::new(state),
            queue: Vec::new(),
        })
    }
}

impl fmt::Debug for HookStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookStore")
            .field("cells", &self.cells.len())
            .finish()
    }
}

/// Everything `use_state` needs while one component renders.
pub(crate) struct RenderContext {
    component: &'static str,
    store: Rc<RefCell<HookStore>>,
    runtime: RuntimeHandle,
    previous: Vec<HookId>,
    hooks: Vec<HookId>,
}

impl RenderContext {
    pub(crate) fn new(
        component: &'static str,
        store: Rc<RefCell<HookStore>>,
        runtime: RuntimeHandle,
        previous: Vec<HookId>,
    ) -> Self {
        Self {
            component,
            store,
            runtime,
            previous,
            hooks: Vec::new(),
        }
    }
}

thread_local! {
    static CURRENT_RENDER: RefCell<Vec<RenderContext>> = const { RefCell::new(Vec::new()) };
}

struct Installed;

impl Drop for Installed {
    fn drop(&mut self) {
        CURRENT_RENDER.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Runs `render` with `context` installed and returns its result together
/// with the hook cells it allocated, in call order.
pub(crate) fn render_with_hooks<R>(
    context: RenderContext,
    render: impl FnOnce() -> R,
) -> (R, Vec<HookId>) {
    CURRENT_RENDER.with(|stack| stack.borrow_mut().push(context));
    let installed = Installed;
    let result = render();
    let hooks = CURRENT_RENDER.with(|stack| {
        stack
            .borrow_mut()
            .last_mut()
            .map(|context| std::mem::take(&mut context.hooks))
            .unwrap_or_default()
    });
    drop(installed);
    (result, hooks)
}

/// Returns the current value of this call site's state cell and a setter
/// for it.
///
/// On the first render the cell starts at `initial`. Afterwards the value is
/// carried over from the previous generation with every queued updater
/// applied in enqueue order.
///
/// # Panics
///
/// Panics when called outside a component render, or when the cell at this
/// position holds a different type than on the previous render (hook order
/// changed).
pub fn use_state<T: Clone + 'static>(initial: T) -> (T, StateSetter<T>) {
    let (component, index, store, runtime, previous) = CURRENT_RENDER.with(|stack| {
        let stack = stack.borrow();
        let Some(context) = stack.last() else {
            panic!("use_state called outside of a component render");
        };
        let index = context.hooks.len();
        (
            context.component,
            index,
            Rc::clone(&context.store),
            context.runtime.clone(),
            context.previous.get(index).copied(),
        )
    });

    let seeded = previous.and_then(|id| store.borrow().seed::<T>(id));
    let (mut state, queue) = match seeded {
        Some(Ok(seed)) => seed,
        Some(Err(())) => panic!(
            "hook {index} of {component} changed type between renders; hooks must be called in the same order every render"
        ),
        None => (initial, Vec::new()),
    };
    for updater in &queue {
        match updater.apply(&state) {
            Some(next) => state = next,
            None => panic!("hook {index} of {component} received an updater for another type"),
        }
    }

    let id = store.borrow_mut().insert(state.clone());
    CURRENT_RENDER.with(|stack| {
        if let Some(context) = stack.borrow_mut().last_mut() {
            context.hooks.push(id);
        }
    });
    (state, StateSetter::new(id, runtime))
}

/// Queues updates for one state cell.
///
/// Calling the setter never touches the tree directly: the update is posted
/// to the runtime and applied at the start of the next work-loop slice, which
/// then re-renders from the committed root.
pub struct StateSetter<T> {
    hook: HookId,
    runtime: RuntimeHandle,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            hook: self.hook,
            runtime: self.runtime.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter").field("hook", &self.hook).finish()
    }
}

impl<T: 'static> StateSetter<T> {
    fn new(hook: HookId, runtime: RuntimeHandle) -> Self {
        Self {
            hook,
            runtime,
            _marker: PhantomData,
        }
    }

    pub fn hook_id(&self) -> HookId {
        self.hook
    }

    pub fn update(&self, update: impl Fn(&T) -> T + 'static) {
        self.runtime.enqueue_state_update(StateUpdate {
            hook: self.hook,
            updater: Updater::new(update),
        });
    }
}

impl<T: Clone + 'static> StateSetter<T> {
    pub fn set(&self, value: T) {
        self.update(move |_| value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Runtime, TestScheduler};

    fn context(store: &Rc<RefCell<HookStore>>, runtime: &Runtime, previous: Vec<HookId>) -> RenderContext {
        RenderContext::new("Test", Rc::clone(store), runtime.handle(), previous)
    }

    #[test]
    fn first_render_uses_initial_values_in_call_order() {
        let store = Rc::new(RefCell::new(HookStore::default()));
        let runtime = Runtime::new(Rc::new(TestScheduler::default()));
        let ((a, b), hooks) = render_with_hooks(context(&store, &runtime, Vec::new()), || {
            (use_state(1).0, use_state("x").0)
        });
        assert_eq!((a, b), (1, "x"));
        assert_eq!(hooks.len(), 2);
        assert_eq!(store.borrow().len(), 2);
    }

    #[test]
    fn queued_updaters_replay_without_being_consumed() {
        let store = Rc::new(RefCell::new(HookStore::default()));
        let runtime = Runtime::new(Rc::new(TestScheduler::default()));
        let (setter, hooks) = render_with_hooks(context(&store, &runtime, Vec::new()), || {
            use_state(1).1
        });
        setter.update(|n| n + 1);
        setter.update(|n| n * 10);
        for update in runtime.take_state_updates() {
            assert!(store.borrow_mut().enqueue(update.hook, update.updater));
        }

        for _ in 0..2 {
            let (value, _) = render_with_hooks(context(&store, &runtime, hooks.clone()), || {
                use_state(1).0
            });
            assert_eq!(value, 20);
        }
        assert_eq!(store.borrow().queued(hooks[0]), 2);
    }

    #[test]
    #[should_panic(expected = "outside of a component render")]
    fn use_state_outside_render_panics() {
        let _ = use_state(0);
    }

    #[test]
    #[should_panic(expected = "changed type between renders")]
    fn reordered_hooks_fail_fast() {
        let store = Rc::new(RefCell::new(HookStore::default()));
        let runtime = Runtime::new(Rc::new(TestScheduler::default()));
        let (_, hooks) = render_with_hooks(context(&store, &runtime, Vec::new()), || {
            use_state(1);
        });
        render_with_hooks(context(&store, &runtime, hooks), || {
            use_state(String::from("oops"));
        });
    }

    #[test]
    fn context_is_uninstalled_after_a_panicking_render() {
        let store = Rc::new(RefCell::new(HookStore::default()));
        let runtime = Runtime::new(Rc::new(TestScheduler::default()));
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            render_with_hooks(context(&store, &runtime, Vec::new()), || panic!("boom"))
        }));
        assert!(outcome.is_err());
        CURRENT_RENDER.with(|stack| assert!(stack.borrow().is_empty()));
    }
}
