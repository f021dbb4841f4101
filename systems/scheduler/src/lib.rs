#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deferred continuation scheduler driven by simulated time.
//!
//! Scheduling never blocks: [`Scheduler::schedule`] records a continuation
//! together with its deadline and returns immediately. The owner of the
//! simulation loop calls [`Scheduler::advance`] with the elapsed time, which
//! runs every continuation whose deadline has been reached. Outstanding
//! continuations are independent of one another.

use std::{
    cell::{Cell, RefCell},
    fmt,
    time::Duration,
};

use log::trace;

type Continuation = Box<dyn FnOnce()>;

/// Handle identifying a scheduled continuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

impl TaskHandle {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

struct Task {
    handle: TaskHandle,
    deadline: Duration,
    continuation: Continuation,
}

/// Clock plus queue of continuations waiting for their deadline.
///
/// Shared through `Rc` handles; all methods take `&self` so continuations may
/// schedule further work while the scheduler is advancing.
#[derive(Default)]
pub struct Scheduler {
    now: Cell<Duration>,
    next_handle: Cell<u64>,
    tasks: RefCell<Vec<Task>>,
}

impl Scheduler {
    /// Creates a scheduler whose clock starts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current reading of the scheduler clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Runs `continuation` once `delay` of simulated time has elapsed.
    pub fn schedule(&self, delay: Duration, continuation: impl FnOnce() + 'static) -> TaskHandle {
        let handle = TaskHandle(self.next_handle.get());
        self.next_handle.set(handle.0.wrapping_add(1));
        let deadline = self.now.get().saturating_add(delay);
        self.tasks.borrow_mut().push(Task {
            handle,
            deadline,
            continuation: Box::new(continuation),
        });
        trace!("task {} scheduled for {deadline:?}", handle.0);
        handle
    }

    /// Advances the clock by `dt` and runs every continuation that became due.
    ///
    /// Due continuations run in deadline order, ties broken by scheduling
    /// order. Returns the number of continuations that ran.
    pub fn advance(&self, dt: Duration) -> usize {
        let now = self.now.get().saturating_add(dt);
        self.now.set(now);

        let mut completed = 0;
        while let Some(task) = self.take_next_due(now) {
            trace!("task {} running at {now:?}", task.handle.0);
            (task.continuation)();
            completed += 1;
        }
        completed
    }

    /// Whether the continuation identified by `handle` is still waiting.
    #[must_use]
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.borrow().iter().any(|task| task.handle == handle)
    }

    /// Number of continuations still waiting for their deadline.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.tasks.borrow().len()
    }

    fn take_next_due(&self, now: Duration) -> Option<Task> {
        let mut tasks = self.tasks.borrow_mut();
        let index = tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.deadline <= now)
            .min_by_key(|(_, task)| (task.deadline, task.handle))
            .map(|(index, _)| index)?;
        Some(tasks.remove(index))
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now.get())
            .field("pending", &self.pending_count())
            .finish()
    }
}
