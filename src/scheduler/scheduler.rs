//! # Scheduler: periodic tasks with reserve- and budget-gated admission.
//!
//! The [`Scheduler`] owns the task registry of one kernel. Once per cycle the host
//! calls [`Scheduler::run`], which executes a best-effort subset of the due tasks.
//!
//! ## Pass
//! ```text
//! run(budget)
//!   snapshot due tasks (tier desc, registration order)
//!   for each task:
//!     ├─► still registered and still due?            no  ─► ignore
//!     ├─► AdmissionWindow::evaluate
//!     │     ├─ Skip   ─► skipped   (last_run unchanged)
//!     │     ├─ Defer  ─► deferred  (last_run unchanged)
//!     │     └─ Admit
//!     └─► run_guarded(task.run())
//!           ├─ Ok   ─► executed, last_run = cycle, spent += cost
//!           └─ Err  ─► failed,   last_run = cycle   (waits a full interval)
//! ```
//!
//! ## Rules
//! - Tasks registered during a pass wait for the next pass.
//! - Tasks unregistered during a pass (including by themselves) are not run.
//! - No registry borrow is held while a task body runs, so bodies may freely
//!   register, unregister or reset tasks through a cloned handle.
//! - A nested `run` from inside a task body is refused and returns an empty report.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::core::Config;
use crate::core::clock::Clock;
use crate::core::runner::run_guarded;
use crate::error::RegistrationError;
use crate::policies::{Admission, AdmissionRequest, AdmissionWindow};
use crate::scheduler::registry::{DueTask, TaskRegistry};
use crate::scheduler::report::{TaskInfo, TickReport};
use crate::tasks::{TaskRef, TaskSpec};

#[derive(Debug, Default)]
struct SchedulerState {
    registry: TaskRegistry,
    last_report: TickReport,
}

/// Cheap-clone handle to a kernel's task scheduler.
///
/// All clones share one registry. Obtain it from [`Kernel::scheduler`](crate::Kernel::scheduler).
#[derive(Clone)]
pub struct Scheduler {
    state: Rc<RefCell<SchedulerState>>,
    running: Rc<Cell<bool>>,
    clock: Clock,
    config: Rc<Config>,
}

/// Clears the running flag when a pass ends, including by unwinding.
struct PassGuard<'a>(&'a Cell<bool>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Scheduler {
    pub(crate) fn new(clock: Clock, config: Rc<Config>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SchedulerState::default())),
            running: Rc::new(Cell::new(false)),
            clock,
            config,
        }
    }

    /// Registers `spec`, replacing any task with the same id.
    ///
    /// A replaced task keeps its position in registration order and becomes due
    /// on the next pass.
    ///
    /// ### Errors
    /// [`RegistrationError`] for an empty id, an interval below 1 or an invalid cost.
    pub fn register(&self, spec: TaskSpec) -> Result<(), RegistrationError> {
        spec.validate()?;
        let id = spec.name().to_string();
        let priority = spec.priority();
        let interval = spec.interval();
        let replaced = self.state.borrow_mut().registry.insert(spec);
        debug!(task = %id, %priority, interval, replaced, "task registered");
        Ok(())
    }

    /// Removes a task. Returns `false` if it was not registered.
    pub fn unregister(&self, id: &str) -> bool {
        let removed = self.state.borrow_mut().registry.remove(id);
        if removed {
            debug!(task = %id, "task unregistered");
        }
        removed
    }

    /// Removes every task.
    pub fn clear(&self) {
        self.state.borrow_mut().registry.clear();
    }

    /// Returns `true` if a task with `id` is registered.
    pub fn has_task(&self, id: &str) -> bool {
        self.state.borrow().registry.contains(id)
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.state.borrow().registry.len()
    }

    /// Returns `true` if no task is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Describes registered tasks in registration order.
    pub fn tasks(&self) -> Vec<TaskInfo> {
        self.state
            .borrow()
            .registry
            .iter()
            .map(|e| TaskInfo {
                id: e.spec.name().to_string(),
                priority: e.spec.priority(),
                interval: e.spec.interval(),
                cost: e.spec.cost(),
                min_reserve: e.spec.min_reserve(),
                last_run: e.last_run,
            })
            .collect()
    }

    /// Describes one task.
    pub fn task(&self, id: &str) -> Option<TaskInfo> {
        self.tasks().into_iter().find(|t| t.id == id)
    }

    /// Clears a task's last run so it is due on the next pass.
    /// Returns `false` if it was not registered.
    pub fn reset_task(&self, id: &str) -> bool {
        match self.state.borrow_mut().registry.get_mut(id) {
            Some(entry) => {
                entry.last_run = None;
                true
            }
            None => false,
        }
    }

    /// Report of the most recent pass.
    pub fn last_report(&self) -> TickReport {
        self.state.borrow().last_report.clone()
    }

    /// Runs one scheduler pass for the current cycle.
    ///
    /// `total_budget` caps the summed cost of tasks run in this pass; `None`
    /// disables the budget gate. Negative or NaN budgets are treated as `0`.
    /// `Critical` tasks bypass both gates but still consume budget.
    ///
    /// Never fails: task faults are logged and counted in the report.
    pub fn run(&self, total_budget: Option<f64>) -> TickReport {
        let cycle = self.clock.cycle();
        let reserve = self.clock.reserve();
        let budget = total_budget.map(|b| b.max(0.0));

        if self.running.replace(true) {
            warn!(cycle, "scheduler pass already in progress; nested run ignored");
            return TickReport::new(cycle, reserve, budget);
        }
        let _guard = PassGuard(&self.running);

        let due = self.state.borrow().registry.due(cycle);
        let mut report = TickReport::new(cycle, reserve, budget);
        let mut window = AdmissionWindow::new(reserve, budget);

        for item in due {
            let Some((task, req)) = self.admission_request(&item, cycle) else {
                continue;
            };

            match window.evaluate(&req) {
                Admission::Skip { required } => {
                    debug!(task = %item.id, priority = %req.priority, reserve, required, "task skipped by reserve gate");
                    report.skipped.push(item.id);
                }
                Admission::Defer { needed, budget } => {
                    debug!(task = %item.id, priority = %req.priority, needed, budget, "task deferred by budget gate");
                    report.deferred.push(item.id);
                }
                Admission::Admit => {
                    let outcome = run_guarded(|| task.run());
                    self.mark_ran(&item, cycle);
                    match outcome {
                        Ok(()) => {
                            window.charge(req.cost);
                            report.executed_by_priority.bump(req.priority);
                            report.executed.push(item.id);
                        }
                        Err(error) => {
                            warn!(task = %item.id, label = error.as_label(), %error, "task failed");
                            report.failed.push(item.id);
                        }
                    }
                }
            }
        }

        report.cost_spent = window.spent;
        report.total_tasks = self.len();
        trace!(
            cycle,
            executed = report.executed_count(),
            skipped = report.skipped_count(),
            deferred = report.deferred_count(),
            failed = report.failed_count(),
            "scheduler pass finished"
        );
        self.state.borrow_mut().last_report = report.clone();
        report
    }

    /// Runs a task now, bypassing interval, reserve and budget gates.
    ///
    /// Returns `true` if the task ran successfully. An unknown id returns `false`
    /// and changes nothing; a failing run returns `false` and still records the run.
    pub fn force_run(&self, id: &str) -> bool {
        let found = self
            .state
            .borrow()
            .registry
            .get(id)
            .map(|e| (e.spec.task().clone(), e.generation));
        let Some((task, generation)) = found else {
            debug!(task = %id, "force run of unknown task ignored");
            return false;
        };

        let cycle = self.clock.cycle();
        let outcome = run_guarded(|| task.run());
        self.mark_ran_as(id, generation, cycle);
        match outcome {
            Ok(()) => {
                debug!(task = %id, cycle, "task force-run");
                true
            }
            Err(error) => {
                warn!(task = %id, label = error.as_label(), %error, "forced task failed");
                false
            }
        }
    }

    /// Re-reads a snapshotted task; `None` if it vanished, was replaced by a new
    /// registration, or already ran this cycle. A replaced task waits for the next pass.
    fn admission_request(&self, item: &DueTask, cycle: u64) -> Option<(TaskRef, AdmissionRequest)> {
        let state = self.state.borrow();
        let entry = state.registry.get(&item.id)?;
        if entry.generation != item.generation || !entry.is_due(cycle) {
            return None;
        }
        let priority = entry.spec.priority();
        let min_reserve = entry
            .spec
            .min_reserve()
            .unwrap_or_else(|| self.config.thresholds.min_reserve(priority));
        Some((
            entry.spec.task().clone(),
            AdmissionRequest {
                priority,
                min_reserve,
                cost: entry.spec.cost(),
            },
        ))
    }

    fn mark_ran(&self, item: &DueTask, cycle: u64) {
        self.mark_ran_as(&item.id, item.generation, cycle);
    }

    /// Records the run only if `id` still holds the definition that ran.
    fn mark_ran_as(&self, id: &str, generation: u64, cycle: u64) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.registry.get_mut(id) {
            if entry.generation == generation {
                entry.last_run = Some(cycle);
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.len())
            .field("cycle", &self.clock.cycle())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::core::budget::BudgetReading;
    use crate::error::WorkError;
    use crate::policies::Priority;
    use crate::tasks::TaskFn;

    type Log = Rc<RefCell<Vec<String>>>;

    fn setup() -> (Scheduler, Clock) {
        let clock = Clock::new();
        let sched = Scheduler::new(clock.clone(), Rc::new(Config::default()));
        (sched, clock)
    }

    fn recording(log: &Log, name: &'static str) -> TaskRef {
        let log = log.clone();
        TaskFn::rc(name, move || -> Result<(), WorkError> {
            log.borrow_mut().push(name.to_string());
            Ok(())
        })
    }

    fn full(clock: &Clock) {
        clock.advance(BudgetReading::new(100.0, 10_000));
    }

    #[test]
    fn runs_every_tier_in_order_with_registration_tie_break() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        for (name, priority) in [
            ("bg", Priority::Background),
            ("n1", Priority::Normal),
            ("crit", Priority::Critical),
            ("n2", Priority::Normal),
            ("high", Priority::High),
            ("low", Priority::Low),
        ] {
            sched
                .register(TaskSpec::new(recording(&log, name), priority, 1))
                .unwrap();
        }

        full(&clock);
        let report = sched.run(None);
        let expected = vec!["crit", "high", "n1", "n2", "low", "bg"];
        assert_eq!(*log.borrow(), expected);
        assert_eq!(report.executed, expected);
        assert_eq!(report.total_tasks, 6);
        assert_eq!(report.executed_by_priority.get(Priority::Normal), 2);
    }

    #[test]
    fn interval_spacing_and_first_run() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        sched
            .register(TaskSpec::new(recording(&log, "every3"), Priority::Normal, 3))
            .unwrap();

        let mut ran_at = Vec::new();
        for _ in 0..7 {
            full(&clock);
            if sched.run(None).executed_count() == 1 {
                ran_at.push(clock.cycle());
            }
        }
        assert_eq!(ran_at, vec![1, 4, 7]);
    }

    #[test]
    fn failing_task_advances_last_run_and_does_not_block_others() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        sched
            .register(TaskSpec::new(
                TaskFn::rc("boom", || -> Result<(), WorkError> { panic!("exploded") }),
                Priority::High,
                2,
            ))
            .unwrap();
        sched
            .register(TaskSpec::new(
                TaskFn::rc("err", || Err::<(), _>(WorkError::fail("nope"))),
                Priority::High,
                1,
            ))
            .unwrap();
        sched
            .register(TaskSpec::new(recording(&log, "later"), Priority::Low, 1))
            .unwrap();

        full(&clock);
        let report = sched.run(None);
        assert_eq!(report.failed, vec!["boom", "err"]);
        assert_eq!(report.executed, vec!["later"]);
        assert_eq!(sched.task("boom").unwrap().last_run, Some(1));
        assert!(sched.has_task("boom"));

        full(&clock);
        let report = sched.run(None);
        assert!(!report.failed.contains(&"boom".to_string()));
        assert_eq!(report.failed, vec!["err"]);
    }

    #[test]
    fn reserve_gate_skips_without_touching_last_run() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        sched
            .register(TaskSpec::new(recording(&log, "crit"), Priority::Critical, 1))
            .unwrap();
        sched
            .register(TaskSpec::new(recording(&log, "normal"), Priority::Normal, 1))
            .unwrap();

        clock.advance(BudgetReading::new(10.0, 0));
        let report = sched.run(None);
        assert_eq!(report.executed, vec!["crit"]);
        assert_eq!(report.skipped, vec!["normal"]);
        assert_eq!(sched.task("normal").unwrap().last_run, None);

        clock.advance(BudgetReading::new(10.0, 3_000));
        let report = sched.run(None);
        assert_eq!(report.executed, vec!["crit", "normal"]);
    }

    #[test]
    fn budget_admits_floor_of_budget_over_cost() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        for name in ["a", "b", "c", "d", "e"] {
            sched
                .register(TaskSpec::new(recording(&log, name), Priority::Normal, 1).with_cost(3.0))
                .unwrap();
        }

        full(&clock);
        let report = sched.run(Some(10.0));
        assert_eq!(report.executed, vec!["a", "b", "c"]);
        assert_eq!(report.deferred, vec!["d", "e"]);
        assert_eq!(report.cost_spent, 9.0);
        assert_eq!(sched.task("d").unwrap().last_run, None);
    }

    #[test]
    fn deferral_does_not_block_cheaper_tasks() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        sched
            .register(TaskSpec::new(recording(&log, "big"), Priority::High, 1).with_cost(8.0))
            .unwrap();
        sched
            .register(TaskSpec::new(recording(&log, "small"), Priority::Low, 1).with_cost(1.0))
            .unwrap();

        full(&clock);
        let report = sched.run(Some(5.0));
        assert_eq!(report.deferred, vec!["big"]);
        assert_eq!(report.executed, vec!["small"]);
    }

    #[test]
    fn critical_consumes_budget_but_bypasses_gate() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        sched
            .register(TaskSpec::new(recording(&log, "crit"), Priority::Critical, 1).with_cost(6.0))
            .unwrap();
        sched
            .register(TaskSpec::new(recording(&log, "n"), Priority::Normal, 1).with_cost(1.0))
            .unwrap();

        full(&clock);
        let report = sched.run(Some(5.0));
        assert_eq!(report.executed, vec!["crit"]);
        assert_eq!(report.deferred, vec!["n"]);
    }

    #[test]
    fn task_may_unregister_itself_and_others() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        let handle = sched.clone();
        sched
            .register(TaskSpec::new(
                TaskFn::rc("janitor", move || -> Result<(), WorkError> {
                    handle.unregister("janitor");
                    handle.unregister("victim");
                    Ok(())
                }),
                Priority::High,
                1,
            ))
            .unwrap();
        sched
            .register(TaskSpec::new(recording(&log, "victim"), Priority::Low, 1))
            .unwrap();

        full(&clock);
        let report = sched.run(None);
        assert_eq!(report.executed, vec!["janitor"]);
        assert!(log.borrow().is_empty());
        assert!(sched.is_empty());
        assert_eq!(report.total_tasks, 0);
    }

    #[test]
    fn tasks_registered_mid_pass_wait_for_next_pass() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        let handle = sched.clone();
        let spawned = recording(&log, "spawned");
        sched
            .register(TaskSpec::new(
                TaskFn::rc("spawner", move || {
                    handle
                        .register(TaskSpec::new(spawned.clone(), Priority::Critical, 1))
                        .map_err(|e| WorkError::fail(e.to_string()))
                }),
                Priority::Normal,
                100,
            ))
            .unwrap();

        full(&clock);
        assert_eq!(sched.run(None).executed, vec!["spawner"]);
        full(&clock);
        assert_eq!(sched.run(None).executed, vec!["spawned"]);
    }

    #[test]
    fn nested_run_is_refused() {
        let (sched, clock) = setup();
        let handle = sched.clone();
        let nested = Rc::new(Cell::new(usize::MAX));
        let seen = nested.clone();
        sched
            .register(TaskSpec::from_task(TaskFn::rc("outer", move || -> Result<(), WorkError> {
                seen.set(handle.run(None).executed_count());
                Ok(())
            })))
            .unwrap();

        full(&clock);
        assert_eq!(sched.run(None).executed, vec!["outer"]);
        assert_eq!(nested.get(), 0);
    }

    #[test]
    fn force_run_and_reset() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        sched
            .register(
                TaskSpec::new(recording(&log, "bg"), Priority::Background, 50).with_cost(99.0),
            )
            .unwrap();

        clock.advance(BudgetReading::new(0.0, 0));
        assert!(!sched.force_run("missing"));
        assert!(sched.force_run("bg"));
        assert_eq!(sched.task("bg").unwrap().last_run, Some(1));
        assert_eq!(*log.borrow(), vec!["bg"]);

        full(&clock);
        assert_eq!(sched.run(None).executed_count(), 0);
        assert!(sched.reset_task("bg"));
        assert!(!sched.reset_task("missing"));
        assert_eq!(sched.run(None).executed, vec!["bg"]);
    }

    #[test]
    fn register_rejects_zero_interval() {
        let (sched, _clock) = setup();
        let log: Log = Rc::default();
        let err = sched
            .register(TaskSpec::new(recording(&log, "bad"), Priority::Normal, 0))
            .unwrap_err();
        assert_eq!(err.as_label(), "registration_invalid_interval");
        assert!(!sched.has_task("bad"));
    }

    #[test]
    fn last_report_is_replaced_each_pass() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        sched
            .register(TaskSpec::new(recording(&log, "once"), Priority::Normal, 10))
            .unwrap();

        full(&clock);
        sched.run(None);
        assert_eq!(sched.last_report().executed_count(), 1);
        full(&clock);
        sched.run(None);
        assert_eq!(sched.last_report().executed_count(), 0);
        assert_eq!(sched.last_report().cycle, 2);
    }

    #[test]
    fn task_re_registering_itself_keeps_the_reset() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        let inner = sched.clone();
        let next = recording(&log, "self");
        sched
            .register(TaskSpec::new(
                TaskFn::rc("self", move || -> Result<(), WorkError> {
                    inner
                        .register(TaskSpec::new(next.clone(), Priority::Normal, 100))
                        .map_err(|e| WorkError::fail(e.to_string()))
                }),
                Priority::Normal,
                100,
            ))
            .unwrap();

        full(&clock);
        assert_eq!(sched.run(None).executed, vec!["self"]);
        assert_eq!(sched.task("self").unwrap().last_run, None);

        full(&clock);
        assert_eq!(sched.run(None).executed, vec!["self"]);
        assert_eq!(*log.borrow(), vec!["self"]);
        assert_eq!(sched.task("self").unwrap().last_run, Some(2));
    }

    #[test]
    fn task_replaced_mid_pass_waits_for_the_next_pass() {
        let (sched, clock) = setup();
        let log: Log = Rc::default();
        let inner = sched.clone();
        let demoted = recording(&log, "victim");
        let replacer_log = log.clone();
        sched
            .register(TaskSpec::new(
                TaskFn::rc("replacer", move || -> Result<(), WorkError> {
                    replacer_log.borrow_mut().push("replacer".to_string());
                    inner
                        .register(TaskSpec::new(demoted.clone(), Priority::Background, 100))
                        .map_err(|e| WorkError::fail(e.to_string()))
                }),
                Priority::High,
                100,
            ))
            .unwrap();
        sched
            .register(TaskSpec::new(recording(&log, "victim"), Priority::High, 100))
            .unwrap();
        sched
            .register(TaskSpec::new(recording(&log, "other-normal"), Priority::Normal, 100))
            .unwrap();

        full(&clock);
        let report = sched.run(None);
        assert_eq!(report.executed, vec!["replacer", "other-normal"]);
        assert_eq!(sched.task("victim").unwrap().priority, Priority::Background);
        assert_eq!(sched.task("victim").unwrap().last_run, None);

        full(&clock);
        assert_eq!(sched.run(None).executed, vec!["victim"]);
        assert_eq!(*log.borrow(), vec!["replacer", "other-normal", "victim"]);
    }
}
