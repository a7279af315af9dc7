use super::{
    event::SchedEvent,
    observer::Observer,
    state::{SimCtx, Slice, Task, TaskId, Ticks, Timeslice},
};
use crate::scheduler::{DispatchError, ENQ_PREEMPT, ENQ_REENQ, ENQ_WAKEUP, EnqueueFlags, Scheduler};
use crate::sim::job::Job;

// Final state of a run, handed to the metrics reducer and report builder
#[derive(Debug)]
pub struct RunOutcome {
    pub algorithm: &'static str,
    pub tasks: Vec<Task>,
    pub timeline: Vec<Slice>,
    pub end: Ticks,
    pub events: Vec<SchedEvent>,
}

pub struct SchedCore<S: Scheduler> {
    pub ctx: SimCtx,
    pub scheduler: S,
    observer: Observer,
    // Task ids sorted by (arrival, input order)
    arrivals: Vec<TaskId>,
    arrival_cursor: usize,
    record_events: bool,
    events: Vec<SchedEvent>,
}

impl<S: Scheduler> SchedCore<S> {
    pub fn new(jobs: &[Job], config: S::Config) -> Self {
        let mut ctx = SimCtx::new(jobs);
        let scheduler = S::init(&mut ctx, config);

        let mut arrivals: Vec<TaskId> = (0..ctx.tasks.len()).collect();
        arrivals.sort_by_key(|&id| ctx.task(id).arrival);

        Self {
            ctx,
            scheduler,
            observer: Observer::new(),
            arrivals,
            arrival_cursor: 0,
            record_events: false,
            events: Vec::new(),
        }
    }

    // Keep every event for the caller in addition to logging it
    pub fn record_events(mut self, record: bool) -> Self {
        self.record_events = record;
        self
    }

    // One dispatch cycle; false once there is nothing left to run
    pub fn step(&mut self) -> bool {
        self.handle_arrivals();

        let task = match self.scheduler.dispatch(&mut self.ctx) {
            Ok(task) => task,
            Err(DispatchError::NoRunnableTask) => match self.next_arrival() {
                Some(at) => {
                    let from = self.ctx.now;
                    self.ctx.advance_to(at);
                    self.emit(SchedEvent::CpuIdle { from, to: at });
                    return true;
                }
                None => return false,
            },
        };

        self.run_task(task);
        self.observer.observe(&self.ctx);
        true
    }

    pub fn run(mut self) -> RunOutcome {
        while self.step() {}

        debug_assert!(self.ctx.all_completed(), "Run ended with unfinished tasks");
        log::debug!(
            "{} finished at t={} after {} dispatches, {} slices",
            self.scheduler.name(),
            self.ctx.now,
            self.observer.steps(),
            self.ctx.timeline.len()
        );

        RunOutcome {
            algorithm: self.scheduler.name(),
            tasks: self.ctx.tasks,
            timeline: self.ctx.timeline,
            end: self.ctx.now,
            events: self.events,
        }
    }

    fn run_task(&mut self, task_id: TaskId) {
        let start = self.ctx.now;
        self.ctx.set_running(task_id);

        let task = self.ctx.task(task_id);
        let remaining = task.remaining;
        let budget = match task
            .allocated_timeslice
            .expect("Dispatched task must have a timeslice")
        {
            Timeslice::Ticks(ticks) => ticks,
            // Everything with arrival <= now is already admitted, so this is > 0
            Timeslice::UntilArrival => self.next_arrival().map_or(remaining, |at| at - start),
        };
        let ran = budget.min(remaining);
        debug_assert!(ran > 0, "Task {task_id} dispatched with an empty slice");

        let coalesce = self.scheduler.coalesce_timeline();
        self.ctx.consume(task_id, ran, coalesce);
        self.emit(SchedEvent::Dispatched {
            task: task_id,
            at: start,
            ran,
        });

        // Arrivals during the slice queue up ahead of the preempted task
        self.handle_arrivals();

        let now = self.ctx.now;
        let remaining = self.ctx.task(task_id).remaining;
        self.scheduler.stopping(&mut self.ctx, task_id, ran, remaining > 0);

        if remaining == 0 {
            self.ctx.mark_completed(task_id, now);
            self.emit(SchedEvent::Completed { task: task_id, at: now });
        } else {
            self.ctx.mark_ready(task_id);
            let flags: EnqueueFlags = ENQ_PREEMPT | ENQ_REENQ;
            self.scheduler.enqueue(&mut self.ctx, task_id, flags);
            self.emit(SchedEvent::Preempted {
                task: task_id,
                at: now,
                remaining,
            });
        }
    }

    // Everything due by now is admitted as one batch, in input order
    fn handle_arrivals(&mut self) {
        let now = self.ctx.now;
        let due = self.arrivals[self.arrival_cursor..]
            .iter()
            .take_while(|&&task_id| self.ctx.task(task_id).arrival <= now)
            .count();
        if due == 0 {
            return;
        }

        let mut batch = self.arrivals[self.arrival_cursor..self.arrival_cursor + due].to_vec();
        batch.sort_unstable();
        self.arrival_cursor += due;

        for task_id in batch {
            self.ctx.mark_ready(task_id);
            self.scheduler.enqueue(&mut self.ctx, task_id, ENQ_WAKEUP);
            self.emit(SchedEvent::Admitted { task: task_id, at: now });
        }
    }

    fn next_arrival(&self) -> Option<Ticks> {
        self.arrivals
            .get(self.arrival_cursor)
            .map(|&task_id| self.ctx.task(task_id).arrival)
    }

    fn emit(&mut self, event: SchedEvent) {
        log::trace!("{}: {:?}", self.scheduler.name(), event);
        if self.record_events {
            self.events.push(event);
        }
    }
}
