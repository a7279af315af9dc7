use keyed_priority_queue::KeyedPriorityQueue;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use std::collections::VecDeque;

use crate::sim::job::Job;

// Index into Task Vec, which keeps input order
pub type TaskId = usize;
pub type Ticks = u64;
pub type Priority = u32;
new_key_type! {
    pub struct DsqId;
}

// Ordering key of a priority DSQ: lowest priority value first, then
// earliest admission
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub struct PrioKey {
    pub priority: Priority,
    pub seq: u64,
}

// KeyedPriorityQueue is a max-heap, so we need to flip-flop PrioKey's Ord
impl PartialOrd for PrioKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrioKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Unarrived,
    Ready,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeslice {
    Ticks(Ticks),
    // Run until the next arrival (or completion), then let the policy decide again
    UntilArrival,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub state: TaskState,
    pub arrival: Ticks,
    pub burst: Ticks,
    pub priority: Priority,
    pub remaining: Ticks,
    pub first_response: Option<Ticks>,
    pub completion_time: Option<Ticks>,
    pub allocated_timeslice: Option<Timeslice>,
    // Set on first admission and kept across re-enqueues
    pub admission_seq: Option<u64>,
}

// One contiguous stretch of CPU time given to a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub task: TaskId,
    pub start: Ticks,
    pub end: Ticks,
}

#[derive(Debug)]
pub enum Dsq {
    Fifo {
        tasks: VecDeque<TaskId>,
    },
    Priq {
        tasks: KeyedPriorityQueue<TaskId, PrioKey>,
    },
}

impl Dsq {
    pub fn new_fifo() -> Self {
        Self::Fifo {
            tasks: VecDeque::new(),
        }
    }

    pub fn new_priq() -> Self {
        Self::Priq {
            tasks: KeyedPriorityQueue::new(),
        }
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        match self {
            Self::Fifo { tasks } => tasks.contains(&task_id),
            Self::Priq { tasks } => tasks.get_priority(&task_id).is_some(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fifo { tasks } => tasks.len(),
            Self::Priq { tasks } => tasks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct SimCtx {
    pub now: Ticks,
    pub tasks: Vec<Task>,
    pub dsqs: SlotMap<DsqId, Dsq>,
    pub task_to_dsq: FxHashMap<TaskId, DsqId>,
    pub timeline: Vec<Slice>,

    // Increment upon first admission of a task
    next_admission_seq: u64,
}

impl SimCtx {
    pub fn new(jobs: &[Job]) -> Self {
        let tasks = jobs
            .iter()
            .enumerate()
            .map(|(id, job)| Task {
                id,
                state: TaskState::Unarrived,
                arrival: job.arrival,
                burst: job.burst,
                priority: job.priority,
                remaining: job.burst,
                first_response: None,
                completion_time: None,
                allocated_timeslice: None,
                admission_seq: None,
            })
            .collect();

        Self {
            now: 0,
            tasks,
            dsqs: SlotMap::with_key(),
            task_to_dsq: FxHashMap::default(),
            timeline: Vec::new(),
            next_admission_seq: 0,
        }
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn advance_to(&mut self, tick: Ticks) {
        debug_assert!(tick >= self.now, "Clock cannot move backwards");
        self.now = tick;
    }

    pub fn create_dsq_fifo(&mut self) -> DsqId {
        self.dsqs.insert(Dsq::new_fifo())
    }

    pub fn create_dsq_priq(&mut self) -> DsqId {
        self.dsqs.insert(Dsq::new_priq())
    }

    // Priority DSQs order by the task's (priority, admission) key
    pub fn dsq_push_back(&mut self, dsq_id: DsqId, task_id: TaskId, slice: Timeslice) {
        assert!(
            !self.task_to_dsq.contains_key(&task_id),
            "Task {task_id} already present in some DSQ"
        );

        let task = self.task_mut(task_id);
        debug_assert_eq!(
            task.state,
            TaskState::Ready,
            "Task {task_id} must be Ready when enqueued"
        );

        task.allocated_timeslice = Some(slice);
        let key = PrioKey {
            priority: task.priority,
            seq: task
                .admission_seq
                .expect("Ready task must have an admission sequence"),
        };
        let dsq = self.dsqs.get_mut(dsq_id).expect("Unknown DSQ");

        match dsq {
            Dsq::Fifo { tasks } => tasks.push_back(task_id),
            Dsq::Priq { tasks } => {
                tasks.push(task_id, key);
            }
        };

        self.task_to_dsq.insert(task_id, dsq_id);
    }

    pub fn dsq_pop(&mut self, dsq_id: DsqId) -> Option<TaskId> {
        let dsq = self.dsqs.get_mut(dsq_id)?;
        let task = match dsq {
            Dsq::Fifo { tasks } => tasks.pop_front(),
            Dsq::Priq { tasks } => tasks.pop().map(|t| t.0),
        }?;

        let removed = self.task_to_dsq.remove(&task);
        debug_assert!(removed.is_some(), "Task {task} missing DSQ membership");

        Some(task)
    }

    pub fn dsq_is_empty(&self, dsq_id: DsqId) -> bool {
        self.dsqs.get(dsq_id).is_none_or(Dsq::is_empty)
    }

    pub fn task_in_any_dsq(&self, task_id: TaskId) -> bool {
        self.task_to_dsq.contains_key(&task_id)
    }

    pub fn task(&self, task_id: TaskId) -> &Task {
        &self.tasks[task_id]
    }

    pub fn task_mut(&mut self, task_id: TaskId) -> &mut Task {
        &mut self.tasks[task_id]
    }

    // Admission seq is handed out only once
    pub fn mark_ready(&mut self, task_id: TaskId) {
        let seq = self.next_admission_seq;
        let task = self.task_mut(task_id);
        debug_assert!(
            matches!(task.state, TaskState::Unarrived | TaskState::Running),
            "Task {task_id} cannot become Ready from {:?}",
            task.state
        );
        debug_assert!(task.remaining > 0, "Task {task_id} has no work left");

        task.state = TaskState::Ready;
        if task.admission_seq.is_none() {
            task.admission_seq = Some(seq);
            self.next_admission_seq += 1;
        }
    }

    // Return the tick at which the task first got the CPU
    pub fn set_running(&mut self, task_id: TaskId) -> Ticks {
        debug_assert!(
            !self.task_to_dsq.contains_key(&task_id),
            "Running task {task_id} must not be enqueued"
        );

        let now = self.now;
        let task = self.task_mut(task_id);
        debug_assert_eq!(task.state, TaskState::Ready);
        task.state = TaskState::Running;
        *task.first_response.get_or_insert(now)
    }

    // Charge `ran` ticks of CPU to the running task and move the clock
    pub fn consume(&mut self, task_id: TaskId, ran: Ticks, coalesce: bool) {
        let start = self.now;
        let end = start + ran;

        let task = self.task_mut(task_id);
        debug_assert_eq!(task.state, TaskState::Running);
        debug_assert!(ran > 0 && ran <= task.remaining);
        task.remaining -= ran;

        match self.timeline.last_mut() {
            Some(last) if coalesce && last.task == task_id && last.end == start => last.end = end,
            _ => self.timeline.push(Slice {
                task: task_id,
                start,
                end,
            }),
        }

        self.advance_time(ran);
    }

    pub fn mark_completed(&mut self, task_id: TaskId, completion_time: Ticks) {
        debug_assert!(
            !self.task_to_dsq.contains_key(&task_id),
            "Completing task {} that is still enqueued",
            task_id
        );

        let task = &mut self.tasks[task_id];
        debug_assert!(
            task.state == TaskState::Running && task.remaining == 0,
            "Task {task_id} must have been running its last tick before marked complete"
        );

        task.state = TaskState::Completed;
        task.completion_time = Some(completion_time);
    }

    pub fn all_completed(&self) -> bool {
        self.tasks
            .iter()
            .all(|task| task.state == TaskState::Completed)
    }
}
