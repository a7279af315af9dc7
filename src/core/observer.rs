use super::state::{SimCtx, TaskState};

#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn observe(&mut self, ctx: &SimCtx) {
        self.step += 1;

        for task in &ctx.tasks {
            let task_id = task.id;
            match task.state {
                TaskState::Running => {
                    debug_assert!(false, "Task {task_id} still Running between dispatches");
                }
                TaskState::Ready => {
                    debug_assert!(
                        ctx.task_in_any_dsq(task_id),
                        "Ready task {task_id} is not queued anywhere"
                    );
                    debug_assert!(task.arrival <= ctx.now);
                }
                TaskState::Completed => {
                    debug_assert_eq!(task.remaining, 0);
                    debug_assert!(
                        task.completion_time.is_some_and(|t| t <= ctx.now),
                        "Completed task {task_id} has no valid completion time"
                    );
                }
                TaskState::Unarrived => {
                    debug_assert_eq!(task.remaining, task.burst);
                }
            }
        }

        for (&task_id, &dsq_id) in &ctx.task_to_dsq {
            debug_assert_eq!(
                ctx.task(task_id).state,
                TaskState::Ready,
                "Queued task {task_id} must be Ready"
            );
            if let Some(dsq) = ctx.dsqs.get(dsq_id) {
                debug_assert!(
                    dsq.contains(task_id),
                    "Task {task_id} mapped to DSQ {dsq_id:?} but missing from it"
                );
            } else {
                debug_assert!(false, "task_to_dsq references unknown DSQ {dsq_id:?}");
            }
        }

        if let Some(last) = ctx.timeline.last() {
            debug_assert!(last.end <= ctx.now, "Timeline runs ahead of the clock");
        }
    }
}
