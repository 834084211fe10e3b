//! Migration of legacy favorites into reactions.
//!
//! Legacy favorites are per-user lists of activity IDs stored in user
//! metadata. Migration walks those rows in pages; each page is one step, and
//! a caller (the admin UI or [`MigrationRunner`]) drives the steps with a
//! cursor until the task is done.

use std::str::FromStr;

use crate::services::reaction::{AddOptions, ReactionService};
use crate::services::registry::FAVORITE;
use async_trait::async_trait;
use reactions_common::{AppError, AppResult};
use reactions_db::repositories::{ActivityRepository, REACTIONS_COMPONENT, UserMetaRepository};
use serde::{Deserialize, Serialize};

/// User metadata key of the legacy favorites list.
pub const LEGACY_FAVORITES_KEY: &str = "bp_favorite_activities";

/// Known migration tasks. Only these can be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationTask {
    /// Turn legacy favorites into `favorite` reactions.
    MigrateFavorites,
}

impl MigrationTask {
    /// Every task, in the order they run.
    pub const ALL: [Self; 1] = [Self::MigrateFavorites];

    /// Identifier used on the wire.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::MigrateFavorites => "migrate_favorites",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MigrateFavorites => "Migrate favorites to favorite reactions",
        }
    }
}

impl FromStr for MigrationTask {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown migration task: {s}")))
    }
}

/// Where a task stands in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Active,
    Complete,
    Failed,
}

/// A task with its progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedTask {
    pub task: MigrationTask,
    /// Legacy rows to process.
    pub count: u64,
    /// Page size.
    pub number: u64,
    /// Legacy rows processed so far.
    pub done: u64,
    pub state: TaskState,
}

impl QueuedTask {
    #[must_use]
    pub const fn new(task: MigrationTask, count: u64, number: u64) -> Self {
        Self {
            task,
            count,
            number,
            done: 0,
            state: TaskState::Pending,
        }
    }
}

/// A task as listed to the admin UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDescriptor {
    pub id: &'static str,
    pub position: usize,
    pub message: &'static str,
    pub count: u64,
    pub number: u64,
    pub done: u64,
    pub active: bool,
}

/// Ordered task queue.
///
/// At most one task is active. When it completes the next pending task, by
/// position, becomes active and the cursor restarts at zero. A failed task
/// halts the queue.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    tasks: Vec<QueuedTask>,
    step: u64,
}

impl TaskQueue {
    #[must_use]
    pub const fn new(tasks: Vec<QueuedTask>) -> Self {
        Self { tasks, step: 0 }
    }

    /// Activate the first pending task.
    pub fn start(&mut self) -> Option<MigrationTask> {
        if self.active().is_some() || self.is_failed() {
            return self.active().map(|t| t.task);
        }
        self.activate_next()
    }

    fn activate_next(&mut self) -> Option<MigrationTask> {
        self.step = 0;
        for task in &mut self.tasks {
            if task.state != TaskState::Pending {
                continue;
            }
            if task.count == 0 {
                task.state = TaskState::Complete;
                continue;
            }
            task.state = TaskState::Active;
            return Some(task.task);
        }
        None
    }

    /// The active task.
    #[must_use]
    pub fn active(&self) -> Option<&QueuedTask> {
        self.tasks.iter().find(|t| t.state == TaskState::Active)
    }

    /// Cursor of the active task.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Record a finished step of the active task that read `processed`
    /// legacy rows.
    ///
    /// The task completes once `done` reaches `count`, or as soon as a step
    /// reads nothing: the source is exhausted even if `count` was stale.
    pub fn record(&mut self, processed: u64) -> Option<TaskState> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.state == TaskState::Active)?;

        task.done = task.done.saturating_add(processed);
        self.step = self.step.saturating_add(task.number);

        if processed == 0 || task.done >= task.count {
            task.state = TaskState::Complete;
            self.activate_next();
            return Some(TaskState::Complete);
        }

        Some(TaskState::Active)
    }

    /// Mark the active task failed.
    pub fn fail(&mut self) {
        if let Some(task) = self
            .tasks
            .iter_mut()
            .find(|t| t.state == TaskState::Active)
        {
            task.state = TaskState::Failed;
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.tasks.iter().any(|t| t.state == TaskState::Failed)
    }

    /// Whether every task completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(|t| t.state == TaskState::Complete)
    }

    #[must_use]
    pub fn tasks(&self) -> &[QueuedTask] {
        &self.tasks
    }
}

/// Runs one page of a migration task.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Process up to `number` legacy rows starting at `step` and return how
    /// many rows were read. Zero means nothing is left.
    async fn run_step(&self, task: MigrationTask, step: u64, number: u64) -> AppResult<u64>;
}

/// Drives a [`TaskQueue`] to completion, one step at a time.
pub struct MigrationRunner<E> {
    executor: E,
}

impl<E: StepExecutor> MigrationRunner<E> {
    #[must_use]
    pub const fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Run every task in the queue. A failing step fails its task and stops
    /// the run.
    pub async fn run(&self, queue: &mut TaskQueue) -> AppResult<()> {
        queue.start();

        while let Some(active) = queue.active() {
            let (task, number, step) = (active.task, active.number.max(1), queue.step());

            match self.executor.run_step(task, step, number).await {
                Ok(processed) => {
                    let state = queue.record(processed);
                    let done = queue
                        .tasks()
                        .iter()
                        .find(|t| t.task == task)
                        .map_or(0, |t| t.done);
                    tracing::info!(task = task.id(), step, processed, done, ?state, "Migration step");
                }
                Err(e) => {
                    tracing::error!(task = task.id(), step, error = %e, "Migration step failed");
                    queue.fail();
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}

/// Migration service.
#[derive(Clone)]
pub struct MigrationService {
    user_meta_repo: UserMetaRepository,
    activity_repo: ActivityRepository,
    reactions: ReactionService,
    page_size: u64,
}

impl MigrationService {
    /// Create a new migration service.
    #[must_use]
    pub fn new(
        user_meta_repo: UserMetaRepository,
        activity_repo: ActivityRepository,
        reactions: ReactionService,
        page_size: u64,
    ) -> Self {
        Self {
            user_meta_repo,
            activity_repo,
            reactions,
            page_size: page_size.max(1),
        }
    }

    /// Legacy rows a task has to go through.
    pub async fn count(&self, task: MigrationTask) -> AppResult<u64> {
        match task {
            MigrationTask::MigrateFavorites => {
                self.user_meta_repo.count_by_key(LEGACY_FAVORITES_KEY).await
            }
        }
    }

    /// List the tasks with fresh counts; the first is active.
    pub async fn tasks(&self) -> AppResult<Vec<TaskDescriptor>> {
        let mut tasks = Vec::with_capacity(MigrationTask::ALL.len());
        for (i, task) in MigrationTask::ALL.into_iter().enumerate() {
            tasks.push(TaskDescriptor {
                id: task.id(),
                position: i + 1,
                message: task.message(),
                count: self.count(task).await?,
                number: self.page_size,
                done: 0,
                active: i == 0,
            });
        }
        Ok(tasks)
    }

    /// Build a queue holding every task.
    pub async fn queue(&self) -> AppResult<TaskQueue> {
        let mut tasks = Vec::with_capacity(MigrationTask::ALL.len());
        for task in MigrationTask::ALL {
            tasks.push(QueuedTask::new(task, self.count(task).await?, self.page_size));
        }
        Ok(TaskQueue::new(tasks))
    }

    /// Migrate one page of legacy favorites.
    ///
    /// Each favorited activity that still exists becomes a `favorite`
    /// reaction dated like the activity, without notifying anyone. Adding is
    /// idempotent, so rerunning from the start is safe.
    async fn migrate_favorites(&self, step: u64, number: u64) -> AppResult<u64> {
        if self.reactions.registry().get(FAVORITE).is_none() {
            return Err(AppError::UnknownReaction(FAVORITE.to_string()));
        }

        let rows = self
            .user_meta_repo
            .find_page_by_key(LEGACY_FAVORITES_KEY, step, number)
            .await?;

        let mut migrated = 0_u64;
        for row in &rows {
            let ids = parse_favorites(&row.meta_value);
            if ids.is_empty() {
                continue;
            }

            for activity in self.activity_repo.filter_existing_ids(&ids).await? {
                if activity.component == REACTIONS_COMPONENT {
                    continue;
                }

                let options = AddOptions {
                    recorded_at: Some(activity.date_recorded),
                    notify: false,
                };
                match self
                    .reactions
                    .add(activity.id, FAVORITE, row.user_id, options)
                    .await
                {
                    Ok(_) => migrated += 1,
                    Err(e) if e.is_domain_error() => {
                        tracing::warn!(
                            user_id = row.user_id,
                            activity_id = activity.id,
                            error = %e,
                            "Skipping favorite"
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        tracing::debug!(step, number, rows = rows.len(), migrated, "Migrated favorites page");

        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl StepExecutor for MigrationService {
    async fn run_step(&self, task: MigrationTask, step: u64, number: u64) -> AppResult<u64> {
        let number = number.max(1);
        match task {
            MigrationTask::MigrateFavorites => self.migrate_favorites(step, number).await,
        }
    }
}

/// Read a legacy favorites list: a JSON array of IDs, as numbers or strings.
fn parse_favorites(value: &str) -> Vec<i64> {
    let Ok(serde_json::Value::Array(items)) = serde_json::from_str(value) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|v| match v {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .filter(|id| *id > 0)
        .collect()
}
