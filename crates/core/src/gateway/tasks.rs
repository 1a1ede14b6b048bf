//! Task operations

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::debug;

use super::{today, Gateway, GatewayResult};
use crate::backend::{tables, Direction, Query};
use crate::task::{date_key, DateWindow, Task};

impl Gateway {
    /// Every task row
    pub async fn all_tasks(&self) -> GatewayResult<Vec<Task>> {
        self.fetch_tasks("tasks.all", Query::new()).await
    }

    /// Tasks of every user on one day, earliest start first
    pub async fn tasks_by_date(&self, date: NaiveDate) -> GatewayResult<Vec<Task>> {
        let query = Query::new()
            .eq("date", date_key(date))
            .order("time_start", Direction::Ascending);
        self.fetch_tasks("tasks.by_date", query).await
    }

    /// One user's tasks on one day, earliest start first
    pub async fn tasks_by_date_and_user(
        &self,
        date: NaiveDate,
        user_id: &str,
    ) -> GatewayResult<Vec<Task>> {
        let query = Query::new()
            .eq("date", date_key(date))
            .eq("user_id", user_id)
            .order("time_start", Direction::Ascending);
        self.fetch_tasks("tasks.by_date_and_user", query).await
    }

    /// Tasks of every user inside a window, by day then start time
    pub async fn tasks_in_window(&self, window: DateWindow) -> GatewayResult<Vec<Task>> {
        self.fetch_tasks("tasks.in_window", window_query(window))
            .await
    }

    /// One user's tasks over the last seven days and today
    pub async fn tasks_for_last_week(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> GatewayResult<Vec<Task>> {
        let query = window_query(DateWindow::last_week(today)).eq("user_id", user_id);
        self.fetch_tasks("tasks.last_week", query).await
    }

    /// Store a new task and return the stored row.
    ///
    /// The date is normalized and both timestamps are stamped before the
    /// insert. A retried insert whose first response was lost stores the task
    /// twice.
    pub async fn add_task(&self, task: Task) -> GatewayResult<Task> {
        let now = Utc::now();
        let mut task = task.with_normalized_date(today());
        task.created_at = Some(now);
        task.updated_at = Some(now);
        debug!(task_id = %task.id, date = %task.date, "Adding task");

        let tasks = self.table(tables::TASKS);
        let task = &task;
        self.run("tasks.insert", move || async move { tasks.insert_one(task).await })
            .await
    }

    /// Overwrite a stored task, refreshing its update timestamp
    pub async fn update_task(&self, task: Task) -> GatewayResult<Task> {
        let mut task = task.with_normalized_date(today());
        task.updated_at = Some(Utc::now());

        let tasks = self.table(tables::TASKS);
        let query = Query::new().eq("id", task.id.clone());
        let (task_ref, query) = (&task, &query);
        self.run("tasks.update", move || async move {
            tasks.replace(query, task_ref).await
        })
        .await?;
        Ok(task)
    }

    /// Mark a task done or not done
    pub async fn toggle_task_completion(
        &self,
        task_id: &str,
        is_completed: bool,
    ) -> GatewayResult<()> {
        debug!(task_id, is_completed, "Updating task completion");
        let tasks = self.table(tables::TASKS);
        let query = Query::new().eq("id", task_id);
        let patch = json!({
            "is_completed": is_completed,
            "updated_at": Utc::now().to_rfc3339(),
        });
        let (query, patch) = (&query, &patch);
        self.run("tasks.toggle_completion", move || async move {
            tasks.patch(query, patch.clone()).await
        })
        .await
    }

    pub async fn delete_task(&self, task_id: &str) -> GatewayResult<()> {
        let tasks = self.table(tables::TASKS);
        let query = Query::new().eq("id", task_id);
        let query = &query;
        self.run("tasks.delete", move || async move { tasks.delete(query).await })
            .await
    }

    /// Select tasks and map legacy colour names onto priority codes
    async fn fetch_tasks(&self, operation: &'static str, query: Query) -> GatewayResult<Vec<Task>> {
        let rows = self.select_tasks(operation, query).await?;
        Ok(rows.into_iter().map(Task::with_normalized_priority).collect())
    }

    /// Select tasks with their stored priority codes untouched
    pub(super) async fn select_tasks(
        &self,
        operation: &'static str,
        query: Query,
    ) -> GatewayResult<Vec<Task>> {
        let tasks = self.table(tables::TASKS);
        let query = &query;
        self.run(operation, move || async move { tasks.select(query).await })
            .await
    }
}

pub(super) fn window_query(window: DateWindow) -> Query {
    Query::new()
        .gte("date", date_key(window.start))
        .lte("date", date_key(window.end))
        .order("date", Direction::Ascending)
        .order("time_start", Direction::Ascending)
}
