//! Leaderboard and weekly statistics

use chrono::NaiveDate;
use tracing::debug;

use super::tasks::window_query;
use super::{Gateway, GatewayResult};
use crate::leaderboard::{aggregate, summarize, Contestant, Leaderboard, UserAggregate};
use crate::profile::Profile;
use crate::task::DateWindow;

impl Gateway {
    /// Rank every profile by the tasks they own inside `window`.
    ///
    /// Scores use the stored priority codes as-is: a legacy colour name such
    /// as `red` weighs like any unknown code.
    pub async fn leaderboard(
        &self,
        window: DateWindow,
        today: NaiveDate,
    ) -> GatewayResult<Leaderboard> {
        let profiles = self.all_profiles().await?;
        let tasks = self
            .select_tasks("stats.leaderboard_tasks", window_query(window))
            .await?;
        debug!(
            profiles = profiles.len(),
            tasks = tasks.len(),
            start = %window.start,
            end = %window.end,
            "Aggregating leaderboard"
        );

        let contestants: Vec<Contestant> = profiles.iter().map(Contestant::from).collect();
        Ok(aggregate(&tasks, &contestants, &window, today))
    }

    /// Leaderboard for the calendar month containing `today`
    pub async fn monthly_leaderboard(&self, today: NaiveDate) -> GatewayResult<Leaderboard> {
        self.leaderboard(DateWindow::month_of(today), today).await
    }

    /// The signed-in user's totals over the last week; `None` when signed out
    pub async fn weekly_stats(&self, today: NaiveDate) -> GatewayResult<Option<UserAggregate>> {
        let Some(user) = self.auth.current_user().await else {
            return Ok(None);
        };
        let query = window_query(DateWindow::last_week(today)).eq("user_id", user.id.as_str());
        let tasks = self.select_tasks("stats.weekly_tasks", query).await?;
        let profile = self
            .current_profile_or_fallback()
            .await
            .unwrap_or_else(|| Profile::fallback(&user));
        Ok(Some(summarize(&Contestant::from(&profile), &tasks)))
    }
}
