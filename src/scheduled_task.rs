use std::future::Future;

use chrono::{DateTime, Utc};
use rocket::tokio::{self, task::JoinHandle, time::Duration};

/// A task scheduled for a specific point in the future.
/// It will automatically execute at that point unless cancelled first.
pub struct ScheduledTask<T> {
    handle: JoinHandle<T>,
}

impl<T> ScheduledTask<T>
where
    T: Send + 'static,
{
    /// Schedule the given task to execute at time `run_at`.
    /// If `run_at` is in the past, the task will execute immediately.
    pub fn new<Fut>(task: Fut, run_at: DateTime<Utc>) -> Self
    where
        Fut: Future<Output = T> + Send + 'static,
    {
        let delay = datetime_to_duration(run_at);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await
        });

        Self { handle }
    }

    /// Cancel the task. Returns true iff it had already completed before we could cancel it.
    pub async fn cancel(self) -> bool {
        self.handle.abort();
        self.handle.await.is_ok()
    }
}

/// Convert a `DateTime` into a duration from the current instant.
/// A `DateTime` in the past will produce a duration of zero.
fn datetime_to_duration(datetime: DateTime<Utc>) -> Duration {
    let target_timestamp = datetime.timestamp_millis();
    let now_timestamp = Utc::now().timestamp_millis();
    let time_diff = u64::try_from(target_timestamp - now_timestamp).unwrap_or(0);
    Duration::from_millis(time_diff)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use chrono::Duration as ChronoDuration;
    use rocket::tokio::sync::oneshot;

    use super::*;

    #[rocket::async_test]
    async fn past_deadline_runs_immediately() {
        let (done, ran) = oneshot::channel();
        let _task = ScheduledTask::new(
            async move {
                let _ = done.send(7);
            },
            Utc::now() - ChronoDuration::hours(1),
        );
        let ran = tokio::time::timeout(Duration::from_secs(5), ran).await;
        assert_eq!(ran.unwrap().unwrap(), 7);
    }

    #[rocket::async_test]
    async fn cancel_reports_completed_task() {
        let task = ScheduledTask::new(async {}, Utc::now() - ChronoDuration::hours(1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(task.cancel().await);
    }

    #[rocket::async_test]
    async fn cancelled_task_never_runs() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let task = ScheduledTask::new(
            async move { flag.store(true, Ordering::SeqCst) },
            Utc::now() + ChronoDuration::days(1),
        );
        assert!(!task.cancel().await);
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn past_datetimes_give_zero_delay() {
        assert_eq!(
            datetime_to_duration(Utc::now() - ChronoDuration::minutes(5)),
            Duration::ZERO
        );
        assert!(datetime_to_duration(Utc::now() + ChronoDuration::hours(1)) > Duration::from_secs(3500));
    }
}
