use crate::models::job::JobRecord;
use crate::models::tool::{Progress, StatusView};

/// Project a job record into its status view. Results are withheld until completion.
pub fn report(job: &JobRecord) -> StatusView {
    let percent = if job.total_items == 0 {
        100
    } else {
        ((job.completed_items * 100) / job.total_items).min(100) as u8
    };

    let (results, success_count, failure_count) = if job.is_completed() {
        let succeeded = job.success_count();
        (
            Some(job.results.clone()),
            Some(succeeded),
            Some(job.results.len() - succeeded),
        )
    } else {
        (None, None, None)
    };

    StatusView {
        job_id: job.id,
        status: job.status,
        progress: Progress {
            completed: job.completed_items,
            total: job.total_items,
            percent,
        },
        current_item: job.current_item.clone(),
        started_at: job.started_at,
        completed_at: job.completed_at,
        options: job.options.clone(),
        results,
        success_count,
        failure_count,
    }
}
