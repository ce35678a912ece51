use std::sync::Arc;

use perfai_core::JobId;
use perfai_logging::{perfai_info, perfai_warn};
use tokio::task::JoinHandle;

use crate::{ApiError, GenerationTrigger};

/// Fires the one-shot request that starts AI-insight generation for `job_id`.
///
/// Deciding whether the job is ready (see
/// [`perfai_core::ViewModel::ready_for_secondary_generation`]) is up to the
/// caller. On failure `on_error` runs once; there is no retry.
pub fn request_secondary_generation<E>(
    job_id: JobId,
    trigger: Arc<dyn GenerationTrigger>,
    on_error: E,
) -> JoinHandle<()>
where
    E: FnOnce(ApiError) + Send + 'static,
{
    tokio::spawn(async move {
        match trigger.trigger_generation(&job_id).await {
            Ok(()) => perfai_info!("Requested AI generation for job {}", job_id),
            Err(err) => {
                perfai_warn!("AI generation request for job {} failed: {}", job_id, err);
                on_error(err);
            }
        }
    })
}
