//! Background status polling for submitted reservation calls.
//!
//! Each submitted job gets its own task: poll at a fixed interval, report
//! every observation through the channel, stop at the first terminal
//! decision (or the first poll error, which is itself terminal for
//! the conversation). The engine drains the channel between turns, so
//! updates always land after whatever the user said in the meantime.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::reservation::service::{CallStatusResponse, ReservationService};

/// An observation (or failure) surfaced by a polling task.
#[derive(Debug, Clone)]
pub enum PollEvent {
    Observed {
        job_id: String,
        response: CallStatusResponse,
    },
    PollFailed {
        job_id: String,
        reason: String,
    },
}

/// Spawn the poller for one job. The returned handle is aborted on
/// session teardown; the task also ends on its own at the first terminal
/// observation.
pub fn spawn_poller(
    service: Arc<dyn ReservationService>,
    job_id: String,
    interval: Duration,
    events: UnboundedSender<PollEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            match service.poll_call(&job_id).await {
                Ok(response) => {
                    let terminal = response.is_terminal();
                    debug!(%job_id, ?response.status, terminal, "poll observation");
                    if events
                        .send(PollEvent::Observed {
                            job_id: job_id.clone(),
                            response,
                        })
                        .is_err()
                    {
                        // Receiver gone: session is over.
                        return;
                    }
                    if terminal {
                        return;
                    }
                }
                Err(err) => {
                    warn!(%job_id, error = %err, "poll failed");
                    let _ = events.send(PollEvent::PollFailed {
                        job_id: job_id.clone(),
                        reason: err.to_string(),
                    });
                    return;
                }
            }
        }
    })
}
