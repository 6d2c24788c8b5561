/*
[INPUT]:  Terminal session errors from any stage
[OUTPUT]: One diagnostic log event per failure
[POS]:    Error handling layer - failure sink
[UPDATE]: When changing how failures are surfaced to the operator
*/

use tracing::error;

use crate::error::SessionError;

/// Log a failure with its stage tag and cause. Never retries and never
/// exits the process; the caller simply stops scheduling work.
pub fn report_failure(err: &SessionError) {
    let stage = err.stage();
    error!(stage = %stage, error = %err, "{stage}: {err}");
}
