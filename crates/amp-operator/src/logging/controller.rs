//! Facilities for reporting Kubernetes controller outcomes
//!
//! The primary entry point is [`report_controller_reconciled`].
use std::error::Error;

use kube::{
    Resource,
    runtime::{
        controller::{self, Action},
        reflector::ObjectRef,
    },
};

/// [`Error`] extensions that help report reconciliation errors
///
/// This should be implemented for reconciler error types.
pub trait ReconcilerError: Error {
    /// `PascalCase`d name for the error category
    ///
    /// This can typically be implemented by delegating to [`strum::EnumDiscriminants`] and [`strum::IntoStaticStr`].
    fn category(&self) -> &'static str;

    /// Whether an administrator has to fix something before a retry can succeed.
    fn is_configuration_error(&self) -> bool {
        false
    }
}

/// Reports the controller reconciliation result to the current [`tracing::Subscriber`].
///
/// Configuration errors are logged as errors. Everything else the queue retries on its own and
/// is only logged as a warning.
pub fn report_controller_reconciled<K, ReconcileErr, QueueErr>(
    controller_name: &str,
    result: &Result<(ObjectRef<K>, Action), controller::Error<ReconcileErr, QueueErr>>,
) where
    K: Resource,
    ReconcileErr: ReconcilerError + 'static,
    QueueErr: Error + 'static,
{
    match result {
        Ok((obj, _)) => {
            tracing::info!(
                controller.name = controller_name,
                object = %obj,
                "Reconciled object"
            );
        }
        Err(err) => report_controller_error(controller_name, err),
    }
}

fn report_controller_error<ReconcileErr, QueueErr>(
    controller_name: &str,
    error: &controller::Error<ReconcileErr, QueueErr>,
) where
    ReconcileErr: ReconcilerError + 'static,
    QueueErr: Error + 'static,
{
    match error {
        controller::Error::ReconcilerFailed(reconcile_error, object)
            if reconcile_error.is_configuration_error() =>
        {
            tracing::error!(
                controller.name = controller_name,
                object = %object,
                category = reconcile_error.category(),
                error = reconcile_error as &dyn Error,
                "Object is misconfigured",
            );
        }
        controller::Error::ReconcilerFailed(reconcile_error, object) => {
            tracing::warn!(
                controller.name = controller_name,
                object = %object,
                category = reconcile_error.category(),
                error = reconcile_error as &dyn Error,
                "Failed to reconcile object, retrying",
            );
        }
        _ => {
            tracing::error!(
                controller.name = controller_name,
                error = error as &dyn Error,
                "Failed to reconcile object",
            );
        }
    }
}
