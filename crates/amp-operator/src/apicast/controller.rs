//! Runs [`reconcile_apicast`] for every `APIcast` in the watched namespaces.
use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{Secret, Service},
    networking::v1::Ingress,
};
use kube::{
    ResourceExt,
    runtime::{Controller, controller::Action, watcher},
};
use snafu::OptionExt;

use super::{
    crd::APIcast,
    reconciler::{Error, ObjectHasNoNamespaceSnafu, ReconcileAction, reconcile_apicast},
};
use crate::{
    client::{Client, WatchNamespace},
    logging::controller::{ReconcilerError, report_controller_reconciled},
};

pub const CONTROLLER_NAME: &str = "apicast.apps.3scale.net";

const CONFIGURATION_ERROR_BACKOFF: Duration = Duration::from_secs(5 * 60);
const TRANSIENT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct Context {
    client: Client,
}

/// Watches `APIcast` objects and the objects they own until a termination signal arrives.
pub async fn run(client: Client, watch_namespace: WatchNamespace) {
    let watcher_config = watcher::Config::default();
    Controller::new(
        watch_namespace.get_api::<APIcast>(&client),
        watcher_config.clone(),
    )
    .owns(
        watch_namespace.get_api::<Deployment>(&client),
        watcher_config.clone(),
    )
    .owns(
        watch_namespace.get_api::<Service>(&client),
        watcher_config.clone(),
    )
    .owns(
        watch_namespace.get_api::<Secret>(&client),
        watcher_config.clone(),
    )
    .owns(watch_namespace.get_api::<Ingress>(&client), watcher_config)
    .shutdown_on_signal()
    .run(reconcile, error_policy, Arc::new(Context { client }))
    .for_each(|result| async move {
        report_controller_reconciled(CONTROLLER_NAME, &result);
    })
    .await;
}

async fn reconcile(apicast: Arc<APIcast>, context: Arc<Context>) -> Result<Action, Error> {
    let name = apicast.name_any();
    let namespace = apicast
        .namespace()
        .context(ObjectHasNoNamespaceSnafu { name: &name })?;

    Ok(
        match reconcile_apicast(&context.client, &namespace, &name).await? {
            ReconcileAction::Done => Action::await_change(),
            ReconcileAction::NeedsRequeue => {
                tracing::debug!(%namespace, %name, "requeueing after defaulting");
                Action::requeue(Duration::ZERO)
            }
        },
    )
}

fn error_policy(_apicast: Arc<APIcast>, error: &Error, _context: Arc<Context>) -> Action {
    Action::requeue(backoff(error))
}

fn backoff(error: &Error) -> Duration {
    if error.is_configuration_error() {
        CONFIGURATION_ERROR_BACKOFF
    } else {
        TRANSIENT_ERROR_BACKOFF
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_back_off_longer() {
        let configuration = Error::MissingSecretKey {
            key: "url".to_owned(),
            secret: "portal".to_owned(),
        };
        let transient = Error::ReconcileObject {
            source: crate::client::Error::Injected { operation: "get" },
            object: "deployment",
        };
        assert_eq!(backoff(&configuration), CONFIGURATION_ERROR_BACKOFF);
        assert_eq!(backoff(&transient), TRANSIENT_ERROR_BACKOFF);
    }
}
