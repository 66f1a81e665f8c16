//! The reconcile flow of one `APIcast` custom resource.
use k8s_openapi::api::core::v1::Secret;
use snafu::{OptionExt, ResultExt, Snafu, ensure};
use strum::{EnumDiscriminants, IntoStaticStr};

use super::{
    crd::{APIcast, SecretKeyRef},
    desired::{self, AdminPortalCredentials},
};
use crate::{
    client::{self, ObjectStore},
    logging::controller::ReconcilerError,
    reconcile::{ObjectOutcome, ReconcileFields, reconcile_object, secret_string_data},
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu, EnumDiscriminants)]
#[strum_discriminants(derive(IntoStaticStr))]
pub enum Error {
    #[snafu(display("APIcast {name:?} has no namespace"), visibility(pub(crate)))]
    ObjectHasNoNamespace { name: String },

    #[snafu(display("failed to get APIcast {namespace}/{name}"))]
    GetApicast {
        source: client::Error,
        namespace: String,
        name: String,
    },

    #[snafu(display("failed to persist the defaulted APIcast {name:?}"))]
    PersistDefaults { source: client::Error, name: String },

    #[snafu(display("field 'name' not specified for the {reference} reference"))]
    MissingSecretName { reference: &'static str },

    #[snafu(display("failed to get secret {secret:?}"))]
    GetSecret {
        source: client::Error,
        secret: String,
    },

    #[snafu(display("secret {secret:?} referenced as {reference} does not exist"))]
    MissingSecret {
        secret: String,
        reference: &'static str,
    },

    #[snafu(display("key {key:?} not found in secret {secret:?}"))]
    MissingSecretKey { key: String, secret: String },

    #[snafu(display("failed to build the objects of APIcast {name:?}"))]
    BuildObjects {
        source: desired::Error,
        name: String,
    },

    #[snafu(display("failed to reconcile {object}"))]
    ReconcileObject {
        source: client::Error,
        object: &'static str,
    },
}

impl ReconcilerError for Error {
    fn category(&self) -> &'static str {
        ErrorDiscriminants::from(self).into()
    }

    fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSecretName { .. }
                | Self::MissingSecret { .. }
                | Self::MissingSecretKey { .. }
                | Self::BuildObjects { .. }
        )
    }
}

/// What the caller should do once an invocation finished without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum ReconcileAction {
    Done,

    /// Defaults were persisted on the custom resource, which has to be read again.
    NeedsRequeue,
}

const URL_REFERENCE: &str = "admin portal URL secret key";
const ACCESS_TOKEN_REFERENCE: &str = "admin portal access token secret key";
const ENVIRONMENT_REFERENCE: &str = "environment configuration secret";

/// Converges the objects of the `APIcast` `namespace/name`.
///
/// A missing custom resource is not an error. The objects are reconciled in a fixed order and
/// the first failure aborts the rest. Objects reconciled before stay as they are.
#[tracing::instrument(skip(store))]
pub async fn reconcile_apicast<S: ObjectStore>(
    store: &S,
    namespace: &str,
    name: &str,
) -> Result<ReconcileAction> {
    let Some(mut apicast) = store
        .get::<APIcast>(namespace, name)
        .await
        .context(GetApicastSnafu { namespace, name })?
    else {
        tracing::debug!("APIcast no longer exists");
        return Ok(ReconcileAction::Done);
    };

    if apicast.spec.set_missing_defaults() {
        store
            .update(&apicast)
            .await
            .context(PersistDefaultsSnafu { name })?;
        tracing::debug!("persisted defaults, requeueing");
        return Ok(ReconcileAction::NeedsRequeue);
    }

    let credentials = admin_portal_credentials(store, &apicast, namespace).await?;
    check_environment_secret(store, &apicast, namespace).await?;

    let objects = desired::build(&apicast, &credentials).context(BuildObjectsSnafu { name })?;
    converge(store, &objects.admin_portal_endpoint, "admin portal endpoint secret").await?;
    converge(store, &objects.deployment, "deployment").await?;
    converge(store, &objects.service, "service").await?;
    if let Some(ingress) = &objects.ingress {
        converge(store, ingress, "ingress").await?;
    }

    Ok(ReconcileAction::Done)
}

async fn converge<S: ObjectStore, K: ReconcileFields>(
    store: &S,
    desired: &K,
    object: &'static str,
) -> Result<ObjectOutcome> {
    reconcile_object(store, desired)
        .await
        .context(ReconcileObjectSnafu { object })
}

async fn admin_portal_credentials<S: ObjectStore>(
    store: &S,
    apicast: &APIcast,
    namespace: &str,
) -> Result<AdminPortalCredentials> {
    let references = &apicast.spec.admin_portal_credentials_ref;
    Ok(AdminPortalCredentials {
        url: secret_value(store, namespace, &references.url_secret_key_ref, URL_REFERENCE).await?,
        access_token: secret_value(
            store,
            namespace,
            &references.access_token_secret_key_ref,
            ACCESS_TOKEN_REFERENCE,
        )
        .await?,
    })
}

async fn secret_value<S: ObjectStore>(
    store: &S,
    namespace: &str,
    reference: &SecretKeyRef,
    description: &'static str,
) -> Result<String> {
    let secret = required_secret(store, namespace, &reference.name, description).await?;
    secret_string_data(&secret)
        .remove(&reference.key)
        .context(MissingSecretKeySnafu {
            key: &reference.key,
            secret: &reference.name,
        })
}

async fn check_environment_secret<S: ObjectStore>(
    store: &S,
    apicast: &APIcast,
    namespace: &str,
) -> Result<()> {
    if let Some(reference) = &apicast.spec.environment_configuration_secret_ref {
        required_secret(store, namespace, &reference.name, ENVIRONMENT_REFERENCE).await?;
    }
    Ok(())
}

async fn required_secret<S: ObjectStore>(
    store: &S,
    namespace: &str,
    name: &str,
    reference: &'static str,
) -> Result<Secret> {
    ensure!(!name.is_empty(), MissingSecretNameSnafu { reference });
    store
        .get::<Secret>(namespace, name)
        .await
        .context(GetSecretSnafu { secret: name })?
        .context(MissingSecretSnafu {
            secret: name,
            reference,
        })
}
