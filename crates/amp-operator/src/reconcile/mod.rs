//! Converges one live object towards one desired object.
//!
//! Live objects carry server populated defaults and status, so they are never compared as a
//! whole. Every kind names the fields that matter in [`ReconcileFields`]; only those are copied
//! onto the live object, which keeps its resource version and server managed metadata.
use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{ConfigMap, Container, PodSpec, Secret, Service},
    networking::v1::Ingress,
};
use kube::ResourceExt;
use strum::Display;

use crate::{
    client::{self, ObjectStore, StoreResource},
    openshift::Route,
};

pub const POD_TEMPLATE_LABELS: &str = "spec.template.metadata.labels";
pub const IMAGE: &str = "spec.template.spec.containers[0].image";
pub const SERVICE_ACCOUNT: &str = "spec.template.spec.serviceAccountName";
pub const ENV_FROM: &str = "spec.template.spec.containers[0].envFrom";
pub const PORTS: &str = "spec.ports";
pub const SPEC: &str = "spec";
pub const STRING_DATA: &str = "stringData";
pub const DATA: &str = "data";

/// Kinds with a fixed list of significant fields.
pub trait ReconcileFields: StoreResource {
    /// Copies every significant field of `desired` that differs onto `self` and returns the
    /// names of the copied fields.
    fn reconcile_fields(&mut self, desired: &Self) -> BTreeSet<&'static str>;
}

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum ObjectOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Creates `desired` if it is absent, updates the live object if a significant field drifted
/// and leaves it alone otherwise.
///
/// Store errors are returned unchanged. Nothing is retried here.
#[tracing::instrument(
    skip_all,
    fields(kind = %client::kind::<K>(), name = %desired.name_any())
)]
pub async fn reconcile_object<S, K>(store: &S, desired: &K) -> client::Result<ObjectOutcome>
where
    S: ObjectStore,
    K: ReconcileFields,
{
    let namespace = client::namespace_of(desired)?;
    let Some(mut live) = store.get::<K>(&namespace, &desired.name_any()).await? else {
        store.create(desired).await?;
        tracing::info!("created object");
        return Ok(ObjectOutcome::Created);
    };

    let changed = live.reconcile_fields(desired);
    if changed.is_empty() {
        tracing::trace!("object is up to date");
        return Ok(ObjectOutcome::Unchanged);
    }

    store.update(&live).await?;
    tracing::info!(?changed, "updated object");
    Ok(ObjectOutcome::Updated)
}

/// Overwrites `live` with `desired` if they differ and records `field` in `changed`.
fn sync<T: Clone + PartialEq>(
    changed: &mut BTreeSet<&'static str>,
    field: &'static str,
    live: &mut T,
    desired: &T,
) {
    if live != desired {
        live.clone_from(desired);
        changed.insert(field);
    }
}

fn first_container(pod_spec: Option<&PodSpec>) -> Option<&Container> {
    pod_spec.and_then(|pod_spec| pod_spec.containers.first())
}

impl ReconcileFields for Deployment {
    fn reconcile_fields(&mut self, desired: &Self) -> BTreeSet<&'static str> {
        let mut changed = BTreeSet::new();
        let desired_template = desired.spec.as_ref().map(|spec| &spec.template);
        let desired_metadata = desired_template.and_then(|template| template.metadata.as_ref());
        let desired_pod = desired_template.and_then(|template| template.spec.as_ref());
        let desired_container = first_container(desired_pod);

        let template = &mut self.spec.get_or_insert_with(Default::default).template;
        sync(
            &mut changed,
            POD_TEMPLATE_LABELS,
            &mut template.metadata.get_or_insert_with(Default::default).labels,
            &desired_metadata.and_then(|metadata| metadata.labels.clone()),
        );

        let pod = template.spec.get_or_insert_with(Default::default);
        sync(
            &mut changed,
            SERVICE_ACCOUNT,
            &mut pod.service_account_name,
            &desired_pod.and_then(|pod| pod.service_account_name.clone()),
        );

        if let Some(desired) = desired_container {
            if let Some(container) = pod.containers.first_mut() {
                sync(&mut changed, IMAGE, &mut container.image, &desired.image);
                sync(&mut changed, ENV_FROM, &mut container.env_from, &desired.env_from);
            } else {
                pod.containers.push(desired.clone());
                changed.extend([IMAGE, ENV_FROM]);
            }
        }

        changed
    }
}

impl ReconcileFields for Service {
    fn reconcile_fields(&mut self, desired: &Self) -> BTreeSet<&'static str> {
        let mut changed = BTreeSet::new();
        sync(
            &mut changed,
            PORTS,
            &mut self.spec.get_or_insert_with(Default::default).ports,
            &desired.spec.as_ref().and_then(|spec| spec.ports.clone()),
        );
        changed
    }
}

impl ReconcileFields for Ingress {
    fn reconcile_fields(&mut self, desired: &Self) -> BTreeSet<&'static str> {
        let mut changed = BTreeSet::new();
        sync(&mut changed, SPEC, &mut self.spec, &desired.spec);
        changed
    }
}

impl ReconcileFields for Route {
    fn reconcile_fields(&mut self, desired: &Self) -> BTreeSet<&'static str> {
        let mut changed = BTreeSet::new();
        sync(&mut changed, SPEC, &mut self.spec, &desired.spec);
        changed
    }
}

/// The effective string view of a secret: decoded `data` overlaid with `stringData`.
pub fn secret_string_data(secret: &Secret) -> BTreeMap<String, String> {
    let decoded = secret.data.iter().flatten().map(|(field, value)| {
        (
            field.clone(),
            String::from_utf8_lossy(&value.0).into_owned(),
        )
    });
    let overlaid = secret
        .string_data
        .iter()
        .flatten()
        .map(|(field, value)| (field.clone(), value.clone()));
    decoded.chain(overlaid).collect()
}

impl ReconcileFields for Secret {
    /// A drifted secret gets the desired `stringData` and no `data`, so fields the desired
    /// secret dropped disappear from the live one.
    fn reconcile_fields(&mut self, desired: &Self) -> BTreeSet<&'static str> {
        let mut changed = BTreeSet::new();
        if secret_string_data(self) != secret_string_data(desired) {
            self.data = None;
            self.string_data = Some(secret_string_data(desired));
            changed.insert(STRING_DATA);
        }
        changed
    }
}

impl ReconcileFields for ConfigMap {
    fn reconcile_fields(&mut self, desired: &Self) -> BTreeSet<&'static str> {
        let mut changed = BTreeSet::new();
        sync(&mut changed, DATA, &mut self.data, &desired.data);
        changed
    }
}
