//! Swaps shared persistent volumes for S3 compatible object storage.
use k8s_openapi::api::core::v1::EnvVar;
use snafu::OptionExt;

use super::{MissingEnvironmentConfigMapSnafu, Result, TransformStage, Transformer};
use crate::{
    builder::pod::env::{env_var_from_config_map, env_var_from_secret},
    component::{
        SharedStorage,
        s3::{ACCESS_KEY_ID_FIELD, S3Options, SECRET_ACCESS_KEY_FIELD},
    },
    object::{ObjectKey, ObjectKind, ResourceObject},
    template::Bundle,
};

pub const FILE_UPLOAD_STORAGE: &str = "FILE_UPLOAD_STORAGE";
pub const AWS_BUCKET: &str = "AWS_BUCKET";
pub const AWS_REGION: &str = "AWS_REGION";
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

/// For every declared shared storage:
/// * writes the storage settings into the environment config map,
/// * removes the volume and its mounts from the sharing workloads and their pre-deployment hook,
/// * points the workloads and the hook at the config map and the credentials secret,
/// * deletes the claim and the parameter that configured it.
#[derive(Clone, Debug)]
pub struct ExternalStorage {
    options: S3Options,
}

impl ExternalStorage {
    pub fn new(options: S3Options) -> Self {
        Self { options }
    }

    fn env_vars(&self, storage: &SharedStorage) -> Vec<EnvVar> {
        let config_map = storage.environment_config_map.as_str();
        let credentials = self.options.aws_credentials_secret().as_str();
        vec![
            env_var_from_config_map(FILE_UPLOAD_STORAGE, config_map, FILE_UPLOAD_STORAGE),
            env_var_from_secret(AWS_ACCESS_KEY_ID, credentials, ACCESS_KEY_ID_FIELD),
            env_var_from_secret(AWS_SECRET_ACCESS_KEY, credentials, SECRET_ACCESS_KEY_FIELD),
            env_var_from_config_map(AWS_BUCKET, config_map, AWS_BUCKET),
            env_var_from_config_map(AWS_REGION, config_map, AWS_REGION),
        ]
    }

    fn swap(&self, bundle: &mut Bundle, storage: &SharedStorage) -> Result<()> {
        let key = ObjectKey::template(ObjectKind::ConfigMap, storage.environment_config_map.as_str());
        let config_map = match bundle.object_mut(&key) {
            Some(ResourceObject::ConfigMap(config_map)) => Some(config_map),
            _ => None,
        }
        .context(MissingEnvironmentConfigMapSnafu {
            volume: storage.volume.as_str(),
            config_map: storage.environment_config_map.as_str(),
        })?;

        config_map.data.get_or_insert_with(Default::default).extend([
            (
                FILE_UPLOAD_STORAGE.to_owned(),
                self.options.file_upload_storage().clone(),
            ),
            (AWS_BUCKET.to_owned(), self.options.aws_bucket().clone()),
            (AWS_REGION.to_owned(), self.options.aws_region().clone()),
        ]);

        let env_vars = self.env_vars(storage);
        for object in bundle.objects_mut() {
            if !object.is_workload() || !storage.workloads.contains(object.name()) {
                continue;
            }

            if let ResourceObject::DeploymentConfig(deployment_config) = object
                && let Some(hook) = deployment_config.spec.strategy.pre_hook_mut()
            {
                hook.volumes.retain(|volume| *volume != storage.volume);
                hook.env.extend(env_vars.iter().cloned());
            }

            let Some(pod_spec) = object.pod_spec_mut() else {
                continue;
            };
            if let Some(volumes) = pod_spec.volumes.as_mut() {
                volumes.retain(|volume| volume.name != storage.volume);
            }
            for container in pod_spec
                .containers
                .iter_mut()
                .chain(pod_spec.init_containers.iter_mut().flatten())
            {
                if let Some(mounts) = container.volume_mounts.as_mut() {
                    mounts.retain(|mount| mount.name != storage.volume);
                }
            }
            for container in &mut pod_spec.containers {
                container
                    .env
                    .get_or_insert_with(Vec::new)
                    .extend(env_vars.iter().cloned());
            }
        }

        bundle.remove_object(&ObjectKey::template(
            ObjectKind::PersistentVolumeClaim,
            storage.claim.as_str(),
        ));
        if let Some(parameter) = &storage.parameter {
            bundle.remove_parameter(parameter);
        }

        tracing::debug!(volume = storage.volume, "moved shared storage to object storage");
        Ok(())
    }
}

impl Transformer for ExternalStorage {
    fn name(&self) -> &'static str {
        "external-storage"
    }

    fn stage(&self) -> TransformStage {
        TransformStage::ExternalStorage
    }

    fn transform(&self, mut bundle: Bundle) -> Result<Bundle> {
        let shared_storage = bundle.capabilities().shared_storage.clone();
        for storage in &shared_storage {
            self.swap(&mut bundle, storage)?;
        }
        Ok(bundle)
    }
}
