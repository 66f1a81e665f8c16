//! Makes a bundle runnable on small evaluation clusters.
use super::{Result, TransformStage, Transformer};
use crate::template::Bundle;

/// Drops the resource requests and limits of every workload container.
#[derive(Clone, Copy, Debug, Default)]
pub struct Evaluation;

impl Transformer for Evaluation {
    fn name(&self) -> &'static str {
        "evaluation"
    }

    fn stage(&self) -> TransformStage {
        TransformStage::Evaluation
    }

    fn transform(&self, mut bundle: Bundle) -> Result<Bundle> {
        for object in bundle.objects_mut() {
            let Some(pod_spec) = object.pod_spec_mut() else {
                continue;
            };
            for container in pod_spec
                .containers
                .iter_mut()
                .chain(pod_spec.init_containers.iter_mut().flatten())
            {
                container.resources = None;
            }
        }
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{Container, PodSpec, PodTemplateSpec, ResourceRequirements, Secret},
    };

    use super::*;
    use crate::{
        builder::{meta::ObjectMetaBuilder, pod::resources::ResourceRequirementsBuilder},
        object::ResourceObject,
        openshift::{DeploymentConfig, DeploymentConfigSpec},
    };

    fn limited_pod() -> PodTemplateSpec {
        let resources: ResourceRequirements = ResourceRequirementsBuilder::new()
            .with_cpu_request("100m")
            .with_memory_limit("128Mi")
            .build();
        PodTemplateSpec {
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "main".to_owned(),
                    resources: Some(resources),
                    ..Container::default()
                }],
                ..PodSpec::default()
            }),
            ..PodTemplateSpec::default()
        }
    }

    #[test]
    fn strips_resources_of_both_workload_kinds() {
        let mut bundle = Bundle::new();
        bundle
            .push_object(
                DeploymentConfig {
                    metadata: ObjectMetaBuilder::new().name("backend-listener").build(),
                    spec: DeploymentConfigSpec {
                        template: Some(limited_pod()),
                        ..DeploymentConfigSpec::default()
                    },
                }
                .into(),
            )
            .expect("unique");
        bundle
            .push_object(
                Deployment {
                    metadata: ObjectMetaBuilder::new().name("apicast-example").build(),
                    spec: Some(DeploymentSpec {
                        template: limited_pod(),
                        ..DeploymentSpec::default()
                    }),
                    ..Deployment::default()
                }
                .into(),
            )
            .expect("unique");
        let secret = Secret {
            metadata: ObjectMetaBuilder::new().name("backend-redis").build(),
            ..Secret::default()
        };
        bundle.push_object(secret.clone().into()).expect("unique");

        let bundle = Evaluation.transform(bundle).expect("evaluation never fails");

        let mut workloads = 0;
        for object in bundle.objects() {
            if let Some(template) = object.pod_template() {
                workloads += 1;
                let spec = template.spec.as_ref().expect("pod spec is kept");
                assert!(spec.containers.iter().all(|c| c.resources.is_none()));
            }
        }
        assert_eq!(workloads, 2);
        assert!(bundle.objects().any(|object| *object == ResourceObject::Secret(secret.clone())));
    }
}
