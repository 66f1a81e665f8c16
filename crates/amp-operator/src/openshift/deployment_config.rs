use k8s_openapi::api::core::v1::{EnvVar, ObjectReference, PodTemplateSpec};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::labels::Labels;

pub const STRATEGY_ROLLING: &str = "Rolling";
pub const STRATEGY_RECREATE: &str = "Recreate";

#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "apps.openshift.io",
    version = "v1",
    kind = "DeploymentConfig",
    plural = "deploymentconfigs",
    namespaced,
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfigSpec {
    pub replicas: i32,

    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub selector: Labels,

    #[serde(default)]
    pub strategy: DeploymentStrategy,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<DeploymentTriggerPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplateSpec>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStrategy {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_params: Option<RollingDeploymentStrategyParams>,
}

impl DeploymentStrategy {
    pub fn rolling() -> Self {
        Self {
            type_: STRATEGY_ROLLING.to_owned(),
            rolling_params: Some(RollingDeploymentStrategyParams {
                interval_seconds: Some(1),
                max_surge: Some("25%".to_owned()),
                max_unavailable: Some("25%".to_owned()),
                timeout_seconds: Some(600),
                update_period_seconds: Some(1),
                pre: None,
            }),
        }
    }

    pub fn recreate() -> Self {
        Self {
            type_: STRATEGY_RECREATE.to_owned(),
            rolling_params: None,
        }
    }

    /// Rolling strategy that runs `hook` in a fresh pod before every rollout.
    pub fn rolling_with_pre_hook(hook: LifecycleHook) -> Self {
        let mut strategy = Self::rolling();
        if let Some(params) = strategy.rolling_params.as_mut() {
            params.pre = Some(hook);
        }
        strategy
    }

    pub fn pre_hook(&self) -> Option<&ExecNewPodHook> {
        self.rolling_params
            .as_ref()?
            .pre
            .as_ref()?
            .exec_new_pod
            .as_ref()
    }

    pub fn pre_hook_mut(&mut self) -> Option<&mut ExecNewPodHook> {
        self.rolling_params
            .as_mut()?
            .pre
            .as_mut()?
            .exec_new_pod
            .as_mut()
    }
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingDeploymentStrategyParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_surge: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_period_seconds: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre: Option<LifecycleHook>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleHook {
    pub failure_policy: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_new_pod: Option<ExecNewPodHook>,
}

/// A hook that runs `command` in a new pod based on the container `container_name`.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecNewPodHook {
    pub command: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    pub container_name: String,

    /// Names of pod template volumes the hook pod mounts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTriggerPolicy {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_change_params: Option<DeploymentTriggerImageChangeParams>,
}

impl DeploymentTriggerPolicy {
    pub fn config_change() -> Self {
        Self {
            type_: "ConfigChange".to_owned(),
            image_change_params: None,
        }
    }

    /// Redeploys `container_names` whenever the image stream tag `image_stream_tag` changes.
    pub fn image_change<'a>(
        container_names: impl IntoIterator<Item = &'a str>,
        image_stream_tag: impl Into<String>,
    ) -> Self {
        Self {
            type_: "ImageChange".to_owned(),
            image_change_params: Some(DeploymentTriggerImageChangeParams {
                automatic: true,
                container_names: container_names.into_iter().map(str::to_owned).collect(),
                from: ObjectReference {
                    kind: Some("ImageStreamTag".to_owned()),
                    name: Some(image_stream_tag.into()),
                    ..ObjectReference::default()
                },
            }),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTriggerImageChangeParams {
    pub automatic: bool,
    pub container_names: Vec<String>,
    pub from: ObjectReference,
}
