use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ObjectReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const LATEST_TAG: &str = "latest";

#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "image.openshift.io",
    version = "v1",
    kind = "ImageStream",
    plural = "imagestreams",
    namespaced,
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagReference>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagReference {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ObjectReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_policy: Option<TagImportPolicy>,
}

impl TagReference {
    /// A tag that follows another tag of the same image stream.
    pub fn alias(name: impl Into<String>, target_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from: Some(ObjectReference {
                kind: Some("ImageStreamTag".to_owned()),
                name: Some(target_tag.into()),
                ..ObjectReference::default()
            }),
            ..Self::default()
        }
    }

    /// A tag that imports the external image `image`.
    pub fn docker_image(name: impl Into<String>, image: impl Into<String>, insecure: bool) -> Self {
        Self {
            name: name.into(),
            from: Some(ObjectReference {
                kind: Some("DockerImage".to_owned()),
                name: Some(image.into()),
                ..ObjectReference::default()
            }),
            import_policy: Some(TagImportPolicy {
                insecure: Some(insecure),
            }),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagImportPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
}
