use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};
use snafu::{OptionExt, Snafu};

use crate::labels::{self, Labels};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("object is missing key {key:?}"))]
    MissingObjectKey { key: &'static str },
}

/// A builder to build [`ObjectMeta`] objects.
///
/// Of special interest is the [`Self::ownerreference_from_resource()`] function.
/// Note: This builder only supports a single `OwnerReference`.
#[derive(Clone, Debug, Default)]
pub struct ObjectMetaBuilder {
    name: Option<String>,
    namespace: Option<String>,
    ownerreference: Option<OwnerReference>,
    labels: Option<Labels>,
    annotations: Option<Labels>,
}

impl ObjectMetaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the `OwnerReference` to the provided resource.
    pub fn ownerreference_from_resource<T: Resource<DynamicType = ()>>(
        &mut self,
        resource: &T,
        block_owner_deletion: Option<bool>,
        controller: Option<bool>,
    ) -> Result<&mut Self> {
        self.ownerreference = Some(
            OwnerReferenceBuilder::new()
                .initialize_from_resource(resource)
                .block_owner_deletion_opt(block_owner_deletion)
                .controller_opt(controller)
                .build()?,
        );
        Ok(self)
    }

    /// This adds a single annotation to the existing annotations.
    /// It'll override an annotation with the same key.
    pub fn with_annotation(
        &mut self,
        annotation_key: impl Into<String>,
        annotation_value: impl Into<String>,
    ) -> &mut Self {
        self.annotations
            .get_or_insert_with(Labels::new)
            .insert(annotation_key.into(), annotation_value.into());
        self
    }

    /// This adds multiple labels to the existing labels.
    /// Any existing label with a key that is contained in `labels` will be overwritten
    pub fn with_labels(&mut self, labels: Labels) -> &mut Self {
        self.labels.get_or_insert_with(Labels::new).extend(labels);
        self
    }

    /// Sets the application and component role labels every generated object carries.
    pub fn with_component_labels(&mut self, app: &str, component: &str) -> &mut Self {
        self.with_labels(labels::sets::component(app, component))
    }

    pub fn build(&self) -> ObjectMeta {
        ObjectMeta {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            owner_references: self
                .ownerreference
                .as_ref()
                .map(|ownerreference| vec![ownerreference.clone()]),
            labels: self.labels.clone(),
            annotations: self.annotations.clone(),
            ..ObjectMeta::default()
        }
    }
}

/// A builder to build [`OwnerReference`] objects.
///
/// Of special interest is the [`Self::initialize_from_resource()`] function.
#[derive(Clone, Debug, Default)]
pub struct OwnerReferenceBuilder {
    api_version: Option<String>,
    block_owner_deletion: Option<bool>,
    controller: Option<bool>,
    kind: Option<String>,
    name: Option<String>,
    uid: Option<String>,
}

impl OwnerReferenceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_owner_deletion_opt(&mut self, block_owner_deletion: Option<bool>) -> &mut Self {
        self.block_owner_deletion = block_owner_deletion;
        self
    }

    pub fn controller_opt(&mut self, controller: Option<bool>) -> &mut Self {
        self.controller = controller;
        self
    }

    /// Copies api version, kind, name and uid from `resource`.
    pub fn initialize_from_resource<T: Resource<DynamicType = ()>>(
        &mut self,
        resource: &T,
    ) -> &mut Self {
        self.api_version = Some(T::api_version(&()).to_string());
        self.kind = Some(T::kind(&()).to_string());
        self.name = Some(resource.name_any());
        self.uid = resource.meta().uid.clone();
        self
    }

    pub fn build(&self) -> Result<OwnerReference> {
        Ok(OwnerReference {
            api_version: self
                .api_version
                .clone()
                .context(MissingObjectKeySnafu { key: "api_version" })?,
            block_owner_deletion: self.block_owner_deletion,
            controller: self.controller,
            kind: self
                .kind
                .clone()
                .context(MissingObjectKeySnafu { key: "kind" })?,
            name: self
                .name
                .clone()
                .context(MissingObjectKeySnafu { key: "name" })?,
            uid: self
                .uid
                .clone()
                .context(MissingObjectKeySnafu { key: "uid" })?,
        })
    }
}
