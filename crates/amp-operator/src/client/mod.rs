//! The object store boundary.
//!
//! Reconcilers only talk to the cluster through [`ObjectStore`]: a get that reports absence as
//! `None`, a create and an optimistic-concurrency update. [`Client`] implements it against the
//! Kubernetes API, [`memory::MemoryStore`] in memory.
use std::{fmt::Debug, future::Future};

use k8s_openapi::NamespaceResourceScope;
use kube::{
    Api, Resource, ResourceExt,
    api::PostParams,
    client::Client as KubeClient,
};
use serde::{Serialize, de::DeserializeOwned};
use snafu::{IntoError, OptionExt, ResultExt, Snafu};

pub mod memory;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("unable to create kubernetes client"))]
    CreateClient { source: kube::Error },

    #[snafu(display("failed to get {kind} {namespace}/{name}"))]
    Get {
        source: kube::Error,
        kind: String,
        namespace: String,
        name: String,
    },

    #[snafu(display("failed to create {kind} {name:?}"))]
    Create {
        source: kube::Error,
        kind: String,
        name: String,
    },

    #[snafu(display("failed to update {kind} {name:?}"))]
    Update {
        source: kube::Error,
        kind: String,
        name: String,
    },

    #[snafu(display("{kind} {name:?} has no namespace"))]
    MissingNamespace { kind: String, name: String },

    #[snafu(display("{kind} {namespace}/{name} already exists"))]
    AlreadyExists {
        kind: String,
        namespace: String,
        name: String,
    },

    #[snafu(display("{kind} {namespace}/{name} does not exist"))]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[snafu(display(
        "{kind} {namespace}/{name} was modified concurrently, resource version {resource_version:?} is stale"
    ))]
    Conflict {
        kind: String,
        namespace: String,
        name: String,
        resource_version: String,
    },

    #[snafu(display("failed to encode or decode {kind} {name:?}"))]
    Codec {
        source: serde_json::Error,
        kind: String,
        name: String,
    },

    #[snafu(display("injected {operation} failure"))]
    Injected { operation: &'static str },
}

/// Namespaced resource kinds the store can hold.
pub trait StoreResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
}

impl<K> StoreResource for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize
        + Send
        + Sync
        + 'static
{
}

pub trait ObjectStore: Send + Sync {
    /// Fetches an object. Absence is `Ok(None)`, every other failure is an error.
    fn get<K: StoreResource>(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<K>>> + Send;

    fn create<K: StoreResource>(&self, object: &K) -> impl Future<Output = Result<K>> + Send;

    /// Replaces an object. The resource version of `object` must match the stored one.
    fn update<K: StoreResource>(&self, object: &K) -> impl Future<Output = Result<K>> + Send;
}

pub(crate) fn kind<K: Resource<DynamicType = ()>>() -> String {
    K::kind(&()).into_owned()
}

/// Whether the API server refused a write with `409 Conflict`.
fn is_conflict(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 409)
}

/// A create answered with `409 Conflict` means the object already exists.
fn create_error<K: StoreResource>(source: kube::Error, object: &K, namespace: &str) -> Error {
    if is_conflict(&source) {
        return AlreadyExistsSnafu {
            kind: kind::<K>(),
            namespace,
            name: object.name_any(),
        }
        .build();
    }
    CreateSnafu {
        kind: kind::<K>(),
        name: object.name_any(),
    }
    .into_error(source)
}

/// An update answered with `409 Conflict` carried a stale resource version.
fn update_error<K: StoreResource>(source: kube::Error, object: &K, namespace: &str) -> Error {
    if is_conflict(&source) {
        return ConflictSnafu {
            kind: kind::<K>(),
            namespace,
            name: object.name_any(),
            resource_version: object.resource_version().unwrap_or_default(),
        }
        .build();
    }
    UpdateSnafu {
        kind: kind::<K>(),
        name: object.name_any(),
    }
    .into_error(source)
}

pub(crate) fn namespace_of<K: StoreResource>(object: &K) -> Result<String> {
    object.namespace().with_context(|| MissingNamespaceSnafu {
        kind: kind::<K>(),
        name: object.name_any(),
    })
}

/// This `Client` can be used to access Kubernetes.
/// It wraps an underlying [kube::client::Client] and provides some common functionality.
#[derive(Clone)]
pub struct Client {
    client: KubeClient,
    post_params: PostParams,
}

impl Client {
    pub fn new(client: KubeClient, field_manager: Option<String>) -> Self {
        Self {
            client,
            post_params: PostParams {
                field_manager,
                ..PostParams::default()
            },
        }
    }

    /// Returns a [kube::client::Client] that can be freely used.
    /// It does not need to be cloned before first use.
    pub fn get_api<T>(&self, namespace: &str) -> Api<T>
    where
        T: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn get_all_api<T>(&self) -> Api<T>
    where
        T: Resource<DynamicType = ()>,
    {
        Api::all(self.client.clone())
    }
}

impl ObjectStore for Client {
    async fn get<K: StoreResource>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        self.get_api::<K>(namespace)
            .get_opt(name)
            .await
            .with_context(|_| GetSnafu {
                kind: kind::<K>(),
                namespace,
                name,
            })
    }

    async fn create<K: StoreResource>(&self, object: &K) -> Result<K> {
        let namespace = namespace_of(object)?;
        self.get_api::<K>(&namespace)
            .create(&self.post_params, object)
            .await
            .map_err(|source| create_error(source, object, &namespace))
    }

    async fn update<K: StoreResource>(&self, object: &K) -> Result<K> {
        let namespace = namespace_of(object)?;
        self.get_api::<K>(&namespace)
            .replace(&object.name_any(), &self.post_params, object)
            .await
            .map_err(|source| update_error(source, object, &namespace))
    }
}

pub async fn create_client(field_manager: Option<String>) -> Result<Client> {
    let kube_client = KubeClient::try_default()
        .await
        .context(CreateClientSnafu)?;
    Ok(Client::new(kube_client, field_manager))
}

/// The namespace the controller watches. An empty string selects every namespace.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum WatchNamespace {
    All,
    One(String),
}

impl From<&str> for WatchNamespace {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::All
        } else {
            Self::One(s.to_owned())
        }
    }
}

impl WatchNamespace {
    /// Gets an API object for the namespace in question or for all namespaces,
    /// depending on which variant we are.
    pub fn get_api<T>(&self, client: &Client) -> Api<T>
    where
        T: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
    {
        match self {
            Self::All => client.get_all_api(),
            Self::One(namespace) => client.get_api::<T>(namespace),
        }
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::ConfigMap;
    use rstest::rstest;

    use super::*;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(
            serde_json::from_value(serde_json::json!({
                "apiVersion": "v1",
                "kind": "Status",
                "status": "Failure",
                "message": format!("request rejected: {reason}"),
                "reason": reason,
                "code": code,
            }))
            .expect("status decodes"),
        )
    }

    fn config_map() -> ConfigMap {
        let mut config_map = ConfigMap::default();
        config_map.metadata.name = Some("apicast-environment".to_owned());
        config_map.metadata.namespace = Some("tenants".to_owned());
        config_map.metadata.resource_version = Some("7".to_owned());
        config_map
    }

    #[rstest]
    #[case(409, "AlreadyExists", true)]
    #[case(403, "Forbidden", false)]
    #[case(500, "InternalError", false)]
    fn create_conflict_means_already_exists(
        #[case] code: u16,
        #[case] reason: &str,
        #[case] already_exists: bool,
    ) {
        let error = create_error(api_error(code, reason), &config_map(), "tenants");
        if already_exists {
            assert!(matches!(
                error,
                Error::AlreadyExists { ref kind, ref namespace, ref name }
                    if kind == "ConfigMap" && namespace == "tenants" && name == "apicast-environment"
            ));
        } else {
            assert!(matches!(error, Error::Create { .. }));
        }
    }

    #[rstest]
    #[case(409, "Conflict", true)]
    #[case(422, "Invalid", false)]
    #[case(503, "ServiceUnavailable", false)]
    fn update_conflict_means_stale_version(
        #[case] code: u16,
        #[case] reason: &str,
        #[case] conflict: bool,
    ) {
        let error = update_error(api_error(code, reason), &config_map(), "tenants");
        if conflict {
            assert!(matches!(
                error,
                Error::Conflict { ref resource_version, .. } if resource_version == "7"
            ));
        } else {
            assert!(matches!(error, Error::Update { .. }));
        }
    }

    #[test]
    fn empty_namespace_watches_everything() {
        assert_eq!(WatchNamespace::from(""), WatchNamespace::All);
        assert_eq!(
            WatchNamespace::from("tenants"),
            WatchNamespace::One("tenants".to_owned())
        );
    }
}
