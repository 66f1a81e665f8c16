//! An in-memory [`ObjectStore`] for tests and dry runs.
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use k8s_openapi::{ByteString, api::core::v1::Secret};
use kube::{Resource, ResourceExt};
use serde_json::Value;
use snafu::{ResultExt, ensure};

use super::{
    AlreadyExistsSnafu, CodecSnafu, ConflictSnafu, InjectedSnafu, NotFoundSnafu, ObjectStore,
    Result, StoreResource, kind, namespace_of,
};

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StoreKey {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl StoreKey {
    pub fn of<K: Resource<DynamicType = ()>>(namespace: &str, name: &str) -> Self {
        Self {
            kind: kind::<K>(),
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Get,
    Create,
    Update,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreCall {
    Get(StoreKey),
    Create(StoreKey),
    Update(StoreKey),
}

impl StoreCall {
    pub fn key(&self) -> &StoreKey {
        match self {
            Self::Get(key) | Self::Create(key) | Self::Update(key) => key,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<StoreKey, Value>,
    calls: Vec<StoreCall>,
    failing: BTreeSet<Operation>,
    last_version: u64,
}

impl Inner {
    fn next_version(&mut self) -> String {
        self.last_version += 1;
        self.last_version.to_string()
    }
}

/// Keeps objects as JSON keyed by kind, namespace and name.
///
/// Mimics the parts of the API server the reconcilers rely on: creates assign a uid and a
/// resource version, updates are rejected when the resource version is stale and the
/// `stringData` of a Secret is folded into its `data`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds an object without recording a call. Existing objects are overwritten.
    pub fn insert<K: StoreResource>(&self, object: &K) -> Result<()> {
        let mut inner = self.lock();
        let version = inner.next_version();
        let key = StoreKey::of::<K>(&namespace_of(object)?, &object.name_any());
        let value = to_stored(object, &version, &key)?;
        inner.objects.insert(key, value);
        Ok(())
    }

    /// Reads an object without recording a call.
    pub fn object<K: StoreResource>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        let key = StoreKey::of::<K>(namespace, name);
        self.lock()
            .objects
            .get(&key)
            .map(|value| from_stored(value.clone(), &key))
            .transpose()
    }

    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().objects.is_empty()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Makes every following call of `operation` fail until [`Self::recover`].
    pub fn fail(&self, operation: Operation) {
        self.lock().failing.insert(operation);
    }

    pub fn recover(&self, operation: Operation) {
        self.lock().failing.remove(&operation);
    }
}

fn check_failure(inner: &Inner, operation: Operation) -> Result<()> {
    ensure!(
        !inner.failing.contains(&operation),
        InjectedSnafu {
            operation: <&'static str>::from(operation)
        }
    );
    Ok(())
}

fn to_stored<K: StoreResource>(object: &K, version: &str, key: &StoreKey) -> Result<Value> {
    let mut object = object.clone();
    let meta = object.meta_mut();
    meta.resource_version = Some(version.to_owned());
    meta.uid.get_or_insert_with(|| format!("memory-{version}"));

    let mut value = serde_json::to_value(&object).with_context(|_| CodecSnafu {
        kind: key.kind.clone(),
        name: key.name.clone(),
    })?;
    if key.kind == kind::<Secret>() {
        value = fold_string_data(value, key)?;
    }
    Ok(value)
}

fn from_stored<K: StoreResource>(value: Value, key: &StoreKey) -> Result<K> {
    serde_json::from_value(value).with_context(|_| CodecSnafu {
        kind: key.kind.clone(),
        name: key.name.clone(),
    })
}

fn fold_string_data(value: Value, key: &StoreKey) -> Result<Value> {
    let mut secret: Secret = from_stored(value, key)?;
    if let Some(string_data) = secret.string_data.take() {
        secret.data.get_or_insert_with(BTreeMap::new).extend(
            string_data
                .into_iter()
                .map(|(field, value)| (field, ByteString(value.into_bytes()))),
        );
    }
    serde_json::to_value(&secret).with_context(|_| CodecSnafu {
        kind: key.kind.clone(),
        name: key.name.clone(),
    })
}

impl ObjectStore for MemoryStore {
    async fn get<K: StoreResource>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        let key = StoreKey::of::<K>(namespace, name);
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Get(key.clone()));
        check_failure(&inner, Operation::Get)?;
        inner
            .objects
            .get(&key)
            .map(|value| from_stored(value.clone(), &key))
            .transpose()
    }

    async fn create<K: StoreResource>(&self, object: &K) -> Result<K> {
        let key = StoreKey::of::<K>(&namespace_of(object)?, &object.name_any());
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Create(key.clone()));
        check_failure(&inner, Operation::Create)?;
        ensure!(
            !inner.objects.contains_key(&key),
            AlreadyExistsSnafu {
                kind: key.kind.clone(),
                namespace: key.namespace.clone(),
                name: key.name.clone(),
            }
        );

        let version = inner.next_version();
        let value = to_stored(object, &version, &key)?;
        inner.objects.insert(key.clone(), value.clone());
        from_stored(value, &key)
    }

    async fn update<K: StoreResource>(&self, object: &K) -> Result<K> {
        let key = StoreKey::of::<K>(&namespace_of(object)?, &object.name_any());
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Update(key.clone()));
        check_failure(&inner, Operation::Update)?;

        let Some(stored) = inner.objects.get(&key) else {
            return NotFoundSnafu {
                kind: key.kind.clone(),
                namespace: key.namespace.clone(),
                name: key.name.clone(),
            }
            .fail();
        };
        let actual = stored
            .pointer("/metadata/resourceVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let uid = stored
            .pointer("/metadata/uid")
            .and_then(Value::as_str)
            .map(str::to_owned);
        if let Some(expected) = object.resource_version() {
            ensure!(
                expected == actual,
                ConflictSnafu {
                    kind: key.kind.clone(),
                    namespace: key.namespace.clone(),
                    name: key.name.clone(),
                    resource_version: expected,
                }
            );
        }

        let mut object = object.clone();
        object.meta_mut().uid = uid;
        let version = inner.next_version();
        let value = to_stored(&object, &version, &key)?;
        inner.objects.insert(key.clone(), value.clone());
        from_stored(value, &key)
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::ConfigMap;

    use super::*;
    use crate::{builder::meta::ObjectMetaBuilder, client::Error};

    fn config_map(data: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMetaBuilder::new()
                .name("settings")
                .namespace("tenants")
                .build(),
            data: Some([("mode".to_owned(), data.to_owned())].into()),
            ..ConfigMap::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_identity_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let created = store.create(&config_map("a")).await.expect("store is empty");
        assert_eq!(created.metadata.resource_version.as_deref(), Some("1"));
        assert_eq!(created.metadata.uid.as_deref(), Some("memory-1"));

        let error = store
            .create(&config_map("b"))
            .await
            .expect_err("object already exists");
        assert!(matches!(error, Error::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn update_rejects_stale_versions() {
        let store = MemoryStore::new();
        let created = store.create(&config_map("a")).await.expect("store is empty");

        let mut current = created.clone();
        current.data = Some([("mode".to_owned(), "b".to_owned())].into());
        let updated = store.update(&current).await.expect("version is current");
        assert_eq!(updated.metadata.resource_version.as_deref(), Some("2"));
        assert_eq!(updated.metadata.uid, created.metadata.uid);

        let error = store.update(&created).await.expect_err("version is stale");
        assert!(matches!(
            error,
            Error::Conflict { ref resource_version, .. } if resource_version == "1"
        ));
    }

    #[tokio::test]
    async fn update_of_missing_object_fails() {
        let store = MemoryStore::new();
        let error = store
            .update(&config_map("a"))
            .await
            .expect_err("nothing to update");
        assert!(matches!(error, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn secret_string_data_is_folded_into_data() {
        let store = MemoryStore::new();
        let secret = Secret {
            metadata: ObjectMetaBuilder::new()
                .name("credentials")
                .namespace("tenants")
                .build(),
            string_data: Some([("token".to_owned(), "s3cr3t".to_owned())].into()),
            ..Secret::default()
        };
        let stored = store.create(&secret).await.expect("store is empty");

        assert_eq!(stored.string_data, None);
        assert_eq!(
            stored.data.and_then(|data| data.get("token").cloned()),
            Some(ByteString(b"s3cr3t".to_vec()))
        );
    }

    #[tokio::test]
    async fn records_calls_and_injects_failures() {
        let store = MemoryStore::new();
        store.insert(&config_map("a")).expect("config map encodes");
        assert!(store.calls().is_empty());

        store.fail(Operation::Get);
        let error = store
            .get::<ConfigMap>("tenants", "settings")
            .await
            .expect_err("get is failing");
        assert!(matches!(error, Error::Injected { operation: "get" }));

        store.recover(Operation::Get);
        let found = store
            .get::<ConfigMap>("tenants", "settings")
            .await
            .expect("get recovered");
        assert!(found.is_some());

        let key = StoreKey::of::<ConfigMap>("tenants", "settings");
        assert_eq!(
            store.calls(),
            [StoreCall::Get(key.clone()), StoreCall::Get(key)]
        );
    }
}
