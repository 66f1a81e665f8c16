use amp_operator::{
    apicast::{
        APIcast, APIcastSpec, ReconcileAction,
        crd::{AdminPortalCredentialsRef, SecretKeyRef},
        reconcile_apicast,
    },
    builder::meta::ObjectMetaBuilder,
    client::{
        self, ObjectStore,
        memory::{MemoryStore, Operation, StoreCall},
    },
    reconcile::{ObjectOutcome, reconcile_object},
};
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{ConfigMap, Secret},
};

const NAMESPACE: &str = "tenants";
const NAME: &str = "gateway";
const WORKLOAD: &str = "apicast-gateway";

fn seeded_store(image: Option<&str>) -> MemoryStore {
    let reference = |key: &str| SecretKeyRef {
        name: "portal".to_owned(),
        key: key.to_owned(),
    };
    let mut apicast = APIcast::new(
        NAME,
        APIcastSpec {
            image: image.map(str::to_owned),
            admin_portal_credentials_ref: AdminPortalCredentialsRef {
                url_secret_key_ref: reference("url"),
                access_token_secret_key_ref: reference("token"),
            },
            ..APIcastSpec::default()
        },
    );
    apicast.metadata.namespace = Some(NAMESPACE.to_owned());

    let portal = Secret {
        metadata: ObjectMetaBuilder::new()
            .name("portal")
            .namespace(NAMESPACE)
            .build(),
        string_data: Some(
            [
                ("url".to_owned(), "https://admin.example.com".to_owned()),
                ("token".to_owned(), "s3cr3t".to_owned()),
            ]
            .into(),
        ),
        ..Secret::default()
    };

    let store = MemoryStore::new();
    store.insert(&apicast).expect("APIcast encodes");
    store.insert(&portal).expect("secret encodes");
    store
}

async fn reconcile(store: &MemoryStore) -> ReconcileAction {
    reconcile_apicast(store, NAMESPACE, NAME)
        .await
        .expect("reconcile succeeds")
}

/// Persists the defaults of a fresh custom resource and converges its objects.
async fn converge(store: &MemoryStore) {
    if reconcile(store).await == ReconcileAction::NeedsRequeue {
        assert_eq!(reconcile(store).await, ReconcileAction::Done);
    }
}

fn deployment(store: &MemoryStore) -> Deployment {
    store
        .object::<Deployment>(NAMESPACE, WORKLOAD)
        .expect("deployment decodes")
        .expect("deployment exists")
}

fn image(deployment: &Deployment) -> Option<&str> {
    deployment
        .spec
        .as_ref()?
        .template
        .spec
        .as_ref()?
        .containers
        .first()?
        .image
        .as_deref()
}

fn updates(store: &MemoryStore) -> Vec<String> {
    store
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            StoreCall::Update(key) => Some(format!("{}/{}", key.kind, key.name)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn defaults_then_converge_then_idle() {
    let store = seeded_store(None);

    assert_eq!(reconcile(&store).await, ReconcileAction::NeedsRequeue);
    assert_eq!(updates(&store), ["APIcast/gateway"]);
    assert_eq!(store.len(), 2);

    store.clear_calls();
    assert_eq!(reconcile(&store).await, ReconcileAction::Done);
    assert!(updates(&store).is_empty());
    assert_eq!(store.len(), 5);
    assert_eq!(
        image(&deployment(&store)),
        Some("registry.access.redhat.com/3scale-amp25/apicast-gateway")
    );

    store.clear_calls();
    assert_eq!(reconcile(&store).await, ReconcileAction::Done);
    assert!(updates(&store).is_empty());
}

#[tokio::test]
async fn image_change_only_touches_the_image() {
    let store = seeded_store(Some("quay.io/3scale/apicast:v1"));
    converge(&store).await;
    let before = deployment(&store);

    let mut apicast = store
        .object::<APIcast>(NAMESPACE, NAME)
        .expect("APIcast decodes")
        .expect("APIcast exists");
    apicast.spec.image = Some("quay.io/3scale/apicast:v2".to_owned());
    store.update(&apicast).await.expect("APIcast is updated");

    store.clear_calls();
    assert_eq!(reconcile(&store).await, ReconcileAction::Done);
    assert_eq!(updates(&store), ["Deployment/apicast-gateway"]);

    let after = deployment(&store);
    assert_eq!(image(&after), Some("quay.io/3scale/apicast:v2"));

    let mut expected = before.clone();
    if let Some(container) = expected
        .spec
        .as_mut()
        .and_then(|spec| spec.template.spec.as_mut())
        .and_then(|spec| spec.containers.first_mut())
    {
        container.image = Some("quay.io/3scale/apicast:v2".to_owned());
    }
    expected.metadata.resource_version = after.metadata.resource_version.clone();
    assert_eq!(after, expected);
    assert_eq!(after.metadata.labels, before.metadata.labels);
}

#[tokio::test]
async fn not_found_routes_to_create() {
    let store = MemoryStore::new();
    let config_map = ConfigMap {
        metadata: ObjectMetaBuilder::new()
            .name("apicast-environment")
            .namespace(NAMESPACE)
            .build(),
        data: Some([("APICAST_LOG_LEVEL".to_owned(), "warn".to_owned())].into()),
        ..ConfigMap::default()
    };

    let outcome = reconcile_object(&store, &config_map)
        .await
        .expect("absent object is created");
    assert_eq!(outcome, ObjectOutcome::Created);
    assert!(
        store
            .calls()
            .iter()
            .all(|call| !matches!(call, StoreCall::Update(_)))
    );
}

#[tokio::test]
async fn store_failures_surface_unchanged() {
    let store = seeded_store(Some("quay.io/3scale/apicast:v1"));
    store.fail(Operation::Get);

    let error = reconcile_apicast(&store, NAMESPACE, NAME)
        .await
        .expect_err("get fails");
    let source = std::error::Error::source(&error).expect("store error is the source");
    assert!(source.downcast_ref::<client::Error>().is_some());
    assert!(store.calls().iter().all(|call| matches!(call, StoreCall::Get(_))));

    store.recover(Operation::Get);
    converge(&store).await;
    assert_eq!(store.len(), 5);
}
