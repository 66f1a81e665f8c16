use std::collections::BTreeMap;

use amp_operator::{
    component::{backend, images, memcached, mysql, redis, system, zync},
    labels,
    object::{ObjectKey, ObjectKind, ResourceObject},
    template::{
        Bundle,
        adapters::{
            AMP_RELEASE, APP_LABEL, RWX_STORAGE_CLASS, TENANT_NAME, WILDCARD_DOMAIN,
            high_availability::HighAvailabilityAdapter, mysql::MYSQL_ROOT_PASSWORD,
            s3::S3Adapter, system::RECAPTCHA_PRIVATE_KEY, wildcard_router::WILDCARD_POLICY,
        },
        placeholder,
        variant::TemplateVariant,
    },
    transform::{
        Evaluation, ExternalStorage, HighAvailability, TransformChain, Transformer,
        productized::BACKEND_IMAGE,
    },
};
use k8s_openapi::api::core::v1::Service;
use rstest::rstest;
use strum::IntoEnumIterator;

fn bundle(variant: TemplateVariant, productized: bool) -> Bundle {
    variant
        .bundle(productized)
        .expect("every variant assembles")
}

fn object<'a>(bundle: &'a Bundle, kind: ObjectKind, name: &str) -> Option<&'a ResourceObject> {
    bundle.object(&ObjectKey::template(kind, name))
}

fn workload<'a>(bundle: &'a Bundle, name: &str) -> &'a ResourceObject {
    object(bundle, ObjectKind::DeploymentConfig, name).expect("workload is part of the bundle")
}

#[rstest]
fn variants_keep_the_label_contract(
    #[values(
        TemplateVariant::Amp,
        TemplateVariant::AmpEval,
        TemplateVariant::AmpHa,
        TemplateVariant::AmpS3
    )]
    variant: TemplateVariant,
    #[values(false, true)] productized: bool,
) {
    let bundle = bundle(variant, productized);

    for object in bundle.objects() {
        let labels = object.labels().expect("every object carries labels");
        assert!(labels.contains_key(labels::APP_KEY), "{}", object.key());
        assert!(labels.contains_key(labels::COMPONENT_KEY), "{}", object.key());
    }

    let pod_labels: Vec<_> = bundle
        .objects()
        .filter_map(ResourceObject::pod_template)
        .filter_map(|template| template.metadata.as_ref()?.labels.clone())
        .collect();
    for object in bundle.objects() {
        let ResourceObject::Service(Service { spec, .. }) = object else {
            continue;
        };
        let selector = spec
            .as_ref()
            .and_then(|spec| spec.selector.as_ref())
            .expect("every service has a selector");
        assert!(
            pod_labels.iter().any(|labels| {
                selector
                    .iter()
                    .all(|(key, value)| labels.get(key) == Some(value))
            }),
            "service {} selects {selector:?} which no workload carries",
            object.key()
        );
    }
}

#[test]
fn parameter_names_are_unique_and_upper_snake_case() {
    for variant in TemplateVariant::iter() {
        let bundle = bundle(variant, false);
        let mut seen = std::collections::BTreeSet::new();
        for parameter in bundle.parameters() {
            assert!(seen.insert(parameter.name.clone()), "{} twice", parameter.name);
            assert!(
                parameter
                    .name
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'),
                "{} is not upper snake case",
                parameter.name
            );
        }
    }
}

#[test]
fn shared_parameters_are_declared_by_their_owners() {
    let amp = bundle(TemplateVariant::Amp, false);
    let names: Vec<_> = amp
        .parameters()
        .map(|parameter| parameter.name.as_str())
        .collect();
    let position = |name: &str| {
        names
            .iter()
            .position(|candidate| *candidate == name)
            .expect("parameter is declared")
    };

    assert_eq!(names[..3], [AMP_RELEASE, APP_LABEL, TENANT_NAME]);
    assert_eq!(position(RWX_STORAGE_CLASS), position(RECAPTCHA_PRIVATE_KEY) + 1);
    assert_eq!(names[names.len() - 2..], [WILDCARD_DOMAIN, WILDCARD_POLICY]);
}

#[test]
fn every_declared_parameter_is_referenced() {
    let amp = bundle(TemplateVariant::Amp, false);
    let rendered = serde_json::to_string(&amp.objects().collect::<Vec<_>>())
        .expect("objects serialize");
    for parameter in amp.parameters() {
        assert!(
            rendered.contains(&parameter.placeholder()),
            "{} is declared but no object references it",
            parameter.name
        );
    }
}

#[rstest]
#[case::amp(TemplateVariant::Amp)]
#[case::high_availability(TemplateVariant::AmpHa)]
#[case::external_storage(TemplateVariant::AmpS3)]
fn processing_leaves_no_placeholder_behind(#[case] variant: TemplateVariant) {
    let bundle = bundle(variant, false);
    let values: BTreeMap<_, _> = bundle
        .parameters()
        .filter(|parameter| parameter.value.is_none() && parameter.generate.is_none())
        .map(|parameter| {
            (
                parameter.name.clone(),
                format!("supplied-{}", parameter.name.to_lowercase()),
            )
        })
        .collect();

    let processed = bundle.process(&values).expect("every parameter resolves");
    let rendered = serde_json::to_string(&processed.objects).expect("objects serialize");
    assert!(
        !rendered.contains("${"),
        "{variant} references a parameter it does not declare"
    );
}

#[test]
fn high_availability_scales_all_but_singletons() {
    let amp = bundle(TemplateVariant::Amp, false);
    let ha = bundle(TemplateVariant::AmpHa, false);

    assert_eq!(workload(&amp, backend::BACKEND_LISTENER).replicas(), Some(1));
    assert_eq!(workload(&ha, backend::BACKEND_LISTENER).replicas(), Some(2));
    assert_eq!(workload(&ha, system::SYSTEM_APP).replicas(), Some(2));
    assert_eq!(workload(&ha, memcached::SYSTEM_MEMCACHE).replicas(), Some(1));
    assert_eq!(workload(&ha, zync::ZYNC_DATABASE).replicas(), Some(1));
}

#[test]
fn high_availability_moves_databases_out() {
    let ha = bundle(TemplateVariant::AmpHa, false);

    for name in [mysql::SYSTEM_MYSQL, redis::BACKEND_REDIS, redis::SYSTEM_REDIS] {
        assert!(object(&ha, ObjectKind::DeploymentConfig, name).is_none(), "{name}");
        assert!(object(&ha, ObjectKind::Service, name).is_none(), "{name}");
    }
    assert!(object(&ha, ObjectKind::PersistentVolumeClaim, redis::BACKEND_REDIS_STORAGE).is_none());
    assert!(object(&ha, ObjectKind::ConfigMap, redis::REDIS_CONFIG).is_none());
    assert!(object(&ha, ObjectKind::ImageStream, images::SYSTEM_MYSQL).is_none());
    assert!(ha.parameter(MYSQL_ROOT_PASSWORD).is_none());

    let storage_url = match object(&ha, ObjectKind::Secret, backend::REDIS_SECRET) {
        Some(ResourceObject::Secret(secret)) => secret
            .string_data
            .as_ref()
            .and_then(|data| data.get(backend::REDIS_STORAGE_URL_FIELD))
            .cloned(),
        _ => None,
    };
    assert_eq!(
        storage_url.as_deref(),
        Some("${BACKEND_REDIS_STORAGE_ENDPOINT}")
    );
}

#[test]
fn external_storage_drops_the_shared_volume() {
    let s3 = bundle(TemplateVariant::AmpS3, false);

    for name in [system::SYSTEM_APP, system::SYSTEM_SIDEKIQ] {
        let spec = workload(&s3, name)
            .pod_template()
            .and_then(|template| template.spec.as_ref())
            .expect("workloads have a pod spec");
        assert!(
            spec.volumes
                .iter()
                .flatten()
                .all(|volume| volume.name != system::STORAGE),
            "{name} still declares the volume"
        );
        assert!(
            spec.containers
                .iter()
                .flat_map(|container| container.volume_mounts.iter().flatten())
                .all(|mount| mount.name != system::STORAGE),
            "{name} still mounts the volume"
        );
    }
    assert!(object(&s3, ObjectKind::PersistentVolumeClaim, system::STORAGE).is_none());
    assert!(s3.parameter(RWX_STORAGE_CLASS).is_none());
}

#[test]
fn evaluation_strips_every_resource_requirement() {
    let eval = bundle(TemplateVariant::AmpEval, false);

    let containers = eval
        .objects()
        .filter_map(ResourceObject::pod_template)
        .filter_map(|template| template.spec.as_ref())
        .flat_map(|spec| &spec.containers);
    for container in containers {
        assert!(
            container.resources.as_ref().is_none_or(|resources| {
                resources.limits.is_none() && resources.requests.is_none()
            }),
            "container {} keeps resource requirements",
            container.name
        );
    }
}

#[test]
fn productized_only_rewrites_the_release_tag() {
    let community = bundle(TemplateVariant::Amp, false);
    let productized = bundle(TemplateVariant::Amp, true);

    let tag_source = |bundle: &Bundle, tag: &str| -> Option<String> {
        let Some(ResourceObject::ImageStream(stream)) =
            object(bundle, ObjectKind::ImageStream, images::AMP_BACKEND)
        else {
            return None;
        };
        stream
            .spec
            .tags
            .iter()
            .find(|reference| reference.name == tag)
            .and_then(|reference| reference.from.as_ref()?.name.clone())
    };

    let release = placeholder(AMP_RELEASE);
    assert_eq!(tag_source(&productized, &release).as_deref(), Some(BACKEND_IMAGE));
    assert_ne!(tag_source(&community, &release).as_deref(), Some(BACKEND_IMAGE));
    assert_eq!(tag_source(&productized, "latest"), tag_source(&community, "latest"));
}

#[test]
fn storage_and_database_transforms_commute() {
    let assembled = TemplateVariant::Amp
        .assembler()
        .with_adapter(HighAvailabilityAdapter)
        .with_adapter(S3Adapter)
        .assemble()
        .expect("bundle assembles");
    let high_availability =
        HighAvailability::new(HighAvailabilityAdapter::options().expect("options build"));
    let external_storage = ExternalStorage::new(S3Adapter::options().expect("options build"));

    let apply = |first: &dyn Transformer, second: &dyn Transformer| {
        let bundle = first
            .transform(assembled.clone())
            .and_then(|bundle| second.transform(bundle))
            .expect("transforms apply");
        bundle.into_template("commute", BTreeMap::new())
    };

    assert_eq!(
        apply(&high_availability, &external_storage),
        apply(&external_storage, &high_availability)
    );
}

#[test]
fn chain_order_does_not_depend_on_registration() {
    let high_availability =
        || HighAvailability::new(HighAvailabilityAdapter::options().expect("options build"));
    let chain = TransformChain::new()
        .with_transformer(Evaluation)
        .with_transformer(high_availability());
    assert_eq!(chain.names(), ["high-availability", "evaluation"]);
}
