use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, EmptyDirVolumeSource, KeyToPath, PersistentVolumeClaimVolumeSource,
    Volume,
};

pub fn persistent_volume_claim(name: impl Into<String>, claim_name: impl Into<String>) -> Volume {
    Volume {
        name: name.into(),
        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
            claim_name: claim_name.into(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Mounts the given keys of a ConfigMap, each under a file named like the key.
pub fn config_map<'a>(
    name: impl Into<String>,
    config_map_name: impl Into<String>,
    keys: impl IntoIterator<Item = &'a str>,
) -> Volume {
    let items: Vec<KeyToPath> = keys
        .into_iter()
        .map(|key| KeyToPath {
            key: key.to_owned(),
            path: key.to_owned(),
            ..Default::default()
        })
        .collect();

    Volume {
        name: name.into(),
        config_map: Some(ConfigMapVolumeSource {
            name: config_map_name.into(),
            items: (!items.is_empty()).then_some(items),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn empty_dir(name: impl Into<String>) -> Volume {
    Volume {
        name: name.into(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Default::default()
    }
}
