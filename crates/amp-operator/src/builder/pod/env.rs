use k8s_openapi::api::core::v1::{
    ConfigMapKeySelector, EnvFromSource, EnvVar, EnvVarSource, SecretEnvSource, SecretKeySelector,
};

pub fn env_var(name: impl Into<String>, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.into(),
        value: Some(value.into()),
        ..Default::default()
    }
}

pub fn env_var_from_secret(
    env_var_name: impl Into<String>,
    secret_name: impl Into<String>,
    secret_key: impl Into<String>,
) -> EnvVar {
    EnvVar {
        name: env_var_name.into(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret_name.into(),
                key: secret_key.into(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn env_var_from_config_map(
    env_var_name: impl Into<String>,
    config_map_name: impl Into<String>,
    config_map_key: impl Into<String>,
) -> EnvVar {
    EnvVar {
        name: env_var_name.into(),
        value_from: Some(EnvVarSource {
            config_map_key_ref: Some(ConfigMapKeySelector {
                name: config_map_name.into(),
                key: config_map_key.into(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Exposes every key of the secret `secret_name` as an environment variable.
pub fn env_from_secret(secret_name: impl Into<String>) -> EnvFromSource {
    EnvFromSource {
        secret_ref: Some(SecretEnvSource {
            name: secret_name.into(),
            ..Default::default()
        }),
        ..Default::default()
    }
}
