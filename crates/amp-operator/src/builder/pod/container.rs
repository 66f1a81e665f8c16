use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvFromSource, EnvVar, Probe, ResourceRequirements, VolumeMount,
};

use super::env::{env_var, env_var_from_config_map, env_var_from_secret};

/// A builder to build [`Container`] objects.
#[derive(Clone, Debug, Default)]
pub struct ContainerBuilder {
    args: Option<Vec<String>>,
    container_ports: Option<Vec<ContainerPort>>,
    command: Option<Vec<String>>,
    env: Option<Vec<EnvVar>>,
    env_from: Option<Vec<EnvFromSource>>,
    image: Option<String>,
    image_pull_policy: Option<String>,
    name: String,
    resources: Option<ResourceRequirements>,
    volume_mounts: Option<Vec<VolumeMount>>,
    readiness_probe: Option<Probe>,
    liveness_probe: Option<Probe>,
}

impl ContainerBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn image(&mut self, image: impl Into<String>) -> &mut Self {
        self.image = Some(image.into());
        self
    }

    pub fn image_pull_policy(&mut self, image_pull_policy: impl Into<String>) -> &mut Self {
        self.image_pull_policy = Some(image_pull_policy.into());
        self
    }

    pub fn add_env_var(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.env
            .get_or_insert_with(Vec::new)
            .push(env_var(name, value));
        self
    }

    pub fn add_env_var_from_secret(
        &mut self,
        name: impl Into<String>,
        secret_name: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> &mut Self {
        self.env
            .get_or_insert_with(Vec::new)
            .push(env_var_from_secret(name, secret_name, secret_key));
        self
    }

    pub fn add_env_var_from_config_map(
        &mut self,
        name: impl Into<String>,
        config_map_name: impl Into<String>,
        config_map_key: impl Into<String>,
    ) -> &mut Self {
        self.env
            .get_or_insert_with(Vec::new)
            .push(env_var_from_config_map(name, config_map_name, config_map_key));
        self
    }

    pub fn add_env_vars(&mut self, env_vars: impl IntoIterator<Item = EnvVar>) -> &mut Self {
        self.env.get_or_insert_with(Vec::new).extend(env_vars);
        self
    }

    pub fn add_env_from(&mut self, env_from: EnvFromSource) -> &mut Self {
        self.env_from.get_or_insert_with(Vec::new).push(env_from);
        self
    }

    pub fn command(&mut self, command: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.command = Some(command.into_iter().map(Into::into).collect());
        self
    }

    pub fn args(&mut self, args: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn add_container_port(&mut self, name: impl Into<String>, port: i32) -> &mut Self {
        self.container_ports
            .get_or_insert_with(Vec::new)
            .push(ContainerPort {
                name: Some(name.into()),
                container_port: port,
                protocol: Some("TCP".to_owned()),
                ..ContainerPort::default()
            });
        self
    }

    pub fn resources(&mut self, resources: ResourceRequirements) -> &mut Self {
        self.resources = Some(resources);
        self
    }

    pub fn add_volume_mount(
        &mut self,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> &mut Self {
        self.volume_mounts
            .get_or_insert_with(Vec::new)
            .push(VolumeMount {
                name: name.into(),
                mount_path: path.into(),
                ..VolumeMount::default()
            });
        self
    }

    pub fn readiness_probe(&mut self, probe: Probe) -> &mut Self {
        self.readiness_probe = Some(probe);
        self
    }

    pub fn liveness_probe(&mut self, probe: Probe) -> &mut Self {
        self.liveness_probe = Some(probe);
        self
    }

    pub fn build(&self) -> Container {
        Container {
            args: self.args.clone(),
            command: self.command.clone(),
            env: self.env.clone(),
            env_from: self.env_from.clone(),
            image: self.image.clone(),
            image_pull_policy: self.image_pull_policy.clone(),
            resources: self.resources.clone(),
            name: self.name.clone(),
            ports: self.container_ports.clone(),
            volume_mounts: self.volume_mounts.clone(),
            readiness_probe: self.readiness_probe.clone(),
            liveness_probe: self.liveness_probe.clone(),
            ..Container::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::pod::{env::env_from_secret, resources::ResourceRequirementsBuilder};

    #[test]
    fn container_builder() {
        let container = ContainerBuilder::new("backend-listener")
            .image("amp-backend:latest")
            .image_pull_policy("IfNotPresent")
            .args(["bin/3scale_backend", "start"])
            .add_env_var("RACK_ENV", "production")
            .add_env_var_from_secret("CONFIG_REDIS_PROXY", "backend-redis", "REDIS_STORAGE_URL")
            .add_env_from(env_from_secret("apicast-environment"))
            .add_container_port("http", 3000)
            .add_volume_mount("system-storage", "/opt/system/public/system")
            .resources(
                ResourceRequirementsBuilder::new()
                    .with_cpu_request("500m")
                    .with_memory_limit("700Mi")
                    .build(),
            )
            .build();

        assert_eq!(container.name, "backend-listener");
        assert_eq!(container.image.as_deref(), Some("amp-backend:latest"));

        let env = container.env.expect("env is set");
        assert!(
            matches!(env.first(), Some(EnvVar { name, value: Some(value), .. }) if name == "RACK_ENV" && value == "production")
        );
        let secret_ref = env[1]
            .value_from
            .as_ref()
            .and_then(|source| source.secret_key_ref.as_ref())
            .expect("second variable is read from a secret");
        assert_eq!(secret_ref.name, "backend-redis");
        assert_eq!(secret_ref.key, "REDIS_STORAGE_URL");

        assert_eq!(container.env_from.map(|env_from| env_from.len()), Some(1));
        assert_eq!(
            container
                .ports
                .as_ref()
                .map(|ports| (ports[0].name.as_deref(), ports[0].container_port)),
            Some((Some("http"), 3000))
        );
        assert!(
            matches!(container.volume_mounts.as_deref(), Some([VolumeMount { name, .. }]) if name == "system-storage")
        );
    }
}
