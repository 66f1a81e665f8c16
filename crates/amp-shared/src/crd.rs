use snafu::{ResultExt, Snafu};

use crate::yaml::{SerializeOptions, YamlDocument};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to write CRD YAML schema to stdout"))]
    WriteToStdout { source: crate::yaml::Error },

    #[snafu(display("failed to generate CRD YAML schema"))]
    GenerateSchema { source: crate::yaml::Error },
}

/// Provides YAML schema generation and output capabilities for Kubernetes custom resources.
///
/// The written YAML string is always an explicit document with leading dashes (`---`).
pub trait CustomResourceExt: kube::CustomResourceExt {
    /// Generates the YAML schema of a `CustomResourceDefinition` and prints it to [stdout].
    ///
    /// [stdout]: std::io::stdout
    fn print_yaml_schema() -> Result<()> {
        Self::crd()
            .print_yaml(SerializeOptions::default())
            .context(WriteToStdoutSnafu)
    }

    /// Generates the YAML schema of a `CustomResourceDefinition` and returns it as a [`String`].
    fn yaml_schema() -> Result<String> {
        Self::crd()
            .generate_yaml(SerializeOptions::default())
            .context(GenerateSchemaSnafu)
    }
}

impl<T> CustomResourceExt for T where T: kube::CustomResourceExt {}
