//! Utility functions for processing data in the YAML file format
use std::{io::Write, path::Path};

use snafu::{ResultExt, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

/// Represents every error which can be encountered during YAML serialization.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to serialize YAML"))]
    SerializeYaml { source: serde_yaml::Error },

    #[snafu(display("failed to write YAML document separator"))]
    WriteDocumentSeparator { source: std::io::Error },

    #[snafu(display("failed to write YAML to file"))]
    WriteToFile { source: std::io::Error },

    #[snafu(display("failed to write YAML to stdout"))]
    WriteToStdout { source: std::io::Error },

    #[snafu(display("failed to parse bytes as valid UTF-8 string"))]
    ParseUtf8Bytes { source: std::string::FromUtf8Error },
}

/// Provides configurable options during YAML serialization.
///
/// For most people the default implementation [`SerializeOptions::default()`] is sufficient as it
/// enables explicit document and singleton map serialization.
pub struct SerializeOptions {
    /// Adds leading triple dashes (`---`) to the output string.
    pub explicit_document: bool,

    /// Serialize enum variants as YAML maps using the variant name as the key.
    pub singleton_map: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            explicit_document: true,
            singleton_map: true,
        }
    }
}

/// Serializes any type `T` which is [serializable](serde::Serialize) as a YAML document using the
/// provided [`SerializeOptions`].
pub trait YamlDocument: Sized + serde::Serialize {
    /// Generates the YAML document of `self` using the provided [`SerializeOptions`].
    fn generate_yaml(&self, options: SerializeOptions) -> Result<String> {
        let mut buffer = Vec::new();
        serialize(&self, &mut buffer, options)?;
        String::from_utf8(buffer).context(ParseUtf8BytesSnafu)
    }

    /// Generates and writes the YAML document of `self` to a file at `path` using the provided
    /// [`SerializeOptions`].
    fn write_yaml<P: AsRef<Path>>(&self, path: P, options: SerializeOptions) -> Result<()> {
        let document = self.generate_yaml(options)?;
        std::fs::write(path, document).context(WriteToFileSnafu)
    }

    /// Generates and prints the YAML document of `self` to stdout using the provided
    /// [`SerializeOptions`].
    fn print_yaml(&self, options: SerializeOptions) -> Result<()> {
        let document = self.generate_yaml(options)?;

        let mut writer = std::io::stdout();
        writer
            .write_all(document.as_bytes())
            .context(WriteToStdoutSnafu)
    }
}

impl<T> YamlDocument for T where T: serde::ser::Serialize {}

/// Serializes the given data structure and writes it to a [`Writer`](Write).
pub fn serialize<T, W>(value: &T, mut writer: W, options: SerializeOptions) -> Result<()>
where
    T: serde::Serialize,
    W: std::io::Write,
{
    if options.explicit_document {
        writer
            .write_all(b"---\n")
            .context(WriteDocumentSeparatorSnafu)?;
    }

    let mut serializer = serde_yaml::Serializer::new(writer);

    if options.singleton_map {
        serde_yaml::with::singleton_map_recursive::serialize(value, &mut serializer)
            .context(SerializeYamlSnafu)?;
    } else {
        value
            .serialize(&mut serializer)
            .context(SerializeYamlSnafu)?;
    }

    Ok(())
}

/// Serializes every item as its own explicit YAML document into a single stream.
///
/// This is the format `kubectl apply -f` expects for multiple objects in one file.
pub fn serialize_all<'a, T, I, W>(values: I, mut writer: W) -> Result<()>
where
    T: serde::Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
    W: std::io::Write,
{
    for value in values {
        serialize(value, &mut writer, SerializeOptions::default())?;
    }

    Ok(())
}
