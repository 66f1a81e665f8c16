//! Command line arguments of the `amp-operator` binary.
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use amp_shared::yaml::{self, SerializeOptions};
use clap::{Args, Parser, Subcommand};
use snafu::{ResultExt, Snafu};

use crate::{
    client::WatchNamespace,
    logging::LogFormat,
    template::{self, variant::TemplateVariant},
};

pub const APP_NAME: &str = "amp-operator";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("parameter {argument:?} is not of the form NAME=VALUE"))]
    InvalidParameter { argument: String },

    #[snafu(display("failed to render the {variant} template"))]
    Render {
        source: template::variant::Error,
        variant: TemplateVariant,
    },

    #[snafu(display("failed to process the {variant} template"))]
    Process {
        source: template::Error,
        variant: TemplateVariant,
    },

    #[snafu(display("failed to write the {variant} template"))]
    Write {
        source: yaml::Error,
        variant: TemplateVariant,
    },

    #[snafu(display("failed to create output file {path:?}"))]
    CreateOutput {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to flush output file {path:?}"))]
    FlushOutput {
        source: std::io::Error,
        path: PathBuf,
    },
}

#[derive(Debug, Parser)]
#[command(name = APP_NAME, author, version, about)]
pub struct Opts {
    #[command(subcommand)]
    pub command: Command,

    /// Format of the log lines written to stdout
    #[arg(long, env = "AMP_OPERATOR_LOG_FORMAT", value_enum, default_value_t, global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print CRD objects.
    Crd,

    /// Run the operator.
    Run(RunArguments),

    /// Render a deployment template.
    Template(TemplateArguments),
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct RunArguments {
    /// Provides a specific namespace to watch (instead of watching all namespaces)
    #[arg(long, env, default_value = "")]
    pub watch_namespace: String,

    /// Field manager recorded on every object the operator writes
    #[arg(long, env, default_value = APP_NAME)]
    pub field_manager: String,
}

impl RunArguments {
    pub fn watch_namespace(&self) -> WatchNamespace {
        WatchNamespace::from(self.watch_namespace.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct TemplateArguments {
    #[arg(value_enum)]
    pub variant: TemplateVariant,

    /// Point product images at the curated registry
    #[arg(long, env = "AMP_TEMPLATE_PRODUCTIZED")]
    pub productized: bool,

    /// Resolve every parameter and print the objects instead of the template
    #[arg(long)]
    pub process: bool,

    /// Parameter value used with --process, as NAME=VALUE
    #[arg(long = "param", short = 'p', value_name = "NAME=VALUE", requires = "process")]
    pub parameters: Vec<String>,

    /// Write to this file instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl TemplateArguments {
    pub fn parameter_values(&self) -> Result<BTreeMap<String, String>, Error> {
        self.parameters
            .iter()
            .map(|argument| {
                argument
                    .split_once('=')
                    .map(|(name, value)| (name.to_owned(), value.to_owned()))
                    .ok_or_else(|| Error::InvalidParameter {
                        argument: argument.clone(),
                    })
            })
            .collect()
    }

    /// Writes the requested document to `--output`, or to stdout if no file was given.
    pub fn emit(&self) -> Result<(), Error> {
        let Some(path) = &self.output else {
            return self.write(std::io::stdout().lock());
        };
        let file = File::create(path).context(CreateOutputSnafu { path })?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush().context(FlushOutputSnafu { path })
    }

    /// Renders the requested template, or its processed objects, as YAML into `writer`.
    pub fn write<W: Write>(&self, writer: W) -> Result<(), Error> {
        let variant = self.variant;
        if self.process {
            let values = self.parameter_values()?;
            let processed = variant
                .bundle(self.productized)
                .context(RenderSnafu { variant })?
                .process(&values)
                .context(ProcessSnafu { variant })?;
            yaml::serialize_all(&processed.objects, writer).context(WriteSnafu { variant })
        } else {
            let template = variant
                .render(self.productized)
                .context(RenderSnafu { variant })?;
            yaml::serialize(&template, writer, SerializeOptions::default())
                .context(WriteSnafu { variant })
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use rstest::rstest;

    use super::*;

    #[test]
    fn verify_cli() {
        Opts::command().debug_assert();
    }

    #[rstest]
    #[case::amp("amp", TemplateVariant::Amp)]
    #[case::eval("amp-eval", TemplateVariant::AmpEval)]
    #[case::ha("amp-ha", TemplateVariant::AmpHa)]
    #[case::s3("amp-s3", TemplateVariant::AmpS3)]
    fn parses_template_variants(#[case] argument: &str, #[case] variant: TemplateVariant) {
        let opts = Opts::parse_from([APP_NAME, "template", argument, "--productized"]);
        let Command::Template(arguments) = opts.command else {
            unreachable!("template subcommand was given");
        };
        assert_eq!(arguments.variant, variant);
        assert!(arguments.productized);
    }

    #[test]
    fn empty_watch_namespace_watches_everything() {
        let opts = Opts::parse_from([APP_NAME, "run"]);
        let Command::Run(arguments) = opts.command else {
            unreachable!("run subcommand was given");
        };
        assert_eq!(arguments.watch_namespace(), WatchNamespace::All);
        assert_eq!(arguments.field_manager, APP_NAME);
    }

    #[test]
    fn parameters_need_a_value() {
        let opts = Opts::parse_from([
            APP_NAME,
            "template",
            "amp",
            "--process",
            "-p",
            "WILDCARD_DOMAIN=apps.example.com",
            "-p",
            "TENANT_NAME",
        ]);
        let Command::Template(arguments) = opts.command else {
            unreachable!("template subcommand was given");
        };
        assert!(matches!(
            arguments.parameter_values(),
            Err(Error::InvalidParameter { ref argument }) if argument == "TENANT_NAME"
        ));
    }

    #[test]
    fn writes_the_template_document() {
        let arguments = TemplateArguments {
            variant: TemplateVariant::AmpEval,
            productized: false,
            process: false,
            parameters: Vec::new(),
            output: None,
        };
        let mut buffer = Vec::new();
        arguments.write(&mut buffer).expect("template renders");

        let document = String::from_utf8(buffer).expect("YAML is UTF-8");
        assert!(document.starts_with("---\n"));
        assert!(document.contains("kind: Template"));
        assert!(document.contains("name: 3scale-api-management-eval"));
    }

    #[test]
    fn writes_processed_objects() {
        let arguments = TemplateArguments {
            variant: TemplateVariant::Amp,
            productized: false,
            process: true,
            parameters: vec!["WILDCARD_DOMAIN=apps.example.com".to_owned()],
            output: None,
        };
        let mut buffer = Vec::new();
        arguments.write(&mut buffer).expect("template processes");

        let document = String::from_utf8(buffer).expect("YAML is UTF-8");
        assert!(document.contains("apps.example.com"));
        assert!(!document.contains("${WILDCARD_DOMAIN}"));
    }

    #[test]
    fn emits_into_the_output_file() {
        let directory = tempfile::tempdir().expect("temporary directory");
        let path = directory.path().join("amp-s3.yml");
        let arguments = TemplateArguments {
            variant: TemplateVariant::AmpS3,
            productized: true,
            process: false,
            parameters: Vec::new(),
            output: Some(path.clone()),
        };
        arguments.emit().expect("template is written");

        let document = std::fs::read_to_string(path).expect("output file exists");
        assert!(document.contains("name: 3scale-api-management-s3"));
        assert!(document.contains("AWS_BUCKET"));
    }
}
