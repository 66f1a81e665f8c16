//! The deployment variants a template can be rendered as.
use std::collections::BTreeMap;

use clap::ValueEnum;
use snafu::{ResultExt, Snafu};
use strum::{Display, EnumIter};

use super::{
    Bundle, Template,
    adapters::{
        AMP_RELEASE, ApicastAdapter, BackendAdapter, GlobalAdapter, HighAvailabilityAdapter,
        ImagesAdapter, MemcachedAdapter, MysqlAdapter, RedisAdapter, S3Adapter, SystemAdapter,
        WildcardRouterAdapter, ZyncAdapter,
    },
    assembler::{self, TemplateAssembler},
    placeholder,
};
use crate::{
    options,
    transform::{
        self, Evaluation, ExternalStorage, HighAvailability, Productized, TransformChain,
        productized::{
            APICAST_IMAGE, BACKEND_IMAGE, ProductizedOptions, ROUTER_IMAGE, SYSTEM_IMAGE,
            ZYNC_IMAGE,
        },
    },
};

const TEMPLATE_NAME: &str = "3scale-api-management";
const DESCRIPTION: &str = "3scale API Management main system";

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to assemble the {variant} bundle"))]
    Assemble {
        source: assembler::Error,
        variant: TemplateVariant,
    },

    #[snafu(display("failed to build the transformer options of the {variant} variant"))]
    TransformerOptions {
        source: options::Error,
        variant: TemplateVariant,
    },

    #[snafu(display("failed to transform the {variant} bundle"))]
    Transform {
        source: transform::Error,
        variant: TemplateVariant,
    },
}

#[derive(Clone, Copy, Debug, Display, EnumIter, Hash, PartialEq, Eq, ValueEnum)]
#[strum(serialize_all = "kebab-case")]
pub enum TemplateVariant {
    /// Every component with in-cluster databases.
    Amp,

    /// [`Self::Amp`] without resource requests and limits.
    AmpEval,

    /// [`Self::Amp`] against external databases with scaled workloads.
    AmpHa,

    /// [`Self::Amp`] storing system files in S3.
    AmpS3,
}

impl TemplateVariant {
    pub fn template_name(self) -> String {
        match self {
            Self::Amp => TEMPLATE_NAME.to_owned(),
            Self::AmpEval => format!("{TEMPLATE_NAME}-eval"),
            Self::AmpHa => format!("{TEMPLATE_NAME}-ha"),
            Self::AmpS3 => format!("{TEMPLATE_NAME}-s3"),
        }
    }

    pub fn description(self) -> String {
        match self {
            Self::Amp => DESCRIPTION.to_owned(),
            Self::AmpEval => format!("{DESCRIPTION} (Evaluation)"),
            Self::AmpHa => format!("{DESCRIPTION} with external databases"),
            Self::AmpS3 => format!("{DESCRIPTION} with shared file storage in AWS S3."),
        }
    }

    pub fn assembler(self) -> TemplateAssembler {
        let assembler = TemplateAssembler::new()
            .with_adapter(GlobalAdapter)
            .with_adapter(ImagesAdapter)
            .with_adapter(RedisAdapter)
            .with_adapter(BackendAdapter)
            .with_adapter(MysqlAdapter)
            .with_adapter(MemcachedAdapter)
            .with_adapter(SystemAdapter)
            .with_adapter(ZyncAdapter)
            .with_adapter(ApicastAdapter)
            .with_adapter(WildcardRouterAdapter);

        match self {
            Self::Amp | Self::AmpEval => assembler,
            Self::AmpHa => assembler.with_adapter(HighAvailabilityAdapter),
            Self::AmpS3 => assembler.with_adapter(S3Adapter),
        }
    }

    pub fn transforms(self, productized: bool) -> Result<TransformChain> {
        let mut chain = TransformChain::new();

        if productized {
            let options = ProductizedOptions::builder()
                .amp_release(placeholder(AMP_RELEASE))
                .apicast_image(APICAST_IMAGE)
                .backend_image(BACKEND_IMAGE)
                .router_image(ROUTER_IMAGE)
                .system_image(SYSTEM_IMAGE)
                .zync_image(ZYNC_IMAGE)
                .build()
                .context(TransformerOptionsSnafu { variant: self })?;
            chain = chain.with_transformer(Productized::new(options));
        }

        Ok(match self {
            Self::Amp => chain,
            Self::AmpEval => chain.with_transformer(Evaluation),
            Self::AmpHa => chain.with_transformer(HighAvailability::new(
                HighAvailabilityAdapter::options()
                    .context(TransformerOptionsSnafu { variant: self })?,
            )),
            Self::AmpS3 => chain.with_transformer(ExternalStorage::new(
                S3Adapter::options().context(TransformerOptionsSnafu { variant: self })?,
            )),
        })
    }

    /// Assembles and transforms the bundle of this variant.
    #[tracing::instrument(skip(self), fields(variant = %self))]
    pub fn bundle(self, productized: bool) -> Result<Bundle> {
        let bundle = self
            .assembler()
            .assemble()
            .context(AssembleSnafu { variant: self })?;
        self.transforms(productized)?
            .apply(bundle)
            .context(TransformSnafu { variant: self })
    }

    pub fn render(self, productized: bool) -> Result<Template> {
        let annotations = BTreeMap::from([
            (
                "openshift.io/display-name".to_owned(),
                "3scale API Management".to_owned(),
            ),
            ("iconClass".to_owned(), "icon-3scale".to_owned()),
            ("description".to_owned(), self.description()),
            (
                "tags".to_owned(),
                "integration, api management, 3scale".to_owned(),
            ),
        ]);
        Ok(self
            .bundle(productized)?
            .into_template(&self.template_name(), annotations))
    }
}
