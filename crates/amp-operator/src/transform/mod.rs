//! Structural rewrites of an assembled [`Bundle`] into a deployment variant.
//!
//! Transformers never look objects up by hard-coded names. They consult the [`Capabilities`]
//! the components recorded in the bundle and leave every object outside that set untouched.
//!
//! [`Capabilities`]: crate::component::Capabilities
use snafu::Snafu;
use strum::{Display, EnumIter};

use crate::template::Bundle;

pub mod evaluation;
pub mod external_storage;
pub mod high_availability;
pub mod productized;

pub use evaluation::Evaluation;
pub use external_storage::ExternalStorage;
pub use high_availability::HighAvailability;
pub use productized::Productized;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "shared storage {volume:?} declares the environment config map {config_map:?} which is not part of the bundle"
    ))]
    MissingEnvironmentConfigMap { volume: String, config_map: String },
}

/// Position of a transformer inside a [`TransformChain`].
///
/// Transformers of an earlier stage always run first, whatever order they were registered in.
#[derive(Clone, Copy, Debug, Display, EnumIter, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransformStage {
    Productized,
    HighAvailability,
    ExternalStorage,

    /// Must see every workload, including the ones earlier stages touched.
    Evaluation,
}

pub trait Transformer {
    fn name(&self) -> &'static str;

    fn stage(&self) -> TransformStage;

    fn transform(&self, bundle: Bundle) -> Result<Bundle>;
}

/// An ordered list of transformers applied one after the other.
#[derive(Default)]
pub struct TransformChain {
    transformers: Vec<Box<dyn Transformer>>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transformer(mut self, transformer: impl Transformer + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        // Stable, so transformers of the same stage keep their registration order.
        self.transformers.sort_by_key(|transformer| transformer.stage());
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transformers
            .iter()
            .map(|transformer| transformer.name())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    pub fn apply(&self, mut bundle: Bundle) -> Result<Bundle> {
        for transformer in &self.transformers {
            bundle = transformer.transform(bundle)?;
            tracing::debug!(
                transformer = transformer.name(),
                stage = %transformer.stage(),
                objects = bundle.objects().count(),
                parameters = bundle.parameters().count(),
                "applied transformer"
            );
        }
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Parameter;

    struct Recording {
        name: &'static str,
        stage: TransformStage,
    }

    impl Transformer for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn stage(&self) -> TransformStage {
            self.stage
        }

        fn transform(&self, mut bundle: Bundle) -> Result<Bundle> {
            bundle
                .push_parameter(Parameter::optional(self.name))
                .expect("each recording transformer runs once");
            Ok(bundle)
        }
    }

    #[test]
    fn chain_runs_by_stage_then_registration_order() {
        let chain = TransformChain::new()
            .with_transformer(Recording {
                name: "EVAL",
                stage: TransformStage::Evaluation,
            })
            .with_transformer(Recording {
                name: "HA",
                stage: TransformStage::HighAvailability,
            })
            .with_transformer(Recording {
                name: "HA_SECOND",
                stage: TransformStage::HighAvailability,
            })
            .with_transformer(Recording {
                name: "PRODUCT",
                stage: TransformStage::Productized,
            });

        assert_eq!(chain.names(), ["PRODUCT", "HA", "HA_SECOND", "EVAL"]);

        let bundle = chain.apply(Bundle::new()).expect("recording never fails");
        let applied: Vec<_> = bundle.parameters().map(|p| p.name.as_str()).collect();
        assert_eq!(applied, ["PRODUCT", "HA", "HA_SECOND", "EVAL"]);
    }
}
