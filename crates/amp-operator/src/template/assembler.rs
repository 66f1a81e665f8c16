//! Composes adapters into one [`Bundle`].
use snafu::{ResultExt, Snafu};

use super::{Bundle, Parameter};
use crate::{component::Capabilities, object::ResourceObject, options};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to build the options of adapter {adapter:?}"))]
    BuildOptions {
        source: options::Error,
        adapter: &'static str,
    },

    #[snafu(display("adapter {adapter:?} conflicts with an earlier adapter"))]
    Append {
        source: super::Error,
        adapter: &'static str,
    },
}

/// Exposes one component to the assembler: the parameters it needs, the objects it generates
/// and the names it lets transformers touch.
pub trait Adapter {
    fn name(&self) -> &'static str;

    fn parameters(&self) -> Vec<Parameter>;

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error>;

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }
}

/// Appends adapters to a bundle in registration order.
///
/// Composition order is preserved in the output. No cross-adapter references are checked.
#[derive(Default)]
pub struct TemplateAssembler {
    adapters: Vec<Box<dyn Adapter>>,
}

impl TemplateAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adapter(mut self, adapter: impl Adapter + 'static) -> Self {
        self.adapters.push(Box::new(adapter));
        self
    }

    /// Builds the bundle. Any adapter failure aborts the whole assembly.
    pub fn assemble(&self) -> Result<Bundle> {
        let mut bundle = Bundle::new();
        for adapter in &self.adapters {
            let name = adapter.name();
            for parameter in adapter.parameters() {
                bundle
                    .push_parameter(parameter)
                    .context(AppendSnafu { adapter: name })?;
            }

            for object in adapter
                .objects()
                .context(BuildOptionsSnafu { adapter: name })?
            {
                bundle
                    .push_object(object)
                    .context(AppendSnafu { adapter: name })?;
            }

            bundle.merge_capabilities(adapter.capabilities());
            tracing::debug!(adapter = name, "appended adapter to bundle");
        }
        Ok(bundle)
    }
}
