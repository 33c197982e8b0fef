//! Processor registry.

use super::{Dnp3Processor, PointExtractor, PointProcessor, PointValue};
use crate::tree::Node;

/// Enum of all built-in point processors.
///
/// Static dispatch, the same way protocol parsers are registered: adding a
/// protocol means a new variant plus a `From` impl.
#[derive(Debug, Clone, Copy)]
pub enum BuiltinProcessor {
    Dnp3(Dnp3Processor),
}

macro_rules! delegate_processor {
    ($self:expr, $method:ident $(, $arg:expr)*) => {
        match $self {
            BuiltinProcessor::Dnp3(p) => p.$method($($arg),*),
        }
    };
}

impl PointProcessor for BuiltinProcessor {
    #[inline]
    fn name(&self) -> &'static str {
        delegate_processor!(self, name)
    }

    #[inline]
    fn display_name(&self) -> &'static str {
        delegate_processor!(self, display_name)
    }

    #[inline]
    fn target_fields(&self) -> &'static [&'static str] {
        delegate_processor!(self, target_fields)
    }

    #[inline]
    fn fine_timestamp_field(&self) -> Option<&'static str> {
        delegate_processor!(self, fine_timestamp_field)
    }

    #[inline]
    fn index_field(&self) -> &'static str {
        delegate_processor!(self, index_field)
    }

    #[inline]
    fn dissector_filter(&self) -> &'static str {
        delegate_processor!(self, dissector_filter)
    }

    #[inline]
    fn decoder_fields(&self) -> Vec<&'static str> {
        delegate_processor!(self, decoder_fields)
    }

    #[inline]
    fn decoder_args(&self) -> Vec<String> {
        delegate_processor!(self, decoder_args)
    }

    #[inline]
    fn extractor(&self) -> PointExtractor {
        delegate_processor!(self, extractor)
    }

    #[inline]
    fn extract(&self, packet: &Node) -> Vec<PointValue> {
        delegate_processor!(self, extract, packet)
    }
}

impl From<Dnp3Processor> for BuiltinProcessor {
    fn from(p: Dnp3Processor) -> Self {
        BuiltinProcessor::Dnp3(p)
    }
}

/// Registry of point processors, in registration order.
#[derive(Debug, Clone)]
pub struct ProcessorRegistry {
    processors: Vec<BuiltinProcessor>,
}

impl ProcessorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Register a processor. A second processor with the same name is ignored.
    pub fn register<P: Into<BuiltinProcessor>>(&mut self, processor: P) {
        let processor = processor.into();
        if self.get(processor.name()).is_none() {
            self.processors.push(processor);
        }
    }

    /// Get a processor by name.
    pub fn get(&self, name: &str) -> Option<&BuiltinProcessor> {
        self.processors.iter().find(|p| p.name() == name)
    }

    /// All registered processors.
    pub fn all(&self) -> impl Iterator<Item = &BuiltinProcessor> {
        self.processors.iter()
    }

    /// Registered processor names.
    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Get the number of registered processors.
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
