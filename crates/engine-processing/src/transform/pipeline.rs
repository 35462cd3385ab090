use crate::transform::error::TransformError;
use model::records::row::RowData;
use std::sync::Arc;

/// One step of the row transform. Warnings are collected, never raised.
pub trait Transform: Send + Sync {
    fn apply(&self, row: RowData, warnings: &mut Vec<String>) -> Result<RowData, TransformError>;
}

pub trait TransformPipelineExt {
    fn add_if<T, F>(self, condition: bool, factory: F) -> Self
    where
        T: Transform + 'static,
        F: FnOnce() -> T;
}

#[derive(Clone)]
pub struct TransformPipeline {
    transforms: Vec<Arc<dyn Transform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    pub fn apply(&self, row: RowData, warnings: &mut Vec<String>) -> Result<RowData, TransformError> {
        self.transforms
            .iter()
            .try_fold(row, |acc, transform| transform.apply(acc, warnings))
    }

    pub fn add_transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl TransformPipelineExt for TransformPipeline {
    fn add_if<T, F>(mut self, condition: bool, factory: F) -> Self
    where
        T: Transform + 'static,
        F: FnOnce() -> T,
    {
        if condition {
            self = self.add_transform(factory());
        }
        self
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}
