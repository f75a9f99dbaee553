//! Text preprocessing for topic modeling and visualization of fitted topic
//! models.

pub mod annotation;
pub mod corpus;
pub mod dictionary;
pub mod documents;
pub mod error;
pub mod frequency;
pub mod heatmap;
pub mod interactive;
pub mod matrix;
pub mod model;
pub mod models;
pub mod pipeline;
pub mod tokenize;
pub mod visualization;

pub use error::{Error, Result};
pub use frequency::{FeatureList, TermFrequency};
pub use matrix::TermDocumentMatrix;
pub use pipeline::{FeatureFilter, PipelineConfig, Preprocessor};
pub use visualization::{ArtifactPaths, Mode, Visualization};
