pub mod convert;
pub mod error;
pub mod project;

pub use convert::{
    ConversionOutput, ConversionReport, ConvertOptions, Model, convert_file, convert_model,
};
pub use error::{ConvertError, ConvertResult};
