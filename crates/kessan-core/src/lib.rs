//! Value model, normalizer and provider seam shared by the kessan crates.

pub mod error;
pub mod normalize;
pub mod provider;
pub mod value;

pub use error::ProviderError;
pub use normalize::{normalize, Category};
pub use provider::{FieldBundle, Provider};
pub use value::{Frame, Index, Key, Numeric, Opaque, Series, Value};
