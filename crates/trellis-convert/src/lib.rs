//! Display conversion for trellis records.
//!
//! Turns a record plus its workflow schema into display strings: per-field
//! formatted values, the full converted-record payload, and the templated
//! record title. Formula fields are computed through `trellis-formula`.

pub mod error;
pub mod format;
pub mod record;
pub mod title;
pub mod tz;

pub use error::ConvertError;
pub use format::{DisplayValue, display_value};
pub use record::{ConvertOptions, ConvertedRecord, convert_record};
pub use title::record_title;
pub use tz::{DEFAULT_TIMEZONE, TzOffset};
