//! lingolife-dictionary: dictionary lookups.
//!
//! Implements the `DictionaryLookup` trait for the Youdao services and
//! normalizes their responses into one `DictionaryEntry` shape.

pub mod config;
pub mod error;
pub mod mock;
pub mod youdao;

pub use config::{create_dictionary, YoudaoConfig};
pub use error::DictionaryError;
pub use mock::MockDictionary;
pub use youdao::YoudaoDictionary;
