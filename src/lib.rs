pub mod metadata;
pub mod phonenumber;
pub mod phonenumberutil;
pub mod shortnumberinfo;
pub mod i18n;

mod interfaces;
mod regexp_cache;
mod regex_based_matcher;
pub(crate) mod regex_util;
pub(crate) mod string_util;

/// I decided to create this module because there are many
/// boilerplate places in the code that can be replaced with macros,
/// the name of which will describe what is happening more
/// clearly than a few lines of code.
mod macros;

#[cfg(test)]
mod tests;

pub use metadata::{NumberFormat, PhoneMetadata, PhoneMetadataCollection, PhoneNumberDesc};
pub use phonenumber::{CountryCodeSource, PhoneNumber};
pub use regexp_cache::InvalidRegexError;
pub use phonenumberutil::enums::{MatchType, NumberLengthType, PhoneNumberFormat, PhoneNumberType};
pub use phonenumberutil::errors::{ParseError, ValidationError};
pub use phonenumberutil::phonenumberutil::PhoneNumberUtil;
pub use shortnumberinfo::{ShortNumberCost, ShortNumberInfo};
