pub mod enums;
pub mod errors;
pub mod phonenumberutil;

mod formatting;
mod helper_constants;
mod helper_functions;
mod helper_types;
mod matching;
mod parsing;
mod phone_number_regexps_and_mappings;

pub use enums::{MatchType, NumberLengthType, PhoneNumberFormat, PhoneNumberType};
pub use errors::{ParseError, ValidationError};
