use std::num::ParseIntError;

use thiserror::Error;

use crate::regexp_cache::InvalidRegexError;

/// Errors a parse attempt reports to the caller. All of these are expected
/// outcomes the caller must branch on, never programming errors.
#[derive(Debug, PartialEq, Error)]
pub enum ParseError {
    #[error("Invalid country code")]
    InvalidCountryCode, // INVALID_COUNTRY_CODE in the java version.
    #[error("Not a number: {0}")]
    NotANumber(#[from] NotANumberError),
    #[error("Too short after idd")]
    TooShortAfterIdd,
    #[error("Too short Nsn")]
    TooShortNsn,
    #[error("Too long nsn")]
    TooLongNsn, // TOO_LONG in the java version.
}

#[derive(Debug, PartialEq, Error)]
pub enum NotANumberError {
    #[error("Number not matched a valid number pattern")]
    NotMatchedValidNumberPattern,
    #[error("Invalid phone context")]
    InvalidPhoneContext,
    #[error("{0}")]
    FailedToParseNumberAsInt(#[from] ParseIntError),
    #[error("{0}")]
    FailedToExtractNumber(#[from] ExtractNumberError),
}

#[derive(Debug, PartialEq, Error)]
pub enum ExtractNumberError {
    #[error("No valid start character found")]
    NoValidStartCharacter,
    #[error("Invalid number")]
    NotANumber,
}

/// Possible outcomes when testing if a PhoneNumber is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ValidationError {
    /// The number has an invalid country calling code.
    #[error("The number has an invalid country calling code")]
    InvalidCountryCode,
    /// The number is shorter than all valid numbers for this region.
    #[error("The number is shorter than all valid numbers for this region")]
    TooShort,
    /// The number is longer than the shortest valid numbers for this region,
    /// shorter than the longest valid numbers for this region, and does not
    /// itself have a number length that matches valid numbers for this region.
    /// This can also be returned in the case where
    /// IsPossibleNumberForTypeWithReason was called, and there are no numbers of
    /// this type at all for this region.
    #[error("\
    The number is longer than the shortest valid numbers for this region,\
    shorter than the longest valid numbers for this region, and does not\
    itself have a number length that matches valid numbers for this region\
    ")]
    InvalidLength,
    /// The number is longer than all valid numbers for this region.
    #[error("The number is longer than all valid numbers for this region")]
    TooLong,
}

#[derive(Debug, PartialEq, Error)]
pub enum ParseErrorInternal {
    #[error("{0}")]
    FailedToParse(#[from] ParseError),
    #[error("{0}")]
    RegexError(#[from] InvalidRegexError),
}

impl From<ExtractNumberError> for ParseError {
    fn from(value: ExtractNumberError) -> Self {
        NotANumberError::FailedToExtractNumber(value).into()
    }
}

impl From<ExtractNumberError> for ParseErrorInternal {
    fn from(value: ExtractNumberError) -> Self {
        ParseErrorInternal::FailedToParse(value.into())
    }
}

impl From<NotANumberError> for ParseErrorInternal {
    fn from(value: NotANumberError) -> Self {
        ParseErrorInternal::FailedToParse(value.into())
    }
}

impl ParseErrorInternal {
    pub fn into_public(self) -> ParseError {
        match self {
            ParseErrorInternal::FailedToParse(err) => err,
            ParseErrorInternal::RegexError(err) => panic!(
                "A valid regex is expected in metadata; this indicates a library bug! {}",
                err
            ),
        }
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum GetExampleNumberError {
    #[error("Parse error: {0}")]
    FailedToParse(#[from] ParseError),
    #[error("No example number")]
    NoExampleNumber,
    #[error("Could not get number")]
    CouldNotGetNumber,
    #[error("Invalid country code provided")]
    InvalidRegionCode,
}
