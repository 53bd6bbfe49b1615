use std::borrow::Cow;

use crate::phonenumber::CountryCodeSource;

/// Result of stripping any international prefix from a candidate number:
/// what is left of the number, and how (or whether) the prefix was written.
#[derive(Debug)]
pub struct PhoneNumberWithCountryCodeSource<'a> {
    pub phone_number: Cow<'a, str>,
    pub country_code_source: CountryCodeSource,
}

impl<'a> PhoneNumberWithCountryCodeSource<'a> {
    pub fn new(phone_number: Cow<'a, str>, country_code_source: CountryCodeSource) -> Self {
        Self {
            phone_number,
            country_code_source,
        }
    }
}
