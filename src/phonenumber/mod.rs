//! The `PhoneNumber` value type produced by parsing.
//!
//! A parsed number is `(country_code, national_number)` plus sidecar fields.
//! The national number is stored as `u64`, which cannot represent leading
//! zeros; `italian_leading_zero` and `number_of_leading_zeros` restore them
//! losslessly. `raw_input`, `country_code_source` and
//! `preferred_domestic_carrier_code` are only set by the
//! keep-raw-input parse variant and are ignored by number matching.

/// Records how the country calling code of a parsed number was derived.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountryCodeSource {
    UNSPECIFIED,
    FROM_NUMBER_WITH_PLUS_SIGN,
    FROM_NUMBER_WITH_IDD,
    FROM_NUMBER_WITHOUT_PLUS_SIGN,
    FROM_DEFAULT_COUNTRY,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhoneNumber {
    pub country_code: Option<i32>,
    pub national_number: Option<u64>,
    pub extension: Option<String>,
    pub italian_leading_zero: Option<bool>,
    pub number_of_leading_zeros: Option<i32>,
    pub raw_input: Option<String>,
    pub country_code_source: Option<CountryCodeSource>,
    pub preferred_domestic_carrier_code: Option<String>,
}

impl PhoneNumber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn country_code(&self) -> i32 {
        self.country_code.unwrap_or(0)
    }

    pub fn set_country_code(&mut self, value: i32) {
        self.country_code = Some(value);
    }

    pub fn has_country_code(&self) -> bool {
        self.country_code.is_some()
    }

    pub fn national_number(&self) -> u64 {
        self.national_number.unwrap_or(0)
    }

    pub fn set_national_number(&mut self, value: u64) {
        self.national_number = Some(value);
    }

    pub fn has_national_number(&self) -> bool {
        self.national_number.is_some()
    }

    pub fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or("")
    }

    pub fn set_extension(&mut self, value: String) {
        self.extension = Some(value);
    }

    pub fn has_extension(&self) -> bool {
        self.extension.is_some()
    }

    pub fn clear_extension(&mut self) {
        self.extension = None;
    }

    pub fn italian_leading_zero(&self) -> bool {
        self.italian_leading_zero.unwrap_or(false)
    }

    pub fn set_italian_leading_zero(&mut self, value: bool) {
        self.italian_leading_zero = Some(value);
    }

    pub fn has_italian_leading_zero(&self) -> bool {
        self.italian_leading_zero.is_some()
    }

    /// Defaults to one leading zero when the flag is set but the count is
    /// absent, matching how most numbers with a significant zero look.
    pub fn number_of_leading_zeros(&self) -> i32 {
        self.number_of_leading_zeros.unwrap_or(1)
    }

    pub fn set_number_of_leading_zeros(&mut self, value: i32) {
        self.number_of_leading_zeros = Some(value);
    }

    pub fn has_number_of_leading_zeros(&self) -> bool {
        self.number_of_leading_zeros.is_some()
    }

    pub fn raw_input(&self) -> &str {
        self.raw_input.as_deref().unwrap_or("")
    }

    pub fn set_raw_input(&mut self, value: String) {
        self.raw_input = Some(value);
    }

    pub fn has_raw_input(&self) -> bool {
        self.raw_input.is_some()
    }

    pub fn clear_raw_input(&mut self) {
        self.raw_input = None;
    }

    pub fn country_code_source(&self) -> CountryCodeSource {
        self.country_code_source
            .unwrap_or(CountryCodeSource::UNSPECIFIED)
    }

    pub fn set_country_code_source(&mut self, value: CountryCodeSource) {
        self.country_code_source = Some(value);
    }

    pub fn has_country_code_source(&self) -> bool {
        self.country_code_source.is_some()
    }

    pub fn clear_country_code_source(&mut self) {
        self.country_code_source = None;
    }

    pub fn preferred_domestic_carrier_code(&self) -> &str {
        self.preferred_domestic_carrier_code
            .as_deref()
            .unwrap_or("")
    }

    pub fn set_preferred_domestic_carrier_code(&mut self, value: String) {
        self.preferred_domestic_carrier_code = Some(value);
    }

    pub fn has_preferred_domestic_carrier_code(&self) -> bool {
        self.preferred_domestic_carrier_code.is_some()
    }

    pub fn clear_preferred_domestic_carrier_code(&mut self) {
        self.preferred_domestic_carrier_code = None;
    }
}
