//! Plain immutable value structs describing the per-region number plans.
//!
//! One `PhoneMetadata` exists per geographical region code and per
//! non-geographical calling-code entity. The tables are built elsewhere and
//! handed to the engine as a read-only `PhoneMetadataCollection`; nothing in
//! this crate mutates them after construction. Field presence is modelled
//! with `Option` and exposed through `has_x()/x()/set_x()/clear_x()`
//! accessors so "present but empty" stays distinct from "absent".

/// Declares accessors for an optional string field.
macro_rules! string_field {
    ($field:ident, $get:ident, $set:ident, $has:ident, $clear:ident) => {
        pub fn $get(&self) -> &str {
            self.$field.as_deref().unwrap_or("")
        }

        pub fn $set(&mut self, value: String) {
            self.$field = Some(value);
        }

        pub fn $has(&self) -> bool {
            self.$field.is_some()
        }

        pub fn $clear(&mut self) {
            self.$field = None;
        }
    };
}

/// Declares accessors for an optional scalar field with a default.
macro_rules! scalar_field {
    ($field:ident, $type:ty, $default:expr, $get:ident, $set:ident, $has:ident) => {
        pub fn $get(&self) -> $type {
            self.$field.unwrap_or($default)
        }

        pub fn $set(&mut self, value: $type) {
            self.$field = Some(value);
        }

        pub fn $has(&self) -> bool {
            self.$field.is_some()
        }
    };
}

/// Description of one class of numbers (fixed-line, mobile, toll-free, ...)
/// within a region: the full-match pattern over the national significant
/// number plus the lengths such numbers may have.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhoneNumberDesc {
    pub national_number_pattern: Option<String>,
    /// Sorted set of lengths a number of this type may have. The single
    /// value `-1` marks a type with no numbers at all; an empty list means
    /// the lengths are inherited from the general description.
    pub possible_length: Vec<i32>,
    /// Lengths that are only dialable locally (e.g. without an area code).
    /// Never overlaps with `possible_length`.
    pub possible_length_local_only: Vec<i32>,
    pub example_number: Option<String>,
}

impl PhoneNumberDesc {
    pub fn new() -> Self {
        Self::default()
    }

    string_field!(
        national_number_pattern,
        national_number_pattern,
        set_national_number_pattern,
        has_national_number_pattern,
        clear_national_number_pattern
    );

    string_field!(
        example_number,
        example_number,
        set_example_number,
        has_example_number,
        clear_example_number
    );
}

/// One formatting rule: a capturing pattern over the national significant
/// number and a `$1..$n` template, optionally pre-filtered by a
/// leading-digits pattern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberFormat {
    pub pattern: Option<String>,
    pub format: Option<String>,
    /// Successively refined prefix patterns; only the last (most detailed)
    /// entry is consulted when choosing a rule.
    pub leading_digits_pattern: Vec<String>,
    pub national_prefix_formatting_rule: Option<String>,
    pub national_prefix_optional_when_formatting: Option<bool>,
    pub domestic_carrier_code_formatting_rule: Option<String>,
}

impl NumberFormat {
    pub fn new() -> Self {
        Self::default()
    }

    string_field!(pattern, pattern, set_pattern, has_pattern, clear_pattern);

    string_field!(format, format, set_format, has_format, clear_format);

    string_field!(
        national_prefix_formatting_rule,
        national_prefix_formatting_rule,
        set_national_prefix_formatting_rule,
        has_national_prefix_formatting_rule,
        clear_national_prefix_formatting_rule
    );

    string_field!(
        domestic_carrier_code_formatting_rule,
        domestic_carrier_code_formatting_rule,
        set_domestic_carrier_code_formatting_rule,
        has_domestic_carrier_code_formatting_rule,
        clear_domestic_carrier_code_formatting_rule
    );

    scalar_field!(
        national_prefix_optional_when_formatting,
        bool,
        false,
        national_prefix_optional_when_formatting,
        set_national_prefix_optional_when_formatting,
        has_national_prefix_optional_when_formatting
    );
}

/// The complete number plan of one region or non-geographical entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhoneMetadata {
    pub general_desc: PhoneNumberDesc,
    pub fixed_line: PhoneNumberDesc,
    pub mobile: PhoneNumberDesc,
    pub toll_free: PhoneNumberDesc,
    pub premium_rate: PhoneNumberDesc,
    pub shared_cost: PhoneNumberDesc,
    pub personal_number: PhoneNumberDesc,
    pub voip: PhoneNumberDesc,
    pub pager: PhoneNumberDesc,
    pub uan: PhoneNumberDesc,
    pub voicemail: PhoneNumberDesc,
    pub no_international_dialling: PhoneNumberDesc,

    // Short-number tables share the metadata shape; these descs are only
    // populated in the short-number collection.
    pub emergency: PhoneNumberDesc,
    pub short_code: PhoneNumberDesc,
    pub standard_rate: PhoneNumberDesc,
    pub carrier_specific: PhoneNumberDesc,
    pub sms_services: PhoneNumberDesc,

    /// Region code ("US", "GB", ...) or "001" for non-geographical entities.
    pub id: Option<String>,
    pub country_code: Option<i32>,

    pub international_prefix: Option<String>,
    pub preferred_international_prefix: Option<String>,
    pub national_prefix: Option<String>,
    pub preferred_extn_prefix: Option<String>,
    pub national_prefix_for_parsing: Option<String>,
    pub national_prefix_transform_rule: Option<String>,

    pub same_mobile_and_fixed_line_pattern: Option<bool>,

    pub number_format: Vec<NumberFormat>,
    /// Overrides `number_format` for international output; falls back to the
    /// national list when empty.
    pub intl_number_format: Vec<NumberFormat>,

    pub main_country_for_code: Option<bool>,
    /// Distinguishes this region from others sharing its calling code.
    pub leading_digits: Option<String>,
    pub leading_zero_possible: Option<bool>,
    pub mobile_number_portable_region: Option<bool>,
}

impl PhoneMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    string_field!(id, id, set_id, has_id, clear_id);

    string_field!(
        international_prefix,
        international_prefix,
        set_international_prefix,
        has_international_prefix,
        clear_international_prefix
    );

    string_field!(
        preferred_international_prefix,
        preferred_international_prefix,
        set_preferred_international_prefix,
        has_preferred_international_prefix,
        clear_preferred_international_prefix
    );

    string_field!(
        national_prefix,
        national_prefix,
        set_national_prefix,
        has_national_prefix,
        clear_national_prefix
    );

    string_field!(
        preferred_extn_prefix,
        preferred_extn_prefix,
        set_preferred_extn_prefix,
        has_preferred_extn_prefix,
        clear_preferred_extn_prefix
    );

    string_field!(
        national_prefix_for_parsing,
        national_prefix_for_parsing,
        set_national_prefix_for_parsing,
        has_national_prefix_for_parsing,
        clear_national_prefix_for_parsing
    );

    string_field!(
        national_prefix_transform_rule,
        national_prefix_transform_rule,
        set_national_prefix_transform_rule,
        has_national_prefix_transform_rule,
        clear_national_prefix_transform_rule
    );

    string_field!(
        leading_digits,
        leading_digits,
        set_leading_digits,
        has_leading_digits,
        clear_leading_digits
    );

    scalar_field!(
        country_code,
        i32,
        0,
        country_code,
        set_country_code,
        has_country_code
    );

    scalar_field!(
        same_mobile_and_fixed_line_pattern,
        bool,
        false,
        same_mobile_and_fixed_line_pattern,
        set_same_mobile_and_fixed_line_pattern,
        has_same_mobile_and_fixed_line_pattern
    );

    scalar_field!(
        main_country_for_code,
        bool,
        false,
        main_country_for_code,
        set_main_country_for_code,
        has_main_country_for_code
    );

    scalar_field!(
        leading_zero_possible,
        bool,
        false,
        leading_zero_possible,
        set_leading_zero_possible,
        has_leading_zero_possible
    );

    scalar_field!(
        mobile_number_portable_region,
        bool,
        false,
        mobile_number_portable_region,
        set_mobile_number_portable_region,
        has_mobile_number_portable_region
    );
}

/// The full read-only table the engine is constructed from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhoneMetadataCollection {
    pub metadata: Vec<PhoneMetadata>,
}

impl PhoneMetadataCollection {
    pub fn new() -> Self {
        Self::default()
    }
}
