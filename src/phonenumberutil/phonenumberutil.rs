use std::{
    cmp::max,
    collections::{HashMap, HashSet, VecDeque},
};

use super::phone_number_regexps_and_mappings::PhoneNumberRegExpsAndMappings;
use crate::{
    i18n,
    interfaces::MatcherApi,
    metadata::{PhoneMetadata, PhoneMetadataCollection, PhoneNumberDesc},
    phonenumber::PhoneNumber,
    phonenumberutil::{
        errors::GetExampleNumberError,
        helper_constants::{NANPA_COUNTRY_CODE, REGION_CODE_FOR_NON_GEO_ENTITY},
        helper_functions::{
            self, get_number_desc_by_type, get_supported_types_for_metadata, normalize_helper,
            test_number_length, test_number_length_with_unknown_type,
        },
        NumberLengthType, PhoneNumberFormat, PhoneNumberType, ValidationError,
    },
    regex_based_matcher::RegexBasedMatcher,
    regex_util::RegexConsume,
    regexp_cache::InvalidRegexError,
};

use log::{trace, warn};

// Helper type for Result: the only way engine-internal operations fail is a
// metadata pattern that does not compile, which indicates a broken table
// rather than bad caller input.
pub type Result<T> = std::result::Result<T, InvalidRegexError>;

/// The number-recognition and formatting engine.
///
/// Built once from an externally supplied `PhoneMetadataCollection` and
/// immutable afterwards, so a shared instance can be used from any number of
/// threads without synchronization.
pub struct PhoneNumberUtil {
    /// An API for validation checking.
    pub(super) matcher_api: Box<dyn MatcherApi + Send + Sync>,

    /// Helper struct holding useful regular expressions and character mappings.
    pub(super) reg_exps: PhoneNumberRegExpsAndMappings,

    /// A mapping from a country calling code to the region codes which denote
    /// the regions represented by that country calling code. Note regions under
    /// NANPA share the country calling code 1 and Russia and Kazakhstan share
    /// the country calling code 7. The main country for a calling code comes
    /// first in its list. This is implemented as a sorted vector to achieve
    /// better performance.
    country_calling_code_to_region_code_map: Vec<(i32, Vec<String>)>,

    /// The set of regions that share country calling code 1.
    nanpa_regions: HashSet<String>,

    /// A mapping from a region code to a PhoneMetadata for that region.
    pub(super) region_to_metadata_map: HashMap<String, PhoneMetadata>,

    /// A mapping from a country calling code for a non-geographical entity to
    /// the PhoneMetadata for that country calling code. Examples of the country
    /// calling codes include 800 (International Toll Free Service) and 808
    /// (International Shared Cost Service).
    pub(super) country_code_to_non_geographical_metadata_map: HashMap<i32, PhoneMetadata>,
}

impl PhoneNumberUtil {
    pub fn new_for_metadata(metadata_collection: PhoneMetadataCollection) -> Self {
        let mut instance = Self {
            matcher_api: Box::new(RegexBasedMatcher::new()),
            reg_exps: PhoneNumberRegExpsAndMappings::new(),
            country_calling_code_to_region_code_map: Default::default(),
            nanpa_regions: Default::default(),
            region_to_metadata_map: Default::default(),
            country_code_to_non_geographical_metadata_map: Default::default(),
        };
        // Storing data in a temporary map to make it easier to find other regions
        // that share a country calling code when inserting data.
        let mut country_calling_code_to_region_map = HashMap::<i32, VecDeque<String>>::new();
        for metadata in metadata_collection.metadata {
            let region_code = metadata.id().to_string();
            let main_country_for_code = metadata.main_country_for_code();
            if i18n::RegionCode::get_unknown() == region_code {
                continue;
            }

            let country_calling_code = metadata.country_code();
            if REGION_CODE_FOR_NON_GEO_ENTITY == region_code {
                instance
                    .country_code_to_non_geographical_metadata_map
                    .insert(country_calling_code, metadata);
            } else {
                instance
                    .region_to_metadata_map
                    .insert(region_code.clone(), metadata);
            }

            if let Some(calling_code_in) =
                country_calling_code_to_region_map.get_mut(&country_calling_code)
            {
                if main_country_for_code {
                    calling_code_in.push_front(region_code.clone());
                } else {
                    calling_code_in.push_back(region_code.clone());
                }
            } else {
                // For most country calling codes, there will be only one region code.
                let mut list_with_region_code = VecDeque::new();
                list_with_region_code.push_back(region_code.clone());
                country_calling_code_to_region_map
                    .insert(country_calling_code, list_with_region_code);
            }
            if country_calling_code == NANPA_COUNTRY_CODE {
                instance.nanpa_regions.insert(region_code);
            }
        }

        instance.country_calling_code_to_region_code_map.extend(
            country_calling_code_to_region_map
                .into_iter()
                .map(|(k, v)| (k, Vec::from(v))),
        );
        // Sort all the pairs in ascending order according to country calling code.
        instance
            .country_calling_code_to_region_code_map
            .sort_by_key(|(a, _)| *a);
        instance
    }

    pub fn get_supported_regions(&self) -> impl Iterator<Item = &str> {
        self.region_to_metadata_map.keys().map(|k| k.as_str())
    }

    pub fn get_supported_global_network_calling_codes(&self) -> impl Iterator<Item = i32> + '_ {
        self.country_code_to_non_geographical_metadata_map
            .keys()
            .copied()
    }

    pub fn get_supported_calling_codes(&self) -> impl Iterator<Item = i32> + '_ {
        self.country_calling_code_to_region_code_map
            .iter()
            .map(|(k, _)| *k)
    }

    pub fn get_supported_types_for_region(
        &self,
        region_code: &str,
    ) -> Option<HashSet<PhoneNumberType>> {
        self.region_to_metadata_map
            .get(region_code)
            .map(get_supported_types_for_metadata)
            .or_else(|| {
                warn!("Invalid or unknown region code provided: {}", region_code);
                None
            })
    }

    pub fn get_supported_types_for_non_geo_entity(
        &self,
        country_calling_code: i32,
    ) -> Option<HashSet<PhoneNumberType>> {
        self.country_code_to_non_geographical_metadata_map
            .get(&country_calling_code)
            .map(get_supported_types_for_metadata)
            .or_else(|| {
                warn!(
                    "Unknown country calling code for a non-geographical entity provided: {}",
                    country_calling_code
                );
                None
            })
    }

    /// Returns the region codes that share the given country calling code, the
    /// main country for the code first. `None` when the code is unknown.
    pub fn get_region_codes_for_country_calling_code(
        &self,
        country_calling_code: i32,
    ) -> Option<impl Iterator<Item = &str>> {
        self.country_calling_code_to_region_code_map
            .binary_search_by_key(&country_calling_code, |(code, _)| *code)
            .ok()
            .map(|index| {
                self.country_calling_code_to_region_code_map[index]
                    .1
                    .iter()
                    .map(|region| region.as_str())
            })
    }

    pub(crate) fn region_codes_for_calling_code(&self, country_calling_code: i32) -> Vec<&str> {
        self.get_region_codes_for_country_calling_code(country_calling_code)
            .map(|iter| iter.collect())
            .unwrap_or_default()
    }

    /// Returns the region code that matches the specific country calling code. In
    /// the case of no region code being found, the unknown region code will be
    /// returned.
    pub fn get_region_code_for_country_code(&self, country_calling_code: i32) -> &str {
        self.region_codes_for_calling_code(country_calling_code)
            .first()
            .copied()
            .unwrap_or(i18n::RegionCode::get_unknown())
    }

    pub fn get_region_code_for_number(&self, phone_number: &PhoneNumber) -> Result<&str> {
        let country_calling_code = phone_number.country_code();
        let region_codes = self.region_codes_for_calling_code(country_calling_code);
        if region_codes.is_empty() {
            trace!(
                "Missing/invalid country calling code ({})",
                country_calling_code
            );
            return Ok(i18n::RegionCode::get_unknown());
        }
        if region_codes.len() == 1 {
            Ok(region_codes[0])
        } else {
            self.get_region_code_for_number_from_region_list(phone_number, &region_codes)
        }
    }

    fn get_region_code_for_number_from_region_list<'b>(
        &self,
        phone_number: &PhoneNumber,
        region_codes: &[&'b str],
    ) -> Result<&'b str> {
        let national_number = self.get_national_significant_number(phone_number);
        for &code in region_codes {
            // Metadata cannot be null because the region codes come from the
            // country calling code map.
            let metadata = &self.region_to_metadata_map[code];
            if metadata.has_leading_digits() {
                if self
                    .reg_exps
                    .regexp_cache
                    .get_regex(metadata.leading_digits())?
                    .find_start(&national_number)
                    .is_some()
                {
                    return Ok(code);
                }
            } else if self.get_number_type_helper(&national_number, metadata)
                != PhoneNumberType::Unknown
            {
                return Ok(code);
            }
        }
        Ok(i18n::RegionCode::get_unknown())
    }

    pub fn get_country_code_for_region(&self, region_code: &str) -> i32 {
        self.region_to_metadata_map
            .get(region_code)
            .map(|metadata| metadata.country_code())
            .unwrap_or_else(|| {
                warn!("Invalid or unknown region code ({}) provided.", region_code);
                0
            })
    }

    pub fn get_metadata_for_region(&self, region_code: &str) -> Option<&PhoneMetadata> {
        self.region_to_metadata_map.get(region_code)
    }

    pub(crate) fn get_metadata_for_region_or_calling_code(
        &self,
        country_calling_code: i32,
        region_code: &str,
    ) -> Option<&PhoneMetadata> {
        if REGION_CODE_FOR_NON_GEO_ENTITY == region_code {
            self.country_code_to_non_geographical_metadata_map
                .get(&country_calling_code)
        } else {
            self.region_to_metadata_map.get(region_code)
        }
    }

    pub(super) fn is_valid_region_code(&self, region_code: &str) -> bool {
        self.region_to_metadata_map.contains_key(region_code)
    }

    pub(super) fn has_valid_country_calling_code(&self, country_calling_code: i32) -> bool {
        self.country_calling_code_to_region_code_map
            .binary_search_by_key(&country_calling_code, |(k, _)| *k)
            .is_ok()
    }

    /// Returns true if the region code is one of the regions under the North
    /// American Numbering Plan Administration.
    pub fn is_nanpa_country(&self, region_code: &str) -> bool {
        self.nanpa_regions.contains(region_code)
    }

    /// Returns the national dialling prefix for a region, or `None` for an
    /// unknown region. Some prefixes contain "~", which means "wait for the
    /// dialling tone"; `strip_non_digits` removes it.
    pub fn get_ndd_prefix_for_region(
        &self,
        region_code: &str,
        strip_non_digits: bool,
    ) -> Option<String> {
        self.region_to_metadata_map
            .get(region_code)
            .map(|metadata| {
                let mut prefix = metadata.national_prefix().to_owned();
                if strip_non_digits {
                    prefix = prefix.replace('~', "");
                }
                prefix
            })
            .or_else(|| {
                warn!("Invalid or unknown region code ({}) provided.", region_code);
                None
            })
    }

    /// Returns the mobile token for the provided country calling code if it has
    /// one, otherwise an empty string. A mobile token is a number inserted
    /// before the area code when dialing a mobile number from that country from
    /// abroad.
    pub fn get_country_mobile_token(&self, country_calling_code: i32) -> String {
        self.reg_exps
            .mobile_token_mappings
            .get(&country_calling_code)
            .map(|token| token.to_string())
            .unwrap_or_default()
    }

    /// Reconstructs the national significant number: the portion of the number
    /// following the country calling code, with significant leading zeros
    /// restored from the sidecar fields.
    pub fn get_national_significant_number(&self, phone_number: &PhoneNumber) -> String {
        // If leading zero(s) have been set, we prefix this now. Note this is not
        // a national prefix. Ensure the number of leading zeros is at least 0 so
        // we don't crash in the case of malicious input.
        let zeros_start = if phone_number.italian_leading_zero() {
            "0".repeat(max(phone_number.number_of_leading_zeros(), 0) as usize)
        } else {
            String::new()
        };

        let mut buf = itoa::Buffer::new();
        let national_number = buf.format(phone_number.national_number());

        fast_cat::concat_str!(&zeros_start, national_number)
    }

    // Normalization surface.

    /// Normalizes a string of characters representing a phone number. This
    /// converts wide-ascii and arabic-indic numerals to normal ascii numerals,
    /// and strips punctuation and alpha characters (letters are converted to
    /// their keypad digits first when the number looks like a vanity number).
    pub fn normalize(&self, number: &str) -> String {
        let number = if self.reg_exps.valid_alpha_phone_pattern.is_match(number) {
            normalize_helper(&self.reg_exps.alpha_phone_mappings, true, number)
        } else {
            number.to_owned()
        };
        Self::normalize_digits(&number, false)
    }

    /// Converts any recognized decimal-digit codepoint to ascii 0-9.
    /// Non-digits are kept or dropped according to `keep_non_digits`.
    fn normalize_digits(number: &str, keep_non_digits: bool) -> String {
        let converted = dec_from_char::normalize_decimals(number);
        if keep_non_digits {
            converted
        } else {
            converted.chars().filter(|c| c.is_ascii_digit()).collect()
        }
    }

    /// Normalizes a string of characters representing a phone number by
    /// removing everything that is not a digit.
    pub fn normalize_digits_only(&self, number: &str) -> String {
        Self::normalize_digits(number, false)
    }

    /// Normalizes a string of characters representing a phone number by
    /// removing everything that cannot be dialled: anything but digits and the
    /// plus, star and hash signs.
    pub fn normalize_diallable_chars_only(&self, phone_number: &str) -> String {
        normalize_helper(&self.reg_exps.diallable_char_mappings, true, phone_number)
    }

    /// Converts all alpha characters in a number to their respective digits on
    /// a keypad, but retains existing formatting.
    pub fn convert_alpha_characters_in_number(&self, number: &str) -> String {
        normalize_helper(&self.reg_exps.alpha_phone_mappings, false, number)
    }

    /// Returns true if the number is a valid vanity (alpha) number such as
    /// "1800 MICROSOFT". It only checks basic structure; the number need not
    /// be dialable.
    pub fn is_alpha_number(&self, number: &str) -> bool {
        if !self.is_viable_phone_number(number) {
            // Number is too short, or doesn't match the basic phone number pattern.
            return false;
        }
        let (number_without_extension, _) = self.maybe_strip_extension(number);
        self.reg_exps
            .valid_alpha_phone_pattern
            .is_match(&number_without_extension)
    }

    // Validation and classification.

    pub fn is_possible_number(&self, number: &PhoneNumber) -> bool {
        self.is_possible_number_with_reason(number).is_ok()
    }

    pub fn is_possible_number_for_string(&self, number: &str, region_dialing_from: &str) -> bool {
        match self.parse(number, region_dialing_from) {
            Ok(number_proto) => self.is_possible_number(&number_proto),
            Err(_) => false,
        }
    }

    pub fn is_possible_number_for_type(
        &self,
        number: &PhoneNumber,
        phone_number_type: PhoneNumberType,
    ) -> bool {
        self.is_possible_number_for_type_with_reason(number, phone_number_type)
            .is_ok()
    }

    pub fn is_possible_number_with_reason(
        &self,
        number: &PhoneNumber,
    ) -> std::result::Result<NumberLengthType, ValidationError> {
        self.is_possible_number_for_type_with_reason(number, PhoneNumberType::Unknown)
    }

    pub fn is_possible_number_for_type_with_reason(
        &self,
        number: &PhoneNumber,
        phone_number_type: PhoneNumberType,
    ) -> std::result::Result<NumberLengthType, ValidationError> {
        let national_number = self.get_national_significant_number(number);
        let country_code = number.country_code();
        // Note: for regions that share a country calling code, like NANPA
        // numbers, we just use the rules from the default region (US in this
        // case) since the GetRegionCodeForNumber will not work if the number is
        // possible but not valid. There is in fact one country calling code (290)
        // where the possible number pattern differs between various regions
        // (Saint Helena and Tristan da Cunha), but this is handled by putting all
        // possible lengths for any country with this country calling code in the
        // metadata for the default region in this case.
        if !self.has_valid_country_calling_code(country_code) {
            return Err(ValidationError::InvalidCountryCode);
        }
        let region_code = self.get_region_code_for_country_code(country_code);
        // Metadata cannot be null because the country calling code is valid.
        let Some(metadata) = self.get_metadata_for_region_or_calling_code(country_code, region_code)
        else {
            return Err(ValidationError::InvalidCountryCode);
        };
        test_number_length(&national_number, metadata, phone_number_type)
    }

    pub fn is_valid_number(&self, number: &PhoneNumber) -> Result<bool> {
        let region_code = self.get_region_code_for_number(number)?;
        Ok(self.is_valid_number_for_region(number, region_code))
    }

    pub fn is_valid_number_for_region(&self, number: &PhoneNumber, region_code: &str) -> bool {
        let country_code = number.country_code();
        let Some(metadata) = self.get_metadata_for_region_or_calling_code(country_code, region_code)
        else {
            return false;
        };
        if REGION_CODE_FOR_NON_GEO_ENTITY != region_code
            && country_code != self.get_country_code_for_region(region_code)
        {
            // Either the region code was invalid, or the country calling code for
            // a given region is not the same as the country code for the region
            // we're checking against.
            return false;
        }
        let national_number = self.get_national_significant_number(number);
        self.get_number_type_helper(&national_number, metadata) != PhoneNumberType::Unknown
    }

    pub fn get_number_type(&self, phone_number: &PhoneNumber) -> Result<PhoneNumberType> {
        let region_code = self.get_region_code_for_number(phone_number)?;
        let Some(metadata) =
            self.get_metadata_for_region_or_calling_code(phone_number.country_code(), region_code)
        else {
            return Ok(PhoneNumberType::Unknown);
        };
        let national_significant_number = self.get_national_significant_number(phone_number);
        Ok(self.get_number_type_helper(&national_significant_number, metadata))
    }

    pub(super) fn get_number_type_helper(
        &self,
        national_number: &str,
        metadata: &PhoneMetadata,
    ) -> PhoneNumberType {
        if !self.is_number_matching_desc(national_number, &metadata.general_desc) {
            trace!(
                "Number '{national_number}' type unknown - doesn't match general national number pattern"
            );
            return PhoneNumberType::Unknown;
        }
        if self.is_number_matching_desc(national_number, &metadata.premium_rate) {
            trace!("Number '{national_number}' is a premium number.");
            return PhoneNumberType::PremiumRate;
        }
        if self.is_number_matching_desc(national_number, &metadata.toll_free) {
            trace!("Number '{national_number}' is a toll-free number.");
            return PhoneNumberType::TollFree;
        }
        if self.is_number_matching_desc(national_number, &metadata.shared_cost) {
            trace!("Number '{national_number}' is a shared cost number.");
            return PhoneNumberType::SharedCost;
        }
        if self.is_number_matching_desc(national_number, &metadata.voip) {
            trace!("Number '{national_number}' is a VOIP (Voice over IP) number.");
            return PhoneNumberType::VoIP;
        }
        if self.is_number_matching_desc(national_number, &metadata.personal_number) {
            trace!("Number '{national_number}' is a personal number.");
            return PhoneNumberType::PersonalNumber;
        }
        if self.is_number_matching_desc(national_number, &metadata.pager) {
            trace!("Number '{national_number}' is a pager number.");
            return PhoneNumberType::Pager;
        }
        if self.is_number_matching_desc(national_number, &metadata.uan) {
            trace!("Number '{national_number}' is a UAN.");
            return PhoneNumberType::UAN;
        }
        if self.is_number_matching_desc(national_number, &metadata.voicemail) {
            trace!("Number '{national_number}' is a voicemail number.");
            return PhoneNumberType::VoiceMail;
        }

        let is_fixed_line = self.is_number_matching_desc(national_number, &metadata.fixed_line);
        if is_fixed_line {
            if metadata.same_mobile_and_fixed_line_pattern() {
                trace!(
                    "Number '{national_number}': fixed-line and mobile patterns equal, \
                    number is fixed-line or mobile"
                );
                return PhoneNumberType::FixedLineOrMobile;
            } else if self.is_number_matching_desc(national_number, &metadata.mobile) {
                trace!(
                    "Number '{national_number}': fixed-line and mobile patterns differ, but number is \
                    still fixed-line or mobile"
                );
                return PhoneNumberType::FixedLineOrMobile;
            }
            trace!("Number '{national_number}' is a fixed line number.");
            return PhoneNumberType::FixedLine;
        }
        // Otherwise, test to see if the number is mobile. Only do this if certain
        // that the patterns for mobile and fixed line aren't the same.
        if !metadata.same_mobile_and_fixed_line_pattern()
            && self.is_number_matching_desc(national_number, &metadata.mobile)
        {
            trace!("Number '{national_number}' is a mobile number.");
            return PhoneNumberType::Mobile;
        }
        trace!(
            "Number '{national_number}' type unknown - doesn't match any specific number type pattern."
        );
        PhoneNumberType::Unknown
    }

    pub(super) fn is_number_matching_desc(
        &self,
        national_number: &str,
        number_desc: &PhoneNumberDesc,
    ) -> bool {
        // Check if any possible number lengths are present; if so, we use them to
        // avoid checking the validation pattern if they don't match. If they are
        // absent, this means they match the general description, which we have
        // already checked before checking a specific number type.
        let actual_length = national_number.len() as i32;
        if !number_desc.possible_length.is_empty()
            && !number_desc.possible_length.contains(&actual_length)
        {
            return false;
        }
        // very common name, so specify mod
        helper_functions::is_match(self.matcher_api.as_ref(), national_number, number_desc)
    }

    /// Returns true if the number can only be dialled from outside the region,
    /// or unknown. If the number can only be dialled from within the region,
    /// returns false. Does not check the number is a valid number.
    pub fn can_be_internationally_dialled(&self, phone_number: &PhoneNumber) -> Result<bool> {
        let region_code = self.get_region_code_for_number(phone_number)?;
        let Some(metadata) = self.region_to_metadata_map.get(region_code) else {
            // Note numbers belonging to non-geographical entities (e.g. +800
            // numbers) are always internationally diallable, and will be caught
            // here.
            return Ok(true);
        };
        let national_significant_number = self.get_national_significant_number(phone_number);
        Ok(!self.is_number_matching_desc(
            &national_significant_number,
            &metadata.no_international_dialling,
        ))
    }

    /// Returns true if the number is geographical: tied to a place, as
    /// fixed-line numbers are everywhere and mobile numbers are in a few
    /// countries.
    pub fn is_number_geographical(&self, phone_number: &PhoneNumber) -> Result<bool> {
        let number_type = self.get_number_type(phone_number)?;
        Ok(self.is_number_type_geographical(number_type, phone_number.country_code()))
    }

    pub(super) fn is_number_type_geographical(
        &self,
        phone_number_type: PhoneNumberType,
        country_calling_code: i32,
    ) -> bool {
        matches!(
            phone_number_type,
            PhoneNumberType::FixedLine | PhoneNumberType::FixedLineOrMobile
        ) || (self
            .reg_exps
            .geo_mobile_countries
            .contains(&country_calling_code)
            && phone_number_type == PhoneNumberType::Mobile)
    }

    /// Returns the length of the geographical area code of the number, in
    /// digits, or zero for numbers without one (mobile in most regions,
    /// toll-free, invalid numbers, closed dialling plans).
    pub fn get_length_of_geographical_area_code(&self, number: &PhoneNumber) -> Result<i32> {
        let region_code = self.get_region_code_for_number(number)?;
        let Some(metadata) = self.get_metadata_for_region(region_code) else {
            return Ok(0);
        };
        let country_calling_code = number.country_code();

        // If a country doesn't use a national prefix, and this number doesn't
        // have an Italian leading zero, we assume it is a closed dialling plan
        // with no area codes.
        if !metadata.has_national_prefix()
            && !number.italian_leading_zero()
            && !self
                .reg_exps
                .countries_without_national_prefix_with_area_codes
                .contains(&country_calling_code)
        {
            return Ok(0);
        }

        let number_type = self.get_number_type(number)?;
        if number_type == PhoneNumberType::Mobile
            && self
                .reg_exps
                .geo_mobile_countries_without_mobile_area_codes
                .contains(&country_calling_code)
        {
            // Note this is a rough heuristic; it doesn't cover Indonesia etc.
            return Ok(0);
        }

        if !self.is_number_type_geographical(number_type, country_calling_code) {
            return Ok(0);
        }

        self.get_length_of_national_destination_code(number)
    }

    /// Returns the length of the national destination code: the leading digit
    /// groups of the international format after the country calling code.
    pub fn get_length_of_national_destination_code(&self, number: &PhoneNumber) -> Result<i32> {
        let mut copied_proto = number.clone();
        if number.has_extension() {
            // Clear the extension so the non-digit chars it may contain do not
            // offset the group boundaries below.
            copied_proto.clear_extension();
        }
        let formatted_number = self.format(&copied_proto, PhoneNumberFormat::International)?;

        // The pattern will start with "+COUNTRY_CODE " so the first digit group
        // will be the country calling code, and the second group will be the
        // national destination code if it is not the last group.
        let digit_groups: Vec<&str> = self
            .reg_exps
            .capturing_ascii_digits_pattern
            .find_iter(&formatted_number)
            .map(|m| m.as_str())
            .take(3)
            .collect();
        if digit_groups.len() < 3 {
            return Ok(0);
        }

        if self.get_number_type(number)? == PhoneNumberType::Mobile {
            // For example Argentinian mobile numbers, when formatted in the
            // international format, are in the form of +54 9 NDC XXXX.... As a
            // result, we take the length of the third group (NDC) and add the
            // length of the mobile token, which also forms part of the national
            // significant number. This assumes that the mobile token is always
            // formatted separately from the rest of the phone number.
            let mobile_token = self.get_country_mobile_token(number.country_code());
            if !mobile_token.is_empty() {
                return Ok((digit_groups[2].len() + mobile_token.len()) as i32);
            }
        }
        Ok(digit_groups[1].len() as i32)
    }

    /// Attempts to extract a valid number from a phone number that is too long
    /// to be valid, by stripping trailing digits. Returns true if a valid
    /// number could be extracted (the number is modified in place).
    pub fn truncate_too_long_number(&self, number: &mut PhoneNumber) -> Result<bool> {
        if self.is_valid_number(number)? {
            return Ok(true);
        }
        let mut number_copy = number.clone();
        let mut national_number = number.national_number();
        loop {
            national_number /= 10;
            number_copy.set_national_number(national_number);
            if national_number == 0
                || matches!(
                    self.is_possible_number_with_reason(&number_copy),
                    Err(ValidationError::TooShort)
                )
            {
                return Ok(false);
            }
            if self.is_valid_number(&number_copy)? {
                number.set_national_number(national_number);
                return Ok(true);
            }
        }
    }

    // Example numbers.

    /// Returns a valid fixed-line number for the given region.
    pub fn get_example_number(
        &self,
        region_code: &str,
    ) -> std::result::Result<PhoneNumber, GetExampleNumberError> {
        self.get_example_number_for_type_and_region_code(region_code, PhoneNumberType::FixedLine)
    }

    pub fn get_example_number_for_type_and_region_code(
        &self,
        region_code: &str,
        phone_number_type: PhoneNumberType,
    ) -> std::result::Result<PhoneNumber, GetExampleNumberError> {
        let Some(metadata) = self.get_metadata_for_region(region_code) else {
            warn!("Invalid or unknown region code ({}) provided.", region_code);
            return Err(GetExampleNumberError::InvalidRegionCode);
        };
        let desc = get_number_desc_by_type(metadata, phone_number_type);
        if !desc.has_example_number() {
            return Err(GetExampleNumberError::NoExampleNumber);
        }
        Ok(self.parse(desc.example_number(), region_code)?)
    }

    /// Returns a valid number of the given type for any supported region.
    pub fn get_example_number_for_type(
        &self,
        phone_number_type: PhoneNumberType,
    ) -> std::result::Result<PhoneNumber, GetExampleNumberError> {
        let mut region_codes: Vec<&str> = self.get_supported_regions().collect();
        // Deterministic order so repeated calls agree on the example chosen.
        region_codes.sort_unstable();
        for region_code in region_codes {
            if let Ok(number) =
                self.get_example_number_for_type_and_region_code(region_code, phone_number_type)
            {
                return Ok(number);
            }
        }
        // If there wasn't an example number for a region, try the non-geographical entities.
        let mut calling_codes: Vec<i32> = self.get_supported_global_network_calling_codes().collect();
        calling_codes.sort_unstable();
        for country_calling_code in calling_codes {
            let metadata = &self.country_code_to_non_geographical_metadata_map
                [&country_calling_code];
            let desc = get_number_desc_by_type(metadata, phone_number_type);
            if desc.has_example_number() {
                let mut buf = itoa::Buffer::new();
                let candidate = fast_cat::concat_str!(
                    "+",
                    buf.format(country_calling_code),
                    desc.example_number()
                );
                if let Ok(number) = self.parse(&candidate, i18n::RegionCode::get_unknown()) {
                    return Ok(number);
                }
            }
        }
        // There are no example numbers of this type for any country in the library.
        Err(GetExampleNumberError::NoExampleNumber)
    }

    pub fn get_example_number_for_non_geo_entity(
        &self,
        country_calling_code: i32,
    ) -> std::result::Result<PhoneNumber, GetExampleNumberError> {
        let Some(metadata) = self
            .country_code_to_non_geographical_metadata_map
            .get(&country_calling_code)
        else {
            warn!(
                "Invalid or unknown country calling code provided: {}",
                country_calling_code
            );
            return Err(GetExampleNumberError::InvalidRegionCode);
        };
        // For geographical entities, fixed-line data is always present. However,
        // for non-geographical entities, this is not the case, so we have to go
        // through different types to find the example number.
        for desc in [
            &metadata.mobile,
            &metadata.toll_free,
            &metadata.shared_cost,
            &metadata.voip,
            &metadata.voicemail,
            &metadata.uan,
            &metadata.premium_rate,
        ] {
            if !desc.has_example_number() {
                continue;
            }
            let mut buf = itoa::Buffer::new();
            let candidate = fast_cat::concat_str!(
                "+",
                buf.format(country_calling_code),
                desc.example_number()
            );
            if let Ok(number) = self.parse(&candidate, i18n::RegionCode::get_unknown()) {
                return Ok(number);
            }
        }
        Err(GetExampleNumberError::NoExampleNumber)
    }

    /// Returns an invalid number for the given region: useful for unit tests of
    /// applications, where real numbers would be called if a test failed.
    pub fn get_invalid_example_number(
        &self,
        region_code: &str,
    ) -> std::result::Result<PhoneNumber, GetExampleNumberError> {
        let Some(metadata) = self.get_metadata_for_region(region_code) else {
            return Err(GetExampleNumberError::InvalidRegionCode);
        };
        // We start out with a valid fixed-line number since every country
        // supports this. Alternatively we could start with a different number
        // type, since fixed-line numbers typically have a wider breadth of valid
        // number lengths and we may have to make it very short before we get an
        // invalid number.
        let desc = get_number_desc_by_type(metadata, PhoneNumberType::FixedLine);
        if !desc.has_example_number() {
            // This shouldn't happen - we have a test for this.
            return Err(GetExampleNumberError::NoExampleNumber);
        }
        let example_number = desc.example_number();
        // Try and make the number invalid. We do this by changing the length. We
        // try reducing the length of the number, since currently no region has a
        // number that is the same length as MIN_LENGTH_FOR_NSN. This is probably
        // quicker than making the number longer, which is another
        // alternative. We could also use the possible number pattern to extract
        // the possible lengths of the number to make this faster, but this
        // method is only for unit-testing purposes.
        for length in
            (super::helper_constants::MIN_LENGTH_FOR_NSN..example_number.len()).rev()
        {
            let number_to_try = &example_number[..length];
            if let Ok(possibly_valid_number) = self.parse(number_to_try, region_code) {
                if !self.is_valid_number(&possibly_valid_number).unwrap_or(true) {
                    return Ok(possibly_valid_number);
                }
            }
        }
        // It is impossible to obtain an invalid number. This can only happen when
        // the metadata is out of sync with the possible lengths.
        Err(GetExampleNumberError::CouldNotGetNumber)
    }

    pub(super) fn test_number_length_for_region(
        &self,
        phone_number: &str,
        metadata: &PhoneMetadata,
    ) -> std::result::Result<NumberLengthType, ValidationError> {
        test_number_length_with_unknown_type(phone_number, metadata)
    }
}
