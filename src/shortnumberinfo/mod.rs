//! Classification of short numbers: emergency numbers and region-local short
//! codes with their expected cost.
//!
//! Short codes are keyed by region only, since they are not globally unique
//! within a country calling code. The engine reuses the same matching
//! primitives as the main number engine but reads a distinct metadata
//! collection carrying the short-code descriptors.

use std::{collections::HashMap, sync::Arc};

use log::{error, warn};

use crate::{
    i18n,
    interfaces::MatcherApi,
    metadata::{PhoneMetadata, PhoneMetadataCollection, PhoneNumberDesc},
    phonenumber::PhoneNumber,
    phonenumberutil::phonenumberutil::PhoneNumberUtil,
    regex_based_matcher::RegexBasedMatcher,
};

/// Cost categories of short numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortNumberCost {
    /// The call is free for the caller.
    TollFree,
    /// The call costs the same as a normal in-country call.
    StandardRate,
    /// The call costs more than a normal in-country call.
    PremiumRate,
    /// The cost could not be determined, or differs between regions sharing
    /// the calling code.
    UnknownCost,
}

pub struct ShortNumberInfo {
    phone_util: Arc<PhoneNumberUtil>,
    matcher_api: Box<dyn MatcherApi + Send + Sync>,

    /// A mapping from a region code to the short-number PhoneMetadata for that
    /// region.
    region_to_short_metadata_map: HashMap<String, PhoneMetadata>,

    /// In these countries, if extra digits are present after an emergency
    /// number, the call no longer connects to the emergency service.
    regions_where_emergency_numbers_must_be_exact: Vec<&'static str>,
}

impl ShortNumberInfo {
    pub fn new_for_metadata(
        phone_util: Arc<PhoneNumberUtil>,
        metadata_collection: PhoneMetadataCollection,
    ) -> Self {
        let mut region_to_short_metadata_map = HashMap::new();
        for metadata in metadata_collection.metadata {
            let region_code = metadata.id().to_string();
            if i18n::RegionCode::get_unknown() == region_code {
                continue;
            }
            region_to_short_metadata_map.insert(region_code, metadata);
        }
        Self {
            phone_util,
            matcher_api: Box::new(RegexBasedMatcher::new()),
            region_to_short_metadata_map,
            regions_where_emergency_numbers_must_be_exact: vec!["BR", "CL", "NI"],
        }
    }

    fn get_short_metadata_for_region(&self, region_code: &str) -> Option<&PhoneMetadata> {
        self.region_to_short_metadata_map.get(region_code)
    }

    /// Returns true when the region the number could belong to (going by its
    /// country calling code) includes the region it is claimed to be dialed
    /// from.
    fn region_dialing_from_matches_number(
        &self,
        number: &PhoneNumber,
        region_dialing_from: &str,
    ) -> bool {
        self.phone_util
            .region_codes_for_calling_code(number.country_code())
            .contains(&region_dialing_from)
    }

    fn matches_possible_number_and_national_number(
        &self,
        national_number: &str,
        number_desc: &PhoneNumberDesc,
    ) -> bool {
        let actual_length = national_number.len() as i32;
        if !number_desc.possible_length.is_empty()
            && !number_desc.possible_length.contains(&actual_length)
        {
            return false;
        }
        self.matcher_api
            .match_national_number(national_number, number_desc, false)
    }

    /// Check whether a short number is a possible number when dialled from a
    /// region. This provides a more lenient check than
    /// `is_valid_short_number_for_region`.
    pub fn is_possible_short_number_for_region(
        &self,
        number: &PhoneNumber,
        region_dialing_from: &str,
    ) -> bool {
        if !self.region_dialing_from_matches_number(number, region_dialing_from) {
            return false;
        }
        let Some(metadata) = self.get_short_metadata_for_region(region_dialing_from) else {
            return false;
        };
        let short_number_length = self
            .phone_util
            .get_national_significant_number(number)
            .len() as i32;
        metadata
            .general_desc
            .possible_length
            .contains(&short_number_length)
    }

    /// Check whether a short number is a possible number in any region it
    /// could be dialed from, given its country calling code.
    pub fn is_possible_short_number(&self, number: &PhoneNumber) -> bool {
        let region_codes = self
            .phone_util
            .region_codes_for_calling_code(number.country_code());
        let short_number_length = self
            .phone_util
            .get_national_significant_number(number)
            .len() as i32;
        for region_code in region_codes {
            let Some(metadata) = self.get_short_metadata_for_region(region_code) else {
                continue;
            };
            if metadata
                .general_desc
                .possible_length
                .contains(&short_number_length)
            {
                return true;
            }
        }
        false
    }

    /// Tests whether a short number matches a valid pattern in a region. Note
    /// that this doesn't verify the number is actually in use, which is
    /// impossible to tell by just looking at the number itself.
    pub fn is_valid_short_number_for_region(
        &self,
        number: &PhoneNumber,
        region_dialing_from: &str,
    ) -> bool {
        if !self.region_dialing_from_matches_number(number, region_dialing_from) {
            return false;
        }
        let Some(metadata) = self.get_short_metadata_for_region(region_dialing_from) else {
            return false;
        };
        let short_number = self.phone_util.get_national_significant_number(number);
        if !self.matches_possible_number_and_national_number(&short_number, &metadata.general_desc)
        {
            return false;
        }
        self.matches_possible_number_and_national_number(&short_number, &metadata.short_code)
    }

    /// Tests whether a short number matches a valid pattern in any region it
    /// could be dialed from, given its country calling code.
    pub fn is_valid_short_number(&self, number: &PhoneNumber) -> bool {
        let region_codes = self
            .phone_util
            .region_codes_for_calling_code(number.country_code());
        if region_codes.len() > 1 {
            if let Some(region_code) = self.get_region_code_for_short_number_from_region_list(
                number,
                &region_codes,
            ) {
                return self.is_valid_short_number_for_region(number, region_code);
            }
            return false;
        }
        let Some(region_code) = region_codes.first() else {
            return false;
        };
        self.is_valid_short_number_for_region(number, region_code)
    }

    fn get_region_code_for_short_number_from_region_list<'a>(
        &self,
        number: &PhoneNumber,
        region_codes: &[&'a str],
    ) -> Option<&'a str> {
        if region_codes.is_empty() {
            return None;
        }
        if region_codes.len() == 1 {
            return Some(region_codes[0]);
        }
        let national_number = self.phone_util.get_national_significant_number(number);
        for &region_code in region_codes {
            if let Some(metadata) = self.get_short_metadata_for_region(region_code) {
                if self
                    .matches_possible_number_and_national_number(&national_number, &metadata.short_code)
                {
                    // The number matches the short-code pattern for this region,
                    // so we return this, instead of the first region we find.
                    return Some(region_code);
                }
            }
        }
        None
    }

    /// Gets the expected cost of a short number when dialled from a region.
    /// If the number does not match a cost category, or the region is wrong,
    /// `UnknownCost` is returned.
    pub fn get_expected_cost_for_region(
        &self,
        number: &PhoneNumber,
        region_dialing_from: &str,
    ) -> ShortNumberCost {
        if !self.region_dialing_from_matches_number(number, region_dialing_from) {
            return ShortNumberCost::UnknownCost;
        }
        let Some(metadata) = self.get_short_metadata_for_region(region_dialing_from) else {
            warn!(
                "No short-number metadata found for region {}",
                region_dialing_from
            );
            return ShortNumberCost::UnknownCost;
        };
        let short_number = self.phone_util.get_national_significant_number(number);

        // The possible lengths are not present for a particular sub-type if
        // they match the general description; for this reason, we check the
        // possible lengths against the general description first to allow an
        // early exit if possible.
        if !metadata
            .general_desc
            .possible_length
            .contains(&(short_number.len() as i32))
        {
            return ShortNumberCost::UnknownCost;
        }

        // The cost categories are tested in order of decreasing expense, since
        // if for some reason the patterns overlap the most expensive matching
        // cost category should be returned.
        if self.matches_possible_number_and_national_number(&short_number, &metadata.premium_rate) {
            return ShortNumberCost::PremiumRate;
        }
        if self.matches_possible_number_and_national_number(&short_number, &metadata.standard_rate)
        {
            return ShortNumberCost::StandardRate;
        }
        if self.matches_possible_number_and_national_number(&short_number, &metadata.toll_free) {
            return ShortNumberCost::TollFree;
        }
        if self.is_emergency_number(&short_number, region_dialing_from) {
            // Emergency numbers are implicitly toll-free.
            return ShortNumberCost::TollFree;
        }
        ShortNumberCost::UnknownCost
    }

    /// Gets the expected cost of a short number, given its country calling
    /// code only. The highest cost found in any region sharing the calling
    /// code wins, except that `PremiumRate` is always reported when any region
    /// classifies the number as premium.
    pub fn get_expected_cost(&self, number: &PhoneNumber) -> ShortNumberCost {
        let region_codes = self
            .phone_util
            .region_codes_for_calling_code(number.country_code());
        if region_codes.is_empty() {
            return ShortNumberCost::UnknownCost;
        }
        if region_codes.len() == 1 {
            return self.get_expected_cost_for_region(number, region_codes[0]);
        }
        let mut cost = ShortNumberCost::TollFree;
        for region_code in region_codes {
            let cost_for_region = self.get_expected_cost_for_region(number, region_code);
            match cost_for_region {
                ShortNumberCost::PremiumRate => return ShortNumberCost::PremiumRate,
                ShortNumberCost::UnknownCost => cost = ShortNumberCost::UnknownCost,
                ShortNumberCost::StandardRate => {
                    if cost != ShortNumberCost::UnknownCost {
                        cost = ShortNumberCost::StandardRate;
                    }
                }
                ShortNumberCost::TollFree => {
                    // Do nothing.
                }
            }
        }
        cost
    }

    /// Returns true if the number, exactly as dialed, might be used to connect
    /// to an emergency service in the given region. This accepts a number with
    /// extra digits appended in regions where that still connects the call.
    pub fn connects_to_emergency_number(&self, number: &str, region_code: &str) -> bool {
        self.matches_emergency_number_helper(number, region_code, true)
    }

    /// Returns true if the number, exactly as dialed, is an emergency number
    /// in the given region. Appending further digits to a valid emergency
    /// number always invalidates it here.
    pub fn is_emergency_number(&self, number: &str, region_code: &str) -> bool {
        self.matches_emergency_number_helper(number, region_code, false)
    }

    fn matches_emergency_number_helper(
        &self,
        number: &str,
        region_code: &str,
        allow_prefix_match: bool,
    ) -> bool {
        let extracted_number = match self.phone_util.extract_possible_number(number) {
            Ok(extracted_number) => extracted_number,
            Err(_) => return false,
        };
        if extracted_number.starts_with('+') {
            // Returns false if the number starts with a plus sign. We don't
            // believe dialing the country code before emergency numbers
            // (e.g. +1911) works.
            return false;
        }
        let Some(metadata) = self.get_short_metadata_for_region(region_code) else {
            return false;
        };
        if !metadata.emergency.has_national_number_pattern() {
            return false;
        }
        let normalized_number = self.phone_util.normalize_digits_only(&extracted_number);
        let allow_prefix_match_for_region = allow_prefix_match
            && !self
                .regions_where_emergency_numbers_must_be_exact
                .iter()
                .any(|&region| region == region_code);
        self.matcher_api.match_national_number(
            &normalized_number,
            &metadata.emergency,
            allow_prefix_match_for_region,
        )
    }

    /// Given a valid short number, determines whether it is carrier-specific
    /// (however, nothing is implied about its validity).
    pub fn is_carrier_specific(&self, number: &PhoneNumber) -> bool {
        let region_codes = self
            .phone_util
            .region_codes_for_calling_code(number.country_code());
        let Some(region_code) =
            self.get_region_code_for_short_number_from_region_list(number, &region_codes)
        else {
            return false;
        };
        let national_number = self.phone_util.get_national_significant_number(number);
        self.get_short_metadata_for_region(region_code)
            .map(|metadata| {
                self.matches_possible_number_and_national_number(
                    &national_number,
                    &metadata.carrier_specific,
                )
            })
            .unwrap_or(false)
    }

    /// Given a valid short number, determines whether it is carrier-specific
    /// when dialed from the given region.
    pub fn is_carrier_specific_for_region(
        &self,
        number: &PhoneNumber,
        region_dialing_from: &str,
    ) -> bool {
        if !self.region_dialing_from_matches_number(number, region_dialing_from) {
            return false;
        }
        let national_number = self.phone_util.get_national_significant_number(number);
        self.get_short_metadata_for_region(region_dialing_from)
            .map(|metadata| {
                self.matches_possible_number_and_national_number(
                    &national_number,
                    &metadata.carrier_specific,
                )
            })
            .unwrap_or(false)
    }

    /// Given a valid short number, determines whether it is an SMS service:
    /// a number dedicated to receiving messages rather than calls.
    pub fn is_sms_service_for_region(
        &self,
        number: &PhoneNumber,
        region_dialing_from: &str,
    ) -> bool {
        if !self.region_dialing_from_matches_number(number, region_dialing_from) {
            return false;
        }
        let national_number = self.phone_util.get_national_significant_number(number);
        self.get_short_metadata_for_region(region_dialing_from)
            .map(|metadata| {
                self.matches_possible_number_and_national_number(
                    &national_number,
                    &metadata.sms_services,
                )
            })
            .unwrap_or(false)
    }

    /// Gets a valid short number for the specified region.
    pub fn get_example_short_number(&self, region_code: &str) -> &str {
        self.get_short_metadata_for_region(region_code)
            .map(|metadata| metadata.short_code.example_number())
            .unwrap_or("")
    }

    /// Gets a valid short number of the given cost category for the specified
    /// region, or an empty string when no example exists.
    pub fn get_example_short_number_for_cost(
        &self,
        region_code: &str,
        cost: ShortNumberCost,
    ) -> &str {
        let Some(metadata) = self.get_short_metadata_for_region(region_code) else {
            return "";
        };
        let desc = match cost {
            ShortNumberCost::TollFree => Some(&metadata.toll_free),
            ShortNumberCost::StandardRate => Some(&metadata.standard_rate),
            ShortNumberCost::PremiumRate => Some(&metadata.premium_rate),
            // UnknownCost numbers are.. by definition hard to pin examples on.
            ShortNumberCost::UnknownCost => None,
        };
        match desc {
            Some(desc) => desc.example_number(),
            None => {
                error!("Unsupported cost category {:?} requested for example short number", cost);
                ""
            }
        }
    }
}
