use std::sync::Arc;

use crate::{
    phonenumber::PhoneNumber,
    shortnumberinfo::{ShortNumberCost, ShortNumberInfo},
    PhoneNumberUtil,
};

use super::region_code::RegionCode;
use super::test_metadata::{short_number_metadata_collection, test_metadata_collection};

fn get_short_info() -> ShortNumberInfo {
    let phone_util = Arc::new(PhoneNumberUtil::new_for_metadata(test_metadata_collection()));
    ShortNumberInfo::new_for_metadata(phone_util, short_number_metadata_collection())
}

fn number_for(country_code: i32, national_number: u64) -> PhoneNumber {
    let mut number = PhoneNumber::new();
    number.set_country_code(country_code);
    number.set_national_number(national_number);
    number
}

#[test]
fn is_possible_short_number() {
    let short_info = get_short_info();

    let possible_number = number_for(33, 123456);
    assert!(!short_info.is_possible_short_number(&possible_number));
    let possible_number = number_for(33, 1010);
    assert!(short_info.is_possible_short_number(&possible_number));

    assert!(short_info.is_possible_short_number_for_region(&number_for(33, 1010), RegionCode::fr()));
    // A number with the wrong region is not possible, whatever its length.
    assert!(!short_info.is_possible_short_number_for_region(&number_for(33, 1010), RegionCode::us()));
}

#[test]
fn is_valid_short_number() {
    let short_info = get_short_info();

    assert!(short_info.is_valid_short_number(&number_for(33, 1010)));
    assert!(short_info
        .is_valid_short_number_for_region(&number_for(33, 1010), RegionCode::fr()));
    // Possible, but not valid: no short-code pattern matches.
    assert!(!short_info.is_valid_short_number(&number_for(33, 9999)));
    assert!(!short_info
        .is_valid_short_number_for_region(&number_for(33, 9999), RegionCode::fr()));

    assert!(short_info.is_valid_short_number(&number_for(44, 999)));
    assert!(short_info
        .is_valid_short_number_for_region(&number_for(44, 16123), RegionCode::gb()));

    // US emergency-style codes are valid short codes.
    assert!(short_info
        .is_valid_short_number_for_region(&number_for(1, 911), RegionCode::us()));
}

#[test]
fn get_expected_cost() {
    let short_info = get_short_info();

    // Premium rate in France.
    let premium_number = number_for(33, 3200);
    assert_eq!(
        ShortNumberCost::PremiumRate,
        short_info.get_expected_cost_for_region(&premium_number, RegionCode::fr())
    );
    assert_eq!(
        ShortNumberCost::PremiumRate,
        short_info.get_expected_cost(&premium_number)
    );

    // Toll free in France.
    let toll_free_number = number_for(33, 3010);
    assert_eq!(
        ShortNumberCost::TollFree,
        short_info.get_expected_cost_for_region(&toll_free_number, RegionCode::fr())
    );

    // Standard rate in the UK.
    let standard_rate_number = number_for(44, 16123);
    assert_eq!(
        ShortNumberCost::StandardRate,
        short_info.get_expected_cost_for_region(&standard_rate_number, RegionCode::gb())
    );
    assert_eq!(
        ShortNumberCost::StandardRate,
        short_info.get_expected_cost(&standard_rate_number)
    );

    // An emergency number is implicitly toll free.
    assert_eq!(
        ShortNumberCost::TollFree,
        short_info.get_expected_cost_for_region(&number_for(33, 112), RegionCode::fr())
    );

    // A number whose length is not possible at all for the region.
    assert_eq!(
        ShortNumberCost::UnknownCost,
        short_info.get_expected_cost_for_region(&number_for(33, 1234567), RegionCode::fr())
    );

    // Mismatched region.
    assert_eq!(
        ShortNumberCost::UnknownCost,
        short_info.get_expected_cost_for_region(&number_for(33, 3200), RegionCode::us())
    );
}

#[test]
fn get_expected_cost_with_shared_country_calling_code() {
    let short_info = get_short_info();

    // Calling code 1 is shared between several regions, but only US carries
    // short-number metadata here, so the cost cannot be resolved unambiguously
    // without a region hint.
    let us_premium = number_for(1, 24280);
    assert_eq!(
        ShortNumberCost::PremiumRate,
        short_info.get_expected_cost_for_region(&us_premium, RegionCode::us())
    );
    // Premium rate wins even without a region hint.
    assert_eq!(
        ShortNumberCost::PremiumRate,
        short_info.get_expected_cost(&us_premium)
    );

    // A US toll free short number degrades to unknown cost without a hint,
    // since the sibling regions cannot confirm it.
    let us_toll_free = number_for(1, 911);
    assert_eq!(
        ShortNumberCost::TollFree,
        short_info.get_expected_cost_for_region(&us_toll_free, RegionCode::us())
    );
    assert_eq!(
        ShortNumberCost::UnknownCost,
        short_info.get_expected_cost(&us_toll_free)
    );
}

#[test]
fn is_emergency_number() {
    let short_info = get_short_info();
    assert!(short_info.is_emergency_number("911", RegionCode::us()));
    assert!(short_info.is_emergency_number("112", RegionCode::us()));
    assert!(!short_info.is_emergency_number("999", RegionCode::us()));
    assert!(short_info.is_emergency_number("999", RegionCode::gb()));

    // Emergency matching is exact: appending digits invalidates the number.
    assert!(!short_info.is_emergency_number("9116666666", RegionCode::us()));
    assert!(!short_info.is_emergency_number("9111", RegionCode::us()));

    // Formatting and a leading plus sign.
    assert!(short_info.is_emergency_number("9-1-1", RegionCode::us()));
    assert!(!short_info.is_emergency_number("+911", RegionCode::us()));

    // Unknown region.
    assert!(!short_info.is_emergency_number("911", RegionCode::zz()));
}

#[test]
fn connects_to_emergency_number() {
    let short_info = get_short_info();
    assert!(short_info.connects_to_emergency_number("911", RegionCode::us()));
    assert!(short_info.connects_to_emergency_number("112", RegionCode::us()));
    assert!(!short_info.connects_to_emergency_number("999", RegionCode::us()));

    // A number with extra digits connects in the US...
    assert!(short_info.connects_to_emergency_number("9116666666", RegionCode::us()));
    // ...but not in Brazil, where emergency numbers must be dialled exactly.
    assert!(short_info.connects_to_emergency_number("190", RegionCode::br()));
    assert!(!short_info.connects_to_emergency_number("1900", RegionCode::br()));
}

#[test]
fn is_carrier_specific() {
    let short_info = get_short_info();

    let carrier_specific_number = number_for(1, 33669);
    assert!(short_info
        .is_carrier_specific_for_region(&carrier_specific_number, RegionCode::us()));
    assert!(short_info.is_carrier_specific(&carrier_specific_number));

    let not_carrier_specific = number_for(1, 911);
    assert!(!short_info.is_carrier_specific_for_region(&not_carrier_specific, RegionCode::us()));
}

#[test]
fn is_sms_service() {
    let short_info = get_short_info();
    assert!(short_info.is_sms_service_for_region(&number_for(1, 40404), RegionCode::us()));
    assert!(!short_info.is_sms_service_for_region(&number_for(1, 911), RegionCode::us()));
    // Wrong region.
    assert!(!short_info.is_sms_service_for_region(&number_for(1, 40404), RegionCode::fr()));
}

#[test]
fn get_example_short_number() {
    let short_info = get_short_info();
    assert_eq!("911", short_info.get_example_short_number(RegionCode::us()));
    assert_eq!("1010", short_info.get_example_short_number(RegionCode::fr()));
    assert_eq!("", short_info.get_example_short_number(RegionCode::zz()));

    assert_eq!(
        "3200",
        short_info
            .get_example_short_number_for_cost(RegionCode::fr(), ShortNumberCost::PremiumRate)
    );
    assert_eq!(
        "3010",
        short_info.get_example_short_number_for_cost(RegionCode::fr(), ShortNumberCost::TollFree)
    );
    assert_eq!(
        "",
        short_info
            .get_example_short_number_for_cost(RegionCode::fr(), ShortNumberCost::UnknownCost)
    );
}
