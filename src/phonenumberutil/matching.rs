use crate::{
    i18n,
    phonenumber::PhoneNumber,
    phonenumberutil::{
        errors::ParseError,
        helper_functions::{copy_core_fields_only, is_national_number_suffix_of_the_other},
        phonenumberutil::PhoneNumberUtil,
        MatchType,
    },
};

impl PhoneNumberUtil {
    /// Takes two phone numbers and compares them for equality. Returns
    /// `ExactMatch` when the country code, NSN, presence of a leading zero for
    /// Italian numbers and any extension present are the same; `NsnMatch` when
    /// either or both has no region specified and the NSNs and extensions are
    /// the same; `ShortNsnMatch` when one NSN is shorter than the other, with
    /// matching extensions.
    pub fn is_number_match(&self, first_number: &PhoneNumber, second_number: &PhoneNumber) -> MatchType {
        // We only care about the fields that uniquely define a number, so we
        // copy these across explicitly.
        let mut first_number_core = PhoneNumber::new();
        let mut second_number_core = PhoneNumber::new();
        copy_core_fields_only(first_number, &mut first_number_core);
        copy_core_fields_only(second_number, &mut second_number_core);
        // Early exit if both had extensions and these are different.
        if first_number_core.has_extension()
            && second_number_core.has_extension()
            && first_number_core.extension() != second_number_core.extension()
        {
            return MatchType::NoMatch;
        }

        let first_number_country_code = first_number_core.country_code();
        let second_number_country_code = second_number_core.country_code();
        // Both had country calling code specified.
        if first_number_country_code != 0 && second_number_country_code != 0 {
            if first_number_core == second_number_core {
                return MatchType::ExactMatch;
            } else if first_number_country_code == second_number_country_code
                && is_national_number_suffix_of_the_other(&first_number_core, &second_number_core)
            {
                // A SHORT_NSN_MATCH occurs if there is a difference because of
                // the presence or absence of an 'Italian leading zero', the
                // presence or absence of an extension, or one NSN being a
                // shorter variant of the other.
                return MatchType::ShortNsnMatch;
            }
            // This is not a match.
            return MatchType::NoMatch;
        }
        // Checks cases where one or both country calling codes were not
        // specified. To make equality checks easier, we first set the country
        // code fields to be equal.
        first_number_core.set_country_code(second_number_country_code);
        // If all else was the same, then this is an NSN_MATCH.
        if first_number_core == second_number_core {
            return MatchType::NsnMatch;
        }
        if is_national_number_suffix_of_the_other(&first_number_core, &second_number_core) {
            return MatchType::ShortNsnMatch;
        }
        MatchType::NoMatch
    }

    /// Takes two phone numbers as strings and compares them for equality. This
    /// is a convenience wrapper for `is_number_match` that accepts formatted
    /// numbers in any representation.
    pub fn is_number_match_with_two_strings(
        &self,
        first_number: &str,
        second_number: &str,
    ) -> MatchType {
        match self.parse(first_number, i18n::RegionCode::get_unknown()) {
            Ok(first_number_as_proto) => {
                self.is_number_match_with_one_string(&first_number_as_proto, second_number)
            }
            Err(ParseError::InvalidCountryCode) => {
                match self.parse(second_number, i18n::RegionCode::get_unknown()) {
                    Ok(second_number_as_proto) => {
                        self.is_number_match_with_one_string(&second_number_as_proto, first_number)
                    }
                    Err(ParseError::InvalidCountryCode) => {
                        let first_number_proto = self.parse_helper_without_region(first_number);
                        let second_number_proto = self.parse_helper_without_region(second_number);
                        match (first_number_proto, second_number_proto) {
                            (Ok(first_number_proto), Ok(second_number_proto)) => {
                                self.is_number_match(&first_number_proto, &second_number_proto)
                            }
                            _ => MatchType::InvalidNumber,
                        }
                    }
                    Err(_) => MatchType::InvalidNumber,
                }
            }
            Err(_) => MatchType::InvalidNumber,
        }
    }

    /// Takes two phone numbers and compares them for equality, one of which is
    /// supplied as a string along with the region we are expecting it to be
    /// dialed from.
    pub fn is_number_match_with_one_string(
        &self,
        first_number: &PhoneNumber,
        second_number: &str,
    ) -> MatchType {
        // First see if the second number has an implicit country calling code,
        // by attempting to parse it.
        match self.parse(second_number, i18n::RegionCode::get_unknown()) {
            Ok(second_number_as_proto) => {
                self.is_number_match(first_number, &second_number_as_proto)
            }
            Err(ParseError::InvalidCountryCode) => {
                // The second number has no country calling code. EXACT_MATCH is
                // no longer possible. We parse it as if the region was the same
                // as that for the first number, and if EXACT_MATCH is returned,
                // we replace this with NSN_MATCH.
                let first_number_region =
                    self.get_region_code_for_country_code(first_number.country_code());
                if first_number_region != i18n::RegionCode::get_unknown() {
                    let Ok(second_number_with_first_number_region) =
                        self.parse(second_number, first_number_region)
                    else {
                        return MatchType::InvalidNumber;
                    };
                    let match_type =
                        self.is_number_match(first_number, &second_number_with_first_number_region);
                    if match_type == MatchType::ExactMatch {
                        return MatchType::NsnMatch;
                    }
                    match_type
                } else {
                    // If the first number didn't have a valid country calling
                    // code, then we parse the second number without one as well.
                    let Ok(second_number_proto) = self.parse_helper_without_region(second_number)
                    else {
                        return MatchType::InvalidNumber;
                    };
                    self.is_number_match(first_number, &second_number_proto)
                }
            }
            Err(_) => MatchType::InvalidNumber,
        }
    }
}
