use std::borrow::Cow;

use log::warn;

use crate::{
    macros::owned_from_cow_or,
    metadata::{NumberFormat, PhoneMetadata},
    phonenumber::PhoneNumber,
    phonenumberutil::{
        helper_constants::{
            DEFAULT_EXTN_PREFIX, NANPA_COUNTRY_CODE, PLUS_SIGN, REGION_CODE_FOR_NON_GEO_ENTITY,
            RFC3966_EXTN_PREFIX,
        },
        helper_functions::{prefix_number_with_country_calling_code, test_number_length_with_unknown_type},
        phonenumberutil::{PhoneNumberUtil, Result},
        PhoneNumberFormat, PhoneNumberType, ValidationError,
    },
    regex_util::{RegexConsume, RegexFullMatch},
    string_util::strip_cow_prefix,
};

impl PhoneNumberUtil {
    /// Formats a phone number in the specified format using default rules. Note
    /// that this does not promote the number to a valid, full-length version.
    pub fn format(
        &self,
        phone_number: &PhoneNumber,
        number_format: PhoneNumberFormat,
    ) -> Result<String> {
        if phone_number.national_number() == 0 {
            let raw_input = phone_number.raw_input();
            if !raw_input.is_empty() {
                // Unparseable numbers that kept their raw input just use that.
                // This is the only case where a number can be formatted as E164
                // without a leading '+' symbol (but the original number wasn't
                // parseable anyway).
                return Ok(raw_input.to_owned());
            }
        }
        let country_calling_code = phone_number.country_code();
        let mut formatted_number = self.get_national_significant_number(phone_number);

        if matches!(number_format, PhoneNumberFormat::E164) {
            // Early exit for E164 case (even if the country calling code is invalid)
            // since no formatting of the national number needs to be applied.
            // Extensions are not formatted.
            prefix_number_with_country_calling_code(
                country_calling_code,
                PhoneNumberFormat::E164,
                &mut formatted_number,
            );
            return Ok(formatted_number);
        }
        // Note here that all NANPA formatting rules are contained by US, so we
        // use that to format NANPA numbers. The same applies to Russian Fed
        // regions - rules are contained by Russia.
        let region_code = self.get_region_code_for_country_code(country_calling_code);
        let metadata =
            self.get_metadata_for_region_or_calling_code(country_calling_code, region_code);

        if let Some(metadata) = metadata {
            if let Cow::Owned(s) = self.format_nsn(&formatted_number, metadata, number_format)? {
                formatted_number = s;
            }
            if let Some(formatted_extension) =
                Self::get_formatted_extension(phone_number, metadata, number_format)
            {
                formatted_number.push_str(&formatted_extension);
            }
            prefix_number_with_country_calling_code(
                country_calling_code,
                number_format,
                &mut formatted_number,
            );
        }
        Ok(formatted_number)
    }

    pub(super) fn format_nsn<'b>(
        &self,
        phone_number: &'b str,
        metadata: &PhoneMetadata,
        number_format: PhoneNumberFormat,
    ) -> Result<Cow<'b, str>> {
        self.format_nsn_with_carrier(phone_number, metadata, number_format, "")
    }

    fn format_nsn_with_carrier<'b>(
        &self,
        number: &'b str,
        metadata: &PhoneMetadata,
        number_format: PhoneNumberFormat,
        carrier_code: &str,
    ) -> Result<Cow<'b, str>> {
        // When the intl_number_format exists, we use that to format national
        // number for the INTERNATIONAL format instead of using the
        // number_format list.
        let available_formats = if metadata.intl_number_format.is_empty()
            || number_format == PhoneNumberFormat::National
        {
            &metadata.number_format
        } else {
            &metadata.intl_number_format
        };
        let formatting_pattern =
            self.choose_formatting_pattern_for_number(available_formats, number)?;
        if let Some(formatting_pattern) = formatting_pattern {
            self.format_nsn_using_pattern_with_carrier(
                number,
                formatting_pattern,
                number_format,
                carrier_code,
            )
        } else {
            Ok(Cow::Borrowed(number))
        }
    }

    pub(super) fn choose_formatting_pattern_for_number<'b>(
        &self,
        available_formats: &'b [NumberFormat],
        national_number: &str,
    ) -> Result<Option<&'b NumberFormat>> {
        for format in available_formats {
            if !format
                .leading_digits_pattern
                // We always use the last leading_digits_pattern, as it is the most
                // detailed.
                .last()
                .map(|last| {
                    self.reg_exps
                        .regexp_cache
                        .get_regex(last)
                        .map(|regex| regex.find_start(national_number).is_some())
                })
                // default not continue
                .unwrap_or(Ok(true))?
            {
                continue;
            }
            let pattern_to_match = self.reg_exps.regexp_cache.get_regex(format.pattern())?;
            if pattern_to_match.full_match(national_number) {
                return Ok(Some(format));
            }
        }
        Ok(None)
    }

    // Note that carrier_code is optional - if an empty string, no carrier code
    // replacement will take place.
    fn format_nsn_using_pattern_with_carrier<'b>(
        &self,
        national_number: &'b str,
        formatting_pattern: &NumberFormat,
        number_format: PhoneNumberFormat,
        carrier_code: &str,
    ) -> Result<Cow<'b, str>> {
        let mut number_format_rule = Cow::Borrowed(formatting_pattern.format());
        if matches!(number_format, PhoneNumberFormat::National)
            && !carrier_code.is_empty()
            && !formatting_pattern
                .domestic_carrier_code_formatting_rule()
                .is_empty()
        {
            // Replace the $CC in the formatting rule with the desired carrier code.
            let mut carrier_code_formatting_rule =
                Cow::Borrowed(formatting_pattern.domestic_carrier_code_formatting_rule());

            if let Cow::Owned(s) = self
                .reg_exps
                .carrier_code_pattern
                .replace(&carrier_code_formatting_rule, carrier_code)
            {
                carrier_code_formatting_rule = Cow::Owned(s);
            }
            if let Cow::Owned(s) = self
                .reg_exps
                .first_group_capturing_pattern
                .replace(&number_format_rule, carrier_code_formatting_rule.as_ref())
            {
                number_format_rule = Cow::Owned(s);
            }
        } else {
            // Use the national prefix formatting rule instead.
            let national_prefix_formatting_rule =
                formatting_pattern.national_prefix_formatting_rule();

            if matches!(number_format, PhoneNumberFormat::National)
                && !national_prefix_formatting_rule.is_empty()
            {
                // Apply the national_prefix_formatting_rule as the formatting_pattern
                // contains only information on how the national significant number
                // should be formatted at this point.
                if let Cow::Owned(s) = self
                    .reg_exps
                    .first_group_capturing_pattern
                    .replace(&number_format_rule, national_prefix_formatting_rule)
                {
                    number_format_rule = Cow::Owned(s);
                }
            }
        }

        let pattern_to_match = self
            .reg_exps
            .regexp_cache
            .get_regex(formatting_pattern.pattern())?;

        let mut formatted_number =
            pattern_to_match.replace_all(national_number, number_format_rule.as_ref());

        if matches!(number_format, PhoneNumberFormat::RFC3966) {
            // First consume any leading punctuation, if any was present.
            if let Some(matched) = self.reg_exps.separator_pattern.find_start(&formatted_number) {
                let rest = formatted_number.as_ref()[matched.end()..].to_string();
                formatted_number = Cow::Owned(rest);
            }
            // Then replace all separators with a "-".
            // Rust note: Cow::Borrowed means the number was not changed
            if let Cow::Owned(s) = self
                .reg_exps
                .separator_pattern
                .replace_all(&formatted_number, "-")
            {
                formatted_number = Cow::Owned(s)
            }
        }
        Ok(formatted_number)
    }

    /// Simple wrapper of format_nsn_using_pattern_with_carrier for the common
    /// case of no carrier code.
    fn format_nsn_using_pattern<'b>(
        &self,
        national_number: &'b str,
        formatting_pattern: &NumberFormat,
        number_format: PhoneNumberFormat,
    ) -> Result<Cow<'b, str>> {
        self.format_nsn_using_pattern_with_carrier(
            national_number,
            formatting_pattern,
            number_format,
            "",
        )
    }

    // Returns the formatted extension of a phone number, if the phone number had
    // an extension specified else None.
    fn get_formatted_extension(
        phone_number: &PhoneNumber,
        metadata: &PhoneMetadata,
        number_format: PhoneNumberFormat,
    ) -> Option<String> {
        if !phone_number.has_extension() || phone_number.extension().is_empty() {
            return None;
        }

        let prefix = if matches!(number_format, PhoneNumberFormat::RFC3966) {
            RFC3966_EXTN_PREFIX
        } else if metadata.has_preferred_extn_prefix() {
            metadata.preferred_extn_prefix()
        } else {
            DEFAULT_EXTN_PREFIX
        };
        Some(fast_cat::concat_str!(prefix, phone_number.extension()))
    }

    /// Formats a phone number using a user-defined list of formatting rules.
    /// `$NP` and `$FG` tokens in the national prefix formatting rule are
    /// resolved against the region's national prefix before use.
    pub fn format_by_pattern(
        &self,
        phone_number: &PhoneNumber,
        number_format: PhoneNumberFormat,
        user_defined_formats: &[NumberFormat],
    ) -> Result<String> {
        let country_calling_code = phone_number.country_code();
        // Note get_region_code_for_country_code() is used because formatting
        // information for regions which share a country calling code is contained
        // by only one region for performance reasons. For example, for NANPA
        // regions it will be contained in the metadata for US.
        let national_significant_number = self.get_national_significant_number(phone_number);
        let region_code = self.get_region_code_for_country_code(country_calling_code);
        let Some(metadata) =
            self.get_metadata_for_region_or_calling_code(country_calling_code, region_code)
        else {
            return Ok(national_significant_number);
        };

        let formatting_pattern = self.choose_formatting_pattern_for_number(
            user_defined_formats,
            &national_significant_number,
        )?;

        let mut formatted_number = if let Some(formatting_pattern) = formatting_pattern {
            // Before we do a replacement of the national prefix pattern $NP with the
            // national prefix, we need to copy the rule so that subsequent
            // replacements for different numbers have the appropriate national
            // prefix.
            let mut num_format_copy = formatting_pattern.clone();

            let national_prefix_formatting_rule =
                formatting_pattern.national_prefix_formatting_rule();
            if !national_prefix_formatting_rule.is_empty() {
                let national_prefix = metadata.national_prefix();
                if !national_prefix.is_empty() {
                    // Replace $NP with national prefix and $FG with the first
                    // group ($1).
                    let rule = national_prefix_formatting_rule
                        .replace("$NP", national_prefix)
                        .replace("$FG", "$1");
                    num_format_copy.set_national_prefix_formatting_rule(rule);
                } else {
                    // We don't want to have a rule for how to format the national
                    // prefix if there isn't one.
                    num_format_copy.clear_national_prefix_formatting_rule();
                }
            }
            self.format_nsn_using_pattern(
                &national_significant_number,
                &num_format_copy,
                number_format,
            )?
            .to_string()
        } else {
            national_significant_number
        };
        if let Some(extension) =
            Self::get_formatted_extension(phone_number, metadata, PhoneNumberFormat::National)
        {
            formatted_number.push_str(&extension);
        }
        prefix_number_with_country_calling_code(
            country_calling_code,
            number_format,
            &mut formatted_number,
        );
        Ok(formatted_number)
    }

    /// Formats a phone number in national format for dialing using the carrier
    /// as specified in the carrier_code. The carrier_code will always be used
    /// regardless of whether the phone number already has a preferred domestic
    /// carrier code stored.
    pub fn format_national_number_with_carrier_code(
        &self,
        phone_number: &PhoneNumber,
        carrier_code: &str,
    ) -> Result<String> {
        let country_calling_code = phone_number.country_code();
        let national_significant_number = self.get_national_significant_number(phone_number);
        let region_code = self.get_region_code_for_country_code(country_calling_code);

        // Note get_region_code_for_country_code() is used because formatting
        // information for regions which share a country calling code is contained
        // by only one region for performance reasons. For example, for NANPA
        // regions it will be contained in the metadata for US.
        let Some(metadata) =
            self.get_metadata_for_region_or_calling_code(country_calling_code, region_code)
        else {
            return Ok(national_significant_number);
        };

        let mut formatted_number = owned_from_cow_or!(
            self.format_nsn_with_carrier(
                &national_significant_number,
                metadata,
                PhoneNumberFormat::National,
                carrier_code,
            )?,
            national_significant_number
        );
        if let Some(formatted_extension) =
            Self::get_formatted_extension(phone_number, metadata, PhoneNumberFormat::National)
        {
            formatted_number.push_str(&formatted_extension);
        }

        prefix_number_with_country_calling_code(
            country_calling_code,
            PhoneNumberFormat::National,
            &mut formatted_number,
        );

        Ok(formatted_number)
    }

    /// Formats a phone number in national format for dialing using the carrier
    /// stored in the number itself, falling back to the given default. A
    /// preferred carrier code that is present, even as whitespace, always wins
    /// over the fallback.
    pub fn format_national_number_with_preferred_carrier_code(
        &self,
        phone_number: &PhoneNumber,
        fallback_carrier_code: &str,
    ) -> Result<String> {
        let carrier_code = if !phone_number.preferred_domestic_carrier_code().is_empty() {
            phone_number.preferred_domestic_carrier_code()
        } else {
            fallback_carrier_code
        };
        self.format_national_number_with_carrier_code(phone_number, carrier_code)
    }

    /// Returns a number formatted in such a way that it can be dialed from a
    /// mobile phone in a specific region. If the number cannot be reached from
    /// the region (e.g. some countries block toll-free numbers from being
    /// called outside of the country), returns an empty string.
    pub fn format_number_for_mobile_dialing(
        &self,
        phone_number: &PhoneNumber,
        calling_from: &str,
        with_formatting: bool,
    ) -> Result<String> {
        let country_calling_code = phone_number.country_code();
        if !self.has_valid_country_calling_code(country_calling_code) {
            return Ok(phone_number.raw_input().to_owned());
        }

        let mut formatted_number = String::new();
        // Clear the extension, as that part cannot normally be dialed together
        // with the main number.
        let mut number_no_extension = phone_number.clone();
        number_no_extension.clear_extension();
        let region_code = self.get_region_code_for_country_code(country_calling_code);
        let number_type = self.get_number_type(&number_no_extension)?;
        let is_valid_number = !matches!(number_type, PhoneNumberType::Unknown);
        if calling_from == region_code {
            let is_fixed_line_or_mobile = matches!(
                number_type,
                PhoneNumberType::FixedLine
                    | PhoneNumberType::FixedLineOrMobile
                    | PhoneNumberType::Mobile
            );
            // Carrier codes may be needed in some countries. We handle this here.
            if (region_code == "BR") && is_fixed_line_or_mobile {
                // Historically, we set this to an empty string when parsing with
                // raw input if none was found in the input string. However, this
                // doesn't result in a number we can dial. For this reason, we
                // treat the empty string the same as if it isn't set at all.
                if !number_no_extension
                    .preferred_domestic_carrier_code()
                    .is_empty()
                {
                    formatted_number = self
                        .format_national_number_with_preferred_carrier_code(
                            &number_no_extension,
                            "",
                        )?;
                } else {
                    // Brazilian fixed line and mobile numbers need to be dialed
                    // with a carrier code when called within Brazil. Without
                    // that, most of the carriers won't connect the call. Because
                    // of that, we return an empty string here.
                    formatted_number.clear();
                }
            } else if country_calling_code == NANPA_COUNTRY_CODE {
                // For NANPA countries, we output international format for numbers
                // that can be dialed internationally, since that always works,
                // except for numbers which might potentially be short numbers,
                // which are always dialled in national format.
                let national_number =
                    self.get_national_significant_number(&number_no_extension);
                let might_be_short_number = self
                    .region_to_metadata_map
                    .get(calling_from)
                    .map(|region_metadata| {
                        matches!(
                            test_number_length_with_unknown_type(
                                &national_number,
                                region_metadata
                            ),
                            Err(ValidationError::TooShort)
                        )
                    })
                    .unwrap_or(false);
                let format = if self.can_be_internationally_dialled(&number_no_extension)?
                    && !might_be_short_number
                {
                    PhoneNumberFormat::International
                } else {
                    PhoneNumberFormat::National
                };
                formatted_number = self.format(&number_no_extension, format)?;
            } else {
                // For non-geographical countries, and Mexican, Chilean and Uzbek
                // fixed line and mobile numbers, we output international format
                // for numbers that can be dialed internationally as that always
                // works.
                let format = if (region_code == REGION_CODE_FOR_NON_GEO_ENTITY ||
                        // MX fixed line and mobile numbers should always be
                        // formatted in international format, even when dialed
                        // within MX. For national format to work, a carrier code
                        // needs to be used, and the correct carrier code depends
                        // on if the caller and callee are from the same local
                        // area. It is trickier to get that to work correctly than
                        // using international format, which is tested to work
                        // fine on all carriers.
                        // CL fixed line numbers need the national prefix when
                        // dialing in the national format, but don't have it when
                        // used for display. The reverse is true for mobile
                        // numbers. As a result, we output them in the
                        // international format to make it work.
                        // UZ mobile and fixed-line numbers have to be formatted
                        // in international format or prefixed with special codes
                        // like 03, 04 (for fixed-line) and 05 (for mobile) for
                        // dialling successfully from mobile devices. As we do not
                        // have complete information on special codes and to be
                        // consistent with formatting across all phone types we
                        // return the number in international format here.
                        ((region_code == "MX" || region_code == "CL" || region_code == "UZ")
                            && is_fixed_line_or_mobile))
                    && self.can_be_internationally_dialled(&number_no_extension)?
                {
                    PhoneNumberFormat::International
                } else {
                    PhoneNumberFormat::National
                };
                formatted_number = self.format(&number_no_extension, format)?;
            }
        } else if is_valid_number && self.can_be_internationally_dialled(&number_no_extension)? {
            // We assume that short numbers are not diallable from outside their
            // region, so if a number is not a valid regular length phone number,
            // we treat it as if it cannot be internationally dialled.
            let format = if with_formatting {
                PhoneNumberFormat::International
            } else {
                PhoneNumberFormat::E164
            };
            return self.format(&number_no_extension, format);
        }
        if !with_formatting {
            Ok(self.normalize_diallable_chars_only(&formatted_number))
        } else {
            Ok(formatted_number)
        }
    }

    /// Formats a phone number for out-of-country dialing purposes: prefixed by
    /// the IDD of the region the call is placed from, unless the regions share
    /// a country calling code, in which case national format is used.
    pub fn format_out_of_country_calling_number(
        &self,
        phone_number: &PhoneNumber,
        calling_from: &str,
    ) -> Result<String> {
        if !self.is_valid_region_code(calling_from) {
            warn!(
                "Trying to format number from invalid region {}. International formatting applied.",
                calling_from
            );
            return self.format(phone_number, PhoneNumberFormat::International);
        }
        let country_code = phone_number.country_code();
        let national_significant_number = self.get_national_significant_number(phone_number);
        if !self.has_valid_country_calling_code(country_code) {
            return Ok(national_significant_number);
        }
        if country_code == NANPA_COUNTRY_CODE {
            if self.is_nanpa_country(calling_from) {
                // For NANPA regions, return the national format for these regions
                // but prefix it with the country calling code.
                let mut buf = itoa::Buffer::new();
                return Ok(fast_cat::concat_str!(
                    buf.format(country_code),
                    " ",
                    &self.format(phone_number, PhoneNumberFormat::National)?
                ));
            }
        } else if country_code == self.get_country_code_for_region(calling_from) {
            // If neither region is a NANPA region, then we check to see if the
            // country calling code of the number and the country calling code of
            // the region we are calling from are the same. For regions that
            // share a country calling code, the country calling code need not be
            // dialled. This also applies when dialling within a region, so this
            // if clause covers both these cases. Technically this is the case
            // for dialling from la Réunion to other overseas departments of
            // France (French Guiana, Martinique, Guadeloupe), but not vice
            // versa - so we don't cover this edge case for now and for those
            // cases return the version including country calling code.
            return self.format(phone_number, PhoneNumberFormat::National);
        }
        // Metadata cannot be null because we checked is_valid_region_code() above.
        let metadata_calling_from = &self.region_to_metadata_map[calling_from];
        let international_prefix = metadata_calling_from.international_prefix();

        // In general, if there is a preferred international prefix, use that.
        // Otherwise, for regions that have multiple international prefixes, the
        // international format of the number is returned since we would not know
        // which one to use.
        let international_prefix_for_formatting = if metadata_calling_from
            .has_preferred_international_prefix()
        {
            metadata_calling_from.preferred_international_prefix()
        } else if self
            .reg_exps
            .single_international_prefix
            .full_match(international_prefix)
        {
            international_prefix
        } else {
            ""
        };

        let region_code = self.get_region_code_for_country_code(country_code);
        // Metadata cannot be null because the country_code is valid.
        let Some(metadata_for_region) =
            self.get_metadata_for_region_or_calling_code(country_code, region_code)
        else {
            return Ok(national_significant_number);
        };
        let mut formatted_number = owned_from_cow_or!(
            self.format_nsn(
                &national_significant_number,
                metadata_for_region,
                PhoneNumberFormat::International,
            )?,
            national_significant_number
        );
        if let Some(formatted_extension) = Self::get_formatted_extension(
            phone_number,
            metadata_for_region,
            PhoneNumberFormat::International,
        ) {
            formatted_number.push_str(&formatted_extension);
        }
        if !international_prefix_for_formatting.is_empty() {
            let mut buf = itoa::Buffer::new();
            formatted_number = fast_cat::concat_str!(
                international_prefix_for_formatting,
                " ",
                buf.format(country_code),
                " ",
                &formatted_number
            );
        } else {
            prefix_number_with_country_calling_code(
                country_code,
                PhoneNumberFormat::International,
                &mut formatted_number,
            );
        }
        Ok(formatted_number)
    }

    /// Formats a phone number for out-of-country dialing purposes, keeping the
    /// alpha characters and grouping the user entered, when the raw input of
    /// the number is available.
    pub fn format_out_of_country_keeping_alpha_chars(
        &self,
        phone_number: &PhoneNumber,
        calling_from: &str,
    ) -> Result<String> {
        // If there is no raw input, then we can't keep alpha characters because
        // there aren't any. In this case, we return
        // format_out_of_country_calling_number.
        if phone_number.raw_input().is_empty() {
            return self.format_out_of_country_calling_number(phone_number, calling_from);
        }
        let country_code = phone_number.country_code();
        if !self.has_valid_country_calling_code(country_code) {
            return Ok(phone_number.raw_input().to_owned());
        }
        // Strip any extension the user wrote; the formatted extension is
        // appended from the structured number below.
        let (raw_input_stripped, _) = self.maybe_strip_extension(phone_number.raw_input());
        // Normalize punctuation. We retain number grouping symbols such as " "
        // only.
        let mut raw_input_copy = crate::phonenumberutil::helper_functions::normalize_helper(
            &self.reg_exps.all_plus_number_grouping_symbols,
            true,
            &raw_input_stripped,
        );
        // Now we trim everything before the first three digits in the parsed
        // number. We choose three because all valid alpha numbers have 3 digits
        // at the start - if it does not, then we don't trim anything at all.
        let national_number = self.get_national_significant_number(phone_number);
        if national_number.len() > 3 {
            if let Some(first_national_number_digit) =
                raw_input_copy.find(&national_number[..3])
            {
                raw_input_copy = raw_input_copy[first_national_number_digit..].to_string();
            }
        }

        let region_code = self.get_region_code_for_country_code(country_code);
        if let Some(metadata_for_region) =
            self.get_metadata_for_region_or_calling_code(country_code, region_code)
        {
            if let Some(formatted_extension) = Self::get_formatted_extension(
                phone_number,
                metadata_for_region,
                PhoneNumberFormat::National,
            ) {
                raw_input_copy.push_str(&formatted_extension);
            }
        }

        let metadata_calling_from = self.region_to_metadata_map.get(calling_from);
        if country_code == NANPA_COUNTRY_CODE {
            if self.is_nanpa_country(calling_from) {
                let mut buf = itoa::Buffer::new();
                return Ok(fast_cat::concat_str!(
                    buf.format(country_code),
                    " ",
                    &raw_input_copy
                ));
            }
        } else if let Some(metadata) = metadata_calling_from {
            if country_code == self.get_country_code_for_region(calling_from) {
                let Some(formatting_pattern) = self.choose_formatting_pattern_for_number(
                    &metadata.number_format,
                    &national_number,
                )?
                else {
                    // If no pattern above is matched, we format the original input.
                    return Ok(raw_input_copy);
                };
                let mut new_format = formatting_pattern.clone();
                // The first group is the first group of digits that the user
                // wrote together.
                new_format.set_pattern("(\\d+)(.*)".to_string());
                // Here we just concatenate them back together after the national
                // prefix has been fixed.
                new_format.set_format("$1$2".to_string());
                // Now we format using this pattern instead of the default pattern,
                // but with the national prefix prefixed if necessary. This will not
                // work in the cases where the pattern (and not the leading digits)
                // decide whether a national prefix needs to be used, since we have
                // overridden the pattern to match anything, but that is not the
                // case in the metadata to date.
                return Ok(self
                    .format_nsn_using_pattern(
                        &raw_input_copy,
                        &new_format,
                        PhoneNumberFormat::National,
                    )?
                    .into_owned());
            }
        }

        let mut international_prefix_for_formatting = "";
        if let Some(metadata) = metadata_calling_from {
            let international_prefix = metadata.international_prefix();
            international_prefix_for_formatting = if self
                .reg_exps
                .single_international_prefix
                .full_match(international_prefix)
            {
                international_prefix
            } else {
                metadata.preferred_international_prefix()
            };
        }

        if !international_prefix_for_formatting.is_empty() {
            let mut buf = itoa::Buffer::new();
            Ok(fast_cat::concat_str!(
                international_prefix_for_formatting,
                " ",
                buf.format(country_code),
                " ",
                &raw_input_copy
            ))
        } else {
            // Invalid region entered as country-calling-from (so no metadata was
            // found for it) or the region chosen has multiple international
            // dialling prefixes.
            warn!(
                "Trying to format number from invalid region {}. International formatting applied.",
                calling_from
            );
            let mut formatted_number = raw_input_copy;
            prefix_number_with_country_calling_code(
                country_code,
                PhoneNumberFormat::International,
                &mut formatted_number,
            );
            Ok(formatted_number)
        }
    }

    /// Formats a phone number using the original phone number format that the
    /// number was parsed from. The original format is embedded in the
    /// country_code_source field. If such information is missing, the number
    /// is formatted in national format.
    pub fn format_in_original_format(
        &self,
        phone_number: &PhoneNumber,
        region_calling_from: &str,
    ) -> Result<String> {
        if phone_number.has_raw_input() && !self.has_formatting_pattern_for_number(phone_number)? {
            // We check if we have the formatting pattern because without that, we
            // might format the number as a group without national prefix.
            return Ok(phone_number.raw_input().to_owned());
        }
        if !phone_number.has_country_code_source() {
            return self.format(phone_number, PhoneNumberFormat::National);
        }
        let mut formatted_number = match phone_number.country_code_source() {
            crate::phonenumber::CountryCodeSource::FROM_NUMBER_WITH_PLUS_SIGN => {
                self.format(phone_number, PhoneNumberFormat::International)?
            }
            crate::phonenumber::CountryCodeSource::FROM_NUMBER_WITH_IDD => {
                self.format_out_of_country_calling_number(phone_number, region_calling_from)?
            }
            crate::phonenumber::CountryCodeSource::FROM_NUMBER_WITHOUT_PLUS_SIGN => {
                let international_format =
                    self.format(phone_number, PhoneNumberFormat::International)?;
                strip_cow_prefix(Cow::Owned(international_format), PLUS_SIGN)
                    .map(|number| number.into_owned())
                    .unwrap_or_default()
            }
            _ => {
                let region_code =
                    self.get_region_code_for_country_code(phone_number.country_code());
                // We strip non-digits from the NDD here, and from the raw input
                // later, so that we can compare them easily.
                let national_prefix = self.get_ndd_prefix_for_region(region_code, true);
                let national_format = self.format(phone_number, PhoneNumberFormat::National)?;
                self.format_as_dialed_from_default_country(
                    phone_number,
                    region_code,
                    national_prefix.as_deref().unwrap_or(""),
                    national_format,
                )?
            }
        };
        // If no digit is inserted/removed/modified as a result of our
        // formatting, we return the formatted phone number; otherwise we return
        // the raw input the user entered.
        let raw_input = phone_number.raw_input();
        if !formatted_number.is_empty() && !raw_input.is_empty() {
            let normalized_formatted_number =
                self.normalize_diallable_chars_only(&formatted_number);
            let normalized_raw_input = self.normalize_diallable_chars_only(raw_input);
            if normalized_formatted_number != normalized_raw_input {
                formatted_number = raw_input.to_owned();
            }
        }
        Ok(formatted_number)
    }

    fn format_as_dialed_from_default_country(
        &self,
        phone_number: &PhoneNumber,
        region_code: &str,
        national_prefix: &str,
        national_format: String,
    ) -> Result<String> {
        if national_prefix.is_empty() {
            // If the region doesn't have a national prefix at all, we can safely
            // return the national format without worrying about a national prefix
            // being added.
            return Ok(national_format);
        }
        // Otherwise, we check if the original number was entered with a national
        // prefix.
        if self.raw_input_contains_national_prefix(
            phone_number.raw_input(),
            national_prefix,
            region_code,
        )? {
            // If so, we can safely return the national format.
            return Ok(national_format);
        }
        // Metadata cannot be null here because get_ndd_prefix_for_region() (above)
        // leaves the prefix empty if there is no metadata for the region.
        let Some(metadata) = self.get_metadata_for_region(region_code) else {
            return Ok(national_format);
        };
        let national_number = self.get_national_significant_number(phone_number);
        let Some(format_rule) =
            self.choose_formatting_pattern_for_number(&metadata.number_format, &national_number)?
        else {
            return Ok(national_format);
        };
        // When the format we apply to this number doesn't contain national
        // prefix, we can just return the national format.
        let candidate_national_prefix_rule = format_rule.national_prefix_formatting_rule();
        // We assume that the first-group symbol will never be _before_ the
        // national prefix.
        let Some(index_of_first_group) = candidate_national_prefix_rule.find("$1") else {
            return Ok(national_format);
        };
        if index_of_first_group == 0 {
            return Ok(national_format);
        }
        let candidate_national_prefix_rule =
            self.normalize_digits_only(&candidate_national_prefix_rule[..index_of_first_group]);
        if candidate_national_prefix_rule.is_empty() {
            // National prefix not used when formatting this number.
            return Ok(national_format);
        }
        // Otherwise, we need to remove the national prefix from our output.
        let mut num_format_copy = format_rule.clone();
        num_format_copy.clear_national_prefix_formatting_rule();
        self.format_by_pattern(
            phone_number,
            PhoneNumberFormat::National,
            &[num_format_copy],
        )
    }

    /// Checks if the original input, when normalized to digits, begins with the
    /// national prefix and still forms a valid number without it.
    fn raw_input_contains_national_prefix(
        &self,
        raw_input: &str,
        national_prefix: &str,
        region_code: &str,
    ) -> Result<bool> {
        let normalized_national_number = self.normalize_digits_only(raw_input);
        if normalized_national_number.starts_with(national_prefix) {
            // Some Japanese numbers (e.g. 00777123) might be mis-parsed in
            // jurisdictions which allow trailing zeros: check the validity of
            // the number where the national prefix is removed.
            if let Ok(number_without_national_prefix) = self.parse(
                &normalized_national_number[national_prefix.len()..],
                region_code,
            ) {
                return self.is_valid_number(&number_without_national_prefix);
            }
        }
        Ok(false)
    }

    fn has_formatting_pattern_for_number(&self, phone_number: &PhoneNumber) -> Result<bool> {
        let country_calling_code = phone_number.country_code();
        let region_code = self.get_region_code_for_country_code(country_calling_code);
        let Some(metadata) =
            self.get_metadata_for_region_or_calling_code(country_calling_code, region_code)
        else {
            return Ok(false);
        };
        let national_number = self.get_national_significant_number(phone_number);
        Ok(self
            .choose_formatting_pattern_for_number(&metadata.number_format, &national_number)?
            .is_some())
    }
}
