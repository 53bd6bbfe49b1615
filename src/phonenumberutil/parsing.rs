use std::borrow::Cow;

use crate::{
    metadata::PhoneMetadata,
    phonenumber::{CountryCodeSource, PhoneNumber},
    phonenumberutil::{
        errors::{ExtractNumberError, NotANumberError, ParseError, ParseErrorInternal},
        helper_constants::{
            MAX_INPUT_STRING_LENGTH, MAX_LENGTH_COUNTRY_CODE, MAX_LENGTH_FOR_NSN,
            MIN_LENGTH_FOR_NSN, PLUS_SIGN, RFC3966_ISDN_SUBADDRESS, RFC3966_PHONE_CONTEXT,
            RFC3966_PREFIX,
        },
        helper_types::PhoneNumberWithCountryCodeSource,
        phonenumberutil::PhoneNumberUtil,
        NumberLengthType, ValidationError,
    },
    regex_util::{RegexConsume, RegexFullMatch},
    regexp_cache::InvalidRegexError,
};

use crate::i18n;

impl PhoneNumberUtil {
    /// Parses a string and returns it as a phone number in proto buffer
    /// format. The method is quite lenient and looks for a number in the input
    /// text (raw input) and does not check whether the string is definitely
    /// only a phone number.
    pub fn parse(
        &self,
        number_to_parse: &str,
        default_region: &str,
    ) -> std::result::Result<PhoneNumber, ParseError> {
        self.parse_helper(number_to_parse, default_region, false, true)
            .map_err(|err| err.into_public())
    }

    /// Parses a string and returns it in proto buffer format. This method
    /// differs from `parse` in that it always populates the raw_input field of
    /// the protocol buffer with number_to_parse as well as the
    /// country_code_source field.
    pub fn parse_and_keep_raw_input(
        &self,
        number_to_parse: &str,
        default_region: &str,
    ) -> std::result::Result<PhoneNumber, ParseError> {
        self.parse_helper(number_to_parse, default_region, true, true)
            .map_err(|err| err.into_public())
    }

    pub(super) fn parse_helper(
        &self,
        number_to_parse: &str,
        default_region: &str,
        keep_raw_input: bool,
        check_region: bool,
    ) -> std::result::Result<PhoneNumber, ParseErrorInternal> {
        if number_to_parse.len() > MAX_INPUT_STRING_LENGTH {
            return Err(ParseError::TooLongNsn.into());
        }
        let mut national_number = self.build_national_number_for_parsing(number_to_parse)?;

        if !self.is_viable_phone_number(&national_number) {
            return Err(NotANumberError::NotMatchedValidNumberPattern.into());
        }

        // Check the region supplied is valid, or that the extracted number starts
        // with some sort of + sign so the number's region can be determined.
        if check_region && !self.check_region_for_parsing(&national_number, default_region) {
            return Err(ParseError::InvalidCountryCode.into());
        }

        let mut phone_number = PhoneNumber::new();
        if keep_raw_input {
            phone_number.set_raw_input(number_to_parse.to_owned());
        }
        // Attempt to parse extension first, since it doesn't require
        // region-specific data and we want to have the non-normalised number
        // here.
        let (number_without_extension, extension) = self.maybe_strip_extension(&national_number);
        if let Some(extension) = extension {
            phone_number.set_extension(extension);
        }
        national_number = number_without_extension;

        let mut region_metadata = self.get_metadata_for_region(default_region);
        // Check to see if the number is given in international format so we know
        // whether this number is from the default region or not.
        let mut normalized_national_number = String::new();
        let mut country_code = match self.maybe_extract_country_code(
            region_metadata,
            keep_raw_input,
            &national_number,
            &mut normalized_national_number,
            &mut phone_number,
        ) {
            Ok(country_code) => country_code,
            Err(ParseErrorInternal::FailedToParse(ParseError::InvalidCountryCode)) => {
                // Strip the plus-char, and try again.
                let Some(matched) = self
                    .reg_exps
                    .plus_chars_pattern
                    .find_start(&national_number)
                else {
                    return Err(ParseError::InvalidCountryCode.into());
                };
                let country_code = self.maybe_extract_country_code(
                    region_metadata,
                    keep_raw_input,
                    &national_number[matched.end()..],
                    &mut normalized_national_number,
                    &mut phone_number,
                )?;
                if country_code == 0 {
                    return Err(ParseError::InvalidCountryCode.into());
                }
                country_code
            }
            Err(err) => return Err(err),
        };

        if country_code != 0 {
            let phone_number_region = self.get_region_code_for_country_code(country_code);
            if phone_number_region != default_region {
                region_metadata =
                    self.get_metadata_for_region_or_calling_code(country_code, phone_number_region);
            }
        } else {
            // If no extracted country calling code, use the region supplied
            // instead. The national number is just the normalized version of the
            // number we were given to parse.
            normalized_national_number = self.normalize(&national_number);
            if let Some(metadata) = region_metadata {
                country_code = metadata.country_code();
                phone_number.set_country_code(country_code);
            } else if keep_raw_input {
                phone_number.clear_country_code_source();
            }
        }

        if normalized_national_number.len() < MIN_LENGTH_FOR_NSN {
            return Err(ParseError::TooShortNsn.into());
        }

        if let Some(metadata) = region_metadata {
            let (potential_national_number, carrier_code) =
                self.maybe_strip_national_prefix_and_carrier_code(
                    metadata,
                    &normalized_national_number,
                )?;
            // We require that the NSN remaining after stripping the national
            // prefix and carrier code be long enough to be a possible length for
            // the region. Otherwise, we don't do the stripping, since the
            // original number could be a valid short number.
            let validation_result =
                self.test_number_length_for_region(&potential_national_number, metadata);
            if !matches!(
                validation_result,
                Err(ValidationError::TooShort)
                    | Err(ValidationError::InvalidLength)
                    | Ok(NumberLengthType::IsPossibleLocalOnly)
            ) {
                if keep_raw_input {
                    if let Some(carrier_code) = carrier_code {
                        if !carrier_code.is_empty() {
                            phone_number
                                .set_preferred_domestic_carrier_code(carrier_code.to_owned());
                        }
                    }
                }
                normalized_national_number = potential_national_number.into_owned();
            }
        }

        let length_of_national_number = normalized_national_number.len();
        if length_of_national_number < MIN_LENGTH_FOR_NSN {
            return Err(ParseError::TooShortNsn.into());
        }
        if length_of_national_number > MAX_LENGTH_FOR_NSN {
            return Err(ParseError::TooLongNsn.into());
        }
        Self::set_italian_leading_zeros_for_phone_number(
            &normalized_national_number,
            &mut phone_number,
        );
        phone_number.set_country_code(country_code);
        let parsed_national_number = normalized_national_number
            .parse::<u64>()
            .map_err(NotANumberError::FailedToParseNumberAsInt)?;
        phone_number.set_national_number(parsed_national_number);
        Ok(phone_number)
    }

    /// Converts number_to_parse to a form that we can parse and write it to
    /// national_number if it is written in RFC3966; otherwise extract a
    /// possible number out of it and write to national_number.
    fn build_national_number_for_parsing(
        &self,
        number_to_parse: &str,
    ) -> std::result::Result<String, ParseErrorInternal> {
        let mut national_number = String::with_capacity(number_to_parse.len());
        if let Some(index_of_phone_context) = number_to_parse.find(RFC3966_PHONE_CONTEXT) {
            let phone_context =
                Self::extract_phone_context(number_to_parse, index_of_phone_context);
            if !self.is_phone_context_valid(phone_context) {
                return Err(NotANumberError::InvalidPhoneContext.into());
            }
            // If the phone context contains a phone number prefix, we need to
            // capture it, whereas domains will be ignored.
            if let Some(phone_context) = phone_context {
                if phone_context.starts_with(PLUS_SIGN) {
                    national_number.push_str(phone_context);
                }
            }
            // Now append everything between the "tel:" prefix and the
            // phone-context. This should include the national number, an
            // optional extension or isdn-subaddress component. Note we also
            // handle the case when "tel:" is missing, as we have seen in some
            // of the phone number inputs. In that case, we append everything
            // from the beginning.
            let index_of_national_number = number_to_parse
                .find(RFC3966_PREFIX)
                .map(|index| index + RFC3966_PREFIX.len())
                .unwrap_or(0);
            national_number
                .push_str(&number_to_parse[index_of_national_number..index_of_phone_context]);
        } else {
            // Extract a possible number from the string passed in (this strips
            // leading characters that could not be the start of a phone number.)
            national_number.push_str(
                &self
                    .extract_possible_number(number_to_parse)
                    .map_err(|err| ParseErrorInternal::FailedToParse(err.into()))?,
            );
        }

        // Delete the isdn-subaddress and everything after it if it is present.
        // Note extension won't appear at the same time with isdn-subaddress
        // according to paragraph 5.3 of the RFC3966 spec.
        if let Some(index_of_isdn) = national_number.find(RFC3966_ISDN_SUBADDRESS) {
            national_number.truncate(index_of_isdn);
        }
        // If both phone context and isdn-subaddress are absent but other
        // parameters are present, the parameters are left in national_number.
        // This is because we are concerned about deleting content from a
        // potential number string when there is no strong evidence that the
        // number is actually written in RFC3966.
        Ok(national_number)
    }

    /// Returns the phone-context value of the number, if present: the substring
    /// between ";phone-context=" and the following ";", or `None` when no
    /// phone-context parameter exists at all.
    fn extract_phone_context(number_to_parse: &str, index_of_phone_context: usize) -> Option<&str> {
        let phone_context_start = index_of_phone_context + RFC3966_PHONE_CONTEXT.len();
        // If phone-context parameter is empty.
        if phone_context_start >= number_to_parse.len() {
            return Some("");
        }
        match number_to_parse[phone_context_start..].find(';') {
            Some(phone_context_end) => {
                Some(&number_to_parse[phone_context_start..phone_context_start + phone_context_end])
            }
            None => Some(&number_to_parse[phone_context_start..]),
        }
    }

    /// A phone-context, when present, must be either a global number or a
    /// domain name, following the syntax defined in RFC3966.
    fn is_phone_context_valid(&self, phone_context: Option<&str>) -> bool {
        let Some(phone_context) = phone_context else {
            return true;
        };
        if phone_context.is_empty() {
            return false;
        }
        self.reg_exps
            .rfc3966_global_number_digits_pattern
            .is_match(phone_context)
            || self
                .reg_exps
                .rfc3966_domainname_pattern
                .is_match(phone_context)
    }

    /// Attempts to extract a possible number from the string passed in. This
    /// trims preceding characters that could not be the start of a phone
    /// number, trailing non-alphanumeric characters, and anything that looks
    /// like the start of a second number.
    pub fn extract_possible_number(
        &self,
        number: &str,
    ) -> std::result::Result<String, ExtractNumberError> {
        let Some(start_match) = self.reg_exps.valid_start_char_pattern.find(number) else {
            return Err(ExtractNumberError::NoValidStartCharacter);
        };
        let mut extracted_number = number[start_match.start()..].to_string();
        self.trim_unwanted_end_chars(&mut extracted_number);
        if extracted_number.is_empty() {
            return Err(ExtractNumberError::NotANumber);
        }

        // Check for extra numbers at the end: a "/" or "\" followed by a second
        // extension-looking token means the number actually contains two phone
        // numbers, and we only keep the first.
        let end_of_first_number = self
            .reg_exps
            .capture_up_to_second_number_start_pattern
            .captures(&extracted_number)
            .and_then(|captures| captures.get(1))
            .map(|first_number| first_number.end());
        if let Some(end_of_first_number) = end_of_first_number {
            extracted_number.truncate(end_of_first_number);
        }
        Ok(extracted_number)
    }

    fn trim_unwanted_end_chars(&self, phone_number: &mut String) {
        let mut bytes_to_trim = 0;

        for char in phone_number.chars().rev() {
            if !self
                .reg_exps
                .unwanted_end_char_pattern
                .full_match(&char.to_string())
            {
                break;
            }
            bytes_to_trim += char.len_utf8();
        }

        if bytes_to_trim > 0 {
            let new_len = phone_number.len() - bytes_to_trim;
            phone_number.truncate(new_len);
        }
    }

    /// Checks to see if the string of characters could possibly be a phone
    /// number at all. At the moment, checks to see that the string begins with
    /// at least 2 digits, ignoring any punctuation commonly found in phone
    /// numbers.
    pub fn is_viable_phone_number(&self, number: &str) -> bool {
        if number.chars().count() < MIN_LENGTH_FOR_NSN {
            return false;
        }
        self.reg_exps.valid_phone_number_pattern.full_match(number)
    }

    fn check_region_for_parsing(&self, number_to_parse: &str, default_region: &str) -> bool {
        if !self.is_valid_region_code(default_region) {
            // If the number is null or empty, we can't infer the region.
            if number_to_parse.is_empty()
                || self
                    .reg_exps
                    .plus_chars_pattern
                    .find_start(number_to_parse)
                    .is_none()
            {
                return false;
            }
        }
        true
    }

    /// Strips any extension (as in, the part of the number dialled after the
    /// call is connected, usually indicated with extn, ext, x or similar) from
    /// the end of the number, and returns the number without it together with
    /// the extension, if one was found.
    pub fn maybe_strip_extension(&self, number: &str) -> (String, Option<String>) {
        let Some(captures) = self.reg_exps.extn_pattern.captures(number) else {
            return (number.to_owned(), None);
        };
        let whole_match = captures
            .get(0)
            .expect("regex matches always have a whole-match group");
        // If we find a potential extension, and the number preceding this is a
        // viable number, we assume it is an extension.
        if !self.is_viable_phone_number(&number[..whole_match.start()]) {
            return (number.to_owned(), None);
        }
        // The numbers are captured into groups in the regular expression.
        for group_index in 1..captures.len() {
            if let Some(extension) = captures.get(group_index) {
                // We go through the capturing groups until we find one that
                // captured some digits. If none did, then we will return the
                // empty string.
                return (
                    number[..whole_match.start()].to_owned(),
                    Some(extension.as_str().to_owned()),
                );
            }
        }
        (number.to_owned(), None)
    }

    /// Strips any international prefix (such as +, 00, 011) present in the
    /// number provided, normalizes the resulting number, and reports the way
    /// the original number was written.
    pub(super) fn maybe_strip_international_prefix_and_normalize(
        &self,
        number: &str,
        possible_idd_prefix: &str,
    ) -> std::result::Result<PhoneNumberWithCountryCodeSource<'static>, InvalidRegexError> {
        if number.is_empty() {
            return Ok(PhoneNumberWithCountryCodeSource::new(
                Cow::Owned(String::new()),
                CountryCodeSource::FROM_DEFAULT_COUNTRY,
            ));
        }
        // Check to see if the number begins with one or more plus signs.
        if let Some(matched) = self.reg_exps.plus_chars_pattern.find_start(number) {
            // Can now normalize the rest of the number since we've consumed the
            // "+" sign at the start.
            return Ok(PhoneNumberWithCountryCodeSource::new(
                Cow::Owned(self.normalize(&number[matched.end()..])),
                CountryCodeSource::FROM_NUMBER_WITH_PLUS_SIGN,
            ));
        }
        // Attempt to parse the first digits as an international prefix.
        let idd_pattern = self.reg_exps.regexp_cache.get_regex(possible_idd_prefix)?;
        let normalized_number = self.normalize(number);
        let (number, country_code_source) =
            match self.parse_prefix_as_idd(&idd_pattern, &normalized_number) {
                Some(stripped_start) => (
                    normalized_number[stripped_start..].to_string(),
                    CountryCodeSource::FROM_NUMBER_WITH_IDD,
                ),
                None => (normalized_number, CountryCodeSource::FROM_DEFAULT_COUNTRY),
            };
        Ok(PhoneNumberWithCountryCodeSource::new(
            Cow::Owned(number),
            country_code_source,
        ))
    }

    /// Returns the byte offset after the IDD if the number begins with the
    /// IDD pattern and the digits following it could start a country calling
    /// code.
    fn parse_prefix_as_idd(&self, idd_pattern: &regex::Regex, number: &str) -> Option<usize> {
        let matched = idd_pattern.find_start(number)?;
        let match_end = matched.end();
        // Only strip this if the first digit after the match is not a 0, since
        // country calling codes cannot begin with 0.
        if let Some(digit_captures) = self
            .reg_exps
            .capturing_digit_pattern
            .captures(&number[match_end..])
        {
            let normalized_group =
                self.normalize_digits_only(digit_captures.get(1).map(|m| m.as_str()).unwrap_or(""));
            if normalized_group == "0" {
                return None;
            }
        }
        Some(match_end)
    }

    /// Extracts the value of the leading country calling code from
    /// full_number, placing the remainder in national_number. Returns 0 when
    /// no known calling code prefixes the number.
    fn extract_country_code(&self, full_number: &str, national_number: &mut String) -> i32 {
        if full_number.is_empty() || full_number.starts_with('0') {
            // Country codes do not begin with a '0'.
            return 0;
        }
        for length in 1..=MAX_LENGTH_COUNTRY_CODE.min(full_number.len()) {
            let potential_country_code = full_number[..length].parse::<i32>().unwrap_or(0);
            if self.has_valid_country_calling_code(potential_country_code) {
                national_number.push_str(&full_number[length..]);
                return potential_country_code;
            }
        }
        0
    }

    /// Tries to extract a country calling code from a number: in turn by
    /// looking at a leading plus sign, the default region's IDD, and finally
    /// the default region's own calling code written without either marker.
    pub(super) fn maybe_extract_country_code(
        &self,
        default_region_metadata: Option<&PhoneMetadata>,
        keep_raw_input: bool,
        national_number: &str,
        phone_number_digits: &mut String,
        phone_number: &mut PhoneNumber,
    ) -> std::result::Result<i32, ParseErrorInternal> {
        if national_number.is_empty() {
            return Ok(0);
        }
        // Set the default prefix to be something that will never match.
        let possible_country_idd_prefix = default_region_metadata
            .map(|metadata| metadata.international_prefix())
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or("NonMatch");

        let stripped = self.maybe_strip_international_prefix_and_normalize(
            national_number,
            possible_country_idd_prefix,
        )?;
        let country_code_source = stripped.country_code_source;
        let full_number = stripped.phone_number;
        if keep_raw_input {
            phone_number.set_country_code_source(country_code_source);
        }
        if country_code_source != CountryCodeSource::FROM_DEFAULT_COUNTRY {
            if full_number.chars().count() <= MIN_LENGTH_FOR_NSN {
                return Err(ParseError::TooShortAfterIdd.into());
            }
            let potential_country_code =
                self.extract_country_code(&full_number, phone_number_digits);
            if potential_country_code != 0 {
                phone_number.set_country_code(potential_country_code);
                return Ok(potential_country_code);
            }
            // If this fails, they must be using a strange country calling code
            // that we don't recognize, or that doesn't exist.
            return Err(ParseError::InvalidCountryCode.into());
        }
        if let Some(metadata) = default_region_metadata {
            // Check to see if the number starts with the country calling code
            // for the default region. If so, we remove the country calling
            // code, and do some checks on the validity of the number before and
            // after.
            let default_country_code = metadata.country_code();
            let mut buf = itoa::Buffer::new();
            let default_country_code_string = buf.format(default_country_code);
            if let Some(potential_national_number) =
                full_number.strip_prefix(default_country_code_string)
            {
                let (potential_national_number, _) = self
                    .maybe_strip_national_prefix_and_carrier_code(
                        metadata,
                        potential_national_number,
                    )?;
                // If the number was not valid before but is valid now, or if it
                // was too long before, we consider the number with the country
                // calling code stripped to be a better result and keep that
                // instead.
                let general_desc = &metadata.general_desc;
                let full_number_viable = self.matcher_api.match_national_number(
                    &full_number,
                    general_desc,
                    false,
                );
                let potential_number_viable = self.matcher_api.match_national_number(
                    &potential_national_number,
                    general_desc,
                    false,
                );
                if (!full_number_viable && potential_number_viable)
                    || matches!(
                        self.test_number_length_for_region(&full_number, metadata),
                        Err(ValidationError::TooLong)
                    )
                {
                    phone_number_digits.push_str(&potential_national_number);
                    if keep_raw_input {
                        phone_number.set_country_code_source(
                            CountryCodeSource::FROM_NUMBER_WITHOUT_PLUS_SIGN,
                        );
                    }
                    phone_number.set_country_code(default_country_code);
                    return Ok(default_country_code);
                }
            }
        }
        // No country calling code present.
        phone_number.set_country_code(0);
        phone_number_digits.push_str(&full_number);
        Ok(0)
    }

    /// Strips any national prefix (such as 0, 1) present in the number
    /// provided, together with any carrier code captured by the national
    /// prefix pattern. The transform rule of the region, when present, is
    /// applied instead of plain removal.
    pub fn maybe_strip_national_prefix_and_carrier_code<'a>(
        &self,
        metadata: &PhoneMetadata,
        number: &'a str,
    ) -> std::result::Result<(Cow<'a, str>, Option<&'a str>), InvalidRegexError> {
        let possible_national_prefix = metadata.national_prefix_for_parsing();
        if number.is_empty() || possible_national_prefix.is_empty() {
            // Early return for numbers of zero length or with no national prefix.
            return Ok((Cow::Borrowed(number), None));
        }
        // Attempt to parse the first digits as a national prefix.
        let possible_national_prefix_pattern = self
            .reg_exps
            .regexp_cache
            .get_regex(possible_national_prefix)?;
        let Some(prefix_captures) = possible_national_prefix_pattern.captures_start(number) else {
            return Ok((Cow::Borrowed(number), None));
        };
        let prefix_match_end = prefix_captures
            .get(0)
            .expect("regex matches always have a whole-match group")
            .end();
        let general_desc = &metadata.general_desc;
        // Check if the original number is viable.
        let is_viable_original_number =
            self.matcher_api
                .match_national_number(number, general_desc, false);
        // prefix_captures.len() - 1 is the number of capturing groups in the
        // pattern. A group that did not participate implies nothing was
        // captured in possible_national_prefix; therefore, no transformation is
        // necessary, and we just remove the national prefix.
        let num_of_groups = prefix_captures.len() - 1;
        let last_group = if num_of_groups == 0 {
            None
        } else {
            prefix_captures.get(num_of_groups)
        };
        let transform_rule = metadata.national_prefix_transform_rule();
        if transform_rule.is_empty() || last_group.is_none() {
            // If the original number was viable, and the resultant number is
            // not, we return.
            let stripped_number = &number[prefix_match_end..];
            if is_viable_original_number
                && !self
                    .matcher_api
                    .match_national_number(stripped_number, general_desc, false)
            {
                return Ok((Cow::Borrowed(number), None));
            }
            let carrier_code = prefix_captures.get(1).map(|group| group.as_str());
            Ok((Cow::Borrowed(stripped_number), carrier_code))
        } else {
            // Check that the resultant number is still viable. If not, return.
            // Check this by applying the transformation on a copy first.
            let mut transformed_number = String::with_capacity(number.len());
            prefix_captures.expand(transform_rule, &mut transformed_number);
            transformed_number.push_str(&number[prefix_match_end..]);
            if is_viable_original_number
                && !self.matcher_api.match_national_number(
                    &transformed_number,
                    general_desc,
                    false,
                )
            {
                return Ok((Cow::Borrowed(number), None));
            }
            let carrier_code = if num_of_groups > 1 {
                prefix_captures.get(1).map(|group| group.as_str())
            } else {
                None
            };
            Ok((Cow::Owned(transformed_number), carrier_code))
        }
    }

    /// Records significant leading zeros of the national number, which a u64
    /// cannot represent, in the sidecar fields.
    fn set_italian_leading_zeros_for_phone_number(
        national_number: &str,
        phone_number: &mut PhoneNumber,
    ) {
        if national_number.len() > 1 && national_number.starts_with('0') {
            phone_number.set_italian_leading_zero(true);
            let mut number_of_leading_zeros = 1;
            // Note that if the national number is all "0"s, the last "0" is not
            // counted as a leading zero.
            let digits: Vec<char> = national_number.chars().collect();
            while number_of_leading_zeros < digits.len() - 1
                && digits[number_of_leading_zeros] == '0'
            {
                number_of_leading_zeros += 1;
            }
            if number_of_leading_zeros != 1 {
                phone_number.set_number_of_leading_zeros(number_of_leading_zeros as i32);
            }
        }
    }

    pub(crate) fn parse_helper_without_region(
        &self,
        number_to_parse: &str,
    ) -> std::result::Result<PhoneNumber, ParseErrorInternal> {
        self.parse_helper(number_to_parse, i18n::RegionCode::get_unknown(), false, false)
    }
}
