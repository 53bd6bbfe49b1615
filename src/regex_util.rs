use regex::{Captures, Match, Regex};

pub trait RegexFullMatch {
    /// Matches only when the pattern covers the whole input. Metadata
    /// patterns are written assuming implicit anchors at both ends.
    fn full_match(&self, s: &str) -> bool;
}

pub trait RegexConsume {
    fn matches_start(&self, s: &str) -> bool {
        self.find_start(s).is_some()
    }

    fn captures_start<'a>(&self, s: &'a str) -> Option<Captures<'a>>;
    fn find_start<'a>(&self, s: &'a str) -> Option<Match<'a>>;
}

impl RegexFullMatch for Regex {
    fn full_match(&self, s: &str) -> bool {
        if let Some(matched) = self.find(s) {
            return matched.start() == 0 && matched.end() == s.len();
        }
        false
    }
}

impl RegexConsume for Regex {
    fn captures_start<'a>(&self, s: &'a str) -> Option<Captures<'a>> {
        let captures = self.captures(s)?;
        let full_capture = captures.get(0)?;
        if full_capture.start() != 0 {
            return None;
        }

        Some(captures)
    }

    fn find_start<'a>(&self, s: &'a str) -> Option<Match<'a>> {
        let found = self.find(s)?;
        if found.start() != 0 {
            return None;
        }
        Some(found)
    }
}
