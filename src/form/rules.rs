use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Unanchored: "a@b.c" anywhere in the value passes, as the browser form did.
    static ref EMAIL_RE: Regex = Regex::new(r"\S+@\S+\.\S+").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-z-]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+[0-9]{1,4}\s[0-9]{10}$").unwrap();
    static ref AGE_RE: Regex = Regex::new(r"^[0-9]{1,3}$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_age(age: &str) -> bool {
    AGE_RE.is_match(age)
}

/// What the username input keeps of a typed value: lowercased, with every
/// character outside `[a-z-]` dropped.
pub fn filter_username(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("ann@x.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("ann@x"));
        assert!(!is_valid_email("ann x.com"));
        assert!(!is_valid_email("@x.com"));
    }

    #[test]
    fn username_pattern() {
        assert!(is_valid_username("ann-lee"));
        assert!(is_valid_username("-"));
        assert!(!is_valid_username("Ann_Lee"));
        assert!(!is_valid_username("ann1"));
        assert!(!is_valid_username(""));
    }

    #[test]
    fn phone_pattern() {
        assert!(is_valid_phone("+1 1234567890"));
        assert!(is_valid_phone("+9198 1234567890"));
        assert!(!is_valid_phone("+12345 1234567890"));
        assert!(!is_valid_phone("1 1234567890"));
        assert!(!is_valid_phone("+1 123456789"));
        assert!(!is_valid_phone("+1-1234567890"));
        // Non-ASCII digits are not digits here.
        assert!(!is_valid_phone("+١ 1234567890"));
    }

    #[test]
    fn age_pattern() {
        assert!(is_valid_age("30"));
        assert!(is_valid_age("0"));
        assert!(!is_valid_age("thirty"));
        assert!(!is_valid_age("-3"));
        assert!(!is_valid_age("1000"));
    }

    #[test]
    fn username_filter_drops_disallowed_characters() {
        assert_eq!(filter_username("Ann_Lee"), "annlee");
        assert_eq!(filter_username("ann-lee42"), "ann-lee");
        assert_eq!(filter_username("  "), "");
        assert_eq!(filter_username("ÄNN"), "nn");
    }
}
