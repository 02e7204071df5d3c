// vantage-audit/src/masking.rs
// ============================================================================
// Module: PII Masking
// Description: Regex-based detection and category-specific partial redaction.
// Purpose: Scrub request bodies before they reach the append-only audit log.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! Grounded on `original_source/backend/tests/test_pii_masking.py`'s fixed
//! ten-category list and exact per-category redaction shapes. Each category
//! keeps just enough of the original value for an investigator to recognize
//! it without reconstructing the underlying PII.

use std::sync::LazyLock;

use regex::Regex;

/// One fixed PII category. Order doubles as scan priority when categories
/// overlap (e.g. a long digit run that could match more than one pattern).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PiiCategory {
    /// Resident registration number (Korean national ID format).
    ResidentId,
    /// Foreign resident registration number.
    ForeignId,
    /// Passport number.
    Passport,
    /// Driver's license number.
    DriverLicense,
    /// Mobile phone number.
    PhoneMobile,
    /// Landline phone number.
    PhoneLandline,
    /// Email address.
    Email,
    /// Credit card number.
    CreditCard,
    /// Bank account number.
    BankAccount,
    /// IPv4 address.
    IpAddress,
}

impl PiiCategory {
    /// The stable string name used in detection records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResidentId => "resident_id",
            Self::ForeignId => "foreign_id",
            Self::Passport => "passport",
            Self::DriverLicense => "driver_license",
            Self::PhoneMobile => "phone_mobile",
            Self::PhoneLandline => "phone_landline",
            Self::Email => "email",
            Self::CreditCard => "credit_card",
            Self::BankAccount => "bank_account",
            Self::IpAddress => "ip_address",
        }
    }
}

/// One detected-and-masked PII occurrence, retained for forensic counting
/// without retaining the original value.
#[derive(Debug, Clone)]
pub struct Detection {
    /// The category matched.
    pub category: PiiCategory,
    /// Byte offset in the original text where the match started.
    pub start: usize,
}

struct Pattern {
    category: PiiCategory,
    regex: &'static LazyLock<Regex>,
    mask: fn(&str) -> String,
}

static RESIDENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:(?:0[1-9]|1[0-2])(?:0[1-9]|[12]\d|3[01]))[- ]?[1-4]\d{6}")
        .expect("resident id pattern is a fixed valid regex")
});
static FOREIGN_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:(?:0[1-9]|1[0-2])(?:0[1-9]|[12]\d|3[01]))[- ]?[5-8]\d{6}")
        .expect("foreign id pattern is a fixed valid regex")
});
static PASSPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]\d{8}\b").expect("passport pattern is a fixed valid regex"));
static DRIVER_LICENSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}[- ]\d{2}[- ]\d{6}[- ]\d{2}").expect("driver license pattern is a fixed valid regex")
});
static PHONE_MOBILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"01[016789][-. ]?\d{3,4}[-. ]?\d{4}").expect("mobile phone pattern is a fixed valid regex")
});
static PHONE_LANDLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"0(?:2|[3-6]\d)[-. ]\d{3,4}[-. ]\d{4}").expect("landline pattern is a fixed valid regex")
});
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").expect("email pattern is a fixed valid regex"));
static CREDIT_CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}").expect("credit card pattern is a fixed valid regex"));
static BANK_ACCOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3}[-]\d{2}[-]\d{6}").expect("bank account pattern is a fixed valid regex"));
static IP_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("ip address pattern is a fixed valid regex")
});

fn patterns() -> [Pattern; 10] {
    [
        Pattern { category: PiiCategory::ResidentId, regex: &RESIDENT_ID, mask: mask_resident_id },
        Pattern { category: PiiCategory::ForeignId, regex: &FOREIGN_ID, mask: mask_resident_id },
        Pattern { category: PiiCategory::Passport, regex: &PASSPORT, mask: mask_passport },
        Pattern { category: PiiCategory::DriverLicense, regex: &DRIVER_LICENSE, mask: mask_driver_license },
        Pattern { category: PiiCategory::PhoneMobile, regex: &PHONE_MOBILE, mask: mask_phone },
        Pattern { category: PiiCategory::PhoneLandline, regex: &PHONE_LANDLINE, mask: mask_phone },
        Pattern { category: PiiCategory::Email, regex: &EMAIL, mask: mask_email },
        Pattern { category: PiiCategory::CreditCard, regex: &CREDIT_CARD, mask: mask_credit_card },
        Pattern { category: PiiCategory::BankAccount, regex: &BANK_ACCOUNT, mask: mask_bank_account },
        Pattern { category: PiiCategory::IpAddress, regex: &IP_ADDRESS, mask: mask_ip_address },
    ]
}

/// Masks every PII occurrence of `text`, restricted to `only` when
/// non-empty, returning the masked text and the list of detections.
///
/// A `None` input (no request body) and an empty string both return
/// unchanged with no detections, matching the original's `None`/`""`
/// short-circuit.
#[must_use]
pub fn mask_pii(text: Option<&str>, only: &[PiiCategory]) -> (Option<String>, Vec<Detection>) {
    let Some(text) = text else {
        return (None, Vec::new());
    };
    if text.is_empty() {
        return (Some(String::new()), Vec::new());
    }

    let mut masked = text.to_owned();
    let mut detections = Vec::new();
    for pattern in patterns() {
        if !only.is_empty() && !only.contains(&pattern.category) {
            continue;
        }
        let mut next = String::with_capacity(masked.len());
        let mut last_end = 0;
        for found in pattern.regex.find_iter(&masked) {
            next.push_str(&masked[last_end..found.start()]);
            next.push_str(&(pattern.mask)(found.as_str()));
            detections.push(Detection { category: pattern.category, start: found.start() });
            last_end = found.end();
        }
        next.push_str(&masked[last_end..]);
        masked = next;
    }
    detections.sort_by_key(|detection| detection.start);
    (Some(masked), detections)
}

/// Whether `text` contains any recognized PII category, without masking it.
#[must_use]
pub fn contains_pii(text: Option<&str>) -> bool {
    let Some(text) = text else {
        return false;
    };
    if text.is_empty() {
        return false;
    }
    patterns().iter().any(|pattern| pattern.regex.is_match(text))
}

fn mask_resident_id(value: &str) -> String {
    value
        .find(['-', ' '])
        .map_or_else(|| "*".repeat(value.len()), |split| format!("{}-{}", &value[..split], "*".repeat(value.len() - split - 1)))
}

fn mask_passport(value: &str) -> String {
    let first = &value[..1];
    let rest = &value[1..];
    let tail_start = rest.len().saturating_sub(4);
    format!("{first}{}{}", "*".repeat(tail_start), &rest[tail_start..])
}

fn mask_driver_license(value: &str) -> String {
    let groups: Vec<&str> = value.split(['-', ' ']).collect();
    groups
        .first()
        .map(|first| {
            let rest: Vec<String> = groups.iter().skip(1).map(|group| "*".repeat(group.len())).collect();
            format!("{first}-{}", rest.join("-"))
        })
        .unwrap_or_default()
}

fn mask_phone(value: &str) -> String {
    let separator = value.chars().find(|ch| matches!(ch, '-' | '.' | ' ')).unwrap_or('-');
    let groups: Vec<&str> = value.split(separator).collect();
    match groups.as_slice() {
        [first, middle, last] => format!("{first}{separator}{}{separator}{last}", "*".repeat(middle.len())),
        _ => "*".repeat(value.len()),
    }
}

fn mask_email(value: &str) -> String {
    let Some((local, domain)) = value.split_once('@') else {
        return "*".repeat(value.len());
    };
    let local_first = &local[..local.len().min(1)];
    let (domain_name, suffix) = domain.split_once('.').unwrap_or((domain, ""));
    let domain_first = &domain_name[..domain_name.len().min(1)];
    if suffix.is_empty() {
        format!("{local_first}***@{domain_first}***")
    } else {
        format!("{local_first}***@{domain_first}***.{suffix}")
    }
}

fn mask_credit_card(value: &str) -> String {
    let separator = value.chars().find(|ch| matches!(ch, '-' | ' '));
    let groups: Vec<&str> = separator.map_or_else(|| vec![value], |sep| value.split(sep).collect());
    if groups.len() == 4 {
        let sep = separator.unwrap_or('-');
        format!(
            "{}{sep}{}{sep}{}{sep}{}",
            groups[0],
            "*".repeat(groups[1].len()),
            "*".repeat(groups[2].len()),
            groups[3]
        )
    } else {
        let digits: Vec<char> = value.chars().collect();
        let len = digits.len();
        let masked: String = digits
            .iter()
            .enumerate()
            .map(|(index, ch)| if index < 4 || index >= len.saturating_sub(4) { *ch } else { '*' })
            .collect();
        masked
    }
}

fn mask_bank_account(value: &str) -> String {
    let groups: Vec<&str> = value.split('-').collect();
    if let [first, middle, last] = groups.as_slice() {
        let tail_start = last.len().saturating_sub(2);
        format!("{first}-{}-{}{}", "*".repeat(middle.len()), "*".repeat(tail_start), &last[tail_start..])
    } else {
        "*".repeat(value.len())
    }
}

fn mask_ip_address(value: &str) -> String {
    let octets: Vec<&str> = value.split('.').collect();
    if let [a, b, ..] = octets.as_slice() { format!("{a}.{b}.***.***") } else { "*".repeat(value.len()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_resident_id_keeping_only_the_birth_date() {
        assert_eq!(mask_resident_id("901231-1234567"), "901231-*******");
    }

    #[test]
    fn masks_mobile_phone_keeping_area_and_last_group() {
        assert_eq!(mask_phone("010-1234-5678"), "010-****-5678");
    }

    #[test]
    fn masks_email_to_first_character_plus_fixed_stars() {
        assert_eq!(mask_email("user@example.com"), "u***@e***.com");
    }

    #[test]
    fn masks_credit_card_keeping_first_and_last_groups() {
        assert_eq!(mask_credit_card("1234-5678-9012-3456"), "1234-****-****-3456");
    }

    #[test]
    fn masks_passport_keeping_first_character_and_last_four_digits() {
        assert_eq!(mask_passport("M12345678"), "M****5678");
    }

    #[test]
    fn masks_driver_license_keeping_only_the_first_group() {
        assert_eq!(mask_driver_license("11-22-123456-78"), "11-**-******-**");
    }

    #[test]
    fn masks_ip_address_keeping_first_two_octets() {
        assert_eq!(mask_ip_address("192.168.1.100"), "192.168.***.***");
    }

    #[test]
    fn mask_pii_on_none_returns_none_with_no_detections() {
        let (masked, detections) = mask_pii(None, &[]);
        assert!(masked.is_none());
        assert!(detections.is_empty());
    }

    #[test]
    fn mask_pii_on_empty_text_returns_empty_with_no_detections() {
        let (masked, detections) = mask_pii(Some(""), &[]);
        assert_eq!(masked, Some(String::new()));
        assert!(detections.is_empty());
    }

    #[test]
    fn mask_pii_detects_and_redacts_a_single_email() {
        let (masked, detections) = mask_pii(Some("contact me at test@example.com please"), &[]);
        let masked = masked.expect("some input always yields some output");
        assert!(!masked.contains("test@example.com"));
        assert!(masked.contains("t***@e***.com"));
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].category, PiiCategory::Email);
    }

    #[test]
    fn mask_pii_detects_multiple_categories_in_one_body() {
        let text = "phone: 010-9876-5432, card: 1234-5678-9012-3456, ip: 192.168.0.1";
        let (masked, detections) = mask_pii(Some(text), &[]);
        let masked = masked.expect("some input always yields some output");
        assert!(!masked.contains("010-9876-5432"));
        assert!(!masked.contains("1234-5678-9012-3456"));
        assert!(!masked.contains("192.168.0.1"));
        assert!(detections.len() >= 3);
    }

    #[test]
    fn mask_pii_restricted_to_one_category_leaves_others_untouched() {
        let text = "email: user@test.com, phone: 010-1234-5678";
        let (masked, detections) = mask_pii(Some(text), &[PiiCategory::Email]);
        let masked = masked.expect("some input always yields some output");
        assert!(!masked.contains("user@test.com"));
        assert!(masked.contains("010-1234-5678"));
        assert_eq!(detections.len(), 1);
    }

    #[test]
    fn text_without_pii_is_unchanged() {
        let text = "nothing sensitive here, just a status update";
        let (masked, detections) = mask_pii(Some(text), &[]);
        assert_eq!(masked.as_deref(), Some(text));
        assert!(detections.is_empty());
    }

    #[test]
    fn contains_pii_detects_without_mutating() {
        assert!(contains_pii(Some("reach me at test@example.com")));
        assert!(!contains_pii(Some("no pii in this sentence")));
        assert!(!contains_pii(None));
    }
}
