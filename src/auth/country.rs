//! Country dial codes offered by the phone sign-in country picker

use serde::Serialize;

/// Country dial code entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountryCode {
    /// ISO 3166-1 alpha-2 region identifier
    pub code: &'static str,
    /// Country name
    pub name: &'static str,
    /// `+`-prefixed international calling code
    pub dial_code: &'static str,
    /// Flag glyph
    pub flag: &'static str,
}

/// Region selected when the picker opens
pub const DEFAULT_COUNTRY_CODE: &str = "GB";

/// Countries offered by the picker, in display order
pub const COUNTRY_CODES: &[CountryCode] = &[
    CountryCode { code: "GB", name: "United Kingdom", dial_code: "+44", flag: "🇬🇧" },
    CountryCode { code: "US", name: "United States", dial_code: "+1", flag: "🇺🇸" },
    CountryCode { code: "IE", name: "Ireland", dial_code: "+353", flag: "🇮🇪" },
    CountryCode { code: "FR", name: "France", dial_code: "+33", flag: "🇫🇷" },
    CountryCode { code: "DE", name: "Germany", dial_code: "+49", flag: "🇩🇪" },
    CountryCode { code: "ES", name: "Spain", dial_code: "+34", flag: "🇪🇸" },
    CountryCode { code: "IT", name: "Italy", dial_code: "+39", flag: "🇮🇹" },
    CountryCode { code: "NL", name: "Netherlands", dial_code: "+31", flag: "🇳🇱" },
    CountryCode { code: "IN", name: "India", dial_code: "+91", flag: "🇮🇳" },
    CountryCode { code: "CN", name: "China", dial_code: "+86", flag: "🇨🇳" },
    CountryCode { code: "JP", name: "Japan", dial_code: "+81", flag: "🇯🇵" },
    CountryCode { code: "KR", name: "South Korea", dial_code: "+82", flag: "🇰🇷" },
    CountryCode { code: "VN", name: "Vietnam", dial_code: "+84", flag: "🇻🇳" },
    CountryCode { code: "SG", name: "Singapore", dial_code: "+65", flag: "🇸🇬" },
    CountryCode { code: "AU", name: "Australia", dial_code: "+61", flag: "🇦🇺" },
    CountryCode { code: "NZ", name: "New Zealand", dial_code: "+64", flag: "🇳🇿" },
    CountryCode { code: "BR", name: "Brazil", dial_code: "+55", flag: "🇧🇷" },
    CountryCode { code: "MX", name: "Mexico", dial_code: "+52", flag: "🇲🇽" },
    CountryCode { code: "ZA", name: "South Africa", dial_code: "+27", flag: "🇿🇦" },
    CountryCode { code: "NG", name: "Nigeria", dial_code: "+234", flag: "🇳🇬" },
    CountryCode { code: "AE", name: "United Arab Emirates", dial_code: "+971", flag: "🇦🇪" },
];

/// The entry selected by default
pub fn default_country() -> &'static CountryCode {
    find_country(DEFAULT_COUNTRY_CODE).unwrap_or(&COUNTRY_CODES[0])
}

/// Look up an entry by region identifier, ignoring case
pub fn find_country(code: &str) -> Option<&'static CountryCode> {
    COUNTRY_CODES
        .iter()
        .find(|country| country.code.eq_ignore_ascii_case(code))
}
