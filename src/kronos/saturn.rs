/// Years in which Saturn is treated as entering a new sign. Fixed table, not
/// computed from an ephemeris.
pub const SATURN_ZODIAC_CYCLE: &[(i32, &str)] = &[
    (2023, "Pisces"),
    (2025, "Aries"),
    (2028, "Taurus"),
    (2030, "Gemini"),
    (2033, "Cancer"),
    (2035, "Leo"),
    (2038, "Virgo"),
    (2040, "Libra"),
    (2043, "Scorpio"),
    (2045, "Sagittarius"),
    (2048, "Capricorn"),
    (2050, "Aquarius"),
    (2053, "Pisces"),
    (2055, "Aries"),
    (2058, "Taurus"),
];

pub fn ingress_sign(year: i32) -> Option<&'static str> {
    SATURN_ZODIAC_CYCLE
        .binary_search_by_key(&year, |(y, _)| *y)
        .ok()
        .map(|idx| SATURN_ZODIAC_CYCLE[idx].1)
}

/// First configured ingress in `year` or later.
pub fn next_ingress(year: i32) -> Option<(i32, &'static str)> {
    SATURN_ZODIAC_CYCLE
        .iter()
        .find(|(y, _)| *y >= year)
        .copied()
}
