//! Offense severity weights.
//!
//! Each weight is an estimated sentence length in days, taken from the
//! federal sentencing table midpoints for the offense level. The weights
//! drive the Crime Severity Index.
//!
//! RULE: table order is part of the scoring contract. The substring scan
//! returns the FIRST entry that matches, so reordering entries changes
//! historical scores. Append only, never reorder.

/// Weight used when nothing in the table or keyword groups matches.
pub const DEFAULT_WEIGHT: u32 = 90;

/// Enhancement applied to offenses committed against a person.
pub const PERSON_MULTIPLIER: f64 = 1.25;

/// Ordered (offense, days) table.
pub const SEVERITY_WEIGHTS: &[(&str, u32)] = &[
    // Homicide
    ("MURDER", 10950),
    ("CAPITAL MURDER", 10950),
    ("MURDER 1ST DEGREE", 10950),
    ("MURDER 2ND DEGREE", 7300),
    ("MANSLAUGHTER", 2920),
    // Sexual offenses
    ("SEXUAL ASSAULT OF A CHILD", 5475),
    ("AGGRAVATED SEXUAL ASSAULT", 4380),
    ("SEXUAL ASSAULT", 2920),
    ("RAPE", 2920),
    ("INDECENT EXPOSURE", 180),
    // Kidnapping
    ("KIDNAPPING", 4745),
    ("AGGRAVATED KIDNAPPING", 5475),
    ("FALSE IMPRISONMENT", 730),
    // Robbery
    ("AGGRAVATED ROBBERY", 3285),
    ("ROBBERY", 2190),
    ("CARJACKING", 3650),
    // Assault
    ("AGGRAVATED ASSAULT", 1460),
    ("ASSAULT WITH DEADLY WEAPON", 1825),
    ("ASSAULT CAUSING BODILY INJURY", 730),
    ("ASSAULT", 365),
    ("SIMPLE ASSAULT", 180),
    ("FAMILY VIOLENCE", 365),
    // Arson
    ("ARSON", 1825),
    ("ARSON OF VEHICLE", 730),
    // Burglary
    ("BURGLARY OF HABITATION", 1095),
    ("BURGLARY OF BUILDING", 730),
    ("BURGLARY OF VEHICLE", 365),
    // Theft
    ("AUTO THEFT", 730),
    ("THEFT", 180),
    ("SHOPLIFTING", 90),
    ("THEFT FROM MOTOR VEHICLE", 180),
    ("THEFT OF SERVICE", 90),
    ("IDENTITY THEFT", 730),
    // Fraud
    ("FRAUD", 365),
    ("CREDIT CARD FRAUD", 365),
    ("FORGERY", 365),
    ("COUNTERFEITING", 730),
    // Drugs
    ("DRUG TRAFFICKING", 1460),
    ("DRUG DISTRIBUTION", 730),
    ("DRUG POSSESSION", 90),
    ("DRUG PARAPHERNALIA", 30),
    // Weapons
    ("WEAPON LAW VIOLATIONS", 365),
    ("CARRYING CONCEALED WEAPON", 180),
    ("POSSESSION OF PROHIBITED WEAPON", 730),
    // Impaired driving
    ("DWI", 180),
    ("DUI", 180),
    // Property damage
    ("CRIMINAL MISCHIEF", 90),
    ("VANDALISM", 90),
    ("GRAFFITI", 30),
    // Public order
    ("DISORDERLY CONDUCT", 30),
    ("PUBLIC INTOXICATION", 7),
    ("CRIMINAL TRESPASS", 30),
    ("EVADING ARREST", 180),
    ("RESISTING ARREST", 90),
    // Other
    ("PROSTITUTION", 30),
    ("GAMBLING", 30),
    ("CITY ORDINANCE VIOLATIONS", 7),
    ("TRAFFIC VIOLATIONS", 7),
];

/// Keyword groups tried in order once the table scan fails.
pub const KEYWORD_FALLBACKS: &[(&[&str], u32)] = &[
    (&["MURDER", "HOMICIDE"], 7300),
    (&["SEXUAL", "RAPE"], 2920),
    (&["ASSAULT", "BATTERY"], 365),
    (&["ROBBERY", "MUGGING"], 2190),
    (&["BURGLARY", "BREAKING"], 730),
    (&["THEFT", "LARCENY", "STEALING"], 180),
    (&["DRUG", "NARCOTIC", "SUBSTANCE"], 365),
    (&["FRAUD", "FORGERY", "EMBEZZLEMENT"], 365),
    (&["VANDALISM", "GRAFFITI", "MISCHIEF"], 90),
    (&["WEAPON", "FIREARM", "GUN"], 365),
];

/// Severity weight (days) for an offense label.
///
/// Matching chain: exact (case-insensitive, trimmed) → first table entry
/// that is a substring of the label or contains it → first keyword group
/// hit → [`DEFAULT_WEIGHT`]. Never fails. A blank label is contained in
/// every key and so takes the first table entry.
pub fn weight_of(crime_type: &str) -> u32 {
    let label = crime_type.trim().to_uppercase();

    if let Some((_, w)) = SEVERITY_WEIGHTS.iter().find(|(key, _)| *key == label) {
        return *w;
    }

    if let Some((_, w)) = SEVERITY_WEIGHTS
        .iter()
        .find(|(key, _)| label.contains(key) || key.contains(label.as_str()))
    {
        return *w;
    }

    KEYWORD_FALLBACKS
        .iter()
        .find(|(words, _)| words.iter().any(|word| label.contains(word)))
        .map(|(_, w)| *w)
        .unwrap_or(DEFAULT_WEIGHT)
}

/// True when the NIBRS "crime against" category is PERSON.
pub fn is_person_offense(crime_against: &str) -> bool {
    crime_against.eq_ignore_ascii_case("PERSON")
}

/// Weight with the person enhancement applied, truncated to whole days.
pub fn weighted_severity(crime_type: &str, crime_against: &str) -> i64 {
    let base = f64::from(weight_of(crime_type));
    let multiplier = if is_person_offense(crime_against) {
        PERSON_MULTIPLIER
    } else {
        1.0
    };
    (base * multiplier) as i64
}
