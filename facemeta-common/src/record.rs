//! Normalized record schema shared by the normalizer and the review service
//!
//! A [`NormalizedRecord`] is one row of the flat table. Every field is always
//! populated: values that cannot be decoded from the source archive are
//! replaced by the sentinels defined here.

use std::fmt;

/// Sentinel for undecodable strings and dates
pub const UNKNOWN: &str = "unknown";

/// Sentinel for an unknown age
pub const UNKNOWN_AGE: i32 = -1;

/// Sentinel for an unknown identity index
pub const UNKNOWN_CELEB_ID: i64 = -1;

/// Sentinel for an undecodable face bounding box
pub const EMPTY_FACE_LOCATION: &str = "0,0,0,0";

/// Column order of the full tables (combined and primary-only)
pub const FULL_COLUMNS: [&str; 10] = [
    "age",
    "gender",
    "path",
    "name",
    "dob",
    "photo_taken",
    "face_location",
    "face_score1",
    "face_score2",
    "celeb_id",
];

/// Column order of the simplified (backward compatible) table
pub const SIMPLIFIED_COLUMNS: [&str; 4] = ["age", "gender", "path", "name"];

/// Combined, filtered table with all columns
pub const COMBINED_FULL_FILE: &str = "meta_full.csv";

/// Primary-partition table with all columns, unfiltered
pub const PRIMARY_FULL_FILE: &str = "imdb_meta_full.csv";

/// Filtered, shuffled table with the simplified column set
pub const SIMPLIFIED_FILE: &str = "meta.csv";

/// Gender label
///
/// The source flag is 1 for male, 0 for female and NaN when unknown. Only an
/// exact 1 maps to `Male`; everything else (including NaN and a missing flag)
/// maps to `Female`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical output row
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    /// Age in years at capture time, or [`UNKNOWN_AGE`]
    pub age: i32,
    pub gender: Gender,
    /// Partition prefix + stored path fragment
    pub path: String,
    /// Display name, or [`UNKNOWN`]
    pub name: String,
    /// `YYYY-MM-DD`, or [`UNKNOWN`]
    pub dob: String,
    /// Capture year exactly as stored in the archive
    pub photo_taken: f64,
    /// Four comma-joined integers
    pub face_location: String,
    pub face_score1: f64,
    pub face_score2: f64,
    /// Identity index, or [`UNKNOWN_CELEB_ID`]
    pub celeb_id: i64,
}

impl NormalizedRecord {
    /// Row values in [`FULL_COLUMNS`] order
    pub fn full_row(&self) -> [String; 10] {
        [
            self.age.to_string(),
            self.gender.to_string(),
            self.path.clone(),
            self.name.clone(),
            self.dob.clone(),
            format_float(self.photo_taken),
            self.face_location.clone(),
            format_float(self.face_score1),
            format_float(self.face_score2),
            self.celeb_id.to_string(),
        ]
    }

    /// Row values in [`SIMPLIFIED_COLUMNS`] order
    pub fn simplified_row(&self) -> [String; 4] {
        [
            self.age.to_string(),
            self.gender.to_string(),
            self.path.clone(),
            self.name.clone(),
        ]
    }

    /// Single-face selection: a face was detected (`face_score1` is not
    /// `-inf`) and no second face competes (`face_score2` is NaN)
    pub fn is_single_face(&self) -> bool {
        self.face_score1 != f64::NEG_INFINITY && self.face_score2.is_nan()
    }
}

/// Format a float the way the flat table stores it
///
/// Non-finite values become `nan`, `inf` and `-inf`; finite values use the
/// shortest decimal that round-trips (`2009`, `1.4596`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NormalizedRecord {
        NormalizedRecord {
            age: 33,
            gender: Gender::Male,
            path: "imdb_crop/01/nm0000001_rm124825600_1899-5-10_1968.jpg".to_string(),
            name: "Fred Astaire".to_string(),
            dob: "1899-05-10".to_string(),
            photo_taken: 1968.0,
            face_location: "1072,161,1214,303".to_string(),
            face_score1: 1.4596,
            face_score2: f64::NAN,
            celeb_id: 6488,
        }
    }

    #[test]
    fn test_format_float_non_finite() {
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_format_float_integral_year_has_no_fraction() {
        assert_eq!(format_float(2009.0), "2009");
        assert_eq!(format_float(1.4596), "1.4596");
        assert_eq!(format_float(-0.5), "-0.5");
    }

    #[test]
    fn test_full_row_matches_column_order() {
        let row = sample().full_row();
        assert_eq!(row.len(), FULL_COLUMNS.len());
        assert_eq!(row[0], "33");
        assert_eq!(row[1], "male");
        assert_eq!(row[5], "1968");
        assert_eq!(row[8], "nan");
        assert_eq!(row[9], "6488");
    }

    #[test]
    fn test_simplified_row() {
        let row = sample().simplified_row();
        assert_eq!(row, ["33", "male", sample().path.as_str(), "Fred Astaire"]);
    }

    #[test]
    fn test_single_face_filter() {
        let mut record = sample();
        assert!(record.is_single_face());

        record.face_score2 = 3.2;
        assert!(!record.is_single_face(), "second face present");

        record.face_score2 = f64::NAN;
        record.face_score1 = f64::NEG_INFINITY;
        assert!(!record.is_single_face(), "no face detected");
    }

    #[test]
    fn test_gender_labels_are_lowercase() {
        assert_eq!(Gender::Female.to_string(), "female");
        assert_eq!(Gender::Male.as_str(), "male");
    }
}
