//! Per-field decoders
//!
//! The archive does not guarantee one shape per field: a value may be a plain
//! scalar, a one-element container or a nested container. Each decoder tries
//! an ordered chain of extractions and returns `None` when all of them fail;
//! callers substitute the field's sentinel. Decoders never panic and never
//! fail the record.

use crate::matfile::{Element, MatArray};
use chrono::{Datelike, NaiveDate};
use facemeta_common::config::PlausibilityLimits;
use facemeta_common::record::{format_float, Gender, UNKNOWN, UNKNOWN_AGE};

/// Days between MATLAB's day 0 (year 0) and chrono's day 1 (0001-01-01)
pub const MATLAB_EPOCH_OFFSET: f64 = 366.0;

/// A scalar element
fn plain_scalar(raw: Element<'_>) -> Option<f64> {
    match raw {
        Element::Scalar(v) => Some(v),
        _ => None,
    }
}

/// A scalar element, or the only element of a contained array
fn scalar_or_singleton(raw: Element<'_>) -> Option<f64> {
    match raw {
        Element::Scalar(v) => Some(v),
        Element::Array(array) if array.len() == 1 => array.element(0).and_then(plain_scalar),
        _ => None,
    }
}

/// Truncate toward zero, rejecting NaN, infinities and out-of-range values
fn truncate(v: f64) -> Option<i64> {
    if v.is_finite() && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v.trunc() as i64)
    } else {
        None
    }
}

fn code_to_char(v: f64) -> Option<char> {
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 {
        char::from_u32(v as u32)
    } else {
        None
    }
}

fn scalar_text(v: f64) -> String {
    match truncate(v) {
        Some(i) if v.fract() == 0.0 => i.to_string(),
        _ => format_float(v),
    }
}

/// Convert a MATLAB serial date number to a calendar date
///
/// The fractional part (time of day) is ignored. Non-finite values and day
/// counts before 0001-01-01 yield `None`.
pub fn datenum_to_date(datenum: f64) -> Option<NaiveDate> {
    if !datenum.is_finite() {
        return None;
    }
    let ordinal = (datenum - MATLAB_EPOCH_OFFSET).trunc();
    if ordinal < 1.0 || ordinal > i32::MAX as f64 {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(ordinal as i32)
}

/// Birth date from its datenum encoding, within the plausible year range
pub fn decode_dob(raw: Option<Element<'_>>, limits: &PlausibilityLimits) -> Option<NaiveDate> {
    raw.and_then(scalar_or_singleton)
        .and_then(datenum_to_date)
        .filter(|d| (limits.dob_year_min..=limits.dob_year_max).contains(&d.year()))
}

/// `YYYY-MM-DD`, or the unknown sentinel
pub fn format_dob(dob: Option<NaiveDate>) -> String {
    dob.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Age in whole years at capture time
///
/// Only the capture year is known, so the capture date is taken as January 1
/// of that year: anyone not born on January 1 is counted one year younger.
/// This is an approximation of the true age, not an exact value.
pub fn decode_age(dob: Option<NaiveDate>, photo_taken: f64, limits: &PlausibilityLimits) -> i32 {
    let Some(dob) = dob else {
        return UNKNOWN_AGE;
    };
    if !photo_taken.is_finite() {
        return UNKNOWN_AGE;
    }
    let year = photo_taken.trunc();
    if year <= limits.photo_year_min as f64 || year >= limits.photo_year_max as f64 {
        return UNKNOWN_AGE;
    }

    let mut age = year as i32 - dob.year();
    if (dob.month(), dob.day()) > (1, 1) {
        age -= 1;
    }

    if (0..=limits.max_age).contains(&age) {
        age
    } else {
        UNKNOWN_AGE
    }
}

/// Text field (name, path fragment)
///
/// Attempts, in order:
/// 1. join nested character codes (char array, cell-wrapped char array,
///    cell of single characters, code array inside a cell)
/// 2. stringify the first element of a contained array
/// 3. stringify the raw scalar or character
///
/// Empty results count as failures.
pub fn decode_text(raw: Option<Element<'_>>) -> Option<String> {
    let raw = raw?;
    joined_char_codes(raw)
        .or_else(|| first_contained_scalar(raw))
        .or_else(|| stringify_raw(raw))
        .filter(|s| !s.is_empty())
}

fn joined_char_codes(raw: Element<'_>) -> Option<String> {
    let Element::Array(array) = raw else {
        return None;
    };
    match array {
        MatArray::Char(chars) => chars.text(),
        MatArray::Cell(cell) => match cell.cells.first()? {
            MatArray::Char(chars) => chars.text(),
            MatArray::Cell(inner) => inner.cells.iter().map(first_char).collect(),
            MatArray::Numeric(codes) if codes.values.len() > 1 => {
                codes.values.iter().map(|&v| code_to_char(v)).collect()
            }
            _ => None,
        },
        _ => None,
    }
}

fn first_char(array: &MatArray) -> Option<char> {
    match array.element(0)? {
        Element::Char(c) => Some(c),
        Element::Scalar(v) => code_to_char(v),
        Element::Array(_) => None,
    }
}

fn first_contained_scalar(raw: Element<'_>) -> Option<String> {
    let Element::Array(array) = raw else {
        return None;
    };
    match array.element(0)? {
        Element::Scalar(v) => Some(scalar_text(v)),
        Element::Char(c) => Some(c.to_string()),
        Element::Array(_) => None,
    }
}

fn stringify_raw(raw: Element<'_>) -> Option<String> {
    match raw {
        Element::Scalar(v) => Some(scalar_text(v)),
        Element::Char(c) => Some(c.to_string()),
        Element::Array(_) => None,
    }
}

/// Face bounding box as four integers
///
/// Needs a container of at least four elements. Each component is tried as a
/// plain scalar, then a one-element container, then a container flattened to
/// a one-value list; a component that fails all three becomes 0.
pub fn decode_face_location(raw: Option<Element<'_>>) -> Option<[i64; 4]> {
    let Some(Element::Array(array)) = raw else {
        return None;
    };
    if array.len() < 4 {
        return None;
    }

    let mut coords = [0i64; 4];
    for (i, coord) in coords.iter_mut().enumerate() {
        *coord = array.element(i).and_then(box_component).unwrap_or(0);
    }
    Some(coords)
}

fn box_component(raw: Element<'_>) -> Option<i64> {
    plain_scalar(raw)
        .or_else(|| scalar_or_singleton(raw))
        .or_else(|| match raw {
            Element::Array(inner) => match inner.flatten_numbers()?.as_slice() {
                [only] => Some(*only),
                _ => None,
            },
            _ => None,
        })
        .and_then(truncate)
}

/// `x1,y1,x2,y2`
pub fn format_face_location(coords: [i64; 4]) -> String {
    coords
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Gender flag: exactly 1 is male, anything else (0, NaN, missing) is female
pub fn decode_gender(raw: Option<Element<'_>>) -> Gender {
    match raw.and_then(scalar_or_singleton) {
        Some(flag) if flag == 1.0 => Gender::Male,
        _ => Gender::Female,
    }
}

/// Identity index: a plain finite scalar, truncated; containers are rejected
pub fn decode_celeb_id(raw: Option<Element<'_>>) -> Option<i64> {
    raw.and_then(plain_scalar).and_then(truncate)
}

/// Pass-through float (capture year, detector scores); NaN when absent
pub fn decode_float(raw: Option<Element<'_>>) -> f64 {
    raw.and_then(scalar_or_singleton).unwrap_or(f64::NAN)
}

/// Partition prefix + stored path fragment
pub fn decode_path(prefix: &str, raw: Option<Element<'_>>) -> Option<String> {
    decode_text(raw).map(|fragment| format!("{}{}", prefix, fragment))
}
