//! Scalar type autodetection for formatted cell text

/// A cell value after type detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(&'a str),
}

type Detector = for<'a> fn(&'a str) -> Option<Scalar<'a>>;

/// Candidates in the order they are tried; text is the catch-all
const DETECTORS: [Detector; 3] = [try_integer, try_float, try_boolean];

/// Detect the most specific scalar type of a formatted value
pub fn detect(value: &str) -> Scalar<'_> {
    DETECTORS
        .iter()
        .find_map(|detector| detector(value))
        .unwrap_or(Scalar::Text(value))
}

/// Wrap a value as text without detection
pub fn text(value: &str) -> Scalar<'_> {
    Scalar::Text(value)
}

fn try_integer(value: &str) -> Option<Scalar<'_>> {
    value.parse::<i64>().ok().map(Scalar::Integer)
}

fn try_float(value: &str) -> Option<Scalar<'_>> {
    // JSON has no representation for NaN or infinities
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Scalar::Float)
}

fn try_boolean(value: &str) -> Option<Scalar<'_>> {
    match value {
        "true" => Some(Scalar::Boolean(true)),
        "false" => Some(Scalar::Boolean(false)),
        _ => None,
    }
}
