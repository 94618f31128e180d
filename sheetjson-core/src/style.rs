//! Partially specified cell style with override cascading
//!
//! A [`Style`] only carries the fields somebody asked for. Styles are
//! combined with [`Style::merge`], where every field present in the nearer
//! style replaces the inherited one and absent fields pass through. A style
//! with nothing set means "no styling" and is normalised to `None` before it
//! reaches a sink.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Horizontal cell alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl FromStr for Alignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Alignment::Left),
            "center" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => Err(Error::UnsupportedAlignment(other.to_string())),
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        };
        f.write_str(name)
    }
}

/// Immutable visual style; structural equality makes it usable as a cache key
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub alignment: Option<Alignment>,
    /// Font height in points
    pub font_height: Option<u16>,
    pub font_weight_bold: Option<bool>,
    /// Font color as RRGGBB / AARRGGBB hex
    pub color: Option<String>,
    /// Solid background fill as RRGGBB / AARRGGBB hex
    pub fill_color: Option<String>,
    /// Column width in character units
    pub width: Option<u16>,
}

impl Style {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        *self == Style::default()
    }

    /// `None` for an empty style, the style itself otherwise
    pub fn non_empty(self) -> Option<Style> {
        if self.is_empty() { None } else { Some(self) }
    }

    /// Layer `overlay` on top of `base`: present overlay fields win
    pub fn merge(base: &Style, overlay: &Style) -> Style {
        Style {
            alignment: overlay.alignment.or(base.alignment),
            font_height: overlay.font_height.or(base.font_height),
            font_weight_bold: overlay.font_weight_bold.or(base.font_weight_bold),
            color: overlay.color.clone().or_else(|| base.color.clone()),
            fill_color: overlay.fill_color.clone().or_else(|| base.fill_color.clone()),
            width: overlay.width.or(base.width),
        }
    }

    /// Resolve the effective style of a nested object against what it inherits
    pub fn cascade(inherited: Option<&Style>, own: &Style) -> Option<Style> {
        match inherited {
            Some(base) => Style::merge(base, own).non_empty(),
            None => own.clone().non_empty(),
        }
    }

    /// Read the style fields carried by a JSON object
    ///
    /// Fields of the wrong JSON type are treated as absent. An alignment
    /// string outside the supported set is an error.
    pub fn from_json(object: &Map<String, Value>) -> Result<Style> {
        let alignment = match object.get("alignment").and_then(Value::as_str) {
            Some(name) => Some(name.parse::<Alignment>()?),
            None => None,
        };

        Ok(Style {
            alignment,
            font_height: non_negative(object.get("fontHeight")),
            font_weight_bold: object.get("fontWeightBold").and_then(Value::as_bool),
            color: object
                .get("color")
                .and_then(Value::as_str)
                .map(str::to_string),
            fill_color: object
                .get("fillColor")
                .and_then(Value::as_str)
                .map(str::to_string),
            width: non_negative(object.get("width")),
        })
    }
}

fn non_negative(value: Option<&Value>) -> Option<u16> {
    value
        .and_then(Value::as_u64)
        .and_then(|n| u16::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_override_precedence() {
        let inherited = Style {
            alignment: Some(Alignment::Center),
            font_height: Some(10),
            ..Style::default()
        };
        let own = Style::from_json(&object(json!({ "fontHeight": 12 }))).unwrap();

        assert_eq!(
            Style::merge(&inherited, &own),
            Style {
                alignment: Some(Alignment::Center),
                font_height: Some(12),
                ..Style::default()
            }
        );
    }

    #[test]
    fn test_empty_style_is_identity() {
        let inherited = Style {
            alignment: Some(Alignment::Right),
            font_weight_bold: Some(true),
            fill_color: Some("FFEEDD".to_string()),
            ..Style::default()
        };

        assert_eq!(Style::merge(&inherited, &Style::default()), inherited);
        assert_eq!(
            Style::cascade(Some(&inherited), &Style::default()),
            Some(inherited)
        );
        assert_eq!(Style::cascade(None, &Style::default()), None);
    }

    #[test]
    fn test_from_json_reads_all_fields() {
        let style = Style::from_json(&object(json!({
            "value": "x",
            "alignment": "left",
            "fontHeight": 14,
            "fontWeightBold": false,
            "color": "FF0000",
            "fillColor": "#00FF00",
            "width": 30
        })))
        .unwrap();

        assert_eq!(style.alignment, Some(Alignment::Left));
        assert_eq!(style.font_height, Some(14));
        assert_eq!(style.font_weight_bold, Some(false));
        assert_eq!(style.color.as_deref(), Some("FF0000"));
        assert_eq!(style.fill_color.as_deref(), Some("#00FF00"));
        assert_eq!(style.width, Some(30));
    }

    #[test]
    fn test_from_json_ignores_mistyped_fields() {
        let style = Style::from_json(&object(json!({
            "fontHeight": -3,
            "width": "wide",
            "fontWeightBold": "yes",
            "color": 7
        })))
        .unwrap();

        assert!(style.is_empty());
    }

    #[test]
    fn test_unsupported_alignment() {
        let result = Style::from_json(&object(json!({ "alignment": "justify" })));
        assert!(matches!(result, Err(Error::UnsupportedAlignment(name)) if name == "justify"));
    }

    #[test]
    fn test_structural_equality() {
        let a = Style {
            color: Some("112233".to_string()),
            ..Style::default()
        };
        let b = Style::merge(&Style::default(), &a);
        assert_eq!(a, b);

        let mut cache = std::collections::HashMap::new();
        cache.insert(a, 1);
        assert_eq!(cache.get(&b), Some(&1));
    }
}
