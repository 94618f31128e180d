//! JSON document -> spreadsheet sink calls
//!
//! The document is pulled from the reader with serde_json. The root object
//! and its `sheets` array are streamed; each sheet object is materialised as
//! a [`Value`] while it is written, so only one sheet is held in memory.

use crate::error::{Error, Result};
use crate::style::Style;
use crate::writer::{ColumnValue, ImageRequest, SheetSink};
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use std::fmt;
use std::io::{BufReader, Read};

/// Translate a JSON document into calls on `sink`, returning the number of
/// sheets written
///
/// Entries of unexpected shape (a non-object sheet, row or image, a
/// non-array `sheets`) are skipped. Sink failures abort the pass and are
/// returned unchanged.
pub fn translate<R: Read, S: SheetSink + ?Sized>(reader: R, sink: &mut S) -> Result<usize> {
    let mut translation = Translation {
        sink,
        failure: None,
        sheets: 0,
    };
    let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(reader));
    let outcome = Document(&mut translation).deserialize(&mut deserializer);

    if let Some(failure) = translation.failure.take() {
        return Err(failure);
    }
    outcome?;
    deserializer.end()?;
    Ok(translation.sheets)
}

/// Write one sheet object
pub fn write_sheet<S: SheetSink + ?Sized>(sink: &mut S, sheet: &Value) -> Result<()> {
    let Some(sheet) = sheet.as_object() else {
        log::debug!("Skipping sheet entry that is not an object");
        return Ok(());
    };

    let name = sheet.get("name").and_then(Value::as_str).unwrap_or("");
    let selected = flag(sheet, "selected");
    let active = flag(sheet, "active");
    let style = Style::from_json(sheet)?.non_empty();

    sink.start_sheet(name, style.as_ref(), selected, active)?;

    for row in entries(sheet, "rows") {
        sink.add_row()?;
        for (column, value) in row {
            write_cell(sink, column, value, style.as_ref())?;
        }
    }

    for image in entries(sheet, "images") {
        sink.add_image(image_request(image)?)?;
    }

    if let Some(area) = sheet.get("printArea").and_then(Value::as_str) {
        sink.set_print_area(area)?;
    }

    sink.end_sheet()
}

/// Resolve a cell value against the style it inherits and hand it to the sink
pub fn write_cell<S: SheetSink + ?Sized>(
    sink: &mut S,
    column: &str,
    value: &Value,
    inherited: Option<&Style>,
) -> Result<()> {
    match value {
        Value::Null => sink.add_column(column, ColumnValue::Null, inherited),
        Value::Bool(b) => sink.add_column(column, ColumnValue::Boolean(*b), inherited),
        Value::Number(n) => sink.add_column(column, ColumnValue::Number(n), inherited),
        Value::String(s) => sink.add_column(column, ColumnValue::String(s), inherited),
        Value::Array(_) => {
            log::debug!("Column '{}' holds an array, written as null", column);
            sink.add_column(column, ColumnValue::Null, inherited)
        }
        Value::Object(wrapper) => {
            let own = Style::from_json(wrapper)?;
            let style = Style::cascade(inherited, &own);
            let inner = wrapper.get("value").unwrap_or(&Value::Null);

            match inner {
                Value::String(formula) if flag(wrapper, "formula") => {
                    sink.add_column(column, ColumnValue::Formula(formula), style.as_ref())?
                }
                _ => write_cell(sink, column, inner, style.as_ref())?,
            }

            if let Some(count) = wrapper.get("columns").and_then(Value::as_u64) {
                if count > 1 {
                    sink.merge_columns(u16::try_from(count).unwrap_or(u16::MAX))?;
                }
            }
            Ok(())
        }
    }
}

fn image_request(image: &Map<String, Value>) -> Result<ImageRequest> {
    let text = |key: &str| {
        image
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(ImageRequest {
        reference: text("reference"),
        url: text("url"),
        image_type: text("type").parse()?,
        scale: image.get("scale").and_then(Value::as_f64).unwrap_or(1.0),
    })
}

fn flag(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Object entries of the array under `key`, anything else skipped
fn entries<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> + 'a {
    object
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

struct Translation<'s, S: ?Sized> {
    sink: &'s mut S,
    /// The sink error that aborted the pass, if any
    failure: Option<Error>,
    sheets: usize,
}

impl<S: SheetSink + ?Sized> Translation<'_, S> {
    fn sheet<E: de::Error>(&mut self, sheet: &Value) -> std::result::Result<(), E> {
        match write_sheet(&mut *self.sink, sheet) {
            Ok(()) => {
                if sheet.is_object() {
                    self.sheets += 1;
                }
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.failure = Some(e);
                Err(E::custom(message))
            }
        }
    }
}

/// Scalars where a container was expected are skipped
macro_rules! skip_scalars {
    () => {
        fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<(), E> {
            Ok(())
        }
        fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<(), E> {
            Ok(())
        }
        fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<(), E> {
            Ok(())
        }
        fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<(), E> {
            Ok(())
        }
        fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<(), E> {
            Ok(())
        }
        fn visit_unit<E: de::Error>(self) -> std::result::Result<(), E> {
            Ok(())
        }
    };
}

/// The root value; only its `sheets` member is read
struct Document<'t, 's, S: ?Sized>(&'t mut Translation<'s, S>);

impl<'de, S: SheetSink + ?Sized> DeserializeSeed<'de> for Document<'_, '_, S> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, S: SheetSink + ?Sized> Visitor<'de> for Document<'_, '_, S> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object with a sheets array")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == "sheets" {
                map.next_value_seed(Sheets(&mut *self.0))?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(())
    }

    skip_scalars!();
}

/// The `sheets` array, written one element at a time
struct Sheets<'t, 's, S: ?Sized>(&'t mut Translation<'s, S>);

impl<'de, S: SheetSink + ?Sized> DeserializeSeed<'de> for Sheets<'_, '_, S> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, S: SheetSink + ?Sized> Visitor<'de> for Sheets<'_, '_, S> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of sheet objects")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        while let Some(sheet) = seq.next_element::<Value>()? {
            self.0.sheet(&sheet)?;
        }
        Ok(())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(())
    }

    skip_scalars!();
}
