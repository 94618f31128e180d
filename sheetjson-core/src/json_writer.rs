//! Incremental JSON writer driven token by token
//!
//! Layout (compact or indented) is delegated to a serde_json
//! [`Formatter`]; scalars and keys are serialized with serde_json so
//! escaping and number formatting match the rest of the ecosystem.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use std::io::Write;

#[derive(Debug, Clone, Copy)]
enum Container {
    Object { first: bool },
    Array { first: bool },
}

/// Streaming JSON writer with an explicit container stack
pub struct JsonWriter<W: Write, F: Formatter = CompactFormatter> {
    writer: W,
    formatter: F,
    stack: Vec<Container>,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_formatter(writer, CompactFormatter)
    }
}

impl<W: Write> JsonWriter<W, PrettyFormatter<'static>> {
    pub fn pretty(writer: W) -> Self {
        Self::with_formatter(writer, PrettyFormatter::new())
    }
}

impl<W: Write, F: Formatter> JsonWriter<W, F> {
    pub fn with_formatter(writer: W, formatter: F) -> Self {
        Self {
            writer,
            formatter,
            stack: Vec::new(),
        }
    }

    /// Number of open containers
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Open an object in value position (root or array element)
    pub fn begin_object(&mut self) -> Result<()> {
        self.begin_value()?;
        self.formatter.begin_object(&mut self.writer)?;
        self.stack.push(Container::Object { first: true });
        Ok(())
    }

    /// Open an array in value position (root or array element)
    pub fn begin_array(&mut self) -> Result<()> {
        self.begin_value()?;
        self.formatter.begin_array(&mut self.writer)?;
        self.stack.push(Container::Array { first: true });
        Ok(())
    }

    /// Open an object as a member of the current object
    pub fn begin_object_field(&mut self, key: &str) -> Result<()> {
        self.key(key)?;
        self.formatter.begin_object(&mut self.writer)?;
        self.stack.push(Container::Object { first: true });
        Ok(())
    }

    /// Open an array as a member of the current object
    pub fn begin_array_field(&mut self, key: &str) -> Result<()> {
        self.key(key)?;
        self.formatter.begin_array(&mut self.writer)?;
        self.stack.push(Container::Array { first: true });
        Ok(())
    }

    /// Write a scalar member of the current object
    pub fn field<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        self.key(key)?;
        serde_json::to_writer(&mut self.writer, value)?;
        self.end_value()
    }

    /// Close the innermost open container
    pub fn end(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Container::Object { .. }) => self.formatter.end_object(&mut self.writer)?,
            Some(Container::Array { .. }) => self.formatter.end_array(&mut self.writer)?,
            None => return Err(Error::SinkState("no open JSON container to close")),
        }
        self.end_value()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        if !self.stack.is_empty() {
            return Err(Error::SinkState("JSON document has unclosed containers"));
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn key(&mut self, key: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(Container::Object { first }) => {
                self.formatter.begin_object_key(&mut self.writer, *first)?;
                *first = false;
            }
            _ => return Err(Error::SinkState("JSON field written outside of an object")),
        }
        serde_json::to_writer(&mut self.writer, key)?;
        self.formatter.end_object_key(&mut self.writer)?;
        self.formatter.begin_object_value(&mut self.writer)?;
        Ok(())
    }

    fn begin_value(&mut self) -> Result<()> {
        match self.stack.last_mut() {
            Some(Container::Array { first }) => {
                self.formatter.begin_array_value(&mut self.writer, *first)?;
                *first = false;
                Ok(())
            }
            Some(Container::Object { .. }) => {
                Err(Error::SinkState("JSON value written without a key"))
            }
            None => Ok(()),
        }
    }

    fn end_value(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(Container::Array { .. }) => self.formatter.end_array_value(&mut self.writer)?,
            Some(Container::Object { .. }) => self.formatter.end_object_value(&mut self.writer)?,
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn write_sample<F: Formatter>(json: &mut JsonWriter<&mut Vec<u8>, F>) -> Result<()> {
        json.begin_object()?;
        json.begin_array_field("sheets")?;
        json.begin_object()?;
        json.field("name", "Sheet \"1\"")?;
        json.begin_object_field("content")?;
        json.begin_array_field("rows")?;
        json.begin_object()?;
        json.end()?;
        json.begin_object()?;
        json.field("A", &42)?;
        json.field("B", &true)?;
        json.end()?;
        json.end()?;
        json.end()?;
        json.end()?;
        json.end()?;
        json.end()
    }

    #[test]
    fn test_compact_output() {
        let mut buffer = Vec::new();
        let mut json = JsonWriter::new(&mut buffer);
        write_sample(&mut json).unwrap();
        assert_eq!(json.depth(), 0);
        json.into_inner().unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            r#"{"sheets":[{"name":"Sheet \"1\"","content":{"rows":[{},{"A":42,"B":true}]}}]}"#
        );
    }

    #[test]
    fn test_pretty_output_is_equivalent() {
        let mut buffer = Vec::new();
        let mut json = JsonWriter::pretty(&mut buffer);
        write_sample(&mut json).unwrap();
        json.into_inner().unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains('\n'));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({ "sheets": [{ "name": "Sheet \"1\"", "content": { "rows": [{}, { "A": 42, "B": true }] } }] })
        );
    }

    #[test]
    fn test_misuse_is_reported() {
        let mut buffer = Vec::new();
        let mut json = JsonWriter::new(&mut buffer);
        assert!(json.field("a", &1).is_err());
        assert!(json.end().is_err());

        json.begin_array().unwrap();
        assert!(json.begin_object_field("x").is_err());
        assert!(json.into_inner().is_err());
    }
}
