//! JSON wire backend for the record writer protocol.
//!
//! Output streams directly into the document buffer as protocol calls
//! arrive; only array repetitions are buffered, because the positional
//! alignment of a repeating property's `_name` shadow array cannot be known
//! until the array closes.
//!
//! ## Wire conventions (compatibility contract)
//!
//! | Instance shape | JSON |
//! |----------------|------|
//! | bare primitive | `"active": true` |
//! | primitive with metadata | `"birthDate": "1974-12-25", "_birthDate": {"id": "bd1"}` |
//! | metadata-only primitive | `"_birthDate": {"id": "bd1"}` |
//! | repeating primitive | `"given": ["John", "Doe"]` |
//! | repeating with metadata | `"given": ["A", null], "_given": [null, {"id": "g1"}]` |
//!
//! Member order follows metadata-declared property order; the record's
//! `resourceType` discriminator is always the first member.

use meridian_model::{Complex, Extension, ModelProvider, Primitive, Value};

use crate::error::Result;
use crate::ser::{NoCustomization, Serializer};
use crate::writer::{FrameStack, RecordWriter, WriteHint};

/// Serialize an instance to a JSON string with no customization configured.
pub fn to_json_string(instance: &Complex, provider: &dyn ModelProvider) -> Result<String> {
    let bytes = to_json_vec(instance, provider)?;
    String::from_utf8(bytes).map_err(|e| crate::error::SerdeError::Custom(e.to_string()))
}

/// Serialize an instance to a JSON byte vector with no customization
/// configured.
pub fn to_json_vec(instance: &Complex, provider: &dyn ModelProvider) -> Result<Vec<u8>> {
    let serializer = Serializer::new(provider, &NoCustomization);
    let mut writer = JsonRecordWriter::new();
    serializer.serialize(instance, &mut writer)
}

/// Buffered repetitions of one repeating property.
#[derive(Default)]
struct ArrayCapture {
    /// Rendered JSON per slot; `None` is an explicit null placeholder.
    values: Vec<Option<String>>,
    /// Rendered `_name` metadata object per slot, positionally aligned.
    metas: Vec<Option<String>>,
}

impl ArrayCapture {
    fn render_into(self, name: &str, writer: &mut JsonRecordWriter) {
        let join = |slots: &[Option<String>]| {
            slots
                .iter()
                .map(|s| s.as_deref().unwrap_or("null"))
                .collect::<Vec<_>>()
                .join(",")
        };
        if self.values.iter().any(Option::is_some) {
            writer.member_key(name);
            let rendered = join(&self.values);
            let sink = writer.sink();
            sink.push(b'[');
            sink.extend_from_slice(rendered.as_bytes());
            sink.push(b']');
        }
        if self.metas.iter().any(Option::is_some) {
            writer.member_key(&format!("_{}", name));
            let rendered = join(&self.metas);
            let sink = writer.sink();
            sink.push(b'[');
            sink.extend_from_slice(rendered.as_bytes());
            sink.push(b']');
        }
    }
}

/// Streaming JSON implementation of the writer protocol.
pub struct JsonRecordWriter {
    frames: FrameStack,
    /// Output sinks; the document buffer at the bottom, one scratch sink
    /// per complex array repetition being assembled above it.
    sinks: Vec<Vec<u8>>,
    /// Need-comma flag per open JSON object.
    comma: Vec<bool>,
    /// Capture per open array frame.
    arrays: Vec<ArrayCapture>,
}

impl JsonRecordWriter {
    pub fn new() -> Self {
        Self {
            frames: FrameStack::new(),
            sinks: vec![Vec::new()],
            comma: Vec::new(),
            arrays: Vec::new(),
        }
    }

    fn sink(&mut self) -> &mut Vec<u8> {
        self.sinks.last_mut().expect("document sink present")
    }

    /// Writes `,"name":` (comma as needed) into the current object.
    fn member_key(&mut self, name: &str) {
        let quoted = json_string(name);
        let need_comma = self
            .comma
            .last_mut()
            .map(|need| std::mem::replace(need, true))
            .unwrap_or(false);
        let sink = self.sink();
        if need_comma {
            sink.push(b',');
        }
        sink.extend_from_slice(quoted.as_bytes());
        sink.push(b':');
    }
}

impl Default for JsonRecordWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordWriter for JsonRecordWriter {
    fn start_record(&mut self, type_name: &str) -> Result<()> {
        self.frames.start_record()?;
        self.sink().push(b'{');
        self.comma.push(false);
        self.member_key("resourceType");
        let quoted = json_string(type_name);
        self.sink().extend_from_slice(quoted.as_bytes());
        Ok(())
    }

    fn end_record(&mut self) -> Result<()> {
        self.frames.end_record()?;
        self.sink().push(b'}');
        self.comma.pop();
        Ok(())
    }

    fn start_property(&mut self, name: &str) -> Result<()> {
        self.frames.start_property(name)
    }

    fn end_property(&mut self) -> Result<()> {
        self.frames.end_property()
    }

    fn start_array(&mut self) -> Result<()> {
        self.frames.start_array()?;
        self.arrays.push(ArrayCapture::default());
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        self.frames.end_array()?;
        let capture = self.arrays.pop().expect("array capture present");
        let name = self
            .frames
            .property_name()
            .expect("array inside a property")
            .to_string();
        capture.render_into(&name, self);
        Ok(())
    }

    fn start_complex_content(&mut self) -> Result<()> {
        let repetition = self.frames.in_array();
        self.frames.start_complex_content()?;
        if repetition {
            self.sinks.push(Vec::new());
        } else {
            let name = self
                .frames
                .property_name()
                .expect("complex content inside a property")
                .to_string();
            self.member_key(&name);
        }
        self.sink().push(b'{');
        self.comma.push(false);
        Ok(())
    }

    fn end_complex_content(&mut self) -> Result<()> {
        self.frames.end_complex_content()?;
        self.sink().push(b'}');
        self.comma.pop();
        if self.frames.in_array() {
            let item = self.sinks.pop().expect("repetition sink present");
            let item = String::from_utf8(item).expect("writer emits UTF-8");
            let capture = self.arrays.last_mut().expect("array capture present");
            capture.values.push(Some(item));
            capture.metas.push(None);
        }
        Ok(())
    }

    fn write_primitive(&mut self, primitive: &Primitive, _hint: WriteHint) -> Result<()> {
        self.frames.write_primitive()?;
        if self.frames.in_array() {
            let capture = self.arrays.last_mut().expect("array capture present");
            capture.values.push(primitive.value.as_ref().map(render_value));
            capture.metas.push(render_meta(primitive));
            return Ok(());
        }

        let name = self
            .frames
            .property_name()
            .expect("primitive inside a property")
            .to_string();
        if let Some(value) = &primitive.value {
            let rendered = render_value(value);
            self.member_key(&name);
            self.sink().extend_from_slice(rendered.as_bytes());
        }
        if let Some(meta) = render_meta(primitive) {
            self.member_key(&format!("_{}", name));
            self.sink().extend_from_slice(meta.as_bytes());
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        self.frames.check_balanced()?;
        debug_assert_eq!(self.sinks.len(), 1);
        Ok(std::mem::take(self.sink()))
    }
}

fn json_string(s: &str) -> String {
    serde_json::to_string(s).expect("string serialization is infallible")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Boolean(b) => b.to_string(),
        // Integers and decimals are JSON numbers; the decimal keeps its
        // source precision.
        Value::Integer(i) => i.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::String(s) => json_string(s),
    }
}

/// Renders the `_name` shadow object for a primitive's id/extension
/// metadata, or `None` when the primitive is bare.
fn render_meta(primitive: &Primitive) -> Option<String> {
    if !primitive.has_metadata() {
        return None;
    }
    let mut out = String::from("{");
    let mut first = true;
    if let Some(id) = &primitive.id {
        out.push_str(&format!("\"id\":{}", json_string(id)));
        first = false;
    }
    if !primitive.extensions.is_empty() {
        if !first {
            out.push(',');
        }
        out.push_str("\"extension\":[");
        for (i, ext) in primitive.extensions.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&render_extension(ext));
        }
        out.push(']');
    }
    out.push('}');
    Some(out)
}

fn render_extension(ext: &Extension) -> String {
    let mut out = String::from("{");
    out.push_str(&format!("\"url\":{}", json_string(&ext.url)));
    if let Some(id) = &ext.id {
        out.push_str(&format!(",\"id\":{}", json_string(id)));
    }
    if let (Some(member), Some(value)) = (ext.value_member_name(), ext.value.as_ref()) {
        out.push_str(&format!(",{}:{}", json_string(&member), render_value(value)));
    }
    if !ext.extensions.is_empty() {
        out.push_str(",\"extension\":[");
        for (i, nested) in ext.extensions.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&render_extension(nested));
        }
        out.push(']');
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_primitive_member() {
        let mut w = JsonRecordWriter::new();
        w.start_record("Patient").unwrap();
        w.start_property("active").unwrap();
        w.write_primitive(&Value::Boolean(true).into(), WriteHint::None)
            .unwrap();
        w.end_property().unwrap();
        w.end_record().unwrap();
        let out = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(out, r#"{"resourceType":"Patient","active":true}"#);
    }

    #[test]
    fn test_shadow_member_for_metadata() {
        let mut w = JsonRecordWriter::new();
        w.start_record("Patient").unwrap();
        w.start_property("birthDate").unwrap();
        let prim = Primitive::new(Value::String("1974-12-25".into())).with_id("bd1");
        w.write_primitive(&prim, WriteHint::None).unwrap();
        w.end_property().unwrap();
        w.end_record().unwrap();
        let out = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            r#"{"resourceType":"Patient","birthDate":"1974-12-25","_birthDate":{"id":"bd1"}}"#
        );
    }

    #[test]
    fn test_aligned_shadow_arrays() {
        let mut w = JsonRecordWriter::new();
        w.start_record("Patient").unwrap();
        w.start_property("given").unwrap();
        w.start_array().unwrap();
        w.write_primitive(&Value::String("Alice".into()).into(), WriteHint::None)
            .unwrap();
        let tagged = Primitive::new(Value::String("Marie".into())).with_id("g1");
        w.write_primitive(&tagged, WriteHint::None).unwrap();
        w.end_array().unwrap();
        w.end_property().unwrap();
        w.end_record().unwrap();
        let out = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            r#"{"resourceType":"Patient","given":["Alice","Marie"],"_given":[null,{"id":"g1"}]}"#
        );
    }

    #[test]
    fn test_metadata_only_slot_uses_null_value_placeholder() {
        let mut w = JsonRecordWriter::new();
        w.start_record("Patient").unwrap();
        w.start_property("given").unwrap();
        w.start_array().unwrap();
        w.write_primitive(&Value::String("A".into()).into(), WriteHint::None)
            .unwrap();
        let meta_only = Primitive {
            value: None,
            id: Some("g2".into()),
            extensions: Vec::new(),
        };
        w.write_primitive(&meta_only, WriteHint::None).unwrap();
        w.end_array().unwrap();
        w.end_property().unwrap();
        w.end_record().unwrap();
        let out = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            r#"{"resourceType":"Patient","given":["A",null],"_given":[null,{"id":"g2"}]}"#
        );
    }

    #[test]
    fn test_complex_repetitions() {
        let mut w = JsonRecordWriter::new();
        w.start_record("Patient").unwrap();
        w.start_property("name").unwrap();
        w.start_array().unwrap();
        w.start_complex_content().unwrap();
        w.start_property("family").unwrap();
        w.write_primitive(&Value::String("Kramer".into()).into(), WriteHint::None)
            .unwrap();
        w.end_property().unwrap();
        w.end_complex_content().unwrap();
        w.end_array().unwrap();
        w.end_property().unwrap();
        w.end_record().unwrap();
        let out = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            r#"{"resourceType":"Patient","name":[{"family":"Kramer"}]}"#
        );
    }

    #[test]
    fn test_extension_rendering() {
        let prim = Primitive::new(Value::String("x".into())).with_extension(
            Extension::new("http://example.org/flag").with_value(Value::Boolean(true)),
        );
        let meta = render_meta(&prim).unwrap();
        assert_eq!(
            meta,
            r#"{"extension":[{"url":"http://example.org/flag","valueBoolean":true}]}"#
        );
    }

    #[test]
    fn test_unbalanced_document_is_protocol_error() {
        let mut w = JsonRecordWriter::new();
        w.start_record("Patient").unwrap();
        w.start_property("name").unwrap();
        w.start_complex_content().unwrap();
        assert!(matches!(
            w.finish(),
            Err(crate::error::SerdeError::Protocol(_))
        ));
    }
}
