//! XML wire backend for the record writer protocol.
//!
//! The writer streams quick-xml events with minimal buffering: an element's
//! start tag stays pending until its first child arrives, so that
//! attribute-hinted primitives written inside the element (by default
//! emission or by a customization hook) still land as attributes.
//!
//! ## Wire conventions (compatibility contract)
//!
//! | Instance shape | XML |
//! |----------------|-----|
//! | primitive property | `<active value="true"/>` |
//! | primitive with metadata | `<birthDate id="bd1" value="1974-12-25"/>` |
//! | primitive with extensions | `<birthDate value="..."><extension url="...">...</extension></birthDate>` |
//! | attribute-hinted primitive | `url="http://..."` on the enclosing element |
//! | attribute-hinted with metadata | attribute plus a companion element adjacent to the data |
//! | text-hinted primitive | character data inside the property element |
//! | complex property | `<name>...</name>` |
//! | repeating property | repeated sibling elements |
//!
//! The record root element carries the namespace declaration.

pub mod utils;

use meridian_model::{Complex, Extension, ModelProvider, Primitive, Value};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Result, SerdeError};
use crate::ser::{NoCustomization, Serializer};
use crate::writer::{FrameStack, RecordWriter, WriteHint};

/// Serialize an instance to an XML string with no customization configured.
pub fn to_xml_string(instance: &Complex, provider: &dyn ModelProvider) -> Result<String> {
    let bytes = to_xml_vec(instance, provider)?;
    String::from_utf8(bytes).map_err(|e| SerdeError::Custom(e.to_string()))
}

/// Serialize an instance to an XML byte vector with no customization
/// configured.
pub fn to_xml_vec(instance: &Complex, provider: &dyn ModelProvider) -> Result<Vec<u8>> {
    let serializer = Serializer::new(provider, &NoCustomization);
    let mut writer = XmlRecordWriter::new();
    serializer.serialize(instance, &mut writer)
}

/// Metadata escape for an attribute-hinted primitive: a companion element
/// adjacent to the attribute data, since an attribute cannot carry
/// substructure.
struct Companion {
    name: String,
    id: Option<String>,
    extensions: Vec<Extension>,
}

/// An element whose start tag has not been flushed yet and can still
/// receive attributes.
struct PendingElement {
    name: String,
    attrs: Vec<(String, String)>,
    companions: Vec<Companion>,
    text: Option<String>,
    extensions: Vec<Extension>,
}

impl PendingElement {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            companions: Vec::new(),
            text: None,
            extensions: Vec::new(),
        }
    }
}

/// Per-frame element state.
enum Entry {
    Pending(PendingElement),
    Open { name: String },
    /// Attribute-hinted property: nothing of its own to emit.
    Suppressed,
    /// Repeating property: repetitions emit their own elements.
    ArrayMode,
    /// Complex element already closed; awaiting its property pop.
    Closed,
}

/// Streaming XML implementation of the writer protocol.
pub struct XmlRecordWriter {
    frames: FrameStack,
    writer: Writer<Vec<u8>>,
    stack: Vec<Entry>,
}

impl XmlRecordWriter {
    pub fn new() -> Self {
        Self {
            frames: FrameStack::new(),
            writer: Writer::new(Vec::new()),
            stack: Vec::new(),
        }
    }

    /// Flushes the start tags of entries `[0, end)` that are still pending,
    /// outermost first, writing each element's companion metadata right
    /// after its start tag.
    fn flush_pending(&mut self, end: usize) -> Result<()> {
        for i in 0..end {
            if let Entry::Pending(_) = self.stack[i] {
                let Entry::Pending(pending) =
                    std::mem::replace(&mut self.stack[i], Entry::Closed)
                else {
                    unreachable!()
                };
                let mut start = BytesStart::new(pending.name.clone());
                for (key, value) in &pending.attrs {
                    start.push_attribute((key.as_str(), value.as_str()));
                }
                self.writer.write_event(Event::Start(start))?;
                for companion in &pending.companions {
                    Self::emit_companion(&mut self.writer, companion)?;
                }
                self.stack[i] = Entry::Open { name: pending.name };
            }
        }
        Ok(())
    }

    /// Emits a fully-known element (a resolved primitive property or an
    /// array repetition) into the current container.
    fn emit_element(&mut self, element: PendingElement) -> Result<()> {
        self.flush_pending(self.stack.len())?;
        Self::write_element(&mut self.writer, element)
    }

    fn write_element(writer: &mut Writer<Vec<u8>>, element: PendingElement) -> Result<()> {
        let mut start = BytesStart::new(element.name.clone());
        for (key, value) in &element.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if element.text.is_none() && element.extensions.is_empty() && element.companions.is_empty()
        {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }
        writer.write_event(Event::Start(start))?;
        for companion in &element.companions {
            Self::emit_companion(writer, companion)?;
        }
        if let Some(text) = &element.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for ext in &element.extensions {
            Self::emit_extension(writer, ext)?;
        }
        writer.write_event(Event::End(BytesEnd::new(element.name)))?;
        Ok(())
    }

    fn emit_companion(writer: &mut Writer<Vec<u8>>, companion: &Companion) -> Result<()> {
        let mut element = PendingElement::new(&companion.name);
        if let Some(id) = &companion.id {
            element.attrs.push(("id".to_string(), id.clone()));
        }
        element.extensions = companion.extensions.clone();
        Self::write_element(writer, element)
    }

    fn emit_extension(writer: &mut Writer<Vec<u8>>, ext: &Extension) -> Result<()> {
        let mut start = BytesStart::new("extension");
        start.push_attribute(("url", ext.url.as_str()));
        if let Some(id) = &ext.id {
            start.push_attribute(("id", id.as_str()));
        }
        if ext.value.is_none() && ext.extensions.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }
        writer.write_event(Event::Start(start))?;
        if let (Some(member), Some(value)) = (ext.value_member_name(), ext.value.as_ref()) {
            let mut value_element = BytesStart::new(member);
            value_element.push_attribute(("value", wire_text(value).as_str()));
            writer.write_event(Event::Empty(value_element))?;
        }
        for nested in &ext.extensions {
            Self::emit_extension(writer, nested)?;
        }
        writer.write_event(Event::End(BytesEnd::new("extension")))?;
        Ok(())
    }

    /// Builds the element for a primitive: id and value attributes first,
    /// extensions as children.
    fn primitive_element(name: &str, primitive: &Primitive) -> PendingElement {
        let mut element = PendingElement::new(name);
        if let Some(id) = &primitive.id {
            element.attrs.push(("id".to_string(), id.clone()));
        }
        if let Some(value) = &primitive.value {
            element.attrs.push(("value".to_string(), wire_text(value)));
        }
        element.extensions = primitive.extensions.clone();
        element
    }

    /// Attaches an attribute-hinted primitive to the nearest enclosing
    /// element that can still take attributes.
    fn attach_attribute(&mut self, name: &str, primitive: &Primitive) -> Result<()> {
        // Skip the suppressed property entry on top.
        let last = self.stack.len() - 1;
        let host = self.stack[..last]
            .iter_mut()
            .rev()
            .find(|e| !matches!(e, Entry::Suppressed | Entry::ArrayMode));
        match host {
            Some(Entry::Pending(pending)) => {
                if let Some(value) = &primitive.value {
                    pending.attrs.push((name.to_string(), wire_text(value)));
                }
                if primitive.has_metadata() {
                    pending.companions.push(Companion {
                        name: name.to_string(),
                        id: primitive.id.clone(),
                        extensions: primitive.extensions.clone(),
                    });
                }
                Ok(())
            }
            _ => Err(SerdeError::Protocol(format!(
                "attribute-hinted primitive '{}' after enclosing element content",
                name
            ))),
        }
    }
}

impl Default for XmlRecordWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordWriter for XmlRecordWriter {
    fn start_record(&mut self, type_name: &str) -> Result<()> {
        self.frames.start_record()?;
        let mut root = PendingElement::new(type_name);
        root.attrs
            .push(("xmlns".to_string(), utils::RECORD_NAMESPACE.to_string()));
        self.stack.push(Entry::Pending(root));
        Ok(())
    }

    fn end_record(&mut self) -> Result<()> {
        self.frames.end_record()?;
        match self.stack.pop() {
            Some(Entry::Pending(pending)) => Self::write_element(&mut self.writer, pending),
            Some(Entry::Open { name }) => {
                self.writer.write_event(Event::End(BytesEnd::new(name)))?;
                Ok(())
            }
            _ => Err(SerdeError::Protocol("record element missing".to_string())),
        }
    }

    fn start_property(&mut self, name: &str) -> Result<()> {
        self.frames.start_property(name)?;
        self.stack.push(Entry::Pending(PendingElement::new(name)));
        Ok(())
    }

    fn end_property(&mut self) -> Result<()> {
        self.frames.end_property()?;
        match self.stack.pop() {
            // A primitive-resolved property emits its element on pop.
            Some(Entry::Pending(pending)) => self.emit_element(pending),
            Some(Entry::Suppressed) | Some(Entry::ArrayMode) | Some(Entry::Closed) => Ok(()),
            Some(Entry::Open { .. }) | None => {
                Err(SerdeError::Protocol("property element missing".to_string()))
            }
        }
    }

    fn start_array(&mut self) -> Result<()> {
        self.frames.start_array()?;
        // Repetitions each render their own element named after the
        // property; the tentative property element is not needed.
        *self.stack.last_mut().expect("property entry present") = Entry::ArrayMode;
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        self.frames.end_array()
    }

    fn start_complex_content(&mut self) -> Result<()> {
        let repetition = self.frames.in_array();
        self.frames.start_complex_content()?;
        if repetition {
            let name = self
                .frames
                .property_name()
                .expect("array inside a property")
                .to_string();
            self.stack.push(Entry::Pending(PendingElement::new(&name)));
        }
        // Otherwise the property's own pending element is the container;
        // hooks may still add attributes to it before the first child.
        Ok(())
    }

    fn end_complex_content(&mut self) -> Result<()> {
        self.frames.end_complex_content()?;
        if self.frames.in_array() {
            match self.stack.pop() {
                Some(Entry::Pending(pending)) => return self.emit_element(pending),
                Some(Entry::Open { name }) => {
                    self.writer.write_event(Event::End(BytesEnd::new(name)))?;
                    return Ok(());
                }
                _ => {
                    return Err(SerdeError::Protocol(
                        "complex repetition element missing".to_string(),
                    ));
                }
            }
        }
        match self.stack.last_mut() {
            Some(entry @ Entry::Pending(_)) => {
                // Empty complex content: the element never got children.
                let Entry::Pending(pending) = std::mem::replace(entry, Entry::Closed) else {
                    unreachable!()
                };
                self.emit_element(pending)
            }
            Some(entry @ Entry::Open { .. }) => {
                let Entry::Open { name } = std::mem::replace(entry, Entry::Closed) else {
                    unreachable!()
                };
                self.writer.write_event(Event::End(BytesEnd::new(name)))?;
                Ok(())
            }
            _ => Err(SerdeError::Protocol(
                "complex content element missing".to_string(),
            )),
        }
    }

    fn write_primitive(&mut self, primitive: &Primitive, hint: WriteHint) -> Result<()> {
        self.frames.write_primitive()?;

        if self.frames.in_array() {
            let name = self
                .frames
                .property_name()
                .expect("array inside a property")
                .to_string();
            let element = Self::primitive_element(&name, primitive);
            return self.emit_element(element);
        }

        let name = self
            .frames
            .property_name()
            .expect("primitive inside a property")
            .to_string();
        match hint {
            WriteHint::Attribute => {
                *self.stack.last_mut().expect("property entry present") = Entry::Suppressed;
                self.attach_attribute(&name, primitive)
            }
            WriteHint::Text => {
                let Some(Entry::Pending(pending)) = self.stack.last_mut() else {
                    return Err(SerdeError::Protocol(
                        "text-hinted primitive without pending element".to_string(),
                    ));
                };
                if let Some(id) = &primitive.id {
                    pending.attrs.push(("id".to_string(), id.clone()));
                }
                pending.text = primitive.value.as_ref().map(wire_text);
                pending.extensions = primitive.extensions.clone();
                Ok(())
            }
            WriteHint::None => {
                let Some(Entry::Pending(pending)) = self.stack.last_mut() else {
                    return Err(SerdeError::Protocol(
                        "primitive without pending element".to_string(),
                    ));
                };
                if let Some(id) = &primitive.id {
                    pending.attrs.push(("id".to_string(), id.clone()));
                }
                if let Some(value) = &primitive.value {
                    pending.attrs.push(("value".to_string(), wire_text(value)));
                }
                pending.extensions = primitive.extensions.clone();
                Ok(())
            }
        }
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        self.frames.check_balanced()?;
        Ok(std::mem::take(self.writer.get_mut()))
    }
}

fn wire_text(value: &Value) -> String {
    match value {
        Value::Boolean(b) => utils::bool_to_string(*b).to_string(),
        other => other.as_wire_text(),
    }
}
