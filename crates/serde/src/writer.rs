//! The property-oriented writer protocol shared by both wire backends.
//!
//! The serialization engine drives a [`RecordWriter`] through a fixed call
//! grammar; the [`FrameStack`] enforces it identically for every backend:
//!
//! ```text
//! record   := start_record property* end_record
//! property := start_property content end_property
//! content  := primitive | complex | array
//! complex  := start_complex_content property* end_complex_content
//! array    := start_array (primitive+ | complex+) end_array
//! ```
//!
//! Frames are pushed and popped in strict LIFO order, and a property frame
//! resolves as exactly one of primitive- or complex-valued before it pops.
//! A violation anywhere is fatal for the whole document.

use meridian_model::Primitive;

use crate::error::{Result, SerdeError};

/// Placement hint for a primitive on the XML wire (JSON ignores it).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteHint {
    /// Child element named after the property, scalar in a `value`
    /// attribute.
    None,
    /// Attribute named after the property on the enclosing element.
    Attribute,
    /// Character data of the enclosing element.
    Text,
}

/// Wire-format-agnostic output protocol for one record document.
///
/// A writer instance serializes exactly one document; [`finish`] yields the
/// bytes and must observe a balanced, empty frame stack.
///
/// [`finish`]: RecordWriter::finish
pub trait RecordWriter {
    fn start_record(&mut self, type_name: &str) -> Result<()>;
    fn end_record(&mut self) -> Result<()>;

    fn start_property(&mut self, name: &str) -> Result<()>;
    fn end_property(&mut self) -> Result<()>;

    /// Brackets the repetitions of a repeating property.
    fn start_array(&mut self) -> Result<()>;
    fn end_array(&mut self) -> Result<()>;

    fn start_complex_content(&mut self) -> Result<()>;
    fn end_complex_content(&mut self) -> Result<()>;

    /// Writes a primitive (value plus any id/extension metadata) as the
    /// current property's content, or as one repetition inside an array.
    fn write_primitive(&mut self, primitive: &Primitive, hint: WriteHint) -> Result<()>;

    /// Ends the document and yields its bytes.
    fn finish(&mut self) -> Result<Vec<u8>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolution {
    Unresolved,
    Primitive,
    Complex,
}

#[derive(Debug)]
enum Frame {
    Record,
    Property { name: String, resolution: Resolution },
    Array { resolution: Resolution },
    Complex,
}

/// Nesting-state machine backing every [`RecordWriter`] implementation.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    fn violation(&self, msg: &str) -> SerdeError {
        SerdeError::Protocol(msg.to_string())
    }

    pub fn start_record(&mut self) -> Result<()> {
        if !self.frames.is_empty() {
            return Err(self.violation("record must be the outermost frame"));
        }
        self.frames.push(Frame::Record);
        Ok(())
    }

    pub fn end_record(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Record) if self.frames.len() == 1 => {
                self.frames.pop();
                Ok(())
            }
            _ => Err(self.violation("end_record outside an open record")),
        }
    }

    pub fn start_property(&mut self, name: &str) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Record) | Some(Frame::Complex) => {
                self.frames.push(Frame::Property {
                    name: name.to_string(),
                    resolution: Resolution::Unresolved,
                });
                Ok(())
            }
            _ => Err(self.violation("start_property outside record or complex content")),
        }
    }

    pub fn end_property(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Property { resolution, .. }) => {
                if *resolution == Resolution::Unresolved {
                    return Err(
                        self.violation("property popped before resolving primitive or complex")
                    );
                }
                self.frames.pop();
                Ok(())
            }
            _ => Err(self.violation("end_property without an open property")),
        }
    }

    pub fn start_array(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Property {
                resolution: Resolution::Unresolved,
                ..
            }) => {
                self.frames.push(Frame::Array {
                    resolution: Resolution::Unresolved,
                });
                Ok(())
            }
            _ => Err(self.violation("start_array outside an unresolved property")),
        }
    }

    pub fn end_array(&mut self) -> Result<()> {
        let resolution = match self.frames.last() {
            Some(Frame::Array { resolution }) => *resolution,
            _ => return Err(self.violation("end_array without an open array")),
        };
        if resolution == Resolution::Unresolved {
            return Err(self.violation("array closed without any repetition"));
        }
        self.frames.pop();
        match self.frames.last_mut() {
            Some(Frame::Property { resolution: r, .. }) => {
                *r = resolution;
                Ok(())
            }
            _ => Err(self.violation("array frame not inside a property")),
        }
    }

    pub fn write_primitive(&mut self) -> Result<()> {
        match self.frames.last_mut() {
            Some(Frame::Property { resolution, .. }) => match *resolution {
                Resolution::Unresolved => {
                    *resolution = Resolution::Primitive;
                    Ok(())
                }
                _ => Err(self.violation("property already resolved")),
            },
            Some(Frame::Array { resolution }) => match *resolution {
                Resolution::Complex => {
                    Err(self.violation("primitive repetition in a complex-valued array"))
                }
                _ => {
                    *resolution = Resolution::Primitive;
                    Ok(())
                }
            },
            _ => Err(self.violation("write_primitive outside property or array")),
        }
    }

    pub fn start_complex_content(&mut self) -> Result<()> {
        match self.frames.last_mut() {
            Some(Frame::Property { resolution, .. }) => match *resolution {
                Resolution::Unresolved => {
                    *resolution = Resolution::Complex;
                    self.frames.push(Frame::Complex);
                    Ok(())
                }
                _ => Err(self.violation("property already resolved")),
            },
            Some(Frame::Array { resolution }) => match *resolution {
                Resolution::Primitive => {
                    Err(self.violation("complex repetition in a primitive-valued array"))
                }
                _ => {
                    *resolution = Resolution::Complex;
                    self.frames.push(Frame::Complex);
                    Ok(())
                }
            },
            _ => Err(self.violation("start_complex_content outside property or array")),
        }
    }

    pub fn end_complex_content(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Complex) => {
                self.frames.pop();
                Ok(())
            }
            _ => Err(self.violation("end_complex_content without open complex content")),
        }
    }

    /// Name of the innermost open property.
    pub fn property_name(&self) -> Option<&str> {
        self.frames.iter().rev().find_map(|f| match f {
            Frame::Property { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// True when the innermost frame is an array.
    pub fn in_array(&self) -> bool {
        matches!(self.frames.last(), Some(Frame::Array { .. }))
    }

    /// Checks the end-of-document invariant: every frame popped.
    pub fn check_balanced(&self) -> Result<()> {
        if self.frames.is_empty() {
            Ok(())
        } else {
            Err(self.violation("unbalanced frame stack at end of document"))
        }
    }
}
