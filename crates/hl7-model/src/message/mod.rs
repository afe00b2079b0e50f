//! Segment/field object model and locator-based access.

mod codec;

use crate::delimiters::Delimiters;
use crate::error::ModelError;
use crate::locator::Locator;

pub(crate) const HEADER_SEGMENT: &str = "MSH";

/// One field: repetitions of components of subcomponents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    repetitions: Vec<Vec<Vec<String>>>,
}

impl Field {
    /// Builds a field holding a single primitive value.
    #[must_use]
    pub fn from_value(value: impl Into<String>) -> Self {
        Self {
            repetitions: vec![vec![vec![value.into()]]],
        }
    }

    /// Returns the addressed value, or `""` when any level is absent.
    #[must_use]
    pub fn value(&self, repetition: usize, component: usize, subcomponent: usize) -> &str {
        let (Some(component), Some(subcomponent)) =
            (component.checked_sub(1), subcomponent.checked_sub(1))
        else {
            return "";
        };
        self.repetitions
            .get(repetition)
            .and_then(|components| components.get(component))
            .and_then(|subcomponents| subcomponents.get(subcomponent))
            .map_or("", String::as_str)
    }

    /// True when no repetition carries a non-empty value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repetitions
            .iter()
            .flatten()
            .flatten()
            .all(String::is_empty)
    }

    fn set(&mut self, repetition: usize, component: usize, subcomponent: usize, value: String) {
        if self.repetitions.len() <= repetition {
            self.repetitions.resize_with(repetition + 1, Vec::new);
        }
        let Some(components) = self.repetitions.get_mut(repetition) else {
            return;
        };
        let component = component.saturating_sub(1);
        if components.len() <= component {
            components.resize_with(component + 1, Vec::new);
        }
        let Some(subcomponents) = components.get_mut(component) else {
            return;
        };
        let subcomponent = subcomponent.saturating_sub(1);
        if subcomponents.len() <= subcomponent {
            subcomponents.resize_with(subcomponent + 1, String::new);
        }
        if let Some(slot) = subcomponents.get_mut(subcomponent) {
            *slot = value;
        }
    }

    pub(crate) const fn repetitions(&self) -> &Vec<Vec<Vec<String>>> {
        &self.repetitions
    }

    pub(crate) const fn from_repetitions(repetitions: Vec<Vec<Vec<String>>>) -> Self {
        Self { repetitions }
    }
}

/// A named segment such as `MSH` or `PID`.
///
/// Fields are numbered from 1. For `MSH`, field 1 is the field separator and
/// field 2 the encoding characters, matching the HL7 numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    name: String,
    fields: Vec<Field>,
}

impl Segment {
    /// Creates an empty segment.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Creates an `MSH` segment declaring `delimiters`.
    #[must_use]
    pub fn header(delimiters: Delimiters) -> Self {
        Self {
            name: HEADER_SEGMENT.to_owned(),
            fields: vec![
                Field::from_value(delimiters.field),
                Field::from_value(delimiters.encoding_characters()),
            ],
        }
    }

    /// Segment identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns field `position` (one-based).
    #[must_use]
    pub fn field(&self, position: usize) -> Option<&Field> {
        position
            .checked_sub(1)
            .and_then(|index| self.fields.get(index))
    }

    /// Reads one primitive value, or `""` when it is absent.
    #[must_use]
    pub fn value(
        &self,
        field: usize,
        repetition: usize,
        component: usize,
        subcomponent: usize,
    ) -> &str {
        self.field(field)
            .map_or("", |field| field.value(repetition, component, subcomponent))
    }

    /// Writes one primitive value, creating missing levels.
    pub fn set_value(
        &mut self,
        field: usize,
        repetition: usize,
        component: usize,
        subcomponent: usize,
        value: impl Into<String>,
    ) {
        let Some(index) = field.checked_sub(1) else {
            return;
        };
        if self.fields.len() <= index {
            self.fields.resize_with(index + 1, Field::default);
        }
        if let Some(target) = self.fields.get_mut(index) {
            target.set(repetition, component, subcomponent, value.into());
        }
    }

    /// Copies every populated field of `source` over the same position here.
    ///
    /// Fields empty in `source` leave the corresponding field untouched.
    pub fn copy_from(&mut self, source: &Self) {
        if self.fields.len() < source.fields.len() {
            self.fields.resize_with(source.fields.len(), Field::default);
        }
        for (target, field) in self.fields.iter_mut().zip(&source.fields) {
            if !field.is_empty() {
                target.clone_from(field);
            }
        }
    }

    pub(crate) const fn fields(&self) -> &Vec<Field> {
        &self.fields
    }

    pub(crate) const fn with_fields(name: String, fields: Vec<Field>) -> Self {
        Self { name, fields }
    }
}

/// A parsed HL7 v2 message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    segments: Vec<Segment>,
}

impl Message {
    /// Builds a message from segments in wire order.
    #[must_use]
    pub const fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Segments in wire order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the first segment named `name`.
    #[must_use]
    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.name == name)
    }

    /// The `MSH` segment, if present.
    #[must_use]
    pub fn header(&self) -> Option<&Segment> {
        self.segment(HEADER_SEGMENT)
    }

    pub(crate) fn header_mut(&mut self) -> Option<&mut Segment> {
        self.segments
            .iter_mut()
            .find(|segment| segment.name == HEADER_SEGMENT)
    }

    /// Reads the value addressed by `locator`.
    ///
    /// Missing fields, components, or subcomponents read as `""`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SegmentNotFound`] when the addressed segment
    /// occurrence does not exist.
    pub fn get(&self, locator: &Locator) -> Result<&str, ModelError> {
        let segment = self
            .position(locator.segment(), locator.segment_repetition())
            .and_then(|index| self.segments.get(index))
            .ok_or_else(|| ModelError::SegmentNotFound {
                segment: locator.segment().to_owned(),
            })?;
        Ok(segment.value(
            locator.field_position(),
            locator.field_repetition(),
            locator.component(),
            locator.subcomponent(),
        ))
    }

    /// Writes `value` at `locator`, appending the segment when absent.
    pub fn set(&mut self, locator: &Locator, value: impl Into<String>) {
        self.ensure_segment(locator.segment(), locator.segment_repetition())
            .set_value(
                locator.field_position(),
                locator.field_repetition(),
                locator.component(),
                locator.subcomponent(),
                value,
            );
    }

    /// Copies `source` field-for-field into this message's segment of the
    /// same name, creating it when absent. See [`Segment::copy_from`].
    pub fn copy_segment_from(&mut self, source: &Segment) {
        self.ensure_segment(source.name(), 0).copy_from(source);
    }

    /// HL7 version from `MSH-12-1`, if present and non-empty.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.header()
            .map(|header| header.value(12, 0, 1, 1))
            .filter(|version| !version.is_empty())
    }

    /// Message structure name, for example `ADT_A01`.
    ///
    /// Uses `MSH-9-3` when present, otherwise joins the message code and
    /// trigger event (`MSH-9-1`, `MSH-9-2`).
    #[must_use]
    pub fn structure_name(&self) -> String {
        let Some(header) = self.header() else {
            return String::new();
        };
        let structure = header.value(9, 0, 3, 1);
        if !structure.is_empty() {
            return structure.to_owned();
        }
        let code = header.value(9, 0, 1, 1);
        let trigger = header.value(9, 0, 2, 1);
        if trigger.is_empty() {
            code.to_owned()
        } else {
            format!("{code}_{trigger}")
        }
    }

    /// Delimiters declared by `MSH-1` and `MSH-2`, or the defaults when the
    /// message has no header.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Decode`] when the declared characters are
    /// unusable.
    pub fn delimiters(&self) -> Result<Delimiters, ModelError> {
        let Some(header) = self.header() else {
            return Ok(Delimiters::default());
        };
        let separator = header
            .value(1, 0, 1, 1)
            .chars()
            .next()
            .unwrap_or_else(|| Delimiters::default().field);
        let encoding = header.value(2, 0, 1, 1);
        if encoding.is_empty() {
            return Delimiters::from_header(separator, &Delimiters::default().encoding_characters());
        }
        Delimiters::from_header(separator, encoding)
    }

    fn position(&self, name: &str, repetition: usize) -> Option<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.name == name)
            .nth(repetition)
            .map(|(index, _)| index)
    }

    #[expect(
        clippy::indexing_slicing,
        reason = "index comes from position() or points at a segment pushed above"
    )]
    fn ensure_segment(&mut self, name: &str, repetition: usize) -> &mut Segment {
        let index = match self.position(name, repetition) {
            Some(index) => index,
            None if name == HEADER_SEGMENT && repetition == 0 => {
                self.segments
                    .insert(0, Segment::header(Delimiters::default()));
                0
            }
            None => {
                let existing = self
                    .segments
                    .iter()
                    .filter(|segment| segment.name == name)
                    .count();
                for _ in existing..=repetition {
                    self.segments.push(Segment::new(name));
                }
                self.segments.len() - 1
            }
        };
        &mut self.segments[index]
    }
}
