//! Pipe-syntax parsing and encoding.

use std::borrow::Cow;

use super::{Field, HEADER_SEGMENT, Message, Segment};
use crate::delimiters::Delimiters;
use crate::error::ModelError;

const SEGMENT_TERMINATOR: char = '\r';

impl Message {
    /// Parses a pipe-delimited payload.
    ///
    /// Segments may be terminated by `\r`, `\n`, or `\r\n`. Payloads that are
    /// not valid UTF-8 are read as ISO-8859-1.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Decode`] when the payload is empty, does not
    /// start with an `MSH` segment, declares unusable delimiters, contains a
    /// malformed segment identifier, or carries more than one `MSH` segment.
    pub fn parse(payload: &[u8]) -> Result<Self, ModelError> {
        let text = decode_text(payload);
        let mut lines = text
            .split(['\r', '\n'])
            .filter(|line| !line.trim().is_empty());

        let first = lines
            .next()
            .ok_or_else(|| ModelError::decode("message is empty"))?;
        let (header, delimiters) = parse_header(first)?;

        let mut segments = vec![header];
        for line in lines {
            segments.push(parse_segment(line, &delimiters)?);
        }
        Ok(Self::from_segments(segments))
    }

    /// Encodes the message in pipe syntax, terminating each segment with
    /// `\r`. Trailing empty fields and components are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SegmentNotFound`] when the message has no `MSH`
    /// segment and [`ModelError::Decode`] when its delimiters are unusable.
    pub fn encode(&self) -> Result<String, ModelError> {
        if self.header().is_none() {
            return Err(ModelError::SegmentNotFound {
                segment: HEADER_SEGMENT.to_owned(),
            });
        }
        let delimiters = self.delimiters()?;
        let mut encoded = String::new();
        for segment in self.segments() {
            encode_segment(segment, &delimiters, &mut encoded);
            encoded.push(SEGMENT_TERMINATOR);
        }
        Ok(encoded)
    }
}

fn decode_text(payload: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(payload) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(payload.iter().copied().map(char::from).collect()),
    }
}

fn parse_header(line: &str) -> Result<(Segment, Delimiters), ModelError> {
    let Some(rest) = line.strip_prefix(HEADER_SEGMENT) else {
        return Err(ModelError::decode(format!(
            "message must start with an MSH segment, found '{}'",
            line.chars().take(3).collect::<String>()
        )));
    };
    let mut chars = rest.chars();
    let separator = chars
        .next()
        .ok_or_else(|| ModelError::decode("MSH segment has no field separator"))?;
    let body = chars.as_str();
    let mut elements = body.split(separator);
    let encoding = elements.next().unwrap_or_default();
    if encoding.is_empty() {
        return Err(ModelError::decode("MSH-2 encoding characters are missing"));
    }
    let delimiters = Delimiters::from_header(separator, encoding)?;

    let mut fields = vec![Field::from_value(separator), Field::from_value(encoding)];
    fields.extend(elements.map(|element| parse_field(element, &delimiters)));
    Ok((
        Segment::with_fields(HEADER_SEGMENT.to_owned(), fields),
        delimiters,
    ))
}

fn parse_segment(line: &str, delimiters: &Delimiters) -> Result<Segment, ModelError> {
    let mut elements = line.split(delimiters.field);
    let name = elements.next().unwrap_or_default();
    if name == HEADER_SEGMENT {
        return Err(ModelError::decode(
            "message contains more than one MSH segment",
        ));
    }
    if name.len() != 3
        || !name
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit())
    {
        return Err(ModelError::decode(format!(
            "invalid segment identifier '{name}'"
        )));
    }
    let fields = elements
        .map(|element| parse_field(element, delimiters))
        .collect();
    Ok(Segment::with_fields(name.to_owned(), fields))
}

fn parse_field(text: &str, delimiters: &Delimiters) -> Field {
    if text.is_empty() {
        return Field::default();
    }
    let repetitions = text
        .split(delimiters.repetition)
        .map(|repetition| {
            repetition
                .split(delimiters.component)
                .map(|component| {
                    component
                        .split(delimiters.subcomponent)
                        .map(|value| delimiters.unescape(value))
                        .collect()
                })
                .collect()
        })
        .collect();
    Field::from_repetitions(repetitions)
}

fn encode_segment(segment: &Segment, delimiters: &Delimiters, out: &mut String) {
    out.push_str(segment.name());
    let is_header = segment.name() == HEADER_SEGMENT;
    let fields = segment.fields();
    let populated = fields
        .iter()
        .rposition(|field| !field.is_empty())
        .map_or(0, |index| index + 1);

    for (index, field) in fields.iter().take(populated).enumerate() {
        if is_header && index == 0 {
            // MSH-1 is the separator itself and is written by the next push.
            continue;
        }
        out.push(delimiters.field);
        if is_header && index == 1 {
            out.push_str(&delimiters.encoding_characters());
            continue;
        }
        encode_field(field, delimiters, out);
    }
    if is_header && populated < 2 {
        out.push(delimiters.field);
        out.push_str(&delimiters.encoding_characters());
    }
}

fn encode_field(field: &Field, delimiters: &Delimiters, out: &mut String) {
    let repetitions = field.repetitions();
    let repetition_count = trimmed_len(repetitions, |components| {
        components.iter().flatten().all(String::is_empty)
    });
    for (r, components) in repetitions.iter().take(repetition_count).enumerate() {
        if r > 0 {
            out.push(delimiters.repetition);
        }
        let component_count = trimmed_len(components, |subcomponents| {
            subcomponents.iter().all(String::is_empty)
        });
        for (c, subcomponents) in components.iter().take(component_count).enumerate() {
            if c > 0 {
                out.push(delimiters.component);
            }
            let subcomponent_count = trimmed_len(subcomponents, String::is_empty);
            for (s, value) in subcomponents.iter().take(subcomponent_count).enumerate() {
                if s > 0 {
                    out.push(delimiters.subcomponent);
                }
                out.push_str(&delimiters.escape(value));
            }
        }
    }
}

fn trimmed_len<T>(items: &[T], is_empty: impl Fn(&T) -> bool) -> usize {
    items
        .iter()
        .rposition(|item| !is_empty(item))
        .map_or(0, |index| index + 1)
}
