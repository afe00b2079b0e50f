//! Terser-style paths addressing a single value in a message.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Address of one primitive value: `[/]SEG[(rep)]-field[(rep)][-component[-subcomponent]]`.
///
/// Segment and field repetitions are zero-based; field, component, and
/// subcomponent positions are one-based. Omitted component and subcomponent
/// positions default to `1`, so `MSH-9` and `MSH-9-1-1` address the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    segment: String,
    segment_repetition: usize,
    field: usize,
    field_repetition: usize,
    component: usize,
    subcomponent: usize,
}

impl Locator {
    /// Builds a locator for the first component of a field.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Locator`] when the segment name is not a
    /// three-character identifier or the field position is zero.
    pub fn field(segment: &str, field: usize) -> Result<Self, ModelError> {
        if !is_segment_name(segment) {
            return Err(ModelError::locator(segment, "segment must be three characters"));
        }
        if field == 0 {
            return Err(ModelError::locator(segment, "field positions start at 1"));
        }
        Ok(Self {
            segment: segment.to_owned(),
            segment_repetition: 0,
            field,
            field_repetition: 0,
            component: 1,
            subcomponent: 1,
        })
    }

    /// Segment identifier.
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Zero-based occurrence of the segment.
    #[must_use]
    pub const fn segment_repetition(&self) -> usize {
        self.segment_repetition
    }

    /// One-based field position.
    #[must_use]
    pub const fn field_position(&self) -> usize {
        self.field
    }

    /// Zero-based field repetition.
    #[must_use]
    pub const fn field_repetition(&self) -> usize {
        self.field_repetition
    }

    /// One-based component position.
    #[must_use]
    pub const fn component(&self) -> usize {
        self.component
    }

    /// One-based subcomponent position.
    #[must_use]
    pub const fn subcomponent(&self) -> usize {
        self.subcomponent
    }
}

impl FromStr for Locator {
    type Err = ModelError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let path = input.trim_start_matches('/').trim_start_matches('.');
        let mut parts = path.split('-');

        let segment_part = parts.next().unwrap_or_default();
        let (segment, segment_repetition) = split_repetition(input, segment_part)?;
        if !is_segment_name(segment) {
            return Err(ModelError::locator(input, "segment must be three characters"));
        }

        let field_part = parts
            .next()
            .ok_or_else(|| ModelError::locator(input, "missing field position"))?;
        let (field_text, field_repetition) = split_repetition(input, field_part)?;
        let field = parse_position(input, field_text, "field position must be a positive integer")?;

        let component = parts
            .next()
            .map(|text| parse_position(input, text, "component must be a positive integer"))
            .transpose()?
            .unwrap_or(1);
        let subcomponent = parts
            .next()
            .map(|text| parse_position(input, text, "subcomponent must be a positive integer"))
            .transpose()?
            .unwrap_or(1);

        if parts.next().is_some() {
            return Err(ModelError::locator(input, "too many path elements"));
        }

        Ok(Self {
            segment: segment.to_owned(),
            segment_repetition,
            field,
            field_repetition,
            component,
            subcomponent,
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "/{}", self.segment)?;
        if self.segment_repetition > 0 {
            write!(formatter, "({})", self.segment_repetition)?;
        }
        write!(formatter, "-{}", self.field)?;
        if self.field_repetition > 0 {
            write!(formatter, "({})", self.field_repetition)?;
        }
        write!(formatter, "-{}-{}", self.component, self.subcomponent)
    }
}

fn is_segment_name(name: &str) -> bool {
    name.len() == 3
        && name
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit())
}

fn split_repetition<'a>(input: &str, part: &'a str) -> Result<(&'a str, usize), ModelError> {
    let Some((name, rest)) = part.split_once('(') else {
        return Ok((part, 0));
    };
    let Some(inner) = rest.strip_suffix(')') else {
        return Err(ModelError::locator(input, "unterminated repetition index"));
    };
    let repetition = inner
        .parse::<usize>()
        .map_err(|_| ModelError::locator(input, "repetition index must be an integer"))?;
    Ok((name, repetition))
}

fn parse_position(input: &str, text: &str, reason: &'static str) -> Result<usize, ModelError> {
    match text.parse::<usize>() {
        Ok(position) if position > 0 => Ok(position),
        _ => Err(ModelError::locator(input, reason)),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/MSH-9", "MSH", 0, 9, 0, 1, 1)]
    #[case("MSH-9-1-1", "MSH", 0, 9, 0, 1, 1)]
    #[case("PID-3(1)-1", "PID", 0, 3, 1, 1, 1)]
    #[case("/.OBX(2)-5-2", "OBX", 2, 5, 0, 2, 1)]
    #[case("ERR-7", "ERR", 0, 7, 0, 1, 1)]
    fn parses_terser_paths(
        #[case] text: &str,
        #[case] segment: &str,
        #[case] segment_repetition: usize,
        #[case] field: usize,
        #[case] field_repetition: usize,
        #[case] component: usize,
        #[case] subcomponent: usize,
    ) {
        let locator: Locator = text.parse().expect("valid locator");
        assert_eq!(locator.segment(), segment);
        assert_eq!(locator.segment_repetition(), segment_repetition);
        assert_eq!(locator.field_position(), field);
        assert_eq!(locator.field_repetition(), field_repetition);
        assert_eq!(locator.component(), component);
        assert_eq!(locator.subcomponent(), subcomponent);
    }

    #[rstest]
    #[case("MS-1")]
    #[case("MSH")]
    #[case("MSH-0")]
    #[case("MSH-x")]
    #[case("MSH-9-0")]
    #[case("MSH-9-1-1-1")]
    #[case("PID-3(1")]
    #[case("msh-9")]
    fn rejects_malformed_paths(#[case] text: &str) {
        let error = text.parse::<Locator>().expect_err("locator should be rejected");
        assert!(matches!(error, ModelError::Locator { .. }), "{error}");
    }

    #[test]
    fn display_is_canonical() {
        let locator: Locator = "PID-3(1)".parse().expect("valid locator");
        assert_eq!(locator.to_string(), "/PID-3(1)-1-1");
    }

    #[test]
    fn field_constructor_addresses_the_first_component() {
        let locator = Locator::field("MSA", 2).expect("valid locator");
        assert_eq!(locator, "MSA-2-1-1".parse().expect("valid locator"));
        assert_eq!(locator.to_string(), "/MSA-2-1-1");
    }

    #[rstest]
    #[case("MS", 1)]
    #[case("MSA", 0)]
    fn field_constructor_validates_its_input(#[case] segment: &str, #[case] field: usize) {
        let error = Locator::field(segment, field).expect_err("invalid locator");
        assert!(matches!(error, ModelError::Locator { .. }), "{error}");
    }
}
