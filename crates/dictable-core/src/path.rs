use std::fmt;

/// One step from an entity down to a nested value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A declared attribute of an entity.
    Field(String),
    /// A position inside a list.
    Index(usize),
    /// An entry of a dict field.
    Key(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(index) => write!(f, "[{index}]"),
            Segment::Key(key) => write!(f, "{{{key}}}"),
        }
    }
}

/// Location of a value inside a nested entity, outermost segment first.
///
/// Renders as dot-joined segments, e.g. `avatar.size.gaps.[2]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Add a parent segment in front of the existing ones.
    pub fn prefixed(mut self, parent: Segment) -> Self {
        self.segments.insert(0, parent);
        self
    }
}

impl FromIterator<Segment> for FieldPath {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_list_index() {
        let path = FieldPath::new()
            .prefixed(Segment::Index(2))
            .prefixed(Segment::Field("gaps".into()))
            .prefixed(Segment::Field("size".into()))
            .prefixed(Segment::Field("avatar".into()));
        assert_eq!(path.to_string(), "avatar.size.gaps.[2]");
    }

    #[test]
    fn renders_dict_key_segment() {
        let path: FieldPath = [Segment::Field("scores".into()), Segment::Key("maths".into())]
            .into_iter()
            .collect();
        assert_eq!(path.to_string(), "scores.{maths}");
    }

    #[test]
    fn empty_path_renders_empty() {
        assert!(FieldPath::new().is_empty());
        assert_eq!(FieldPath::new().to_string(), "");
    }
}
