use std::fmt;
use std::str::FromStr;

use super::Field;
use crate::error::{DictableError, Result};

/// Bare type annotation that infers a default field descriptor.
///
/// Textual form: `str`, `int`, `float`, `bool`, `datetime`, `any`,
/// `List[T]`, `Dict[K, V]`, `Union[A, B]`, `Optional[T]`, or an entity name
/// starting with an uppercase letter. `None` is accepted as a union member
/// and makes the union optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHint {
    Str,
    Int,
    Float,
    Bool,
    Datetime,
    Any,
    Entity(String),
    List(Box<TypeHint>),
    Dict(Box<TypeHint>, Box<TypeHint>),
    Union(Vec<TypeHint>),
    Optional(Box<TypeHint>),
}

impl TypeHint {
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = HintParser { text, pos: 0 };
        let hint = parser.hint()?.ok_or_else(|| unsupported(text, "`None` alone"))?;
        parser.skip_whitespace();
        if parser.pos != text.len() {
            return Err(unsupported(text, "trailing input"));
        }
        Ok(hint)
    }

    /// The descriptor a field declared only by this hint receives.
    ///
    /// Hinted fields are required unless wrapped in `Optional` or naming an
    /// entity; a bare entity hint gives an optional object field.
    pub fn to_field(&self) -> Field {
        match self {
            TypeHint::Optional(inner) => inner.to_field().optional(),
            TypeHint::Entity(_) => self.base_field(),
            other => other.base_field().required(),
        }
    }

    fn base_field(&self) -> Field {
        match self {
            TypeHint::Str => Field::str(),
            TypeHint::Int => Field::int(),
            TypeHint::Float => Field::float(),
            TypeHint::Bool => Field::bool(),
            TypeHint::Datetime => Field::datetime(),
            TypeHint::Any => Field::any(),
            TypeHint::Entity(name) => Field::object(name.clone()),
            TypeHint::List(element) => Field::list(element.to_field()),
            TypeHint::Dict(key, value) => Field::dict_of(key.to_field(), value.to_field()),
            TypeHint::Union(members) => Field::union(members.iter().map(TypeHint::to_field).collect()),
            TypeHint::Optional(inner) => inner.base_field(),
        }
    }
}

impl FromStr for TypeHint {
    type Err = DictableError;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHint::Str => f.write_str("str"),
            TypeHint::Int => f.write_str("int"),
            TypeHint::Float => f.write_str("float"),
            TypeHint::Bool => f.write_str("bool"),
            TypeHint::Datetime => f.write_str("datetime"),
            TypeHint::Any => f.write_str("any"),
            TypeHint::Entity(name) => f.write_str(name),
            TypeHint::List(element) => write!(f, "List[{element}]"),
            TypeHint::Dict(key, value) => write!(f, "Dict[{key}, {value}]"),
            TypeHint::Union(members) => {
                f.write_str("Union[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str("]")
            }
            TypeHint::Optional(inner) => write!(f, "Optional[{inner}]"),
        }
    }
}

fn unsupported(text: &str, reason: &str) -> DictableError {
    DictableError::Unsupported(format!("type hint `{text}`: {reason}"))
}

struct HintParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> HintParser<'a> {
    /// `Ok(None)` stands for a literal `None`.
    fn hint(&mut self) -> Result<Option<TypeHint>> {
        let ident = self.ident()?;
        self.skip_whitespace();
        if !self.eat('[') {
            return self.simple(ident);
        }

        let mut args = vec![self.hint()?];
        self.skip_whitespace();
        while self.eat(',') {
            args.push(self.hint()?);
            self.skip_whitespace();
        }
        if !self.eat(']') {
            return Err(unsupported(self.text, "expected `]`"));
        }
        self.generic(ident, args).map(Some)
    }

    fn simple(&self, ident: &str) -> Result<Option<TypeHint>> {
        let hint = match ident {
            "None" => return Ok(None),
            "str" => TypeHint::Str,
            "int" => TypeHint::Int,
            "float" => TypeHint::Float,
            "bool" => TypeHint::Bool,
            "datetime" => TypeHint::Datetime,
            "any" | "Any" => TypeHint::Any,
            "List" | "list" | "Dict" | "dict" | "Union" | "Optional" => {
                return Err(unsupported(
                    self.text,
                    &format!("`{ident}` needs type arguments"),
                ));
            }
            name if name.starts_with(|c: char| c.is_ascii_uppercase()) => {
                TypeHint::Entity(name.to_string())
            }
            other => {
                return Err(unsupported(self.text, &format!("unknown type `{other}`")));
            }
        };
        Ok(Some(hint))
    }

    fn generic(&self, ident: &str, args: Vec<Option<TypeHint>>) -> Result<TypeHint> {
        match (ident, args.len()) {
            ("List" | "list", 1) => Ok(TypeHint::List(Box::new(self.concrete(args)?.remove(0)))),
            ("Dict" | "dict", 2) => {
                let mut args = self.concrete(args)?;
                let value = args.remove(1);
                let key = args.remove(0);
                Ok(TypeHint::Dict(Box::new(key), Box::new(value)))
            }
            ("Optional", 1) => Ok(TypeHint::Optional(Box::new(
                self.concrete(args)?.remove(0),
            ))),
            ("Union", _) => {
                let nullable = args.iter().any(Option::is_none);
                let mut members: Vec<TypeHint> = args.into_iter().flatten().collect();
                let hint = match members.len() {
                    0 => return Err(unsupported(self.text, "union of only `None`")),
                    1 => members.remove(0),
                    _ => TypeHint::Union(members),
                };
                Ok(if nullable {
                    TypeHint::Optional(Box::new(hint))
                } else {
                    hint
                })
            }
            ("List" | "list" | "Dict" | "dict" | "Optional", n) => Err(unsupported(
                self.text,
                &format!("`{ident}` does not take {n} type arguments"),
            )),
            (other, _) => Err(unsupported(
                self.text,
                &format!("unknown generic `{other}`"),
            )),
        }
    }

    fn concrete(&self, args: Vec<Option<TypeHint>>) -> Result<Vec<TypeHint>> {
        args.into_iter()
            .map(|arg| arg.ok_or_else(|| unsupported(self.text, "`None` outside a union")))
            .collect()
    }

    fn ident(&mut self) -> Result<&'a str> {
        self.skip_whitespace();
        let text: &'a str = self.text;
        let start = self.pos;
        let rest = &text[start..];
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(unsupported(self.text, "expected a type name"));
        }
        self.pos += len;
        Ok(&text[start..start + len])
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.text[self.pos..].starts_with(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    #[test]
    fn parses_nested_generics() {
        let hint = TypeHint::parse("Dict[str, List[Union[int, Avatar]]]").unwrap();
        assert_eq!(
            hint,
            TypeHint::Dict(
                Box::new(TypeHint::Str),
                Box::new(TypeHint::List(Box::new(TypeHint::Union(vec![
                    TypeHint::Int,
                    TypeHint::Entity("Avatar".into()),
                ])))),
            )
        );
        assert_eq!(hint.to_string(), "Dict[str, List[Union[int, Avatar]]]");
    }

    #[test]
    fn none_in_union_makes_it_optional() {
        assert_eq!(
            TypeHint::parse("Union[int, None]").unwrap(),
            TypeHint::Optional(Box::new(TypeHint::Int))
        );
        assert_eq!(
            TypeHint::parse(" Optional[ str ] ").unwrap(),
            TypeHint::Optional(Box::new(TypeHint::Str))
        );
    }

    #[test]
    fn unknown_hints_are_not_implemented() {
        for text in ["bytes", "Tuple[int]", "List[int, str]", "List", "None", "List[int", "int]"] {
            assert!(
                matches!(TypeHint::parse(text), Err(DictableError::Unsupported(_))),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn hinted_fields_are_required_unless_optional() {
        let field = TypeHint::parse("List[int]").unwrap().to_field();
        assert!(field.is_required());
        match field.kind() {
            FieldKind::List(element) => {
                assert!(element.is_required());
                assert!(matches!(element.kind(), FieldKind::Int));
            }
            other => panic!("unexpected kind {other:?}"),
        }

        let optional = TypeHint::parse("Optional[Avatar]").unwrap().to_field();
        assert!(!optional.is_required());
        assert!(matches!(optional.kind(), FieldKind::Object(name) if name == "Avatar"));
    }

    #[test]
    fn entity_hints_are_optional_objects() {
        let field = TypeHint::parse("Avatar").unwrap().to_field();
        assert!(!field.is_required());
        assert!(matches!(field.kind(), FieldKind::Object(name) if name == "Avatar"));

        let listed = TypeHint::parse("List[Avatar]").unwrap().to_field();
        assert!(listed.is_required());
        match listed.kind() {
            FieldKind::List(element) => assert!(!element.is_required()),
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
