//! Ordered field tables for entity types.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{DictableError, Result};
use crate::field::{Enumeration, Field, TypeHint};

/// Suffix appended to the name of a derived partial schema.
pub const PARTIAL_SUFFIX: &str = "Partial";

/// How a field entered the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Explicit,
    Hint,
}

/// A declared attribute and its descriptor.
#[derive(Debug, Clone)]
pub struct FieldSlot {
    name: String,
    field: Field,
    origin: Origin,
}

impl FieldSlot {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Key used in raw mappings.
    pub fn key(&self) -> &str {
        self.field.serialized_key().unwrap_or(&self.name)
    }
}

/// Immutable, ordered field table of one entity type.
///
/// Slot order is output key order: inherited fields first, then explicit
/// descriptors, then hint-only fields, each in declaration order.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    description: Option<String>,
    ancestors: Vec<String>,
    slots: Vec<FieldSlot>,
    by_name: HashMap<String, usize>,
    by_key: HashMap<String, usize>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Ancestor entity names, nearest first.
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, name: &str) -> Option<&FieldSlot> {
        self.index_of(name).map(|index| &self.slots[index])
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn slot_by_key(&self, key: &str) -> Option<&FieldSlot> {
        self.by_key.get(key).map(|&index| &self.slots[index])
    }

    pub fn descends_from(&self, name: &str) -> bool {
        self.ancestors.iter().any(|ancestor| ancestor == name)
    }

    /// Derive `{Name}Partial`: every top-level field optional, defaults kept.
    ///
    /// Nested descriptors keep their own flags and object references still
    /// name the original entities.
    pub fn partial(&self) -> Schema {
        let slots = self
            .slots
            .iter()
            .map(|slot| FieldSlot {
                field: slot.field.clone().optional(),
                ..slot.clone()
            })
            .collect();
        Schema {
            name: format!("{}{PARTIAL_SUFFIX}", self.name),
            description: self.description.clone(),
            ancestors: Vec::new(),
            slots,
            by_name: self.by_name.clone(),
            by_key: self.by_key.clone(),
        }
    }
}

/// Collects declarations for a [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    description: Option<String>,
    ancestors: Vec<String>,
    inherited: Vec<FieldSlot>,
    explicit: Vec<(String, Field)>,
    hints: Vec<(String, TypeHint)>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            ancestors: Vec::new(),
            inherited: Vec::new(),
            explicit: Vec::new(),
            hints: Vec::new(),
        }
    }

    /// Inherit every field of `parent`, keeping its order.
    pub fn extends(mut self, parent: &Schema) -> Self {
        for ancestor in std::iter::once(&parent.name).chain(&parent.ancestors) {
            if !self.ancestors.contains(ancestor) {
                self.ancestors.push(ancestor.clone());
            }
        }
        for slot in &parent.slots {
            place(&mut self.inherited, slot.clone());
        }
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.explicit.push((name.into(), field));
        self
    }

    pub fn hint(mut self, name: impl Into<String>, hint: TypeHint) -> Self {
        self.hints.push((name.into(), hint));
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn build(self) -> Result<Schema> {
        let entity = self.name;
        duplicates(&entity, self.explicit.iter().map(|(name, _)| name))?;
        duplicates(&entity, self.hints.iter().map(|(name, _)| name))?;

        let mut slots = self.inherited;
        let hinted: Vec<FieldSlot> = self
            .hints
            .into_iter()
            .filter(|(name, _)| !self.explicit.iter().any(|(declared, _)| declared == name))
            .map(|(name, hint)| FieldSlot {
                field: hint.to_field(),
                name,
                origin: Origin::Hint,
            })
            .collect();
        let explicit = self.explicit.into_iter().map(|(name, field)| FieldSlot {
            name,
            field,
            origin: Origin::Explicit,
        });
        for slot in explicit.chain(hinted) {
            place(&mut slots, slot);
        }

        let mut by_name = HashMap::with_capacity(slots.len());
        let mut by_key: HashMap<String, usize> = HashMap::with_capacity(slots.len());
        for (index, slot) in slots.iter().enumerate() {
            by_name.insert(slot.name.clone(), index);
            if let Some(&other) = by_key.get(slot.key()) {
                return Err(DictableError::definition(
                    &entity,
                    format!(
                        "serialized key `{}` is used by both `{}` and `{}`",
                        slot.key(),
                        slots[other].name,
                        slot.name
                    ),
                ));
            }
            by_key.insert(slot.key().to_string(), index);
        }

        Ok(Schema {
            name: entity,
            description: self.description,
            ancestors: self.ancestors,
            slots,
            by_name,
            by_key,
        })
    }
}

/// A value a [`SchemaTemplate`] is instantiated with.
pub trait TemplateArg {
    /// Name placed between the brackets of the instance name.
    fn arg_name(&self) -> &str;
}

impl TemplateArg for str {
    fn arg_name(&self) -> &str {
        self
    }
}

impl TemplateArg for Enumeration {
    fn arg_name(&self) -> &str {
        self.name()
    }
}

impl TemplateArg for Schema {
    fn arg_name(&self) -> &str {
        self.name()
    }
}

impl<T: TemplateArg + ?Sized> TemplateArg for Arc<T> {
    fn arg_name(&self) -> &str {
        (**self).arg_name()
    }
}

type Injector<A> = Arc<dyn Fn(&A) -> Vec<(String, Field)> + Send + Sync>;

/// Shared declarations for a family of schemas that differ only in a few
/// fields derived from a type argument.
///
/// `make(&gender)` on a template named `SelectField` yields the schema
/// `SelectField[Gender]`: a copy of the shared fields plus whatever the
/// injector returns for `gender`.
pub struct SchemaTemplate<A: ?Sized> {
    shared: SchemaBuilder,
    inject: Injector<A>,
}

impl<A: TemplateArg + ?Sized> SchemaTemplate<A> {
    pub fn new(
        name: impl Into<String>,
        inject: impl Fn(&A) -> Vec<(String, Field)> + Send + Sync + 'static,
    ) -> Self {
        Self {
            shared: SchemaBuilder::new(name),
            inject: Arc::new(inject),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn extends(mut self, parent: &Schema) -> Self {
        self.shared = self.shared.extends(parent);
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.shared = self.shared.field(name, field);
        self
    }

    pub fn hint(mut self, name: impl Into<String>, hint: TypeHint) -> Self {
        self.shared = self.shared.hint(name, hint);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.shared = self.shared.describe(description);
        self
    }

    /// Build the instance for `arg`.
    ///
    /// An injected field replaces a shared field of the same name in place;
    /// other injected fields follow the shared explicit fields.
    pub fn make(&self, arg: &A) -> Result<Schema> {
        let mut builder = self.shared.clone();
        builder.name = format!("{}[{}]", builder.name, arg.arg_name());
        for (name, field) in (self.inject)(arg) {
            match builder
                .explicit
                .iter_mut()
                .find(|(declared, _)| *declared == name)
            {
                Some(existing) => existing.1 = field,
                None => builder.explicit.push((name, field)),
            }
        }
        builder.build()
    }
}

impl<A: ?Sized> Clone for SchemaTemplate<A> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            inject: Arc::clone(&self.inject),
        }
    }
}

impl<A: ?Sized> fmt::Debug for SchemaTemplate<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaTemplate")
            .field("name", &self.shared.name)
            .finish_non_exhaustive()
    }
}

/// Replace a same-named slot in place, or append.
fn place(slots: &mut Vec<FieldSlot>, slot: FieldSlot) {
    match slots.iter_mut().find(|existing| existing.name == slot.name) {
        Some(existing) => *existing = slot,
        None => slots.push(slot),
    }
}

fn duplicates<'a>(entity: &str, names: impl Iterator<Item = &'a String>) -> Result<()> {
    let mut seen = Vec::new();
    for name in names {
        if seen.contains(&name) {
            return Err(DictableError::definition(
                entity,
                format!("field `{name}` is declared twice"),
            ));
        }
        seen.push(name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(schema: &Schema) -> Vec<&str> {
        schema.slots().iter().map(FieldSlot::name).collect()
    }

    #[test]
    fn explicit_fields_precede_hint_only_fields() {
        let schema = Schema::builder("User")
            .hint("age", TypeHint::Int)
            .field("name", Field::str().required())
            .hint("name", TypeHint::Int)
            .field("email", Field::str())
            .hint("tags", TypeHint::List(Box::new(TypeHint::Str)))
            .hint("avatar", TypeHint::Entity("Avatar".into()))
            .build()
            .unwrap();
        assert_eq!(names(&schema), ["name", "email", "age", "tags", "avatar"]);
        assert_eq!(schema.slot("name").unwrap().origin(), Origin::Explicit);
        assert!(matches!(
            schema.slot("name").unwrap().field().kind(),
            crate::field::FieldKind::Str
        ));
        assert_eq!(schema.slot("age").unwrap().origin(), Origin::Hint);
        assert!(schema.slot("age").unwrap().field().is_required());
        assert!(!schema.slot("avatar").unwrap().field().is_required());
    }

    #[test]
    fn template_instances_get_bracketed_names_and_injected_fields() {
        let template = SchemaTemplate::new("Page", |item: &str| {
            vec![("items".to_string(), Field::list(Field::object(item)).required())]
        })
        .field("items", Field::any())
        .field("cursor", Field::str());

        let users = template.make("User").unwrap();
        assert_eq!(users.name(), "Page[User]");
        assert_eq!(names(&users), ["items", "cursor"]);
        assert!(users.slot("items").unwrap().field().is_required());

        let orders = template.make("Order").unwrap();
        assert_eq!(orders.name(), "Page[Order]");
        assert!(matches!(
            orders.slot("items").unwrap().field().kind(),
            crate::field::FieldKind::List(element)
                if matches!(element.kind(), crate::field::FieldKind::Object(name) if name == "Order")
        ));
        assert_eq!(template.name(), "Page");
    }

    #[test]
    fn inherited_fields_come_first_and_can_be_redeclared() {
        let base = Schema::builder("Base")
            .field("id", Field::int().required())
            .field("note", Field::str())
            .build()
            .unwrap();
        let child = Schema::builder("Child")
            .extends(&base)
            .field("extra", Field::bool())
            .field("note", Field::str().required())
            .build()
            .unwrap();
        assert_eq!(names(&child), ["id", "note", "extra"]);
        assert!(child.slot("note").unwrap().field().is_required());
        assert!(child.descends_from("Base"));
        assert!(!base.descends_from("Child"));

        let grandchild = Schema::builder("Grandchild").extends(&child).build().unwrap();
        assert_eq!(grandchild.ancestors(), ["Child", "Base"]);
    }

    #[test]
    fn keys_resolve_to_slots() {
        let schema = Schema::builder("User")
            .field("name", Field::str().key("user_name"))
            .build()
            .unwrap();
        assert_eq!(schema.slot_by_key("user_name").unwrap().name(), "name");
        assert!(schema.slot_by_key("name").is_none());
        assert_eq!(schema.index_of("name"), Some(0));
    }

    #[test]
    fn conflicting_declarations_are_rejected() {
        let twice = Schema::builder("User")
            .field("name", Field::str())
            .field("name", Field::int())
            .build();
        assert!(matches!(twice, Err(DictableError::SchemaDefinition { .. })));

        let clash = Schema::builder("User")
            .field("name", Field::str())
            .field("alias", Field::str().key("name"))
            .build()
            .unwrap_err();
        assert!(clash.to_string().contains("serialized key `name`"));
    }

    #[test]
    fn partial_relaxes_only_top_level_fields() {
        let base = Schema::builder("Base").field("id", Field::int()).build().unwrap();
        let schema = Schema::builder("User")
            .extends(&base)
            .field("name", Field::str().required())
            .field("tags", Field::list(Field::str().required()).required())
            .field("kind", Field::str().default("basic"))
            .build()
            .unwrap();
        let partial = schema.partial();
        assert_eq!(partial.name(), "UserPartial");
        assert!(partial.ancestors().is_empty());
        assert!(partial.slots().iter().all(|slot| !slot.field().is_required()));
        match partial.slot("tags").unwrap().field().kind() {
            crate::field::FieldKind::List(element) => assert!(element.is_required()),
            other => panic!("unexpected kind {other:?}"),
        }
        assert!(partial.slot("kind").unwrap().field().default_value().is_some());
    }
}
