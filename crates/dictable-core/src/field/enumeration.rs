use std::sync::Arc;

use serde_json::Value as Json;

use crate::value::EnumMember;

/// A named, ordered set of members, each carrying a raw JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct Enumeration {
    name: Arc<str>,
    members: Vec<(Arc<str>, Json)>,
}

impl Enumeration {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Add a member; a repeated name replaces the earlier value.
    pub fn member(mut self, name: impl Into<Arc<str>>, value: impl Into<Json>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.members.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.members.push((name, value)),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Look a member up by name.
    pub fn get(&self, name: &str) -> Option<EnumMember> {
        self.members
            .iter()
            .find(|(member, _)| member.as_ref() == name)
            .map(|(member, value)| self.make(member, value))
    }

    /// Look a member up by its raw value.
    pub fn from_value(&self, raw: &Json) -> Option<EnumMember> {
        self.members
            .iter()
            .find(|(_, value)| value == raw)
            .map(|(member, value)| self.make(member, value))
    }

    pub fn members(&self) -> impl Iterator<Item = EnumMember> + '_ {
        self.members
            .iter()
            .map(|(member, value)| self.make(member, value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(member, _)| member.as_ref())
    }

    pub fn values(&self) -> impl Iterator<Item = &Json> {
        self.members.iter().map(|(_, value)| value)
    }

    fn make(&self, member: &Arc<str>, value: &Json) -> EnumMember {
        EnumMember::new(Arc::clone(&self.name), Arc::clone(member), value.clone())
    }
}
