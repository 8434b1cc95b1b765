//! Launch option descriptors and the ordered override merge.
//!
//! A configuration form renders an [`OptionList`]: an insertion-ordered set
//! of [`OptionDescriptor`]s keyed by their `option` name. Runners adjust the
//! shared system table through partial [`OptionOverride`] records that are
//! folded in with [`merge`].

pub mod runner;
pub mod system;

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};

use crate::error::SetupError;

// ── Value types ───────────────────────────────────────────────────────────────

/// Widget kind a descriptor is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    Bool,
    String,
    Choice,
    ChoiceWithEntry,
    File,
    #[serde(rename = "directory_chooser")]
    Directory,
    Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
    Mapping(IndexMap<String, String>),
}

impl OptionValue {
    pub fn text(value: impl Into<String>) -> Self {
        OptionValue::Text(value.into())
    }

    /// Rendering used by the terminal listing.
    pub fn display(&self) -> String {
        match self {
            OptionValue::Bool(b) => b.to_string(),
            OptionValue::Text(s) => s.clone(),
            OptionValue::Mapping(m) => m
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// One `(label, value)` entry of a selection control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub value: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Choice {
            label: label.into(),
            value: value.into(),
        }
    }
}

type ChoiceProducer = Arc<dyn Fn() -> Vec<Choice> + Send + Sync>;
type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Where a choice option gets its entries from.
#[derive(Clone)]
pub enum ChoiceSource {
    Static(Vec<Choice>),
    /// Evaluated each time the choices are rendered.
    Dynamic(ChoiceProducer),
}

impl ChoiceSource {
    pub fn dynamic(f: impl Fn() -> Vec<Choice> + Send + Sync + 'static) -> Self {
        ChoiceSource::Dynamic(Arc::new(f))
    }

    pub fn resolve(&self) -> Vec<Choice> {
        match self {
            ChoiceSource::Static(choices) => choices.clone(),
            ChoiceSource::Dynamic(f) => f(),
        }
    }
}

impl fmt::Debug for ChoiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceSource::Static(choices) => f.debug_tuple("Static").field(choices).finish(),
            ChoiceSource::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl PartialEq for ChoiceSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ChoiceSource::Static(a), ChoiceSource::Static(b)) => a == b,
            (ChoiceSource::Dynamic(a), ChoiceSource::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<'de> Deserialize<'de> for ChoiceSource {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Vec::<Choice>::deserialize(d).map(ChoiceSource::Static)
    }
}

/// Whether an option applies on this host.
#[derive(Clone)]
pub enum Condition {
    Static(bool),
    Dynamic(Predicate),
}

impl Condition {
    pub fn dynamic(f: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Condition::Dynamic(Arc::new(f))
    }

    pub fn holds(&self) -> bool {
        match self {
            Condition::Static(b) => *b,
            Condition::Dynamic(f) => f(),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Static(b) => f.debug_tuple("Static").field(b).finish(),
            Condition::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Condition::Static(a), Condition::Static(b)) => a == b,
            (Condition::Dynamic(a), Condition::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        bool::deserialize(d).map(Condition::Static)
    }
}

/// Config level an option may be set at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Runner,
    System,
}

// ── Descriptors ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct OptionDescriptor {
    pub option: String,
    pub kind: OptionType,
    pub label: String,
    pub help: Option<String>,
    pub default: Option<OptionValue>,
    pub advanced: bool,
    pub condition: Option<Condition>,
    pub choices: Option<ChoiceSource>,
    pub scope: Vec<Scope>,
}

impl OptionDescriptor {
    pub fn new(option: impl Into<String>, kind: OptionType, label: impl Into<String>) -> Self {
        OptionDescriptor {
            option: option.into(),
            kind,
            label: label.into(),
            help: None,
            default: None,
            advanced: false,
            condition: None,
            choices: None,
            scope: Vec::new(),
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn default_value(mut self, value: OptionValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn advanced(mut self) -> Self {
        self.advanced = true;
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn choices(mut self, choices: ChoiceSource) -> Self {
        self.choices = Some(choices);
        self
    }

    pub fn scope(mut self, scope: Vec<Scope>) -> Self {
        self.scope = scope;
        self
    }

    /// An option without a condition always applies.
    pub fn is_available(&self) -> bool {
        self.condition.as_ref().map_or(true, Condition::holds)
    }

    pub fn resolve_choices(&self) -> Vec<Choice> {
        self.choices
            .as_ref()
            .map(ChoiceSource::resolve)
            .unwrap_or_default()
    }

    /// Shallow per-field update: fields set on `ov` win.
    fn apply(&mut self, ov: &OptionOverride) {
        if let Some(kind) = ov.kind {
            self.kind = kind;
        }
        if let Some(ref label) = ov.label {
            self.label = label.clone();
        }
        if let Some(ref help) = ov.help {
            self.help = Some(help.clone());
        }
        if let Some(ref default) = ov.default {
            self.default = Some(default.clone());
        }
        if let Some(advanced) = ov.advanced {
            self.advanced = advanced;
        }
        if let Some(ref condition) = ov.condition {
            self.condition = Some(condition.clone());
        }
        if let Some(ref choices) = ov.choices {
            self.choices = Some(choices.clone());
        }
        if let Some(ref scope) = ov.scope {
            self.scope = scope.clone();
        }
    }
}

/// Evaluates conditions and choice producers so the form renderer gets
/// plain data.
impl Serialize for OptionDescriptor {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut st = s.serialize_struct("OptionDescriptor", 9)?;
        st.serialize_field("option", &self.option)?;
        st.serialize_field("type", &self.kind)?;
        st.serialize_field("label", &self.label)?;
        st.serialize_field("help", &self.help)?;
        st.serialize_field("default", &self.default)?;
        st.serialize_field("advanced", &self.advanced)?;
        st.serialize_field("condition", &self.is_available())?;
        let choices = self.choices.as_ref().map(ChoiceSource::resolve);
        st.serialize_field("choices", &choices)?;
        st.serialize_field("scope", &self.scope)?;
        st.end()
    }
}

/// Partial descriptor matched against a base list by `option`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OptionOverride {
    pub option: String,
    #[serde(default, rename = "type")]
    pub kind: Option<OptionType>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub default: Option<OptionValue>,
    #[serde(default)]
    pub advanced: Option<bool>,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub choices: Option<ChoiceSource>,
    #[serde(default)]
    pub scope: Option<Vec<Scope>>,
}

impl OptionOverride {
    pub fn new(option: impl Into<String>) -> Self {
        OptionOverride {
            option: option.into(),
            ..Default::default()
        }
    }

    pub fn with_default(mut self, value: OptionValue) -> Self {
        self.default = Some(value);
        self
    }
}

impl From<&OptionOverride> for OptionDescriptor {
    /// A brand-new key: unspecified kind is `String`, unspecified label is
    /// the key itself.
    fn from(ov: &OptionOverride) -> Self {
        let mut desc = OptionDescriptor::new(
            ov.option.clone(),
            ov.kind.unwrap_or(OptionType::String),
            ov.label.clone().unwrap_or_else(|| ov.option.clone()),
        );
        desc.apply(ov);
        desc
    }
}

// ── Ordered list ──────────────────────────────────────────────────────────────

/// Options in display order, unique by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionList {
    entries: IndexMap<String, OptionDescriptor>,
}

impl OptionList {
    /// Builds a list, refusing a key that appears twice.
    pub fn new(descriptors: Vec<OptionDescriptor>) -> Result<Self, SetupError> {
        let mut entries = IndexMap::with_capacity(descriptors.len());
        for desc in descriptors {
            if entries.contains_key(&desc.option) {
                return Err(SetupError::DuplicateOption(desc.option));
            }
            entries.insert(desc.option.clone(), desc);
        }
        Ok(OptionList { entries })
    }

    /// Replaces an existing entry in place or appends a new one.
    pub fn upsert(&mut self, desc: OptionDescriptor) {
        self.entries.insert(desc.option.clone(), desc);
    }

    pub fn get(&self, key: &str) -> Option<&OptionDescriptor> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionDescriptor> {
        self.entries.values()
    }

    /// Descriptors whose condition holds on this host.
    pub fn available(&self) -> impl Iterator<Item = &OptionDescriptor> {
        self.iter().filter(|d| d.is_available())
    }

    pub fn into_vec(self) -> Vec<OptionDescriptor> {
        self.entries.into_values().collect()
    }
}

impl Serialize for OptionList {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(self.entries.values())
    }
}

/// Folds `overrides` into a copy of `base`.
///
/// Existing keys keep their position and only the fields the override sets
/// change; unknown keys are appended in override order.
pub fn merge(base: &OptionList, overrides: &[OptionOverride]) -> OptionList {
    let mut merged = base.clone();
    for ov in overrides {
        match merged.entries.get_mut(&ov.option) {
            Some(existing) => existing.apply(ov),
            None => {
                merged.entries.insert(ov.option.clone(), OptionDescriptor::from(ov));
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(key: &str, v: &str) -> OptionDescriptor {
        OptionDescriptor::new(key, OptionType::String, key.to_uppercase())
            .default_value(OptionValue::text(v))
    }

    fn ov(key: &str, v: &str) -> OptionOverride {
        OptionOverride::new(key).with_default(OptionValue::text(v))
    }

    fn base() -> OptionList {
        OptionList::new(vec![desc("a", "1"), desc("b", "2"), desc("c", "3")]).unwrap()
    }

    fn defaults(list: &OptionList) -> Vec<(String, String)> {
        list.iter()
            .map(|d| {
                (
                    d.option.clone(),
                    d.default.as_ref().map(OptionValue::display).unwrap_or_default(),
                )
            })
            .collect()
    }

    #[test]
    fn override_and_append_example() {
        let merged = merge(&base(), &[ov("b", "99"), ov("d", "4")]);
        assert_eq!(
            defaults(&merged),
            vec![
                ("a".into(), "1".into()),
                ("b".into(), "99".into()),
                ("c".into(), "3".into()),
                ("d".into(), "4".into()),
            ]
        );
    }

    #[test]
    fn subset_overrides_keep_order_and_length() {
        let merged = merge(&base(), &[ov("c", "x"), ov("a", "y")]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn new_keys_are_appended_in_override_order() {
        let merged = merge(&base(), &[ov("z", "1"), ov("b", "0"), ov("m", "2")]);
        assert_eq!(merged.len(), 5);
        assert_eq!(
            merged.keys().collect::<Vec<_>>(),
            vec!["a", "b", "c", "z", "m"]
        );
    }

    #[test]
    fn empty_overrides_return_the_base() {
        assert_eq!(merge(&base(), &[]), base());
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let overrides = [ov("b", "99"), ov("d", "4")];
        let once = merge(&base(), &overrides);
        let twice = merge(&once, &overrides);
        assert_eq!(once, twice);
    }

    #[test]
    fn only_fields_present_in_override_change() {
        let base = OptionList::new(vec![desc("a", "1").advanced().help("about a")]).unwrap();
        let label_only = OptionOverride {
            option: "a".into(),
            label: Some("Renamed".into()),
            ..Default::default()
        };
        let merged = merge(&base, &[label_only]);
        let a = merged.get("a").unwrap();
        assert_eq!(a.label, "Renamed");
        assert!(a.advanced);
        assert_eq!(a.help.as_deref(), Some("about a"));
        assert_eq!(a.default, Some(OptionValue::text("1")));
    }

    #[test]
    fn base_is_left_untouched() {
        let base = base();
        let _ = merge(&base, &[ov("a", "changed")]);
        assert_eq!(base.get("a").unwrap().default, Some(OptionValue::text("1")));
    }

    #[test]
    fn new_key_gets_fallback_kind_and_label() {
        let merged = merge(&OptionList::default(), &[OptionOverride::new("extra")]);
        let extra = merged.get("extra").unwrap();
        assert_eq!(extra.kind, OptionType::String);
        assert_eq!(extra.label, "extra");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = OptionList::new(vec![desc("a", "1"), desc("a", "2")]).unwrap_err();
        assert!(matches!(err, SetupError::DuplicateOption(k) if k == "a"));
    }

    #[test]
    fn upsert_keeps_position() {
        let mut list = base();
        list.upsert(desc("a", "10"));
        assert_eq!(list.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(list.get("a").unwrap().default, Some(OptionValue::text("10")));
    }

    #[test]
    fn overrides_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            system_options_override: Vec<OptionOverride>,
        }
        let doc: Doc = toml::from_str(
            r#"
            [[system_options_override]]
            option = "disable_runtime"
            default = true

            [[system_options_override]]
            option = "xephyr"
            type = "choice"
            condition = false
            choices = [{ label = "Off", value = "off" }]
            "#,
        )
        .unwrap();
        let [runtime, xephyr] = &doc.system_options_override[..] else {
            panic!("expected two overrides");
        };
        assert_eq!(runtime.default, Some(OptionValue::Bool(true)));
        assert_eq!(xephyr.kind, Some(OptionType::Choice));
        assert_eq!(xephyr.condition, Some(Condition::Static(false)));
        assert_eq!(
            xephyr.choices,
            Some(ChoiceSource::Static(vec![Choice::new("Off", "off")]))
        );
    }

    #[test]
    fn serialized_descriptor_has_evaluated_fields() {
        let d = OptionDescriptor::new("mode", OptionType::Choice, "Mode")
            .condition(Condition::dynamic(|| false))
            .choices(ChoiceSource::dynamic(|| vec![Choice::new("Off", "off")]));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "choice");
        assert_eq!(json["condition"], false);
        assert_eq!(json["choices"][0]["value"], "off");
    }
}
