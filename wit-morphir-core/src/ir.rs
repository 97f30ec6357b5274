//! Morphir IR entities produced by `make` and consumed by `gen`.
//!
//! Only the subset the WIT binding needs: module definitions holding
//! type and value definitions, and the five type-expression forms.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z][a-z]*|[0-9]+").unwrap_or_else(|err| panic!("word regex: {err}"))
});

/// A name as a list of lower-case words.
///
/// `fooBar_baz 123` and `foo-bar-baz-123` both become
/// `["foo", "bar", "baz", "123"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(Vec<String>);

impl Name {
    pub fn from_str(text: &str) -> Name {
        Name(
            WORD.find_iter(text)
                .map(|m| m.as_str().to_lowercase())
                .collect(),
        )
    }

    pub fn from_parts<I, S>(parts: I) -> Name
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Name(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_camel_case(&self) -> String {
        let mut out = String::new();
        for (index, word) in self.0.iter().enumerate() {
            if index == 0 {
                out.push_str(word);
            } else {
                out.push_str(&capitalize(word));
            }
        }
        out
    }

    pub fn to_title_case(&self) -> String {
        self.0.iter().map(|word| capitalize(word)).collect()
    }

    /// camelCase rendering with a hyphen before each interior capital.
    pub fn to_kebab_case(&self) -> String {
        camel_to_kebab(&self.to_camel_case())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `PascalCase`/`camelCase` to kebab-case: a hyphen before every
/// upper-case letter except the first character, then lower-cased.
pub fn camel_to_kebab(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    for (index, ch) in text.chars().enumerate() {
        if index > 0 && ch.is_ascii_uppercase() {
            out.push('-');
        }
        out.push(ch);
    }
    out.to_lowercase()
}

/// A dot-separated list of names, e.g. `Morphir.SDK`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Name>);

impl Path {
    pub fn from_str(text: &str) -> Path {
        Path(
            text.split('.')
                .map(Name::from_str)
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }

    pub fn from_names(names: Vec<Name>) -> Path {
        Path(names)
    }

    pub fn names(&self) -> &[Name] {
        &self.0
    }

    pub fn last(&self) -> Option<&Name> {
        self.0.last()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(Name::to_title_case).collect();
        f.write_str(&rendered.join("."))
    }
}

/// Fully-qualified name: package path, module path, local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FQName {
    pub package_path: Path,
    pub module_path: Path,
    pub local_name: Name,
}

impl FQName {
    pub fn new(package_path: Path, module_path: Path, local_name: Name) -> FQName {
        FQName {
            package_path,
            module_path,
            local_name,
        }
    }

    /// `Package:Module:name`, exactly three parts.
    pub fn parse(text: &str) -> Result<FQName, CoreError> {
        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(CoreError::InvalidTypeRef(format!(
                "invalid FQName format {text:?}: expected 'Package:Module:name'"
            )));
        }
        Ok(FQName::new(
            Path::from_str(parts[0]),
            Path::from_str(parts[1]),
            Name::from_str(parts[2]),
        ))
    }

    /// A name in the Morphir SDK, e.g. `sdk("List", "List")`.
    pub fn sdk(module: &str, local: &str) -> FQName {
        FQName::new(
            Path::from_names(vec![Name::from_str("Morphir"), Name::from_parts(["s", "d", "k"])]),
            Path::from_names(vec![Name::from_str(module)]),
            Name::from_str(local),
        )
    }

    pub fn is_sdk(&self) -> bool {
        let names = self.package_path.names();
        names.len() >= 2
            && names[0].to_title_case() == "Morphir"
            && names[1].to_title_case() == "SDK"
    }

    /// Title-cased last segment of the module path.
    pub fn module_name(&self) -> String {
        self.module_path
            .last()
            .map(Name::to_title_case)
            .unwrap_or_default()
    }
}

impl fmt::Display for FQName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.package_path,
            self.module_path,
            self.local_name.to_camel_case()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlled<T> {
    pub access: Access,
    pub value: T,
}

impl<T> AccessControlled<T> {
    pub fn public(value: T) -> AccessControlled<T> {
        AccessControlled {
            access: Access::Public,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Documented<T> {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    pub value: T,
}

impl<T> Documented<T> {
    pub fn new(doc: impl Into<String>, value: T) -> Documented<T> {
        Documented {
            doc: doc.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Type {
    Variable { name: Name },
    Reference { name: FQName, params: Vec<Type> },
    Tuple { elements: Vec<Type> },
    Record { fields: Vec<RecordField> },
    Unit,
}

impl Type {
    pub fn reference(name: FQName, params: Vec<Type>) -> Type {
        Type::Reference { name, params }
    }

    pub fn variable(name: Name) -> Type {
        Type::Variable { name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: Name,
    pub tpe: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorArg {
    pub name: Name,
    pub tpe: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConstructor {
    pub name: Name,
    pub args: Vec<ConstructorArg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeDefinition {
    TypeAlias {
        params: Vec<Name>,
        expr: Type,
    },
    CustomType {
        params: Vec<Name>,
        constructors: AccessControlled<Vec<TypeConstructor>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueInput {
    pub name: Name,
    pub tpe: Type,
}

/// A value signature. Bodies are not part of the WIT mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDefinition {
    pub inputs: Vec<ValueInput>,
    pub output: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleType {
    pub name: Name,
    pub definition: AccessControlled<Documented<TypeDefinition>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleValue {
    pub name: Name,
    pub definition: AccessControlled<Documented<ValueDefinition>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub types: Vec<ModuleType>,
    pub values: Vec<ModuleValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl ModuleDefinition {
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<ModuleDefinition, CoreError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_morphir_style() {
        assert_eq!(
            Name::from_str("fooBar_baz 123").parts(),
            ["foo", "bar", "baz", "123"]
        );
        assert_eq!(Name::from_str("valueInUSD").parts(), ["value", "in", "u", "s", "d"]);
        assert!(Name::from_str("_-%").is_empty());
    }

    #[test]
    fn renders_cases() {
        let name = Name::from_str("wall-clock");
        assert_eq!(name.to_camel_case(), "wallClock");
        assert_eq!(name.to_title_case(), "WallClock");
        assert_eq!(name.to_kebab_case(), "wall-clock");
        assert_eq!(camel_to_kebab("DateTime"), "date-time");
    }

    #[test]
    fn parses_fq_names() {
        let fq = FQName::parse("Morphir.SDK:List:List").expect("fqname");
        assert!(fq.is_sdk());
        assert_eq!(fq.module_name(), "List");
        assert_eq!(fq, FQName::sdk("List", "List"));
        assert!(FQName::parse("A:B").is_err());
        assert!(FQName::parse("A:B:C:D").is_err());
    }

    #[test]
    fn sdk_name_display() {
        assert_eq!(FQName::sdk("Basics", "Int").to_string(), "Morphir.SDK:Basics:int");
    }

    #[test]
    fn module_json_round_trips() {
        let module = ModuleDefinition {
            types: vec![ModuleType {
                name: Name::from_str("id"),
                definition: AccessControlled::public(Documented::new(
                    "",
                    TypeDefinition::TypeAlias {
                        params: Vec::new(),
                        expr: Type::reference(FQName::sdk("Basics", "Int"), Vec::new()),
                    },
                )),
            }],
            values: Vec::new(),
            doc: None,
        };
        let json = module.to_json().expect("json");
        assert!(json.contains("\"kind\": \"TypeAlias\""));
        assert_eq!(ModuleDefinition::from_json(&json).expect("decode"), module);
    }
}
