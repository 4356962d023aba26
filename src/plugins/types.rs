//! Plugin types for PlugScan
//!
//! This module defines the runtime representation of a cataloged plugin
//! type: its names, the archive it was found in, and the constructors it
//! can be instantiated through. Constructor arguments are passed as
//! `serde_json::Value`s and matched against declared [`ParamKind`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{PlugError, Result};

/// An object produced by a plugin constructor.
pub type PluginObject = Box<dyn Any + Send + Sync>;

/// Shared handle to a loaded type. The index stores these by reference.
pub type TypeRef = Arc<LoadedType>;

/// Factory function behind a [`Constructor`].
pub type Factory = Arc<dyn Fn(&[Value]) -> anyhow::Result<PluginObject> + Send + Sync>;

/// Parameter type descriptor for constructor matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl ParamKind {
    /// Runtime type of an argument value.
    ///
    /// `Value::Null` carries no type information and yields `None`, which
    /// matches any declared parameter during constructor selection.
    pub fn of(value: &Value) -> Option<ParamKind> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ParamKind::Bool),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(ParamKind::Integer),
            Value::Number(_) => Some(ParamKind::Float),
            Value::String(_) => Some(ParamKind::String),
            Value::Array(_) => Some(ParamKind::Array),
            Value::Object(_) => Some(ParamKind::Object),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Bool => "bool",
            ParamKind::Integer => "integer",
            ParamKind::Float => "float",
            ParamKind::String => "string",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Derive the call signature of a list of arguments.
pub fn signature_of(args: &[Value]) -> Vec<Option<ParamKind>> {
    args.iter().map(ParamKind::of).collect()
}

fn format_signature(signature: &[Option<ParamKind>]) -> String {
    let parts: Vec<String> = signature
        .iter()
        .map(|p| p.map_or_else(|| "?".to_string(), |k| k.to_string()))
        .collect();
    format!("({})", parts.join(", "))
}

/// One way of instantiating a plugin type.
#[derive(Clone)]
pub struct Constructor {
    params: Vec<ParamKind>,
    factory: Factory,
}

impl Constructor {
    /// Create a constructor taking `params` in order.
    pub fn new<F>(params: Vec<ParamKind>, factory: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<PluginObject> + Send + Sync + 'static,
    {
        Self {
            params,
            factory: Arc::new(factory),
        }
    }

    /// Declared parameter kinds, in order.
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether this constructor accepts a call with `signature`.
    ///
    /// Arity must match exactly; a `None` entry matches any parameter kind.
    pub fn accepts(&self, signature: &[Option<ParamKind>]) -> bool {
        self.params.len() == signature.len()
            && self
                .params
                .iter()
                .zip(signature)
                .all(|(declared, given)| given.map_or(true, |g| g == *declared))
    }

    /// Run the factory.
    pub fn invoke(&self, args: &[Value]) -> anyhow::Result<PluginObject> {
        (self.factory)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A plugin type discovered in an archive and resolved by a loader.
#[derive(Debug, Clone)]
pub struct LoadedType {
    qualified_name: String,
    short_name: String,
    origin: PathBuf,
    constructors: Vec<Constructor>,
}

impl LoadedType {
    /// Create a loaded type. The short name is the final `.` segment.
    pub fn new(
        qualified_name: impl Into<String>,
        origin: impl Into<PathBuf>,
        constructors: Vec<Constructor>,
    ) -> Self {
        let qualified_name = qualified_name.into();
        let short_name = short_name_of(&qualified_name).to_string();
        Self {
            qualified_name,
            short_name,
            origin: origin.into(),
            constructors,
        }
    }

    /// Globally unique, namespace-prefixed name.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Final segment of the qualified name. Not unique.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Archive this type was loaded from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Instantiate through the zero-argument constructor.
    pub fn instantiate_default(&self) -> Result<PluginObject> {
        match self.constructors.iter().find(|c| c.arity() == 0) {
            Some(ctor) => self.invoke(ctor, &[]),
            None => Err(PlugError::Construction(format!(
                "{} has no zero-argument constructor",
                self.qualified_name
            ))),
        }
    }

    /// Instantiate through the constructor matching the runtime types of
    /// `args`.
    ///
    /// Null arguments match any parameter kind. When nulls make more than
    /// one constructor eligible the call is rejected as ambiguous.
    pub fn instantiate(&self, args: &[Value]) -> Result<PluginObject> {
        let signature = signature_of(args);
        let matching: Vec<&Constructor> = self
            .constructors
            .iter()
            .filter(|c| c.accepts(&signature))
            .collect();

        match matching.as_slice() {
            [ctor] => self.invoke(ctor, args),
            [] if !self.constructors.iter().any(|c| c.arity() == args.len()) => {
                Err(PlugError::Construction(format!(
                    "{} has no constructor taking {} argument(s)",
                    self.qualified_name,
                    args.len()
                )))
            }
            [] => Err(PlugError::Construction(format!(
                "{} has no constructor matching {}",
                self.qualified_name,
                format_signature(&signature)
            ))),
            _ => Err(PlugError::Construction(format!(
                "{} has {} constructors matching {}; pass typed values instead of null",
                self.qualified_name,
                matching.len(),
                format_signature(&signature)
            ))),
        }
    }

    fn invoke(&self, ctor: &Constructor, args: &[Value]) -> Result<PluginObject> {
        ctor.invoke(args).map_err(|e| {
            PlugError::Construction(format!(
                "{} constructor failed: {:#}",
                self.qualified_name, e
            ))
        })
    }
}

/// Final `.` segment of a qualified name.
pub fn short_name_of(qualified_name: &str) -> &str {
    qualified_name
        .rsplit('.')
        .next()
        .unwrap_or(qualified_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point_type() -> LoadedType {
        LoadedType::new(
            "geo.shapes.Point",
            "/tmp/geo.zip",
            vec![
                Constructor::new(vec![], |_| Ok(Box::new((0i64, 0i64)))),
                Constructor::new(vec![ParamKind::Integer, ParamKind::Integer], |args| {
                    let x = args[0].as_i64().unwrap_or_default();
                    let y = args[1].as_i64().unwrap_or_default();
                    Ok(Box::new((x, y)))
                }),
                Constructor::new(vec![ParamKind::String], |args| {
                    let label = args[0].as_str().unwrap_or_default();
                    if label.is_empty() {
                        anyhow::bail!("label must not be empty");
                    }
                    Ok(Box::new(label.to_string()))
                }),
            ],
        )
    }

    #[test]
    fn test_short_name_derivation() {
        let t = point_type();
        assert_eq!(t.qualified_name(), "geo.shapes.Point");
        assert_eq!(t.short_name(), "Point");
        assert_eq!(t.origin(), Path::new("/tmp/geo.zip"));
    }

    #[test]
    fn test_short_name_without_namespace() {
        assert_eq!(short_name_of("Point"), "Point");
        let t = LoadedType::new("Point", "/tmp/a.zip", vec![]);
        assert_eq!(t.short_name(), t.qualified_name());
    }

    #[test]
    fn test_param_kind_of() {
        assert_eq!(ParamKind::of(&json!(true)), Some(ParamKind::Bool));
        assert_eq!(ParamKind::of(&json!(3)), Some(ParamKind::Integer));
        assert_eq!(ParamKind::of(&json!(3.5)), Some(ParamKind::Float));
        assert_eq!(ParamKind::of(&json!("x")), Some(ParamKind::String));
        assert_eq!(ParamKind::of(&json!([1])), Some(ParamKind::Array));
        assert_eq!(ParamKind::of(&json!({"a": 1})), Some(ParamKind::Object));
        assert_eq!(ParamKind::of(&Value::Null), None);
    }

    #[test]
    fn test_instantiate_default() {
        let obj = point_type().instantiate_default().unwrap();
        assert_eq!(obj.downcast_ref::<(i64, i64)>(), Some(&(0, 0)));
    }

    #[test]
    fn test_instantiate_default_missing() {
        let t = LoadedType::new(
            "geo.Label",
            "/tmp/geo.zip",
            vec![Constructor::new(vec![ParamKind::String], |_| Ok(Box::new(())))],
        );
        let err = t.instantiate_default().unwrap_err();
        assert!(matches!(err, PlugError::Construction(_)));
        assert!(err.to_string().contains("no zero-argument constructor"));
    }

    #[test]
    fn test_instantiate_selects_by_signature() {
        let t = point_type();
        let obj = t.instantiate(&[json!(3), json!(4)]).unwrap();
        assert_eq!(obj.downcast_ref::<(i64, i64)>(), Some(&(3, 4)));

        let obj = t.instantiate(&[json!("origin")]).unwrap();
        assert_eq!(obj.downcast_ref::<String>().map(String::as_str), Some("origin"));
    }

    #[test]
    fn test_instantiate_arity_mismatch() {
        let err = point_type()
            .instantiate(&[json!(1), json!(2), json!(3)])
            .unwrap_err();
        assert!(err.to_string().contains("taking 3 argument(s)"));
    }

    #[test]
    fn test_instantiate_type_mismatch() {
        let err = point_type()
            .instantiate(&[json!(1), json!("two")])
            .unwrap_err();
        assert!(err.to_string().contains("(integer, string)"));
    }

    #[test]
    fn test_null_argument_is_wildcard() {
        let obj = point_type().instantiate(&[json!(7), Value::Null]).unwrap();
        assert_eq!(obj.downcast_ref::<(i64, i64)>(), Some(&(7, 0)));
    }

    #[test]
    fn test_null_argument_ambiguous() {
        let t = LoadedType::new(
            "geo.Tag",
            "/tmp/geo.zip",
            vec![
                Constructor::new(vec![ParamKind::String], |_| Ok(Box::new(1u8))),
                Constructor::new(vec![ParamKind::Integer], |_| Ok(Box::new(2u8))),
            ],
        );
        let err = t.instantiate(&[Value::Null]).unwrap_err();
        assert!(err.to_string().contains("2 constructors matching (?)"));
    }

    #[test]
    fn test_constructor_failure_is_construction_error() {
        let err = point_type().instantiate(&[json!("")]).unwrap_err();
        assert!(matches!(err, PlugError::Construction(_)));
        assert!(err.to_string().contains("label must not be empty"));
    }

    #[test]
    fn test_constructor_debug_hides_factory() {
        let ctor = Constructor::new(vec![ParamKind::Bool], |_| Ok(Box::new(())));
        assert_eq!(format!("{:?}", ctor), "Constructor { params: [Bool], .. }");
    }
}
