//! Built-in platform types.
//!
//! These definitions are always available to archives through the shared
//! catalog. An archive still has to declare a type (for example with a
//! `plugscan/lang/Text.unit` entry) for it to be cataloged.

use anyhow::Context;
use serde_json::Value;

use super::catalog::{FactoryCatalog, TypeDef};
use super::types::ParamKind;

pub const TEXT: &str = "plugscan.lang.Text";
pub const COUNTER: &str = "plugscan.lang.Counter";
pub const FLAG: &str = "plugscan.lang.Flag";

/// Integer counter produced by `plugscan.lang.Counter`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    value: i64,
}

impl Counter {
    pub fn starting_at(value: i64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn increment(&mut self) -> i64 {
        self.value += 1;
        self.value
    }
}

/// Catalog holding every built-in type.
pub fn catalog() -> FactoryCatalog {
    FactoryCatalog::new()
        .with(
            TypeDef::new(TEXT)
                .constructor(vec![], |_| Ok(Box::new(String::new())))
                .constructor(vec![ParamKind::String], |args| {
                    let text = args[0].as_str().context("expected a string")?;
                    Ok(Box::new(text.to_string()))
                })
                .constructor(vec![ParamKind::Array], |args| {
                    let parts = args[0].as_array().context("expected an array")?;
                    let joined = parts
                        .iter()
                        .map(|v| match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(" ");
                    Ok(Box::new(joined))
                }),
        )
        .with(
            TypeDef::new(COUNTER)
                .constructor(vec![], |_| Ok(Box::new(Counter::default())))
                .constructor(vec![ParamKind::Integer], |args| {
                    let start = args[0].as_i64().context("counter start out of range")?;
                    Ok(Box::new(Counter::starting_at(start)))
                }),
        )
        .with(TypeDef::new(FLAG).constructor(vec![ParamKind::Bool], |args| {
            let flag = args[0].as_bool().context("expected a bool")?;
            Ok(Box::new(flag))
        }))
}
