//! A loosely-typed, string-keyed parameter bag, the same shape scene
//! description formats (and the CLI) use to configure materials, lights and
//! render settings without this crate knowing about any particular file
//! format.

use crate::errors::{Error, Result};
use crate::{Float, Point3f, Vec3f};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    Int(i64),
    Float(Float),
    Bool(bool),
    String(String),
    Vector(Vec3f),
    Point(Point3f),
    Color([Float; 3]),
}

#[derive(Clone, Debug, Default)]
pub struct ParamMap {
    values: HashMap<String, Param>,
    accessed: std::cell::RefCell<std::collections::HashSet<String>>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Param) -> &mut Self {
        self.values.insert(key.into(), value);
        self
    }

    fn mark_accessed(&self, key: &str) {
        self.accessed.borrow_mut().insert(key.to_string());
    }

    pub fn get_float(&self, key: &str, default: Float) -> Float {
        self.mark_accessed(key);
        match self.values.get(key) {
            Some(Param::Float(v)) => *v,
            Some(Param::Int(v)) => *v as Float,
            _ => default,
        }
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.mark_accessed(key);
        match self.values.get(key) {
            Some(Param::Int(v)) => *v,
            _ => default,
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.mark_accessed(key);
        match self.values.get(key) {
            Some(Param::Bool(v)) => *v,
            _ => default,
        }
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.mark_accessed(key);
        match self.values.get(key) {
            Some(Param::String(v)) => v.clone(),
            _ => default.to_string(),
        }
    }

    pub fn get_color(&self, key: &str, default: [Float; 3]) -> [Float; 3] {
        self.mark_accessed(key);
        match self.values.get(key) {
            Some(Param::Color(v)) => *v,
            _ => default,
        }
    }

    pub fn get_vector(&self, key: &str, default: Vec3f) -> Vec3f {
        self.mark_accessed(key);
        match self.values.get(key) {
            Some(Param::Vector(v)) => *v,
            _ => default,
        }
    }

    pub fn require_float(&self, key: &str) -> Result<Float> {
        self.mark_accessed(key);
        match self.values.get(key) {
            Some(Param::Float(v)) => Ok(*v),
            Some(Param::Int(v)) => Ok(*v as Float),
            Some(_) => Err(Error::BadParam { name: key.to_string(), reason: "expected a float".into() }),
            None => Err(Error::MissingParam(key.to_string())),
        }
    }

    pub fn require_string(&self, key: &str) -> Result<String> {
        self.mark_accessed(key);
        match self.values.get(key) {
            Some(Param::String(v)) => Ok(v.clone()),
            Some(_) => Err(Error::BadParam { name: key.to_string(), reason: "expected a string".into() }),
            None => Err(Error::MissingParam(key.to_string())),
        }
    }

    /// Logs a warning (via `tracing`) for every key present in the map that
    /// was never read by any `get_*`/`require_*` call - typically a typo'd
    /// or stale parameter in a hand-written scene description.
    pub fn warn_unused(&self, context: &str) {
        let accessed = self.accessed.borrow();
        for key in self.values.keys() {
            if !accessed.contains(key) {
                tracing::warn!(param = %key, %context, "unused parameter");
            }
        }
    }
}
