use std::{collections::BTreeMap, fmt, sync::Arc};

use parking_lot::RwLock;

use crate::{
    ast::LiteralValue,
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        runtime::{monitor::Monitor, semaphore::Semaphore},
        value::{
            function::{Builtin, UserFunction},
            object::{Class, ObjectInstance},
        },
    },
    util::num::MAX_SAFE_U64_INT,
};

/// Shared, mutable array storage.
pub type ArrayRef = Arc<RwLock<Vec<Value>>>;
/// Shared, mutable map storage. Keys are kept sorted for stable display.
pub type MapRef = Arc<RwLock<BTreeMap<String, Value>>>;

/// Represents a runtime value in the interpreter.
///
/// Scalars are stored inline. Arrays, maps, functions, objects and the
/// synchronization primitives are reference types: cloning a `Value` clones
/// the handle, so every copy observes the same underlying data. This is what
/// lets tasks share state through variables they captured.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value, written `nil` or `null`.
    Nil,
    /// `true` or `false`.
    Bool(bool),
    /// Every number is a double precision float.
    Number(f64),
    /// An immutable string.
    Str(Arc<str>),
    /// An ordered, growable list.
    Array(ArrayRef),
    /// A string-keyed dictionary.
    Map(MapRef),
    /// A user function closing over its defining scope.
    Function(Arc<UserFunction>),
    /// A native function.
    Builtin(Builtin),
    /// A class, callable to create instances.
    Class(Arc<Class>),
    /// A class instance.
    Object(Arc<ObjectInstance>),
    /// A counting semaphore created by `semaphore(n)`.
    Semaphore(Arc<Semaphore>),
    /// A monitor created by `monitor()`.
    Monitor(Arc<Monitor>),
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(Arc::from(v))
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::Array(Arc::new(RwLock::new(v)))
    }
}

impl From<BTreeMap<String, Self>> for Value {
    fn from(v: BTreeMap<String, Self>) -> Self {
        Self::Map(Arc::new(RwLock::new(v)))
    }
}

impl From<&LiteralValue> for Value {
    fn from(lit: &LiteralValue) -> Self {
        match lit {
            LiteralValue::Number(n) => Self::Number(*n),
            LiteralValue::Str(s) => Self::from(s.as_str()),
            LiteralValue::Bool(b) => Self::Bool(*b),
            LiteralValue::Nil => Self::Nil,
        }
    }
}

impl Value {
    /// The name `typeOf` reports for this value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Function(_) | Self::Builtin(_) => "function",
            Self::Class(_) => "class",
            Self::Object(_) => "object",
            Self::Semaphore(_) => "semaphore",
            Self::Monitor(_) => "monitor",
        }
    }

    /// Applies the truthiness rule.
    ///
    /// `nil`, `false`, `0` and the empty string are falsy. Every other value,
    /// including empty arrays and maps, is truthy.
    ///
    /// ## Example
    /// ```
    /// use r2lang::interpreter::value::core::Value;
    ///
    /// assert!(!Value::Nil.is_truthy());
    /// assert!(!Value::from(0.0).is_truthy());
    /// assert!(!Value::from("").is_truthy());
    /// assert!(Value::from("0").is_truthy());
    /// assert!(Value::from(Vec::new()).is_truthy());
    /// ```
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Returns `true` if the value is `nil`.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Compares two values with the language's `==` rules.
    ///
    /// Numbers compare numerically, strings, booleans and `nil` only against
    /// their own type. Anything else is never equal, not even to itself, so
    /// `true == 1` and `[1] == [1]` are both false.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => false,
        }
    }

    /// Coerces the value to a number for arithmetic.
    ///
    /// Numbers pass through, booleans become `1`/`0` and strings are parsed
    /// after trimming whitespace.
    ///
    /// ## Errors
    /// `TypeError` for strings that are not numeric and for every other type.
    pub fn to_number(&self, line: usize) -> EvalResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Bool(b) => Ok(f64::from(u8::from(*b))),
            Self::Str(s) => s.trim().parse::<f64>().map_err(|_| {
                                                          RuntimeError::TypeError {
                    details: format!("Cannot convert string '{s}' to a number"),
                    line,
                }
                                                      }),
            other => Err(RuntimeError::TypeError { details: format!("Expected a number, found \
                                                                     {}",
                                                                    other.type_name()),
                                                   line }),
        }
    }

    /// Returns the number without any coercion.
    ///
    /// ## Errors
    /// `TypeError` if the value is not a number.
    pub fn as_number(&self, line: usize) -> EvalResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            other => Err(RuntimeError::TypeError { details: format!("Expected a number, found \
                                                                     {}",
                                                                    other.type_name()),
                                                   line }),
        }
    }

    /// Returns the string slice without any coercion.
    ///
    /// ## Errors
    /// `TypeError` if the value is not a string.
    pub fn as_str(&self, line: usize) -> EvalResult<&str> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(RuntimeError::TypeError { details: format!("Expected a string, found \
                                                                     {}",
                                                                    other.type_name()),
                                                   line }),
        }
    }

    /// Produces a structurally independent copy.
    ///
    /// Arrays and maps are copied recursively. Functions, classes, objects and
    /// synchronization primitives stay shared.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::Array(items) => {
                let copied = items.read().iter().map(Self::deep_copy).collect::<Vec<_>>();
                Self::from(copied)
            },
            Self::Map(entries) => {
                let copied = entries.read()
                                    .iter()
                                    .map(|(k, v)| (k.clone(), v.deep_copy()))
                                    .collect::<BTreeMap<_, _>>();
                Self::from(copied)
            },
            other => other.clone(),
        }
    }

    /// Renders the key a map stores this value under.
    ///
    /// Map keys are strings; other values use their display form, so `m[1]`
    /// and `m["1"]` address the same entry.
    #[must_use]
    pub fn to_key(&self) -> String {
        match self {
            Self::Str(s) => s.to_string(),
            other => other.to_string(),
        }
    }
}

/// Writes a number the way scripts expect to see it: integral values without
/// a fractional part, everything else in shortest round-trip form.
fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    #[allow(clippy::cast_precision_loss)]
    const LIMIT: f64 = MAX_SAFE_U64_INT as f64;

    if n.is_nan() {
        write!(f, "NaN")
    } else if n.is_infinite() {
        write!(f, "{}", if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n.fract() == 0.0 && n.abs() <= LIMIT {
        // `-0.0` formats as "-0" otherwise.
        write!(f, "{}", if n == 0.0 { 0.0 } else { n })
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => fmt_number(*n, f),
            Self::Str(s) => write!(f, "{s}"),
            Self::Array(items) => {
                write!(f, "[")?;

                for (index, value) in items.read().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }

                    write!(f, "{value}")?;
                }

                write!(f, "]")
            },
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (index, (key, value)) in entries.read().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            },
            Self::Function(func) => match &func.def.name {
                Some(name) => write!(f, "<function {name}>"),
                None => write!(f, "<function>"),
            },
            Self::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
            Self::Class(class) => write!(f, "<class {}>", class.name),
            Self::Object(object) => write!(f, "<{} object>", object.class.name),
            Self::Semaphore(_) => write!(f, "<semaphore>"),
            Self::Monitor(_) => write!(f, "<monitor>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_display_without_trailing_zeros() {
        assert_eq!(Value::from(5.0).to_string(), "5");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(0.1 + 0.2).to_string(), "0.30000000000000004");
    }

    #[test]
    fn collections_display_nested() {
        let inner = Value::from(vec![Value::from(1.0), Value::from("a")]);
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), Value::Nil);
        map.insert("a".to_string(), inner);

        assert_eq!(Value::from(map).to_string(), "{a: [1, a], b: nil}");
    }

    #[test]
    fn equality_only_holds_between_scalars_of_one_type() {
        let a = Value::from(vec![Value::from(1.0)]);

        assert!(!a.loose_eq(&a.clone()));
        assert!(!Value::from(1.0).loose_eq(&Value::from(true)));
        assert!(!Value::from(false).loose_eq(&Value::from(0.0)));
        assert!(!Value::Nil.loose_eq(&Value::from(0.0)));
        assert!(Value::Nil.loose_eq(&Value::Nil));
        assert!(Value::from("ab").loose_eq(&Value::from("ab")));
    }

    #[test]
    fn deep_copy_detaches_nested_arrays() {
        let inner = Value::from(vec![Value::from(1.0)]);
        let outer = Value::from(vec![inner.clone()]);
        let copy = outer.deep_copy();

        if let Value::Array(items) = &inner {
            items.write().push(Value::from(2.0));
        }

        assert_eq!(outer.to_string(), "[[1, 2]]");
        assert_eq!(copy.to_string(), "[[1]]");
    }

    #[test]
    fn string_coercion() {
        assert_eq!(Value::from(" 4.5 ").to_number(1).unwrap(), 4.5);
        assert!(Value::from("abc").to_number(1).is_err());
        assert!(Value::Nil.to_number(1).is_err());
    }
}
