use crate::{
    ast::{BinaryOperator, Expr},
    error::RuntimeError,
    interpreter::{
        environment::Env,
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::{resolve_index, resolve_write_index, usize_to_f64},
};

impl Context {
    /// Reads `object.name`.
    ///
    /// Objects expose their fields and bound methods, maps their entries and
    /// arrays and strings their `length`.
    ///
    /// ## Errors
    /// `MissingMember` if the value has no such member.
    pub(crate) fn get_member(object: &Value, name: &str, line: usize) -> EvalResult<Value> {
        let missing = || RuntimeError::MissingMember { name: name.to_string(),
                                                       type_name: object.type_name(),
                                                       line };
        match object {
            Value::Object(instance) => instance.member(name).ok_or_else(missing),
            Value::Map(entries) => entries.read().get(name).cloned().ok_or_else(missing),
            Value::Array(items) if name == "length" => {
                Ok(Value::from(usize_to_f64(items.read().len())))
            },
            Value::Str(s) if name == "length" => Ok(Value::from(usize_to_f64(s.chars().count()))),
            _ => Err(missing()),
        }
    }

    /// Reads `object[index]`.
    ///
    /// Arrays and strings take integer positions, negative ones counting
    /// from the end. Maps take any key and yield `nil` when it is absent.
    /// Objects can be indexed by member name.
    ///
    /// ## Errors
    /// `IndexOutOfBounds` for positions past either end and `TypeError` for
    /// values that cannot be indexed.
    pub(crate) fn get_index(object: &Value, index: &Value, line: usize) -> EvalResult<Value> {
        match object {
            Value::Array(items) => {
                let items = items.read();
                let position = resolve_index(index.as_number(line)?, items.len(), line)?;
                Ok(items[position].clone())
            },
            Value::Str(s) => {
                let chars = s.chars().collect::<Vec<_>>();
                let position = resolve_index(index.as_number(line)?, chars.len(), line)?;
                Ok(Value::from(chars[position].to_string()))
            },
            Value::Map(entries) => Ok(entries.read().get(&index.to_key()).cloned().unwrap_or(Value::Nil)),
            Value::Object(_) => Self::get_member(object, &index.to_key(), line),
            other => Err(RuntimeError::TypeError { details: format!("Cannot index into {}",
                                                                    other.type_name()),
                                                   line }),
        }
    }

    /// Stores `value` into an assignment target.
    ///
    /// - A name updates its nearest binding, or is declared in the
    ///   script's top-level scope.
    /// - `object.name` sets an object member or a map entry.
    /// - `array[i]` replaces an element; positions past the end grow the
    ///   array, filling the gap with `nil`.
    /// - `map[key]` inserts or replaces an entry.
    ///
    /// The object and index are evaluated after the assigned value.
    pub(crate) fn assign(&self, target: &Expr, value: Value, line: usize, env: &Env) -> EvalResult<()> {
        match target {
            Expr::Identifier { name, .. } => env.assign(name, value, line),
            Expr::Member { object, name, .. } => {
                let object = self.eval(object, env)?;
                Self::set_member(&object, name, value, line)
            },
            Expr::Index { object, index, .. } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                Self::set_index(&object, &index, value, line)
            },
            _ => Err(RuntimeError::TypeError { details: "Invalid assignment target".to_string(),
                                               line }),
        }
    }

    /// Applies `target op= operand` and returns the stored value.
    ///
    /// The target's object and index are evaluated once, before the operand.
    /// The current value is then read, combined and written back to the same
    /// place.
    pub(crate) fn compound_assign(&self,
                                  target: &Expr,
                                  op: BinaryOperator,
                                  operand: &Expr,
                                  line: usize,
                                  env: &Env)
                                  -> EvalResult<Value> {
        match target {
            Expr::Identifier { name, .. } => {
                let current = env.get(name)
                                 .ok_or_else(|| RuntimeError::UnknownVariable { name: name.clone(),
                                                                                line })?;
                let operand = self.eval(operand, env)?;
                let value = Self::eval_binary(op, &current, &operand, line)?;
                env.assign(name, value.clone(), line)?;
                Ok(value)
            },
            Expr::Member { object, name, .. } => {
                let object = self.eval(object, env)?;
                let current = Self::get_member(&object, name, line)?;
                let operand = self.eval(operand, env)?;
                let value = Self::eval_binary(op, &current, &operand, line)?;
                Self::set_member(&object, name, value.clone(), line)?;
                Ok(value)
            },
            Expr::Index { object, index, .. } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                let current = Self::get_index(&object, &index, line)?;
                let operand = self.eval(operand, env)?;
                let value = Self::eval_binary(op, &current, &operand, line)?;
                Self::set_index(&object, &index, value.clone(), line)?;
                Ok(value)
            },
            _ => Err(RuntimeError::TypeError { details: "Invalid assignment target".to_string(),
                                               line }),
        }
    }

    fn set_member(object: &Value, name: &str, value: Value, line: usize) -> EvalResult<()> {
        match object {
            Value::Object(instance) => {
                instance.env.define(name, value);
                Ok(())
            },
            Value::Map(entries) => {
                entries.write().insert(name.to_string(), value);
                Ok(())
            },
            other => Err(RuntimeError::TypeError { details: format!("Cannot set member '{name}' \
                                                                     on {}",
                                                                    other.type_name()),
                                                   line }),
        }
    }

    fn set_index(object: &Value, index: &Value, value: Value, line: usize) -> EvalResult<()> {
        match object {
            Value::Array(items) => {
                let mut items = items.write();
                let position = resolve_write_index(index.as_number(line)?, items.len(), line)?;
                if position >= items.len() {
                    items.resize(position + 1, Value::Nil);
                }
                items[position] = value;
                Ok(())
            },
            Value::Map(entries) => {
                entries.write().insert(index.to_key(), value);
                Ok(())
            },
            Value::Object(_) => Self::set_member(object, &index.to_key(), value, line),
            other => Err(RuntimeError::TypeError { details: format!("Cannot assign by index \
                                                                     into {}",
                                                                    other.type_name()),
                                                   line }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_indices_count_from_the_end() {
        let array = Value::from(vec![Value::from(1.0), Value::from(2.0), Value::from(3.0)]);
        assert_eq!(Context::get_index(&array, &Value::from(-1.0), 1).unwrap().to_string(), "3");
        assert!(matches!(Context::get_index(&array, &Value::from(3.0), 9),
                         Err(RuntimeError::IndexOutOfBounds { index: 3, len: 3, line: 9 })));
    }

    #[test]
    fn writing_past_the_end_grows_the_array() {
        let array = Value::from(vec![Value::from(1.0)]);
        Context::set_index(&array, &Value::from(3.0), Value::from(4.0), 1).unwrap();
        assert_eq!(array.to_string(), "[1, nil, nil, 4]");
    }

    #[test]
    fn writing_far_past_the_end_fails() {
        let array = Value::from(vec![Value::from(1.0)]);
        assert!(matches!(Context::set_index(&array, &Value::from(1e15), Value::Nil, 6),
                         Err(RuntimeError::CapacityExceeded { line: 6, .. })));
        assert_eq!(array.to_string(), "[1]");
    }

    #[test]
    fn missing_map_keys_read_as_nil() {
        let map = Value::from(std::collections::BTreeMap::new());
        Context::set_index(&map, &Value::from(1.0), Value::from("one"), 1).unwrap();

        assert_eq!(Context::get_index(&map, &Value::from("1"), 1).unwrap().to_string(), "one");
        assert!(Context::get_index(&map, &Value::from("2"), 1).unwrap().is_nil());
        assert!(Context::get_member(&map, "2", 1).is_err());
    }

    #[test]
    fn strings_index_by_character() {
        let text = Value::from("héllo");
        assert_eq!(Context::get_index(&text, &Value::from(1.0), 1).unwrap().to_string(), "é");
        assert_eq!(Context::get_member(&text, "length", 1).unwrap().to_string(), "5");
    }
}
