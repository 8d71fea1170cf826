use std::cmp::Ordering;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::{
            binary::comparison::sort_order,
            core::{Context, EvalResult},
            function::core::{arg, invalid_argument},
        },
        value::{
            core::{ArrayRef, MapRef, Value},
            function::Arity,
        },
    },
    util::num::{resolve_write_index, usize_to_f64},
};

fn expect_args(method: &str, args: &[Value], arity: Arity, line: usize) -> EvalResult<()> {
    if arity.check(args.len()) {
        return Ok(());
    }
    Err(RuntimeError::ArgumentCountMismatch { function: method.to_string(),
                                              expected: arity.to_string(),
                                              found: args.len(),
                                              line })
}

fn no_method(name: &str, type_name: &'static str, line: usize) -> RuntimeError {
    RuntimeError::MissingMember { name: name.to_string(),
                                  type_name,
                                  line }
}

/// Clamps a possibly negative `slice`/`substring` bound into `0..=len`.
fn clamp_bound(value: &Value, len: usize, line: usize) -> EvalResult<usize> {
    let bound = value.as_number(line)?.trunc();
    let len_f = usize_to_f64(len);
    let position = if bound < 0.0 { (len_f + bound).max(0.0) } else { bound.min(len_f) };
    resolve_write_index(position, len, line)
}

fn slice_bounds(args: &[Value], len: usize, line: usize) -> EvalResult<(usize, usize)> {
    let start = clamp_bound(&args[0], len, line)?;
    let end = match args.get(1) {
        Some(end) => clamp_bound(end, len, line)?,
        None => len,
    };
    Ok((start, end.max(start)))
}

fn index_value(index: usize) -> Value {
    Value::from(usize_to_f64(index))
}

impl Context {
    /// Calls a native array method.
    ///
    /// `push`, `pop`, `remove` and `insert_at` change the array in place and
    /// are visible through every reference to it. The others leave it as is
    /// and return a new value. Methods taking a callback work on a snapshot
    /// of the elements, so the callback may modify the array.
    ///
    /// ## Errors
    /// `MissingMember` for unknown methods, argument errors, and errors
    /// raised by callbacks.
    pub(crate) fn call_array_method(&self,
                                    items: &ArrayRef,
                                    name: &str,
                                    args: &[Value],
                                    line: usize)
                                    -> EvalResult<Value> {
        let this = || Value::Array(items.clone());

        match name {
            "len" | "length" | "size" => {
                expect_args(name, args, Arity::Exact(0), line)?;
                Ok(index_value(items.read().len()))
            },
            "push" | "append" | "add" | "insert" => {
                expect_args(name, args, Arity::AtLeast(1), line)?;
                items.write().extend(args.iter().cloned());
                Ok(this())
            },
            "pop" => {
                expect_args(name, args, Arity::Exact(0), line)?;
                Ok(items.write().pop().unwrap_or(Value::Nil))
            },
            "remove" | "delete" | "del" => {
                expect_args(name, args, Arity::AtLeast(1), line)?;
                items.write().retain(|item| !args.iter().any(|a| a.loose_eq(item)));
                Ok(this())
            },
            "insert_at" => {
                expect_args(name, args, Arity::Exact(2), line)?;
                let mut items = items.write();
                let position = resolve_write_index(args[0].as_number(line)?, items.len(), line)?;
                if position > items.len() {
                    items.resize(position, Value::Nil);
                }
                items.insert(position, args[1].clone());
                drop(items);
                Ok(this())
            },
            "map" | "each" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                let snapshot = items.read().clone();
                let mapped = snapshot.into_iter()
                                     .map(|item| self.call_value(&args[0], vec![item], line))
                                     .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::from(mapped))
            },
            "filter" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                let snapshot = items.read().clone();
                let mut kept = Vec::new();
                for item in snapshot {
                    if self.call_value(&args[0], vec![item.clone()], line)?.is_truthy() {
                        kept.push(item);
                    }
                }
                Ok(Value::from(kept))
            },
            "reduce" => {
                expect_args(name, args, Arity::Range(1, 2), line)?;
                let mut snapshot = items.read().clone().into_iter();
                let mut acc = match args.get(1) {
                    Some(initial) => initial.clone(),
                    None => snapshot.next().ok_or_else(|| {
                                               invalid_argument("reduce",
                                                                "empty array with no initial value",
                                                                line)
                                           })?,
                };
                for item in snapshot {
                    acc = self.call_value(&args[0], vec![acc, item], line)?;
                }
                Ok(acc)
            },
            "reverse" | "rev" => {
                expect_args(name, args, Arity::Exact(0), line)?;
                let mut reversed = items.read().clone();
                reversed.reverse();
                Ok(Value::from(reversed))
            },
            "sort" => {
                expect_args(name, args, Arity::Range(0, 1), line)?;
                let mut sorted = items.read().clone();
                match args.first() {
                    Some(compare) => self.sort_with(&mut sorted, compare, line)?,
                    None => sorted.sort_by(sort_order),
                }
                Ok(Value::from(sorted))
            },
            "find" | "index" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                let matches = self.matching_indices(items, &args[0], true, line)?;
                Ok(matches.first().map_or(Value::Nil, |i| index_value(*i)))
            },
            "find_all" | "indexes" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                let matches = self.matching_indices(items, &args[0], false, line)?;
                Ok(Value::from(matches.into_iter().map(index_value).collect::<Vec<_>>()))
            },
            "contains" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                Ok(Value::Bool(items.read().iter().any(|item| item.loose_eq(&args[0]))))
            },
            "join" => {
                expect_args(name, args, Arity::Range(0, 1), line)?;
                let separator = match arg(args, 0) {
                    Value::Nil => ",".to_string(),
                    separator => separator.to_string(),
                };
                let joined = items.read()
                                  .iter()
                                  .map(ToString::to_string)
                                  .collect::<Vec<_>>()
                                  .join(&separator);
                Ok(Value::from(joined))
            },
            "slice" => {
                expect_args(name, args, Arity::Range(1, 2), line)?;
                let items = items.read();
                let (start, end) = slice_bounds(args, items.len(), line)?;
                Ok(Value::from(items[start..end].to_vec()))
            },
            _ => Err(no_method(name, "array", line)),
        }
    }

    /// Indices of elements equal to `needle`, or for which `needle` returns
    /// a truthy value when it is a function.
    fn matching_indices(&self,
                        items: &ArrayRef,
                        needle: &Value,
                        first_only: bool,
                        line: usize)
                        -> EvalResult<Vec<usize>> {
        let snapshot = items.read().clone();
        let mut found = Vec::new();

        for (index, item) in snapshot.into_iter().enumerate() {
            let hit = match needle {
                Value::Function(_) | Value::Builtin(_) => {
                    self.call_value(needle, vec![item], line)?.is_truthy()
                },
                value => value.loose_eq(&item),
            };
            if hit {
                found.push(index);
                if first_only {
                    break;
                }
            }
        }
        Ok(found)
    }

    /// Sorts with a script comparator. A negative number (or `true`) means
    /// the first argument goes first.
    fn sort_with(&self, items: &mut [Value], compare: &Value, line: usize) -> EvalResult<()> {
        let mut failure = None;

        items.sort_by(|a, b| {
                 if failure.is_some() {
                     return Ordering::Equal;
                 }
                 match self.call_value(compare, vec![a.clone(), b.clone()], line) {
                     Ok(Value::Bool(true)) => Ordering::Less,
                     Ok(Value::Bool(false)) => Ordering::Greater,
                     Ok(Value::Number(n)) => n.partial_cmp(&0.0).unwrap_or(Ordering::Equal),
                     Ok(other) => {
                         failure = Some(invalid_argument("sort",
                                                         format!("comparator returned {}",
                                                                 other.type_name()),
                                                         line));
                         Ordering::Equal
                     },
                     Err(e) => {
                         failure = Some(e);
                         Ordering::Equal
                     },
                 }
             });

        failure.map_or(Ok(()), Err)
    }

    /// Calls a native string method. Positions count characters, not bytes.
    ///
    /// ## Errors
    /// `MissingMember` for unknown methods and argument errors.
    pub(crate) fn call_string_method(text: &str,
                                     name: &str,
                                     args: &[Value],
                                     line: usize)
                                     -> EvalResult<Value> {
        let string_arg = move |index: usize| args[index].as_str(line);

        match name {
            "len" | "length" | "size" => {
                expect_args(name, args, Arity::Exact(0), line)?;
                Ok(index_value(text.chars().count()))
            },
            "upper" => {
                expect_args(name, args, Arity::Exact(0), line)?;
                Ok(Value::from(text.to_uppercase()))
            },
            "lower" => {
                expect_args(name, args, Arity::Exact(0), line)?;
                Ok(Value::from(text.to_lowercase()))
            },
            "trim" => {
                expect_args(name, args, Arity::Exact(0), line)?;
                Ok(Value::from(text.trim()))
            },
            "split" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                let separator = string_arg(0)?;
                let parts: Vec<Value> = if separator.is_empty() {
                    text.chars().map(|c| Value::from(c.to_string())).collect()
                } else {
                    text.split(separator).map(Value::from).collect()
                };
                Ok(Value::from(parts))
            },
            "contains" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                Ok(Value::Bool(text.contains(string_arg(0)?)))
            },
            "startsWith" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                Ok(Value::Bool(text.starts_with(string_arg(0)?)))
            },
            "endsWith" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                Ok(Value::Bool(text.ends_with(string_arg(0)?)))
            },
            "replace" => {
                expect_args(name, args, Arity::Exact(2), line)?;
                Ok(Value::from(text.replace(string_arg(0)?, string_arg(1)?)))
            },
            "indexOf" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                let position = text.find(string_arg(0)?)
                                   .map_or(-1.0, |byte| usize_to_f64(text[..byte].chars().count()));
                Ok(Value::from(position))
            },
            "substring" => {
                expect_args(name, args, Arity::Range(1, 2), line)?;
                let chars = text.chars().collect::<Vec<_>>();
                let (start, end) = slice_bounds(args, chars.len(), line)?;
                Ok(Value::from(chars[start..end].iter().collect::<String>()))
            },
            _ => Err(no_method(name, "string", line)),
        }
    }

    /// Calls a native map method.
    ///
    /// ## Errors
    /// `MissingMember` for unknown methods and argument errors.
    pub(crate) fn call_map_method(&self,
                                  entries: &MapRef,
                                  name: &str,
                                  args: &[Value],
                                  line: usize)
                                  -> EvalResult<Value> {
        match name {
            "keys" => {
                expect_args(name, args, Arity::Exact(0), line)?;
                Ok(Value::from(entries.read().keys().map(|k| Value::from(k.as_str())).collect::<Vec<_>>()))
            },
            "values" => {
                expect_args(name, args, Arity::Exact(0), line)?;
                Ok(Value::from(entries.read().values().cloned().collect::<Vec<_>>()))
            },
            "has" | "contains" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                Ok(Value::Bool(entries.read().contains_key(&args[0].to_key())))
            },
            "delete" | "remove" => {
                expect_args(name, args, Arity::Exact(1), line)?;
                Ok(entries.write().remove(&args[0].to_key()).unwrap_or(Value::Nil))
            },
            "len" | "length" | "size" => {
                expect_args(name, args, Arity::Exact(0), line)?;
                Ok(index_value(entries.read().len()))
            },
            _ => Err(no_method(name, "map", line)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use crate::{
        interpreter::{
            evaluator::core::Context,
            runtime::core::{Output, Runtime},
        },
        parse_program,
    };

    fn run(source: &str) -> String {
        let output = Output::buffer();
        let context = Context::new(Arc::new(Runtime::with_output(output.clone())));
        let env = context.global_env(None);
        context.run_program(&parse_program(source).unwrap(), &env).unwrap();
        output.contents()
    }

    #[test]
    fn push_mutates_every_reference() {
        let out = run("let a = []; let b = a; a.push(1, 2); b.push(3); print(a, a.len());");
        assert_eq!(out, "[1, 2, 3] 3\n");
    }

    #[test]
    fn functional_helpers() {
        let out = run("let xs = [3, 1, 2]; \
                       print(xs.filter(x => x > 1)); \
                       print(xs.reduce((a, b) => a + b, 10)); \
                       print(xs.sort(), xs); \
                       print(xs.sort((a, b) => b - a)); \
                       print(xs.find(x => x < 3), xs.find(9), xs.indexes(x => x != 1));");
        assert_eq!(out, "[3, 2]\n16\n[1, 2, 3] [3, 1, 2]\n[3, 2, 1]\n1 nil [0, 2]\n");
    }

    #[test]
    fn slicing_and_editing() {
        let out = run("let xs = [1, 2, 3, 4]; print(xs.slice(1, -1), xs.slice(-2)); \
                       xs.insert_at(0, 0); xs.remove(2, 4); print(xs); \
                       print(xs.pop(), xs.join(\"-\"));");
        assert_eq!(out, "[2, 3] [3, 4]\n[0, 1, 3]\n3 0-1\n");
    }

    #[test]
    fn string_methods() {
        let out = run("let s = \" Hola Mundo \".trim(); \
                       print(s.upper(), s.lower(), s.len()); \
                       print(s.split(\" \"), s.indexOf(\"M\"), s.substring(5)); \
                       print(s.startsWith(\"Ho\"), s.endsWith(\"x\"), s.replace(\"o\", \"0\"));");
        assert_eq!(out, "HOLA MUNDO hola mundo 10\n[Hola, Mundo] 5 Mundo\ntrue false H0la Mund0\n");
    }

    #[test]
    fn map_methods() {
        let out = run("let m = {a: 1, b: 2}; print(m.keys(), m.values(), m.has(\"a\")); \
                       print(m.delete(\"a\"), m.len(), m);");
        assert_eq!(out, "[a, b] [1, 2] true\n1 1 {b: 2}\n");
    }
}
