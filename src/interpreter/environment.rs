use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, Weak},
};

use parking_lot::RwLock;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        value::{
            core::Value,
            object::{ObjectInstance, bind_method},
        },
    },
};

#[derive(Clone)]
struct Binding {
    value:    Value,
    constant: bool,
}

struct Scope {
    bindings: RwLock<HashMap<String, Binding>>,
    parent:   Option<Env>,
    /// Directory of the script that owns this scope chain, set on roots.
    dir:      Option<PathBuf>,
    /// Set on a script's top-level scope: assignments to undeclared names
    /// land here.
    global:   bool,
    /// Set on an instance's field scope. Names it does not bind fall back to
    /// the instance's methods.
    receiver: Option<Weak<ObjectInstance>>,
}

/// A handle to a lexical scope.
///
/// Scopes form a chain through their parents. Handles are cheap to clone and
/// can be sent to other threads: closures keep the scope they were created
/// in alive and tasks running those closures read and write it
/// concurrently. Each scope guards its own table, and no lock is held while
/// another scope is visited, so lookups never deadlock.
#[derive(Clone)]
pub struct Env(Arc<Scope>);

impl Env {
    /// Creates a scope with no parent. `dir` is the directory that relative
    /// imports from this chain resolve against.
    #[must_use]
    pub fn new_root(dir: Option<PathBuf>) -> Self {
        Self(Arc::new(Scope { bindings: RwLock::new(HashMap::new()),
                              parent: None,
                              dir,
                              global: false,
                              receiver: None }))
    }

    fn nested(&self, global: bool, receiver: Option<Weak<ObjectInstance>>) -> Self {
        Self(Arc::new(Scope { bindings: RwLock::new(HashMap::new()),
                              parent: Some(self.clone()),
                              dir: None,
                              global,
                              receiver }))
    }

    /// Creates a nested scope whose lookups fall back to `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        self.nested(false, None)
    }

    /// Creates the top-level scope of a script or module.
    #[must_use]
    pub fn global_child(&self) -> Self {
        self.nested(true, None)
    }

    /// Creates the field scope of an object. The instance is held weakly so
    /// the scope does not keep it alive.
    #[must_use]
    pub fn instance_child(&self, receiver: Weak<ObjectInstance>) -> Self {
        self.nested(false, Some(receiver))
    }

    /// The instance whose fields this scope holds, if it is still alive.
    #[must_use]
    pub fn receiver(&self) -> Option<Arc<ObjectInstance>> {
        self.0.receiver.as_ref().and_then(Weak::upgrade)
    }

    /// Looks a name up through the scope chain.
    ///
    /// Inside a method, names the instance does not bind as fields resolve
    /// to its methods, so methods can call each other without `self.`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(value) = env.get_own(name) {
                return Some(value);
            }
            if let Some(receiver) = env.receiver()
               && let Some(method) = bind_method(&receiver, &receiver.class, name)
            {
                return Some(method);
            }
            scope = env.0.parent.as_ref();
        }
        None
    }

    /// Looks a name up in this scope only.
    #[must_use]
    pub fn get_own(&self, name: &str) -> Option<Value> {
        self.0.bindings.read().get(name).map(|b| b.value.clone())
    }

    /// Declares a name in this scope, shadowing any outer binding.
    pub fn define(&self, name: &str, value: Value) {
        self.insert(name, value, false);
    }

    /// Declares a constant in this scope.
    pub fn define_const(&self, name: &str, value: Value) {
        self.insert(name, value, true);
    }

    fn insert(&self, name: &str, value: Value, constant: bool) {
        self.0
            .bindings
            .write()
            .insert(name.to_string(), Binding { value, constant });
    }

    /// Assigns to the nearest enclosing binding of `name`.
    ///
    /// If no scope in the chain binds the name, it is declared in the
    /// script's top-level scope, or in the outermost scope of a chain that
    /// has none.
    ///
    /// ## Errors
    /// `ConstReassignment` if the nearest binding is a constant.
    pub fn assign(&self, name: &str, value: Value, line: usize) -> EvalResult<()> {
        let mut outermost = self;
        let mut global = None;
        let mut scope = Some(self);
        while let Some(env) = scope {
            let mut bindings = env.0.bindings.write();
            if let Some(binding) = bindings.get_mut(name) {
                if binding.constant {
                    return Err(RuntimeError::ConstReassignment { name: name.to_string(),
                                                                 line });
                }
                binding.value = value;
                return Ok(());
            }
            drop(bindings);
            if env.0.global && global.is_none() {
                global = Some(env);
            }
            outermost = env;
            scope = env.0.parent.as_ref();
        }

        global.unwrap_or(outermost).define(name, value);
        Ok(())
    }

    /// The names and values declared directly in this scope, sorted by name.
    #[must_use]
    pub fn own_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings = self.0
                               .bindings
                               .read()
                               .iter()
                               .map(|(name, b)| (name.clone(), b.value.clone()))
                               .collect::<Vec<_>>();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    /// The directory relative imports resolve against, taken from the
    /// nearest scope that has one.
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(dir) = &env.0.dir {
                return Some(dir);
            }
            scope = env.0.parent.as_ref();
        }
        None
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bindings can refer back to this scope, so only the names are shown.
        let mut names = self.0.bindings.read().keys().cloned().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("Env")
         .field("names", &names)
         .field("has_parent", &self.0.parent.is_some())
         .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_parents_and_shadowing_is_local() {
        let root = Env::new_root(None);
        root.define("x", Value::from(1.0));

        let inner = root.child();
        assert_eq!(inner.get("x").unwrap().to_string(), "1");

        inner.define("x", Value::from(2.0));
        assert_eq!(inner.get("x").unwrap().to_string(), "2");
        assert_eq!(root.get("x").unwrap().to_string(), "1");
        assert!(inner.get_own("missing").is_none());
    }

    #[test]
    fn assignment_updates_nearest_binding_or_declares_globally() {
        let root = Env::new_root(None);
        let global = root.global_child();
        global.define("count", Value::from(0.0));
        let inner = global.child().child();

        inner.assign("count", Value::from(5.0), 1).unwrap();
        assert_eq!(global.get("count").unwrap().to_string(), "5");

        inner.assign("fresh", Value::from(true), 1).unwrap();
        assert!(inner.get_own("fresh").is_none());
        assert!(global.get_own("fresh").is_some());
        assert!(root.get_own("fresh").is_none());

        let detached = Env::new_root(None);
        detached.child().assign("loose", Value::Nil, 1).unwrap();
        assert!(detached.get_own("loose").is_some());
    }

    #[test]
    fn constants_reject_assignment() {
        let root = Env::new_root(None);
        root.define_const("LIMIT", Value::from(10.0));
        let err = root.child().assign("LIMIT", Value::from(3.0), 7).unwrap_err();

        assert!(matches!(err, RuntimeError::ConstReassignment { line: 7, .. }));
    }

    #[test]
    fn directory_is_inherited() {
        let root = Env::new_root(Some(PathBuf::from("/scripts")));
        assert_eq!(root.child().child().dir(), Some(Path::new("/scripts")));
        assert_eq!(Env::new_root(None).child().dir(), None);
    }
}
