use std::{fmt, sync::Arc};

use crate::{
    ast::{ClassDecl, Expr, FunctionDef},
    interpreter::{
        environment::Env,
        value::{core::Value, function::UserFunction},
    },
};

/// A declared class.
///
/// `fields` is flattened: the parent's fields come first, followed by the
/// class's own, and a field redeclared by the child replaces the inherited
/// one in place. `methods` holds only the methods this class declares;
/// inherited ones are found through `parent`.
pub struct Class {
    pub name:    String,
    pub parent:  Option<Arc<Class>>,
    pub fields:  Vec<(String, Option<Expr>)>,
    pub methods: Vec<(String, Arc<FunctionDef>)>,
    /// The scope the class was declared in; instance scopes are its children.
    pub env:     Env,
}

impl Class {
    /// Builds a class from its declaration, inheriting from `parent`.
    #[must_use]
    pub fn new(decl: &ClassDecl, parent: Option<Arc<Self>>, env: Env) -> Self {
        let mut fields = parent.as_ref().map(|p| p.fields.clone()).unwrap_or_default();

        for (name, init) in &decl.fields {
            match fields.iter_mut().find(|(existing, _)| existing == name) {
                Some(slot) => slot.1 = init.clone(),
                None => fields.push((name.clone(), init.clone())),
            }
        }

        let methods = decl.methods
                          .iter()
                          .filter_map(|def| def.name.clone().map(|name| (name, Arc::clone(def))))
                          .collect();

        Self { name: decl.name.clone(),
               parent,
               fields,
               methods,
               env }
    }

    /// Finds a method by name, searching this class and then its ancestors.
    ///
    /// Returns the class that declares the method along with it, since that
    /// class decides what `super` means inside the method body.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<(&Self, &Arc<FunctionDef>)> {
        let mut class = Some(self);
        while let Some(current) = class {
            if let Some((_, def)) = current.methods.iter().find(|(n, _)| n == name) {
                return Some((current, def));
            }
            class = current.parent.as_deref();
        }
        None
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
         .field("name", &self.name)
         .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
         .finish_non_exhaustive()
    }
}

/// An instance of a [`Class`], or a `super` view of one.
///
/// `env` holds the fields and refers back to the instance only weakly, so
/// an instance is freed once the script drops its last reference. Methods
/// are not stored anywhere: each member access binds a fresh closure.
///
/// A `super` view shares `env` with the instance it belongs to but names an
/// ancestor as `class`, so method lookup through it starts at that ancestor.
pub struct ObjectInstance {
    pub class: Arc<Class>,
    pub env:   Env,
}

impl ObjectInstance {
    /// Reads a field, or binds a method found from `self.class` upwards.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<Value> {
        if let Some(field) = self.env.get_own(name) {
            return Some(field);
        }
        let receiver = self.env.receiver()?;
        bind_method(&receiver, &self.class, name)
    }
}

impl fmt::Debug for ObjectInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectInstance")
         .field("class", &self.class.name)
         .finish_non_exhaustive()
    }
}

/// Looks `name` up from `start` upwards and binds it to `receiver`.
///
/// The method runs in a scope nested in the instance's fields, where `self`
/// and `this` name the receiver and `super` is a view starting at the parent
/// of the class that declares the method. Binding per declaring class is
/// what lets `super` calls chain through any number of ancestors.
#[must_use]
pub fn bind_method(receiver: &Arc<ObjectInstance>, start: &Class, name: &str) -> Option<Value> {
    let (owner, def) = start.find_method(name)?;

    let scope = receiver.env.child();
    let this = Value::Object(Arc::clone(receiver));
    scope.define("self", this.clone());
    scope.define("this", this);

    if let Some(parent) = &owner.parent {
        let view = ObjectInstance { class: Arc::clone(parent),
                                    env:   receiver.env.clone(), };
        scope.define("super", Value::Object(Arc::new(view)));
    }

    Some(Value::Function(Arc::new(UserFunction { def: Arc::clone(def),
                                                 env: scope })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Class;
    use crate::{ast::Statement, interpreter::environment::Env, parse_program};

    fn declared(source: &str) -> Vec<Arc<crate::ast::ClassDecl>> {
        parse_program(source).unwrap()
                             .statements
                             .into_iter()
                             .filter_map(|s| match s {
                                 Statement::Class(decl) => Some(decl),
                                 _ => None,
                             })
                             .collect()
    }

    #[test]
    fn fields_flatten_and_methods_resolve_to_their_declaring_class() {
        let decls = declared("class A { let x; let y; func hi() { return 1; } func a() {} } \
                              class B extends A { let y = 2; let z; func hi() { return 2; } }");
        let env = Env::new_root(None);
        let a = Arc::new(Class::new(&decls[0], None, env.clone()));
        let b = Class::new(&decls[1], Some(Arc::clone(&a)), env);

        let fields = b.fields.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>();
        assert_eq!(fields, ["x", "y", "z"]);
        assert!(b.fields[1].1.is_some());

        let (owner, _) = b.find_method("hi").unwrap();
        assert_eq!(owner.name, "B");
        let (owner, _) = b.find_method("a").unwrap();
        assert_eq!(owner.name, "A");
        assert!(b.find_method("missing").is_none());
    }
}
