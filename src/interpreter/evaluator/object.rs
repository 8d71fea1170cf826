use std::sync::Arc;

use tracing::trace;

use crate::interpreter::{
    evaluator::core::{Context, EvalResult},
    value::{
        core::Value,
        object::{Class, ObjectInstance, bind_method},
    },
};

impl Context {
    /// Creates an instance of `class`.
    ///
    /// The instance's fields live in a scope nested in the scope the class
    /// was declared in. Every field, inherited ones first, is initialized
    /// from its declaration or to `nil`. Initializers may use `self`.
    ///
    /// If the class or an ancestor defines `constructor`, it is called with
    /// `args`. Otherwise the arguments fill the fields positionally.
    ///
    /// ## Errors
    /// Errors raised by field initializers or the constructor.
    pub(crate) fn instantiate(&self, class: &Arc<Class>, args: Vec<Value>, line: usize) -> EvalResult<Value> {
        trace!(class = %class.name, args = args.len(), "instantiating");
        let instance = Arc::new_cyclic(|weak| ObjectInstance { class: Arc::clone(class),
                                                               env:   class.env
                                                                           .instance_child(weak.clone()), });
        let this = Value::Object(Arc::clone(&instance));

        let initializers = instance.env.child();
        initializers.define("self", this.clone());
        initializers.define("this", this.clone());
        for (name, init) in &class.fields {
            let value = match init {
                Some(expr) => self.eval(expr, &initializers)?,
                None => Value::Nil,
            };
            instance.env.define(name, value);
        }

        if let Some(constructor) = bind_method(&instance, class, "constructor") {
            self.call_value(&constructor, args, line)?;
        } else {
            for ((name, _), arg) in class.fields.iter().zip(args) {
                instance.env.define(name, arg);
            }
        }

        Ok(this)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        interpreter::{
            evaluator::core::Context,
            runtime::core::{Output, Runtime},
            value::core::Value,
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
    fn positional_arguments_fill_fields() {
        let out = run("class P { let x; let y; } let p = P(3, 4); print(p.x + p.y);");
        assert_eq!(out, "7\n");
    }

    #[test]
    fn constructor_runs_instead_of_positional_fill() {
        let out = run("class C { let v = 1; constructor(a) { self.v = a * 10; } } \
                       print(new C(2).v);");
        assert_eq!(out, "20\n");
    }

    #[test]
    fn overrides_and_super() {
        let out = run("class A { func name() { return \"A\"; } func hello() { return \"hi \" + name(); } } \
                       class B extends A { func name() { return \"B/\" + super.name(); } } \
                       print(B().hello());");
        assert_eq!(out, "hi B/A\n");
    }

    #[test]
    fn super_chains_through_every_ancestor() {
        let out = run("class A { name() { return \"A\"; } } \
                       class B extends A { name() { return \"B/\" + super.name(); } } \
                       class C extends B { name() { return \"C/\" + super.name(); } } \
                       print(C().name(), B().name());");
        assert_eq!(out, "C/B/A B/A\n");
    }

    #[test]
    fn dropped_instances_are_freed() {
        let context = Context::new(Arc::new(Runtime::with_output(Output::buffer())));
        let env = context.global_env(None);
        let program = parse_program("class P { let x = 1; func get() { return self.x; } } \
                                     let p = P(); p.get();").unwrap();
        context.run_program(&program, &env).unwrap();

        let Some(Value::Object(p)) = env.get("p") else {
            panic!("p is not an object");
        };
        let weak = Arc::downgrade(&p);
        drop(p);
        env.assign("p", Value::Nil, 1).unwrap();

        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn instances_do_not_share_field_state() {
        let out = run("class Bag { let items = []; } let a = Bag(); let b = Bag(); \
                       a.items.push(1); print(len(a.items), len(b.items));");
        assert_eq!(out, "1 0\n");
    }
}
