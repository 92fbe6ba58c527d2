//! Classes, instances and base‑first method dispatch.
//!
//! Method lookup walks the inheritance chain from the concrete class to the
//! root and keeps going after the first hit. The **root‑most** definition is
//! the one that runs; it is bound together with an `inner` callable that runs
//! the next more‑derived definition, which in turn has its own `inner`, down to
//! the most‑derived definition whose `inner` is a no‑op.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::Ident;
use crate::callable::{Callable, LoxFunction, NativeFunction};
use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::value::Value;

pub const INITIALIZER: &str = "init";

pub struct LoxClass {
    name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: &str,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            superclass,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every definition of `name` along the chain, most‑derived first.
    fn definitions(&self, name: &str) -> Vec<Rc<LoxFunction>> {
        let mut found: Vec<Rc<LoxFunction>> = Vec::new();
        let mut class: Option<&LoxClass> = Some(self);

        while let Some(current) = class {
            if let Some(method) = current.methods.get(name) {
                found.push(Rc::clone(method));
            }

            class = current.superclass.as_deref();
        }

        found
    }

    /// Resolve `name` for `instance`: the root‑most definition, bound to the
    /// instance with its `inner` chain wired up.
    pub fn find_method(&self, instance: &Value, name: &str) -> Option<Rc<LoxFunction>> {
        let definitions: Vec<Rc<LoxFunction>> = self.definitions(name);
        let most_derived: &Rc<LoxFunction> = definitions.first()?;

        let mut inner: Value = Value::Native(Rc::new(NativeFunction::terminal_inner(
            most_derived.arity(),
        )));
        let mut bound: Option<Rc<LoxFunction>> = None;

        for method in &definitions {
            let next: Rc<LoxFunction> = Rc::new(method.bind(instance.clone(), inner));
            inner = Value::Function(Rc::clone(&next));
            bound = Some(next);
        }

        debug!(
            "Resolved '{}.{}' across {} definition(s)",
            self.name,
            name,
            definitions.len()
        );

        bound
    }

    /// Method or getter access on `this`, shared by instance reads and `super`.
    /// Getters are invoked immediately; methods are returned bound.
    pub fn property(
        &self,
        this: Value,
        name: &Ident,
        interpreter: &mut Interpreter,
    ) -> Result<Value> {
        match self.find_method(&this, &name.name) {
            Some(method) if method.is_getter() => method.call(interpreter, Vec::new()),
            Some(method) => Ok(Value::Function(method)),
            None => Err(LoxError::runtime(
                name.line,
                format!("Undefined property '{}'.", name.name),
            )),
        }
    }
}

impl Callable for Rc<LoxClass> {
    /// Arity of the initializer that would run, or zero without one.
    fn arity(&self) -> usize {
        self.definitions(INITIALIZER)
            .last()
            .map(|init| init.arity())
            .unwrap_or(0)
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Constructing instance of '{}'", self.name);

        let instance: Value = Value::Instance(Rc::new(RefCell::new(LoxInstance::new(Rc::clone(
            self,
        )))));

        if let Some(initializer) = self.find_method(&instance, INITIALIZER) {
            initializer.call(interpreter, arguments)?;
        }

        Ok(instance)
    }
}

pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property read: field, then getter, then method.
    pub fn get(
        instance: &Rc<RefCell<LoxInstance>>,
        name: &Ident,
        interpreter: &mut Interpreter,
    ) -> Result<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.name) {
            return Ok(value.clone());
        }

        // No borrow may be held here: a getter body can write fields.
        let class: Rc<LoxClass> = Rc::clone(&instance.borrow().class);

        class.property(Value::Instance(Rc::clone(instance)), name, interpreter)
    }

    /// Property write always targets a field.
    pub fn set(&mut self, name: &Ident, value: Value) {
        self.fields.insert(name.name.clone(), value);
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}
