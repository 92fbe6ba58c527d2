//! The [`Callable`] contract and the two function kinds that implement it
//! directly: user‑defined functions (including bound methods) and natives.
//! Classes implement it in [`crate::class`].

use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{get_at, EnvRef, Environment};
use crate::error::Result;
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

pub trait Callable {
    /// Number of arguments the callable expects.
    fn arity(&self) -> usize;

    /// Invoke with already‑evaluated arguments. The caller has checked the arity.
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value>;
}

/// A function value: a declaration paired with the environment that was live
/// where it was defined.
pub struct LoxFunction {
    name: Option<String>,
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        name: Option<String>,
        declaration: Rc<FunctionDecl>,
        closure: EnvRef,
        is_initializer: bool,
    ) -> Self {
        Self {
            name,
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn is_getter(&self) -> bool {
        self.declaration.getter
    }

    /// Produce a fresh function whose closure is a new frame, nested in the
    /// method's own closure, holding `this` and `inner`.
    pub fn bind(&self, instance: Value, inner: Value) -> LoxFunction {
        let mut environment: Environment = Environment::with_enclosing(self.closure.clone());
        environment.define("this", instance);
        environment.define("inner", inner);

        LoxFunction {
            name: self.name.clone(),
            declaration: Rc::clone(&self.declaration),
            closure: environment.into_shared(),
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!(
            "Calling function '{}' with {} argument(s)",
            self.name.as_deref().unwrap_or("<anonymous>"),
            arguments.len()
        );

        let mut environment: Environment = Environment::with_enclosing(self.closure.clone());

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.name, argument);
        }

        let flow: Flow =
            interpreter.execute_block(&self.declaration.body, environment.into_shared())?;

        // An initializer always hands back the instance it was bound to.
        if self.is_initializer {
            return get_at(&self.closure, 0, "this", self.declaration.line);
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "<fn {}>", name),
            None => write!(f, "<fn>"),
        }
    }
}

/// A function implemented in Rust.
pub struct NativeFunction {
    name: &'static str,
    arity: usize,
    func: fn(&[Value]) -> Value,
}

impl NativeFunction {
    pub fn new(name: &'static str, arity: usize, func: fn(&[Value]) -> Value) -> Self {
        Self { name, arity, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `clock()`: seconds since the Unix epoch.
    pub fn clock() -> Self {
        Self::new("clock", 0, |_args: &[Value]| {
            let now = Utc::now();
            Value::Number(now.timestamp_millis() as f64 / 1000.0)
        })
    }

    /// The `inner` bound to the most‑derived definition of a method: there is
    /// nothing more specialised to delegate to, so it does nothing.
    pub fn terminal_inner(arity: usize) -> Self {
        Self::new("inner", arity, |_args: &[Value]| Value::Nil)
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        Ok((self.func)(&arguments))
    }
}
