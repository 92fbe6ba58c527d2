//! Tree‑walking evaluator.
//!
//! Statements execute for effect and report how control left them through
//! [`Flow`]; expressions evaluate to a [`Value`]. Variable access consults the
//! distance table filled in by the [`Resolver`](crate::resolver::Resolver):
//! a recorded distance means "walk exactly that many frames", no entry means
//! "global, by name".

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{
    BinaryOp, Expr, ExprId, FunctionDecl, FunctionStmt, Ident, LiteralValue, LogicalOp, Stmt,
    UnaryOp,
};
use crate::callable::{Callable, LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::{assign_at, get_at, EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug)]
pub enum Flow {
    /// Fell off the end; keep going with the next statement.
    Normal,

    /// A `return` ran; unwind to the nearest function invocation.
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new Interpreter printing to stdout, with native functions
    /// such as `clock` defined as globals.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates a new Interpreter whose `print` output goes to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new().into_shared();

        let clock: NativeFunction = NativeFunction::clock();
        debug!("Defining native function '{}'", clock.name());
        globals
            .borrow_mut()
            .define(clock.name(), Value::Native(Rc::new(clock)));

        Self {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record that the variable reference `id` lives `depth` frames up.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program" or one REPL entry).
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        self.output.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.name, value);
                self.environment.borrow_mut().define(&name.name, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment: EnvRef =
                    Environment::with_enclosing(self.environment.clone()).into_shared();
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(function) => {
                debug!("Defining function '{}'", function.name.name);
                let value: Value = Value::Function(Rc::new(LoxFunction::new(
                    Some(function.name.name.clone()),
                    Rc::clone(&function.function),
                    self.environment.clone(),
                    false,
                )));
                self.environment
                    .borrow_mut()
                    .define(&function.name.name, value);
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.execute_class(name, superclass.as_ref(), methods)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` inside `environment`, restoring the current
    /// environment afterwards even when a runtime error unwinds through.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, environment);

        let mut result: Result<Flow> = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Ident,
        superclass: Option<&Expr>,
        methods: &[FunctionStmt],
    ) -> Result<()> {
        debug!("Defining class '{}'", name.name);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    return Err(LoxError::runtime(
                        expr.line(),
                        "Superclass must be a class.",
                    ))
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.name, Value::Nil);

        // Methods of a subclass close over an extra frame holding `super`.
        let method_closure: EnvRef = match &superclass {
            Some(class) => {
                let mut environment: Environment =
                    Environment::with_enclosing(self.environment.clone());
                environment.define("super", Value::Class(Rc::clone(class)));
                environment.into_shared()
            }
            None => self.environment.clone(),
        };

        let table: HashMap<String, Rc<LoxFunction>> = methods
            .iter()
            .map(|method| {
                let function: LoxFunction = LoxFunction::new(
                    Some(method.name.name.clone()),
                    Rc::clone(&method.function),
                    method_closure.clone(),
                    method.name.name == INITIALIZER,
                );
                (method.name.name.clone(), Rc::new(function))
            })
            .collect();

        let class: LoxClass = LoxClass::new(&name.name, superclass, table);

        self.environment
            .borrow_mut()
            .define(&name.name, Value::Class(Rc::new(class)));

        info!("Class '{}' defined with {} method(s)", name.name, methods.len());
        Ok(())
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(evaluate_literal(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary {
                operator,
                line,
                right,
            } => self.evaluate_unary(*operator, *line, right),

            Expr::Binary {
                left,
                operator,
                line,
                right,
            } => self.evaluate_binary(left, *operator, *line, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                let short_circuit: bool = match operator {
                    LogicalOp::Or => is_truthy(&left_val),
                    LogicalOp::And => !is_truthy(&left_val),
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, &name.name, name.line),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => assign_at(
                        &self.environment,
                        distance,
                        &name.name,
                        value.clone(),
                        name.line,
                    )?,
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.name, value.clone(), name.line)?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                line,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.invoke_callable(&callee, *line, arg_values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name, self),
                _ => Err(LoxError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, line } => self.look_up_variable(*id, "this", *line),

            Expr::Super { id, line, method } => self.evaluate_super(*id, *line, method),

            Expr::Function(declaration) => Ok(self.anonymous_function(declaration)),
        }
    }

    fn anonymous_function(&self, declaration: &Rc<FunctionDecl>) -> Value {
        Value::Function(Rc::new(LoxFunction::new(
            None,
            Rc::clone(declaration),
            self.environment.clone(),
            false,
        )))
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, operator: UnaryOp, line: usize, right: &Expr) -> Result<Value> {
        let right_val: Value = self.evaluate(right)?;

        match operator {
            UnaryOp::Negate => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(line, "Operand must be a number.")),
            },
            UnaryOp::Not => Ok(Value::Bool(!is_truthy(&right_val))),
        }
    }

    /// Evaluates a binary expression. Both operands are evaluated, left first.
    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: BinaryOp,
        line: usize,
        right: &Expr,
    ) -> Result<Value> {
        use BinaryOp::*;

        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;
        debug!(
            "Binary {} on {} and {}",
            operator,
            left_val.kind(),
            right_val.kind()
        );

        match (operator, left_val, right_val) {
            (Equal, l, r) => Ok(Value::Bool(is_equal(&l, &r))),
            (NotEqual, l, r) => Ok(Value::Bool(!is_equal(&l, &r))),

            (Add, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Add, Value::String(a), Value::String(b)) => {
                Ok(Value::String(format!("{}{}", a, b).into()))
            }
            (Add, _, _) => Err(LoxError::runtime(
                line,
                "Operands must be two numbers or two strings.",
            )),

            (Subtract, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
            (Multiply, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
            // IEEE semantics: x/0 is ±inf, 0/0 is NaN.
            (Divide, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
            (Less, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
            (LessEqual, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
            (Greater, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
            (GreaterEqual, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

            _ => Err(LoxError::runtime(line, "Operands must be numbers.")),
        }
    }

    /// `super.name`: look the method up from the superclass stored one frame
    /// above `this`, and bind it to the current `this`.
    fn evaluate_super(&mut self, id: ExprId, line: usize, method: &Ident) -> Result<Value> {
        let distance: usize = *self
            .locals
            .get(&id)
            .ok_or_else(|| LoxError::runtime(line, "Undefined variable 'super'."))?;

        let Value::Class(superclass) = get_at(&self.environment, distance, "super", line)? else {
            return Err(LoxError::runtime(line, "Superclass must be a class."));
        };
        let this: Value = get_at(&self.environment, distance - 1, "this", line)?;

        superclass.property(this, method, self)
    }

    fn look_up_variable(&self, id: ExprId, name: &str, line: usize) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => get_at(&self.environment, distance, name, line),
            None => self.globals.borrow().get(name, line),
        }
    }

    /// Invokes anything satisfying the [`Callable`] contract, checking arity
    /// first.
    fn invoke_callable(
        &mut self,
        callee: &Value,
        line: usize,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let Some(callable): Option<&dyn Callable> = callee.as_callable() else {
            return Err(LoxError::runtime(
                line,
                "Can only call functions and classes.",
            ));
        };

        if arguments.len() != callable.arity() {
            return Err(LoxError::runtime(
                line,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        debug!("Calling {} with {} argument(s)", callee, arguments.len());
        callable.call(self, arguments)
    }
}

fn evaluate_literal(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::from(s.as_str()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

/// `false` and `nil` are falsy; everything else, including `0` and `""`, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

/// Values of different kinds are never equal; objects compare by identity.
pub fn is_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
        (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}
