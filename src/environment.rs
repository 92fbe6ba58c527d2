use crate::error::{LoxError, Result};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to an environment. A block, a running call and every closure
/// created inside it may all hold the same frame; writes through one handle are
/// visible through the others.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// The global (outermost) environment.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_shared(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind `name` in this frame, overwriting any previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up by walking the chain. Only used for globals; locals go
    /// through [`get_at`] with a resolver distance.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    /// Assign to an existing binding; never creates a new one.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    fn get_local(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// Walk exactly `distance` parent links from `env`.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current: EnvRef = env.clone();

    for _ in 0..distance {
        let next: EnvRef = current.borrow().enclosing()?;
        current = next;
    }

    Some(current)
}

/// Read `name` from the frame exactly `distance` links up; no further search.
pub fn get_at(env: &EnvRef, distance: usize, name: &str, line: usize) -> Result<Value> {
    ancestor(env, distance)
        .and_then(|frame| frame.borrow().get_local(name))
        .ok_or_else(|| LoxError::runtime(line, format!("Undefined variable '{}'.", name)))
}

/// Write `name` in the frame exactly `distance` links up.
pub fn assign_at(
    env: &EnvRef,
    distance: usize,
    name: &str,
    value: Value,
    line: usize,
) -> Result<()> {
    match ancestor(env, distance) {
        Some(frame) => {
            frame.borrow_mut().define(name, value);
            Ok(())
        }
        None => Err(LoxError::runtime(
            line,
            format!("Undefined variable '{}'.", name),
        )),
    }
}
