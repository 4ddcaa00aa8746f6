//! Runtime object model for the adder language
//!
//! Values live behind reference-counted handles. A handle is either
//! owning or a non-owning alias; the alias flavor exists solely for the
//! `self` binding during method calls, so an instance never keeps
//! itself alive through its own call scope. The empty handle represents
//! `None`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::ast::Statement;
use crate::error::RuntimeError;

/// A single activation frame: name to value handle
pub type Scope = HashMap<String, Handle>;

/// Execution context handed to every evaluator node
pub struct Context<'a> {
    output: &'a mut dyn io::Write,
}

impl<'a> Context<'a> {
    pub fn new(output: &'a mut dyn io::Write) -> Self {
        Self { output }
    }

    /// The stream `print` statements write to
    pub fn output(&mut self) -> &mut dyn io::Write {
        self.output
    }
}

/// A runtime value
#[derive(Debug)]
pub enum Value {
    Number(i64),
    String(String),
    Bool(bool),
    Class(Rc<Class>),
    Instance(Instance),
}

/// A method defined on a class
#[derive(Debug)]
pub struct Method {
    pub name: String,
    /// Formal parameter names, excluding the receiver
    pub formal_params: Vec<String>,
    pub body: Statement,
}

/// A user-defined class: an ordered method table plus an optional parent
#[derive(Debug)]
pub struct Class {
    name: String,
    methods: Vec<Method>,
    method_index: HashMap<String, usize>,
    parent: Option<Rc<Class>>,
}

impl Class {
    pub fn new(name: impl Into<String>, methods: Vec<Method>, parent: Option<Rc<Class>>) -> Self {
        let method_index = methods
            .iter()
            .enumerate()
            .map(|(index, method)| (method.name.clone(), index))
            .collect();
        Self {
            name: name.into(),
            methods,
            method_index,
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a method by name, walking the parent chain on a local miss
    pub fn get_method(&self, name: &str) -> Option<&Method> {
        if let Some(&index) = self.method_index.get(name) {
            return Some(&self.methods[index]);
        }
        self.parent.as_deref().and_then(|parent| parent.get_method(name))
    }

    /// True when `name` resolves in the chain with exactly `arity` formals
    pub fn has_method(&self, name: &str, arity: usize) -> bool {
        self.get_method(name)
            .map_or(false, |method| method.formal_params.len() == arity)
    }
}

/// Reference to a class, resolved by the parser. The slot is filled as
/// soon as the named definition completes, which lets a method body
/// construct instances of the class still being defined.
#[derive(Debug, Clone)]
pub struct ClassRef {
    name: String,
    slot: Rc<RefCell<Option<Rc<Class>>>>,
}

impl ClassRef {
    /// A reference to a class that has not been defined yet
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: Rc::new(RefCell::new(None)),
        }
    }

    /// A reference to an already-built class
    pub fn resolved(class: Rc<Class>) -> Self {
        Self {
            name: class.name().to_string(),
            slot: Rc::new(RefCell::new(Some(class))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fill the slot once the definition is complete
    pub fn fill(&self, class: Rc<Class>) {
        *self.slot.borrow_mut() = Some(class);
    }

    pub fn get(&self) -> Option<Rc<Class>> {
        self.slot.borrow().clone()
    }
}

/// A class instance: its class plus a field map created on first write
#[derive(Debug)]
pub struct Instance {
    class: Rc<Class>,
    fields: Scope,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: Scope::new(),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    pub fn fields(&self) -> &Scope {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Scope {
        &mut self.fields
    }
}

/// Shared handle to a runtime value; the empty handle is `None`
#[derive(Clone, Default)]
pub struct Handle {
    data: Option<HandleData>,
}

#[derive(Clone)]
enum HandleData {
    /// Keeps the value alive
    Owned(Rc<RefCell<Value>>),
    /// Does not keep the value alive; used only for `self`
    Alias(Weak<RefCell<Value>>),
}

impl Handle {
    /// Owning handle around a freshly built value
    pub fn own(value: Value) -> Self {
        Self {
            data: Some(HandleData::Owned(Rc::new(RefCell::new(value)))),
        }
    }

    /// The empty handle
    pub fn none() -> Self {
        Self::default()
    }

    /// Non-owning alias of the value this handle refers to. Once every
    /// owning handle is dropped the alias goes stale and behaves as the
    /// empty handle.
    pub fn share(&self) -> Self {
        let data = match &self.data {
            Some(HandleData::Owned(cell)) => Some(HandleData::Alias(Rc::downgrade(cell))),
            Some(HandleData::Alias(weak)) => Some(HandleData::Alias(weak.clone())),
            None => None,
        };
        Self { data }
    }

    fn cell(&self) -> Option<Rc<RefCell<Value>>> {
        match &self.data {
            Some(HandleData::Owned(cell)) => Some(Rc::clone(cell)),
            Some(HandleData::Alias(weak)) => weak.upgrade(),
            None => None,
        }
    }

    /// True for the empty handle and for a stale alias
    pub fn is_none(&self) -> bool {
        self.cell().is_none()
    }

    /// Both handles refer to the same value cell. Two empty handles are
    /// considered the same.
    pub fn same_object(&self, other: &Handle) -> bool {
        match (self.cell(), other.cell()) {
            (Some(a), Some(b)) => Rc::ptr_eq(&a, &b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Truth test: `None` is false, numbers are true when non-zero,
    /// strings when non-empty, booleans are themselves, everything else
    /// is false.
    pub fn is_truthy(&self) -> bool {
        match self.cell() {
            Some(cell) => match &*cell.borrow() {
                Value::Bool(b) => *b,
                Value::Number(n) => *n != 0,
                Value::String(s) => !s.is_empty(),
                _ => false,
            },
            None => false,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        let cell = self.cell()?;
        let value = cell.borrow();
        match &*value {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        let cell = self.cell()?;
        let value = cell.borrow();
        match &*value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        let cell = self.cell()?;
        let value = cell.borrow();
        match &*value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<Rc<Class>> {
        let cell = self.cell()?;
        let value = cell.borrow();
        match &*value {
            Value::Class(class) => Some(Rc::clone(class)),
            _ => None,
        }
    }

    /// Run `f` against the instance behind this handle
    pub fn with_instance<R>(&self, f: impl FnOnce(&Instance) -> R) -> Option<R> {
        let cell = self.cell()?;
        let value = cell.borrow();
        match &*value {
            Value::Instance(instance) => Some(f(instance)),
            _ => None,
        }
    }

    /// Run `f` against the instance behind this handle, mutably
    pub fn with_instance_mut<R>(&self, f: impl FnOnce(&mut Instance) -> R) -> Option<R> {
        let cell = self.cell()?;
        let mut value = cell.borrow_mut();
        match &mut *value {
            Value::Instance(instance) => Some(f(instance)),
            _ => None,
        }
    }

    /// True when this handle holds an instance whose class chain has
    /// `name` with exactly `arity` parameters
    pub fn has_method(&self, name: &str, arity: usize) -> bool {
        self.with_instance(|instance| instance.class().has_method(name, arity))
            .unwrap_or(false)
    }

    /// Dispatch a method on the instance behind this handle. The body
    /// runs in a fresh scope with `self` bound to a non-owning alias of
    /// the receiver; a body that rebinds `self` decides the call's
    /// result.
    pub fn call_method(
        &self,
        name: &str,
        args: &[Handle],
        ctx: &mut Context,
    ) -> Result<Handle, RuntimeError> {
        let class = self
            .with_instance(|instance| Rc::clone(instance.class()))
            .ok_or(RuntimeError::NotAnInstance("method call"))?;

        let method = match class.get_method(name) {
            Some(method) if method.formal_params.len() == args.len() => method,
            _ => return Err(RuntimeError::MethodNotFound(name.to_string())),
        };

        trace!("dispatching {}.{}", class.name(), name);

        let mut scope = Scope::new();
        scope.insert("self".to_string(), self.share());
        for (param, arg) in method.formal_params.iter().zip(args) {
            scope.insert(param.clone(), arg.clone());
        }

        let result = method.body.execute(&mut scope, ctx)?;

        match scope.get("self") {
            Some(bound) if !bound.same_object(self) => Ok(bound.clone()),
            _ => Ok(result),
        }
    }

    /// Append this value's printed form to `buf`: numbers in decimal,
    /// strings verbatim, booleans as `True`/`False`, the empty handle
    /// as `None`, classes as `Class <name>`, instances through
    /// `__str__` when defined and as an opaque identity marker
    /// otherwise.
    pub fn write_printed(&self, buf: &mut String, ctx: &mut Context) -> Result<(), RuntimeError> {
        let cell = match self.cell() {
            Some(cell) => cell,
            None => {
                buf.push_str("None");
                return Ok(());
            }
        };
        // Decide on the text while the borrow is held, dispatch after
        // releasing it: a `__str__` body may touch the instance again.
        let text = {
            let value = cell.borrow();
            match &*value {
                Value::Number(n) => Some(n.to_string()),
                Value::String(s) => Some(s.clone()),
                Value::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
                Value::Class(class) => Some(format!("Class {}", class.name())),
                Value::Instance(instance) if !instance.class().has_method("__str__", 0) => {
                    Some(format!(
                        "<{} object at {:p}>",
                        instance.class().name(),
                        Rc::as_ptr(&cell)
                    ))
                }
                Value::Instance(_) => None,
            }
        };
        match text {
            Some(text) => {
                buf.push_str(&text);
                Ok(())
            }
            None => {
                let result = self.call_method("__str__", &[], ctx)?;
                result.write_printed(buf, ctx)
            }
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell() {
            Some(cell) => write!(f, "Handle({:?})", cell.borrow()),
            None => write!(f, "Handle(None)"),
        }
    }
}
