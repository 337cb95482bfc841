//! Tree-walking interpreter.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use tracing::trace;

use crate::ast::*;
use crate::builtins;
use crate::error::{RuntimeError, RuntimeResult};
use crate::ops;
use crate::program::Program;
use crate::value::{Closure, Value};

/// Maximum nesting of user function calls before a `RangeError`.
const MAX_CALL_DEPTH: usize = 64;

pub(crate) type Env = Rc<RefCell<Scope>>;

/// One level of the lexical scope chain.
pub(crate) struct Scope {
    vars: HashMap<String, Binding>,
    parent: Option<Env>,
    /// `var` declarations land in the nearest function scope.
    function_scope: bool,
}

struct Binding {
    value: Value,
    mutable: bool,
}

fn new_scope(parent: Option<Env>, function_scope: bool) -> Env {
    Rc::new(RefCell::new(Scope {
        vars: HashMap::new(),
        parent,
        function_scope,
    }))
}

fn child(env: &Env) -> Env {
    new_scope(Some(env.clone()), false)
}

fn declare(env: &Env, name: &str, value: Value, mutable: bool) {
    env.borrow_mut()
        .vars
        .insert(name.to_string(), Binding { value, mutable });
}

fn lookup(env: &Env, name: &str) -> Option<Value> {
    let mut current = Some(env.clone());
    while let Some(scope) = current {
        let scope = scope.borrow();
        if let Some(binding) = scope.vars.get(name) {
            return Some(binding.value.clone());
        }
        current = scope.parent.clone();
    }
    None
}

/// Assign to an existing binding. Returns `false` when `name` is undeclared.
fn assign(env: &Env, name: &str, value: Value) -> RuntimeResult<bool> {
    let mut current = Some(env.clone());
    while let Some(scope) = current {
        let mut scope = scope.borrow_mut();
        if let Some(binding) = scope.vars.get_mut(name) {
            if !binding.mutable {
                return Err(RuntimeError::type_error("Assignment to constant variable."));
            }
            binding.value = value;
            return Ok(true);
        }
        current = scope.parent.clone();
    }
    Ok(false)
}

fn function_scope(env: &Env) -> Env {
    let mut current = env.clone();
    loop {
        let parent = {
            let scope = current.borrow();
            if scope.function_scope {
                None
            } else {
                scope.parent.clone()
            }
        };
        match parent {
            Some(parent) => current = parent,
            None => return current,
        }
    }
}

/// Copy the `let` bindings of a `for` loop into a fresh scope, so closures
/// created in one iteration keep that iteration's values.
fn next_iteration(scope: &Env, decls: &[(String, Option<Expr>)]) -> Env {
    if decls.is_empty() {
        return scope.clone();
    }
    let current = scope.borrow();
    let next = new_scope(current.parent.clone(), false);
    for (name, _) in decls {
        if let Some(binding) = current.vars.get(name) {
            declare(&next, name, binding.value.clone(), binding.mutable);
        }
    }
    next
}

/// Completion of a statement.
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// An assignable location, resolved once so its object is evaluated once.
enum Place {
    Var(String),
    Member(Value, String),
}

/// Executes programs against a set of global bindings.
///
/// An interpreter is meant for a single run: it is cheap to create, and
/// dropping it releases every scope its closures captured.
pub struct Interpreter {
    globals: Env,
    captured: Vec<Weak<RefCell<Scope>>>,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an interpreter with the builtin globals installed.
    pub fn new() -> Self {
        let mut interp = Self {
            globals: new_scope(None, true),
            captured: Vec::new(),
            depth: 0,
        };
        builtins::install_globals(&mut interp);
        interp
    }

    /// Bind a global name, shadowing any builtin of the same name.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        declare(&self.globals, &name, value, true);
    }

    /// Look up a global binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        lookup(&self.globals, name)
    }

    /// Run `program` as a function body and return what it returns.
    pub fn run(&mut self, program: &Program) -> RuntimeResult<Value> {
        trace!(statements = program.body().len(), "running program");
        let scope = new_scope(Some(self.globals.clone()), true);
        match self.exec_block(program.body(), &scope)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    /// Call a function value with the given arguments.
    pub fn call_function(&mut self, function: &Value, args: Vec<Value>) -> RuntimeResult<Value> {
        match function {
            Value::Native(native) => (native.call)(&args),
            Value::Function(closure) => {
                if self.depth >= MAX_CALL_DEPTH {
                    return Err(RuntimeError::Range(
                        "Maximum call stack size exceeded".to_string(),
                    ));
                }
                self.depth += 1;
                let result = self.call_closure(closure, args);
                self.depth -= 1;
                result
            }
            other => Err(RuntimeError::type_error(format!(
                "{} is not a function",
                other
            ))),
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> RuntimeResult<Value> {
        let scope = new_scope(Some(closure.env.clone()), true);
        let mut args = args.into_iter();
        for param in &closure.def.params {
            declare(&scope, param, args.next().unwrap_or_default(), true);
        }
        match &closure.def.body {
            FunctionBody::Expr(expr) => self.eval(expr, &scope),
            FunctionBody::Block(stmts) => match self.exec_block(stmts, &scope)? {
                Flow::Return(value) => Ok(value),
                _ => Ok(Value::Undefined),
            },
        }
    }

    fn make_closure(&mut self, def: &Arc<FunctionDef>, env: &Env) -> Value {
        let weak = Rc::downgrade(env);
        if !self.captured.last().is_some_and(|last| last.ptr_eq(&weak)) {
            self.captured.push(weak);
        }
        Value::Function(Rc::new(Closure {
            def: def.clone(),
            env: env.clone(),
        }))
    }

    // ============ Statements ============

    /// Execute a statement list in `env`, hoisting function declarations.
    fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> RuntimeResult<Flow> {
        for stmt in stmts {
            if let Stmt::Function(def) = stmt {
                if let Some(name) = &def.name {
                    let closure = self.make_closure(def, env);
                    declare(env, name, closure, true);
                }
            }
        }
        for stmt in stmts {
            match self.exec(stmt, env)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Env) -> RuntimeResult<Flow> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
                Ok(Flow::Normal)
            }
            Stmt::Decl { kind, decls } => {
                for (name, init) in decls {
                    let value = match init {
                        Some(expr) => self.eval(expr, env)?,
                        None => Value::Undefined,
                    };
                    match kind {
                        DeclKind::Var => {
                            let target = function_scope(env);
                            // `var x;` does not reset an existing `x`.
                            if init.is_some() || !target.borrow().vars.contains_key(name) {
                                declare(&target, name, value, true);
                            }
                        }
                        DeclKind::Let => declare(env, name, value, true),
                        DeclKind::Const => declare(env, name, value, false),
                    }
                }
                Ok(Flow::Normal)
            }
            // Hoisted by `exec_block`.
            Stmt::Function(_) => Ok(Flow::Normal),
            Stmt::Block(stmts) => self.exec_block(stmts, &child(env)),
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.truthy() {
                    self.exec(consequent, env)
                } else if let Some(alternate) = alternate {
                    self.exec(alternate, env)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                let mut scope = child(env);
                if let Some(init) = init {
                    self.exec(init, &scope)?;
                }
                let per_iteration: &[(String, Option<Expr>)] = match init.as_deref() {
                    Some(Stmt::Decl {
                        kind: DeclKind::Let,
                        decls,
                    }) => decls.as_slice(),
                    _ => &[],
                };
                loop {
                    scope = next_iteration(&scope, per_iteration);
                    if let Some(test) = test {
                        if !self.eval(test, &scope)?.truthy() {
                            break;
                        }
                    }
                    match self.exec(body, &scope)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    scope = next_iteration(&scope, per_iteration);
                    if let Some(update) = update {
                        self.eval(update, &scope)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
            } => {
                let items = match self.eval(iterable, env)? {
                    Value::Array(items) => items.borrow().clone(),
                    Value::String(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
                    other => {
                        return Err(RuntimeError::type_error(format!(
                            "{} is not iterable",
                            other
                        )));
                    }
                };
                self.exec_loop(*kind, name, items, body, env)
            }
            Stmt::ForIn {
                kind,
                name,
                object,
                body,
            } => {
                let keys = builtins::own_keys(&self.eval(object, env)?);
                self.exec_loop(*kind, name, keys, body, env)
            }
            Stmt::While { test, body } => {
                while self.eval(test, env)?.truthy() {
                    match self.exec(body, env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::DoWhile { body, test } => {
                loop {
                    match self.exec(body, env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if !self.eval(test, env)?.truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Empty => Ok(Flow::Normal),
        }
    }

    /// Shared body of `for...of` and `for...in`: one fresh scope per item.
    fn exec_loop(
        &mut self,
        kind: Option<DeclKind>,
        name: &str,
        items: Vec<Value>,
        body: &Stmt,
        env: &Env,
    ) -> RuntimeResult<Flow> {
        for item in items {
            let scope = child(env);
            match kind {
                Some(DeclKind::Let) => declare(&scope, name, item, true),
                Some(DeclKind::Const) => declare(&scope, name, item, false),
                Some(DeclKind::Var) => declare(&function_scope(env), name, item, true),
                None => self.write_place(&Place::Var(name.to_string()), item, env)?,
            }
            match self.exec(body, &scope)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal)
    }

    // ============ Expressions ============

    fn eval(&mut self, expr: &Expr, env: &Env) -> RuntimeResult<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::string(s.as_str())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Ident(name) => {
                lookup(env, name).ok_or_else(|| RuntimeError::Reference(name.clone()))
            }
            Expr::Array(items) => {
                let values = self.eval_list(items, env)?;
                Ok(Value::array(values))
            }
            Expr::Object(props) => {
                let mut map = indexmap::IndexMap::with_capacity(props.len());
                for (key, value) in props {
                    let value = self.eval(value, env)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::object(map))
            }
            Expr::Member { object, property } => {
                let object = self.eval(object, env)?;
                let key = self.property_key(property, env)?;
                builtins::get_property(&object, &key)
            }
            Expr::Call { callee, args } => self.eval_call(callee, args, env),
            Expr::Unary { op, operand } => {
                // `typeof` of an undeclared name is not an error.
                if let (UnaryOp::Typeof, Expr::Ident(name)) = (op, operand.as_ref()) {
                    let value = lookup(env, name).unwrap_or_default();
                    return Ok(Value::string(value.type_of()));
                }
                let value = self.eval(operand, env)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.truthy()),
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Typeof => Value::string(value.type_of()),
                })
            }
            Expr::Update { op, prefix, target } => {
                let place = self.resolve_place(target, env)?;
                let old = self.read_place(&place, env)?.to_number();
                let new = match op {
                    UpdateOp::Inc => old + 1.0,
                    UpdateOp::Dec => old - 1.0,
                };
                self.write_place(&place, Value::Number(new), env)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                ops::binary(*op, &left, &right)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left, env)?;
                let short_circuit = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right, env)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.truthy() {
                    self.eval(consequent, env)
                } else {
                    self.eval(alternate, env)
                }
            }
            Expr::Assign { op, target, value } => {
                let place = self.resolve_place(target, env)?;
                let value = match op {
                    None => self.eval(value, env)?,
                    Some(op) => {
                        let current = self.read_place(&place, env)?;
                        let rhs = self.eval(value, env)?;
                        ops::binary(*op, &current, &rhs)?
                    }
                };
                self.write_place(&place, value.clone(), env)?;
                Ok(value)
            }
            Expr::Sequence(exprs) => {
                let mut last = Value::Undefined;
                for expr in exprs {
                    last = self.eval(expr, env)?;
                }
                Ok(last)
            }
            Expr::Function(def) => Ok(self.make_closure(def, env)),
        }
    }

    fn eval_list(&mut self, exprs: &[Expr], env: &Env) -> RuntimeResult<Vec<Value>> {
        exprs.iter().map(|expr| self.eval(expr, env)).collect()
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], env: &Env) -> RuntimeResult<Value> {
        if let Expr::Member { object, property } = callee {
            let receiver = self.eval(object, env)?;
            let key = self.property_key(property, env)?;
            let args = self.eval_list(args, env)?;

            // Functions stored on plain objects (`Math.max`, user objects).
            if let Value::Object(map) = &receiver {
                let method = map.borrow().get(&key).cloned();
                if let Some(method) = method {
                    if !method.is_callable() {
                        return Err(not_a_function(callee));
                    }
                    return self.call_function(&method, args);
                }
            }
            return builtins::call_method(self, &receiver, &key, args);
        }

        let function = self.eval(callee, env)?;
        if !function.is_callable() {
            return Err(not_a_function(callee));
        }
        let args = self.eval_list(args, env)?;
        self.call_function(&function, args)
    }

    fn property_key(&mut self, property: &MemberProp, env: &Env) -> RuntimeResult<String> {
        match property {
            MemberProp::Named(name) => Ok(name.clone()),
            MemberProp::Computed(expr) => Ok(self.eval(expr, env)?.to_string()),
        }
    }

    fn resolve_place(&mut self, target: &Expr, env: &Env) -> RuntimeResult<Place> {
        match target {
            Expr::Ident(name) => Ok(Place::Var(name.clone())),
            Expr::Member { object, property } => {
                let object = self.eval(object, env)?;
                let key = self.property_key(property, env)?;
                Ok(Place::Member(object, key))
            }
            _ => Err(RuntimeError::type_error("Invalid assignment target")),
        }
    }

    fn read_place(&self, place: &Place, env: &Env) -> RuntimeResult<Value> {
        match place {
            Place::Var(name) => {
                lookup(env, name).ok_or_else(|| RuntimeError::Reference(name.clone()))
            }
            Place::Member(object, key) => builtins::get_property(object, key),
        }
    }

    fn write_place(&mut self, place: &Place, value: Value, env: &Env) -> RuntimeResult<()> {
        match place {
            Place::Var(name) => {
                // Assigning an undeclared name creates a global.
                if !assign(env, name, value.clone())? {
                    declare(&self.globals, name, value, true);
                }
                Ok(())
            }
            Place::Member(object, key) => builtins::set_property(object, key, value),
        }
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        // Closures stored in the scopes they capture form `Rc` cycles.
        for weak in self.captured.drain(..) {
            if let Some(scope) = weak.upgrade() {
                scope.borrow_mut().vars.clear();
            }
        }
        self.globals.borrow_mut().vars.clear();
    }
}

fn not_a_function(callee: &Expr) -> RuntimeError {
    RuntimeError::type_error(format!("{} is not a function", describe(callee)))
}

/// A short source-like rendering of a callee for error messages.
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Member {
            object,
            property: MemberProp::Named(name),
        } => format!("{}.{}", describe(object), name),
        Expr::Member { object, .. } => format!("{}[...]", describe(object)),
        Expr::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}
