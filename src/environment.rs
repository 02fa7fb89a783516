use core::fmt;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

use itertools::Itertools;

use crate::{ast::BlockStatement, object::{Function, Object}};

enum Binding {
    Value(Object),
    // A function that closes over the very frame binding it. The frame handle
    // is left out and put back on lookup, otherwise the two would keep each
    // other alive.
    OwnFunction { parameters: Rc<[String]>, body: Rc<BlockStatement> },
}

struct Frame {
    bindings: RefCell<HashMap<String, Binding>>,
    parent: Option<Environment>,
}

/// A scope of bindings chained to the scope that encloses it.
///
/// Cloning an environment hands out another reference to the same scope, which
/// is how closures keep the scope they were defined in alive. The parent of a
/// scope is fixed when it is created.
///
/// A scope is freed once nothing refers to it. The exception is a scope that
/// binds a value holding a closure over one of its own child scopes, such as
/// a function returned by a call and stored next to the function that made
/// it. Those stay alive until [EvaluationContext] clears its root scope.
///
/// [EvaluationContext]: crate::EvaluationContext
#[derive(Clone)]
pub struct Environment(Rc<Frame>);

impl Environment {
    pub fn new() -> Self {
        Self(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    pub fn new_enclosed(parent: &Environment) -> Self {
        Self(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        }))
    }

    /// Looks the name up in this scope, then outwards through the parents.
    pub fn get(&self, name: &str) -> Option<Object> {
        if let Some(binding) = self.0.bindings.borrow().get(name) {
            return Some(match binding {
                Binding::Value(value) => value.clone(),
                Binding::OwnFunction { parameters, body } => Object::Function(Function {
                    parameters: parameters.clone(),
                    body: body.clone(),
                    environment: self.clone(),
                }),
            })
        }
        match &self.0.parent {
            Some(parent) => parent.get(name),
            None => None,
        }
    }

    /// Binds in this scope only, shadowing any binding of the same name further out.
    pub fn set(&self, name: impl Into<String>, value: Object) {
        let binding = match value {
            Object::Function(function) if function.environment.ptr_eq(self) => Binding::OwnFunction {
                parameters: function.parameters,
                body: function.body,
            },
            value => Binding::Value(value),
        };
        self.0.bindings.borrow_mut().insert(name.into(), binding);
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Drops every binding of this scope. A function bound in the scope it
    /// captured forms a reference cycle, clearing the scope breaks it.
    pub(crate) fn clear(&self) {
        // Taken out first so that dropped values can't observe a borrowed map
        let bindings = std::mem::take(&mut *self.0.bindings.borrow_mut());
        drop(bindings);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.0.bindings.borrow().keys().sorted().join(", ");
        write!(f, "Environment([{}]", names)?;
        if let Some(parent) = &self.0.parent {
            write!(f, " <- {:?}", parent)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outwards() {
        let outer = Environment::new();
        outer.set("x", Object::Integer(1));
        outer.set("y", Object::Integer(2));

        let inner = Environment::new_enclosed(&outer);
        inner.set("x", Object::Integer(10));

        assert_eq!(inner.get("x"), Some(Object::Integer(10)));
        assert_eq!(inner.get("y"), Some(Object::Integer(2)));
        assert_eq!(inner.get("z"), None);
    }

    #[test]
    fn set_never_writes_to_parent() {
        let outer = Environment::new();
        outer.set("x", Object::Integer(1));

        let inner = Environment::new_enclosed(&outer);
        inner.set("x", Object::Integer(99));
        inner.set("fresh", Object::Boolean(true));

        assert_eq!(outer.get("x"), Some(Object::Integer(1)));
        assert_eq!(outer.get("fresh"), None);
    }

    #[test]
    fn set_overwrites_locally() {
        let environment = Environment::new();
        environment.set("x", Object::Integer(1));
        environment.set("x", Object::Null);

        assert_eq!(environment.get("x"), Some(Object::Null));
    }

    #[test]
    fn clones_share_the_scope() {
        let environment = Environment::new();
        let alias = environment.clone();
        alias.set("shared", Object::Integer(7));

        assert!(environment.ptr_eq(&alias));
        assert_eq!(environment.get("shared"), Some(Object::Integer(7)));
    }

    #[test]
    fn function_bound_in_its_own_scope_does_not_keep_it_alive() {
        let scope = Environment::new_enclosed(&Environment::new());
        let body = Rc::new(BlockStatement::default());
        scope.set("f", Object::Function(Function {
            parameters: Rc::from(vec!["n".to_owned()]),
            body: body.clone(),
            environment: scope.clone(),
        }));

        let Some(Object::Function(function)) = scope.get("f") else { panic!("f should be a function") };
        assert!(function.environment.ptr_eq(&scope));
        assert!(Rc::ptr_eq(&function.body, &body));
        assert_eq!(&function.parameters[..], ["n".to_owned()]);
        assert_eq!(scope.get("f"), Some(Object::Function(function.clone())));
        drop(function);

        let frame = Rc::downgrade(&scope.0);
        drop(scope);
        assert!(frame.upgrade().is_none());
    }

    #[test]
    fn clear_removes_local_bindings() {
        let outer = Environment::new();
        outer.set("kept", Object::Integer(1));
        let inner = Environment::new_enclosed(&outer);
        inner.set("gone", Object::Integer(2));

        inner.clear();

        assert_eq!(inner.get("gone"), None);
        assert_eq!(inner.get("kept"), Some(Object::Integer(1)));
    }
}
