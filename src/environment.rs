use core::fmt;
use std::{cell::RefCell, collections::{HashMap, HashSet}, rc::Rc};

use itertools::Itertools;
use tracing::debug;

use crate::{builtin::builtins, error::SnekError, interpreter::{EvaluationResult, SnekValue}};

/// One frame of the lexical scope chain.
///
/// Frames are shared through `Rc`: a call frame is kept alive by every
/// closure created inside it, so it can outlive the call that made it.
pub struct Environment {
    bindings: RefCell<HashMap<String, SnekValue>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// A frame with no parent and the given bindings.
    pub fn root(bindings: HashMap<String, SnekValue>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(bindings),
            parent: None,
        })
    }

    /// The global frame of a new session, seeded with every builtin.
    pub fn global() -> Rc<Self> {
        Self::root(builtins())
    }

    /// An empty frame whose lookups fall through to `parent`.
    pub fn enclosed(parent: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    pub fn parent(&self) -> Option<&Rc<Self>> {
        self.parent.as_ref()
    }

    /// Binds `name` in this frame only, shadowing any binding further out.
    pub fn define(&self, name: impl Into<String>, value: SnekValue) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> EvaluationResult {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.lookup(name),
            None => {
                debug!(name, "unbound symbol");
                Err(SnekError::SnekNameError)
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
            || self.parent.as_ref().is_some_and(|parent| parent.contains(name))
    }

    /// Every symbol visible from this frame.
    pub fn keys(&self) -> HashSet<String> {
        let mut keys = match &self.parent {
            Some(parent) => parent.keys(),
            None => HashSet::new(),
        };
        keys.extend(self.bindings.borrow().keys().cloned());
        keys
    }

    /// Number of frames from here to the global frame, inclusive.
    pub fn depth(&self) -> usize {
        match &self.parent {
            Some(parent) => 1 + parent.depth(),
            None => 1,
        }
    }
}

// Bindings may hold closures that point back at this frame, so only
// the names are printed.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.bindings.borrow();
        f.debug_struct("Environment")
            .field("bindings", &bindings.keys().sorted().collect_vec())
            .field("depth", &self.depth())
            .finish()
    }
}
