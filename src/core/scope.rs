//! Shadowing stack-of-stacks for name -> value bindings during traversal
//! (spec §4.D). A `Map<Name, Stack<(Value, Depth)>>` works directly: `push`
//! saves the old binding (if any) and installs a new one, `pop` restores it.
//! Depth is used to decide whether a variable referenced in a substitution
//! is still valid (spec §4.E.4).

use std::collections::HashMap;

#[derive(Clone, Debug)]
struct Entry<T> {
    value: T,
    depth: u32,
}

#[derive(Clone, Debug)]
pub struct Scope<T> {
    bindings: HashMap<String, Vec<Entry<T>>>,
    depth: u32,
}

impl<T> Default for Scope<T> {
    fn default() -> Self {
        Scope {
            bindings: HashMap::new(),
            depth: 0,
        }
    }
}

impl<T: Clone> Scope<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new binding for `name`, shadowing any existing one.
    pub fn push(&mut self, name: impl Into<String>, value: T) {
        self.depth += 1;
        let depth = self.depth;
        self.bindings
            .entry(name.into())
            .or_default()
            .push(Entry { value, depth });
    }

    /// Pop the most recent binding for `name`, restoring whatever was
    /// shadowed (if anything).
    pub fn pop(&mut self, name: &str) {
        if let Some(stack) = self.bindings.get_mut(name) {
            stack.pop();
            if stack.is_empty() {
                self.bindings.remove(name);
            }
        }
    }

    /// Look up the current binding for `name`.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.bindings
            .get(name)
            .and_then(|stack| stack.last())
            .map(|e| &e.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.get(name).is_some_and(|s| !s.is_empty())
    }

    /// The depth stamp of the current binding for `name`, if bound.
    /// A substitution that captures this stamp can later check whether the
    /// same binding (not a newer shadow) is still in scope at the use site.
    pub fn depth_of(&self, name: &str) -> Option<u32> {
        self.bindings
            .get(name)
            .and_then(|stack| stack.last())
            .map(|e| e.depth)
    }

    /// Is the binding for `name` at `depth` still the innermost one?
    pub fn still_valid(&self, name: &str, depth: u32) -> bool {
        self.depth_of(name) == Some(depth)
    }
}

/// RAII helper: push on construction, pop on drop. Lets a pass write
/// `let _g = scope.push_guard(name, value);` and rely on scope-exit to
/// restore shadowing even across early returns.
pub struct ScopeGuard<'a, T: Clone> {
    scope: &'a mut Scope<T>,
    name: String,
}

impl<T: Clone> Scope<T> {
    pub fn push_guard<'a>(&'a mut self, name: impl Into<String>, value: T) -> ScopeGuard<'a, T> {
        let name = name.into();
        self.push(name.clone(), value);
        ScopeGuard { scope: self, name }
    }
}

impl<'a, T: Clone> Drop for ScopeGuard<'a, T> {
    fn drop(&mut self) {
        self.scope.pop(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_and_restore() {
        let mut scope: Scope<i32> = Scope::new();
        scope.push("x", 1);
        assert_eq!(scope.get("x"), Some(&1));
        scope.push("x", 2);
        assert_eq!(scope.get("x"), Some(&2));
        scope.pop("x");
        assert_eq!(scope.get("x"), Some(&1));
        scope.pop("x");
        assert_eq!(scope.get("x"), None);
    }

    #[test]
    fn depth_tracks_innermost_binding() {
        let mut scope: Scope<i32> = Scope::new();
        scope.push("x", 1);
        let d1 = scope.depth_of("x").unwrap();
        assert!(scope.still_valid("x", d1));
        scope.push("x", 2);
        assert!(!scope.still_valid("x", d1));
        scope.pop("x");
        assert!(scope.still_valid("x", d1));
    }

    #[test]
    fn guard_restores_on_drop() {
        let mut scope: Scope<i32> = Scope::new();
        {
            let _g = scope.push_guard("x", 42);
            assert_eq!(scope.get("x"), Some(&42));
        }
        assert_eq!(scope.get("x"), None);
    }
}
