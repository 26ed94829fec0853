//! Environment for variable bindings
//!
//! An environment is a list of frames, most recent first. A frame is a flat
//! list `[name1, value1, name2, value2, ...]` in declaration order. Both live
//! in the [`ListStore`], so extending an environment shares the whole chain
//! of the parent instead of copying it.

use crate::arena::{List, ListStore};
use crate::error::Result;
use crate::interner::Text;
use crate::language::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Environment {
    frames: List,
}

impl Environment {
    /// The empty top-level environment
    pub fn new() -> Self {
        Environment { frames: List::EMPTY }
    }

    pub fn from_list(frames: List) -> Self {
        Environment { frames }
    }

    pub fn as_list(&self) -> List {
        self.frames
    }

    /// Create a child environment with one new frame in front.
    pub fn extend(&self, store: &mut ListStore, bindings: &[(Text, Value)]) -> Result<Self> {
        let mut frame = List::EMPTY;
        for &(name, value) in bindings.iter().rev() {
            frame = store.push(frame, value)?;
            frame = store.push(frame, Value::Atom(name))?;
        }
        let frames = store.push(self.frames, Value::List(frame))?;
        Ok(Environment { frames })
    }

    /// Look up a variable, innermost frame first and first match within a
    /// frame. Returns [`Value::None`] when the name is unbound.
    pub fn lookup(&self, store: &ListStore, name: Text) -> Result<Value> {
        for frame in store.iter(self.frames) {
            let Value::List(mut entries) = frame? else {
                continue;
            };
            while let Some((key, rest)) = store.split(entries)? {
                let Some((value, next)) = store.split(rest)? else {
                    break;
                };
                if key == Value::Atom(name) {
                    return Ok(value);
                }
                entries = next;
            }
        }
        Ok(Value::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::Interner;

    #[test]
    fn test_lookup_in_empty_environment() {
        let store = ListStore::default();
        let mut interner = Interner::new();
        let env = Environment::new();
        assert_eq!(env.lookup(&store, interner.intern("x")).unwrap(), Value::None);
    }

    #[test]
    fn test_inner_frame_shadows_outer() {
        let mut store = ListStore::default();
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");

        let outer = Environment::new()
            .extend(&mut store, &[(x, Value::Number(1.0)), (y, Value::Number(2.0))])
            .unwrap();
        let inner = outer.extend(&mut store, &[(x, Value::Number(10.0))]).unwrap();

        assert_eq!(inner.lookup(&store, x).unwrap(), Value::Number(10.0));
        assert_eq!(inner.lookup(&store, y).unwrap(), Value::Number(2.0));
        assert_eq!(outer.lookup(&store, x).unwrap(), Value::Number(1.0));
        assert_eq!(store.len(inner.as_list()).unwrap(), 2);
    }

    #[test]
    fn test_first_binding_in_frame_wins() {
        let mut store = ListStore::default();
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let env = Environment::new()
            .extend(&mut store, &[(x, Value::Number(1.0)), (x, Value::Number(2.0))])
            .unwrap();
        assert_eq!(env.lookup(&store, x).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_empty_frame_is_skipped() {
        let mut store = ListStore::default();
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let env = Environment::new()
            .extend(&mut store, &[(x, Value::Number(3.0))])
            .unwrap()
            .extend(&mut store, &[])
            .unwrap();
        assert_eq!(env.lookup(&store, x).unwrap(), Value::Number(3.0));
    }
}
