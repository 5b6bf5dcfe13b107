use std::{collections::HashMap, fmt, num::NonZeroU32, rc::Rc};

/// A handle to an interned identifier. To retrieve its text, use
/// [`Interner::get`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    // Here we use a NonZeroU32 to leverage niche layout optimization.
    handle: NonZeroU32,
}

impl Name {
    const fn unchecked_new(handle: NonZeroU32) -> Self {
        Name { handle }
    }

    fn index(self) -> usize {
        (self.handle.get() - 1) as usize
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.handle)
    }
}

impl From<&Name> for Name {
    fn from(value: &Name) -> Self {
        *value
    }
}

#[derive(Clone, Default)]
pub struct Interner {
    map: HashMap<Rc<str>, Name>,
    names: Vec<Rc<str>>,
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (i, interned) in self.names.iter().enumerate() {
            map.entry(&(i + 1), interned);
        }
        map.finish()
    }
}

impl Interner {
    pub fn with_capacity(capacity: usize) -> Self {
        Interner {
            map: HashMap::with_capacity(capacity),
            names: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Interns the provided identifier, returning a handle which can be used
    /// to retrieve it later.
    pub fn intern(&mut self, value: &str) -> Name {
        if let Some(name) = self.map.get(value) {
            return *name;
        }
        let key: Rc<str> = Rc::from(value);
        let len = u32::try_from(self.names.len()).expect("interner out of capacity");
        let handle = NonZeroU32::MIN.saturating_add(len);
        let name = Name::unchecked_new(handle);
        self.names.push(Rc::clone(&key));
        self.map.insert(key, name);
        name
    }

    /// Returns the handle of an already interned identifier.
    pub fn lookup(&self, value: &str) -> Option<Name> {
        self.map.get(value).copied()
    }

    /// Returns the text for the provided [`Name`]. Panics if the handle was
    /// produced by another interner.
    pub fn get(&self, name: impl Into<Name>) -> &str {
        &self.names[name.into().index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interner() {
        let mut i = Interner::with_capacity(3);

        let hello1 = i.intern("hello");
        let world1 = i.intern("world");
        let bang1 = i.intern("!");

        let hello2 = i.intern("hello");
        let world2 = i.intern("world");
        let bang2 = i.intern("!");

        assert_eq!(i.get(hello1), "hello");
        assert_eq!(i.get(world2), "world");
        assert_eq!(i.get(bang1), i.get(bang2));

        assert_eq!(hello1, hello2);
        assert_eq!(world1, world2);
        assert_ne!(hello1, world1);
        assert_eq!(i.len(), 3);
    }

    #[test]
    fn lookup_does_not_intern() {
        let mut i = Interner::default();
        let x = i.intern("x");
        assert_eq!(i.lookup("x"), Some(x));
        assert_eq!(i.lookup("y"), None);
        assert_eq!(i.len(), 1);
    }
}
