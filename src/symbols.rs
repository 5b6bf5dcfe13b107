use std::collections::HashMap;

use crate::{ast::TypeNode, token::Span, util::intern::Name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
    Parameter,
    Class,
    Struct,
    Interface,
    Enum,
    EnumMember,
    Namespace,
    TypeAlias,
    TypeParameter,
    Import,
    /// Pre-registered ambient globals such as `console` or `malloc`.
    Builtin,
}

impl SymbolKind {
    /// Whether a symbol of this kind may appear in type position.
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Struct
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::TypeAlias
                | SymbolKind::TypeParameter
                | SymbolKind::Import
                | SymbolKind::Namespace
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: Name,
    pub kind: SymbolKind,
    pub ty: Option<TypeNode>,
    pub mutable: bool,
    pub span: Span,
    /// Parameter count, for functions. Functions with different arities
    /// overload each other.
    pub arity: Option<usize>,
}

impl Symbol {
    pub fn new(name: Name, kind: SymbolKind, span: Span) -> Symbol {
        Symbol {
            name,
            kind,
            ty: None,
            mutable: false,
            span,
            arity: None,
        }
    }

    pub fn with_type(mut self, ty: Option<TypeNode>) -> Symbol {
        self.ty = ty;
        self
    }

    pub fn mutable(mut self, mutable: bool) -> Symbol {
        self.mutable = mutable;
        self
    }

    pub fn with_arity(mut self, arity: usize) -> Symbol {
        self.arity = Some(arity);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Namespace,
    Class,
    Function,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    /// Overloaded functions share a name, hence the list.
    names: HashMap<Name, Vec<SymbolId>>,
    /// Declaration order.
    order: Vec<SymbolId>,
}

/// Scoped symbol storage. Scopes form a tree rooted at the global scope and
/// are never discarded, so the finished table can be inspected after the
/// analysis walked out of them.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    current: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::with_capacity(64)
    }
}

impl SymbolTable {
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn with_capacity(capacity: usize) -> SymbolTable {
        SymbolTable {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                parent: None,
                names: HashMap::with_capacity(capacity),
                order: Vec::with_capacity(capacity),
            }],
            symbols: Vec::with_capacity(capacity),
            current: SymbolTable::GLOBAL,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn current_kind(&self) -> ScopeKind {
        self.scopes[self.current.0].kind
    }

    /// Opens a child scope of the current one and makes it current.
    pub fn enter(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            parent: Some(self.current),
            names: HashMap::new(),
            order: Vec::new(),
        });
        self.current = id;
        id
    }

    /// Returns to the parent scope. Exiting the global scope is a no-op.
    pub fn exit(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            self.current = parent;
        }
    }

    /// Attempts to define the provided symbol in the current scope.
    ///
    /// Fails with the conflicting symbol if the name is already defined in
    /// this very scope, unless both are functions with different arities.
    pub fn define(&mut self, symbol: Symbol) -> Result<SymbolId, &Symbol> {
        let scope = &self.scopes[self.current.0];
        if let Some(existing) = scope.names.get(&symbol.name) {
            let conflict = existing.iter().copied().find(|&id| {
                let other = &self.symbols[id.0];
                let overload = other.kind == SymbolKind::Function
                    && symbol.kind == SymbolKind::Function
                    && other.arity != symbol.arity;
                !overload
            });
            if let Some(conflict) = conflict {
                return Err(&self.symbols[conflict.0]);
            }
        }

        let id = SymbolId(self.symbols.len());
        let scope = &mut self.scopes[self.current.0];
        scope.names.entry(symbol.name).or_default().push(id);
        scope.order.push(id);
        self.symbols.push(symbol);
        Ok(id)
    }

    /// Defines the symbol unless its name is already taken in the current
    /// scope.
    pub fn define_if_absent(&mut self, symbol: Symbol) -> Option<SymbolId> {
        if self.lookup_local(symbol.name).is_some() {
            return None;
        }
        self.define(symbol).ok()
    }

    /// Looks the name up starting at the current scope and walking outward.
    pub fn lookup(&self, name: Name) -> Option<&Symbol> {
        self.lookup_from(self.current, name)
    }

    pub fn lookup_from(&self, scope: ScopeId, name: Name) -> Option<&Symbol> {
        let mut curr = Some(scope);
        while let Some(id) = curr {
            let scope = &self.scopes[id.0];
            if let Some(ids) = scope.names.get(&name) {
                return ids.first().map(|id| &self.symbols[id.0]);
            }
            curr = scope.parent;
        }
        None
    }

    pub fn lookup_local(&self, name: Name) -> Option<&Symbol> {
        let scope = &self.scopes[self.current.0];
        scope
            .names
            .get(&name)
            .and_then(|ids| ids.first())
            .map(|id| &self.symbols[id.0])
    }

    /// Whether any scope enclosing the current one (itself included) has the
    /// provided kind.
    pub fn is_within(&self, kind: ScopeKind) -> bool {
        let mut curr = Some(self.current);
        while let Some(id) = curr {
            let scope = &self.scopes[id.0];
            if scope.kind == kind {
                return true;
            }
            curr = scope.parent;
        }
        false
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    /// Symbols of the provided scope, in declaration order.
    pub fn symbols_in(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> + '_ {
        self.scopes[scope.0]
            .order
            .iter()
            .map(|id| &self.symbols[id.0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::util::intern::Interner;

    fn span(lo: u32) -> Span {
        use crate::token::Position;
        let offset = lo as usize;
        Span::new(
            Position::new(1, lo + 1, offset),
            Position::new(1, lo + 2, offset + 1),
        )
    }

    #[test]
    fn lookup_walks_outward() {
        let mut i = Interner::with_capacity(8);
        let (x, y) = (i.intern("x"), i.intern("y"));
        let mut table = SymbolTable::with_capacity(8);

        table.define(Symbol::new(x, SymbolKind::Variable, span(0))).unwrap();
        table.enter(ScopeKind::Function);
        table.define(Symbol::new(y, SymbolKind::Parameter, span(5))).unwrap();

        assert_eq!(table.lookup(x).map(|s| s.kind), Some(SymbolKind::Variable));
        assert_eq!(table.lookup(y).map(|s| s.kind), Some(SymbolKind::Parameter));
        assert!(table.lookup_local(x).is_none());

        table.exit();
        assert!(table.lookup(y).is_none());
        assert_eq!(table.len(), 2);
        assert_eq!(table.scope_count(), 2);
    }

    #[test]
    fn inner_scopes_shadow() {
        let mut i = Interner::with_capacity(8);
        let x = i.intern("x");
        let mut table = SymbolTable::default();

        table.define(Symbol::new(x, SymbolKind::Variable, span(0))).unwrap();
        table.enter(ScopeKind::Block);
        table.define(Symbol::new(x, SymbolKind::Constant, span(9))).unwrap();
        assert_eq!(table.lookup(x).map(|s| s.span), Some(span(9)));
    }

    #[test]
    fn duplicates_and_overloads() {
        let mut i = Interner::with_capacity(8);
        let (f, v) = (i.intern("f"), i.intern("v"));
        let mut table = SymbolTable::default();

        let func = |arity, lo| Symbol::new(f, SymbolKind::Function, span(lo)).with_arity(arity);
        table.define(func(1, 0)).unwrap();
        assert!(table.define(func(2, 10)).is_ok());
        assert_eq!(table.define(func(2, 20)).unwrap_err().span, span(10));

        table.define(Symbol::new(v, SymbolKind::Variable, span(30))).unwrap();
        let conflict = table.define(Symbol::new(v, SymbolKind::Variable, span(40)));
        assert_eq!(conflict.unwrap_err().span, span(30));
        assert!(table
            .define_if_absent(Symbol::new(v, SymbolKind::EnumMember, span(50)))
            .is_none());
    }

    #[test]
    fn scope_kinds() {
        let mut table = SymbolTable::default();
        table.enter(ScopeKind::Class);
        table.enter(ScopeKind::Function);
        table.enter(ScopeKind::Block);
        assert_eq!(table.current_kind(), ScopeKind::Block);
        assert!(table.is_within(ScopeKind::Class));
        assert!(!table.is_within(ScopeKind::Namespace));
        table.exit();
        table.exit();
        table.exit();
        table.exit();
        assert_eq!(table.current(), SymbolTable::GLOBAL);
    }
}
