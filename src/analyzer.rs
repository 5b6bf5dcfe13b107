use crate::{
    ast::*,
    symbols::{ScopeKind, Symbol, SymbolKind, SymbolTable},
    token::{Directive, Span, Spanned},
    util::intern::{Interner, Name},
};

/// Names every program may use without declaring them.
const AMBIENT_GLOBALS: &[&str] = &[
    // TypeScript runtime.
    "console", "Math", "JSON", "Object", "Array", "String", "Number", "Boolean", "Symbol",
    "Promise", "Error", "Date", "Map", "Set", "RegExp", "parseInt", "parseFloat", "isNaN",
    "isFinite", "setTimeout", "setInterval", "clearTimeout", "clearInterval", "undefined",
    "NaN", "Infinity", "globalThis",
    // C standard library.
    "printf", "puts", "scanf", "malloc", "calloc", "realloc", "free", "memcpy", "memset",
    "strlen", "strcmp", "abs", "sqrt", "exit", "assert", "NULL",
    // C++ standard library.
    "std", "cout", "cin", "endl",
    // AssemblyScript runtime.
    "heap", "memory", "load", "store", "changetype", "unreachable", "abort",
];

/// Type names every program may use without declaring them.
static BUILTIN_TYPES: phf::Set<&'static str> = phf::phf_set! {
    "number", "boolean", "object", "unknown", "never", "undefined", "bigint", "symbol",
    "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64", "isize", "usize",
    "size_t", "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t", "uint32_t",
    "uint64_t", "vector", "map", "Record", "Partial", "Readonly", "ReturnType",
    "Function", "ArrayBuffer", "StaticArray", "Uint8Array", "Int32Array", "Float64Array",
};

pub struct Analyzer<'i> {
    interner: &'i mut Interner,
    table: SymbolTable,
    errors: Vec<Spanned<Error>>,
    warnings: Vec<Spanned<Warning>>,
    types: Vec<Name>,
    loop_depth: u32,
    switch_depth: u32,
    class_depth: u32,
}

/// Outcome of a semantic pass.
#[derive(Debug)]
pub struct Analysis {
    pub errors: Vec<Spanned<Error>>,
    pub warnings: Vec<Spanned<Warning>>,
    /// Names declared in the global scope, in declaration order. Ambient
    /// globals are not included.
    pub symbols: Vec<Name>,
    /// User-defined type names (classes, structs, interfaces, enums and
    /// aliases) in declaration order.
    pub types: Vec<Name>,
    pub table: SymbolTable,
}

impl Analysis {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<'i> Analyzer<'i> {
    pub fn new(interner: &'i mut Interner) -> Analyzer<'i> {
        let mut table = SymbolTable::with_capacity(128);
        for global in AMBIENT_GLOBALS {
            let name = interner.intern(global);
            let symbol = Symbol::new(name, SymbolKind::Builtin, Span::default());
            table.define_if_absent(symbol);
        }
        Analyzer {
            interner,
            table,
            errors: Vec::with_capacity(8),
            warnings: Vec::with_capacity(8),
            types: Vec::with_capacity(16),
            loop_depth: 0,
            switch_depth: 0,
            class_depth: 0,
        }
    }

    pub fn analyze(mut self, program: &Program) -> Analysis {
        let ambient = self.table.len();

        for declaration in &program.declarations {
            self.declare(declaration, true);
        }
        for declaration in &program.declarations {
            self.check_declaration(declaration);
        }

        let symbols = self
            .table
            .symbols_in(SymbolTable::GLOBAL)
            .skip(ambient)
            .map(|symbol| symbol.name)
            .collect();

        Analysis {
            errors: self.errors,
            warnings: self.warnings,
            symbols,
            types: self.types,
            table: self.table,
        }
    }

    /// Defines the names a declaration introduces in the current scope.
    /// Variables are only hoisted at the global and namespace levels.
    fn declare(&mut self, declaration: &Declaration, hoist_variables: bool) {
        match &declaration.kind {
            DeclarationKind::Function(function) => {
                let symbol = Symbol::new(function.name.name, SymbolKind::Function, function.name.span)
                    .with_type(function.return_ty.clone())
                    .with_arity(function.params.len());
                self.define(symbol);
            }
            DeclarationKind::Variable(variable) => {
                if hoist_variables {
                    self.declare_variable(variable);
                }
            }
            DeclarationKind::Class(class) => self.declare_type(class.name, SymbolKind::Class),
            DeclarationKind::Struct(class) => self.declare_type(class.name, SymbolKind::Struct),
            DeclarationKind::Interface(interface) => {
                self.declare_type(interface.name, SymbolKind::Interface);
            }
            DeclarationKind::Enum(enumeration) => {
                self.declare_type(enumeration.name, SymbolKind::Enum);
                // Plain C enums leak their variants into the enclosing scope.
                for variant in &enumeration.variants {
                    let symbol = Symbol::new(variant.name.name, SymbolKind::EnumMember, variant.span);
                    self.table.define_if_absent(symbol);
                }
            }
            DeclarationKind::Namespace(namespace) => {
                let symbol = Symbol::new(namespace.name.name, SymbolKind::Namespace, namespace.name.span);
                self.table.define_if_absent(symbol);
            }
            DeclarationKind::TypeAlias(alias) => self.declare_type(alias.name, SymbolKind::TypeAlias),
            DeclarationKind::Import(import) => {
                let locals = import
                    .default
                    .iter()
                    .chain(&import.namespace)
                    .copied()
                    .chain(import.specifiers.iter().map(ImportSpecifier::local));
                for local in locals.collect::<Vec<_>>() {
                    self.define(Symbol::new(local.name, SymbolKind::Import, local.span));
                }
            }
            DeclarationKind::Export { declaration, .. } => self.declare(declaration, hoist_variables),
            DeclarationKind::Directive { directive, argument } => {
                if *directive == Directive::Define {
                    if let Some(name) = argument.split_whitespace().next() {
                        // Function-like macros keep only their name.
                        let name = name.split('(').next().unwrap_or(name);
                        let name = self.interner.intern(name);
                        let symbol = Symbol::new(name, SymbolKind::Constant, declaration.span);
                        self.table.define_if_absent(symbol);
                    }
                }
            }
        }
    }

    fn declare_type(&mut self, ident: Ident, kind: SymbolKind) {
        if self.define(Symbol::new(ident.name, kind, ident.span)) {
            self.types.push(ident.name);
        }
    }

    fn declare_variable(&mut self, variable: &Variable) {
        for declarator in &variable.declarators {
            let mutable = !variable.binding.is_constant()
                && !matches!(
                    declarator.ty.as_ref().map(|ty| &ty.kind),
                    Some(TypeKind::Const(_))
                );
            let kind = if mutable {
                SymbolKind::Variable
            } else {
                SymbolKind::Constant
            };
            let symbol = Symbol::new(declarator.name.name, kind, declarator.name.span)
                .with_type(declarator.ty.clone())
                .mutable(mutable);
            self.define(symbol);
        }
    }

    /// Defines the symbol, reporting a duplicate declaration on conflict.
    /// Returns whether the symbol was defined.
    fn define(&mut self, symbol: Symbol) -> bool {
        let span = symbol.span;
        let name = symbol.name;
        match self.table.define(symbol) {
            Ok(_) => true,
            Err(other) => {
                let error = Error::DuplicateDeclaration {
                    name,
                    other_definition_span: other.span,
                };
                self.errors.push(span.wrap(error));
                false
            }
        }
    }

    fn check_declaration(&mut self, declaration: &Declaration) {
        match &declaration.kind {
            DeclarationKind::Function(function) => self.check_function(function),
            DeclarationKind::Variable(variable) => self.check_variable(variable),
            DeclarationKind::Class(class) | DeclarationKind::Struct(class) => {
                self.check_class(class);
            }
            DeclarationKind::Interface(interface) => self.check_interface(interface),
            DeclarationKind::Enum(enumeration) => {
                for value in enumeration.variants.iter().filter_map(|v| v.value.as_ref()) {
                    self.check_expr(value);
                }
            }
            DeclarationKind::Namespace(namespace) => {
                self.table.enter(ScopeKind::Namespace);
                for inner in &namespace.body {
                    self.declare(inner, true);
                }
                for inner in &namespace.body {
                    self.check_declaration(inner);
                }
                self.table.exit();
            }
            DeclarationKind::TypeAlias(alias) => {
                self.table.enter(ScopeKind::Block);
                self.define_type_params(&alias.type_params);
                self.check_type(&alias.ty);
                self.table.exit();
            }
            DeclarationKind::Export { declaration, .. } => self.check_declaration(declaration),
            DeclarationKind::Import(_) | DeclarationKind::Directive { .. } => {}
        }
    }

    fn define_type_params(&mut self, type_params: &[TypeParam]) {
        for param in type_params {
            self.define(Symbol::new(param.name.name, SymbolKind::TypeParameter, param.name.span));
        }
        for param in type_params {
            if let Some(constraint) = &param.constraint {
                self.check_type(constraint);
            }
            if let Some(default) = &param.default {
                self.check_type(default);
            }
        }
    }

    fn define_params(&mut self, params: &[Param]) {
        for param in params {
            if let Some(ty) = &param.ty {
                self.check_type(ty);
            }
            if let Some(default) = &param.default {
                self.check_expr(default);
            }
            let symbol = Symbol::new(param.name.name, SymbolKind::Parameter, param.name.span)
                .with_type(param.ty.clone())
                .mutable(true);
            self.define(symbol);
        }
    }

    fn check_function(&mut self, function: &Function) {
        self.table.enter(ScopeKind::Function);
        self.define_type_params(&function.type_params);
        self.define_params(&function.params);
        if let Some(ty) = &function.return_ty {
            self.check_type(ty);
        }
        if let Some(body) = &function.body {
            self.in_function_body(|this| this.check_statements(&body.statements));
        }
        self.table.exit();
    }

    /// Loops and switches do not extend into nested function bodies.
    fn in_function_body(&mut self, f: impl FnOnce(&mut Self)) {
        let saved = (self.loop_depth, self.switch_depth);
        self.loop_depth = 0;
        self.switch_depth = 0;
        f(self);
        (self.loop_depth, self.switch_depth) = saved;
    }

    fn check_variable(&mut self, variable: &Variable) {
        for declarator in &variable.declarators {
            if let Some(ty) = &declarator.ty {
                self.check_type(ty);
            }
            if let Some(initializer) = &declarator.initializer {
                self.check_expr(initializer);
            }
        }
    }

    fn check_class(&mut self, class: &Class) {
        self.table.enter(ScopeKind::Class);
        self.class_depth += 1;
        self.define_type_params(&class.type_params);

        if let Some(extends) = &class.extends {
            self.check_type(extends);
        }
        for implemented in &class.implements {
            self.check_type(implemented);
        }

        for member in &class.members {
            match &member.kind {
                MemberKind::Field {
                    declarator,
                    readonly,
                } => {
                    let mutable = !*readonly;
                    let kind = if mutable {
                        SymbolKind::Variable
                    } else {
                        SymbolKind::Constant
                    };
                    let symbol = Symbol::new(declarator.name.name, kind, declarator.name.span)
                        .with_type(declarator.ty.clone())
                        .mutable(mutable);
                    self.define(symbol);
                }
                MemberKind::Method(function) => {
                    let symbol =
                        Symbol::new(function.name.name, SymbolKind::Function, function.name.span)
                            .with_type(function.return_ty.clone())
                            .with_arity(function.params.len());
                    self.define(symbol);
                }
                MemberKind::Constructor { .. } | MemberKind::Destructor(_) => {}
            }
        }

        for member in &class.members {
            match &member.kind {
                MemberKind::Field { declarator, .. } => {
                    if let Some(ty) = &declarator.ty {
                        self.check_type(ty);
                    }
                    if let Some(initializer) = &declarator.initializer {
                        self.check_expr(initializer);
                    }
                }
                MemberKind::Method(function) | MemberKind::Destructor(function) => {
                    self.check_function(function);
                }
                MemberKind::Constructor {
                    function,
                    initializers,
                } => {
                    self.table.enter(ScopeKind::Function);
                    self.define_params(&function.params);
                    for value in initializers.iter().flat_map(|(_, args)| args) {
                        self.check_expr(value);
                    }
                    if let Some(body) = &function.body {
                        self.in_function_body(|this| this.check_statements(&body.statements));
                    }
                    self.table.exit();
                }
            }
        }

        self.class_depth -= 1;
        self.table.exit();
    }

    fn check_interface(&mut self, interface: &Interface) {
        self.table.enter(ScopeKind::Block);
        self.define_type_params(&interface.type_params);
        for extended in &interface.extends {
            self.check_type(extended);
        }
        for member in &interface.members {
            match &member.kind {
                InterfaceMemberKind::Property(ty) => self.check_type(ty),
                InterfaceMemberKind::Method {
                    type_params,
                    params,
                    return_ty,
                } => {
                    self.table.enter(ScopeKind::Function);
                    self.define_type_params(type_params);
                    self.define_params(params);
                    if let Some(ty) = return_ty {
                        self.check_type(ty);
                    }
                    self.table.exit();
                }
            }
        }
        self.table.exit();
    }

    /// Checks a statement list sharing the current scope. Nested
    /// declarations are hoisted first; local variables become visible in
    /// order.
    fn check_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            if let StatementKind::Declaration(declaration) = &statement.kind {
                self.declare(declaration, false);
            }
        }

        let mut terminated = false;
        for statement in statements {
            if terminated {
                self.warnings.push(statement.span.wrap(Warning::UnreachableCode));
                terminated = false;
            }
            self.check_statement(statement);
            if matches!(
                statement.kind,
                StatementKind::Return(_)
                    | StatementKind::Throw(_)
                    | StatementKind::Break
                    | StatementKind::Continue
            ) {
                terminated = true;
            }
        }
    }

    fn check_block(&mut self, block: &Block) {
        self.table.enter(ScopeKind::Block);
        self.check_statements(&block.statements);
        self.table.exit();
    }

    fn check_loop_body(&mut self, body: &Statement) {
        self.loop_depth += 1;
        self.check_statement(body);
        self.loop_depth -= 1;
    }

    fn check_statement(&mut self, statement: &Statement) {
        match &statement.kind {
            StatementKind::Block(block) => self.check_block(block),
            StatementKind::Expression(expr) => self.check_expr(expr),
            StatementKind::Variable(variable) => {
                self.check_variable(variable);
                self.declare_variable(variable);
            }
            StatementKind::Declaration(declaration) => {
                if let DeclarationKind::Variable(_) = declaration.kind {
                    self.declare(declaration, true);
                }
                self.check_declaration(declaration);
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_expr(condition);
                self.check_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_statement(else_branch);
                }
            }
            StatementKind::While { condition, body } => {
                self.check_expr(condition);
                self.check_loop_body(body);
            }
            StatementKind::DoWhile { body, condition } => {
                self.check_loop_body(body);
                self.check_expr(condition);
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                self.table.enter(ScopeKind::Block);
                if let Some(init) = init {
                    self.check_statement(init);
                }
                if let Some(condition) = condition {
                    self.check_expr(condition);
                }
                if let Some(update) = update {
                    self.check_expr(update);
                }
                self.check_loop_body(body);
                self.table.exit();
            }
            StatementKind::ForIn {
                binding,
                iterable,
                body,
            }
            | StatementKind::ForOf {
                binding,
                iterable,
                body,
            } => {
                self.check_expr(iterable);
                self.table.enter(ScopeKind::Block);
                if let Some(ty) = &binding.ty {
                    self.check_type(ty);
                }
                let mutable = !binding.binding.is_constant();
                let kind = if mutable {
                    SymbolKind::Variable
                } else {
                    SymbolKind::Constant
                };
                let symbol = Symbol::new(binding.name.name, kind, binding.name.span)
                    .with_type(binding.ty.clone())
                    .mutable(mutable);
                self.define(symbol);
                self.check_loop_body(body);
                self.table.exit();
            }
            StatementKind::Return(value) => {
                if let Some(value) = value {
                    self.check_expr(value);
                }
            }
            StatementKind::Throw(value) => self.check_expr(value),
            StatementKind::Break => {
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    self.errors.push(statement.span.wrap(Error::BreakOutsideLoop));
                }
            }
            StatementKind::Continue => {
                if self.loop_depth == 0 {
                    self.errors.push(statement.span.wrap(Error::ContinueOutsideLoop));
                }
            }
            StatementKind::Switch {
                discriminant,
                cases,
            } => {
                self.check_expr(discriminant);
                self.switch_depth += 1;
                self.table.enter(ScopeKind::Block);
                for case in cases {
                    if let Some(test) = &case.test {
                        self.check_expr(test);
                    }
                    self.check_statements(&case.body);
                }
                self.table.exit();
                self.switch_depth -= 1;
            }
            StatementKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.check_block(block);
                if let Some(handler) = handler {
                    self.table.enter(ScopeKind::Block);
                    if let Some((name, ty)) = &handler.param {
                        if let Some(ty) = ty {
                            self.check_type(ty);
                        }
                        let symbol = Symbol::new(name.name, SymbolKind::Variable, name.span)
                            .with_type(ty.clone())
                            .mutable(true);
                        self.define(symbol);
                    }
                    self.check_statements(&handler.body.statements);
                    self.table.exit();
                }
                if let Some(finalizer) = finalizer {
                    self.check_block(finalizer);
                }
            }
            StatementKind::Empty => {}
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Identifier(ident) => {
                if self.table.lookup(ident.name).is_none() {
                    self.errors.push(ident.span.wrap(Error::UndefinedName(ident.name)));
                }
            }
            ExprKind::This => {
                if self.class_depth == 0 {
                    self.errors.push(expr.span.wrap(Error::ThisOutsideClass));
                }
            }
            ExprKind::Super => {
                if self.class_depth == 0 {
                    self.errors.push(expr.span.wrap(Error::SuperOutsideClass));
                }
            }
            ExprKind::Literal(_) | ExprKind::Template(_) | ExprKind::Dummy => {}
            ExprKind::Array(elements) => {
                for element in elements {
                    self.check_expr(element);
                }
            }
            ExprKind::Object(properties) => {
                for property in properties {
                    if let PropertyKey::Computed(key) = &property.key {
                        self.check_expr(key);
                    }
                    self.check_expr(&property.value);
                }
            }
            ExprKind::Paren(inner)
            | ExprKind::Unary { operand: inner, .. }
            | ExprKind::Delete { operand: inner, .. }
            | ExprKind::Typeof(inner)
            | ExprKind::Await(inner)
            | ExprKind::Spread(inner)
            | ExprKind::Sizeof(SizeofOperand::Expr(inner)) => self.check_expr(inner),
            ExprKind::Sizeof(SizeofOperand::Type(ty)) => self.check_type(ty),
            ExprKind::Update { operand, .. } => {
                self.check_assignment_target(operand);
                self.check_expr(operand);
            }
            ExprKind::Binary { lhs, rhs, .. } | ExprKind::Logical { lhs, rhs, .. } => {
                self.check_expr(lhs);
                self.check_expr(rhs);
            }
            ExprKind::Assignment { target, value, .. } => {
                self.check_assignment_target(target);
                self.check_expr(target);
                self.check_expr(value);
            }
            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.check_expr(condition);
                self.check_expr(then_expr);
                self.check_expr(else_expr);
            }
            ExprKind::Call {
                callee,
                type_args,
                args,
            } => {
                self.check_expr(callee);
                for ty in type_args {
                    self.check_type(ty);
                }
                for arg in args {
                    self.check_expr(arg);
                }
            }
            // Properties are resolved against the object's type, which this
            // pass does not track.
            ExprKind::Member { object, .. } => self.check_expr(object),
            ExprKind::Index { object, index } => {
                self.check_expr(object);
                self.check_expr(index);
            }
            ExprKind::New { ty, args } => {
                self.check_type(ty);
                for arg in args {
                    self.check_expr(arg);
                }
            }
            ExprKind::NewArray { element, length } => {
                self.check_type(element);
                self.check_expr(length);
            }
            ExprKind::Arrow(arrow) => {
                self.table.enter(ScopeKind::Function);
                self.define_params(&arrow.params);
                if let Some(ty) = &arrow.return_ty {
                    self.check_type(ty);
                }
                self.in_function_body(|this| match &arrow.body {
                    ArrowBody::Expr(body) => this.check_expr(body),
                    ArrowBody::Block(body) => this.check_statements(&body.statements),
                });
                self.table.exit();
            }
            ExprKind::Lambda(lambda) => {
                for capture in &lambda.captures {
                    if let Capture::ByValue(ident) | Capture::ByReference(ident) = capture {
                        if self.table.lookup(ident.name).is_none() {
                            self.errors.push(ident.span.wrap(Error::UndefinedName(ident.name)));
                        }
                    }
                }
                self.table.enter(ScopeKind::Function);
                self.define_params(&lambda.params);
                if let Some(ty) = &lambda.return_ty {
                    self.check_type(ty);
                }
                self.in_function_body(|this| this.check_statements(&lambda.body.statements));
                self.table.exit();
            }
            ExprKind::Cast { ty, expr, .. } => {
                self.check_type(ty);
                self.check_expr(expr);
            }
        }
    }

    fn check_assignment_target(&mut self, target: &Expr) {
        if let ExprKind::Identifier(ident) = &target.unparenthesized().kind {
            if let Some(symbol) = self.table.lookup(ident.name) {
                if !symbol.mutable && symbol.kind == SymbolKind::Constant {
                    self.errors.push(target.span.wrap(Error::AssignmentToConstant(ident.name)));
                }
            }
        }
    }

    fn check_type(&mut self, ty: &TypeNode) {
        match &ty.kind {
            TypeKind::Primitive(_) => {}
            TypeKind::Named { path, args } => {
                // Qualified paths name members of namespaces and modules this
                // pass does not look into.
                if let [ident] = path.as_slice() {
                    if !self.is_known_type(ident.name) {
                        self.warnings.push(ident.span.wrap(Warning::UnknownType(ident.name)));
                    }
                }
                for arg in args {
                    self.check_type(arg);
                }
            }
            TypeKind::Pointer(inner)
            | TypeKind::Reference(inner)
            | TypeKind::Const(inner)
            | TypeKind::Array { element: inner, .. } => self.check_type(inner),
            TypeKind::Function { params, ret } => {
                for param in params {
                    self.check_type(param);
                }
                self.check_type(ret);
            }
            TypeKind::Union(members) => {
                for member in members {
                    self.check_type(member);
                }
            }
        }
    }

    fn is_known_type(&self, name: Name) -> bool {
        let declared = self
            .table
            .lookup(name)
            .is_some_and(|symbol| symbol.kind.is_type() || symbol.kind == SymbolKind::Builtin);
        declared || BUILTIN_TYPES.contains(self.interner.get(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    UndefinedName(Name),
    DuplicateDeclaration {
        name: Name,
        other_definition_span: Span,
    },
    ThisOutsideClass,
    SuperOutsideClass,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    AssignmentToConstant(Name),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    UnknownType(Name),
    UnreachableCode,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        parser::test_utils::parse_program,
        util::test_utils::{assert_errors, tree_tests},
    };

    tree_tests!(
        use analyzer;

        fn test_clean_program_keeps_its_tree() {
            let program = "int add(int a, int b) { return a + b; }";
            let tree_ok = "
                function add -> int (0..39)
                  param a: int (8..13)
                  param b: int (15..20)
                  block (22..39)
                    return (24..37)
                      binary Add (31..36)
                        ident a (31..32)
                        ident b (35..36)
            ";
        }

        fn test_constant_reassigned() {
            let program = "edict int x = 5; void f() { x = 6; }";
            let expected_errors = &["28..29: cannot assign to constant `x`"];
        }
    );

    fn analyze(src: &str) -> (Interner, Analysis) {
        let (mut interner, program) = parse_program(src);
        let analysis = Analyzer::new(&mut interner).analyze(&program);
        (interner, analysis)
    }

    fn names(i: &Interner, names: &[Name]) -> Vec<String> {
        names.iter().map(|&name| i.get(name).to_owned()).collect()
    }

    #[test]
    fn hoisted_declarations() {
        let (i, analysis) = analyze(
            "
            int main() { return add(1, counter); }
            int add(int a, int b) { return a + b; }
            int counter = 0;
            class Point { int x; };
            type Id = number;
            ",
        );
        assert!(analysis.success());
        assert!(analysis.warnings.is_empty());
        assert_eq!(
            names(&i, &analysis.symbols),
            ["main", "add", "counter", "Point", "Id"]
        );
        assert_eq!(names(&i, &analysis.types), ["Point", "Id"]);
    }

    #[test]
    fn undefined_identifiers() {
        let (i, analysis) = analyze(
            "
int f() {
    int y = x;
    return y + z;
}",
        );
        assert_errors(
            &i,
            &analysis.errors,
            &["23..24: undefined identifier `x`", "41..42: undefined identifier `z`"],
        );
    }

    #[test]
    fn locals_are_visible_in_order() {
        let (i, analysis) = analyze("void f() { g(y); int y = 1; }\nvoid g(int v) {}");
        assert_errors(&i, &analysis.errors, &["13..14: undefined identifier `y`"]);
    }

    #[test]
    fn duplicates_and_overloads() {
        let (i, analysis) = analyze(
            "
int f(int a) { return a; }
int f(int a, int b) { return a; }
int x = 1;
let x = 2;",
        );
        assert_errors(
            &i,
            &analysis.errors,
            &["77..78: duplicate declaration of `x`, previously declared at 66..67"],
        );
    }

    #[test]
    fn this_outside_class() {
        let (i, analysis) = analyze(
            "
class A {
    int x;
    int get() { return this.x; }
};
int f() { return this.x; }",
        );
        assert_errors(&i, &analysis.errors, &["75..79: `this` used outside of a class"]);
    }

    #[test]
    fn break_and_continue_placement() {
        let (i, analysis) = analyze(
            "
void f(int n) {
    while (n) { if (n) break; continue; }
    switch (n) { case 1: break; }
    break;
    continue;
}",
        );
        assert_errors(
            &i,
            &analysis.errors,
            &[
                "97..103: `break` outside of a loop or switch",
                "108..117: `continue` outside of a loop",
            ],
        );
    }

    #[test]
    fn assignment_to_constant() {
        let (i, analysis) = analyze(
            "
edict int limit = 10;
void f() {
    limit = 3;
    let n = 0;
    n += 1;
    limit++;
}",
        );
        assert_errors(
            &i,
            &analysis.errors,
            &[
                "38..43: cannot assign to constant `limit`",
                "80..85: cannot assign to constant `limit`",
            ],
        );
    }

    #[test]
    fn warnings() {
        let (i, analysis) = analyze(
            "
int f() {
    return 1;
    Widget w;
}",
        );
        assert!(analysis.success());
        assert_errors(
            &i,
            &analysis.warnings,
            &["29..38: unreachable statement", "29..35: unknown type `Widget`"],
        );
    }

    #[test]
    fn ambient_globals_and_class_scope() {
        let (i, analysis) = analyze(
            r#"
#define SIZE 16
import { readFile as read } from "fs";
class Buffer {
    void* data;
    Buffer() : data(malloc(SIZE)) {}
    ~Buffer() { free(data); }
    int size() { return SIZE; }
};
function main(): void {
    console.log(Math.max(1, 2), read);
    const items: Array<number> = [1, 2];
    for (const item of items) { printf("%d", item); }
    const twice = (v: number) => v * 2;
    twice(3);
}
"#,
        );
        assert_errors(&i, &analysis.errors, &[]);
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn enum_variants_leak_into_scope() {
        let (i, analysis) = analyze(
            "
enum Color { Red, Green };
Color c = Red;
namespace geo { int origin = 0; int at() { return origin; } }",
        );
        assert_errors(&i, &analysis.errors, &[]);
        assert_eq!(names(&i, &analysis.types), ["Color"]);
    }
}
