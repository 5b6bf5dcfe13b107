//! The emitter shared by every target.
//!
//! [`Emitter`] walks the AST once, writing code line by line. Whatever differs
//! between targets (type spellings, literal markers, casts, runtime calls)
//! is asked of the [`Dialect`] type parameter.

use std::{collections::HashMap, marker::PhantomData};

use crate::{
    ast::*,
    codegen::{
        infer::{self, LiteralKind, ValueClass},
        source_map::SourceMapBuilder,
        Feature, GenerationContext, GenerationError, GenerationOutput, GenerationWarning, Target,
    },
    token::{Directive, Span},
    util::intern::{Interner, Name},
};

type Result<T = (), E = GenerationError> = std::result::Result<T, E>;

pub(crate) trait Dialect {
    const TARGET: Target;

    /// Spelling of raw pointers.
    const POINTER: &'static str;

    /// Whether every non-constant binding needs an initial value.
    const REQUIRES_INITIALIZATION: bool;

    /// Whether arbitrary unions can be spelled, not only `T | null`.
    const UNIONS: bool;

    /// Whether `for-of` loops must be lowered to indexed loops.
    const LOWER_FOR_OF: bool;

    /// Maps canonical WORLDC type spellings onto target spellings.
    fn types() -> &'static phf::Map<&'static str, &'static str>;

    fn supports(feature: Feature) -> bool;

    /// `wide` is set when the literal initializes a 64-bit binding.
    fn integer(value: u64, wide: bool) -> String;

    /// An integer literal stored in a binding of class `class` spelled `ty`.
    fn sized_integer(value: u64, class: ValueClass, _ty: &str) -> String {
        Self::integer(value, class == ValueClass::Wide)
    }

    fn float(value: f64, single: bool) -> String;

    /// Converts a literal of kind `from` into the declared class `to`, or
    /// returns `None` when no conversion is needed.
    fn coerce(code: &str, to: ValueClass, from: LiteralKind, ty: &str) -> Option<String>;

    fn cast(code: &str, to: ValueClass, ty: &str, style: CastStyle) -> String;

    fn zero(class: ValueClass) -> Option<&'static str>;

    fn sized_array(element: &str, size: u64, zero: Option<&str>) -> String;

    /// Rewrites calls to C runtime functions.
    fn builtin_call(callee: &str, args: &[String]) -> Option<String>;

    fn sizeof(ty: &str, size: Option<u32>) -> Option<String>;

    fn delete(operand: &str, member: bool) -> Option<String>;

    fn address_of(operand: &str) -> Option<String>;

    fn binary(op: BinaryOperator, strict: bool) -> &'static str;

    /// Releases linear memory.
    fn free(pointer: &str) -> String {
        format!("heap.free({pointer})")
    }
}

/// Line-oriented text sink tracking the generated position.
struct Writer {
    buf: String,
    unit: String,
    level: usize,
    line: u32,
    column: u32,
}

impl Writer {
    fn new(unit: String, level: usize) -> Writer {
        Writer {
            buf: String::with_capacity(4 * 1024),
            unit,
            level,
            line: 0,
            column: 0,
        }
    }

    fn push(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += if ch.len_utf16() == 2 { 2 } else { 1 };
            }
        }
        self.buf.push_str(text);
    }

    fn push_indent(&mut self) {
        let indent = self.unit.repeat(self.level);
        self.push(&indent);
    }
}

pub(crate) struct Emitter<'a, D> {
    ctx: &'a GenerationContext<'a>,
    out: Writer,
    map: Option<SourceMapBuilder>,
    pending: Option<Span>,
    warnings: Vec<GenerationWarning>,
    /// Class and spelling of the enclosing function's return type.
    returns: Option<(ValueClass, String)>,
    /// Declared types of the bindings in scope, innermost last.
    scopes: Vec<HashMap<Name, Option<TypeNode>>>,
    /// Field types of the class being emitted.
    fields: HashMap<Name, TypeNode>,
    /// Parameter types of top-level functions, keyed by name and arity.
    signatures: HashMap<(Name, usize), Vec<Option<TypeNode>>>,
    temps: usize,
    _dialect: PhantomData<D>,
}

impl<'a, D> Emitter<'a, D>
where
    D: Dialect,
{
    pub(super) fn new(ctx: &'a GenerationContext<'a>) -> Emitter<'a, D> {
        let map = (ctx.options.source_map && D::supports(Feature::SourceMaps)).then(|| {
            let file = D::TARGET.output_path(ctx.stem());
            let file = file.rsplit('/').next().unwrap_or(&file).to_owned();
            SourceMapBuilder::new(file, ctx.filename, ctx.source)
        });
        Emitter {
            ctx,
            out: Writer::new(" ".repeat(ctx.options.indent), 0),
            map,
            pending: None,
            warnings: Vec::new(),
            returns: None,
            scopes: vec![HashMap::new()],
            fields: HashMap::new(),
            signatures: HashMap::new(),
            temps: 0,
            _dialect: PhantomData,
        }
    }

    pub(super) fn program(&mut self, program: &Program) -> Result {
        self.line(format!("// Generated by worldc from {}", self.ctx.filename));
        self.blank();
        self.collect_signatures(&program.declarations);

        let mut prev: Option<&Declaration> = None;
        for declaration in &program.declarations {
            if prev.is_some_and(|prev| is_block_like(prev) || is_block_like(declaration)) {
                self.blank();
            }
            self.declaration(declaration, "")?;
            prev = Some(declaration);
        }
        Ok(())
    }

    pub(super) fn finish(mut self, declarations: Option<String>) -> Result<GenerationOutput> {
        let source_map = match self.map.take() {
            Some(builder) => {
                let map = builder.finish();
                self.out.push(&format!("//# sourceMappingURL={}.map\n", map.file));
                let json = map
                    .to_json()
                    .map_err(|error| GenerationError::Failed(error.to_string()))?;
                Some(json)
            }
            None => None,
        };
        Ok(GenerationOutput {
            code: self.out.buf,
            source_map,
            declarations,
            warnings: self.warnings,
        })
    }
}

// Declarations.
impl<D> Emitter<'_, D>
where
    D: Dialect,
{
    fn declaration(&mut self, declaration: &Declaration, prefix: &str) -> Result {
        self.ctx.check_cancelled()?;
        self.mark(declaration.span);
        match &declaration.kind {
            DeclarationKind::Function(function) => self.function(function, prefix),
            DeclarationKind::Variable(variable) => self.variable(variable, prefix),
            DeclarationKind::Class(class) | DeclarationKind::Struct(class) => {
                self.class(class, prefix)
            }
            DeclarationKind::Interface(interface) => self.interface(interface, prefix),
            DeclarationKind::Enum(enumeration) => self.enumeration(enumeration, prefix),
            DeclarationKind::Namespace(namespace) => self.namespace(namespace, prefix),
            DeclarationKind::TypeAlias(alias) => {
                let line = self.type_alias(alias);
                self.line(format!("{prefix}{line}"));
                Ok(())
            }
            DeclarationKind::Import(import) => {
                let line = self.import(import);
                self.line(line);
                Ok(())
            }
            DeclarationKind::Export {
                declaration: inner,
                is_default,
            } => self.export(inner, *is_default),
            DeclarationKind::Directive {
                directive,
                argument,
            } => {
                self.directive(*directive, argument, declaration.span);
                Ok(())
            }
        }
    }

    fn export(&mut self, inner: &Declaration, is_default: bool) -> Result {
        if !is_default {
            return self.declaration(inner, "export ");
        }
        match &inner.kind {
            // `export default let` is not a thing, export the binding instead.
            DeclarationKind::Variable(variable) => {
                self.declaration(inner, "")?;
                if let Some(first) = variable.declarators.first() {
                    let name = self.name(first.name);
                    self.line(format!("export default {name};"));
                }
                Ok(())
            }
            _ => self.declaration(inner, "export default "),
        }
    }

    fn directive(&mut self, directive: Directive, argument: &str, span: Span) {
        if directive != Directive::Define {
            self.line(format!("// #{} {argument}", directive.keyword()));
            return;
        }
        let (name, value) = match argument.split_once(char::is_whitespace) {
            Some((name, value)) => (name, value.trim()),
            None => (argument, ""),
        };
        if name.contains('(') {
            self.warn(span, format!("function-like macro `{name}` is not supported"));
            self.line(format!("// #define {argument}"));
        } else if value.is_empty() {
            self.line(format!("const {name} = true;"));
        } else {
            self.line(format!("const {name} = {value};"));
        }
    }

    pub(super) fn import(&self, import: &Import) -> String {
        let mut clauses = Vec::with_capacity(3);
        if let Some(default) = import.default {
            clauses.push(self.name(default).to_owned());
        }
        if let Some(namespace) = import.namespace {
            clauses.push(format!("* as {}", self.name(namespace)));
        }
        if !import.specifiers.is_empty() {
            let specifiers: Vec<String> = import
                .specifiers
                .iter()
                .map(|specifier| match specifier.alias {
                    Some(alias) => {
                        format!("{} as {}", self.name(specifier.name), self.name(alias))
                    }
                    None => self.name(specifier.name).to_owned(),
                })
                .collect();
            clauses.push(format!("{{ {} }}", specifiers.join(", ")));
        }
        if clauses.is_empty() {
            format!("import {};", quote(&import.source))
        } else {
            format!("import {} from {};", clauses.join(", "), quote(&import.source))
        }
    }

    fn function(&mut self, function: &Function, prefix: &str) -> Result {
        // Prototypes only forward-declare, every target hoists functions.
        let Some(body) = &function.body else {
            return Ok(());
        };
        let signature = self.signature(function, "function ", prefix)?;
        self.line(format!("{signature} {{"));
        self.function_body(function, body)?;
        self.line("}");
        Ok(())
    }

    pub(super) fn signature(
        &mut self,
        function: &Function,
        keyword: &str,
        prefix: &str,
    ) -> Result<String> {
        let modifier = self.async_modifier(function.is_async, function.name.span);
        let name = self.name(function.name);
        let type_params = self.type_params(&function.type_params);
        let params = self.params(&function.params)?;
        let ret = self.return_annotation(function.return_ty.as_ref());
        Ok(format!(
            "{prefix}{modifier}{keyword}{name}{type_params}({params}){ret}"
        ))
    }

    fn async_modifier(&mut self, is_async: bool, span: Span) -> &'static str {
        if !is_async {
            ""
        } else if D::supports(Feature::Async) {
            "async "
        } else {
            self.unsupported(span, "async functions");
            ""
        }
    }

    fn function_body(&mut self, function: &Function, body: &Block) -> Result {
        let returns = function.return_ty.as_ref().map(|ty| {
            let class = infer::classify(ty, self.interner());
            (class, self.ty(ty))
        });
        let saved = std::mem::replace(&mut self.returns, returns);
        let result = self.scoped(|this| {
            for param in &function.params {
                this.bind(param.name, param.ty.as_ref().filter(|_| !param.rest));
            }
            this.indented(|this| this.statements(&body.statements))
        });
        self.returns = saved;
        result
    }

    fn collect_signatures(&mut self, declarations: &[Declaration]) {
        for declaration in declarations {
            match &declaration.kind {
                DeclarationKind::Function(function) => {
                    let params = function
                        .params
                        .iter()
                        .map(|param| param.ty.clone().filter(|_| !param.rest))
                        .collect();
                    self.signatures
                        .entry((function.name.name, function.params.len()))
                        .or_insert(params);
                }
                DeclarationKind::Export { declaration, .. } => {
                    self.collect_signatures(std::slice::from_ref(declaration));
                }
                _ => {}
            }
        }
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scopes.push(HashMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn bind(&mut self, name: Ident, ty: Option<&TypeNode>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.name, ty.cloned());
        }
    }

    /// Declared type of an assignment target, for plain names and `this.field`.
    fn target_type(&self, target: &Expr) -> Option<TypeNode> {
        match &target.kind {
            ExprKind::Identifier(ident) => self
                .scopes
                .iter()
                .rev()
                .find_map(|scope| scope.get(&ident.name))
                .cloned()
                .flatten(),
            ExprKind::Paren(inner) => self.target_type(inner),
            ExprKind::Member {
                object, property, ..
            } if matches!(object.kind, ExprKind::This) => {
                self.fields.get(&property.name).cloned()
            }
            _ => None,
        }
    }

    fn variable(&mut self, variable: &Variable, prefix: &str) -> Result {
        for (i, declarator) in variable.declarators.iter().enumerate() {
            // The first declarator maps to the declaration itself.
            if i > 0 {
                self.mark(declarator.span);
            }
            let (keyword, binding) = self.declarator(variable.binding, declarator)?;
            self.line(format!("{prefix}{keyword} {binding};"));
        }
        Ok(())
    }

    /// Returns the binding keyword and the rest of the declaration.
    fn declarator(
        &mut self,
        binding: BindingKind,
        declarator: &Declarator,
    ) -> Result<(&'static str, String)> {
        let constant = binding.is_constant()
            || matches!(
                declarator.ty.as_ref().map(|ty| &ty.kind),
                Some(TypeKind::Const(_))
            );
        let initializer = match &declarator.initializer {
            Some(value) => Some(self.initializer(declarator.ty.as_ref(), value)?),
            None if !constant => self.default_value(declarator.ty.as_ref()),
            None => None,
        };
        self.bind(declarator.name, declarator.ty.as_ref());
        let keyword = match binding {
            BindingKind::Var => "var",
            _ if constant && initializer.is_some() => "const",
            _ => "let",
        };

        let mut out = self.name(declarator.name).to_owned();
        if let Some(ty) = self.annotation(declarator.ty.as_ref()) {
            out.push_str(": ");
            out.push_str(&ty);
        }
        if let Some(initializer) = initializer {
            out.push_str(" = ");
            out.push_str(&initializer);
        }
        Ok((keyword, out))
    }

    fn initializer(&mut self, ty: Option<&TypeNode>, value: &Expr) -> Result<String> {
        match ty {
            Some(ty) => {
                let class = infer::classify(ty, self.interner());
                let spelling = self.ty(ty);
                self.coerced(value, class, &spelling)
            }
            None => self.expr(value),
        }
    }

    /// Emits `value` for a slot of type `ty`, converting it only when it is
    /// a literal.
    fn converted(&mut self, value: &Expr, ty: &TypeNode) -> Result<String> {
        let class = infer::classify(ty, self.interner());
        if class == ValueClass::Other || infer::infer_literal(value).is_none() {
            return self.expr(value);
        }
        let spelling = self.ty(ty);
        self.coerced(value, class, &spelling)
    }

    /// Emits `value`, converting literals whose kind does not match the
    /// declared class.
    fn coerced(&mut self, value: &Expr, class: ValueClass, ty: &str) -> Result<String> {
        if matches!(class, ValueClass::Integer | ValueClass::Wide) {
            if let Some((negative, literal)) = infer::integer_literal(value) {
                let literal = D::sized_integer(literal, class, ty);
                return Ok(if negative {
                    format!("-{literal}")
                } else {
                    literal
                });
            }
        }
        let code = self.expr(value)?;
        let Some(kind) = infer::infer_literal(value) else {
            return Ok(code);
        };
        Ok(D::coerce(&code, class, kind, ty).unwrap_or(code))
    }

    fn default_value(&mut self, ty: Option<&TypeNode>) -> Option<String> {
        if !(D::REQUIRES_INITIALIZATION || self.ctx.options.initialize_defaults) {
            return None;
        }
        let ty = ty?;
        match &ty.underlying().kind {
            TypeKind::Array { element, size } => {
                let spelling = self.ty(element);
                Some(match size {
                    Some(size) => {
                        let zero = D::zero(infer::classify(element, self.interner()));
                        D::sized_array(&spelling, *size, zero)
                    }
                    None => "[]".to_owned(),
                })
            }
            _ => D::zero(infer::classify(ty, self.interner())).map(str::to_owned),
        }
    }

    fn class(&mut self, class: &Class, prefix: &str) -> Result {
        let is_abstract = class
            .members
            .iter()
            .any(|member| matches!(&member.kind, MemberKind::Method(f) if f.body.is_none()));
        let mut header = format!(
            "{prefix}{}class {}{}",
            if is_abstract { "abstract " } else { "" },
            self.name(class.name),
            self.type_params(&class.type_params),
        );
        if let Some(base) = &class.extends {
            header.push_str(" extends ");
            header.push_str(&self.ty(base));
        }
        if !class.implements.is_empty() {
            let implemented = self.types(&class.implements);
            header.push_str(" implements ");
            header.push_str(&implemented);
        }

        let tracked = if D::supports(Feature::RawMemory) {
            tracked_allocations(class, self.interner())
        } else {
            Vec::new()
        };

        let fields = class
            .members
            .iter()
            .filter_map(|member| match &member.kind {
                MemberKind::Field { declarator, .. } if !member.is_static => declarator
                    .ty
                    .clone()
                    .map(|ty| (declarator.name.name, ty)),
                _ => None,
            })
            .collect();
        let saved = std::mem::replace(&mut self.fields, fields);

        self.line(format!("{header} {{"));
        let result = self.indented(|this| this.class_members(class, &tracked));
        self.fields = saved;
        result?;
        self.line("}");
        Ok(())
    }

    fn class_members(&mut self, class: &Class, tracked: &[Name]) -> Result {
        let mut methods: Vec<Name> = Vec::new();
        let mut has_constructor = false;
        let mut destructor = None;

        for member in &class.members {
            self.ctx.check_cancelled()?;
            self.mark(member.span);
            let modifiers = modifiers(member);
            match &member.kind {
                MemberKind::Field {
                    declarator,
                    readonly,
                } => {
                    let mut line = format!(
                        "{modifiers}{}{}",
                        if *readonly { "readonly " } else { "" },
                        self.name(declarator.name),
                    );
                    if let Some(ty) = self.annotation(declarator.ty.as_ref()) {
                        line.push_str(": ");
                        line.push_str(&ty);
                    }
                    let initializer = match &declarator.initializer {
                        Some(value) => Some(self.initializer(declarator.ty.as_ref(), value)?),
                        None if !readonly => self.default_value(declarator.ty.as_ref()),
                        None => None,
                    };
                    if let Some(initializer) = initializer {
                        line.push_str(" = ");
                        line.push_str(&initializer);
                    }
                    self.line(format!("{line};"));
                }
                MemberKind::Method(function) => {
                    if methods.contains(&function.name.name) {
                        let name = self.name(function.name);
                        self.unsupported(member.span, &format!("overloaded method `{name}`"));
                        continue;
                    }
                    methods.push(function.name.name);
                    match &function.body {
                        None => {
                            let signature = self.signature(function, "", "")?;
                            self.line(format!("{modifiers}abstract {signature};"));
                        }
                        Some(body) => {
                            let signature = self.signature(function, "", &modifiers)?;
                            self.line(format!("{signature} {{"));
                            self.function_body(function, body)?;
                            self.line("}");
                        }
                    }
                }
                MemberKind::Constructor {
                    function,
                    initializers,
                } => {
                    if has_constructor {
                        self.unsupported(member.span, "overloaded constructors");
                        continue;
                    }
                    has_constructor = true;
                    let params = self.params(&function.params)?;
                    self.line(format!("constructor({params}) {{"));
                    self.indented(|this| this.constructor_body(class, function, initializers))?;
                    self.line("}");
                }
                MemberKind::Destructor(function) => destructor = Some(function),
            }
        }

        if destructor.is_some() || !tracked.is_empty() {
            self.line("dispose(): void {");
            self.indented(|this| {
                if let Some(body) = destructor.and_then(|function| function.body.as_ref()) {
                    this.statements(&body.statements)?;
                }
                for &field in tracked {
                    let field = format!("this.{}", this.name(field));
                    this.line(format!("{};", D::free(&field)));
                }
                Ok(())
            })?;
            self.line("}");
        }
        Ok(())
    }

    fn constructor_body(
        &mut self,
        class: &Class,
        function: &Function,
        initializers: &[(Ident, Vec<Expr>)],
    ) -> Result {
        let base = class.extends.as_ref().and_then(|ty| match &ty.kind {
            TypeKind::Named { path, .. } => path.last().map(|ident| ident.name),
            _ => None,
        });

        // A base class initializer is the C++ spelling of `super(...)`.
        let mut has_super = function
            .body
            .as_ref()
            .and_then(|body| body.statements.first())
            .is_some_and(is_super_call);
        for (field, args) in initializers {
            if Some(field.name) == base {
                let args = self.exprs(args)?;
                self.line(format!("super({args});"));
                has_super = true;
            }
        }
        if base.is_some() && !has_super {
            self.line("super();");
        }

        for (field, args) in initializers {
            if Some(field.name) == base {
                continue;
            }
            let ty = class.members.iter().find_map(|member| match &member.kind {
                MemberKind::Field { declarator, .. } if declarator.name.name == field.name => {
                    declarator.ty.as_ref()
                }
                _ => None,
            });
            // `x()` value-initializes the field.
            let value = match args.as_slice() {
                [value] => self.initializer(ty, value)?,
                [] => match ty.and_then(|ty| D::zero(infer::classify(ty, self.interner()))) {
                    Some(zero) => zero.to_owned(),
                    None => continue,
                },
                _ => {
                    self.unsupported(field.span, "multi-argument field initializers");
                    continue;
                }
            };
            let name = self.name(field.name);
            self.line(format!("this.{name} = {value};"));
        }

        if let Some(body) = &function.body {
            self.scoped(|this| {
                for param in &function.params {
                    this.bind(param.name, param.ty.as_ref().filter(|_| !param.rest));
                }
                this.statements(&body.statements)
            })?;
        }
        Ok(())
    }

    fn interface(&mut self, interface: &Interface, prefix: &str) -> Result {
        let mut header = format!(
            "{prefix}interface {}{}",
            self.name(interface.name),
            self.type_params(&interface.type_params),
        );
        if !interface.extends.is_empty() {
            header.push_str(" extends ");
            header.push_str(&self.types(&interface.extends));
        }
        self.line(format!("{header} {{"));
        self.indented(|this| {
            for member in &interface.members {
                this.mark(member.span);
                let line = this.interface_member(member)?;
                this.line(line);
            }
            Ok(())
        })?;
        self.line("}");
        Ok(())
    }

    pub(super) fn interface_member(&mut self, member: &InterfaceMember) -> Result<String> {
        let name = self.name(member.name);
        let optional = if member.optional { "?" } else { "" };
        Ok(match &member.kind {
            InterfaceMemberKind::Property(ty) => {
                let readonly = if member.readonly { "readonly " } else { "" };
                format!("{readonly}{name}{optional}: {};", self.ty(ty))
            }
            InterfaceMemberKind::Method {
                type_params,
                params,
                return_ty,
            } => {
                let type_params = self.type_params(type_params);
                let params = self.params(params)?;
                let ret = match return_ty {
                    Some(ty) => self.ty(ty),
                    None => "void".to_owned(),
                };
                format!("{name}{optional}{type_params}({params}): {ret};")
            }
        })
    }

    fn enumeration(&mut self, enumeration: &Enum, prefix: &str) -> Result {
        self.line(format!("{prefix}enum {} {{", self.name(enumeration.name)));
        self.indented(|this| {
            for variant in &enumeration.variants {
                this.mark(variant.span);
                let name = this.name(variant.name);
                match &variant.value {
                    Some(value) => {
                        let value = this.expr(value)?;
                        this.line(format!("{name} = {value},"));
                    }
                    None => this.line(format!("{name},")),
                }
            }
            Ok(())
        })?;
        self.line("}");
        Ok(())
    }

    fn namespace(&mut self, namespace: &Namespace, prefix: &str) -> Result {
        self.line(format!("{prefix}namespace {} {{", self.name(namespace.name)));
        self.indented(|this| {
            let mut prev: Option<&Declaration> = None;
            for inner in &namespace.body {
                if prev.is_some_and(|prev| is_block_like(prev) || is_block_like(inner)) {
                    this.blank();
                }
                // Namespace members are public in C++.
                let prefix = match inner.kind {
                    DeclarationKind::Import(_)
                    | DeclarationKind::Directive { .. }
                    | DeclarationKind::Export { .. } => "",
                    _ => "export ",
                };
                this.declaration(inner, prefix)?;
                prev = Some(inner);
            }
            Ok(())
        })?;
        self.line("}");
        Ok(())
    }

    pub(super) fn type_alias(&mut self, alias: &TypeAlias) -> String {
        format!(
            "type {}{} = {};",
            self.name(alias.name),
            self.type_params(&alias.type_params),
            self.ty(&alias.ty),
        )
    }
}

// Statements.
impl<D> Emitter<'_, D>
where
    D: Dialect,
{
    fn statements(&mut self, statements: &[Statement]) -> Result {
        for statement in statements {
            self.statement(statement)?;
        }
        Ok(())
    }

    /// Emits a loop or branch body one level deeper, without its braces.
    fn body(&mut self, body: &Statement) -> Result {
        self.indented(|this| {
            this.scoped(|this| match &body.kind {
                StatementKind::Block(block) => this.statements(&block.statements),
                _ => this.statement(body),
            })
        })
    }

    fn statement(&mut self, statement: &Statement) -> Result {
        self.ctx.check_cancelled()?;
        self.mark(statement.span);
        match &statement.kind {
            StatementKind::Block(block) => {
                self.line("{");
                self.indented(|this| this.scoped(|this| this.statements(&block.statements)))?;
                self.line("}");
            }
            StatementKind::Expression(expr) => {
                let code = self.expr(expr)?;
                // A leading brace would read as a block.
                if code.starts_with('{') {
                    self.line(format!("({code});"));
                } else {
                    self.line(format!("{code};"));
                }
            }
            StatementKind::Variable(variable) => self.variable(variable, "")?,
            StatementKind::Declaration(declaration) => self.declaration(declaration, "")?,
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.if_chain(condition, then_branch, else_branch.as_deref(), "")?,
            StatementKind::While { condition, body } => {
                let condition = self.expr(condition)?;
                self.line(format!("while ({condition}) {{"));
                self.body(body)?;
                self.line("}");
            }
            StatementKind::DoWhile { body, condition } => {
                self.line("do {");
                self.body(body)?;
                let condition = self.expr(condition)?;
                self.line(format!("}} while ({condition});"));
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let init = match init {
                    Some(init) => self.for_init(init)?,
                    None => String::new(),
                };
                let condition = match condition {
                    Some(condition) => self.expr(condition)?,
                    None => String::new(),
                };
                let update = match update {
                    Some(update) => self.expr(update)?,
                    None => String::new(),
                };
                let head = format!("{init}; {condition}; {update}");
                self.line(format!("for ({}) {{", head.trim_end()));
                self.body(body)?;
                self.line("}");
            }
            StatementKind::ForIn {
                binding,
                iterable,
                body,
            } => {
                if D::LOWER_FOR_OF {
                    self.unsupported(statement.span, "for-in loops");
                    return Ok(());
                }
                let binding = self.for_binding(binding);
                let iterable = self.expr(iterable)?;
                self.line(format!("for ({binding} in {iterable}) {{"));
                self.body(body)?;
                self.line("}");
            }
            StatementKind::ForOf {
                binding,
                iterable,
                body,
            } => {
                if D::LOWER_FOR_OF {
                    self.indexed_loop(binding, iterable, body)?;
                } else {
                    let binding = self.for_binding(binding);
                    let iterable = self.expr(iterable)?;
                    self.line(format!("for ({binding} of {iterable}) {{"));
                    self.body(body)?;
                    self.line("}");
                }
            }
            StatementKind::Return(None) => self.line("return;"),
            StatementKind::Return(Some(value)) => {
                let value = match self.returns.clone() {
                    Some((class, ty)) => self.coerced(value, class, &ty)?,
                    None => self.expr(value)?,
                };
                self.line(format!("return {value};"));
            }
            StatementKind::Break => self.line("break;"),
            StatementKind::Continue => self.line("continue;"),
            StatementKind::Switch {
                discriminant,
                cases,
            } => {
                let discriminant = self.expr(discriminant)?;
                self.line(format!("switch ({discriminant}) {{"));
                self.indented(|this| {
                    for case in cases {
                        this.mark(case.span);
                        match &case.test {
                            Some(test) => {
                                let test = this.expr(test)?;
                                this.line(format!("case {test}:"));
                            }
                            None => this.line("default:"),
                        }
                        this.indented(|this| this.statements(&case.body))?;
                    }
                    Ok(())
                })?;
                self.line("}");
            }
            StatementKind::Try {
                block,
                handler,
                finalizer,
            } => self.try_statement(statement.span, block, handler.as_ref(), finalizer.as_ref())?,
            StatementKind::Throw(value) => {
                let value = self.expr(value)?;
                self.line(format!("throw {value};"));
            }
            StatementKind::Empty => {}
        }
        Ok(())
    }

    fn if_chain(
        &mut self,
        condition: &Expr,
        then_branch: &Statement,
        else_branch: Option<&Statement>,
        lead: &str,
    ) -> Result {
        let condition = self.expr(condition)?;
        self.line(format!("{lead}if ({condition}) {{"));
        self.body(then_branch)?;
        match else_branch.map(|branch| &branch.kind) {
            Some(StatementKind::If {
                condition,
                then_branch,
                else_branch,
            }) => self.if_chain(condition, then_branch, else_branch.as_deref(), "} else ")?,
            Some(_) => {
                self.line("} else {");
                if let Some(branch) = else_branch {
                    self.body(branch)?;
                }
                self.line("}");
            }
            None => self.line("}"),
        }
        Ok(())
    }

    fn for_init(&mut self, init: &Statement) -> Result<String> {
        match &init.kind {
            StatementKind::Variable(variable) => {
                let mut keyword = None;
                let mut bindings = Vec::with_capacity(variable.declarators.len());
                for declarator in &variable.declarators {
                    let (kw, binding) = self.declarator(variable.binding, declarator)?;
                    keyword.get_or_insert(kw);
                    bindings.push(binding);
                }
                Ok(format!("{} {}", keyword.unwrap_or("let"), bindings.join(", ")))
            }
            StatementKind::Expression(expr) => self.expr(expr),
            _ => {
                self.unsupported(init.span, "this loop initializer");
                Ok(String::new())
            }
        }
    }

    fn for_binding(&mut self, binding: &ForBinding) -> String {
        let keyword = match binding.binding {
            BindingKind::Edict | BindingKind::Const => "const",
            BindingKind::Var => "var",
            BindingKind::Let | BindingKind::Typed => "let",
        };
        format!("{keyword} {}", self.name(binding.name))
    }

    /// `for (x of xs)` as an indexed loop, for targets without iterators.
    fn indexed_loop(&mut self, binding: &ForBinding, iterable: &Expr, body: &Statement) -> Result {
        let collection = self.expr(iterable)?;
        let collection = if matches!(
            iterable.kind,
            ExprKind::Identifier(_) | ExprKind::Member { .. } | ExprKind::This
        ) {
            collection
        } else {
            let temp = self.temp("items");
            self.line(format!("const {temp} = {collection};"));
            temp
        };
        let index = self.temp("i");
        let element = self.for_binding(binding);
        let annotation = match self.annotation(binding.ty.as_ref()) {
            Some(ty) => format!(": {ty}"),
            None => String::new(),
        };

        self.line(format!(
            "for (let {index} = 0; {index} < {collection}.length; {index}++) {{"
        ));
        self.indented(|this| {
            this.line(format!("{element}{annotation} = {collection}[{index}];"));
            match &body.kind {
                StatementKind::Block(block) => this.statements(&block.statements),
                _ => this.statement(body),
            }
        })?;
        self.line("}");
        Ok(())
    }

    fn try_statement(
        &mut self,
        span: Span,
        block: &Block,
        handler: Option<&CatchClause>,
        finalizer: Option<&Block>,
    ) -> Result {
        if !D::supports(Feature::Exceptions) {
            // The protected code still runs, only the handlers are lost.
            self.unsupported(span, "exception handlers");
            self.line("{");
            self.indented(|this| this.statements(&block.statements))?;
            self.line("}");
            if let Some(finalizer) = finalizer {
                self.line("{");
                self.indented(|this| this.statements(&finalizer.statements))?;
                self.line("}");
            }
            return Ok(());
        }

        self.line("try {");
        self.indented(|this| this.statements(&block.statements))?;
        if let Some(handler) = handler {
            match &handler.param {
                Some((name, _)) => {
                    let name = self.name(*name);
                    self.line(format!("}} catch ({name}) {{"));
                }
                None => self.line("} catch {"),
            }
            self.indented(|this| this.statements(&handler.body.statements))?;
        }
        if let Some(finalizer) = finalizer {
            self.line("} finally {");
            self.indented(|this| this.statements(&finalizer.statements))?;
        }
        self.line("}");
        Ok(())
    }
}

// Expressions.
impl<D> Emitter<'_, D>
where
    D: Dialect,
{
    pub(super) fn expr(&mut self, expr: &Expr) -> Result<String> {
        Ok(match &expr.kind {
            ExprKind::Identifier(ident) => match self.name(*ident) {
                "NULL" => "null".to_owned(),
                name => name.to_owned(),
            },
            ExprKind::This => "this".to_owned(),
            ExprKind::Super => "super".to_owned(),
            ExprKind::Literal(literal) => self.literal(literal),
            ExprKind::Template(raw) => format!("`{raw}`"),
            ExprKind::Array(elements) => format!("[{}]", self.exprs(elements)?),
            ExprKind::Object(properties) => self.object(properties)?,
            ExprKind::Paren(inner) => format!("({})", self.expr(inner)?),
            ExprKind::Unary { op, operand } => {
                let operand_code = self.expr(operand)?;
                match op {
                    UnaryOperator::Deref => {
                        self.unsupported(expr.span, "pointer dereferences");
                        operand_code
                    }
                    UnaryOperator::AddressOf => match D::address_of(&operand_code) {
                        Some(code) => code,
                        None => {
                            self.unsupported(expr.span, "taking addresses");
                            operand_code
                        }
                    },
                    // Keeps `- -x` from turning into a decrement.
                    UnaryOperator::Neg | UnaryOperator::Plus
                        if operand_code.starts_with(op.as_str()) =>
                    {
                        format!("{} {operand_code}", op.as_str())
                    }
                    _ => format!("{}{operand_code}", op.as_str()),
                }
            }
            ExprKind::Update {
                op,
                prefix,
                operand,
            } => {
                let operand = self.expr(operand)?;
                if *prefix {
                    format!("{}{operand}", op.as_str())
                } else {
                    format!("{operand}{}", op.as_str())
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.expr(lhs)?;
                let rhs = self.expr(rhs)?;
                format!("{lhs} {} {rhs}", D::binary(*op, self.ctx.options.strict))
            }
            ExprKind::Logical { op, lhs, rhs } => {
                let lhs = self.expr(lhs)?;
                let rhs = self.expr(rhs)?;
                format!("{lhs} {} {rhs}", op.as_str())
            }
            ExprKind::Assignment { op, target, value } => {
                let declared = match op {
                    AssignmentOperator::Assign => self.target_type(target),
                    _ => None,
                };
                let target = self.expr(target)?;
                let value = match &declared {
                    Some(ty) => self.converted(value, ty)?,
                    None => self.expr(value)?,
                };
                format!("{target} {} {value}", op.as_str())
            }
            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => format!(
                "{} ? {} : {}",
                self.expr(condition)?,
                self.expr(then_expr)?,
                self.expr(else_expr)?,
            ),
            ExprKind::Call {
                callee,
                type_args,
                args,
            } => self.call(callee, type_args, args)?,
            ExprKind::Member {
                object,
                property,
                access,
            } => {
                let object = self.expr(object)?;
                let separator = match access {
                    MemberAccess::Optional => "?.",
                    MemberAccess::Dot | MemberAccess::Arrow | MemberAccess::Scope => ".",
                };
                format!("{object}{separator}{}", self.name(*property))
            }
            ExprKind::Index { object, index } => {
                format!("{}[{}]", self.expr(object)?, self.expr(index)?)
            }
            ExprKind::New { ty, args } => {
                format!("new {}({})", self.ty(ty), self.exprs(args)?)
            }
            ExprKind::NewArray { element, length } => {
                format!("new Array<{}>({})", self.ty(element), self.expr(length)?)
            }
            ExprKind::Delete { operand, .. } => {
                let member = matches!(
                    operand.kind,
                    ExprKind::Member { .. } | ExprKind::Index { .. }
                );
                let code = self.expr(operand)?;
                match D::delete(&code, member) {
                    Some(code) => code,
                    None => {
                        self.unsupported(expr.span, "deleting non-member values");
                        "undefined".to_owned()
                    }
                }
            }
            ExprKind::Arrow(arrow) => {
                self.closure(expr.span);
                let modifier = self.async_modifier(arrow.is_async, expr.span);
                let params = self.params(&arrow.params)?;
                let ret = self.return_annotation(arrow.return_ty.as_ref());
                let body = match &arrow.body {
                    ArrowBody::Expr(body) => {
                        let code = self.expr(body)?;
                        if matches!(body.kind, ExprKind::Object(_)) {
                            format!("({code})")
                        } else {
                            code
                        }
                    }
                    ArrowBody::Block(block) => {
                        self.block_expr(&arrow.params, block, arrow.return_ty.as_ref())?
                    }
                };
                format!("{modifier}({params}){ret} => {body}")
            }
            ExprKind::Lambda(lambda) => {
                self.closure(expr.span);
                let params = self.params(&lambda.params)?;
                let ret = self.return_annotation(lambda.return_ty.as_ref());
                let body =
                    self.block_expr(&lambda.params, &lambda.body, lambda.return_ty.as_ref())?;
                format!("({params}){ret} => {body}")
            }
            ExprKind::Cast { ty, expr, style } => {
                let class = infer::classify(ty, self.interner());
                let spelling = self.ty(ty);
                let code = self.expr(expr)?;
                D::cast(&code, class, &spelling, *style)
            }
            ExprKind::Sizeof(SizeofOperand::Type(ty)) => {
                let size = infer::size_of(ty, self.interner());
                let spelling = self.ty(ty);
                match D::sizeof(&spelling, size) {
                    Some(code) => code,
                    None => {
                        self.unsupported(expr.span, &format!("`sizeof` of `{spelling}`"));
                        "0".to_owned()
                    }
                }
            }
            ExprKind::Sizeof(SizeofOperand::Expr(_)) => {
                self.unsupported(expr.span, "`sizeof` of expressions");
                "0".to_owned()
            }
            ExprKind::Typeof(inner) => format!("typeof {}", self.expr(inner)?),
            ExprKind::Await(inner) => {
                let code = self.expr(inner)?;
                if D::supports(Feature::Async) {
                    format!("await {code}")
                } else {
                    self.unsupported(expr.span, "`await`");
                    code
                }
            }
            ExprKind::Spread(inner) => format!("...{}", self.expr(inner)?),
            ExprKind::Dummy => {
                self.unsupported(expr.span, "malformed expressions");
                "undefined".to_owned()
            }
        })
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Result<String> {
        let mut out = Vec::with_capacity(exprs.len());
        for expr in exprs {
            out.push(self.expr(expr)?);
        }
        Ok(out.join(", "))
    }

    fn literal(&self, literal: &Literal) -> String {
        match literal {
            Literal::Integer(value) => D::integer(*value, false),
            Literal::Float { value, single } => D::float(*value, *single),
            Literal::String(value) => quote(value),
            // C characters are small integers.
            Literal::Char(ch) => u32::from(*ch).to_string(),
            Literal::Bool(value) => value.to_string(),
            Literal::Null => "null".to_owned(),
        }
    }

    fn object(&mut self, properties: &[Property]) -> Result<String> {
        if properties.is_empty() {
            return Ok("{}".to_owned());
        }
        let mut out = Vec::with_capacity(properties.len());
        for property in properties {
            let key = match &property.key {
                PropertyKey::Ident(ident) => self.name(*ident).to_owned(),
                PropertyKey::String(key) => quote(key),
                PropertyKey::Computed(key) => format!("[{}]", self.expr(key)?),
            };
            if property.shorthand {
                out.push(key);
            } else {
                out.push(format!("{key}: {}", self.expr(&property.value)?));
            }
        }
        Ok(format!("{{ {} }}", out.join(", ")))
    }

    fn call(&mut self, callee: &Expr, type_args: &[TypeNode], args: &[Expr]) -> Result<String> {
        let params = match &callee.kind {
            ExprKind::Identifier(ident) => self.signatures.get(&(ident.name, args.len())).cloned(),
            _ => None,
        };
        let mut rendered = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let ty = params.as_ref().and_then(|params| params.get(i)).and_then(Option::as_ref);
            rendered.push(match ty {
                Some(ty) => self.converted(arg, ty)?,
                None => self.expr(arg)?,
            });
        }
        if let ExprKind::Identifier(ident) = &callee.kind {
            if let Some(code) = D::builtin_call(self.name(*ident), &rendered) {
                return Ok(code);
            }
        }
        let callee = self.expr(callee)?;
        let type_args = if type_args.is_empty() {
            String::new()
        } else {
            format!("<{}>", self.types(type_args))
        };
        Ok(format!("{callee}{type_args}({})", rendered.join(", ")))
    }

    fn closure(&mut self, span: Span) {
        if !D::supports(Feature::Closures) {
            self.unsupported(span, "closures");
        }
    }

    /// A block rendered inline, as the body of an arrow function.
    fn block_expr(
        &mut self,
        params: &[Param],
        block: &Block,
        return_ty: Option<&TypeNode>,
    ) -> Result<String> {
        let returns = return_ty.map(|ty| {
            let class = infer::classify(ty, self.interner());
            (class, self.ty(ty))
        });
        let saved = std::mem::replace(&mut self.returns, returns);
        let level = self.out.level;
        let body = self.capture(|this| {
            this.scoped(|this| {
                for param in params {
                    this.bind(param.name, param.ty.as_ref().filter(|_| !param.rest));
                }
                this.indented(|this| this.statements(&block.statements))
            })
        });
        self.returns = saved;
        let body = body?;
        if body.is_empty() {
            return Ok("{}".to_owned());
        }
        Ok(format!("{{\n{body}{}}}", self.out.unit.repeat(level)))
    }
}

// Types.
impl<D> Emitter<'_, D>
where
    D: Dialect,
{
    pub(super) fn ty(&mut self, ty: &TypeNode) -> String {
        match &ty.kind {
            TypeKind::Primitive(primitive) => match D::types().get(primitive.name()) {
                Some(mapped) => (*mapped).to_owned(),
                None => {
                    let spelling = primitive.name();
                    self.unsupported(ty.span, &format!("the `{spelling}` type"));
                    spelling.to_owned()
                }
            },
            TypeKind::Named { path, args } => self.named_type(path, args),
            TypeKind::Pointer(inner) if infer::is_char(inner) => self.mapped("string"),
            TypeKind::Pointer(_) => D::POINTER.to_owned(),
            TypeKind::Reference(inner) | TypeKind::Const(inner) => self.ty(inner),
            TypeKind::Array { element, .. } => array_of(&self.ty(element)),
            TypeKind::Function { params, ret } => {
                let mut rendered = Vec::with_capacity(params.len());
                for (i, param) in params.iter().enumerate() {
                    rendered.push(format!("a{i}: {}", self.ty(param)));
                }
                format!("({}) => {}", rendered.join(", "), self.ty(ret))
            }
            TypeKind::Union(members) => {
                let rendered: Vec<String> = members.iter().map(|member| self.ty(member)).collect();
                if D::UNIONS {
                    return rendered.join(" | ");
                }
                let nullable = rendered.len() == 2 && rendered.iter().any(|m| m == "null");
                if nullable {
                    let inner = rendered.iter().find(|m| *m != "null").cloned().unwrap_or_default();
                    format!("{inner} | null")
                } else {
                    self.unsupported(ty.span, "union types");
                    rendered.into_iter().next().unwrap_or_default()
                }
            }
        }
    }

    fn named_type(&mut self, path: &[Ident], args: &[TypeNode]) -> String {
        let interner = self.interner();
        let segments: Vec<&str> = path.iter().map(|ident| interner.get(ident)).collect();
        let segments = match segments.as_slice() {
            ["std", rest @ ..] if !rest.is_empty() => rest,
            all => all,
        };
        let rendered: Vec<String> = args.iter().map(|arg| self.ty(arg)).collect();
        match (segments, rendered.as_slice()) {
            (["vector" | "list" | "deque"], [element]) => array_of(element),
            (["map" | "unordered_map"], [key, value]) => format!("Map<{key}, {value}>"),
            (["set" | "unordered_set"], [element]) => format!("Set<{element}>"),
            ([single], []) => self.mapped(single),
            _ if rendered.is_empty() => segments.join("."),
            _ => format!("{}<{}>", segments.join("."), rendered.join(", ")),
        }
    }

    fn mapped(&self, spelling: &str) -> String {
        D::types()
            .get(spelling)
            .map_or_else(|| spelling.to_owned(), |mapped| (*mapped).to_owned())
    }

    pub(super) fn types(&mut self, types: &[TypeNode]) -> String {
        let rendered: Vec<String> = types.iter().map(|ty| self.ty(ty)).collect();
        rendered.join(", ")
    }

    /// `auto` leaves the type to inference.
    pub(super) fn annotation(&mut self, ty: Option<&TypeNode>) -> Option<String> {
        let ty = ty?;
        match ty.underlying().kind {
            TypeKind::Primitive(Primitive::Auto) => None,
            _ => Some(self.ty(ty)),
        }
    }

    pub(super) fn return_annotation(&mut self, ty: Option<&TypeNode>) -> String {
        match self.annotation(ty) {
            Some(ty) => format!(": {ty}"),
            None => String::new(),
        }
    }

    pub(super) fn type_params(&mut self, params: &[TypeParam]) -> String {
        if params.is_empty() {
            return String::new();
        }
        if !D::supports(Feature::Generics) {
            self.unsupported(params[0].name.span, "generics");
            return String::new();
        }
        let mut rendered = Vec::with_capacity(params.len());
        for param in params {
            let mut out = self.name(param.name).to_owned();
            if let Some(constraint) = &param.constraint {
                out.push_str(" extends ");
                out.push_str(&self.ty(constraint));
            }
            if let Some(default) = &param.default {
                out.push_str(" = ");
                out.push_str(&self.ty(default));
            }
            rendered.push(out);
        }
        format!("<{}>", rendered.join(", "))
    }

    fn params(&mut self, params: &[Param]) -> Result<String> {
        let mut rendered = Vec::with_capacity(params.len());
        for param in params {
            let mut out = String::new();
            if param.rest {
                out.push_str("...");
            }
            out.push_str(self.name(param.name));
            if param.optional {
                out.push('?');
            }
            if let Some(ty) = self.annotation(param.ty.as_ref()) {
                out.push_str(": ");
                if param.rest && !ty.ends_with(']') {
                    out.push_str(&array_of(&ty));
                } else {
                    out.push_str(&ty);
                }
            }
            if let Some(default) = &param.default {
                out.push_str(" = ");
                out.push_str(&self.expr(default)?);
            }
            rendered.push(out);
        }
        Ok(rendered.join(", "))
    }
}

// Utility functions.
impl<'a, D> Emitter<'a, D>
where
    D: Dialect,
{
    pub(super) fn interner(&self) -> &'a Interner {
        self.ctx.interner
    }

    pub(super) fn name(&self, name: impl Into<Name>) -> &'a str {
        self.interner().get(name)
    }

    /// Prints a line at the current indentation.
    pub(super) fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_indent();
        if let Some(span) = self.pending.take() {
            if let Some(map) = &mut self.map {
                map.add(self.out.line, self.out.column, span.start);
            }
        }
        self.out.push(text.as_ref());
        self.out.push("\n");
    }

    /// Prints an empty line.
    pub(super) fn blank(&mut self) {
        self.out.push("\n");
    }

    /// Maps the next line to the provided source span.
    fn mark(&mut self, span: Span) {
        self.pending = Some(span);
    }

    pub(super) fn indented(&mut self, f: impl FnOnce(&mut Self) -> Result) -> Result {
        self.out.level += 1;
        let result = f(self);
        self.out.level -= 1;
        result
    }

    /// Runs `f` against a scratch writer and returns what it printed. Source
    /// mappings are not recorded for captured text.
    pub(super) fn capture(&mut self, f: impl FnOnce(&mut Self) -> Result) -> Result<String> {
        let scratch = Writer::new(self.out.unit.clone(), self.out.level);
        let saved_out = std::mem::replace(&mut self.out, scratch);
        let saved_map = self.map.take();
        let saved_pending = self.pending.take();
        let result = f(self);
        let captured = std::mem::replace(&mut self.out, saved_out);
        self.map = saved_map;
        self.pending = saved_pending;
        result.map(|()| captured.buf)
    }

    fn temp(&mut self, hint: &str) -> String {
        let temp = format!("__{hint}{}", self.temps);
        self.temps += 1;
        temp
    }

    pub(super) fn warn(&mut self, span: Span, message: impl Into<String>) {
        self.warnings.push(GenerationWarning {
            message: message.into(),
            span: Some(span),
        });
    }

    fn unsupported(&mut self, span: Span, what: &str) {
        let target = D::TARGET.display_name();
        self.warn(span, format!("{target} does not support {what}"));
    }
}

fn modifiers(member: &ClassMember) -> String {
    let access = match member.access {
        Access::Public => "",
        Access::Private => "private ",
        Access::Protected => "protected ",
    };
    let is_static = if member.is_static { "static " } else { "" };
    format!("{access}{is_static}")
}

fn is_block_like(declaration: &Declaration) -> bool {
    match &declaration.kind {
        DeclarationKind::Function(function) => function.body.is_some(),
        DeclarationKind::Class(_)
        | DeclarationKind::Struct(_)
        | DeclarationKind::Interface(_)
        | DeclarationKind::Enum(_)
        | DeclarationKind::Namespace(_) => true,
        DeclarationKind::Export { declaration, .. } => is_block_like(declaration),
        DeclarationKind::Variable(_)
        | DeclarationKind::TypeAlias(_)
        | DeclarationKind::Import(_)
        | DeclarationKind::Directive { .. } => false,
    }
}

fn is_super_call(statement: &Statement) -> bool {
    matches!(
        &statement.kind,
        StatementKind::Expression(Expr { kind: ExprKind::Call { callee, .. }, .. })
            if matches!(callee.kind, ExprKind::Super)
    )
}

fn array_of(element: &str) -> String {
    if element.contains([' ', '|', '(']) {
        format!("({element})[]")
    } else {
        format!("{element}[]")
    }
}

/// Fields of `class` that receive raw allocations, in first-seen order.
fn tracked_allocations(class: &Class, interner: &Interner) -> Vec<Name> {
    let fields: Vec<Name> = class
        .members
        .iter()
        .filter_map(|member| match &member.kind {
            MemberKind::Field { declarator, .. } => Some(declarator.name.name),
            _ => None,
        })
        .collect();

    let mut tracked = Vec::new();
    let mut track = |name: Name| {
        if fields.contains(&name) && !tracked.contains(&name) {
            tracked.push(name);
        }
    };

    for member in &class.members {
        let body = match &member.kind {
            MemberKind::Field { declarator, .. } => {
                if declarator
                    .initializer
                    .as_ref()
                    .is_some_and(|value| infer::is_allocation(value, interner))
                {
                    track(declarator.name.name);
                }
                None
            }
            MemberKind::Constructor {
                function,
                initializers,
            } => {
                for (field, args) in initializers {
                    if matches!(args.as_slice(), [value] if infer::is_allocation(value, interner)) {
                        track(field.name);
                    }
                }
                function.body.as_ref()
            }
            MemberKind::Method(function) | MemberKind::Destructor(function) => {
                function.body.as_ref()
            }
        };
        if let Some(body) = body {
            visit_assignments(&body.statements, &mut |target: &Expr, value: &Expr| {
                if !infer::is_allocation(value, interner) {
                    return;
                }
                match &target.unparenthesized().kind {
                    ExprKind::Member {
                        object, property, ..
                    } if matches!(object.kind, ExprKind::This) => track(property.name),
                    ExprKind::Identifier(ident) => track(ident.name),
                    _ => {}
                }
            });
        }
    }
    tracked
}

/// Calls `f` with the target and value of every plain assignment statement.
fn visit_assignments(statements: &[Statement], f: &mut dyn FnMut(&Expr, &Expr)) {
    for statement in statements {
        match &statement.kind {
            StatementKind::Expression(Expr {
                kind:
                    ExprKind::Assignment {
                        op: AssignmentOperator::Assign,
                        target,
                        value,
                    },
                ..
            }) => f(target, value),
            StatementKind::Block(block) => visit_assignments(&block.statements, f),
            StatementKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                visit_assignments(std::slice::from_ref(then_branch), f);
                if let Some(else_branch) = else_branch {
                    visit_assignments(std::slice::from_ref(else_branch), f);
                }
            }
            StatementKind::While { body, .. }
            | StatementKind::DoWhile { body, .. }
            | StatementKind::For { body, .. }
            | StatementKind::ForIn { body, .. }
            | StatementKind::ForOf { body, .. } => visit_assignments(std::slice::from_ref(body), f),
            StatementKind::Switch { cases, .. } => {
                for case in cases {
                    visit_assignments(&case.body, f);
                }
            }
            StatementKind::Try {
                block,
                handler,
                finalizer,
            } => {
                visit_assignments(&block.statements, f);
                if let Some(handler) = handler {
                    visit_assignments(&handler.body.statements, f);
                }
                if let Some(finalizer) = finalizer {
                    visit_assignments(&finalizer.statements, f);
                }
            }
            _ => {}
        }
    }
}

/// Double-quoted string literal, valid in every target.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            ch if ch.is_control() => out.push_str(&format!("\\u{{{:x}}}", u32::from(ch))),
            ch => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Prints a float so that it always reads as one.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    let mut out = format!("{value:?}");
    match out.find(['e', 'E']) {
        Some(exponent) if !out[..exponent].contains('.') => out.insert_str(exponent, ".0"),
        Some(_) => {}
        None if !out.contains('.') => out.push_str(".0"),
        None => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn floats_keep_a_decimal_point() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(1e21), "1.0e21");
        assert_eq!(format_float(2.5e-8), "2.5e-8");
        assert_eq!(format_float(f64::INFINITY), "Infinity");
    }

    #[test]
    fn quoting() {
        assert_eq!(quote("hi"), "\"hi\"");
        assert_eq!(quote("a\"b\\c\n"), r#""a\"b\\c\n""#);
        assert_eq!(quote("\u{1}"), r#""\u{1}""#);
    }

    #[test]
    fn arrays_of_compound_types() {
        assert_eq!(array_of("number"), "number[]");
        assert_eq!(array_of("string | null"), "(string | null)[]");
    }
}
