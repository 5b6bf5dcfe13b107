use crate::{
    ast::*,
    cancel::CancellationToken,
    lexer::extract,
    token::{Position, Span, Spanned, Token, TokenKind, KEYWORDS},
    util::intern::Interner,
};

type Result<T, E = ()> = std::result::Result<T, E>;

pub type ParseResult<T> = Result<T, (T, Vec<Spanned<Error>>)>;

/// Parses a whole program from an already lexed token stream.
///
/// Trivia tokens are skipped, so both compact and lossless token streams are
/// accepted. On syntax errors the parser recovers at the next statement
/// boundary and keeps going; the best-effort program is returned alongside
/// every error found.
pub fn parse(src: &str, tokens: &[Token], ident_interner: &mut Interner) -> ParseResult<Program> {
    run(
        src,
        tokens,
        ident_interner,
        None,
        Parser::parse_program,
        Program::default,
    )
}

/// Like [`parse`], but stops between top-level declarations once `cancel`
/// is set.
pub fn parse_cancellable(
    src: &str,
    tokens: &[Token],
    ident_interner: &mut Interner,
    cancel: &CancellationToken,
) -> ParseResult<Program> {
    run(
        src,
        tokens,
        ident_interner,
        Some(cancel),
        Parser::parse_program,
        Program::default,
    )
}

pub fn parse_expr(src: &str, tokens: &[Token], ident_interner: &mut Interner) -> ParseResult<Expr> {
    let default = || Expr::dummy(Span::empty_at(Position::START));
    run(
        src,
        tokens,
        ident_interner,
        None,
        Parser::parse_standalone_expr,
        default,
    )
}

fn run<'src, 'tok, 'ident, 'c, T>(
    src: &'src str,
    tokens: &'tok [Token],
    ident_interner: &'ident mut Interner,
    cancel: Option<&'c CancellationToken>,
    f: impl for<'a> FnOnce(&'a mut Parser<'src, 'tok, 'ident, 'c>) -> Result<T>,
    default: impl FnOnce() -> T,
) -> ParseResult<T> {
    let mut p = Parser::new(src, tokens, ident_interner, cancel);
    let parse_result = f(&mut p);

    let success = parse_result.is_ok();
    let el = parse_result.unwrap_or_else(|()| default());
    if p.errors.is_empty() {
        debug_assert!(success);
        Ok(el)
    } else {
        Err((el, p.errors))
    }
}

const PREFIX_BP: u8 = 25;

struct Parser<'src, 'tok, 'ident, 'c> {
    src: &'src str,
    tokens: &'tok [Token],
    ident_interner: &'ident mut Interner,
    cancel: Option<&'c CancellationToken>,
    cursor: usize,
    /// Number of `>` still owed by a `>>` or `>>>` token at the cursor which
    /// was split while closing a type argument list.
    pending_greater: u8,
    /// Span of the last consumed token.
    last: Span,
    eof: Token,
    errors: Vec<Spanned<Error>>,
}

#[derive(Copy, Clone)]
struct Checkpoint {
    cursor: usize,
    pending_greater: u8,
    last: Span,
    errors: usize,
}

// Declarations
impl Parser<'_, '_, '_, '_> {
    fn parse_program(&mut self) -> Result<Program> {
        let start = self.peek().span;
        let mut declarations = Vec::with_capacity(16);
        while self.except([]) {
            if self.is_cancelled() {
                let c = self.peek();
                self.error(c.span.wrap(Error::Cancelled));
                return Ok(Program {
                    declarations,
                    span: start.to(self.last),
                });
            }
            if let Ok(declaration) = self.synchronize(starts_declaration, Parser::parse_declaration)
            {
                declarations.push(declaration);
            }
        }
        let eof = self.consume(TokenKind::Eof)?;
        Ok(Program {
            declarations,
            span: start.to(eof.span),
        })
    }

    fn parse_declaration(&mut self) -> Result<Declaration> {
        let start = self.peek();
        let kind = match start.kind {
            TokenKind::Directive(directive) => {
                self.advance();
                let argument = extract::directive_argument(start, self.src).into();
                DeclarationKind::Directive {
                    directive,
                    argument,
                }
            }
            TokenKind::Export => {
                self.advance();
                let is_default = self.take(TokenKind::Default);
                let declaration = self.parse_declaration()?;
                DeclarationKind::Export {
                    declaration: Box::new(declaration),
                    is_default,
                }
            }
            TokenKind::Declare | TokenKind::Static => {
                // Ambient and storage qualifiers carry no meaning for the
                // generated code.
                self.advance();
                return self.parse_declaration();
            }
            TokenKind::Import => DeclarationKind::Import(self.parse_import()?),
            TokenKind::Template => return self.parse_template(),
            TokenKind::Async | TokenKind::Function => {
                DeclarationKind::Function(self.parse_function(Vec::new())?)
            }
            TokenKind::Class => DeclarationKind::Class(self.parse_class(Vec::new())?),
            TokenKind::Struct => DeclarationKind::Struct(self.parse_class(Vec::new())?),
            TokenKind::Interface => DeclarationKind::Interface(self.parse_interface()?),
            TokenKind::Enum => DeclarationKind::Enum(self.parse_enum()?),
            TokenKind::Namespace => DeclarationKind::Namespace(self.parse_namespace()?),
            TokenKind::Type | TokenKind::Typedef => {
                DeclarationKind::TypeAlias(self.parse_type_alias(Vec::new())?)
            }
            TokenKind::Edict | TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                let variable = self.parse_variable()?;
                self.consume_semicolon()?;
                DeclarationKind::Variable(variable)
            }
            _ if self.is_function_declaration() => {
                DeclarationKind::Function(self.parse_c_function(Vec::new())?)
            }
            _ if self.is_variable_declaration() => {
                let variable = self.parse_variable()?;
                self.consume_semicolon()?;
                DeclarationKind::Variable(variable)
            }
            actual => {
                self.error(start.span.wrap(Error::ExpectedDeclaration { actual }));
                return Err(());
            }
        };
        Ok(Declaration {
            kind,
            span: start.span.to(self.last),
        })
    }

    fn parse_template(&mut self) -> Result<Declaration> {
        let start = self.consume(TokenKind::Template)?;
        let type_params = self.parse_type_params()?;
        let t = self.peek();
        let kind = match t.kind {
            TokenKind::Class => DeclarationKind::Class(self.parse_class(type_params)?),
            TokenKind::Struct => DeclarationKind::Struct(self.parse_class(type_params)?),
            TokenKind::Type | TokenKind::Typedef => {
                DeclarationKind::TypeAlias(self.parse_type_alias(type_params)?)
            }
            TokenKind::Async | TokenKind::Function => {
                DeclarationKind::Function(self.parse_function(type_params)?)
            }
            _ if self.is_function_declaration() => {
                DeclarationKind::Function(self.parse_c_function(type_params)?)
            }
            _ => {
                self.error(t.span.wrap(Error::InvalidTemplateTarget));
                return Err(());
            }
        };
        Ok(Declaration {
            kind,
            span: start.span.to(self.last),
        })
    }

    /// `[async] function name<T>(params): R { ... }`
    fn parse_function(&mut self, mut type_params: Vec<TypeParam>) -> Result<Function> {
        let is_async = self.take(TokenKind::Async);
        self.consume(TokenKind::Function)?;
        let name = self.parse_ident()?;
        if self.is(TokenKind::Less) {
            type_params.extend(self.parse_type_params()?);
        }
        let params = self.parse_params()?;
        let return_ty = self.parse_annotation()?;
        let body = self.parse_function_body()?;
        Ok(Function {
            name,
            type_params,
            params,
            return_ty,
            body,
            is_async,
        })
    }

    /// `R name(params) { ... }` or the prototype `R name(params);`
    fn parse_c_function(&mut self, type_params: Vec<TypeParam>) -> Result<Function> {
        let return_ty = self.parse_type()?;
        let name = self.parse_ident()?;
        let params = self.parse_params()?;
        self.take(TokenKind::Const);
        let body = self.parse_function_body()?;
        Ok(Function {
            name,
            type_params,
            params,
            return_ty: Some(return_ty),
            body,
            is_async: false,
        })
    }

    fn parse_function_body(&mut self) -> Result<Option<Block>> {
        if self.take(TokenKind::Semicolon) {
            Ok(None)
        } else {
            self.parse_block().map(Some)
        }
    }

    /// Parses a parenthesized parameter list, including both parentheses.
    fn parse_params(&mut self) -> Result<Vec<Param>> {
        self.consume(TokenKind::LParen)?;
        self.parse_params_tail()
    }

    /// Parses parameters after an already consumed `(`, up to and including
    /// the closing `)`.
    fn parse_params_tail(&mut self) -> Result<Vec<Param>> {
        // C's `f(void)`
        if self.is(TokenKind::Void) && self.peek_nth(1).kind == TokenKind::RParen {
            self.advance();
        }
        let mut params = Vec::new();
        while self.except([TokenKind::RParen]) {
            let param = self.parse_param(params.len())?;
            params.push(param);
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_param(&mut self, index: usize) -> Result<Param> {
        let start = self.peek().span;
        let rest = self.take(TokenKind::Ellipsis);

        // C variadic `...`
        if rest && self.is(TokenKind::RParen) {
            let name = self.synthesize_ident("args", start);
            return Ok(Param {
                name,
                ty: None,
                default: None,
                optional: false,
                rest,
                span: start,
            });
        }

        let (name, ty, optional) = if self.is_ts_binding_start(&[
            TokenKind::Colon,
            TokenKind::Question,
            TokenKind::Comma,
            TokenKind::RParen,
            TokenKind::Assign,
        ]) {
            let name = self.parse_ident_like()?;
            let optional = self.take(TokenKind::Question);
            let ty = self.parse_annotation()?;
            (name, ty, optional)
        } else {
            let base = self.parse_type()?;
            let name = if self.is(TokenKind::Identifier) {
                self.parse_ident()?
            } else {
                // Unnamed prototype parameter, `int add(int, int);`
                self.synthesize_ident(&format!("arg{index}"), base.span)
            };
            let ty = self.parse_array_suffix(base)?;
            (name, Some(ty), false)
        };
        let default = self.parse_initializer()?;
        Ok(Param {
            name,
            ty,
            default,
            optional,
            rest,
            span: start.to(self.last),
        })
    }

    /// `<T, U extends X = Y>` or C++'s `<typename T, class U>`.
    fn parse_type_params(&mut self) -> Result<Vec<TypeParam>> {
        self.consume(TokenKind::Less)?;
        let mut params = Vec::new();
        while !self.at_closing_angle() && self.except([]) {
            self.take_any(&[TokenKind::Typename, TokenKind::Class]);
            let name = self.parse_ident()?;
            let constraint = if self.take(TokenKind::Extends) {
                Some(self.parse_type()?)
            } else {
                None
            };
            let default = if self.take(TokenKind::Assign) {
                Some(self.parse_type()?)
            } else {
                None
            };
            params.push(TypeParam {
                name,
                constraint,
                default,
            });
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        self.consume_closing_angle()?;
        Ok(params)
    }

    /// Parses a variable declaration without its terminating semicolon.
    ///
    /// Binding keywords may be followed by either a TypeScript style
    /// declarator list (`let x: int = 1, y = 2`) or a C style one
    /// (`const char *s = "", *t`).
    fn parse_variable(&mut self) -> Result<Variable> {
        let binding = match self.peek().kind {
            TokenKind::Edict => BindingKind::Edict,
            TokenKind::Const => BindingKind::Const,
            TokenKind::Let => BindingKind::Let,
            TokenKind::Var => BindingKind::Var,
            _ => BindingKind::Typed,
        };
        if binding != BindingKind::Typed {
            self.advance();
        }

        let mut declarators = Vec::with_capacity(1);
        if binding != BindingKind::Typed
            && self.is_ts_binding_start(&[
                TokenKind::Colon,
                TokenKind::Assign,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::In,
                TokenKind::Of,
                TokenKind::Eof,
            ])
        {
            loop {
                let start = self.peek().span;
                let name = self.parse_ident_like()?;
                let ty = self.parse_annotation()?;
                let initializer = self.parse_initializer()?;
                declarators.push(Declarator {
                    name,
                    ty,
                    initializer,
                    span: start.to(self.last),
                });
                if !self.take(TokenKind::Comma) {
                    break;
                }
            }
        } else {
            let base = self.parse_type_primary()?;
            loop {
                declarators.push(self.parse_c_declarator(&base)?);
                if !self.take(TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(Variable {
            binding,
            declarators,
        })
    }

    /// `*name[N] = init`, where the pointer and array parts apply to this
    /// declarator only.
    fn parse_c_declarator(&mut self, base: &TypeNode) -> Result<Declarator> {
        let start = self.peek().span;
        let mut ty = base.clone();
        loop {
            let t = self.peek();
            let wrap: fn(Box<TypeNode>) -> TypeKind = match t.kind {
                TokenKind::Star => TypeKind::Pointer,
                TokenKind::Amp | TokenKind::AmpAmp => TypeKind::Reference,
                TokenKind::Const => TypeKind::Const,
                _ => break,
            };
            self.advance();
            let span = ty.span.to(t.span);
            ty = TypeNode {
                kind: wrap(Box::new(ty)),
                span,
            };
        }
        let name = self.parse_ident()?;
        let ty = self.parse_array_suffix(ty)?;

        let initializer = if self.take(TokenKind::Assign) {
            if self.is(TokenKind::LBrace) && matches!(ty.kind, TypeKind::Array { .. }) {
                Some(self.parse_brace_list()?)
            } else {
                Some(self.parse_expr()?)
            }
        } else {
            None
        };
        Ok(Declarator {
            name,
            ty: Some(ty),
            initializer,
            span: start.to(self.last),
        })
    }

    /// `[N]` suffixes after a declarator name, `int grid[4][4]`.
    fn parse_array_suffix(&mut self, mut ty: TypeNode) -> Result<TypeNode> {
        while self.take(TokenKind::LBracket) {
            let size = if self.is(TokenKind::IntegerLiteral) {
                let t = self.advance();
                let Ok(size) = extract::int(t, self.src) else {
                    self.error(t.span.wrap(Error::IntegerOverflow));
                    return Err(());
                };
                Some(size)
            } else {
                None
            };
            let end = self.consume(TokenKind::RBracket)?;
            let span = ty.span.to(end.span);
            ty = TypeNode {
                kind: TypeKind::Array {
                    element: Box::new(ty),
                    size,
                },
                span,
            };
        }
        Ok(ty)
    }

    /// C aggregate initializer, `{1, 2, 3}`, represented as an array literal.
    fn parse_brace_list(&mut self) -> Result<Expr> {
        let start = self.consume(TokenKind::LBrace)?;
        let mut elements = Vec::new();
        while self.except([TokenKind::RBrace]) {
            let element = if self.is(TokenKind::LBrace) {
                self.parse_brace_list()?
            } else {
                self.parse_expr()?
            };
            elements.push(element);
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        let end = self.consume(TokenKind::RBrace)?;
        Ok(Expr {
            kind: ExprKind::Array(elements),
            span: start.span.to(end.span),
        })
    }

    fn parse_class(&mut self, mut type_params: Vec<TypeParam>) -> Result<Class> {
        self.consume_any(&[TokenKind::Class, TokenKind::Struct])?;
        let name = self.parse_ident()?;
        if self.is(TokenKind::Less) {
            type_params.extend(self.parse_type_params()?);
        }

        let mut extends = None;
        let mut implements = Vec::new();
        // C++ base clause, `class Dog : public Animal`
        if self.take(TokenKind::Colon) {
            loop {
                self.take_any(&[
                    TokenKind::Public,
                    TokenKind::Private,
                    TokenKind::Protected,
                    TokenKind::Virtual,
                ]);
                let base = self.parse_type()?;
                if extends.is_none() {
                    extends = Some(base);
                } else {
                    implements.push(base);
                }
                if !self.take(TokenKind::Comma) {
                    break;
                }
            }
        }
        if self.take(TokenKind::Extends) {
            extends = Some(self.parse_type()?);
        }
        if self.take(TokenKind::Implements) {
            loop {
                implements.push(self.parse_type()?);
                if !self.take(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::LBrace)?;
        let mut members = Vec::new();
        let mut access = Access::Public;
        while self.except([TokenKind::RBrace]) {
            let _ = self.synchronize(starts_member, |p| {
                p.parse_class_member(name, &mut access, &mut members)
            });
        }
        self.consume(TokenKind::RBrace)?;
        self.take(TokenKind::Semicolon);

        Ok(Class {
            name,
            type_params,
            extends,
            implements,
            members,
        })
    }

    fn parse_class_member(
        &mut self,
        class_name: Ident,
        default_access: &mut Access,
        members: &mut Vec<ClassMember>,
    ) -> Result<()> {
        let start = self.peek();

        // C++ access label, `public:`
        if let Some(access) = access_of(start.kind) {
            if self.peek_nth(1).kind == TokenKind::Colon {
                self.advance();
                self.advance();
                *default_access = access;
                return Ok(());
            }
        }

        let mut access = *default_access;
        let mut is_static = false;
        let mut readonly = false;
        let mut is_async = false;
        loop {
            let t = self.peek().kind;
            // A modifier directly followed by `(` or `:` is a member name.
            if matches!(
                self.peek_nth(1).kind,
                TokenKind::LParen | TokenKind::Colon | TokenKind::Question
            ) {
                break;
            }
            match t {
                TokenKind::Public | TokenKind::Private | TokenKind::Protected => {
                    access = access_of(t).unwrap_or(access);
                }
                TokenKind::Static => is_static = true,
                TokenKind::Readonly => readonly = true,
                TokenKind::Async => is_async = true,
                TokenKind::Virtual | TokenKind::Override | TokenKind::Declare => {}
                _ => break,
            }
            self.advance();
        }

        let member = |p: &Self, kind| ClassMember {
            kind,
            access,
            is_static,
            span: start.span.to(p.last),
        };

        // Destructor, `~Point()`
        if self.take(TokenKind::Tilde) {
            let name = self.parse_ident()?;
            let params = self.parse_params()?;
            let body = self.parse_function_body()?;
            self.take(TokenKind::Semicolon);
            let function = Function {
                name,
                type_params: Vec::new(),
                params,
                return_ty: None,
                body,
                is_async: false,
            };
            members.push(member(self, MemberKind::Destructor(function)));
            return Ok(());
        }

        let t = self.peek();
        let next = self.peek_nth(1).kind;

        // Constructor, TypeScript's `constructor(...)` or C++'s `Point(...)`
        if t.kind == TokenKind::Identifier
            && next == TokenKind::LParen
            && (t.text(self.src) == "constructor"
                || t.text(self.src) == self.ident_interner.get(class_name))
        {
            let name = self.parse_ident()?;
            let params = self.parse_params()?;
            let mut initializers = Vec::new();
            if self.take(TokenKind::Colon) {
                loop {
                    let field = self.parse_ident()?;
                    self.consume(TokenKind::LParen)?;
                    let args = self.parse_args()?;
                    initializers.push((field, args));
                    if !self.take(TokenKind::Comma) {
                        break;
                    }
                }
            }
            let body = self.parse_function_body()?;
            self.take(TokenKind::Semicolon);
            let function = Function {
                name,
                type_params: Vec::new(),
                params,
                return_ty: None,
                body,
                is_async: false,
            };
            members.push(member(
                self,
                MemberKind::Constructor {
                    function,
                    initializers,
                },
            ));
            return Ok(());
        }

        // TypeScript style, `name(...)`, `name: T = init;`
        if is_ident_like(t.kind)
            && matches!(
                next,
                TokenKind::LParen
                    | TokenKind::Less
                    | TokenKind::Colon
                    | TokenKind::Question
                    | TokenKind::Assign
                    | TokenKind::Semicolon
            )
        {
            let name = self.parse_ident_like()?;
            if self.is(TokenKind::LParen) || self.is(TokenKind::Less) {
                let type_params = if self.is(TokenKind::Less) {
                    self.parse_type_params()?
                } else {
                    Vec::new()
                };
                let params = self.parse_params()?;
                let return_ty = self.parse_annotation()?;
                let body = self.parse_function_body()?;
                let function = Function {
                    name,
                    type_params,
                    params,
                    return_ty,
                    body,
                    is_async,
                };
                members.push(member(self, MemberKind::Method(function)));
            } else {
                self.take(TokenKind::Question);
                let ty = self.parse_annotation()?;
                let initializer = self.parse_initializer()?;
                self.consume_semicolon()?;
                let declarator = Declarator {
                    name,
                    ty,
                    initializer,
                    span: name.span.to(self.last),
                };
                members.push(member(
                    self,
                    MemberKind::Field {
                        declarator,
                        readonly,
                    },
                ));
            }
            return Ok(());
        }

        // C++ style method, `virtual int area() const = 0;`
        if self.is_function_declaration() {
            let return_ty = self.parse_type()?;
            let name = self.parse_ident()?;
            let params = self.parse_params()?;
            self.take(TokenKind::Const);
            self.take(TokenKind::Override);
            let body = if self.take(TokenKind::Assign) {
                self.consume(TokenKind::IntegerLiteral)?;
                self.consume(TokenKind::Semicolon)?;
                None
            } else {
                self.parse_function_body()?
            };
            self.take(TokenKind::Semicolon);
            let function = Function {
                name,
                type_params: Vec::new(),
                params,
                return_ty: Some(return_ty),
                body,
                is_async,
            };
            members.push(member(self, MemberKind::Method(function)));
            return Ok(());
        }

        // C style fields, `int x, y;`
        let base = self.parse_type_primary()?;
        loop {
            let declarator = self.parse_c_declarator(&base)?;
            members.push(ClassMember {
                span: declarator.span,
                kind: MemberKind::Field {
                    declarator,
                    readonly,
                },
                access,
                is_static,
            });
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_interface(&mut self) -> Result<Interface> {
        self.consume(TokenKind::Interface)?;
        let name = self.parse_ident()?;
        let type_params = if self.is(TokenKind::Less) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let mut extends = Vec::new();
        if self.take(TokenKind::Extends) {
            loop {
                extends.push(self.parse_type()?);
                if !self.take(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while self.except([TokenKind::RBrace]) {
            if let Ok(member) = self.synchronize(starts_member, Parser::parse_interface_member) {
                members.push(member);
            }
        }
        self.consume(TokenKind::RBrace)?;

        Ok(Interface {
            name,
            type_params,
            extends,
            members,
        })
    }

    fn parse_interface_member(&mut self) -> Result<InterfaceMember> {
        let start = self.peek().span;
        let readonly = self.peek_nth(1).kind != TokenKind::Colon && self.take(TokenKind::Readonly);
        let name = self.parse_ident_like()?;
        let optional = self.take(TokenKind::Question);
        let kind = if self.is(TokenKind::LParen) || self.is(TokenKind::Less) {
            let type_params = if self.is(TokenKind::Less) {
                self.parse_type_params()?
            } else {
                Vec::new()
            };
            let params = self.parse_params()?;
            let return_ty = self.parse_annotation()?;
            InterfaceMemberKind::Method {
                type_params,
                params,
                return_ty,
            }
        } else {
            self.consume(TokenKind::Colon)?;
            InterfaceMemberKind::Property(self.parse_type()?)
        };
        let span = start.to(self.last);
        if !self.take_any(&[TokenKind::Semicolon, TokenKind::Comma]) && !self.is(TokenKind::RBrace)
        {
            let c = self.peek();
            self.error(c.span.wrap(Error::UnexpectedAny {
                actual: c.kind,
                expected: Box::from([TokenKind::Semicolon, TokenKind::RBrace]),
            }));
            return Err(());
        }
        Ok(InterfaceMember {
            name,
            kind,
            optional,
            readonly,
            span,
        })
    }

    /// `enum [class] Name [: T] { A, B = 2 }`
    fn parse_enum(&mut self) -> Result<Enum> {
        self.consume(TokenKind::Enum)?;
        self.take_any(&[TokenKind::Class, TokenKind::Struct]);
        let name = self.parse_ident()?;
        if self.take(TokenKind::Colon) {
            self.parse_type()?;
        }
        self.consume(TokenKind::LBrace)?;
        let mut variants = Vec::new();
        while self.except([TokenKind::RBrace]) {
            let start = self.peek().span;
            let name = self.parse_ident_like()?;
            let value = self.parse_initializer()?;
            variants.push(EnumVariant {
                name,
                value,
                span: start.to(self.last),
            });
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RBrace)?;
        self.take(TokenKind::Semicolon);
        Ok(Enum { name, variants })
    }

    fn parse_namespace(&mut self) -> Result<Namespace> {
        self.consume(TokenKind::Namespace)?;
        let name = self.parse_ident()?;
        self.consume(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while self.except([TokenKind::RBrace]) {
            if let Ok(declaration) = self.synchronize(starts_declaration, Parser::parse_declaration)
            {
                body.push(declaration);
            }
        }
        self.consume(TokenKind::RBrace)?;
        Ok(Namespace { name, body })
    }

    /// `type Name<T> = T;` or `typedef T Name;`
    fn parse_type_alias(&mut self, mut type_params: Vec<TypeParam>) -> Result<TypeAlias> {
        if self.take(TokenKind::Typedef) {
            let ty = self.parse_type()?;
            let name = self.parse_ident()?;
            let ty = self.parse_array_suffix(ty)?;
            self.consume_semicolon()?;
            return Ok(TypeAlias {
                name,
                type_params,
                ty,
            });
        }
        self.consume(TokenKind::Type)?;
        let name = self.parse_ident()?;
        if self.is(TokenKind::Less) {
            type_params.extend(self.parse_type_params()?);
        }
        self.consume(TokenKind::Assign)?;
        let ty = self.parse_type()?;
        self.consume_semicolon()?;
        Ok(TypeAlias {
            name,
            type_params,
            ty,
        })
    }

    fn parse_import(&mut self) -> Result<Import> {
        self.consume(TokenKind::Import)?;
        let mut import = Import {
            default: None,
            namespace: None,
            specifiers: Vec::new(),
            source: Box::from(""),
        };

        if !self.is(TokenKind::StringLiteral) {
            if self.is(TokenKind::Identifier) {
                import.default = Some(self.parse_ident()?);
                self.take(TokenKind::Comma);
            }
            if self.take(TokenKind::Star) {
                self.consume(TokenKind::As)?;
                import.namespace = Some(self.parse_ident()?);
            }
            if self.take(TokenKind::LBrace) {
                while self.except([TokenKind::RBrace]) {
                    let name = self.parse_ident_like()?;
                    let alias = if self.take(TokenKind::As) {
                        Some(self.parse_ident_like()?)
                    } else {
                        None
                    };
                    import.specifiers.push(ImportSpecifier { name, alias });
                    if !self.take(TokenKind::Comma) {
                        break;
                    }
                }
                self.consume(TokenKind::RBrace)?;
            }
            self.consume(TokenKind::From)?;
        }

        let source = self.consume(TokenKind::StringLiteral)?;
        import.source = extract::string(source, self.src);
        self.consume_semicolon()?;
        Ok(import)
    }
}

// Statements
impl Parser<'_, '_, '_, '_> {
    fn parse_block(&mut self) -> Result<Block> {
        let start = self.consume(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while self.except([TokenKind::RBrace]) {
            if let Ok(statement) = self.synchronize(starts_statement, Parser::parse_statement) {
                statements.push(statement);
            }
        }
        let end = self.consume(TokenKind::RBrace)?;
        Ok(Block {
            statements,
            span: start.span.to(end.span),
        })
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let start = self.peek();
        let kind = match start.kind {
            TokenKind::LBrace => StatementKind::Block(self.parse_block()?),
            TokenKind::Semicolon => {
                self.advance();
                StatementKind::Empty
            }
            TokenKind::If => {
                self.advance();
                let condition = self.parse_condition()?;
                let then_branch = Box::new(self.parse_statement()?);
                let else_branch = if self.take(TokenKind::Else) {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                StatementKind::If {
                    condition,
                    then_branch,
                    else_branch,
                }
            }
            TokenKind::While => {
                self.advance();
                let condition = self.parse_condition()?;
                let body = Box::new(self.parse_statement()?);
                StatementKind::While { condition, body }
            }
            TokenKind::Do => {
                self.advance();
                let body = Box::new(self.parse_statement()?);
                self.consume(TokenKind::While)?;
                let condition = self.parse_condition()?;
                self.consume_semicolon()?;
                StatementKind::DoWhile { body, condition }
            }
            TokenKind::For => self.parse_for()?,
            TokenKind::Return => {
                self.advance();
                let value = if self.is(TokenKind::Semicolon) || self.is(TokenKind::RBrace) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.consume_semicolon()?;
                StatementKind::Return(value)
            }
            TokenKind::Break => {
                self.advance();
                self.consume_semicolon()?;
                StatementKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                self.consume_semicolon()?;
                StatementKind::Continue
            }
            TokenKind::Switch => self.parse_switch()?,
            TokenKind::Try => self.parse_try()?,
            TokenKind::Throw => {
                self.advance();
                let value = self.parse_expr()?;
                self.consume_semicolon()?;
                StatementKind::Throw(value)
            }
            TokenKind::Static => {
                self.advance();
                return self.parse_statement();
            }
            TokenKind::Edict | TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                let variable = self.parse_variable()?;
                self.consume_semicolon()?;
                StatementKind::Variable(variable)
            }
            TokenKind::Function
            | TokenKind::Class
            | TokenKind::Struct
            | TokenKind::Interface
            | TokenKind::Enum
            | TokenKind::Namespace
            | TokenKind::Typedef
            | TokenKind::Template
            | TokenKind::Import
            | TokenKind::Export
            | TokenKind::Directive(_) => {
                StatementKind::Declaration(Box::new(self.parse_declaration()?))
            }
            TokenKind::Type | TokenKind::Async
                if matches!(
                    self.peek_nth(1).kind,
                    TokenKind::Identifier | TokenKind::Function
                ) =>
            {
                StatementKind::Declaration(Box::new(self.parse_declaration()?))
            }
            _ if self.is_function_declaration() => {
                let function = self.parse_c_function(Vec::new())?;
                StatementKind::Declaration(Box::new(Declaration {
                    kind: DeclarationKind::Function(function),
                    span: start.span.to(self.last),
                }))
            }
            _ if self.is_variable_declaration() => {
                let variable = self.parse_variable()?;
                self.consume_semicolon()?;
                StatementKind::Variable(variable)
            }
            _ => {
                let expr = self.parse_expr()?;
                self.consume_semicolon()?;
                StatementKind::Expression(expr)
            }
        };
        Ok(Statement {
            kind,
            span: start.span.to(self.last),
        })
    }

    /// `( expr )`
    fn parse_condition(&mut self) -> Result<Expr> {
        self.consume(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.consume(TokenKind::RParen)?;
        Ok(condition)
    }

    fn parse_for(&mut self) -> Result<StatementKind> {
        self.consume(TokenKind::For)?;
        self.consume(TokenKind::LParen)?;

        if let Some((binding, is_of)) = self.attempt(Parser::parse_for_binding) {
            let iterable = self.parse_expr()?;
            self.consume(TokenKind::RParen)?;
            let body = Box::new(self.parse_statement()?);
            return Ok(if is_of {
                StatementKind::ForOf {
                    binding,
                    iterable,
                    body,
                }
            } else {
                StatementKind::ForIn {
                    binding,
                    iterable,
                    body,
                }
            });
        }

        let init = if self.is(TokenKind::Semicolon) {
            None
        } else {
            let start = self.peek().span;
            let kind = if matches!(
                self.peek().kind,
                TokenKind::Edict | TokenKind::Const | TokenKind::Let | TokenKind::Var
            ) || self.is_variable_declaration()
            {
                StatementKind::Variable(self.parse_variable()?)
            } else {
                StatementKind::Expression(self.parse_expr()?)
            };
            Some(Box::new(Statement {
                kind,
                span: start.to(self.last),
            }))
        };
        self.consume(TokenKind::Semicolon)?;
        let condition = if self.is(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.consume(TokenKind::Semicolon)?;
        let update = if self.is(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.consume(TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(StatementKind::For {
            init,
            condition,
            update,
            body,
        })
    }

    /// The head of a for-in, for-of or C++ range-for loop, up to and
    /// including `in`, `of` or `:`. Returns whether it iterates values.
    fn parse_for_binding(&mut self) -> Result<(ForBinding, bool)> {
        let binding = match self.peek().kind {
            TokenKind::Edict => BindingKind::Edict,
            TokenKind::Const => BindingKind::Const,
            TokenKind::Let => BindingKind::Let,
            TokenKind::Var => BindingKind::Var,
            _ => BindingKind::Typed,
        };
        if binding != BindingKind::Typed {
            self.advance();
        }
        let (name, ty) =
            if self.is_ts_binding_start(&[TokenKind::In, TokenKind::Of, TokenKind::Colon]) {
                (self.parse_ident_like()?, None)
            } else {
                let ty = self.parse_type()?;
                (self.parse_ident()?, Some(ty))
            };
        let is_of = match self.peek().kind {
            TokenKind::In => false,
            TokenKind::Of | TokenKind::Colon => true,
            _ => return Err(()),
        };
        self.advance();
        Ok((ForBinding { binding, name, ty }, is_of))
    }

    fn parse_switch(&mut self) -> Result<StatementKind> {
        self.consume(TokenKind::Switch)?;
        let discriminant = self.parse_condition()?;
        self.consume(TokenKind::LBrace)?;
        let mut cases = Vec::new();
        while self.except([TokenKind::RBrace]) {
            let start = self.peek().span;
            let test = if self.take(TokenKind::Case) {
                Some(self.parse_expr()?)
            } else {
                self.consume(TokenKind::Default)?;
                None
            };
            self.consume(TokenKind::Colon)?;
            let mut body = Vec::new();
            while self.except([TokenKind::Case, TokenKind::Default, TokenKind::RBrace]) {
                if let Ok(statement) = self.synchronize(starts_statement, Parser::parse_statement)
                {
                    body.push(statement);
                }
            }
            cases.push(SwitchCase {
                test,
                body,
                span: start.to(self.last),
            });
        }
        self.consume(TokenKind::RBrace)?;
        Ok(StatementKind::Switch {
            discriminant,
            cases,
        })
    }

    fn parse_try(&mut self) -> Result<StatementKind> {
        let start = self.consume(TokenKind::Try)?;
        let block = self.parse_block()?;
        let handler = if self.take(TokenKind::Catch) {
            let param = if self.take(TokenKind::LParen) {
                let param = if self.take(TokenKind::Ellipsis) {
                    None
                } else if self.is_ts_binding_start(&[TokenKind::RParen, TokenKind::Colon]) {
                    let name = self.parse_ident_like()?;
                    Some((name, self.parse_annotation()?))
                } else {
                    let ty = self.parse_type()?;
                    Some((self.parse_ident()?, Some(ty)))
                };
                self.consume(TokenKind::RParen)?;
                param
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finalizer = if self.take(TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            let c = self.peek();
            self.error(start.span.to(c.span).wrap(Error::Unexpected {
                actual: c.kind,
                expected: TokenKind::Catch,
            }));
            return Err(());
        }
        Ok(StatementKind::Try {
            block,
            handler,
            finalizer,
        })
    }
}

// Expressions
impl Parser<'_, '_, '_, '_> {
    fn parse_standalone_expr(&mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        self.consume(TokenKind::Eof)?;
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let lhs_token = self.advance();
        let mut lhs = self.parse_nud(lhs_token)?;

        loop {
            let op_token = self.peek();

            // Explicit type arguments, `make<int>(1)`
            if op_token.kind == TokenKind::Less
                && matches!(lhs.kind, ExprKind::Identifier(_) | ExprKind::Member { .. })
            {
                let checkpoint = self.checkpoint();
                if let Ok(type_args) = self.parse_type_args() {
                    if self.take(TokenKind::LParen) {
                        let args = self.parse_args()?;
                        let span = lhs.span.to(self.last);
                        lhs = Expr {
                            kind: ExprKind::Call {
                                callee: Box::new(lhs),
                                type_args,
                                args,
                            },
                            span,
                        };
                        continue;
                    }
                }
                self.restore(checkpoint);
            }

            let Some((lbp, rbp)) = Self::infix_binding_power(op_token.kind) else {
                // Not an infix operator
                break;
            };
            if lbp < min_bp {
                // Operator binds less tightly than the minimum required
                break;
            }
            self.advance(); // Operator
            lhs = self.parse_led(op_token, lhs, rbp)?;
        }

        Ok(lhs)
    }

    /// nud: Parses tokens that start an expression
    /// (prefix operators, literals, grouping)
    fn parse_nud(&mut self, token: Token) -> Result<Expr> {
        let kind = match token.kind {
            TokenKind::Identifier
            | TokenKind::From
            | TokenKind::Of
            | TokenKind::Type
            | TokenKind::Declare
            | TokenKind::Readonly => {
                let ident = self.ident_from(token);
                if self.is(TokenKind::FatArrow) {
                    return self.parse_single_param_arrow(token.span, ident, false);
                }
                ExprKind::Identifier(ident)
            }
            TokenKind::IntegerLiteral => {
                let Ok(value) = extract::int(token, self.src) else {
                    self.error(token.span.wrap(Error::IntegerOverflow));
                    return Err(());
                };
                ExprKind::Literal(Literal::Integer(value))
            }
            TokenKind::FloatLiteral => {
                let Ok((value, single)) = extract::float(token, self.src) else {
                    self.error(token.span.wrap(Error::MalformedFloat));
                    return Err(());
                };
                ExprKind::Literal(Literal::Float { value, single })
            }
            TokenKind::StringLiteral => {
                ExprKind::Literal(Literal::String(extract::string(token, self.src)))
            }
            TokenKind::CharLiteral => ExprKind::Literal(Literal::Char(extract::char(token, self.src))),
            TokenKind::TemplateLiteral => ExprKind::Template(extract::template(token, self.src)),
            TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
            TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
            TokenKind::Null => ExprKind::Literal(Literal::Null),
            TokenKind::This => ExprKind::This,
            TokenKind::Super => ExprKind::Super,

            TokenKind::LParen => {
                if self.is_arrow_function() {
                    return self.parse_arrow(token.span, false);
                }
                // C style cast, `(int) x`
                if self.peek().kind.is_primitive_type() || self.is(TokenKind::Const) {
                    let ty = self.parse_type()?;
                    self.consume(TokenKind::RParen)?;
                    let expr = self.parse_expr_bp(PREFIX_BP)?;
                    ExprKind::Cast {
                        ty,
                        expr: Box::new(expr),
                        style: CastStyle::Prefix,
                    }
                } else {
                    let expr = self.parse_expr()?;
                    self.consume(TokenKind::RParen)?;
                    ExprKind::Paren(Box::new(expr))
                }
            }

            TokenKind::LBracket => {
                if self.is_lambda() {
                    return self.parse_lambda(token.span);
                }
                let mut elements = Vec::new();
                while self.except([TokenKind::RBracket]) {
                    elements.push(self.parse_expr()?);
                    if !self.take(TokenKind::Comma) {
                        break;
                    }
                }
                self.consume(TokenKind::RBracket)?;
                ExprKind::Array(elements)
            }

            TokenKind::LBrace => ExprKind::Object(self.parse_object_tail()?),

            kind @ (TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Star
            | TokenKind::Amp) => {
                let op = match kind {
                    TokenKind::Minus => UnaryOperator::Neg,
                    TokenKind::Plus => UnaryOperator::Plus,
                    TokenKind::Bang => UnaryOperator::Not,
                    TokenKind::Tilde => UnaryOperator::BitNot,
                    TokenKind::Star => UnaryOperator::Deref,
                    _ => UnaryOperator::AddressOf,
                };
                let operand = self.parse_expr_bp(PREFIX_BP)?;
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                }
            }

            kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                let operand = self.parse_expr_bp(PREFIX_BP)?;
                ExprKind::Update {
                    op: update_operator(kind),
                    prefix: true,
                    operand: Box::new(operand),
                }
            }

            TokenKind::New => {
                let ty = self.parse_type_primary()?;
                if self.take(TokenKind::LBracket) {
                    let length = self.parse_expr()?;
                    self.consume(TokenKind::RBracket)?;
                    ExprKind::NewArray {
                        element: ty,
                        length: Box::new(length),
                    }
                } else {
                    let args = if self.take(TokenKind::LParen) {
                        self.parse_args()?
                    } else {
                        Vec::new()
                    };
                    ExprKind::New { ty, args }
                }
            }

            TokenKind::Delete => {
                let array = self.is(TokenKind::LBracket)
                    && self.peek_nth(1).kind == TokenKind::RBracket;
                if array {
                    self.advance();
                    self.advance();
                }
                let operand = self.parse_expr_bp(PREFIX_BP)?;
                ExprKind::Delete {
                    operand: Box::new(operand),
                    array,
                }
            }

            TokenKind::Sizeof => {
                let is_type = self.is(TokenKind::LParen) && {
                    let next = self.peek_nth(1).kind;
                    next.is_primitive_type() || next == TokenKind::Const
                };
                if is_type {
                    self.advance();
                    let ty = self.parse_type()?;
                    self.consume(TokenKind::RParen)?;
                    ExprKind::Sizeof(SizeofOperand::Type(ty))
                } else {
                    let operand = self.parse_expr_bp(PREFIX_BP)?;
                    ExprKind::Sizeof(SizeofOperand::Expr(Box::new(operand)))
                }
            }

            TokenKind::Typeof => ExprKind::Typeof(Box::new(self.parse_expr_bp(PREFIX_BP)?)),
            TokenKind::Await => ExprKind::Await(Box::new(self.parse_expr_bp(PREFIX_BP)?)),
            TokenKind::Ellipsis => ExprKind::Spread(Box::new(self.parse_expr_bp(2)?)),

            TokenKind::Async => {
                if self.is(TokenKind::Identifier) && self.peek_nth(1).kind == TokenKind::FatArrow {
                    let param = self.advance();
                    let ident = self.ident_from(param);
                    return self.parse_single_param_arrow(token.span, ident, true);
                }
                if self.take(TokenKind::LParen) {
                    return self.parse_arrow(token.span, true);
                }
                ExprKind::Identifier(self.ident_from(token))
            }

            other => {
                let error = Error::UnexpectedTokenInExpr { token: other };
                self.error(token.span.wrap(error));
                return Err(());
            }
        };

        Ok(Expr {
            kind,
            span: token.span.to(self.last),
        })
    }

    /// led: Parses tokens that follow a left-hand-side expression
    /// (infix/postfix operators)
    fn parse_led(&mut self, op_token: Token, lhs: Expr, rbp: u8) -> Result<Expr> {
        let start = lhs.span;
        let kind = match op_token.kind {
            kind if kind.is_assignment() => {
                if !is_assignment_target(&lhs) {
                    self.error(lhs.span.wrap(Error::InvalidAssignmentTarget));
                    return Err(());
                }
                let value = self.parse_expr_bp(rbp)?;
                ExprKind::Assignment {
                    op: assignment_operator(kind),
                    target: Box::new(lhs),
                    value: Box::new(value),
                }
            }

            // Conditional: expr ? expr : expr
            TokenKind::Question => {
                let then_expr = self.parse_expr()?;
                self.consume(TokenKind::Colon)?;
                let else_expr = self.parse_expr_bp(rbp)?;
                ExprKind::Conditional {
                    condition: Box::new(lhs),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                }
            }

            kind @ (TokenKind::AmpAmp | TokenKind::PipePipe | TokenKind::QuestionQuestion) => {
                let op = match kind {
                    TokenKind::AmpAmp => LogicalOperator::And,
                    TokenKind::PipePipe => LogicalOperator::Or,
                    _ => LogicalOperator::Nullish,
                };
                let rhs = self.parse_expr_bp(rbp)?;
                ExprKind::Logical {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }

            TokenKind::As => {
                let ty = self.parse_type()?;
                ExprKind::Cast {
                    ty,
                    expr: Box::new(lhs),
                    style: CastStyle::As,
                }
            }

            kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => ExprKind::Update {
                op: update_operator(kind),
                prefix: false,
                operand: Box::new(lhs),
            },

            // Call: expr ( [expr [, expr]*] )
            TokenKind::LParen => {
                let args = self.parse_args()?;
                ExprKind::Call {
                    callee: Box::new(lhs),
                    type_args: Vec::new(),
                    args,
                }
            }

            TokenKind::LBracket => {
                let index = self.parse_expr()?;
                self.consume(TokenKind::RBracket)?;
                ExprKind::Index {
                    object: Box::new(lhs),
                    index: Box::new(index),
                }
            }

            kind @ (TokenKind::Dot
            | TokenKind::QuestionDot
            | TokenKind::Arrow
            | TokenKind::ColonColon) => {
                let access = match kind {
                    TokenKind::Dot => MemberAccess::Dot,
                    TokenKind::QuestionDot => MemberAccess::Optional,
                    TokenKind::Arrow => MemberAccess::Arrow,
                    _ => MemberAccess::Scope,
                };
                let property = self.parse_property_name()?;
                ExprKind::Member {
                    object: Box::new(lhs),
                    property,
                    access,
                }
            }

            kind => {
                if let Some(op) = binary_operator(kind) {
                    let rhs = self.parse_expr_bp(rbp)?;
                    ExprKind::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    }
                } else {
                    let error = Error::UnexpectedOperator { actual: kind };
                    self.error(op_token.span.wrap(error));
                    return Err(());
                }
            }
        };

        Ok(Expr {
            kind,
            span: start.to(self.last),
        })
    }

    /// Parses call arguments after an already consumed `(`, including the
    /// closing `)`.
    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        while self.except([TokenKind::RParen]) {
            args.push(self.parse_expr()?);
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok(args)
    }

    /// Object literal properties after an already consumed `{`.
    fn parse_object_tail(&mut self) -> Result<Vec<Property>> {
        let mut properties = Vec::new();
        while self.except([TokenKind::RBrace]) {
            let t = self.peek();
            let key = match t.kind {
                TokenKind::StringLiteral => {
                    self.advance();
                    PropertyKey::String(extract::string(t, self.src))
                }
                TokenKind::IntegerLiteral => {
                    self.advance();
                    PropertyKey::String(t.text(self.src).into())
                }
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.parse_expr()?;
                    self.consume(TokenKind::RBracket)?;
                    PropertyKey::Computed(Box::new(key))
                }
                _ => PropertyKey::Ident(self.parse_property_name()?),
            };
            let property = if self.take(TokenKind::Colon) {
                Property {
                    key,
                    value: self.parse_expr()?,
                    shorthand: false,
                }
            } else if let PropertyKey::Ident(ident) = key {
                Property {
                    key,
                    value: Expr {
                        kind: ExprKind::Identifier(ident),
                        span: ident.span,
                    },
                    shorthand: true,
                }
            } else {
                let c = self.peek();
                self.error(c.span.wrap(Error::Unexpected {
                    actual: c.kind,
                    expected: TokenKind::Colon,
                }));
                return Err(());
            };
            properties.push(property);
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RBrace)?;
        Ok(properties)
    }

    /// Arrow function after an already consumed `(`.
    fn parse_arrow(&mut self, start: Span, is_async: bool) -> Result<Expr> {
        let params = self.parse_params_tail()?;
        let return_ty = self.parse_annotation()?;
        self.consume(TokenKind::FatArrow)?;
        let body = self.parse_arrow_body()?;
        Ok(Expr {
            kind: ExprKind::Arrow(Box::new(ArrowFunction {
                params,
                return_ty,
                body,
                is_async,
            })),
            span: start.to(self.last),
        })
    }

    /// `x => body`, with `x` already consumed.
    fn parse_single_param_arrow(&mut self, start: Span, param: Ident, is_async: bool) -> Result<Expr> {
        self.consume(TokenKind::FatArrow)?;
        let body = self.parse_arrow_body()?;
        let param = Param {
            name: param,
            ty: None,
            default: None,
            optional: false,
            rest: false,
            span: param.span,
        };
        Ok(Expr {
            kind: ExprKind::Arrow(Box::new(ArrowFunction {
                params: vec![param],
                return_ty: None,
                body,
                is_async,
            })),
            span: start.to(self.last),
        })
    }

    fn parse_arrow_body(&mut self) -> Result<ArrowBody> {
        if self.is(TokenKind::LBrace) {
            Ok(ArrowBody::Block(self.parse_block()?))
        } else {
            Ok(ArrowBody::Expr(Box::new(self.parse_expr()?)))
        }
    }

    /// C++ lambda after an already consumed `[`.
    fn parse_lambda(&mut self, start: Span) -> Result<Expr> {
        let mut captures = Vec::new();
        while self.except([TokenKind::RBracket]) {
            let t = self.advance();
            let capture = match t.kind {
                TokenKind::Assign => Capture::AllByValue,
                TokenKind::Amp if self.is(TokenKind::Identifier) => {
                    Capture::ByReference(self.parse_ident()?)
                }
                TokenKind::Amp => Capture::AllByReference,
                TokenKind::This => Capture::This,
                TokenKind::Identifier => Capture::ByValue(self.ident_from(t)),
                actual => {
                    self.error(t.span.wrap(Error::Unexpected {
                        actual,
                        expected: TokenKind::Identifier,
                    }));
                    return Err(());
                }
            };
            captures.push(capture);
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RBracket)?;
        let params = if self.is(TokenKind::LParen) {
            self.parse_params()?
        } else {
            Vec::new()
        };
        let return_ty = if self.take(TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(Expr {
            kind: ExprKind::Lambda(Box::new(Lambda {
                captures,
                params,
                return_ty,
                body,
            })),
            span: start.to(self.last),
        })
    }

    fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
        let bp = match kind {
            // Assignment (right-associative)
            kind if kind.is_assignment() => (2, 1),

            // Conditional (right-associative)
            TokenKind::Question => (4, 3),

            TokenKind::PipePipe | TokenKind::QuestionQuestion => (5, 6),
            TokenKind::AmpAmp => (7, 8),
            TokenKind::Pipe => (9, 10),
            TokenKind::Caret => (11, 12),
            TokenKind::Amp => (13, 14),

            TokenKind::EqEq | TokenKind::NotEq | TokenKind::EqEqEq | TokenKind::NotEqEq => {
                (15, 16)
            }

            TokenKind::Less
            | TokenKind::LessEq
            | TokenKind::Greater
            | TokenKind::GreaterEq
            | TokenKind::Instanceof
            | TokenKind::In
            | TokenKind::As => (17, 18),

            TokenKind::Shl | TokenKind::Shr | TokenKind::UShr => (19, 20),
            TokenKind::Plus | TokenKind::Minus => (21, 22),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => (23, 24),

            // Unary prefix operators bind with PREFIX_BP (25).

            // Postfix update
            TokenKind::PlusPlus | TokenKind::MinusMinus => (27, 28),

            // Call, index and member access
            TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Dot
            | TokenKind::QuestionDot
            | TokenKind::Arrow
            | TokenKind::ColonColon => (29, 30),

            _ => return None,
        };
        Some(bp)
    }
}

// Types
impl Parser<'_, '_, '_, '_> {
    fn parse_annotation(&mut self) -> Result<Option<TypeNode>> {
        if self.take(TokenKind::Colon) {
            self.parse_type().map(Some)
        } else {
            Ok(None)
        }
    }

    fn parse_type(&mut self) -> Result<TypeNode> {
        let first = self.parse_type_postfix()?;
        if !self.is(TokenKind::Pipe) {
            return Ok(first);
        }
        let start = first.span;
        let mut members = vec![first];
        while self.take(TokenKind::Pipe) {
            members.push(self.parse_type_postfix()?);
        }
        Ok(TypeNode {
            kind: TypeKind::Union(members),
            span: start.to(self.last),
        })
    }

    fn parse_type_postfix(&mut self) -> Result<TypeNode> {
        let mut ty = self.parse_type_primary()?;
        loop {
            let t = self.peek();
            let kind = match t.kind {
                TokenKind::Star => TypeKind::Pointer(Box::new(ty)),
                TokenKind::Amp | TokenKind::AmpAmp => TypeKind::Reference(Box::new(ty)),
                TokenKind::Const => TypeKind::Const(Box::new(ty)),
                TokenKind::LBracket if self.peek_nth(1).kind == TokenKind::RBracket => {
                    self.advance();
                    TypeKind::Array {
                        element: Box::new(ty),
                        size: None,
                    }
                }
                _ => break,
            };
            let start = match &kind {
                TypeKind::Pointer(inner)
                | TypeKind::Reference(inner)
                | TypeKind::Const(inner)
                | TypeKind::Array { element: inner, .. } => inner.span,
                _ => t.span,
            };
            let end = self.advance();
            ty = TypeNode {
                kind,
                span: start.to(end.span),
            };
        }
        Ok(ty)
    }

    /// A type without pointer, reference or array suffixes.
    fn parse_type_primary(&mut self) -> Result<TypeNode> {
        let start = self.peek();
        let kind = match start.kind {
            TokenKind::Const => {
                self.advance();
                TypeKind::Const(Box::new(self.parse_type_primary()?))
            }
            kind if kind.is_primitive_type() => TypeKind::Primitive(self.parse_primitive()?),
            TokenKind::Identifier | TokenKind::Null => {
                let mut path = vec![self.parse_ident_like_or_null()?];
                while (self.is(TokenKind::ColonColon) || self.is(TokenKind::Dot))
                    && self.peek_nth(1).kind == TokenKind::Identifier
                {
                    self.advance();
                    path.push(self.parse_ident()?);
                }
                let args = if self.is(TokenKind::Less) {
                    self.parse_type_args()?
                } else {
                    Vec::new()
                };
                TypeKind::Named { path, args }
            }
            TokenKind::LParen => {
                self.advance();
                if let Some(function) = self.attempt(Parser::parse_function_type_tail) {
                    function
                } else {
                    let ty = self.parse_type()?;
                    self.consume(TokenKind::RParen)?;
                    return Ok(TypeNode {
                        kind: ty.kind,
                        span: start.span.to(self.last),
                    });
                }
            }
            actual => {
                self.error(start.span.wrap(Error::ExpectedType { actual }));
                return Err(());
            }
        };
        Ok(TypeNode {
            kind,
            span: start.span.to(self.last),
        })
    }

    /// `(a: T, b: U) => R` after an already consumed `(`.
    fn parse_function_type_tail(&mut self) -> Result<TypeKind> {
        let params = self.parse_params_tail()?;
        self.consume(TokenKind::FatArrow)?;
        let ret = self.parse_type()?;
        let unknown = |p: &Param| TypeNode {
            kind: TypeKind::Primitive(Primitive::Any),
            span: p.span,
        };
        Ok(TypeKind::Function {
            params: params
                .iter()
                .map(|p| p.ty.clone().unwrap_or_else(|| unknown(p)))
                .collect(),
            ret: Box::new(ret),
        })
    }

    /// Folds C's multi-keyword primitive spellings (`unsigned long long`,
    /// `short int`, `long double`) into a single [`Primitive`].
    fn parse_primitive(&mut self) -> Result<Primitive> {
        let t = self.advance();
        let primitive = match t.kind {
            TokenKind::Int => Primitive::Int,
            TokenKind::Float => Primitive::Float,
            TokenKind::Double => Primitive::Double,
            TokenKind::Char => Primitive::Char,
            TokenKind::Bool => Primitive::Bool,
            TokenKind::Void => Primitive::Void,
            TokenKind::String => Primitive::String,
            TokenKind::Auto => Primitive::Auto,
            TokenKind::Any => Primitive::Any,
            TokenKind::Short => {
                self.take(TokenKind::Int);
                Primitive::Short
            }
            TokenKind::Long => self.parse_long(Primitive::Long, Primitive::LongLong),
            TokenKind::Unsigned => {
                if self.take(TokenKind::Char) {
                    Primitive::UChar
                } else if self.take(TokenKind::Short) {
                    self.take(TokenKind::Int);
                    Primitive::UShort
                } else if self.take(TokenKind::Long) {
                    self.parse_long(Primitive::ULong, Primitive::ULongLong)
                } else {
                    self.take(TokenKind::Int);
                    Primitive::UInt
                }
            }
            TokenKind::Signed => {
                if self.take(TokenKind::Char) {
                    Primitive::Char
                } else if self.take(TokenKind::Short) {
                    self.take(TokenKind::Int);
                    Primitive::Short
                } else if self.take(TokenKind::Long) {
                    self.parse_long(Primitive::Long, Primitive::LongLong)
                } else {
                    self.take(TokenKind::Int);
                    Primitive::Int
                }
            }
            actual => {
                self.error(t.span.wrap(Error::ExpectedType { actual }));
                return Err(());
            }
        };
        Ok(primitive)
    }

    /// The rest of a `long` spelling, with the first `long` consumed.
    fn parse_long(&mut self, long: Primitive, long_long: Primitive) -> Primitive {
        if self.take(TokenKind::Long) {
            self.take(TokenKind::Int);
            long_long
        } else if long == Primitive::Long && self.take(TokenKind::Double) {
            Primitive::Double
        } else {
            self.take(TokenKind::Int);
            long
        }
    }

    /// `<T, U>`, splitting `>>` and `>>>` when they close nested lists.
    fn parse_type_args(&mut self) -> Result<Vec<TypeNode>> {
        self.consume(TokenKind::Less)?;
        let mut args = Vec::new();
        while !self.at_closing_angle() && self.except([]) {
            args.push(self.parse_type()?);
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        self.consume_closing_angle()?;
        Ok(args)
    }

    fn at_closing_angle(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Greater | TokenKind::Shr | TokenKind::UShr
        )
    }

    fn consume_closing_angle(&mut self) -> Result<Token> {
        let c = self.peek();
        match c.kind {
            TokenKind::Greater => Ok(self.advance()),
            TokenKind::Shr | TokenKind::UShr => {
                // Consume the first `>` only; the rest stays at the cursor.
                self.pending_greater = if c.kind == TokenKind::Shr { 1 } else { 2 };
                let start = c.span.start;
                let end = Position::new(start.line, start.column + 1, start.offset + 1);
                self.last = Span::new(start, end);
                Ok(Token::new(TokenKind::Greater, self.last))
            }
            actual => {
                self.error(c.span.wrap(Error::Unexpected {
                    actual,
                    expected: TokenKind::Greater,
                }));
                Err(())
            }
        }
    }
}

// Lookahead
impl Parser<'_, '_, '_, '_> {
    /// `Type name (` at the cursor.
    fn is_function_declaration(&mut self) -> bool {
        self.speculate(|p| {
            p.parse_type().is_ok() && p.take(TokenKind::Identifier) && p.is(TokenKind::LParen)
        })
    }

    /// `Type name` followed by `=`, `;`, `,` or `[` at the cursor.
    fn is_variable_declaration(&mut self) -> bool {
        self.speculate(|p| {
            p.parse_type().is_ok()
                && p.take(TokenKind::Identifier)
                && matches!(
                    p.peek().kind,
                    TokenKind::Assign
                        | TokenKind::Semicolon
                        | TokenKind::Comma
                        | TokenKind::LBracket
                )
        })
    }

    /// Whether the parenthesized group starting right after an already
    /// consumed `(` is an arrow function parameter list.
    fn is_arrow_function(&mut self) -> bool {
        self.speculate(|p| {
            let mut depth = 1_usize;
            while depth > 0 {
                match p.advance().kind {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => depth -= 1,
                    TokenKind::Eof => return false,
                    _ => {}
                }
            }
            if p.take(TokenKind::Colon) && p.parse_type().is_err() {
                return false;
            }
            p.is(TokenKind::FatArrow)
        })
    }

    /// Whether the bracketed group starting right after an already consumed
    /// `[` is a lambda capture list, `[&](...) {}`.
    fn is_lambda(&mut self) -> bool {
        self.speculate(|p| {
            let mut depth = 1_usize;
            while depth > 0 {
                match p.advance().kind {
                    TokenKind::LBracket => depth += 1,
                    TokenKind::RBracket => depth -= 1,
                    TokenKind::Eof => return false,
                    _ => {}
                }
            }
            p.is(TokenKind::LParen) || p.is(TokenKind::LBrace)
        })
    }

    /// A name followed by one of `follow`, as in TypeScript bindings.
    fn is_ts_binding_start(&self, follow: &[TokenKind]) -> bool {
        is_ident_like(self.peek().kind) && follow.contains(&self.peek_nth(1).kind)
    }
}

impl Parser<'_, '_, '_, '_> {
    pub fn new<'src, 'tok, 'ident, 'c>(
        src: &'src str,
        tokens: &'tok [Token],
        ident_interner: &'ident mut Interner,
        cancel: Option<&'c CancellationToken>,
    ) -> Parser<'src, 'tok, 'ident, 'c> {
        let eof = tokens
            .last()
            .filter(|t| t.is_eof())
            .copied()
            .unwrap_or_else(|| {
                let end = tokens.last().map_or(Position::START, |t| t.span.end);
                Token::new(TokenKind::Eof, Span::empty_at(end))
            });
        let mut p = Parser {
            src,
            tokens,
            ident_interner,
            cancel,
            cursor: 0,
            pending_greater: 0,
            last: Span::empty_at(Position::START),
            eof,
            errors: Vec::with_capacity(8),
        };
        p.setup();
        p
    }

    /// Adds an error.
    fn error(&mut self, error: Spanned<Error>) {
        self.errors.push(error);
    }

    /// Setups the parser, skipping any trivia if necessary.
    fn setup(&mut self) {
        while self.token_at(self.cursor).kind.is_trivia() {
            self.cursor += 1;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancellationToken::is_cancelled)
    }

    fn token_at(&self, index: usize) -> Token {
        self.tokens.get(index).copied().unwrap_or(self.eof)
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> Token {
        let token = self.token_at(self.cursor);
        if self.pending_greater == 0 {
            return token;
        }
        let end = token.span.end;
        let width = u32::from(self.pending_greater);
        let start = Position::new(end.line, end.column - width, end.offset - width as usize);
        Token::new(TokenKind::Greater, Span::new(start, end))
    }

    /// Returns the `n`th non-trivia token after the current one.
    fn peek_nth(&self, n: usize) -> Token {
        if n == 0 {
            return self.peek();
        }
        let mut index = self.cursor;
        let mut remaining = n;
        while remaining > 0 {
            index += 1;
            if index >= self.tokens.len() {
                return self.eof;
            }
            if !self.tokens[index].kind.is_trivia() {
                remaining -= 1;
            }
        }
        self.tokens[index]
    }

    /// Returns the current token and advances. Skips any trivia.
    fn advance(&mut self) -> Token {
        let c = self.peek(); // Before any advancement
        self.last = c.span;
        if self.pending_greater > 0 {
            self.pending_greater -= 1;
            if self.pending_greater > 0 {
                return c;
            }
        }
        if c.kind != TokenKind::Eof {
            while {
                self.cursor += 1;
                self.token_at(self.cursor).kind.is_trivia()
            } {}
        }
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Like [`Parser::take`], but for any of the provided tokens.
    fn take_any(&mut self, expect: &[TokenKind]) -> bool {
        expect.iter().any(|t| self.take(*t))
    }

    /// Advances if the current token matches the provided one, returning it.
    /// If not, records an error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        let c = self.peek();
        if self.is(expect) {
            self.advance();
            Ok(c)
        } else {
            self.error(c.span.wrap(Error::Unexpected {
                actual: c.kind,
                expected: expect,
            }));
            Err(())
        }
    }

    /// Advances if the current token matches any of the provided tokens,
    /// returning it. If not, records an error.
    fn consume_any(&mut self, expect: &'static [TokenKind]) -> Result<Token> {
        for t in expect {
            if self.is(*t) {
                return Ok(self.advance());
            }
        }
        let c = self.peek();
        self.error(c.span.wrap(Error::UnexpectedAny {
            actual: c.kind,
            expected: Box::from(expect),
        }));
        Err(())
    }

    /// Statement terminator. May be omitted before a closing brace.
    fn consume_semicolon(&mut self) -> Result<()> {
        if self.take(TokenKind::Semicolon) || self.is(TokenKind::RBrace) || self.is(TokenKind::Eof)
        {
            Ok(())
        } else {
            self.consume(TokenKind::Semicolon).map(|_| ())
        }
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek();
        if c.kind == TokenKind::Eof {
            return false;
        }
        except.into_iter().all(|e| c.kind != e)
    }

    fn parse_initializer(&mut self) -> Result<Option<Expr>> {
        if !self.take(TokenKind::Assign) {
            return Ok(None);
        }
        let expr = self.parse_expr()?;
        Ok(Some(expr))
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(self.ident_from(token))
    }

    /// An identifier, or a contextual keyword used as a name.
    fn parse_ident_like(&mut self) -> Result<Ident> {
        if is_ident_like(self.peek().kind) {
            let token = self.advance();
            Ok(self.ident_from(token))
        } else {
            self.parse_ident()
        }
    }

    fn parse_ident_like_or_null(&mut self) -> Result<Ident> {
        if self.is(TokenKind::Null) {
            let token = self.advance();
            return Ok(self.synthesize_ident("null", token.span));
        }
        self.parse_ident_like()
    }

    /// Any identifier or keyword, as allowed after `.` and in object keys.
    fn parse_property_name(&mut self) -> Result<Ident> {
        let t = self.peek();
        if t.kind == TokenKind::Identifier || KEYWORDS.contains_key(t.text(self.src)) {
            self.advance();
            Ok(self.ident_from(t))
        } else {
            self.parse_ident()
        }
    }

    fn ident_from(&mut self, token: Token) -> Ident {
        Ident {
            name: self.ident_interner.intern(extract::ident(token, self.src)),
            span: token.span,
        }
    }

    fn synthesize_ident(&mut self, name: &str, span: Span) -> Ident {
        Ident {
            name: self.ident_interner.intern(name),
            span,
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            cursor: self.cursor,
            pending_greater: self.pending_greater,
            last: self.last,
            errors: self.errors.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.cursor = checkpoint.cursor;
        self.pending_greater = checkpoint.pending_greater;
        self.last = checkpoint.last;
        self.errors.truncate(checkpoint.errors);
    }

    /// Runs a side-effect-free lookahead, always restoring the cursor.
    fn speculate(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        let checkpoint = self.checkpoint();
        let result = f(self);
        self.restore(checkpoint);
        result
    }

    /// Runs a trial parse, rewinding (and discarding its errors) if it fails.
    fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Option<T> {
        let checkpoint = self.checkpoint();
        match f(self) {
            Ok(value) => Some(value),
            Err(()) => {
                self.restore(checkpoint);
                None
            }
        }
    }

    /// Runs `f`; on failure skips to the next boundary so the caller's loop
    /// can continue.
    ///
    /// A boundary is a consumed `;`, a just closed `{ ... }` group, a `}`
    /// closing the enclosing construct, or a token satisfying `stop`.
    /// Progress of at least one token is guaranteed.
    fn synchronize<T>(
        &mut self,
        stop: fn(TokenKind) -> bool,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let before = self.cursor;
        let result = f(self);
        if result.is_ok() {
            return result;
        }
        self.pending_greater = 0;
        let mut must_advance = self.cursor == before;
        let mut depth = 0_usize;
        loop {
            let c = self.peek().kind;
            if c == TokenKind::Eof {
                break;
            }
            if !must_advance && depth == 0 && (c == TokenKind::RBrace || stop(c)) {
                break;
            }
            must_advance = false;
            self.advance();
            match c {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::Semicolon if depth == 0 => break,
                _ => {}
            }
        }
        result
    }
}

fn is_ident_like(kind: TokenKind) -> bool {
    kind == TokenKind::Identifier || kind.is_contextual_keyword()
}

fn starts_declaration(kind: TokenKind) -> bool {
    kind.is_primitive_type()
        || matches!(
            kind,
            TokenKind::Function
                | TokenKind::Class
                | TokenKind::Struct
                | TokenKind::Interface
                | TokenKind::Enum
                | TokenKind::Namespace
                | TokenKind::Typedef
                | TokenKind::Template
                | TokenKind::Import
                | TokenKind::Export
                | TokenKind::Edict
                | TokenKind::Const
                | TokenKind::Let
                | TokenKind::Var
                | TokenKind::Async
                | TokenKind::Static
                | TokenKind::Directive(_)
        )
}

fn starts_statement(kind: TokenKind) -> bool {
    starts_declaration(kind)
        || matches!(
            kind,
            TokenKind::If
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Switch
                | TokenKind::Try
                | TokenKind::Throw
                | TokenKind::Case
                | TokenKind::Default
        )
}

fn starts_member(kind: TokenKind) -> bool {
    kind.is_primitive_type()
        || matches!(
            kind,
            TokenKind::Public
                | TokenKind::Private
                | TokenKind::Protected
                | TokenKind::Static
                | TokenKind::Virtual
                | TokenKind::Readonly
                | TokenKind::Tilde
        )
}

fn access_of(kind: TokenKind) -> Option<Access> {
    match kind {
        TokenKind::Public => Some(Access::Public),
        TokenKind::Private => Some(Access::Private),
        TokenKind::Protected => Some(Access::Protected),
        _ => None,
    }
}

fn is_assignment_target(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Identifier(_)
        | ExprKind::Member { .. }
        | ExprKind::Index { .. }
        | ExprKind::Unary {
            op: UnaryOperator::Deref,
            ..
        } => true,
        ExprKind::Paren(inner) => is_assignment_target(inner),
        _ => false,
    }
}

fn update_operator(kind: TokenKind) -> UpdateOperator {
    if kind == TokenKind::PlusPlus {
        UpdateOperator::Increment
    } else {
        UpdateOperator::Decrement
    }
}

fn assignment_operator(kind: TokenKind) -> AssignmentOperator {
    match kind {
        TokenKind::PlusAssign => AssignmentOperator::Add,
        TokenKind::MinusAssign => AssignmentOperator::Sub,
        TokenKind::StarAssign => AssignmentOperator::Mul,
        TokenKind::SlashAssign => AssignmentOperator::Div,
        TokenKind::PercentAssign => AssignmentOperator::Rem,
        TokenKind::ShlAssign => AssignmentOperator::Shl,
        TokenKind::ShrAssign => AssignmentOperator::Shr,
        TokenKind::AmpAssign => AssignmentOperator::BitAnd,
        TokenKind::PipeAssign => AssignmentOperator::BitOr,
        TokenKind::CaretAssign => AssignmentOperator::BitXor,
        _ => AssignmentOperator::Assign,
    }
}

fn binary_operator(kind: TokenKind) -> Option<BinaryOperator> {
    let op = match kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Sub,
        TokenKind::Star => BinaryOperator::Mul,
        TokenKind::Slash => BinaryOperator::Div,
        TokenKind::Percent => BinaryOperator::Rem,
        TokenKind::Shl => BinaryOperator::Shl,
        TokenKind::Shr => BinaryOperator::Shr,
        TokenKind::UShr => BinaryOperator::UShr,
        TokenKind::Amp => BinaryOperator::BitAnd,
        TokenKind::Pipe => BinaryOperator::BitOr,
        TokenKind::Caret => BinaryOperator::BitXor,
        TokenKind::EqEq => BinaryOperator::Eq,
        TokenKind::EqEqEq => BinaryOperator::StrictEq,
        TokenKind::NotEq => BinaryOperator::NotEq,
        TokenKind::NotEqEq => BinaryOperator::StrictNotEq,
        TokenKind::Less => BinaryOperator::Less,
        TokenKind::LessEq => BinaryOperator::LessEq,
        TokenKind::Greater => BinaryOperator::Greater,
        TokenKind::GreaterEq => BinaryOperator::GreaterEq,
        TokenKind::Instanceof => BinaryOperator::InstanceOf,
        TokenKind::In => BinaryOperator::In,
        _ => return None,
    };
    Some(op)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    UnexpectedAny {
        actual: TokenKind,
        expected: Box<[TokenKind]>,
    },
    UnexpectedTokenInExpr {
        token: TokenKind,
    },
    UnexpectedOperator {
        actual: TokenKind,
    },
    ExpectedDeclaration {
        actual: TokenKind,
    },
    ExpectedType {
        actual: TokenKind,
    },
    InvalidAssignmentTarget,
    InvalidTemplateTarget,
    IntegerOverflow,
    MalformedFloat,
    Cancelled,
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use crate::lexer::{tokenize, LexerOptions};

    pub fn parse_program(src: &str) -> (Interner, Program) {
        let mut i = Interner::with_capacity(32);
        let tokens = tokenize(src, &LexerOptions::default()).expect("failed to lex");
        let program = super::parse(src, &tokens, &mut i).expect("failed to parse");
        (i, program)
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::parse_program;
    use crate::{
        ast::{test_utils::shape, *},
        cancel::CancellationToken,
        lexer::{tokenize, LexerOptions},
        util::{intern::Interner, test_utils::tree_tests},
    };

    tree_tests!(
        use parser;

        fn test_scenario_add_function() {
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

        fn test_edict_declaration() {
            let program = "edict int x = 5;";
            let tree_ok = "
                variable Edict (0..16)
                  declarator x: int (10..15)
                    int 5 (14..15)
            ";
        }

        fn test_ts_style_declarators() {
            let program = "let a: number = 1, b;";
            let tree_ok = "
                variable Let (0..21)
                  declarator a: number (4..17)
                    int 1 (16..17)
                  declarator b (19..20)
            ";
        }

        fn test_c_declarators_own_their_pointers() {
            let program = "int *p, q[4];";
            let tree_ok = "
                variable Typed (0..13)
                  declarator p: int* (4..6)
                  declarator q: int[4] (8..12)
            ";
        }

        fn test_unsigned_long_long() {
            let program = "unsigned long long big = 1;";
            let tree_ok = "
                variable Typed (0..27)
                  declarator big: unsigned long long (19..26)
                    int 1 (25..26)
            ";
        }

        fn test_precedence_ladder() {
            let expr = "a || b && c | d ^ e & f == g < h << i + j * k";
            let tree_ok = "
                logical Or (0..45)
                  ident a (0..1)
                  logical And (5..45)
                    ident b (5..6)
                    binary BitOr (10..45)
                      ident c (10..11)
                      binary BitXor (14..45)
                        ident d (14..15)
                        binary BitAnd (18..45)
                          ident e (18..19)
                          binary Eq (22..45)
                            ident f (22..23)
                            binary Less (27..45)
                              ident g (27..28)
                              binary Shl (31..45)
                                ident h (31..32)
                                binary Add (36..45)
                                  ident i (36..37)
                                  binary Mul (40..45)
                                    ident j (40..41)
                                    ident k (44..45)
            ";
        }

        fn test_assignment_is_right_associative() {
            let expr = "a = b += 1";
            let tree_ok = "
                assignment Assign (0..10)
                  ident a (0..1)
                  assignment Add (4..10)
                    ident b (4..5)
                    int 1 (9..10)
            ";
        }

        fn test_conditional_and_nullish() {
            let expr = "x ?? y ? 1 : 2";
            let tree_ok = "
                conditional (0..14)
                  logical Nullish (0..6)
                    ident x (0..1)
                    ident y (5..6)
                  int 1 (9..10)
                  int 2 (13..14)
            ";
        }

        fn test_member_accesses_and_calls() {
            let expr = "std::cout->flush(a?.b, p[0]++)";
            let tree_ok = "
                call (0..30)
                  member Arrow flush (0..16)
                    member Scope cout (0..9)
                      ident std (0..3)
                  arguments
                    member Optional b (17..21)
                      ident a (17..18)
                    update Increment postfix (23..29)
                      index (23..27)
                        ident p (23..24)
                        int 0 (25..26)
            ";
        }

        fn test_generic_call_splits_shift() {
            let expr = "make<Array<int>>(1)";
            let tree_ok = "
                call<Array<int>> (0..19)
                  ident make (0..4)
                  arguments
                    int 1 (17..18)
            ";
        }

        fn test_comparison_is_not_generic() {
            let expr = "a < b";
            let tree_ok = "
                binary Less (0..5)
                  ident a (0..1)
                  ident b (4..5)
            ";
        }

        fn test_arrow_function() {
            let expr = "(x: int, y) => x * y";
            let tree_ok = "
                arrow (0..20)
                  param x: int (1..7)
                  param y (9..10)
                  binary Mul (15..20)
                    ident x (15..16)
                    ident y (19..20)
            ";
        }

        fn test_paren_is_not_arrow() {
            let expr = "(x) * 2";
            let tree_ok = "
                binary Mul (0..7)
                  paren (0..3)
                    ident x (1..2)
                  int 2 (6..7)
            ";
        }

        fn test_casts() {
            let expr = "(int) 1.5 + y as float";
            let tree_ok = "
                cast As float (0..22)
                  binary Add (0..13)
                    cast Prefix int (0..9)
                      float 1.5 (6..9)
                    ident y (12..13)
            ";
        }

        fn test_lambda() {
            let expr = "[&total](int x) -> int { return x; }";
            let tree_ok = "
                lambda [&total] -> int (0..36)
                  param x: int (9..14)
                  block (23..36)
                    return (25..34)
                      ident x (32..33)
            ";
        }

        fn test_new_and_delete() {
            let expr = "new Point(1, 2) == new int[8]";
            let tree_ok = "
                binary Eq (0..29)
                  new Point (0..15)
                    int 1 (10..11)
                    int 2 (13..14)
                  new-array int (19..29)
                    int 8 (27..28)
            ";
        }

        fn test_object_and_array_literals() {
            let expr = r#"{ a: [1, 2], b, "c": true }"#;
            let tree_ok = r#"
                object (0..27)
                  property a
                    array (5..11)
                      int 1 (6..7)
                      int 2 (9..10)
                  property b (shorthand)
                    ident b (13..14)
                  property "c"
                    bool true (21..25)
            "#;
        }

        fn test_class_members() {
            let program = "
class Point : public Shape {
public:
    Point(int x) : x(x) {}
    ~Point() {}
    virtual int area() const = 0;
private:
    int x;
};";
            let tree_ok = "
                class Point extends Shape (1..137)
                  constructor public Point (42..64)
                    param x: int (48..54)
                    init x
                      ident x (59..60)
                    block (62..64)
                  destructor public Point (69..80)
                    block (78..80)
                  method public area -> int (85..114)
                  field private x: int (132..133)
            ";
        }

        fn test_constructor_initializer_arguments() {
            let program = "
class B : public A {
    B() : A(1, 2), x() {}
    int x;
};";
            let tree_ok = "
                class B extends A (1..61)
                  constructor public B (26..47)
                    init A
                      int 1 (34..35)
                      int 2 (37..38)
                    init x
                    block (45..47)
                  field public x: int (56..57)
            ";
        }

        fn test_ts_class() {
            let program = "
class Box<T> implements Holder {
    private value: T;
    static count = 0;
    constructor(value: T) { this.value = value; }
    get(): T { return this.value; }
}";
            let tree_ok = "
                class Box<T> implements Holder (1..165)
                  field private value: T (38..55)
                  field public static count (60..77)
                    int 0 (75..76)
                  constructor public constructor (82..127)
                    param value: T (94..102)
                    block (104..127)
                      expression (106..125)
                        assignment Assign (106..124)
                          member Dot value (106..116)
                            this (106..110)
                          ident value (119..124)
                  method public get -> T (132..163)
                    block (141..163)
                      return (143..161)
                        member Dot value (150..160)
                          this (150..154)
            ";
        }

        fn test_template_function() {
            let program = "template <typename T> T max(T a, T b) { return a > b ? a : b; }";
            let tree_ok = "
                function max<T> -> T (0..63)
                  param a: T (28..31)
                  param b: T (33..36)
                  block (38..63)
                    return (40..61)
                      conditional (47..60)
                        binary Greater (47..52)
                          ident a (47..48)
                          ident b (51..52)
                        ident a (55..56)
                        ident b (59..60)
            ";
        }

        fn test_interface_enum_alias() {
            let program = "
interface Shape { readonly name: string; area(): double; }
enum class Color { Red, Green = 2 };
typedef unsigned int uint;";
            let tree_ok = "
                interface Shape (1..59)
                  property readonly name: string (19..40)
                  method area -> double (42..56)
                enum Color (60..96)
                  variant Red (79..82)
                  variant Green (84..93)
                    int 2 (92..93)
                type uint = unsigned int (97..123)
            ";
        }

        fn test_imports_directives_namespaces() {
            let program = r#"
#include <stdio.h>
import { a, b as c } from "mod";
namespace geo { export int origin = 0; }"#;
            let tree_ok = r#"
                directive Include "<stdio.h>" (1..19)
                import "mod" (20..52)
                  specifier a
                  specifier b as c
                namespace geo (53..93)
                  export (69..91)
                    variable Typed (76..91)
                      declarator origin: int (80..90)
                        int 0 (89..90)
            "#;
        }

        fn test_loops() {
            let program = "
void f() {
    for (int i = 0; i < 3; i++) {}
    for (const x of xs) {}
    for (auto& y : ys) {}
    for (k in obj) {}
}";
            let tree_ok = "
                function f -> void (1..123)
                  block (10..123)
                    for (16..46)
                      init
                        variable Typed (21..30)
                          declarator i: int (25..30)
                            int 0 (29..30)
                      condition
                        binary Less (32..37)
                          ident i (32..33)
                          int 3 (36..37)
                      update
                        update Increment postfix (39..42)
                          ident i (39..40)
                      block (44..46)
                    for-of Const x (51..73)
                      ident xs (67..69)
                      block (71..73)
                    for-of Typed y: auto& (78..99)
                      ident ys (93..95)
                      block (97..99)
                    for-in Typed k (104..121)
                      ident obj (114..117)
                      block (119..121)
            ";
        }

        fn test_switch_and_try() {
            let program = "
void g(int n) {
    switch (n) { case 1: break; default: return; }
    try { throw n; } catch (e) {} finally {}
}";
            let tree_ok = "
                function g -> void (1..114)
                  param n: int (8..13)
                  block (15..114)
                    switch (21..67)
                      ident n (29..30)
                      case (34..48)
                        int 1 (39..40)
                        break (42..48)
                      default (49..65)
                        return (58..65)
                    try (72..112)
                      block (76..88)
                        throw (78..86)
                          ident n (84..85)
                      catch e
                        block (99..101)
                      finally
                        block (110..112)
            ";
        }

        fn test_error_recovery_reports_every_error() {
            let program = "int x = ; int y = 2; int z = );";
            let tree_error = "
                variable Typed (10..20)
                  declarator y: int (14..19)
                    int 2 (18..19)
            ";
            let expected_errors = &[
                "8..9: unexpected token Semicolon in expression",
                "29..30: unexpected token RParen in expression",
            ];
        }

        fn test_error_missing_semicolon() {
            let program = "void f() { a = 1 b = 2; c = 3; }";
            let expected_errors = &["17..18: expected token Semicolon, but got Identifier"];
        }

        fn test_error_invalid_assignment_target() {
            let expr = "1 = x";
            let expected_errors = &["0..1: invalid assignment target"];
        }

        fn test_error_expected_declaration() {
            let program = "return 1;";
            let expected_errors = &["0..6: expected a declaration, but got Return"];
        }
    );

    fn parse_all(src: &str) -> (Program, Vec<crate::token::Spanned<super::Error>>) {
        let tokens = tokenize(src, &LexerOptions::default()).unwrap();
        let mut i = Interner::default();
        match super::parse(src, &tokens, &mut i) {
            Ok(program) => (program, vec![]),
            Err((program, errors)) => (program, errors),
        }
    }

    #[test]
    fn scenario_add_function_structure() {
        let (i, program) = parse_program("int add(int a, int b) { return a + b; }");
        assert_eq!(program.declarations.len(), 1);
        let DeclarationKind::Function(function) = &program.declarations[0].kind else {
            panic!("expected a function");
        };
        assert_eq!(i.get(function.name), "add");
        assert_eq!(function.params.len(), 2);
        let body = function.body.as_ref().unwrap();
        assert_eq!(body.statements.len(), 1);
        let StatementKind::Return(Some(value)) = &body.statements[0].kind else {
            panic!("expected a return");
        };
        assert!(matches!(
            value.kind,
            ExprKind::Binary {
                op: BinaryOperator::Add,
                ..
            }
        ));
    }

    #[test]
    fn parsing_is_idempotent() {
        let src = "
            class A { int x; int get() { return x; } };
            int main() { A a; for (int i = 0; i < 10; i++) { a.x += i; } return 0; }
        ";
        let (_, first) = parse_program(src);
        let (_, second) = parse_program(src);
        assert_eq!(first, second);
        assert_eq!(shape(&first), shape(&second));
    }

    #[test]
    fn lossless_token_streams_parse_the_same() {
        let src = "int main() {\n  // comment\n  return 0;\n}\n";
        let compact = tokenize(src, &LexerOptions::default()).unwrap();
        let lossless = tokenize(src, &LexerOptions::LOSSLESS).unwrap();
        let mut i = Interner::default();
        let a = super::parse(src, &compact, &mut i).unwrap();
        let b = super::parse(src, &lossless, &mut i).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn speculation_leaves_no_errors_behind() {
        let (program, errors) = parse_all("void f() { a < b; x * y; foo(1); }");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(program.declarations.len(), 1);
    }

    #[test]
    fn cancelled_parse_stops_between_declarations() {
        let src = "int a = 1; int b = 2;";
        let tokens = tokenize(src, &LexerOptions::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut i = Interner::default();
        let Err((program, errors)) = super::parse_cancellable(src, &tokens, &mut i, &cancel)
        else {
            panic!("expected cancellation");
        };
        assert!(program.declarations.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].inner, super::Error::Cancelled);
    }

    #[test]
    fn node_spans_cover_their_tokens() {
        let src = "edict int x = 5;";
        let (_, program) = parse_program(src);
        let declaration = &program.declarations[0];
        assert_eq!(declaration.span.substr(src), src);
        assert_eq!(program.span.lo(), 0);
    }
}
