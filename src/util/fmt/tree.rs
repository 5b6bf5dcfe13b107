use std::io::Write;

use crate::{ast::*, token::Span, util::intern::Interner};

const INDENT_WIDTH: usize = 2;

type Result = std::io::Result<()>;

pub fn print_program_string(idents: &Interner, program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, idents, program).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_expr_string(idents: &Interner, expr: &Expr) -> String {
    let mut buf = Vec::with_capacity(512);
    print_expr(&mut buf, idents, 0, expr).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_program(w: &mut impl Write, idents: &Interner, program: &Program) -> Result {
    for declaration in &program.declarations {
        print_declaration(w, idents, 0, declaration)?;
    }
    Ok(())
}

fn print_declaration(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    declaration: &Declaration,
) -> Result {
    let span = declaration.span;
    match &declaration.kind {
        DeclarationKind::Function(function) => {
            sp(w, i)?;
            write!(w, "function ")?;
            print_function(w, idents, i, function, span)?;
        }
        DeclarationKind::Variable(variable) => print_variable(w, idents, i, variable, span)?,
        DeclarationKind::Class(class) => print_class(w, idents, i, "class", class, span)?,
        DeclarationKind::Struct(class) => print_class(w, idents, i, "struct", class, span)?,
        DeclarationKind::Interface(interface) => {
            sp(w, i)?;
            write!(w, "interface {}", idents.get(interface.name))?;
            write_type_params(w, idents, &interface.type_params)?;
            write_type_list(w, idents, " extends ", &interface.extends)?;
            writeln!(w, " ({span})")?;
            for member in &interface.members {
                print_interface_member(w, idents, i + 1, member)?;
            }
        }
        DeclarationKind::Enum(e) => {
            sp(w, i)?;
            writeln!(w, "enum {} ({span})", idents.get(e.name))?;
            for variant in &e.variants {
                sp(w, i + 1)?;
                writeln!(w, "variant {} ({})", idents.get(variant.name), variant.span)?;
                if let Some(value) = &variant.value {
                    print_expr(w, idents, i + 2, value)?;
                }
            }
        }
        DeclarationKind::Namespace(namespace) => {
            sp(w, i)?;
            writeln!(w, "namespace {} ({span})", idents.get(namespace.name))?;
            for inner in &namespace.body {
                print_declaration(w, idents, i + 1, inner)?;
            }
        }
        DeclarationKind::TypeAlias(alias) => {
            sp(w, i)?;
            write!(w, "type {}", idents.get(alias.name))?;
            write_type_params(w, idents, &alias.type_params)?;
            writeln!(w, " = {} ({span})", type_string(idents, &alias.ty))?;
        }
        DeclarationKind::Import(import) => {
            sp(w, i)?;
            writeln!(w, "import {:?} ({span})", import.source)?;
            if let Some(default) = import.default {
                sp(w, i + 1)?;
                writeln!(w, "default {}", idents.get(default))?;
            }
            if let Some(namespace) = import.namespace {
                sp(w, i + 1)?;
                writeln!(w, "namespace {}", idents.get(namespace))?;
            }
            for specifier in &import.specifiers {
                sp(w, i + 1)?;
                write!(w, "specifier {}", idents.get(specifier.name))?;
                if let Some(alias) = specifier.alias {
                    write!(w, " as {}", idents.get(alias))?;
                }
                writeln!(w)?;
            }
        }
        DeclarationKind::Export {
            declaration,
            is_default,
        } => {
            sp(w, i)?;
            let default = if *is_default { " default" } else { "" };
            writeln!(w, "export{default} ({span})")?;
            print_declaration(w, idents, i + 1, declaration)?;
        }
        DeclarationKind::Directive {
            directive,
            argument,
        } => {
            sp(w, i)?;
            writeln!(w, "directive {directive:?} {argument:?} ({span})")?;
        }
    }
    Ok(())
}

/// Prints the function header (after its label), parameters and body.
fn print_function(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    function: &Function,
    span: Span,
) -> Result {
    if function.is_async {
        write!(w, "async ")?;
    }
    write!(w, "{}", idents.get(function.name))?;
    write_type_params(w, idents, &function.type_params)?;
    if let Some(ty) = &function.return_ty {
        write!(w, " -> {}", type_string(idents, ty))?;
    }
    writeln!(w, " ({span})")?;
    print_params(w, idents, i + 1, &function.params)?;
    if let Some(body) = &function.body {
        print_block(w, idents, i + 1, body)?;
    }
    Ok(())
}

fn print_params(w: &mut impl Write, idents: &Interner, i: usize, params: &[Param]) -> Result {
    for param in params {
        sp(w, i)?;
        let rest = if param.rest { "..." } else { "" };
        let optional = if param.optional { "?" } else { "" };
        write!(w, "param {rest}{}{optional}", idents.get(param.name))?;
        if let Some(ty) = &param.ty {
            write!(w, ": {}", type_string(idents, ty))?;
        }
        writeln!(w, " ({})", param.span)?;
        if let Some(default) = &param.default {
            print_expr(w, idents, i + 1, default)?;
        }
    }
    Ok(())
}

fn print_variable(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    variable: &Variable,
    span: Span,
) -> Result {
    sp(w, i)?;
    writeln!(w, "variable {:?} ({span})", variable.binding)?;
    for declarator in &variable.declarators {
        sp(w, i + 1)?;
        write!(w, "declarator ")?;
        print_declarator(w, idents, i + 1, declarator, declarator.span)?;
    }
    Ok(())
}

/// Fields print the span of their whole member instead of the declarator's.
fn print_declarator(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    declarator: &Declarator,
    span: Span,
) -> Result {
    write!(w, "{}", idents.get(declarator.name))?;
    if let Some(ty) = &declarator.ty {
        write!(w, ": {}", type_string(idents, ty))?;
    }
    writeln!(w, " ({span})")?;
    if let Some(initializer) = &declarator.initializer {
        print_expr(w, idents, i + 1, initializer)?;
    }
    Ok(())
}

fn print_class(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    label: &str,
    class: &Class,
    span: Span,
) -> Result {
    sp(w, i)?;
    write!(w, "{label} {}", idents.get(class.name))?;
    write_type_params(w, idents, &class.type_params)?;
    if let Some(extends) = &class.extends {
        write!(w, " extends {}", type_string(idents, extends))?;
    }
    write_type_list(w, idents, " implements ", &class.implements)?;
    writeln!(w, " ({span})")?;

    for member in &class.members {
        let i = i + 1;
        sp(w, i)?;
        let access = match member.access {
            Access::Public => "public",
            Access::Private => "private",
            Access::Protected => "protected",
        };
        let modifiers = if member.is_static { " static" } else { "" };
        let span = member.span;
        match &member.kind {
            MemberKind::Field {
                declarator,
                readonly,
            } => {
                let readonly = if *readonly { " readonly" } else { "" };
                write!(w, "field {access}{modifiers}{readonly} ")?;
                print_declarator(w, idents, i, declarator, span)?;
            }
            MemberKind::Method(function) => {
                write!(w, "method {access}{modifiers} ")?;
                print_function(w, idents, i, function, span)?;
            }
            MemberKind::Constructor {
                function,
                initializers,
            } => {
                writeln!(
                    w,
                    "constructor {access} {} ({span})",
                    idents.get(function.name)
                )?;
                print_params(w, idents, i + 1, &function.params)?;
                for (field, args) in initializers {
                    sp(w, i + 1)?;
                    writeln!(w, "init {}", idents.get(field))?;
                    for value in args {
                        print_expr(w, idents, i + 2, value)?;
                    }
                }
                if let Some(body) = &function.body {
                    print_block(w, idents, i + 1, body)?;
                }
            }
            MemberKind::Destructor(function) => {
                writeln!(
                    w,
                    "destructor {access} {} ({span})",
                    idents.get(function.name)
                )?;
                if let Some(body) = &function.body {
                    print_block(w, idents, i + 1, body)?;
                }
            }
        }
    }
    Ok(())
}

fn print_interface_member(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    member: &InterfaceMember,
) -> Result {
    sp(w, i)?;
    let name = idents.get(member.name);
    let optional = if member.optional { "?" } else { "" };
    let span = member.span;
    match &member.kind {
        InterfaceMemberKind::Property(ty) => {
            let readonly = if member.readonly { "readonly " } else { "" };
            let ty = type_string(idents, ty);
            writeln!(w, "property {readonly}{name}{optional}: {ty} ({span})")?;
        }
        InterfaceMemberKind::Method {
            type_params,
            params,
            return_ty,
        } => {
            write!(w, "method {name}{optional}")?;
            write_type_params(w, idents, type_params)?;
            if let Some(ty) = return_ty {
                write!(w, " -> {}", type_string(idents, ty))?;
            }
            writeln!(w, " ({span})")?;
            print_params(w, idents, i + 1, params)?;
        }
    }
    Ok(())
}

fn print_block(w: &mut impl Write, idents: &Interner, i: usize, block: &Block) -> Result {
    sp(w, i)?;
    writeln!(w, "block ({})", block.span)?;
    for statement in &block.statements {
        print_statement(w, idents, i + 1, statement)?;
    }
    Ok(())
}

pub fn print_statement(
    w: &mut impl Write,
    idents: &Interner,
    i: usize,
    statement: &Statement,
) -> Result {
    let span = statement.span;
    match &statement.kind {
        StatementKind::Block(block) => return print_block(w, idents, i, block),
        StatementKind::Variable(variable) => {
            return print_variable(w, idents, i, variable, span);
        }
        StatementKind::Declaration(declaration) => {
            return print_declaration(w, idents, i, declaration);
        }
        _ => {}
    }

    sp(w, i)?;
    match &statement.kind {
        StatementKind::Block(_) | StatementKind::Variable(_) | StatementKind::Declaration(_) => {
            unreachable!("printed above")
        }
        StatementKind::Expression(expr) => {
            writeln!(w, "expression ({span})")?;
            print_expr(w, idents, i + 1, expr)?;
        }
        StatementKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            writeln!(w, "if ({span})")?;
            print_expr(w, idents, i + 1, condition)?;
            print_statement(w, idents, i + 1, then_branch)?;
            if let Some(else_branch) = else_branch {
                sp(w, i + 1)?;
                writeln!(w, "else")?;
                print_statement(w, idents, i + 2, else_branch)?;
            }
        }
        StatementKind::While { condition, body } => {
            writeln!(w, "while ({span})")?;
            print_expr(w, idents, i + 1, condition)?;
            print_statement(w, idents, i + 1, body)?;
        }
        StatementKind::DoWhile { body, condition } => {
            writeln!(w, "do-while ({span})")?;
            print_statement(w, idents, i + 1, body)?;
            print_expr(w, idents, i + 1, condition)?;
        }
        StatementKind::For {
            init,
            condition,
            update,
            body,
        } => {
            writeln!(w, "for ({span})")?;
            if let Some(init) = init {
                sp(w, i + 1)?;
                writeln!(w, "init")?;
                print_statement(w, idents, i + 2, init)?;
            }
            if let Some(condition) = condition {
                sp(w, i + 1)?;
                writeln!(w, "condition")?;
                print_expr(w, idents, i + 2, condition)?;
            }
            if let Some(update) = update {
                sp(w, i + 1)?;
                writeln!(w, "update")?;
                print_expr(w, idents, i + 2, update)?;
            }
            print_statement(w, idents, i + 1, body)?;
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
            let label = if matches!(statement.kind, StatementKind::ForIn { .. }) {
                "for-in"
            } else {
                "for-of"
            };
            write!(w, "{label} {:?} {}", binding.binding, idents.get(binding.name))?;
            if let Some(ty) = &binding.ty {
                write!(w, ": {}", type_string(idents, ty))?;
            }
            writeln!(w, " ({span})")?;
            print_expr(w, idents, i + 1, iterable)?;
            print_statement(w, idents, i + 1, body)?;
        }
        StatementKind::Return(value) => {
            writeln!(w, "return ({span})")?;
            if let Some(value) = value {
                print_expr(w, idents, i + 1, value)?;
            }
        }
        StatementKind::Break => writeln!(w, "break ({span})")?,
        StatementKind::Continue => writeln!(w, "continue ({span})")?,
        StatementKind::Empty => writeln!(w, "empty ({span})")?,
        StatementKind::Switch {
            discriminant,
            cases,
        } => {
            writeln!(w, "switch ({span})")?;
            print_expr(w, idents, i + 1, discriminant)?;
            for case in cases {
                sp(w, i + 1)?;
                if let Some(test) = &case.test {
                    writeln!(w, "case ({})", case.span)?;
                    print_expr(w, idents, i + 2, test)?;
                } else {
                    writeln!(w, "default ({})", case.span)?;
                }
                for statement in &case.body {
                    print_statement(w, idents, i + 2, statement)?;
                }
            }
        }
        StatementKind::Try {
            block,
            handler,
            finalizer,
        } => {
            writeln!(w, "try ({span})")?;
            print_block(w, idents, i + 1, block)?;
            if let Some(handler) = handler {
                sp(w, i + 1)?;
                write!(w, "catch")?;
                if let Some((name, ty)) = &handler.param {
                    write!(w, " {}", idents.get(name))?;
                    if let Some(ty) = ty {
                        write!(w, ": {}", type_string(idents, ty))?;
                    }
                }
                writeln!(w)?;
                print_block(w, idents, i + 2, &handler.body)?;
            }
            if let Some(finalizer) = finalizer {
                sp(w, i + 1)?;
                writeln!(w, "finally")?;
                print_block(w, idents, i + 2, finalizer)?;
            }
        }
        StatementKind::Throw(value) => {
            writeln!(w, "throw ({span})")?;
            print_expr(w, idents, i + 1, value)?;
        }
    }
    Ok(())
}

pub fn print_expr(w: &mut impl Write, idents: &Interner, i: usize, expr: &Expr) -> Result {
    sp(w, i)?;
    let span = expr.span;
    match &expr.kind {
        ExprKind::Identifier(ident) => writeln!(w, "ident {} ({span})", idents.get(ident))?,
        ExprKind::This => writeln!(w, "this ({span})")?,
        ExprKind::Super => writeln!(w, "super ({span})")?,
        ExprKind::Literal(literal) => match literal {
            Literal::Integer(value) => writeln!(w, "int {value} ({span})")?,
            Literal::Float { value, single } => {
                let suffix = if *single { "f" } else { "" };
                writeln!(w, "float {value}{suffix} ({span})")?;
            }
            Literal::String(value) => writeln!(w, "string {value:?} ({span})")?,
            Literal::Char(value) => writeln!(w, "char {value:?} ({span})")?,
            Literal::Bool(value) => writeln!(w, "bool {value} ({span})")?,
            Literal::Null => writeln!(w, "null ({span})")?,
        },
        ExprKind::Template(raw) => writeln!(w, "template {raw:?} ({span})")?,
        ExprKind::Array(elements) => {
            writeln!(w, "array ({span})")?;
            for element in elements {
                print_expr(w, idents, i + 1, element)?;
            }
        }
        ExprKind::Object(properties) => {
            writeln!(w, "object ({span})")?;
            for property in properties {
                sp(w, i + 1)?;
                match &property.key {
                    PropertyKey::Ident(ident) => write!(w, "property {}", idents.get(ident))?,
                    PropertyKey::String(key) => write!(w, "property {key:?}")?,
                    PropertyKey::Computed(_) => write!(w, "property computed")?,
                }
                if property.shorthand {
                    write!(w, " (shorthand)")?;
                }
                writeln!(w)?;
                if let PropertyKey::Computed(key) = &property.key {
                    print_expr(w, idents, i + 2, key)?;
                }
                print_expr(w, idents, i + 2, &property.value)?;
            }
        }
        ExprKind::Paren(inner) => {
            writeln!(w, "paren ({span})")?;
            print_expr(w, idents, i + 1, inner)?;
        }
        ExprKind::Unary { op, operand } => {
            writeln!(w, "unary {op:?} ({span})")?;
            print_expr(w, idents, i + 1, operand)?;
        }
        ExprKind::Update {
            op,
            prefix,
            operand,
        } => {
            let fixity = if *prefix { "prefix" } else { "postfix" };
            writeln!(w, "update {op:?} {fixity} ({span})")?;
            print_expr(w, idents, i + 1, operand)?;
        }
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} ({span})")?;
            print_expr(w, idents, i + 1, lhs)?;
            print_expr(w, idents, i + 1, rhs)?;
        }
        ExprKind::Logical { op, lhs, rhs } => {
            writeln!(w, "logical {op:?} ({span})")?;
            print_expr(w, idents, i + 1, lhs)?;
            print_expr(w, idents, i + 1, rhs)?;
        }
        ExprKind::Assignment { op, target, value } => {
            writeln!(w, "assignment {op:?} ({span})")?;
            print_expr(w, idents, i + 1, target)?;
            print_expr(w, idents, i + 1, value)?;
        }
        ExprKind::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            writeln!(w, "conditional ({span})")?;
            print_expr(w, idents, i + 1, condition)?;
            print_expr(w, idents, i + 1, then_expr)?;
            print_expr(w, idents, i + 1, else_expr)?;
        }
        ExprKind::Call {
            callee,
            type_args,
            args,
        } => {
            write!(w, "call")?;
            if !type_args.is_empty() {
                write!(w, "<")?;
                write_types(w, idents, type_args)?;
                write!(w, ">")?;
            }
            writeln!(w, " ({span})")?;
            print_expr(w, idents, i + 1, callee)?;
            if !args.is_empty() {
                sp(w, i + 1)?;
                writeln!(w, "arguments")?;
                for arg in args {
                    print_expr(w, idents, i + 2, arg)?;
                }
            }
        }
        ExprKind::Member {
            object,
            property,
            access,
        } => {
            writeln!(w, "member {access:?} {} ({span})", idents.get(property))?;
            print_expr(w, idents, i + 1, object)?;
        }
        ExprKind::Index { object, index } => {
            writeln!(w, "index ({span})")?;
            print_expr(w, idents, i + 1, object)?;
            print_expr(w, idents, i + 1, index)?;
        }
        ExprKind::New { ty, args } => {
            writeln!(w, "new {} ({span})", type_string(idents, ty))?;
            for arg in args {
                print_expr(w, idents, i + 1, arg)?;
            }
        }
        ExprKind::NewArray { element, length } => {
            writeln!(w, "new-array {} ({span})", type_string(idents, element))?;
            print_expr(w, idents, i + 1, length)?;
        }
        ExprKind::Delete { operand, array } => {
            let brackets = if *array { "[]" } else { "" };
            writeln!(w, "delete{brackets} ({span})")?;
            print_expr(w, idents, i + 1, operand)?;
        }
        ExprKind::Arrow(arrow) => {
            let prefix = if arrow.is_async { "async " } else { "" };
            write!(w, "{prefix}arrow")?;
            if let Some(ty) = &arrow.return_ty {
                write!(w, " -> {}", type_string(idents, ty))?;
            }
            writeln!(w, " ({span})")?;
            print_params(w, idents, i + 1, &arrow.params)?;
            match &arrow.body {
                ArrowBody::Expr(body) => print_expr(w, idents, i + 1, body)?,
                ArrowBody::Block(body) => print_block(w, idents, i + 1, body)?,
            }
        }
        ExprKind::Lambda(lambda) => {
            write!(w, "lambda [")?;
            for (idx, capture) in lambda.captures.iter().enumerate() {
                if idx > 0 {
                    write!(w, ", ")?;
                }
                match capture {
                    Capture::AllByValue => write!(w, "=")?,
                    Capture::AllByReference => write!(w, "&")?,
                    Capture::This => write!(w, "this")?,
                    Capture::ByValue(name) => write!(w, "{}", idents.get(name))?,
                    Capture::ByReference(name) => write!(w, "&{}", idents.get(name))?,
                }
            }
            write!(w, "]")?;
            if let Some(ty) = &lambda.return_ty {
                write!(w, " -> {}", type_string(idents, ty))?;
            }
            writeln!(w, " ({span})")?;
            print_params(w, idents, i + 1, &lambda.params)?;
            print_block(w, idents, i + 1, &lambda.body)?;
        }
        ExprKind::Cast {
            ty,
            expr: inner,
            style,
        } => {
            writeln!(w, "cast {style:?} {} ({span})", type_string(idents, ty))?;
            print_expr(w, idents, i + 1, inner)?;
        }
        ExprKind::Sizeof(SizeofOperand::Type(ty)) => {
            writeln!(w, "sizeof {} ({span})", type_string(idents, ty))?;
        }
        ExprKind::Sizeof(SizeofOperand::Expr(operand)) => {
            writeln!(w, "sizeof ({span})")?;
            print_expr(w, idents, i + 1, operand)?;
        }
        ExprKind::Typeof(operand) => {
            writeln!(w, "typeof ({span})")?;
            print_expr(w, idents, i + 1, operand)?;
        }
        ExprKind::Await(operand) => {
            writeln!(w, "await ({span})")?;
            print_expr(w, idents, i + 1, operand)?;
        }
        ExprKind::Spread(operand) => {
            writeln!(w, "spread ({span})")?;
            print_expr(w, idents, i + 1, operand)?;
        }
        ExprKind::Dummy => writeln!(w, "dummy ({span})")?,
    }
    Ok(())
}

fn write_type_params(w: &mut impl Write, idents: &Interner, params: &[TypeParam]) -> Result {
    if params.is_empty() {
        return Ok(());
    }
    write!(w, "<")?;
    for (idx, param) in params.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{}", idents.get(param.name))?;
    }
    write!(w, ">")
}

fn write_type_list(
    w: &mut impl Write,
    idents: &Interner,
    label: &str,
    types: &[TypeNode],
) -> Result {
    if types.is_empty() {
        return Ok(());
    }
    write!(w, "{label}")?;
    write_types(w, idents, types)
}

fn write_types(w: &mut impl Write, idents: &Interner, types: &[TypeNode]) -> Result {
    for (idx, ty) in types.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{}", type_string(idents, ty))?;
    }
    Ok(())
}

/// Renders a type in WORLDC surface syntax, `const char*`, `Map<string, int>`.
pub fn type_string(idents: &Interner, ty: &TypeNode) -> String {
    let mut buf = String::new();
    write_type(&mut buf, idents, ty);
    buf
}

fn write_type(buf: &mut String, idents: &Interner, ty: &TypeNode) {
    match &ty.kind {
        TypeKind::Primitive(primitive) => buf.push_str(primitive.name()),
        TypeKind::Named { path, args } => {
            for (idx, segment) in path.iter().enumerate() {
                if idx > 0 {
                    buf.push_str("::");
                }
                buf.push_str(idents.get(segment));
            }
            if !args.is_empty() {
                buf.push('<');
                write_type_seq(buf, idents, args, ", ");
                buf.push('>');
            }
        }
        TypeKind::Pointer(inner) => {
            write_type(buf, idents, inner);
            buf.push('*');
        }
        TypeKind::Reference(inner) => {
            write_type(buf, idents, inner);
            buf.push('&');
        }
        TypeKind::Array { element, size } => {
            write_type(buf, idents, element);
            buf.push('[');
            if let Some(size) = size {
                buf.push_str(&size.to_string());
            }
            buf.push(']');
        }
        TypeKind::Function { params, ret } => {
            buf.push('(');
            write_type_seq(buf, idents, params, ", ");
            buf.push_str(") => ");
            write_type(buf, idents, ret);
        }
        TypeKind::Union(members) => write_type_seq(buf, idents, members, " | "),
        TypeKind::Const(inner) => {
            buf.push_str("const ");
            write_type(buf, idents, inner);
        }
    }
}

fn write_type_seq(buf: &mut String, idents: &Interner, types: &[TypeNode], sep: &str) {
    for (idx, ty) in types.iter().enumerate() {
        if idx > 0 {
            buf.push_str(sep);
        }
        write_type(buf, idents, ty);
    }
}

fn sp(w: &mut impl Write, i: usize) -> Result {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
