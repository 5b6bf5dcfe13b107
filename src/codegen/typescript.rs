use crate::{
    ast::*,
    codegen::{
        emit::{format_float, Dialect, Emitter},
        infer::{self, LiteralKind, ValueClass},
        validate_common, Feature, GenerationContext, GenerationError, GenerationOptions,
        GenerationOutput, Generator, Target,
    },
    token::Directive,
};

pub struct TypeScriptGenerator;

impl Generator for TypeScriptGenerator {
    fn target(&self) -> Target {
        Target::TypeScript
    }

    fn supports_feature(&self, feature: Feature) -> bool {
        TypeScript::supports(feature)
    }

    fn validate_options(&self, options: &GenerationOptions) -> Result<(), GenerationError> {
        validate_common(Target::TypeScript, options)
    }

    fn generate(
        &self,
        program: &Program,
        ctx: &GenerationContext<'_>,
    ) -> Result<GenerationOutput, GenerationError> {
        self.validate_options(ctx.options)?;
        let mut emitter = Emitter::<TypeScript>::new(ctx);
        emitter.program(program)?;
        let declarations = if ctx.options.declarations {
            Some(declaration_file(program, ctx)?)
        } else {
            None
        };
        emitter.finish(declarations)
    }
}

pub(crate) struct TypeScript;

static TYPES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "void" => "void",
    "bool" => "boolean",
    "char" => "number",
    "unsigned char" => "number",
    "short" => "number",
    "unsigned short" => "number",
    "int" => "number",
    "unsigned int" => "number",
    "long" => "number",
    "unsigned long" => "number",
    "long long" => "bigint",
    "unsigned long long" => "bigint",
    "float" => "number",
    "double" => "number",
    "string" => "string",
    "auto" => "any",
    "any" => "any",
    "i8" => "number",
    "i16" => "number",
    "i32" => "number",
    "i64" => "bigint",
    "u8" => "number",
    "u16" => "number",
    "u32" => "number",
    "u64" => "bigint",
    "f32" => "number",
    "f64" => "number",
    "isize" => "number",
    "usize" => "number",
    "size_t" => "number",
    "int8_t" => "number",
    "int16_t" => "number",
    "int32_t" => "number",
    "int64_t" => "bigint",
    "uint8_t" => "number",
    "uint16_t" => "number",
    "uint32_t" => "number",
    "uint64_t" => "bigint",
};

impl Dialect for TypeScript {
    const TARGET: Target = Target::TypeScript;
    const POINTER: &'static str = "number";
    const REQUIRES_INITIALIZATION: bool = false;
    const UNIONS: bool = true;
    const LOWER_FOR_OF: bool = false;

    fn types() -> &'static phf::Map<&'static str, &'static str> {
        &TYPES
    }

    fn supports(feature: Feature) -> bool {
        !matches!(feature, Feature::RawMemory)
    }

    fn integer(value: u64, wide: bool) -> String {
        if wide {
            format!("{value}n")
        } else {
            value.to_string()
        }
    }

    fn float(value: f64, _single: bool) -> String {
        format_float(value)
    }

    fn coerce(code: &str, to: ValueClass, from: LiteralKind, _ty: &str) -> Option<String> {
        Some(match (to, from) {
            (ValueClass::Integer, LiteralKind::Float) => format!("Math.trunc({code})"),
            (ValueClass::Integer | ValueClass::Float, LiteralKind::Bool) => {
                format!("Number({code})")
            }
            (ValueClass::Wide, LiteralKind::Float) => format!("BigInt(Math.trunc({code}))"),
            (ValueClass::Wide, LiteralKind::Integer | LiteralKind::Bool) => {
                format!("BigInt({code})")
            }
            (ValueClass::String, LiteralKind::Integer | LiteralKind::Float | LiteralKind::Bool) => {
                format!("String({code})")
            }
            (ValueClass::Bool, LiteralKind::Integer | LiteralKind::Float) => {
                format!("Boolean({code})")
            }
            _ => return None,
        })
    }

    fn cast(code: &str, to: ValueClass, ty: &str, style: CastStyle) -> String {
        if style == CastStyle::As {
            return format!("({code} as {ty})");
        }
        match to {
            ValueClass::Integer => format!("Math.trunc({code})"),
            ValueClass::Wide => format!("BigInt({code})"),
            ValueClass::Float => format!("Number({code})"),
            ValueClass::Bool => format!("Boolean({code})"),
            ValueClass::String => format!("String({code})"),
            ValueClass::Other => format!("({code} as {ty})"),
        }
    }

    fn zero(class: ValueClass) -> Option<&'static str> {
        match class {
            ValueClass::Integer | ValueClass::Float => Some("0"),
            ValueClass::Wide => Some("0n"),
            ValueClass::Bool => Some("false"),
            ValueClass::String => Some("\"\""),
            ValueClass::Other => None,
        }
    }

    fn sized_array(element: &str, size: u64, zero: Option<&str>) -> String {
        match zero {
            Some(zero) => format!("new Array<{element}>({size}).fill({zero})"),
            None => format!("new Array<{element}>({size})"),
        }
    }

    fn builtin_call(callee: &str, args: &[String]) -> Option<String> {
        match callee {
            "printf" | "puts" => Some(format!("console.log({})", args.join(", "))),
            _ => None,
        }
    }

    fn sizeof(_ty: &str, size: Option<u32>) -> Option<String> {
        size.map(|size| size.to_string())
    }

    fn delete(operand: &str, member: bool) -> Option<String> {
        member.then(|| format!("delete {operand}"))
    }

    fn address_of(_operand: &str) -> Option<String> {
        None
    }

    fn binary(op: BinaryOperator, strict: bool) -> &'static str {
        match op {
            BinaryOperator::Eq if strict => "===",
            BinaryOperator::NotEq if strict => "!==",
            _ => op.as_str(),
        }
    }
}

/// Renders the `.d.ts` companion of `program`.
fn declaration_file(program: &Program, ctx: &GenerationContext<'_>) -> Result<String, GenerationError> {
    let mut emitter = Emitter::<TypeScript>::new(ctx);
    let body = emitter.capture(|this| match &ctx.options.module_name {
        Some(module) => {
            this.line(format!("declare module {} {{", super::emit::quote(module)));
            this.indented(|this| this.ambient_declarations(&program.declarations, "export "))?;
            this.line("}");
            Ok(())
        }
        None => this.ambient_declarations(&program.declarations, "export declare "),
    })?;
    Ok(format!("// Generated by worldc from {}\n\n{body}", ctx.filename))
}

impl Emitter<'_, TypeScript> {
    fn ambient_declarations(&mut self, declarations: &[Declaration], prefix: &str) -> Result<(), GenerationError> {
        for declaration in declarations {
            self.ambient(declarations, declaration, prefix)?;
        }
        Ok(())
    }

    fn ambient(
        &mut self,
        siblings: &[Declaration],
        declaration: &Declaration,
        prefix: &str,
    ) -> Result<(), GenerationError> {
        match &declaration.kind {
            DeclarationKind::Function(function) => {
                // A prototype only stands in for a missing definition.
                if function.body.is_none() && has_definition(siblings, function.name) {
                    return Ok(());
                }
                let signature = self.ambient_signature(function)?;
                self.line(format!("{prefix}function {signature};"));
            }
            DeclarationKind::Variable(variable) => {
                for declarator in &variable.declarators {
                    let keyword = if variable.binding.is_constant() {
                        "const"
                    } else {
                        "let"
                    };
                    let ty = match self.annotation(declarator.ty.as_ref()) {
                        Some(ty) => ty,
                        None => literal_type(declarator.initializer.as_ref()).to_owned(),
                    };
                    let name = self.name(declarator.name);
                    self.line(format!("{prefix}{keyword} {name}: {ty};"));
                }
            }
            DeclarationKind::Class(class) | DeclarationKind::Struct(class) => {
                self.ambient_class(class, prefix)?;
            }
            DeclarationKind::Interface(interface) => {
                let mut header = format!(
                    "{}interface {}{}",
                    prefix.replace("declare ", ""),
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
                        let line = this.interface_member(member)?;
                        this.line(line);
                    }
                    Ok(())
                })?;
                self.line("}");
            }
            DeclarationKind::Enum(enumeration) => {
                self.line(format!("{prefix}enum {} {{", self.name(enumeration.name)));
                self.indented(|this| {
                    for variant in &enumeration.variants {
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
            }
            DeclarationKind::Namespace(namespace) => {
                self.line(format!("{prefix}namespace {} {{", self.name(namespace.name)));
                self.indented(|this| this.ambient_declarations(&namespace.body, "export "))?;
                self.line("}");
            }
            DeclarationKind::TypeAlias(alias) => {
                let alias = self.type_alias(alias);
                self.line(format!("{}{alias}", prefix.replace("declare ", "")));
            }
            DeclarationKind::Import(import) => {
                let line = self.import(import);
                self.line(line);
            }
            DeclarationKind::Export { declaration, .. } => {
                self.ambient(siblings, declaration, prefix)?;
            }
            DeclarationKind::Directive {
                directive: Directive::Define,
                argument,
            } => {
                let argument: &str = argument;
                let (name, value) = argument
                    .split_once(char::is_whitespace)
                    .unwrap_or((argument, ""));
                if !name.contains('(') {
                    self.line(format!("{prefix}const {name}: {};", define_type(value.trim())));
                }
            }
            DeclarationKind::Directive { .. } => {}
        }
        Ok(())
    }

    fn ambient_class(&mut self, class: &Class, prefix: &str) -> Result<(), GenerationError> {
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
            header.push_str(" implements ");
            header.push_str(&self.types(&class.implements));
        }

        self.line(format!("{header} {{"));
        self.indented(|this| {
            let mut has_dispose = false;
            for member in &class.members {
                let access = match member.access {
                    Access::Public => "",
                    Access::Private => "private ",
                    Access::Protected => "protected ",
                };
                let modifiers = format!("{access}{}", if member.is_static { "static " } else { "" });
                match &member.kind {
                    MemberKind::Field {
                        declarator,
                        readonly,
                    } => {
                        let ty = match this.annotation(declarator.ty.as_ref()) {
                            Some(ty) => ty,
                            None => literal_type(declarator.initializer.as_ref()).to_owned(),
                        };
                        let readonly = if *readonly { "readonly " } else { "" };
                        let name = this.name(declarator.name);
                        this.line(format!("{modifiers}{readonly}{name}: {ty};"));
                    }
                    MemberKind::Method(function) => {
                        let signature = this.ambient_signature(function)?;
                        let abstract_ = if function.body.is_none() { "abstract " } else { "" };
                        this.line(format!("{modifiers}{abstract_}{signature};"));
                    }
                    MemberKind::Constructor { function, .. } => {
                        let params = this.ambient_params(&function.params);
                        this.line(format!("constructor({params});"));
                    }
                    MemberKind::Destructor(_) if !has_dispose => {
                        has_dispose = true;
                        this.line("dispose(): void;");
                    }
                    MemberKind::Destructor(_) => {}
                }
            }
            Ok(())
        })?;
        self.line("}");
        Ok(())
    }

    fn ambient_signature(&mut self, function: &Function) -> Result<String, GenerationError> {
        let name = self.name(function.name);
        let type_params = self.type_params(&function.type_params);
        let params = self.ambient_params(&function.params);
        let ret = match self.annotation(function.return_ty.as_ref()) {
            Some(ret) if function.is_async => format!("Promise<{ret}>"),
            Some(ret) => ret,
            None => "any".to_owned(),
        };
        Ok(format!("{name}{type_params}({params}): {ret}"))
    }

    /// Parameters without default values, which declarations cannot carry.
    fn ambient_params(&mut self, params: &[Param]) -> String {
        let mut rendered = Vec::with_capacity(params.len());
        for param in params {
            let rest = if param.rest { "..." } else { "" };
            let optional = if param.optional || param.default.is_some() {
                "?"
            } else {
                ""
            };
            let ty = match self.annotation(param.ty.as_ref()) {
                Some(ty) if param.rest && !ty.ends_with(']') => format!("{ty}[]"),
                Some(ty) => ty,
                None if param.rest => "any[]".to_owned(),
                None => literal_type(param.default.as_ref()).to_owned(),
            };
            rendered.push(format!("{rest}{}{optional}: {ty}", self.name(param.name)));
        }
        rendered.join(", ")
    }
}

fn has_definition(siblings: &[Declaration], name: Ident) -> bool {
    siblings.iter().any(|declaration| match &declaration.kind {
        DeclarationKind::Function(function) => {
            function.name.name == name.name && function.body.is_some()
        }
        DeclarationKind::Export { declaration, .. } => {
            has_definition(std::slice::from_ref(declaration), name)
        }
        _ => false,
    })
}

fn literal_type(value: Option<&Expr>) -> &'static str {
    match value.and_then(infer::infer_literal) {
        Some(LiteralKind::Integer | LiteralKind::Float) => "number",
        Some(LiteralKind::Bool) => "boolean",
        Some(LiteralKind::String) => "string",
        None => "any",
    }
}

fn define_type(value: &str) -> &'static str {
    if value.is_empty() || value == "true" || value == "false" {
        "boolean"
    } else if value.starts_with('"') {
        "string"
    } else if value.parse::<f64>().is_ok() {
        "number"
    } else {
        "any"
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{cancel::CancellationToken, parser::test_utils::parse_program};

    fn generate_with(src: &str, options: GenerationOptions) -> GenerationOutput {
        let (interner, program) = parse_program(src);
        let cancel = CancellationToken::new();
        let ctx = GenerationContext {
            interner: &interner,
            options: &options,
            filename: "main.wc",
            source: src,
            cancel: &cancel,
        };
        TypeScriptGenerator.generate(&program, &ctx).unwrap()
    }

    fn generate(src: &str) -> String {
        generate_with(src, GenerationOptions::default()).code
    }

    #[test]
    fn functions_and_bindings() {
        let code = generate(indoc! {"
            edict int limit = 10;
            int add(int a, int b) { return a + b; }
            let name: string = \"world\";
        "});
        assert_eq!(
            code,
            indoc! {r#"
                // Generated by worldc from main.wc

                const limit: number = 10;

                function add(a: number, b: number): number {
                  return a + b;
                }

                let name: string = "world";
            "#}
        );
    }

    #[test]
    fn literal_casts() {
        let code = generate(indoc! {"
            int x = 1.5;
            long long big = 5;
            string s = 3;
            double d = (int) 2.5;
        "});
        assert_eq!(
            code,
            indoc! {"
                // Generated by worldc from main.wc

                let x: number = Math.trunc(1.5);
                let big: bigint = 5n;
                let s: string = String(3);
                let d: number = Math.trunc(2.5);
            "}
        );
    }

    #[test]
    fn assignment_and_argument_casts() {
        let code = generate(indoc! {"
            int scale(int n) { return n * 2; }
            void run() {
              int x = 0;
              x = 1.5;
              long long big = 0;
              big = 5;
              {
                string x = \"a\";
                x = 3;
              }
              scale(2.5);
            }
        "});
        assert!(code.contains("  x = Math.trunc(1.5);\n"));
        assert!(code.contains("  big = 5n;\n"));
        assert!(code.contains("    x = String(3);\n"));
        assert!(code.contains("  scale(Math.trunc(2.5));\n"));
    }

    #[test]
    fn default_values_on_request() {
        let src = "int count; bool done; int cells[3];";
        assert!(!generate(src).contains("= 0"));

        let options = GenerationOptions {
            initialize_defaults: true,
            ..GenerationOptions::default()
        };
        let code = generate_with(src, options).code;
        assert!(code.contains("let count: number = 0;"));
        assert!(code.contains("let done: boolean = false;"));
        assert!(code.contains("let cells: number[] = new Array<number>(3).fill(0);"));
    }

    #[test]
    fn classes() {
        let code = generate(indoc! {"
            class Animal {
              Animal(string name) : name(name) {}
              string name;
            };
            class Dog : public Animal {
            public:
              Dog(string name) : Animal(name) {}
              virtual string speak() { return \"woof\"; }
            private:
              int age;
            };
        "});
        assert_eq!(
            code,
            indoc! {r#"
                // Generated by worldc from main.wc

                class Animal {
                  constructor(name: string) {
                    this.name = name;
                  }
                  name: string;
                }

                class Dog extends Animal {
                  constructor(name: string) {
                    super(name);
                  }
                  speak(): string {
                    return "woof";
                  }
                  private age: number;
                }
            "#}
        );
    }

    #[test]
    fn constructor_initializer_arguments() {
        let output = generate_with(
            indoc! {"
                class Base { Base(int a, int b) {} };
                class Pair : public Base {
                public:
                  Pair() : Base(1, 2), count() {}
                  int count;
                };
                class Bare : public Base {
                public:
                  Bare() : Base() {}
                };
            "},
            GenerationOptions::default(),
        );
        assert_eq!(output.warnings, Vec::new());
        assert!(output.code.contains(indoc! {"
              constructor() {
                super(1, 2);
                this.count = 0;
              }
        "}));
        assert!(output.code.contains(indoc! {"
              constructor() {
                super();
              }
        "}));
        assert!(!output.code.contains("undefined"));
    }

    #[test]
    fn control_flow() {
        let code = generate(indoc! {"
            function run(xs: number[]): void {
              for (int i = 0; i < 3; i++) {
                if (i == 1) continue; else if (i == 2) break; else { printf(\"%d\", i); }
              }
              for (const x of xs) { console.log(x); }
              try { risky(); } catch (e) { throw e; } finally { done(); }
            }
        "});
        assert_eq!(
            code,
            indoc! {r#"
                // Generated by worldc from main.wc

                function run(xs: number[]): void {
                  for (let i: number = 0; i < 3; i++) {
                    if (i == 1) {
                      continue;
                    } else if (i == 2) {
                      break;
                    } else {
                      console.log("%d", i);
                    }
                  }
                  for (const x of xs) {
                    console.log(x);
                  }
                  try {
                    risky();
                  } catch (e) {
                    throw e;
                  } finally {
                    done();
                  }
                }
            "#}
        );
    }

    #[test]
    fn strict_equality() {
        let options = GenerationOptions {
            strict: true,
            ..GenerationOptions::default()
        };
        let code = generate_with("let same = a == b; let diff = a != b;", options).code;
        assert!(code.contains("let same = a === b;"));
        assert!(code.contains("let diff = a !== b;"));
    }

    #[test]
    fn unsupported_constructs_warn() {
        let output = generate_with("int* p = &x;", GenerationOptions::default());
        assert_eq!(output.code.lines().last(), Some("let p: number = x;"));
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(
            output.warnings[0].message,
            "TypeScript does not support taking addresses"
        );
    }

    #[test]
    fn source_map_is_linked() {
        let options = GenerationOptions {
            source_map: true,
            ..GenerationOptions::default()
        };
        let output = generate_with("int x = 1;\nint y = 2;", options);
        assert!(output.code.ends_with("//# sourceMappingURL=main.ts.map\n"));
        let map: serde_json::Value = serde_json::from_str(&output.source_map.unwrap()).unwrap();
        assert_eq!(map["file"], "main.ts");
        assert_eq!(map["sources"][0], "main.wc");
        assert_eq!(map["mappings"], ";;AAAA;AACA");
    }

    #[test]
    fn declarations() {
        let options = GenerationOptions {
            declarations: true,
            ..GenerationOptions::default()
        };
        let src = indoc! {"
            int add(int a, int b);
            int add(int a, int b) { return a + b; }
            edict int LIMIT = 3;
            class Counter {
              int count = 0;
              void bump(int by = 1) { count += by; }
              ~Counter() {}
            };
            #define DEBUG
        "};
        let output = generate_with(src, options);
        assert_eq!(
            output.declarations.unwrap(),
            indoc! {"
                // Generated by worldc from main.wc

                export declare function add(a: number, b: number): number;
                export declare const LIMIT: number;
                export declare class Counter {
                  count: number;
                  bump(by?: number): void;
                  dispose(): void;
                }
                export declare const DEBUG: boolean;
            "}
        );
    }

    #[test]
    fn declarations_in_a_module() {
        let options = GenerationOptions {
            declarations: true,
            module_name: Some("game".into()),
            ..GenerationOptions::default()
        };
        let output = generate_with("let speed: number = 2;", options);
        assert_eq!(
            output.declarations.unwrap(),
            indoc! {r#"
                // Generated by worldc from main.wc

                declare module "game" {
                  export let speed: number;
                }
            "#}
        );
    }

    #[test]
    fn cancelled_generation() {
        let (interner, program) = parse_program("int x = 1;");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let options = GenerationOptions::default();
        let ctx = GenerationContext {
            interner: &interner,
            options: &options,
            filename: "main.wc",
            source: "int x = 1;",
            cancel: &cancel,
        };
        assert_eq!(
            TypeScriptGenerator.generate(&program, &ctx),
            Err(GenerationError::Cancelled)
        );
    }
}
