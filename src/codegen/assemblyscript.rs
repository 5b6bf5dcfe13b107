use crate::{
    ast::{BinaryOperator, CastStyle, Program},
    codegen::{
        emit::{format_float, Dialect, Emitter},
        infer::{LiteralKind, ValueClass},
        validate_common, Feature, GenerationContext, GenerationError, GenerationOptions,
        GenerationOutput, Generator, Target,
    },
};

pub struct AssemblyScriptGenerator;

impl Generator for AssemblyScriptGenerator {
    fn target(&self) -> Target {
        Target::AssemblyScript
    }

    fn supports_feature(&self, feature: Feature) -> bool {
        AssemblyScript::supports(feature)
    }

    fn validate_options(&self, options: &GenerationOptions) -> Result<(), GenerationError> {
        validate_common(Target::AssemblyScript, options)?;
        let message = if options.async_support {
            "async functions are not supported"
        } else if options.declarations {
            "type declarations are only generated for TypeScript"
        } else {
            return Ok(());
        };
        Err(GenerationError::InvalidOptions {
            target: Target::AssemblyScript,
            message: message.into(),
        })
    }

    fn generate(
        &self,
        program: &Program,
        ctx: &GenerationContext<'_>,
    ) -> Result<GenerationOutput, GenerationError> {
        self.validate_options(ctx.options)?;
        let mut emitter = Emitter::<AssemblyScript>::new(ctx);
        emitter.program(program)?;
        emitter.finish(None)
    }
}

pub(crate) struct AssemblyScript;

static TYPES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "void" => "void",
    "bool" => "bool",
    "boolean" => "bool",
    "char" => "i8",
    "unsigned char" => "u8",
    "short" => "i16",
    "unsigned short" => "u16",
    "int" => "i32",
    "unsigned int" => "u32",
    "long" => "i32",
    "unsigned long" => "u32",
    "long long" => "i64",
    "unsigned long long" => "u64",
    "float" => "f32",
    "double" => "f64",
    "string" => "string",
    "number" => "f64",
    "bigint" => "i64",
    "size_t" => "usize",
    "int8_t" => "i8",
    "int16_t" => "i16",
    "int32_t" => "i32",
    "int64_t" => "i64",
    "uint8_t" => "u8",
    "uint16_t" => "u16",
    "uint32_t" => "u32",
    "uint64_t" => "u64",
};

impl Dialect for AssemblyScript {
    const TARGET: Target = Target::AssemblyScript;
    const POINTER: &'static str = "usize";
    const REQUIRES_INITIALIZATION: bool = true;
    const UNIONS: bool = false;
    const LOWER_FOR_OF: bool = true;

    fn types() -> &'static phf::Map<&'static str, &'static str> {
        &TYPES
    }

    fn supports(feature: Feature) -> bool {
        matches!(
            feature,
            Feature::Classes
                | Feature::Generics
                | Feature::SourceMaps
                | Feature::RawMemory
                | Feature::BigInt
        )
    }

    fn integer(value: u64, _wide: bool) -> String {
        if value > u64::from(i32::MAX.unsigned_abs()) {
            if value > i64::MAX.unsigned_abs() {
                format!("<u64>{value}")
            } else {
                format!("<i64>{value}")
            }
        } else {
            value.to_string()
        }
    }

    fn sized_integer(value: u64, _class: ValueClass, ty: &str) -> String {
        if value > u64::from(i32::MAX.unsigned_abs()) {
            format!("<{ty}>{value}")
        } else {
            value.to_string()
        }
    }

    fn float(value: f64, single: bool) -> String {
        if single {
            format!("<f32>{}", format_float(value))
        } else {
            format_float(value)
        }
    }

    fn coerce(code: &str, to: ValueClass, from: LiteralKind, ty: &str) -> Option<String> {
        match (to, from) {
            (ValueClass::Integer | ValueClass::Wide, LiteralKind::Float | LiteralKind::Bool)
            | (ValueClass::Float, LiteralKind::Bool)
            | (ValueClass::Bool, LiteralKind::Integer | LiteralKind::Float) => {
                Some(format!("<{ty}>{code}"))
            }
            (ValueClass::String, LiteralKind::Integer | LiteralKind::Float | LiteralKind::Bool) => {
                Some(format!("({code}).toString()"))
            }
            _ => None,
        }
    }

    fn cast(code: &str, _to: ValueClass, ty: &str, _style: CastStyle) -> String {
        format!("<{ty}>{code}")
    }

    fn zero(class: ValueClass) -> Option<&'static str> {
        match class {
            ValueClass::Integer | ValueClass::Wide => Some("0"),
            ValueClass::Float => Some("0.0"),
            ValueClass::Bool => Some("false"),
            ValueClass::String => Some("\"\""),
            ValueClass::Other => None,
        }
    }

    /// Arrays are zeroed by the runtime.
    fn sized_array(element: &str, size: u64, _zero: Option<&str>) -> String {
        format!("new Array<{element}>({size})")
    }

    fn builtin_call(callee: &str, args: &[String]) -> Option<String> {
        Some(match (callee, args) {
            ("printf" | "puts", [first, ..]) => format!("console.log({first})"),
            ("malloc", [size]) => format!("heap.alloc({size})"),
            ("calloc", [count, size]) => format!("heap.alloc(({count}) * ({size}))"),
            ("realloc", [pointer, size]) => format!("heap.realloc({pointer}, {size})"),
            ("free", [pointer]) => format!("heap.free({pointer})"),
            _ => return None,
        })
    }

    fn sizeof(ty: &str, _size: Option<u32>) -> Option<String> {
        Some(format!("sizeof<{ty}>()"))
    }

    fn delete(operand: &str, _member: bool) -> Option<String> {
        Some(format!("heap.free(changetype<usize>({operand}))"))
    }

    fn address_of(operand: &str) -> Option<String> {
        Some(format!("changetype<usize>({operand})"))
    }

    fn binary(op: BinaryOperator, _strict: bool) -> &'static str {
        op.as_str()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{cancel::CancellationToken, parser::test_utils::parse_program};

    fn generate(src: &str) -> GenerationOutput {
        let (interner, program) = parse_program(src);
        let cancel = CancellationToken::new();
        let options = GenerationOptions::default();
        let ctx = GenerationContext {
            interner: &interner,
            options: &options,
            filename: "main.wc",
            source: src,
            cancel: &cancel,
        };
        AssemblyScriptGenerator.generate(&program, &ctx).unwrap()
    }

    fn body(output: &GenerationOutput) -> &str {
        output
            .code
            .strip_prefix("// Generated by worldc from main.wc\n\n")
            .unwrap()
    }

    #[test]
    fn float_into_integer_is_cast() {
        let output = generate("int x = 1.5;");
        assert_eq!(body(&output), "let x: i32 = <i32>1.5;\n");
    }

    #[test]
    fn numeric_literals() {
        let output = generate(indoc! {"
            long long big = 3000000000;
            int small = 7;
            float ratio = 0.5f;
            double whole = 2.0;
        "});
        assert_eq!(
            body(&output),
            indoc! {"
                let big: i64 = <i64>3000000000;
                let small: i32 = 7;
                let ratio: f32 = <f32>0.5;
                let whole: f64 = 2.0;
            "}
        );
    }

    #[test]
    fn large_literals_take_the_binding_type() {
        let output = generate(indoc! {"
            unsigned int u = 3000000000;
            int i = 3000000000;
            long long w = 3000000000;
            long long n = -3000000000;
        "});
        assert_eq!(
            body(&output),
            indoc! {"
                let u: u32 = <u32>3000000000;
                let i: i32 = <i32>3000000000;
                let w: i64 = <i64>3000000000;
                let n: i64 = -<i64>3000000000;
            "}
        );
    }

    #[test]
    fn assignments_and_arguments_are_cast() {
        let output = generate(indoc! {"
            int add(int a, int b) { return a + b; }
            class Counter {
              int hits;
              void reset() { this.hits = 2.5; }
            };
            int run() {
              int x = 0;
              x = 1.5;
              x += 2;
              unsigned int big;
              big = 3000000000;
              return add(1, 2.5);
            }
        "});
        let code = body(&output);
        assert!(code.contains("    this.hits = <i32>2.5;\n"));
        assert!(code.contains("  x = <i32>1.5;\n"));
        assert!(code.contains("  x += 2;\n"));
        assert!(code.contains("  big = <u32>3000000000;\n"));
        assert!(code.contains("  return add(1, <i32>2.5);\n"));
        assert_eq!(output.warnings, Vec::new());
    }

    #[test]
    fn uninitialized_bindings_get_zero_values() {
        let output = generate("int count; double scale; bool ready; string label; int grid[4];");
        assert_eq!(
            body(&output),
            indoc! {r#"
                let count: i32 = 0;
                let scale: f64 = 0.0;
                let ready: bool = false;
                let label: string = "";
                let grid: i32[] = new Array<i32>(4);
            "#}
        );
    }

    #[test]
    fn raw_allocations_are_released_by_dispose() {
        let output = generate(indoc! {"
            class Buffer {
              Buffer(int size) : data(malloc(size)) {
                scratch = malloc(16);
              }
              ~Buffer() { printf(\"bye\"); }
              void* data;
              void* scratch;
              int size;
            };
        "});
        assert_eq!(
            body(&output),
            indoc! {r#"
                class Buffer {
                  constructor(size: i32) {
                    this.data = heap.alloc(size);
                    scratch = heap.alloc(16);
                  }
                  data: usize = 0;
                  scratch: usize = 0;
                  size: i32 = 0;
                  dispose(): void {
                    console.log("bye");
                    heap.free(this.data);
                    heap.free(this.scratch);
                  }
                }
            "#}
        );
    }

    #[test]
    fn for_of_is_lowered_to_an_indexed_loop() {
        let output = generate(indoc! {"
            function total(xs: i32[]): i32 {
              let sum: i32 = 0;
              for (const x of xs) { sum += x; }
              return sum;
            }
        "});
        assert_eq!(
            body(&output),
            indoc! {"
                function total(xs: i32[]): i32 {
                  let sum: i32 = 0;
                  for (let __i0 = 0; __i0 < xs.length; __i0++) {
                    const x = xs[__i0];
                    sum += x;
                  }
                  return sum;
                }
            "}
        );
    }

    #[test]
    fn unsupported_constructs_degrade_with_warnings() {
        let output = generate(indoc! {"
            void run() {
              try { step(); } catch (e) { recover(); }
              let f = (a: i32) => a + 1;
            }
        "});
        assert_eq!(
            body(&output),
            indoc! {"
                function run(): void {
                  {
                    step();
                  }
                  let f = (a: i32) => a + 1;
                }
            "}
        );
        let messages: Vec<&str> = output.warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "AssemblyScript does not support exception handlers",
                "AssemblyScript does not support closures",
            ]
        );
    }

    #[test]
    fn memory_builtins() {
        let output = generate("void f() { int* p = calloc(4, sizeof(int)); free(p); }");
        assert!(output
            .code
            .contains("let p: usize = heap.alloc((4) * (sizeof<i32>()));"));
        assert!(output.code.contains("heap.free(p);"));
    }

    #[test]
    fn rejects_typescript_only_options() {
        let options = GenerationOptions {
            declarations: true,
            ..GenerationOptions::default()
        };
        assert_eq!(
            AssemblyScriptGenerator.validate_options(&options).unwrap_err().to_string(),
            "invalid options for assemblyscript: type declarations are only generated for TypeScript"
        );
    }
}
