//! Version 3 source maps.
//!
//! Every segment carries four fields (generated column, source index,
//! source line, source column), each stored as a base64 VLQ delta against
//! the previous segment. Generated columns reset on every line.

use serde::{Deserialize, Serialize};

use crate::token::Position;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub source_root: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A mapping from a generated position to an original one. All fields are
/// 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mapping {
    generated_line: u32,
    generated_column: u32,
    source_line: u32,
    source_column: u32,
}

#[derive(Debug)]
pub struct SourceMapBuilder {
    file: String,
    source: String,
    content: String,
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    pub fn new(file: impl Into<String>, source: impl Into<String>, content: impl Into<String>) -> Self {
        SourceMapBuilder {
            file: file.into(),
            source: source.into(),
            content: content.into(),
            mappings: Vec::with_capacity(64),
        }
    }

    /// Records that the generated position (0-based line and column) comes
    /// from the provided source position.
    pub fn add(&mut self, generated_line: u32, generated_column: u32, original: Position) {
        let mapping = Mapping {
            generated_line,
            generated_column,
            source_line: original.line.saturating_sub(1),
            source_column: original.column.saturating_sub(1),
        };
        // Only the first segment at a given position is meaningful.
        if self.mappings.last().is_some_and(|last| {
            last.generated_line == generated_line && last.generated_column == generated_column
        }) {
            return;
        }
        self.mappings.push(mapping);
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn finish(mut self) -> SourceMap {
        self.mappings
            .sort_by_key(|m| (m.generated_line, m.generated_column));

        let mut mappings = String::with_capacity(self.mappings.len() * 6);
        let mut line = 0;
        let mut prev_column = 0;
        let mut prev_source_line = 0;
        let mut prev_source_column = 0;
        let mut first_in_line = true;

        for mapping in &self.mappings {
            while line < mapping.generated_line {
                mappings.push(';');
                line += 1;
                prev_column = 0;
                first_in_line = true;
            }
            if !first_in_line {
                mappings.push(',');
            }
            first_in_line = false;

            encode_vlq(delta(mapping.generated_column, prev_column), &mut mappings);
            // Single source, index is always zero.
            encode_vlq(0, &mut mappings);
            encode_vlq(delta(mapping.source_line, prev_source_line), &mut mappings);
            encode_vlq(delta(mapping.source_column, prev_source_column), &mut mappings);

            prev_column = mapping.generated_column;
            prev_source_line = mapping.source_line;
            prev_source_column = mapping.source_column;
        }

        SourceMap {
            version: 3,
            file: self.file,
            source_root: String::new(),
            sources: vec![self.source],
            sources_content: vec![self.content],
            names: Vec::new(),
            mappings,
        }
    }
}

fn delta(current: u32, previous: u32) -> i64 {
    i64::from(current) - i64::from(previous)
}

/// Appends the base64 VLQ encoding of `value`. The sign lives in the least
/// significant bit; each digit holds five bits plus a continuation bit.
pub fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        (value.unsigned_abs() << 1) | 1
    } else {
        value.unsigned_abs() << 1
    };
    loop {
        let mut digit = (vlq & 0b1_1111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b10_0000;
        }
        out.push(char::from(BASE64[digit]));
        if vlq == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn vlq(value: i64) -> String {
        let mut out = String::new();
        encode_vlq(value, &mut out);
        out
    }

    #[test]
    fn vlq_digits() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(15), "e");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(123), "2H");
        assert_eq!(vlq(-1000), "x+B");
    }

    #[test]
    fn mappings() {
        let mut builder = SourceMapBuilder::new("main.ts", "main.wc", "int x = 1;\nint y;");
        builder.add(0, 0, Position::new(1, 1, 0));
        builder.add(0, 0, Position::new(1, 5, 4));
        builder.add(2, 2, Position::new(2, 1, 11));
        builder.add(2, 10, Position::new(2, 5, 15));
        assert_eq!(builder.len(), 3);

        let map = builder.finish();
        assert_eq!(map.mappings, "AAAA;;EACA,QAAI");
        assert_eq!(
            map.to_json().unwrap(),
            concat!(
                r#"{"version":3,"file":"main.ts","sourceRoot":"","sources":["main.wc"],"#,
                r#""sourcesContent":["int x = 1;\nint y;"],"names":[],"#,
                r#""mappings":"AAAA;;EACA,QAAI"}"#,
            )
        );
    }
}
