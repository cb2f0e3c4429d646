//! Copybook reader.
//!
//! Builds a flat field list from COBOL data description entries such as
//!
//! ```text
//!        01  CUSTOMER-RECORD.
//!            05  CUST-ID        PIC 9(6).
//!            05  CUST-NAME      PIC X(20).
//!            05  FILLER         PIC X(4).
//!            05  CUST-BALANCE   PIC S9(7)V9(2).
//! ```
//!
//! Only elementary DISPLAY items are mapped. Group items contribute no
//! storage of their own and level-88 condition names are ignored. Entries
//! that would change the shape of the record (OCCURS, REDEFINES, RENAMES,
//! binary or packed usage) or how a field is padded (JUSTIFIED) are
//! rejected.

use crate::error::RecordError;
use crate::layout::RecordLayout;
use crate::Result;

/// An elementary item read from a copybook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopybookField {
    /// Level number (01-49 or 77).
    pub level: u8,
    /// Data name; unnamed and FILLER items are numbered `FILLER-1`, `FILLER-2`, ...
    pub name: String,
    /// The PICTURE string as written.
    pub picture: String,
    /// 1-based line the entry starts on.
    pub line: usize,
}

#[derive(Debug, Clone)]
struct Token {
    text: String,
    line: usize,
}

/// Parse copybook text into its elementary fields, in declaration order.
pub fn parse_copybook(text: &str) -> Result<Vec<CopybookField>> {
    let tokens = tokenize(text);
    let mut fields = Vec::new();
    let mut fillers = 0usize;

    for entry in split_entries(tokens)? {
        let mut parser = EntryParser::new(&entry);
        let Some(item) = parser.parse_entry()? else {
            continue;
        };
        let Some(picture) = item.picture else {
            continue;
        };

        let name = match item.name {
            Some(name) => name,
            None => {
                fillers += 1;
                format!("FILLER-{fillers}")
            }
        };

        tracing::trace!(level = item.level, name = %name, picture = %picture, "Copybook field");
        fields.push(CopybookField {
            level: item.level,
            name,
            picture,
            line: item.line,
        });
    }

    tracing::debug!(fields = fields.len(), "Copybook parsed");
    Ok(fields)
}

impl RecordLayout {
    /// Build a layout from copybook text.
    pub fn from_copybook(text: &str) -> Result<Self> {
        let fields = parse_copybook(text)?;
        RecordLayout::new(fields.into_iter().map(|f| (f.name, f.picture)))
    }
}

// ============================================================================
// Source handling
// ============================================================================

/// Strip comments and sequence areas, then split into tokens.
///
/// Quoted literals stay in one token.
fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let Some(line) = source_area(raw) else {
            continue;
        };
        let line_no = i + 1;

        let mut current = String::new();
        let mut quote: Option<char> = None;
        for ch in line.chars() {
            match quote {
                Some(q) => {
                    current.push(ch);
                    if ch == q {
                        quote = None;
                    }
                }
                None if ch == '"' || ch == '\'' => {
                    current.push(ch);
                    quote = Some(ch);
                }
                None if ch.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(Token {
                            text: std::mem::take(&mut current),
                            line: line_no,
                        });
                    }
                }
                None => current.push(ch),
            }
        }
        if !current.is_empty() {
            tokens.push(Token {
                text: current,
                line: line_no,
            });
        }
    }

    tokens
}

/// The code portion of a source line, or `None` for comment and blank lines.
///
/// Lines whose first six columns are all digits are treated as fixed form:
/// the sequence area and anything past column 72 are dropped and column 7
/// is the indicator. Otherwise a line whose first non-blank character is
/// `*` is a comment.
fn source_area(line: &str) -> Option<&str> {
    let fixed = line.len() >= 7 && line.as_bytes()[..6].iter().all(u8::is_ascii_digit);

    let code = if fixed {
        if matches!(line.as_bytes()[6], b'*' | b'/') {
            return None;
        }
        let end = line.len().min(72);
        line.get(7..end).unwrap_or("")
    } else {
        if line.trim_start().starts_with('*') {
            return None;
        }
        line
    };

    let code = match code.find("*>") {
        Some(pos) => &code[..pos],
        None => code,
    };

    let code = code.trim();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Group tokens into period-terminated entries.
fn split_entries(tokens: Vec<Token>) -> Result<Vec<Vec<Token>>> {
    let mut entries = Vec::new();
    let mut current: Vec<Token> = Vec::new();

    for mut token in tokens {
        let ends_entry = token.text.ends_with('.') && !is_open_literal(&token.text);
        if ends_entry {
            token.text.pop();
            if !token.text.is_empty() {
                current.push(token);
            }
            if !current.is_empty() {
                entries.push(std::mem::take(&mut current));
            }
        } else {
            current.push(token);
        }
    }

    if let Some(first) = current.first() {
        return Err(RecordError::Copybook {
            line: first.line,
            message: "entry is not terminated by a period".to_string(),
        });
    }
    Ok(entries)
}

/// Whether a token is a quoted literal missing its closing quote.
fn is_open_literal(text: &str) -> bool {
    match text.chars().next() {
        Some(q @ ('"' | '\'')) => text.len() < 2 || !text[..text.len() - 1].ends_with(q),
        _ => false,
    }
}

// ============================================================================
// Entry parsing
// ============================================================================

struct ParsedEntry {
    level: u8,
    name: Option<String>,
    picture: Option<String>,
    line: usize,
}

struct EntryParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> EntryParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.current();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, word: &str) -> bool {
        self.current()
            .is_some_and(|t| t.text.eq_ignore_ascii_case(word))
    }

    fn skip_optional(&mut self, word: &str) {
        if self.check(word) {
            self.advance();
        }
    }

    fn line(&self) -> usize {
        self.current()
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.line)
    }

    fn error(&self, message: impl Into<String>) -> RecordError {
        RecordError::Copybook {
            line: self.line(),
            message: message.into(),
        }
    }

    /// Parse one entry. Returns `None` for entries that carry no field.
    fn parse_entry(&mut self) -> Result<Option<ParsedEntry>> {
        let line = self.line();
        let level_token = self
            .advance()
            .ok_or_else(|| self.error("empty entry"))?;
        let level: u8 = level_token
            .text
            .parse()
            .map_err(|_| self.error(format!("expected level number, found {}", level_token.text)))?;

        match level {
            88 => return Ok(None),
            66 => return Err(self.error("RENAMES (level 66) is not supported")),
            1..=49 | 77 => {}
            _ => return Err(self.error(format!("invalid level number {level}"))),
        }

        let name = match self.current() {
            Some(t) if t.text.eq_ignore_ascii_case("FILLER") => {
                self.advance();
                None
            }
            Some(t) if !is_clause_keyword(&t.text) => {
                self.advance();
                Some(t.text.to_uppercase())
            }
            _ => None,
        };

        let mut picture = None;
        while let Some(token) = self.advance() {
            let word = token.text.to_uppercase();
            match word.as_str() {
                "PIC" | "PICTURE" => {
                    self.skip_optional("IS");
                    let clause = self
                        .advance()
                        .ok_or_else(|| self.error("PICTURE clause without a picture string"))?;
                    picture = Some(clause.text.clone());
                }
                "USAGE" => {
                    self.skip_optional("IS");
                    let usage = self
                        .advance()
                        .ok_or_else(|| self.error("USAGE clause without a usage"))?;
                    if !usage.text.eq_ignore_ascii_case("DISPLAY") {
                        return Err(self.error(format!("USAGE {} is not supported", usage.text)));
                    }
                }
                "DISPLAY" => {}
                "VALUE" | "VALUES" => {
                    self.skip_optional("IS");
                    self.skip_optional("ARE");
                    self.advance();
                }
                "OCCURS" | "REDEFINES" | "RENAMES" | "JUST" | "JUSTIFIED" => {
                    return Err(self.error(format!("{word} is not supported")));
                }
                w if is_binary_usage(w) => {
                    return Err(self.error(format!("USAGE {w} is not supported")));
                }
                w if is_ignored_phrase(w) => {}
                _ => return Err(self.error(format!("unexpected word {}", token.text))),
            }
        }

        Ok(Some(ParsedEntry {
            level,
            name,
            picture,
            line,
        }))
    }
}

fn is_clause_keyword(word: &str) -> bool {
    let upper = word.to_uppercase();
    matches!(
        upper.as_str(),
        "PIC" | "PICTURE" | "USAGE" | "DISPLAY" | "VALUE" | "VALUES" | "OCCURS" | "REDEFINES"
    ) || is_binary_usage(&upper)
}

fn is_binary_usage(word: &str) -> bool {
    matches!(
        word,
        "COMP"
            | "COMP-1"
            | "COMP-2"
            | "COMP-3"
            | "COMP-4"
            | "COMP-5"
            | "COMPUTATIONAL"
            | "COMPUTATIONAL-1"
            | "COMPUTATIONAL-2"
            | "COMPUTATIONAL-3"
            | "COMPUTATIONAL-4"
            | "COMPUTATIONAL-5"
            | "BINARY"
            | "PACKED-DECIMAL"
            | "INDEX"
            | "POINTER"
    )
}

/// Phrases that do not change storage shape.
fn is_ignored_phrase(word: &str) -> bool {
    matches!(
        word,
        "IS" | "RIGHT"
            | "LEFT"
            | "SYNC"
            | "SYNCHRONIZED"
            | "SIGN"
            | "LEADING"
            | "TRAILING"
            | "SEPARATE"
            | "CHARACTER"
            | "BLANK"
            | "WHEN"
            | "ZERO"
            | "ZEROS"
            | "ZEROES"
            | "GLOBAL"
            | "EXTERNAL"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picture::FieldKind;

    const CUSTOMER: &str = "\
      * Customer master record
       01  CUSTOMER-RECORD.
           05  CUST-ID        PIC 9(6).
           05  CUST-NAME      PIC X(20).
           05  FILLER         PIC X(4).
           05  CUST-STATUS    PIC X(1) VALUE 'A'.
               88  CUST-ACTIVE    VALUE 'A'.
           05  CUST-BALANCE   PIC S9(7)V9(2) USAGE IS DISPLAY.
";

    #[test]
    fn test_parse_customer() {
        let fields = parse_copybook(CUSTOMER).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["CUST-ID", "CUST-NAME", "FILLER-1", "CUST-STATUS", "CUST-BALANCE"]
        );
        assert_eq!(fields[0].picture, "9(6)");
        assert_eq!(fields[0].level, 5);
        assert_eq!(fields[0].line, 3);
        assert_eq!(fields[4].picture, "S9(7)V9(2)");
    }

    #[test]
    fn test_layout_from_copybook() {
        let layout = RecordLayout::from_copybook(CUSTOMER).unwrap();
        assert_eq!(layout.total_width(), 6 + 20 + 4 + 1 + 10);
        let balance = layout.field("CUST-BALANCE").unwrap();
        assert_eq!(balance.offset, 31);
        assert_eq!(balance.kind(), FieldKind::Numeric);
        assert_eq!(balance.spec.implied_decimal_digits, Some(2));
    }

    #[test]
    fn test_fixed_form_sequence_area() {
        let text = "\
000100 01  REC.
000200     05  A    PIC X(2).
000300*    05  B    PIC X(9).
000400     05  C    PIC 9(3).
";
        let fields = parse_copybook(text).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_inline_comment_and_multiline_entry() {
        let text = "01 REC. *> record\n   05 AMOUNT\n      PICTURE IS 9(5).\n";
        let fields = parse_copybook(text).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "AMOUNT");
        assert_eq!(fields[0].picture, "9(5)");
        assert_eq!(fields[0].line, 2);
    }

    #[test]
    fn test_quoted_value_with_period() {
        let text = "01 REC.\n 05 T PIC X(4) VALUE 'A. B'.\n 05 N PIC 9(2).\n";
        let fields = parse_copybook(text).unwrap();
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_rejects_occurs() {
        let text = "01 REC.\n 05 ITEMS PIC X(3) OCCURS 4 TIMES.\n";
        let err = parse_copybook(text).unwrap_err();
        assert!(matches!(err, RecordError::Copybook { line: 2, .. }));
    }

    #[test]
    fn test_rejects_justified() {
        let text = "01 REC.\n 05 CODE PIC X(4).\n 05 NAME PIC X(8) JUSTIFIED RIGHT.\n";
        let err = parse_copybook(text).unwrap_err();
        assert!(matches!(err, RecordError::Copybook { line: 3, .. }));
        assert!(err.to_string().contains("JUSTIFIED"));

        let err = parse_copybook("01 REC.\n 05 NAME PIC X(8) JUST.\n").unwrap_err();
        assert!(err.to_string().contains("JUST is not supported"));
    }

    #[test]
    fn test_rejects_packed_usage() {
        let err = parse_copybook("01 REC.\n 05 AMT PIC S9(5) COMP-3.\n").unwrap_err();
        assert!(err.to_string().contains("COMP-3"));
    }

    #[test]
    fn test_rejects_unterminated_entry() {
        let err = parse_copybook("01 REC.\n 05 A PIC X(2)\n").unwrap_err();
        assert!(matches!(err, RecordError::Copybook { line: 2, .. }));
    }

    #[test]
    fn test_bad_picture_surfaces_as_pic_error() {
        let err = RecordLayout::from_copybook("01 REC.\n 05 A PIC 9999.\n").unwrap_err();
        assert!(matches!(err, RecordError::PicFormat { .. }));
    }

    #[test]
    fn test_unnamed_filler() {
        let fields = parse_copybook("01 REC.\n 05 PIC X(2).\n 05 FILLER PIC X(1).\n").unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["FILLER-1", "FILLER-2"]);
    }
}
