//! LookML formatting utilities.
//!
//! Provides string quoting, identifier checks, and indentation management.

/// Escape a string for use inside a double-quoted LookML value.
#[must_use]
pub fn escape_lookml_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' | '\r' => result.push(' '),
            c => result.push(c),
        }
    }
    result
}

/// Quote a string value with double quotes.
#[must_use]
pub fn quote_string(s: &str) -> String {
    format!("\"{}\"", escape_lookml_string(s))
}

/// Check if a string is usable as a LookML field or view name.
///
/// Names are lowercase letters, digits, and underscores, not starting with
/// a digit.
#[must_use]
pub fn is_valid_lookml_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Collapse SQL onto one line so it fits before the `;;` terminator.
#[must_use]
pub fn single_line_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Indentation style for emitted LookML.
#[derive(Debug, Clone)]
pub enum Indent {
    Tabs,
    Spaces(usize),
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(2)
    }
}

impl Indent {
    #[must_use]
    pub fn to_string_owned(&self) -> String {
        match self {
            Indent::Tabs => "\t".to_string(),
            Indent::Spaces(n) => " ".repeat(*n),
        }
    }
}

/// A writer that manages indentation for LookML output.
pub struct IndentWriter {
    buffer: String,
    indent_str: String,
    current_indent: usize,
}

impl IndentWriter {
    #[must_use]
    pub fn new(indent: Indent) -> Self {
        Self {
            buffer: String::new(),
            indent_str: indent.to_string_owned(),
            current_indent: 0,
        }
    }

    pub fn indent(&mut self) {
        self.current_indent += 1;
    }

    pub fn dedent(&mut self) {
        self.current_indent = self.current_indent.saturating_sub(1);
    }

    /// Write a complete line (with newline at end).
    pub fn write_line(&mut self, s: &str) {
        for _ in 0..self.current_indent {
            self.buffer.push_str(&self.indent_str);
        }
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    pub fn write_comment(&mut self, comment: &str) {
        self.write_line(&format!("# {}", comment));
    }

    /// Open a `keyword: name {` block and indent.
    pub fn open_block(&mut self, keyword: &str, name: &str) {
        self.write_line(&format!("{}: {} {{", keyword, name));
        self.indent();
    }

    /// Dedent and close the current block.
    pub fn close_block(&mut self) {
        self.dedent();
        self.write_line("}");
    }

    /// `key: value`
    pub fn property(&mut self, key: &str, value: &str) {
        self.write_line(&format!("{}: {}", key, value));
    }

    /// `key: "value"`
    pub fn string_property(&mut self, key: &str, value: &str) {
        self.property(key, &quote_string(value));
    }

    /// `key: sql ;;`
    pub fn sql_property(&mut self, key: &str, sql: &str) {
        self.write_line(&format!("{}: {} ;;", key, single_line_sql(sql)));
    }

    /// `key: [a, b, c]`
    pub fn list_property(&mut self, key: &str, items: &[String]) {
        self.write_line(&format!("{}: [{}]", key, items.join(", ")));
    }

    /// Consume the writer and return the final string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl Default for IndentWriter {
    fn default() -> Self {
        Self::new(Indent::default())
    }
}
