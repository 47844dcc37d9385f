//! Line classification for instrumentation
//!
//! A capture suspends the running function, which is only legal inside a
//! suspending (`async`) function or at top level. [`suspension_map`] walks the
//! host text once, tracking brace depth outside strings and comments, and
//! marks every line that lies in the body of a plain `function` or a
//! multi-line plain arrow function. Those lines are never stepped through.

use crate::transpile::HostProgram;
use serde::Serialize;

/// What a host line is, as far as instrumentation cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LineKind {
    Blank,
    Comment,
    /// Inside (or opening) the body of a non-suspending function
    NonSuspendingBody,
    Executable,
}

/// Classification of every host line, indexed from 1
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LineMap {
    kinds: Vec<LineKind>,
}

impl LineMap {
    pub fn kind(&self, line: usize) -> Option<LineKind> {
        line.checked_sub(1).and_then(|i| self.kinds.get(i)).copied()
    }

    pub fn is_executable(&self, line: usize) -> bool {
        self.kind(line) == Some(LineKind::Executable)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Lines with their 1-based numbers
    pub fn iter(&self) -> impl Iterator<Item = (usize, LineKind)> + '_ {
        self.kinds.iter().enumerate().map(|(i, kind)| (i + 1, *kind))
    }
}

/// Scanner state carried from one line to the next
#[derive(Default)]
struct Scanner {
    depth: usize,
    in_block_comment: bool,
    /// Backtick strings may span lines
    in_template: bool,
    /// Depths of open non-suspending bodies, innermost last
    plain_bodies: Vec<usize>,
    /// The next `{` opens a non-suspending body
    header_pending: bool,
    /// `async` was seen and not yet consumed by a function or arrow
    async_pending: bool,
}

/// What one line contained
#[derive(Default)]
struct LineScan {
    code: bool,
    comment: bool,
    opened: Vec<usize>,
}

/// Classify every line of `host`
pub fn suspension_map(host: &HostProgram) -> LineMap {
    let mut scanner = Scanner::default();
    let kinds = host
        .source
        .lines()
        .map(|line| {
            let inside_at_start = !scanner.plain_bodies.is_empty();
            let scan = scanner.scan_line(line);
            let still_open = scan
                .opened
                .iter()
                .any(|depth| scanner.plain_bodies.contains(depth));

            if scan.code {
                if inside_at_start || still_open {
                    LineKind::NonSuspendingBody
                } else {
                    LineKind::Executable
                }
            } else if scan.comment {
                LineKind::Comment
            } else {
                LineKind::Blank
            }
        })
        .collect();
    LineMap { kinds }
}

impl Scanner {
    fn scan_line(&mut self, line: &str) -> LineScan {
        let chars: Vec<char> = line.chars().collect();
        let mut scan = LineScan::default();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            if self.in_block_comment {
                scan.comment = true;
                if c == '*' && next == Some('/') {
                    self.in_block_comment = false;
                    i += 1;
                }
                i += 1;
                continue;
            }
            if self.in_template {
                scan.code = true;
                match c {
                    '\\' => i += 1,
                    '`' => self.in_template = false,
                    _ => {}
                }
                i += 1;
                continue;
            }

            match (c, next) {
                ('/', Some('/')) => {
                    scan.comment = true;
                    break;
                }
                ('/', Some('*')) => {
                    scan.comment = true;
                    self.in_block_comment = true;
                    i += 2;
                    continue;
                }
                _ => {}
            }

            if c.is_whitespace() {
                i += 1;
                continue;
            }
            scan.code = true;

            match c {
                '"' | '\'' => i = skip_string(&chars, i),
                '`' => self.in_template = true,
                '{' => {
                    self.depth += 1;
                    if self.header_pending {
                        self.header_pending = false;
                        self.plain_bodies.push(self.depth);
                        scan.opened.push(self.depth);
                    }
                    self.async_pending = false;
                }
                '}' => {
                    if self.plain_bodies.last() == Some(&self.depth) {
                        self.plain_bodies.pop();
                    }
                    self.depth = self.depth.saturating_sub(1);
                    self.async_pending = false;
                }
                ';' => self.async_pending = false,
                '=' if next == Some('>') => {
                    let body_is_block = chars[i + 2..]
                        .iter()
                        .find(|c| !c.is_whitespace())
                        .is_some_and(|c| *c == '{');
                    if body_is_block && !self.async_pending {
                        self.header_pending = true;
                    }
                    self.async_pending = false;
                    i += 1;
                }
                c if c.is_alphabetic() || c == '_' || c == '$' => {
                    let start = i;
                    while i + 1 < chars.len()
                        && (chars[i + 1].is_alphanumeric() || chars[i + 1] == '_' || chars[i + 1] == '$')
                    {
                        i += 1;
                    }
                    let word: String = chars[start..=i].iter().collect();
                    match word.as_str() {
                        "async" => self.async_pending = true,
                        "function" => {
                            if !self.async_pending {
                                self.header_pending = true;
                            }
                            self.async_pending = false;
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
            i += 1;
        }

        scan
    }
}

/// Index of the closing quote of the string starting at `start`, or the last
/// character of the line when it is unterminated
fn skip_string(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            c if c == quote => return i,
            _ => {}
        }
        i += 1;
    }
    chars.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::transpile::transpile;
    use pretty_assertions::assert_eq;
    use LineKind::*;

    fn kinds(source: &str) -> Vec<LineKind> {
        suspension_map(&transpile(source, Language::JavaScript))
            .iter()
            .map(|(_, kind)| kind)
            .collect()
    }

    #[test]
    fn test_plain_function_body_is_excluded() {
        let source = "function helper(a) {\n  let b = a + 1;\n\n  return b;\n}\nlet x = helper(1);\n";
        assert_eq!(
            kinds(source),
            vec![NonSuspendingBody, NonSuspendingBody, Blank, NonSuspendingBody, NonSuspendingBody, Executable]
        );
    }

    #[test]
    fn test_async_function_body_is_executable() {
        let source = "async function main() {\n  // setup\n  let n = 1;\n}\n";
        assert_eq!(kinds(source), vec![Executable, Comment, Executable, Executable]);
    }

    #[test]
    fn test_multi_line_arrow_and_one_line_arrow() {
        let source = "let ys = xs.map(x => x * 2);\nxs.forEach(x => {\n  total += x;\n});\nlet f = async () => {\n  await g();\n};\n";
        assert_eq!(
            kinds(source),
            vec![Executable, NonSuspendingBody, NonSuspendingBody, NonSuspendingBody, Executable, Executable, Executable]
        );
    }

    #[test]
    fn test_braces_in_strings_and_comments_are_ignored() {
        let source = "function f() {\n  let s = \"}\"; /* } */\n}\nlet t = '{';\n";
        assert_eq!(
            kinds(source),
            vec![NonSuspendingBody, NonSuspendingBody, NonSuspendingBody, Executable]
        );
    }

    #[test]
    fn test_block_comment_spanning_lines() {
        let source = "/* header\n   still comment */\nlet a = 1;\n";
        assert_eq!(kinds(source), vec![Comment, Comment, Executable]);
    }
}
