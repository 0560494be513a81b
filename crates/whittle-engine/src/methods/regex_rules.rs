//! The bulk rewrite catalogue.
//!
//! Two ordered rule tables drive most of the reduction. *Plain* rules
//! apply wherever their pattern matches the buffer at the current
//! position. *Delimited* rules additionally require a border character
//! or whitespace on both flanks of the match, so they fire on whole
//! tokens only. Rules whose pattern is regular are bytes regexes
//! anchored at the position; rules involving balanced brackets or
//! expression shapes delegate to the pattern catalogue.

use regex::bytes::Regex;

use whittle_core::pattern::{self, Shape};

use crate::error::EngineError;
use crate::harness::Enlarge;
use crate::methods::{Reduction, Step, TrialCtx};
use crate::stats::RuleTable;

enum Pat {
    /// Anchored regex match.
    Re(Regex),
    /// Balanced `( ... )` run.
    Parens,
    /// Balanced `{ ... }` run.
    Braces,
    /// `= { ... }` initializer.
    BraceInit,
    /// `if ( ... )` header.
    IfParens,
    /// A full function definition, name captured freely.
    FuncDef,
    /// A call, optionally with a trailing comma.
    Call { comma: bool },
    /// An expression shape from the rewrite grid, optionally wrapped in
    /// a leading or trailing comma.
    Shape {
        shape: Shape,
        trailing_comma: bool,
        leading_comma: bool,
    },
}

struct Rule {
    pat: Pat,
    repl: &'static [u8],
}

impl Rule {
    fn new(pat: Pat, repl: &'static [u8]) -> Self {
        Self { pat, repl }
    }

    fn re(src: &str, repl: &'static [u8]) -> Self {
        let re = Regex::new(&format!(r"\A(?:{src})")).expect("hand-written rule pattern");
        Self::new(Pat::Re(re), repl)
    }

    /// End of this rule's match at `pos`, if any.
    fn match_end(&self, buf: &[u8], pos: usize) -> Option<usize> {
        match &self.pat {
            Pat::Re(re) => re.find(buf.get(pos..)?).map(|m| pos + m.end()),
            Pat::Parens => pattern::balanced(buf, pos, b'(', b')').map(|c| c + 1),
            Pat::Braces => pattern::balanced(buf, pos, b'{', b'}').map(|c| c + 1),
            Pat::BraceInit => {
                if buf.get(pos) != Some(&b'=') {
                    return None;
                }
                let p = pattern::skip_ws(buf, pos + 1);
                pattern::balanced(buf, p, b'{', b'}').map(|c| c + 1)
            }
            Pat::IfParens => {
                if !buf.get(pos..)?.starts_with(b"if") {
                    return None;
                }
                let p = pattern::skip_ws(buf, pos + 2);
                pattern::balanced(buf, p, b'(', b')').map(|c| c + 1)
            }
            Pat::FuncDef => pattern::function_def(buf, pos, None).map(|m| m.end),
            Pat::Call { comma } => {
                let m = pattern::call(buf, pos)?;
                if *comma {
                    let p = pattern::skip_ws(buf, m.end);
                    (buf.get(p) == Some(&b',')).then(|| p + 1)
                } else {
                    Some(m.end)
                }
            }
            Pat::Shape {
                shape,
                trailing_comma,
                leading_comma,
            } => {
                let mut p = pos;
                if *leading_comma {
                    if buf.get(p) != Some(&b',') {
                        return None;
                    }
                    p = pattern::skip_ws(buf, p + 1);
                }
                let end = pattern::shape(buf, p, *shape)?;
                if *trailing_comma {
                    let p = pattern::skip_ws(buf, end);
                    (buf.get(p) == Some(&b',')).then(|| p + 1)
                } else {
                    Some(end)
                }
            }
        }
    }
}

fn plain_rules() -> Vec<Rule> {
    vec![
        Rule::new(Pat::Parens, b""),
        Rule::new(Pat::Braces, b""),
        Rule::new(Pat::BraceInit, b""),
        Rule::re(r":\s*[0-9]+\s*;", b";"),
        Rule::re(r";", b""),
        Rule::re(r"\^=|\|=|&=|\+=|-=|\*=|/=|%=|<<=|>>=", b"="),
        Rule::re(r"[+!~-]", b""),
        Rule::re(r#""[^"]*""#, b""),
        Rule::re(r#""[^"]*","#, b""),
    ]
}

fn delimited_rules() -> Vec<Rule> {
    let mut rules = vec![
        Rule::re(r"[+-]?[0-9A-Za-z_]+\s*:", b""),
        Rule::re(r"goto\s+[+-]?[0-9A-Za-z_]+\s*;", b""),
        Rule::re(r"signed", b"int"),
        Rule::re(r"unsigned", b"int"),
        Rule::re(r"short", b"int"),
        Rule::re(r"long", b"int"),
        Rule::re(r"char", b"int"),
        Rule::re(r"int\s+argc\s*,\s*char\s*\*\s*argv\s*\[\s*\]", b"void"),
        Rule::re(r"int\s[^;]*;", b""),
        Rule::re(r"for", b""),
        Rule::new(Pat::IfParens, b""),
        Rule::re(r"struct\s[^;]*;", b""),
        Rule::re(r"union\s[^;]*;", b""),
        Rule::new(Pat::FuncDef, b""),
        Rule::new(Pat::Call { comma: true }, b"0"),
        Rule::new(Pat::Call { comma: true }, b""),
        Rule::new(Pat::Call { comma: false }, b"0"),
        Rule::new(Pat::Call { comma: false }, b""),
    ];

    for shape in Shape::ALL {
        let plain = |shape| Pat::Shape {
            shape,
            trailing_comma: false,
            leading_comma: false,
        };
        let trailing = |shape| Pat::Shape {
            shape,
            trailing_comma: true,
            leading_comma: false,
        };
        let leading = |shape| Pat::Shape {
            shape,
            trailing_comma: false,
            leading_comma: true,
        };
        rules.push(Rule::new(plain(shape), b"0"));
        rules.push(Rule::new(plain(shape), b"1"));
        rules.push(Rule::new(plain(shape), b""));
        rules.push(Rule::new(trailing(shape), b"0,"));
        rules.push(Rule::new(trailing(shape), b"1,"));
        rules.push(Rule::new(trailing(shape), b""));
        rules.push(Rule::new(leading(shape), b""));
    }

    rules
}

/// True when a rule would rewrite an already-reduced site to itself:
/// `0` over a border-flanked `0`, `0,` over a border-flanked `0,`, and
/// the `1` twins. Without this the grid would loop forever on its own
/// output.
fn already_reduced(buf: &[u8], pos: usize, repl: &[u8]) -> bool {
    let digit = match repl {
        b"0" | b"0," => b'0',
        b"1" | b"1," => b'1',
        _ => return false,
    };
    if buf.get(pos) != Some(&digit) {
        return false;
    }
    if pos == 0 || !pattern::is_border_or_space(buf[pos - 1]) {
        return false;
    }
    if repl.len() == 1 {
        buf.get(pos + 1)
            .is_some_and(|&b| pattern::is_border_or_space(b))
    } else {
        let p = pattern::skip_ws(buf, pos + 1);
        buf.get(p) == Some(&b',')
            && buf
                .get(p + 1)
                .is_some_and(|&b| pattern::is_border_or_space(b))
    }
}

/// The `replace_regex` method: sweeps both rule tables at every
/// position, committing the first accepted rewrite.
pub struct ReplaceRegex {
    plain: Vec<Rule>,
    delimited: Vec<Rule>,
}

impl ReplaceRegex {
    pub fn new() -> Self {
        Self {
            plain: plain_rules(),
            delimited: delimited_rules(),
        }
    }
}

impl Default for ReplaceRegex {
    fn default() -> Self {
        Self::new()
    }
}

impl Reduction for ReplaceRegex {
    fn name(&self) -> &'static str {
        "replace_regex"
    }

    fn rank(&self) -> u32 {
        4
    }

    fn description(&self) -> &'static str {
        "apply the plain and border-delimited rewrite catalogues"
    }

    fn try_at(&mut self, ctx: &mut TrialCtx<'_>) -> Result<Step, EngineError> {
        let pos = ctx.pos;

        for (i, rule) in self.plain.iter().enumerate() {
            let Some(old) = ({
                let buf = ctx.bytes();
                rule.match_end(buf, pos).map(|end| buf[pos..end].to_vec())
            }) else {
                continue;
            };
            if pattern::strip_whitespace(&old) == pattern::strip_whitespace(rule.repl) {
                continue;
            }
            let v = ctx.attempt(pos, pos + old.len(), rule.repl, Enlarge::Deny)?;
            ctx.stats.record_rule(RuleTable::Plain, i, v.accepted());
            if v.accepted() {
                return Ok(Step::Hit);
            }
        }

        // Delimited rules need a border on the left flank; the sentinel
        // space supplies one at the logical start of the file.
        if pos == 0 || !pattern::is_border_or_space(ctx.bytes()[pos - 1]) {
            return Ok(Step::Miss);
        }

        for (i, rule) in self.delimited.iter().enumerate() {
            let Some(old) = ({
                let buf = ctx.bytes();
                rule.match_end(buf, pos)
                    .filter(|&end| {
                        buf.get(end)
                            .is_some_and(|&b| pattern::is_border_or_space(b))
                    })
                    .map(|end| buf[pos..end].to_vec())
            }) else {
                continue;
            };
            if already_reduced(ctx.bytes(), pos, rule.repl) {
                continue;
            }
            if pattern::strip_whitespace(&old) == pattern::strip_whitespace(rule.repl) {
                continue;
            }
            let v = ctx.attempt(pos, pos + old.len(), rule.repl, Enlarge::Deny)?;
            ctx.stats.record_rule(RuleTable::Delimited, i, v.accepted());
            if v.accepted() {
                return Ok(Step::Hit);
            }
        }

        Ok(Step::Miss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_sizes() {
        assert_eq!(plain_rules().len(), 9);
        // 18 fixed rules plus 5 shapes x 7 variants.
        assert_eq!(delimited_rules().len(), 18 + 35);
    }

    #[test]
    fn test_plain_rule_matches() {
        let rules = plain_rules();
        let buf = b" : 12 ; x";
        // `: digits ;` -> `;`
        assert_eq!(rules[3].match_end(buf, 1), Some(7));
        assert_eq!(rules[3].repl, b";");

        // Compound assignment normalization.
        assert_eq!(rules[5].match_end(b"<<= 1", 0), Some(3));
        assert_eq!(rules[5].match_end(b"+= 1", 0), Some(2));
        assert_eq!(rules[5].match_end(b"= 1", 0), None);

        // String literal, with and without trailing comma.
        assert_eq!(rules[7].match_end(b"\"abc\" x", 0), Some(5));
        assert_eq!(rules[8].match_end(b"\"abc\", x", 0), Some(6));
    }

    #[test]
    fn test_plain_balanced_rules() {
        let rules = plain_rules();
        assert_eq!(rules[0].match_end(b"(a(b))c", 0), Some(6));
        assert_eq!(rules[1].match_end(b"{x;}y", 0), Some(4));
        assert_eq!(rules[2].match_end(b"= { 1, 2 };", 0), Some(10));
        // Unbalanced opener: no match, the candidate is skipped.
        assert_eq!(rules[0].match_end(b"(a(b)", 0), None);
    }

    #[test]
    fn test_delimited_fixed_rules() {
        let rules = delimited_rules();
        // Label and goto.
        assert_eq!(rules[0].match_end(b"out :x", 0), Some(5));
        assert_eq!(rules[1].match_end(b"goto out;", 0), Some(9));
        // Keyword widening.
        assert_eq!(rules[2].match_end(b"signed", 0), Some(6));
        assert_eq!(rules[2].repl, b"int");
        // main's signature.
        assert_eq!(
            rules[7].match_end(b"int argc, char *argv[]", 0),
            Some(22)
        );
        assert_eq!(rules[7].repl, b"void");
        // `if ( ... )`.
        assert_eq!(rules[10].match_end(b"if (a > 0) x", 0), Some(10));
    }

    #[test]
    fn test_delimited_call_rules() {
        let rules = delimited_rules();
        let buf = b"f(a, b), g";
        // Call with trailing comma.
        assert_eq!(rules[14].match_end(buf, 0), Some(8));
        assert_eq!(rules[14].repl, b"0");
        assert_eq!(rules[15].repl, b"");
        // Call without.
        assert_eq!(rules[16].match_end(buf, 0), Some(7));
        assert_eq!(rules[17].match_end(b"f()", 0), Some(3));
    }

    #[test]
    fn test_grid_shape_rules() {
        let rules = delimited_rules();
        // First grid entry: `lvalue op lvalue` -> `0`.
        let first = &rules[18];
        assert_eq!(first.match_end(b"a + b;", 0), Some(5));
        assert_eq!(first.repl, b"0");

        // Trailing-comma variant keeps the comma in the replacement.
        let trailing = &rules[21];
        assert_eq!(trailing.match_end(b"a + b, c", 0), Some(6));
        assert_eq!(trailing.repl, b"0,");

        // Leading-comma variant starts on the comma.
        let leading = &rules[24];
        assert_eq!(leading.match_end(b", a + b)", 0), Some(7));
        assert_eq!(leading.repl, b"");
    }

    #[test]
    fn test_already_reduced_guard() {
        assert!(already_reduced(b" 0 ", 1, b"0"));
        assert!(already_reduced(b",1;", 1, b"1"));
        assert!(!already_reduced(b" 0x", 1, b"0"));
        assert!(!already_reduced(b"a0 ", 1, b"0"));
        assert!(!already_reduced(b" 2 ", 1, b"0"));

        assert!(already_reduced(b" 0, ", 1, b"0,"));
        assert!(already_reduced(b" 1 , ", 1, b"1,"));
        assert!(!already_reduced(b" 0; ", 1, b"0,"));

        // Deletion rules never trip the guard.
        assert!(!already_reduced(b" 0 ", 1, b""));
    }
}
