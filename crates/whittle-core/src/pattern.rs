//! Textual pattern catalogue over the program bytes.
//!
//! Matchers here anchor at an arbitrary byte offset and report how far
//! the pattern reaches. Linear fragments are anchored `regex::bytes`
//! patterns compiled once; balanced `(...)` and `{...}` runs use the
//! hand-written [`balanced`] scanner, since the regex engine has no
//! balanced-bracket construct. Composite patterns (lvalue chains,
//! prototypes, definitions, calls, ternaries) chain the two.
//!
//! None of the matchers understand C beyond these shapes; anything they
//! mis-handle just produces a candidate edit the oracle will reject.

use std::sync::LazyLock;

use regex::bytes::Regex;

/// Return-type fragment used by function signatures.
const RETTYPE: &str =
    r"(?:union\s+U[0-9]+|struct\s+S[0-9]+|int|void|short|long|char|signed|unsigned|const|static)\b";

static IDNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[+-]?[0-9A-Za-z_]+").expect("identifier pattern"));

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[A-Za-z_][0-9A-Za-z_]*").expect("name pattern"));

static BINOP_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Multi-byte operators first so `<=` is not consumed as `<`.
    Regex::new(r"\A(?:<<|>>|<=|>=|==|!=|&&|\|\||[-+%/*<>=|&^])").expect("operator pattern")
});

static FUNCTYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\A(?:{RETTYPE}|\*)(?:\s+(?:{RETTYPE}|\*))*"))
        .expect("function type pattern")
});

static INT_LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A([+-]?)(0[xX]|0)?([0-9a-fA-F]+)([uUlL]*)").expect("integer literal pattern")
});

/// True for the border characters that may flank a delimited match.
pub fn is_border(b: u8) -> bool {
    matches!(b, b'*' | b'{' | b'(' | b'[' | b':' | b',' | b'}' | b')' | b']' | b';')
}

/// True for a border character or ASCII whitespace.
pub fn is_border_or_space(b: u8) -> bool {
    is_border(b) || b.is_ascii_whitespace()
}

/// First non-whitespace position at or after `pos`.
pub fn skip_ws(buf: &[u8], pos: usize) -> usize {
    let mut p = pos;
    while buf.get(p).is_some_and(|b| b.is_ascii_whitespace()) {
        p += 1;
    }
    p
}

/// Copy of `bytes` with all ASCII whitespace removed.
///
/// Used to detect edits that would only reshuffle whitespace.
pub fn strip_whitespace(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect()
}

/// Position of the close bracket matching the open bracket at `pos`.
///
/// Walks forward counting `+1` on `open` and `-1` on `close`; returns the
/// position of the zeroing close. `None` when `pos` does not hold `open`
/// or the end of the buffer is reached first (unbalanced input).
pub fn balanced(buf: &[u8], pos: usize, open: u8, close: u8) -> Option<usize> {
    if buf.get(pos) != Some(&open) {
        return None;
    }
    let mut depth = 0i64;
    for (i, &b) in buf.iter().enumerate().skip(pos) {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn anchored_end(re: &Regex, buf: &[u8], pos: usize) -> Option<usize> {
    re.find(buf.get(pos..)?).map(|m| pos + m.end())
}

/// End of an identifier-or-number starting at `pos`: an optional sign,
/// then one or more word characters.
pub fn idnum(buf: &[u8], pos: usize) -> Option<usize> {
    anchored_end(&IDNUM_RE, buf, pos)
}

/// End of a plain identifier (no sign, no leading digit) at `pos`.
pub fn ident(buf: &[u8], pos: usize) -> Option<usize> {
    anchored_end(&IDENT_RE, buf, pos)
}

/// End of a binary operator at `pos`.
pub fn binop(buf: &[u8], pos: usize) -> Option<usize> {
    anchored_end(&BINOP_RE, buf, pos)
}

/// End of a primary expression at `pos`: an identifier-or-number, or a
/// balanced parenthesis run.
pub fn pexpr(buf: &[u8], pos: usize) -> Option<usize> {
    if let Some(close) = balanced(buf, pos, b'(', b')') {
        return Some(close + 1);
    }
    idnum(buf, pos)
}

/// End of an lvalue chain at `pos`: `&`/`*` prefixes, a primary
/// expression, then `.field` and `[index]` suffixes.
pub fn fullvar(buf: &[u8], pos: usize) -> Option<usize> {
    let mut p = pos;
    while matches!(buf.get(p), Some(b'&' | b'*')) {
        p += 1;
    }
    let mut end = pexpr(buf, p)?;
    loop {
        match buf.get(end) {
            Some(b'.') => {
                if let Some(e) = idnum(buf, end + 1) {
                    end = e;
                    continue;
                }
            }
            Some(b'[') => {
                if let Some(e) = idnum(buf, end + 1) {
                    if buf.get(e) == Some(&b']') {
                        end = e + 1;
                        continue;
                    }
                }
            }
            _ => {}
        }
        break;
    }
    Some(end)
}

/// Sub-expression shapes targeted by the rewrite grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `lvalue op lvalue`
    VarBinopVar,
    /// `lvalue op`
    VarBinop,
    /// `op lvalue`
    BinopVar,
    /// `lvalue`
    Var,
    /// `a ? b : c`
    Ternary,
}

impl Shape {
    /// Every shape, in the order the rewrite grid enumerates them.
    pub const ALL: [Shape; 5] = [
        Shape::VarBinopVar,
        Shape::VarBinop,
        Shape::BinopVar,
        Shape::Var,
        Shape::Ternary,
    ];
}

/// End of the given shape at `pos`, with whitespace allowed between the
/// elements.
pub fn shape(buf: &[u8], pos: usize, s: Shape) -> Option<usize> {
    match s {
        Shape::Var => fullvar(buf, pos),
        Shape::VarBinop => {
            let e = fullvar(buf, pos)?;
            binop(buf, skip_ws(buf, e))
        }
        Shape::BinopVar => {
            let e = binop(buf, pos)?;
            fullvar(buf, skip_ws(buf, e))
        }
        Shape::VarBinopVar => {
            let e = fullvar(buf, pos)?;
            let e = binop(buf, skip_ws(buf, e))?;
            fullvar(buf, skip_ws(buf, e))
        }
        Shape::Ternary => ternary(buf, pos).map(|t| t.end),
    }
}

/// A matched conditional expression `a ? b : c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TernaryMatch {
    /// One past the last byte of the condition expression.
    pub end: usize,
    /// Span of the `b` branch.
    pub then_start: usize,
    pub then_end: usize,
    /// Span of the `c` branch.
    pub else_start: usize,
    pub else_end: usize,
}

/// Matches `a ? b : c` at `pos`, where each arm is an lvalue chain.
pub fn ternary(buf: &[u8], pos: usize) -> Option<TernaryMatch> {
    let a_end = fullvar(buf, pos)?;
    let mut p = skip_ws(buf, a_end);
    if buf.get(p) != Some(&b'?') {
        return None;
    }
    p = skip_ws(buf, p + 1);
    let then_start = p;
    let then_end = fullvar(buf, p)?;
    p = skip_ws(buf, then_end);
    if buf.get(p) != Some(&b':') {
        return None;
    }
    p = skip_ws(buf, p + 1);
    let else_start = p;
    let else_end = fullvar(buf, p)?;
    Some(TernaryMatch {
        end: else_end,
        then_start,
        then_end,
        else_start,
        else_end,
    })
}

/// A matched function prototype or definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuncMatch {
    /// One past the terminating `;` (prototype) or `}` (definition).
    pub end: usize,
    /// Span of the function name.
    pub name_start: usize,
    pub name_end: usize,
}

/// Matches `FUNCTYPE name ( ... )` at `pos` and returns the position just
/// past the close paren together with the name span.
fn signature(buf: &[u8], pos: usize, want: Option<&[u8]>) -> Option<(usize, usize, usize)> {
    let ty_end = anchored_end(&FUNCTYPE_RE, buf, pos)?;
    let name_start = skip_ws(buf, ty_end);
    let name_end = ident(buf, name_start)?;
    if let Some(w) = want {
        if &buf[name_start..name_end] != w {
            return None;
        }
    }
    let p = skip_ws(buf, name_end);
    let close = balanced(buf, p, b'(', b')')?;
    Some((close + 1, name_start, name_end))
}

/// Matches a function prototype at `pos`.
///
/// With `name` given, only a prototype for that exact name matches; with
/// `None` the name is captured freely.
pub fn prototype(buf: &[u8], pos: usize, name: Option<&[u8]>) -> Option<FuncMatch> {
    let (after_parens, name_start, name_end) = signature(buf, pos, name)?;
    let p = skip_ws(buf, after_parens);
    if buf.get(p) != Some(&b';') {
        return None;
    }
    Some(FuncMatch {
        end: p + 1,
        name_start,
        name_end,
    })
}

/// Matches a full function definition at `pos`, terminated by a balanced
/// `{ ... }` body instead of `;`.
pub fn function_def(buf: &[u8], pos: usize, name: Option<&[u8]>) -> Option<FuncMatch> {
    let (after_parens, name_start, name_end) = signature(buf, pos, name)?;
    let p = skip_ws(buf, after_parens);
    let close = balanced(buf, p, b'{', b'}')?;
    Some(FuncMatch {
        end: close + 1,
        name_start,
        name_end,
    })
}

/// A matched call: `IDNUM ( ... )`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallMatch {
    /// One past the close paren.
    pub end: usize,
    /// Span of the callee name.
    pub name_start: usize,
    pub name_end: usize,
    /// Span of the argument text, inside the parens.
    pub args_start: usize,
    pub args_end: usize,
}

/// Matches a call at `pos`.
pub fn call(buf: &[u8], pos: usize) -> Option<CallMatch> {
    let name_end = idnum(buf, pos)?;
    let p = skip_ws(buf, name_end);
    let close = balanced(buf, p, b'(', b')')?;
    Some(CallMatch {
        end: close + 1,
        name_start: pos,
        name_end,
        args_start: p + 1,
        args_end: close,
    })
}

/// A matched integer literal: optional sign, optional `0`/`0x` base
/// prefix, digits, optional `U`/`L` suffix letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntLiteral {
    /// Start of the literal (the sign, if present).
    pub start: usize,
    /// First digit position, past sign and base prefix.
    pub digits_start: usize,
    /// One past the last digit.
    pub digits_end: usize,
    /// One past the last suffix letter; end of the whole literal.
    pub end: usize,
}

impl IntLiteral {
    /// Number of digit bytes.
    pub fn digit_count(&self) -> usize {
        self.digits_end - self.digits_start
    }

    /// True when a sign or base prefix precedes the digits.
    pub fn has_prefix(&self) -> bool {
        self.digits_start > self.start
    }

    /// Number of suffix letters.
    pub fn suffix_len(&self) -> usize {
        self.end - self.digits_end
    }
}

/// Matches an integer literal at `pos`.
///
/// The byte after the literal must not continue a word, so the tail of an
/// identifier never counts as a literal. The sign is matched as a literal
/// `+` or `-` only.
pub fn int_literal(buf: &[u8], pos: usize) -> Option<IntLiteral> {
    let caps = INT_LITERAL_RE.captures(buf.get(pos..)?)?;
    let whole = caps.get(0).expect("whole match");
    let digits = caps.get(3).expect("digit group");
    let end = pos + whole.end();
    if buf.get(end).is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_') {
        return None;
    }
    Some(IntLiteral {
        start: pos,
        digits_start: pos + digits.start(),
        digits_end: pos + digits.end(),
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_basic() {
        let buf = b" (a (b) c) ";
        assert_eq!(balanced(buf, 1, b'(', b')'), Some(9));
        assert_eq!(balanced(buf, 4, b'(', b')'), Some(6));
    }

    #[test]
    fn test_balanced_rejects_unbalanced() {
        let buf = b" (a (b c ";
        assert_eq!(balanced(buf, 1, b'(', b')'), None);
        // Not an open bracket at pos.
        assert_eq!(balanced(buf, 2, b'(', b')'), None);
    }

    #[test]
    fn test_idnum_with_sign() {
        assert_eq!(idnum(b"-12ab;", 0), Some(5));
        assert_eq!(idnum(b"+x", 0), Some(2));
        assert_eq!(idnum(b"g_1 ", 0), Some(3));
        assert_eq!(idnum(b";x", 0), None);
    }

    #[test]
    fn test_binop_longest_first() {
        assert_eq!(binop(b"<=1", 0), Some(2));
        assert_eq!(binop(b"<<x", 0), Some(2));
        assert_eq!(binop(b"&&y", 0), Some(2));
        assert_eq!(binop(b"&y", 0), Some(1));
        assert_eq!(binop(b"=z", 0), Some(1));
        assert_eq!(binop(b"~z", 0), None);
    }

    #[test]
    fn test_pexpr_variants() {
        assert_eq!(pexpr(b"abc+", 0), Some(3));
        assert_eq!(pexpr(b"(a + b);", 0), Some(7));
        assert_eq!(pexpr(b";", 0), None);
    }

    #[test]
    fn test_fullvar_prefixes_and_suffixes() {
        assert_eq!(fullvar(b"x;", 0), Some(1));
        assert_eq!(fullvar(b"&*p;", 0), Some(3));
        assert_eq!(fullvar(b"s.f1.f2;", 0), Some(7));
        assert_eq!(fullvar(b"a[3].x;", 0), Some(6));
        assert_eq!(fullvar(b"(a+b)[0];", 0), Some(8));
        assert_eq!(fullvar(b"?;", 0), None);
    }

    #[test]
    fn test_shape_matching() {
        let buf = b"a + b;";
        assert_eq!(shape(buf, 0, Shape::VarBinopVar), Some(5));
        assert_eq!(shape(buf, 0, Shape::VarBinop), Some(3));
        assert_eq!(shape(buf, 2, Shape::BinopVar), Some(5));
        assert_eq!(shape(buf, 0, Shape::Var), Some(1));
        assert_eq!(shape(buf, 0, Shape::Ternary), None);
    }

    #[test]
    fn test_ternary_spans() {
        let buf = b"a ? b : c ;";
        let t = ternary(buf, 0).unwrap();
        assert_eq!(t.end, 9);
        assert_eq!(&buf[t.then_start..t.then_end], b"b");
        assert_eq!(&buf[t.else_start..t.else_end], b"c");

        assert_eq!(ternary(b"a ? b ;", 0), None);
    }

    #[test]
    fn test_prototype_and_definition() {
        let buf = b"static int func_1(int a, int b);";
        let m = prototype(buf, 0, None).unwrap();
        assert_eq!(m.end, buf.len());
        assert_eq!(&buf[m.name_start..m.name_end], b"func_1");

        // A definition does not match the prototype pattern.
        let def = b"int f(void) { return 0; }";
        assert_eq!(prototype(def, 0, None), None);
        let m = function_def(def, 0, None).unwrap();
        assert_eq!(m.end, def.len());
        assert_eq!(&def[m.name_start..m.name_end], b"f");
    }

    #[test]
    fn test_prototype_name_filter() {
        let buf = b"int f(void);";
        assert!(prototype(buf, 0, Some(b"f")).is_some());
        assert!(prototype(buf, 0, Some(b"g")).is_none());
    }

    #[test]
    fn test_functype_keyword_boundary() {
        // `intx` is an identifier, not the keyword `int`.
        assert_eq!(prototype(b"intx f(void);", 0, None), None);
        assert!(prototype(b"struct S1 f(void);", 0, None).is_some());
        assert!(prototype(b"unsigned long *f(void);", 0, None).is_some());
    }

    #[test]
    fn test_call_match() {
        let buf = b"transparent_crc(g_1, \"x\", 0);";
        let m = call(buf, 0).unwrap();
        assert_eq!(&buf[m.name_start..m.name_end], b"transparent_crc");
        assert_eq!(&buf[m.args_start..m.args_end], b"g_1, \"x\", 0");
        assert_eq!(m.end, buf.len() - 1);

        assert_eq!(call(b"foo;", 0), None);
    }

    #[test]
    fn test_int_literal_forms() {
        let lit = int_literal(b"0x1ULL;", 0).unwrap();
        assert_eq!(lit.digits_start, 2);
        assert_eq!(lit.digits_end, 3);
        assert_eq!(lit.end, 6);
        assert_eq!(lit.suffix_len(), 3);
        assert!(lit.has_prefix());

        let lit = int_literal(b"123;", 0).unwrap();
        assert_eq!(lit.digit_count(), 3);
        assert!(!lit.has_prefix());
        assert_eq!(lit.suffix_len(), 0);

        let lit = int_literal(b"-0777 ", 0).unwrap();
        assert!(lit.has_prefix());
        assert_eq!(lit.digits_start, 2);

        let lit = int_literal(b"0;", 0).unwrap();
        assert_eq!(lit.digit_count(), 1);
        assert!(!lit.has_prefix());
    }

    #[test]
    fn test_int_literal_rejects_word_tail() {
        assert!(int_literal(b"123abz", 0).is_none());
        assert!(int_literal(b"1_x", 0).is_none());
    }

    #[test]
    fn test_border_classes() {
        for b in b"*{([:,})];".iter() {
            assert!(is_border(*b));
        }
        assert!(!is_border(b'a'));
        assert!(is_border_or_space(b' '));
        assert!(is_border_or_space(b'\n'));
        assert!(!is_border_or_space(b'x'));
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace(b" a \t b\nc "), b"abc");
        assert_eq!(strip_whitespace(b""), b"");
    }
}
