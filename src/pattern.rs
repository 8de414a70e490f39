//! Structural pattern matching with metavariables
//!
//! Patterns are source-shaped text with placeholders: `$NAME` captures a single
//! expression or type unit, `$$$NAME` captures a variadic (possibly empty) run
//! that may cross commas, and `$_` is an anonymous single capture. Whitespace in
//! a pattern is insignificant, so a pattern written on one line still matches
//! reformatted or multi-line occurrences. Word tokens match on word boundaries,
//! which keeps rename rules from re-matching their own output.
//!
//! A `<` that follows an identifier, `:` or `>` is treated as a generic-argument
//! opener when scanning capture extents; `->` is never treated as a closer.
//!
//! Patterns the structural scanner cannot handle reliably (unbalanced brackets,
//! as in anchor-style patterns like `Camera { hdr: true`) compile into a
//! whitespace-tolerant literal regex instead. Such patterns are flagged as
//! degraded so the caller can report reduced accuracy.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;

/// Longest capture extent considered for a single metavariable, in bytes.
const MAX_CAPTURE: usize = 4096;

/// Matcher steps allowed per match attempt. Variadic metavariables backtrack,
/// and attempts past this many steps are abandoned instead of being allowed to
/// backtrack without bound.
const MAX_BACKTRACK_STEPS: usize = 100_000;

/// Pattern compilation error
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PatternError(pub String);

/// The deadline passed while scanning a buffer
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("pattern match deadline exceeded")]
pub struct MatchTimeout;

/// Per-attempt matcher bookkeeping: a step budget and an optional deadline
/// checked every 1024 steps so a single rule cannot outlive its file's
/// deadline.
struct MatchCtx {
    deadline: Option<Instant>,
    steps: usize,
}

impl MatchCtx {
    /// Count one matcher step. `Ok(false)` abandons the attempt, `Err` aborts
    /// the whole scan.
    fn step(&mut self) -> Result<bool, MatchTimeout> {
        self.steps += 1;
        if self.steps % 1024 == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(MatchTimeout);
                }
            }
        }
        Ok(self.steps <= MAX_BACKTRACK_STEPS)
    }
}

/// A located occurrence of a pattern in a source buffer
///
/// Offsets are byte positions. Spans produced by one `find_iter` call are
/// non-overlapping and ordered by start offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub captures: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatTok {
    Word(String),
    Punct(char),
    Meta { name: String, variadic: bool },
}

enum Matcher {
    Structural(Vec<PatTok>),
    Literal(Regex),
}

/// A compiled pattern
pub struct Pattern {
    text: String,
    matcher: Matcher,
}

impl Pattern {
    /// Compile a pattern, falling back to a literal regex when the structural
    /// scanner cannot be trusted with it.
    pub fn compile(text: &str) -> Result<Pattern, PatternError> {
        if text.trim().is_empty() {
            return Err(PatternError("pattern is empty".to_string()));
        }
        let toks = tokenize(text);
        if brackets_balanced(&toks) {
            return Ok(Pattern {
                text: text.to_string(),
                matcher: Matcher::Structural(toks),
            });
        }
        let re = literal_regex(&toks)
            .map_err(|e| PatternError(format!("fallback regex failed: {}", e)))?;
        Ok(Pattern {
            text: text.to_string(),
            matcher: Matcher::Literal(re),
        })
    }

    /// The original pattern text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the pattern runs in the literal-regex fallback mode
    pub fn is_degraded(&self) -> bool {
        matches!(self.matcher, Matcher::Literal(_))
    }

    /// Find all non-overlapping occurrences, ordered by start offset.
    ///
    /// Restartable: callers may re-invoke on a mutated buffer after rewriting.
    pub fn find_iter(&self, src: &str) -> Vec<MatchSpan> {
        // Without a deadline the scan cannot time out.
        self.find_iter_within(src, None).unwrap_or_default()
    }

    /// Like [`find_iter`](Self::find_iter), but aborts with [`MatchTimeout`]
    /// once `deadline` passes. The deadline is checked between start
    /// candidates and inside the backtracking matcher itself, so a single
    /// pathological pattern cannot run past it.
    pub fn find_iter_within(
        &self,
        src: &str,
        deadline: Option<Instant>,
    ) -> Result<Vec<MatchSpan>, MatchTimeout> {
        match &self.matcher {
            Matcher::Literal(re) => Ok(re
                .captures_iter(src)
                .map(|caps| {
                    let whole = caps.get(0).unwrap();
                    let mut captured = BTreeMap::new();
                    for name in re.capture_names().flatten() {
                        if let Some(m) = caps.name(name) {
                            captured.insert(base_name(name), m.as_str().to_string());
                        }
                    }
                    MatchSpan {
                        start: whole.start(),
                        end: whole.end(),
                        captures: captured,
                    }
                })
                .collect()),
            Matcher::Structural(toks) => {
                let mut out = Vec::new();
                let mut pos = 0;
                let mut ctx = MatchCtx { deadline, steps: 0 };
                while pos < src.len() {
                    if let Some(deadline) = deadline {
                        if Instant::now() >= deadline {
                            return Err(MatchTimeout);
                        }
                    }
                    let Some(cand) = next_start(toks, src, pos) else {
                        break;
                    };
                    ctx.steps = 0;
                    let mut caps = BTreeMap::new();
                    match match_tokens(toks, src, cand, &mut caps, &mut ctx)? {
                        Some(end) if end > cand => {
                            out.push(MatchSpan {
                                start: cand,
                                end,
                                captures: caps,
                            });
                            pos = end;
                        }
                        _ => {
                            pos = cand + src[cand..].chars().next().map_or(1, char::len_utf8);
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_meta_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn take_meta_name(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| !is_meta_name_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}

fn tokenize(pat: &str) -> Vec<PatTok> {
    let mut toks = Vec::new();
    let mut i = 0;
    while i < pat.len() {
        let c = pat[i..].chars().next().unwrap();
        if c.is_whitespace() {
            i += c.len_utf8();
            continue;
        }
        if c == '$' {
            let (skip, variadic) = if pat[i..].starts_with("$$$") {
                (3, true)
            } else {
                (1, false)
            };
            let name = take_meta_name(&pat[i + skip..]);
            if !name.is_empty() {
                toks.push(PatTok::Meta {
                    name: name.to_string(),
                    variadic,
                });
                i += skip + name.len();
                continue;
            }
            toks.push(PatTok::Punct('$'));
            i += 1;
            continue;
        }
        if is_word_char(c) {
            let end = pat[i..]
                .char_indices()
                .find(|(_, c)| !is_word_char(*c))
                .map(|(j, _)| i + j)
                .unwrap_or(pat.len());
            toks.push(PatTok::Word(pat[i..end].to_string()));
            i = end;
            continue;
        }
        toks.push(PatTok::Punct(c));
        i += c.len_utf8();
    }
    toks
}

fn brackets_balanced(toks: &[PatTok]) -> bool {
    let mut stack = Vec::new();
    for tok in toks {
        if let PatTok::Punct(c) = tok {
            match c {
                '(' | '[' | '{' => stack.push(*c),
                ')' => {
                    if stack.pop() != Some('(') {
                        return false;
                    }
                }
                ']' => {
                    if stack.pop() != Some('[') {
                        return false;
                    }
                }
                '}' => {
                    if stack.pop() != Some('{') {
                        return false;
                    }
                }
                _ => {}
            }
        }
    }
    stack.is_empty()
}

/// Strip the uniquifying suffix added for repeated capture names in fallback mode.
fn base_name(name: &str) -> String {
    match name.find("__dup") {
        Some(i) => name[..i].to_string(),
        None => name.to_string(),
    }
}

fn literal_regex(toks: &[PatTok]) -> Result<Regex, regex::Error> {
    let mut parts = Vec::new();
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    for tok in toks {
        match tok {
            PatTok::Word(w) => parts.push(format!(r"\b{}\b", regex::escape(w))),
            PatTok::Punct(c) => parts.push(regex::escape(&c.to_string())),
            PatTok::Meta { name, variadic } => {
                let n = seen.entry(name.clone()).or_insert(0);
                *n += 1;
                let group = if *n == 1 {
                    name.clone()
                } else {
                    format!("{}__dup{}", name, n)
                };
                if *variadic {
                    parts.push(format!(r"(?P<{}>(?s:.)*?)", group));
                } else {
                    parts.push(format!(r"(?P<{}>[^,;]+?)", group));
                }
            }
        }
    }
    Regex::new(&parts.join(r"\s*"))
}

fn skip_ws(src: &str, mut pos: usize) -> usize {
    while let Some(c) = src[pos..].chars().next() {
        if !c.is_whitespace() {
            break;
        }
        pos += c.len_utf8();
    }
    pos
}

fn prev_char(src: &str, pos: usize) -> Option<char> {
    src[..pos].chars().next_back()
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Earliest position at or after `from` where a match could begin.
fn next_start(toks: &[PatTok], src: &str, from: usize) -> Option<usize> {
    match toks.first()? {
        PatTok::Word(w) => {
            let mut p = from;
            while let Some(i) = src[p..].find(w.as_str()) {
                let q = p + i;
                let before_ok = prev_char(src, q).map_or(true, |c| !is_word_char(c));
                if before_ok {
                    return Some(q);
                }
                p = q + w.len();
            }
            None
        }
        PatTok::Punct(c) => src[from..].find(*c).map(|i| from + i),
        PatTok::Meta { .. } => {
            let mut pos = from;
            while let Some(c) = src[pos..].chars().next() {
                if !c.is_whitespace() && prev_char(src, pos).map_or(true, |p| !is_word_char(p)) {
                    return Some(pos);
                }
                pos += c.len_utf8();
            }
            None
        }
    }
}

fn match_tokens(
    toks: &[PatTok],
    src: &str,
    pos: usize,
    caps: &mut BTreeMap<String, String>,
    ctx: &mut MatchCtx,
) -> Result<Option<usize>, MatchTimeout> {
    if !ctx.step()? {
        return Ok(None);
    }
    let Some((tok, rest)) = toks.split_first() else {
        return Ok(Some(pos));
    };
    match tok {
        PatTok::Word(w) => {
            let p = skip_ws(src, pos);
            if prev_char(src, p).is_some_and(is_word_char) {
                return Ok(None);
            }
            if !src[p..].starts_with(w.as_str()) {
                return Ok(None);
            }
            let end = p + w.len();
            if src[end..].chars().next().is_some_and(is_word_char) {
                return Ok(None);
            }
            match_tokens(rest, src, end, caps, ctx)
        }
        PatTok::Punct(c) => {
            let p = skip_ws(src, pos);
            if src[p..].chars().next() != Some(*c) {
                return Ok(None);
            }
            match_tokens(rest, src, p + c.len_utf8(), caps, ctx)
        }
        PatTok::Meta { name, variadic } => {
            let p = skip_ws(src, pos);
            for end in capture_candidates(src, p, *variadic) {
                let text = src[p..end].to_string();
                if let Some(existing) = caps.get(name) {
                    if collapse_ws(existing) != collapse_ws(&text) {
                        continue;
                    }
                }
                let shadowed = caps.insert(name.clone(), text);
                if let Some(done) = match_tokens(rest, src, end, caps, ctx)? {
                    return Ok(Some(done));
                }
                match shadowed {
                    Some(v) => caps.insert(name.clone(), v),
                    None => caps.remove(name),
                };
            }
            Ok(None)
        }
    }
}

/// Index just past the closing quote of a string literal, or None if unterminated.
fn end_of_string(src: &str, after_open: usize) -> Option<usize> {
    let mut esc = false;
    for (i, c) in src[after_open..].char_indices() {
        if esc {
            esc = false;
            continue;
        }
        match c {
            '\\' => esc = true,
            '"' => return Some(after_open + i + 1),
            _ => {}
        }
    }
    None
}

/// Ascending candidate end positions for a metavariable capture starting at `start`.
///
/// Candidates stop at unmatched closers, `;`, and (for single captures) `,` at
/// bracket depth zero. String literals are consumed atomically. Candidates are
/// never offered mid-identifier, between the colons of `::`, or inside `->`.
fn capture_candidates(src: &str, start: usize, variadic: bool) -> Vec<usize> {
    let mut out = Vec::new();
    if variadic {
        out.push(start);
    }
    let mut depth = 0i32;
    let mut angle = 0i32;
    let mut prev: Option<char> = None;
    let mut pos = start;
    let limit = src.len().min(start + MAX_CAPTURE);
    while pos < limit {
        let c = src[pos..].chars().next().unwrap();
        let mut end = pos + c.len_utf8();
        let significant = !c.is_whitespace();
        match c {
            '"' => match end_of_string(src, end) {
                Some(e) => end = e,
                None => break,
            },
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            ';' if depth == 0 && angle == 0 => break,
            ',' if depth == 0 && angle == 0 && !variadic => break,
            '<' if prev.is_some_and(|p| is_word_char(p) || p == ':' || p == '>') => angle += 1,
            '>' if prev != Some('-') => {
                if angle > 0 {
                    angle -= 1;
                } else if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        if significant {
            prev = Some(c);
        }
        pos = end;
        if significant && depth == 0 && angle == 0 {
            let next_c = src[pos..].chars().next();
            let last = prev.unwrap();
            let mid_word = is_word_char(last) && next_c.is_some_and(is_word_char);
            let mid_path = last == ':' && next_c == Some(':');
            let mid_arrow = last == '-' && next_c == Some('>');
            if !(mid_word || mid_path || mid_arrow) {
                out.push(pos);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pat(text: &str) -> Pattern {
        Pattern::compile(text).unwrap()
    }

    fn only(spans: Vec<MatchSpan>) -> MatchSpan {
        assert_eq!(spans.len(), 1, "expected exactly one match");
        spans.into_iter().next().unwrap()
    }

    #[test]
    fn test_plain_rename_match() {
        let p = pat("despawn_recursive");
        let src = "commands.entity(e).despawn_recursive();";
        let m = only(p.find_iter(src));
        assert_eq!(&src[m.start..m.end], "despawn_recursive");
    }

    #[test]
    fn test_word_boundary_blocks_partial_match() {
        // "add_plugin" must not match inside "add_plugins"
        let p = pat("add_plugin");
        assert!(p.find_iter("app.add_plugins(DefaultPlugins);").is_empty());
    }

    #[test]
    fn test_single_capture_in_generics() {
        let p = pat("Res<Input<$T>>");
        let m = only(p.find_iter("fn run(keys: Res<Input<KeyCode>>) {}"));
        assert_eq!(m.captures["T"], "KeyCode");
    }

    #[test]
    fn test_whitespace_and_multiline_tolerance() {
        let p = pat("Res<Input<$T>>");
        let src = "fn run(keys: Res<\n    Input< KeyCode >\n>) {}";
        let m = only(p.find_iter(src));
        assert_eq!(m.captures["T"], "KeyCode");
    }

    #[test]
    fn test_nested_generic_capture() {
        let p = pat("Res<Input<$T>>");
        let m = only(p.find_iter("keys: Res<Input<Option<KeyCode>>>"));
        assert_eq!(m.captures["T"], "Option<KeyCode>");
    }

    #[test]
    fn test_method_receiver_capture() {
        let p = pat("$ENTITY.despawn_recursive()");
        let m = only(p.find_iter("commands.entity(e).despawn_recursive();"));
        assert_eq!(m.captures["ENTITY"], "commands.entity(e)");
    }

    #[test]
    fn test_call_argument_capture() {
        let p = pat("app.add_plugin($_)");
        let m = only(p.find_iter("app.add_plugin(MyPlugin::default())"));
        assert_eq!(m.captures["_"], "MyPlugin::default()");
    }

    #[test]
    fn test_variadic_capture_spans_commas() {
        let p = pat("spawn(($$$PARTS))");
        let m = only(p.find_iter("commands.spawn((Camera2d, Transform::IDENTITY));"));
        assert_eq!(m.captures["PARTS"], "Camera2d, Transform::IDENTITY");
    }

    #[test]
    fn test_variadic_capture_may_be_empty() {
        let p = pat("foo($$$ARGS)");
        let m = only(p.find_iter("foo()"));
        assert_eq!(m.captures["ARGS"], "");
    }

    #[test]
    fn test_single_capture_stops_at_comma() {
        let p = pat("load($PATH)");
        // `load(a, b)` has two arguments, a single metavariable must not match
        assert!(p.find_iter("server.load(a, b)").is_empty());
        let m = only(p.find_iter("server.load(\"sprite.png\")"));
        assert_eq!(m.captures["PATH"], "\"sprite.png\"");
    }

    #[test]
    fn test_string_capture_with_comma_inside() {
        let p = pat("load($PATH)");
        let m = only(p.find_iter("server.load(\"a,b.png\")"));
        assert_eq!(m.captures["PATH"], "\"a,b.png\"");
    }

    #[test]
    fn test_multiple_matches_ordered_and_disjoint() {
        let p = pat("Input<$T>");
        let src = "a: Res<Input<KeyCode>>, b: Res<Input<MouseButton>>";
        let spans = p.find_iter(src);
        assert_eq!(spans.len(), 2);
        assert!(spans[0].end <= spans[1].start);
        assert_eq!(spans[0].captures["T"], "KeyCode");
        assert_eq!(spans[1].captures["T"], "MouseButton");
    }

    #[test]
    fn test_attribute_pattern() {
        let p = pat("#[derive(WorldQuery)]");
        let m = only(p.find_iter("#[derive(WorldQuery)]\nstruct Q;"));
        assert_eq!(m.start, 0);
    }

    #[test]
    fn test_struct_literal_rest_capture() {
        let p = pat("Camera2dBundle { $FIELDS }");
        let m = only(p.find_iter("commands.spawn(Camera2dBundle { ..default() });"));
        assert_eq!(m.captures["FIELDS"], "..default()");
    }

    #[test]
    fn test_unbalanced_pattern_degrades_to_literal() {
        let p = pat("Camera { hdr: true");
        assert!(p.is_degraded());
        let spans = p.find_iter("Camera { hdr: true, ..default() }");
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn test_degraded_pattern_tolerates_whitespace() {
        let p = pat("Camera { hdr: true");
        assert!(!p.find_iter("Camera {\n    hdr: true,\n}").is_empty());
    }

    #[test]
    fn test_structural_not_degraded() {
        assert!(!pat("EventWriter<$T>").is_degraded());
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(Pattern::compile("   ").is_err());
    }

    #[test]
    fn test_no_match_returns_empty() {
        assert!(pat("EventWriter<$T>").find_iter("fn main() {}").is_empty());
    }

    #[test]
    fn test_two_capture_call() {
        let p = pat("$APP.add_state($STATE)");
        let m = only(p.find_iter("app.add_state(GameState::Menu);"));
        assert_eq!(m.captures["APP"], "app");
        assert_eq!(m.captures["STATE"], "GameState::Menu");
    }

    #[test]
    fn test_restartable_on_mutated_buffer() {
        let p = pat("Input<$T>");
        let first = p.find_iter("Res<Input<KeyCode>>");
        assert_eq!(first.len(), 1);
        // after rewriting, the renamed type must no longer match
        assert!(p.find_iter("Res<ButtonInput<KeyCode>>").is_empty());
    }

    #[test]
    fn test_arrow_not_a_closer() {
        let p = pat("fn $NAME() -> $RET {");
        let src = "fn answer() -> u32 {";
        let m = only(p.find_iter(src));
        assert_eq!(m.captures["NAME"], "answer");
        assert_eq!(m.captures["RET"], "u32");
    }

    #[test]
    fn test_deadline_aborts_heavy_backtracking() {
        use std::time::Duration;
        // Three variadics over one comma run backtrack combinatorially and
        // never match (no "zzz" in the source); the deadline must abort the
        // scan mid-rule rather than let it run to completion.
        let p = pat("f($$$A, $$$B, $$$C zzz)");
        let src = format!("f({}) ", "1,".repeat(120)).repeat(200);
        let deadline = Instant::now() + Duration::from_millis(5);
        assert_eq!(p.find_iter_within(&src, Some(deadline)), Err(MatchTimeout));
    }

    #[test]
    fn test_backtracking_is_bounded_without_deadline() {
        use std::time::Duration;
        let p = pat("f($$$A, $$$B, $$$C zzz)");
        let src = format!("f({})", "1,".repeat(40));
        let started = Instant::now();
        assert!(p.find_iter(&src).is_empty());
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_repeated_metavariable_must_agree() {
        let p = pat("($X, $X)");
        assert!(p.find_iter("(a, b)").is_empty());
        let m = only(p.find_iter("(a, a)"));
        assert_eq!(m.captures["X"], "a");
    }
}
