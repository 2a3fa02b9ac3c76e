//! A small pointcut language evaluated with regexes.
//!
//! ```text
//! expr        := and ( "||" and )*
//! and         := designator ( "&&" designator )*
//! designator  := "execution(" signature ")" | "within(" type ")" | "bean(" name ")" | signature
//! signature   := [modifiers/return type] type "." method [ "(" params ")" ]
//! params      := ".." | "" | name ( "," name )*
//! ```
//!
//! In names `*` matches within one dotted segment and `**` across segments. A
//! type pattern ending in `+` also selects subtypes. Unqualified patterns are
//! tried against simple names too.

use crate::domain::element::simple_name;
use crate::domain::failure::MatchFailure;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct NamePattern {
    regex: Regex,
    qualified: bool,
}

impl NamePattern {
    pub fn parse(pattern: &str, expression: &str) -> Result<Self, MatchFailure> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(MatchFailure::illegal_pointcut(expression, "empty name pattern"));
        }
        if let Some(bad) = pattern
            .chars()
            .find(|c| !(c.is_alphanumeric() || matches!(c, '.' | '_' | '$' | '*')))
        {
            return Err(MatchFailure::illegal_pointcut(
                expression,
                format!("unexpected character '{bad}' in '{pattern}'"),
            ));
        }

        let mut source = String::from("^");
        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    source.push_str(".*");
                }
                '*' => source.push_str("[^.]*"),
                other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        source.push('$');

        let regex = Regex::new(&source)
            .map_err(|e| MatchFailure::illegal_pointcut(expression, e.to_string()))?;
        Ok(Self {
            regex,
            qualified: pattern.contains('.'),
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name) || (!self.qualified && self.regex.is_match(simple_name(name)))
    }
}

#[derive(Debug, Clone)]
pub struct TypePattern {
    name: NamePattern,
    include_subtypes: bool,
}

impl TypePattern {
    pub fn parse(pattern: &str, expression: &str) -> Result<Self, MatchFailure> {
        let pattern = pattern.trim();
        let (pattern, include_subtypes) = match pattern.strip_suffix('+') {
            Some(base) => (base, true),
            None => (pattern, false),
        };
        Ok(Self {
            name: NamePattern::parse(pattern, expression)?,
            include_subtypes,
        })
    }

    /// `type_names` is the type itself followed by all of its supertypes.
    pub fn matches(&self, type_names: &[String]) -> bool {
        if self.include_subtypes {
            type_names.iter().any(|n| self.name.matches(n))
        } else {
            type_names.first().is_some_and(|n| self.name.matches(n))
        }
    }
}

#[derive(Debug, Clone)]
enum ParamPattern {
    Any,
    Exact(Vec<NamePattern>),
}

impl ParamPattern {
    fn parse(body: &str, expression: &str) -> Result<Self, MatchFailure> {
        let body = body.trim();
        if body == ".." {
            return Ok(ParamPattern::Any);
        }
        if body.is_empty() {
            return Ok(ParamPattern::Exact(Vec::new()));
        }
        body.split(',')
            .map(|p| {
                if p.trim() == ".." {
                    Err(MatchFailure::illegal_pointcut(
                        expression,
                        "'..' must be the only parameter pattern",
                    ))
                } else {
                    NamePattern::parse(p, expression)
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ParamPattern::Exact)
    }

    fn matches(&self, parameter_types: &[String]) -> bool {
        match self {
            ParamPattern::Any => true,
            ParamPattern::Exact(patterns) => {
                patterns.len() == parameter_types.len()
                    && patterns
                        .iter()
                        .zip(parameter_types)
                        .all(|(p, t)| p.matches(t))
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Designator {
    Execution {
        declaring_type: TypePattern,
        method: NamePattern,
        params: ParamPattern,
    },
    Within(TypePattern),
    Bean(NamePattern),
}

/// A candidate join point: one method of a bean's class
#[derive(Debug, Clone, Copy)]
pub struct JoinPoint<'a> {
    /// The class followed by its supertypes
    pub type_names: &'a [String],
    pub bean: &'a str,
    pub method: &'a str,
    pub parameter_types: &'a [String],
}

impl Designator {
    fn accepts(&self, jp: &JoinPoint<'_>) -> bool {
        match self {
            Designator::Execution {
                declaring_type,
                method,
                params,
            } => {
                declaring_type.matches(jp.type_names)
                    && method.matches(jp.method)
                    && params.matches(jp.parameter_types)
            }
            Designator::Within(ty) => ty.matches(jp.type_names),
            Designator::Bean(name) => name.matches(jp.bean),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pointcut {
    /// Disjunction of conjunctions
    alternatives: Vec<Vec<Designator>>,
}

impl Pointcut {
    pub fn parse(expression: &str) -> Result<Self, MatchFailure> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(MatchFailure::illegal_pointcut(expression, "empty expression"));
        }
        check_balanced(trimmed, expression)?;

        let alternatives = split_top_level(trimmed, "||", expression)?
            .into_iter()
            .map(|alt| {
                split_top_level(alt, "&&", expression)?
                    .into_iter()
                    .map(|term| parse_designator(term, expression))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alternatives })
    }

    pub fn matches(&self, jp: &JoinPoint<'_>) -> bool {
        self.alternatives
            .iter()
            .any(|all| all.iter().all(|d| d.accepts(jp)))
    }
}

fn check_balanced(text: &str, expression: &str) -> Result<(), MatchFailure> {
    let mut depth: i32 = 0;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(MatchFailure::illegal_pointcut(expression, "unbalanced parentheses"));
    }
    Ok(())
}

fn split_top_level<'s>(
    text: &'s str,
    operator: &str,
    expression: &str,
) -> Result<Vec<&'s str>, MatchFailure> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    let bytes = text.as_bytes();
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            _ if depth == 0 && bytes[i..].starts_with(operator.as_bytes()) => {
                parts.push(&text[start..i]);
                i += operator.len();
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&text[start..]);

    let parts: Vec<&str> = parts.into_iter().map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(MatchFailure::illegal_pointcut(
            expression,
            format!("dangling '{operator}'"),
        ));
    }
    Ok(parts)
}

fn parse_designator(term: &str, expression: &str) -> Result<Designator, MatchFailure> {
    let Some(open) = term.find('(') else {
        return parse_signature(term, expression);
    };
    if !term.ends_with(')') {
        return Err(MatchFailure::illegal_pointcut(
            expression,
            format!("expected ')' at end of '{term}'"),
        ));
    }
    let name = term[..open].trim();
    let body = &term[open + 1..term.len() - 1];
    match name {
        "execution" => parse_signature(body, expression),
        "within" => Ok(Designator::Within(TypePattern::parse(body, expression)?)),
        "bean" => Ok(Designator::Bean(NamePattern::parse(body, expression)?)),
        "" => Err(MatchFailure::illegal_pointcut(expression, "missing designator")),
        // bare `Type.method(..)`
        _ if name.contains('.') || name.contains(char::is_whitespace) => {
            parse_signature(term, expression)
        }
        other => Err(MatchFailure::illegal_pointcut(
            expression,
            format!("unsupported designator '{other}'"),
        )),
    }
}

fn parse_signature(signature: &str, expression: &str) -> Result<Designator, MatchFailure> {
    let signature = signature.trim();
    let (head, params) = match signature.find('(') {
        Some(open) => {
            if !signature.ends_with(')') {
                return Err(MatchFailure::illegal_pointcut(
                    expression,
                    format!("expected ')' at end of '{signature}'"),
                ));
            }
            (
                &signature[..open],
                ParamPattern::parse(&signature[open + 1..signature.len() - 1], expression)?,
            )
        }
        None => (signature, ParamPattern::Any),
    };

    // Leading modifiers and return type are accepted and ignored.
    let Some(qualified) = head.split_whitespace().last() else {
        return Err(MatchFailure::illegal_pointcut(expression, "missing method pattern"));
    };
    let Some((declaring_type, method)) = qualified.rsplit_once('.') else {
        return Err(MatchFailure::illegal_pointcut(
            expression,
            format!("missing declaring type in '{qualified}'"),
        ));
    };
    Ok(Designator::Execution {
        declaring_type: TypePattern::parse(declaring_type, expression)?,
        method: NamePattern::parse(method, expression)?,
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn jp<'a>(types: &'a [String], bean: &'a str, method: &'a str, params: &'a [String]) -> JoinPoint<'a> {
        JoinPoint {
            type_names: types,
            bean,
            method,
            parameter_types: params,
        }
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let p = NamePattern::parse("com.example.*Service", "x").unwrap();
        assert!(p.matches("com.example.OrderService"));
        assert!(!p.matches("com.example.impl.OrderService"));

        let deep = NamePattern::parse("com.**.*Service", "x").unwrap();
        assert!(deep.matches("com.example.impl.OrderService"));

        let simple = NamePattern::parse("*Service", "x").unwrap();
        assert!(simple.matches("com.example.OrderService"));
    }

    #[test]
    fn test_execution_matches_method_and_params() {
        let pc = Pointcut::parse("execution(* com.example.OrderService.place*(String, int))").unwrap();
        let types = names(&["com.example.OrderService"]);
        let params = names(&["java.lang.String", "int"]);
        assert!(pc.matches(&jp(&types, "orders", "placeOrder", &params)));
        assert!(!pc.matches(&jp(&types, "orders", "placeOrder", &[])));
        assert!(!pc.matches(&jp(&types, "orders", "cancel", &params)));
    }

    #[test]
    fn test_subtype_pattern_and_combinators() {
        let types = names(&["com.example.OrderService", "com.example.Auditable"]);
        let pc = Pointcut::parse("within(com.example.Auditable+) && bean(order*)").unwrap();
        assert!(pc.matches(&jp(&types, "orders", "place", &[])));
        assert!(!pc.matches(&jp(&types, "billing", "place", &[])));

        let either = Pointcut::parse("bean(billing) || com.example.OrderService.cancel").unwrap();
        assert!(either.matches(&jp(&types, "orders", "cancel", &[])));
        assert!(either.matches(&jp(&types, "billing", "anything", &[])));
        assert!(!either.matches(&jp(&types, "orders", "place", &[])));
    }

    #[test]
    fn test_malformed_expressions() {
        for bad in [
            "",
            "execution(com.example.Foo.bar(..)",
            "foo(com.example.Foo)",
            "execution(bar(..))",
            "bean(a b)",
            "bean(x) ||",
            "execution(com.example.Foo.bar(.., int))",
        ] {
            let err = Pointcut::parse(bad).unwrap_err();
            assert!(
                matches!(err, MatchFailure::IllegalPointcut { .. }),
                "{bad:?} should be illegal, got {err:?}"
            );
        }
    }
}
