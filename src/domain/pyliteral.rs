//! Nom-based parser for Python literal syntax.
//!
//! Some upstream callers stringify search domains with Python's `repr`
//! rather than JSON, producing inputs like
//! `"[('name', 'ilike', 'test'), ('active', '=', True)]"`.
//! This parser accepts the literal subset those strings use — strings,
//! integers, floats, `True`/`False`/`None`, lists, tuples and dicts — and
//! maps everything onto `serde_json::Value` (tuples become arrays).

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag},
    character::complete::{char, digit1, multispace0, none_of, one_of},
    combinator::{all_consuming, map, opt, recognize, value},
    multi::separated_list0,
    sequence::{delimited, pair, separated_pair, terminated, tuple},
    IResult,
};
use serde_json::{Map, Number, Value};

/// Parse a complete Python literal from source text.
pub fn parse(input: &str) -> Result<Value, String> {
    match all_consuming(ws(literal))(input) {
        Ok((_, parsed)) => Ok(parsed),
        Err(e) => Err(e.to_string()),
    }
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn literal(input: &str) -> IResult<&str, Value> {
    alt((
        dict,
        list,
        tuple_literal,
        string_literal,
        keyword,
        number,
    ))(input)
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

fn keyword(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), tag("True")),
        value(Value::Bool(false), tag("False")),
        value(Value::Null, tag("None")),
    ))(input)
}

fn string_literal(input: &str) -> IResult<&str, Value> {
    map(alt((quoted('\''), quoted('"'))), Value::String)(input)
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, String> {
    move |input| {
        let escapable = match quote {
            '\'' => "\\'",
            _ => "\\\"",
        };
        let (input, _) = char(quote)(input)?;
        let (input, content) = opt(escaped_transform(
            none_of(escapable),
            '\\',
            alt((
                value("'", char('\'')),
                value("\"", char('"')),
                value("\\", char('\\')),
                value("\n", char('n')),
                value("\r", char('r')),
                value("\t", char('t')),
            )),
        ))(input)?;
        let (input, _) = char(quote)(input)?;
        Ok((input, content.unwrap_or_default()))
    }
}

fn number(input: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(pair(char('.'), opt(digit1))),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;

    let parsed = if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    } else {
        text.parse::<i64>().ok().map(|n| Value::Number(n.into()))
    };

    match parsed {
        Some(v) => Ok((rest, v)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// Comma-separated items with an optional Python trailing comma.
fn items(input: &str) -> IResult<&str, Vec<Value>> {
    terminated(
        separated_list0(ws(char(',')), literal),
        opt(ws(char(','))),
    )(input)
}

fn list(input: &str) -> IResult<&str, Value> {
    map(
        delimited(char('['), ws(items), char(']')),
        Value::Array,
    )(input)
}

fn tuple_literal(input: &str) -> IResult<&str, Value> {
    map(
        delimited(char('('), ws(items), char(')')),
        Value::Array,
    )(input)
}

fn dict(input: &str) -> IResult<&str, Value> {
    let entry = separated_pair(
        alt((quoted('\''), quoted('"'))),
        ws(char(':')),
        literal,
    );
    map(
        delimited(
            char('{'),
            ws(terminated(
                separated_list0(ws(char(',')), entry),
                opt(ws(char(','))),
            )),
            char('}'),
        ),
        |entries| {
            Value::Object(entries.into_iter().collect::<Map<String, Value>>())
        },
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_typical_domain_repr() {
        let parsed = parse("[('name', 'ilike', 'test'), ('active', '=', True)]").unwrap();
        assert_eq!(
            parsed,
            json!([["name", "ilike", "test"], ["active", "=", true]])
        );
    }

    #[test]
    fn parses_keywords_and_numbers() {
        assert_eq!(parse("True").unwrap(), json!(true));
        assert_eq!(parse("False").unwrap(), json!(false));
        assert_eq!(parse("None").unwrap(), json!(null));
        assert_eq!(parse("-42").unwrap(), json!(-42));
        assert_eq!(parse("2.5").unwrap(), json!(2.5));
        assert_eq!(parse("1e3").unwrap(), json!(1000.0));
    }

    #[test]
    fn parses_quoting_and_escapes() {
        assert_eq!(parse(r#"'it\'s'"#).unwrap(), json!("it's"));
        assert_eq!(parse(r#""say \"hi\"""#).unwrap(), json!("say \"hi\""));
        assert_eq!(parse("''").unwrap(), json!(""));
        assert_eq!(parse(r"'a\nb'").unwrap(), json!("a\nb"));
    }

    #[test]
    fn parses_nested_collections() {
        let parsed = parse("{'conditions': [{'field': 'f', 'operator': '=', 'value': 1}]}").unwrap();
        assert_eq!(
            parsed,
            json!({"conditions": [{"field": "f", "operator": "=", "value": 1}]})
        );
    }

    #[test]
    fn accepts_trailing_commas() {
        assert_eq!(parse("('single',)").unwrap(), json!(["single"]));
        assert_eq!(parse("[1, 2, 3,]").unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("not a literal").is_err());
        assert!(parse("[1, 2").is_err());
        assert!(parse("").is_err());
    }
}
