use std::collections::HashSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use super::{compile, DateOverride, ParamIds, SqlQuery, SqlSearch, SqlValue, Wildcards};
use crate::dates;
use crate::error::{ConfigurationError, ParseError, SearchError};
use crate::policy::FieldPolicy;
use crate::search_query::{parse, Dialect, Operator};

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]+)").unwrap());

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 8, 30, 0).unwrap()
}

fn notes() -> SqlSearch {
    SqlSearch::new(
        FieldPolicy::new()
            .with_any(["name", "body", "stars"])
            .with_is_string(["name", "body"])
            .with_is_date(["created"]),
    )
}

fn search(engine: &SqlSearch, input: &str) -> SqlQuery {
    engine.search_at(Some(input), fixed_now()).unwrap()
}

/// Text with every placeholder replaced by `@?`, plus bound values in
/// placeholder order.
fn shape(query: &SqlQuery) -> (String, Vec<SqlValue>) {
    let values = PLACEHOLDER_RE
        .captures_iter(&query.text)
        .map(|c| query.params[&c[1]].clone())
        .collect();
    let text = PLACEHOLDER_RE.replace_all(&query.text, "@?").into_owned();
    (text, values)
}

// --- Fallback to TRUE ---

#[test]
fn test_missing_or_empty_query_is_true() {
    let engine = notes();
    assert_eq!(engine.search(None).unwrap(), SqlQuery::tautology());
    assert_eq!(engine.search(Some("")).unwrap(), SqlQuery::tautology());
    assert_eq!(
        serde_json::to_value(engine.search(None).unwrap()).unwrap(),
        json!({"text": "TRUE", "params": {}})
    );
}

#[test]
fn test_parse_error_is_true() {
    let engine = notes();
    for input in ["(a", "a  b", "a:", "a~b", "\"a", " "] {
        assert!(engine.search(Some(input)).unwrap().is_tautology(), "{input}");
    }
}

#[test]
fn test_non_identifier_field_is_true() {
    let engine = notes();
    for input in [
        "x;DELETE/**/FROM/**/users;--:v",
        "name OR 1=1",
        "a-b:1",
        "1:2",
        "stars>=2 \"x'y\":z",
        ".a:1",
        "a..b:1",
    ] {
        let query = engine.search(Some(input)).unwrap();
        assert!(query.is_tautology(), "{input}: {}", query.text);
    }
}

#[test]
fn test_dotted_field_accepted() {
    let (text, values) = shape(&search(&notes(), "meta.rank_2>=3"));
    assert_eq!(text, "meta.rank_2 >= @?");
    assert_eq!(values, vec![SqlValue::Integer(3)]);
}

#[test]
fn test_compile_rejects_non_identifier_field() {
    let node = parse("x;y:1", Dialect::Relational).unwrap();
    assert_eq!(
        compile(&node, &FieldPolicy::new()),
        Err(SearchError::Parse(ParseError::InvalidField {
            field: "x;y".to_string()
        }))
    );
}

#[test]
fn test_configuration_error_still_propagates() {
    let engine = SqlSearch::new(FieldPolicy::new());
    assert_eq!(
        engine.search(Some("x")),
        Err(ConfigurationError::NoBareFields {
            token: "x".to_string()
        })
    );
    // keyed expressions need no bare fields
    assert!(engine.search(Some("a:x")).is_ok());
}

// --- Leaves ---

#[test]
fn test_like_escapes_wildcards() {
    let engine = SqlSearch::new(FieldPolicy::new());
    let (text, values) = shape(&search(&engine, "name:50%_off\\x"));
    assert_eq!(text, "name LIKE @? ESCAPE '\\'");
    assert_eq!(values, vec![SqlValue::Text("%50\\%\\_off\\\\x%".to_string())]);
}

#[test]
fn test_default_operator_on_exact_field_is_equality() {
    let (text, values) = shape(&search(&notes(), "stars:5"));
    assert_eq!(text, "stars = @?");
    assert_eq!(values, vec![SqlValue::Integer(5)]);
}

#[test]
fn test_comparisons_bind_typed_values() {
    let engine = notes();
    let cases = [
        ("stars>=2", "stars >= @?", SqlValue::Integer(2)),
        ("stars>2", "stars > @?", SqlValue::Integer(2)),
        ("stars<=2.5", "stars <= @?", SqlValue::Float(2.5)),
        ("stars<x", "stars < @?", SqlValue::Text("x".to_string())),
        ("name=x", "name = @?", SqlValue::Text("x".to_string())),
    ];
    for (input, expected_text, expected_value) in cases {
        let (text, values) = shape(&search(&engine, input));
        assert_eq!(text, expected_text, "{input}");
        assert_eq!(values, vec![expected_value], "{input}");
    }
}

#[test]
fn test_null_is_is_null() {
    let engine = notes();
    let cases = [
        ("body:NULL", "body IS NULL"),
        ("body=NULL", "body IS NULL"),
        ("stars>NULL", "stars IS NULL"),
        ("\"body\":\"NULL\"", "body IS NULL"),
    ];
    for (input, expected) in cases {
        let query = search(&engine, input);
        assert_eq!(query.text, expected, "{input}");
        assert!(query.params.is_empty(), "{input}");
    }
}

// --- Relative dates ---

#[test]
fn test_relative_date_uses_lte() {
    let (text, values) = shape(&search(&notes(), "created:-1d"));
    assert_eq!(text, "created <= @?");
    assert_eq!(
        values,
        vec![SqlValue::Text(dates::to_iso(fixed_now() - Duration::days(1)))]
    );
}

#[test]
fn test_now_literal() {
    let (text, values) = shape(&search(&notes(), "created:now"));
    assert_eq!(text, "created <= @?");
    assert_eq!(values, vec![SqlValue::Text("2024-05-10T08:30:00.000Z".to_string())]);
}

#[test]
fn test_relative_date_overrides_written_operator() {
    let (text, _) = shape(&search(&notes(), "created>-7d"));
    assert_eq!(text, "created <= @?");
}

#[test]
fn test_override_limited_to_default_operator() {
    let engine = notes().with_date_override(DateOverride::DefaultOperatorOnly);
    assert_eq!(shape(&search(&engine, "created>-7d")).0, "created > @?");
    assert_eq!(shape(&search(&engine, "created:-7d")).0, "created <= @?");
}

#[test]
fn test_non_relative_date_is_ordinary_comparison() {
    let (text, values) = shape(&search(&notes(), "created>=2024-01-01"));
    assert_eq!(text, "created >= @?");
    assert_eq!(values, vec![SqlValue::Text("2024-01-01".to_string())]);
}

#[test]
fn test_one_now_per_call() {
    let query = notes().search(Some("created:now OR created:now")).unwrap();
    let values: HashSet<String> = query
        .params
        .values()
        .map(|v| match v {
            SqlValue::Text(s) => s.clone(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(values.len(), 1);
}

// --- Bare tokens ---

#[test]
fn test_bare_expansion() {
    let (text, values) = shape(&search(&notes(), "x"));
    assert_eq!(
        text,
        "(name LIKE @? ESCAPE '\\') OR (body LIKE @? ESCAPE '\\') OR (stars = @?)"
    );
    assert_eq!(
        values,
        vec![
            SqlValue::Text("%x%".to_string()),
            SqlValue::Text("%x%".to_string()),
            SqlValue::Text("x".to_string()),
        ]
    );
}

#[test]
fn test_bare_falls_back_to_string_fields() {
    let engine = SqlSearch::new(FieldPolicy::new().with_is_string(["title"]));
    let (text, values) = shape(&search(&engine, "-7d"));
    assert_eq!(text, "(title LIKE @? ESCAPE '\\')");
    assert_eq!(values, vec![SqlValue::Text("%-7d%".to_string())]);
}

#[test]
fn test_bare_null() {
    let query = search(&notes(), "NULL");
    assert_eq!(
        query.text,
        "(name IS NULL) OR (body IS NULL) OR (stars IS NULL)"
    );
    assert!(query.params.is_empty());
}

// --- Composition ---

#[test]
fn test_complex_or() {
    let engine = SqlSearch::new(FieldPolicy::new().with_any(["name"]).with_is_string(["name"]));
    let (text, values) = shape(&search(&engine, "(a OR b>2) c=a"));
    assert_eq!(
        text,
        "(((name LIKE @? ESCAPE '\\')) OR (b > @?)) AND (c = @?)"
    );
    assert_eq!(
        values,
        vec![
            SqlValue::Text("%a%".to_string()),
            SqlValue::Integer(2),
            SqlValue::Text("a".to_string()),
        ]
    );
}

#[test]
fn test_placeholders_match_params_one_to_one() {
    let engine = notes();
    let inputs = [
        "x",
        "x y OR z",
        "(a OR b>2) c=a",
        "name:x name:x name:x",
        "(x OR (y created:-1d)) stars>=3 NULL",
    ];
    for input in inputs {
        let query = search(&engine, input);
        let ids: Vec<String> = PLACEHOLDER_RE
            .captures_iter(&query.text)
            .map(|c| c[1].to_string())
            .collect();
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len(), "{input}");
        assert_eq!(ids.len(), query.params.len(), "{input}");
        assert!(ids.iter().all(|id| query.params.contains_key(id)), "{input}");
    }
}

// --- Builders ---

#[test]
fn test_join_fragments() {
    let query = SqlQuery::and(["a = 1", "b = 2"]);
    assert_eq!(query.text, "(a = 1) AND (b = 2)");
    assert_eq!(SqlQuery::or(["a = 1"]).text, "(a = 1)");
    assert_eq!(SqlQuery::and(Vec::<SqlQuery>::new()), SqlQuery::tautology());
    assert_eq!(SqlQuery::or(Vec::<SqlQuery>::new()).text, "FALSE");
}

#[test]
fn test_like_wildcard_sides() {
    let mut ids = ParamIds::new();
    let prefix = SqlQuery::like("name", "ab", Wildcards::PREFIX, &mut ids);
    let suffix = SqlQuery::like("name", "ab", Wildcards::SUFFIX, &mut ids);
    assert_eq!(
        prefix.params.values().next(),
        Some(&SqlValue::Text("ab%".to_string()))
    );
    assert_eq!(
        suffix.params.values().next(),
        Some(&SqlValue::Text("%ab".to_string()))
    );
}

#[test]
fn test_compare_null_value() {
    let mut ids = ParamIds::new();
    let query = SqlQuery::compare("a", Operator::Gt, SqlValue::Null, &mut ids);
    assert_eq!(query, SqlQuery::from("a IS NULL"));
}

#[test]
fn test_param_ids_fresh() {
    let mut first = ParamIds::new();
    let mut second = ParamIds::new();
    let a = first.next_id();
    let b = first.next_id();
    assert_ne!(a, b);
    assert_ne!(a, second.next_id());
    assert!(a.starts_with('p'));
}
