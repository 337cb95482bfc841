//! Integration tests for the script engine.

use mite_script::{Interpreter, ParseError, Program, RuntimeError, Value};
use serde_json::json;

fn render(source: &str, context: serde_json::Value) -> Result<String, RuntimeError> {
    let program = Program::parse(source).expect("program should parse");
    let mut interp = Interpreter::new();
    if let serde_json::Value::Object(map) = &context {
        for (key, value) in map {
            interp.define(key.as_str(), Value::from_json(value));
        }
    }
    interp.run(&program).map(|value| value.to_string())
}

#[test]
fn test_output_buffer_program() {
    let source = [
        "var __out = [];",
        "__out.push('<ul>');",
        "for (const item of items) {",
        "__out.push('<li>');",
        "__out.push(item.name);",
        "__out.push('</li>');",
        "}",
        "__out.push('</ul>');",
        "return __out.join('');",
    ]
    .join("\n");
    let context = json!({"items": [{"name": "a"}, {"name": "b"}]});
    assert_eq!(render(&source, context).unwrap(), "<ul><li>a</li><li>b</li></ul>");
}

#[test]
fn test_escaped_newline_terminates_line_comment() {
    // The two characters `\n` end a comment just like a real newline.
    let source = r"var x = 1; // note\nx = 2; return x;";
    assert_eq!(render(source, json!({})).unwrap(), "2");
}

#[test]
fn test_semicolon_insertion_across_lines() {
    let source = "var a = 1\nvar b = 2\nreturn a + b";
    assert_eq!(render(source, json!({})).unwrap(), "3");
}

#[test]
fn test_context_values_keep_reference_semantics() {
    let source = "list.push(4); return list.length + ':' + list.join('');";
    assert_eq!(render(source, json!({"list": [1, 2, 3]})).unwrap(), "4:1234");
}

#[test]
fn test_nested_context_access() {
    let source = "return user.profile.name.toUpperCase() + user.tags[1];";
    let context = json!({"user": {"profile": {"name": "ada"}, "tags": ["x", "y"]}});
    assert_eq!(render(source, context).unwrap(), "ADAy");
}

#[test]
fn test_runtime_error_surfaces() {
    let err = render("return user.name;", json!({})).unwrap_err();
    assert_eq!(err, RuntimeError::Reference("user".to_string()));
    assert_eq!(err.to_string(), "ReferenceError: user is not defined");
}

#[test]
fn test_parse_error_surfaces() {
    let err = Program::parse("for (;;").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedEof));
    assert!(err.to_string().starts_with("SyntaxError"));
}

#[test]
fn test_program_can_run_many_times() {
    let source = "count = (typeof count == 'undefined' ? 0 : count) + 1; return count;";
    let program = Program::parse(source).unwrap();
    for _ in 0..3 {
        // Each interpreter starts from fresh globals.
        assert_eq!(Interpreter::new().run(&program).unwrap().to_string(), "1");
    }
}

#[test]
fn test_program_shared_across_threads() {
    let program = std::sync::Arc::new(Program::parse("return n * 2;").unwrap());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let program = program.clone();
            std::thread::spawn(move || {
                let mut interp = Interpreter::new();
                interp.define("n", Value::Number(n as f64));
                interp.run(&program).unwrap().to_string()
            })
        })
        .collect();
    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec!["0", "2", "4", "6"]);
}

#[test]
fn test_deep_nesting_is_a_parse_error() {
    let source = format!("return {}1{};", "(".repeat(3000), ")".repeat(3000));
    let err = Program::parse(&source).unwrap_err();
    assert!(matches!(err, ParseError::NestingTooDeep { .. }));
    assert!(err.to_string().starts_with("SyntaxError"));

    let source = format!("return {}1{};", "[".repeat(50), "]".repeat(50));
    assert_eq!(render(&source, json!({})).unwrap(), "1");
}

#[test]
fn test_huge_allocations_are_range_errors() {
    let err = render("return 'x'.repeat(1e19);", json!({})).unwrap_err();
    assert_eq!(err.to_string(), "RangeError: Invalid string length");

    let err = render("var a = []; a.length = 4294967295;", json!({})).unwrap_err();
    assert_eq!(err.to_string(), "RangeError: Invalid array length");

    let err = render("var a = []; a[1e9] = 1;", json!({})).unwrap_err();
    assert_eq!(err.to_string(), "RangeError: Invalid array length");
}

#[test]
fn test_closures_capture_each_loop_iteration() {
    let source = "var fs = []; for (let i = 0; i < 3; i++) { fs.push(() => i); } \
                  return fs.map(f => f()).join(',');";
    assert_eq!(render(source, json!({})).unwrap(), "0,1,2");
}

#[test]
fn test_large_and_small_numbers_use_exponent_form() {
    let source = "return [1e21, 1e-7, 1.5e300, 123456789, 0.5].join(' ');";
    assert_eq!(
        render(source, json!({})).unwrap(),
        "1e+21 1e-7 1.5e+300 123456789 0.5"
    );
}
