//! Integration tests for template compilation and rendering.

use std::thread;

use mite_core::{
    compile, compile_with, normalize, tokenize, CompileError, CompileOptions, RenderError,
    SyntaxError, TokenKind,
};
use serde_json::json;

#[test]
fn test_loop_over_items() {
    let template =
        compile("<% for (let i=0;i<items.length;i++) { %>-<%= items[i] %>-<% } %>").unwrap();
    let output = template.render(&json!({"items": ["a", "b"]})).unwrap();
    assert_eq!(output, "-a--b-");
}

#[test]
fn test_multiline_user_list() {
    let source = concat!(
        "<% for (let i= 0; i<user.length; i++) {%>\n",
        "  <h2><%= user[i].name %></h2>\n",
        "  <% } %>\n",
    );
    let template = compile(source).unwrap();
    let output = template
        .render(&json!({"user": [{"name": "5342"}, {"name": "325"}]}))
        .unwrap();
    assert_eq!(output, "\n  <h2>5342</h2>\n  \n  <h2>325</h2>\n  \n");
}

#[test]
fn test_plain_text_renders_to_itself() {
    let text = "It's a \"quoted\" line\nand another, 100% plain.\n";
    assert_eq!(compile(text).unwrap().render(&json!({})).unwrap(), text);
}

#[test]
fn test_backslashes_in_literal_text() {
    let text = r"C:\Users\mite and a lone \";
    assert_eq!(compile(text).unwrap().render(&json!({})).unwrap(), text);
}

#[test]
fn test_empty_template() {
    assert!(tokenize(&normalize("")).unwrap().is_empty());
    assert_eq!(compile("").unwrap().render(&json!({})).unwrap(), "");
}

#[test]
fn test_adjacent_directives() {
    let tokens = tokenize("<% x=1 %><%= x %>").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TokenKind::ControlFlow, TokenKind::Expression]);
    assert_eq!(compile("<% x=1 %><%= x %>").unwrap().render(&json!({})).unwrap(), "1");
}

#[test]
fn test_unterminated_directives() {
    for source in ["<% foo", "<% foo %"] {
        assert_eq!(
            compile(source).unwrap_err(),
            CompileError::Syntax(SyntaxError::UnterminatedDirective { offset: 0 })
        );
    }
}

#[test]
fn test_conditionals_across_lines() {
    let source = "<% if (user.admin) { %>\nadmin\n<% } else { %>\nguest\n<% } %>";
    let template = compile(source).unwrap();
    assert_eq!(template.render(&json!({"user": {"admin": true}})).unwrap(), "\nadmin\n");
    assert_eq!(template.render(&json!({"user": {"admin": false}})).unwrap(), "\nguest\n");
}

#[test]
fn test_line_comment_in_directive() {
    let template = compile("<% // just a note %>ok<%= 1 + 1 %>").unwrap();
    assert_eq!(template.render(&json!({})).unwrap(), "ok2");
}

#[test]
fn test_multiline_directive_code() {
    let source = concat!(
        "<%\n",
        "  const total = items\n",
        "    .map(i => i.price)\n",
        "    .reduce((a, b) => a + b, 0)\n",
        "%>Total: <%= total.toFixed(2) %>",
    );
    let template = compile(source).unwrap();
    let output = template
        .render(&json!({"items": [{"price": 1.5}, {"price": 2.25}]}))
        .unwrap();
    assert_eq!(output, "Total: 3.75");
}

#[test]
fn test_expression_values_are_stringified() {
    let template = compile("<%= a %>|<%= b %>|<%= c %>|<%= d %>|<%= e %>").unwrap();
    let output = template
        .render(&json!({"a": null, "b": [1, 2], "c": {"k": 1}, "d": 2.5, "e": true}))
        .unwrap();
    // Null and undefined entries are dropped by the output join.
    assert_eq!(output, "|1,2|[object Object]|2.5|true");
}

#[test]
fn test_undefined_name_is_reference_error() {
    let template = compile("<%= missing %>").unwrap();
    let err = template.render(&json!({})).unwrap_err();
    assert_eq!(err, RenderError::Reference("missing".to_string()));
    assert_eq!(err.to_string(), "ReferenceError: missing is not defined");
}

#[test]
fn test_reading_property_of_undefined() {
    let template = compile("<%= user.name %>").unwrap();
    let err = template.render(&json!({"user": null})).unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: Cannot read properties of null (reading 'name')"
    );
}

#[test]
fn test_calling_non_function() {
    let template = compile("<%= user.name() %>").unwrap();
    let err = template.render(&json!({"user": {"name": "x"}})).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: user.name is not a function");
}

#[test]
fn test_renders_are_independent() {
    let source = "<% if (typeof seen == 'undefined') { seen = 0 } seen++ %><%= seen %>";
    let template = compile(source).unwrap();
    assert_eq!(template.render(&json!({})).unwrap(), "1");
    assert_eq!(template.render(&json!({})).unwrap(), "1");
}

#[test]
fn test_concurrent_renders() {
    let template = compile("<%= name.toUpperCase() %>").unwrap();
    let handles: Vec<_> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|name| {
            let template = template.clone();
            thread::spawn(move || template.render(&json!({ "name": name })).unwrap())
        })
        .collect();
    let outputs: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(outputs, vec!["A", "B", "C", "D"]);
}

#[test]
fn test_allow_list_bindings() {
    let options = CompileOptions::default()
        .with_locals_name("ctx")
        .with_bindings(["title"]);
    let template = compile_with("<%= title %> by <%= ctx.author %>", &options).unwrap();
    let output = template
        .render(&json!({"title": "Dune", "author": "Herbert"}))
        .unwrap();
    assert_eq!(output, "Dune by Herbert");
}

#[test]
fn test_json_helpers_in_templates() {
    let template = compile("<%= JSON.stringify(data) %>").unwrap();
    let output = template.render(&json!({"data": {"b": 1, "a": [true]}})).unwrap();
    assert_eq!(output, r#"{"b":1,"a":[true]}"#);
}

#[test]
fn test_nested_functions() {
    let source = concat!(
        "<% function row(cells) { ",
        "return '<tr>' + cells.map(c => '<td>' + c + '</td>').join('') + '</tr>' } %>",
        "<% for (const r of rows) { %><%= row(r) %><% } %>",
    );
    let template = compile(source).unwrap();
    let output = template.render(&json!({"rows": [[1, 2], [3]]})).unwrap();
    assert_eq!(output, "<tr><td>1</td><td>2</td></tr><tr><td>3</td></tr>");
}

#[test]
fn test_closures_in_loop_keep_their_iteration() {
    let source = concat!(
        "<% var fs = []; for (let i = 0; i < 3; i++) { fs.push(() => i) } %>",
        "<%= fs.map(f => f()).join(',') %>",
    );
    let template = compile(source).unwrap();
    assert_eq!(template.render(&json!({})).unwrap(), "0,1,2");
}

#[test]
fn test_number_formatting_in_output() {
    let template = compile("<%= 1e21 %>|<%= 1e-7 %>|<%= 1.5e300 %>|<%= 0.1 + 0.2 %>").unwrap();
    assert_eq!(
        template.render(&json!({})).unwrap(),
        "1e+21|1e-7|1.5e+300|0.30000000000000004"
    );
}

#[test]
fn test_oversized_values_fail_the_render() {
    let template = compile("<%= 'x'.repeat(1e19) %>").unwrap();
    let err = template.render(&json!({})).unwrap_err();
    assert_eq!(err, RenderError::Range("Invalid string length".to_string()));

    let template = compile("<% var a = []; a.length = 4294967295; %>").unwrap();
    let err = template.render(&json!({})).unwrap_err();
    assert_eq!(err, RenderError::Range("Invalid array length".to_string()));
}

#[test]
fn test_deeply_nested_directive_fails_to_compile() {
    let source = format!("<%= {}1{} %>", "(".repeat(3000), ")".repeat(3000));
    let err = compile(&source).unwrap_err();
    assert!(matches!(err, CompileError::Script(_)));
    assert!(err.to_string().contains("nested too deeply"));
}
