//! Compiles templates into renderable [`Template`]s.

use std::sync::Arc;

use mite_script::{Interpreter, Program, Value};
use serde::Serialize;
use tracing::{debug, trace};

use crate::codegen::Generator;
use crate::error::{CompileResult, RenderError, RenderResult};
use crate::options::CompileOptions;
use crate::preprocess::normalize;
use crate::tokenizer::tokenize;

/// A boxed render function, detached from the [`Template`] type.
pub type RenderFn = Box<dyn Fn(&serde_json::Value) -> RenderResult<String> + Send + Sync>;

/// Compile `template` with default options.
pub fn compile(template: &str) -> CompileResult<Template> {
    compile_with(template, &CompileOptions::default())
}

/// Compile `template`.
///
/// Fails with [`CompileError::Syntax`] when a directive is not closed, and
/// with [`CompileError::Script`] when directive code does not parse.
///
/// [`CompileError::Syntax`]: crate::CompileError::Syntax
/// [`CompileError::Script`]: crate::CompileError::Script
pub fn compile_with(template: &str, options: &CompileOptions) -> CompileResult<Template> {
    let normalized = normalize(template);
    let tokens = tokenize(&normalized)?;
    let body = Generator::new(options).generate(&tokens);
    let program = Program::parse(&body)?;

    debug!(
        tokens = tokens.len(),
        body_len = body.len(),
        "compiled template"
    );

    Ok(Template {
        inner: Arc::new(Compiled {
            body,
            program,
            options: options.clone(),
        }),
    })
}

/// A compiled template.
///
/// Immutable once built: render it any number of times, from any thread.
/// Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Template {
    inner: Arc<Compiled>,
}

#[derive(Debug)]
struct Compiled {
    body: String,
    program: Program,
    options: CompileOptions,
}

impl Template {
    /// Render with a JSON context.
    ///
    /// The context must be an object or `null`.
    pub fn render(&self, context: &serde_json::Value) -> RenderResult<String> {
        let mut interp = Interpreter::new();
        self.bind_context(&mut interp, context)?;
        let output = interp.run(&self.inner.program)?;
        Ok(output.to_string())
    }

    /// Render with any serializable context.
    pub fn render_with<T: Serialize + ?Sized>(&self, context: &T) -> RenderResult<String> {
        let context =
            serde_json::to_value(context).map_err(|e| RenderError::Type(e.to_string()))?;
        self.render(&context)
    }

    /// The generated function body.
    pub fn body(&self) -> &str {
        &self.inner.body
    }

    /// The options the template was compiled with.
    pub fn options(&self) -> &CompileOptions {
        &self.inner.options
    }

    /// Turn the template into a plain render function.
    pub fn into_render_fn(self) -> RenderFn {
        Box::new(move |context| self.render(context))
    }

    /// Bind the context as `locals` and its keys as variables.
    ///
    /// Keys are read from the converted `locals` object, so a key and
    /// `locals.key` refer to the same array or object during a render.
    fn bind_context(
        &self,
        interp: &mut Interpreter,
        context: &serde_json::Value,
    ) -> RenderResult<()> {
        let options = &self.inner.options;
        match context {
            serde_json::Value::Object(_) | serde_json::Value::Null => {}
            other => {
                return Err(RenderError::Type(format!(
                    "render context must be an object, got {}",
                    json_type_name(other)
                )));
            }
        }

        let locals = Value::from_json(context);
        interp.define(options.locals_name.as_str(), locals.clone());

        let Value::Object(entries) = &locals else {
            return Ok(());
        };
        let entries = entries.borrow();
        match &options.bindings {
            None => {
                for (name, value) in entries.iter() {
                    interp.define(name.as_str(), value.clone());
                }
            }
            Some(names) => {
                for name in names {
                    let value = entries.get(name).cloned().unwrap_or_default();
                    interp.define(name.as_str(), value);
                }
            }
        }
        trace!(bound = entries.len(), "bound render context");
        Ok(())
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompileError, SyntaxError};
    use mite_script::{ParseError, RuntimeError};
    use serde_json::json;

    #[test]
    fn test_template_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Template>();
        assert_send_sync::<RenderFn>();
    }

    #[test]
    fn test_compile_and_render() {
        let template = compile("Hello, <%= name %>!").unwrap();
        assert_eq!(template.render(&json!({"name": "mite"})).unwrap(), "Hello, mite!");
        assert_eq!(template.render(&json!({"name": 42})).unwrap(), "Hello, 42!");
    }

    #[test]
    fn test_unterminated_directive_fails_compile() {
        assert_eq!(
            compile("a <% b").unwrap_err(),
            CompileError::Syntax(SyntaxError::UnterminatedDirective { offset: 2 })
        );
    }

    #[test]
    fn test_bad_directive_code_fails_compile() {
        let err = compile("<% if ( %>").unwrap_err();
        assert!(matches!(err, CompileError::Script(_)));
        assert!(err.to_string().starts_with("SyntaxError"));
    }

    #[test]
    fn test_locals_binding() {
        let template = compile("<%= locals.a %>-<%= a %>").unwrap();
        assert_eq!(template.render(&json!({"a": 1})).unwrap(), "1-1");
    }

    #[test]
    fn test_custom_locals_name() {
        let options = CompileOptions::default().with_locals_name("data");
        let template = compile_with("<%= data.a %>", &options).unwrap();
        assert_eq!(template.render(&json!({"a": "x"})).unwrap(), "x");
        assert_eq!(template.options(), &options);
        assert_eq!(compile("x").unwrap().options(), &CompileOptions::default());
    }

    #[test]
    fn test_deeply_nested_directive_is_a_compile_error() {
        let source = format!("<%= {}1{} %>", "(".repeat(3000), ")".repeat(3000));
        assert!(matches!(
            compile(&source).unwrap_err(),
            CompileError::Script(ParseError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn test_binding_allow_list() {
        let options = CompileOptions::default().with_binding("a").with_binding("missing");
        let source = "<%= a %>/<%= typeof missing %>/<%= typeof b %>";
        let template = compile_with(source, &options).unwrap();
        assert_eq!(
            template.render(&json!({"a": 1, "b": 2})).unwrap(),
            "1/undefined/undefined"
        );
        let template = compile_with("<%= b %>", &options).unwrap();
        assert_eq!(
            template.render(&json!({"b": 2})).unwrap_err(),
            RuntimeError::Reference("b".to_string())
        );
    }

    #[test]
    fn test_key_and_locals_share_objects() {
        let template = compile("<% items.push(3) %><%= locals.items.length %>").unwrap();
        assert_eq!(template.render(&json!({"items": [1, 2]})).unwrap(), "3");
    }

    #[test]
    fn test_null_context() {
        let template = compile("<%= locals === null %>").unwrap();
        assert_eq!(template.render(&serde_json::Value::Null).unwrap(), "true");
    }

    #[test]
    fn test_non_object_context_fails() {
        let template = compile("x").unwrap();
        assert!(matches!(
            template.render(&json!([1, 2])),
            Err(RuntimeError::Type(_))
        ));
    }

    #[test]
    fn test_render_with_serializable() {
        #[derive(Serialize)]
        struct Page {
            title: &'static str,
            tags: Vec<&'static str>,
        }

        let template = compile("<%= title %>: <%= tags.join(', ') %>").unwrap();
        let page = Page {
            title: "Notes",
            tags: vec!["a", "b"],
        };
        assert_eq!(template.render_with(&page).unwrap(), "Notes: a, b");
    }

    #[test]
    fn test_into_render_fn() {
        let render = compile("<%= n * 2 %>").unwrap().into_render_fn();
        assert_eq!(render(&json!({"n": 21})).unwrap(), "42");
    }

    #[test]
    fn test_body_is_exposed() {
        let template = compile("a").unwrap();
        assert_eq!(
            template.body(),
            "var __mite_out = [];\n__mite_out.push('a');\nreturn __mite_out.join('');"
        );
    }

    #[test]
    fn test_unescaped_quote_breaks_parsing() {
        let options = CompileOptions::default().escape_literals(false);
        let err = compile_with("it's", &options).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Script(
                ParseError::UnexpectedToken { .. } | ParseError::UnexpectedChar { .. }
            )
        ));
    }
}
