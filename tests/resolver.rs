#[cfg(test)]
mod resolver_tests {
    use std::io;

    use innerlox as lox;

    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;
    use pretty_assertions::assert_eq;

    /// Resolve `source` and return every diagnostic as it would be printed.
    fn resolve(source: &str) -> Vec<String> {
        let (tokens, lex_errors) = Scanner::new(source).scan_all();
        assert!(lex_errors.is_empty(), "unexpected lexical errors: {:?}", lex_errors);

        let (statements, parse_errors) = Parser::new(&tokens).parse();
        assert!(parse_errors.is_empty(), "unexpected parse errors: {:?}", parse_errors);

        let mut interpreter = Interpreter::with_output(Box::new(io::sink()));

        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_valid_program_has_no_errors() {
        let errors = resolve(
            "var a = 1;\n\
             var a = 2;\n\
             fun f(x) { { var x = 2; var y = x; } return x; }\n\
             class A { init(n) { this.n = n; return; } get { return inner(); } }\n\
             class B < A { m() { fun g() { return this; } return super.m; } }",
        );

        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_duplicate_local() {
        assert_eq!(
            resolve("{\n  var a = 1;\n  var a = 2;\n}"),
            vec!["[line 3] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_duplicate_parameter() {
        assert_eq!(
            resolve("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_self_referential_initializer() {
        assert_eq!(
            resolve("var a = 1;\n{ var a = a; }"),
            vec!["[line 2] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_return_at_top_level() {
        assert_eq!(
            resolve("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_eq!(
            resolve("class A {\n  init() { return 1; }\n}"),
            vec!["[line 2] Error at 'return': Can't return a value from an initializer."]
        );
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            resolve("fun f() { print this; }"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_super_outside_class() {
        assert_eq!(
            resolve("super.m();"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
    }

    #[test]
    fn test_super_without_superclass() {
        assert_eq!(
            resolve("class A { m() { super.m(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_eq!(
            resolve("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_getter_initializer() {
        assert_eq!(
            resolve("class A { init { } }"),
            vec!["[line 1] Error at 'init': Can't use 'init' as a getter."]
        );
    }

    #[test]
    fn test_errors_accumulate_across_program() {
        assert_eq!(
            resolve("return;\nprint this;\n{ var b; var b; }"),
            vec![
                "[line 1] Error at 'return': Can't return from top-level code.",
                "[line 2] Error at 'this': Can't use 'this' outside of a class.",
                "[line 3] Error at 'b': Already a variable with this name in this scope.",
            ]
        );
    }
}
