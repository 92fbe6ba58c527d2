#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use innerlox as lox;

    use lox::session::{RunError, Session, EXIT_RUNTIME, EXIT_STATIC};
    use pretty_assertions::assert_eq;

    /// In-memory `print` sink that stays readable after being handed over.
    #[derive(Clone, Default)]
    struct SharedOutput(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedOutput {
        fn take(&self) -> String {
            let bytes: Vec<u8> = std::mem::take(&mut *self.0.borrow_mut());
            String::from_utf8(bytes).expect("print output is UTF-8")
        }
    }

    fn session() -> (Session, SharedOutput) {
        let output = SharedOutput::default();
        (Session::with_output(Box::new(output.clone())), output)
    }

    fn run(source: &str) -> (String, Result<(), RunError>) {
        let (mut session, output) = session();
        let result = session.run(source);
        (output.take(), result)
    }

    /// Run a program that must succeed and return its output lines.
    fn run_ok(source: &str) -> Vec<String> {
        let (output, result) = run(source);
        if let Err(e) = result {
            panic!("program failed:\n{}\noutput so far:\n{}", e, output);
        }
        output.lines().map(str::to_string).collect()
    }

    /// Run a program that must fail at runtime; returns (output, diagnostic).
    fn run_runtime_error(source: &str) -> (String, String) {
        match run(source) {
            (output, Err(e @ RunError::Runtime(_))) => {
                assert_eq!(e.exit_code(), EXIT_RUNTIME);
                (output, e.to_string())
            }
            (output, other) => panic!("expected a runtime error, got {:?} ({})", other, output),
        }
    }

    // ── expressions ─────────────────────────────────────────────────────

    #[test]
    fn test_subtraction_is_left_associative() {
        assert_eq!(run_ok("print 1 - 2 - 3;"), vec!["-4"]);
    }

    #[test]
    fn test_arithmetic_and_concatenation() {
        assert_eq!(
            run_ok("print 7 / 2; print 2 * (3 + 4); print \"in\" + \"ner\"; print -(-3);"),
            vec!["3.5", "14", "inner", "3"]
        );
    }

    #[test]
    fn test_integral_numbers_print_without_exponent() {
        assert_eq!(
            run_ok("print 100000000000000000000000; print 1000000; print 2.50;"),
            vec!["99999999999999991611392", "1000000", "2.5"]
        );
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(
            run_ok("print 1 / 0; print -1 / 0; print 0 / 0;"),
            vec!["inf", "-inf", "NaN"]
        );
    }

    #[test]
    fn test_truthiness_and_equality() {
        assert_eq!(
            run_ok(
                "print nil == nil; print 1 == \"1\"; print !0; print !nil; \
                 print \"a\" == \"a\"; print nil != false;"
            ),
            vec!["true", "false", "false", "true", "true", "true"]
        );
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        assert_eq!(
            run_ok("print nil or \"x\"; print 0 and 2; print false and undefined(); print true or undefined;"),
            vec!["x", "2", "false", "true"]
        );
    }

    // ── scoping and closures ────────────────────────────────────────────

    #[test]
    fn test_block_scope_shadowing() {
        assert_eq!(
            run_ok(
                "var a = \"outer\";\n\
                 { var a = \"inner\"; print a; }\n\
                 print a;"
            ),
            vec!["inner", "outer"]
        );

        assert_eq!(
            run_ok("{ var a = 1; { var a = 2; print a; } print a; }"),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_closure_binding_is_static() {
        assert_eq!(
            run_ok(
                "var a = \"global\";\n\
                 {\n\
                   fun show() { print a; }\n\
                   show();\n\
                   var a = \"block\";\n\
                   show();\n\
                 }"
            ),
            vec!["global", "global"]
        );
    }

    #[test]
    fn test_closures_capture_by_reference() {
        assert_eq!(
            run_ok(
                "fun makeCounter() {\n\
                   var i = 0;\n\
                   fun count() { i = i + 1; print i; }\n\
                   return count;\n\
                 }\n\
                 var counter = makeCounter();\n\
                 counter();\n\
                 counter();"
            ),
            vec!["1", "2"]
        );
    }

    #[test]
    fn test_closures_share_their_defining_frame() {
        assert_eq!(
            run_ok(
                "var get;\n\
                 var set;\n\
                 fun mk() {\n\
                   var v = 0;\n\
                   fun g() { return v; }\n\
                   fun s(x) { v = x; }\n\
                   get = g;\n\
                   set = s;\n\
                 }\n\
                 mk();\n\
                 print get();\n\
                 set(5);\n\
                 print get();\n\
                 mk();\n\
                 print get();"
            ),
            vec!["0", "5", "0"]
        );
    }

    #[test]
    fn test_self_referential_initializer_is_rejected() {
        let (output, result) = run("var a = 1;\n{ var a = a; }\nprint a;");

        assert_eq!(output, "");
        match result {
            Err(e @ RunError::Static(_)) => {
                assert_eq!(e.exit_code(), EXIT_STATIC);
                assert_eq!(
                    e.to_string(),
                    "[line 2] Error at 'a': Can't read local variable in its own initializer."
                );
            }
            other => panic!("expected a static error, got {:?}", other),
        }
    }

    // ── control flow and functions ──────────────────────────────────────

    #[test]
    fn test_loops() {
        assert_eq!(
            run_ok(
                "for (var i = 0; i < 3; i = i + 1) print i;\n\
                 var n = 0; while (n < 2) { n = n + 1; } print n;"
            ),
            vec!["0", "1", "2", "2"]
        );
    }

    #[test]
    fn test_return_unwinds_only_to_the_call() {
        assert_eq!(
            run_ok(
                "fun first() {\n\
                   var i = 0;\n\
                   while (true) { if (i == 3) return i; i = i + 1; }\n\
                 }\n\
                 print first();\n\
                 fun nothing() { return; }\n\
                 print nothing();\n\
                 fun implicit() {}\n\
                 print implicit();"
            ),
            vec!["3", "nil", "nil"]
        );
    }

    #[test]
    fn test_recursion() {
        assert_eq!(
            run_ok("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);"),
            vec!["55"]
        );
    }

    #[test]
    fn test_callable_display_forms() {
        assert_eq!(
            run_ok("fun f() {} print f; print clock; print fun () {}; print clock() > 0;"),
            vec!["<fn f>", "<native fn>", "<fn>", "true"]
        );
    }

    #[test]
    fn test_anonymous_functions_are_values() {
        assert_eq!(
            run_ok(
                "fun apply(f, x) { return f(x); }\n\
                 print apply(fun (n) { return n * 10; }, 4);"
            ),
            vec!["40"]
        );
    }

    // ── classes ─────────────────────────────────────────────────────────

    #[test]
    fn test_class_and_instance_display() {
        assert_eq!(
            run_ok("class Bagel {} print Bagel; print Bagel();"),
            vec!["Bagel", "Bagel instance"]
        );
    }

    #[test]
    fn test_instances_compare_by_identity() {
        assert_eq!(
            run_ok("class A {} var a = A(); var b = A(); print a == a; print a == b;"),
            vec!["true", "false"]
        );
    }

    #[test]
    fn test_field_shadows_method() {
        assert_eq!(
            run_ok(
                "class A { m() { return \"method\"; } }\n\
                 var a = A();\n\
                 print a.m();\n\
                 a.m = fun () { return \"field\"; };\n\
                 print a.m();"
            ),
            vec!["method", "field"]
        );
    }

    #[test]
    fn test_field_read_without_call_shadows_method() {
        assert_eq!(
            run_ok(
                "class X { foo() { return \"method\"; } }\n\
                 var x = X();\n\
                 x.foo = 1;\n\
                 print x.foo;"
            ),
            vec!["1"]
        );
    }

    #[test]
    fn test_each_property_read_binds_a_new_method() {
        assert_eq!(
            run_ok(
                "class A { m() { return this.n; } }\n\
                 var a = A();\n\
                 a.n = 3;\n\
                 print a.m == a.m;\n\
                 var f = a.m;\n\
                 var g = a.m;\n\
                 print f == f;\n\
                 print f() == g();\n\
                 a.n = 4;\n\
                 print f();\n\
                 print g();"
            ),
            vec!["false", "true", "true", "4", "4"]
        );
    }

    #[test]
    fn test_methods_bind_this_when_read() {
        assert_eq!(
            run_ok(
                "class Box { init(n) { this.n = n; } get() { return this.n; } }\n\
                 var g = Box(7).get;\n\
                 print g();"
            ),
            vec!["7"]
        );
    }

    #[test]
    fn test_initializer_returns_instance() {
        assert_eq!(
            run_ok(
                "class A { init() { this.v = 1; } }\n\
                 var a = A();\n\
                 print a.init();\n\
                 class B { init() { return; } }\n\
                 print B().init();"
            ),
            vec!["A instance", "B instance"]
        );
    }

    #[test]
    fn test_getters_run_on_read() {
        assert_eq!(
            run_ok(
                "class Circle {\n\
                   init(r) { this.r = r; }\n\
                   area { return 3 * this.r * this.r; }\n\
                 }\n\
                 print Circle(2).area;\n\
                 var c = Circle(1);\n\
                 c.area = \"field\";\n\
                 print c.area;"
            ),
            vec!["12", "field"]
        );
    }

    // ── base-first dispatch ─────────────────────────────────────────────

    #[test]
    fn test_base_method_runs_before_derived() {
        assert_eq!(
            run_ok(
                "class A { greet() { print \"A\"; inner(); } }\n\
                 class B < A { greet() { print \"B\"; } }\n\
                 B().greet();"
            ),
            vec!["A", "B"]
        );
    }

    #[test]
    fn test_base_method_without_inner_wins() {
        assert_eq!(
            run_ok(
                "class A { m() { return \"A\"; } }\n\
                 class B < A { m() { return \"B\"; } }\n\
                 print B().m();"
            ),
            vec!["A"]
        );
    }

    #[test]
    fn test_inner_chain_across_three_levels() {
        assert_eq!(
            run_ok(
                "class A { m() { print \"A start\"; inner(); print \"A end\"; } }\n\
                 class B < A { m() { print \"B start\"; inner(); print \"B end\"; } }\n\
                 class C < B { m() { print \"C\"; inner(); } }\n\
                 C().m();"
            ),
            vec!["A start", "B start", "C", "B end", "A end"]
        );
    }

    #[test]
    fn test_inner_skips_classes_without_a_definition() {
        assert_eq!(
            run_ok(
                "class A { m() { print \"A\"; inner(); } }\n\
                 class B < A {}\n\
                 class C < B { m() { print \"C\"; } }\n\
                 C().m();"
            ),
            vec!["A", "C"]
        );
    }

    #[test]
    fn test_inner_passes_arguments_and_returns_values() {
        assert_eq!(
            run_ok(
                "class A { wrap(s) { return \"<\" + inner(s) + \">\"; } }\n\
                 class B < A { wrap(s) { return s + \"!\"; } }\n\
                 print B().wrap(\"hi\");"
            ),
            vec!["<hi!>"]
        );
    }

    #[test]
    fn test_inner_without_override_is_a_no_op() {
        assert_eq!(
            run_ok("class A { m() { print inner(); print \"done\"; } } A().m();"),
            vec!["nil", "done"]
        );
    }

    #[test]
    fn test_initializers_chain_base_first() {
        assert_eq!(
            run_ok(
                "class A { init(x) { this.x = x; inner(x); } }\n\
                 class B < A { init(x) { this.y = x * 2; } }\n\
                 var b = B(3);\n\
                 print b.x;\n\
                 print b.y;"
            ),
            vec!["3", "6"]
        );
    }

    #[test]
    fn test_getters_chain_through_inner() {
        assert_eq!(
            run_ok(
                "class A { name { return \"A>\" + inner(); } }\n\
                 class B < A { name { return \"B\"; } }\n\
                 print B().name;"
            ),
            vec!["A>B"]
        );
    }

    #[test]
    fn test_super_starts_the_chain_at_the_superclass() {
        assert_eq!(
            run_ok(
                "class A { m() { return \"A.m\"; } }\n\
                 class B < A { test() { return super.m(); } }\n\
                 print B().test();"
            ),
            vec!["A.m"]
        );
    }

    // ── runtime errors ──────────────────────────────────────────────────

    #[test]
    fn test_undefined_global_reports_its_line() {
        let (output, error) = run_runtime_error("print 1;\nprint nope;");

        assert_eq!(output, "1\n");
        assert_eq!(error, "Undefined variable 'nope'.\n[line 2]");
    }

    #[test]
    fn test_arity_mismatch() {
        let (_, error) = run_runtime_error("fun f(a, b) {}\nf(1);");

        assert_eq!(error, "Expected 2 arguments but got 1.\n[line 2]");
    }

    #[test]
    fn test_class_arity_comes_from_initializer() {
        let (_, error) = run_runtime_error("class A {}\nA(1);");
        assert_eq!(error, "Expected 0 arguments but got 1.\n[line 2]");

        let (_, error) =
            run_runtime_error("class A { init(a, b) {} }\nclass B < A {}\nB(1);");
        assert_eq!(error, "Expected 2 arguments but got 1.\n[line 3]");

        assert_eq!(
            run_ok(
                "class A { init(a, b) { this.sum = a + b; } }\n\
                 class B < A {}\n\
                 print B(1, 2).sum;"
            ),
            vec!["3"]
        );
    }

    #[test]
    fn test_operand_type_errors() {
        let cases: [(&str, &str); 7] = [
            ("-\"a\";", "Operand must be a number."),
            ("1 < \"a\";", "Operands must be numbers."),
            ("\"a\" * 2;", "Operands must be numbers."),
            ("nil / nil;", "Operands must be numbers."),
            ("1 + nil;", "Operands must be two numbers or two strings."),
            ("\"x\"();", "Can only call functions and classes."),
            ("nope = 1;", "Undefined variable 'nope'."),
        ];

        for (source, message) in cases {
            let (_, error) = run_runtime_error(source);
            assert_eq!(error, format!("{}\n[line 1]", message), "source: {}", source);
        }
    }

    #[test]
    fn test_property_errors() {
        let cases: [(&str, &str); 4] = [
            ("var a = 1; a.b;", "Only instances have properties."),
            ("var a = 1; a.b = 2;", "Only instances have fields."),
            ("class A {} A().missing;", "Undefined property 'missing'."),
            ("var N = 1; class B < N {}", "Superclass must be a class."),
        ];

        for (source, message) in cases {
            let (_, error) = run_runtime_error(source);
            assert_eq!(error, format!("{}\n[line 1]", message), "source: {}", source);
        }
    }

    // ── sessions ────────────────────────────────────────────────────────

    #[test]
    fn test_static_errors_prevent_execution() {
        let (output, result) = run("print 1;\nreturn 2;");

        assert_eq!(output, "");
        assert!(matches!(result, Err(RunError::Static(ref errors)) if errors.len() == 1));
    }

    #[test]
    fn test_lexical_errors_are_static() {
        let (_, result) = run("print 1; @");

        match result {
            Err(e @ RunError::Static(_)) => {
                assert_eq!(e.to_string(), "[line 1] Error: Unexpected character: @");
            }
            other => panic!("expected a static error, got {:?}", other),
        }
    }

    #[test]
    fn test_session_keeps_globals_between_runs() {
        let (mut session, output) = session();

        session.run("var a = 1;").expect("define a");
        session
            .run("fun f() { return a + 1; }")
            .expect("define f");
        session.run("print f();").expect("call f");

        assert_eq!(output.take(), "2\n");
    }

    #[test]
    fn test_session_recovers_after_runtime_error() {
        let (mut session, output) = session();

        session
            .run("fun boom() { var x = 1; return x + nil; }")
            .expect("define boom");
        assert!(matches!(session.run("boom();"), Err(RunError::Runtime(_))));

        session.run("var z = 5; print z;").expect("session still usable");
        assert_eq!(output.take(), "5\n");
    }
}
