//! End-to-end scenarios run through the full lexer → parser → resolver →
//! interpreter pipeline via `run_source`, the way a `.dh` script actually
//! executes.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use dharma::{run_source, Config};
use pretty_assertions::assert_eq;

/// A `Write` sink that collects everything into a shared buffer so the test
/// can inspect it after `run_source` has consumed the boxed writer.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

fn run(source: &str) -> (bool, String, Vec<String>) {
    let buf = SharedBuffer::default();
    let outcome = run_source(source, Config::default(), Box::new(buf.clone()));
    (outcome.ok, buf.text(), outcome.rendered)
}

// =============================================================================
// 1. Arithmetic and the numeric tower
// =============================================================================

#[test]
fn prints_integer_arithmetic() {
    let (ok, out, _) = run("print 2 + 3 * 4;");
    assert!(ok, "program should run cleanly");
    assert_eq!(out, "14\n");
}

#[test]
fn integer_division_truncates_toward_zero() {
    let (ok, out, _) = run("print 7 / 2;");
    assert!(ok);
    assert_eq!(out, "3\n");
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let (ok, _, rendered) = run("print 1 / 0;");
    assert!(!ok, "dividing by zero must not succeed");
    assert!(rendered.iter().any(|r| r.contains("RuntimeError")), "got: {rendered:?}");
}

#[test]
fn mixed_integer_and_decimal_promotes_to_decimal() {
    let (ok, out, _) = run("print 1 + 0.5;");
    assert!(ok);
    assert_eq!(out, "1.5\n");
}

#[test]
fn big_decimal_literal_survives_arithmetic() {
    let (ok, out, _) = run("BigDecimal x = 1.5; print x + 1.5;");
    assert!(ok);
    assert_eq!(out, "3\n");
}

#[test]
fn string_concatenation_via_plus() {
    let (ok, out, _) = run(r#"print "a" + "b" + 1;"#);
    assert!(ok);
    assert_eq!(out, "'ab1'\n");
}

// =============================================================================
// 2. Variables, types, and assignment
// =============================================================================

#[test]
fn var_is_untyped_and_accepts_anything() {
    let (ok, out, _) = run("var x = 1; x = \"now a string\"; print x;");
    assert!(ok);
    assert_eq!(out, "'now a string'\n");
}

#[test]
fn typed_binding_rejects_mismatched_assignment() {
    let (ok, _, rendered) = run(r#"integer x = 1; x = "oops";"#);
    assert!(!ok);
    assert!(rendered.iter().any(|r| r.contains("RuntimeError")), "got: {rendered:?}");
}

#[test]
fn declaration_initializer_folds_silently_at_parse_time() {
    // A literal initializer is folded into the declared type by the parser
    // itself (SPEC_FULL §4.3), so no warning fires here.
    let (ok, out, rendered) = run("decimal x = 1; print x;");
    assert!(ok, "integer literal should fold to decimal: {rendered:?}");
    assert_eq!(out, "1\n");
    assert!(!rendered.iter().any(|r| r.contains("ImplicitConversionWarning")));
}

#[test]
fn later_assignment_promotes_at_runtime_with_warning() {
    let (ok, out, rendered) = run("decimal x = 0; x = 2; print x;");
    assert!(ok, "assigning an integer into a decimal binding should promote: {rendered:?}");
    assert_eq!(out, "2\n");
    assert!(rendered.iter().any(|r| r.contains("ImplicitConversionWarning")), "got: {rendered:?}");
}

#[test]
fn compound_assignment_desugars_correctly() {
    let (ok, out, _) = run("integer x = 10; x -= 3; print x;");
    assert!(ok);
    assert_eq!(out, "7\n");
}

#[test]
fn post_increment_returns_old_value_pre_increment_returns_new() {
    let (ok, out, _) = run("integer x = 1; print x++; print x; print ++x; print x;");
    assert!(ok);
    assert_eq!(out, "1\n2\n3\n3\n");
}

// =============================================================================
// 3. Control flow
// =============================================================================

#[test]
fn while_loop_accumulates() {
    let (ok, out, _) = run("integer i = 0; integer total = 0; while (i < 5) { total += i; i += 1; } print total;");
    assert!(ok);
    assert_eq!(out, "10\n");
}

#[test]
fn for_loop_counts_up() {
    let (ok, out, _) = run("for (integer i = 0; i < 3; i += 1) { print i; }");
    assert!(ok);
    assert_eq!(out, "0\n1\n2\n");
}

#[test]
fn elif_chain_picks_first_true_branch() {
    let (ok, out, _) = run(
        r#"
        integer x = 2;
        if (x == 1) { print "one"; }
        elif (x == 2) { print "two"; }
        else { print "other"; }
        "#,
    );
    assert!(ok);
    assert_eq!(out, "'two'\n");
}

// =============================================================================
// 4. Logical operator value semantics (Open Question 1)
// =============================================================================

#[test]
fn or_returns_the_deciding_operand_value() {
    let (ok, out, _) = run(r#"print nil or "fallback";"#);
    assert!(ok);
    assert_eq!(out, "'fallback'\n");
}

#[test]
fn double_pipe_always_collapses_to_boolean() {
    let (ok, out, _) = run(r#"print nil || "fallback";"#);
    assert!(ok);
    assert_eq!(out, "true\n");
}

#[test]
fn and_short_circuits_without_evaluating_right() {
    let (ok, out, _) = run(r#"print false and (1 / 0);"#);
    assert!(ok, "short-circuit should skip the division entirely");
    assert_eq!(out, "false\n");
}

// =============================================================================
// 5. Functions
// =============================================================================

#[test]
fn function_call_and_return() {
    let (ok, out, _) = run(
        r#"
        fun add(integer a, integer b) -> integer { return a + b; }
        print add(2, 3);
        "#,
    );
    assert!(ok);
    assert_eq!(out, "5\n");
}

#[test]
fn function_without_return_yields_nil() {
    let (ok, out, _) = run(
        r#"
        fun noop() { integer unused = 1; }
        print noop();
        "#,
    );
    assert!(ok);
    assert_eq!(out, "nil\n");
}

#[test]
fn closures_capture_their_defining_environment() {
    let (ok, out, _) = run(
        r#"
        fun makeCounter() -> function {
            integer count = 0;
            fun inc() -> integer { count += 1; return count; }
            return inc;
        }
        var counter = makeCounter();
        print counter();
        print counter();
        print counter();
        "#,
    );
    assert!(ok);
    assert_eq!(out, "1\n2\n3\n");
}

#[test]
fn argument_binding_is_strict_no_promotion() {
    let (ok, _, rendered) = run(
        r#"
        fun takesDecimal(decimal d) -> decimal { return d; }
        takesDecimal(1);
        "#,
    );
    assert!(!ok, "argument binding must not silently promote integer to decimal");
    assert!(rendered.iter().any(|r| r.contains("RuntimeError")), "got: {rendered:?}");
}

#[test]
fn return_value_promotes_with_warning() {
    let (ok, out, rendered) = run(
        r#"
        fun makeDecimal() -> decimal { return 1; }
        print makeDecimal();
        "#,
    );
    assert!(ok, "return value should promote from integer to decimal: {rendered:?}");
    assert_eq!(out, "1\n");
    assert!(rendered.iter().any(|r| r.contains("ImplicitConversionWarning")));
}

// =============================================================================
// 6. Classes and instances
// =============================================================================

#[test]
fn class_instantiation_and_method_call() {
    let (ok, out, _) = run(
        r#"
        class Greeter {
            fun init(string name) {
                this.name = name;
            }
            fun greet() -> string {
                return "hello " + this.name;
            }
        }
        var g = Greeter("world");
        print g.greet();
        "#,
    );
    assert!(ok);
    assert_eq!(out, "'hello world'\n");
}

#[test]
fn init_always_returns_this_even_with_bare_return() {
    let (ok, out, _) = run(
        r#"
        class Thing {
            fun init() {
                return;
            }
        }
        var t = Thing();
        print typeOf(t);
        "#,
    );
    assert!(ok);
    assert_eq!(out, "'instance'\n");
}

#[test]
fn subclass_inherits_superclass_methods() {
    let (ok, out, _) = run(
        r#"
        class Animal {
            fun speak() -> string { return "..."; }
        }
        class Dog extends Animal {
            fun bark() -> string { return "woof"; }
        }
        var d = Dog();
        print d.speak();
        print d.bark();
        "#,
    );
    assert!(ok);
    assert_eq!(out, "'...'\n'woof'\n");
}

#[test]
fn accessing_undefined_property_is_a_runtime_error() {
    let (ok, _, rendered) = run(
        r#"
        class Empty {
            fun init() {}
        }
        var e = Empty();
        print e.missing;
        "#,
    );
    assert!(!ok);
    assert!(rendered.iter().any(|r| r.contains("RuntimeError")), "got: {rendered:?}");
}

// =============================================================================
// 7. Built-in natives
// =============================================================================

#[test]
fn type_of_reports_dynamic_tags() {
    let (ok, out, _) = run(
        r#"
        print typeOf(1);
        print typeOf(1.5);
        print typeOf("s");
        print typeOf(true);
        print typeOf(nil);
        "#,
    );
    assert!(ok);
    assert_eq!(out, "'integer'\n'decimal'\n'string'\n'boolean'\n'nil'\n");
}

#[test]
fn type_of_a_bare_identifier_reports_its_declared_type() {
    let (ok, out, _) = run(
        r#"
        decimal x = 1;
        var y = 2;
        print typeOf(x);
        print typeOf(y);
        "#,
    );
    assert!(ok);
    assert_eq!(out, "'decimal'\n'variable integer'\n");
}

#[test]
fn display_formats_for_callables_and_instances() {
    let (ok, out, _) = run(
        r#"
        fun greet() { return nil; }
        class Greeter {}
        var g = Greeter();
        print greet;
        print typeOf;
        print Greeter;
        print g;
        "#,
    );
    assert!(ok);
    assert_eq!(out, "<fn greet>\n<native fn>\n<class Greeter>\n<Greeter instance>\n");
}

#[test]
fn clock_returns_a_decimal() {
    let (ok, out, _) = run("print typeOf(clock());");
    assert!(ok);
    assert_eq!(out, "'decimal'\n");
}

// =============================================================================
// 8. Diagnostics halt cleanly
// =============================================================================

#[test]
fn undefined_variable_is_a_runtime_error_not_a_panic() {
    let (ok, _, rendered) = run("print doesNotExist;");
    assert!(!ok);
    assert!(rendered.iter().any(|r| r.contains("Undefined variable")), "got: {rendered:?}");
}

#[test]
fn a_parse_error_does_not_execute_anything() {
    let (ok, out, rendered) = run("integer x = ;");
    assert!(!ok);
    assert!(out.is_empty());
    assert!(rendered.iter().any(|r| r.contains("ParseError")), "got: {rendered:?}");
}
