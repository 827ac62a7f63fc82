//! Tests for the C++ front end feeding the rewrite engine

use pretty_assertions::assert_eq;

use super::*;
use crate::rewriter::{rewrite, RewriteOutput};
use crate::tree::NodeKind;
use crate::RewriteConfig;

fn rewrite_cpp(source: &str) -> RewriteOutput {
    rewrite_cpp_with(source, &RewriteConfig::default())
}

fn rewrite_cpp_with(source: &str, config: &RewriteConfig) -> RewriteOutput {
    let mut frontend = CppFrontend::new(config.target_type.clone()).unwrap();
    let tree = frontend.parse(source).unwrap();
    rewrite(source, &tree, config).unwrap()
}

#[test]
fn test_sum_of_parameters() {
    let output = rewrite_cpp("complex f(complex a, complex b) { return a + b; }\n");
    assert_eq!(
        output.text,
        "complex f(complex a, complex b) { return complex_add(a,b); }\n"
    );
    assert_eq!(output.report.rewrites_of("complex_add"), 1);
}

#[test]
fn test_division_by_converted_scalar() {
    let source = "complex g(complex eta, float lambda) {\n    return eta / complex(lambda);\n}\n";
    let output = rewrite_cpp(source);
    assert_eq!(
        output.text,
        "complex g(complex eta, float lambda) {\n    return complex_div(eta,to_complex(lambda));\n}\n"
    );
}

#[test]
fn test_mixed_operands_pick_real_variants() {
    let output = rewrite_cpp("complex h(complex z, float x) { return z * x + x * z; }");
    assert_eq!(
        output.text,
        "complex h(complex z, float x) { return complex_add(complex_mul_real(z,x),real_mul_complex(x,z)); }"
    );
    assert_eq!(output.report.total_rewrites(), 3);
}

#[test]
fn test_builtin_arithmetic_is_untouched() {
    let source = "float k(float x, int n) { return x * n + 1.0f; }\n";
    let output = rewrite_cpp(source);
    assert_eq!(output.text, source);
    assert!(!output.changed());
}

#[test]
fn test_parenthesized_operand_keeps_parentheses() {
    let output = rewrite_cpp("complex p(complex a, complex b, complex c) { return (a + b) * c; }");
    assert_eq!(
        output.text,
        "complex p(complex a, complex b, complex c) { return complex_mul((complex_add(a,b)),c); }"
    );
}

#[test]
fn test_record_fields_are_typed() {
    let source = "struct complex { float re; float im; };\n\
                  complex scale(complex z) { return z.re * z; }\n";
    let output = rewrite_cpp(source);
    assert_eq!(
        output.text,
        "struct complex { float re; float im; };\n\
         complex scale(complex z) { return real_mul_complex(z.re,z); }\n"
    );
}

#[test]
fn test_member_function_sees_this() {
    let source = "struct complex {\n    float re, im;\n    complex twice() { return *this + *this; }\n};\n";
    let output = rewrite_cpp(source);
    assert_eq!(
        output.text,
        "struct complex {\n    float re, im;\n    complex twice() { return complex_add(*this,*this); }\n};\n"
    );
}

#[test]
fn test_copy_construction_is_not_a_conversion() {
    let output = rewrite_cpp("complex c(complex z) { return complex(z) + z; }");
    assert_eq!(
        output.text,
        "complex c(complex z) { return complex_add(complex(z),z); }"
    );
    assert_eq!(output.report.rewrites_of("to_complex"), 0);
}

#[test]
fn test_local_declarations_are_scoped() {
    let source = "complex f(float x) {\n    complex y = x;\n    return y * x;\n}\nfloat g(float y, float x) { return y * x; }\n";
    let output = rewrite_cpp(source);
    assert_eq!(
        output.text,
        "complex f(float x) {\n    complex y = x;\n    return complex_mul_real(y,x);\n}\nfloat g(float y, float x) { return y * x; }\n"
    );
}

#[test]
fn test_auto_takes_initializer_type() {
    let source = "complex f(complex a, complex b) { auto w = a + b; return w * w; }";
    let output = rewrite_cpp(source);
    assert_eq!(
        output.text,
        "complex f(complex a, complex b) { auto w = complex_add(a,b); return complex_mul(w,w); }"
    );
}

#[test]
fn test_function_return_types_are_known() {
    let source = "complex unit();\ncomplex f(float s) { return unit() * s; }\n";
    let output = rewrite_cpp(source);
    assert_eq!(
        output.text,
        "complex unit();\ncomplex f(float s) { return complex_mul_real(unit(),s); }\n"
    );
}

#[test]
fn test_configured_target_type() {
    let config = RewriteConfig::default().with_target_type("quat");
    let source = "quat q(quat a, float s, complex c) { return a * s; }";
    let output = rewrite_cpp_with(source, &config);
    assert_eq!(
        output.text,
        "quat q(quat a, float s, complex c) { return quat_mul_real(a,s); }"
    );
}

#[test]
fn test_comments_outside_expressions_survive() {
    let source = "// sum\ncomplex f(complex a, complex b) {\n    /* keep */ return a - b; // tail\n}\n";
    let output = rewrite_cpp(source);
    assert_eq!(
        output.text,
        "// sum\ncomplex f(complex a, complex b) {\n    /* keep */ return complex_sub(a,b); // tail\n}\n"
    );
}

#[test]
fn test_second_pass_finds_nothing() {
    let first = rewrite_cpp("complex f(complex a, float x) { return a * x - a; }");
    let second = rewrite_cpp(&first.text);
    assert_eq!(second.report.total_rewrites(), 0);
    assert_eq!(second.text, first.text);
}

#[test]
fn test_lowered_kinds() {
    let source = "complex f(complex a, float x) { return a + complex(x); }";
    let mut frontend = CppFrontend::new("complex").unwrap();
    let tree = frontend.parse(source).unwrap();

    let calls: Vec<_> = tree
        .nodes_of_kind(&NodeKind::BinaryOperatorCall(crate::tree::BinaryOp::Add))
        .collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(tree.node(calls[0]).range.slice(source), Some("a + complex(x)"));

    let ctors: Vec<_> = tree
        .nodes_of_kind(&NodeKind::ConvertingConstructorCall)
        .collect();
    assert_eq!(ctors.len(), 1);
    let ctor = tree.node(ctors[0]);
    assert_eq!(ctor.operands.len(), 1);
    assert_eq!(tree.node(ctor.operands[0]).ty.as_deref(), Some("float"));
}

#[test]
fn test_unknown_frontend_is_rejected() {
    assert!(create_frontend("fortran", "complex").is_err());
    let frontend = create_frontend("cpp", "complex").unwrap();
    assert_eq!(frontend.name(), "cpp");
}

#[test]
fn test_lambda_parameters_are_bound() {
    let output = rewrite_cpp("complex f(complex a) { return a * [](complex q){ return q + q; }(a); }");
    assert_eq!(
        output.text,
        "complex f(complex a) { return complex_mul_real(a,[](complex q){ return complex_add(q,q); }(a)); }"
    );
}

#[test]
fn test_lambda_parameters_do_not_leak() {
    let source = "float g(float q) { auto h = [](complex q){ return q * q; }; return q * q; }";
    let output = rewrite_cpp(source);
    assert_eq!(
        output.text,
        "float g(float q) { auto h = [](complex q){ return complex_mul(q,q); }; return q * q; }"
    );
}

#[test]
fn test_deep_operator_chain_lowers_iteratively() {
    const TERMS: usize = 20_000;
    let source = format!("complex f(complex a) {{ return {}; }}", vec!["a"; TERMS].join(" + "));

    let mut frontend = CppFrontend::new("complex").unwrap();
    let tree = frontend.parse(&source).unwrap();

    let sums = tree
        .nodes_of_kind(&NodeKind::BinaryOperatorCall(crate::tree::BinaryOp::Add))
        .count();
    assert_eq!(sums, TERMS - 1);
}
