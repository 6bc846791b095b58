//! End-to-end pipeline tests, one per literal scenario and invariant.

use o3c::lower::CompileOptions;

fn compile(source: &str) -> o3c::CompileOutput {
    o3c::compile(source, &CompileOptions::default())
}

#[test]
fn global_sum_feeds_main_and_entry_calls_it() {
    let output = compile("module m; let g = 1 + 2; fn main() -> i32 { return g; }");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let ir = output.ir.expect("clean compile produces IR").to_string();
    assert!(ir.contains("@g = global i32 3, align 4"), "{ir}");
    assert!(ir.contains("define i32 @main()"), "{ir}");
    assert!(ir.contains("call i32 @main()"), "{ir}");
    assert!(ir.contains("define i32 @o3_entry()"), "{ir}");
}

#[test]
fn pure_function_sending_a_message_is_a_single_violation() {
    let output = compile("module m; pure fn f(x: i32) -> i32 { let y = [self foo:x]; return y; }");
    assert_eq!(output.diagnostics.len(), 1, "{:?}", output.diagnostics);
    let diag = &output.diagnostics[0];
    assert_eq!(diag.code.as_deref(), Some("O3S215"));
    assert_eq!(diag.pos.line, 1);
}

#[test]
fn missing_return_path_is_a_single_diagnostic() {
    let output = compile("module m; fn f(x: bool) -> i32 { if (x) { return 1; } }");
    assert_eq!(output.diagnostics.len(), 1, "{:?}", output.diagnostics);
    assert_eq!(output.diagnostics[0].code.as_deref(), Some("O3S205"));
}

#[test]
fn binary_literal_with_digit_separator_folds_to_two() {
    let output = compile("module m; fn f() -> i32 { let x = 0b1_0; return x; }");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let ir = output.ir.expect("clean compile produces IR").to_string();
    assert!(ir.contains("i32 2"), "{ir}");
}

#[test]
fn nil_receiver_never_reaches_the_dispatch_symbol() {
    let output = compile("module m; fn f() -> i32 { return [nil selector:1]; }");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let ir = output.ir.expect("clean compile produces IR").to_string();
    let dispatch_symbol = &CompileOptions::default().runtime_dispatch_symbol;
    let call_pattern = format!("call i32 @{}(", dispatch_symbol);
    assert!(
        !ir.contains(&call_pattern),
        "unexpected call to the runtime dispatch symbol for a nil-literal receiver:\n{ir}"
    );
}

#[test]
fn duplicate_module_declaration_is_one_diagnostic() {
    let output = compile("module m; module m;");
    assert_eq!(output.diagnostics.len(), 1, "{:?}", output.diagnostics);
    assert_eq!(output.diagnostics[0].code.as_deref(), Some("O3S200"));
}

#[test]
fn diagnostics_are_sorted_and_deduplicated() {
    let output = compile("module m; module m; module m;");
    let mut sorted = output.diagnostics.clone();
    sorted.sort_by_key(|d| (d.pos.line, d.pos.column, d.code.clone()));
    sorted.dedup();
    assert_eq!(output.diagnostics, sorted);
}

#[test]
fn clean_compile_emits_one_define_per_defined_function_and_one_declare_per_prototype() {
    let output = compile(
        "module m; \
         extern fn helper(x: i32) -> i32; \
         fn main() -> i32 { return helper(1); }",
    );
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let ir = output.ir.expect("clean compile produces IR").to_string();
    assert_eq!(ir.matches("define i32 @main()").count(), 1);
    assert_eq!(ir.matches("declare i32 @helper(i32 %x)").count(), 1);
}

#[test]
fn constant_global_initializer_matches_the_reference_evaluator() {
    let output = compile("module m; let a = 2; let b = a * 3 - 1; fn main() -> i32 { return b; }");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let ir = output.ir.expect("clean compile produces IR").to_string();
    assert!(ir.contains("@b = global i32 5, align 4"), "{ir}");
}

#[test]
fn non_constant_global_initializer_is_flagged() {
    let output = compile("module m; fn side() -> i32 { return 1; } let g = side();");
    assert!(output.diagnostics.iter().any(|d| d.code.as_deref() == Some("O3S210")), "{:?}", output.diagnostics);
}

#[test]
fn message_send_argument_count_over_the_configured_bound_is_flagged() {
    let options = CompileOptions { max_message_send_args: 1, ..CompileOptions::default() };
    let output = o3c::compile(
        "module m; fn f() -> i32 { return [nil sel:1 arg:2]; }",
        &options,
    );
    assert!(output.diagnostics.iter().any(|d| d.code.as_deref() == Some("O3S208")), "{:?}", output.diagnostics);
}
