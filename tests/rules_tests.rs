//! Rule-level checks: one construction per reachability rule family,
//! verifying both the kept side (alive stays unreported) and the dropped
//! side (dead gets reported).

use deadreach::checker::Checker;
use deadreach::config::Config;
use deadreach::ir::{CallTarget, Instr, OtherOp, ValueDef, ValueId};
use deadreach::program::{Program, ProgramBuilder};
use deadreach::sem::BasicKind;
use deadreach::Unused;

fn reported_names(prog: &Program, unused: &[Unused]) -> Vec<String> {
    let mut names: Vec<String> = unused
        .iter()
        .map(|u| prog.obj(u.obj).name.clone())
        .collect();
    names.sort();
    names
}

fn check(prog: &Program) -> Vec<String> {
    let unused = Checker::new().check(prog);
    reported_names(prog, &unused)
}

#[test]
fn init_functions_are_rooted() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");
    b.func("init", pkg, vec![], vec![]);
    b.func("leftover", pkg, vec![], vec![]);
    let prog = b.finish();

    assert_eq!(check(&prog), vec!["leftover"]);
}

#[test]
fn exported_and_used_constants_survive() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");
    let int = b.basic(BasicKind::Int);

    b.constant("MaxRetries", pkg, int, None);
    let used = b.constant("bufSize", pkg, int, None);
    b.constant("oldLimit", pkg, int, None);

    let (_, f_fn) = b.func("F", pkg, vec![], vec![]);
    b.use_const(Some(f_fn), used);
    let prog = b.finish();

    assert_eq!(check(&prog), vec!["oldLimit"]);
}

#[test]
fn constant_used_in_dead_function_dies_with_it() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");
    let int = b.basic(BasicKind::Int);

    let c = b.constant("bufSize", pkg, int, None);
    let (_, g_fn) = b.func("g", pkg, vec![], vec![]);
    b.use_const(Some(g_fn), c);
    let prog = b.finish();

    assert_eq!(check(&prog), vec!["bufSize", "g"]);
}

#[test]
fn constant_referenced_at_package_scope_is_rooted() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");
    let int = b.basic(BasicKind::Int);

    let c = b.constant("defaultCap", pkg, int, None);
    b.use_const(None, c);
    let prog = b.finish();

    assert_eq!(check(&prog), Vec::<String>::new());
}

#[test]
fn dead_function_parameters_are_quieted() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");

    let (_, t) = b.named_type("Conn", pkg);
    let st = b.struct_of(vec![]);
    b.set_underlying(t, st);

    let param = b.var("c", pkg, t);
    b.func("drop", pkg, vec![param], vec![]);
    let prog = b.finish();

    // the parameter's node is dead too, but only the function is the story
    assert_eq!(check(&prog), vec!["drop"]);
}

#[test]
fn members_of_a_dead_type_are_quieted() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");
    let int = b.basic(BasicKind::Int);

    let (_, t) = b.named_type("scratch", pkg);
    let x = b.field("x", pkg, int);
    let st = b.struct_of(vec![x]);
    b.set_underlying(t, st);
    b.method(t, "reset", false, vec![], vec![]);
    let prog = b.finish();

    // the type is the report; its field and method stay quiet
    assert_eq!(check(&prog), vec!["scratch"]);
}

#[test]
fn static_call_keeps_callee_alive() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");

    let (_, helper_fn) = b.func("helper", pkg, vec![], vec![]);
    let (_, f_fn) = b.func("F", pkg, vec![], vec![]);
    let callee = b.value(f_fn, ValueDef::Func(helper_fn));
    b.instr(
        f_fn,
        0,
        Instr::Call {
            target: CallTarget::Static(callee),
            ty: None,
        },
    );
    let prog = b.finish();

    assert_eq!(check(&prog), Vec::<String>::new());
}

#[test]
fn call_through_phi_merge_keeps_all_candidates() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");

    let (_, left_fn) = b.func("left", pkg, vec![], vec![]);
    let (_, right_fn) = b.func("right", pkg, vec![], vec![]);
    let (_, f_fn) = b.func("F", pkg, vec![], vec![]);
    let l = b.value(f_fn, ValueDef::Func(left_fn));
    let r = b.value(f_fn, ValueDef::Func(right_fn));
    let merged = b.value(f_fn, ValueDef::Phi(vec![l, r]));
    b.instr(
        f_fn,
        0,
        Instr::Call {
            target: CallTarget::Static(merged),
            ty: None,
        },
    );
    let prog = b.finish();

    assert_eq!(check(&prog), Vec::<String>::new());
}

#[test]
fn phi_cycles_terminate() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");

    let (_, target_fn) = b.func("looped", pkg, vec![], vec![]);
    let (_, f_fn) = b.func("F", pkg, vec![], vec![]);
    // v0 = the function, v1 and v2 = mutually recursive merge points
    let t = b.value(f_fn, ValueDef::Func(target_fn));
    let p1 = b.value(f_fn, ValueDef::Phi(vec![ValueId(2), t]));
    let p2 = b.value(f_fn, ValueDef::Phi(vec![p1]));
    b.instr(
        f_fn,
        0,
        Instr::Call {
            target: CallTarget::Static(p2),
            ty: None,
        },
    );
    let prog = b.finish();

    assert_eq!(check(&prog), Vec::<String>::new());
}

#[test]
fn wrapper_call_reaches_the_real_function() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");

    let (helper_obj, helper_fn) = b.func("helper", pkg, vec![], vec![]);
    let wrapper = b.synthetic_wrapper("helper$bound", helper_obj, pkg);
    let inner = b.value(wrapper, ValueDef::Func(helper_fn));
    b.instr(
        wrapper,
        0,
        Instr::Call {
            target: CallTarget::Static(inner),
            ty: None,
        },
    );

    let (_, f_fn) = b.func("F", pkg, vec![], vec![]);
    let callee = b.value(f_fn, ValueDef::Func(wrapper));
    b.instr(
        f_fn,
        0,
        Instr::Call {
            target: CallTarget::Static(callee),
            ty: None,
        },
    );
    let prog = b.finish();

    assert_eq!(check(&prog), Vec::<String>::new());
}

#[test]
fn returned_function_is_presumed_called() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");

    let (_, g_fn) = b.func("callback", pkg, vec![], vec![]);
    let (_, f_fn) = b.func("F", pkg, vec![], vec![]);
    let v = b.value(f_fn, ValueDef::Func(g_fn));
    b.instr(f_fn, 0, Instr::Return { results: vec![v] });
    let prog = b.finish();

    assert_eq!(check(&prog), Vec::<String>::new());
}

#[test]
fn closure_creation_keeps_the_inner_function() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");

    let (_, inner_fn) = b.func("task", pkg, vec![], vec![]);
    let sig = b.signature(None, vec![], vec![]);
    let (_, f_fn) = b.func("F", pkg, vec![], vec![]);
    b.instr(
        f_fn,
        0,
        Instr::MakeClosure {
            func: inner_fn,
            ty: sig,
        },
    );
    let prog = b.finish();

    assert_eq!(check(&prog), Vec::<String>::new());
}

#[test]
fn anonymous_functions_live_with_their_parent() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");

    let (_, helper_fn) = b.func("helper", pkg, vec![], vec![]);
    let sig = b.signature(None, vec![], vec![]);
    let (_, f_fn) = b.func("F", pkg, vec![], vec![]);
    let anon = b.anon_func(f_fn, pkg, sig);
    let callee = b.value(anon, ValueDef::Func(helper_fn));
    b.instr(
        anon,
        0,
        Instr::Call {
            target: CallTarget::Static(callee),
            ty: None,
        },
    );
    let prog = b.finish();

    assert_eq!(check(&prog), Vec::<String>::new());
}

#[test]
fn field_access_keeps_the_field() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");
    let int = b.basic(BasicKind::Int);

    let (_, t) = b.named_type("State", pkg);
    let live = b.field("count", pkg, int);
    let dead = b.field("stale", pkg, int);
    let st = b.struct_of(vec![live, dead]);
    b.set_underlying(t, st);

    let ptr = b.pointer_to(t);
    let (_, f_fn) = b.func("Bump", pkg, vec![], vec![]);
    b.instr(
        f_fn,
        0,
        Instr::FieldAccess {
            recv: ptr,
            field: 0,
            ty: int,
        },
    );
    let prog = b.finish();

    assert_eq!(check(&prog), vec!["stale"]);
}

#[test]
fn unsafe_pointer_conversion_marks_every_field() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");
    let int = b.basic(BasicKind::Int);
    let unsafe_ptr = b.basic(BasicKind::UnsafePointer);

    let (_, t) = b.named_type("Raw", pkg);
    let a = b.field("a", pkg, int);
    let z = b.field("z", pkg, int);
    let st = b.struct_of(vec![a, z]);
    b.set_underlying(t, st);

    let ptr = b.pointer_to(t);
    let (_, f_fn) = b.func("Alias", pkg, vec![], vec![]);
    b.instr(
        f_fn,
        0,
        Instr::Convert {
            from: ptr,
            to: unsafe_ptr,
        },
    );
    let prog = b.finish();

    // both fields are conservatively alive through the aliasing hole
    assert_eq!(check(&prog), Vec::<String>::new());
}

#[test]
fn without_the_aliasing_hole_the_fields_die() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");
    let int = b.basic(BasicKind::Int);

    let (_, t) = b.named_type("Raw", pkg);
    let a = b.field("a", pkg, int);
    let z = b.field("z", pkg, int);
    let st = b.struct_of(vec![a, z]);
    b.set_underlying(t, st);

    let ptr = b.pointer_to(t);
    let (_, f_fn) = b.func("Alias", pkg, vec![], vec![]);
    b.instr(
        f_fn,
        0,
        Instr::Other {
            op: OtherOp::Alloc,
            ty: Some(ptr),
        },
    );
    let prog = b.finish();

    let mut expected = vec!["a".to_string(), "z".to_string()];
    expected.sort();
    assert_eq!(check(&prog), expected);
}

#[test]
fn struct_conversion_symmetry_flows_from_a_live_access() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");
    let int = b.basic(BasicKind::Int);

    let (_, s1) = b.named_type("wire", pkg);
    let f1 = b.field("seq", pkg, int);
    let st1 = b.struct_of(vec![f1]);
    b.set_underlying(s1, st1);

    let (_, s2) = b.named_type("host", pkg);
    let f2 = b.field("seq", pkg, int);
    let st2 = b.struct_of(vec![f2]);
    b.set_underlying(s2, st2);

    let (_, f_fn) = b.func("Recode", pkg, vec![], vec![]);
    b.instr(
        f_fn,
        0,
        Instr::Other {
            op: OtherOp::Alloc,
            ty: Some(s1),
        },
    );
    b.instr(f_fn, 0, Instr::ChangeType { from: s1, to: s2 });
    // one side is read for real; the conversion carries it to the other
    b.instr(
        f_fn,
        0,
        Instr::FieldAccess {
            recv: s2,
            field: 0,
            ty: int,
        },
    );
    let prog = b.finish();

    assert_eq!(check(&prog), Vec::<String>::new());
}

#[test]
fn embedded_field_that_helps_implement_is_kept() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");

    let m_abs = b.iface_method("Close", pkg, vec![], vec![]);
    let iface = b.interface_of(vec![m_abs]);
    let (_, i) = b.named_type("Closer", pkg);
    b.set_underlying(i, iface);

    let (_, inner) = b.named_type("base", pkg);
    let inner_st = b.struct_of(vec![]);
    b.set_underlying(inner, inner_st);
    b.method(inner, "Close", false, vec![], vec![]);

    let (_, outer) = b.named_type("Handle", pkg);
    let embedded = b.embedded_field("base", pkg, inner);
    let outer_st = b.struct_of(vec![embedded]);
    b.set_underlying(outer, outer_st);

    // something has to keep the interface itself alive
    let i_param = b.var("c", pkg, i);
    b.func("Use", pkg, vec![i_param], vec![]);
    let prog = b.finish();

    assert_eq!(check(&prog), Vec::<String>::new());
}

#[test]
fn foreign_package_objects_are_never_reported() {
    let mut b = ProgramBuilder::new();
    let p = b.package("p", "example.com/p");
    let q = b.package("q", "example.com/q");

    let (_, qt) = b.named_type("Token", q);
    let qst = b.struct_of(vec![]);
    b.set_underlying(qt, qst);
    b.func("unusedOverThere", q, vec![], vec![]);

    let param = b.var("t", p, qt);
    b.func("Accept", p, vec![param], vec![]);
    let prog = b.finish();

    // checking p alone says nothing about q's members
    let unused = Checker::new().check_package(&prog, p);
    assert_eq!(reported_names(&prog, &unused), Vec::<String>::new());

    // q's own run still finds its dead function
    let unused = Checker::new().check_package(&prog, q);
    assert_eq!(reported_names(&prog, &unused), vec!["unusedOverThere"]);
}

#[test]
fn retain_patterns_suppress_reports() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");
    b.func("legacyCodec", pkg, vec![], vec![]);
    b.func("scratch", pkg, vec![], vec![]);
    let prog = b.finish();

    let config = Config {
        retain_patterns: vec!["legacy*".to_string()],
        ..Config::default()
    };
    let unused = Checker::with_config(config).check(&prog);
    assert_eq!(reported_names(&prog, &unused), vec!["scratch"]);
}

#[test]
fn entry_package_override_roots_main() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("main", "example.com/app");
    b.func("main", pkg, vec![], vec![]);
    let prog = b.finish();

    // without the marker, main is an ordinary unexported function
    assert_eq!(check(&prog), vec!["main"]);

    let config = Config {
        entry_package: Some("main".to_string()),
        ..Config::default()
    };
    let unused = Checker::with_config(config).check(&prog);
    assert_eq!(reported_names(&prog, &unused), Vec::<String>::new());
}

#[test]
fn type_assertion_keeps_the_asserted_type() {
    let mut b = ProgramBuilder::new();
    let pkg = b.package("p", "example.com/p");

    let (_, t) = b.named_type("payload", pkg);
    let st = b.struct_of(vec![]);
    b.set_underlying(t, st);

    let (_, f_fn) = b.func("Decode", pkg, vec![], vec![]);
    b.instr(
        f_fn,
        0,
        Instr::TypeAssert {
            asserted: t,
            ty: t,
        },
    );
    let prog = b.finish();

    assert_eq!(check(&prog), Vec::<String>::new());
}
