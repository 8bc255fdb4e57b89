use kernel::ast::{Expr, Ident, Kind, Type};
use kernel::checker::{Closure, Context, TypeError};
use kernel::conv::{default_reduction_fuel, evaluate_with_fuel, unify_with_fuel};
use kernel::Transparency;

fn id(s: &str) -> Ident {
    Ident::new(s)
}

/// A closure binding `d0 := All X::*. X` and `d{i} := d{i-1}` up to `depth`.
fn build_alias_chain(depth: usize) -> (Context, Expr, Expr) {
    let bottom = Type::all(id("X"), Kind::star(), Type::var(id("X")));
    let bottom_kind = Kind::all(id("X"), Kind::star(), Kind::star());

    let mut clo = Closure::new();
    clo.define_type(id("d0"), bottom.clone(), bottom_kind.clone());
    for i in 1..depth {
        clo.define_type(
            Ident::new(format!("d{}", i)),
            Type::var(Ident::new(format!("d{}", i - 1))),
            bottom_kind.clone(),
        );
    }
    let ctx = Context::new().declare_closure(clo);
    let deep = Expr::Type(Type::var(Ident::new(format!("d{}", depth - 1))));
    (ctx, deep, Expr::Type(bottom))
}

/// Microbench-style guard: a linear alias chain should normalize within a
/// modest fuel budget.
#[test]
fn alias_chain_normalizes_within_budget() {
    let (ctx, deep, base) = build_alias_chain(64);
    let budget = 128;

    for _ in 0..50 {
        let val = evaluate_with_fuel(&deep, &ctx, Transparency::All, budget)
            .expect("Linear alias chain should normalize within budget");
        assert_eq!(val, base);
    }
}

/// Regression guard: too-small fuel should fail on the same chain.
#[test]
fn alias_chain_budget_regression_guard() {
    let (ctx, deep, _) = build_alias_chain(64);

    let err = evaluate_with_fuel(&deep, &ctx, Transparency::All, 10)
        .expect_err("Insufficient fuel should fail on linear alias chain");
    assert!(matches!(err, TypeError::FuelExhausted(_)));
}

#[test]
fn unification_shares_the_budget() {
    let (ctx, deep, base) = build_alias_chain(64);

    unify_with_fuel(&deep, &base, &ctx, 128)
        .expect("Chain should unify with its normal form within budget");
    let err = unify_with_fuel(&deep, &base, &ctx, 10)
        .expect_err("Insufficient fuel should surface through unification");
    assert!(matches!(err, TypeError::FuelExhausted(_)));
}

/// The default budget dwarfs any realistic definition chain.
#[test]
fn default_budget_is_generous() {
    assert!(default_reduction_fuel() >= 1 << 16);
    let (ctx, deep, base) = build_alias_chain(256);
    let val = evaluate_with_fuel(&deep, &ctx, Transparency::All, default_reduction_fuel())
        .expect("Default budget should cover a deep chain");
    assert_eq!(val, base);
}

/// Opaque reduction keeps definitions folded, spending no fuel on them.
#[test]
fn opaque_transparency_spends_nothing() {
    let (ctx, deep, _) = build_alias_chain(64);
    let val = evaluate_with_fuel(&deep, &ctx, Transparency::None, 1)
        .expect("Opaque evaluation should not unfold the chain");
    assert_eq!(val, deep);
}
