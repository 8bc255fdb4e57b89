use crate::ast::{
    subst_term_in_term, subst_term_in_type, subst_type_in_term, subst_type_in_type, substitute,
    Expr, Ident, Kind, Name, Term, Type,
};
use crate::checker::{Context, TypeError};
use crate::Transparency;
use std::rc::Rc;


/// Default step budget for reduction and unification. Far above what any
/// well-typed program needs; exhaustion signals a runaway reduction rather
/// than a wrong answer.
pub fn default_reduction_fuel() -> usize {
    1 << 20
}

/// One-step weak-head β/δ-reduction.
///
/// `Ok(None)` means `e` is already in weak head normal form; this includes
/// applications whose head is neutral (a variable without a definition, or
/// a stuck application). A head that evaluates to an abstraction of the
/// wrong flavour is an `invalid ... applicant` error.
pub fn reduce(e: &Expr, ctx: &Context, transparency: Transparency) -> Result<Option<Expr>, TypeError> {
    let mut fuel = default_reduction_fuel();
    step(e, ctx, transparency, &mut fuel)
}

/// Evaluate `e` to weak head normal form.
pub fn evaluate(e: &Expr, ctx: &Context, transparency: Transparency) -> Result<Expr, TypeError> {
    evaluate_with_fuel(e, ctx, transparency, default_reduction_fuel())
}

pub fn evaluate_with_fuel(
    e: &Expr,
    ctx: &Context,
    transparency: Transparency,
    fuel: usize,
) -> Result<Expr, TypeError> {
    let mut fuel = fuel;
    whnf(e, ctx, transparency, &mut fuel)
}

fn whnf(e: &Expr, ctx: &Context, transparency: Transparency, fuel: &mut usize) -> Result<Expr, TypeError> {
    let mut cur = e.clone();
    loop {
        match step(&cur, ctx, transparency, fuel)? {
            Some(next) => {
                if *fuel == 0 {
                    return Err(TypeError::FuelExhausted(cur));
                }
                *fuel -= 1;
                cur = next;
            }
            None => return Ok(cur),
        }
    }
}

fn whnf_term(
    t: &Rc<Term>,
    ctx: &Context,
    transparency: Transparency,
    fuel: &mut usize,
) -> Result<Rc<Term>, TypeError> {
    match whnf(&Expr::Term(t.clone()), ctx, transparency, fuel)? {
        Expr::Term(t) => Ok(t),
        _ => unreachable!("term reduced to a non-term"),
    }
}

fn whnf_type(
    t: &Rc<Type>,
    ctx: &Context,
    transparency: Transparency,
    fuel: &mut usize,
) -> Result<Rc<Type>, TypeError> {
    match whnf(&Expr::Type(t.clone()), ctx, transparency, fuel)? {
        Expr::Type(t) => Ok(t),
        _ => unreachable!("type reduced to a non-type"),
    }
}

fn step(e: &Expr, ctx: &Context, transparency: Transparency, fuel: &mut usize) -> Result<Option<Expr>, TypeError> {
    match e {
        Expr::Term(t) => step_term(t, ctx, transparency, fuel),
        Expr::Type(t) => step_type(t, ctx, transparency, fuel),
        // Kinds have no head redexes.
        Expr::Kind(_) => Ok(None),
    }
}

fn step_term(
    t: &Rc<Term>,
    ctx: &Context,
    transparency: Transparency,
    fuel: &mut usize,
) -> Result<Option<Expr>, TypeError> {
    match &**t {
        Term::Var(x) => {
            if transparency == Transparency::None {
                return Ok(None);
            }
            match ctx.lookup_term(x) {
                Some((Some(def), _)) => Ok(Some(Expr::Term(def))),
                _ => Ok(None),
            }
        }
        Term::App(f, a) => {
            let head = whnf_term(f, ctx, transparency, fuel)?;
            match &*head {
                Term::Lam(x, _, body) => Ok(Some(Expr::Term(subst_term_in_term(x, a, body)))),
                Term::TyLam(_, _, _) => Err(TypeError::InvalidTermTermApplicant(Expr::Term(head.clone()))),
                _ => Ok(None),
            }
        }
        Term::TyApp(f, s) => {
            let head = whnf_term(f, ctx, transparency, fuel)?;
            match &*head {
                Term::TyLam(x, _, body) => Ok(Some(Expr::Term(subst_type_in_term(x, s, body)))),
                Term::Lam(_, _, _) => Err(TypeError::InvalidTermTypeApplicant(Expr::Term(head.clone()))),
                _ => Ok(None),
            }
        }
        Term::Lam(_, _, _) | Term::TyLam(_, _, _) => Ok(None),
    }
}

fn step_type(
    t: &Rc<Type>,
    ctx: &Context,
    transparency: Transparency,
    fuel: &mut usize,
) -> Result<Option<Expr>, TypeError> {
    match &**t {
        Type::Var(x) => {
            if transparency == Transparency::None {
                return Ok(None);
            }
            match ctx.lookup_type(x) {
                Some((Some(def), _)) => Ok(Some(Expr::Type(def))),
                _ => Ok(None),
            }
        }
        Type::App(f, a) => {
            let head = whnf_type(f, ctx, transparency, fuel)?;
            match &*head {
                Type::Pi(x, _, body) => Ok(Some(Expr::Type(subst_term_in_type(x, a, body)))),
                Type::All(_, _, _) | Type::Iota(_, _) => {
                    Err(TypeError::InvalidTypeTermApplicant(Expr::Type(head.clone())))
                }
                _ => Ok(None),
            }
        }
        Type::TyApp(f, s) => {
            let head = whnf_type(f, ctx, transparency, fuel)?;
            match &*head {
                Type::All(x, _, body) => Ok(Some(Expr::Type(subst_type_in_type(x, s, body)))),
                Type::Pi(_, _, _) | Type::Iota(_, _) => {
                    Err(TypeError::InvalidTypeTypeApplicant(Expr::Type(head.clone())))
                }
                _ => Ok(None),
            }
        }
        Type::Pi(_, _, _) | Type::All(_, _, _) | Type::Iota(_, _) => Ok(None),
    }
}

/// Decide convertibility of `left` and `right`: structural equality up to
/// α-renaming of binders and β/δ-reduction. Both sides are evaluated to
/// weak head normal form at every level before heads are matched.
pub fn unify(left: &Expr, right: &Expr, ctx: &Context) -> Result<(), TypeError> {
    unify_with_fuel(left, right, ctx, default_reduction_fuel())
}

pub fn unify_with_fuel(
    left: &Expr,
    right: &Expr,
    ctx: &Context,
    fuel: usize,
) -> Result<(), TypeError> {
    let mut fuel = fuel;
    unify_go(left, right, left, right, ctx, &mut fuel)
}

// Rename the right operand's binder to the left operand's before comparing
// children; this realizes α-equivalence without fresh name generation.
fn rename_term_binder(from: &Ident, to: &Ident, e: &Expr) -> Expr {
    if from == to {
        e.clone()
    } else {
        substitute(
            &Name::Term(from.clone()),
            &Expr::Term(Term::var(to.clone())),
            e,
        )
    }
}

fn rename_type_binder(from: &Ident, to: &Ident, e: &Expr) -> Expr {
    if from == to {
        e.clone()
    } else {
        substitute(
            &Name::Type(from.clone()),
            &Expr::Type(Type::var(to.clone())),
            e,
        )
    }
}

fn unify_go(
    left: &Expr,
    right: &Expr,
    outer_left: &Expr,
    outer_right: &Expr,
    ctx: &Context,
    fuel: &mut usize,
) -> Result<(), TypeError> {
    let lw = whnf(left, ctx, Transparency::All, fuel)?;
    let rw = whnf(right, ctx, Transparency::All, fuel)?;

    let mismatch = || {
        Err(TypeError::CannotUnify {
            found_left: lw.clone(),
            found_right: rw.clone(),
            left: outer_left.clone(),
            right: outer_right.clone(),
        })
    };

    match (&lw, &rw) {
        (Expr::Term(l), Expr::Term(r)) => match (&**l, &**r) {
            (Term::Var(x), Term::Var(y)) => {
                if x == y {
                    Ok(())
                } else {
                    mismatch()
                }
            }
            (Term::Lam(x1, t1, b1), Term::Lam(x2, t2, b2)) => {
                unify_go(
                    &Expr::Type(t1.clone()),
                    &rename_term_binder(x2, x1, &Expr::Type(t2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )?;
                unify_go(
                    &Expr::Term(b1.clone()),
                    &rename_term_binder(x2, x1, &Expr::Term(b2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )
            }
            (Term::App(f1, a1), Term::App(f2, a2)) => {
                unify_go(
                    &Expr::Term(f1.clone()),
                    &Expr::Term(f2.clone()),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )?;
                unify_go(
                    &Expr::Term(a1.clone()),
                    &Expr::Term(a2.clone()),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )
            }
            (Term::TyLam(x1, k1, b1), Term::TyLam(x2, k2, b2)) => {
                unify_go(
                    &Expr::Kind(k1.clone()),
                    &rename_type_binder(x2, x1, &Expr::Kind(k2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )?;
                unify_go(
                    &Expr::Term(b1.clone()),
                    &rename_type_binder(x2, x1, &Expr::Term(b2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )
            }
            (Term::TyApp(f1, s1), Term::TyApp(f2, s2)) => {
                unify_go(
                    &Expr::Term(f1.clone()),
                    &Expr::Term(f2.clone()),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )?;
                unify_go(
                    &Expr::Type(s1.clone()),
                    &Expr::Type(s2.clone()),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )
            }
            _ => mismatch(),
        },
        (Expr::Type(l), Expr::Type(r)) => match (&**l, &**r) {
            (Type::Var(x), Type::Var(y)) => {
                if x == y {
                    Ok(())
                } else {
                    mismatch()
                }
            }
            (Type::Pi(x1, d1, b1), Type::Pi(x2, d2, b2)) => {
                unify_go(
                    &Expr::Type(d1.clone()),
                    &rename_term_binder(x2, x1, &Expr::Type(d2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )?;
                unify_go(
                    &Expr::Type(b1.clone()),
                    &rename_term_binder(x2, x1, &Expr::Type(b2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )
            }
            (Type::App(f1, a1), Type::App(f2, a2)) => {
                unify_go(
                    &Expr::Type(f1.clone()),
                    &Expr::Type(f2.clone()),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )?;
                unify_go(
                    &Expr::Term(a1.clone()),
                    &Expr::Term(a2.clone()),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )
            }
            (Type::All(x1, k1, b1), Type::All(x2, k2, b2)) => {
                unify_go(
                    &Expr::Kind(k1.clone()),
                    &rename_type_binder(x2, x1, &Expr::Kind(k2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )?;
                unify_go(
                    &Expr::Type(b1.clone()),
                    &rename_type_binder(x2, x1, &Expr::Type(b2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )
            }
            (Type::TyApp(f1, s1), Type::TyApp(f2, s2)) => {
                unify_go(
                    &Expr::Type(f1.clone()),
                    &Expr::Type(f2.clone()),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )?;
                unify_go(
                    &Expr::Type(s1.clone()),
                    &Expr::Type(s2.clone()),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )
            }
            (Type::Iota(x1, b1), Type::Iota(x2, b2)) => unify_go(
                &Expr::Type(b1.clone()),
                &rename_term_binder(x2, x1, &Expr::Type(b2.clone())),
                outer_left,
                outer_right,
                ctx,
                fuel,
            ),
            _ => mismatch(),
        },
        (Expr::Kind(l), Expr::Kind(r)) => match (&**l, &**r) {
            (Kind::Star, Kind::Star) => Ok(()),
            (Kind::Pi(x1, d1, b1), Kind::Pi(x2, d2, b2)) => {
                unify_go(
                    &Expr::Type(d1.clone()),
                    &rename_term_binder(x2, x1, &Expr::Type(d2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )?;
                unify_go(
                    &Expr::Kind(b1.clone()),
                    &rename_term_binder(x2, x1, &Expr::Kind(b2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )
            }
            (Kind::All(x1, d1, b1), Kind::All(x2, d2, b2)) => {
                unify_go(
                    &Expr::Kind(d1.clone()),
                    &rename_type_binder(x2, x1, &Expr::Kind(d2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )?;
                unify_go(
                    &Expr::Kind(b1.clone()),
                    &rename_type_binder(x2, x1, &Expr::Kind(b2.clone())),
                    outer_left,
                    outer_right,
                    ctx,
                    fuel,
                )
            }
            _ => mismatch(),
        },
        // Sorts never mix in well-typed calls; report rather than panic.
        _ => mismatch(),
    }
}
