pub mod ast;
#[cfg(test)]
mod test_support;
pub mod checker;
pub mod conv;
pub mod printing;

pub use ast::*;

/// Transparency levels for reduction: `All` δ-expands closure definitions,
/// `None` keeps every defined name opaque. β-reduction is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transparency {
    All,
    None,
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, Ident, Kind, Term, Type};
    use crate::checker::{
        check_type, elaborate_program, elaborate_stmt, synthesize_type, Context, Stmt, TypeError,
    };
    use crate::test_support::Parser;

    fn id(s: &str) -> Ident {
        Ident::new(s)
    }

    fn term(input: &str) -> std::rc::Rc<Term> {
        Parser::new(input).parse_term().expect("Failed to parse term")
    }

    fn ty(input: &str) -> std::rc::Rc<Type> {
        Parser::new(input).parse_type().expect("Failed to parse type")
    }

    fn kind(input: &str) -> std::rc::Rc<Kind> {
        Parser::new(input).parse_kind().expect("Failed to parse kind")
    }

    #[test]
    fn test_polymorphic_identity_program() {
        // id : All A::*. Pi x:A. A  =  /\A::*. \x:A. x
        let prgm = vec![Stmt::DefnTm(
            id("id"),
            ty("(all A * (pi x A A))"),
            term("(tlam A * (lam x A x))"),
        )];
        elaborate_program(&prgm).expect("identity should elaborate");
    }

    #[test]
    fn test_identity_with_type_body_fails() {
        // Same signature, but the body returns the type A where a term is
        // expected; the inner A is a term variable and is not declared.
        let prgm = vec![Stmt::DefnTm(
            id("id"),
            ty("(all A * (pi x A A))"),
            term("(tlam A * (lam x A A))"),
        )];
        let err = elaborate_program(&prgm).unwrap_err();
        assert!(matches!(&err, TypeError::UndeclaredTermName(x) if x == &id("A")));
        assert_eq!(err.to_string(), "undeclared term name: A");
    }

    #[test]
    fn test_self_type_definition() {
        // T : * = iota x. T
        let prgm = vec![Stmt::DefnTy(id("T"), kind("*"), ty("(iota x T)"))];
        elaborate_program(&prgm).expect("self type should be well-kinded");
    }

    #[test]
    fn test_beta_equal_types_check_either_way() {
        // a : (\X::*. X) [A]  checks against  A, and b : A checks against
        // the redex; convertibility closes the gap.
        let redex = ty("(tapp (all X * X) A)");
        let plain = ty("A");
        let ctx = Context::new()
            .declare_kind_of(id("A"), Kind::star())
            .declare_type_of(id("a"), redex.clone())
            .declare_type_of(id("b"), plain.clone());

        check_type(&term("a"), &plain, &ctx).expect("redex type should check against A");
        check_type(&term("b"), &redex, &ctx).expect("A should check against the redex");
    }

    #[test]
    fn test_term_applicant_mismatch() {
        // id id: id expects a type argument first.
        let prgm = vec![
            Stmt::DefnTm(
                id("id"),
                ty("(all A * (pi x A A))"),
                term("(tlam A * (lam x A x))"),
            ),
            Stmt::DefnTm(
                id("bad"),
                ty("(all A * (pi x A A))"),
                term("(app id id)"),
            ),
        ];
        let err = elaborate_program(&prgm).unwrap_err();
        assert!(matches!(err, TypeError::InvalidTermTermApplicant(_)));
        assert!(err.to_string().starts_with("invalid term-term applicant"));
    }

    #[test]
    fn test_shadowed_binder_resolves_innermost() {
        // \x:A. \x:A. x: the result type mentions the inner binder.
        let ctx = Context::new().declare_kind_of(id("A"), Kind::star());
        let synthesized = synthesize_type(&term("(lam x A (lam x A x))"), &ctx)
            .expect("shadowed lambda should synthesize");
        assert_eq!(synthesized, ty("(pi x A (pi x A A))"));
    }

    #[test]
    fn test_program_stops_at_first_error() {
        let prgm = vec![
            Stmt::DefnTm(id("bad"), ty("(pi x A A)"), term("(lam x A x)")),
            Stmt::DefnTm(id("later"), ty("(pi x B B)"), term("(lam x B x)")),
        ];
        // A is undeclared in the first statement; B never gets a turn.
        let err = elaborate_program(&prgm).unwrap_err();
        assert!(matches!(&err, TypeError::UndeclaredTypeName(x) if x == &id("A")));
    }

    #[test]
    fn test_annotation_usable_by_later_statements() {
        let prgm = vec![
            Stmt::DefnTy(id("A"), kind("*"), ty("(iota x A)")),
            Stmt::DefnTm(id("f"), ty("(pi x A A)"), term("(lam x A x)")),
        ];
        let ctx = elaborate_program(&prgm).expect("program should elaborate");
        assert!(ctx.lookup_type(&id("A")).is_some());
        assert!(ctx.lookup_term(&id("f")).is_some());
    }

    #[test]
    fn test_elaborate_stmt_extends_context() {
        let ctx = Context::new();
        let next = elaborate_stmt(&ctx, &Stmt::DefnTy(id("A"), kind("*"), ty("(iota x A)")))
            .expect("statement should elaborate");
        assert_eq!(next.len(), ctx.len() + 1);
    }

    #[test]
    fn test_diagnostic_codes_are_stable() {
        let undeclared = TypeError::UndeclaredTermName(id("x"));
        assert_eq!(undeclared.diagnostic_code(), "K0001");
        let mismatch = TypeError::CannotUnify {
            found_left: Expr::Term(Term::var(id("x"))),
            found_right: Expr::Term(Term::var(id("y"))),
            left: Expr::Term(Term::var(id("x"))),
            right: Expr::Term(Term::var(id("y"))),
        };
        assert_eq!(mismatch.diagnostic_code(), "K0007");
    }
}
