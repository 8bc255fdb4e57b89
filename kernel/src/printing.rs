use std::fmt::Display;

use crate::ast::{Expr, Ident, Kind, Name, Term, Type};

impl Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Name::Term(x) => write!(f, "term name {}", x),
            Name::Type(x) => write!(f, "type name {}", x),
            Name::Kind(x) => write!(f, "kind name {}", x),
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Var(x) => write!(f, "{}", x),
            Term::Lam(x, ty, body) => write!(f, "(\\{} : {}. {})", x, ty, body),
            Term::App(func, arg) => write!(f, "({} {})", func, arg),
            Term::TyLam(x, kind, body) => write!(f, "(/\\{} :: {}. {})", x, kind, body),
            Term::TyApp(func, arg) => write!(f, "({} [{}])", func, arg),
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Var(x) => write!(f, "{}", x),
            Type::Pi(x, dom, body) => write!(f, "(Pi {} : {}. {})", x, dom, body),
            Type::App(func, arg) => write!(f, "({} {})", func, arg),
            Type::All(x, dom, body) => write!(f, "(All {} :: {}. {})", x, dom, body),
            Type::TyApp(func, arg) => write!(f, "({} [{}])", func, arg),
            Type::Iota(x, body) => write!(f, "(iota {}. {})", x, body),
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Star => write!(f, "*"),
            Kind::Pi(x, dom, body) => write!(f, "(Pi {} : {}. {})", x, dom, body),
            Kind::All(x, dom, body) => write!(f, "(All {} :: {}. {})", x, dom, body),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Term(t) => write!(f, "{}", t),
            Expr::Type(t) => write!(f, "{}", t),
            Expr::Kind(k) => write!(f, "{}", k),
        }
    }
}
