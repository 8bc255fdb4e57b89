use std::rc::Rc;

/// A user-supplied identifier. Identity is structural: two idents are the
/// same name exactly when their strings agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn new(text: impl Into<String>) -> Self {
        Ident(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The three syntactic sorts. Also serves as the namespace tag for names
/// and as the runtime witness carried by [`Expr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    Term,
    Type,
    Kind,
}

/// A name tagged with its namespace. Equality is `(namespace, ident)`:
/// a term-name and a type-name spelled alike are different names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Name {
    Term(Ident),
    Type(Ident),
    Kind(Ident),
}

impl Name {
    pub fn sort(&self) -> Sort {
        match self {
            Name::Term(_) => Sort::Term,
            Name::Type(_) => Sort::Type,
            Name::Kind(_) => Sort::Kind,
        }
    }

    pub fn ident(&self) -> &Ident {
        match self {
            Name::Term(x) | Name::Type(x) | Name::Kind(x) => x,
        }
    }
}

/// Terms of the calculus, with named variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Term variable
    Var(Ident),
    /// \x:T. a: abstraction over a term
    Lam(Ident, Rc<Type>, Rc<Term>),
    /// a b
    App(Rc<Term>, Rc<Term>),
    /// /\X::K. a: abstraction over a type
    TyLam(Ident, Rc<Kind>, Rc<Term>),
    /// a [T]
    TyApp(Rc<Term>, Rc<Type>),
}

/// Types. `Pi` binds a term and doubles as the type-level λ; `All` binds a
/// type and doubles as the type-level Λ. `Iota` is the self type: a term
/// `a` inhabits `iota x. T` exactly when it inhabits `T[x := a]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Type variable
    Var(Ident),
    /// Pi x:S. T
    Pi(Ident, Rc<Type>, Rc<Type>),
    /// T a
    App(Rc<Type>, Rc<Term>),
    /// All X::K. T
    All(Ident, Rc<Kind>, Rc<Type>),
    /// S [T]
    TyApp(Rc<Type>, Rc<Type>),
    /// iota x. T
    Iota(Ident, Rc<Type>),
}

/// Kinds. `Star` classifies inhabited types; the two binder forms classify
/// type-level functions over terms and over types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// *
    Star,
    /// Pi x:T. K
    Pi(Ident, Rc<Type>, Rc<Kind>),
    /// All X::K. L
    All(Ident, Rc<Kind>, Rc<Kind>),
}

// Helper constructors for convenience
impl Term {
    pub fn var(x: Ident) -> Rc<Self> {
        Rc::new(Term::Var(x))
    }

    pub fn lam(x: Ident, ty: Rc<Type>, body: Rc<Term>) -> Rc<Self> {
        Rc::new(Term::Lam(x, ty, body))
    }

    pub fn app(f: Rc<Term>, a: Rc<Term>) -> Rc<Self> {
        Rc::new(Term::App(f, a))
    }

    pub fn tylam(x: Ident, k: Rc<Kind>, body: Rc<Term>) -> Rc<Self> {
        Rc::new(Term::TyLam(x, k, body))
    }

    pub fn tyapp(f: Rc<Term>, ty: Rc<Type>) -> Rc<Self> {
        Rc::new(Term::TyApp(f, ty))
    }
}

impl Type {
    pub fn var(x: Ident) -> Rc<Self> {
        Rc::new(Type::Var(x))
    }

    pub fn pi(x: Ident, dom: Rc<Type>, body: Rc<Type>) -> Rc<Self> {
        Rc::new(Type::Pi(x, dom, body))
    }

    pub fn app(f: Rc<Type>, a: Rc<Term>) -> Rc<Self> {
        Rc::new(Type::App(f, a))
    }

    pub fn all(x: Ident, k: Rc<Kind>, body: Rc<Type>) -> Rc<Self> {
        Rc::new(Type::All(x, k, body))
    }

    pub fn tyapp(f: Rc<Type>, a: Rc<Type>) -> Rc<Self> {
        Rc::new(Type::TyApp(f, a))
    }

    pub fn iota(x: Ident, body: Rc<Type>) -> Rc<Self> {
        Rc::new(Type::Iota(x, body))
    }
}

impl Kind {
    pub fn star() -> Rc<Self> {
        Rc::new(Kind::Star)
    }

    pub fn pi(x: Ident, dom: Rc<Type>, body: Rc<Kind>) -> Rc<Self> {
        Rc::new(Kind::Pi(x, dom, body))
    }

    pub fn all(x: Ident, dom: Rc<Kind>, body: Rc<Kind>) -> Rc<Self> {
        Rc::new(Kind::All(x, dom, body))
    }
}

/// The unified expression carrier. The tag is the runtime witness of the
/// sort; generic operations dispatch on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Term(Rc<Term>),
    Type(Rc<Type>),
    Kind(Rc<Kind>),
}

impl Expr {
    pub fn sort(&self) -> Sort {
        match self {
            Expr::Term(_) => Sort::Term,
            Expr::Type(_) => Sort::Type,
            Expr::Kind(_) => Sort::Kind,
        }
    }
}

impl From<Rc<Term>> for Expr {
    fn from(t: Rc<Term>) -> Self {
        Expr::Term(t)
    }
}

impl From<Rc<Type>> for Expr {
    fn from(t: Rc<Type>) -> Self {
        Expr::Type(t)
    }
}

impl From<Rc<Kind>> for Expr {
    fn from(k: Rc<Kind>) -> Self {
        Expr::Kind(k)
    }
}

/// Free occurrences of term-names in `e`, binders subtracted. Occurrences
/// are kept with multiplicity; no α-renaming is performed.
pub fn free_term_names(e: &Expr) -> Vec<Ident> {
    let mut out = Vec::new();
    match e {
        Expr::Term(t) => free_term_in_term(t, &mut out),
        Expr::Type(t) => free_term_in_type(t, &mut out),
        Expr::Kind(k) => free_term_in_kind(k, &mut out),
    }
    out
}

/// Free occurrences of type-names in `e`, binders subtracted.
pub fn free_type_names(e: &Expr) -> Vec<Ident> {
    let mut out = Vec::new();
    match e {
        Expr::Term(t) => free_type_in_term(t, &mut out),
        Expr::Type(t) => free_type_in_type(t, &mut out),
        Expr::Kind(k) => free_type_in_kind(k, &mut out),
    }
    out
}

fn scoped(out: &mut Vec<Ident>, bound: &Ident, walk: impl FnOnce(&mut Vec<Ident>)) {
    let mut inner = Vec::new();
    walk(&mut inner);
    out.extend(inner.into_iter().filter(|x| x != bound));
}

fn free_term_in_term(t: &Term, out: &mut Vec<Ident>) {
    match t {
        Term::Var(x) => out.push(x.clone()),
        Term::Lam(x, ty, body) => {
            free_term_in_type(ty, out);
            scoped(out, x, |out| free_term_in_term(body, out));
        }
        Term::App(f, a) => {
            free_term_in_term(f, out);
            free_term_in_term(a, out);
        }
        Term::TyLam(_, k, body) => {
            free_term_in_kind(k, out);
            free_term_in_term(body, out);
        }
        Term::TyApp(f, ty) => {
            free_term_in_term(f, out);
            free_term_in_type(ty, out);
        }
    }
}

fn free_term_in_type(t: &Type, out: &mut Vec<Ident>) {
    match t {
        Type::Var(_) => {}
        Type::Pi(x, dom, body) => {
            free_term_in_type(dom, out);
            scoped(out, x, |out| free_term_in_type(body, out));
        }
        Type::App(f, a) => {
            free_term_in_type(f, out);
            free_term_in_term(a, out);
        }
        Type::All(_, k, body) => {
            free_term_in_kind(k, out);
            free_term_in_type(body, out);
        }
        Type::TyApp(f, a) => {
            free_term_in_type(f, out);
            free_term_in_type(a, out);
        }
        Type::Iota(x, body) => {
            scoped(out, x, |out| free_term_in_type(body, out));
        }
    }
}

fn free_term_in_kind(k: &Kind, out: &mut Vec<Ident>) {
    match k {
        Kind::Star => {}
        Kind::Pi(x, dom, body) => {
            free_term_in_type(dom, out);
            scoped(out, x, |out| free_term_in_kind(body, out));
        }
        Kind::All(_, dom, body) => {
            free_term_in_kind(dom, out);
            free_term_in_kind(body, out);
        }
    }
}

fn free_type_in_term(t: &Term, out: &mut Vec<Ident>) {
    match t {
        Term::Var(_) => {}
        Term::Lam(_, ty, body) => {
            free_type_in_type(ty, out);
            free_type_in_term(body, out);
        }
        Term::App(f, a) => {
            free_type_in_term(f, out);
            free_type_in_term(a, out);
        }
        Term::TyLam(x, k, body) => {
            free_type_in_kind(k, out);
            scoped(out, x, |out| free_type_in_term(body, out));
        }
        Term::TyApp(f, ty) => {
            free_type_in_term(f, out);
            free_type_in_type(ty, out);
        }
    }
}

fn free_type_in_type(t: &Type, out: &mut Vec<Ident>) {
    match t {
        Type::Var(x) => out.push(x.clone()),
        Type::Pi(_, dom, body) => {
            free_type_in_type(dom, out);
            free_type_in_type(body, out);
        }
        Type::App(f, a) => {
            free_type_in_type(f, out);
            free_type_in_term(a, out);
        }
        Type::All(x, k, body) => {
            free_type_in_kind(k, out);
            scoped(out, x, |out| free_type_in_type(body, out));
        }
        Type::TyApp(f, a) => {
            free_type_in_type(f, out);
            free_type_in_type(a, out);
        }
        Type::Iota(_, body) => {
            free_type_in_type(body, out);
        }
    }
}

fn free_type_in_kind(k: &Kind, out: &mut Vec<Ident>) {
    match k {
        Kind::Star => {}
        Kind::Pi(_, dom, body) => {
            free_type_in_type(dom, out);
            free_type_in_kind(body, out);
        }
        Kind::All(x, dom, body) => {
            free_type_in_kind(dom, out);
            scoped(out, x, |out| free_type_in_kind(body, out));
        }
    }
}

/// Substitute `value` for free occurrences of `name` in `target`.
///
/// The namespace of `name` must match the sort of `value`; a mismatch is a
/// caller bug and panics. A binder for the same name in the same namespace
/// shadows: its annotation is still rewritten, its body is left alone.
/// No α-renaming is performed; the source discipline supplies globally
/// fresh binder names.
pub fn substitute(name: &Name, value: &Expr, target: &Expr) -> Expr {
    assert!(
        name.sort() == value.sort(),
        "substitute: {:?}-name given a {:?} payload",
        name.sort(),
        value.sort()
    );
    match target {
        Expr::Term(t) => Expr::Term(subst_term(name, value, t)),
        Expr::Type(t) => Expr::Type(subst_type(name, value, t)),
        Expr::Kind(k) => Expr::Kind(subst_kind(name, value, k)),
    }
}

fn shadows(name: &Name, sort: Sort, binder: &Ident) -> bool {
    name.sort() == sort && name.ident() == binder
}

fn subst_term(name: &Name, value: &Expr, t: &Rc<Term>) -> Rc<Term> {
    match &**t {
        Term::Var(y) => match (name, value) {
            (Name::Term(x), Expr::Term(v)) if x == y => v.clone(),
            _ => t.clone(),
        },
        Term::Lam(y, ty, body) => {
            let ty = subst_type(name, value, ty);
            let body = if shadows(name, Sort::Term, y) {
                body.clone()
            } else {
                subst_term(name, value, body)
            };
            Term::lam(y.clone(), ty, body)
        }
        Term::App(f, a) => Term::app(subst_term(name, value, f), subst_term(name, value, a)),
        Term::TyLam(y, k, body) => {
            let k = subst_kind(name, value, k);
            let body = if shadows(name, Sort::Type, y) {
                body.clone()
            } else {
                subst_term(name, value, body)
            };
            Term::tylam(y.clone(), k, body)
        }
        Term::TyApp(f, ty) => Term::tyapp(subst_term(name, value, f), subst_type(name, value, ty)),
    }
}

fn subst_type(name: &Name, value: &Expr, t: &Rc<Type>) -> Rc<Type> {
    match &**t {
        Type::Var(y) => match (name, value) {
            (Name::Type(x), Expr::Type(v)) if x == y => v.clone(),
            _ => t.clone(),
        },
        Type::Pi(y, dom, body) => {
            let dom = subst_type(name, value, dom);
            let body = if shadows(name, Sort::Term, y) {
                body.clone()
            } else {
                subst_type(name, value, body)
            };
            Type::pi(y.clone(), dom, body)
        }
        Type::App(f, a) => Type::app(subst_type(name, value, f), subst_term(name, value, a)),
        Type::All(y, k, body) => {
            let k = subst_kind(name, value, k);
            let body = if shadows(name, Sort::Type, y) {
                body.clone()
            } else {
                subst_type(name, value, body)
            };
            Type::all(y.clone(), k, body)
        }
        Type::TyApp(f, a) => Type::tyapp(subst_type(name, value, f), subst_type(name, value, a)),
        Type::Iota(y, body) => {
            let body = if shadows(name, Sort::Term, y) {
                body.clone()
            } else {
                subst_type(name, value, body)
            };
            Type::iota(y.clone(), body)
        }
    }
}

fn subst_kind(name: &Name, value: &Expr, k: &Rc<Kind>) -> Rc<Kind> {
    match &**k {
        Kind::Star => k.clone(),
        Kind::Pi(y, dom, body) => {
            let dom = subst_type(name, value, dom);
            let body = if shadows(name, Sort::Term, y) {
                body.clone()
            } else {
                subst_kind(name, value, body)
            };
            Kind::pi(y.clone(), dom, body)
        }
        Kind::All(y, dom, body) => {
            let dom = subst_kind(name, value, dom);
            let body = if shadows(name, Sort::Type, y) {
                body.clone()
            } else {
                subst_kind(name, value, body)
            };
            Kind::all(y.clone(), dom, body)
        }
    }
}

/// Substitute a term for a term-name inside a type. The common case in the
/// typing rules; avoids wrapping at every call site.
pub fn subst_term_in_type(x: &Ident, a: &Rc<Term>, ty: &Rc<Type>) -> Rc<Type> {
    subst_type(&Name::Term(x.clone()), &Expr::Term(a.clone()), ty)
}

/// Substitute a term for a term-name inside a kind.
pub fn subst_term_in_kind(x: &Ident, a: &Rc<Term>, k: &Rc<Kind>) -> Rc<Kind> {
    subst_kind(&Name::Term(x.clone()), &Expr::Term(a.clone()), k)
}

/// Substitute a type for a type-name inside a type.
pub fn subst_type_in_type(x: &Ident, s: &Rc<Type>, ty: &Rc<Type>) -> Rc<Type> {
    subst_type(&Name::Type(x.clone()), &Expr::Type(s.clone()), ty)
}

/// Substitute a type for a type-name inside a kind.
pub fn subst_type_in_kind(x: &Ident, s: &Rc<Type>, k: &Rc<Kind>) -> Rc<Kind> {
    subst_kind(&Name::Type(x.clone()), &Expr::Type(s.clone()), k)
}

/// Substitute a term for a term-name inside a term.
pub fn subst_term_in_term(x: &Ident, a: &Rc<Term>, t: &Rc<Term>) -> Rc<Term> {
    subst_term(&Name::Term(x.clone()), &Expr::Term(a.clone()), t)
}

/// Substitute a type for a type-name inside a term.
pub fn subst_type_in_term(x: &Ident, s: &Rc<Type>, t: &Rc<Term>) -> Rc<Term> {
    subst_term(&Name::Type(x.clone()), &Expr::Type(s.clone()), t)
}
