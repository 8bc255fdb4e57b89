use crate::ast::{
    free_term_names, free_type_names, subst_term_in_kind, subst_term_in_type, subst_type_in_kind,
    subst_type_in_type, Expr, Ident, Kind, Name, Term, Type,
};
use crate::conv::{evaluate, unify};
use crate::Transparency;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TypeError {
    #[error("undeclared term name: {0}")]
    UndeclaredTermName(Ident),
    #[error("undeclared type name: {0}")]
    UndeclaredTypeName(Ident),
    #[error("invalid term-term applicant: {0}")]
    InvalidTermTermApplicant(Expr),
    #[error("invalid term-type applicant: {0}")]
    InvalidTermTypeApplicant(Expr),
    #[error("invalid type-term applicant: {0}")]
    InvalidTypeTermApplicant(Expr),
    #[error("invalid type-type applicant: {0}")]
    InvalidTypeTypeApplicant(Expr),
    #[error("cannot unify subexpression {found_left} with {found_right}, in order to unify expression {left} with {right}")]
    CannotUnify {
        found_left: Expr,
        found_right: Expr,
        left: Expr,
        right: Expr,
    },
    #[error("closure binding {binding} mentions {name}, which the closure does not bind")]
    OpenClosureBinding { binding: Ident, name: Name },
    #[error("recursive closure binding: {0}")]
    RecursiveClosureBinding(Ident),
    #[error("reduction fuel exhausted while normalizing {0}")]
    FuelExhausted(Expr),
}

impl TypeError {
    /// Stable diagnostic code, independent of message wording.
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            TypeError::UndeclaredTermName(_) => "K0001",
            TypeError::UndeclaredTypeName(_) => "K0002",
            TypeError::InvalidTermTermApplicant(_) => "K0003",
            TypeError::InvalidTermTypeApplicant(_) => "K0004",
            TypeError::InvalidTypeTermApplicant(_) => "K0005",
            TypeError::InvalidTypeTypeApplicant(_) => "K0006",
            TypeError::CannotUnify { .. } => "K0007",
            TypeError::OpenClosureBinding { .. } => "K0008",
            TypeError::RecursiveClosureBinding(_) => "K0009",
            TypeError::FuelExhausted(_) => "K0010",
        }
    }
}

/// A bundle of non-recursive, fully elaborated definitions, entering the
/// context as a single frame. Terms and types carry their classifiers;
/// the maps are ordered so validation and errors are deterministic.
#[derive(Debug, Clone, Default)]
pub struct Closure {
    terms: BTreeMap<Ident, (Rc<Term>, Rc<Type>)>,
    types: BTreeMap<Ident, (Rc<Type>, Rc<Kind>)>,
    kinds: BTreeMap<Ident, Rc<Kind>>,
}

impl Closure {
    pub fn new() -> Self {
        Closure::default()
    }

    pub fn define_term(&mut self, x: Ident, body: Rc<Term>, ty: Rc<Type>) {
        self.terms.insert(x, (body, ty));
    }

    pub fn define_type(&mut self, x: Ident, body: Rc<Type>, kind: Rc<Kind>) {
        self.types.insert(x, (body, kind));
    }

    pub fn define_kind(&mut self, x: Ident, kind: Rc<Kind>) {
        self.kinds.insert(x, kind);
    }

    pub fn term(&self, x: &Ident) -> Option<&(Rc<Term>, Rc<Type>)> {
        self.terms.get(x)
    }

    pub fn ty(&self, x: &Ident) -> Option<&(Rc<Type>, Rc<Kind>)> {
        self.types.get(x)
    }

    pub fn kind(&self, x: &Ident) -> Option<&Rc<Kind>> {
        self.kinds.get(x)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.types.is_empty() && self.kinds.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum Frame {
    /// x : T
    Typing(Ident, Rc<Type>),
    /// X :: K
    Kinding(Ident, Rc<Kind>),
    /// A block of definitions
    Closure(Closure),
}

/// A leftward-growing stack of bindings. The innermost frame is last;
/// lookup walks from innermost outward, so inner frames shadow outer ones.
/// Extension is persistent: `declare_*` returns a new context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    frames: Vec<Frame>,
}

impl Context {
    pub fn new() -> Self {
        Context { frames: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn declare_type_of(&self, x: Ident, ty: Rc<Type>) -> Self {
        self.push(Frame::Typing(x, ty))
    }

    pub fn declare_kind_of(&self, x: Ident, kind: Rc<Kind>) -> Self {
        self.push(Frame::Kinding(x, kind))
    }

    pub fn declare_closure(&self, closure: Closure) -> Self {
        self.push(Frame::Closure(closure))
    }

    fn push(&self, frame: Frame) -> Self {
        let mut frames = self.frames.clone();
        frames.push(frame);
        Context { frames }
    }

    /// Type of a term-name, with its defining term when the binding comes
    /// from a closure frame.
    pub fn lookup_term(&self, x: &Ident) -> Option<(Option<Rc<Term>>, Rc<Type>)> {
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::Typing(y, ty) if y == x => return Some((None, ty.clone())),
                Frame::Closure(clo) => {
                    if let Some((body, ty)) = clo.term(x) {
                        return Some((Some(body.clone()), ty.clone()));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Kind of a type-name, with its defining type when the binding comes
    /// from a closure frame.
    pub fn lookup_type(&self, x: &Ident) -> Option<(Option<Rc<Type>>, Rc<Kind>)> {
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::Kinding(y, kind) if y == x => return Some((None, kind.clone())),
                Frame::Closure(clo) => {
                    if let Some((body, kind)) = clo.ty(x) {
                        return Some((Some(body.clone()), kind.clone()));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Kind bound to a kind-name by a closure frame.
    pub fn lookup_kind(&self, x: &Ident) -> Option<Rc<Kind>> {
        for frame in self.frames.iter().rev() {
            if let Frame::Closure(clo) = frame {
                if let Some(kind) = clo.kind(x) {
                    return Some(kind.clone());
                }
            }
        }
        None
    }
}

/// Check every frame of `ctx` against the frames beneath it.
pub fn wellformed_context(ctx: &Context) -> Result<(), TypeError> {
    for i in 0..ctx.frames.len() {
        let tail = Context {
            frames: ctx.frames[..i].to_vec(),
        };
        match &ctx.frames[i] {
            Frame::Typing(_, ty) => check_kind(ty, &Kind::star(), &tail)?,
            Frame::Kinding(_, kind) => wellformed_kind(kind, &tail)?,
            Frame::Closure(clo) => wellformed_closure(clo, &tail)?,
        }
    }
    Ok(())
}

/// Check a closure against the context beneath it. The closure laws come
/// first: every binding's free names must be bound by the closure itself,
/// and the dependency graph must be acyclic. Term and type bindings are
/// then checked inside the closure frame, so they may reference each
/// other; kind bindings are checked against the tail.
pub fn wellformed_closure(closure: &Closure, tail: &Context) -> Result<(), TypeError> {
    closure_laws(closure)?;
    let inside = tail.declare_closure(closure.clone());
    for (body, ty) in closure.terms.values() {
        check_type(body, ty, &inside)?;
    }
    for (body, kind) in closure.types.values() {
        check_kind(body, kind, &inside)?;
    }
    for kind in closure.kinds.values() {
        wellformed_kind(kind, tail)?;
    }
    Ok(())
}

fn closure_laws(closure: &Closure) -> Result<(), TypeError> {
    // Every free name of a binding must be bound by the closure.
    let mut deps: BTreeMap<Name, Vec<Name>> = BTreeMap::new();
    let mut check_body = |binding: &Ident, key: Name, e: Expr| -> Result<(), TypeError> {
        let mut used = Vec::new();
        for n in free_term_names(&e) {
            if !closure.terms.contains_key(&n) {
                return Err(TypeError::OpenClosureBinding {
                    binding: binding.clone(),
                    name: Name::Term(n),
                });
            }
            used.push(Name::Term(n));
        }
        for n in free_type_names(&e) {
            if !closure.types.contains_key(&n) {
                return Err(TypeError::OpenClosureBinding {
                    binding: binding.clone(),
                    name: Name::Type(n),
                });
            }
            used.push(Name::Type(n));
        }
        deps.entry(key).or_default().extend(used);
        Ok(())
    };
    for (x, (body, _)) in &closure.terms {
        check_body(x, Name::Term(x.clone()), Expr::Term(body.clone()))?;
    }
    for (x, (body, _)) in &closure.types {
        check_body(x, Name::Type(x.clone()), Expr::Type(body.clone()))?;
    }

    // No binding may depend on itself, directly or through others.
    let mut done: BTreeSet<Name> = BTreeSet::new();
    let mut in_progress: BTreeSet<Name> = BTreeSet::new();
    fn visit(
        node: &Name,
        deps: &BTreeMap<Name, Vec<Name>>,
        done: &mut BTreeSet<Name>,
        in_progress: &mut BTreeSet<Name>,
    ) -> Result<(), TypeError> {
        if done.contains(node) {
            return Ok(());
        }
        if !in_progress.insert(node.clone()) {
            return Err(TypeError::RecursiveClosureBinding(node.ident().clone()));
        }
        for dep in deps.get(node).into_iter().flatten() {
            visit(dep, deps, done, in_progress)?;
        }
        in_progress.remove(node);
        done.insert(node.clone());
        Ok(())
    }
    let nodes: Vec<Name> = deps.keys().cloned().collect();
    for node in &nodes {
        visit(node, &deps, &mut done, &mut in_progress)?;
    }
    Ok(())
}

/// Well-formedness of a kind under a context.
pub fn wellformed_kind(kind: &Rc<Kind>, ctx: &Context) -> Result<(), TypeError> {
    match &**kind {
        Kind::Star => Ok(()),
        Kind::All(x, dom, body) => {
            wellformed_kind(body, &ctx.declare_kind_of(x.clone(), dom.clone()))?;
            wellformed_kind(dom, ctx)
        }
        Kind::Pi(x, dom, body) => {
            wellformed_kind(body, &ctx.declare_type_of(x.clone(), dom.clone()))?;
            check_kind(dom, &Kind::star(), ctx)
        }
    }
}

/// Check a type against an expected kind.
pub fn check_kind(ty: &Rc<Type>, kind: &Rc<Kind>, ctx: &Context) -> Result<(), TypeError> {
    wellformed_kind(kind, ctx)?;
    let synthesized = synthesize_kind(ty, ctx)?;
    unify(&Expr::Kind(kind.clone()), &Expr::Kind(synthesized), ctx)
}

/// Synthesize the kind of a type.
pub fn synthesize_kind(ty: &Rc<Type>, ctx: &Context) -> Result<Rc<Kind>, TypeError> {
    match &**ty {
        Type::Var(x) => ctx
            .lookup_type(x)
            .map(|(_, kind)| kind)
            .ok_or_else(|| TypeError::UndeclaredTypeName(x.clone())),
        Type::App(f, a) => {
            // Kinds carry no head redexes, so the synthesized kind is
            // already in matchable form.
            let kind = synthesize_kind(f, ctx)?;
            match &*kind {
                Kind::Pi(x, dom, body) => {
                    check_type(a, dom, ctx)?;
                    Ok(subst_term_in_kind(x, a, body))
                }
                _ => Err(TypeError::InvalidTypeTermApplicant(Expr::Kind(kind.clone()))),
            }
        }
        Type::All(x, dom, body) => {
            let inner = synthesize_kind(body, &ctx.declare_kind_of(x.clone(), dom.clone()))?;
            wellformed_kind(dom, ctx)?;
            Ok(Kind::all(x.clone(), dom.clone(), inner))
        }
        Type::Pi(x, dom, body) => {
            let inner = synthesize_kind(body, &ctx.declare_type_of(x.clone(), dom.clone()))?;
            check_kind(dom, &Kind::star(), ctx)?;
            Ok(Kind::pi(x.clone(), dom.clone(), inner))
        }
        Type::TyApp(f, s) => {
            let kind = synthesize_kind(f, ctx)?;
            match &*kind {
                Kind::All(x, dom, body) => {
                    check_kind(s, dom, ctx)?;
                    Ok(subst_type_in_kind(x, s, body))
                }
                _ => Err(TypeError::InvalidTypeTypeApplicant(Expr::Kind(kind.clone()))),
            }
        }
        Type::Iota(x, body) => {
            // The bound term inhabits the self type being formed.
            let inner = ctx.declare_type_of(x.clone(), ty.clone());
            check_kind(body, &Kind::star(), &inner)?;
            Ok(Kind::star())
        }
    }
}

/// Check a term against an expected type.
///
/// The self type has both of its rules here: introduction checks the term
/// against the instantiated body, and elimination instantiates a
/// synthesized self type at the checked term before unifying.
pub fn check_type(term: &Rc<Term>, ty: &Rc<Type>, ctx: &Context) -> Result<(), TypeError> {
    if let Type::Iota(x, body) = &**ty {
        // a : iota x. T  exactly when  a : T[x := a]
        let inst = subst_term_in_type(x, term, body);
        check_type(term, &inst, ctx)?;
        return check_kind(ty, &Kind::star(), ctx);
    }
    let synthesized = synthesize_type(term, ctx)?;
    if let Type::Iota(x, body) = &*synthesized {
        let inst = subst_term_in_type(x, term, body);
        return unify(&Expr::Type(ty.clone()), &Expr::Type(inst), ctx);
    }
    unify(&Expr::Type(ty.clone()), &Expr::Type(synthesized), ctx)
}

fn whnf_type(ty: Rc<Type>, ctx: &Context) -> Result<Rc<Type>, TypeError> {
    match evaluate(&Expr::Type(ty), ctx, Transparency::All)? {
        Expr::Type(ty) => Ok(ty),
        _ => unreachable!("type reduced to a non-type"),
    }
}

/// Synthesize the type of a term.
pub fn synthesize_type(term: &Rc<Term>, ctx: &Context) -> Result<Rc<Type>, TypeError> {
    match &**term {
        Term::Var(x) => ctx
            .lookup_term(x)
            .map(|(_, ty)| ty)
            .ok_or_else(|| TypeError::UndeclaredTermName(x.clone())),
        Term::Lam(x, dom, body) => {
            check_kind(dom, &Kind::star(), ctx)?;
            let inner = synthesize_type(body, &ctx.declare_type_of(x.clone(), dom.clone()))?;
            Ok(Type::pi(x.clone(), dom.clone(), inner))
        }
        Term::App(f, a) => {
            let fty = whnf_type(synthesize_type(f, ctx)?, ctx)?;
            match &*fty {
                Type::Pi(x, dom, body) => {
                    check_type(a, dom, ctx)?;
                    Ok(subst_term_in_type(x, a, body))
                }
                _ => Err(TypeError::InvalidTermTermApplicant(Expr::Type(fty.clone()))),
            }
        }
        Term::TyLam(x, dom, body) => {
            wellformed_kind(dom, ctx)?;
            let inner = synthesize_type(body, &ctx.declare_kind_of(x.clone(), dom.clone()))?;
            Ok(Type::all(x.clone(), dom.clone(), inner))
        }
        Term::TyApp(f, s) => {
            let fty = whnf_type(synthesize_type(f, ctx)?, ctx)?;
            match &*fty {
                Type::All(x, dom, body) => {
                    check_kind(s, dom, ctx)?;
                    Ok(subst_type_in_type(x, s, body))
                }
                _ => Err(TypeError::InvalidTermTypeApplicant(Expr::Type(fty.clone()))),
            }
        }
    }
}

/// A top-level statement: a term definition checked against a declared
/// type, or a type definition checked against a declared kind.
#[derive(Debug, Clone)]
pub enum Stmt {
    DefnTm(Ident, Rc<Type>, Rc<Term>),
    DefnTy(Ident, Rc<Kind>, Rc<Type>),
}

pub type Prgm = Vec<Stmt>;

/// Elaborate one statement, returning the extended context. The annotation
/// is pushed eagerly, before the body is checked, so the body may reference
/// the name being defined (through a self type). Term annotations are not
/// compared against `*`: a function type synthesizes a `Pi`-shaped kind,
/// so only domains are held to `*` (inside `synthesize_type`).
pub fn elaborate_stmt(ctx: &Context, stmt: &Stmt) -> Result<Context, TypeError> {
    match stmt {
        Stmt::DefnTm(x, ty, body) => {
            let extended = ctx.declare_type_of(x.clone(), ty.clone());
            check_type(body, ty, &extended)?;
            Ok(extended)
        }
        Stmt::DefnTy(x, kind, body) => {
            wellformed_kind(kind, ctx)?;
            let extended = ctx.declare_kind_of(x.clone(), kind.clone());
            check_kind(body, kind, &extended)?;
            Ok(extended)
        }
    }
}

/// Elaborate a program from the empty context, stopping at the first
/// error. The final context holds every declared annotation.
pub fn elaborate_program(prgm: &Prgm) -> Result<Context, TypeError> {
    let mut ctx = Context::new();
    for stmt in prgm {
        ctx = elaborate_stmt(&ctx, stmt)?;
    }
    Ok(ctx)
}
