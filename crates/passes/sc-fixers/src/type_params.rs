//! Type-parameter substitution
//!
//! Instantiating a generic template replaces every identifier that stands
//! for a type parameter with the concrete argument. A bare name in
//! expression position takes the nullability-stripped rendering (`int`, not
//! `int?`, in front of `.Parse`); type positions take the ordinary rendering.
//! A segment of a multi-segment qualified name is never replaced.

use rustc_hash::FxHashMap;
use sc_intern::Symbol;
use sc_syntax::{Block, Body, Copier, CopyHook, Expr, ExprId, Member, SymbolId, TypeRef};
use tracing::debug;

/// A concrete argument for one type parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateTypeArgument {
    /// The host's symbol for the resolved type, if any
    pub resolved: Option<SymbolId>,
    /// Rendering used in type positions
    pub ordinary: TypeRef,
    /// Rendering with the outer nullable marker removed
    pub stripped: TypeRef,
}

impl TemplateTypeArgument {
    /// Argument for `ty`, deriving the stripped rendering
    #[must_use]
    pub fn new(ty: TypeRef) -> Self {
        Self {
            resolved: None,
            stripped: ty.strip_nullable().clone(),
            ordinary: ty,
        }
    }

    /// Attach the host's symbol for the type
    #[must_use]
    pub fn with_symbol(mut self, symbol: SymbolId) -> Self {
        self.resolved = Some(symbol);
        self
    }
}

/// Type arguments keyed by type-parameter name
pub type TypeArguments = FxHashMap<Symbol, TemplateTypeArgument>;

struct Substitution<'a> {
    args: &'a TypeArguments,
    replaced: usize,
}

impl Substitution<'_> {
    fn map(&mut self, ty: &TypeRef, under_nullable: bool) -> TypeRef {
        match ty {
            TypeRef::Path { segments, args } if segments.len() == 1 && args.is_empty() => {
                match self.args.get(&segments[0]) {
                    Some(arg) => {
                        self.replaced += 1;
                        // `T?` with `T = int?` must not print as `int??`.
                        if under_nullable {
                            arg.stripped.clone()
                        } else {
                            arg.ordinary.clone()
                        }
                    }
                    None => ty.clone(),
                }
            }
            TypeRef::Path { segments, args } => TypeRef::Path {
                segments: segments.clone(),
                args: args.iter().map(|arg| self.map(arg, false)).collect(),
            },
            TypeRef::Nullable(inner) => TypeRef::Nullable(Box::new(self.map(inner, true))),
        }
    }
}

impl CopyHook for Substitution<'_> {
    fn substitute(&mut self, source: &Body, id: ExprId) -> Option<Expr> {
        match &source.exprs[id] {
            Expr::Name { name, span, .. } => self.args.get(name).map(|arg| {
                self.replaced += 1;
                Expr::TypeExpr {
                    ty: arg.stripped.clone(),
                    span: *span,
                }
            }),
            _ => None,
        }
    }

    fn map_type(&mut self, ty: &TypeRef) -> TypeRef {
        self.map(ty, false)
    }
}

/// Copy the tree under `block` with type parameters replaced
#[must_use]
pub fn substitute(body: &Body, block: &Block, args: &TypeArguments) -> (Body, Block) {
    let mut copier = Copier::new(
        body,
        Substitution {
            args,
            replaced: 0,
        },
    );
    let block = copier.block(block);
    debug!(replaced = copier.hook().replaced, "substituted type parameters");
    (copier.finish(), block)
}

/// Instantiate a generic member with concrete type arguments
///
/// Parameters without an argument stay generic.
#[must_use]
pub fn instantiate(member: &Member, args: &TypeArguments) -> Member {
    let (body, block) = substitute(&member.body, &member.block, args);
    let mut types = Substitution {
        args,
        replaced: 0,
    };
    let params = member
        .params
        .iter()
        .map(|param| {
            let mut param = param.clone();
            param.ty = param.ty.as_ref().map(|ty| types.map(ty, false));
            param
        })
        .collect();
    Member {
        name: member.name,
        attributes: member.attributes.clone(),
        params,
        type_params: member
            .type_params
            .iter()
            .filter(|param| !args.contains_key(param))
            .copied()
            .collect(),
        body,
        block,
        span: member.span,
    }
}
