//! Tree traversal helpers shared by processors.

use crate::domain::{Directive, Fragment};

/// Outcome of a rewrite callback for one directive.
#[derive(Debug)]
pub enum Rewrite {
    /// Copy the directive and keep transforming its children
    Keep,
    /// Drop the directive and emit these in its place
    Replace(Vec<Directive>),
}

/// Visit every directive depth-first, pre-order, mutating in place.
///
/// Stops at the first error; the fragment is then only partially visited.
pub fn apply_recursively_in_place<C, E, F>(
    fragment: &mut Fragment,
    ctx: &mut C,
    visit: &mut F,
) -> Result<(), E>
where
    C: ?Sized,
    F: FnMut(&mut Directive, &mut C) -> Result<(), E>,
{
    for directive in fragment.iter_mut() {
        visit(directive, ctx)?;
        apply_recursively_in_place(&mut directive.nested, ctx, visit)?;
    }
    Ok(())
}

/// Read-only counterpart of [`apply_recursively_in_place`], used by prepare phases.
pub fn visit_recursively<C, E, F>(fragment: &Fragment, ctx: &mut C, visit: &mut F) -> Result<(), E>
where
    C: ?Sized,
    F: FnMut(&Directive, &mut C) -> Result<(), E>,
{
    for directive in fragment {
        visit(directive, ctx)?;
        visit_recursively(&directive.nested, ctx, visit)?;
    }
    Ok(())
}

/// Build a new fragment from `input`, letting `rewrite` replace any directive.
///
/// Kept directives are copied with their children transformed recursively.
/// Replacements are emitted at the position of the directive they replace.
pub fn transform<F>(input: &Fragment, rewrite: &mut F) -> Fragment
where
    F: FnMut(&Directive) -> Rewrite,
{
    let mut output = Fragment::new();
    for directive in input {
        match rewrite(directive) {
            Rewrite::Keep => {
                let nested = transform(&directive.nested, rewrite);
                output.push(directive.with_nested(nested));
            }
            Rewrite::Replace(replacements) => output.extend(replacements),
        }
    }
    output
}
