//! Dotted annotations such as `lart.abstract.sym`
//!
//! An annotation is stored as string metadata under [`TAG`] on functions
//! and instructions, and [`enumerate`] walks a module for them.

use std::fmt;

use llir::{Context, IrResult, ModuleId, ValueId};

use crate::{fmt as sfmt, meta, views};

pub const TAG: &str = "sc.annotation";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Annotation {
    parts: Vec<String>,
}

impl Annotation {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a dotted string into parts
    pub fn parse(s: &str) -> Self {
        Self::new(sfmt::splitter(s, '.', false))
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Parts joined with `.`
    pub fn str(&self) -> String {
        self.parts.join(".")
    }

    /// Last part
    pub fn name(&self) -> Option<&str> {
        self.parts.last().map(String::as_str)
    }

    pub fn back(&self) -> Option<&str> {
        self.name()
    }

    pub fn size(&self) -> usize {
        self.parts.len()
    }

    /// Everything but the last part
    pub fn namespace(&self) -> Annotation {
        let keep = self.parts.len().saturating_sub(1);
        Self::new(self.parts[..keep].iter().cloned())
    }

    /// Whether `ns` is a strict prefix of this annotation
    pub fn in_namespace(&self, ns: &Annotation) -> bool {
        ns.size() < self.size() && self.parts.starts_with(&ns.parts)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.str())
    }
}

/// Attach `annotation` to a function or instruction
pub fn annotate(ctx: &mut Context, value: ValueId, annotation: &Annotation) -> IrResult<()> {
    tracing::trace!(annotation = %annotation, "annotate");
    meta::set(ctx, value, TAG, &annotation.str())
}

pub fn annotation(ctx: &Context, value: ValueId) -> Option<Annotation> {
    meta::get(ctx, value, TAG).map(Annotation::parse)
}

/// Annotated functions, then annotated instructions, of `module`
pub fn enumerate(ctx: &Context, module: ModuleId) -> impl Iterator<Item = (ValueId, Annotation)> + '_ {
    let functions = ctx
        .module_functions(module)
        .iter()
        .map(|f| ctx.function_value(*f));
    functions
        .chain(views::instructions(ctx, module))
        .filter_map(|v| annotation(ctx, v).map(|a| (v, a)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Action, StackBuilder};

    #[test]
    fn test_str_and_parts() {
        let a = Annotation::new(["lart", "abstract"]);
        assert_eq!(a.str(), "lart.abstract");
        assert_eq!(a.to_string(), "lart.abstract");
        assert_eq!(a.name(), Some("abstract"));
        assert_eq!(a.size(), 2);
        assert_eq!(Annotation::parse("lart.abstract"), a);
        assert_eq!(Annotation::default().str(), "");
    }

    #[test]
    fn test_namespaces() {
        let sym = Annotation::parse("lart.abstract.sym");
        let ns = sym.namespace();
        assert_eq!(ns, Annotation::parse("lart.abstract"));
        assert!(sym.in_namespace(&ns));
        assert!(sym.in_namespace(&Annotation::parse("lart")));
        assert!(!sym.in_namespace(&sym));
        assert!(!ns.in_namespace(&sym));
        assert!(!sym.in_namespace(&Annotation::parse("lart.concrete")));
        assert_eq!(Annotation::default().namespace(), Annotation::default());
    }

    #[test]
    fn test_enumerate_module() {
        let mut ctx = Context::new();
        let module = ctx.create_module("m");
        let i8 = ctx.int_type(8);

        let mut sb = StackBuilder::new(&mut ctx)
            .apply_all([
                Action::Module(module),
                Action::create_function("f", i8, vec![i8], false),
                Action::create_block("entry"),
                Action::alloc(i8),
            ])
            .unwrap();
        let slot = sb.last().unwrap();
        let f = sb.last().unwrap();
        drop(sb);

        let abstract_fn = Annotation::parse("lart.abstract");
        let sym = Annotation::parse("lart.abstract.sym");
        annotate(&mut ctx, f, &abstract_fn).unwrap();
        annotate(&mut ctx, slot, &sym).unwrap();

        let found: Vec<_> = enumerate(&ctx, module).collect();
        assert_eq!(found, vec![(f, abstract_fn), (slot, sym)]);
    }
}
