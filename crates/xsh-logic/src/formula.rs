use std::fmt;

use xsh_tags::{TagId, TagRegistry, TagSet};

/// `Var(t) | Not(f) | And([f]) | Or([f]) | Implies(lhs, rhs)` — total
/// evaluator over a [`TagSet`] (§4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    Var(TagId),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn var(id: TagId) -> Formula {
        Formula::Var(id)
    }

    pub fn not(f: Formula) -> Formula {
        Formula::Not(Box::new(f))
    }

    pub fn implies(lhs: Formula, rhs: Formula) -> Formula {
        Formula::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn evaluate(&self, tags: &TagSet) -> bool {
        match self {
            Formula::Var(id) => tags.contains(*id),
            Formula::Not(f) => !f.evaluate(tags),
            Formula::And(fs) => fs.iter().all(|f| f.evaluate(tags)),
            Formula::Or(fs) => fs.iter().any(|f| f.evaluate(tags)),
            Formula::Implies(lhs, rhs) => !lhs.evaluate(tags) || rhs.evaluate(tags),
        }
    }

    /// Every distinct [`TagId`] referenced anywhere in the formula.
    pub fn free_vars(&self) -> Vec<TagId> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect_vars(&self, out: &mut Vec<TagId>) {
        match self {
            Formula::Var(id) => out.push(*id),
            Formula::Not(f) => f.collect_vars(out),
            Formula::And(fs) | Formula::Or(fs) => fs.iter().for_each(|f| f.collect_vars(out)),
            Formula::Implies(lhs, rhs) => {
                lhs.collect_vars(out);
                rhs.collect_vars(out);
            }
        }
    }

    /// The "positive literal closure" used when applying a rule's
    /// conclusion during forward chaining: every atomic positive var that
    /// the conclusion asserts, ignoring negations and disjunctions.
    pub fn positive_literal_closure(&self) -> Vec<TagId> {
        let mut out = Vec::new();
        self.collect_positive(&mut out);
        out
    }

    fn collect_positive(&self, out: &mut Vec<TagId>) {
        match self {
            Formula::Var(id) => out.push(*id),
            Formula::And(fs) => fs.iter().for_each(|f| f.collect_positive(out)),
            // Negations, disjunctions and implications don't assert an
            // unconditional positive tag; they contribute nothing to the
            // closure used for forward chaining.
            _ => {}
        }
    }

    pub fn display<'a>(&'a self, registry: &'a TagRegistry) -> FormulaDisplay<'a> {
        FormulaDisplay { formula: self, registry }
    }
}

pub struct FormulaDisplay<'a> {
    formula: &'a Formula,
    registry: &'a TagRegistry,
}

impl fmt::Display for FormulaDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_formula(self.formula, self.registry, f)
    }
}

fn tag_name(registry: &TagRegistry, id: TagId) -> String {
    registry.name_of(id).unwrap_or("?").to_owned()
}

fn write_formula(formula: &Formula, registry: &TagRegistry, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match formula {
        Formula::Var(id) => write!(f, "{}", tag_name(registry, *id)),
        Formula::Not(inner) => {
            write!(f, "not(")?;
            write_formula(inner, registry, f)?;
            write!(f, ")")
        }
        Formula::And(fs) => write_joined("and", fs, registry, f),
        Formula::Or(fs) => write_joined("or", fs, registry, f),
        Formula::Implies(lhs, rhs) => {
            write!(f, "implies(")?;
            write_formula(lhs, registry, f)?;
            write!(f, ", ")?;
            write_formula(rhs, registry, f)?;
            write!(f, ")")
        }
    }
}

fn write_joined(op: &str, fs: &[Formula], registry: &TagRegistry, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}(", op)?;
    for (i, sub) in fs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_formula(sub, registry, f)?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_is_pure() {
        let mut tags = TagSet::new();
        tags.insert(1);
        let f = Formula::implies(Formula::var(1), Formula::var(2));
        assert_eq!(f.evaluate(&tags), false);
        assert_eq!(f.evaluate(&tags), false);
    }

    #[test]
    fn positive_closure_skips_negation() {
        let f = Formula::And(vec![Formula::var(1), Formula::not(Formula::var(2))]);
        assert_eq!(f.positive_literal_closure(), vec![1]);
    }
}
