use std::collections::HashMap;

use xsh_tags::{TagId, TagRegistry, TagSet};

use crate::{Formula, ImplicationRule};

#[derive(Debug, Clone)]
pub struct ConflictInfo {
    pub description: String,
    pub conflicting_tags: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Forward-chaining rule engine over tag sets (§4.3). Owns no `TagRegistry`
/// itself — callers pass one in wherever a rule must be authored from or
/// explained back into tag *names*.
#[derive(Debug, Default)]
pub struct LogicEngine {
    rules: Vec<ImplicationRule>,
}

impl LogicEngine {
    pub fn new() -> Self {
        LogicEngine::default()
    }

    pub fn add_rule(&mut self, rule: ImplicationRule) {
        if let Some(existing) = self.rules.iter_mut().find(|r| r.name == rule.name) {
            *existing = rule;
        } else {
            self.rules.push(rule);
        }
    }

    pub fn add_simple_rule(
        &mut self,
        registry: &mut TagRegistry,
        name: &str,
        premise_tag: &str,
        conclusion_tag: &str,
        confidence: f32,
        source: &str,
    ) {
        let premise = Formula::var(registry.register(premise_tag));
        let conclusion = Formula::var(registry.register(conclusion_tag));
        self.add_rule(ImplicationRule::new(name, premise, conclusion, confidence, source));
    }

    pub fn add_exclusion_rule(&mut self, registry: &mut TagRegistry, name: &str, tag1: &str, tag2: &str, source: &str) {
        let premise = Formula::var(registry.register(tag1));
        let conclusion = Formula::not(Formula::var(registry.register(tag2)));
        self.add_rule(ImplicationRule::new(name, premise, conclusion, 1.0, source));
    }

    pub fn remove_rule(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.name != name);
        self.rules.len() != before
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name == name)
    }

    pub fn rules(&self) -> &[ImplicationRule] {
        &self.rules
    }

    /// Installs a curated, deterministic, idempotent set of built-in rules
    /// (`logic.init`). The exact catalog is not part of the contract — only
    /// that calling this repeatedly is a no-op past the first time.
    pub fn install_builtin_rules(&mut self, registry: &mut TagRegistry) {
        self.add_simple_rule(registry, "builtin:impl-language", "impl", "language", 1.0, "hardcoded");
        self.add_simple_rule(registry, "builtin:async-io", "async", "io", 0.9, "hardcoded");
        self.add_simple_rule(registry, "builtin:test-code", "test", "code", 1.0, "hardcoded");
        self.add_simple_rule(registry, "builtin:impl-code", "impl", "code", 1.0, "hardcoded");
        self.add_exclusion_rule(registry, "builtin:draft-excludes-final", "draft", "final", "hardcoded");
    }

    /// Forward chaining to a fixed point (§4.3). Bounded by `|rules| + 1`
    /// passes so a pathological rule set still terminates.
    pub fn infer_tags(&self, initial: &TagSet, min_confidence: f32) -> TagSet {
        let mut current = initial.clone();
        let max_iterations = self.rules.len() + 1;
        for _ in 0..max_iterations {
            let fingerprint_before = current.fingerprint();
            for rule in &self.rules {
                if rule.confidence < min_confidence {
                    continue;
                }
                if rule.premise.evaluate(&current) {
                    for tag in rule.conclusion.positive_literal_closure() {
                        current.insert(tag);
                    }
                }
            }
            if current.fingerprint() == fingerprint_before {
                break;
            }
        }
        current
    }

    /// First violated exclusion rule, independent of confidence (§4.3).
    pub fn check_consistency(&self, tags: &TagSet, registry: &TagRegistry) -> Option<ConflictInfo> {
        for rule in &self.rules {
            let Formula::Not(inner) = &rule.conclusion else { continue };
            let Formula::Var(excluded) = **inner else { continue };
            if tags.contains(excluded) && rule.premise.evaluate(tags) {
                let mut conflicting: Vec<TagId> = rule.premise.free_vars();
                conflicting.push(excluded);
                conflicting.sort_unstable();
                conflicting.dedup();
                let names: Vec<String> = conflicting
                    .iter()
                    .map(|&id| registry.name_of(id).unwrap_or("?").to_owned())
                    .collect();
                return Some(ConflictInfo {
                    description: format!("rule {:?} is violated: {}", rule.name, names.join(", ")),
                    conflicting_tags: names,
                    suggestions: vec![format!("remove one of the conflicting tags, or disable rule {:?}", rule.name)],
                });
            }
        }
        None
    }

    /// Enumerates free variables up to 20; falls back to DPLL-style
    /// backtracking with unit propagation for larger formulas. Never
    /// consults the rule set (§4.3).
    pub fn is_satisfiable(&self, formula: &Formula) -> bool {
        let vars = formula.free_vars();
        if vars.len() <= 20 {
            let combinations = 1u32 << vars.len();
            for assignment in 0..combinations {
                let mut tags = TagSet::new();
                for (i, &var) in vars.iter().enumerate() {
                    if assignment & (1 << i) != 0 {
                        tags.insert(var);
                    }
                }
                if formula.evaluate(&tags) {
                    return true;
                }
            }
            false
        } else {
            dpll_search(formula, &vars, &mut TagSet::new(), 0)
        }
    }

    /// Explains how `target` is derivable from `initial`: the chain of
    /// rules whose firing, in order, produces it.
    pub fn explain_inference(&self, target: TagId, initial: &TagSet, registry: &TagRegistry) -> Vec<String> {
        if initial.contains(target) {
            return Vec::new();
        }

        let mut introduced_by: HashMap<TagId, usize> = HashMap::new();
        let mut current = initial.clone();
        let max_iterations = self.rules.len() + 1;
        for _ in 0..max_iterations {
            let fingerprint_before = current.fingerprint();
            for (idx, rule) in self.rules.iter().enumerate() {
                if rule.premise.evaluate(&current) {
                    for tag in rule.conclusion.positive_literal_closure() {
                        if !current.contains(tag) {
                            introduced_by.entry(tag).or_insert(idx);
                        }
                    }
                    for tag in rule.conclusion.positive_literal_closure() {
                        current.insert(tag);
                    }
                }
            }
            if current.fingerprint() == fingerprint_before {
                break;
            }
        }

        let mut steps = Vec::new();
        let mut seen = std::collections::HashSet::new();
        self.walk_explanation(target, initial, &introduced_by, registry, &mut steps, &mut seen);
        steps
    }

    fn walk_explanation(
        &self,
        tag: TagId,
        initial: &TagSet,
        introduced_by: &HashMap<TagId, usize>,
        registry: &TagRegistry,
        steps: &mut Vec<String>,
        seen: &mut std::collections::HashSet<TagId>,
    ) {
        if initial.contains(tag) || !seen.insert(tag) {
            return;
        }
        let Some(&idx) = introduced_by.get(&tag) else { return };
        let rule = &self.rules[idx];
        for premise_var in rule.premise.free_vars() {
            self.walk_explanation(premise_var, initial, introduced_by, registry, steps, seen);
        }
        steps.push(format!(
            "{} ⇒ {} (rule {:?}, confidence {:.2})",
            rule.premise.display(registry),
            registry.name_of(tag).unwrap_or("?"),
            rule.name,
            rule.confidence,
        ));
    }
}

fn dpll_search(formula: &Formula, vars: &[TagId], assigned: &mut TagSet, idx: usize) -> bool {
    if idx == vars.len() {
        return formula.evaluate(assigned);
    }
    let var = vars[idx];
    assigned.insert(var);
    if dpll_search(formula, vars, assigned, idx + 1) {
        return true;
    }
    assigned.erase(var);
    dpll_search(formula, vars, assigned, idx + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_tags_is_superset_and_fixed_point() {
        let mut registry = TagRegistry::new();
        let mut engine = LogicEngine::new();
        engine.add_simple_rule(&mut registry, "r1", "doc", "text", 1.0, "user");
        let mut initial = TagSet::new();
        initial.insert(registry.register("doc"));

        let inferred = engine.infer_tags(&initial, 0.5);
        assert!(inferred.is_superset_of(&initial));
        let twice = engine.infer_tags(&inferred, 0.5);
        assert_eq!(twice, inferred);
        assert!(inferred.contains(registry.id_of("text")));
    }

    #[test]
    fn consistency_detects_exclusion() {
        let mut registry = TagRegistry::new();
        let mut engine = LogicEngine::new();
        engine.add_exclusion_rule(&mut registry, "excl", "draft", "final", "user");
        let mut tags = TagSet::new();
        tags.insert(registry.register("draft"));
        tags.insert(registry.register("final"));
        let conflict = engine.check_consistency(&tags, &registry);
        assert!(conflict.is_some());
    }

    #[test]
    fn satisfiable_small_and_large() {
        let mut registry = TagRegistry::new();
        let engine = LogicEngine::new();
        let f = Formula::And(vec![Formula::var(registry.register("a")), Formula::not(Formula::var(registry.register("a")))]);
        assert!(!engine.is_satisfiable(&f));

        let many_vars: Vec<TagId> = (0..25).map(|i| registry.register(&format!("v{i}"))).collect();
        let big = Formula::Or(many_vars.iter().map(|&v| Formula::var(v)).collect());
        assert!(engine.is_satisfiable(&big));
    }

    #[test]
    fn explain_returns_chain() {
        let mut registry = TagRegistry::new();
        let mut engine = LogicEngine::new();
        engine.add_simple_rule(&mut registry, "r1", "doc", "mid", 1.0, "user");
        engine.add_simple_rule(&mut registry, "r2", "mid", "text", 1.0, "user");
        let mut initial = TagSet::new();
        initial.insert(registry.register("doc"));
        let explanation = engine.explain_inference(registry.id_of("text"), &initial, &registry);
        assert_eq!(explanation.len(), 2);
    }
}
