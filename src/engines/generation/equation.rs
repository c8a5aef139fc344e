use crate::error::{BoolfitError, Result};
use crate::types::{LogicOperator, Polarity};
use rand::Rng;
use std::fmt;

/// A regulator of an equation target together with its whitelist bit.
///
/// A blacklisted regulator stays in the equation structurally (so crossover keeps
/// equations aligned and a later mutation can restore it) but is left out of the
/// rendered logic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regulator {
    pub name: String,
    pub whitelisted: bool,
}

impl Regulator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            whitelisted: true,
        }
    }
}

/// Ordered regulators of one polarity and the operators between them.
///
/// `operators[i]` joins `regulators[i]` and `regulators[i + 1]`. When some
/// regulators are blacklisted, a whitelisted regulator at index `j` is joined to
/// its whitelisted predecessor by `operators[j - 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegulatorClause {
    regulators: Vec<Regulator>,
    operators: Vec<LogicOperator>,
}

impl RegulatorClause {
    pub fn new(names: &[String], operator: LogicOperator) -> Self {
        Self {
            regulators: names.iter().map(Regulator::new).collect(),
            operators: vec![operator; names.len().saturating_sub(1)],
        }
    }

    pub fn regulators(&self) -> &[Regulator] {
        &self.regulators
    }

    pub fn operators(&self) -> &[LogicOperator] {
        &self.operators
    }

    pub fn len(&self) -> usize {
        self.regulators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regulators.is_empty()
    }

    pub fn whitelisted(&self) -> impl Iterator<Item = &Regulator> {
        self.regulators.iter().filter(|r| r.whitelisted)
    }

    pub fn whitelisted_count(&self) -> usize {
        self.whitelisted().count()
    }

    fn push(&mut self, name: &str, operator: Option<LogicOperator>) {
        if let Some(op) = operator {
            self.operators.push(op);
        }
        self.regulators.push(Regulator::new(name));
    }

    /// Fold the whitelisted subsequence left to right, wrapping each regulator
    /// in a leaf and each partial result in a group.
    fn fold<L, G>(&self, leaf: L, group: G) -> Option<String>
    where
        L: Fn(&str) -> String,
        G: Fn(String, LogicOperator, String) -> String,
    {
        let mut acc: Option<String> = None;
        for (index, regulator) in self.regulators.iter().enumerate() {
            if !regulator.whitelisted {
                continue;
            }
            let term = leaf(&regulator.name);
            acc = Some(match acc {
                None => term,
                Some(prev) => group(prev, self.operators[index - 1], term),
            });
        }
        acc
    }

    /// Every regulator with the operators between them, blacklisted ones
    /// prefixed by `~`; `-` for an empty clause.
    fn to_structure(&self) -> String {
        if self.regulators.is_empty() {
            return "-".to_string();
        }
        let mut tokens = Vec::with_capacity(self.regulators.len() * 2);
        for (index, regulator) in self.regulators.iter().enumerate() {
            if index > 0 {
                tokens.push(self.operators[index - 1].as_str().to_string());
            }
            let mark = if regulator.whitelisted { "" } else { "~" };
            tokens.push(format!("{}{}", mark, regulator.name));
        }
        tokens.join(" ")
    }

    fn parse_structure(text: &str, field: &str) -> Result<Self> {
        let mut clause = Self::default();
        if field.trim() == "-" {
            return Ok(clause);
        }
        for (position, token) in field.split_whitespace().enumerate() {
            if position % 2 == 1 {
                let op = LogicOperator::from_token(token).ok_or_else(|| {
                    BoolfitError::equation_syntax(text, format!("expected an operator, found `{}`", token))
                })?;
                clause.operators.push(op);
                continue;
            }
            let (name, whitelisted) = match token.strip_prefix('~') {
                Some(name) => (name, false),
                None => (token, true),
            };
            if !is_node_name(name) {
                return Err(BoolfitError::equation_syntax(text, format!("invalid regulator `{}`", token)));
            }
            clause.regulators.push(Regulator {
                name: name.to_string(),
                whitelisted,
            });
        }
        if clause.regulators.len() != clause.operators.len() + 1 {
            return Err(BoolfitError::equation_syntax(text, "clause ends with an operator"));
        }
        Ok(clause)
    }

    fn render(&self) -> Option<String> {
        self.fold(
            |name| format!("( {} )", name),
            |prev, op, term| {
                // Re-open one parenthesis per regulator: `( ( a ) or b )`.
                let inner = term.trim_start_matches("( ").trim_end_matches(" )");
                format!("( {} {} {} )", prev, op, inner)
            },
        )
    }
}

/// The regulatory logic of a single target node.
///
/// Rendered as `target *= (activators) <link> not (inhibitors)`. A constant
/// equation (`target *= true`) is produced when a condition fixes the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equation {
    target: String,
    activating: RegulatorClause,
    inhibiting: RegulatorClause,
    link: Option<LogicOperator>,
    constant: Option<bool>,
}

impl Equation {
    /// Build the default equation `(a1 or a2 ...) and not (i1 or i2 ...)`.
    pub fn new(target: impl Into<String>, activators: &[String], inhibitors: &[String]) -> Self {
        let link = if activators.is_empty() || inhibitors.is_empty() {
            None
        } else {
            Some(LogicOperator::And)
        };
        Self {
            target: target.into(),
            activating: RegulatorClause::new(activators, LogicOperator::Or),
            inhibiting: RegulatorClause::new(inhibitors, LogicOperator::Or),
            link,
            constant: None,
        }
    }

    /// `target *= target`, used for nodes without regulators.
    pub fn self_loop(target: impl Into<String>) -> Self {
        let target = target.into();
        Self::new(target.clone(), &[target], &[])
    }

    pub fn constant(target: impl Into<String>, value: bool) -> Self {
        Self {
            target: target.into(),
            activating: RegulatorClause::default(),
            inhibiting: RegulatorClause::default(),
            link: None,
            constant: Some(value),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn link(&self) -> Option<LogicOperator> {
        self.link
    }

    pub fn constant_value(&self) -> Option<bool> {
        self.constant
    }

    pub fn clause(&self, polarity: Polarity) -> &RegulatorClause {
        match polarity {
            Polarity::Activating => &self.activating,
            Polarity::Inhibiting => &self.inhibiting,
        }
    }

    fn clause_mut(&mut self, polarity: Polarity) -> &mut RegulatorClause {
        match polarity {
            Polarity::Activating => &mut self.activating,
            Polarity::Inhibiting => &mut self.inhibiting,
        }
    }

    pub fn whitelisted_count(&self) -> usize {
        self.activating.whitelisted_count() + self.inhibiting.whitelisted_count()
    }

    /// Names of all regulators currently taking part in the logic.
    pub fn active_regulators(&self) -> impl Iterator<Item = &str> {
        self.activating
            .whitelisted()
            .chain(self.inhibiting.whitelisted())
            .map(|r| r.name.as_str())
    }

    /// Flip one randomly chosen internal operator of either clause.
    pub fn toggle_operator<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let activating = self.activating.operators.len();
        let total = activating + self.inhibiting.operators.len();
        if total == 0 {
            return;
        }
        let index = rng.gen_range(0..total);
        if index < activating {
            self.activating.operators[index].flip();
        } else {
            self.inhibiting.operators[index - activating].flip();
        }
    }

    /// Flip the whitelist bit of one randomly chosen regulator.
    ///
    /// This may blacklist the last active regulator; callers that need a floor
    /// enforce it themselves.
    pub fn toggle_regulator<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let polarity = match (self.activating.is_empty(), self.inhibiting.is_empty()) {
            (true, true) => return,
            (false, true) => Polarity::Activating,
            (true, false) => Polarity::Inhibiting,
            (false, false) => {
                if rng.gen_bool(0.5) {
                    Polarity::Activating
                } else {
                    Polarity::Inhibiting
                }
            }
        };
        let clause = self.clause_mut(polarity);
        let index = rng.gen_range(0..clause.regulators.len());
        let regulator = &mut clause.regulators[index];
        regulator.whitelisted = !regulator.whitelisted;
    }

    pub fn toggle_link(&mut self) {
        if let Some(link) = self.link.as_mut() {
            link.flip();
        }
    }

    /// Swap two adjacent regulators of a randomly chosen clause.
    pub fn shuffle_priority<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let polarity = if rng.gen_bool(0.5) {
            Polarity::Activating
        } else {
            Polarity::Inhibiting
        };
        let clause = self.clause_mut(polarity);
        if clause.regulators.len() < 2 {
            return;
        }
        let index = rng.gen_range(0..clause.regulators.len() - 1);
        clause.regulators.swap(index, index + 1);
    }

    /// Canonical textual form, e.g. ` A *= ( ( B ) or C ) and not ( ( D ) ) `.
    pub fn render(&self) -> String {
        let body = match self.constant {
            Some(value) => value.to_string(),
            None => {
                let activating = self.activating.render();
                let inhibiting = self.inhibiting.render().map(|i| format!("not ( {} )", i));
                match (activating, inhibiting) {
                    (Some(a), Some(i)) => {
                        format!("{} {} {}", a, self.link.unwrap_or(LogicOperator::And), i)
                    }
                    (Some(a), None) => a,
                    (None, Some(i)) => i,
                    (None, None) => "false".to_string(),
                }
            }
        };
        format!(" {} *= {} ", self.target, body)
    }

    /// Update function in AEON syntax with every node name passed through `resolve`.
    pub fn to_aeon_body<F>(&self, resolve: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = self.constant {
            return Ok(value.to_string());
        }
        for name in self.active_regulators() {
            if resolve(name).is_none() {
                return Err(BoolfitError::MissingTarget(name.to_string()));
            }
        }
        let leaf = |name: &str| resolve(name).unwrap_or_default();
        let group = |prev: String, op: LogicOperator, term: String| {
            format!("({} {} {})", prev, op.as_symbol(), term)
        };
        let activating = self.activating.fold(leaf, group);
        let inhibiting = self.inhibiting.fold(leaf, group).map(|i| format!("!({})", i));
        Ok(match (activating, inhibiting) {
            (Some(a), Some(i)) => format!(
                "{} {} {}",
                a,
                self.link.unwrap_or(LogicOperator::And).as_symbol(),
                i
            ),
            (Some(a), None) => a,
            (None, Some(i)) => i,
            (None, None) => "false".to_string(),
        })
    }

    /// Lossless form keeping blacklisted regulators, every operator and the link:
    /// `A *= B or ~C | D | and`. Constants are written as in [`Equation::render`].
    pub fn to_structure(&self) -> String {
        if let Some(value) = self.constant {
            return format!("{} *= {}", self.target, value);
        }
        format!(
            "{} *= {} | {} | {}",
            self.target,
            self.activating.to_structure(),
            self.inhibiting.to_structure(),
            self.link.map_or("-", |l| l.as_str())
        )
    }

    /// Inverse of [`Equation::to_structure`].
    pub fn parse_structure(text: &str) -> Result<Self> {
        let (target, body) = text
            .split_once("*=")
            .ok_or_else(|| BoolfitError::equation_syntax(text, "expected `<target> *= ...`"))?;
        let target = target.trim();
        if !is_node_name(target) {
            return Err(BoolfitError::equation_syntax(text, format!("invalid target `{}`", target)));
        }

        let fields: Vec<&str> = body.split('|').collect();
        let (activating, inhibiting, link) = match fields.as_slice() {
            [constant] => {
                return match constant.trim().to_ascii_lowercase().as_str() {
                    "true" => Ok(Self::constant(target, true)),
                    "false" => Ok(Self::constant(target, false)),
                    _ => Err(BoolfitError::equation_syntax(text, "expected `activators | inhibitors | link`")),
                };
            }
            [activating, inhibiting, link] => (activating, inhibiting, link.trim()),
            _ => return Err(BoolfitError::equation_syntax(text, "expected `activators | inhibitors | link`")),
        };
        let link = match link {
            "-" => None,
            token => Some(LogicOperator::from_token(token).ok_or_else(|| {
                BoolfitError::equation_syntax(text, format!("invalid link `{}`", token))
            })?),
        };

        Ok(Self {
            target: target.to_string(),
            activating: RegulatorClause::parse_structure(text, activating)?,
            inhibiting: RegulatorClause::parse_structure(text, inhibiting)?,
            link,
            constant: None,
        })
    }

    /// Parse the canonical grammar produced by [`Equation::render`].
    pub fn parse(text: &str) -> Result<Self> {
        let spaced = text
            .replace("*=", " *= ")
            .replace('(', " ( ")
            .replace(')', " ) ");
        let tokens: Vec<&str> = spaced
            .split_whitespace()
            .filter(|t| *t != "(" && *t != ")")
            .collect();

        let (target, body) = match tokens.as_slice() {
            [target, "*=", body @ ..] => (*target, body),
            _ => return Err(BoolfitError::equation_syntax(text, "expected `<target> *= ...`")),
        };
        if !is_node_name(target) {
            return Err(BoolfitError::equation_syntax(text, format!("invalid target `{}`", target)));
        }
        if let [single] = body {
            match single.to_ascii_lowercase().as_str() {
                "true" => return Ok(Self::constant(target, true)),
                "false" => return Ok(Self::constant(target, false)),
                _ => {}
            }
        }

        let mut equation = Self {
            target: target.to_string(),
            activating: RegulatorClause::default(),
            inhibiting: RegulatorClause::default(),
            link: None,
            constant: None,
        };
        let mut polarity = Polarity::Activating;
        let mut pending: Option<LogicOperator> = None;
        let mut expect_regulator = true;
        let mut index = 0;

        while index < body.len() {
            let token = body[index];
            let next_is_not = body
                .get(index + 1)
                .map_or(false, |t| t.eq_ignore_ascii_case("not"));

            if let Some(op) = LogicOperator::from_token(token) {
                if expect_regulator {
                    return Err(BoolfitError::equation_syntax(
                        text,
                        format!("operator `{}` without a preceding regulator", token),
                    ));
                }
                if next_is_not {
                    if polarity == Polarity::Inhibiting {
                        return Err(BoolfitError::equation_syntax(text, "repeated `not` clause"));
                    }
                    equation.link = Some(op);
                    polarity = Polarity::Inhibiting;
                    index += 2;
                } else {
                    pending = Some(op);
                    index += 1;
                }
                expect_regulator = true;
            } else if token.eq_ignore_ascii_case("not") {
                if polarity == Polarity::Inhibiting || !equation.activating.is_empty() {
                    return Err(BoolfitError::equation_syntax(text, "unexpected `not`"));
                }
                polarity = Polarity::Inhibiting;
                index += 1;
            } else if is_node_name(token) {
                if !expect_regulator {
                    return Err(BoolfitError::equation_syntax(
                        text,
                        format!("missing operator before `{}`", token),
                    ));
                }
                equation.clause_mut(polarity).push(token, pending.take());
                expect_regulator = false;
                index += 1;
            } else {
                return Err(BoolfitError::equation_syntax(
                    text,
                    format!("unrecognised token `{}`", token),
                ));
            }
        }

        if expect_regulator {
            return Err(BoolfitError::equation_syntax(text, "equation ends without a regulator"));
        }
        Ok(equation)
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render().trim())
    }
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().map_or(false, |c| c.is_alphanumeric() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '+'))
}

fn is_reserved(token: &str) -> bool {
    ["true", "false", "not", "and", "or"]
        .iter()
        .any(|k| token.eq_ignore_ascii_case(k))
}

/// Whether `name` can appear as a target or regulator in the equation grammar.
pub(crate) fn is_node_name(name: &str) -> bool {
    is_identifier(name) && !is_reserved(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn normalize(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn regulator_multiset(equation: &Equation) -> Vec<String> {
        let mut all: Vec<String> = equation
            .activating
            .regulators
            .iter()
            .chain(equation.inhibiting.regulators.iter())
            .map(|r| r.name.clone())
            .collect();
        all.sort();
        all
    }

    #[test]
    fn test_parse_canonical_example() {
        let equation = Equation::parse("A *=  (  (  B )  or C ) and not  (  ( D )  ) ").unwrap();

        assert_eq!(equation.target(), "A");
        let activators: Vec<_> = equation.clause(Polarity::Activating).regulators().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(activators, vec!["B", "C"]);
        assert_eq!(equation.clause(Polarity::Activating).operators(), &[LogicOperator::Or]);
        let inhibitors: Vec<_> = equation.clause(Polarity::Inhibiting).regulators().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(inhibitors, vec!["D"]);
        assert_eq!(equation.link(), Some(LogicOperator::And));

        assert_eq!(
            normalize(&equation.render()),
            normalize("A *=  (  (  B )  or C ) and not  (  ( D )  ) ")
        );
    }

    #[test]
    fn test_render_default_equation() {
        let equation = Equation::new("T", &names(&["A", "B", "C"]), &names(&["D", "E"]));
        assert_eq!(
            normalize(&equation.render()),
            "T *= ( ( ( A ) or B ) or C ) and not ( ( ( D ) or E ) )"
        );
    }

    #[test]
    fn test_render_skips_blacklisted_regulators() {
        let mut equation = Equation::new("T", &names(&["A", "B", "C"]), &names(&["D"]));
        equation.activating.operators[1] = LogicOperator::And;
        equation.activating.regulators[1].whitelisted = false;
        // C is joined to A by the operator that precedes C.
        assert_eq!(normalize(&equation.render()), "T *= ( ( A ) and C ) and not ( ( D ) )");

        equation.activating.regulators[0].whitelisted = false;
        equation.activating.regulators[2].whitelisted = false;
        assert_eq!(normalize(&equation.render()), "T *= not ( ( D ) )");
    }

    #[test]
    fn test_parse_inhibitors_only() {
        let equation = Equation::parse(" X *= not ( ( Y ) or Z ) ").unwrap();
        assert!(equation.clause(Polarity::Activating).is_empty());
        assert_eq!(equation.clause(Polarity::Inhibiting).len(), 2);
        assert_eq!(equation.link(), None);
    }

    #[test]
    fn test_parse_constant() {
        let equation = Equation::parse("A *= true").unwrap();
        assert_eq!(equation.constant_value(), Some(true));
        assert_eq!(normalize(&equation.render()), "A *= true");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Equation::parse("A = B").is_err());
        assert!(Equation::parse("A *= B C").is_err());
        assert!(Equation::parse("A *= B or").is_err());
        assert!(Equation::parse("A *= or B").is_err());
        assert!(Equation::parse("A *= B & C").is_err());
        assert!(Equation::parse("A *= B and not C and not D").is_err());
        assert!(Equation::parse("A *=").is_err());
    }

    #[test]
    fn test_round_trip_with_masks_and_operators() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut equation = Equation::new("T", &names(&["A", "B", "C", "D"]), &names(&["E", "F", "G"]));
            for _ in 0..6 {
                equation.toggle_operator(&mut rng);
                equation.toggle_regulator(&mut rng);
                equation.shuffle_priority(&mut rng);
            }
            if rng.gen_bool(0.5) {
                equation.toggle_link();
            }
            if equation.whitelisted_count() == 0 {
                continue;
            }

            let parsed = Equation::parse(&equation.render()).unwrap();
            assert_eq!(parsed.target(), equation.target());

            for polarity in [Polarity::Activating, Polarity::Inhibiting] {
                let mut expected: Vec<_> = equation.clause(polarity).whitelisted().map(|r| r.name.clone()).collect();
                let mut actual: Vec<_> = parsed.clause(polarity).whitelisted().map(|r| r.name.clone()).collect();
                expected.sort();
                actual.sort();
                assert_eq!(expected, actual);
            }
            let both = equation.activating.whitelisted_count() > 0 && equation.inhibiting.whitelisted_count() > 0;
            if both {
                assert_eq!(parsed.link(), equation.link());
            }
            assert_eq!(normalize(&parsed.render()), normalize(&equation.render()));
        }
    }

    #[test]
    fn test_mutations_preserve_target_and_regulators() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut equation = Equation::new("T", &names(&["A", "B", "C"]), &names(&["D", "E"]));
        let before = regulator_multiset(&equation);

        for _ in 0..200 {
            match rng.gen_range(0..4) {
                0 => equation.toggle_operator(&mut rng),
                1 => equation.toggle_regulator(&mut rng),
                2 => equation.toggle_link(),
                _ => equation.shuffle_priority(&mut rng),
            }
        }

        assert_eq!(equation.target(), "T");
        assert_eq!(regulator_multiset(&equation), before);
        assert_eq!(equation.activating.operators.len(), 2);
        assert_eq!(equation.inhibiting.operators.len(), 1);
    }

    #[test]
    fn test_mutations_on_empty_lists_are_noops() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut equation = Equation::constant("A", false);
        let before = equation.clone();
        equation.toggle_operator(&mut rng);
        equation.toggle_regulator(&mut rng);
        equation.toggle_link();
        equation.shuffle_priority(&mut rng);
        assert_eq!(equation, before);
    }

    #[test]
    fn test_toggle_link() {
        let mut equation = Equation::new("T", &names(&["A"]), &names(&["B"]));
        equation.toggle_link();
        assert_eq!(equation.link(), Some(LogicOperator::Or));

        let mut single = Equation::new("T", &names(&["A"]), &[]);
        single.toggle_link();
        assert_eq!(single.link(), None);
    }

    #[test]
    fn test_aeon_body() {
        let equation = Equation::parse("A *= ( ( B ) and C ) or not ( ( D ) )").unwrap();
        let body = equation
            .to_aeon_body(|name| Some(format!("v_{}", name)))
            .unwrap();
        assert_eq!(body, "(v_B & v_C) | !(v_D)");

        assert!(equation.to_aeon_body(|_| None).is_err());
    }

    #[test]
    fn test_structure_keeps_blacklisted_regulators() {
        let mut equation = Equation::new("T", &names(&["A", "B", "C"]), &names(&["D"]));
        equation.activating.operators[1] = LogicOperator::And;
        equation.activating.regulators[1].whitelisted = false;
        equation.inhibiting.regulators[0].whitelisted = false;

        assert_eq!(equation.to_structure(), "T *= A or ~B and C | ~D | and");
        assert_eq!(normalize(&equation.render()), "T *= ( ( A ) and C )");
        assert_eq!(Equation::parse_structure(&equation.to_structure()).unwrap(), equation);

        let only_inhibitors = Equation::parse_structure("X *= - | Y or Z | -").unwrap();
        assert!(only_inhibitors.clause(Polarity::Activating).is_empty());
        assert_eq!(only_inhibitors, Equation::parse(" X *= not ( ( Y ) or Z ) ").unwrap());

        assert_eq!(Equation::parse_structure("A *= false").unwrap(), Equation::constant("A", false));
    }

    #[test]
    fn test_structure_round_trip_after_mutation() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..50 {
            let mut equation = Equation::new("T", &names(&["A", "B", "C", "D"]), &names(&["E", "F"]));
            for _ in 0..8 {
                equation.toggle_operator(&mut rng);
                equation.toggle_regulator(&mut rng);
                equation.shuffle_priority(&mut rng);
                if rng.gen_bool(0.3) {
                    equation.toggle_link();
                }
            }
            assert_eq!(Equation::parse_structure(&equation.to_structure()).unwrap(), equation);
        }
    }

    #[test]
    fn test_parse_structure_rejects_malformed() {
        assert!(Equation::parse_structure("T = A | - | -").is_err());
        assert!(Equation::parse_structure("T *= A or | - | -").is_err());
        assert!(Equation::parse_structure("T *= A B | - | -").is_err());
        assert!(Equation::parse_structure("T *= A | B").is_err());
        assert!(Equation::parse_structure("T *= A | B | xor").is_err());
        assert!(Equation::parse_structure("T *= ~and | - | -").is_err());
    }

    #[test]
    fn test_toggle_operator_flips_exactly_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut equation = Equation::new("T", &names(&["A", "B", "C"]), &names(&["D", "E"]));
        for _ in 0..20 {
            let before = equation.clone();
            equation.toggle_operator(&mut rng);

            let changed = [Polarity::Activating, Polarity::Inhibiting]
                .iter()
                .map(|&p| {
                    before
                        .clause(p)
                        .operators()
                        .iter()
                        .zip(equation.clause(p).operators())
                        .filter(|(a, b)| a != b)
                        .count()
                })
                .sum::<usize>();
            assert_eq!(changed, 1);
            for polarity in [Polarity::Activating, Polarity::Inhibiting] {
                assert_eq!(before.clause(polarity).regulators(), equation.clause(polarity).regulators());
            }
            assert_eq!(before.link(), equation.link());
        }
    }

    #[test]
    fn test_shuffle_swaps_one_adjacent_pair_with_masks() {
        let mut rng = StdRng::seed_from_u64(5);
        // A single regulator per inhibiting clause makes every effective shuffle hit the activators.
        let mut equation = Equation::new("T", &names(&["A", "B", "C"]), &names(&["D"]));
        equation.activating.regulators[1].whitelisted = false;

        let mut swaps = 0;
        for _ in 0..40 {
            let before = equation.clone();
            equation.shuffle_priority(&mut rng);
            if equation == before {
                continue;
            }
            swaps += 1;
            let old = before.clause(Polarity::Activating).regulators();
            let new = equation.clause(Polarity::Activating).regulators();
            let moved: Vec<usize> = (0..old.len()).filter(|&i| old[i] != new[i]).collect();
            assert_eq!(moved.len(), 2);
            assert_eq!(moved[1], moved[0] + 1);
            // The whitelist bit travels with its regulator.
            assert_eq!(new[moved[0]], old[moved[1]]);
            assert_eq!(new[moved[1]], old[moved[0]]);
            assert_eq!(before.clause(Polarity::Activating).operators(), equation.clause(Polarity::Activating).operators());
            assert_eq!(new.iter().filter(|r| !r.whitelisted).map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["B"]);
        }
        assert!(swaps > 0);
    }
}
