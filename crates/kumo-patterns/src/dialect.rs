//! Localized Gherkin keyword tables.
//!
//! Each [`Dialect`] lists the keywords recognized for one document language.
//! Keyword detection is greedy: when several keywords are prefixes of the same
//! line, the longest one wins so that `Étant donné que` is not read as
//! `Étant donné` followed by the text `que ...`.

use crate::keyword::StepKeyword;

/// Structural keyword introducing a titled block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TitleKeyword {
    /// `Feature:` and its translations.
    Feature,
    /// `Background:` and its translations.
    Background,
    /// `Scenario:` and its translations.
    Scenario,
    /// `Scenario Outline:` and its translations.
    ScenarioOutline,
    /// `Examples:` and its translations.
    Examples,
}

/// Keyword table for a single document language.
#[derive(Debug)]
pub struct Dialect {
    language: &'static str,
    native_name: &'static str,
    feature: &'static [&'static str],
    background: &'static [&'static str],
    scenario: &'static [&'static str],
    scenario_outline: &'static [&'static str],
    examples: &'static [&'static str],
    given: &'static [&'static str],
    when: &'static [&'static str],
    then: &'static [&'static str],
    and: &'static [&'static str],
    but: &'static [&'static str],
}

static ENGLISH: Dialect = Dialect {
    language: "en",
    native_name: "English",
    feature: &["Feature", "Business Need", "Ability"],
    background: &["Background"],
    scenario: &["Scenario", "Example"],
    scenario_outline: &["Scenario Outline", "Scenario Template"],
    examples: &["Examples", "Scenarios"],
    given: &["Given"],
    when: &["When"],
    then: &["Then"],
    and: &["And", "*"],
    but: &["But"],
};

static SPANISH: Dialect = Dialect {
    language: "es",
    native_name: "español",
    feature: &["Característica", "Necesidad del negocio", "Requisito"],
    background: &["Antecedentes"],
    scenario: &["Escenario", "Ejemplo"],
    scenario_outline: &["Esquema del escenario"],
    examples: &["Ejemplos"],
    given: &["Dado", "Dada", "Dados", "Dadas"],
    when: &["Cuando"],
    then: &["Entonces"],
    and: &["Y", "E", "*"],
    but: &["Pero"],
};

static FRENCH: Dialect = Dialect {
    language: "fr",
    native_name: "français",
    feature: &["Fonctionnalité"],
    background: &["Contexte"],
    scenario: &["Scénario", "Exemple"],
    scenario_outline: &["Plan du scénario", "Plan du Scénario"],
    examples: &["Exemples"],
    given: &[
        "Soit",
        "Sachant que",
        "Sachant qu'",
        "Sachant",
        "Étant donné que",
        "Étant donné qu'",
        "Étant donné",
        "Etant donné",
    ],
    when: &["Quand", "Lorsque", "Lorsqu'"],
    then: &["Alors", "Donc"],
    and: &["Et que", "Et qu'", "Et", "*"],
    but: &["Mais que", "Mais qu'", "Mais"],
};

static GERMAN: Dialect = Dialect {
    language: "de",
    native_name: "Deutsch",
    feature: &["Funktionalität", "Funktion"],
    background: &[
        "Grundlage",
        "Hintergrund",
        "Voraussetzungen",
        "Vorbedingungen",
    ],
    scenario: &["Szenario", "Beispiel"],
    scenario_outline: &["Szenariogrundriss", "Szenarien"],
    examples: &["Beispiele"],
    given: &["Angenommen", "Gegeben sei", "Gegeben seien"],
    when: &["Wenn"],
    then: &["Dann"],
    and: &["Und", "*"],
    but: &["Aber"],
};

static DIALECTS: [&Dialect; 4] = [&ENGLISH, &SPANISH, &FRENCH, &GERMAN];

const TITLE_KINDS: [TitleKeyword; 5] = [
    TitleKeyword::Feature,
    TitleKeyword::Background,
    TitleKeyword::Scenario,
    TitleKeyword::ScenarioOutline,
    TitleKeyword::Examples,
];

const STEP_KINDS: [StepKeyword; 5] = [
    StepKeyword::Given,
    StepKeyword::When,
    StepKeyword::Then,
    StepKeyword::And,
    StepKeyword::But,
];

impl Dialect {
    /// Look up the dialect for a language code.
    ///
    /// Region subtags fall back to the primary language, so `es-ES` and
    /// `es_AR` both resolve to the Spanish table.
    ///
    /// # Examples
    /// ```
    /// use kumo_patterns::Dialect;
    /// assert_eq!(Dialect::for_language("de-AT").map(Dialect::language), Some("de"));
    /// assert!(Dialect::for_language("xx").is_none());
    /// ```
    #[must_use]
    pub fn for_language(code: &str) -> Option<&'static Self> {
        let code = code.trim();
        let primary = code.split(['-', '_']).next().unwrap_or(code);
        DIALECTS
            .iter()
            .copied()
            .find(|dialect| dialect.language.eq_ignore_ascii_case(code))
            .or_else(|| {
                DIALECTS
                    .iter()
                    .copied()
                    .find(|dialect| dialect.language.eq_ignore_ascii_case(primary))
            })
    }

    /// The English dialect, used when a document declares no language.
    #[must_use]
    pub fn english() -> &'static Self {
        &ENGLISH
    }

    /// Language codes with a keyword table.
    pub fn languages() -> impl Iterator<Item = &'static str> {
        DIALECTS.iter().map(|dialect| dialect.language)
    }

    /// Language code of this dialect.
    #[must_use]
    pub const fn language(&self) -> &'static str {
        self.language
    }

    /// Name of the language in that language.
    #[must_use]
    pub const fn native_name(&self) -> &'static str {
        self.native_name
    }

    /// Keywords introducing the given titled block.
    #[must_use]
    pub const fn title_keywords(&self, kind: TitleKeyword) -> &'static [&'static str] {
        match kind {
            TitleKeyword::Feature => self.feature,
            TitleKeyword::Background => self.background,
            TitleKeyword::Scenario => self.scenario,
            TitleKeyword::ScenarioOutline => self.scenario_outline,
            TitleKeyword::Examples => self.examples,
        }
    }

    /// Keywords introducing a step of the given kind.
    #[must_use]
    pub const fn step_keywords(&self, kind: StepKeyword) -> &'static [&'static str] {
        match kind {
            StepKeyword::Given => self.given,
            StepKeyword::When => self.when,
            StepKeyword::Then => self.then,
            StepKeyword::And => self.and,
            StepKeyword::But => self.but,
        }
    }

    /// Match a titled block line such as `Scenario: adds two numbers`.
    ///
    /// The keyword must be immediately followed by a colon. Returns the block
    /// kind, the keyword as written and the trimmed title.
    ///
    /// # Examples
    /// ```
    /// use kumo_patterns::{Dialect, TitleKeyword};
    /// let en = Dialect::english();
    /// let (kind, keyword, title) = en.match_title("Scenario Outline: eating").unwrap();
    /// assert_eq!(kind, TitleKeyword::ScenarioOutline);
    /// assert_eq!(keyword, "Scenario Outline");
    /// assert_eq!(title, "eating");
    /// ```
    #[must_use]
    pub fn match_title<'a>(&self, line: &'a str) -> Option<(TitleKeyword, &'static str, &'a str)> {
        let mut best: Option<(TitleKeyword, &'static str, &'a str)> = None;
        for kind in TITLE_KINDS {
            for &keyword in self.title_keywords(kind) {
                let Some(rest) = line
                    .strip_prefix(keyword)
                    .and_then(|rest| rest.strip_prefix(':'))
                else {
                    continue;
                };
                if best.is_none_or(|(_, current, _)| keyword.len() > current.len()) {
                    best = Some((kind, keyword, rest.trim()));
                }
            }
        }
        best
    }

    /// Match a step line such as `Given I have 3 apples`.
    ///
    /// The keyword must be followed by whitespace unless it ends with an
    /// apostrophe (`Lorsqu'il`). Returns the keyword kind, the keyword as
    /// written and the trimmed step text.
    ///
    /// # Examples
    /// ```
    /// use kumo_patterns::{Dialect, StepKeyword};
    /// let fr = Dialect::for_language("fr").unwrap();
    /// let (kind, keyword, text) = fr.match_step("Étant donné que la porte est ouverte").unwrap();
    /// assert_eq!(kind, StepKeyword::Given);
    /// assert_eq!(keyword, "Étant donné que");
    /// assert_eq!(text, "la porte est ouverte");
    /// ```
    #[must_use]
    pub fn match_step<'a>(&self, line: &'a str) -> Option<(StepKeyword, &'static str, &'a str)> {
        let mut best: Option<(StepKeyword, &'static str, &'a str)> = None;
        for kind in STEP_KINDS {
            for &keyword in self.step_keywords(kind) {
                let Some(rest) = line.strip_prefix(keyword) else {
                    continue;
                };
                let separated = keyword.ends_with('\'')
                    || rest.chars().next().is_some_and(char::is_whitespace);
                if !separated {
                    continue;
                }
                if best.is_none_or(|(_, current, _)| keyword.len() > current.len()) {
                    best = Some((kind, keyword, rest.trim()));
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dialect(code: &str) -> &'static Dialect {
        Dialect::for_language(code).unwrap_or_else(|| panic!("dialect {code} should exist"))
    }

    #[rstest]
    #[case("en", "en")]
    #[case("EN", "en")]
    #[case("es-ES", "es")]
    #[case("fr_CA", "fr")]
    #[case(" de ", "de")]
    fn resolves_language_codes(#[case] code: &str, #[case] expected: &str) {
        assert_eq!(dialect(code).language(), expected);
    }

    #[test]
    fn lists_every_language() {
        let languages: Vec<_> = Dialect::languages().collect();
        assert_eq!(languages, vec!["en", "es", "fr", "de"]);
    }

    #[rstest]
    #[case("en", "Feature: Login", TitleKeyword::Feature, "Login")]
    #[case("en", "Scenario Template: t", TitleKeyword::ScenarioOutline, "t")]
    #[case("en", "Examples:", TitleKeyword::Examples, "")]
    #[case("es", "Esquema del escenario: x", TitleKeyword::ScenarioOutline, "x")]
    #[case("fr", "Plan du scénario: p", TitleKeyword::ScenarioOutline, "p")]
    #[case("de", "Hintergrund:", TitleKeyword::Background, "")]
    fn matches_titles(
        #[case] code: &str,
        #[case] line: &str,
        #[case] kind: TitleKeyword,
        #[case] title: &str,
    ) {
        let Some((found, _, text)) = dialect(code).match_title(line) else {
            panic!("{line:?} should match a title keyword");
        };
        assert_eq!(found, kind);
        assert_eq!(text, title);
    }

    #[test]
    fn title_requires_colon() {
        assert!(Dialect::english().match_title("Feature Login").is_none());
        assert!(Dialect::english().match_title("Scenarios are fun").is_none());
    }

    #[rstest]
    #[case("en", "Given a cat", StepKeyword::Given, "a cat")]
    #[case("en", "* a cat", StepKeyword::And, "a cat")]
    #[case("es", "Dadas dos cosas", StepKeyword::Given, "dos cosas")]
    #[case("fr", "Lorsqu'il pleut", StepKeyword::When, "il pleut")]
    #[case("fr", "Et que tout va bien", StepKeyword::And, "tout va bien")]
    #[case("de", "Gegeben seien zwei", StepKeyword::Given, "zwei")]
    fn matches_steps(
        #[case] code: &str,
        #[case] line: &str,
        #[case] kind: StepKeyword,
        #[case] text: &str,
    ) {
        let Some((found, _, rest)) = dialect(code).match_step(line) else {
            panic!("{line:?} should match a step keyword");
        };
        assert_eq!(found, kind);
        assert_eq!(rest, text);
    }

    #[test]
    fn step_keyword_must_be_followed_by_whitespace() {
        assert!(Dialect::english().match_step("Givenness matters").is_none());
        assert!(dialect("es").match_step("Yeso").is_none());
    }

    #[test]
    fn prefers_longest_keyword() {
        let Some((_, keyword, _)) = dialect("de").match_step("Gegeben seien x") else {
            panic!("step should match");
        };
        assert_eq!(keyword, "Gegeben seien");
    }
}
