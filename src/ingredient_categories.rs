//! # Ingredient Categories Module
//!
//! Shopping categories, the static keyword dictionary and the heuristic
//! regex patterns used by the ingredient classifier.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Merchandise grouping of a shopping list, in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShoppingCategory {
    #[serde(rename = "Frutta e Verdura")]
    Produce,
    #[serde(rename = "Macelleria e Pescheria")]
    MeatAndFish,
    #[serde(rename = "Latticini e Uova")]
    DairyAndEggs,
    #[serde(rename = "Dispensa e Cereali")]
    Pantry,
    #[serde(rename = "Bevande")]
    Beverages,
    #[serde(rename = "Dolci e Dessert")]
    Sweets,
    #[serde(rename = "Surgelati")]
    Frozen,
    #[serde(rename = "Altri")]
    Other,
}

impl ShoppingCategory {
    /// Every category in presentation order
    pub const ALL: [ShoppingCategory; 8] = [
        ShoppingCategory::Produce,
        ShoppingCategory::MeatAndFish,
        ShoppingCategory::DairyAndEggs,
        ShoppingCategory::Pantry,
        ShoppingCategory::Beverages,
        ShoppingCategory::Sweets,
        ShoppingCategory::Frozen,
        ShoppingCategory::Other,
    ];

    /// Label used in the cache file and in generated lists
    pub fn label(&self) -> &'static str {
        match self {
            ShoppingCategory::Produce => "Frutta e Verdura",
            ShoppingCategory::MeatAndFish => "Macelleria e Pescheria",
            ShoppingCategory::DairyAndEggs => "Latticini e Uova",
            ShoppingCategory::Pantry => "Dispensa e Cereali",
            ShoppingCategory::Beverages => "Bevande",
            ShoppingCategory::Sweets => "Dolci e Dessert",
            ShoppingCategory::Frozen => "Surgelati",
            ShoppingCategory::Other => "Altri",
        }
    }

    /// Find a category label inside free text (exact match first, then substring)
    pub fn find_in(text: &str) -> Option<ShoppingCategory> {
        let trimmed = text.trim();
        if let Ok(category) = trimmed.parse() {
            return Some(category);
        }
        let lowered = trimmed.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| lowered.contains(&c.label().to_lowercase()))
    }
}

impl fmt::Display for ShoppingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ShoppingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| format!("unknown shopping category '{s}'"))
    }
}

/// Common ingredients per category, matched as substrings in either direction
pub const BASE_DICTIONARY: &[(ShoppingCategory, &[&str])] = &[
    (
        ShoppingCategory::Produce,
        &[
            "pomodoro", "cipolla", "aglio", "carota", "sedano", "prezzemolo", "basilico",
            "rucola", "insalata", "lattuga", "zucchina", "melanzana", "peperone", "patata",
            "spinaci", "funghi", "limone", "arancia", "mela", "fragola", "frutti rossi",
            "pomodorini", "ciliegino", "datterini",
        ],
    ),
    (
        ShoppingCategory::MeatAndFish,
        &[
            "carne", "manzo", "vitello", "maiale", "pollo", "tacchino", "costoletta",
            "filetto", "salsiccia", "pancetta", "guanciale", "prosciutto", "bresaola",
            "pesce", "branzino", "salmone", "tonno", "gamberi", "vongole", "carne macinata",
        ],
    ),
    (
        ShoppingCategory::DairyAndEggs,
        &[
            "latte", "panna", "burro", "mascarpone", "ricotta", "mozzarella", "parmigiano",
            "grana", "pecorino", "formaggio", "yogurt", "uova", "uovo", "grana padano",
            "parmigiano reggiano",
        ],
    ),
    (
        ShoppingCategory::Pantry,
        &[
            "pasta", "riso", "farina", "pane", "pangrattato", "olio", "aceto", "sale",
            "pepe", "zucchero", "zafferano", "brodo", "passata", "pelati", "fagioli",
            "ceci", "lenticchie", "lasagne", "besciamella", "sugo", "olio evo",
            "riso carnaroli", "riso arborio",
        ],
    ),
    (
        ShoppingCategory::Beverages,
        &["vino", "birra", "acqua", "caffè", "tè", "succo", "vino bianco", "vino rosso"],
    ),
    (
        ShoppingCategory::Sweets,
        &[
            "cioccolato", "cacao", "gelatina", "vaniglia", "mandorle", "nocciole",
            "savoiardi", "biscotti", "miele", "marmellata", "cacao amaro", "zucchero a velo",
        ],
    ),
    (
        ShoppingCategory::Frozen,
        &["piselli surgelati", "spinaci surgelati", "gelato"],
    ),
];

/// Look a normalized name up in the base dictionary
pub fn lookup_base(name: &str) -> Option<ShoppingCategory> {
    if name.is_empty() {
        return None;
    }
    BASE_DICTIONARY.iter().find_map(|(category, keywords)| {
        keywords
            .iter()
            .any(|k| k.contains(name) || name.contains(k))
            .then_some(*category)
    })
}

const HEURISTIC_PATTERNS: &[(ShoppingCategory, &[&str])] = &[
    (
        ShoppingCategory::Produce,
        &[
            r"\bfrutta\b", r"\bverdur[ae]\b", r"\binsalata\b", r"\bortaggi\b", r"\bfoglie\b",
            r"\bverdi\b", r"\bfresco\b", r"\bpomodor\w+", r"\bcipolle?\b", r"\baglio\b",
            r"\bcarote?\b", r"\bsedano\b", r"\bzucchine?\b", r"\bmelanzane?\b", r"\bpeperon\w+",
            r"\bpatate?\b", r"\bspinaci\b", r"\bfunghi\b", r"\blimone\b", r"\barancia\b",
            r"\bmela\b", r"\bfragol\w+", r"\bfrutti\b", r"\bbasilic\w+", r"\bprezzem\w+",
            r"\brucola\b", r"\blattuga\b", r"\bradicchio\b", r"\bbroccoli\b", r"\bcavolfiore\b",
            r"\basparagi\b", r"\bfinocchio\b", r"\bcetriolo\b", r"\bpeperoncin\w+",
            r"\bciliegin\w+", r"\bdatterini\b", r"\brosmarino\b", r"\bsalvia\b", r"\btimo\b",
            r"\borigano\b", r"\bmenta\b",
        ],
    ),
    (
        ShoppingCategory::MeatAndFish,
        &[
            r"\bcarne\b", r"\bpesce\b", r"\bfiletto\b", r"\bfetta\b", r"\bmacinato\b",
            r"\btrancio\b", r"\bfesa\b", r"\btagliata\b", r"\bvitello\b", r"\bmanzo\b",
            r"\bmaiale\b", r"\bpollo\b", r"\btacchino\b", r"\bcostoletta\b", r"\bsalsiccia\b",
            r"\bpancetta\b", r"\bguanciale\b", r"\bprosciutto\b", r"\bbresaola\b", r"\bspeck\b",
            r"\bsalmone\b", r"\btonno\b", r"\bgamberi\b", r"\bvongole\b", r"\bcozze\b",
            r"\bcalamari\b", r"\bpolpo\b", r"\bbranzino\b", r"\borata\b", r"\bmerluzzo\b",
            r"\bacciughe\b", r"\balici\b",
        ],
    ),
    (
        ShoppingCategory::DairyAndEggs,
        &[
            r"\blatte\b", r"\bformaggi?o?\b", r"\buova?\b", r"\bpanna\b", r"\bburro\b",
            r"\byogurt\b", r"\balbume\b", r"\btuorlo\b", r"\bmascarpone\b", r"\bricotta\b",
            r"\bmozzarella\b", r"\bparmigiano\b", r"\bgrana\b", r"\bpecorino\b", r"\bscamorza\b",
            r"\bprovola\b", r"\bfontina\b", r"\bgorgonzola\b", r"\btaleggio\b",
            r"\bstracchino\b", r"\bcrescenza\b", r"\bcream\b",
        ],
    ),
    (
        ShoppingCategory::Pantry,
        &[
            r"\bpasta\b", r"\briso\b", r"\bfarina\b", r"\bcereali\b", r"\bscatola\b",
            r"\bconserva\b", r"\bsott.*olio\b", r"\bsecco\b", r"\bolio\b", r"\baceto\b",
            r"\bsale\b", r"\bpepe\b", r"\bspezie\b", r"\blasagne\b", r"\bpane\b",
            r"\bpangrattato\b", r"\bbrodo\b", r"\bfagioli\b", r"\bceci\b", r"\blenticchie\b",
            r"\bpelati\b", r"\bpassata\b", r"\bconcentrato\b", r"\bsugo\b", r"\bpesto\b",
            r"\bzafferano\b", r"\bcurry\b", r"\bpaprika\b", r"\bcurcuma\b", r"\bzenzero\b",
            r"\bcannella\b", r"\bnoc\w+\s+moscata\b", r"\balloro\b", r"\bdado\b", r"\bolive\b",
            r"\bcapperi\b", r"\bfarro\b", r"\borzo\b", r"\bquinoa\b", r"\bcouscous\b",
            r"\bpolenta\b", r"\bspaghetti\b", r"\bpenne\b", r"\brigatoni\b", r"\btagliatelle\b",
            r"\bbesciamella\b", r"\bragù", r"\bevo\b", r"\bextravergine\b", r"\bbalsamico\b",
        ],
    ),
    (
        ShoppingCategory::Beverages,
        &[
            r"\bvino\b", r"\bbirra\b", r"\bacqua\b", r"\bbevanda\b", r"\bliquore\b",
            r"\bcaffè", r"\btè", r"\bsucco\b", r"\bmarsala\b",
        ],
    ),
    (
        ShoppingCategory::Sweets,
        &[
            r"\bdolce\b", r"\bcioccolat\w*", r"\bcacao\b", r"\bzucchero\b", r"\bmiele\b",
            r"\bcrema\b", r"\bgelat\w*", r"\bbiscott\w*", r"\btorta\b", r"\bdessert\b",
            r"\bsavoiardi\b", r"\bvaniglia\b", r"\bmandorle\b", r"\bnocciole\b", r"\bnoci\b",
            r"\bpistacchi\b", r"\bpinoli\b", r"\buvetta\b", r"\bcanditi\b", r"\bamarett\w+",
            r"\bcantucc\w+", r"\ba\s+velo\b", r"\bamaro\b", r"\bfondente\b",
        ],
    ),
    (
        ShoppingCategory::Frozen,
        &[r"\bsurgelat\w*", r"\bcongelat\w*", r"\bfrozen\b", r"\bghiaccio\b"],
    ),
];

lazy_static! {
    static ref HEURISTIC_REGEXES: Vec<(ShoppingCategory, Vec<Regex>)> = HEURISTIC_PATTERNS
        .iter()
        .map(|(category, patterns)| {
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(p).expect("Heuristic pattern should be valid"))
                .collect();
            (*category, compiled)
        })
        .collect();
}

/// Match a normalized name against the heuristic patterns in priority order
pub fn match_heuristic(name: &str) -> Option<ShoppingCategory> {
    HEURISTIC_REGEXES
        .iter()
        .find(|(_, regexes)| regexes.iter().any(|re| re.is_match(name)))
        .map(|(category, _)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for category in ShoppingCategory::ALL {
            assert_eq!(category.label().parse::<ShoppingCategory>(), Ok(category));
        }
        assert!("Verdura".parse::<ShoppingCategory>().is_err());
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&ShoppingCategory::DairyAndEggs).unwrap();
        assert_eq!(json, "\"Latticini e Uova\"");
    }

    #[test]
    fn test_find_in_free_text() {
        assert_eq!(
            ShoppingCategory::find_in("Categoria: dispensa e cereali."),
            Some(ShoppingCategory::Pantry)
        );
        assert_eq!(ShoppingCategory::find_in("Non saprei"), None);
    }

    #[test]
    fn test_lookup_base() {
        assert_eq!(lookup_base("tonno in scatola"), Some(ShoppingCategory::MeatAndFish));
        assert_eq!(lookup_base("pane"), Some(ShoppingCategory::Pantry));
        assert_eq!(lookup_base("pomodori datterini"), Some(ShoppingCategory::Produce));
        assert_eq!(lookup_base("edamame"), None);
        assert_eq!(lookup_base(""), None);
    }

    #[test]
    fn test_match_heuristic() {
        assert_eq!(match_heuristic("radicchio trevigiano"), Some(ShoppingCategory::Produce));
        assert_eq!(match_heuristic("curcuma in polvere"), Some(ShoppingCategory::Pantry));
        assert_eq!(match_heuristic("cioccolato fondente"), Some(ShoppingCategory::Sweets));
        assert_eq!(match_heuristic("sour cream"), Some(ShoppingCategory::DairyAndEggs));
        assert_eq!(match_heuristic("edamame"), None);
    }
}
