//! Part classification by mesh name.
//!
//! Every mesh of a loaded car lands in exactly one [`PartCategory`]. The
//! decision is a fixed, ordered list of `(predicate, category)` rules over the
//! lower-cased mesh name; the first rule that matches wins and anything left
//! over is [`PartCategory::Other`].

use std::fmt;

/// Semantic bucket of a car mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartCategory {
    CarBody,
    Wheels,
    Rims,
    Glass,
    Headlights,
    Other,
}

impl PartCategory {
    /// All categories in classification priority order.
    pub const ALL: [PartCategory; 6] = [
        PartCategory::CarBody,
        PartCategory::Wheels,
        PartCategory::Rims,
        PartCategory::Glass,
        PartCategory::Headlights,
        PartCategory::Other,
    ];

    /// Label shown in the part dropdown.
    pub fn label(self) -> &'static str {
        match self {
            PartCategory::CarBody => "Car Body",
            PartCategory::Wheels => "Wheels",
            PartCategory::Rims => "Rims",
            PartCategory::Glass => "Glass / Windows",
            PartCategory::Headlights => "Headlights",
            PartCategory::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PartCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const BODY_KEYWORDS: &[&str] = &["body", "paint", "chassis"];
const BODY_EXCLUSIONS: &[&str] = &[
    "glass",
    "window",
    "windshield",
    "headlight",
    "lamp",
    "tire",
    "wheel",
    "interior",
];
const GLASS_KEYWORDS: &[&str] = &["glass", "window", "windshield"];
const HEADLIGHT_KEYWORDS: &[&str] = &["headlight", "lamp"];

fn contains_any(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| name.contains(k))
}

/// "rim" anywhere except as the tail of "trim".
fn mentions_rim(name: &str) -> bool {
    name.match_indices("rim").any(|(at, _)| !name[..at].ends_with('t'))
}

fn is_body(name: &str) -> bool {
    contains_any(name, BODY_KEYWORDS)
        && !contains_any(name, BODY_EXCLUSIONS)
        && !mentions_rim(name)
}

fn is_wheel(name: &str) -> bool {
    name.contains("wheel") && !mentions_rim(name)
}

fn is_rim(name: &str) -> bool {
    mentions_rim(name)
}

fn is_glass(name: &str) -> bool {
    contains_any(name, GLASS_KEYWORDS)
}

fn is_headlight(name: &str) -> bool {
    contains_any(name, HEADLIGHT_KEYWORDS)
}

/// A single classification rule. Predicates receive the lower-cased name.
pub struct Rule {
    pub category: PartCategory,
    pub matches: fn(&str) -> bool,
}

/// The rules in priority order. [`PartCategory::Other`] is the fallback and has
/// no rule of its own.
pub const RULES: [Rule; 5] = [
    Rule {
        category: PartCategory::CarBody,
        matches: is_body,
    },
    Rule {
        category: PartCategory::Wheels,
        matches: is_wheel,
    },
    Rule {
        category: PartCategory::Rims,
        matches: is_rim,
    },
    Rule {
        category: PartCategory::Glass,
        matches: is_glass,
    },
    Rule {
        category: PartCategory::Headlights,
        matches: is_headlight,
    },
];

/// Classifies one mesh name.
pub fn classify(name: &str) -> PartCategory {
    let name = name.to_lowercase();
    RULES
        .iter()
        .find(|rule| (rule.matches)(&name))
        .map_or(PartCategory::Other, |rule| rule.category)
}

/// Buckets of mesh indices, one per category, each in visiting order.
///
/// Indices refer to the meshes of the model the classification was built
/// from and are meaningless for any other model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    buckets: [Vec<usize>; 6],
}

impl Classification {
    pub fn build<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classification = Self::default();
        for (idx, name) in names.into_iter().enumerate() {
            classification.buckets[classify(name).index()].push(idx);
        }
        classification
    }

    pub fn bucket(&self, category: PartCategory) -> &[usize] {
        &self.buckets[category.index()]
    }

    pub fn category_of(&self, mesh: usize) -> Option<PartCategory> {
        PartCategory::ALL
            .into_iter()
            .find(|c| self.bucket(*c).contains(&mesh))
    }

    /// Non-empty categories in priority order, i.e. what the part dropdown offers.
    pub fn available(&self) -> Vec<PartCategory> {
        PartCategory::ALL
            .into_iter()
            .filter(|c| !self.bucket(*c).is_empty())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary: Vec<String> = PartCategory::ALL
            .into_iter()
            .map(|c| format!("{}: {}", c.label(), self.bucket(c).len()))
            .collect();
        f.write_str(&summary.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_keywords_without_exclusions_are_body() {
        assert_eq!(classify("body_chassis_01"), PartCategory::CarBody);
        assert_eq!(classify("Paint_Main"), PartCategory::CarBody);
        assert_eq!(classify("CHASSIS"), PartCategory::CarBody);
    }

    #[test]
    fn exclusions_push_body_names_into_later_buckets() {
        assert_eq!(classify("body_glass_trim"), PartCategory::Glass);
        assert_eq!(classify("bodypanel_glass"), PartCategory::Glass);
        assert_eq!(classify("body_headlight"), PartCategory::Headlights);
        assert_eq!(classify("body_wheel_arch"), PartCategory::Wheels);
        assert_eq!(classify("body_interior"), PartCategory::Other);
        assert_eq!(classify("paint_tire"), PartCategory::Other);
    }

    #[test]
    fn wheels_exclude_rims() {
        assert_eq!(classify("wheel_fl"), PartCategory::Wheels);
        assert_eq!(classify("wheel_rim_fl"), PartCategory::Rims);
        assert_eq!(classify("Rim_RR"), PartCategory::Rims);
    }

    #[test]
    fn trim_is_not_a_rim() {
        assert_eq!(classify("door_trim"), PartCategory::Other);
        assert_eq!(classify("body_trim"), PartCategory::CarBody);
        assert_eq!(classify("trim_rim_fl"), PartCategory::Rims);
        assert_eq!(classify("wheel_trim"), PartCategory::Wheels);
    }

    #[test]
    fn substring_matches_are_literal() {
        assert_eq!(classify("tail_lamp"), PartCategory::Headlights);
        assert_eq!(classify("windshield"), PartCategory::Glass);
        assert_eq!(classify("seat"), PartCategory::Other);
        assert_eq!(classify(""), PartCategory::Other);
    }

    #[test]
    fn every_mesh_lands_in_exactly_one_bucket() {
        let names = [
            "body", "wheel_fl", "rim_fl", "window_l", "headlight_l", "seat", "body_glass",
        ];
        let classification = Classification::build(names);
        assert_eq!(classification.len(), names.len());
        for idx in 0..names.len() {
            let hits = PartCategory::ALL
                .into_iter()
                .filter(|c| classification.bucket(*c).contains(&idx))
                .count();
            assert_eq!(hits, 1, "mesh {} classified {} times", names[idx], hits);
        }
        assert_eq!(classification.bucket(PartCategory::Glass), &[3, 6]);
        assert_eq!(classification.category_of(5), Some(PartCategory::Other));
    }

    #[test]
    fn available_skips_empty_buckets() {
        let classification = Classification::build(["body", "rim"]);
        assert_eq!(
            classification.available(),
            vec![PartCategory::CarBody, PartCategory::Rims]
        );
        assert!(Classification::build(std::iter::empty()).is_empty());
    }

    #[test]
    fn labels_round_trip() {
        for category in PartCategory::ALL {
            assert_eq!(PartCategory::from_label(category.label()), Some(category));
        }
        assert_eq!(PartCategory::from_label("Interior"), None);
    }
}
