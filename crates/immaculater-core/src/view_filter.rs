use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

/// Which subset of a to-do list is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewFilter {
    #[default]
    All,
    Actionable,
    NeedingReview,
    Incomplete,
    InactiveAndIncomplete,
    AllEvenDeleted,
}

impl ViewFilter {
    /// Dropdown order of the view filter form.
    pub const ORDERED: [ViewFilter; 6] = [
        ViewFilter::All,
        ViewFilter::Actionable,
        ViewFilter::NeedingReview,
        ViewFilter::Incomplete,
        ViewFilter::InactiveAndIncomplete,
        ViewFilter::AllEvenDeleted,
    ];

    /// Name posted as `view_filter` and understood by the server.
    pub fn ui_name(self) -> &'static str {
        match self {
            ViewFilter::All => "all",
            ViewFilter::Actionable => "actionable",
            ViewFilter::NeedingReview => "needing_review",
            ViewFilter::Incomplete => "incomplete",
            ViewFilter::InactiveAndIncomplete => "inactive_and_incomplete",
            ViewFilter::AllEvenDeleted => "all_even_deleted",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewFilter::All => "All",
            ViewFilter::Actionable => "Actionable",
            ViewFilter::NeedingReview => "Needing review",
            ViewFilter::Incomplete => "Incomplete, even if inactive",
            ViewFilter::InactiveAndIncomplete => "Inactive, incomplete",
            ViewFilter::AllEvenDeleted => "Truly all, even deleted",
        }
    }

    /// Every name that selects this filter. The first entry is [`Self::ui_name`].
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ViewFilter::All => &["all", "default"],
            ViewFilter::Actionable => &["actionable"],
            ViewFilter::NeedingReview => &["needing_review"],
            ViewFilter::Incomplete => &["incomplete"],
            ViewFilter::InactiveAndIncomplete => &["inactive_and_incomplete"],
            ViewFilter::AllEvenDeleted => &["all_even_deleted"],
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ViewFilter::All => "hides deleted items",
            ViewFilter::Actionable => {
                "hides deleted and completed items, and items in inactive contexts or projects"
            }
            ViewFilter::NeedingReview => {
                "like actionable, but also hides projects already reviewed"
            }
            ViewFilter::Incomplete => "hides deleted and completed items, even if inactive",
            ViewFilter::InactiveAndIncomplete => {
                "shows only incomplete items that are inactive or in inactive contexts or projects"
            }
            ViewFilter::AllEvenDeleted => "hides nothing",
        }
    }

    pub fn from_ui_name(name: &str) -> Option<Self> {
        let found = Self::ORDERED
            .into_iter()
            .find(|filter| filter.aliases().iter().any(|alias| *alias == name));
        trace!(name, ?found, "resolved view filter name");
        found
    }
}

impl fmt::Display for ViewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ui_name())
    }
}

impl FromStr for ViewFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ui_name(s.trim()).ok_or_else(|| {
            let known = Self::ORDERED
                .iter()
                .flat_map(|filter| filter.aliases().iter().copied())
                .collect::<Vec<_>>()
                .join(", ");
            anyhow!("unknown view filter '{s}' (expected one of: {known})")
        })
    }
}

impl Serialize for ViewFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.ui_name())
    }
}

impl<'de> Deserialize<'de> for ViewFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod view_filter_tests {
    use super::*;

    #[test]
    fn ui_names_parse_back() {
        for filter in ViewFilter::ORDERED {
            let parsed: ViewFilter = filter.ui_name().parse().expect("known name");
            assert_eq!(parsed, filter);
            assert_eq!(filter.aliases()[0], filter.ui_name());
        }
    }

    #[test]
    fn default_alias_selects_all() {
        assert_eq!(
            "default".parse::<ViewFilter>().expect("alias"),
            ViewFilter::All
        );
        assert_eq!(ViewFilter::default(), ViewFilter::All);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "everything"
            .parse::<ViewFilter>()
            .expect_err("unknown name");
        let message = err.to_string();
        assert!(message.contains("'everything'"), "{message}");
        assert!(message.contains("needing_review"), "{message}");
    }

    #[test]
    fn names_are_unique_across_filters() {
        let mut seen = std::collections::HashSet::new();
        for filter in ViewFilter::ORDERED {
            for alias in filter.aliases() {
                assert!(seen.insert(*alias), "duplicate alias {alias}");
            }
        }
    }

    #[test]
    fn serde_uses_ui_names() {
        let json = serde_json::to_string(&ViewFilter::NeedingReview).expect("serialize");
        assert_eq!(json, "\"needing_review\"");
        let back: ViewFilter = serde_json::from_str("\"default\"").expect("deserialize");
        assert_eq!(back, ViewFilter::All);
        assert!(serde_json::from_str::<ViewFilter>("\"bogus\"").is_err());
    }
}
