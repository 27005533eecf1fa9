//! Precedence merge of selector tiers.
//!
//! Pure: no IO, never fails. Tiers in descending precedence are the
//! work-item override, the persisted relational override, the cached
//! override, and the built-in default. A higher tier's non-blank fields
//! replace the same fields below it; absent fields fall through.

use super::models::selector_config::present;
use super::models::{PartialSelectors, SelectorConfig};

/// Override tiers available for one work item.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorTiers<'a> {
    pub work_item: Option<&'a PartialSelectors>,
    pub persisted: Option<&'a PartialSelectors>,
    pub cached: Option<&'a PartialSelectors>,
}

fn overlay(target: &mut String, value: &Option<String>) {
    if let Some(v) = present(value.as_deref()) {
        *target = v.to_string();
    }
}

fn overlay_optional(target: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = present(value.as_deref()) {
        *target = Some(v.to_string());
    }
}

pub fn resolve_selectors(tiers: &SelectorTiers<'_>) -> SelectorConfig {
    let mut resolved = SelectorConfig::builtin_default();

    // Lowest precedence first so later tiers win
    for tier in [tiers.cached, tiers.persisted, tiers.work_item]
        .into_iter()
        .flatten()
    {
        overlay(&mut resolved.job_container, &tier.job_container);
        overlay(&mut resolved.title, &tier.title);
        overlay(&mut resolved.link, &tier.link);
        overlay_optional(&mut resolved.location, &tier.location);
        overlay_optional(&mut resolved.description, &tier.description);
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(title: Option<&str>, link: Option<&str>) -> PartialSelectors {
        PartialSelectors {
            title: title.map(str::to_string),
            link: link.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn no_tiers_yields_builtin_default() {
        assert_eq!(
            resolve_selectors(&SelectorTiers::default()),
            SelectorConfig::builtin_default()
        );
    }

    #[test]
    fn higher_tier_wins_per_field() {
        let work_item = partial(Some("X"), None);
        let persisted = partial(Some("Y"), Some("Z"));

        let resolved = resolve_selectors(&SelectorTiers {
            work_item: Some(&work_item),
            persisted: Some(&persisted),
            cached: None,
        });

        assert_eq!(resolved.title, "X");
        assert_eq!(resolved.link, "Z");
        assert_eq!(
            resolved.job_container,
            SelectorConfig::builtin_default().job_container
        );
    }

    #[test]
    fn persisted_beats_cached() {
        let persisted = partial(Some(".persisted"), None);
        let cached = partial(Some(".cached"), Some("a.cached"));

        let resolved = resolve_selectors(&SelectorTiers {
            work_item: None,
            persisted: Some(&persisted),
            cached: Some(&cached),
        });

        assert_eq!(resolved.title, ".persisted");
        assert_eq!(resolved.link, "a.cached");
    }

    #[test]
    fn blank_fields_fall_through() {
        let work_item = partial(Some("   "), Some(""));
        let cached = partial(Some(".cached-title"), None);

        let resolved = resolve_selectors(&SelectorTiers {
            work_item: Some(&work_item),
            persisted: None,
            cached: Some(&cached),
        });

        assert_eq!(resolved.title, ".cached-title");
        assert_eq!(resolved.link, "a[href]");
    }

    #[test]
    fn always_complete_for_any_combination() {
        let empty = PartialSelectors::default();
        let blanks = PartialSelectors {
            job_container: Some(" ".into()),
            title: Some("".into()),
            link: Some("\t".into()),
            location: Some(" ".into()),
            description: None,
        };
        let tiers = [None, Some(&empty), Some(&blanks)];

        for work_item in tiers {
            for persisted in tiers {
                for cached in tiers {
                    let resolved = resolve_selectors(&SelectorTiers {
                        work_item,
                        persisted,
                        cached,
                    });
                    assert!(resolved.validate().is_ok());
                }
            }
        }
    }
}
