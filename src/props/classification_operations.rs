/// Classification Operations
///
/// The registry is the only writer of production tags. Every write is checked
/// against the transition table; the pitcher is the one reusable vessel.
use super::classification_data::{ClassificationRegistry, Tag};
use super::prop_data::{PropId, PropKind};
use crate::error::{SimError, SimResult};

// ============================================================================
// TRANSITION TABLE
// ============================================================================

/// Tag a freshly spawned prop of this kind carries
pub fn base_tag(kind: PropKind) -> Tag {
    match kind {
        PropKind::Filter => Tag::FILTER,
        PropKind::Cup => Tag::CUP,
        PropKind::Tamper => Tag::TAMPER,
        PropKind::Pitcher => Tag::PITCHER,
        PropKind::Carton => Tag::CARTON,
    }
}

/// Tags reachable from `tag` in one step
pub fn allowed_successors(tag: Tag) -> &'static [Tag] {
    match tag {
        Tag::FILTER => &[Tag::FILTER_WITH_COFFEE],
        Tag::FILTER_WITH_COFFEE => &[Tag::FILTER_PRESSED],
        Tag::CUP => &[Tag::CUP_WITH_ESPRESSO],
        Tag::CUP_WITH_ESPRESSO => &[Tag::CUP_WITH_CAPPUCCINO],
        Tag::PITCHER => &[Tag::PITCHER_WITH_MILK],
        Tag::PITCHER_WITH_MILK => &[Tag::PITCHER_WITH_TEXTURED_MILK],
        Tag::PITCHER_WITH_TEXTURED_MILK => &[Tag::PITCHER],
        _ => &[],
    }
}

pub fn is_allowed_transition(from: Tag, to: Tag) -> bool {
    allowed_successors(from).contains(&to)
}

// ============================================================================
// REGISTRY
// ============================================================================

pub fn create_registry() -> ClassificationRegistry {
    ClassificationRegistry::default()
}

/// Register a prop with its starting tag
pub fn register_prop(registry: &mut ClassificationRegistry, prop: PropId, tag: Tag) {
    registry.tags.insert(prop, tag);
    registry.initial.insert(prop, tag);
}

pub fn get_tag(registry: &ClassificationRegistry, prop: PropId) -> Option<Tag> {
    registry.tags.get(&prop).copied()
}

/// Validated tag write. Returns the previous tag.
pub fn set_tag(registry: &mut ClassificationRegistry, prop: PropId, to: Tag) -> SimResult<Tag> {
    let from = get_tag(registry, prop).ok_or(SimError::UnknownProp { id: prop.0 })?;

    if !is_allowed_transition(from, to) {
        log::warn!(
            "[ClassificationRegistry::set_tag] Refused {} -> {} for prop {}",
            from,
            to,
            prop.0
        );
        return Err(SimError::IllegalTagTransition { prop, from, to });
    }

    registry.tags.insert(prop, to);
    registry.writes += 1;
    log::debug!(
        "[ClassificationRegistry::set_tag] Prop {} is now {} (was {})",
        prop.0,
        to,
        from
    );
    Ok(from)
}

/// Restore every prop's initial tag. Returns `(prop, from, to)` for each prop that changed,
/// in prop order.
pub fn reset_all(registry: &mut ClassificationRegistry) -> Vec<(PropId, Tag, Tag)> {
    let mut changed: Vec<(PropId, Tag, Tag)> = registry
        .initial
        .iter()
        .filter_map(|(prop, initial)| {
            let current = registry.tags.get(prop).copied()?;
            (current != *initial).then_some((*prop, current, *initial))
        })
        .collect();
    changed.sort_by_key(|(prop, _, _)| *prop);

    for (prop, _, initial) in &changed {
        registry.tags.insert(*prop, *initial);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(prop: PropId, tag: Tag) -> ClassificationRegistry {
        let mut registry = create_registry();
        register_prop(&mut registry, prop, tag);
        registry
    }

    #[test]
    fn test_filter_progression() {
        let filter = PropId(0);
        let mut registry = registry_with(filter, Tag::FILTER);

        assert_eq!(set_tag(&mut registry, filter, Tag::FILTER_WITH_COFFEE).ok(), Some(Tag::FILTER));
        assert!(set_tag(&mut registry, filter, Tag::FILTER_PRESSED).is_ok());
        assert_eq!(get_tag(&registry, filter), Some(Tag::FILTER_PRESSED));
        assert_eq!(registry.writes, 2);
    }

    #[test]
    fn test_rejects_backwards_and_skips() {
        let cup = PropId(1);
        let mut registry = registry_with(cup, Tag::CUP);

        assert!(matches!(
            set_tag(&mut registry, cup, Tag::CUP_WITH_CAPPUCCINO),
            Err(SimError::IllegalTagTransition { .. })
        ));
        assert!(set_tag(&mut registry, cup, Tag::CUP_WITH_ESPRESSO).is_ok());
        assert!(set_tag(&mut registry, cup, Tag::CUP).is_err());
        assert!(set_tag(&mut registry, cup, Tag::CUP_WITH_ESPRESSO).is_err());
        assert_eq!(get_tag(&registry, cup), Some(Tag::CUP_WITH_ESPRESSO));
    }

    #[test]
    fn test_rejects_cross_kind_writes() {
        let tamper = PropId(2);
        let mut registry = registry_with(tamper, Tag::TAMPER);
        assert!(set_tag(&mut registry, tamper, Tag::FILTER_PRESSED).is_err());
        assert!(allowed_successors(Tag::CARTON).is_empty());
    }

    #[test]
    fn test_pitcher_cycles_back_to_empty() {
        let pitcher = PropId(3);
        let mut registry = registry_with(pitcher, Tag::PITCHER);

        for next in [Tag::PITCHER_WITH_MILK, Tag::PITCHER_WITH_TEXTURED_MILK, Tag::PITCHER] {
            assert!(set_tag(&mut registry, pitcher, next).is_ok());
        }
        assert_eq!(get_tag(&registry, pitcher), Some(Tag::PITCHER));
    }

    #[test]
    fn test_unknown_prop() {
        let mut registry = create_registry();
        assert!(matches!(
            set_tag(&mut registry, PropId(9), Tag::CUP),
            Err(SimError::UnknownProp { id: 9 })
        ));
        assert!(get_tag(&registry, PropId(9)).is_none());
    }

    #[test]
    fn test_reset_restores_initial_tags() {
        let mut registry = create_registry();
        register_prop(&mut registry, PropId(0), Tag::FILTER);
        register_prop(&mut registry, PropId(1), Tag::CUP);
        assert!(set_tag(&mut registry, PropId(0), Tag::FILTER_WITH_COFFEE).is_ok());

        let changed = reset_all(&mut registry);
        assert_eq!(changed, vec![(PropId(0), Tag::FILTER_WITH_COFFEE, Tag::FILTER)]);
        assert_eq!(get_tag(&registry, PropId(0)), Some(Tag::FILTER));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Tag::PITCHER_WITH_TEXTURED_MILK.to_string(), "PitcherWithTexturedMilk");
        assert_eq!(base_tag(PropKind::Filter), Tag::FILTER);
        assert_eq!(Tag::CUP_WITH_ESPRESSO.kind(), PropKind::Cup);
    }
}
