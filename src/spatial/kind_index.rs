/// Kind Index
///
/// Slots and props bucketed by prop kind so proximity queries only look at
/// candidates that could ever match. Buckets keep registration order; queries
/// resolve ties in favor of whatever registered first.
use cgmath::Point3;
use rustc_hash::FxHashMap;

use crate::docking::SlotId;
use crate::physics::pose::distance;
use crate::props::{PropId, PropKind};

/// Registration-ordered buckets of slots and props per kind
#[derive(Debug, Clone, Default)]
pub struct KindIndex {
    pub slots_by_kind: FxHashMap<PropKind, Vec<SlotId>>,
    pub props_by_kind: FxHashMap<PropKind, Vec<PropId>>,
}

pub fn create_kind_index() -> KindIndex {
    KindIndex::default()
}

/// Record a slot that accepts `kind`
pub fn index_slot(index: &mut KindIndex, kind: PropKind, slot: SlotId) {
    let bucket = index.slots_by_kind.entry(kind).or_default();
    if !bucket.contains(&slot) {
        bucket.push(slot);
    }
}

/// Record a prop of `kind`
pub fn index_prop(index: &mut KindIndex, kind: PropKind, prop: PropId) {
    let bucket = index.props_by_kind.entry(kind).or_default();
    if !bucket.contains(&prop) {
        bucket.push(prop);
    }
}

pub fn slots_of_kind(index: &KindIndex, kind: PropKind) -> &[SlotId] {
    index
        .slots_by_kind
        .get(&kind)
        .map(|bucket| bucket.as_slice())
        .unwrap_or(&[])
}

pub fn props_of_kind(index: &KindIndex, kind: PropKind) -> &[PropId] {
    index
        .props_by_kind
        .get(&kind)
        .map(|bucket| bucket.as_slice())
        .unwrap_or(&[])
}

/// Nearest candidate strictly closer than `limit`
/// Pure function - a later candidate only wins with a strictly smaller distance,
/// so exact ties go to the earliest candidate
pub fn nearest_within<T, I>(origin: Point3<f32>, candidates: I, limit: f32) -> Option<(T, f32)>
where
    I: IntoIterator<Item = (T, Point3<f32>)>,
{
    let mut best: Option<(T, f32)> = None;
    let mut best_distance = limit;

    for (candidate, position) in candidates {
        let d = distance(origin, position);
        if d < best_distance {
            best_distance = d;
            best = Some((candidate, d));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_keep_registration_order() {
        let mut index = create_kind_index();
        index_slot(&mut index, PropKind::Cup, SlotId(3));
        index_slot(&mut index, PropKind::Cup, SlotId(1));
        index_slot(&mut index, PropKind::Cup, SlotId(3));
        index_prop(&mut index, PropKind::Pitcher, PropId(0));

        assert_eq!(slots_of_kind(&index, PropKind::Cup), &[SlotId(3), SlotId(1)]);
        assert!(slots_of_kind(&index, PropKind::Filter).is_empty());
        assert_eq!(props_of_kind(&index, PropKind::Pitcher), &[PropId(0)]);
    }

    #[test]
    fn test_nearest_prefers_strictly_closer() {
        let origin = Point3::new(0.0, 0.0, 0.0);
        let candidates = vec![
            ('a', Point3::new(0.1, 0.0, 0.0)),
            ('b', Point3::new(0.0, 0.05, 0.0)),
            ('c', Point3::new(0.0, 0.0, 0.05)),
        ];
        let (winner, d) = nearest_within(origin, candidates, 0.2).expect("in range");
        assert_eq!(winner, 'b');
        assert!((d - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_limit_is_exclusive() {
        let origin = Point3::new(0.0, 0.0, 0.0);
        let candidates = vec![(1u32, Point3::new(0.2, 0.0, 0.0))];
        assert!(nearest_within(origin, candidates, 0.2).is_none());
    }
}
