/// Classification Data Structures
///
/// Pure DOP - NO METHODS. Just data.
/// Production tags: what stage of the drink a prop currently represents.
use std::fmt;

use rustc_hash::FxHashMap;

use super::prop_data::{PropId, PropKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterStage {
    Empty,
    WithCoffee,
    Pressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CupStage {
    Empty,
    WithEspresso,
    WithCappuccino,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitcherStage {
    Empty,
    WithMilk,
    TexturedMilk,
}

/// Production tag, one closed vocabulary per prop kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Filter(FilterStage),
    Cup(CupStage),
    Pitcher(PitcherStage),
    Tamper,
    Carton,
}

impl Tag {
    pub const FILTER: Tag = Tag::Filter(FilterStage::Empty);
    pub const FILTER_WITH_COFFEE: Tag = Tag::Filter(FilterStage::WithCoffee);
    pub const FILTER_PRESSED: Tag = Tag::Filter(FilterStage::Pressed);
    pub const CUP: Tag = Tag::Cup(CupStage::Empty);
    pub const CUP_WITH_ESPRESSO: Tag = Tag::Cup(CupStage::WithEspresso);
    pub const CUP_WITH_CAPPUCCINO: Tag = Tag::Cup(CupStage::WithCappuccino);
    pub const PITCHER: Tag = Tag::Pitcher(PitcherStage::Empty);
    pub const PITCHER_WITH_MILK: Tag = Tag::Pitcher(PitcherStage::WithMilk);
    pub const PITCHER_WITH_TEXTURED_MILK: Tag = Tag::Pitcher(PitcherStage::TexturedMilk);
    pub const TAMPER: Tag = Tag::Tamper;
    pub const CARTON: Tag = Tag::Carton;

    /// Kind of prop this tag can label
    pub fn kind(self) -> PropKind {
        match self {
            Tag::Filter(_) => PropKind::Filter,
            Tag::Cup(_) => PropKind::Cup,
            Tag::Pitcher(_) => PropKind::Pitcher,
            Tag::Tamper => PropKind::Tamper,
            Tag::Carton => PropKind::Carton,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::Filter(FilterStage::Empty) => "Filter",
            Tag::Filter(FilterStage::WithCoffee) => "FilterWithCoffee",
            Tag::Filter(FilterStage::Pressed) => "FilterPressed",
            Tag::Cup(CupStage::Empty) => "Cup",
            Tag::Cup(CupStage::WithEspresso) => "CupWithEspresso",
            Tag::Cup(CupStage::WithCappuccino) => "CupWithCappuccino",
            Tag::Pitcher(PitcherStage::Empty) => "Pitcher",
            Tag::Pitcher(PitcherStage::WithMilk) => "PitcherWithMilk",
            Tag::Pitcher(PitcherStage::TexturedMilk) => "PitcherWithTexturedMilk",
            Tag::Tamper => "Tamper",
            Tag::Carton => "Carton",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current and initial tag of every registered prop
#[derive(Debug, Clone, Default)]
pub struct ClassificationRegistry {
    pub tags: FxHashMap<PropId, Tag>,
    pub initial: FxHashMap<PropId, Tag>,
    pub writes: u64,
}
