//! Commodity families for tab-style filtering.
//!
//! AGMARKNET commodity names are free text ("Onion", "Bhindi(Ladies Finger)",
//! "Bengal Gram(Gram)(Whole)"), so families are assigned by keyword match on
//! the lowercased name.

/// Coarse commodity categories shown as tabs on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommodityFamily {
    /// Wildcard: every commodity matches
    #[default]
    All,
    Vegetables,
    Fruits,
    /// Cereals and pulses
    Grains,
    Spices,
    /// Anything the classifier does not recognize
    Other,
}

/// Spices are matched before vegetables, so "Coriander Seed" lands here and
/// not under the leafy "coriander" vegetable keyword.
///
/// AGMARKNET spells chillies both ways ("Dry Chillies", "Chili Red").
const SPICE_KEYWORDS: &[&str] = &[
    "turmeric",
    "dry chilli",
    "dry chili",
    "chilli red",
    "chili red",
    "red chilli",
    "red chili",
    "coriander seed",
    "cumin",
    "jeera",
    "pepper garbled",
    "black pepper",
    "cardamom",
    "cardamoms",
    "clove",
    "ajwan",
    "methi seeds",
    "mustard",
    "tamarind",
    "garlic",
    "ginger(dry)",
    "dry ginger",
    "nutmeg",
    "mace",
];

const GRAIN_KEYWORDS: &[&str] = &[
    "wheat",
    "rice",
    "paddy",
    "maize",
    "bajra",
    "jowar",
    "ragi",
    "barley",
    "gram",
    "arhar",
    "tur dal",
    "tur (",
    "moong",
    "urad",
    "masur",
    "lentil",
    "kulthi",
    "horse gram",
    "rajgir",
    "millet",
    "lobia",
    "rajma",
];

const FRUIT_KEYWORDS: &[&str] = &[
    "apple",
    "banana",
    "mango",
    "grapes",
    "orange",
    "papaya",
    "pomegranate",
    "guava",
    "pineapple",
    "water melon",
    "watermelon",
    "karbuja",
    "musk melon",
    "lemon",
    "lime",
    "mousambi",
    "sweet lime",
    "chikoos",
    "sapota",
    "jack fruit",
    "plum",
    "litchi",
    "coconut",
    "custard apple",
    "amla",
];

const VEGETABLE_KEYWORDS: &[&str] = &[
    "onion",
    "tomato",
    "potato",
    "brinjal",
    "cabbage",
    "cauliflower",
    "carrot",
    "beans",
    "bhindi",
    "ladies finger",
    "capsicum",
    "cucumber",
    "cucumbar",
    "gourd",
    "pumpkin",
    "radish",
    "spinach",
    "peas",
    "drumstick",
    "beetroot",
    "green chilli",
    "green chili",
    "ginger(green)",
    "coriander",
    "methi(leaves)",
    "colacasia",
    "sweet potato",
    "tapioca",
    "elephant yam",
    "knool khol",
    "leafy vegetable",
    "mushrooms",
    "snakeguard",
    "tinda",
    "turnip",
];

impl CommodityFamily {
    /// Families offered as dashboard tabs, in display order.
    pub fn tabs() -> &'static [CommodityFamily] {
        &[
            CommodityFamily::All,
            CommodityFamily::Vegetables,
            CommodityFamily::Fruits,
            CommodityFamily::Grains,
            CommodityFamily::Spices,
        ]
    }

    /// Translation key for the family's tab label.
    pub fn label_key(&self) -> &'static str {
        match self {
            CommodityFamily::All => "family.all",
            CommodityFamily::Vegetables => "family.vegetables",
            CommodityFamily::Fruits => "family.fruits",
            CommodityFamily::Grains => "family.grains",
            CommodityFamily::Spices => "family.spices",
            CommodityFamily::Other => "family.other",
        }
    }

    /// The tab after this one, wrapping around.
    pub fn next_tab(&self) -> CommodityFamily {
        let tabs = Self::tabs();
        let index = tabs.iter().position(|f| f == self).map_or(0, |i| i + 1);
        tabs[index % tabs.len()]
    }

    /// Assigns a commodity name to its family. Never returns [`CommodityFamily::All`].
    pub fn classify(commodity: &str) -> CommodityFamily {
        let name = commodity.to_lowercase();
        let matches = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

        if matches(SPICE_KEYWORDS) {
            CommodityFamily::Spices
        } else if matches(FRUIT_KEYWORDS) {
            CommodityFamily::Fruits
        } else if matches(VEGETABLE_KEYWORDS) {
            CommodityFamily::Vegetables
        } else if matches(GRAIN_KEYWORDS) {
            CommodityFamily::Grains
        } else {
            CommodityFamily::Other
        }
    }

    /// Whether a commodity belongs to this family (`All` matches everything).
    pub fn includes(&self, commodity: &str) -> bool {
        match self {
            CommodityFamily::All => true,
            family => Self::classify(commodity) == *family,
        }
    }
}
