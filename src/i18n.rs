//! Dashboard strings in English, Telugu and Hindi
//!
//! Lookups fall back to English when the selected language has no entry for
//! a key, and to the key itself when English has none either.

/// A dashboard display language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Te,
    Hi,
}

impl Language {
    /// All supported languages, in cycling order
    pub fn all() -> &'static [Language] {
        &[Language::En, Language::Te, Language::Hi]
    }

    /// Parses a language code such as `en` or `TE`
    pub fn from_code(code: &str) -> Option<Language> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "te" | "telugu" => Some(Language::Te),
            "hi" | "hindi" => Some(Language::Hi),
            _ => None,
        }
    }

    /// Name of the language written in that language
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Te => "తెలుగు",
            Language::Hi => "हिन्दी",
        }
    }

    pub fn next(&self) -> Language {
        let all = Self::all();
        let index = all.iter().position(|l| l == self).map_or(0, |i| i + 1);
        all[index % all.len()]
    }

    fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Language::En => EN,
            Language::Te => TE,
            Language::Hi => HI,
        }
    }
}

/// Looks up display strings for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Translator {
    language: Language,
}

impl Translator {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Translates `key`, falling back to English and then to the key itself
    pub fn translate<'a>(&self, key: &'a str) -> &'a str {
        lookup(self.language.table(), key)
            .or_else(|| lookup(EN, key))
            .unwrap_or(key)
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

const EN: &[(&str, &str)] = &[
    ("app.title", "Market Price Dashboard"),
    ("app.subtitle", "Real-time agricultural commodity prices from AGMARKNET"),
    ("app.source", "Source: Government of India - AGMARKNET"),
    ("status.showing", "Showing"),
    ("status.results", "results"),
    ("status.of", "of"),
    ("status.total", "total records"),
    ("status.last_updated", "Last updated"),
    ("status.stale", "Showing cached data. Fresh data unavailable."),
    ("status.loading", "Loading market prices..."),
    ("status.refreshing", "Refreshing..."),
    ("filter.state", "Select State"),
    ("filter.all_states", "All States"),
    ("filter.district", "Select District"),
    ("filter.all_districts", "All Districts"),
    ("filter.search", "Search commodity, market..."),
    ("filter.refresh", "Refresh"),
    ("family.all", "All"),
    ("family.vegetables", "Vegetables"),
    ("family.fruits", "Fruits"),
    ("family.grains", "Grains & Pulses"),
    ("family.spices", "Spices"),
    ("family.other", "Other"),
    ("table.commodity", "Commodity"),
    ("table.market", "Market"),
    ("table.district", "District"),
    ("table.min_price", "Min Price"),
    ("table.max_price", "Max Price"),
    ("table.modal_price", "Modal Price"),
    ("table.date", "Date"),
    ("table.variety", "Variety"),
    ("table.no_data", "No market data available"),
    ("table.no_data_hint", "Try adjusting your filters or check back later"),
    ("table.per_quintal", "₹/Quintal"),
    ("pagination.previous", "Previous"),
    ("pagination.next", "Next"),
    ("pagination.page", "Page"),
    ("pagination.of", "of"),
    ("help.title", "Keyboard Shortcuts"),
    ("help.close", "Press Esc, ? or q to close"),
];

const TE: &[(&str, &str)] = &[
    ("app.title", "మార్కెట్ ధర డాష్‌బోర్డ్"),
    ("app.subtitle", "AGMARKNET నుండి రియల్-టైమ్ వ్యవసాయ వస్తువుల ధరలు"),
    ("app.source", "మూలం: భారత ప్రభుత్వం - AGMARKNET"),
    ("status.showing", "చూపిస్తోంది"),
    ("status.results", "ఫలితాలు"),
    ("status.of", "లో"),
    ("status.total", "మొత్తం రికార్డులు"),
    ("status.last_updated", "చివరిగా నవీకరించబడింది"),
    ("status.stale", "క్యాష్ చేసిన డేటా చూపిస్తోంది. తాజా డేటా అందుబాటులో లేదు."),
    ("status.refreshing", "రిఫ్రెష్ అవుతోంది..."),
    ("filter.state", "రాష్ట్రం ఎంచుకోండి"),
    ("filter.all_states", "అన్ని రాష్ట్రాలు"),
    ("filter.district", "జిల్లా ఎంచుకోండి"),
    ("filter.all_districts", "అన్ని జిల్లాలు"),
    ("filter.search", "వస్తువు, మార్కెట్ శోధించండి..."),
    ("filter.refresh", "రిఫ్రెష్"),
    ("table.commodity", "వస్తువు"),
    ("table.market", "మార్కెట్"),
    ("table.district", "జిల్లా"),
    ("table.min_price", "కనిష్ట ధర"),
    ("table.max_price", "గరిష్ట ధర"),
    ("table.modal_price", "మోడల్ ధర"),
    ("table.date", "తేదీ"),
    ("table.variety", "రకం"),
    ("table.no_data", "మార్కెట్ డేటా అందుబాటులో లేదు"),
    ("table.no_data_hint", "మీ ఫిల్టర్‌లను సర్దుబాటు చేయడానికి ప్రయత్నించండి"),
    ("table.per_quintal", "₹/క్వింటాల్"),
    ("pagination.previous", "మునుపటి"),
    ("pagination.next", "తదుపరి"),
    ("pagination.page", "పేజీ"),
    ("pagination.of", "లో"),
];

const HI: &[(&str, &str)] = &[
    ("app.title", "बाजार मूल्य डैशबोर्ड"),
    ("app.subtitle", "AGMARKNET से रियल-टाइम कृषि वस्तु मूल्य"),
    ("app.source", "स्रोत: भारत सरकार - AGMARKNET"),
    ("status.showing", "दिखा रहा है"),
    ("status.results", "परिणाम"),
    ("status.of", "में से"),
    ("status.total", "कुल रिकॉर्ड"),
    ("status.last_updated", "अंतिम अपडेट"),
    ("status.stale", "कैश्ड डेटा दिखा रहा है। ताज़ा डेटा उपलब्ध नहीं।"),
    ("status.refreshing", "रिफ्रेश हो रहा है..."),
    ("filter.state", "राज्य चुनें"),
    ("filter.all_states", "सभी राज्य"),
    ("filter.district", "जिला चुनें"),
    ("filter.all_districts", "सभी जिले"),
    ("filter.search", "वस्तु, मंडी खोजें..."),
    ("filter.refresh", "रिफ्रेश"),
    ("table.commodity", "वस्तु"),
    ("table.market", "मंडी"),
    ("table.district", "जिला"),
    ("table.min_price", "न्यूनतम मूल्य"),
    ("table.max_price", "अधिकतम मूल्य"),
    ("table.modal_price", "मॉडल मूल्य"),
    ("table.date", "दिनांक"),
    ("table.variety", "किस्म"),
    ("table.no_data", "बाजार डेटा उपलब्ध नहीं है"),
    ("table.no_data_hint", "अपने फ़िल्टर समायोजित करने का प्रयास करें"),
    ("table.per_quintal", "₹/क्विंटल"),
    ("pagination.previous", "पिछला"),
    ("pagination.next", "अगला"),
    ("pagination.page", "पृष्ठ"),
    ("pagination.of", "में से"),
];
