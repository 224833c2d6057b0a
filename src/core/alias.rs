use std::collections::HashMap;

/// Symbols the ranking provider spells differently from the metadata provider.
const BUILTIN_ALIASES: [(&str, &str); 2] = [("MIOTA", "IOT"), ("VERI", "VRM")];

/// Maps a ranking-provider symbol onto the symbol the metadata table is keyed by.
#[derive(Debug, Clone)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    /// Built-in aliases, overridden or extended by `extra`.
    pub fn with_overrides(extra: &HashMap<String, String>) -> Self {
        let mut aliases: HashMap<String, String> = BUILTIN_ALIASES
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        for (from, to) in extra {
            aliases.insert(from.to_uppercase(), to.to_uppercase());
        }
        Self { aliases }
    }

    pub fn canonicalize<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.aliases.get(symbol).map_or(symbol, String::as_str)
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::with_overrides(&HashMap::new())
    }
}
