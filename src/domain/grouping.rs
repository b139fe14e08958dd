//! Variant grouping
//!
//! Color variants of one design share a `group` key derived from the product
//! name alone. The token table is versioned so a change in vocabulary is an
//! explicit new table rather than an edit to the one already in use.

/// Words stripped from a product name before it becomes a group key.
#[derive(Debug, Clone, Copy)]
pub struct TokenTable {
    pub version: u32,
    pub suffixes: &'static [&'static str],
    pub colors: &'static [&'static str],
}

pub const GROUP_TOKENS_V1: TokenTable = TokenTable {
    version: 1,
    suffixes: &[
        "PEEL & STICK WALLPAPER",
        "PEEL AND STICK WALLPAPER",
        "WALLPAPER",
        "PAPEL TAPIZ",
        "WALL MURAL",
        "FLOOR TILES",
        "WALL DECALS",
        "MOULDING",
        "WALL PANELS",
        "PEEL & STICK",
    ],
    colors: &[
        "OFF WHITE", "OFF-WHITE", "WHITE", "BLANCO",
        "TEAL", "TURQUESA",
        "DARK BROWN", "LIGHT BROWN", "BROWN", "CAFE", "MARRON",
        "AQUA",
        "NAVY", "AZUL MARINO", "SKY BLUE", "POWDERED BLUE", "LIGHT BLUE", "BLUE", "AZUL", "COBALT", "COBALTO", "INDIGO",
        "PINK", "ROSA", "ROSE", "BLUSH", "RUBOR", "MAGENTA",
        "BLACK & WHITE", "BLACK AND WHITE", "BLACK", "NEGRO", "CHARCOAL", "CARBON", "ONYX",
        "GREY", "GRAY", "GRIS", "SILVER", "PLATA", "SLATE", "PIZARRA",
        "GOLD", "DORADO", "METALLIC", "METALICO", "COPPER", "COBRE",
        "GREEN", "VERDE", "EMERALD", "ESMERALDA", "SAGE", "OLIVE", "OLIVA", "MINT", "MENTA", "MOSS", "MUSGO", "CHARTREUSE", "FOREST",
        "BEIGE", "CREAM", "CREMA", "TAN", "TOSTADO", "TAUPE", "OATMEAL", "AVENA", "NEUTRAL", "NEUTRO", "NATURAL",
        "YELLOW", "AMARILLO", "MUSTARD", "MOSTAZA",
        "RED", "ROJO", "RUST", "OXIDO", "BURGUNDY", "VINO",
        "ORANGE", "NARANJA", "PEACH", "DURAZNO", "CORAL", "TERRACOTTA", "TERRACOTA",
        "PURPLE", "MORADO", "LILAC", "LILA", "MAUVE", "VIOLET", "VIOLETA", "LAVENDER", "LAVANDA", "PLUM", "CIRUELA",
        "MULTI", "MULTICOLOR", "RAINBOW", "ARCOIRIS", "PASTEL", "BREEZY",
    ],
};

impl TokenTable {
    /// Every phrase as a token sequence, longest first so "OFF WHITE" wins
    /// over "WHITE".
    fn phrases(&self) -> Vec<Vec<String>> {
        let mut phrases: Vec<Vec<String>> = self
            .suffixes
            .iter()
            .chain(self.colors.iter())
            .map(|p| tokenize(p))
            .filter(|p| !p.is_empty())
            .collect();
        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        phrases.dedup();
        phrases
    }
}

/// Group key for `name` using [`GROUP_TOKENS_V1`].
pub fn derive_group(name: &str) -> String {
    derive_group_with(&GROUP_TOKENS_V1, name)
}

/// Removes whole-word suffix and color phrases until nothing more matches,
/// then slugs what is left. A name made only of stripped words keeps its
/// full slug so it never collapses to an empty key.
pub fn derive_group_with(table: &TokenTable, name: &str) -> String {
    let tokens = tokenize(name);
    let phrases = table.phrases();

    let mut remaining = tokens.clone();
    loop {
        let next = strip_once(&remaining, &phrases);
        if next.len() == remaining.len() {
            break;
        }
        remaining = next;
    }

    if remaining.is_empty() {
        slug(&tokens)
    } else {
        slug(&remaining)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_uppercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_once(tokens: &[String], phrases: &[Vec<String>]) -> Vec<String> {
    let mut kept = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        match phrases.iter().find(|p| tokens[i..].starts_with(p)) {
            Some(phrase) => i += phrase.len(),
            None => {
                kept.push(tokens[i].clone());
                i += 1;
            }
        }
    }
    kept
}

fn slug(tokens: &[String]) -> String {
    tokens.iter().map(|t| t.to_lowercase()).collect::<Vec<_>>().join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_variants_share_a_group() {
        assert_eq!(derive_group("Rodney White Wallpaper"), "rodney");
        assert_eq!(derive_group("Rodney White Wallpaper"), derive_group("Rodney Grey Wallpaper"));
        assert_eq!(derive_group("Palm Leaf Off-White Peel & Stick Wallpaper"), "palm-leaf");
    }

    #[test]
    fn test_derive_group_is_idempotent() {
        for name in ["Rodney White Wallpaper", "Mármol Luxury", "Black & White", "Textura Minimalista Beige"] {
            let once = derive_group(name);
            assert_eq!(derive_group(&once), once, "{name}");
        }
    }

    #[test]
    fn test_only_whole_words_are_stripped() {
        assert_eq!(derive_group("Redwood Forest Mural"), "redwood-mural");
        assert_eq!(derive_group("Tangier Tile"), "tangier-tile");
    }

    #[test]
    fn test_all_stripped_falls_back_to_full_slug() {
        assert_eq!(derive_group("White Wallpaper"), "white-wallpaper");
    }

    #[test]
    fn test_spanish_names() {
        assert_eq!(derive_group("Papel Tapiz Floral Dorado"), "floral");
        assert_eq!(derive_group("Papel Tapiz Floral Verde"), "floral");
    }
}
