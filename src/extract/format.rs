//! Format-directive parsing for formatting calls
//!
//! A formatting literal like `"got %d items for %s"` turns into the
//! template `"got {1} items for {2}"` plus a substitution plan describing
//! how each call argument reaches the map. Only the string/integer/boolean
//! classes are recognized; anything else is refused rather than guessed.

/// How one call argument is wrapped before entering the substitution map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `%s` — used as-is
    None,
    /// `%d` — wrapped in the integer-to-string helper
    IntStr,
    /// `%t` — wrapped in the boolean-to-string helper
    BoolStr,
}

/// One `{n}` slot in the rewritten template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// 1-based placeholder index, in left-to-right literal order
    pub index: usize,
    pub conversion: Conversion,
}

/// Parsed formatting literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPlan {
    /// Literal text with directives replaced by `{n}` tokens
    pub template: String,
    pub slots: Vec<Slot>,
}

impl FormatPlan {
    /// Whether any slot needs a conversion helper import
    pub fn needs_convert(&self) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.conversion != Conversion::None)
    }
}

/// Scan `text` for `%`-directives.
///
/// A lone trailing `%` is literal text; an unrecognized directive class is
/// an error carrying the offending character.
pub fn parse_format(text: &str) -> Result<FormatPlan, char> {
    let chars: Vec<char> = text.chars().collect();
    let mut template = String::with_capacity(text.len());
    let mut slots = Vec::new();
    let mut index = 1;
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '%' && i + 1 < chars.len() {
            i += 1;
            let conversion = match chars[i] {
                's' => Conversion::None,
                'd' => Conversion::IntStr,
                't' => Conversion::BoolStr,
                other => return Err(other),
            };
            template.push_str(&format!("{{{}}}", index));
            slots.push(Slot { index, conversion });
            index += 1;
        } else {
            template.push(chars[i]);
        }
        i += 1;
    }
    Ok(FormatPlan { template, slots })
}
